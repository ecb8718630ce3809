use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use conversary::api::ConversationClient;
use conversary::app::App;
use conversary::cli::{self, Cli};
use conversary::config::Config;
use conversary::tui::{self, EventHandler, Tui};
use conversary::{handler, logging, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::new(), Some(err)),
    };
    let base_url = config.resolve_base_url(cli.url.as_deref());

    match cli.command {
        Some(command) => {
            logging::init_stderr()?;
            if let Some(err) = config_error {
                tracing::warn!("ignoring unreadable config: {err:#}");
            }
            cli::run(command, &base_url, config).await
        }
        None => {
            logging::init_file(&config.resolve_log_file()?)?;
            if let Some(err) = config_error {
                tracing::warn!("ignoring unreadable config: {err:#}");
            }
            run_chat(base_url).await
        }
    }
}

async fn run_chat(base_url: String) -> Result<()> {
    tracing::info!(%base_url, "starting chat");
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = event_loop(&mut terminal, base_url).await;

    tui::restore()?;
    result
}

async fn event_loop(terminal: &mut Tui, base_url: String) -> Result<()> {
    let mut events = EventHandler::new();
    let client = ConversationClient::new(&base_url);
    let mut app = App::new(Arc::new(client), events.sender(), base_url);

    // Replay stored history once on start-up
    app.load_conversations();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    Ok(())
}
