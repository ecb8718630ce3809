use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use reqwest::StatusCode;

use crate::api::{ApiError, ConversationApi, ConversationClient, ConversationTurn, DailySummary, SummaryRequest};
use crate::chat::EMPTY_INPUT_TEXT;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "conversary", version)]
#[command(about = "Chat with Chi, the Conversary journaling assistant")]
pub struct Cli {
    /// Backend base URL, e.g. http://localhost:8000/api
    #[arg(long, env = "CONVERSARY_URL", global = true)]
    pub url: Option<String>,

    /// Without a command the interactive chat starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print stored conversation turns
    History {
        /// Only turns from this day (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Send a single message and print Chi's reply
    Send {
        message: String,
    },
    /// Daily summaries
    Summary {
        #[command(subcommand)]
        action: SummaryAction,
    },
    /// Show the saved configuration, or change the backend URL
    Config {
        #[arg(long)]
        set_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SummaryAction {
    /// Record today's summary
    Add {
        text: String,
        #[arg(long)]
        sentiment: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the summary for a day (YYYY-MM-DD)
    Show {
        date: NaiveDate,
    },
}

pub async fn run(command: Commands, base_url: &str, mut config: Config) -> Result<()> {
    let client = ConversationClient::new(base_url);

    match command {
        Commands::History { date } => {
            let turns = match date {
                Some(date) => client.conversations_on(date).await,
                None => client.list_conversations().await,
            }
            .with_context(|| format!("Could not load conversations from {base_url}"))?;

            if turns.is_empty() {
                println!("No conversations yet.");
            }
            for turn in &turns {
                println!("{}", format_turn(turn));
            }
        }
        Commands::Send { message } => {
            let message = message.trim();
            if message.is_empty() {
                bail!(EMPTY_INPUT_TEXT);
            }
            let reply = client
                .submit_message(message)
                .await
                .with_context(|| format!("Could not reach {base_url}"))?;
            println!("{}", reply.ai_response);
        }
        Commands::Summary { action } => match action {
            SummaryAction::Add { text, sentiment, notes } => {
                let request = SummaryRequest {
                    summary_text: text,
                    sentiment_score: sentiment,
                    notes,
                };
                let created = client.create_summary(&request).await?;
                println!("{} (id {})", created.message, created.id);
            }
            SummaryAction::Show { date } => match client.summary_for(date).await {
                Ok(summary) => println!("{}", format_summary(&summary)),
                Err(err @ ApiError::Status { .. }) if err.status() == Some(StatusCode::NOT_FOUND) => {
                    println!("{}", err.detail().unwrap_or("No summary found for the given date"));
                }
                Err(err) => return Err(err.into()),
            },
        },
        Commands::Config { set_url } => {
            let path = Config::get_config_path()?;
            if let Some(url) = set_url {
                // Reload rather than trust `config`, which may be a fallback
                config = Config::update_base_url(&path, &url)?;
                tracing::info!("saved backend URL");
            }
            println!("config file: {}", path.display());
            println!("backend:     {}", config.resolve_base_url(None));
            println!("log file:    {}", config.resolve_log_file()?.display());
        }
    }

    Ok(())
}

pub fn format_turn(turn: &ConversationTurn) -> String {
    let date = turn
        .date
        .map(|date| format!("[{date}] "))
        .unwrap_or_default();
    format!("{date}You: {}\n{date}Chi: {}\n", turn.user_message, turn.ai_response)
}

pub fn format_summary(summary: &DailySummary) -> String {
    let mut out = format!("{}\n{}", summary.date, summary.summary_text);
    if let Some(score) = summary.sentiment_score {
        out.push_str(&format!("\nsentiment: {score:.2}"));
    }
    if let Some(notes) = &summary.notes {
        out.push_str(&format!("\nnotes: {notes}"));
    }
    out
}
