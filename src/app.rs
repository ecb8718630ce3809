use std::sync::Arc;

use anyhow::anyhow;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::api::{ConversationApi, ConversationTurn, Reply};
use crate::chat::{
    ChatPanel, EntryId, Sender, APOLOGY_TEXT, EMPTY_INPUT_TEXT, ERROR_BANNER_TTL,
};
use crate::tui::AppEvent;

/// Where the single in-flight submission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Idle,
    Sending { placeholder: EntryId },
}

pub struct App {
    pub should_quit: bool,
    pub panel: ChatPanel,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in chars

    pub submission: Submission,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_button_area: Option<Rect>,

    pub backend_label: String,
    api: Arc<dyn ConversationApi>,
    events: UnboundedSender<AppEvent>,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl App {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        events: UnboundedSender<AppEvent>,
        backend_label: impl Into<String>,
    ) -> Self {
        Self {
            should_quit: false,
            panel: ChatPanel::new(),
            input: String::new(),
            cursor: 0,
            submission: Submission::Idle,
            animation_frame: 0,
            chat_area: None,
            send_button_area: None,
            backend_label: backend_label.into(),
            api,
            events,
        }
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.submission, Submission::Sending { .. })
    }

    /// Submit whatever is in the input box.
    ///
    /// Does nothing while input is disabled. Blank input gets a transient
    /// banner and never reaches the network.
    pub fn send_message(&mut self) {
        if !self.panel.input_enabled() {
            return;
        }

        let message = self.input.trim().to_string();
        if message.is_empty() {
            self.show_transient_error(EMPTY_INPUT_TEXT);
            return;
        }

        self.panel.set_input_enabled(false);
        self.panel.append_message(message.clone(), Sender::User);
        self.input.clear();
        self.cursor = 0;

        let placeholder = self.panel.show_loading_placeholder();
        self.submission = Submission::Sending { placeholder };
        tracing::debug!(chars = message.chars().count(), "submitting message");

        let api = Arc::clone(&self.api);
        let request = tokio::spawn(async move { api.submit_message(&message).await });

        // A panicking request still has to resolve the submission
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match request.await {
                Ok(result) => result.map_err(anyhow::Error::from),
                Err(join_error) => Err(anyhow!("request task failed: {join_error}")),
            };
            let _ = events.send(AppEvent::Submitted(outcome));
        });
    }

    /// Resolve the in-flight submission: swap the placeholder for the
    /// reply (or the apology) and hand the input back to the user.
    pub fn finish_submission(&mut self, outcome: anyhow::Result<Reply>) {
        if let Submission::Sending { placeholder } =
            std::mem::replace(&mut self.submission, Submission::Idle)
        {
            self.panel.remove_entry(placeholder);
        }

        match outcome {
            Ok(reply) => {
                self.panel.append_message(reply.ai_response, Sender::Ai);
            }
            Err(err) => {
                tracing::error!("Error: {err:#}");
                self.panel.append_message(APOLOGY_TEXT, Sender::Ai);
            }
        }

        self.panel.set_input_enabled(true);
        self.animation_frame = 0;
    }

    /// Show an error banner that removes itself after a fixed delay.
    ///
    /// Each banner owns its own timer; a newer banner does not cancel older ones.
    pub fn show_transient_error(&mut self, text: &str) -> EntryId {
        let id = self.panel.push_error(text);
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(ERROR_BANNER_TTL).await;
            let _ = events.send(AppEvent::BannerExpired(id));
        });
        id
    }

    pub fn expire_banner(&mut self, id: EntryId) {
        self.panel.remove_entry(id);
    }

    /// Fetch stored history once. Failures are logged and otherwise ignored.
    pub fn load_conversations(&self) {
        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            match api.list_conversations().await {
                Ok(turns) => {
                    let _ = events.send(AppEvent::HistoryLoaded(turns));
                }
                Err(err) => tracing::error!("Error loading conversations: {err}"),
            }
        });
    }

    pub fn replay_history(&mut self, turns: Vec<ConversationTurn>) {
        tracing::info!(turns = turns.len(), "replaying conversation history");
        for turn in turns {
            self.panel.append_message(turn.user_message, Sender::User);
            self.panel.append_message(turn.ai_response, Sender::Ai);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete_at_cursor(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}
