//! The chat panel: an ordered list of entries plus the input guard.
//!
//! This is UI-agnostic state. Drawing lives in `ui`, timers in `app`.

use std::time::Duration;

pub const LOADING_TEXT: &str = "Chi is thinking...";
pub const APOLOGY_TEXT: &str = "Sorry, something went wrong.";
pub const EMPTY_INPUT_TEXT: &str = "Please enter a message";
pub const ERROR_BANNER_TTL: Duration = Duration::from_millis(3000);

// Used for scroll maths before the first draw reports the real size
const FALLBACK_WRAP_WIDTH: usize = 50;
const FALLBACK_VISIBLE_HEIGHT: u16 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Message { text: String, sender: Sender },
    Loading,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub kind: EntryKind,
}

/// Wrap text to fit within `width` columns, one `String` per row.
/// Breaks on word boundaries and keeps explicit newlines. A word longer
/// than the width is split so no row overflows.
pub fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    // Zero width means unbounded
    let width = if width == 0 { usize::MAX } else { width };

    let mut lines = Vec::new();
    for source_line in text.lines() {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in source_line.split_whitespace() {
            let word_len = word.chars().count();

            if current_len > 0 && current_len + 1 + word_len <= width {
                current_line.push(' ');
                current_line.push_str(word);
                current_len += 1 + word_len;
                continue;
            }
            if current_len > 0 {
                lines.push(std::mem::take(&mut current_line));
            }

            // Character count, not byte length, for UTF-8 text
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(width).peekable();
            current_len = 0;
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.iter().collect());
                } else {
                    current_line = chunk.iter().collect();
                    current_len = chunk.len();
                }
            }
        }

        // Blank source lines still take a row
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

impl Entry {
    /// Body rows at `width` columns, without the sender label or trailing blank.
    pub fn wrapped_lines(&self, width: usize) -> Vec<String> {
        match &self.kind {
            EntryKind::Message { text, .. } => wrap_text_to_width(text, width),
            EntryKind::Loading => wrap_text_to_width(LOADING_TEXT, width),
            EntryKind::Error(text) => wrap_text_to_width(text, width),
        }
    }

    /// Rows this entry takes when drawn at `width` columns, trailing blank included.
    pub fn line_count(&self, width: usize) -> usize {
        let body = self.wrapped_lines(width).len();
        match &self.kind {
            EntryKind::Message { .. } | EntryKind::Loading => 1 + body + 1,
            EntryKind::Error(_) => body + 1,
        }
    }
}

#[derive(Debug)]
pub struct ChatPanel {
    entries: Vec<Entry>,
    next_id: u64,
    input_enabled: bool,
    pub scroll: u16,
    pub viewport_height: u16,
    pub viewport_width: u16,
}

impl Default for ChatPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatPanel {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            input_enabled: true,
            scroll: 0,
            viewport_height: 0,
            viewport_width: 0,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Message entries only, in display order.
    pub fn messages(&self) -> impl Iterator<Item = (Sender, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.kind {
            EntryKind::Message { text, sender } => Some((*sender, text.as_str())),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_loading_placeholder(&self) -> bool {
        self.entries.iter().any(|entry| entry.kind == EntryKind::Loading)
    }

    pub fn error_banners(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match &entry.kind {
            EntryKind::Error(text) => Some(text.as_str()),
            _ => None,
        })
    }

    fn push(&mut self, kind: EntryKind) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, kind });
        self.scroll_to_bottom();
        id
    }

    pub fn append_message(&mut self, text: impl Into<String>, sender: Sender) -> EntryId {
        self.push(EntryKind::Message {
            text: text.into(),
            sender,
        })
    }

    pub fn show_loading_placeholder(&mut self) -> EntryId {
        self.push(EntryKind::Loading)
    }

    /// Appends an error banner. Removal is up to the caller's timer.
    pub fn push_error(&mut self, text: impl Into<String>) -> EntryId {
        self.push(EntryKind::Error(text.into()))
    }

    /// Removes an entry. Returns false if it was already gone.
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.clamp_scroll();
        }
        removed
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn wrap_width(&self) -> usize {
        if self.viewport_width > 0 {
            self.viewport_width as usize
        } else {
            FALLBACK_WRAP_WIDTH
        }
    }

    fn visible_height(&self) -> u16 {
        if self.viewport_height > 0 {
            self.viewport_height
        } else {
            FALLBACK_VISIBLE_HEIGHT
        }
    }

    /// Rows of the whole panel, capped at what the `u16` scroll offset can reach.
    pub fn total_lines(&self) -> u16 {
        let width = self.wrap_width();
        let total: usize = self
            .entries
            .iter()
            .map(|entry| entry.line_count(width))
            .fold(0, usize::saturating_add);
        u16::try_from(total).unwrap_or(u16::MAX)
    }

    fn max_scroll(&self) -> u16 {
        self.total_lines().saturating_sub(self.visible_height())
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
    }

    pub fn half_page(&self) -> u16 {
        (self.visible_height() / 2).max(1)
    }

    fn clamp_scroll(&mut self) {
        self.scroll = self.scroll.min(self.max_scroll());
    }
}
