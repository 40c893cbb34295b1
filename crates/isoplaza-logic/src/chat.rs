//! Chat feed, slash commands and per-author speech bubbles.
//!
//! Bubbles from every source (chat feed, local notices, double-click smiles)
//! land in one [`BubbleBoard`] keyed by author name. The most recently posted
//! bubble for an author wins; expired bubbles are pruned on every pass.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One line from the external chat feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: String,
    pub text: String,
    /// Wall-clock milliseconds.
    pub timestamp: u64,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// What a line typed into the chat box asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `/sit`: toggle sitting.
    Sit,
    /// `/wave`
    Wave,
    /// `/laugh`
    Laugh,
    /// Anything else is sent as a chat line.
    Say(String),
}

impl ChatCommand {
    /// Parse a submitted line. Blank input yields `None`.
    pub fn parse(line: &str) -> Option<ChatCommand> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let cmd = match line.to_ascii_lowercase().as_str() {
            "/sit" => ChatCommand::Sit,
            "/wave" => ChatCommand::Wave,
            "/laugh" => ChatCommand::Laugh,
            _ => ChatCommand::Say(line.to_string()),
        };
        Some(cmd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub text: String,
    pub posted_at: u64,
    pub expires_at: u64,
}

impl Bubble {
    pub fn is_live(&self, now_ms: u64) -> bool {
        self.expires_at > now_ms
    }
}

#[derive(Debug, Clone, Default)]
pub struct BubbleBoard {
    bubbles: HashMap<String, Bubble>,
}

impl BubbleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a bubble for `author` unless a more recent one is already shown.
    pub fn post(&mut self, author: &str, text: &str, posted_at: u64, lifetime_ms: u64) {
        let bubble = Bubble {
            text: text.to_string(),
            posted_at,
            expires_at: posted_at.saturating_add(lifetime_ms),
        };
        match self.bubbles.get(author) {
            Some(existing) if existing.posted_at > posted_at => {}
            _ => {
                self.bubbles.insert(author.to_string(), bubble);
            }
        }
    }

    /// Merge the tail of a chat feed. Only the last `window` messages count;
    /// each lives `lifetime_ms` after its own timestamp.
    pub fn ingest(&mut self, messages: &[ChatMessage], window: usize, lifetime_ms: u64, now_ms: u64) {
        let skip = messages.len().saturating_sub(window);
        for m in &messages[skip..] {
            self.post(&m.author, &m.text, m.timestamp, lifetime_ms);
        }
        self.prune(now_ms);
    }

    pub fn prune(&mut self, now_ms: u64) {
        self.bubbles.retain(|_, b| b.is_live(now_ms));
    }

    /// Live bubble for an author.
    pub fn active(&self, author: &str, now_ms: u64) -> Option<&Bubble> {
        self.bubbles.get(author).filter(|b| b.is_live(now_ms))
    }

    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    pub fn clear(&mut self) {
        self.bubbles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("/sit"), Some(ChatCommand::Sit));
        assert_eq!(ChatCommand::parse("  /WAVE "), Some(ChatCommand::Wave));
        assert_eq!(ChatCommand::parse("/laugh"), Some(ChatCommand::Laugh));
        assert_eq!(
            ChatCommand::parse("/dance"),
            Some(ChatCommand::Say("/dance".into()))
        );
        assert_eq!(
            ChatCommand::parse(" fresh kale! "),
            Some(ChatCommand::Say("fresh kale!".into()))
        );
        assert_eq!(ChatCommand::parse("   "), None);
    }

    #[test]
    fn test_bubble_lifetime() {
        let mut board = BubbleBoard::new();
        board.ingest(&[ChatMessage::new("ann", "hi", 1_000)], 10, 3_000, 1_500);
        assert_eq!(board.active("ann", 3_999).map(|b| b.text.as_str()), Some("hi"));
        assert!(board.active("ann", 4_000).is_none());
        board.prune(4_000);
        assert!(board.is_empty());
    }

    #[test]
    fn test_most_recent_wins() {
        let mut board = BubbleBoard::new();
        let feed = vec![
            ChatMessage::new("ann", "first", 1_000),
            ChatMessage::new("bob", "yo", 1_100),
            ChatMessage::new("ann", "second", 1_200),
        ];
        board.ingest(&feed, 10, 3_000, 1_300);
        assert_eq!(board.active("ann", 1_300).map(|b| b.text.as_str()), Some("second"));
        assert_eq!(board.len(), 2);

        // An older message arriving late does not replace the newer bubble
        board.ingest(&[ChatMessage::new("ann", "stale", 900)], 10, 3_000, 1_300);
        assert_eq!(board.active("ann", 1_300).map(|b| b.text.as_str()), Some("second"));

        // A local notice posted later takes over
        board.post("ann", ":)", 1_400, 2_000);
        assert_eq!(board.active("ann", 1_500).map(|b| b.text.as_str()), Some(":)"));
    }

    #[test]
    fn test_only_recent_window_used() {
        let feed: Vec<ChatMessage> = (0..15)
            .map(|i| ChatMessage::new(format!("user{}", i), "msg", 1_000))
            .collect();
        let mut board = BubbleBoard::new();
        board.ingest(&feed, 10, 3_000, 1_000);
        assert_eq!(board.len(), 10);
        assert!(board.active("user4", 1_000).is_none());
        assert!(board.active("user5", 1_000).is_some());
    }

    #[test]
    fn test_expired_feed_entries_pruned() {
        let mut board = BubbleBoard::new();
        board.ingest(&[ChatMessage::new("old", "gone", 0)], 10, 3_000, 10_000);
        assert!(board.is_empty());
    }
}
