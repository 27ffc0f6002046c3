//! MessageLog: the session-local, append-only message list.
//!
//! Messages carry no sender, no timestamp, and are never deduplicated,
//! reordered, or deleted.  Blank input is ignored.

/// Ordered, append-only sequence of free-text messages.
#[derive(Debug, Default, Clone)]
pub struct MessageLog {
    messages: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` verbatim unless it is empty after trimming.
    ///
    /// Returns `true` if the message was appended.
    pub fn post(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(text.to_string());
        true
    }

    /// Snapshot of every message in insertion order.
    pub fn read(&self) -> Vec<String> {
        self.messages.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_posts_are_no_ops() {
        let mut log = MessageLog::new();
        assert!(!log.post(""));
        assert!(!log.post("   "));
        assert!(!log.post("\t\n"));
        assert!(log.read().is_empty());
    }

    #[test]
    fn test_posts_keep_insertion_order() {
        let mut log = MessageLog::new();
        assert!(log.post("hi"));
        assert!(log.post("there"));
        assert_eq!(log.read(), vec!["hi", "there"]);
    }

    #[test]
    fn test_text_is_stored_verbatim_including_whitespace() {
        let mut log = MessageLog::new();
        log.post("  padded  ");
        assert_eq!(log.read(), vec!["  padded  "]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut log = MessageLog::new();
        log.post("ping");
        log.post("ping");
        assert_eq!(log.read(), vec!["ping", "ping"]);
    }

    #[test]
    fn test_read_returns_a_snapshot() {
        let mut log = MessageLog::new();
        log.post("first");
        let snapshot = log.read();
        log.post("second");
        assert_eq!(snapshot, vec!["first"]);
        assert_eq!(log.read(), vec!["first", "second"]);
    }
}
