//! Chat log: connection notices and short messages sharing the stroke transport.

use serde::{Deserialize, Serialize};

/// Kind of chat entry, as carried in the frame's `chatType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// Join/leave notice.
    #[serde(rename = "CONNECTION")]
    Connection,
    /// Message typed by a participant.
    #[serde(rename = "CHAT")]
    Message,
}

/// One entry of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    #[serde(rename = "chatType")]
    pub kind: ChatKind,
    #[serde(rename = "userId")]
    pub author_id: String,
    #[serde(rename = "message")]
    pub text: String,
}

impl ChatEntry {
    /// Notice announcing that `author_id` joined the room.
    pub fn joined(author_id: &str) -> Self {
        Self {
            kind: ChatKind::Connection,
            author_id: author_id.to_string(),
            text: format!("{author_id} joined"),
        }
    }

    /// Notice announcing that `author_id` left the room.
    pub fn left(author_id: &str) -> Self {
        Self {
            kind: ChatKind::Connection,
            author_id: author_id.to_string(),
            text: format!("{author_id} left"),
        }
    }

    /// A typed message. Returns `None` when the text is blank.
    pub fn message(author_id: &str, text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            kind: ChatKind::Message,
            author_id: author_id.to_string(),
            text: text.to_string(),
        })
    }

    pub fn is_notice(&self) -> bool {
        self.kind == ChatKind::Connection
    }
}

/// Ordered chat entries in arrival order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatLog {
    entries: Vec<ChatEntry>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    /// Entries typed by participants, skipping connection notices.
    pub fn messages(&self) -> impl Iterator<Item = &ChatEntry> {
        self.entries.iter().filter(|e| !e.is_notice())
    }
}

/// Whether `entry` was authored by `local_id` (rendered on the "mine" side).
pub fn is_mine(entry: &ChatEntry, local_id: &str) -> bool {
    entry.author_id == local_id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices() {
        let joined = ChatEntry::joined("u1");
        assert_eq!(joined.kind, ChatKind::Connection);
        assert_eq!(joined.text, "u1 joined");
        assert_eq!(ChatEntry::left("u1").text, "u1 left");
    }

    #[test]
    fn test_blank_message_rejected() {
        assert!(ChatEntry::message("u1", "   ").is_none());
        assert!(ChatEntry::message("u1", "").is_none());
        let entry = ChatEntry::message("u1", " hi ").unwrap();
        assert_eq!(entry.text, " hi ");
    }

    #[test]
    fn test_entry_wire_fields() {
        let entry = ChatEntry::message("u1", "hello").unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["chatType"], "CHAT");
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["message"], "hello");
    }

    #[test]
    fn test_log_filters_messages() {
        let mut log = ChatLog::new();
        log.append(ChatEntry::joined("u1"));
        log.append(ChatEntry::message("u1", "hello").unwrap());
        log.append(ChatEntry::message("u2", "hey").unwrap());

        assert_eq!(log.len(), 3);
        assert_eq!(log.messages().count(), 2);
        assert!(is_mine(log.last().unwrap(), "u2"));
        assert!(!is_mine(log.last().unwrap(), "u1"));
    }
}
