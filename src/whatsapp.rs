//! Parsing of exported WhatsApp chat logs.
//!
//! The export is a text file where each message starts with a header like
//! `[2021-05-05, 11:44:26] Author: message content`.
//! Lines without a header continue the previous message.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Invisible direction mark that some exports put before the header.
const LEFT_TO_RIGHT_MARK: char = '\u{200E}';

static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\d{4}-\d{2}-\d{2},\W\d{2}:\d{2}:\d{2}\]").expect("Failed to create regex pattern for message header")
});

static RE_MESSAGE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\d{4}-\d{2}-\d{2},\W\d{2}:\d{2}:\d{2}\]").expect("Failed to create regex pattern for message start")
});

static RE_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?P<date>\d{4}-\d{2}-\d{2}),\W(?P<time>\d{2}:\d{2}:\d{2})\]\W(?P<author>.*?):\W(?P<content>.*)$")
        .expect("Failed to create regex pattern for message")
});

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Send time as `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub author: String,
    pub content: String,
}

impl ChatMessage {
    /// Parsed send time, if the timestamp is a valid date and time.
    #[must_use]
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT).ok()
    }
}

/// Check if the line starts a new message.
///
/// ```rust
/// use warehouse_utils::whatsapp::is_complete_message;
///
/// assert!(is_complete_message("[2021-05-05, 11:44:26] A: message content"));
/// assert!(!is_complete_message("Message content"));
/// ```
#[must_use]
pub fn is_complete_message(line: &str) -> bool {
    RE_MESSAGE_START.is_match(strip_direction_mark(line))
}

/// Count the number of messages in an exported chat.
#[must_use]
pub fn count_messages(text: &str) -> usize {
    RE_HEADER.find_iter(text).count()
}

/// Parse a message line.
///
/// The author is everything before the first `": "` after the header.
///
/// # Errors
/// Returns [`Error::InvalidChatMessage`] if the line is not a message with an author.
///
/// ```rust
/// use warehouse_utils::whatsapp::parse_message;
///
/// let message = parse_message("[2021-01-01, 00:00:00] Author: Message").unwrap();
/// assert_eq!(message.timestamp, "2021-01-01 00:00:00");
/// assert_eq!(message.author, "Author");
/// assert_eq!(message.content, "Message");
/// ```
pub fn parse_message(line: &str) -> Result<ChatMessage, Error> {
    let caps = RE_MESSAGE
        .captures(strip_direction_mark(line))
        .ok_or_else(|| Error::InvalidChatMessage { line: line.to_string() })?;

    Ok(ChatMessage {
        timestamp: format!("{} {}", &caps["date"], &caps["time"]),
        author: caps["author"].to_string(),
        content: caps["content"].to_string(),
    })
}

/// Parse all messages from an exported chat.
///
/// Lines without a header are appended to the previous message.
/// Header lines without an author, like encryption notices, are skipped
/// together with their continuation lines.
#[must_use]
pub fn parse_chat(text: &str) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = Vec::new();
    let mut continues_message = false;

    for line in text.lines() {
        if is_complete_message(line) {
            match parse_message(line) {
                Ok(message) => {
                    messages.push(message);
                    continues_message = true;
                }
                Err(_) => continues_message = false,
            }
        } else if continues_message && let Some(last) = messages.last_mut() {
            last.content.push('\n');
            last.content.push_str(line);
        }
    }

    messages
}

/// Return the messages that come after the last processed message.
///
/// The last processed message is looked up by value first.
/// If it is not found, messages newer than its timestamp are returned.
#[must_use]
pub fn new_messages<'a>(messages: &'a [ChatMessage], last: Option<&ChatMessage>) -> &'a [ChatMessage] {
    let Some(last) = last else {
        return messages;
    };

    if let Some(position) = messages.iter().rposition(|message| message == last) {
        return &messages[position + 1..];
    }

    let Some(last_time) = last.datetime() else {
        return messages;
    };
    let start = messages
        .iter()
        .position(|message| message.datetime().is_some_and(|time| time > last_time))
        .unwrap_or(messages.len());
    &messages[start..]
}

/// Read the last message written to a newline-delimited JSON output file.
///
/// Returns `None` if the file does not exist or has no messages.
///
/// # Errors
/// Returns an error if the file cannot be read or the last line is not a message.
pub fn last_processed_message(path: &Path) -> Result<Option<ChatMessage>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let Some(last_line) = content.lines().rev().find(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };
    let message = serde_json::from_str(last_line.trim())
        .with_context(|| format!("Failed to parse last message in {}", path.display()))?;
    Ok(Some(message))
}

/// Write messages to a newline-delimited JSON file.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_ndjson(path: &Path, messages: &[ChatMessage], append: bool) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    for message in messages {
        serde_json::to_writer(&mut writer, message)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Convert an exported chat to newline-delimited JSON,
/// only appending the messages that are not in the output file yet.
///
/// Returns the number of messages written.
///
/// # Errors
/// Returns an error if the chat cannot be read or the output cannot be written.
pub fn export_chat(chat_path: &Path, output_path: &Path) -> Result<usize> {
    let bytes = fs::read(chat_path).with_context(|| format!("Failed to read chat: {}", chat_path.display()))?;
    let text = String::from_utf8_lossy(&bytes);
    let messages = parse_chat(&text);

    let last = last_processed_message(output_path)?;
    let pending = new_messages(&messages, last.as_ref());
    if !pending.is_empty() {
        write_ndjson(output_path, pending, last.is_some())?;
    }
    Ok(pending.len())
}

fn strip_direction_mark(line: &str) -> &str {
    line.trim_start_matches(LEFT_TO_RIGHT_MARK)
}

#[cfg(test)]
mod parse_tests {
    use super::*;

    #[test]
    fn complete_message() {
        assert!(is_complete_message("[2021-05-05, 11:44:26] A: message content"));
        assert!(is_complete_message("\u{200E}[2021-05-05, 11:44:26] A: <attached: photo.jpg>"));
        assert!(!is_complete_message("Message content"));
        assert!(!is_complete_message("see [2021-05-05, 11:44:26]"));
    }

    #[test]
    fn parses_message() {
        let message = parse_message("[2021-01-01, 00:00:00] Author: Message").expect("should parse");
        assert_eq!(
            message,
            ChatMessage {
                timestamp: "2021-01-01 00:00:00".to_string(),
                author: "Author".to_string(),
                content: "Message".to_string(),
            }
        );
    }

    #[test]
    fn author_ends_at_first_separator() {
        let message = parse_message("[2021-01-01, 10:00:00] Gonçalo Miranda: note: buy milk").expect("should parse");
        assert_eq!(message.author, "Gonçalo Miranda");
        assert_eq!(message.content, "note: buy milk");
    }

    #[test]
    fn narrow_no_break_space_separator() {
        let message = parse_message("[2021-01-01,\u{202F}10:00:00] A: hi").expect("should parse");
        assert_eq!(message.timestamp, "2021-01-01 10:00:00");
    }

    #[test]
    fn system_message_is_an_error() {
        let line = "[2021-01-01, 00:00:00] Messages are end-to-end encrypted.";
        assert_eq!(
            parse_message(line),
            Err(Error::InvalidChatMessage { line: line.to_string() })
        );
    }

    #[test]
    fn counts_messages() {
        let text = "[2021-05-05, 11:44:26] A: one\n[2021-05-05, 11:45:00] B: two\ncontinued\n";
        assert_eq!(count_messages(text), 2);
        assert_eq!(count_messages(""), 0);
    }

    #[test]
    fn datetime_from_timestamp() {
        let message = parse_message("[2021-05-05, 11:44:26] A: hi").expect("should parse");
        let datetime = message.datetime().expect("should be a valid datetime");
        assert_eq!(datetime.to_string(), "2021-05-05 11:44:26");
    }
}
