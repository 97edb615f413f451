//! Chat transcript

use std::fmt;

use chrono::{DateTime, Local};

/// Opening line from the coach
pub const GREETING: &str = "Hi! Ask me anything about your workout.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Coach,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub text: String,
    pub speaker: Speaker,
    pub timestamp: DateTime<Local>,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match self.speaker {
            Speaker::User => "you",
            Speaker::Coach => "coach",
        };
        write!(f, "[{}] {}: {}", self.timestamp.format("%H:%M"), who, self.text)
    }
}

/// Messages in the order they were exchanged, starting with the greeting.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
        };
        conversation.push(Speaker::Coach, GREETING.to_owned());
        conversation
    }

    /// Add what the user typed. Blank input is not a message.
    pub fn push_user(&mut self, text: &str) -> Option<&Message> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(self.push(Speaker::User, text.to_owned()))
    }

    pub fn push_coach(&mut self, text: impl Into<String>) -> &Message {
        self.push(Speaker::Coach, text.into())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn push(&mut self, speaker: Speaker, text: String) -> &Message {
        self.messages.push(Message {
            text,
            speaker,
            timestamp: Local::now(),
        });
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting() {
        let conversation = Conversation::new();
        let messages = conversation.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].speaker, Speaker::Coach);
        assert_eq!(messages[0].text, GREETING);
    }

    #[test]
    fn blank_input_is_skipped() {
        let mut conversation = Conversation::new();
        assert!(conversation.push_user("").is_none());
        assert!(conversation.push_user("   \t").is_none());
        assert_eq!(conversation.messages().len(), 1);
    }

    #[test]
    fn exchange_is_kept_in_order() {
        let mut conversation = Conversation::new();
        let asked = conversation.push_user("  How many squats?  ").unwrap();
        assert_eq!(asked.text, "How many squats?");
        conversation.push_coach("Start with 3 sets of 12.");

        let messages = conversation.messages();
        let speakers: Vec<Speaker> = messages.iter().map(|m| m.speaker).collect();
        assert_eq!(speakers, vec![Speaker::Coach, Speaker::User, Speaker::Coach]);
        assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn rendered_with_time_and_speaker() {
        let mut conversation = Conversation::new();
        let line = conversation.push_user("hello").unwrap().to_string();
        assert!(line.ends_with("] you: hello"));
        assert_eq!(line.len(), "[HH:MM] you: hello".len());
    }
}
