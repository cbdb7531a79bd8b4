use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::TestScope;

/// Author of a refinement chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "USER",
            ChatRole::Assistant => "ASSISTANT",
            ChatRole::System => "SYSTEM",
        }
    }
}

/// One turn of a refinement conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Local::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    /// Wall-clock time of the message as HH:MM
    pub fn formatted_time(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// State of a refinement session over one generated test file
#[derive(Debug, Clone)]
pub struct RefineContext {
    pub original_code: String,
    pub current_code: String,
    pub scope: TestScope,
    pub target_class_name: Option<String>,
    pub package_name: String,
    pub messages: Vec<ChatMessage>,
}

impl RefineContext {
    pub fn new(code: impl Into<String>, scope: TestScope, package_name: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            original_code: code.clone(),
            current_code: code,
            scope,
            target_class_name: None,
            package_name: package_name.into(),
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Prior turns rendered as "ROLE: content" blocks
    pub fn conversation_history(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Record a refinement round and adopt the refined code
    pub fn apply(&mut self, user_message: &str, refinement: &Refinement) {
        self.add_message(ChatMessage::user(user_message));
        self.add_message(ChatMessage::assistant(refinement.explanation.clone()));
        self.current_code = refinement.code.clone();
    }
}

/// Refined code and the model's explanation of the change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refinement {
    pub code: String,
    pub explanation: String,
}
