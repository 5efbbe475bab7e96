//! Tagged handler results
//!
//! Handlers return a [`HandlerOutput`]; the dispatcher decides how each variant
//! is carried for the category being invoked. Message and prompt results are
//! the SDK schema types; only elicitation needs a local shape because its
//! action may be a named custom action.

use rust_mcp_sdk::schema::{
    ContentBlock, CreateMessageResult, ElicitResultAction, GetPromptResult, PromptMessage, Role,
    TextContent,
};
use serde::Serialize;
use serde_json::Value;

/// Serialized as a bare string for the standard decisions and as an object
/// for named custom actions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElicitAction {
    Decision(ElicitResultAction),
    Named { name: String, description: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ElicitationEnvelope {
    pub action: ElicitAction,
    pub content: TextContent,
}

#[derive(Debug, Clone)]
pub enum HandlerOutput {
    Text(String),
    Structured(Value),
    Message(CreateMessageResult),
    Elicitation(ElicitationEnvelope),
    Prompt(GetPromptResult),
}

impl HandlerOutput {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Structured(_) => "structured",
            Self::Message(_) => "message",
            Self::Elicitation(_) => "elicitation",
            Self::Prompt(_) => "prompt",
        }
    }

    /// Sampling-style "create message" answer spoken by `model`.
    pub fn assistant_message(text: String, model: &str) -> Self {
        Self::Message(CreateMessageResult {
            content: text_content(text).into(),
            meta: None,
            model: model.to_string(),
            role: Role::Assistant,
            stop_reason: None,
        })
    }
}

pub fn text_content(text: impl Into<String>) -> TextContent {
    TextContent::new(text.into(), None, None)
}

pub fn user_message(text: impl Into<String>) -> PromptMessage {
    PromptMessage {
        content: ContentBlock::from(text_content(text)),
        role: Role::User,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn standard_elicit_action_serializes_as_string() {
        let envelope = ElicitationEnvelope {
            action: ElicitAction::Decision(ElicitResultAction::Accept),
            content: text_content("q?"),
        };

        assert_eq!(
            serde_json::to_value(&envelope).expect("serialize"),
            json!({"action": "accept", "content": {"type": "text", "text": "q?"}})
        );
    }

    #[test]
    fn named_elicit_action_serializes_as_object() {
        let action = ElicitAction::Named {
            name: "feedback".to_string(),
            description: "Ask for user feedback".to_string(),
        };

        assert_eq!(
            serde_json::to_value(&action).expect("serialize"),
            json!({"name": "feedback", "description": "Ask for user feedback"})
        );
    }

    #[test]
    fn assistant_message_carries_model_and_role() {
        let HandlerOutput::Message(message) =
            HandlerOutput::assistant_message("hi".to_string(), "m-1")
        else {
            panic!("expected message");
        };

        let value = serde_json::to_value(&message).expect("serialize");
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["model"], "m-1");
        assert_eq!(value["content"], json!({"type": "text", "text": "hi"}));
        assert!(value.get("stopReason").is_none());
    }

    #[test]
    fn user_message_is_text_block() {
        let value = serde_json::to_value(user_message("hello")).expect("serialize");
        assert_eq!(value, json!({"role": "user", "content": {"type": "text", "text": "hello"}}));
    }
}
