//! Prompt templates

use rust_mcp_sdk::schema::GetPromptResult;
use serde_json::{json, Map};

use crate::dispatch::Arguments;
use crate::errors::AppError;
use crate::output::{user_message, HandlerOutput};
use crate::registry::{Handler, ParamKind, ParamSpec};

pub const DEFAULT_STYLE: &str = "friendly";

pub fn catalog() -> Vec<Handler> {
    vec![Handler::prompt("greet_user", "Generate a greeting prompt", greet_user)
        .param(ParamSpec::required("name", ParamKind::Text))
        .param(
            ParamSpec::optional("style", ParamKind::Text, json!(DEFAULT_STYLE))
                .describe("One of: friendly, formal, casual"),
        )]
}

/// Instruction prefix for a style; unknown styles fall back to friendly.
pub fn style_prefix(style: &str) -> &'static str {
    match style {
        "formal" => "Please write a formal, professional greeting",
        "casual" => "Please write a casual, relaxed greeting",
        _ => "Please write a warm, friendly greeting",
    }
}

pub fn greet_user(args: &Arguments) -> Result<HandlerOutput, AppError> {
    let name = args.text("name")?;
    let style = args.text("style")?;

    Ok(HandlerOutput::Prompt(GetPromptResult {
        description: Some("A prompt that asks for a specific style of greeting.".to_string()),
        messages: vec![user_message(format!(
            "{} for someone named {name}.",
            style_prefix(style)
        ))],
        meta: Some(Map::from_iter([("style".to_string(), json!(style))])),
    }))
}
