//! Callable tools
//!
//! `greet` and `add` exist in both profiles; the structured profile wraps their
//! answers in sampling message envelopes and adds the elicitation examples.

use rust_mcp_sdk::schema::{ElicitResultAction, TextContent};
use serde_json::json;

use crate::dispatch::Arguments;
use crate::domain::CatalogProfile;
use crate::errors::AppError;
use crate::output::{text_content, ElicitAction, ElicitationEnvelope, HandlerOutput};
use crate::registry::{Handler, ParamKind, ParamSpec};

pub const DEMO_MODEL: &str = "demo-model";

pub fn catalog(profile: CatalogProfile) -> Vec<Handler> {
    let mut handlers = match profile {
        CatalogProfile::Structured => vec![
            Handler::tool(
                "greet",
                "Greet someone and return structured result",
                greet_structured,
            )
            .param(name_param()),
            Handler::tool(
                "add",
                "Add two numbers and return structured result",
                add_structured,
            )
            .param(ParamSpec::required("a", ParamKind::Integer))
            .param(ParamSpec::required("b", ParamKind::Integer)),
        ],
        CatalogProfile::Plain => vec![
            Handler::tool("greet", "Greet someone", greet_plain).param(name_param()),
            Handler::tool("add", "Add two numbers", add_plain)
                .param(ParamSpec::required("a", ParamKind::Integer))
                .param(ParamSpec::required("b", ParamKind::Integer)),
        ],
    };

    if profile == CatalogProfile::Structured {
        handlers.push(
            Handler::tool(
                "elicit_feedback",
                "Ask the user a follow-up question",
                elicit_feedback,
            )
            .param(ParamSpec::required("question", ParamKind::Text)),
        );
        handlers.push(
            Handler::tool(
                "elicit_feedback2",
                "Ask the user a follow-up question",
                elicit_feedback_accept,
            )
            .param(ParamSpec::required("question", ParamKind::Text)),
        );
    }

    handlers
}

fn name_param() -> ParamSpec {
    ParamSpec::optional("name", ParamKind::Text, json!("World"))
}

fn checked_sum(args: &Arguments) -> Result<(i64, i64, i64), AppError> {
    let a = args.integer("a")?;
    let b = args.integer("b")?;
    let sum = a
        .checked_add(b)
        .ok_or_else(|| AppError::handler_execution(format!("sum of {a} and {b} overflows")))?;
    Ok((a, b, sum))
}

pub fn greet_structured(args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::assistant_message(
        format!("Hello {}!", args.text("name")?),
        DEMO_MODEL,
    ))
}

pub fn greet_plain(args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Text(format!("Hello {}", args.text("name")?)))
}

pub fn add_structured(args: &Arguments) -> Result<HandlerOutput, AppError> {
    let (a, b, sum) = checked_sum(args)?;
    Ok(HandlerOutput::assistant_message(
        format!("The sum of {a} and {b} is {sum}."),
        DEMO_MODEL,
    ))
}

pub fn add_plain(args: &Arguments) -> Result<HandlerOutput, AppError> {
    let (_, _, sum) = checked_sum(args)?;
    Ok(HandlerOutput::Structured(json!(sum)))
}

fn feedback_content(question: &str, trailer: &str) -> TextContent {
    text_content(format!(
        "Can you share your thoughts on: {question}? Or should I add 2+3 instead{trailer}"
    ))
}

pub fn elicit_feedback(args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Elicitation(ElicitationEnvelope {
        action: ElicitAction::Named {
            name: "feedback".to_string(),
            description: "Ask for user feedback".to_string(),
        },
        content: feedback_content(args.text("question")?, "??"),
    }))
}

pub fn elicit_feedback_accept(args: &Arguments) -> Result<HandlerOutput, AppError> {
    Ok(HandlerOutput::Elicitation(ElicitationEnvelope {
        action: ElicitAction::Decision(ElicitResultAction::Accept),
        content: feedback_content(args.text("question")?, "?"),
    }))
}
