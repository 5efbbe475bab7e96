//! Request-to-handler dispatch
//!
//! Binds caller arguments against a handler's declared parameters, runs the
//! handler, and wraps its [`HandlerOutput`] in the MCP result shape of the
//! category being invoked.

use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use rust_mcp_sdk::schema::{
    CallToolResult, ContentBlock, GetPromptResult, ReadResourceContent, ReadResourceResult,
    TextResourceContents,
};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::output::{text_content, user_message, HandlerOutput};
use crate::registry::{Category, Handler, ParamKind, ParamSpec, Registry};

/// Arguments after binding: every declared parameter is present and typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Result<&str, AppError> {
        self.0.get(name).and_then(Value::as_str).ok_or_else(|| {
            AppError::invalid_arguments("missing_argument", format!("{name} must be a string"))
        })
    }

    pub fn integer(&self, name: &str) -> Result<i64, AppError> {
        self.0.get(name).and_then(Value::as_i64).ok_or_else(|| {
            AppError::invalid_arguments("missing_argument", format!("{name} must be an integer"))
        })
    }
}

pub fn bind_arguments(params: &[ParamSpec], raw: Option<Value>) -> Result<Arguments, AppError> {
    let mut provided = match raw {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AppError::invalid_arguments(
                "invalid_arguments",
                "arguments must be an object",
            ))
        }
    };

    let mut bound = Map::new();
    for param in params {
        let value = match provided.remove(param.name) {
            Some(Value::Null) | None => match &param.default {
                Some(default) => default.clone(),
                None => {
                    return Err(AppError::invalid_arguments(
                        "missing_argument",
                        format!("missing required argument: {}", param.name),
                    ))
                }
            },
            Some(value) => coerce(param, value)?,
        };
        bound.insert(param.name.to_string(), value);
    }

    Ok(Arguments(bound))
}

fn coerce(param: &ParamSpec, value: Value) -> Result<Value, AppError> {
    let mismatch = || {
        AppError::invalid_arguments(
            "invalid_argument_type",
            format!("{} must be of type {}", param.name, param.kind.json_type()),
        )
    };

    match (param.kind, value) {
        (ParamKind::Text, value @ Value::String(_)) => Ok(value),
        (ParamKind::Integer, Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_number))
            .map(Value::from)
            .ok_or_else(mismatch),
        (ParamKind::Integer, Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// `2.0` binds as `2`; fractional, non-finite and out-of-range values do not.
fn whole_number(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the handler registered under `identifier` and returns the MCP
    /// result object for `category`.
    pub fn invoke(
        &self,
        category: Category,
        identifier: &str,
        args: Option<Value>,
    ) -> Result<Value, AppError> {
        let (handler, args) = match category {
            Category::Resource => {
                let matched = self.registry.match_resource(identifier)?;
                let args = match matched.captured {
                    Some((placeholder, value)) => {
                        let mut map = match args {
                            Some(Value::Object(map)) => map,
                            _ => Map::new(),
                        };
                        map.insert(placeholder, Value::String(value));
                        Some(Value::Object(map))
                    }
                    None => args,
                };
                (matched.handler, args)
            }
            Category::Tool | Category::Prompt => (self.registry.lookup(category, identifier)?, args),
        };

        let arguments = bind_arguments(&handler.params, args)?;
        debug!(category = %category, name = %handler.name, "invoking handler");
        let output = run_handler(handler, &arguments)?;

        match category {
            Category::Tool => tool_envelope(output),
            Category::Resource => resource_envelope(identifier, handler.mime_type, output),
            Category::Prompt => prompt_envelope(output),
        }
    }
}

fn run_handler(handler: &Handler, arguments: &Arguments) -> Result<HandlerOutput, AppError> {
    match catch_unwind(AssertUnwindSafe(|| handler.call(arguments))) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(AppError::HandlerExecution { message })) => Err(AppError::handler_execution(message)),
        Ok(Err(AppError::InvalidArguments { message, .. })) => {
            Err(AppError::handler_execution(message))
        }
        Ok(Err(err)) => Err(AppError::handler_execution(err.to_string())),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(name = %handler.name, error = %message, "handler panicked");
            Err(AppError::handler_execution(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn text_result(text: String, structured: Option<Map<String, Value>>) -> Result<Value, AppError> {
    Ok(serde_json::to_value(CallToolResult {
        content: vec![ContentBlock::from(text_content(text))],
        is_error: None,
        meta: None,
        structured_content: structured,
    })?)
}

fn as_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => Map::from_iter([("result".to_string(), other)]),
    }
}

fn tool_envelope(output: HandlerOutput) -> Result<Value, AppError> {
    match output {
        HandlerOutput::Text(text) => text_result(text, None),
        HandlerOutput::Structured(value) => {
            let text = match &value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            text_result(text, Some(as_object(value)))
        }
        HandlerOutput::Message(envelope) => {
            let value = serde_json::to_value(&envelope)?;
            text_result(value.to_string(), Some(as_object(value)))
        }
        HandlerOutput::Elicitation(envelope) => {
            let value = serde_json::to_value(&envelope)?;
            text_result(value.to_string(), Some(as_object(value)))
        }
        other @ HandlerOutput::Prompt(_) => Err(unsupported(Category::Tool, &other)),
    }
}

/// Error result for a tool whose handler failed.
pub fn tool_error_result(message: &str) -> Value {
    json!({
        "content": [{ "type": "text", "text": message }],
        "isError": true
    })
}

fn resource_envelope(
    uri: &str,
    mime_type: Option<&'static str>,
    output: HandlerOutput,
) -> Result<Value, AppError> {
    let (text, default_mime) = match output {
        HandlerOutput::Text(text) => (text, "text/plain"),
        HandlerOutput::Structured(value) => (value.to_string(), "application/json"),
        HandlerOutput::Message(envelope) => {
            (serde_json::to_string(&envelope)?, "application/json")
        }
        HandlerOutput::Elicitation(envelope) => {
            (serde_json::to_string(&envelope)?, "application/json")
        }
        other @ HandlerOutput::Prompt(_) => return Err(unsupported(Category::Resource, &other)),
    };

    Ok(serde_json::to_value(ReadResourceResult {
        contents: vec![ReadResourceContent::from(TextResourceContents {
            meta: None,
            mime_type: Some(mime_type.unwrap_or(default_mime).to_string()),
            text,
            uri: uri.to_string(),
        })],
        meta: None,
    })?)
}

fn prompt_envelope(output: HandlerOutput) -> Result<Value, AppError> {
    let prompt = match output {
        HandlerOutput::Prompt(prompt) => prompt,
        HandlerOutput::Text(text) => GetPromptResult {
            description: None,
            messages: vec![user_message(text)],
            meta: None,
        },
        other => return Err(unsupported(Category::Prompt, &other)),
    };

    Ok(serde_json::to_value(prompt)?)
}

fn unsupported(category: Category, output: &HandlerOutput) -> AppError {
    AppError::handler_execution(format!(
        "{category} handler returned unsupported {} output",
        output.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{ElicitAction, ElicitationEnvelope};
    use rust_mcp_sdk::schema::ElicitResultAction;

    fn registry() -> Arc<Registry> {
        let mut registry = Registry::new();
        registry
            .register(
                Handler::tool("sum", "adds", |args| {
                    Ok(HandlerOutput::Structured(json!(
                        args.integer("a")? + args.integer("b")?
                    )))
                })
                .param(ParamSpec::required("a", ParamKind::Integer))
                .param(ParamSpec::required("b", ParamKind::Integer)),
            )
            .expect("sum");
        registry
            .register(
                Handler::tool("hello", "greets", |args| {
                    Ok(HandlerOutput::Text(format!("Hello {}", args.text("name")?)))
                })
                .param(ParamSpec::optional("name", ParamKind::Text, json!("World"))),
            )
            .expect("hello");
        registry
            .register(Handler::tool("fails", "always fails", |_| {
                Err(AppError::handler_execution("disk on fire"))
            }))
            .expect("fails");
        registry
            .register(Handler::tool("panics", "always panics", |_| {
                panic!("handler exploded")
            }))
            .expect("panics");
        registry
            .register(Handler::tool("reads_missing", "reads an undeclared argument", |args| {
                Ok(HandlerOutput::Text(args.text("ghost")?.to_string()))
            }))
            .expect("reads_missing");
        registry
            .register(Handler::tool("ask", "elicits", |_| {
                Ok(HandlerOutput::Elicitation(ElicitationEnvelope {
                    action: ElicitAction::Decision(ElicitResultAction::Decline),
                    content: text_content("why?"),
                }))
            }))
            .expect("ask");
        registry
            .register(
                Handler::resource("echo://{word}", "echo", "echo word", |args| {
                    Ok(HandlerOutput::Text(args.text("word")?.to_string()))
                })
                .param(ParamSpec::required("word", ParamKind::Text)),
            )
            .expect("echo");
        registry
            .register(Handler::resource("echo://fixed", "fixed", "fixed word", |_| {
                Ok(HandlerOutput::Text("literal".to_string()))
            }))
            .expect("fixed");
        registry
            .register(Handler::prompt("plain", "text prompt", |_| {
                Ok(HandlerOutput::Text("say hi".to_string()))
            }))
            .expect("plain");
        Arc::new(registry)
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(registry())
    }

    #[test]
    fn bind_applies_defaults() {
        let params = [ParamSpec::optional("style", ParamKind::Text, json!("friendly"))];
        let args = bind_arguments(&params, None).expect("bind");
        assert_eq!(args.text("style").expect("style"), "friendly");

        let args = bind_arguments(&params, Some(json!({ "style": null }))).expect("bind null");
        assert_eq!(args.text("style").expect("style"), "friendly");
    }

    #[test]
    fn bind_rejects_missing_required() {
        let params = [ParamSpec::required("a", ParamKind::Integer)];
        let err = bind_arguments(&params, Some(json!({}))).expect_err("missing a");
        assert_eq!(err.code(), "missing_argument");
    }

    #[test]
    fn bind_rejects_type_mismatch() {
        let params = [ParamSpec::required("name", ParamKind::Text)];
        let err = bind_arguments(&params, Some(json!({ "name": 5 }))).expect_err("mismatch");
        assert_eq!(err.code(), "invalid_argument_type");

        let params = [ParamSpec::required("a", ParamKind::Integer)];
        for value in [json!(1.5), json!("seven"), json!(true)] {
            let err = bind_arguments(&params, Some(json!({ "a": value }))).expect_err("mismatch");
            assert_eq!(err.code(), "invalid_argument_type");
        }
    }

    #[test]
    fn bind_coerces_integer_strings() {
        let params = [ParamSpec::required("a", ParamKind::Integer)];
        let args = bind_arguments(&params, Some(json!({ "a": " 42 " }))).expect("coerce");
        assert_eq!(args.integer("a").expect("a"), 42);
    }

    #[test]
    fn bind_coerces_whole_floats() {
        let params = [ParamSpec::required("a", ParamKind::Integer)];
        for (raw, expected) in [(json!(2.0), 2), (json!(-7.0), -7), (json!(0.0), 0)] {
            let args = bind_arguments(&params, Some(json!({ "a": raw }))).expect("coerce");
            assert_eq!(args.integer("a").expect("a"), expected);
        }

        for raw in [json!(2.5), json!(1e300), json!(-0.25)] {
            let err = bind_arguments(&params, Some(json!({ "a": raw }))).expect_err("fractional");
            assert_eq!(err.code(), "invalid_argument_type");
        }
    }

    #[test]
    fn invoke_add_accepts_whole_float() {
        let result = dispatcher()
            .invoke(Category::Tool, "sum", Some(json!({ "a": 2.0, "b": 3 })))
            .expect("invoke");
        assert_eq!(result["structuredContent"]["result"], 5);
    }

    #[test]
    fn bind_rejects_non_object_arguments() {
        let err = bind_arguments(&[], Some(json!([1, 2]))).expect_err("array");
        assert_eq!(err.code(), "invalid_arguments");
    }

    #[test]
    fn bind_ignores_undeclared_arguments() {
        let params = [ParamSpec::required("a", ParamKind::Integer)];
        let args = bind_arguments(&params, Some(json!({ "a": 1, "extra": "x" }))).expect("bind");
        assert!(args.get("extra").is_none());
    }

    #[test]
    fn invoke_tool_wraps_structured_value() {
        let result = dispatcher()
            .invoke(Category::Tool, "sum", Some(json!({ "a": 2, "b": 3 })))
            .expect("invoke");

        assert_eq!(result["content"][0]["text"], "5");
        assert_eq!(result["structuredContent"]["result"], 5);
    }

    #[test]
    fn invoke_tool_wraps_text_without_structured_content() {
        let result = dispatcher()
            .invoke(Category::Tool, "hello", None)
            .expect("invoke");

        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "Hello World");
        assert!(result.get("structuredContent").is_none());
    }

    #[test]
    fn invoke_tool_wraps_elicitation() {
        let result = dispatcher()
            .invoke(Category::Tool, "ask", None)
            .expect("invoke");

        assert_eq!(result["structuredContent"]["action"], "decline");
        assert_eq!(result["structuredContent"]["content"]["text"], "why?");
    }

    #[test]
    fn invoke_unknown_tool_is_not_found() {
        let err = dispatcher()
            .invoke(Category::Tool, "missing", None)
            .expect_err("unknown");
        assert!(matches!(err, AppError::NotFound { category: Category::Tool, .. }));
    }

    #[test]
    fn handler_error_keeps_its_message() {
        let err = dispatcher()
            .invoke(Category::Tool, "fails", None)
            .expect_err("fails");
        assert!(matches!(err, AppError::HandlerExecution { ref message } if message == "disk on fire"));
    }

    #[test]
    fn handler_panic_becomes_execution_error() {
        let err = dispatcher()
            .invoke(Category::Tool, "panics", None)
            .expect_err("panics");
        assert!(matches!(err, AppError::HandlerExecution { ref message } if message == "handler exploded"));
    }

    #[test]
    fn argument_error_inside_handler_is_execution_error() {
        let err = dispatcher()
            .invoke(Category::Tool, "reads_missing", None)
            .expect_err("handler bug");
        assert!(
            matches!(err, AppError::HandlerExecution { ref message } if message == "ghost must be a string")
        );
    }

    #[test]
    fn invoke_resource_binds_placeholder() {
        let result = dispatcher()
            .invoke(Category::Resource, "echo://bird", None)
            .expect("invoke");

        assert_eq!(result["contents"][0]["uri"], "echo://bird");
        assert_eq!(result["contents"][0]["text"], "bird");
        assert_eq!(result["contents"][0]["mimeType"], "text/plain");
    }

    #[test]
    fn invoke_resource_prefers_literal() {
        let result = dispatcher()
            .invoke(Category::Resource, "echo://fixed", None)
            .expect("invoke");
        assert_eq!(result["contents"][0]["text"], "literal");
    }

    #[test]
    fn invoke_resource_without_match_fails() {
        let err = dispatcher()
            .invoke(Category::Resource, "nothing://here", None)
            .expect_err("no match");
        assert!(matches!(err, AppError::NoMatch { .. }));
    }

    #[test]
    fn invoke_prompt_wraps_text_as_user_message() {
        let result = dispatcher()
            .invoke(Category::Prompt, "plain", None)
            .expect("invoke");

        assert_eq!(result["messages"][0]["role"], "user");
        assert_eq!(result["messages"][0]["content"]["text"], "say hi");
    }

    #[test]
    fn tool_error_result_is_flagged() {
        let result = tool_error_result("nope");
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "nope");
    }
}
