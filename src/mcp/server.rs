//! MCP method routing
//!
//! Decodes JSON-RPC messages and batches, checks request shapes against the
//! SDK schema types, negotiates `initialize`, and maps the list/call/read/get
//! methods onto the [`Dispatcher`](crate::dispatch::Dispatcher).

use std::collections::HashMap;

use rust_mcp_sdk::schema::{
    CallToolRequest, CallToolRequestParams, GetPromptRequest, GetPromptRequestParams,
    Implementation, InitializeRequest, InitializeResult, JsonrpcMessage, JsonrpcRequest,
    ListPromptsRequest, ListPromptsResult, ListResourceTemplatesRequest,
    ListResourceTemplatesResult, ListResourcesRequest, ListResourcesResult, ListToolsRequest,
    ListToolsResult, PingRequest, Prompt, PromptArgument, ProtocolVersion, ReadResourceRequest,
    ReadResourceRequestParams, Resource, ResourceTemplate, ServerCapabilities,
    ServerCapabilitiesPrompts, ServerCapabilitiesResources, ServerCapabilitiesTools, Tool,
    ToolInputSchema,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::dispatch::tool_error_result;
use crate::domain::SERVER_NAME;
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    request_id_to_value, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND,
};
use crate::registry::{Category, Handler, Registry};
use crate::{errors::AppError, AppState};

pub const SUPPORTED_PROTOCOL_VERSIONS: [ProtocolVersion; 3] = [
    ProtocolVersion::V2025_06_18,
    ProtocolVersion::V2025_03_26,
    ProtocolVersion::V2024_11_05,
];

/// Offered when a client asks for a version outside the supported set.
pub const LATEST_PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V2025_06_18;

/// Handles one decoded request body. `None` means nothing needs to be sent
/// back: a lone notification or a batch made only of notifications.
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(Value::Array(vec![json_rpc_error(
            None,
            INVALID_REQUEST,
            "Invalid Request",
        )]));
    }

    let mut responses = Vec::with_capacity(batch.len());
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item).await {
            responses.push(response);
        }
    }

    (!responses.is_empty()).then_some(Value::Array(responses))
}

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(
                handle_json_rpc_request(
                    state,
                    Some(request_id),
                    request.method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            if notification.method.trim().is_empty() {
                return None;
            }

            let _ = handle_json_rpc_request(
                state,
                None,
                notification.method,
                notification.params.map(Value::Object),
            )
            .await;
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let request_id = Some(request_id_to_value(request.id.clone()));
    let payload = match serde_json::to_value(request) {
        Ok(payload) => payload,
        Err(_) => return Err(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    let valid = match request.method.as_str() {
        "initialize" => serde_json::from_value::<InitializeRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "resources/list" => serde_json::from_value::<ListResourcesRequest>(payload).is_ok(),
        "resources/templates/list" => {
            serde_json::from_value::<ListResourceTemplatesRequest>(payload).is_ok()
        }
        "resources/read" => serde_json::from_value::<ReadResourceRequest>(payload).is_ok(),
        "prompts/list" => serde_json::from_value::<ListPromptsRequest>(payload).is_ok(),
        "prompts/get" => serde_json::from_value::<GetPromptRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let registry = state.dispatcher.registry();

    let response = match method.as_str() {
        "initialize" => match initialize(params.as_ref()) {
            Ok(result) => typed_result(id, result),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => typed_result(
            id,
            ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: build_tools_list(registry),
            },
        ),
        "tools/call" => handle_tools_call(state, id, params),
        "resources/list" => typed_result(
            id,
            ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: build_resources_list(registry),
            },
        ),
        "resources/templates/list" => typed_result(
            id,
            ListResourceTemplatesResult {
                meta: None,
                next_cursor: None,
                resource_templates: build_resource_templates_list(registry),
            },
        ),
        "resources/read" => handle_resources_read(state, id, params),
        "prompts/list" => typed_result(
            id,
            ListPromptsResult {
                meta: None,
                next_cursor: None,
                prompts: build_prompts_list(registry),
            },
        ),
        "prompts/get" => handle_prompts_get(state, id, params),
        notification if notification.starts_with("notifications/") => json_rpc_result(id, json!({})),
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        method = %method,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

fn typed_result<T: Serialize>(id: Option<Value>, result: T) -> Value {
    match serde_json::to_value(result) {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => app_error_to_json_rpc(id, err.into()),
    }
}

fn initialize(params: Option<&Value>) -> Result<InitializeResult, AppError> {
    let protocol_version = negotiate_protocol_version(params)?;

    Ok(InitializeResult {
        server_info: Implementation {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            resources: Some(ServerCapabilitiesResources {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            prompts: Some(ServerCapabilitiesPrompts {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        protocol_version: protocol_version.to_string(),
        instructions: None,
        meta: None,
    })
}

/// Echoes a supported offered version, otherwise answers with the newest one.
pub fn negotiate_protocol_version(params: Option<&Value>) -> Result<ProtocolVersion, AppError> {
    let offered_version = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .ok_or_else(|| {
            AppError::invalid_arguments(
                "invalid_protocol_version",
                "initialize params.protocolVersion is required",
            )
        })?;

    Ok(ProtocolVersion::try_from(offered_version)
        .ok()
        .filter(|version| SUPPORTED_PROTOCOL_VERSIONS.contains(version))
        .unwrap_or(LATEST_PROTOCOL_VERSION))
}

/// JSON Schema object describing a handler's declared parameters.
pub fn input_schema(handler: &Handler) -> ToolInputSchema {
    let mut properties = HashMap::new();
    let mut required = Vec::new();

    for param in &handler.params {
        let mut property = Map::from_iter([
            ("type".to_string(), json!(param.kind.json_type())),
            ("title".to_string(), json!(param.name)),
        ]);
        if let Some(description) = param.description {
            property.insert("description".to_string(), json!(description));
        }
        match &param.default {
            Some(default) => {
                property.insert("default".to_string(), default.clone());
            }
            None => required.push(param.name.to_string()),
        }
        properties.insert(param.name.to_string(), property);
    }

    ToolInputSchema::new(required, Some(properties), None)
}

pub fn build_tools_list(registry: &Registry) -> Vec<Tool> {
    registry
        .handlers(Category::Tool)
        .map(|handler| Tool {
            annotations: None,
            description: Some(handler.description.to_string()),
            execution: None,
            icons: vec![],
            input_schema: input_schema(handler),
            meta: None,
            name: handler.name.clone(),
            output_schema: None,
            title: None,
        })
        .collect()
}

pub fn build_resources_list(registry: &Registry) -> Vec<Resource> {
    registry
        .resources()
        .map(|handler| Resource {
            annotations: None,
            description: Some(handler.description.to_string()),
            icons: vec![],
            meta: None,
            mime_type: handler.mime_type.map(str::to_string),
            name: handler.label.clone(),
            size: None,
            title: None,
            uri: handler.name.clone(),
        })
        .collect()
}

pub fn build_resource_templates_list(registry: &Registry) -> Vec<ResourceTemplate> {
    registry
        .resource_templates()
        .map(|handler| ResourceTemplate {
            annotations: None,
            description: Some(handler.description.to_string()),
            icons: vec![],
            meta: None,
            mime_type: handler.mime_type.map(str::to_string),
            name: handler.label.clone(),
            title: None,
            uri_template: handler.name.clone(),
        })
        .collect()
}

pub fn build_prompts_list(registry: &Registry) -> Vec<Prompt> {
    registry
        .handlers(Category::Prompt)
        .map(|handler| Prompt {
            arguments: handler
                .params
                .iter()
                .map(|param| PromptArgument {
                    description: param.description.map(str::to_string),
                    name: param.name.to_string(),
                    required: Some(param.is_required()),
                    title: None,
                })
                .collect(),
            description: Some(handler.description.to_string()),
            icons: vec![],
            meta: None,
            name: handler.name.clone(),
            title: None,
        })
        .collect()
}

pub fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let arguments = tool_call.arguments.map(|arguments| json!(arguments));
    match state
        .dispatcher
        .invoke(Category::Tool, &tool_call.name, arguments)
    {
        Ok(result) => json_rpc_result(id, result),
        Err(AppError::HandlerExecution { message }) => {
            json_rpc_result(id, tool_error_result(&message))
        }
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

pub fn handle_resources_read(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let resource_read: ReadResourceRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    match state
        .dispatcher
        .invoke(Category::Resource, &resource_read.uri, None)
    {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

pub fn handle_prompts_get(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let prompt_get: GetPromptRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let arguments = prompt_get.arguments.map(|arguments| {
        Value::Object(
            arguments
                .into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect(),
        )
    });

    match state
        .dispatcher
        .invoke(Category::Prompt, &prompt_get.name, arguments)
    {
        Ok(result) => json_rpc_result(id, result),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}
