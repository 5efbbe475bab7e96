//! JSON-RPC envelopes
//!
//! Every error built here carries the standard numeric code; errors raised by
//! the dispatcher also carry a machine-readable `data.code`.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};
use tracing::error;

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    let code = err.code();
    match err {
        AppError::NotFound { category, name } => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({
                "code": code,
                "message": format!("unknown {category} name"),
                "details": {
                    "name": name,
                },
            })),
        ),
        AppError::NoMatch { uri } => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({
                "code": code,
                "message": "unknown resource uri",
                "details": {
                    "uri": uri,
                },
            })),
        ),
        AppError::InvalidArguments { message, .. } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::HandlerExecution { message } => json_rpc_error_with_data(
            id,
            INTERNAL_ERROR,
            "Internal error",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        other => {
            error!(error = %other, "request failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let request_id = id.as_ref().and_then(value_to_request_id);
    let error = RpcError {
        code: i64::from(code),
        data,
        message: message.to_string(),
    };

    serde_json::to_value(JsonrpcErrorResponse::new(error, request_id)).unwrap_or_else(|_| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message }
        })
    })
}

/// Wraps `result`; ids that are neither strings nor integers are echoed as-is.
pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    let typed = id.as_ref().and_then(value_to_request_id).and_then(|request_id| {
        let response = JsonrpcResultResponse::new(
            request_id,
            McpResult {
                meta: None,
                extra: result.as_object().cloned(),
            },
        );
        serde_json::to_value(response).ok()
    });

    typed.unwrap_or_else(|| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        })
    })
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    match value {
        Value::String(id) => Some(RequestId::String(id.clone())),
        other => other.as_i64().map(RequestId::Integer),
    }
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::from(value),
    }
}
