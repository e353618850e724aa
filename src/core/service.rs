//! MCP request handling for the sealed aggregate

use crate::core::integration::{Integration, Product};
use crate::core::protocol::{
    error_codes, CallToolParams, CallToolResult, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, ListChanged, ReadResourceParams, ResourceCapabilities, ResourceContents,
    ServerCapabilities, PROTOCOL_VERSION,
};
use crate::core::server::ServerHandle;
use crate::utils::errors::{McpError, McpResult};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// The aggregate after sealing. Immutable; shared by every transport session.
pub struct AggregateService {
    handle: ServerHandle,
    integrations: Vec<Box<dyn Integration>>,
}

impl AggregateService {
    pub(crate) fn new(handle: ServerHandle, integrations: Vec<Box<dyn Integration>>) -> Self {
        Self {
            handle,
            integrations,
        }
    }

    pub fn handle(&self) -> &ServerHandle {
        &self.handle
    }

    pub fn products(&self) -> Vec<Product> {
        self.integrations.iter().map(|i| i.product()).collect()
    }

    /// Parse and handle one raw JSON-RPC message.
    ///
    /// Returns `None` for notifications.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Failed to parse JSON-RPC message");
                Some(JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                ))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Received notification");
            return None;
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                Some(id),
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version: {}", request.jsonrpc),
            ));
        }

        debug!(method = %request.method, "Handling MCP request");

        let result = match request.method.as_str() {
            "initialize" => self.initialize(),
            "ping" => Ok(json!({})),
            "tools/list" => self.list_tools(),
            "tools/call" => self.call_tool(request.params).await,
            "resources/list" => self.list_resources(),
            "resources/read" => self.read_resource(request.params).await,
            "prompts/list" => Ok(json!({ "prompts": [] })),
            other => {
                return Some(JsonRpcResponse::error(
                    Some(id),
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {}", other),
                ))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => JsonRpcResponse::error(Some(id), e.jsonrpc_code(), e.to_string()),
        })
    }

    fn initialize(&self) -> McpResult<Value> {
        let products: Vec<&str> = self
            .integrations
            .iter()
            .map(|i| i.product().display_name())
            .collect();
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                prompts: Some(ListChanged {
                    list_changed: false,
                }),
                resources: Some(ResourceCapabilities {
                    subscribe: false,
                    list_changed: false,
                }),
                tools: Some(ListChanged {
                    list_changed: false,
                }),
            },
            server_info: self.handle.server_info().clone(),
            instructions: Some(format!("Tools are available for: {}.", products.join(", "))),
        };
        Ok(serde_json::to_value(result)?)
    }

    fn list_tools(&self) -> McpResult<Value> {
        Ok(json!({ "tools": self.handle.tool_definitions() }))
    }

    async fn call_tool(&self, params: Option<Value>) -> McpResult<Value> {
        let params: CallToolParams = parse_params(params)?;
        let tool = self
            .handle
            .find_tool(&params.name)
            .ok_or_else(|| McpError::ToolNotFound(params.name.clone()))?;

        let arguments = match params.arguments {
            Some(Value::Null) | None => json!({}),
            Some(arguments) => arguments,
        };

        let result = match tool.call(arguments).await {
            Ok(value) => CallToolResult::success(&value),
            Err(e @ McpError::InvalidParams(_)) => return Err(e),
            Err(e) => {
                warn!(tool = %params.name, product = %tool.product, error = %e, "Tool call failed");
                CallToolResult::failure(e.to_string())
            }
        };
        Ok(serde_json::to_value(result)?)
    }

    fn list_resources(&self) -> McpResult<Value> {
        Ok(json!({ "resources": self.handle.resource_definitions() }))
    }

    async fn read_resource(&self, params: Option<Value>) -> McpResult<Value> {
        let params: ReadResourceParams = parse_params(params)?;
        let resource = self
            .handle
            .find_resource(&params.uri)
            .ok_or_else(|| McpError::ResourceNotFound(params.uri.clone()))?;

        let text = resource.read().await?;
        let contents = ResourceContents {
            uri: params.uri,
            mime_type: resource.definition.mime_type.clone(),
            text,
        };
        Ok(json!({ "contents": [contents] }))
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> McpResult<T> {
    let params = params.ok_or_else(|| McpError::InvalidParams("missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}
