//! MCP tool server for the stage sequencer
//!
//! Reads newline-delimited JSON-RPC 2.0 requests and answers each one in
//! order. Every workflow mutation runs under a single lock around the whole
//! controller, so concurrent embedders see atomic transitions.

pub mod protocol;
pub mod tools;

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::observability::{OperationTimer, ToolCallMetrics};
use crate::telemetry::{create_tool_span, generate_correlation_id};
use crate::workflows::WorkflowController;
use protocol::{
    methods, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    RequestId, ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCallResult, ToolsCapability,
    ToolsListResult, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use tools::ToolOutcome;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    fn to_rpc_error(&self) -> JsonRpcError {
        match self {
            ServerError::UnknownTool(_) | ServerError::InvalidArguments { .. } => {
                JsonRpcError::invalid_params(self.to_string())
            }
            ServerError::Io(_) | ServerError::Serialization(_) => {
                JsonRpcError::internal_error(self.to_string())
            }
        }
    }
}

pub struct McpServer {
    config: ServerConfig,
    controller: Arc<Mutex<WorkflowController>>,
    metrics: ToolCallMetrics,
    initialized: bool,
}

impl McpServer {
    pub fn new(config: ServerConfig, controller: WorkflowController) -> Self {
        Self {
            config,
            controller: Arc::new(Mutex::new(controller)),
            metrics: ToolCallMetrics::new(),
            initialized: false,
        }
    }

    /// Shared handle to the controller
    pub fn controller(&self) -> Arc<Mutex<WorkflowController>> {
        Arc::clone(&self.controller)
    }

    pub fn metrics(&self) -> &ToolCallMetrics {
        &self.metrics
    }

    /// Serve on the process stdin/stdout until stdin closes
    pub async fn serve_stdio(&mut self) -> Result<(), ServerError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout).await
    }

    /// Serve until the reader reaches EOF
    pub async fn run<R, W>(&mut self, reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(server = %self.config.name, "MCP server starting");
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!("Received: {}", line);

            if let Some(response) = self.handle_line(line).await {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
                debug!("Sent response for id={:?}", response.id);
            }
        }

        info!("MCP server shutting down");
        self.metrics.log_stats();
        Ok(())
    }

    /// Handle one raw line; None for notifications
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                self.metrics.record_protocol_error();
                return Some(JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {e}")),
                ));
            }
        };

        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok())
            .unwrap_or_default();

        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Malformed request: {}", e);
                self.metrics.record_protocol_error();
                Some(JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_request(format!("Invalid request: {e}")),
                ))
            }
        }
    }

    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            if request.jsonrpc != JSONRPC_VERSION {
                warn!(
                    method = %request.method,
                    version = %request.jsonrpc,
                    "Dropping notification with bad JSON-RPC version"
                );
                self.metrics.record_protocol_error();
            } else {
                debug!(method = %request.method, "Notification received");
            }
            return None;
        }

        if request.jsonrpc != JSONRPC_VERSION {
            self.metrics.record_protocol_error();
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or_default(),
                JsonRpcError::invalid_request(format!(
                    "Invalid JSON-RPC version: {}",
                    request.jsonrpc
                )),
            ));
        }

        let id = request.id.clone().unwrap_or_default();
        let response = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(id, request.params),
            methods::INITIALIZED => JsonRpcResponse::success(id, Value::Null),
            methods::PING => JsonRpcResponse::success(id, Value::Object(Default::default())),
            methods::TOOLS_LIST => self.handle_tools_list(id),
            methods::TOOLS_CALL => self.handle_tools_call(id, request.params).await,
            other => {
                self.metrics.record_protocol_error();
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };
        Some(response)
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = match params.map(serde_json::from_value).transpose() {
            Ok(params) => params.unwrap_or_default(),
            Err(e) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid initialize params: {e}")),
                );
            }
        };

        let client = params
            .client_info
            .as_ref()
            .map(|c| format!("{} {}", c.name, c.version))
            .unwrap_or_else(|| "unknown client".to_string());
        info!(
            client = %client,
            protocol = %params.protocol_version,
            "Initialize handshake"
        );
        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: self.config.name.clone(),
                version: self.config.version.clone(),
            },
        };
        to_response(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: tools::list_tools(),
        };
        to_response(id, &result)
    }

    async fn handle_tools_call(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if !self.initialized {
            self.metrics.record_protocol_error();
            return JsonRpcResponse::error(id, JsonRpcError::not_initialized());
        }

        let params: ToolsCallParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                self.metrics.record_protocol_error();
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tool call params: {e}")),
                );
            }
            None => {
                self.metrics.record_protocol_error();
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing tool call params"),
                );
            }
        };

        self.metrics.record_call();
        let correlation_id = generate_correlation_id();
        let span = create_tool_span(&params.name, &correlation_id);
        let timer = OperationTimer::new(&params.name);

        let outcome = {
            let mut controller = self.controller.lock().await;
            span.in_scope(|| tools::call_tool(&mut controller, &params.name, params.arguments))
        };
        span.in_scope(|| timer.finish());

        match outcome {
            Ok(ToolOutcome::Delivered(text)) => to_response(id, &ToolsCallResult::text(text)),
            Ok(ToolOutcome::Guidance(text)) => {
                self.metrics.record_guidance();
                to_response(id, &ToolsCallResult::text(text))
            }
            Ok(ToolOutcome::Rejected(err)) => {
                self.metrics.record_tool_error();
                to_response(id, &ToolsCallResult::error(err.to_string()))
            }
            Err(e) => {
                self.metrics.record_protocol_error();
                JsonRpcResponse::error(id, e.to_rpc_error())
            }
        }
    }
}

fn to_response<T: serde::Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string()))
        }
    }
}
