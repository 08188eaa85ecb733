//! MCP server implementation for CodeMenu.
//!
//! This module implements the MCP server lifecycle:
//!
//! 1. **Initialisation**: Capability negotiation and version agreement
//! 2. **Operation**: Handling tool calls and other requests
//! 3. **Shutdown**: EOF on stdin, SIGINT or SIGTERM
//!
//! Tool work is delegated to the [`Dispatcher`]; this module only deals with
//! JSON-RPC framing and lifecycle state.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::mcp::protocol::{
    negotiate_protocol_version, parse_message, ErrorCode, IncomingMessage, JsonRpcError,
    JsonRpcErrorData, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, OutgoingMessage,
    RequestId, SERVER_NAME,
};
use crate::mcp::transport::StdioTransport;
use crate::tools::Dispatcher;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize answered, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities. The tool list never changes, so this is empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information received during initialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Parameters for the initialize request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol version requested by client.
    pub protocol_version: String,
    /// Client information.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Parameters for tools/call request.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call.
    pub name: String,
    /// Arguments for the tool.
    #[serde(default)]
    pub arguments: Value,
}

/// The MCP server bridging to CodeMenu.
pub struct McpServer {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport,
    /// Negotiated protocol version (set after initialisation).
    protocol_version: Option<&'static str>,
    /// Runs tool calls.
    dispatcher: Dispatcher,
}

impl McpServer {
    /// Creates a new MCP server that runs tool calls through `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport: StdioTransport::new(),
            protocol_version: None,
            dispatcher,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Returns the negotiated protocol version, once initialised.
    #[must_use]
    pub const fn protocol_version(&self) -> Option<&'static str> {
        self.protocol_version
    }

    /// Runs the MCP server main loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Received Ctrl+C, initiating graceful shutdown");
                    self.state = ServerState::ShuttingDown;
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            info!("stdin closed, shutting down");
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if let Some(message) = self.handle_line(&line).await {
            debug!(id = ?message.id(), "Reply");
            self.transport.write_message(&message).await?;
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles a single line of input and returns the message to send back.
    ///
    /// Blank lines and notifications produce no reply.
    pub async fn handle_line(&mut self, line: &str) -> Option<OutgoingMessage> {
        if line.trim().is_empty() {
            return None;
        }

        match parse_message(line) {
            Ok(IncomingMessage::Request(req)) => Some(self.handle_request(req).await),
            Ok(IncomingMessage::Notification(notif)) => {
                self.handle_notification(&notif);
                None
            }
            Err(error) => Some(error.into()),
        }
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> OutgoingMessage {
        debug!(id = %req.id, method = %req.method, "Request");

        let response = match req.method.as_str() {
            "initialize" => self.handle_initialize(&req),
            "tools/list" => self.handle_tools_list(&req),
            "tools/call" => self.handle_tools_call(&req).await,
            "ping" => Ok(Self::handle_ping(&req)),
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        };

        match response {
            Ok(resp) => resp.into(),
            Err(error) => error.into(),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        debug!(method = %notif.method, "Notification");

        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::new(
                Some(req.id.clone()),
                JsonRpcErrorData::with_message(
                    ErrorCode::InvalidRequest,
                    "Server already initialised",
                ),
            ));
        }

        let params: InitializeParams = parse_params(req, "initialize")?;

        let negotiated_version = negotiate_protocol_version(&params.protocol_version);
        if let Some(client) = &params.client_info {
            info!(
                client = %client.name,
                client_version = client.version.as_deref().unwrap_or("unknown"),
                requested = %params.protocol_version,
                negotiated = negotiated_version,
                "Client connected"
            );
        }

        self.protocol_version = Some(negotiated_version);
        self.state = ServerState::Initialising;

        let result = json!({
            "protocolVersion": negotiated_version,
            "capabilities": ServerCapabilities {
                tools: ToolCapabilities::default(),
            },
            "serverInfo": ServerInfo::default(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/list request.
    fn handle_tools_list(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_initialised(&req.id)?;

        let result = json!({
            "tools": self.dispatcher.definitions(),
        });

        Ok(JsonRpcResponse::success(req.id.clone(), result))
    }

    /// Handles the tools/call request.
    async fn handle_tools_call(
        &self,
        req: &JsonRpcRequest,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        self.require_initialised(&req.id)?;

        let params: ToolCallParams = parse_params(req, "tool call")?;

        let result = self.dispatcher.call(&params.name, params.arguments).await;

        let result_value = serde_json::to_value(&result).map_err(|e| {
            tracing::error!(error = %e, "Failed to serialise tool call result");
            JsonRpcError::internal_error(
                req.id.clone(),
                "Internal error: failed to serialise result",
            )
        })?;

        Ok(JsonRpcResponse::success(req.id.clone(), result_value))
    }

    /// Handles the ping request.
    fn handle_ping(req: &JsonRpcRequest) -> JsonRpcResponse {
        JsonRpcResponse::success(req.id.clone(), json!({}))
    }

    /// Ensures `initialize` has been answered.
    ///
    /// The `notifications/initialized` notification is not waited for: some
    /// clients send `tools/list` straight after the initialize response.
    fn require_initialised(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if !matches!(self.state, ServerState::Initialising | ServerState::Running) {
            return Err(JsonRpcError::new(
                Some(id.clone()),
                JsonRpcErrorData::with_message(ErrorCode::InvalidRequest, "Server not initialised"),
            ));
        }
        Ok(())
    }
}

/// Deserialises required request params.
fn parse_params<T: serde::de::DeserializeOwned>(
    req: &JsonRpcRequest,
    what: &str,
) -> Result<T, JsonRpcError> {
    let params = req.params.clone().ok_or_else(|| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Missing {what} params"))
    })?;

    serde_json::from_value(params).map_err(|e| {
        JsonRpcError::invalid_params(req.id.clone(), format!("Invalid {what} params: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codemenu::{ClientSettings, CodeMenuClient};
    use crate::config::ToolsConfig;

    fn server() -> McpServer {
        let settings = ClientSettings::new(url::Url::parse("http://127.0.0.1:9/v1").unwrap());
        let client = CodeMenuClient::new(settings).unwrap();
        McpServer::new(Dispatcher::new(client, ToolsConfig::default()))
    }

    fn initialize_line(version: &str) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": version,
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "1.0.0" }
            }
        })
        .to_string()
    }

    fn response_json(message: Option<OutgoingMessage>) -> Value {
        serde_json::to_value(message.expect("expected a reply")).unwrap()
    }

    #[test]
    fn server_initial_state() {
        let server = server();
        assert_eq!(server.state(), ServerState::AwaitingInit);
        assert!(server.protocol_version().is_none());
    }

    #[test]
    fn initialize_negotiates_and_reports_server_info() {
        let mut server = server();
        let reply = tokio_test::block_on(server.handle_line(&initialize_line("2024-11-05")));
        let reply = response_json(reply);

        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(reply["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(reply["result"]["capabilities"]["tools"].is_object());
        assert_eq!(server.state(), ServerState::Initialising);
    }

    #[test]
    fn second_initialize_is_rejected() {
        let mut server = server();
        tokio_test::block_on(server.handle_line(&initialize_line("2024-11-05")));
        let reply = response_json(tokio_test::block_on(
            server.handle_line(&initialize_line("2024-11-05")),
        ));
        assert_eq!(reply["error"]["code"], ErrorCode::InvalidRequest.code());
    }

    #[test]
    fn initialize_without_params_is_invalid() {
        let mut server = server();
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#;
        let reply = response_json(tokio_test::block_on(server.handle_line(line)));
        assert_eq!(reply["error"]["code"], ErrorCode::InvalidParams.code());
        assert_eq!(server.state(), ServerState::AwaitingInit);
    }

    #[test]
    fn tools_list_before_initialize_is_rejected() {
        let mut server = server();
        let line = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;
        let reply = response_json(tokio_test::block_on(server.handle_line(line)));
        assert_eq!(reply["error"]["code"], ErrorCode::InvalidRequest.code());
        assert_eq!(reply["error"]["message"], "Server not initialised");
    }

    #[test]
    fn initialized_notification_moves_to_running() {
        let mut server = server();
        tokio_test::block_on(server.handle_line(&initialize_line("2024-11-05")));
        let reply = tokio_test::block_on(
            server.handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#),
        );
        assert!(reply.is_none());
        assert_eq!(server.state(), ServerState::Running);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let mut server = server();
        assert!(tokio_test::block_on(server.handle_line("   ")).is_none());
    }

    #[test]
    fn unknown_method_and_ping() {
        let mut server = server();
        let reply = response_json(tokio_test::block_on(
            server.handle_line(r#"{"jsonrpc":"2.0","id":"p","method":"resources/list"}"#),
        ));
        assert_eq!(reply["error"]["code"], ErrorCode::MethodNotFound.code());

        let reply = response_json(tokio_test::block_on(
            server.handle_line(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#),
        ));
        assert_eq!(reply["id"], "p");
        assert_eq!(reply["result"], json!({}));
    }

    #[test]
    fn malformed_line_is_a_parse_error() {
        let mut server = server();
        let reply = response_json(tokio_test::block_on(server.handle_line("{nope")));
        assert_eq!(reply["error"]["code"], ErrorCode::ParseError.code());
        assert_eq!(reply["id"], Value::Null);
    }
}
