//! Integration tests for MCP protocol handling.
//!
//! These tests verify the MCP server's JSON-RPC 2.0 protocol implementation,
//! including request/response handling, error responses, and lifecycle management.
//! Tool calls go to a `wiremock` server standing in for CodeMenu.

use codemenu_mcp::codemenu::{ClientSettings, CodeMenuClient};
use codemenu_mcp::config::ToolsConfig;
use codemenu_mcp::mcp::protocol::{parse_message, ErrorCode, IncomingMessage, RequestId};
use codemenu_mcp::mcp::server::{McpServer, ServerState};
use codemenu_mcp::tools::Dispatcher;
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "1.0.0"
            }
        }
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let IncomingMessage::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_tools_call_with_string_id() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": "call-7",
        "method": "tools/call",
        "params": { "name": "list_tags", "arguments": {} }
    }"#;

    if let IncomingMessage::Request(req) = parse_message(json).unwrap() {
        assert_eq!(req.method, "tools/call");
        assert_eq!(req.id, RequestId::String("call-7".to_string()));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_notification() {
    let json = r#"{
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }"#;

    let result = parse_message(json);
    assert!(result.is_ok());

    if let IncomingMessage::Notification(notif) = result.unwrap() {
        assert_eq!(notif.method, "notifications/initialized");
    } else {
        panic!("Expected Notification");
    }
}

#[test]
fn test_parse_invalid_json() {
    let result = parse_message("not valid json");
    let err = result.unwrap_err();
    assert_eq!(err.error.code, ErrorCode::ParseError.code());
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    let result = parse_message(json);
    assert!(result.is_err());
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

async fn codemenu_with_snippets() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/snippets/"))
        .and(query_param("key", "k3y"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "s1",
                "title": "Hello",
                "code": "print('hi')",
                "language": "python"
            }
        ])))
        .mount(&server)
        .await;
    server
}

fn mcp_server(codemenu: &MockServer, tools: ToolsConfig) -> McpServer {
    let settings = ClientSettings {
        api_key: Some("k3y".to_string()),
        ..ClientSettings::new(Url::parse(&format!("{}/v1", codemenu.uri())).unwrap())
    };
    let client = CodeMenuClient::new(settings).unwrap();
    McpServer::new(Dispatcher::new(client, tools))
}

async fn send(server: &mut McpServer, message: Value) -> Value {
    let reply = server
        .handle_line(&message.to_string())
        .await
        .expect("expected a reply");
    serde_json::to_value(reply).unwrap()
}

fn initialize(id: i64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "1.0.0" }
        }
    })
}

#[tokio::test]
async fn test_full_session() {
    let codemenu = codemenu_with_snippets().await;
    let mut server = mcp_server(&codemenu, ToolsConfig::default());

    let reply = send(&mut server, initialize(1)).await;
    assert_eq!(reply["jsonrpc"], "2.0");
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(reply["result"]["serverInfo"]["name"], "codemenu-mcp");
    assert_eq!(
        reply["result"]["serverInfo"]["version"],
        env!("CARGO_PKG_VERSION")
    );

    let ack = server
        .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(ack.is_none());
    assert_eq!(server.state(), ServerState::Running);

    let reply = send(
        &mut server,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {} }),
    )
    .await;
    let names: Vec<&str> = reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec!["list_snippets", "get_snippet", "list_tags", "list_groups"]
    );
    for tool in reply["result"]["tools"].as_array().unwrap() {
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert!(!tool["description"].as_str().unwrap().is_empty());
    }

    let reply = send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "list_snippets", "arguments": {} }
        }),
    )
    .await;
    assert_eq!(reply["id"], 3);
    assert!(reply["result"].get("isError").is_none());
    assert_eq!(reply["result"]["content"][0]["type"], "text");

    let listed: Value =
        serde_json::from_str(reply["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(listed[0]["title"], "Hello");
    assert_eq!(listed[0]["code_length"], 11);
    assert_eq!(listed[0]["has_code"], true);
    assert!(listed[0].get("code").is_none());
}

#[tokio::test]
async fn test_tools_list_without_initialized_notification() {
    let codemenu = codemenu_with_snippets().await;
    let mut server = mcp_server(&codemenu, ToolsConfig::default());

    send(&mut server, initialize(1)).await;
    assert_eq!(server.state(), ServerState::Initialising);

    let reply = send(
        &mut server,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await;
    assert_eq!(reply["result"]["tools"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_mutation_tools_listed_when_enabled() {
    let codemenu = codemenu_with_snippets().await;
    let tools = ToolsConfig {
        allow_mutations: true,
        summarize_listings: true,
    };
    let mut server = mcp_server(&codemenu, tools);

    send(&mut server, initialize(1)).await;
    let reply = send(
        &mut server,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await;
    let names: Vec<&str> = reply["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"create_snippet"));
    assert!(names.contains(&"update_snippet"));
    assert!(names.contains(&"delete_snippet"));
}

#[tokio::test]
async fn test_tool_failure_is_a_result_not_an_rpc_error() {
    let codemenu = codemenu_with_snippets().await;
    let mut server = mcp_server(&codemenu, ToolsConfig::default());
    send(&mut server, initialize(1)).await;

    let reply = send(
        &mut server,
        json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/call",
            "params": { "name": "get_snippet", "arguments": { "id": "missing" } }
        }),
    )
    .await;
    assert!(reply.get("error").is_none());
    assert_eq!(reply["result"]["isError"], true);
    assert_eq!(
        reply["result"]["content"][0]["text"],
        "Error: Snippet with ID missing not found"
    );
}

#[tokio::test]
async fn test_tools_call_without_params_is_invalid_params() {
    let codemenu = codemenu_with_snippets().await;
    let mut server = mcp_server(&codemenu, ToolsConfig::default());
    send(&mut server, initialize(1)).await;

    let reply = send(
        &mut server,
        json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call" }),
    )
    .await;
    assert_eq!(reply["id"], 4);
    assert_eq!(reply["error"]["code"], ErrorCode::InvalidParams.code());
    assert!(codemenu.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_protocol_version_gets_latest() {
    let codemenu = codemenu_with_snippets().await;
    let mut server = mcp_server(&codemenu, ToolsConfig::default());

    let mut request = initialize(1);
    request["params"]["protocolVersion"] = json!("1999-01-01");
    let reply = send(&mut server, request).await;
    assert_eq!(reply["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(server.protocol_version(), Some("2025-03-26"));
}
