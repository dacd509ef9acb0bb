//! MCP session tests over an in-memory duplex stream
//!
//! Drives the server loop the same way a tool-calling client does: one JSON
//! object per line in, one JSON object per line out.

use serde_json::{json, Value};
use stage_sequencer::config::ServerConfig;
use stage_sequencer::{McpServer, StageKey, WorkflowController};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

struct Session {
    client_write: tokio::io::WriteHalf<tokio::io::DuplexStream>,
    client_read: tokio::io::Lines<BufReader<tokio::io::ReadHalf<tokio::io::DuplexStream>>>,
    server: tokio::task::JoinHandle<McpServer>,
    next_id: i64,
}

impl Session {
    fn start() -> Self {
        let (client, server_side) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (client_read, client_write) = tokio::io::split(client);

        let server = tokio::spawn(async move {
            let mut server = McpServer::new(ServerConfig::default(), WorkflowController::default());
            server
                .run(BufReader::new(server_read), server_write)
                .await
                .unwrap();
            server
        });

        Self {
            client_write,
            client_read: BufReader::new(client_read).lines(),
            server,
            next_id: 1,
        }
    }

    async fn send(&mut self, message: Value) {
        let line = format!("{message}\n");
        self.client_write.write_all(line.as_bytes()).await.unwrap();
        self.client_write.flush().await.unwrap();
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.next_id;
        self.next_id += 1;
        self.send(json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}))
            .await;
        let line = self.client_read.next_line().await.unwrap().unwrap();
        let response: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(response["id"], id);
        response
    }

    async fn call(&mut self, tool: &str, arguments: Value) -> (String, bool) {
        let response = self
            .request("tools/call", json!({"name": tool, "arguments": arguments}))
            .await;
        let result = &response["result"];
        let text = result["content"][0]["text"].as_str().unwrap().to_string();
        let is_error = result["isError"].as_bool().unwrap_or(false);
        (text, is_error)
    }

    async fn handshake(&mut self) {
        let response = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "0.0.1"}
                }),
            )
            .await;
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        self.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
    }

    async fn finish(mut self) -> McpServer {
        // Closing the write side gives the server EOF
        self.client_write.shutdown().await.unwrap();
        drop(self.client_read);
        self.server.await.unwrap()
    }
}

#[tokio::test]
async fn test_tools_list_over_the_wire() {
    let mut session = Session::start();
    session.handshake().await;

    let response = session.request("tools/list", json!({})).await;
    let names: Vec<&str> = response["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["init", "next_step", "register_units", "unit_step"]);

    session.finish().await;
}

#[tokio::test]
async fn test_full_workflow_over_the_wire() {
    let mut session = Session::start();
    session.handshake().await;

    let (overview, _) = session.call("init", json!({})).await;
    assert!(overview.starts_with("You are reconstructing"));

    // Too early for units
    let (early, is_error) = session.call("register_units", json!({"units": ["e1"]})).await;
    assert!(!is_error);
    assert!(early.contains("Complete the base stages"));

    for _ in 1..StageKey::BASE.len() {
        let (_, is_error) = session.call("next_step", json!({})).await;
        assert!(!is_error);
    }

    let (ask, _) = session.call("next_step", json!({})).await;
    assert!(ask.starts_with("Register units first"));

    let (registered, _) = session
        .call("register_units", json!({"units": ["e1", "e2"]}))
        .await;
    assert_eq!(registered, "Units registered (in order): e1, e2");

    let (blocked, is_error) = session.call("unit_step", json!({"unit": "e2"})).await;
    assert!(!is_error);
    assert_eq!(
        blocked,
        "Next unit in sequence is 'e1'. Finish it before moving to 'e2'."
    );

    let (unknown, is_error) = session.call("unit_step", json!({"unit": "e9"})).await;
    assert!(is_error);
    assert!(unknown.contains("Registered units: [e1, e2]"));

    for unit in ["e1", "e2"] {
        let (implementation, _) = session.call("unit_step", json!({"unit": unit})).await;
        assert!(implementation.contains(&format!("Implementation ({unit})")));
        let (execution, _) = session.call("unit_step", json!({"unit": unit})).await;
        assert!(execution.contains(&format!("Code Execution - Step 3 ({unit})")));
    }

    let (report, _) = session.call("next_step", json!({})).await;
    assert!(report.starts_with("Step 4: Report"));
    let (done, _) = session.call("next_step", json!({})).await;
    assert_eq!(done, "All prompts have been delivered.");

    let server = session.finish().await;
    let stats = server.metrics().get_stats();
    assert_eq!(stats.total_calls, 18);
    assert_eq!(stats.tool_errors, 1);
}

#[tokio::test]
async fn test_duplicate_units_rejected_over_the_wire() {
    let mut session = Session::start();
    session.handshake().await;
    session.call("init", json!({})).await;
    for _ in 1..StageKey::BASE.len() {
        session.call("next_step", json!({})).await;
    }

    let (message, is_error) = session
        .call("register_units", json!({"units": ["a", "b", "a"]}))
        .await;
    assert!(is_error);
    assert!(message.contains("Duplicate unit 'a'"));

    let response = session
        .request("tools/call", json!({"name": "unit_step", "arguments": {"unit": 5}}))
        .await;
    assert_eq!(response["error"]["code"], -32602);

    session.finish().await;
}
