//! MCP Server
//!
//! Handles the MCP protocol over stdio, processing JSON-RPC 2.0 messages.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use gtm_core::GtmContext;

use crate::handler::handle_tool;
use crate::protocol::{
    CallToolParams, InitializeResult, ListToolsResult, RpcMessage, RpcReply, INTERNAL_ERROR,
    INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::tools::all_tools;

pub const SERVER_NAME: &str = "google-tag-manager-mcp-server";

/// MCP Server that communicates over stdio
pub struct McpServer {
    ctx: Arc<GtmContext>,
    initialized: bool,
}

impl McpServer {
    pub fn new(ctx: Arc<GtmContext>) -> Self {
        Self {
            ctx,
            initialized: false,
        }
    }

    /// Run the server, reading from stdin and writing to stdout
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(reader, stdout).await
    }

    /// Serve line-delimited JSON-RPC until the reader hits EOF
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                // EOF - client disconnected
                info!("Client disconnected");
                break;
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            if let Some(resp) = self.handle_message(line).await {
                let resp_str = serde_json::to_string(&resp)?;
                debug!("Sending: {}", resp_str);
                writer.write_all(resp_str.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC message
    async fn handle_message(&mut self, message: &str) -> Option<RpcReply> {
        let request: RpcMessage = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse request: {}", e);
                return Some(RpcReply::fail(None, PARSE_ERROR, format!("Parse error: {}", e)));
            }
        };

        if request.is_notification() {
            self.handle_notification(&request.method);
            return None;
        }

        let RpcMessage { id, method, params } = request;
        match self.handle_request(&method, params).await {
            Ok(value) => Some(RpcReply::ok(id, value)),
            Err((code, message)) => Some(RpcReply::fail(id, code, message)),
        }
    }

    /// Handle a notification (no response expected)
    fn handle_notification(&mut self, method: &str) {
        match method {
            "notifications/initialized" => {
                info!("Client initialized");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                debug!("Request cancelled");
            }
            _ => {
                debug!("Unknown notification: {}", method);
            }
        }
    }

    /// Handle a request and return the result
    async fn handle_request(&mut self, method: &str, params: Option<Value>) -> Result<Value, (i32, String)> {
        match method {
            "initialize" => self.handle_initialize(),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(params).await,
            "ping" => Ok(json!({})),
            _ => {
                warn!("Unknown method: {}", method);
                Err((METHOD_NOT_FOUND, format!("Method not found: {}", method)))
            }
        }
    }

    fn handle_initialize(&mut self) -> Result<Value, (i32, String)> {
        info!("Initializing MCP server");

        let result = InitializeResult::new(SERVER_NAME, env!("CARGO_PKG_VERSION"));

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    fn handle_list_tools(&self) -> Result<Value, (i32, String)> {
        let result = ListToolsResult {
            tools: all_tools(self.ctx.config.max_items_per_page),
        };

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value, (i32, String)> {
        let params: CallToolParams = match params {
            Some(p) => serde_json::from_value(p)
                .map_err(|e| (INVALID_PARAMS, format!("Invalid params: {}", e)))?,
            None => return Err((INVALID_PARAMS, "Missing params".to_string())),
        };

        info!("Calling tool: {}", params.name);
        let result = handle_tool(&self.ctx, &params.name, params.arguments).await;

        serde_json::to_value(result)
            .map_err(|e| (INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtm_core::credentials::StaticTokenProvider;
    use gtm_core::http::HttpTagStore;
    use gtm_core::Config;

    fn server() -> McpServer {
        server_with(Config::default())
    }

    fn server_with(config: Config) -> McpServer {
        let credentials = Arc::new(StaticTokenProvider::new("t"));
        // unroutable; these tests never reach the network
        let store = Arc::new(HttpTagStore::new("http://127.0.0.1:9", 1, credentials.clone()).unwrap());
        McpServer::new(Arc::new(GtmContext::new(config, credentials, store)))
    }

    #[tokio::test]
    async fn test_initialize() {
        let mut server = server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let mut server = server();
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
        assert!(server.initialized);
    }

    #[tokio::test]
    async fn test_parse_error_and_unknown_method() {
        let mut server = server();
        let resp = server.handle_message("{nope").await.unwrap();
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);

        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tool_error_is_a_result_not_a_protocol_error() {
        let mut server = server();
        let resp = server
            .handle_message(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"gtm_tag","arguments":{"action":"get","accountId":"1","containerId":"2","workspaceId":"3"}}}"#,
            )
            .await
            .unwrap();
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(
            result["content"][0]["text"],
            json!("Error performing get on GTM tag: tagId is required for get action")
        );
    }

    #[tokio::test]
    async fn test_serve_writes_one_line_per_request() {
        let mut server = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], json!(1));
        assert_eq!(lines[1]["result"]["tools"][0]["name"], json!("gtm_tag"));
    }

    #[tokio::test]
    async fn test_list_tools_advertises_configured_page_size() {
        let mut server = server_with(Config {
            max_items_per_page: 7,
            ..Config::default()
        });
        let resp = server
            .handle_message(r#"{"jsonrpc":"2.0","id":4,"method":"tools/list"}"#)
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(
            result["tools"][0]["inputSchema"]["properties"]["itemsPerPage"]["maximum"],
            json!(7)
        );
    }
}
