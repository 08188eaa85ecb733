//! stdio transport for MCP server.
//!
//! Framing follows the MCP stdio transport:
//!
//! - Messages are UTF-8 encoded JSON-RPC, one per line
//! - Messages must not contain embedded newlines
//! - stdin carries client messages, stdout carries server messages
//! - stderr is free for logging
//!
//! Requests are handled one at a time, so reading and writing share a single
//! owner and no synchronisation is needed.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::mcp::protocol::OutgoingMessage;

/// A stdio-based MCP transport.
///
/// Handles reading JSON-RPC messages from stdin and writing responses to stdout.
pub struct StdioTransport {
    /// Buffered reader for stdin.
    reader: BufReader<tokio::io::Stdin>,
    /// Handle for stdout.
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }

    /// Reads the next message line from stdin.
    ///
    /// Returns `None` if stdin is closed (EOF).
    ///
    /// # Errors
    ///
    /// Returns an error if reading from stdin fails.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line).await?;

        if bytes_read == 0 {
            return Ok(None);
        }

        Ok(Some(strip_line_ending(line)))
    }

    /// Writes a response or error to stdout, newline terminated.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_message(&mut self, message: &OutgoingMessage) -> io::Result<()> {
        let json = encode_message(message)?;

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes a trailing `\n` or `\r\n`.
fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

/// Serialises a message as a single line of JSON.
fn encode_message(message: &OutgoingMessage) -> io::Result<String> {
    let json =
        serde_json::to_string(message).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    // Compact serde_json output escapes newlines inside strings, so this holds
    // even for pretty-printed tool text.
    debug_assert!(
        !json.contains('\n'),
        "JSON message must not contain embedded newlines"
    );

    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse, RequestId};

    #[test]
    fn transport_default() {
        let _transport = StdioTransport::default();
    }

    #[test]
    fn strip_unix_and_windows_endings() {
        assert_eq!(strip_line_ending("{}\n".to_string()), "{}");
        assert_eq!(strip_line_ending("{}\r\n".to_string()), "{}");
        assert_eq!(strip_line_ending("{}".to_string()), "{}");
    }

    #[test]
    fn encode_pretty_tool_text_on_one_line() {
        let response = JsonRpcResponse::success(
            RequestId::Number(1),
            serde_json::json!({
                "content": [{ "type": "text", "text": "[\n  {\n    \"id\": \"a1\"\n  }\n]" }]
            }),
        );

        let json = encode_message(&response.into()).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r"\n"));
    }

    #[test]
    fn encode_error_on_one_line() {
        let error = JsonRpcError::method_not_found(RequestId::Number(1), "test/method");

        let json = encode_message(&error.into()).unwrap();
        assert!(!json.contains('\n'));
    }
}
