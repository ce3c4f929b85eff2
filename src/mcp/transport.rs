//! Newline-delimited JSON framing.
//!
//! MCP over stdio sends one UTF-8 JSON-RPC message per line on stdout and
//! reads one per line from stdin; stderr is left for logs. Both ends of a
//! connection frame messages the same way, so [`Transport`] works over any
//! buffered reader and writer. The server normally runs on
//! [`StdioTransport`]; the demo and the tests use an in-memory
//! `tokio::io::duplex` pipe.

use std::io;
use std::string::FromUtf8Error;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// A received line: its text, or the UTF-8 error if the bytes were not text.
pub type Line = Result<String, FromUtf8Error>;

/// One end of a newline-framed JSON-RPC connection.
pub struct Transport<R, W> {
    reader: R,
    writer: W,
}

/// The transport the server uses when launched by an MCP host.
pub type StdioTransport = Transport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    /// Frames messages over the process's stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Transport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Frames messages over `reader` and `writer`.
    #[must_use]
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Receives the next line, without its terminator.
    ///
    /// Returns `None` once the peer has closed its end. A line that is not
    /// valid UTF-8 is consumed whole and returned as `Some(Err(_))`, so the
    /// next call starts at the following line.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub async fn recv(&mut self) -> io::Result<Option<Line>> {
        let mut bytes = Vec::new();
        if self.reader.read_until(b'\n', &mut bytes).await? == 0 {
            return Ok(None);
        }
        while matches!(bytes.last(), Some(b'\n' | b'\r')) {
            bytes.pop();
        }
        Ok(Some(String::from_utf8(bytes)))
    }

    /// Serialises `message` and sends it as one line.
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::InvalidData`] if `message` does not
    /// serialise, or the underlying write error.
    pub async fn send<T: Serialize + ?Sized>(&mut self, message: &T) -> io::Result<()> {
        let mut frame = serde_json::to_vec(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        // Compact serde_json output escapes every newline inside strings.
        debug_assert!(!frame.contains(&b'\n'));
        frame.push(b'\n');

        self.writer.write_all(&frame).await?;
        self.writer.flush().await
    }

    /// Shuts down the writing half so the peer reads EOF.
    ///
    /// # Errors
    ///
    /// Returns the underlying shutdown error.
    pub async fn close(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }

    /// Consumes the transport, returning the reader and writer.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::{JsonRpcResponse, OutgoingNotification, RequestId};
    use serde_json::json;

    #[tokio::test]
    async fn recv_strips_terminators() {
        let input = tokio_test::io::Builder::new()
            .read(b"first\r\nsecond\n")
            .read(b"last")
            .build();
        let mut transport = Transport::new(BufReader::new(input), tokio::io::sink());

        assert_eq!(transport.recv().await.unwrap(), Some(Ok("first".into())));
        assert_eq!(transport.recv().await.unwrap(), Some(Ok("second".into())));
        assert_eq!(transport.recv().await.unwrap(), Some(Ok("last".into())));
        assert_eq!(transport.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalid_utf8_consumes_only_its_line() {
        let input = tokio_test::io::Builder::new()
            .read(b"\xff\xfe\r\n{\"ok\":true}\n")
            .build();
        let mut transport = Transport::new(BufReader::new(input), tokio::io::sink());

        let bad = transport.recv().await.unwrap().unwrap().unwrap_err();
        assert_eq!(bad.as_bytes(), b"\xff\xfe");
        assert_eq!(
            transport.recv().await.unwrap(),
            Some(Ok("{\"ok\":true}".into()))
        );
        assert_eq!(transport.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn send_writes_one_frame() {
        let output = tokio_test::io::Builder::new()
            .write(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n")
            .build();
        let mut transport = Transport::new(BufReader::new(tokio::io::empty()), output);

        let response = JsonRpcResponse::success(RequestId::Number(1), json!({}));
        transport.send(&response).await.unwrap();
    }

    #[tokio::test]
    async fn multiline_text_stays_on_one_line() {
        let mut transport = Transport::new(BufReader::new(tokio::io::empty()), Vec::new());
        let note = OutgoingNotification::new(
            "notifications/message",
            Some(json!({"text": "line one\nline two"})),
        );
        transport.send(&note).await.unwrap();

        let (_, written) = transport.into_parts();
        let written = String::from_utf8(written).unwrap();
        assert_eq!(written.matches('\n').count(), 1);
        assert!(written.ends_with('\n'));
    }
}
