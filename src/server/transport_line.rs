/// Line-based transport: one JSON message per line
use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::server::protocol::{Request, Response};

/// A line that was read but could not be decoded
#[derive(Debug)]
pub enum Incoming {
    Request(Request),
    Malformed(String),
}

pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
}

impl LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Read the next non-empty line. `None` on EOF.
    pub async fn read_message(&mut self) -> Result<Option<Incoming>> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line).await {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        return Ok(Some(match serde_json::from_str::<Request>(trimmed) {
                            Ok(request) => Incoming::Request(request),
                            Err(e) => Incoming::Malformed(format!("Failed to parse JSON: {}", e)),
                        }));
                    }
                    // Empty line, continue loop
                }
                Err(e) => return Err(anyhow!("Failed to read line: {}", e)),
            }
        }
    }

    /// Write one response line
    pub async fn write_response(&mut self, response: &Response) -> Result<()> {
        let json_str = serde_json::to_string(response)?;
        self.writer.write_all(json_str.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_requests_and_skips_blank_lines() {
        let input: &[u8] = b"\n{\"id\": 1, \"method\": \"status\"}\nnot json\n";
        let mut transport = LineTransport::new(input, Vec::new());

        match transport.read_message().await.unwrap() {
            Some(Incoming::Request(request)) => assert_eq!(request.method, "status"),
            other => panic!("Expected request, got {:?}", other),
        }
        assert!(matches!(
            transport.read_message().await.unwrap(),
            Some(Incoming::Malformed(_))
        ));
        assert!(transport.read_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_writes_one_line_per_response() {
        let mut transport = LineTransport::new(&b""[..], Vec::new());
        transport
            .write_response(&Response::text(Some(serde_json::json!(7)), "ok".to_string()))
            .await
            .unwrap();

        let written = String::from_utf8(transport.into_writer()).unwrap();
        assert_eq!(written, "{\"id\":7,\"result\":{\"text\":\"ok\"}}\n");
    }
}
