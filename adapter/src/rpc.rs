//! Tagged-message protocol spoken with the build-tool launcher.
//!
//! The launcher is an out-of-process program that boots patternplate and
//! reports back over its stdio: one JSON object per line, so the channel is
//! order-preserving by construction. This module provides the [`Message`]
//! union and [`MessageReader`]/[`MessageWriter`] for async framing.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Maximum accepted line length (1 MiB) to prevent unbounded buffering.
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Failure on the launcher channel.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("channel I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The offending line has been consumed; the stream stays usable.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("message exceeds {MAX_LINE_BYTES} bytes")]
    Oversized,
}

/// One protocol message.
///
/// `start` flows host→launcher, exactly once per child. Everything else
/// flows launcher→host; `started` and `error` are mutually exclusive
/// terminal responses to `start`, `log` is advisory and may arrive any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Boot the build tool in the given working directory.
    Start { cwd: String },
    /// Advisory log output, forwarded to diagnostics.
    Log { args: Vec<String> },
    /// The build tool is listening on `port`.
    Started {
        #[serde(deserialize_with = "lenient_port")]
        port: u16,
    },
    /// Unrecoverable boot failure.
    Error { error: String },
}

/// The launcher is not strict about the port's JSON type — accept both
/// `1337` and `"1337"`.
fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u16),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(port) => Ok(port),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port `{text}`"))),
    }
}

/// Reads newline-delimited messages from an async reader.
pub struct MessageReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Read the next message.
    ///
    /// Returns `Ok(None)` on EOF (clean shutdown). Blank lines are skipped.
    /// A line that is not a valid message yields [`RpcError::Malformed`]
    /// without desynchronizing the stream.
    pub async fn read_message(&mut self) -> Result<Option<Message>, RpcError> {
        loop {
            let mut line = String::new();
            let bytes_read = (&mut self.reader)
                .take(MAX_LINE_BYTES as u64 + 1)
                .read_line(&mut line)
                .await?;
            if bytes_read == 0 {
                return Ok(None);
            }
            if bytes_read > MAX_LINE_BYTES {
                return Err(RpcError::Oversized);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(trimmed)?));
        }
    }
}

/// Writes newline-delimited messages to an async writer.
pub struct MessageWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_message(&mut self, message: &Message) -> Result<(), RpcError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
