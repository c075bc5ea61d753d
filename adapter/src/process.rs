//! Child-process handle for the build-tool launcher.
//!
//! Owns the spawned child and the reader task draining its message channel.
//! Readiness is a oneshot resolved by the first terminal boot message;
//! everything after that point is observational — a crash after readiness
//! is logged, not acted on.

use std::process::Stdio;

use tokio::io::AsyncRead;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::rpc::{Message, MessageReader, MessageWriter, RpcError};
use crate::types::{AdapterConfig, StartError};

type ReadySender = oneshot::Sender<Result<u16, StartError>>;
pub(crate) type ReadyReceiver = oneshot::Receiver<Result<u16, StartError>>;

pub(crate) struct ToolProcess {
    child: Child,
    /// Kept so the launcher's stdin stays open for its lifetime.
    #[allow(dead_code)]
    writer: MessageWriter<ChildStdin>,
    reader_handle: JoinHandle<()>,
}

impl ToolProcess {
    /// Spawn the launcher and send `start{cwd}`.
    ///
    /// Returns the handle plus a receiver that resolves with the first
    /// terminal boot message (`started` or `error`) — or with
    /// [`StartError::Disconnected`] if the channel closes first.
    pub async fn start(config: &AdapterConfig) -> Result<(Self, ReadyReceiver), StartError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .current_dir(&config.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| StartError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or(StartError::Stdio)?;
        let stdin = child.stdin.take().ok_or(StartError::Stdio)?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let reader_handle = tokio::spawn(read_child_messages(MessageReader::new(stdout), ready_tx));

        let mut writer = MessageWriter::new(stdin);
        // Fire and forget: a launcher that died already shows up as EOF on
        // the reader side, which resolves readiness with the real reason.
        if let Err(error) = writer
            .write_message(&Message::Start {
                cwd: config.cwd.display().to_string(),
            })
            .await
        {
            tracing::warn!(%error, "failed to send start message");
        }

        Ok((
            Self {
                child,
                writer,
                reader_handle,
            },
            ready_rx,
        ))
    }

    /// Terminate the launcher. Consumes self.
    pub async fn shutdown(mut self) {
        self.reader_handle.abort();
        if let Err(error) = self.child.kill().await {
            tracing::debug!(%error, "build tool child already gone");
        }
    }
}

/// Reader loop: forwards `log` messages, resolves readiness exactly once,
/// observes the channel closing.
async fn read_child_messages<R>(mut reader: MessageReader<R>, ready_tx: ReadySender)
where
    R: AsyncRead + Unpin,
{
    let mut ready = Some(ready_tx);
    loop {
        match reader.read_message().await {
            Ok(Some(message)) => dispatch_message(message, &mut ready),
            Ok(None) => {
                match ready.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(StartError::Disconnected));
                    }
                    None => tracing::info!("build tool closed its message channel"),
                }
                break;
            }
            Err(RpcError::Malformed(error)) => {
                tracing::warn!(%error, "skipping malformed message from build tool");
            }
            Err(error) => {
                match ready.take() {
                    Some(tx) => {
                        let _ = tx.send(Err(StartError::Channel(error)));
                    }
                    None => tracing::warn!(%error, "build tool message channel failed"),
                }
                break;
            }
        }
    }
}

fn dispatch_message(message: Message, ready: &mut Option<ReadySender>) {
    match message {
        Message::Log { args } => {
            tracing::info!("patternplate: {}", args.join(" "));
        }
        Message::Started { port } => match ready.take() {
            Some(tx) => {
                let _ = tx.send(Ok(port));
            }
            None => tracing::warn!(%port, "ignoring duplicate `started` message"),
        },
        Message::Error { error } => match ready.take() {
            Some(tx) => {
                let _ = tx.send(Err(StartError::Reported(error)));
            }
            None => tracing::warn!(%error, "build tool reported an error after startup"),
        },
        Message::Start { .. } => {
            tracing::warn!("ignoring unexpected `start` message from build tool");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_channel() -> (Option<ReadySender>, ReadyReceiver) {
        let (tx, rx) = oneshot::channel();
        (Some(tx), rx)
    }

    #[test]
    fn test_started_resolves_readiness() {
        let (mut ready, rx) = ready_channel();
        dispatch_message(Message::Started { port: 3000 }, &mut ready);
        assert!(ready.is_none());
        assert_eq!(rx.blocking_recv().unwrap().unwrap(), 3000);
    }

    #[test]
    fn test_error_resolves_readiness_with_failure() {
        let (mut ready, rx) = ready_channel();
        dispatch_message(
            Message::Error {
                error: "port in use".to_string(),
            },
            &mut ready,
        );
        let failure = rx.blocking_recv().unwrap().unwrap_err();
        assert!(matches!(failure, StartError::Reported(reason) if reason == "port in use"));
    }

    #[test]
    fn test_log_does_not_gate_readiness() {
        let (mut ready, mut rx) = ready_channel();
        dispatch_message(
            Message::Log {
                args: vec!["still".to_string(), "booting".to_string()],
            },
            &mut ready,
        );
        assert!(ready.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_duplicate_started_ignored() {
        let (mut ready, rx) = ready_channel();
        dispatch_message(Message::Started { port: 3000 }, &mut ready);
        // Second `started` has nowhere to go and must not panic.
        dispatch_message(Message::Started { port: 4000 }, &mut ready);
        assert_eq!(rx.blocking_recv().unwrap().unwrap(), 3000);
    }

    #[tokio::test]
    async fn test_reader_eof_before_started_is_disconnect() {
        let (ready_tx, ready_rx) = oneshot::channel();
        read_child_messages(MessageReader::new(&b""[..]), ready_tx).await;
        let failure = ready_rx.await.unwrap().unwrap_err();
        assert!(matches!(failure, StartError::Disconnected));
    }

    #[tokio::test]
    async fn test_reader_logs_then_started() {
        let input: &[u8] =
            b"{\"type\":\"log\",\"args\":[\"booting\"]}\n{\"type\":\"started\",\"port\":8080}\n";
        let (ready_tx, ready_rx) = oneshot::channel();
        read_child_messages(MessageReader::new(input), ready_tx).await;
        assert_eq!(ready_rx.await.unwrap().unwrap(), 8080);
    }

    #[tokio::test]
    async fn test_reader_skips_malformed_line_before_started() {
        let input: &[u8] = b"garbage\n{\"type\":\"started\",\"port\":8080}\n";
        let (ready_tx, ready_rx) = oneshot::channel();
        read_child_messages(MessageReader::new(input), ready_tx).await;
        assert_eq!(ready_rx.await.unwrap().unwrap(), 8080);
    }

    #[tokio::test]
    async fn test_reader_error_message_wins() {
        let input: &[u8] = b"{\"type\":\"error\",\"error\":\"no patternplate\"}\n";
        let (ready_tx, ready_rx) = oneshot::channel();
        read_child_messages(MessageReader::new(input), ready_tx).await;
        assert!(matches!(
            ready_rx.await.unwrap().unwrap_err(),
            StartError::Reported(_)
        ));
    }
}
