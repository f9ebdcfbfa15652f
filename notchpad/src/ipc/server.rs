use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use notchpad_ipc::{Command, Response};

use super::SOCKET_PATH;

type CommandSender = mpsc::Sender<(Command, mpsc::Sender<Response>)>;

/// Accepts JSON-lines control connections and relays each command to the
/// main thread, answering with whatever comes back.
pub struct IpcServer {
    socket_path: PathBuf,
    cmd_tx: CommandSender,
}

impl IpcServer {
    pub fn new(cmd_tx: CommandSender) -> Self {
        Self::with_path(PathBuf::from(SOCKET_PATH), cmd_tx)
    }

    pub fn with_path(socket_path: PathBuf, cmd_tx: CommandSender) -> Self {
        Self {
            socket_path,
            cmd_tx,
        }
    }

    pub async fn run(&self) -> Result<()> {
        // A stale socket from a crashed daemon would make bind fail
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)
                .with_context(|| format!("Failed to remove stale socket {:?}", self.socket_path))?;
        }

        let listener = UnixListener::bind(&self.socket_path)
            .with_context(|| format!("Failed to bind {:?}", self.socket_path))?;
        tracing::info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let cmd_tx = self.cmd_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, cmd_tx).await {
                            tracing::error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    async fn handle_connection(stream: UnixStream, cmd_tx: CommandSender) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        loop {
            line.clear();
            let n = reader.read_line(&mut line).await?;
            if n == 0 {
                break; // EOF
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = Self::dispatch(line, &cmd_tx).await;
            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }

    async fn dispatch(line: &str, cmd_tx: &CommandSender) -> Response {
        let cmd = match serde_json::from_str::<Command>(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                return Response::Error {
                    message: format!("Invalid command: {}", e),
                }
            }
        };

        tracing::debug!("Received command: {:?}", cmd);
        let (resp_tx, mut resp_rx) = mpsc::channel(1);
        if cmd_tx.send((cmd, resp_tx)).await.is_err() {
            return Response::Error {
                message: "Internal error: command channel closed".to_string(),
            };
        }

        resp_rx.recv().await.unwrap_or(Response::Error {
            message: "Internal error: no response".to_string(),
        })
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;

    fn socket_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("notchpad-test-{}-{}.sock", name, std::process::id()))
    }

    async fn connect(path: &PathBuf) -> UnixStream {
        for _ in 0..50 {
            if let Ok(stream) = UnixStream::connect(path).await {
                return stream;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("IPC server never came up at {:?}", path);
    }

    async fn roundtrip(stream: UnixStream, request: &str) -> Response {
        let (reader, mut writer) = stream.into_split();
        writer.write_all(request.as_bytes()).await.unwrap();
        writer.write_all(b"\n").await.unwrap();

        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await.unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_command_is_relayed_and_answered() {
        let path = socket_path("relay");
        let (cmd_tx, mut cmd_rx) = mpsc::channel(4);
        let server = IpcServer::with_path(path.clone(), cmd_tx);
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        tokio::spawn(async move {
            while let Some((cmd, resp_tx)) = cmd_rx.recv().await {
                let response = match cmd {
                    Command::Pop => Response::Ok,
                    _ => Response::Error {
                        message: "unexpected".to_string(),
                    },
                };
                let _ = resp_tx.send(response).await;
            }
        });

        let stream = connect(&path).await;
        let response = roundtrip(stream, r#"{"type":"pop"}"#).await;
        assert_eq!(response, Response::Ok);
    }

    #[tokio::test]
    async fn test_malformed_line_gets_error_response() {
        let path = socket_path("malformed");
        let (cmd_tx, _cmd_rx) = mpsc::channel(4);
        let server = IpcServer::with_path(path.clone(), cmd_tx);
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let stream = connect(&path).await;
        match roundtrip(stream, r#"{"type":"explode"}"#).await {
            Response::Error { message } => assert!(message.starts_with("Invalid command")),
            other => panic!("Unexpected response: {:?}", other),
        }
    }
}
