use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::{mpsc, oneshot},
};

use crate::pipeline::PipelineSnapshot;
use crate::toggle::ToggleSignal;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Status,
    Stop,
}

/// Request received over the control socket.
///
/// `{"message": "..."}` is a toggle signal; `{"command": "status"|"stop"}`
/// queries or stops the running pipeline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ControlRequest {
    Toggle(ToggleSignal),
    Command { command: ControlCommand },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ControlResponse {
    Status(PipelineSnapshot),
    Stopped { stopped: bool },
}

/// A request handed to the pipeline loop, with the channel for its reply.
/// Toggle signals reply `None`: the connection is closed without a payload.
#[derive(Debug)]
pub struct ControlEnvelope {
    pub request: ControlRequest,
    pub reply: oneshot::Sender<Option<ControlResponse>>,
}

#[derive(Debug)]
pub struct ControlClient {
    sock_path: PathBuf,
}

impl ControlClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and read the (possibly empty) reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline is not reachable or replies with
    /// something other than a control response.
    pub async fn send(&self, request: &ControlRequest) -> Result<Option<ControlResponse>> {
        let mut stream = UnixStream::connect(&self.sock_path)
            .await
            .with_context(|| format!("Is muffle running? ({})", self.sock_path.display()))?;

        let encoded = serde_json::to_vec(request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        if buffer.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&buffer)?))
    }

    /// # Errors
    ///
    /// Returns an error if the pipeline is not reachable.
    pub async fn toggle(&self, enabled: bool) -> Result<()> {
        let signal = if enabled {
            ToggleSignal::on()
        } else {
            ToggleSignal::off()
        };
        self.send(&ControlRequest::Toggle(signal)).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the pipeline is not reachable or answers unexpectedly.
    pub async fn status(&self) -> Result<PipelineSnapshot> {
        match self
            .send(&ControlRequest::Command {
                command: ControlCommand::Status,
            })
            .await?
        {
            Some(ControlResponse::Status(snapshot)) => Ok(snapshot),
            other => anyhow::bail!("Unexpected status response: {other:?}"),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the pipeline is not reachable or answers unexpectedly.
    pub async fn stop(&self) -> Result<()> {
        match self
            .send(&ControlRequest::Command {
                command: ControlCommand::Stop,
            })
            .await?
        {
            Some(ControlResponse::Stopped { .. }) => Ok(()),
            other => anyhow::bail!("Unexpected stop response: {other:?}"),
        }
    }
}

/// Accept control connections on `sock_path` and forward each request to
/// the pipeline loop through `tx`. Runs until `tx` is closed.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound.
pub async fn listen(tx: mpsc::Sender<ControlEnvelope>, sock_path: &Path) -> io::Result<()> {
    if sock_path.exists() {
        fs::remove_file(sock_path)?;
    }
    if let Some(parent) = sock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(sock_path)?;
    log::info!("Control socket listening at {}", sock_path.display());

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, tx).await {
                            log::error!("Control connection error: {e:#}");
                        }
                    });
                }
                Err(e) => {
                    log::error!("Control accept error: {e}");
                }
            },
            () = tx.closed() => {
                log::debug!("Pipeline gone, closing control socket");
                break;
            }
        }
    }

    let _ = fs::remove_file(sock_path);
    Ok(())
}

async fn serve_connection(mut stream: UnixStream, tx: mpsc::Sender<ControlEnvelope>) -> Result<()> {
    let mut buffer = Vec::new();
    stream.read_to_end(&mut buffer).await?;
    if buffer.is_empty() {
        return Ok(());
    }

    let request: ControlRequest = match serde_json::from_slice(&buffer) {
        Ok(request) => request,
        Err(e) => {
            log::error!("Malformed control request: {e}");
            return Ok(());
        }
    };

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(ControlEnvelope {
        request,
        reply: reply_tx,
    })
    .await
    .context("Pipeline is not accepting control requests")?;

    if let Some(response) = reply_rx.await.context("Pipeline dropped the request")? {
        let encoded = serde_json::to_vec(&response)?;
        stream.write_all(&encoded).await?;
    }
    stream.shutdown().await?;
    Ok(())
}
