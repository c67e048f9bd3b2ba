use crate::constants;
use actor_protocol::{ActorError, SessionEvent};
use actor_runtime::{actor_debug, actor_error, actor_warn, Actor, PortMessage, SessionMessage};
use core_types::Transport;
use futures::SinkExt;
use futures_channel::{mpsc, oneshot};
use std::sync::Arc;
use std::time::Duration;

/// PortActor owns the open serial transport
///
/// Responsibilities:
/// - Run the read loop that feeds chunks to the SessionActor
/// - Write AT commands on request
/// - Close the transport on request or shutdown
///
/// The transport is opened by the caller; the actor only drives it.
pub struct PortActor<T: Transport + 'static> {
    port_name: String,
    transport: Arc<T>,
    session_tx: mpsc::Sender<SessionMessage>,
    event_tx: mpsc::Sender<SessionEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    done_rx: Option<oneshot::Receiver<()>>,
    closed: bool,
}

impl<T: Transport + 'static> PortActor<T> {
    pub fn new(
        port_name: impl Into<String>,
        transport: T,
        session_tx: mpsc::Sender<SessionMessage>,
        event_tx: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            port_name: port_name.into(),
            transport: Arc::new(transport),
            session_tx,
            event_tx,
            shutdown_tx: None,
            done_rx: None,
            closed: false,
        }
    }

    async fn handle_write(&mut self, data: Vec<u8>) -> Result<(), ActorError> {
        if self.closed {
            return Err(ActorError::Transport(format!(
                "Write to {} refused: port closed. Restart the poller.",
                self.port_name
            )));
        }

        actor_debug!(
            "PortActor: → {}",
            String::from_utf8_lossy(&data).trim_end()
        );
        self.transport
            .write(&data)
            .await
            .map_err(|e| ActorError::Transport(format!("Write failed: {}", e)))
    }

    async fn handle_close(&mut self) -> Result<(), ActorError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Stop the read loop before closing the transport under it
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(done_rx) = self.done_rx.take() {
            let _ = done_rx.await;
            actor_debug!("PortActor: Read loop stopped");
        }

        self.transport
            .close()
            .await
            .map_err(|e| ActorError::Transport(format!("Close failed: {}", e)))?;

        let _ = self.event_tx.try_send(SessionEvent::StatusUpdate {
            message: format!("Port {} closed", self.port_name),
        });
        Ok(())
    }
}

impl<T: Transport + 'static> Actor for PortActor<T> {
    type Message = PortMessage;

    fn name(&self) -> &'static str {
        "PortActor"
    }

    async fn init(&mut self) -> Result<(), ActorError> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(read_loop(
            self.transport.clone(),
            self.session_tx.clone(),
            shutdown_rx,
            done_tx,
        ));

        self.shutdown_tx = Some(shutdown_tx);
        self.done_rx = Some(done_rx);

        let _ = self.event_tx.try_send(SessionEvent::StatusUpdate {
            message: format!("Listening on {}", self.port_name),
        });
        Ok(())
    }

    async fn handle(&mut self, msg: PortMessage) -> Result<(), ActorError> {
        match msg {
            PortMessage::Write { data, reply } => {
                let result = self.handle_write(data).await;
                if let Some(reply) = reply {
                    let _ = reply.send(result.clone());
                }
                result
            }
            PortMessage::Close => self.handle_close().await,
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.handle_close().await {
            actor_error!("PortActor: {}", e);
        }
    }
}

/// Forward every non-empty chunk to the session until shutdown, until the
/// session goes away, or until reads keep failing.
async fn read_loop<T: Transport + 'static>(
    transport: Arc<T>,
    mut session_tx: mpsc::Sender<SessionMessage>,
    mut shutdown_rx: oneshot::Receiver<()>,
    done_tx: oneshot::Sender<()>,
) {
    let mut failures = 0;

    loop {
        let read = tokio::select! {
            _ = &mut shutdown_rx => break,
            read = transport.read_chunk() => read,
        };

        match read {
            // Read timed out without data
            Ok((data, _)) if data.is_empty() => {}
            Ok((data, timestamp_us)) => {
                failures = 0;
                if session_tx
                    .send(SessionMessage::Chunk { data, timestamp_us })
                    .await
                    .is_err()
                {
                    actor_debug!("PortActor: SessionActor gone, stopping read loop");
                    break;
                }
            }
            Err(e) => {
                failures += 1;
                let _ = session_tx
                    .send(SessionMessage::ReadFailed {
                        reason: e.to_string(),
                    })
                    .await;
                if failures >= constants::port::MAX_READ_FAILURES {
                    actor_error!("PortActor: giving up after {} read failures", failures);
                    break;
                }
                actor_warn!("PortActor: read failed ({}), retrying", e);
                tokio::time::sleep(Duration::from_millis(constants::port::READ_RETRY_MS)).await;
            }
        }
    }

    let _ = done_tx.send(());
}
