use actor_protocol::{ActorError, SessionEvent};
use futures::stream::StreamExt;
use futures_channel::mpsc;

/// A task that owns one piece of modem state and is driven by its mailbox
///
/// The session actor (response interpretation, message store) and the port
/// actor (read loop, writes) are both actors. Neither shares memory with the
/// poller; everything goes through their mailbox and the event channel.
///
/// # Lifecycle
///
/// 1. **init()**: once, before the first message (the port actor starts its
///    read loop here)
/// 2. **handle()**: once per message, strictly in arrival order
/// 3. **shutdown()**: once, after every sender of the mailbox is gone
///
/// A failed `init` ends the actor. A failed `handle` is reported as
/// [`SessionEvent::Error`] and the actor keeps going.
///
/// # Spawning
///
/// `run()` returns a future; spawn it with `tokio::spawn` on a concrete
/// actor type so the compiler can see that the future is `Send`.
///
/// ```ignore
/// let session = SessionActor::new(handles.event_tx.clone());
/// let events = handles.event_tx.clone();
/// tokio::spawn(async move { session.run(handles.session_rx, events).await });
/// ```
#[allow(async_fn_in_trait)]
pub trait Actor: Send + 'static {
    type Message: Send + 'static;

    /// Prefix for log lines and error events
    fn name(&self) -> &'static str;

    async fn init(&mut self) -> Result<(), ActorError> {
        Ok(())
    }

    async fn handle(&mut self, msg: Self::Message) -> Result<(), ActorError>;

    /// Release resources (close the port, stop background tasks)
    async fn shutdown(&mut self) {}

    /// Run the actor until its mailbox closes.
    ///
    /// `event_tx` receives an [`SessionEvent::Error`] for every failure.
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Self::Message>,
        mut event_tx: mpsc::Sender<SessionEvent>,
    ) where
        Self: Sized,
    {
        if let Err(e) = self.init().await {
            crate::actor_error!("{}: init failed: {}", self.name(), e);
            report(
                &mut event_tx,
                SessionEvent::Error {
                    message: format!("{} init failed: {}", self.name(), e),
                },
            );
            return;
        }

        crate::actor_debug!("{} started", self.name());

        let mut handled: u64 = 0;
        while let Some(msg) = rx.next().await {
            handled += 1;
            if let Err(e) = self.handle(msg).await {
                crate::actor_warn!("{}: message #{} failed: {}", self.name(), handled, e);
                report(
                    &mut event_tx,
                    SessionEvent::Error {
                        message: format!("{} error: {}", self.name(), e),
                    },
                );
            }
        }

        self.shutdown().await;

        crate::actor_debug!("{} stopped after {} messages", self.name(), handled);
    }
}

// The poller may already be gone during shutdown; losing the event is fine then
fn report(event_tx: &mut mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if let Err(e) = event_tx.try_send(event) {
        crate::actor_debug!("event not delivered: {:?}", e.into_inner());
    }
}
