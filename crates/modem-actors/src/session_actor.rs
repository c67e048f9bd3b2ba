use crate::constants::response;
use crate::listing::{interpret_listing, SkipReason};
use crate::store::MessageStore;
use actor_protocol::{ActorError, SessionEvent, SessionPhase};
use actor_runtime::{actor_debug, actor_error, actor_info, actor_warn, Actor, SessionMessage};
use core_types::Frame;
use framing::{Framer, LineFramer};
use futures_channel::mpsc;

/// SessionActor interprets everything the modem sends
///
/// Responsibilities:
/// - Reassemble response lines from arbitrary read chunks
/// - Recognise identity, success and error lines while configuring
/// - Collect listing responses, decode them and fill the message store
/// - Swallow the response to a delete command, up to its terminal line,
///   when asked to
/// - Hand stored messages to the poller on `Drain`
///
/// The actor is the only owner of the phase, the line buffer and the store.
pub struct SessionActor {
    phase: SessionPhase,
    /// Discarding a delete response until its `OK`/error line
    suppressing: bool,
    identified: bool,
    framer: LineFramer,
    /// Lines since the last terminal line
    lines: Vec<String>,
    /// Timestamp of the first line of the listing being collected
    listing_started_us: Option<u64>,
    store: MessageStore,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionActor {
    pub fn new(event_tx: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            phase: SessionPhase::default(),
            suppressing: false,
            identified: false,
            framer: LineFramer::new(),
            lines: Vec::new(),
            listing_started_us: None,
            store: MessageStore::new(),
            event_tx,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Fragments waiting for the next drain
    pub fn stored(&self) -> usize {
        self.store.len()
    }

    fn emit(&mut self, event: SessionEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            actor_warn!("SessionActor: dropped event: {:?}", e.into_inner());
        }
    }

    fn handle_chunk(&mut self, data: Vec<u8>, timestamp_us: u64) {
        for frame in self.framer.push(&data, timestamp_us) {
            if self.suppressing {
                self.suppressed_line(&frame.text());
            } else if self.phase.collects_listing() {
                self.listing_line(&frame);
            } else {
                self.configuring_line(frame.text());
            }
        }
    }

    /// A line of the delete response. Only its terminal line ends suppression;
    /// the echo alone may arrive long before the modem finishes deleting.
    fn suppressed_line(&mut self, line: &str) {
        let trimmed = line.trim();
        if response::is_ok(trimmed) || response::is_error(trimmed) {
            self.suppressing = false;
            if response::is_error(trimmed) {
                actor_warn!("SessionActor: delete failed: {}", trimmed);
            } else {
                actor_debug!("SessionActor: delete acknowledged");
            }
            self.emit(SessionEvent::DeleteAcknowledged);
        } else if !trimmed.is_empty() {
            actor_debug!("SessionActor: discarding delete response line {:?}", trimmed);
        }
    }

    fn configuring_line(&mut self, line: String) {
        let trimmed = line.trim();

        if trimmed.contains(response::IDENTITY) && !self.identified {
            self.identified = true;
            actor_info!("SessionActor: modem identified ({})", trimmed);
            self.emit(SessionEvent::DeviceIdentified {
                line: trimmed.to_string(),
            });
        }

        if response::is_ok(trimmed) {
            let collected = std::mem::take(&mut self.lines);
            actor_info!("SessionActor: command accepted");
            self.emit(SessionEvent::CommandAcknowledged {
                ok: true,
                response: collected,
            });
        } else if response::is_error(trimmed) {
            let mut collected = std::mem::take(&mut self.lines);
            collected.push(trimmed.to_string());
            actor_warn!("SessionActor: command failed: {:?}", collected);
            self.emit(SessionEvent::CommandAcknowledged {
                ok: false,
                response: collected,
            });
        } else if !trimmed.is_empty() {
            self.lines.push(trimmed.to_string());
        }
    }

    fn listing_line(&mut self, frame: &Frame) {
        let line = frame.text();
        let trimmed = line.trim();

        if response::is_ok(trimmed) {
            if let Some(started) = self.listing_started_us.take() {
                actor_info!(
                    "SessionActor: listing received in {} ms",
                    frame.timestamp_us.saturating_sub(started) / 1000
                );
            }
            self.complete_listing();
        } else if response::is_error(trimmed) {
            self.listing_started_us = None;
            let mut collected = std::mem::take(&mut self.lines);
            collected.push(trimmed.to_string());
            actor_warn!("SessionActor: listing failed: {}", trimmed);
            self.emit(SessionEvent::CommandAcknowledged {
                ok: false,
                response: collected,
            });
        } else {
            self.listing_started_us.get_or_insert(frame.timestamp_us);
            self.lines.push(line);
        }
    }

    fn complete_listing(&mut self) {
        let lines = std::mem::take(&mut self.lines);
        let outcome = interpret_listing(&lines);

        for skipped in &outcome.skipped {
            match &skipped.reason {
                SkipReason::Malformed(e) => {
                    actor_warn!("SessionActor: skipping malformed PDU {}: {}", skipped.pdu, e);
                }
                SkipReason::NoText { dcs } => {
                    actor_debug!("SessionActor: no text in PDU (DCS 0x{:02X})", dcs);
                }
            }
        }

        let parts = outcome.fragments.len();
        let mut inserted = 0;
        for fragment in outcome.fragments {
            if self.store.insert(fragment) {
                inserted += 1;
            }
        }
        actor_debug!(
            "SessionActor: listing had {} entries, {} new fragments stored",
            outcome.headers.len(),
            inserted
        );

        self.emit(SessionEvent::ListingComplete {
            parts,
            skipped: outcome.skipped.len(),
        });
    }

    fn enter_listing(&mut self) -> Result<(), ActorError> {
        if !self.phase.can_transition_to(SessionPhase::Listing) {
            return Err(ActorError::InvalidTransition(format!(
                "{:?} → {:?}",
                self.phase,
                SessionPhase::Listing
            )));
        }
        if self.phase != SessionPhase::Listing {
            self.phase = SessionPhase::Listing;
            actor_info!("SessionActor: {}", self.phase.status_text());
            // Configuration echoes are not part of any listing
            self.lines.clear();
            self.emit(SessionEvent::PhaseChanged { phase: self.phase });
        }
        Ok(())
    }
}

impl Actor for SessionActor {
    type Message = SessionMessage;

    fn name(&self) -> &'static str {
        "SessionActor"
    }

    async fn handle(&mut self, msg: SessionMessage) -> Result<(), ActorError> {
        match msg {
            SessionMessage::Chunk { data, timestamp_us } => {
                self.handle_chunk(data, timestamp_us);
                Ok(())
            }
            SessionMessage::ReadFailed { reason } => {
                actor_error!("SessionActor: serial read failed: {}", reason);
                self.emit(SessionEvent::Error {
                    message: format!("Serial read failed: {}", reason),
                });
                Ok(())
            }
            SessionMessage::EnterListing => self.enter_listing(),
            SessionMessage::SuppressNextResponse => {
                self.suppressing = true;
                Ok(())
            }
            SessionMessage::CancelSuppression => {
                if self.suppressing {
                    self.suppressing = false;
                    actor_warn!("SessionActor: delete response never completed, listening again");
                }
                Ok(())
            }
            SessionMessage::Drain { reply } => {
                let messages = self.store.drain_and_reassemble();
                if reply.send(messages).is_err() {
                    actor_warn!("SessionActor: drain requester went away");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use futures_channel::oneshot;

    const PART_ONE: &str = "0044048121430000521010214305000D050003070201906536FB0D02";
    const PART_TWO: &str = "0044048121430000521010214305000C050003070202AE6F399B0C";

    fn setup() -> (SessionActor, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(32);
        (SessionActor::new(event_tx), event_rx)
    }

    fn next_event(rx: &mut mpsc::Receiver<SessionEvent>) -> Option<SessionEvent> {
        rx.try_next().ok().flatten()
    }

    async fn chunk(actor: &mut SessionActor, data: &str) {
        actor
            .handle(SessionMessage::Chunk {
                data: data.as_bytes().to_vec(),
                timestamp_us: 0,
            })
            .await
            .unwrap();
    }

    async fn drain(actor: &mut SessionActor) -> Vec<actor_protocol::ReassembledMessage> {
        let (reply, response) = oneshot::channel();
        actor.handle(SessionMessage::Drain { reply }).await.unwrap();
        response.await.unwrap()
    }

    fn listing(entries: &[&str]) -> String {
        let mut out = String::from("AT+CMGL=0\r\r\n");
        for (i, pdu) in entries.iter().enumerate() {
            out.push_str(&format!("+CMGL: {},0,,{}\r\n{}\r\n", i + 1, pdu.len() / 2 - 1, pdu));
        }
        out.push_str("\r\nOK\r\n");
        out
    }

    #[tokio::test]
    async fn test_configuring_ok_acknowledges() {
        let (mut actor, mut rx) = setup();
        chunk(&mut actor, "AT+CMGF=0\r\r\nOK\r\n").await;

        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::CommandAcknowledged {
                ok: true,
                response: vec!["AT+CMGF=0".to_string()],
            })
        );
        assert_eq!(actor.stored(), 0);
    }

    #[tokio::test]
    async fn test_configuring_error() {
        let (mut actor, mut rx) = setup();
        chunk(&mut actor, "AT+CPMS=\"MT\"\r\r\n+CMS ERROR: 302\r\n").await;

        match next_event(&mut rx) {
            Some(SessionEvent::CommandAcknowledged { ok, response }) => {
                assert!(!ok);
                assert_eq!(response.last().unwrap(), "+CMS ERROR: 302");
            }
            other => panic!("Expected failed acknowledgement, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_identity_reported_once() {
        let (mut actor, mut rx) = setup();
        chunk(&mut actor, "Manufacturer: huawei\r\nIMEI: 861234567890123\r\nOK\r\n").await;
        chunk(&mut actor, "IMEI: 861234567890123\r\nOK\r\n").await;

        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::DeviceIdentified {
                line: "IMEI: 861234567890123".into()
            })
        );
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::CommandAcknowledged { ok: true, .. })
        ));
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::CommandAcknowledged { ok: true, .. })
        ));
        assert_eq!(next_event(&mut rx), None);
    }

    #[tokio::test]
    async fn test_listing_ignored_while_configuring() {
        let (mut actor, _rx) = setup();
        chunk(&mut actor, &listing(&[PART_ONE])).await;
        assert_eq!(actor.stored(), 0);
    }

    #[tokio::test]
    async fn test_enter_listing() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        assert_eq!(actor.phase(), SessionPhase::Listing);
        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::PhaseChanged {
                phase: SessionPhase::Listing
            })
        );

        // Repeating it changes nothing
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        assert_eq!(actor.phase(), SessionPhase::Listing);
        assert_eq!(next_event(&mut rx), None);
    }

    #[tokio::test]
    async fn test_listing_split_across_chunks() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);

        let response = listing(&[PART_ONE, PART_TWO]);
        for piece in response.as_bytes().chunks(7) {
            actor
                .handle(SessionMessage::Chunk {
                    data: piece.to_vec(),
                    timestamp_us: 0,
                })
                .await
                .unwrap();
        }

        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete {
                parts: 2,
                skipped: 0
            })
        );
        assert_eq!(actor.stored(), 2);

        let messages = drain(&mut actor).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].address, "1234");
        assert_eq!(messages[0].text, "Hello World");
        assert_eq!(actor.stored(), 0);
    }

    #[tokio::test]
    async fn test_repeated_listing_is_deduplicated() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();

        chunk(&mut actor, &listing(&[PART_ONE])).await;
        chunk(&mut actor, &listing(&[PART_ONE, PART_TWO])).await;
        assert_eq!(actor.stored(), 2);

        let completions = std::iter::from_fn(|| next_event(&mut rx))
            .filter(|e| matches!(e, SessionEvent::ListingComplete { .. }))
            .count();
        assert_eq!(completions, 2);
    }

    #[tokio::test]
    async fn test_malformed_entry_skipped() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);

        chunk(&mut actor, &listing(&["0044ZZ", PART_ONE])).await;
        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete {
                parts: 1,
                skipped: 1
            })
        );
    }

    #[tokio::test]
    async fn test_suppressed_delete_response() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);

        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();
        chunk(&mut actor, "AT+CMGD=1,3\r\r\nOK\r\n").await;

        assert_eq!(next_event(&mut rx), Some(SessionEvent::DeleteAcknowledged));
        assert_eq!(next_event(&mut rx), None);

        // Flag is cleared: the next chunk is processed normally
        chunk(&mut actor, &listing(&[PART_ONE])).await;
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete { parts: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_echo_alone_is_not_acknowledgement() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);
        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();

        // Echo first, the modem is still deleting
        chunk(&mut actor, "AT+CMGD=1,3\r\r\n").await;
        assert_eq!(next_event(&mut rx), None);

        // The late OK belongs to the delete, not to the next listing
        chunk(&mut actor, "\r\nOK\r\n").await;
        assert_eq!(next_event(&mut rx), Some(SessionEvent::DeleteAcknowledged));
        assert_eq!(next_event(&mut rx), None);

        chunk(&mut actor, &listing(&[PART_ONE, PART_TWO])).await;
        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete {
                parts: 2,
                skipped: 0
            })
        );
    }

    #[tokio::test]
    async fn test_listing_after_delete_ok_in_same_chunk() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);
        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();

        let mut data = String::from("OK\r\n");
        data.push_str(&listing(&[PART_ONE]));
        chunk(&mut actor, &data).await;

        assert_eq!(next_event(&mut rx), Some(SessionEvent::DeleteAcknowledged));
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete { parts: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_error_ends_suppression() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);
        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();

        chunk(&mut actor, "AT+CMGD=1,3\r\r\n+CMS ERROR: 321\r\n").await;
        assert_eq!(next_event(&mut rx), Some(SessionEvent::DeleteAcknowledged));

        chunk(&mut actor, &listing(&[PART_ONE])).await;
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete { parts: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_suppression_keeps_partial_listing_lines() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);

        // A header already buffered from another command survives the delete
        chunk(&mut actor, &format!("+CMGL: 1,0,,{}\r\n", PART_ONE.len() / 2 - 1)).await;
        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();
        chunk(&mut actor, "AT+CMGD=1,3\r\r\nOK\r\n").await;
        assert_eq!(next_event(&mut rx), Some(SessionEvent::DeleteAcknowledged));

        chunk(&mut actor, &format!("{}\r\nOK\r\n", PART_ONE)).await;
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete { parts: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_suppression() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);
        actor
            .handle(SessionMessage::SuppressNextResponse)
            .await
            .unwrap();
        actor
            .handle(SessionMessage::CancelSuppression)
            .await
            .unwrap();

        chunk(&mut actor, &listing(&[PART_ONE])).await;
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete { parts: 1, .. })
        ));
        assert_eq!(actor.stored(), 1);
    }

    #[tokio::test]
    async fn test_read_failure_reported() {
        let (mut actor, mut rx) = setup();
        actor
            .handle(SessionMessage::ReadFailed {
                reason: "device disconnected".into(),
            })
            .await
            .unwrap();

        match next_event(&mut rx) {
            Some(SessionEvent::Error { message }) => assert!(message.contains("disconnected")),
            other => panic!("Expected error event, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listing_error_discards_buffer() {
        let (mut actor, mut rx) = setup();
        actor.handle(SessionMessage::EnterListing).await.unwrap();
        next_event(&mut rx);

        chunk(&mut actor, &format!("+CMGL: 1,0,,27\r\n{}\r\n+CMS ERROR: 500\r\n", PART_ONE)).await;
        assert!(matches!(
            next_event(&mut rx),
            Some(SessionEvent::CommandAcknowledged { ok: false, .. })
        ));

        chunk(&mut actor, "OK\r\n").await;
        assert_eq!(
            next_event(&mut rx),
            Some(SessionEvent::ListingComplete {
                parts: 0,
                skipped: 0
            })
        );
        assert_eq!(actor.stored(), 0);
    }
}
