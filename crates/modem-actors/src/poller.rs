use crate::constants::{filter, poll, settle};
use actor_protocol::{ActorError, MessageStatus, ModemCommand, ReassembledMessage, SessionEvent};
use actor_runtime::{actor_debug, actor_error, actor_info, actor_warn, ChannelManager};
use futures::StreamExt;
use std::time::Duration;

/// Tunables of the polling loop
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Messages containing this tag carry a code
    pub sender_tag: String,
    /// Position of the code among whitespace-separated tokens
    pub code_token_index: usize,
    pub configure_timeout: Duration,
    pub list_all_timeout: Duration,
    pub list_new_timeout: Duration,
    pub delete_timeout: Duration,
    /// Idle time between cycles
    pub poll_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            sender_tag: filter::SENDER_TAG.to_string(),
            code_token_index: filter::CODE_TOKEN_INDEX,
            configure_timeout: Duration::from_millis(settle::CONFIGURE_MS),
            list_all_timeout: Duration::from_millis(settle::LIST_ALL_MS),
            list_new_timeout: Duration::from_millis(settle::LIST_NEW_MS),
            delete_timeout: Duration::from_millis(settle::DELETE_MS),
            poll_interval: Duration::from_millis(poll::INTERVAL_MS),
        }
    }
}

/// Outcome of one list/drain/filter/delete pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// Every message drained in this cycle
    pub messages: Vec<ReassembledMessage>,
    /// Codes found in tagged messages, in message order
    pub codes: Vec<String>,
}

/// The whitespace-separated token at `index` of a text containing `tag`.
pub fn extract_token(text: &str, tag: &str, index: usize) -> Option<String> {
    if !text.contains(tag) {
        return None;
    }
    text.split_whitespace().nth(index).map(str::to_string)
}

/// The code in a message from the bank, if this is one.
pub fn extract_code(text: &str, tag: &str) -> Option<String> {
    extract_token(text, tag, filter::CODE_TOKEN_INDEX)
}

/// Drives the modem: configure once, list everything once, then poll for
/// new messages forever.
///
/// Every command waits for the session's completion event. If none arrives
/// within the command's timeout the poller logs it and carries on as if the
/// command had completed. A delete is the exception: its late `OK` would
/// complete the next listing, so the next cycle waits for it first.
pub struct ModemPoller {
    channels: ChannelManager,
    config: PollerConfig,
    /// `AT+CMGD` sent but not yet acknowledged
    delete_pending: bool,
}

impl ModemPoller {
    pub fn new(channels: ChannelManager, config: PollerConfig) -> Self {
        Self {
            channels,
            config,
            delete_pending: false,
        }
    }

    /// PDU mode, storage selection, then switch the session to listing.
    pub async fn configure(&mut self) -> Result<(), ActorError> {
        for cmd in [ModemCommand::SetPduMode, ModemCommand::SelectStorage] {
            self.command(cmd.clone()).await?;
            let timeout = self.config.configure_timeout;
            self.wait_for(&cmd, timeout, |e| {
                matches!(e, SessionEvent::CommandAcknowledged { .. })
            })
            .await?;
        }
        self.channels.enter_listing()
    }

    /// List every stored message once and return it; nothing is deleted.
    pub async fn initial_listing(&mut self) -> Result<Vec<ReassembledMessage>, ActorError> {
        let timeout = self.config.list_all_timeout;
        self.list(MessageStatus::All, timeout).await?;
        self.channels.drain().await
    }

    /// One polling pass: list unread messages, drain, pick out codes, then
    /// delete processed messages from the modem.
    pub async fn run_cycle(&mut self) -> Result<PollReport, ActorError> {
        self.settle_pending_delete().await?;

        let timeout = self.config.list_new_timeout;
        self.list(MessageStatus::ReceivedUnread, timeout).await?;
        let messages = self.channels.drain().await?;

        let codes = messages
            .iter()
            .filter_map(|m| {
                let code = extract_token(
                    &m.text,
                    &self.config.sender_tag,
                    self.config.code_token_index,
                );
                if code.is_none() && m.text.contains(&self.config.sender_tag) {
                    actor_warn!("Poller: tagged message without code: {}", m.text);
                }
                code
            })
            .collect();

        self.channels.suppress_next_response()?;
        self.command(ModemCommand::DeleteProcessed).await?;
        let timeout = self.config.delete_timeout;
        self.delete_pending = !self.wait_for_delete(timeout).await?;

        Ok(PollReport { messages, codes })
    }

    /// Give an unacknowledged delete one more timeout, then stop suppressing
    /// so the next listing is not swallowed.
    async fn settle_pending_delete(&mut self) -> Result<(), ActorError> {
        if !self.delete_pending {
            return Ok(());
        }
        let timeout = self.config.delete_timeout;
        if !self.wait_for_delete(timeout).await? {
            self.channels.cancel_suppression()?;
        }
        self.delete_pending = false;
        Ok(())
    }

    async fn wait_for_delete(&mut self, timeout: Duration) -> Result<bool, ActorError> {
        self.wait_for(&ModemCommand::DeleteProcessed, timeout, |e| {
            matches!(e, SessionEvent::DeleteAcknowledged)
        })
        .await
    }

    /// Run until a channel closes or a write fails.
    ///
    /// Prints `<address>: <text>` for every message of the initial listing and
    /// `Code: <code>` for every code found afterwards.
    pub async fn run(mut self) -> Result<(), ActorError> {
        self.configure().await?;

        for message in self.initial_listing().await? {
            println!("{}: {}", message.address, message.text);
        }

        loop {
            let report = self.run_cycle().await?;
            actor_debug!(
                "Poller: cycle drained {} messages, {} codes",
                report.messages.len(),
                report.codes.len()
            );
            for code in &report.codes {
                println!("Code: {}", code);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn list(&mut self, status: MessageStatus, timeout: Duration) -> Result<(), ActorError> {
        let cmd = ModemCommand::List(status);
        self.command(cmd.clone()).await?;
        self.wait_for(&cmd, timeout, |e| {
            matches!(
                e,
                SessionEvent::ListingComplete { .. }
                    | SessionEvent::CommandAcknowledged { ok: false, .. }
            )
        })
        .await?;
        Ok(())
    }

    /// Discard events left over from earlier commands, then send `cmd`.
    async fn command(&mut self, cmd: ModemCommand) -> Result<(), ActorError> {
        while let Ok(Some(event)) = self.channels.event_receiver().try_next() {
            log_event(&event);
        }
        actor_debug!("Poller: sending {}", cmd.at_string());
        self.channels.send_command(cmd).await
    }

    /// Wait until `done` matches an event or `timeout` elapses.
    ///
    /// Returns whether the completion event arrived.
    async fn wait_for<F>(
        &mut self,
        cmd: &ModemCommand,
        timeout: Duration,
        mut done: F,
    ) -> Result<bool, ActorError>
    where
        F: FnMut(&SessionEvent) -> bool,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        let events = self.channels.event_receiver();

        loop {
            match tokio::time::timeout_at(deadline, events.next()).await {
                Ok(Some(event)) => {
                    log_event(&event);
                    if done(&event) {
                        return Ok(true);
                    }
                }
                Ok(None) => {
                    return Err(ActorError::ChannelClosed(
                        "Session event stream ended. The session actor stopped.".into(),
                    ))
                }
                Err(_) => {
                    actor_warn!(
                        "Poller: no completion for {} within {:?}, continuing",
                        cmd.at_string(),
                        timeout
                    );
                    return Ok(false);
                }
            }
        }
    }
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Error { message } => {
            actor_error!("Poller: {}", message);
        }
        SessionEvent::CommandAcknowledged {
            ok: false,
            response,
        } => {
            actor_warn!("Poller: modem rejected command: {:?}", response);
        }
        SessionEvent::StatusUpdate { message } => {
            actor_info!("Poller: {}", message);
        }
        other => {
            actor_debug!("Poller: {:?}", other);
        }
    }
}
