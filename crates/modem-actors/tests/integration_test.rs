//! Integration tests for the modem actors
//!
//! These tests run SessionActor, PortActor and ModemPoller together against
//! a scripted modem that answers AT commands like a real one.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use actor_protocol::{ActorError, ReassembledMessage};
use actor_runtime::{Actor, ActorHandles, ChannelManager};
use core_types::{Transport, TransportError};
use modem_actors::{ModemPoller, PollerConfig, PortActor, SessionActor};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PART_ONE: &str = "0044048121430000521010214305000D050003070201906536FB0D02";
const PART_TWO: &str = "0044048121430000521010214305000C050003070202AE6F399B0C";
const EIGHT_BIT: &str = "00040481214300045210102143050003414243";
const UCS2_CYRILLIC: &str = "00040B919700214365F70008521010214305000C041F04400438043204350442";
const BANK_CODE: &str = "00040CD0D4F718BD0E0300005210102143050024C2B07B4D7D8FD1EBB00E947FD7E5A0F19B5C06A5E7201A4E1603D1D161F77A0E";
const UNSUPPORTED_DCS: &str = "000404812143000C5210102143050003414243";

/// Bytes per simulated serial read
const CHUNK: usize = 16;

struct StoredSms {
    index: u32,
    read: bool,
    pdu: String,
}

#[derive(Default)]
struct ModemState {
    storage: Vec<StoredSms>,
    next_index: u32,
    outgoing: VecDeque<Vec<u8>>,
    commands: Vec<String>,
    /// Never answer listings (simulates a stalled modem)
    mute_listings: bool,
    fail_writes: bool,
    /// Answer `AT+CMGD` with the echo only and send `OK` this much later
    delete_ok_delay: Option<Duration>,
}

impl ModemState {
    fn store(&mut self, pdu: &str, read: bool) {
        self.next_index += 1;
        self.storage.push(StoredSms {
            index: self.next_index,
            read,
            pdu: pdu.to_string(),
        });
    }

    fn respond(&mut self, response: String) {
        for chunk in response.as_bytes().chunks(CHUNK) {
            self.outgoing.push_back(chunk.to_vec());
        }
    }

    fn listing(&mut self, command: &str, unread_only: bool) -> String {
        let mut out = format!("{}\r\r\n", command);
        for sms in self.storage.iter_mut() {
            if unread_only && sms.read {
                continue;
            }
            let status = if sms.read { 1 } else { 0 };
            out.push_str(&format!(
                "+CMGL: {},{},,{}\r\n{}\r\n",
                sms.index,
                status,
                sms.pdu.len() / 2 - 1,
                sms.pdu
            ));
            sms.read = true;
        }
        out.push_str("\r\nOK\r\n");
        out
    }

    fn execute(&mut self, command: &str) {
        self.commands.push(command.to_string());
        let response = match command {
            "ATI" => "ATI\r\r\nManufacturer: huawei\r\nIMEI: 861234567890123\r\n\r\nOK\r\n".to_string(),
            "AT+CMGF=0" => "AT+CMGF=0\r\r\nOK\r\n".to_string(),
            "AT+CPMS=\"MT\"" => "AT+CPMS=\"MT\"\r\r\n+CPMS: 2,50,2,50,2,50\r\n\r\nOK\r\n".to_string(),
            "AT+CMGL=4" | "AT+CMGL=0" if self.mute_listings => return,
            "AT+CMGL=4" => self.listing(command, false),
            "AT+CMGL=0" => self.listing(command, true),
            "AT+CMGD=1,3" => {
                self.storage.retain(|sms| !sms.read);
                if self.delete_ok_delay.is_some() {
                    self.outgoing.push_back(b"AT+CMGD=1,3\r\r\n".to_vec());
                } else {
                    self.outgoing.push_back(b"AT+CMGD=1,3\r\r\nOK\r\n".to_vec());
                }
                return;
            }
            _ => format!("{}\r\r\nERROR\r\n", command),
        };
        self.respond(response);
    }
}

/// Scripted modem shared between the PortActor and the test body
#[derive(Clone, Default)]
struct MockModem {
    state: Arc<Mutex<ModemState>>,
}

impl MockModem {
    /// A message arriving from the network
    fn deliver(&self, pdu: &str) {
        self.state.lock().unwrap().store(pdu, false);
    }

    fn preload_read(&self, pdu: &str) {
        self.state.lock().unwrap().store(pdu, true);
    }

    fn stored(&self) -> usize {
        self.state.lock().unwrap().storage.len()
    }

    fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }
}

impl Transport for MockModem {
    async fn read_chunk(&self) -> Result<(Vec<u8>, u64), TransportError> {
        let next = self.state.lock().unwrap().outgoing.pop_front();
        match next {
            Some(data) => Ok((data, 0)),
            None => {
                tokio::time::sleep(Duration::from_millis(2)).await;
                Ok((Vec::new(), 0))
            }
        }
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(TransportError::Io("Broken pipe".into()));
        }
        let command = String::from_utf8_lossy(data).trim_end().to_string();
        state.execute(&command);

        let delayed_ok = state.delete_ok_delay.filter(|_| command == "AT+CMGD=1,3");
        if let Some(delay) = delayed_ok {
            let shared = Arc::clone(&self.state);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                shared.lock().unwrap().outgoing.push_back(b"\r\nOK\r\n".to_vec());
            });
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

fn fast_config() -> PollerConfig {
    PollerConfig {
        configure_timeout: Duration::from_millis(500),
        list_all_timeout: Duration::from_millis(500),
        list_new_timeout: Duration::from_millis(500),
        delete_timeout: Duration::from_millis(500),
        poll_interval: Duration::from_millis(10),
        ..PollerConfig::default()
    }
}

/// Wire up and spawn SessionActor and PortActor around `modem`.
fn start(modem: &MockModem, config: PollerConfig) -> ModemPoller {
    let (manager, handles) = ChannelManager::new();
    let ActorHandles {
        session_rx,
        port_rx,
        event_tx,
    } = handles;

    let session = SessionActor::new(event_tx.clone());
    let port = PortActor::new(
        "mock",
        modem.clone(),
        manager.session_sender(),
        event_tx.clone(),
    );

    let session_events = event_tx.clone();
    tokio::spawn(async move { session.run(session_rx, session_events).await });
    tokio::spawn(async move { port.run(port_rx, event_tx).await });

    ModemPoller::new(manager, config)
}

fn texts(messages: &[ReassembledMessage]) -> Vec<(&str, &str)> {
    messages
        .iter()
        .map(|m| (m.address.as_str(), m.text.as_str()))
        .collect()
}

#[tokio::test]
async fn test_configure_sends_commands_in_order() {
    let modem = MockModem::default();
    let mut poller = start(&modem, fast_config());

    poller.configure().await.unwrap();

    assert_eq!(modem.commands(), vec!["AT+CMGF=0", "AT+CPMS=\"MT\""]);
}

#[tokio::test]
async fn test_initial_listing_returns_everything_and_deletes_nothing() {
    let modem = MockModem::default();
    modem.preload_read(EIGHT_BIT);
    modem.preload_read(UCS2_CYRILLIC);
    let mut poller = start(&modem, fast_config());

    poller.configure().await.unwrap();
    let messages = poller.initial_listing().await.unwrap();

    assert_eq!(
        texts(&messages),
        vec![("1234", "ABC"), ("+79001234567", "Привет")]
    );
    assert_eq!(modem.stored(), 2);
}

#[tokio::test]
async fn test_cycle_reassembles_extracts_code_and_deletes() {
    let modem = MockModem::default();
    let mut poller = start(&modem, fast_config());
    poller.configure().await.unwrap();
    poller.initial_listing().await.unwrap();

    // Parts arrive out of order, plus a message nobody can decode
    modem.deliver(PART_TWO);
    modem.deliver(BANK_CODE);
    modem.deliver(PART_ONE);
    modem.deliver(UNSUPPORTED_DCS);

    let report = poller.run_cycle().await.unwrap();

    assert_eq!(report.codes, vec!["4821".to_string()]);
    assert_eq!(
        texts(&report.messages),
        vec![
            ("Tochka", "BankTochka: your code is 4821 thanks"),
            ("1234", "Hello World")
        ]
    );
    assert_eq!(modem.stored(), 0);

    let commands = modem.commands();
    assert_eq!(
        &commands[commands.len() - 2..],
        &["AT+CMGL=0".to_string(), "AT+CMGD=1,3".to_string()]
    );
}

#[tokio::test]
async fn test_empty_cycle() {
    let modem = MockModem::default();
    let mut poller = start(&modem, fast_config());
    poller.configure().await.unwrap();

    let report = poller.run_cycle().await.unwrap();
    assert!(report.messages.is_empty());
    assert!(report.codes.is_empty());
}

#[tokio::test]
async fn test_consecutive_cycles_do_not_repeat_messages() {
    let modem = MockModem::default();
    let mut poller = start(&modem, fast_config());
    poller.configure().await.unwrap();

    modem.deliver(BANK_CODE);
    let first = poller.run_cycle().await.unwrap();
    assert_eq!(first.codes.len(), 1);

    let second = poller.run_cycle().await.unwrap();
    assert!(second.messages.is_empty());

    modem.deliver(EIGHT_BIT);
    let third = poller.run_cycle().await.unwrap();
    assert_eq!(texts(&third.messages), vec![("1234", "ABC")]);
    assert!(third.codes.is_empty());
}

#[tokio::test]
async fn test_slow_delete_ok_keeps_next_listing() {
    let modem = MockModem::default();
    modem.state.lock().unwrap().delete_ok_delay = Some(Duration::from_millis(300));
    let mut poller = start(&modem, fast_config());
    poller.configure().await.unwrap();

    modem.deliver(BANK_CODE);
    let first = poller.run_cycle().await.unwrap();
    assert_eq!(first.codes, vec!["4821".to_string()]);

    // The echo alone must not end the delete; its OK must not end this listing
    modem.deliver(BANK_CODE);
    let second = poller.run_cycle().await.unwrap();
    assert_eq!(second.codes, vec!["4821".to_string()]);
    assert_eq!(modem.stored(), 0);
}

#[tokio::test]
async fn test_delete_ok_after_timeout_is_settled_next_cycle() {
    let modem = MockModem::default();
    modem.state.lock().unwrap().delete_ok_delay = Some(Duration::from_millis(150));
    let mut poller = start(
        &modem,
        PollerConfig {
            delete_timeout: Duration::from_millis(100),
            ..fast_config()
        },
    );
    poller.configure().await.unwrap();

    modem.deliver(BANK_CODE);
    let first = poller.run_cycle().await.unwrap();
    assert_eq!(first.codes, vec!["4821".to_string()]);

    modem.deliver(BANK_CODE);
    let second = poller.run_cycle().await.unwrap();
    assert_eq!(
        texts(&second.messages),
        vec![("Tochka", "BankTochka: your code is 4821 thanks")]
    );
    assert_eq!(second.codes, vec!["4821".to_string()]);
}

#[tokio::test]
async fn test_stalled_listing_falls_back_to_timeout() {
    let modem = MockModem::default();
    modem.state.lock().unwrap().mute_listings = true;
    modem.deliver(BANK_CODE);

    let mut poller = start(
        &modem,
        PollerConfig {
            list_new_timeout: Duration::from_millis(100),
            ..fast_config()
        },
    );
    poller.configure().await.unwrap();

    let report = tokio::time::timeout(Duration::from_secs(5), poller.run_cycle())
        .await
        .expect("cycle should finish after the listing timeout")
        .unwrap();

    assert!(report.messages.is_empty());
    assert!(modem.commands().contains(&"AT+CMGD=1,3".to_string()));
}

#[tokio::test]
async fn test_write_failure_stops_poller() {
    let modem = MockModem::default();
    modem.state.lock().unwrap().fail_writes = true;
    let mut poller = start(&modem, fast_config());

    match poller.configure().await {
        Err(ActorError::Transport(msg)) => assert!(msg.contains("Broken pipe")),
        other => panic!("Expected transport error, got {:?}", other),
    }
}
