//! Centralized configuration constants for the modem actors
//!
//! Timing values come from running the poller against USB GSM sticks; the
//! response markers are fixed by the AT command set (3GPP TS 27.005/27.007).
//!
//! **Before changing any timing constant:**
//! 1. Read its full documentation comment
//! 2. Understand the modem behaviour the value covers
//! 3. Test against a real modem with a full SIM (slow listings)

/// How long the poller waits for each command to complete
///
/// The session reports completion explicitly (`OK` seen, listing interpreted,
/// delete acknowledged). These values are the fallback when the modem never
/// sends a terminal line; after a timeout the poller proceeds as if the
/// command had completed.
pub mod settle {
    /// Configuration commands (`AT+CMGF=0`, `AT+CPMS="MT"`)
    ///
    /// **Value**: 2000ms
    ///
    /// **Rationale**: Mode and storage selection are answered from modem RAM,
    /// usually within 50-200ms. 2s also covers modems still busy with SIM
    /// initialisation right after power-up.
    ///
    /// **Used in**: poller.rs (`configure`)
    pub const CONFIGURE_MS: u64 = 2_000;

    /// Full listing (`AT+CMGL=4`)
    ///
    /// **Value**: 15000ms
    ///
    /// **Rationale**: Listing every stored message reads the whole SIM. A full
    /// SIM (30-50 entries) at 9600 baud takes 5-10s to transfer.
    ///
    /// **Used in**: poller.rs (`initial_listing`)
    pub const LIST_ALL_MS: u64 = 15_000;

    /// Unread listing (`AT+CMGL=0`)
    ///
    /// **Value**: 30000ms
    ///
    /// **Rationale**: Some modems hold the response until a pending network
    /// delivery is written to storage, which can take tens of seconds.
    ///
    /// **Used in**: poller.rs (`run_cycle`)
    pub const LIST_NEW_MS: u64 = 30_000;

    /// Delete (`AT+CMGD=1,3`)
    ///
    /// **Value**: 30000ms
    ///
    /// **Rationale**: Deleting rewrites SIM storage; slow SIMs need several
    /// seconds per entry.
    ///
    /// **Used in**: poller.rs (`run_cycle`)
    pub const DELETE_MS: u64 = 30_000;
}

/// Polling cadence
pub mod poll {
    /// Idle time between two polling cycles (milliseconds)
    ///
    /// **Value**: 5000ms
    ///
    /// **Rationale**: A cycle already spends most of its time waiting on the
    /// modem. 5s between cycles keeps codes arriving promptly without keeping
    /// the modem permanently busy.
    ///
    /// **Used in**: poller.rs (`run`)
    pub const INTERVAL_MS: u64 = 5_000;
}

/// Port read loop
pub mod port {
    /// Consecutive read failures before the read loop gives up
    ///
    /// **Value**: 3 failures
    ///
    /// **Rationale**: A single failed read happens when the USB stick
    /// re-enumerates its interfaces after a network registration change.
    /// Three failures in a row mean the device is gone; continuing would only
    /// flood the log.
    ///
    /// **Used in**: port_actor.rs (`read_loop`)
    pub const MAX_READ_FAILURES: u32 = 3;

    /// Delay before retrying a failed read (milliseconds)
    ///
    /// **Value**: 500ms
    ///
    /// **Used in**: port_actor.rs (`read_loop`)
    pub const READ_RETRY_MS: u64 = 500;
}

/// Modem discovery
pub mod discovery {
    /// How long to wait for an `IMEI:` line after `ATI` (milliseconds)
    ///
    /// **Value**: 2000ms
    ///
    /// **Rationale**: A modem answers `ATI` within ~100ms. Ports with other
    /// devices attached never answer; 2s per port keeps discovery short on
    /// machines with several serial ports.
    ///
    /// **Used in**: discovery.rs
    pub const IDENTIFY_TIMEOUT_MS: u64 = 2_000;
}

/// Markers in modem responses
pub mod response {
    /// Header line preceding each PDU in a listing
    pub const LISTING_ENTRY: &str = "+CMGL:";

    /// Terminal line of a successful command
    pub const OK: &str = "OK";

    /// Plain terminal error line
    pub const ERROR: &str = "ERROR";

    /// Extended error prefixes (equipment and message service errors)
    pub const ERROR_PREFIXES: [&str; 2] = ["+CME ERROR", "+CMS ERROR"];

    /// Marker in the `ATI` response that identifies a GSM modem
    pub const IDENTITY: &str = "IMEI:";

    /// Is this trimmed line the success terminator?
    pub fn is_ok(line: &str) -> bool {
        line == OK
    }

    /// Is this trimmed line an error terminator?
    pub fn is_error(line: &str) -> bool {
        line == ERROR || ERROR_PREFIXES.iter().any(|p| line.starts_with(p))
    }
}

/// Code extraction
pub mod filter {
    /// Messages containing this tag carry a code
    pub const SENDER_TAG: &str = "BankTochka:";

    /// Zero-based index of the code among whitespace-separated tokens
    ///
    /// **Value**: 4
    ///
    /// **Rationale**: The bank's template is `BankTochka: <3 words> <code> ...`.
    pub const CODE_TOKEN_INDEX: usize = 4;
}
