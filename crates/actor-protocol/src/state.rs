/// # Session Phase Machine
///
/// The session interprets modem responses differently before and after the
/// poller finishes configuring the modem.
///
/// ## Phase Transition Diagram
///
/// ```text
///   ┌─────────────┐   EnterListing   ┌───────────┐
///   │ Configuring │─────────────────►│  Listing  │◄──┐
///   └─────────────┘                  └─────┬─────┘   │ EnterListing
///                                          └─────────┘ (no-op)
/// ```
///
/// ## Phase Invariants
///
/// - **Configuring**: lines are checked for the identity marker and terminal
///   lines; nothing is stored
/// - **Listing**: lines are buffered until `OK`, then interpreted as a
///   message listing and stored
///
/// There is no way back to `Configuring`. Suppressing the response to a
/// delete command is a separate flag, not a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SessionPhase {
    /// Initial commands (mode, storage selection, identification)
    #[default]
    Configuring,

    /// Responses are message listings
    Listing,
}

impl SessionPhase {
    /// Validate if transition to new_phase is allowed from current phase
    pub fn can_transition_to(&self, new_phase: SessionPhase) -> bool {
        use SessionPhase::*;

        match (self, new_phase) {
            (Configuring, Listing) => true,
            (Listing, Listing) => true, // Idempotent (no-op)
            _ => false,
        }
    }

    /// Are complete lines collected for the listing interpreter?
    pub fn collects_listing(&self) -> bool {
        matches!(self, Self::Listing)
    }

    /// Operator-facing status text
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Configuring => "Configuring modem...",
            Self::Listing => "Polling messages",
        }
    }
}
