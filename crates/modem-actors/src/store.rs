//! Ordered, duplicate-free fragment store and the reassembler that empties it.

use actor_protocol::{MessageFragment, ReassembledMessage};
use actor_runtime::actor_warn;
use std::collections::BTreeSet;

/// Fragments collected during one polling cycle.
///
/// Iteration follows the `(group, sequence, text)` order of
/// [`MessageFragment`]: standalone messages first, then each group with its
/// parts in sequence order, regardless of arrival order.
#[derive(Debug, Default)]
pub struct MessageStore {
    fragments: BTreeSet<MessageFragment>,
}

/// Group being accumulated during a drain
struct PendingGroup {
    group: u16,
    address: String,
    text: String,
    parts: usize,
    expected_parts: Option<u8>,
}

impl PendingGroup {
    fn start(group: u16, fragment: MessageFragment) -> Self {
        Self {
            group,
            address: fragment.address,
            text: fragment.text,
            parts: 1,
            expected_parts: fragment.total,
        }
    }

    fn finish(self) -> ReassembledMessage {
        let message = ReassembledMessage {
            address: self.address,
            text: self.text,
            parts: self.parts,
            expected_parts: self.expected_parts,
        };
        if !message.is_complete() {
            actor_warn!(
                "MessageStore: group {} from {} incomplete ({}/{} parts)",
                self.group,
                message.address,
                message.parts,
                message.expected_parts.unwrap_or_default()
            );
        }
        message
    }
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment. Returns `false` if an identical fragment is already
    /// stored (the store is unchanged).
    pub fn insert(&mut self, fragment: MessageFragment) -> bool {
        self.fragments.insert(fragment)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Empty the store, joining each concatenation group into one message.
    ///
    /// Standalone fragments become one message each. A group is flushed when
    /// the walk reaches a different group or the end; incomplete groups are
    /// still returned.
    pub fn drain_and_reassemble(&mut self) -> Vec<ReassembledMessage> {
        let mut messages = Vec::new();
        let mut current: Option<PendingGroup> = None;

        for fragment in std::mem::take(&mut self.fragments) {
            match fragment.group {
                None => {
                    if let Some(pending) = current.take() {
                        messages.push(pending.finish());
                    }
                    messages.push(ReassembledMessage {
                        address: fragment.address,
                        text: fragment.text,
                        parts: 1,
                        expected_parts: None,
                    });
                }
                Some(group) => match current.as_mut() {
                    Some(pending) if pending.group == group => {
                        pending.text.push_str(&fragment.text);
                        pending.parts += 1;
                    }
                    _ => {
                        if let Some(pending) = current.take() {
                            messages.push(pending.finish());
                        }
                        current = Some(PendingGroup::start(group, fragment));
                    }
                },
            }
        }

        if let Some(pending) = current {
            messages.push(pending.finish());
        }

        messages
    }
}
