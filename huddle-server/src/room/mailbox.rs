use chrono::Utc;
use huddle_core::model::wire::FetchResponse;
use huddle_core::model::{ParticipantId, Signal, SignalKind};
use serde_json::Value;

/// Append-only signal log of one room.
///
/// `seq` starts at 1 and grows by exactly one per append. Callers serialize
/// appends through the room's entry lock.
#[derive(Default)]
pub struct Mailbox {
    log: Vec<Signal>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seq(&self) -> u64 {
        self.log.last().map_or(0, |s| s.seq)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Stores a signal and returns the seq it was given.
    pub fn append(
        &mut self,
        from: ParticipantId,
        to: Option<ParticipantId>,
        kind: SignalKind,
        payload: Value,
    ) -> u64 {
        let seq = self.last_seq() + 1;
        self.log.push(Signal {
            seq,
            kind,
            payload,
            from_participant_id: from,
            to_participant_id: to,
            created_at: Utc::now(),
        });
        seq
    }

    /// Signals after `after_seq` that `reader` should see, at most `limit`.
    ///
    /// Signals addressed to someone else, and the reader's own, are skipped
    /// but still move the cursor. The cursor stops at the last returned signal
    /// when the page fills up.
    pub fn fetch(&self, reader: &ParticipantId, after_seq: u64, limit: usize) -> FetchResponse {
        let start = self.log.partition_point(|s| s.seq <= after_seq);
        let mut signals = Vec::new();
        let mut next_after_seq = after_seq;

        for signal in &self.log[start..] {
            let visible =
                &signal.from_participant_id != reader && signal.is_addressed_to(reader);
            if visible {
                if signals.len() == limit {
                    break;
                }
                signals.push(signal.clone());
            }
            next_after_seq = signal.seq;
        }

        FetchResponse {
            signals,
            next_after_seq,
        }
    }
}
