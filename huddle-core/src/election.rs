//! Deterministic offerer election.
//!
//! For any pair of participants the one with the lexicographically greater id
//! makes every offer. Both sides evaluate this locally from ids they already
//! hold, so no role handshake is ever exchanged and roles never change mid-call.

use crate::model::ParticipantId;

/// The participant that offers for the pair `(a, b)`.
pub fn offerer<'a>(a: &'a ParticipantId, b: &'a ParticipantId) -> &'a ParticipantId {
    if a >= b { a } else { b }
}

/// Whether `local` offers to `remote`. Never true for a participant and itself.
pub fn is_offerer(local: &ParticipantId, remote: &ParticipantId) -> bool {
    local > remote
}
