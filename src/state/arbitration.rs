use std::sync::Mutex;

use crate::state::game::PlayerSlot;

/// Outcome of a buzz signal presented to the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// First signal while armed: this buzzer owns the question.
    Won,
    /// Another buzzer already claimed the slot; discard the signal.
    Beaten(PlayerSlot),
    /// The slot is not armed (no question waiting for a buzz); discard.
    Disarmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SlotState {
    #[default]
    Disarmed,
    Armed,
    Claimed(PlayerSlot),
}

/// Serialization point turning three independently-firing buzzers into at
/// most one buzz event per question.
///
/// The slot is armed when a question opens for buzzing and moves to claimed
/// atomically on the first signal; everything after that is discarded until
/// the engine re-arms it for the next buzz-in window. Two signals landing in
/// the same instant resolve to exactly one winner, never zero, never both.
#[derive(Debug, Default)]
pub struct BuzzerArbiter {
    slot: Mutex<SlotState>,
}

impl BuzzerArbiter {
    /// A new arbiter with the slot disarmed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the slot for the next first-buzz race. Any previous claim is
    /// forgotten.
    pub fn arm(&self) {
        let mut slot = self.slot.lock().expect("arbiter lock poisoned");
        *slot = SlotState::Armed;
    }

    /// Close the slot; subsequent signals are discarded until re-armed.
    pub fn close(&self) {
        let mut slot = self.slot.lock().expect("arbiter lock poisoned");
        *slot = SlotState::Disarmed;
    }

    /// Present a buzz signal. The first caller while armed wins and closes
    /// the race in the same atomic step.
    pub fn claim(&self, buzzer: PlayerSlot) -> ClaimOutcome {
        let mut slot = self.slot.lock().expect("arbiter lock poisoned");
        match *slot {
            SlotState::Armed => {
                *slot = SlotState::Claimed(buzzer);
                ClaimOutcome::Won
            }
            SlotState::Claimed(winner) => ClaimOutcome::Beaten(winner),
            SlotState::Disarmed => ClaimOutcome::Disarmed,
        }
    }

    /// Whether the slot currently accepts a signal.
    pub fn is_armed(&self) -> bool {
        matches!(
            *self.slot.lock().expect("arbiter lock poisoned"),
            SlotState::Armed
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn first_claim_wins_and_closes_the_race() {
        let arbiter = BuzzerArbiter::new();
        arbiter.arm();

        assert_eq!(arbiter.claim(PlayerSlot::Two), ClaimOutcome::Won);
        assert_eq!(
            arbiter.claim(PlayerSlot::One),
            ClaimOutcome::Beaten(PlayerSlot::Two)
        );
        assert_eq!(
            arbiter.claim(PlayerSlot::Two),
            ClaimOutcome::Beaten(PlayerSlot::Two)
        );
    }

    #[test]
    fn signals_while_disarmed_are_discarded() {
        let arbiter = BuzzerArbiter::new();
        assert_eq!(arbiter.claim(PlayerSlot::One), ClaimOutcome::Disarmed);

        arbiter.arm();
        arbiter.close();
        assert_eq!(arbiter.claim(PlayerSlot::One), ClaimOutcome::Disarmed);
    }

    #[test]
    fn rearming_opens_a_fresh_race() {
        let arbiter = BuzzerArbiter::new();
        arbiter.arm();
        assert_eq!(arbiter.claim(PlayerSlot::Three), ClaimOutcome::Won);

        arbiter.arm();
        assert_eq!(arbiter.claim(PlayerSlot::One), ClaimOutcome::Won);
    }

    #[tokio::test]
    async fn simultaneous_claims_yield_exactly_one_winner() {
        let arbiter = Arc::new(BuzzerArbiter::new());
        arbiter.arm();

        let mut tasks = Vec::new();
        for slot in PlayerSlot::ALL {
            let arbiter = arbiter.clone();
            tasks.push(tokio::spawn(async move { arbiter.claim(slot) }));
        }

        let mut wins = 0;
        for task in tasks {
            if task.await.unwrap() == ClaimOutcome::Won {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }
}
