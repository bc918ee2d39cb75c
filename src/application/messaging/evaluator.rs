//! Roll evaluator - Validates a roll command and draws the dice

use rand::Rng;

use crate::domain::entities::{RejectReason, RollCommand, RollOutcome};

/// Most dice a single command may roll
pub const MAX_DICE: u32 = 20;

/// Evaluate a command, drawing from `rng` only when it passes validation
pub fn evaluate<R: Rng + ?Sized>(command: &RollCommand, rng: &mut R) -> RollOutcome {
    if command.dice() > MAX_DICE {
        return RollOutcome::Rejected(RejectReason::TooManyDice);
    }
    if command.faces() == 0 {
        return RollOutcome::Rejected(RejectReason::ZeroFaces);
    }

    let draws = (0..command.dice())
        .map(|_| rng.gen_range(1..=command.faces()))
        .collect();
    RollOutcome::succeeded(draws)
}
