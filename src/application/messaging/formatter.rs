//! Response formatter - Renders the reply text for an evaluated roll

use crate::domain::entities::{RejectReason, RollCommand, RollOutcome};

/// Reply sent when a command asks for too many dice
pub const TOO_MANY_DICE_REPLY: &str = "骰子 太 多 了";

/// Reply sent for a die with zero faces
pub const INVALID_DIE_REPLY: &str = "? ? ? ? ?";

/// Fixed reply for a rejected roll
pub fn rejection_reply(reason: RejectReason) -> &'static str {
    match reason {
        RejectReason::TooManyDice => TOO_MANY_DICE_REPLY,
        RejectReason::ZeroFaces => INVALID_DIE_REPLY,
    }
}

/// Render the reply for `outcome`.
///
/// The label is emitted as-is, so an empty label leaves a double space.
pub fn format_reply(display_name: &str, command: &RollCommand, outcome: &RollOutcome) -> String {
    let (draws, sum) = match outcome {
        RollOutcome::Rejected(reason) => return rejection_reply(*reason).to_string(),
        RollOutcome::Succeeded { draws, sum } => (draws, sum),
    };

    let result = match draws.as_slice() {
        [single] => single.to_string(),
        _ => {
            let joined: Vec<String> = draws.iter().map(|d| d.to_string()).collect();
            format!("{}={}", joined.join("+"), sum)
        }
    };

    format!(
        "{} 投掷 R{}D{} {} 结果为 {}",
        display_name,
        command.dice(),
        command.faces(),
        command.label(),
        result
    )
}
