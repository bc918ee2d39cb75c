//! Roll command parser - Recognizes `.r{dice}d{faces} {label}` in chat text
//!
//! Matching is split in two steps so each can be tested on its own:
//! [`tokenize`] walks the text and captures the raw groups, and
//! [`parse_roll`] turns those captures into a [`RollCommand`] with
//! defaults substituted.

use crate::domain::entities::RollCommand;

const PREFIX: &str = ".r";
const FACE_MARKER: char = 'd';

/// Raw captures of a message that matches the roll grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollMatch<'a> {
    pub dice: Option<&'a str>,
    pub faces: Option<&'a str>,
    pub label: Option<&'a str>,
}

/// Match the whole message against the roll grammar.
///
/// Returns `None` when any character falls outside the grammar. The label is
/// everything after the first whitespace run, so a tail made only of
/// whitespace counts as no label rather than a label of blanks.
pub fn tokenize(text: &str) -> Option<RollMatch<'_>> {
    // A single trailing newline is tolerated, as line-anchored matchers do.
    let text = text.strip_suffix('\n').unwrap_or(text);

    let rest = text.strip_prefix(PREFIX)?;
    let (dice, rest) = take_digits(rest);
    // A bare `.r` is shorthand for `.rd`.
    let (faces, rest) = match rest.strip_prefix(FACE_MARKER) {
        Some(rest) => take_digits(rest),
        None if dice.is_none() && rest.is_empty() => (None, rest),
        None => return None,
    };

    let label = if rest.is_empty() {
        None
    } else {
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let label = rest.trim_start();
        if label.contains('\n') {
            return None;
        }
        (!label.is_empty()).then_some(label)
    };

    Some(RollMatch { dice, faces, label })
}

/// Parse a message into a roll command, or `None` if it is not one
pub fn parse_roll(text: &str) -> Option<RollCommand> {
    let captures = tokenize(text)?;

    // Digit runs only fail to parse on overflow. An oversized dice count is
    // still a command (and gets rejected later); an oversized face count
    // cannot be represented and is not.
    let dice = captures.dice.map(|d| d.parse::<u32>().unwrap_or(u32::MAX));
    let faces = match captures.faces {
        Some(f) => Some(f.parse::<u64>().ok()?),
        None => None,
    };

    RollCommand::from_parts(dice, faces, captures.label)
}

fn take_digits(s: &str) -> (Option<&str>, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        (None, s)
    } else {
        (Some(&s[..end]), &s[end..])
    }
}
