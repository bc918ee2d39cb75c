use std::fmt;

/// Dice count used when the command omits it
pub const DEFAULT_DICE: u32 = 1;

/// Face count used when the command omits it
pub const DEFAULT_FACES: u64 = 100;

/// A recognized roll command with defaults already applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollCommand {
    dice: u32,
    faces: u64,
    label: String,
}

impl RollCommand {
    /// Build a command from the optional parts of the grammar.
    ///
    /// Returns `None` for an explicit zero dice count, which has no
    /// meaningful roll and is not treated as "omitted".
    pub fn from_parts(dice: Option<u32>, faces: Option<u64>, label: Option<&str>) -> Option<Self> {
        let dice = dice.unwrap_or(DEFAULT_DICE);
        if dice == 0 {
            return None;
        }
        Some(Self {
            dice,
            faces: faces.unwrap_or(DEFAULT_FACES),
            label: label.unwrap_or_default().to_string(),
        })
    }

    pub fn new(dice: u32, faces: u64) -> Self {
        Self {
            dice: dice.max(1),
            faces,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn dice(&self) -> u32 {
        self.dice
    }

    pub fn faces(&self) -> u64 {
        self.faces
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for RollCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}D{}", self.dice, self.faces)
    }
}
