use std::fmt;

/// Why a roll was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    TooManyDice,
    ZeroFaces,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::TooManyDice => "too many dice",
            RejectReason::ZeroFaces => "degenerate die: zero faces",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating a roll command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    Rejected(RejectReason),
    /// Individual draws in draw order, plus their sum
    Succeeded { draws: Vec<u64>, sum: u128 },
}

impl RollOutcome {
    pub fn succeeded(draws: Vec<u64>) -> Self {
        let sum = draws.iter().map(|&d| u128::from(d)).sum();
        RollOutcome::Succeeded { draws, sum }
    }
}
