//! Wizard steps

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the five-step wizard. Ordered: later steps compare greater.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum WizardStep {
    /// No table loaded yet
    #[default]
    Unloaded,
    /// Column metadata loaded into the working set
    TableLoaded,
    /// Suggestion generation unlocked
    SuggestionsGenerated,
    /// Final comments seeded and editable
    CommentsConfirmed,
    /// SQL statements can be reviewed and executed
    SqlReviewed,
    /// Markdown export available
    Exported,
}

impl WizardStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unloaded => "Unloaded",
            Self::TableLoaded => "TableLoaded",
            Self::SuggestionsGenerated => "SuggestionsGenerated",
            Self::CommentsConfirmed => "CommentsConfirmed",
            Self::SqlReviewed => "SqlReviewed",
            Self::Exported => "Exported",
        }
    }

    /// Step number as shown to the user (0-5).
    pub fn number(&self) -> u8 {
        match self {
            Self::Unloaded => 0,
            Self::TableLoaded => 1,
            Self::SuggestionsGenerated => 2,
            Self::CommentsConfirmed => 3,
            Self::SqlReviewed => 4,
            Self::Exported => 5,
        }
    }

    pub fn next_step(&self) -> Option<Self> {
        match self {
            Self::Unloaded => Some(Self::TableLoaded),
            Self::TableLoaded => Some(Self::SuggestionsGenerated),
            Self::SuggestionsGenerated => Some(Self::CommentsConfirmed),
            Self::CommentsConfirmed => Some(Self::SqlReviewed),
            Self::SqlReviewed => Some(Self::Exported),
            Self::Exported => None,
        }
    }

    /// Forward moves are one step at a time.
    pub fn can_advance_to(&self, target: Self) -> bool {
        self.next_step() == Some(target)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_are_ordered() {
        let mut step = WizardStep::Unloaded;
        let mut seen = vec![step];
        while let Some(next) = step.next_step() {
            assert!(next > step);
            assert_eq!(next.number(), step.number() + 1);
            step = next;
            seen.push(step);
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(step, WizardStep::Exported);
    }

    #[test]
    fn test_can_advance_only_one_step() {
        assert!(WizardStep::TableLoaded.can_advance_to(WizardStep::SuggestionsGenerated));
        assert!(!WizardStep::TableLoaded.can_advance_to(WizardStep::CommentsConfirmed));
        assert!(!WizardStep::SqlReviewed.can_advance_to(WizardStep::TableLoaded));
    }

    #[test]
    fn test_display() {
        assert_eq!(WizardStep::SqlReviewed.to_string(), "4 (SqlReviewed)");
    }
}
