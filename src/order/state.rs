use serde::{Deserialize, Serialize};

use crate::core::LastschriftError;

/// Lifecycle of a payment order: `draft → open → generated → uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOrderState {
    /// Lines can be added or removed.
    Draft,
    /// Lines are frozen and grouped into bank payment lines.
    Open,
    /// The payment file exists.
    Generated,
    /// The file was sent to the bank. Terminal.
    Uploaded,
}

impl PaymentOrderState {
    /// The state a forward transition leads to, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Open),
            Self::Open => Some(Self::Generated),
            Self::Generated => Some(Self::Uploaded),
            Self::Uploaded => None,
        }
    }

    /// Name of the transition leaving this state.
    pub fn transition_name(&self) -> Option<&'static str> {
        match self {
            Self::Draft => Some("draft2open"),
            Self::Open => Some("open2generated"),
            Self::Generated => Some("generated2uploaded"),
            Self::Uploaded => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Check that `target` is the direct successor of this state.
    pub fn check_transition(&self, target: Self) -> Result<(), LastschriftError> {
        if self.next() == Some(target) {
            Ok(())
        } else {
            Err(LastschriftError::Validation(format!(
                "payment order cannot go from {self:?} to {target:?}"
            )))
        }
    }
}
