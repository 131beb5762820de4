//! Strike events
//!
//! Events emitted by the striker for notification collaborators.

use super::types::StrikeKind;
use serde::{Deserialize, Serialize};

/// Events emitted when strikes change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrikeEvent {
    /// A strike was recorded below the limit
    Struck {
        hash: String,
        name: String,
        kind: StrikeKind,
        count: u32,
        max_strikes: u32,
    },
    /// A strike brought the item to (or past) its limit
    LimitReached {
        hash: String,
        name: String,
        kind: StrikeKind,
        count: u32,
        max_strikes: u32,
    },
    /// Strikes of one kind were forgiven
    Reset {
        hash: String,
        name: String,
        kind: StrikeKind,
    },
}

impl StrikeEvent {
    /// Normalized hash of the item the event concerns
    pub fn hash(&self) -> &str {
        match self {
            Self::Struck { hash, .. } | Self::LimitReached { hash, .. } | Self::Reset { hash, .. } => {
                hash
            }
        }
    }
}
