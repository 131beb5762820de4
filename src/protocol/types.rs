//! Core protocol types
//!
//! Fundamental types used throughout the protocol.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a configured rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(Uuid);

impl RuleId {
    /// Create a new random rule ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize an item identity hash for storage and cache keys.
///
/// Torrent clients disagree on hex case, so identities compare case-insensitively.
pub fn normalize_hash(hash: &str) -> String {
    hash.trim().to_ascii_lowercase()
}

/// Tracker privacy of a queue item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyType {
    Public,
    Private,
}

impl PrivacyType {
    /// Both privacy types, in reporting order
    pub const ALL: [PrivacyType; 2] = [PrivacyType::Public, PrivacyType::Private];

    pub fn from_private_flag(is_private: bool) -> Self {
        if is_private {
            Self::Private
        } else {
            Self::Public
        }
    }
}

impl std::fmt::Display for PrivacyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// Which items a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyScope {
    Public,
    Private,
    #[default]
    Both,
}

impl PrivacyScope {
    /// Check if a rule with this scope applies to items of the given privacy
    pub fn applies_to(&self, privacy: PrivacyType) -> bool {
        match self {
            Self::Both => true,
            Self::Public => privacy == PrivacyType::Public,
            Self::Private => privacy == PrivacyType::Private,
        }
    }

    /// Check if two scopes share at least one privacy type
    pub fn intersects(&self, other: PrivacyScope) -> bool {
        PrivacyType::ALL
            .iter()
            .any(|p| self.applies_to(*p) && other.applies_to(*p))
    }
}

impl std::fmt::Display for PrivacyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Category of accumulated violation, counted independently per item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeKind {
    Stalled,
    DownloadingMetadata,
    FailedImport,
    SlowSpeed,
    SlowTime,
}

impl StrikeKind {
    /// Stable string form used in the strike table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stalled => "stalled",
            Self::DownloadingMetadata => "downloading_metadata",
            Self::FailedImport => "failed_import",
            Self::SlowSpeed => "slow_speed",
            Self::SlowTime => "slow_time",
        }
    }
}

impl std::fmt::Display for StrikeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrikeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "stalled" => Ok(Self::Stalled),
            "downloading_metadata" => Ok(Self::DownloadingMetadata),
            "failed_import" => Ok(Self::FailedImport),
            "slow_speed" => Ok(Self::SlowSpeed),
            "slow_time" => Ok(Self::SlowTime),
            _ => Err(format!("Invalid strike kind: {}", s)),
        }
    }
}

/// Why an item should leave the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteReason {
    Stalled,
    DownloadingMetadata,
    FailedImport,
    SlowSpeed,
    SlowTime,
}

impl From<StrikeKind> for DeleteReason {
    fn from(kind: StrikeKind) -> Self {
        match kind {
            StrikeKind::Stalled => Self::Stalled,
            StrikeKind::DownloadingMetadata => Self::DownloadingMetadata,
            StrikeKind::FailedImport => Self::FailedImport,
            StrikeKind::SlowSpeed => Self::SlowSpeed,
            StrikeKind::SlowTime => Self::SlowTime,
        }
    }
}
