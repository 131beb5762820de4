//! Byte-size thresholds
//!
//! Rules carry their thresholds as human-entered strings ("10 MB",
//! "500 KiB/s"). This module turns them into byte counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KB: u64 = 1_000;
const KIB: u64 = 1_024;

/// A size in bytes, parsed from a human-readable string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ByteSize(u64);

impl ByteSize {
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub const fn kb(n: u64) -> Self {
        Self(n * KB)
    }

    pub const fn mb(n: u64) -> Self {
        Self(n * KB * KB)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parse a threshold that may be left blank.
    ///
    /// Blank input means the threshold is not configured and yields `Ok(None)`.
    pub fn parse_optional(s: &str) -> std::result::Result<Option<Self>, String> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for ByteSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        // Speeds are written as "1 MB/s" or "1MBps"; the rate suffix carries no scale.
        let body = lower
            .strip_suffix("/s")
            .or_else(|| lower.strip_suffix("ps"))
            .unwrap_or(&lower)
            .trim_end();

        let split = body
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(body.len());
        let (number, unit) = body.split_at(split);

        if number.is_empty() {
            return Err(format!("Invalid byte size: {:?}", trimmed));
        }

        let value: f64 = number
            .parse()
            .map_err(|_| format!("Invalid number in byte size: {:?}", trimmed))?;

        let multiplier = match unit.trim() {
            "" | "b" => 1,
            "k" | "kb" => KB,
            "m" | "mb" => KB.pow(2),
            "g" | "gb" => KB.pow(3),
            "t" | "tb" => KB.pow(4),
            "kib" => KIB,
            "mib" => KIB.pow(2),
            "gib" => KIB.pow(3),
            "tib" => KIB.pow(4),
            other => return Err(format!("Unknown byte size unit {:?} in {:?}", other, trimmed)),
        };

        let bytes = value * multiplier as f64;
        if !bytes.is_finite() || bytes > u64::MAX as f64 {
            return Err(format!("Byte size out of range: {:?}", trimmed));
        }

        Ok(Self(bytes.round() as u64))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

        if self.0 < KB {
            return write!(f, "{} B", self.0);
        }

        let mut value = self.0 as f64;
        let mut unit = "B";
        for next in UNITS {
            if value < KB as f64 {
                break;
            }
            value /= KB as f64;
            unit = next;
        }
        write!(f, "{:.1} {}", value, unit)
    }
}

impl From<u64> for ByteSize {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_units() {
        assert_eq!("10 MB".parse::<ByteSize>().unwrap().as_u64(), 10_000_000);
        assert_eq!("500KB".parse::<ByteSize>().unwrap().as_u64(), 500_000);
        assert_eq!("1.5 GB".parse::<ByteSize>().unwrap().as_u64(), 1_500_000_000);
        assert_eq!("42".parse::<ByteSize>().unwrap().as_u64(), 42);
        assert_eq!("42 b".parse::<ByteSize>().unwrap().as_u64(), 42);
    }

    #[test]
    fn test_parse_binary_units() {
        assert_eq!("1 KiB".parse::<ByteSize>().unwrap().as_u64(), 1024);
        assert_eq!("2 MiB".parse::<ByteSize>().unwrap().as_u64(), 2 * 1024 * 1024);
        assert_eq!("1gib".parse::<ByteSize>().unwrap().as_u64(), 1 << 30);
    }

    #[test]
    fn test_parse_speed_suffixes() {
        assert_eq!("1 MB/s".parse::<ByteSize>().unwrap(), ByteSize::mb(1));
        assert_eq!("1MBps".parse::<ByteSize>().unwrap(), ByteSize::mb(1));
        assert_eq!(" 250 kb/s ".parse::<ByteSize>().unwrap(), ByteSize::kb(250));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<ByteSize>().is_err());
        assert!("MB".parse::<ByteSize>().is_err());
        assert!("ten MB".parse::<ByteSize>().is_err());
        assert!("10 parsecs".parse::<ByteSize>().is_err());
        assert!("1.2.3 MB".parse::<ByteSize>().is_err());
        assert!("-5 MB".parse::<ByteSize>().is_err());
    }

    #[test]
    fn test_parse_optional() {
        assert_eq!(ByteSize::parse_optional("").unwrap(), None);
        assert_eq!(ByteSize::parse_optional("   ").unwrap(), None);
        assert_eq!(
            ByteSize::parse_optional("1 MB").unwrap(),
            Some(ByteSize::mb(1))
        );
        assert!(ByteSize::parse_optional("fast").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ByteSize::from_bytes(512).to_string(), "512 B");
        assert_eq!(ByteSize::kb(500).to_string(), "500.0 KB");
        assert_eq!(ByteSize::mb(12).to_string(), "12.0 MB");
        assert_eq!(ByteSize::from_bytes(1_500_000_000).to_string(), "1.5 GB");
    }
}
