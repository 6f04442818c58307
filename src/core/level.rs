//! Severity levels
//!
//! A [`Level`] is an immutable value made of a numeric rank, a symbolic name
//! and the equivalent syslog severity. Levels compare and hash by rank only,
//! so two independently constructed levels with the same rank are equal even
//! if their names differ.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    rank: i32,
    name: Cow<'static, str>,
    syslog_equivalent: i32,
}

/// Legacy name for [`Level`].
#[deprecated(since = "0.1.0", note = "Use Level instead")]
pub type Priority = Level;

impl Level {
    /// Turns every level off.
    pub const OFF: Level = Level::new_static(i32::MAX, "OFF", 0);
    pub const FATAL: Level = Level::new_static(50_000, "FATAL", 0);
    pub const ERROR: Level = Level::new_static(40_000, "ERROR", 3);
    pub const WARN: Level = Level::new_static(30_000, "WARN", 4);
    pub const INFO: Level = Level::new_static(20_000, "INFO", 6);
    pub const DEBUG: Level = Level::new_static(10_000, "DEBUG", 7);
    pub const TRACE: Level = Level::new_static(5_000, "TRACE", 7);
    /// Turns every level on.
    pub const ALL: Level = Level::new_static(i32::MIN, "ALL", 7);

    /// Create a level whose name is known at compile time.
    pub const fn new_static(rank: i32, name: &'static str, syslog_equivalent: i32) -> Self {
        Self {
            rank,
            name: Cow::Borrowed(name),
            syslog_equivalent,
        }
    }

    /// Create a custom level. The rank must not collide with an existing
    /// level, otherwise the two compare equal.
    pub fn custom(rank: i32, name: impl Into<String>, syslog_equivalent: i32) -> Self {
        Self {
            rank,
            name: Cow::Owned(name.into()),
            syslog_equivalent,
        }
    }

    #[inline]
    pub fn rank(&self) -> i32 {
        self.rank
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn syslog_equivalent(&self) -> i32 {
        self.syslog_equivalent
    }

    /// `true` when this level is at least as severe as `threshold`.
    #[inline]
    pub fn is_as_severe_as(&self, threshold: &Level) -> bool {
        self.rank >= threshold.rank
    }

    /// The well-known levels, least severe first (sentinels excluded).
    pub fn standard_levels() -> [Level; 6] {
        [
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
            Level::FATAL,
        ]
    }

    /// Convert a symbolic name to a level, returning `default` if the
    /// name is not recognised.
    pub fn to_level(name: &str, default: Level) -> Level {
        name.parse().unwrap_or(default)
    }

    /// Convert a rank to the matching well-known level, or `default`.
    pub fn from_rank(rank: i32, default: Level) -> Level {
        match rank {
            i32::MIN => Level::ALL,
            5_000 => Level::TRACE,
            10_000 => Level::DEBUG,
            20_000 => Level::INFO,
            30_000 => Level::WARN,
            40_000 => Level::ERROR,
            50_000 => Level::FATAL,
            i32::MAX => Level::OFF,
            _ => default,
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self.rank {
            r if r >= Level::FATAL.rank => BrightRed,
            r if r >= Level::ERROR.rank => Red,
            r if r >= Level::WARN.rank => Yellow,
            r if r >= Level::INFO.rank => Green,
            r if r >= Level::DEBUG.rank => Blue,
            _ => BrightBlack,
        }
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank.hash(state);
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DEBUG
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(Level::ALL),
            "TRACE" => Ok(Level::TRACE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARN),
            "ERROR" => Ok(Level::ERROR),
            "FATAL" => Ok(Level::FATAL),
            "OFF" => Ok(Level::OFF),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
