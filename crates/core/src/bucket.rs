//! Effort buckets and the point values they award.
//!
//! Presets store their bucket as free text. Anything unrecognised is
//! displayed and scored as [`Bucket::DEFAULT`] instead of failing.

use serde::{Deserialize, Serialize};

/// A named effort tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Bucket {
    Quick,
    Routine,
    Challenging,
    Epic,
}

/// Minutes of timed work that earn one point. Partial blocks round up.
pub const TIMED_MINUTES_PER_POINT: i64 = 10;

/// Upper bound for a single timed log (12 hours).
pub const MAX_TIMED_MINUTES: i32 = 720;

impl Bucket {
    pub const DEFAULT: Bucket = Bucket::Routine;

    pub const ALL: [Bucket; 4] = [
        Bucket::Quick,
        Bucket::Routine,
        Bucket::Challenging,
        Bucket::Epic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Quick => "QUICK",
            Bucket::Routine => "ROUTINE",
            Bucket::Challenging => "CHALLENGING",
            Bucket::Epic => "EPIC",
        }
    }

    pub fn points(self) -> i64 {
        match self {
            Bucket::Quick => 3,
            Bucket::Routine => 6,
            Bucket::Challenging => 10,
            Bucket::Epic => 20,
        }
    }

    /// Strict parse, case-insensitive. Used to validate new presets.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Bucket::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(value))
    }

    /// Lenient parse for stored values: unknown strings map to the default.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or(Self::DEFAULT)
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points earned for `minutes` of timed work.
///
/// Callers validate `minutes` to `1..=MAX_TIMED_MINUTES`; anything below one
/// minute still earns nothing.
pub fn timed_points(minutes: i32) -> i64 {
    let minutes = i64::from(minutes.max(0));
    (minutes + TIMED_MINUTES_PER_POINT - 1) / TIMED_MINUTES_PER_POINT
}
