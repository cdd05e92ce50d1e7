use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::constants::WALL_CLOCK_FORMAT;

/// Kind of attendance stamp. Travels over the wire and in SQLite as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
#[repr(u8)]
pub enum StampType {
    CheckIn = 0,
    CheckOut = 1,
}

impl StampType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::CheckIn),
            1 => Some(Self::CheckOut),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

impl From<StampType> for i64 {
    fn from(stamp: StampType) -> Self {
        stamp.code()
    }
}

impl TryFrom<i64> for StampType {
    type Error = InvalidStampType;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(InvalidStampType(code))
    }
}

impl fmt::Display for StampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CheckIn => f.write_str("in"),
            Self::CheckOut => f.write_str("out"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidStampType(pub i64);

impl fmt::Display for InvalidStampType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stamp_type must be 0 (in) or 1 (out), got {}", self.0)
    }
}

/// Identity resolved from the credentials carried by a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

/// `true` when `value` is a 24-hour `HH:MM` wall-clock time.
pub fn is_wall_clock(value: &str) -> bool {
    value.len() == 5 && NaiveTime::parse_from_str(value, WALL_CLOCK_FORMAT).is_ok()
}
