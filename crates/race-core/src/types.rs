//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A lane number appears more than once in a seed order.
    #[error("lane {lane} appears more than once in the seed order")]
    DuplicateLane { lane: u32 },

    /// A lane number in a seed order is outside `1..=lane_count`.
    #[error("lane {lane} is outside 1..={lane_count}")]
    LaneOutOfRange { lane: u32, lane_count: u32 },

    /// The reserved lane margin leaves no lanes for seeded entries.
    #[error("reserving {reserved} lanes leaves no room in a {lane_count}-lane race")]
    MarginTooLarge { reserved: u32, lane_count: u32 },

    /// Invalid boat type value.
    #[error("invalid boat type: {value}")]
    InvalidBoatType { value: String },
}

/// Crew size of the boats in a race.
///
/// The numeric code is what the venue racing hardware expects in the
/// race-control file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoatType {
    #[default]
    Singles,
    Doubles,
    Fours,
    Eights,
}

impl BoatType {
    /// Numeric code written to the race-control file.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Singles => 0,
            Self::Doubles => 1,
            Self::Fours => 2,
            Self::Eights => 3,
        }
    }

    /// String representation for configuration and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Singles => "singles",
            Self::Doubles => "doubles",
            Self::Fours => "fours",
            Self::Eights => "eights",
        }
    }

    /// Looks up a boat type by its file code.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            0 => Ok(Self::Singles),
            1 => Ok(Self::Doubles),
            2 => Ok(Self::Fours),
            3 => Ok(Self::Eights),
            _ => Err(ValidationError::InvalidBoatType {
                value: code.to_string(),
            }),
        }
    }
}

impl fmt::Display for BoatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BoatType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singles" => Ok(Self::Singles),
            "doubles" => Ok(Self::Doubles),
            "fours" => Ok(Self::Fours),
            "eights" => Ok(Self::Eights),
            _ => Err(ValidationError::InvalidBoatType {
                value: s.to_string(),
            }),
        }
    }
}

/// Whether a race is rowed over a distance or for a fixed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationType {
    #[default]
    Distance,
    Time,
}

impl DurationType {
    /// Numeric code written to the race-control file.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Distance => 0,
            Self::Time => 1,
        }
    }

    #[must_use]
    pub const fn from_code(code: i64) -> Self {
        if code == 1 { Self::Time } else { Self::Distance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boat_type_codes_match_venue_format() {
        assert_eq!(BoatType::Singles.code(), 0);
        assert_eq!(BoatType::Doubles.code(), 1);
        assert_eq!(BoatType::Fours.code(), 2);
        assert_eq!(BoatType::Eights.code(), 3);
    }

    #[test]
    fn boat_type_from_str() {
        assert_eq!("fours".parse::<BoatType>().unwrap(), BoatType::Fours);
        assert!("quads".parse::<BoatType>().is_err());
    }

    #[test]
    fn boat_type_from_code_rejects_unknown() {
        assert_eq!(BoatType::from_code(3).unwrap(), BoatType::Eights);
        assert_eq!(
            BoatType::from_code(9).unwrap_err(),
            ValidationError::InvalidBoatType {
                value: "9".to_string()
            }
        );
    }

    #[test]
    fn boat_type_serde_roundtrip() {
        let json = serde_json::to_string(&BoatType::Doubles).unwrap();
        assert_eq!(json, "\"doubles\"");
        let parsed: BoatType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, BoatType::Doubles);
    }

    #[test]
    fn duration_type_codes() {
        assert_eq!(DurationType::Distance.code(), 0);
        assert_eq!(DurationType::Time.code(), 1);
        assert_eq!(DurationType::from_code(1), DurationType::Time);
        assert_eq!(DurationType::from_code(0), DurationType::Distance);
    }
}
