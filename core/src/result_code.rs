//! Result codes returned for every action, at submission or at resolution.
//!
//! Numeric values match the host's constants so codes can be exchanged
//! with the host verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResultCode {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERR_NOT_OWNER")]
    NotOwner,
    #[serde(rename = "ERR_NO_PATH")]
    NoPath,
    #[serde(rename = "ERR_NAME_EXISTS")]
    NameExists,
    #[serde(rename = "ERR_BUSY")]
    Busy,
    #[serde(rename = "ERR_NOT_FOUND")]
    NotFound,
    /// Also reported as ERR_NOT_ENOUGH_ENERGY by spawns; same numeric value.
    #[serde(rename = "ERR_NOT_ENOUGH_RESOURCES", alias = "ERR_NOT_ENOUGH_ENERGY")]
    NotEnoughResources,
    #[serde(rename = "ERR_INVALID_TARGET")]
    InvalidTarget,
    #[serde(rename = "ERR_FULL")]
    Full,
    #[serde(rename = "ERR_NOT_IN_RANGE")]
    NotInRange,
    #[serde(rename = "ERR_INVALID_ARGS")]
    InvalidArgs,
    #[serde(rename = "ERR_TIRED")]
    Tired,
    #[serde(rename = "ERR_NO_BODYPART")]
    NoBodypart,
    #[serde(rename = "ERR_RCL_NOT_ENOUGH")]
    RclNotEnough,
    #[serde(rename = "ERR_GCL_NOT_ENOUGH")]
    GclNotEnough,
}

#[allow(non_upper_case_globals)]
impl ResultCode {
    pub const NotEnoughEnergy: ResultCode = ResultCode::NotEnoughResources;

    pub fn code(self) -> i32 {
        match self {
            Self::Ok                 => 0,
            Self::NotOwner           => -1,
            Self::NoPath             => -2,
            Self::NameExists         => -3,
            Self::Busy               => -4,
            Self::NotFound           => -5,
            Self::NotEnoughResources => -6,
            Self::InvalidTarget      => -7,
            Self::Full               => -8,
            Self::NotInRange         => -9,
            Self::InvalidArgs        => -10,
            Self::Tired              => -11,
            Self::NoBodypart         => -12,
            Self::RclNotEnough       => -14,
            Self::GclNotEnough       => -15,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let rc = match code {
            0   => Self::Ok,
            -1  => Self::NotOwner,
            -2  => Self::NoPath,
            -3  => Self::NameExists,
            -4  => Self::Busy,
            -5  => Self::NotFound,
            -6  => Self::NotEnoughResources,
            -7  => Self::InvalidTarget,
            -8  => Self::Full,
            -9  => Self::NotInRange,
            -10 => Self::InvalidArgs,
            -11 => Self::Tired,
            -12 => Self::NoBodypart,
            -14 => Self::RclNotEnough,
            -15 => Self::GclNotEnough,
            _   => return None,
        };
        Some(rc)
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Host constant name, e.g. `ERR_BUSY`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Ok                 => "OK",
            Self::NotOwner           => "ERR_NOT_OWNER",
            Self::NoPath             => "ERR_NO_PATH",
            Self::NameExists         => "ERR_NAME_EXISTS",
            Self::Busy               => "ERR_BUSY",
            Self::NotFound           => "ERR_NOT_FOUND",
            Self::NotEnoughResources => "ERR_NOT_ENOUGH_RESOURCES",
            Self::InvalidTarget      => "ERR_INVALID_TARGET",
            Self::Full               => "ERR_FULL",
            Self::NotInRange         => "ERR_NOT_IN_RANGE",
            Self::InvalidArgs        => "ERR_INVALID_ARGS",
            Self::Tired              => "ERR_TIRED",
            Self::NoBodypart         => "ERR_NO_BODYPART",
            Self::RclNotEnough       => "ERR_RCL_NOT_ENOUGH",
            Self::GclNotEnough       => "ERR_GCL_NOT_ENOUGH",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_codes_round_trip() {
        for code in [0, -1, -2, -3, -4, -5, -6, -7, -8, -9, -10, -11, -12, -14, -15] {
            let rc = ResultCode::from_code(code).expect("known code");
            assert_eq!(rc.code(), code);
        }
        assert_eq!(ResultCode::from_code(-13), None);
    }

    #[test]
    fn not_enough_energy_is_not_enough_resources() {
        assert_eq!(ResultCode::NotEnoughEnergy.code(), -6);
        let parsed: ResultCode = serde_json::from_str("\"ERR_NOT_ENOUGH_ENERGY\"").unwrap();
        assert_eq!(parsed, ResultCode::NotEnoughResources);
    }
}
