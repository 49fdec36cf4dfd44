use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// ZTF photometric filter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
pub enum Filter {
    #[serde(rename = "zg")]
    Zg,
    #[serde(rename = "zr")]
    Zr,
    #[serde(rename = "zi")]
    Zi,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::Zg, Filter::Zr, Filter::Zi];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::Zg => "zg",
            Filter::Zr => "zr",
            Filter::Zi => "zi",
        }
    }

    /// Numeric filter ID used in FITS headers and object IDs.
    pub fn digit(self) -> u8 {
        match self {
            Filter::Zg => 1,
            Filter::Zr => 2,
            Filter::Zi => 3,
        }
    }

    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            1 => Some(Filter::Zg),
            2 => Some(Filter::Zr),
            3 => Some(Filter::Zi),
            _ => None,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zg" => Ok(Filter::Zg),
            "zr" => Ok(Filter::Zr),
            "zi" => Ok(Filter::Zi),
            other => Err(CatalogError::InvalidFilter(other.to_string())),
        }
    }
}
