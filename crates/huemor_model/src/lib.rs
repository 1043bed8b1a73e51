use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pool;

/// Where a session currently sits in the press / pick / joke flow.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    Picking,
    Loading,
    Result,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, PartialOrd, Ord, Hash, Default)]
pub struct ColourName(String);

impl ColourName {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for ColourName {
    fn from(value: String) -> Self {
        ColourName(value)
    }
}

impl From<&str> for ColourName {
    fn from(value: &str) -> Self {
        ColourName(String::from(value))
    }
}

impl From<ColourName> for String {
    fn from(value: ColourName) -> Self {
        value.0
    }
}

impl Display for ColourName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug)]
#[error("Invalid value: {0}")]
pub struct FromStrError(String);

/// `#RRGGBB` colour code.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct HexColour(String);

impl HexColour {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<&str> for HexColour {
    type Error = FromStrError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.strip_prefix('#') {
            Some(digits) if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
                Ok(HexColour(value.to_string()))
            }
            _ => Err(FromStrError(value.to_string())),
        }
    }
}

impl TryFrom<String> for HexColour {
    type Error = FromStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HexColour::try_from(value.as_str())
    }
}

impl Display for HexColour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One entry of the colour pool: a name, a mood descriptor and a display colour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColourCard {
    pub name: ColourName,
    pub mood: String,
    pub hex: HexColour,
}

impl ColourCard {
    pub fn new(
        name: impl Into<ColourName>,
        mood: impl Into<String>,
        hex: &str,
    ) -> Result<Self, FromStrError> {
        Ok(ColourCard {
            name: name.into(),
            mood: mood.into(),
            hex: HexColour::try_from(hex)?,
        })
    }
}
