//! Spectral channels and hemisphere coverage of catalog images.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Spectral band of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "IR1")]
    Ir1,
    #[serde(rename = "IR2")]
    Ir2,
    #[serde(rename = "IR3")]
    Ir3,
    #[serde(rename = "IR4")]
    Ir4,
    #[serde(rename = "VIS")]
    Vis,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Ir1,
        Channel::Ir2,
        Channel::Ir3,
        Channel::Ir4,
        Channel::Vis,
    ];

    /// Identifier as it appears in filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Ir1 => "IR1",
            Channel::Ir2 => "IR2",
            Channel::Ir3 => "IR3",
            Channel::Ir4 => "IR4",
            Channel::Vis => "VIS",
        }
    }

    /// Strict parse of the filename token (upper case only).
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == token)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = UnknownChannel;

    /// Case-insensitive, for user input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(&s.trim().to_ascii_uppercase()).ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown channel '{0}', expected one of IR1, IR2, IR3, IR4, VIS")]
pub struct UnknownChannel(pub String);

/// Portion of the Earth disk an image covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HemisphereScope {
    Full,
    North,
    South,
}

impl HemisphereScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            HemisphereScope::Full => "FULL",
            HemisphereScope::North => "NORTH",
            HemisphereScope::South => "SOUTH",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "FULL" => Some(HemisphereScope::Full),
            "NORTH" => Some(HemisphereScope::North),
            "SOUTH" => Some(HemisphereScope::South),
            _ => None,
        }
    }

    pub fn covers_north(&self) -> bool {
        matches!(self, HemisphereScope::Full | HemisphereScope::North)
    }

    pub fn covers_south(&self) -> bool {
        matches!(self, HemisphereScope::Full | HemisphereScope::South)
    }
}

impl fmt::Display for HemisphereScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_parse_case_insensitive() {
        assert_eq!("ir3".parse::<Channel>().unwrap(), Channel::Ir3);
        assert_eq!(" VIS ".parse::<Channel>().unwrap(), Channel::Vis);
        assert!("IR5".parse::<Channel>().is_err());
    }

    #[test]
    fn test_channel_token_is_strict() {
        assert_eq!(Channel::from_token("IR1"), Some(Channel::Ir1));
        assert_eq!(Channel::from_token("ir1"), None);
    }

    #[test]
    fn test_scope_coverage() {
        assert!(HemisphereScope::Full.covers_north());
        assert!(HemisphereScope::Full.covers_south());
        assert!(HemisphereScope::North.covers_north());
        assert!(!HemisphereScope::North.covers_south());
        assert!(!HemisphereScope::South.covers_north());
        assert!(HemisphereScope::South.covers_south());
    }
}
