use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Administrative granularity of the drill-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Country,
    Region,
    District,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::District => "district",
        }
    }

    /// Level whose labels are shown once a shape of this level is selected.
    /// District is the finest level modeled, so it maps to itself.
    pub const fn next_finer(self) -> Self {
        match self {
            Self::Country => Self::Region,
            Self::Region | Self::District => Self::District,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::District)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "country" => Ok(Self::Country),
            "region" => Ok(Self::Region),
            "district" => Ok(Self::District),
            other => Err(format!("unknown level: {other:?}")),
        }
    }
}

/// `level` + `code` pair identifying a shape, written as `"<level>-<code>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeKey {
    pub level: Level,
    pub code: String,
}

impl ShapeKey {
    pub fn new(level: Level, code: impl Into<String>) -> Self {
        Self {
            level,
            code: code.into(),
        }
    }

    /// Split an identity string on its first hyphen. The remainder, hyphens
    /// included, is the code.
    pub fn parse(id: &str) -> Option<Self> {
        let (level, code) = id.split_once('-')?;
        let level = level.parse().ok()?;
        Some(Self {
            level,
            code: code.to_string(),
        })
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.level, self.code)
    }
}
