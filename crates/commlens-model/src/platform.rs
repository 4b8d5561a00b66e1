use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::table::Table;

/// Source platform of a community dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Federated instance directory. Rules arrive as structured records
    /// with optional hints; languages as a list.
    Mastodon,
    /// Forum community listing. Rules arrive as one `;`-joined string;
    /// language as a single code.
    Reddit,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Mastodon, Platform::Reddit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mastodon => "mastodon",
            Self::Reddit => "reddit",
        }
    }

    /// Whether rule payloads on this platform are structured records.
    pub fn has_structured_rules(self) -> bool {
        matches!(self, Self::Mastodon)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mastodon" | "a" => Ok(Self::Mastodon),
            "reddit" | "b" => Ok(Self::Reddit),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// A table exactly as ingested, tagged with the platform it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub platform: Platform,
    pub table: Table,
}

impl RawTable {
    pub fn new(platform: Platform, table: Table) -> Self {
        Self { platform, table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_names_and_letters() {
        assert_eq!("Mastodon".parse::<Platform>(), Ok(Platform::Mastodon));
        assert_eq!("b".parse::<Platform>(), Ok(Platform::Reddit));
        assert!("lemmy".parse::<Platform>().is_err());
    }
}
