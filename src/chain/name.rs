use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReclaimError;

/// Maximum length of an account name on the host ledger
pub const MAX_NAME_LEN: usize = 12;

/// Account identifier assigned by the host ledger.
///
/// Names are 1-12 characters from `a-z`, `1-5` and `.`, and never end with a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid_char(c: char) -> bool {
        matches!(c, 'a'..='z' | '1'..='5' | '.')
    }
}

impl FromStr for AccountName {
    type Err = ReclaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > MAX_NAME_LEN {
            return Err(ReclaimError::InvalidName(format!(
                "'{}' must be 1 to {} characters",
                s, MAX_NAME_LEN
            )));
        }

        if let Some(bad) = s.chars().find(|c| !Self::is_valid_char(*c)) {
            return Err(ReclaimError::InvalidName(format!(
                "'{}' contains invalid character '{}'",
                s, bad
            )));
        }

        if s.ends_with('.') {
            return Err(ReclaimError::InvalidName(format!("'{}' ends with a dot", s)));
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for AccountName {
    type Error = ReclaimError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountName> for String {
    fn from(name: AccountName) -> Self {
        name.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for AccountName {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for AccountName {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: ReclaimError| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["eosio", "eosio.token", "alice", "a", "abcde1234512", "bob.x"] {
            let parsed: AccountName = name.parse().unwrap();
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "Alice", "abcdefghijklm", "bob6", "bob.", "with space", "a-b"] {
            assert!(name.parse::<AccountName>().is_err(), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_serde_uses_plain_string() {
        let name: AccountName = "alice".parse().unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"alice\"");

        let back: AccountName = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(back, name);

        assert!(serde_json::from_str::<AccountName>("\"ALICE\"").is_err());
    }
}
