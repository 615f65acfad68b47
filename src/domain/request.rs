//! Request shape for one scrape run

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Username is required")]
    EmptyUsername,

    #[error("Year must be a number or \"ALL\", got '{0}'")]
    InvalidYear(String),
}

/// Which diary years a request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearSelector {
    Single(i32),
    AllYears,
}

impl FromStr for YearSelector {
    type Err = RequestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("all") {
            return Ok(Self::AllYears);
        }
        raw.parse::<i32>()
            .map(Self::Single)
            .map_err(|_| RequestError::InvalidYear(raw.to_string()))
    }
}

impl fmt::Display for YearSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(year) => write!(f, "{year}"),
            Self::AllYears => f.write_str("ALL"),
        }
    }
}

impl Serialize for YearSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(year) => serializer.serialize_i32(*year),
            Self::AllYears => serializer.serialize_str("ALL"),
        }
    }
}

/// A validated request: non-empty username plus a year selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    username: String,
    pub year: YearSelector,
}

impl ScrapeRequest {
    pub fn new(username: impl Into<String>, year: YearSelector) -> Result<Self, RequestError> {
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(RequestError::EmptyUsername);
        }
        Ok(Self { username, year })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
