//! Job identifiers.
//!
//! A [`JobId`] combines the local creation time (second resolution) with a
//! random suffix: `job_20240501_134502_9f2c81ad`. Identifiers sort lexically
//! by creation time and never contain path separators, so a successfully
//! parsed `JobId` is always safe to join onto the output root.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

const PREFIX: &str = "job_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TIMESTAMP_LEN: usize = 15;
const SUFFIX_LEN: usize = 8;

/// Unique identifier for one pipeline execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobId(String);

impl JobId {
    /// Create a new identifier stamped with the current local time.
    #[must_use]
    pub fn new() -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{PREFIX}{timestamp}_{}", &suffix[..SUFFIX_LEN]))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The creation time encoded in the identifier.
    pub fn timestamp(&self) -> NaiveDateTime {
        let stamp = &self.0[PREFIX.len()..PREFIX.len() + TIMESTAMP_LEN];
        // The shape was checked on construction.
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).unwrap_or_default()
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::Validation(format!("invalid job id: {s:?}"));

        let rest = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        if rest.len() != TIMESTAMP_LEN + 1 + SUFFIX_LEN {
            return Err(invalid());
        }
        let (stamp, suffix) = rest.split_at(TIMESTAMP_LEN);
        let suffix = suffix.strip_prefix('_').ok_or_else(invalid)?;

        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).map_err(|_| invalid())?;
        if !suffix
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for JobId {
    type Error = Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}
