//! Server version parsing and the minimum-version gate
//!
//! The alerting API only exists from Kibana 7.7.0, and `notifyWhen` is only
//! honoured from 7.11.0. Both thresholds are injected into [`VersionGate`]
//! rather than read from globals.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimum Kibana version exposing the alerting API.
pub const DEFAULT_MINIMUM_VERSION: ServerVersion = ServerVersion::new(7, 7, 0);

/// Minimum Kibana version honouring the `notifyWhen` field.
pub const DEFAULT_NOTIFY_WHEN_VERSION: ServerVersion = ServerVersion::new(7, 11, 0);

/// Semantic version reported by a server, e.g. `7.10.2` or `8.0.0-SNAPSHOT`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release label; orders before the release with the same numbers
    pub pre: Option<String>,
}

impl ServerVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for ServerVersion {
    type Err = VersionError;

    /// Parse `MAJOR[.MINOR[.PATCH]][-PRE][+BUILD]`. Missing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('v');
        let core = trimmed.split('+').next().unwrap_or_default();
        let (numbers, pre) = match core.split_once('-') {
            Some((numbers, pre)) if !pre.is_empty() => (numbers, Some(pre.to_string())),
            Some(_) => return Err(VersionError::Parse(s.to_string())),
            None => (core, None),
        };

        let mut parts = numbers.split('.');
        let mut next = || -> Result<u64, VersionError> {
            match parts.next() {
                None => Ok(0),
                Some(p) => p.parse().map_err(|_| VersionError::Parse(s.to_string())),
            }
        };

        let major = next()?;
        let minor = next()?;
        let patch = next()?;
        if parts.next().is_some() {
            return Err(VersionError::Parse(s.to_string()));
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerVersion> for String {
    fn from(version: ServerVersion) -> Self {
        version.to_string()
    }
}

impl Ord for ServerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => compare_pre_release(a, b),
            })
    }
}

/// Order pre-release labels identifier by identifier. Digit runs compare
/// numerically and sort before text, so `rc2 < rc10` and `1 < alpha`.
fn compare_pre_release(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match compare_identifier(l, r) {
                Ordering::Equal => continue,
                ord => return ord,
            },
        }
    }
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    let left = digit_runs(a);
    let right = digit_runs(b);
    for (l, r) in left.iter().zip(&right) {
        let ord = match (is_numeric(l), is_numeric(r)) {
            (true, true) => compare_numeric(l, r),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

/// Split at every boundary between ASCII digits and anything else
fn digit_runs(s: &str) -> Vec<&str> {
    let bytes = s.as_bytes();
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        if bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit() {
            runs.push(&s[start..i]);
            start = i;
        }
    }
    if start < s.len() {
        runs.push(&s[start..]);
    }
    runs
}

fn is_numeric(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl PartialOrd for ServerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fail unless `server` is at least `minimum`.
pub fn check_minimum(server: &ServerVersion, minimum: &ServerVersion) -> Result<(), VersionError> {
    if server < minimum {
        return Err(VersionError::Unsupported {
            required: minimum.clone(),
            found: server.clone(),
        });
    }
    Ok(())
}

/// Version precondition for alert operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionGate {
    minimum: ServerVersion,
    notify_when: ServerVersion,
}

impl VersionGate {
    pub fn new(minimum: ServerVersion, notify_when: ServerVersion) -> Self {
        Self {
            minimum,
            notify_when,
        }
    }

    pub fn minimum(&self) -> &ServerVersion {
        &self.minimum
    }

    pub fn notify_when(&self) -> &ServerVersion {
        &self.notify_when
    }

    /// Hard precondition applied before every operation
    pub fn check(&self, server: &ServerVersion) -> Result<(), VersionError> {
        check_minimum(server, &self.minimum)
    }

    /// Whether `notifyWhen` may be sent to this server
    pub fn supports_notify_when(&self, server: &ServerVersion) -> bool {
        server >= &self.notify_when
    }
}

impl Default for VersionGate {
    fn default() -> Self {
        Self::new(DEFAULT_MINIMUM_VERSION, DEFAULT_NOTIFY_WHEN_VERSION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Kibana alert endpoint only available from Kibana >= {required}, got version {found}")]
    Unsupported {
        required: ServerVersion,
        found: ServerVersion,
    },

    #[error("Invalid server version: {0:?}")]
    Parse(String),
}
