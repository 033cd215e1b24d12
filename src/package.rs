use anyhow::Result;
use std::str::FromStr;

use crate::error::SatPkgrError;

/// A dependency address of the form `owner/repo`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PackageAddress {
    pub owner: String,
    pub repo: String,
}

impl PackageAddress {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Build an address from separate parts, rejecting anything that is not
    /// a single plain path segment.
    pub fn from_parts(owner: &str, repo: &str) -> Result<Self> {
        if is_plain_segment(owner) && is_plain_segment(repo) {
            Ok(Self::new(owner, repo))
        } else {
            Err(SatPkgrError::BadPackageAddress(format!("{}/{}", owner, repo)).into())
        }
    }
}

/// Owner and repo are joined onto the package directory, so they must not
/// be empty, `.`/`..`, or contain a separator.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

impl std::fmt::Display for PackageAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for PackageAddress {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, repo)) if is_plain_segment(owner) && is_plain_segment(repo) => {
                Ok(PackageAddress::new(owner, repo))
            }
            _ => Err(SatPkgrError::BadPackageAddress(s.to_string()).into()),
        }
    }
}
