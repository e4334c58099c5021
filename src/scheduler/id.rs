use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobError;

/// Identifier of a submitted job.
///
/// Backed by a random (v4) UUID so concurrent submissions never coordinate on
/// a shared counter and collisions stay negligible at any load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for JobId {
    type Err = JobError;

    /// Accepts only the hyphenated form handed out by [`JobId::generate`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || JobError::Validation(format!("job id {} does not have the right pattern", s));

        if s.len() != 36 {
            return Err(malformed());
        }
        let id = Uuid::parse_str(s).map_err(|_| malformed())?;
        if id.get_version_num() != 4 {
            return Err(malformed());
        }
        Ok(Self(id))
    }
}
