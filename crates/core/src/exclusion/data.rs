//! Static exclusion document shipped alongside the pool sheets.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::models::StateExclusion;

/// Default exclusions read once at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionsData {
    /// Names excluded everywhere; consulted only by unscoped queries.
    #[serde(default)]
    pub excluded_users: Vec<String>,
    /// Exclusions scoped to a program and state.
    #[serde(default)]
    pub state_exclusions: Vec<StateExclusion>,
}

impl ExclusionsData {
    /// Load the document, returning `None` if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read exclusions {}", path.display()))?;
        let data = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse exclusions {}", path.display()))?;
        Ok(Some(data))
    }

    /// Load the document, falling back to empty data when it is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(Some(data)) => data,
            Ok(None) => {
                error!(path = %path.display(), "exclusions file missing; using empty defaults");
                Self::default()
            }
            Err(err) => {
                error!(?err, "exclusions file unusable; using empty defaults");
                Self::default()
            }
        }
    }

    /// `true` when neither list has entries.
    pub fn is_empty(&self) -> bool {
        self.excluded_users.is_empty() && self.state_exclusions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Program, VisitType};
    use tempfile::tempdir;

    #[test]
    fn loads_both_lists() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("exclusions.json");
        fs::write(
            &path,
            r#"{
  "excludedUsers": ["Jane Doe"],
  "stateExclusions": [
    { "program": "programA", "state": "Ohio", "user": "Sam" },
    { "program": "B", "state": "Utah", "user": "Ann", "visitType": "FollowUp" }
  ]
}"#,
        )?;

        let data = ExclusionsData::load(&path)?.expect("expected data");
        assert_eq!(data.excluded_users, vec!["Jane Doe".to_string()]);
        assert_eq!(data.state_exclusions.len(), 2);
        assert_eq!(data.state_exclusions[0].visit_type, None);
        assert_eq!(data.state_exclusions[1].program, Program::ProgramB);
        assert_eq!(
            data.state_exclusions[1].visit_type,
            Some(VisitType::FollowUp)
        );
        Ok(())
    }

    #[test]
    fn missing_fields_default_to_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("exclusions.json");
        fs::write(&path, r#"{ "excludedUsers": ["X"] }"#)?;
        let data = ExclusionsData::load_or_default(&path);
        assert_eq!(data.excluded_users.len(), 1);
        assert!(data.state_exclusions.is_empty());
        Ok(())
    }

    #[test]
    fn missing_or_malformed_file_is_empty() -> Result<()> {
        let dir = tempdir()?;
        let missing = dir.path().join("absent.json");
        assert!(ExclusionsData::load(&missing)?.is_none());
        assert!(ExclusionsData::load_or_default(&missing).is_empty());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "[1, 2")?;
        assert!(ExclusionsData::load(&broken).is_err());
        assert!(ExclusionsData::load_or_default(&broken).is_empty());
        Ok(())
    }
}
