//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two parallel programs whose pools are tracked side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Program {
    /// First program track.
    #[serde(rename = "programA", alias = "A", alias = "ProgramA")]
    ProgramA,
    /// Second program track.
    #[serde(rename = "programB", alias = "B", alias = "ProgramB")]
    ProgramB,
}

impl Program {
    /// Both programs in display order.
    pub const ALL: [Program; 2] = [Program::ProgramA, Program::ProgramB];

    /// Short identifier used in file names and log fields.
    pub fn slug(self) -> &'static str {
        match self {
            Program::ProgramA => "program-a",
            Program::ProgramB => "program-b",
        }
    }

    /// The other program.
    pub fn other(self) -> Program {
        match self {
            Program::ProgramA => Program::ProgramB,
            Program::ProgramB => Program::ProgramA,
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Visit category a pool serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VisitType {
    /// First visit.
    #[serde(rename = "initial", alias = "Initial")]
    Initial,
    /// Any later visit.
    #[serde(rename = "followUp", alias = "FollowUp", alias = "follow-up")]
    FollowUp,
}

impl VisitType {
    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            VisitType::Initial => "Initial",
            VisitType::FollowUp => "Follow Up",
        }
    }
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Providers assigned to one (program, state, visit type) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePool {
    /// Program the pool belongs to.
    pub program: Program,
    /// Normalized state name.
    pub state: String,
    /// Visit type, absent for sheets without a visit-type header row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<VisitType>,
    /// Provider names in first-seen order, unique within the pool.
    pub users: Vec<String>,
}

impl ResourcePool {
    /// Returns a user-facing label combining state and visit type.
    pub fn display_name(&self) -> String {
        match self.visit_type {
            Some(visit_type) => format!("{} · {}", self.state, visit_type),
            None => self.state.clone(),
        }
    }
}

/// A single scoped exclusion assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateExclusion {
    /// Program the exclusion applies to.
    pub program: Program,
    /// State name, compared exactly.
    pub state: String,
    /// Provider name, compared case-insensitively after trimming.
    pub user: String,
    /// `None` applies to every visit type of the state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_type: Option<VisitType>,
}

impl StateExclusion {
    /// Build an exclusion entry; the user name is stored trimmed.
    pub fn new(
        program: Program,
        state: impl Into<String>,
        user: &str,
        visit_type: Option<VisitType>,
    ) -> Self {
        Self {
            program,
            state: state.into(),
            user: user.trim().to_string(),
            visit_type,
        }
    }
}

/// Row handed to the CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// Provider name.
    pub name: String,
    /// State column, omitted from the export when no row carries one.
    pub state: Option<String>,
    /// Exclusion column, omitted from the export when no row carries one.
    pub is_excluded: Option<bool>,
}
