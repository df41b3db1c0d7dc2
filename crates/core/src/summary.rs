//! Aggregations shown alongside the pool lists.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    exclusion::{ExclusionResolver, OverrideStore},
    models::{Program, ResourcePool, VisitType},
};

/// One pool a provider appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// State of the pool.
    pub state: String,
    /// Visit type of the pool, if the sheet models one.
    pub visit_type: Option<VisitType>,
}

/// A provider and every pool listing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Provider name as written in the sheet.
    pub name: String,
    /// Pools in sheet order.
    pub assignments: Vec<Assignment>,
}

impl ProviderEntry {
    /// Distinct states this provider covers.
    pub fn states(&self) -> Vec<&str> {
        let mut states: Vec<&str> = Vec::new();
        for assignment in &self.assignments {
            if !states.contains(&assignment.state.as_str()) {
                states.push(&assignment.state);
            }
        }
        states
    }
}

/// Providers across all pools of a program, sorted by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderIndex {
    providers: Vec<ProviderEntry>,
}

impl ProviderIndex {
    /// Group pool users by exact name.
    pub fn build(pools: &[ResourcePool]) -> Self {
        let mut grouped: BTreeMap<(String, String), Vec<Assignment>> = BTreeMap::new();
        for pool in pools {
            for user in &pool.users {
                grouped
                    .entry((user.to_lowercase(), user.clone()))
                    .or_default()
                    .push(Assignment {
                        state: pool.state.clone(),
                        visit_type: pool.visit_type,
                    });
            }
        }
        let providers = grouped
            .into_iter()
            .map(|((_, name), assignments)| ProviderEntry { name, assignments })
            .collect();
        Self { providers }
    }

    /// All providers.
    pub fn providers(&self) -> &[ProviderEntry] {
        &self.providers
    }

    /// Number of distinct provider names.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// `true` when no pool has users.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers whose name or any state contains `query`, case-insensitively.
    pub fn matching(&self, query: &str) -> Vec<&ProviderEntry> {
        let needle = query.trim().to_lowercase();
        self.providers
            .iter()
            .filter(|provider| {
                needle.is_empty()
                    || provider.name.to_lowercase().contains(&needle)
                    || provider
                        .assignments
                        .iter()
                        .any(|assignment| assignment.state.to_lowercase().contains(&needle))
            })
            .collect()
    }
}

/// Headline counts for one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramSummary {
    /// Program summarised.
    pub program: Program,
    /// Non-empty pools.
    pub pools: usize,
    /// Distinct states with at least one pool.
    pub states: usize,
    /// Distinct provider names.
    pub providers: usize,
    /// Exclusion entries in scope; may count a provider more than once.
    pub excluded: usize,
}

impl ProgramSummary {
    /// Summarise the pools of `program`, ignoring pools from other programs.
    pub fn compute<S: OverrideStore>(
        program: Program,
        pools: &[ResourcePool],
        resolver: &ExclusionResolver<S>,
    ) -> Self {
        let own = pools.iter().filter(|pool| pool.program == program);
        let mut states = BTreeSet::new();
        let mut providers = BTreeSet::new();
        let mut count = 0;
        for pool in own {
            count += 1;
            states.insert(pool.state.as_str());
            providers.extend(pool.users.iter().map(String::as_str));
        }
        Self {
            program,
            pools: count,
            states: states.len(),
            providers: providers.len(),
            excluded: resolver.total_excluded_count(Some(program)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::{ExclusionsData, MemoryOverrideStore};

    fn pools() -> Vec<ResourcePool> {
        vec![
            ResourcePool {
                program: Program::ProgramA,
                state: "Ohio".to_string(),
                visit_type: Some(VisitType::Initial),
                users: vec!["Sam".to_string(), "ann".to_string()],
            },
            ResourcePool {
                program: Program::ProgramA,
                state: "Ohio".to_string(),
                visit_type: Some(VisitType::FollowUp),
                users: vec!["Sam".to_string()],
            },
            ResourcePool {
                program: Program::ProgramA,
                state: "Utah".to_string(),
                visit_type: Some(VisitType::Initial),
                users: vec!["Bo".to_string(), "Sam".to_string()],
            },
        ]
    }

    #[test]
    fn index_groups_assignments_by_name() {
        let index = ProviderIndex::build(&pools());
        let names: Vec<_> = index.providers().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ann", "Bo", "Sam"]);

        let sam = &index.providers()[2];
        assert_eq!(sam.assignments.len(), 3);
        assert_eq!(sam.states(), vec!["Ohio", "Utah"]);
        assert_eq!(sam.assignments[1].visit_type, Some(VisitType::FollowUp));
    }

    #[test]
    fn index_search_covers_names_and_states() {
        let index = ProviderIndex::build(&pools());
        assert_eq!(index.matching("").len(), 3);
        assert_eq!(index.matching("SAM").len(), 1);
        let in_utah: Vec<_> = index.matching("utah").iter().map(|p| p.name.clone()).collect();
        assert_eq!(in_utah, vec!["Bo", "Sam"]);
    }

    #[test]
    fn summary_counts_distinct_states_and_providers() {
        let mut resolver =
            ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        resolver.toggle("Sam", Program::ProgramA, "Ohio", None);
        resolver.toggle("Bo", Program::ProgramB, "Utah", None);

        let summary = ProgramSummary::compute(Program::ProgramA, &pools(), &resolver);
        assert_eq!(summary.pools, 3);
        assert_eq!(summary.states, 2);
        assert_eq!(summary.providers, 3);
        assert_eq!(summary.excluded, 1);

        let other = ProgramSummary::compute(Program::ProgramB, &pools(), &resolver);
        assert_eq!(other.pools, 0);
        assert_eq!(other.excluded, 1);
    }
}
