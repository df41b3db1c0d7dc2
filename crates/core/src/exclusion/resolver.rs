//! Merges the static exclusion document with the local override list.
//!
//! Overrides are additive: an entry means "excluded", and toggling the same
//! key again removes it. Toggle keys compare the visit type exactly, while
//! queries treat a missing visit type on either side as a wildcard.

use tracing::{debug, warn};

use crate::models::{Program, StateExclusion, VisitType};

use super::{data::ExclusionsData, store::OverrideStore};

/// Case-insensitive, whitespace-trimmed provider name comparison.
pub fn names_match(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

fn scope_matches(
    entry: &StateExclusion,
    name: &str,
    program: Program,
    state: &str,
    visit_type: Option<VisitType>,
) -> bool {
    entry.program == program
        && entry.state == state
        && names_match(&entry.user, name)
        && match (visit_type, entry.visit_type) {
            (None, _) | (_, None) => true,
            (Some(query), Some(recorded)) => query == recorded,
        }
}

fn same_key(
    entry: &StateExclusion,
    name: &str,
    program: Program,
    state: &str,
    visit_type: Option<VisitType>,
) -> bool {
    entry.program == program
        && entry.state == state
        && entry.visit_type == visit_type
        && names_match(&entry.user, name)
}

/// Exclusion predicate, toggle and count surface for one session.
pub struct ExclusionResolver<S: OverrideStore> {
    base: ExclusionsData,
    overrides: Vec<StateExclusion>,
    store: S,
}

impl<S: OverrideStore> ExclusionResolver<S> {
    /// Build a resolver, loading previously persisted overrides from `store`.
    ///
    /// An unreadable store is logged and treated as empty.
    pub fn new(base: ExclusionsData, store: S) -> Self {
        let loaded = match store.load() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, "ignoring unreadable exclusion overrides");
                Vec::new()
            }
        };
        let loaded_len = loaded.len();
        let mut overrides: Vec<StateExclusion> = Vec::with_capacity(loaded_len);
        for entry in loaded {
            let duplicate = overrides.iter().any(|kept| {
                same_key(kept, &entry.user, entry.program, &entry.state, entry.visit_type)
            });
            if !duplicate {
                overrides.push(entry);
            }
        }
        if overrides.len() != loaded_len {
            warn!(
                dropped = loaded_len - overrides.len(),
                "collapsed duplicate exclusion overrides"
            );
        }
        debug!(
            base_users = base.excluded_users.len(),
            base_scoped = base.state_exclusions.len(),
            overrides = overrides.len(),
            "exclusion resolver ready"
        );
        Self {
            base,
            overrides,
            store,
        }
    }

    /// Static exclusion data this resolver was built with.
    pub fn base(&self) -> &ExclusionsData {
        &self.base
    }

    /// Current local overrides, in toggle order.
    pub fn overrides(&self) -> &[StateExclusion] {
        &self.overrides
    }

    /// Backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unscoped query: listed in the flat base list or in any override.
    pub fn is_excluded_anywhere(&self, name: &str) -> bool {
        self.base
            .excluded_users
            .iter()
            .any(|user| names_match(user, name))
            || self
                .overrides
                .iter()
                .any(|entry| names_match(&entry.user, name))
    }

    /// Scoped query for one program and state.
    ///
    /// The flat base list is not consulted here; only scoped records are.
    pub fn is_excluded(
        &self,
        name: &str,
        program: Program,
        state: &str,
        visit_type: Option<VisitType>,
    ) -> bool {
        if self
            .overrides
            .iter()
            .any(|entry| scope_matches(entry, name, program, state, visit_type))
        {
            return true;
        }
        self.base
            .state_exclusions
            .iter()
            .any(|entry| scope_matches(entry, name, program, state, visit_type))
    }

    /// Flip the override for an exact key and persist the full list.
    ///
    /// Returns `true` when an override entry exists for the key afterwards.
    pub fn toggle(
        &mut self,
        name: &str,
        program: Program,
        state: &str,
        visit_type: Option<VisitType>,
    ) -> bool {
        let before = self.overrides.len();
        self.overrides
            .retain(|entry| !same_key(entry, name, program, state, visit_type));

        let excluded = if self.overrides.len() == before {
            self.overrides
                .push(StateExclusion::new(program, state, name, visit_type));
            true
        } else {
            false
        };
        debug!(name = name.trim(), %program, state, ?visit_type, excluded, "override toggled");
        self.persist();
        excluded
    }

    /// Drop every local override and persist the empty list.
    pub fn reset_overrides(&mut self) {
        self.overrides.clear();
        self.persist();
    }

    /// Base scoped entries plus overrides, optionally limited to one program.
    ///
    /// A name present in both layers is counted twice.
    pub fn total_excluded_count(&self, program: Option<Program>) -> usize {
        let in_scope =
            |entry: &&StateExclusion| program.map_or(true, |program| entry.program == program);
        self.base.state_exclusions.iter().filter(in_scope).count()
            + self.overrides.iter().filter(in_scope).count()
    }

    /// Base scoped entries plus overrides for one program and state.
    ///
    /// A name present in both layers is counted twice.
    pub fn excluded_count_for_state(&self, program: Program, state: &str) -> usize {
        self.excluded_count_for_pool(program, state, None)
    }

    /// Like [`Self::excluded_count_for_state`], limited to entries that apply
    /// to `visit_type`. Entries without a visit type apply to every pool.
    pub fn excluded_count_for_pool(
        &self,
        program: Program,
        state: &str,
        visit_type: Option<VisitType>,
    ) -> usize {
        let in_scope = |entry: &&StateExclusion| {
            entry.program == program
                && entry.state == state
                && match (visit_type, entry.visit_type) {
                    (None, _) | (_, None) => true,
                    (Some(pool), Some(recorded)) => pool == recorded,
                }
        };
        self.base.state_exclusions.iter().filter(in_scope).count()
            + self.overrides.iter().filter(in_scope).count()
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.overrides) {
            warn!(%err, "failed to persist exclusion overrides; keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StoreError, exclusion::store::MemoryOverrideStore};

    const A: Program = Program::ProgramA;
    const B: Program = Program::ProgramB;

    fn base_with_flat(names: &[&str]) -> ExclusionsData {
        ExclusionsData {
            excluded_users: names.iter().map(|name| name.to_string()).collect(),
            state_exclusions: Vec::new(),
        }
    }

    struct BrokenStore;

    impl OverrideStore for BrokenStore {
        fn load(&self) -> Result<Vec<StateExclusion>, StoreError> {
            Err(StoreError::Corrupt(
                serde_json::from_str::<Vec<StateExclusion>>("{").unwrap_err(),
            ))
        }

        fn save(&self, _entries: &[StateExclusion]) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "overrides.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    #[test]
    fn global_query_uses_flat_list_case_insensitively() {
        let resolver = ExclusionResolver::new(base_with_flat(&["Jane Doe"]), MemoryOverrideStore::new());
        assert!(resolver.is_excluded_anywhere("jane doe"));
        assert!(resolver.is_excluded_anywhere("  JANE DOE "));
        assert!(!resolver.is_excluded_anywhere("Jane"));
    }

    #[test]
    fn scoped_query_ignores_flat_list() {
        let resolver = ExclusionResolver::new(base_with_flat(&["Jane Doe"]), MemoryOverrideStore::new());
        assert!(!resolver.is_excluded("jane doe", A, "Ohio", None));
        assert!(!resolver.is_excluded("jane doe", A, "Ohio", Some(VisitType::Initial)));
    }

    #[test]
    fn global_query_sees_overrides_from_any_scope() {
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        assert!(!resolver.is_excluded_anywhere("Sam"));
        resolver.toggle("Sam", B, "Utah", Some(VisitType::FollowUp));
        assert!(resolver.is_excluded_anywhere("sam"));
    }

    #[test]
    fn global_query_ignores_scoped_base_records() {
        let base = ExclusionsData {
            excluded_users: Vec::new(),
            state_exclusions: vec![StateExclusion::new(A, "Ohio", "Sam", None)],
        };
        let resolver = ExclusionResolver::new(base, MemoryOverrideStore::new());
        assert!(!resolver.is_excluded_anywhere("Sam"));
        assert!(resolver.is_excluded("Sam", A, "Ohio", None));
    }

    #[test]
    fn scoped_base_records_match_visit_types() {
        let base = ExclusionsData {
            excluded_users: Vec::new(),
            state_exclusions: vec![
                StateExclusion::new(A, "Ohio", "Sam", None),
                StateExclusion::new(A, "Utah", "Ann", Some(VisitType::Initial)),
            ],
        };
        let resolver = ExclusionResolver::new(base, MemoryOverrideStore::new());
        assert!(resolver.is_excluded("sam", A, "Ohio", Some(VisitType::FollowUp)));
        assert!(resolver.is_excluded("ann", A, "Utah", Some(VisitType::Initial)));
        assert!(resolver.is_excluded("ann", A, "Utah", None));
        assert!(!resolver.is_excluded("ann", A, "Utah", Some(VisitType::FollowUp)));
        assert!(!resolver.is_excluded("Sam", B, "Ohio", None));
        assert!(!resolver.is_excluded("Sam", A, "ohio", None));
    }

    #[test]
    fn toggle_on_one_visit_type_leaves_the_other_included() {
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        assert!(resolver.toggle("Sam", A, "Ohio", Some(VisitType::Initial)));
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::Initial)));
        assert!(!resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::FollowUp)));
        // A query without a visit type matches any recorded visit type.
        assert!(resolver.is_excluded("Sam", A, "Ohio", None));
    }

    #[test]
    fn override_without_visit_type_covers_both() {
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        assert!(resolver.toggle("Sam", A, "Ohio", None));
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::Initial)));
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::FollowUp)));
    }

    #[test]
    fn toggle_keys_compare_visit_type_exactly() {
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        resolver.toggle("Sam", A, "Ohio", None);

        // The broad entry is not removed by a narrower toggle; a second entry is added.
        assert!(resolver.toggle("Sam", A, "Ohio", Some(VisitType::Initial)));
        assert_eq!(resolver.overrides().len(), 2);
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::Initial)));

        assert!(!resolver.toggle("Sam", A, "Ohio", Some(VisitType::Initial)));
        assert_eq!(resolver.overrides().len(), 1);
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::Initial)));

        assert!(!resolver.toggle("sam ", A, "Ohio", None));
        assert!(resolver.overrides().is_empty());
        assert!(!resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::Initial)));
    }

    #[test]
    fn double_toggle_restores_state() {
        let store = MemoryOverrideStore::new();
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), &store);
        for visit_type in [None, Some(VisitType::Initial), Some(VisitType::FollowUp)] {
            let before = resolver.is_excluded("Sam", A, "Ohio", visit_type);
            resolver.toggle("Sam", A, "Ohio", visit_type);
            resolver.toggle("Sam", A, "Ohio", visit_type);
            assert_eq!(resolver.is_excluded("Sam", A, "Ohio", visit_type), before);
        }
        assert!(store.entries().is_empty());
    }

    #[test]
    fn every_toggle_rewrites_the_store() {
        let store = MemoryOverrideStore::new();
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), &store);
        resolver.toggle("Sam", A, "Ohio", None);
        resolver.toggle("Ann", B, "Utah", Some(VisitType::FollowUp));
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.entries(), resolver.overrides().to_vec());

        resolver.toggle("SAM", A, "Ohio", None);
        assert_eq!(store.save_count(), 3);
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.entries()[0].user, "Ann");
    }

    #[test]
    fn persisted_overrides_are_reloaded() {
        let store = MemoryOverrideStore::with_entries(vec![StateExclusion::new(A, "Ohio", "Sam", None)]);
        let resolver = ExclusionResolver::new(ExclusionsData::default(), &store);
        assert!(resolver.is_excluded("sam", A, "Ohio", Some(VisitType::FollowUp)));
    }

    #[test]
    fn broken_store_leaves_resolver_usable() {
        let mut resolver = ExclusionResolver::new(base_with_flat(&["Jane"]), BrokenStore);
        assert!(resolver.overrides().is_empty());
        assert!(resolver.toggle("Sam", A, "Ohio", None));
        assert!(resolver.is_excluded("Sam", A, "Ohio", None));
        assert!(resolver.is_excluded_anywhere("jane"));
    }

    #[test]
    fn counts_sum_both_layers_without_dedup() {
        let base = ExclusionsData {
            excluded_users: vec!["Ignored".to_string()],
            state_exclusions: vec![
                StateExclusion::new(A, "Ohio", "Sam", None),
                StateExclusion::new(B, "Ohio", "Ann", None),
            ],
        };
        let mut resolver = ExclusionResolver::new(base, MemoryOverrideStore::new());
        resolver.toggle("Sam", A, "Ohio", Some(VisitType::Initial));
        resolver.toggle("Lee", A, "Utah", None);

        assert_eq!(resolver.total_excluded_count(None), 4);
        assert_eq!(resolver.total_excluded_count(Some(A)), 3);
        assert_eq!(resolver.total_excluded_count(Some(B)), 1);
        // Sam is counted once per layer.
        assert_eq!(resolver.excluded_count_for_state(A, "Ohio"), 2);
        assert_eq!(resolver.excluded_count_for_state(A, "Utah"), 1);
        assert_eq!(resolver.excluded_count_for_state(B, "Utah"), 0);
    }

    #[test]
    fn duplicate_stored_keys_survive_a_double_toggle() {
        let store = MemoryOverrideStore::with_entries(vec![
            StateExclusion::new(A, "Ohio", "Sam", None),
            StateExclusion::new(A, "Ohio", "sam ", None),
            StateExclusion::new(A, "Ohio", "Sam", Some(VisitType::Initial)),
        ]);
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), &store);
        assert_eq!(resolver.overrides().len(), 2);
        assert!(resolver.is_excluded("Sam", A, "Ohio", None));

        assert!(!resolver.toggle("Sam", A, "Ohio", None));
        assert!(resolver.toggle("Sam", A, "Ohio", None));
        assert!(resolver.is_excluded("Sam", A, "Ohio", None));
        assert!(resolver.is_excluded("Sam", A, "Ohio", Some(VisitType::FollowUp)));
        assert_eq!(store.entries().len(), 2);
    }

    #[test]
    fn toggle_removes_every_entry_for_the_key() {
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        resolver.overrides = vec![
            StateExclusion::new(B, "Utah", "Ann", None),
            StateExclusion::new(B, "Utah", "ANN", None),
        ];
        assert!(!resolver.toggle("ann", B, "Utah", None));
        assert!(resolver.overrides().is_empty());
        assert!(!resolver.is_excluded("Ann", B, "Utah", None));
    }

    #[test]
    fn pool_counts_respect_visit_type() {
        let base = ExclusionsData {
            excluded_users: Vec::new(),
            state_exclusions: vec![StateExclusion::new(A, "Ohio", "Sam", None)],
        };
        let mut resolver = ExclusionResolver::new(base, MemoryOverrideStore::new());
        resolver.toggle("Ann", A, "Ohio", Some(VisitType::Initial));
        resolver.toggle("Bo", A, "Ohio", Some(VisitType::FollowUp));
        resolver.toggle("Lee", A, "Ohio", Some(VisitType::FollowUp));

        assert_eq!(resolver.excluded_count_for_pool(A, "Ohio", Some(VisitType::Initial)), 2);
        assert_eq!(resolver.excluded_count_for_pool(A, "Ohio", Some(VisitType::FollowUp)), 3);
        assert_eq!(resolver.excluded_count_for_pool(A, "Ohio", None), 4);
        assert_eq!(resolver.excluded_count_for_state(A, "Ohio"), 4);
        assert_eq!(resolver.excluded_count_for_pool(B, "Ohio", None), 0);
    }

    #[test]
    fn reset_clears_and_persists() {
        let store = MemoryOverrideStore::new();
        let mut resolver = ExclusionResolver::new(ExclusionsData::default(), &store);
        resolver.toggle("Sam", A, "Ohio", None);
        resolver.reset_overrides();
        assert!(resolver.overrides().is_empty());
        assert!(store.entries().is_empty());
        assert_eq!(store.save_count(), 2);
    }
}
