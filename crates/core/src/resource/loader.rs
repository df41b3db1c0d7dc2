use std::{collections::HashMap, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use tracing::{error, info};

use crate::{
    config::AppConfig,
    models::{Program, ResourcePool},
};

use super::parser::{parse_with_layout, HeaderLayout};

/// Location and header layout of one program's sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSource {
    /// Path to the exported CSV file.
    pub path: PathBuf,
    /// Header layout to parse it with.
    pub layout: HeaderLayout,
}

impl PoolSource {
    /// Source with automatic layout detection.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            layout: HeaderLayout::Auto,
        }
    }
}

/// Thread-safe loader that reads and caches each program's pools.
#[derive(Clone)]
pub struct PoolLoader {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    sources: HashMap<Program, PoolSource>,
    cache: HashMap<Program, Vec<ResourcePool>>,
}

impl PoolLoader {
    /// Build a loader over the given per-program sources.
    pub fn new(sources: impl IntoIterator<Item = (Program, PoolSource)>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                sources: sources.into_iter().collect(),
                cache: HashMap::new(),
            })),
        }
    }

    /// Build a loader from the configured sheet paths.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Program::ALL.into_iter().map(|program| {
            (
                program,
                PoolSource {
                    path: config.sheet_path(program),
                    layout: config.header_layout,
                },
            )
        }))
    }

    /// Configured source for a program.
    pub fn source(&self, program: Program) -> Option<PoolSource> {
        self.inner.read().sources.get(&program).cloned()
    }

    /// Drop cached pools so the next access re-reads the sheets.
    pub fn refresh(&self) {
        self.inner.write().cache.clear();
    }

    /// Pools for a program, reading the sheet on first use.
    ///
    /// A missing or unreadable sheet is logged and yields no pools.
    pub fn pools(&self, program: Program) -> Vec<ResourcePool> {
        if let Some(cached) = self.inner.read().cache.get(&program) {
            return cached.clone();
        }

        let mut inner = self.inner.write();
        let source = inner.sources.get(&program).cloned();
        let pools = match source {
            Some(source) => match read_pools(program, &source) {
                Ok(pools) => pools,
                Err(err) => {
                    error!(%program, ?err, "failed to load pool sheet");
                    Vec::new()
                }
            },
            None => {
                error!(%program, "no pool sheet configured");
                Vec::new()
            }
        };
        inner.cache.insert(program, pools.clone());
        pools
    }

    /// Filter pools using a case-insensitive substring search over state and users.
    pub fn pools_matching(&self, program: Program, query: &str) -> Vec<ResourcePool> {
        let needle = query.trim().to_lowercase();
        let pools = self.pools(program);
        if needle.is_empty() {
            return pools;
        }

        pools
            .into_iter()
            .filter(|pool| pool_matches(pool, &needle))
            .collect()
    }
}

/// `true` when the state or any user contains the lowercase `needle`.
pub fn pool_matches(pool: &ResourcePool, needle: &str) -> bool {
    pool.state.to_lowercase().contains(needle)
        || pool
            .users
            .iter()
            .any(|user| user.to_lowercase().contains(needle))
}

fn read_pools(program: Program, source: &PoolSource) -> Result<Vec<ResourcePool>> {
    let raw = fs::read_to_string(&source.path)
        .with_context(|| format!("failed to read {}", source.path.display()))?;
    let report = parse_with_layout(&raw, program, source.layout);
    info!(
        %program,
        path = %source.path.display(),
        pools = report.pools.len(),
        warnings = report.warnings.len(),
        "pool sheet loaded"
    );
    Ok(report.pools)
}
