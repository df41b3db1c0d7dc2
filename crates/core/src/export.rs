//! CSV export of filtered provider rows.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::info;

use crate::{
    exclusion::{ExclusionResolver, OverrideStore},
    models::{ExportRow, Program, ResourcePool},
    summary::ProviderEntry,
};

/// Render rows as CSV text.
///
/// The `state` and `excluded` columns appear only when at least one row
/// carries a value for them. Output is deterministic for a given input.
pub fn export_csv(rows: &[ExportRow]) -> String {
    let include_state = rows.iter().any(|row| row.state.is_some());
    let include_excluded = rows.iter().any(|row| row.is_excluded.is_some());

    let mut headers = vec!["name"];
    if include_state {
        headers.push("state");
    }
    if include_excluded {
        headers.push("excluded");
    }

    let mut output = String::new();
    output.push_str(&headers.join(","));
    output.push('\n');

    for row in rows {
        let mut fields = vec![escape_field(&row.name)];
        if include_state {
            fields.push(escape_field(row.state.as_deref().unwrap_or("")));
        }
        if include_excluded {
            let value = match row.is_excluded {
                Some(true) => "yes",
                Some(false) => "no",
                None => "",
            };
            fields.push(value.to_string());
        }
        output.push_str(&fields.join(","));
        output.push('\n');
    }

    output
}

/// Quote a field containing a comma, quote or line break; double embedded quotes.
pub fn escape_field(field: &str) -> String {
    if field.contains(|ch: char| matches!(ch, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Rows for every user of one pool, with their scoped exclusion state.
pub fn rows_for_pool<S: OverrideStore>(
    pool: &ResourcePool,
    resolver: &ExclusionResolver<S>,
) -> Vec<ExportRow> {
    pool.users
        .iter()
        .map(|user| ExportRow {
            name: user.clone(),
            state: Some(pool.state.clone()),
            is_excluded: Some(resolver.is_excluded(
                user,
                pool.program,
                &pool.state,
                pool.visit_type,
            )),
        })
        .collect()
}

/// One row per provider with their unscoped exclusion state.
pub fn rows_for_providers<'a, S: OverrideStore>(
    providers: impl IntoIterator<Item = &'a ProviderEntry>,
    resolver: &ExclusionResolver<S>,
) -> Vec<ExportRow> {
    providers
        .into_iter()
        .map(|provider| ExportRow {
            name: provider.name.clone(),
            state: None,
            is_excluded: Some(resolver.is_excluded_anywhere(&provider.name)),
        })
        .collect()
}

/// File name for an export taken at `at`.
pub fn export_file_name(program: Program, view: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.csv",
        program.slug(),
        sanitize_component(view),
        at.format("%Y%m%d%H%M%S")
    )
}

/// Write rows to a timestamped file under `dir` and return its path.
pub fn write_export(
    dir: impl AsRef<Path>,
    program: Program,
    view: &str,
    rows: &[ExportRow],
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(export_file_name(program, view, Local::now()));
    fs::write(&path, export_csv(rows))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "export written");
    Ok(path)
}

fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        } else if ch.is_whitespace() && !result.ends_with('-') {
            result.push('-');
        }
    }
    let trimmed = result.trim_matches('-');
    if trimmed.is_empty() {
        "export".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusion::{ExclusionsData, MemoryOverrideStore};
    use crate::models::VisitType;
    use crate::summary::ProviderIndex;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn row(name: &str, state: Option<&str>, excluded: Option<bool>) -> ExportRow {
        ExportRow {
            name: name.to_string(),
            state: state.map(str::to_string),
            is_excluded: excluded,
        }
    }

    #[test]
    fn name_only_export() {
        let csv = export_csv(&[row("Ann", None, None), row("Bo", None, None)]);
        assert_eq!(csv, "name\nAnn\nBo\n");
    }

    #[test]
    fn optional_columns_follow_the_rows() {
        let csv = export_csv(&[
            row("Ann", Some("Ohio"), Some(true)),
            row("Bo", None, Some(false)),
        ]);
        assert_eq!(csv, "name,state,excluded\nAnn,Ohio,yes\nBo,,no\n");
    }

    #[test]
    fn fields_are_quoted_when_needed() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("Smith, John"), "\"Smith, John\"");
        assert_eq!(escape_field("Dr \"J\""), "\"Dr \"\"J\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn export_is_byte_identical_across_runs() {
        let rows = vec![
            row("Smith, John", Some("New York"), Some(false)),
            row("Q \"uote\"", Some("Ohio"), Some(true)),
        ];
        assert_eq!(export_csv(&rows), export_csv(&rows));
    }

    #[test]
    fn pool_rows_carry_scoped_state() {
        let mut resolver =
            ExclusionResolver::new(ExclusionsData::default(), MemoryOverrideStore::new());
        resolver.toggle("Sam", Program::ProgramA, "Ohio", Some(VisitType::Initial));
        let pool = ResourcePool {
            program: Program::ProgramA,
            state: "Ohio".to_string(),
            visit_type: Some(VisitType::Initial),
            users: vec!["Sam".to_string(), "Ann".to_string()],
        };
        let rows = rows_for_pool(&pool, &resolver);
        assert_eq!(
            rows,
            vec![
                row("Sam", Some("Ohio"), Some(true)),
                row("Ann", Some("Ohio"), Some(false)),
            ]
        );
    }

    #[test]
    fn provider_rows_use_global_state() {
        let base = ExclusionsData {
            excluded_users: vec!["Bo".to_string()],
            state_exclusions: Vec::new(),
        };
        let resolver = ExclusionResolver::new(base, MemoryOverrideStore::new());
        let pools = vec![ResourcePool {
            program: Program::ProgramA,
            state: "Ohio".to_string(),
            visit_type: None,
            users: vec!["bo".to_string(), "Ann".to_string()],
        }];
        let index = ProviderIndex::build(&pools);
        let rows = rows_for_providers(index.providers(), &resolver);
        assert_eq!(
            rows,
            vec![row("Ann", None, Some(false)), row("bo", None, Some(true))]
        );
        assert_eq!(export_csv(&rows), "name,excluded\nAnn,no\nbo,yes\n");
    }

    #[test]
    fn file_names_are_stable_and_safe() {
        let at = Local
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            export_file_name(Program::ProgramB, "Ohio · Follow Up", at),
            "program-b_ohio-follow-up_20240305140709.csv"
        );
        assert_eq!(
            export_file_name(Program::ProgramA, "!!", at),
            "program-a_export_20240305140709.csv"
        );
    }

    #[test]
    fn writes_export_file() -> Result<()> {
        let dir = tempdir()?;
        let path = write_export(
            dir.path().join("exports"),
            Program::ProgramA,
            "providers",
            &[row("Ann", None, Some(false))],
        )?;
        assert_eq!(fs::read_to_string(path)?, "name,excluded\nAnn,no\n");
        Ok(())
    }
}
