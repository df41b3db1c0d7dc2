//! Conversion of exported pool spreadsheets into [`ResourcePool`]s.
//!
//! Sheets come in two shapes. The older one has a single header row of
//! state names. The current one adds a second row labelling each column
//! as an initial or follow-up visit. In both, the state label is only
//! written on the first column of a merged range, so blank header cells
//! continue the state to their left.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Program, ResourcePool, VisitType};

use super::sentinel::{is_rejected_header, is_sentinel_name};

static TRAILING_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^()]*\)\s*$").expect("invalid parenthetical regex"));

/// Header arrangement of a pool sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderLayout {
    /// Pick a layout by inspecting the second row.
    #[default]
    Auto,
    /// One header row of state names; pools carry no visit type.
    StateOnly,
    /// State row followed by a visit-type row.
    StateAndVisitType,
}

impl HeaderLayout {
    fn header_rows(self) -> usize {
        match self {
            HeaderLayout::StateAndVisitType => 2,
            HeaderLayout::Auto | HeaderLayout::StateOnly => 1,
        }
    }
}

/// Result of parsing one sheet, including recovered problems.
#[derive(Debug, Clone, Default)]
pub struct ParseReport {
    /// Non-empty pools sorted by state, then visit type.
    pub pools: Vec<ResourcePool>,
    /// Problems encountered while reading; parsing continued past each one.
    pub warnings: Vec<String>,
    /// Layout actually used.
    pub layout: HeaderLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    index: usize,
    state: String,
    visit_type: Option<VisitType>,
}

/// Parse a sheet, detecting its header layout.
pub fn parse(raw: &str, program: Program) -> Vec<ResourcePool> {
    parse_with_layout(raw, program, HeaderLayout::Auto).pools
}

/// Parse a sheet with an explicit header layout.
///
/// Never fails: unreadable records are skipped and reported in
/// [`ParseReport::warnings`], and sheets without data rows yield no pools.
pub fn parse_with_layout(raw: &str, program: Program, layout: HeaderLayout) -> ParseReport {
    let (rows, warnings) = read_rows(raw);
    for warning in &warnings {
        warn!(program = %program, "{warning}");
    }

    let layout = resolve_layout(layout, &rows);
    let header_rows = layout.header_rows();
    if rows.len() <= header_rows {
        debug!(program = %program, rows = rows.len(), "sheet has no data rows");
        return ParseReport {
            pools: Vec::new(),
            warnings,
            layout,
        };
    }

    let visit_row = match layout {
        HeaderLayout::StateAndVisitType => rows.get(1).map(Vec::as_slice),
        _ => None,
    };
    let columns = map_columns(&rows[0], visit_row);

    let mut buckets: BTreeMap<(String, Option<VisitType>), Vec<String>> = BTreeMap::new();
    for row in &rows[header_rows..] {
        for column in &columns {
            let Some(cell) = row.get(column.index) else {
                continue;
            };
            let name = collapse_whitespace(cell);
            if is_sentinel_name(&name) {
                continue;
            }
            buckets
                .entry((column.state.clone(), column.visit_type))
                .or_default()
                .push(name);
        }
    }

    let pools = buckets
        .into_iter()
        .filter_map(|((state, visit_type), users)| {
            let users = dedupe(users);
            if users.is_empty() {
                return None;
            }
            Some(ResourcePool {
                program,
                state,
                visit_type,
                users,
            })
        })
        .collect::<Vec<_>>();

    debug!(program = %program, pools = pools.len(), ?layout, "sheet parsed");
    ParseReport {
        pools,
        warnings,
        layout,
    }
}

/// Trim a state header, drop a trailing parenthetical note and collapse spaces.
pub fn normalize_state(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = TRAILING_PAREN_RE.replace(trimmed, "");
    collapse_whitespace(&stripped)
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Classify a visit-type label; anything not mentioning "follow" is an initial visit.
pub fn classify_visit_type(label: &str) -> VisitType {
    if label.to_lowercase().contains("follow") {
        VisitType::FollowUp
    } else {
        VisitType::Initial
    }
}

fn read_rows(raw: &str) -> (Vec<Vec<String>>, Vec<String>) {
    let raw = raw.trim_start_matches('\u{feff}');
    let mut warnings = Vec::new();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut starts = Vec::new();
    let mut reader = csv_reader(raw, true);
    for (index, record) in reader.records().enumerate() {
        match record {
            Ok(record) => {
                starts.push(record.position().map(|pos| pos.byte() as usize));
                rows.push(record.iter().map(str::to_string).collect());
            }
            Err(err) => warnings.push(format!("skipping record {}: {err}", index + 1)),
        }
    }

    if raw.matches('"').count() % 2 != 0 {
        warnings.push("unbalanced quoting; rows after the stray quote read unquoted".to_string());
        // An unterminated quote swallows the rest of the input into the last record.
        let swallowed = rows.last().is_some_and(|row| {
            row.iter()
                .any(|cell| cell.contains(|ch: char| matches!(ch, '\n' | '\r')))
        });
        let tail = starts.last().copied().flatten().and_then(|start| raw.get(start..));
        if let (true, Some(tail)) = (swallowed, tail) {
            rows.pop();
            rows.extend(read_unquoted(tail, &mut warnings));
        }
    }
    (rows, warnings)
}

fn csv_reader(raw: &str, quoting: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(quoting)
        .from_reader(raw.as_bytes())
}

fn read_unquoted(tail: &str, warnings: &mut Vec<String>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for record in csv_reader(tail, false).records() {
        match record {
            Ok(record) => rows.push(
                record
                    .iter()
                    .map(|cell| cell.trim_matches('"').to_string())
                    .collect(),
            ),
            Err(err) => warnings.push(format!("skipping unquoted record: {err}")),
        }
    }
    rows
}

fn resolve_layout(layout: HeaderLayout, rows: &[Vec<String>]) -> HeaderLayout {
    if layout != HeaderLayout::Auto {
        return layout;
    }
    let labelled = rows.get(1).is_some_and(|row| {
        row.iter().any(|cell| {
            let lowered = cell.to_lowercase();
            lowered.contains("initial") || lowered.contains("follow")
        })
    });
    if labelled {
        HeaderLayout::StateAndVisitType
    } else {
        HeaderLayout::StateOnly
    }
}

fn map_columns(state_row: &[String], visit_row: Option<&[String]>) -> Vec<Column> {
    let width = state_row
        .len()
        .max(visit_row.map(|row| row.len()).unwrap_or(0));

    let mut current: Option<String> = None;
    let mut columns = Vec::with_capacity(width);
    for index in 0..width {
        let header = state_row.get(index).map(String::as_str).unwrap_or("");
        if !is_rejected_header(header) {
            let state = normalize_state(header);
            if !state.is_empty() {
                current = Some(state);
            }
        }
        let Some(state) = current.clone() else {
            continue;
        };
        let visit_type = visit_row.map(|row| {
            classify_visit_type(row.get(index).map(String::as_str).unwrap_or(""))
        });
        columns.push(Column {
            index,
            state,
            visit_type,
        });
    }
    columns
}

fn dedupe(users: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(users.len());
    users
        .into_iter()
        .filter(|user| seen.insert(user.clone()))
        .collect()
}
