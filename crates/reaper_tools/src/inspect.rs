//! Value table inspection.

use reaper_core::qstate::QTable;
use serde::Serialize;

/// One learned `(state, goal)` weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry {
    /// Rendered state key.
    pub state: String,
    /// Goal name.
    pub goal: String,
    /// Learned weight.
    pub weight: f64,
}

/// Overview of a value table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    /// Number of states seen.
    pub states: usize,
    /// Number of non-zero weights.
    pub learned_weights: usize,
    /// Strongest entries by absolute weight.
    pub top: Vec<TableEntry>,
}

/// Summarize a table, keeping the `top` entries with the largest absolute
/// weight. Zero weights are never listed.
#[must_use]
pub fn inspect_table(table: &QTable, top: usize) -> TableReport {
    let mut entries: Vec<TableEntry> = table
        .iter()
        .flat_map(|(key, weights)| {
            weights
                .iter()
                .filter(|(_, weight)| *weight != 0.0)
                .map(move |(goal, weight)| TableEntry {
                    state: key.to_string(),
                    goal: goal.name().to_string(),
                    weight,
                })
        })
        .collect();
    let learned_weights = entries.len();
    entries.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
    entries.truncate(top);
    TableReport {
        states: table.len(),
        learned_weights,
        top: entries,
    }
}

/// Plain-text rendering, one entry per line.
#[must_use]
pub fn render_text(report: &TableReport) -> String {
    let mut out = format!(
        "{} states, {} learned weights\n",
        report.states, report.learned_weights
    );
    for entry in &report.top {
        out.push_str(&format!("{:>10.3}  {:<22} {}\n", entry.weight, entry.goal, entry.state));
    }
    out
}
