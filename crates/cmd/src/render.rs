//! Plain-text rendering of catalog views for the terminal

use std::fmt::Write;

use catalog::TreeEntry;
use query::QueryResult;
use service::{FileView, FolderView};

/// Milliseconds since the epoch as RFC 3339, or the raw number if out of range
#[must_use]
pub fn format_millis(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map_or_else(|| millis.to_string(), |t| t.to_rfc3339())
}

/// Render rows as an aligned table with a header rule
#[must_use]
pub fn render_table(result: &QueryResult) -> String {
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &result.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(&result.columns));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &result.rows {
        out.push_str(&line(row));
        out.push('\n');
    }

    let rows = result.row_count();
    let noun = if rows == 1 { "row" } else { "rows" };
    if result.truncated {
        _ = writeln!(out, "({rows} {noun}, truncated)");
    } else {
        _ = writeln!(out, "({rows} {noun})");
    }
    out
}

/// One line per child: kind, type, queryable flag, jobs, version, name
#[must_use]
pub fn render_entries(entries: &[TreeEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let name = match entry.kind {
            catalog::EntryKind::Folder => format!("{}/", entry.name),
            _ => entry.name.clone(),
        };
        _ = writeln!(
            out,
            "{:<16} {:<8} {:<5} {:>5} v{:<4} {}",
            entry.kind.as_str(),
            entry.file_type.as_str(),
            if entry.is_queryable { "query" } else { "-" },
            entry.job_count,
            entry.version,
            name,
        );
    }
    out
}

#[must_use]
pub fn render_file(view: &FileView) -> String {
    let mut out = String::new();
    _ = writeln!(out, "path:      {}", view.path);
    _ = writeln!(out, "id:        {}", view.id);
    _ = writeln!(out, "kind:      {}", view.kind);
    _ = writeln!(out, "version:   {}", view.version);
    _ = writeln!(out, "type:      {}", view.file_type);
    _ = writeln!(out, "queryable: {}", view.is_queryable);
    _ = writeln!(out, "jobs:      {}", view.job_count);
    if let Some(owner) = &view.format.owner {
        _ = writeln!(out, "owner:     {owner}");
    }
    if let Some(ctime) = view.format.ctime {
        _ = writeln!(out, "created:   {}", format_millis(ctime));
    }
    out
}

#[must_use]
pub fn render_folder(view: &FolderView) -> String {
    let mut out = String::new();
    _ = writeln!(out, "path:      {}/", view.path);
    _ = writeln!(out, "id:        {}", view.id);
    _ = writeln!(out, "version:   {}", view.version);
    _ = writeln!(out, "created:   {}", format_millis(view.ctime));
    let file_type = view
        .format
        .as_ref()
        .map_or("(none)", |f| f.file_type().as_str());
    _ = writeln!(out, "type:      {file_type}");
    _ = writeln!(out, "queryable: {}", view.is_queryable);
    out
}
