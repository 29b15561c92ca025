use crate::data::{Grid, GridResult, TimetableOutput};
use itertools::Itertools;

/// Plain-text rendering: a title block, then one table per grid with
/// `Day / Period` and `P<n> <time>` headers.
pub fn render_text(output: &TimetableOutput) -> String {
    let mut text = String::new();
    let title = if output.school_name.is_empty() {
        "Timetable Preview"
    } else {
        output.school_name.as_str()
    };
    text.push_str(&format!("{title}\n"));
    if !output.term.is_empty() {
        text.push_str(&format!("Term: {}\n", output.term));
    }

    let headers = period_headers(&output.time_labels, period_count(&output.timetable));
    match &output.timetable {
        GridResult::Flat(grid) => {
            text.push('\n');
            text.push_str(&render_grid(grid, &headers));
        }
        GridResult::Sectioned(grids) => {
            for section in grids {
                text.push_str(&format!("\nSection: {}\n", section.section));
                text.push_str(&render_grid(&section.grid, &headers));
            }
        }
    }
    text
}

fn period_count(result: &GridResult) -> usize {
    let grid = match result {
        GridResult::Flat(grid) => Some(grid),
        GridResult::Sectioned(grids) => grids.first().map(|g| &g.grid),
    };
    grid.and_then(|g| g.rows.first())
        .map_or(0, |row| row.cells.len())
}

fn period_headers(labels: &[String], periods: usize) -> Vec<String> {
    (1..=periods)
        .map(|p| match labels.get(p - 1) {
            Some(label) => format!("P{p} {label} IST"),
            None => format!("P{p}"),
        })
        .collect()
}

fn render_grid(grid: &Grid, headers: &[String]) -> String {
    let mut table: Vec<Vec<String>> = Vec::with_capacity(grid.rows.len() + 1);
    table.push(
        std::iter::once("Day / Period".to_string())
            .chain(headers.iter().cloned())
            .collect(),
    );
    for row in &grid.rows {
        table.push(
            std::iter::once(row.day.clone())
                .chain(row.cells.iter().map(ToString::to_string))
                .collect(),
        );
    }

    let columns = table.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            table
                .iter()
                .filter_map(|line| line.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    table
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .join(" | ")
                .trim_end()
                .to_string()
        })
        .map(|line| line + "\n")
        .collect()
}
