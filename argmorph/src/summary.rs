//! End-of-run summary table.

use argmorph_core::{CategoryResult, MatchSet, TestOutcomes};
use colored::Colorize;

const HEADERS: [&str; 6] = [
    "Process",
    "Dash/Hyphen",
    "Char (insert)",
    "Char (replace)",
    "Quotes",
    "Shortened",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Neutral,
    Negative,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    text: String,
    verdict: Verdict,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            verdict: Verdict::Neutral,
        }
    }

    fn render(&self, width: usize, color: bool) -> String {
        let padded = format!("{:<width$}", self.text);
        if !color {
            return padded;
        }
        match self.verdict {
            Verdict::Neutral => padded,
            Verdict::Negative => padded.on_red().to_string(),
            Verdict::Positive => padded.on_green().to_string(),
        }
    }
}

fn set_cell(result: &CategoryResult<MatchSet>) -> Cell {
    match result {
        CategoryResult::NotApplicable => Cell::plain("N/A"),
        CategoryResult::TestedEmpty => Cell {
            text: "No".to_string(),
            verdict: Verdict::Negative,
        },
        CategoryResult::Found(matches) => Cell {
            text: format!("Yes ({})", matches.len()),
            verdict: Verdict::Positive,
        },
    }
}

fn quote_cell(result: &CategoryResult<String>) -> Cell {
    match result {
        CategoryResult::NotApplicable => Cell::plain("N/A"),
        CategoryResult::TestedEmpty => Cell {
            text: "No".to_string(),
            verdict: Verdict::Negative,
        },
        CategoryResult::Found(_) => Cell {
            text: "Yes".to_string(),
            verdict: Verdict::Positive,
        },
    }
}

fn row(name: &str, outcomes: &TestOutcomes) -> Vec<Cell> {
    vec![
        Cell::plain(name),
        set_cell(&outcomes.option_char),
        set_cell(&outcomes.char_insert),
        set_cell(&outcomes.char_substitute),
        quote_cell(&outcomes.quotes),
        set_cell(&outcomes.shorthands),
    ]
}

/// Render an ASCII table with one row per tested process. Widths are
/// computed on the plain text so colouring never breaks alignment.
pub fn render_summary<'a>(
    results: impl IntoIterator<Item = (&'a str, &'a TestOutcomes)>,
    color: bool,
) -> String {
    let mut rows = vec![HEADERS.iter().map(|h| Cell::plain(*h)).collect::<Vec<_>>()];
    rows.extend(results.into_iter().map(|(name, outcomes)| row(name, outcomes)));

    let widths: Vec<usize> = (0..HEADERS.len())
        .map(|col| {
            rows.iter()
                .map(|r| r[col].text.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = vec![border.clone()];
    for (i, r) in rows.iter().enumerate() {
        let cells: Vec<String> = r
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!(" {} ", cell.render(w, color)))
            .collect();
        lines.push(format!("|{}|", cells.join("|")));
        if i == 0 {
            lines.push(border.clone());
        }
    }
    lines.push(border);
    lines.join("\n")
}
