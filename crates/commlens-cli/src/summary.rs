use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use commlens_model::CellValue;
use commlens_stats::ShapReport;
use commlens_stats::ttest::SIGNIFICANCE_LEVEL;
use commlens_transform::schema::IDENTIFIER;
use commlens_transform::{LanguageRow, PipelineOutput};

use crate::analysis::{ComparisonReport, CorrelationRow, Outcome, PlatformSummary, TrendRow};

pub fn print_comparison(report: &ComparisonReport) {
    println!("{}", platform_table(&report.platforms));
    println!();
    println!("Correlations:");
    println!("{}", correlation_table(&report.correlations));
    println!();
    println!("Trend lines:");
    println!("{}", trend_table(&report.trends));
    println!();
    println!("Cross-platform tests:");
    println!("{}", test_table(report));
}

/// One-line account of English filtering for a platform.
pub fn filtering_line(summary: &PlatformSummary) -> String {
    format!(
        "{}: {} communities, {} of {} rules kept after English filtering ({:.2}% removed)",
        summary.platform,
        summary.communities,
        summary.rules_kept,
        summary.rules_extracted,
        summary.removed_pct
    )
}

pub fn format_p(p: f64) -> String {
    if p < 0.001 {
        "<0.001".to_string()
    } else {
        format!("{p:.3}")
    }
}

pub fn platform_table(summaries: &[PlatformSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Platform"),
        header_cell("Communities"),
        header_cell("Declared en"),
        header_cell("Rules"),
        header_cell("English rules"),
        header_cell("Removed"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for summary in summaries {
        table.add_row(vec![
            Cell::new(summary.platform).add_attribute(Attribute::Bold),
            Cell::new(summary.communities),
            Cell::new(summary.english_communities),
            Cell::new(summary.rules_extracted),
            Cell::new(summary.rules_kept),
            Cell::new(format!("{:.2}%", summary.removed_pct)),
        ]);
    }
    table
}

/// Per-community rule metrics after filtering, largest rule sets first.
pub fn metrics_table(output: &PipelineOutput, limit: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Community"),
        header_cell("Rules"),
        header_cell("Mean tokens"),
        header_cell("Strict"),
        header_cell("English"),
    ]);
    apply_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut metrics: Vec<_> = output.metrics.iter().collect();
    metrics.sort_by(|a, b| {
        b.rule_count
            .cmp(&a.rule_count)
            .then_with(|| a.server_id.cmp(&b.server_id))
    });
    for entry in metrics.into_iter().take(limit) {
        let name = output
            .canonical
            .get(entry.server_id, IDENTIFIER)
            .and_then(CellValue::as_str)
            .filter(|name| !name.is_empty())
            .map_or_else(|| format!("#{}", entry.server_id), ToString::to_string);
        table.add_row(vec![
            Cell::new(name),
            Cell::new(entry.rule_count),
            Cell::new(format!("{:.1}", entry.mean_tokens)),
            Cell::new(format!("{:.0}%", entry.strict_share * 100.0)),
            Cell::new(format!("{:.0}%", entry.english_share * 100.0)),
        ]);
    }
    table
}

pub fn correlation_table(rows: &[CorrelationRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Platform"),
        header_cell("X"),
        header_cell("Y"),
        header_cell("Method"),
        header_cell("r"),
        header_cell("p"),
        header_cell("n"),
    ]);
    apply_table_style(&mut table);
    for index in 4..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for row in rows {
        let mut cells = vec![Cell::new(row.platform), Cell::new(&row.x), Cell::new(&row.y)];
        match &row.result {
            Ok(result) => cells.extend([
                Cell::new(result.method),
                Cell::new(format!("{:.3}", result.coefficient)),
                p_cell(result.p_value),
                Cell::new(result.n),
            ]),
            Err(reason) => cells.extend([
                dim_cell("-"),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(reason).fg(Color::Yellow),
            ]),
        }
        table.add_row(cells);
    }
    table
}

pub fn trend_table(rows: &[TrendRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Platform"),
        header_cell("Fit"),
        header_cell("Slope"),
        header_cell("Intercept"),
        header_cell("r²"),
    ]);
    apply_table_style(&mut table);
    for row in rows {
        let label = format!("{} ~ {}", row.y, row.x);
        let cells = match &row.fit {
            Ok(fit) => vec![
                Cell::new(row.platform),
                Cell::new(label),
                Cell::new(format!("{:.4}", fit.slope)),
                Cell::new(format!("{:.2}", fit.intercept)),
                Cell::new(format!("{:.3}", fit.r_squared)),
            ],
            Err(reason) => vec![
                Cell::new(row.platform),
                Cell::new(label),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(reason).fg(Color::Yellow),
            ],
        };
        table.add_row(cells);
    }
    table
}

fn outcome_row<T>(
    name: &str,
    outcome: &Outcome<T>,
    describe: impl Fn(&T) -> (String, f64),
) -> Vec<Cell> {
    match outcome {
        Ok(value) => {
            let (statistic, p) = describe(value);
            vec![header_cell(name), Cell::new(statistic), p_cell(p)]
        }
        Err(reason) => vec![
            header_cell(name),
            Cell::new(reason).fg(Color::Yellow),
            dim_cell("-"),
        ],
    }
}

pub fn test_table(report: &ComparisonReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Test"), header_cell("Statistic"), header_cell("p")]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(outcome_row("Fisher z", &report.fisher, |r| {
        (
            format!("{}: r1={:.3} r2={:.3} z={:.3}", r.method, r.r1, r.r2, r.z_score),
            r.p_value,
        )
    }));
    table.add_row(outcome_row("Bootstrap", &report.bootstrap, |r| {
        (
            format!(
                "{}: diff={:.3} 95% [{:.3}, {:.3}] ({} of {} resamples, seed {})",
                r.method,
                r.observed_diff,
                r.ci_low,
                r.ci_high,
                r.valid_iterations,
                r.n_iterations,
                r.seed
            ),
            r.p_value,
        )
    }));
    table.add_row(outcome_row("Welch t (rules)", &report.rule_counts, |r| {
        (
            format!("t={:.3} df={:.1}", r.t_statistic, r.degrees_of_freedom),
            r.p_value,
        )
    }));
    table
}

pub fn language_table(rows: &[LanguageRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Mastodon"),
        header_cell("Count"),
        header_cell("Reddit"),
        header_cell("Count"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    let side = |entry: &Option<(String, usize)>| match entry {
        Some((label, count)) => [Cell::new(display_label(label)), Cell::new(count)],
        None => [dim_cell(""), dim_cell("")],
    };
    for row in rows {
        let mut cells = Vec::with_capacity(4);
        cells.extend(side(&row.left));
        cells.extend(side(&row.right));
        table.add_row(cells);
    }
    table
}

fn display_label(label: &str) -> &str {
    if label.is_empty() { "(none)" } else { label }
}

pub fn attribution_table(report: &ShapReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rank"),
        header_cell("Feature"),
        header_cell("Mean |SHAP|"),
        header_cell("Mean SHAP"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for (rank, attribution) in report.attributions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&attribution.feature),
            Cell::new(format!("{:.4}", attribution.mean_abs_shap)),
            Cell::new(format!("{:+.4}", attribution.mean_shap)),
        ]);
    }
    if let Some(interaction) = &report.interaction {
        table.add_row(vec![
            dim_cell("-"),
            Cell::new(format!("{} × {}", interaction.first, interaction.second))
                .add_attribute(Attribute::Italic),
            Cell::new(format!("{:.4}", interaction.mean_abs_interaction)),
            dim_cell("-"),
        ]);
    }
    table
}

fn p_cell(p: f64) -> Cell {
    let cell = Cell::new(format_p(p));
    if p < SIGNIFICANCE_LEVEL {
        cell.fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p_values_below_a_thousandth_are_clamped() {
        assert_eq!(format_p(0.0001), "<0.001");
        assert_eq!(format_p(0.04567), "0.046");
    }
}
