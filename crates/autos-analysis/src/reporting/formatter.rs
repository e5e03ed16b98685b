//! Fixed-width text rendering of analysis results.

use crate::aggregation::BrandAggregateTable;
use crate::cleaner::FilterReport;
use crate::profiler::{ColumnExploration, ColumnSummary, DateDistribution, FrequencyTable, SummaryStats};
use crate::types::AnalysisReport;
use serde::{Deserialize, Serialize};

const MISSING: &str = "-";
const COLUMN_GAP: &str = "  ";

/// Rendering options for text tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayOptions {
    /// Digits after the decimal point
    pub float_precision: usize,
    /// Rows shown per table; `None` shows all
    pub max_rows: Option<usize>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            float_precision: 2,
            max_rows: Some(20),
        }
    }
}

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(usize),
    Number(Option<f64>),
    /// A proportion in `[0, 1]`, shown as a percentage
    Share(f64),
}

impl Cell {
    fn render(&self, options: &DisplayOptions) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Count(n) => n.to_string(),
            Cell::Number(Some(v)) => format!("{:.*}", options.float_precision, v),
            Cell::Number(None) => MISSING.to_string(),
            Cell::Share(p) => format!("{:.*}%", options.float_precision, p * 100.0),
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Cell::Text(_))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Count(n)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        Cell::Number(v)
    }
}

/// A titled grid of cells ready for text rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTable {
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl DisplayTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// value / count / share of a frequency table.
    pub fn from_frequency(table: &FrequencyTable, value_header: &str) -> Self {
        let mut display = Self::new([value_header, "count", "share"]);
        for entry in &table.entries {
            display.push_row(vec![
                entry.value.as_str().into(),
                entry.count.into(),
                Cell::Share(entry.proportion),
            ]);
        }
        display
    }

    /// statistic / value view of a single column summary.
    pub fn from_summary(summary: &ColumnSummary) -> Self {
        let mut display = Self::new(["statistic", summary.column.as_str()]);
        display.push_row(vec!["count".into(), summary.count.into()]);
        display.push_row(vec!["unique".into(), summary.unique.into()]);
        match &summary.stats {
            SummaryStats::Numeric(n) => {
                for (label, value) in [
                    ("mean", n.mean),
                    ("std", n.std),
                    ("min", n.min),
                    ("25%", n.q25),
                    ("50%", n.median),
                    ("75%", n.q75),
                    ("max", n.max),
                ] {
                    display.push_row(vec![label.into(), value.into()]);
                }
            }
            SummaryStats::Categorical(c) => {
                display.push_row(vec![
                    "top".into(),
                    c.top.as_deref().unwrap_or(MISSING).into(),
                ]);
                display.push_row(vec!["freq".into(), c.freq.into()]);
            }
        }
        display
    }

    /// One row per column, numeric and categorical statistics side by side.
    pub fn from_summaries(summaries: &[ColumnSummary]) -> Self {
        let mut display = Self::new([
            "column", "dtype", "count", "missing", "unique", "top", "freq", "mean", "std", "min",
            "25%", "50%", "75%", "max",
        ]);
        for s in summaries {
            let mut row: Vec<Cell> = vec![
                s.column.as_str().into(),
                s.dtype.as_str().into(),
                s.count.into(),
                s.missing.into(),
                s.unique.into(),
            ];
            match &s.stats {
                SummaryStats::Numeric(n) => {
                    row.push(MISSING.into());
                    row.push(Cell::Number(None));
                    row.extend(
                        [n.mean, n.std, n.min, n.q25, n.median, n.q75, n.max].map(Cell::from),
                    );
                }
                SummaryStats::Categorical(c) => {
                    row.push(c.top.as_deref().unwrap_or(MISSING).into());
                    row.push(c.freq.into());
                    row.extend(std::iter::repeat_n(Cell::Number(None), 7));
                }
            }
            display.push_row(row);
        }
        display
    }

    /// Brand aggregates indexed by brand.
    pub fn from_aggregates(table: &BrandAggregateTable) -> Self {
        let mut display = Self::new([
            table.brand_column.as_str(),
            "listings",
            "share",
            "mean_price",
            "mean_mileage_km",
        ]);
        for row in &table.rows {
            display.push_row(vec![
                row.brand.as_str().into(),
                row.listings.into(),
                Cell::Share(row.share),
                row.mean_price.into(),
                row.mean_mileage_km.into(),
            ]);
        }
        display
    }
}

/// Render a table as fixed-width text.
///
/// Numeric columns are right-aligned, text columns left-aligned. Rows
/// beyond `options.max_rows` are replaced by a single elision line.
pub fn format_table_for_display(table: &DisplayTable, options: &DisplayOptions) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(title) = &table.title {
        lines.push(title.clone());
    }
    if table.headers.is_empty() {
        return lines.join("\n");
    }

    let shown = options
        .max_rows
        .map_or(table.rows.len(), |n| n.min(table.rows.len()));
    let rendered: Vec<Vec<String>> = table.rows[..shown]
        .iter()
        .map(|row| row.iter().map(|c| c.render(options)).collect())
        .collect();

    let columns = table.headers.len();
    let right_aligned: Vec<bool> = (0..columns)
        .map(|i| {
            !table.rows.is_empty() && table.rows.iter().all(|r| r.get(i).is_none_or(Cell::is_numeric))
        })
        .collect();
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            rendered
                .iter()
                .filter_map(|r| r.get(i))
                .map(|s| s.chars().count())
                .chain(std::iter::once(table.headers[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render_line = |cells: &[String]| -> String {
        (0..columns)
            .map(|i| {
                let text = cells.get(i).map(String::as_str).unwrap_or("");
                if right_aligned[i] {
                    format!("{:>width$}", text, width = widths[i])
                } else {
                    format!("{:<width$}", text, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join(COLUMN_GAP)
            .trim_end()
            .to_string()
    };

    lines.push(render_line(table.headers.as_slice()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    if table.rows.is_empty() {
        lines.push("(no rows)".to_string());
    }
    for row in &rendered {
        lines.push(render_line(row.as_slice()));
    }
    if shown < table.rows.len() {
        lines.push(format!("... {} more rows", table.rows.len() - shown));
    }

    lines.join("\n")
}

/// Renders a whole [`AnalysisReport`] as text, sections in pipeline order.
pub struct ReportFormatter;

impl ReportFormatter {
    pub fn render(report: &AnalysisReport, options: &DisplayOptions) -> String {
        let mut out = ReportText::new(*options);

        out.banner("USED CAR LISTINGS ANALYSIS");
        out.field("Source", &report.source);
        out.field("Encoding", &report.encoding);
        out.field("Rows", report.rows_loaded);
        out.field("Columns", report.columns_loaded);
        out.field("Generated", &report.generated_at);
        if report.replaced_characters > 0 {
            out.field("Undecodable characters", report.replaced_characters);
        }
        out.blank();

        out.section("COLUMN NAMES");
        let mut names = DisplayTable::new(["original", "normalized"]);
        for rename in report.schema.changed().chain(&report.schema.clarity_renames) {
            names.push_row(vec![
                rename.original.as_str().into(),
                rename.normalized.as_str().into(),
            ]);
        }
        out.table(&names);
        out.blank();

        out.section("COLUMN SUMMARY");
        out.table(&DisplayTable::from_summaries(&report.initial_summary));
        out.blank();

        let dropped = &report.dropped_columns;
        out.section("LOW-VALUE COLUMNS");
        out.field("Mode", format!("{:?}", dropped.outcome.mode).to_lowercase());
        out.field("Dropped", dropped.outcome.dropped.join(", "));
        if !dropped.outcome.missing.is_empty() {
            out.field("Not found", dropped.outcome.missing.join(", "));
        }
        for evidence in &dropped.evidence {
            out.blank();
            out.table(&DisplayTable::from_frequency(evidence, &evidence.column));
        }
        out.blank();

        out.section("ODOMETER");
        out.exploration(&report.odometer, false);
        out.blank();

        out.section("PRICE");
        out.line("Before filtering:");
        out.exploration(&report.price.before, true);
        out.blank();
        out.filter(&report.price.filter);
        out.blank();
        out.line("After filtering:");
        out.exploration(&report.price.after, true);
        out.blank();

        let year = &report.registration_year;
        out.section("REGISTRATION YEAR");
        out.table(&DisplayTable::from_summary(&year.before));
        out.blank();
        out.filter(&year.filter);
        out.blank();
        out.table(&DisplayTable::from_frequency(&year.distribution, &year.distribution.column));
        out.blank();

        out.section("DATES");
        for dist in &report.date_distributions {
            out.dates(dist);
            out.blank();
        }
        if report.date_distributions.is_empty() {
            out.line("  No date columns found");
            out.blank();
        }

        out.section("BRANDS");
        out.table(
            &DisplayTable::from_frequency(&report.brands.shares, &report.brands.shares.column)
                .with_title("Share of listings"),
        );
        out.blank();
        out.table(
            &DisplayTable::from_aggregates(&report.brands.aggregates)
                .with_title(format!("Top {} brands", report.brands.aggregates.len())),
        );
        out.blank();

        let summary = &report.summary;
        out.section("SUMMARY");
        out.field("Rows loaded", summary.rows_loaded);
        out.field("Rows retained", summary.rows_final);
        out.field(
            "Rows removed",
            format!(
                "{} ({:.1}%)",
                summary.rows_removed(),
                summary.rows_removed_percentage()
            ),
        );
        out.field("Duration", format!("{} ms", summary.duration_ms));
        for warning in &summary.warnings {
            out.line(format!("  WARNING: {}", warning));
        }
        out.rule();

        out.finish()
    }
}

/// Line buffer with the section conventions of the text report.
struct ReportText {
    buf: String,
    options: DisplayOptions,
}

impl ReportText {
    fn new(options: DisplayOptions) -> Self {
        Self {
            buf: String::new(),
            options,
        }
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.buf.push_str(text.as_ref());
        self.buf.push('\n');
    }

    fn blank(&mut self) {
        self.buf.push('\n');
    }

    fn rule(&mut self) {
        self.line("=".repeat(80));
    }

    fn banner(&mut self, title: &str) {
        self.rule();
        self.line(title);
        self.rule();
    }

    fn section(&mut self, title: &str) {
        self.line(title);
        self.line("-".repeat(40));
    }

    fn field(&mut self, label: &str, value: impl std::fmt::Display) {
        self.line(format!("  {:<24}{}", format!("{}:", label), value));
    }

    fn table(&mut self, table: &DisplayTable) {
        let text = format_table_for_display(table, &self.options);
        self.line(text);
    }

    fn filter(&mut self, report: &FilterReport) {
        self.line(format!("Filter {} in {}:", report.column, report.range));
        self.field("Rows before", report.rows_before);
        self.field("Rows after", report.rows_after);
        self.field(
            "Removed",
            format!("{} ({:.1}%)", report.rows_removed(), report.removed_percent()),
        );
        self.field("  below range", report.removed_below);
        self.field("  above range", report.removed_above);
        self.field("  missing", report.removed_missing);
        self.field("  non-numeric", report.removed_non_numeric);
    }

    fn exploration(&mut self, exploration: &ColumnExploration, with_most_frequent: bool) {
        self.field("Distinct values", exploration.distinct);
        self.table(&DisplayTable::from_summary(&exploration.summary));
        if with_most_frequent {
            self.blank();
            self.table(
                &DisplayTable::from_frequency(&exploration.most_frequent, &exploration.column)
                    .with_title("Most frequent"),
            );
        }
        self.blank();
        self.table(
            &DisplayTable::from_frequency(&exploration.highest_values, &exploration.column)
                .with_title("Highest values"),
        );
    }

    fn dates(&mut self, dist: &DateDistribution) {
        let range = match (dist.earliest, dist.latest) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => MISSING.to_string(),
        };
        self.line(format!("{} ({})", dist.column, range));
        if dist.unparsed > 0 {
            self.field("Unparsed prefixes", dist.unparsed);
        }
        self.table(
            &DisplayTable::from_frequency(&dist.by_frequency, "date").with_title("Most frequent"),
        );
        self.blank();
        self.table(&DisplayTable::from_frequency(&dist.by_date, "date").with_title("By date"));
    }

    fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::date_distribution;
    use polars::prelude::{NamedFrom, Series};
    use pretty_assertions::assert_eq;

    fn options(max_rows: Option<usize>) -> DisplayOptions {
        DisplayOptions {
            float_precision: 2,
            max_rows,
        }
    }

    #[test]
    fn test_dates_render_both_orders() {
        let series = Series::new(
            "date_crawled".into(),
            &[
                "2016-03-01 10:00:00",
                "2016-04-01 09:00:00",
                "2016-04-01 11:00:00",
                "2016-04-01 12:00:00",
            ],
        );
        let dist = date_distribution(&series, 10).unwrap();

        let mut out = ReportText::new(options(None));
        out.dates(&dist);
        let text = out.finish();

        let lines: Vec<&str> = text.lines().collect();
        let most_frequent = lines.iter().position(|l| *l == "Most frequent").unwrap();
        let by_date = lines.iter().position(|l| *l == "By date").unwrap();
        assert!(most_frequent < by_date);
        // title, header, separator, first row
        assert!(lines[most_frequent + 3].starts_with("2016-04-01"));
        assert!(lines[by_date + 3].starts_with("2016-03-01"));
    }

    #[test]
    fn test_format_aligns_columns() {
        let mut table = DisplayTable::new(["brand", "mean_price"]).with_title("Brands");
        table.push_row(vec!["audi".into(), Some(9336.687).into()]);
        table.push_row(vec!["volkswagen".into(), Some(5402.41).into()]);
        table.push_row(vec!["lada".into(), None.into()]);

        let text = format_table_for_display(&table, &options(None));
        let expected = "\
Brands
brand       mean_price
----------  ----------
audi           9336.69
volkswagen     5402.41
lada                 -";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_format_elides_rows() {
        let mut table = DisplayTable::new(["year"]);
        for year in 2000..2010usize {
            table.push_row(vec![year.into()]);
        }
        let text = format_table_for_display(&table, &options(Some(3)));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2 + 3 + 1);
        assert_eq!(lines.last(), Some(&"... 7 more rows"));
    }

    #[test]
    fn test_format_precision_and_share() {
        let mut table = DisplayTable::new(["value", "share"]);
        table.push_row(vec![Some(1.0 / 3.0).into(), Cell::Share(0.25)]);
        let text = format_table_for_display(
            &table,
            &DisplayOptions {
                float_precision: 4,
                max_rows: None,
            },
        );
        assert!(text.contains("0.3333"));
        assert!(text.contains("25.0000%"));
    }

    #[test]
    fn test_format_empty_table() {
        let table = DisplayTable::new(["a", "b"]);
        let text = format_table_for_display(&table, &options(None));
        assert!(text.ends_with("(no rows)"));
    }

    #[test]
    fn test_frequency_display() {
        let freq = FrequencyTable::from_values("seller", ["privat", "privat", "gewerblich"].map(Some));
        let table = DisplayTable::from_frequency(&freq, "seller");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("privat".to_string()));
        assert_eq!(table.rows[0][1], Cell::Count(2));
    }
}
