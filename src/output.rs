//! Output formatting for rendered dashboards.
//!
//! Supports a plain-text view, a JSON report, and CSV export.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

use crate::analyzers::types::{Dashboard, Section, SummaryTable};
use crate::stats::Kpi;

/// JSON envelope around a rendered dashboard.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub dashboard: &'a Dashboard,
}

impl<'a> Report<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        Self {
            generated_at: Utc::now(),
            dashboard,
        }
    }
}

/// Prints the dashboard as text tables and KPI cards on stdout.
pub fn print_pretty(dashboard: &Dashboard) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_pretty(&mut out, dashboard)?;
    out.flush()?;
    Ok(())
}

pub fn write_pretty<W: Write>(out: &mut W, dashboard: &Dashboard) -> Result<()> {
    writeln!(
        out,
        "Vehicle Maintenance Dashboard [{} | {}] ({} rows)",
        dashboard.filter, dashboard.mode, dashboard.total_rows
    )?;
    if dashboard.sections.is_empty() {
        writeln!(out, "\nNothing to show for this selection.")?;
    }
    for section in &dashboard.sections {
        write_section(out, section)?;
    }
    Ok(())
}

fn write_section<W: Write>(out: &mut W, section: &Section) -> Result<()> {
    writeln!(out, "\n== {} ==", section.title)?;
    if let Some(reason) = &section.disabled {
        writeln!(out, "Section unavailable: {reason}")?;
        return Ok(());
    }
    write_kpis(out, &section.kpis)?;
    for chart in &section.charts {
        write_chart(out, chart)?;
    }
    Ok(())
}

fn write_kpis<W: Write>(out: &mut W, kpis: &[Kpi]) -> Result<()> {
    if kpis.is_empty() {
        return Ok(());
    }
    let width = kpis.iter().map(|k| k.label.len()).max().unwrap_or(0);
    for kpi in kpis {
        writeln!(out, "  {:<width$}  {}", kpi.label, kpi.display())?;
    }
    Ok(())
}

fn write_chart<W: Write>(out: &mut W, chart: &SummaryTable) -> Result<()> {
    writeln!(out, "\n-- {} [{:?}] --", chart.title, chart.kind)?;
    if chart.rows.is_empty() {
        writeln!(out, "  (no data)")?;
        return Ok(());
    }

    let label_header = chart.key_columns.join(" - ");
    let width = chart
        .rows
        .iter()
        .map(|r| r.label.len())
        .chain(std::iter::once(label_header.len()))
        .max()
        .unwrap_or(0);
    let pct = chart.has_percentage();

    if pct {
        writeln!(out, "  {:<width$}  {:>14}  {:>10}", label_header, chart.value_column, "Percentage")?;
    } else {
        writeln!(out, "  {:<width$}  {:>14}", label_header, chart.value_column)?;
    }
    for row in &chart.rows {
        match row.percentage {
            Some(p) => writeln!(out, "  {:<width$}  {:>14.3}  {:>9.3}%", row.label, row.value, p)?,
            None if pct => writeln!(out, "  {:<width$}  {:>14.3}  {:>10}", row.label, row.value, "")?,
            None => writeln!(out, "  {:<width$}  {:>14.3}", row.label, row.value)?,
        }
    }
    Ok(())
}

/// Prints the dashboard as a pretty JSON [`Report`] on stdout.
pub fn print_json(dashboard: &Dashboard) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &Report::new(dashboard))?;
    writeln!(out)?;
    Ok(())
}

/// Writes one CSV block per summary table, separated by a blank line.
///
/// Each block starts with a `# <section> / <chart>` line, then a header of
/// the key columns, the value column and, in percentage mode, `Percentage`.
pub fn write_csv<W: Write>(mut out: W, dashboard: &Dashboard) -> Result<()> {
    let mut first = true;
    for section in &dashboard.sections {
        for chart in &section.charts {
            if !first {
                writeln!(out)?;
            }
            first = false;
            writeln!(out, "# {} / {}", section.title, chart.title)?;
            write_chart_csv(&mut out, chart)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn write_chart_csv<W: Write>(out: &mut W, chart: &SummaryTable) -> Result<()> {
    let pct = chart.has_percentage();
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);

    let mut header: Vec<&str> = chart.key_columns.clone();
    header.push(chart.value_column);
    if pct {
        header.push("Percentage");
    }
    writer.write_record(&header)?;

    for row in &chart.rows {
        let mut record: Vec<String> = row.keys.iter().map(|k| k.to_string()).collect();
        record.push(row.value.to_string());
        if pct {
            record.push(row.percentage.map(|p| p.to_string()).unwrap_or_default());
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    debug!(chart = chart.id, rows = chart.rows.len(), "CSV block written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::render;
    use crate::analyzers::types::{Category, CategoryFilter, DisplayMode};
    use crate::dataset::tests::table;
    use crate::dataset::Table;

    fn sample() -> Table {
        table(
            &["Vehicle_Model", "Owner_Type", "Fuel_Type", "Transmission_Type", "Mileage"],
            &[
                &["Car", "First", "Petrol", "Manual", "100"],
                &["Van", "Second", "Diesel", "Manual", "200"],
                &["Car", "First", "Petrol", "Automatic", "300"],
            ],
        )
    }

    fn vehicle(mode: DisplayMode) -> Dashboard {
        render(&sample(), CategoryFilter::Only(Category::Vehicle), mode)
    }

    #[test]
    fn test_pretty_lists_kpis_and_charts() {
        let mut buf = Vec::new();
        write_pretty(&mut buf, &vehicle(DisplayMode::Count)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("== Vehicle Category Analysis =="));
        assert!(text.contains("Most Common Model"));
        assert!(text.contains("Owner Type Distribution (Count)"));
        assert!(!text.contains("Percentage"));
    }

    #[test]
    fn test_pretty_shows_disabled_reason() {
        let dashboard = render(
            &sample(),
            CategoryFilter::Only(Category::Diagnostic),
            DisplayMode::Count,
        );
        let mut buf = Vec::new();
        write_pretty(&mut buf, &dashboard).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Section unavailable: missing column"));
    }

    #[test]
    fn test_csv_blocks_with_percentages() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &vehicle(DisplayMode::Percentage)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let block: Vec<&str> = text
            .split("\n\n")
            .find(|b| b.contains("Owner Type Distribution"))
            .unwrap()
            .lines()
            .collect();
        assert_eq!(block[1], "Owner_Type,Count,Percentage");
        assert_eq!(block[2], "First,2,66.667");
        assert_eq!(block[3], "Second,1,33.333");
    }

    #[test]
    fn test_csv_count_mode_has_no_percentage_column() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &vehicle(DisplayMode::Count)).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("Fuel_Type,Count\n"));
        assert!(!text.contains("Percentage"));
    }

    #[test]
    fn test_json_report_envelope() {
        let dashboard = vehicle(DisplayMode::Count);
        let value = serde_json::to_value(Report::new(&dashboard)).unwrap();

        assert!(value["generated_at"].is_string());
        assert_eq!(value["total_rows"], 3);
        assert_eq!(value["sections"][0]["category"], "Vehicle");
        assert_eq!(value["sections"][0]["charts"][0]["kind"], "bar");
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&vehicle(DisplayMode::Percentage)).unwrap();
    }
}
