//! Data types used by the aggregation pipeline.

use crate::dataset::KeyPart;
use crate::error::EngineError;
use crate::stats::Kpi;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One of the six analysis sections of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Vehicle,
    Maintenance,
    FuelEngine,
    IssueRisk,
    Descriptive,
    Diagnostic,
}

impl Category {
    /// Render order used when every category is selected.
    pub const ALL: [Category; 6] = [
        Category::Vehicle,
        Category::Maintenance,
        Category::FuelEngine,
        Category::IssueRisk,
        Category::Descriptive,
        Category::Diagnostic,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::Vehicle => "Vehicle Category Analysis",
            Category::Maintenance => "Maintenance and Condition Analysis",
            Category::FuelEngine => "Fuel and Engine Performance Analysis",
            Category::IssueRisk => "Reported Issue and Risk Analysis",
            Category::Descriptive => "Descriptive Analysis",
            Category::Diagnostic => "Diagnostic Analysis",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Category::Vehicle => "vehicle",
            Category::Maintenance => "maintenance",
            Category::FuelEngine => "fuel",
            Category::IssueRisk => "risk",
            Category::Descriptive => "descriptive",
            Category::Diagnostic => "diagnostic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// The sidebar's category selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CategoryFilter {
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Categories to render, in display order.
    pub fn categories(self) -> Vec<Category> {
        match self {
            CategoryFilter::All => Category::ALL.to_vec(),
            CategoryFilter::Only(c) => vec![c],
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = EngineError;

    /// Accepts the full section titles and short names, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        if wanted == "all" {
            return Ok(CategoryFilter::All);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.title().to_ascii_lowercase() == wanted || c.short_name() == wanted)
            .map(CategoryFilter::Only)
            .ok_or_else(|| EngineError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("All"),
            CategoryFilter::Only(c) => c.fmt(f),
        }
    }
}

/// The count/percentage toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisplayMode {
    Count,
    Percentage,
}

impl DisplayMode {
    /// Chart kind the rendering layer draws for this mode.
    pub fn chart_kind(self) -> ChartKind {
        match self {
            DisplayMode::Count => ChartKind::Bar,
            DisplayMode::Percentage => ChartKind::Pie,
        }
    }
}

impl FromStr for DisplayMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_prefix("show as ").unwrap_or(&wanted);
        match wanted {
            "count" => Ok(DisplayMode::Count),
            "percentage" | "percent" => Ok(DisplayMode::Percentage),
            _ => Err(EngineError::UnknownDisplayMode(s.to_string())),
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayMode::Count => f.write_str("Count"),
            DisplayMode::Percentage => f.write_str("Percentage"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

/// One group of a summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub keys: Vec<KeyPart>,
    /// Keys joined with `" - "`, used as the pie slice name.
    pub label: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

impl SummaryRow {
    pub fn new(keys: Vec<KeyPart>, value: f64) -> Self {
        let label = keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(" - ");
        Self {
            keys,
            label,
            value,
            percentage: None,
        }
    }
}

/// The data behind one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub id: &'static str,
    pub title: String,
    pub kind: ChartKind,
    pub key_columns: Vec<&'static str>,
    pub value_column: &'static str,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn has_percentage(&self) -> bool {
        self.rows.iter().any(|r| r.percentage.is_some())
    }
}

/// Everything rendered for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub category: Category,
    pub title: &'static str,
    pub kpis: Vec<Kpi>,
    pub charts: Vec<SummaryTable>,
    /// Set when a required column is absent; the section is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<String>,
}

/// Result of one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub filter: String,
    pub mode: String,
    pub total_rows: usize,
    pub sections: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Diagnostic Analysis".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Diagnostic)
        );
        assert_eq!(
            "fuel".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::FuelEngine)
        );
        assert_eq!(
            "maintenance-and-condition-analysis"
                .parse::<CategoryFilter>()
                .unwrap(),
            CategoryFilter::Only(Category::Maintenance)
        );
        assert!("Weather".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn test_display_mode_parsing() {
        assert_eq!("Count".parse::<DisplayMode>().unwrap(), DisplayMode::Count);
        assert_eq!(
            "Show as Percentage".parse::<DisplayMode>().unwrap(),
            DisplayMode::Percentage
        );
        assert!("ratio".parse::<DisplayMode>().is_err());
    }

    #[test]
    fn test_all_renders_every_category_in_order() {
        assert_eq!(CategoryFilter::All.categories(), Category::ALL.to_vec());
        assert_eq!(
            CategoryFilter::Only(Category::IssueRisk).categories(),
            vec![Category::IssueRisk]
        );
    }

    #[test]
    fn test_row_label_joins_keys() {
        let row = SummaryRow::new(
            vec![KeyPart::Text("Petrol".into()), KeyPart::Text("Manual".into())],
            1.0,
        );
        assert_eq!(row.label, "Petrol - Manual");
    }
}
