//! Headline KPI scalars.
//!
//! KPIs are computed from the full table and ignore the display mode. Any KPI
//! that cannot be computed (no rows, absent column, no numeric values) is
//! reported as [`KpiValue::NotAvailable`] instead of an error.

use crate::analyzers::aggregate::{mode, nunique};
use crate::analyzers::types::Category;
use crate::analyzers::utility::{finite, mean, round_to, stddev};
use crate::dataset::{Derived, Field, Table, is_yes};
use crate::error::EngineError;
use serde::Serialize;
use tracing::debug;

/// Decimal places kept on KPI scalars.
pub const KPI_PLACES: i32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Count(usize),
    Number(f64),
    Label(String),
    NotAvailable,
}

/// How a KPI value is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiFormat {
    Plain,
    /// `12.00%`
    Percent,
    /// Value divided by 1000, `12.34K`
    Thousands,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub id: &'static str,
    pub label: &'static str,
    pub format: KpiFormat,
    pub value: KpiValue,
}

impl Kpi {
    /// Text shown on the metric card.
    pub fn display(&self) -> String {
        match (&self.value, self.format) {
            (KpiValue::NotAvailable, _) => "N/A".to_string(),
            (KpiValue::Count(n), _) => n.to_string(),
            (KpiValue::Label(s), _) => s.clone(),
            (KpiValue::Number(x), KpiFormat::Percent) => format!("{x:.2}%"),
            (KpiValue::Number(x), KpiFormat::Thousands) => format!("{:.2}K", x / 1000.0),
            (KpiValue::Number(x), KpiFormat::Plain) => format!("{x:.2}"),
        }
    }
}

/// Row filter used by share KPIs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    Equals(Field, &'static str),
    Yes(Field),
    Above(Field, f64),
    AboveMean(Field),
    BelowMean(Field),
    Both(&'static Predicate, &'static Predicate),
}

impl Predicate {
    /// One flag per row. NaN never matches a comparison.
    pub fn matches(&self, table: &Table) -> Result<Vec<bool>, EngineError> {
        match *self {
            Predicate::Equals(field, wanted) => Ok(table
                .text(field)?
                .into_iter()
                .map(|c| c == Some(wanted))
                .collect()),
            Predicate::Yes(field) => Ok(table
                .text(field)?
                .into_iter()
                .map(|c| c.is_some_and(is_yes))
                .collect()),
            Predicate::Above(field, limit) => Ok(table
                .numeric(field)?
                .into_iter()
                .map(|v| v > limit)
                .collect()),
            Predicate::AboveMean(field) | Predicate::BelowMean(field) => {
                let values = table.numeric(field)?;
                let avg = mean(&finite(values.iter().copied()));
                let above = matches!(self, Predicate::AboveMean(_));
                Ok(values
                    .into_iter()
                    .map(|v| if above { v > avg } else { v < avg })
                    .collect())
            }
            Predicate::Both(a, b) => Ok(a
                .matches(table)?
                .into_iter()
                .zip(b.matches(table)?)
                .map(|(x, y)| x && y)
                .collect()),
        }
    }
}

/// What a KPI measures over the full table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measure {
    Rows,
    NonMissing(Field),
    Distinct(Field),
    Mode(Field),
    Mean(Field),
    MeanDerived(Derived),
    Std(Field),
    /// Matching rows over all rows, as a percentage.
    Share(Predicate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub format: KpiFormat,
    pub measure: Measure,
}

const fn plain(id: &'static str, label: &'static str, measure: Measure) -> KpiSpec {
    KpiSpec {
        id,
        label,
        format: KpiFormat::Plain,
        measure,
    }
}

const fn percent(id: &'static str, label: &'static str, predicate: Predicate) -> KpiSpec {
    KpiSpec {
        id,
        label,
        format: KpiFormat::Percent,
        measure: Measure::Share(predicate),
    }
}

static VEHICLE: &[KpiSpec] = &[
    plain("total_models", "Total Vehicle Models", Measure::Distinct(Field::VehicleModel)),
    plain("total_vehicles", "Total Vehicles", Measure::NonMissing(Field::VehicleModel)),
    plain("most_common_model", "Most Common Model", Measure::Mode(Field::VehicleModel)),
    plain("avg_mileage", "Average Mileage", Measure::Mean(Field::Mileage)),
    plain("avg_issues", "Average Reported Issues", Measure::Mean(Field::ReportedIssues)),
];

static MAINTENANCE: &[KpiSpec] = &[
    percent(
        "needing_maintenance",
        "% Needing Maintenance",
        Predicate::Yes(Field::NeedMaintenance),
    ),
    percent(
        "bad_tires",
        "Bad Tire Condition (%)",
        Predicate::Equals(Field::TireCondition, "Worn Out"),
    ),
    percent(
        "poor_brakes",
        "Poor Brake Condition (%)",
        Predicate::Equals(Field::BrakeCondition, "Worn Out"),
    ),
    percent(
        "weak_battery",
        "Weak Battery (%)",
        Predicate::Equals(Field::BatteryStatus, "Weak"),
    ),
    plain(
        "avg_accidents",
        "Avg Accident History",
        Measure::Mean(Field::AccidentHistory),
    ),
];

static FUEL_ENGINE: &[KpiSpec] = &[
    percent(
        "high_engine_size",
        "% High Engine Size",
        Predicate::AboveMean(Field::EngineSize),
    ),
    percent(
        "low_engine_size",
        "% Low Engine Size",
        Predicate::BelowMean(Field::EngineSize),
    ),
    KpiSpec {
        id: "odometer_std",
        label: "STDEV of Odometer",
        format: KpiFormat::Thousands,
        measure: Measure::Std(Field::OdometerReading),
    },
    plain(
        "fuel_efficiency_std",
        "STDEV of Fuel Efficiency",
        Measure::Std(Field::FuelEfficiency),
    ),
];

const HAS_ISSUES: Predicate = Predicate::Above(Field::ReportedIssues, 0.0);
const HAS_ACCIDENTS: Predicate = Predicate::Above(Field::AccidentHistory, 0.0);

static ISSUE_RISK: &[KpiSpec] = &[
    percent(
        "with_reported_issues",
        "% Vehicles with Reported Issues",
        HAS_ISSUES,
    ),
    percent(
        "with_accidents",
        "% Vehicles with Accident History",
        HAS_ACCIDENTS,
    ),
    percent(
        "with_issues_and_accidents",
        "% Vehicles with Both Issues & Accidents",
        Predicate::Both(&HAS_ISSUES, &HAS_ACCIDENTS),
    ),
    plain(
        "fuel_efficiency_std",
        "STDEV of Fuel Efficiency",
        Measure::Std(Field::FuelEfficiency),
    ),
];

static DESCRIPTIVE: &[KpiSpec] = &[
    plain("total_models", "Total Vehicles", Measure::Distinct(Field::VehicleModel)),
    plain(
        "avg_fuel_efficiency",
        "Average Fuel Efficiency",
        Measure::Mean(Field::FuelEfficiency),
    ),
    plain(
        "avg_accidents",
        "Average Accident History",
        Measure::Mean(Field::AccidentHistory),
    ),
    plain("avg_mileage", "Average Mileage", Measure::Mean(Field::Mileage)),
    plain("avg_issues", "Average Reported Issues", Measure::Mean(Field::ReportedIssues)),
];

static DIAGNOSTIC: &[KpiSpec] = &[
    plain("vehicle_count", "Vehicle Count", Measure::Rows),
    plain("mtbf", "MTBF (km)", Measure::MeanDerived(Derived::Mtbf)),
    percent(
        "maintenance_rate",
        "% Maintenance Rate",
        Predicate::Yes(Field::NeedMaintenance),
    ),
    plain("avg_mileage", "Avg Mileage", Measure::Mean(Field::Mileage)),
    percent(
        "recurrent_issues",
        "% Recurrent Issues",
        Predicate::Above(Field::ReportedIssues, 1.0),
    ),
];

/// KPI cards of `category`, in display order.
pub fn kpis_for(category: Category) -> &'static [KpiSpec] {
    match category {
        Category::Vehicle => VEHICLE,
        Category::Maintenance => MAINTENANCE,
        Category::FuelEngine => FUEL_ENGINE,
        Category::IssueRisk => ISSUE_RISK,
        Category::Descriptive => DESCRIPTIVE,
        Category::Diagnostic => DIAGNOSTIC,
    }
}

/// Share of rows as a percentage, rounded to two places as a fraction first
/// and then scaled: 7 of 40 gives 18.0, not 17.5. The outer rounding only
/// strips float noise from the scaling.
pub fn share_pct(part: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let fraction = round_to(part as f64 / total as f64, KPI_PLACES);
    Some(round_to(fraction * 100.0, KPI_PLACES))
}

fn number(x: f64) -> KpiValue {
    if x.is_finite() {
        KpiValue::Number(round_to(x, KPI_PLACES))
    } else {
        KpiValue::NotAvailable
    }
}

impl KpiSpec {
    fn measure(&self, table: &Table) -> Result<KpiValue, EngineError> {
        let total = table.require_rows()?;
        let value = match self.measure {
            Measure::Rows => KpiValue::Count(total),
            Measure::NonMissing(field) => {
                KpiValue::Count(table.text(field)?.iter().flatten().count())
            }
            Measure::Distinct(field) => KpiValue::Count(nunique(&table.text(field)?)),
            Measure::Mode(field) => mode(&table.text(field)?)
                .map(|m| KpiValue::Label(m.to_string()))
                .unwrap_or(KpiValue::NotAvailable),
            Measure::Mean(field) => number(mean(&finite(table.numeric(field)?))),
            Measure::MeanDerived(derived) => number(mean(&finite(derived.compute(table)?))),
            Measure::Std(field) => {
                let values = finite(table.numeric(field)?);
                number(stddev(&values, mean(&values)))
            }
            Measure::Share(predicate) => {
                let hits = predicate.matches(table)?.into_iter().filter(|m| *m).count();
                share_pct(hits, total)
                    .map(KpiValue::Number)
                    .unwrap_or(KpiValue::NotAvailable)
            }
        };
        Ok(value)
    }

    /// Evaluates the KPI, falling back to [`KpiValue::NotAvailable`].
    pub fn compute(&self, table: &Table) -> Kpi {
        let value = self.measure(table).unwrap_or_else(|e| {
            debug!(kpi = self.id, error = %e, "KPI not available");
            KpiValue::NotAvailable
        });
        Kpi {
            id: self.id,
            label: self.label,
            format: self.format,
            value,
        }
    }
}

/// All KPI cards of `category` over `table`.
pub fn compute_kpis(table: &Table, category: Category) -> Vec<Kpi> {
    kpis_for(category).iter().map(|k| k.compute(table)).collect()
}
