//! The in-memory vehicle maintenance table and its typed column accessors.
//!
//! Cells are kept as raw text exactly as loaded. Typed views are produced per
//! access: numeric columns coerce anything unparsable to NaN, categorical
//! columns treat empty cells as missing.

use crate::error::EngineError;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;
use tracing::debug;

/// Whether a column is grouped and compared as text or as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Categorical,
    Numeric,
}

/// A column of the source dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Field {
    VehicleModel,
    OwnerType,
    FuelType,
    TransmissionType,
    TireCondition,
    BrakeCondition,
    BatteryStatus,
    MaintenanceHistory,
    NeedMaintenance,
    Mileage,
    EngineSize,
    OdometerReading,
    FuelEfficiency,
    InsurancePremium,
    ReportedIssues,
    AccidentHistory,
    VehicleAge,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::VehicleModel,
        Field::OwnerType,
        Field::FuelType,
        Field::TransmissionType,
        Field::TireCondition,
        Field::BrakeCondition,
        Field::BatteryStatus,
        Field::MaintenanceHistory,
        Field::NeedMaintenance,
        Field::Mileage,
        Field::EngineSize,
        Field::OdometerReading,
        Field::FuelEfficiency,
        Field::InsurancePremium,
        Field::ReportedIssues,
        Field::AccidentHistory,
        Field::VehicleAge,
    ];

    /// Column header as it appears in the CSV.
    pub const fn name(self) -> &'static str {
        match self {
            Field::VehicleModel => "Vehicle_Model",
            Field::OwnerType => "Owner_Type",
            Field::FuelType => "Fuel_Type",
            Field::TransmissionType => "Transmission_Type",
            Field::TireCondition => "Tire_Condition",
            Field::BrakeCondition => "Brake_Condition",
            Field::BatteryStatus => "Battery_Status",
            Field::MaintenanceHistory => "Maintenance_History",
            Field::NeedMaintenance => "Need_Maintenance",
            Field::Mileage => "Mileage",
            Field::EngineSize => "Engine_Size",
            Field::OdometerReading => "Odometer_Reading",
            Field::FuelEfficiency => "Fuel_Efficiency",
            Field::InsurancePremium => "Insurance_Premium",
            Field::ReportedIssues => "Reported_Issues",
            Field::AccidentHistory => "Accident_History",
            Field::VehicleAge => "Vehicle_Age",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Mileage
            | Field::EngineSize
            | Field::OdometerReading
            | Field::FuelEfficiency
            | Field::InsurancePremium
            | Field::ReportedIssues
            | Field::AccidentHistory
            | Field::VehicleAge => FieldKind::Numeric,
            _ => FieldKind::Categorical,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Columns computed per request from other columns. Never stored in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Derived {
    /// Mean time between failures: `Mileage / (Reported_Issues + 1)`.
    Mtbf,
}

impl Derived {
    pub const fn name(self) -> &'static str {
        match self {
            Derived::Mtbf => "Mean_Time_Between_Failures",
        }
    }

    /// Source columns the derivation reads.
    pub fn inputs(self) -> &'static [Field] {
        match self {
            Derived::Mtbf => &[Field::Mileage, Field::ReportedIssues],
        }
    }

    pub fn compute(self, table: &Table) -> Result<Vec<f64>, EngineError> {
        match self {
            Derived::Mtbf => {
                let mileage = table.numeric(Field::Mileage)?;
                let issues = table.numeric(Field::ReportedIssues)?;
                Ok(mileage
                    .iter()
                    .zip(&issues)
                    .map(|(m, i)| m / (i + 1.0))
                    .collect())
            }
        }
    }
}

/// One component of a group key.
///
/// Numbers order before text; numbers compare by value and text
/// lexicographically, which matches the ordering of a sorted group-by.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum KeyPart {
    Number(f64),
    Text(String),
}

impl KeyPart {
    /// Folds -0.0 into 0.0 so both compare and hash as one key.
    fn canonical(n: f64) -> f64 {
        if n == 0.0 { 0.0 } else { n }
    }

    fn rank(&self) -> u8 {
        match self {
            KeyPart::Number(_) => 0,
            KeyPart::Text(_) => 1,
        }
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Number(a), KeyPart::Number(b)) => {
                Self::canonical(*a).total_cmp(&Self::canonical(*b))
            }
            (KeyPart::Text(a), KeyPart::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            KeyPart::Number(n) => {
                state.write_u8(0);
                Self::canonical(*n).to_bits().hash(state);
            }
            KeyPart::Text(s) => {
                state.write_u8(1);
                s.hash(state);
            }
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            KeyPart::Number(n) => write!(f, "{}", n),
            KeyPart::Text(s) => f.write_str(s),
        }
    }
}

/// Parses a cell the way a lenient numeric coercion does: blanks and garbage become NaN.
pub fn parse_number(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Interprets a yes/no flag cell.
pub fn is_yes(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1"
    )
}

/// The immutable source table.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        // A repeated header resolves to its first column.
        let mut index = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.trim().to_string()).or_insert(i);
        }
        Self {
            headers,
            index,
            rows,
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has(&self, field: Field) -> bool {
        self.index.contains_key(field.name())
    }

    /// Fields from the known schema that the table does not carry.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::ALL.into_iter().filter(|f| !self.has(*f)).collect()
    }

    /// Fails with [`EngineError::EmptyDataset`] when there is nothing to divide by.
    pub fn require_rows(&self) -> Result<usize, EngineError> {
        if self.rows.is_empty() {
            Err(EngineError::EmptyDataset)
        } else {
            Ok(self.rows.len())
        }
    }

    fn position(&self, field: Field) -> Result<usize, EngineError> {
        self.index
            .get(field.name())
            .copied()
            .ok_or_else(|| EngineError::MissingColumn {
                column: field.name().to_string(),
            })
    }

    /// Raw cells of a column. Short rows read as empty cells.
    pub fn text(&self, field: Field) -> Result<Vec<Option<&str>>, EngineError> {
        let pos = self.position(field)?;
        Ok(self
            .rows
            .iter()
            .map(|row| {
                row.get(pos)
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
            })
            .collect())
    }

    /// Numeric view of a column; unparsable and empty cells become NaN.
    pub fn numeric(&self, field: Field) -> Result<Vec<f64>, EngineError> {
        Ok(self
            .text(field)?
            .into_iter()
            .map(|c| c.map(parse_number).unwrap_or(f64::NAN))
            .collect())
    }

    /// Group-key view of a column. Missing cells, and NaN for numeric fields, are `None`.
    pub fn keys(&self, field: Field) -> Result<Vec<Option<KeyPart>>, EngineError> {
        let cells = self.text(field)?;
        let keys = match field.kind() {
            FieldKind::Numeric => cells
                .into_iter()
                .map(|c| {
                    c.map(parse_number)
                        .filter(|n| !n.is_nan())
                        .map(KeyPart::Number)
                })
                .collect(),
            FieldKind::Categorical => cells
                .into_iter()
                .map(|c| c.map(|s| KeyPart::Text(s.to_string())))
                .collect(),
        };
        Ok(keys)
    }
}

/// Process-wide read-once handle to the dataset.
///
/// The first successful load wins; every later call returns the same table.
pub struct DatasetCache {
    cell: OnceLock<Table>,
}

impl DatasetCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the cached table, loading it with `load` on first use.
    pub fn get_or_load<F>(&self, load: F) -> anyhow::Result<&Table>
    where
        F: FnOnce() -> anyhow::Result<Table>,
    {
        if let Some(table) = self.cell.get() {
            debug!(rows = table.len(), "Dataset served from cache");
            return Ok(table);
        }
        let table = load()?;
        Ok(self.cell.get_or_init(|| table))
    }

    pub fn get(&self) -> Option<&Table> {
        self.cell.get()
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}
