use crate::analyzers::types::SummaryRow;
use crate::analyzers::utility::{finite, mean, round_to, stddev};
use crate::dataset::{Derived, Field, KeyPart, Table};
use crate::error::EngineError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Decimal places kept on every summary-table value.
pub const TABLE_PLACES: i32 = 3;

/// What a grouped reduction reads for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueSource {
    /// Every row weighs one; pairs with [`Reduction::Count`].
    Rows,
    Field(Field),
    Derived(Derived),
}

impl ValueSource {
    /// Source columns that must be present.
    pub fn inputs(self) -> Vec<Field> {
        match self {
            ValueSource::Rows => Vec::new(),
            ValueSource::Field(f) => vec![f],
            ValueSource::Derived(d) => d.inputs().to_vec(),
        }
    }

    fn numbers(self, table: &Table) -> Result<Vec<f64>, EngineError> {
        match self {
            ValueSource::Rows => Ok(vec![1.0; table.len()]),
            ValueSource::Field(f) => table.numeric(f),
            ValueSource::Derived(d) => d.compute(table),
        }
    }

    fn distinct_keys(self, table: &Table) -> Result<Vec<Option<KeyPart>>, EngineError> {
        match self {
            ValueSource::Field(f) => table.keys(f),
            _ => Ok(self
                .numbers(table)?
                .into_iter()
                .map(|n| (!n.is_nan()).then_some(KeyPart::Number(n)))
                .collect()),
        }
    }
}

/// Per-group reduction operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reduction {
    Mean,
    Sum,
    /// Rows in the group, including rows whose value is missing.
    Count,
    /// Sample standard deviation.
    Std,
    /// Distinct non-missing values.
    NUnique,
}

/// Groups `table` by `keys` and reduces `value` within each group.
///
/// Rows whose key cells are missing belong to no group. Groups come back in
/// first-encounter order with values rounded to [`TABLE_PLACES`].
pub fn group_reduce(
    table: &Table,
    keys: &[Field],
    value: ValueSource,
    reduction: Reduction,
) -> Result<Vec<SummaryRow>, EngineError> {
    let key_columns = keys
        .iter()
        .map(|k| table.keys(*k))
        .collect::<Result<Vec<_>, _>>()?;

    let mut order: Vec<(Vec<KeyPart>, Vec<usize>)> = Vec::new();
    let mut slots: HashMap<Vec<KeyPart>, usize> = HashMap::new();

    'rows: for row in 0..table.len() {
        let mut key = Vec::with_capacity(key_columns.len());
        for column in &key_columns {
            match &column[row] {
                Some(part) => key.push(part.clone()),
                None => continue 'rows,
            }
        }
        match slots.get(&key) {
            Some(&slot) => order[slot].1.push(row),
            None => {
                slots.insert(key.clone(), order.len());
                order.push((key, vec![row]));
            }
        }
    }

    let reduced: Vec<f64> = match reduction {
        Reduction::Count => order.iter().map(|(_, rows)| rows.len() as f64).collect(),
        Reduction::NUnique => {
            let values = value.distinct_keys(table)?;
            order
                .iter()
                .map(|(_, rows)| {
                    rows.iter()
                        .filter_map(|r| values[*r].as_ref())
                        .collect::<HashSet<_>>()
                        .len() as f64
                })
                .collect()
        }
        Reduction::Mean | Reduction::Sum | Reduction::Std => {
            let values = value.numbers(table)?;
            order
                .iter()
                .map(|(_, rows)| {
                    let group = finite(rows.iter().map(|r| values[*r]));
                    match reduction {
                        Reduction::Sum => group.iter().sum::<f64>(),
                        Reduction::Std => stddev(&group, mean(&group)),
                        _ => mean(&group),
                    }
                })
                .collect()
        }
    };

    Ok(order
        .into_iter()
        .zip(reduced)
        .map(|((key, _), v)| SummaryRow::new(key, round_to(v, TABLE_PLACES)))
        .collect())
}

/// Most frequent non-missing value; ties go to the value seen first.
pub fn mode<'a>(values: &[Option<&'a str>]) -> Option<&'a str> {
    let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
    for (pos, v) in values.iter().enumerate() {
        if let Some(v) = *v {
            counts.entry(v).or_insert((0, pos)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, pa)), (_, (cb, pb))| ca.cmp(cb).then(pb.cmp(pa)))
        .map(|(v, _)| v)
}

/// Number of distinct non-missing values.
pub fn nunique(values: &[Option<&str>]) -> usize {
    values.iter().flatten().collect::<HashSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::table;

    fn owners() -> Table {
        table(
            &["Owner_Type", "Mileage", "Vehicle_Model"],
            &[
                &["First", "100", "Car"],
                &["Second", "abc", "Truck"],
                &["First", "300", "Car"],
                &["", "50", "Bus"],
            ],
        )
    }

    #[test]
    fn test_count_by_key_in_encounter_order() {
        let rows = group_reduce(&owners(), &[Field::OwnerType], ValueSource::Rows, Reduction::Count)
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "First");
        assert_eq!(rows[0].value, 2.0);
        assert_eq!(rows[1].label, "Second");
        assert_eq!(rows[1].value, 1.0);
    }

    #[test]
    fn test_negative_zero_joins_zero_group() {
        let t = table(&["Reported_Issues"], &[&["0"], &["-0"], &["0"]]);
        let rows = group_reduce(&t, &[Field::ReportedIssues], ValueSource::Rows, Reduction::Count)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "0");
        assert_eq!(rows[0].value, 3.0);
    }

    #[test]
    fn test_mean_skips_non_numeric_values() {
        let rows = group_reduce(
            &owners(),
            &[Field::OwnerType],
            ValueSource::Field(Field::Mileage),
            Reduction::Mean,
        )
        .unwrap();

        assert_eq!(rows[0].value, 200.0);
        assert!(rows[1].value.is_nan());
    }

    #[test]
    fn test_sum_of_no_values_is_zero() {
        let rows = group_reduce(
            &owners(),
            &[Field::OwnerType],
            ValueSource::Field(Field::Mileage),
            Reduction::Sum,
        )
        .unwrap();

        assert_eq!(rows[0].value, 400.0);
        assert_eq!(rows[1].value, 0.0);
    }

    #[test]
    fn test_std_and_nunique() {
        let t = table(
            &["Fuel_Type", "Fuel_Efficiency", "Vehicle_Model"],
            &[
                &["Petrol", "10", "Car"],
                &["Petrol", "12", "Van"],
                &["Petrol", "14", "Car"],
                &["Diesel", "20", "Bus"],
            ],
        );
        let std = group_reduce(
            &t,
            &[Field::FuelType],
            ValueSource::Field(Field::FuelEfficiency),
            Reduction::Std,
        )
        .unwrap();
        let distinct = group_reduce(
            &t,
            &[Field::FuelType],
            ValueSource::Field(Field::VehicleModel),
            Reduction::NUnique,
        )
        .unwrap();

        assert_eq!(std[0].value, 2.0);
        assert!(std[1].value.is_nan());
        assert_eq!(distinct[0].value, 2.0);
        assert_eq!(distinct[1].value, 1.0);
    }

    #[test]
    fn test_two_key_grouping() {
        let t = table(
            &["Fuel_Type", "Transmission_Type", "Fuel_Efficiency"],
            &[
                &["Petrol", "Manual", "10"],
                &["Petrol", "Automatic", "11"],
                &["Petrol", "Manual", "12"],
            ],
        );
        let rows = group_reduce(
            &t,
            &[Field::FuelType, Field::TransmissionType],
            ValueSource::Field(Field::FuelEfficiency),
            Reduction::Mean,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "Petrol - Manual");
        assert_eq!(rows[0].value, 11.0);
    }

    #[test]
    fn test_mean_rounds_to_three_places() {
        let t = table(
            &["Fuel_Type", "Fuel_Efficiency"],
            &[&["Petrol", "1"], &["Petrol", "1"], &["Petrol", "2"]],
        );
        let rows = group_reduce(
            &t,
            &[Field::FuelType],
            ValueSource::Field(Field::FuelEfficiency),
            Reduction::Mean,
        )
        .unwrap();

        assert_eq!(rows[0].value, 1.333);
    }

    #[test]
    fn test_derived_value_source() {
        let t = table(
            &["Vehicle_Model", "Mileage", "Reported_Issues"],
            &[&["Car", "100", "0"], &["Car", "300", "2"]],
        );
        let rows = group_reduce(
            &t,
            &[Field::VehicleModel],
            ValueSource::Derived(Derived::Mtbf),
            Reduction::Mean,
        )
        .unwrap();

        assert_eq!(rows[0].value, 100.0);
    }

    #[test]
    fn test_missing_key_column_is_an_error() {
        let t = table(&["Mileage"], &[&["1"]]);
        let err = group_reduce(&t, &[Field::OwnerType], ValueSource::Rows, Reduction::Count)
            .unwrap_err();

        assert!(matches!(err, EngineError::MissingColumn { .. }));
    }

    #[test]
    fn test_mode_prefers_first_seen_on_ties() {
        let values = [Some("Van"), Some("Car"), None, Some("Car"), Some("Van")];
        assert_eq!(mode(&values), Some("Van"));
        assert_eq!(mode(&[None, None]), None);
        assert_eq!(mode(&[Some("Bus"), Some("Car"), Some("Car")]), Some("Car"));
    }

    #[test]
    fn test_nunique_ignores_missing() {
        assert_eq!(nunique(&[Some("a"), None, Some("b"), Some("a")]), 2);
    }
}
