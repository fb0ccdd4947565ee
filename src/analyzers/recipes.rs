//! The chart registry: which summary tables each category renders, and how.

use crate::analyzers::aggregate::{Reduction, ValueSource};
use crate::analyzers::rank::{RowOrder, TopN};
use crate::analyzers::types::Category;
use crate::dataset::{Derived, Field};

/// Every "top" chart keeps this many groups.
pub const TOP_N: usize = 10;

/// A strongly typed description of one chart's aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub id: &'static str,
    pub title: &'static str,
    pub keys: &'static [Field],
    pub value: ValueSource,
    pub reduction: Reduction,
    /// Output column name for the reduced value.
    pub value_column: &'static str,
    pub order: RowOrder,
    /// Applied before normalization, so percentages are shares of what is kept.
    pub top_n: Option<TopN>,
}

impl Recipe {
    /// Columns that must be present for this recipe to run.
    pub fn required_fields(&self) -> Vec<Field> {
        let mut fields = self.keys.to_vec();
        for f in self.value.inputs() {
            if !fields.contains(&f) {
                fields.push(f);
            }
        }
        fields
    }
}

const fn distribution(id: &'static str, title: &'static str, keys: &'static [Field]) -> Recipe {
    Recipe {
        id,
        title,
        keys,
        value: ValueSource::Rows,
        reduction: Reduction::Count,
        value_column: "Count",
        order: RowOrder::ValueDescending,
        top_n: None,
    }
}

const fn average(
    id: &'static str,
    title: &'static str,
    keys: &'static [Field],
    field: Field,
) -> Recipe {
    Recipe {
        id,
        title,
        keys,
        value: ValueSource::Field(field),
        reduction: Reduction::Mean,
        value_column: field.name(),
        order: RowOrder::KeyAscending,
        top_n: None,
    }
}

const MAINTENANCE_FREQUENCY: Recipe = Recipe {
    value_column: "Maintenance_Count",
    top_n: Some(TopN::Rows(TOP_N)),
    ..distribution(
        "maintenance_frequency",
        "Maintenance Frequency by Vehicle Model",
        &[Field::VehicleModel],
    )
};

static VEHICLE: &[Recipe] = &[
    distribution("owner_type", "Owner Type Distribution", &[Field::OwnerType]),
    distribution("fuel_type", "Fuel Type Distribution", &[Field::FuelType]),
    distribution(
        "transmission_type",
        "Transmission Type Distribution",
        &[Field::TransmissionType],
    ),
    Recipe {
        top_n: Some(TopN::Rows(TOP_N)),
        ..distribution("top_models", "Vehicle Models by Count", &[Field::VehicleModel])
    },
];

static MAINTENANCE: &[Recipe] = &[
    distribution(
        "maintenance_by_fuel_type",
        "Maintenance History by Fuel Type",
        &[Field::FuelType],
    ),
    distribution(
        "need_maintenance",
        "Need Maintenance (Yes/No)",
        &[Field::NeedMaintenance],
    ),
    distribution("tire_condition", "Tire Condition", &[Field::TireCondition]),
    distribution("brake_condition", "Brake Condition", &[Field::BrakeCondition]),
    distribution("battery_status", "Battery Status", &[Field::BatteryStatus]),
];

static FUEL_ENGINE: &[Recipe] = &[
    average(
        "efficiency_by_tire",
        "Fuel Efficiency by Tire Condition",
        &[Field::TireCondition],
        Field::FuelEfficiency,
    ),
    average(
        "efficiency_by_fuel_transmission",
        "Fuel Type vs Transmission Type",
        &[Field::FuelType, Field::TransmissionType],
        Field::FuelEfficiency,
    ),
    average(
        "efficiency_by_engine_size",
        "Fuel Efficiency by Engine Size",
        &[Field::EngineSize],
        Field::FuelEfficiency,
    ),
    average(
        "premium_by_fuel_type",
        "Average Insurance Premium by Fuel Type",
        &[Field::FuelType],
        Field::InsurancePremium,
    ),
];

static ISSUE_RISK: &[Recipe] = &[
    average(
        "premium_by_issue_count",
        "Average Insurance Premium by Reported Issue Count",
        &[Field::ReportedIssues],
        Field::InsurancePremium,
    ),
    Recipe {
        reduction: Reduction::Sum,
        ..average(
            "issues_by_model",
            "Reported Issue Count by Vehicle Model",
            &[Field::VehicleModel],
            Field::ReportedIssues,
        )
    },
    average(
        "accidents_by_age",
        "Accident History vs Vehicle Age",
        &[Field::VehicleAge],
        Field::AccidentHistory,
    ),
    distribution(
        "engine_size_distribution",
        "Engine Size Distribution",
        &[Field::EngineSize],
    ),
];

static DESCRIPTIVE: &[Recipe] = &[
    Recipe {
        reduction: Reduction::Sum,
        order: RowOrder::ValueDescending,
        top_n: Some(TopN::Rows(TOP_N)),
        ..average(
            "mileage_by_model_owner",
            "Mileage Consumption by Vehicle Model and Owner Type",
            &[Field::VehicleModel, Field::OwnerType],
            Field::Mileage,
        )
    },
    MAINTENANCE_FREQUENCY,
    Recipe {
        order: RowOrder::ValueDescending,
        top_n: Some(TopN::Rows(TOP_N)),
        ..average(
            "accident_prone_models",
            "Accident-Prone Vehicle Identification",
            &[Field::VehicleModel],
            Field::AccidentHistory,
        )
    },
    Recipe {
        value_column: "Maintenance_Count",
        order: RowOrder::KeyAscending,
        ..distribution(
            "maintenance_by_age",
            "Vehicle Age vs Maintenance Count",
            &[Field::VehicleAge],
        )
    },
    Recipe {
        value_column: "Issue_Count",
        order: RowOrder::KeyAscending,
        top_n: Some(TopN::Parent(TOP_N)),
        ..distribution(
            "issue_pattern",
            "Issue Pattern Detection by Vehicle Model",
            &[Field::VehicleModel, Field::ReportedIssues],
        )
    },
    distribution("part_tire", "Tire Condition", &[Field::TireCondition]),
    distribution("part_brake", "Brake Condition", &[Field::BrakeCondition]),
    distribution("part_battery", "Battery Status", &[Field::BatteryStatus]),
];

static DIAGNOSTIC: &[Recipe] = &[
    average(
        "premium_by_maintenance_history",
        "Avg Insurance Premium by Maintenance History",
        &[Field::MaintenanceHistory],
        Field::InsurancePremium,
    ),
    distribution(
        "reported_issues_distribution",
        "Reported Issues Count",
        &[Field::ReportedIssues],
    ),
    average(
        "avg_mileage_by_model_owner",
        "Mileage by Vehicle Model & Owner Type",
        &[Field::VehicleModel, Field::OwnerType],
        Field::Mileage,
    ),
    MAINTENANCE_FREQUENCY,
    Recipe {
        id: "mtbf_by_model",
        title: "Mean Time Between Failures by Vehicle Model",
        keys: &[Field::VehicleModel],
        value: ValueSource::Derived(Derived::Mtbf),
        reduction: Reduction::Mean,
        value_column: Derived::Mtbf.name(),
        order: RowOrder::ValueDescending,
        top_n: Some(TopN::Rows(TOP_N)),
    },
    average(
        "fuel_inefficiency_triggers",
        "Fuel Inefficiency Triggers",
        &[Field::TireCondition, Field::EngineSize],
        Field::FuelEfficiency,
    ),
];

/// Charts of `category`, in display order.
pub fn recipes_for(category: Category) -> &'static [Recipe] {
    match category {
        Category::Vehicle => VEHICLE,
        Category::Maintenance => MAINTENANCE,
        Category::FuelEngine => FUEL_ENGINE,
        Category::IssueRisk => ISSUE_RISK,
        Category::Descriptive => DESCRIPTIVE,
        Category::Diagnostic => DIAGNOSTIC,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_recipes() {
        for category in Category::ALL {
            assert!(!recipes_for(category).is_empty(), "{category} is empty");
        }
    }

    #[test]
    fn test_recipe_ids_unique_within_category() {
        for category in Category::ALL {
            let recipes = recipes_for(category);
            for (i, r) in recipes.iter().enumerate() {
                assert!(
                    recipes[i + 1..].iter().all(|o| o.id != r.id),
                    "duplicate {} in {category}",
                    r.id
                );
            }
        }
    }

    #[test]
    fn test_top_n_is_ten_throughout() {
        for category in Category::ALL {
            for r in recipes_for(category) {
                if let Some(TopN::Rows(n) | TopN::Parent(n)) = r.top_n {
                    assert_eq!(n, TOP_N);
                }
            }
        }
    }

    #[test]
    fn test_required_fields_include_derived_inputs() {
        let mtbf = recipes_for(Category::Diagnostic)
            .iter()
            .find(|r| r.id == "mtbf_by_model")
            .unwrap();

        assert_eq!(
            mtbf.required_fields(),
            vec![Field::VehicleModel, Field::Mileage, Field::ReportedIssues]
        );
    }
}
