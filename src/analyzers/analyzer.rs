use crate::analyzers::aggregate::group_reduce;
use crate::analyzers::normalize::normalize;
use crate::analyzers::rank::{order_rows, truncate};
use crate::analyzers::recipes::{Recipe, recipes_for};
use crate::analyzers::types::{
    Category, CategoryFilter, Dashboard, DisplayMode, Section, SummaryTable,
};
use crate::dataset::Table;
use crate::error::EngineError;
use crate::stats::compute_kpis;
use tracing::{debug, info, warn};

/// Runs one recipe: group, reduce, order, truncate, then normalize when the
/// display mode asks for percentages.
///
/// The cut is taken on the grouped rows before display ordering, so ties at
/// the boundary go to the group seen first in the table. Ordering only
/// permutes, so the kept rows are the same either way round.
pub fn run_recipe(
    table: &Table,
    recipe: &Recipe,
    mode: DisplayMode,
) -> Result<SummaryTable, EngineError> {
    let mut rows = group_reduce(table, recipe.keys, recipe.value, recipe.reduction)?;
    if let Some(top) = recipe.top_n {
        rows = truncate(rows, top);
    }
    order_rows(&mut rows, recipe.order);
    if mode == DisplayMode::Percentage {
        normalize(&mut rows);
    }

    let suffix = match mode {
        DisplayMode::Count => "Count",
        DisplayMode::Percentage => "%",
    };
    Ok(SummaryTable {
        id: recipe.id,
        title: format!("{} ({})", recipe.title, suffix),
        kind: mode.chart_kind(),
        key_columns: recipe.keys.iter().map(|k| k.name()).collect(),
        value_column: recipe.value_column,
        rows,
    })
}

/// Renders one category. A missing required column disables the section.
pub fn render_section(table: &Table, category: Category, mode: DisplayMode) -> Section {
    let recipes = recipes_for(category);

    let missing: Vec<&str> = recipes
        .iter()
        .flat_map(|r| r.required_fields())
        .filter(|f| !table.has(*f))
        .map(|f| f.name())
        .fold(Vec::new(), |mut acc, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        });

    if !missing.is_empty() {
        let reason = EngineError::MissingColumn {
            column: missing.join(", "),
        }
        .to_string();
        warn!(category = %category, %reason, "Section disabled");
        return Section {
            category,
            title: category.title(),
            kpis: Vec::new(),
            charts: Vec::new(),
            disabled: Some(reason),
        };
    }

    let kpis = compute_kpis(table, category);
    let mut charts = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        match run_recipe(table, recipe, mode) {
            Ok(chart) => {
                debug!(chart = recipe.id, rows = chart.rows.len(), "Chart computed");
                charts.push(chart);
            }
            Err(e) => {
                // Columns were checked above; anything else keeps the rest of the section.
                warn!(chart = recipe.id, error = %e, "Chart skipped");
            }
        }
    }

    Section {
        category,
        title: category.title(),
        kpis,
        charts,
        disabled: None,
    }
}

/// Renders every section selected by `filter` in `mode`.
#[tracing::instrument(skip(table), fields(rows = table.len()))]
pub fn render(table: &Table, filter: CategoryFilter, mode: DisplayMode) -> Dashboard {
    let sections: Vec<Section> = filter
        .categories()
        .into_iter()
        .map(|c| render_section(table, c, mode))
        .collect();

    info!(
        sections = sections.len(),
        charts = sections.iter().map(|s| s.charts.len()).sum::<usize>(),
        "Dashboard rendered"
    );

    Dashboard {
        filter: filter.to_string(),
        mode: mode.to_string(),
        total_rows: table.len(),
        sections,
    }
}

/// Like [`render`], but takes the raw UI selections. Anything unrecognized
/// renders nothing rather than failing.
pub fn render_selection(table: &Table, category: &str, mode: &str) -> Dashboard {
    let filter = category.parse::<CategoryFilter>();
    let mode_parsed = mode.parse::<DisplayMode>();

    match (filter, mode_parsed) {
        (Ok(filter), Ok(mode)) => render(table, filter, mode),
        (filter, mode_parsed) => {
            for e in [filter.err(), mode_parsed.err()].into_iter().flatten() {
                warn!(error = %e, "Selection ignored");
            }
            Dashboard {
                filter: category.to_string(),
                mode: mode.to_string(),
                total_rows: table.len(),
                sections: Vec::new(),
            }
        }
    }
}
