use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;

use tabula_core::columns::{builtin_columns_for, ColumnSpec, EntityKind, COL_ACTIONS};
use tabula_core::{FieldValue, ValueType};
use tabula_ops::{CrudOrchestrator, PopupState};
use tabula_view::{cell_value, DerivedView, SortDirection, SortKey, ViewState};

mod seed;

#[derive(Parser, Debug)]
#[command(name = "tabulactl", version, about = "Tabula table-engine CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List rows of an entity table through the view pipeline
    Ls {
        /// Entity table, e.g. "asset" or "swap-profile"
        entity: String,
        /// Column filter, `column=value` (repeatable, AND semantics)
        #[arg(long = "filter")]
        filter: Vec<String>,
        /// Global search text
        #[arg(long = "search")]
        search: Option<String>,
        /// Sort key, `column` or `column:desc` (repeatable)
        #[arg(long = "sort")]
        sort: Vec<String>,
        /// Page index (0-based)
        #[arg(long = "page", default_value_t = 0)]
        page: usize,
        /// Rows per page
        #[arg(long = "page-size", default_value_t = tabula_view::DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Hide a column (repeatable)
        #[arg(long = "hide")]
        hide: Vec<String>,
        /// Print row counts after each pipeline stage
        #[arg(long = "explain", action = ArgAction::SetTrue)]
        explain: bool,
    },
    /// Create a record through the crud flow and print the result
    Add {
        /// Entity table
        entity: String,
        /// Field assignment, `field=value` (repeatable)
        #[arg(long = "set")]
        set: Vec<String>,
    },
    /// Delete a record by id (confirmation is implied)
    Rm {
        /// Entity table
        entity: String,
        /// Record id
        id: String,
    },
    /// Show the column set and editable field rules of an entity
    Schema {
        /// Entity table
        entity: String,
    },
}

fn init_tracing() {
    let env = std::env::var("TABULA_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn parse_entity(name: &str) -> Result<EntityKind> {
    EntityKind::parse(name).ok_or_else(|| {
        let known: Vec<&str> = EntityKind::ALL.iter().map(|k| k.as_str()).collect();
        anyhow!("unknown entity {:?}; expected one of: {}", name, known.join(", "))
    })
}

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .ok_or_else(|| anyhow!("expected `name=value`, got {:?}", raw))
}

/// Parse a raw CLI value into the typed form a column or field expects.
fn parse_value(value_type: ValueType, raw: &str) -> Result<FieldValue> {
    Ok(match value_type {
        ValueType::Text => FieldValue::Text(raw.to_string()),
        ValueType::Enum => FieldValue::Enum(raw.to_string()),
        ValueType::Number => FieldValue::Number(
            raw.parse::<f64>().map_err(|_| anyhow!("{:?} is not a number", raw))?,
        ),
        ValueType::Bool => FieldValue::Bool(
            raw.parse::<bool>().map_err(|_| anyhow!("{:?} is not true/false", raw))?,
        ),
        ValueType::Date => {
            // accept a calendar date or raw epoch seconds
            if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                let ts = d
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc().timestamp())
                    .unwrap_or(0);
                FieldValue::Date(ts)
            } else {
                FieldValue::Date(
                    raw.parse::<i64>()
                        .map_err(|_| anyhow!("{:?} is not a date (YYYY-MM-DD or epoch)", raw))?,
                )
            }
        }
    })
}

fn parse_sort_key(raw: &str) -> Result<SortKey> {
    let (column, direction) = match raw.split_once(':') {
        None => (raw, SortDirection::Asc),
        Some((c, "asc")) => (c, SortDirection::Asc),
        Some((c, "desc")) => (c, SortDirection::Desc),
        Some((_, other)) => bail!("unknown sort direction {:?}; expected asc or desc", other),
    };
    Ok(SortKey { column: column.to_string(), direction })
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Ls { entity, filter, search, sort, page, page_size, hide, explain } => {
            let kind = parse_entity(&entity)?;
            cmd_ls(cli.output, kind, filter, search, sort, page, page_size, hide, explain)
        }
        Commands::Add { entity, set } => {
            let kind = parse_entity(&entity)?;
            cmd_add(cli.output, kind, set)
        }
        Commands::Rm { entity, id } => {
            let kind = parse_entity(&entity)?;
            cmd_rm(cli.output, kind, &id)
        }
        Commands::Schema { entity } => {
            let kind = parse_entity(&entity)?;
            cmd_schema(cli.output, kind)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_ls(
    output: Output,
    kind: EntityKind,
    filters: Vec<String>,
    search: Option<String>,
    sort: Vec<String>,
    page: usize,
    page_size: usize,
    hide: Vec<String>,
    explain: bool,
) -> Result<()> {
    let store = seed::seed_store(kind);
    let snap = store.freeze();
    let columns = builtin_columns_for(kind);
    let mut view = ViewState::new(columns.clone());

    for raw in filters {
        let (column, value) = split_assignment(&raw)?;
        let spec = columns
            .iter()
            .find(|c| c.id == column)
            .ok_or_else(|| anyhow!("unknown column {:?} for {}", column, kind.as_str()))?;
        view.set_column_filter(column, parse_value(spec.value_type, value)?);
    }
    if let Some(text) = search {
        view.set_search_text(text);
    }
    if !sort.is_empty() {
        let keys = sort.iter().map(|s| parse_sort_key(s)).collect::<Result<Vec<_>>>()?;
        view.set_sort(keys);
    }
    for column in hide {
        view.visibility_mut().set_visible(&column, false);
    }
    view.set_page_size(page_size);
    view.set_page(page);

    let dv = view.compute_view(&snap);
    info!(
        entity = kind.as_str(),
        rows = dv.rows.len(),
        total = dv.total_filtered,
        "view computed"
    );

    match output {
        Output::Human => {
            let visible: Vec<&ColumnSpec> = view
                .visible_columns()
                .into_iter()
                .filter(|c| c.id != COL_ACTIONS)
                .collect();
            print_table(&visible, &dv);
            if explain {
                println!(
                    "stages: total {} → filters {} → search {}",
                    dv.debug.total, dv.debug.after_filters, dv.debug.after_search
                );
            }
            println!(
                "page {}/{} • {} matching row(s)",
                dv.page_index + 1,
                dv.page_count.max(1),
                dv.total_filtered
            );
        }
        Output::Json => {
            let mut doc = serde_json::json!({
                "rows": dv.rows,
                "total_filtered": dv.total_filtered,
                "page_index": dv.page_index,
                "page_count": dv.page_count,
            });
            if explain {
                doc["stages"] = serde_json::to_value(dv.debug)?;
            }
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }
    Ok(())
}

fn print_table(columns: &[&ColumnSpec], dv: &DerivedView) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.label.len()).collect();
    let cells: Vec<Vec<String>> = dv
        .rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let v = cell_value(r, c).unwrap_or_default();
                    widths[i] = widths[i].max(v.len());
                    v
                })
                .collect()
        })
        .collect();

    let header: Vec<String> =
        columns.iter().enumerate().map(|(i, c)| format!("{:w$}", c.label, w = widths[i])).collect();
    println!("{}", header.join("  "));
    for row in cells {
        let line: Vec<String> =
            row.iter().enumerate().map(|(i, v)| format!("{:w$}", v, w = widths[i])).collect();
        println!("{}", line.join("  "));
    }
}

fn cmd_add(output: Output, kind: EntityKind, set: Vec<String>) -> Result<()> {
    let mut store = seed::seed_store(kind);
    let mut orch = CrudOrchestrator::new(kind);

    orch.open_create();
    for raw in set {
        let (field, value) = split_assignment(&raw)?;
        let spec = tabula_schema::field_spec(kind, field)
            .ok_or_else(|| anyhow!("unknown field {:?} for {}", field, kind.as_str()))?;
        orch.update_field(field, parse_value(spec.value_type, value)?);
    }

    match orch.submit() {
        Some(mutation) => {
            store.apply(mutation);
            store.publish();
            let snap = store.freeze();
            let created = snap.records.last().ok_or_else(|| anyhow!("store empty after create"))?;
            match output {
                Output::Human => {
                    if let Some(n) = orch.notifications.latest() {
                        println!("{} (id {})", n.message, created.id);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(created)?),
            }
            Ok(())
        }
        None => {
            let errors = match orch.state() {
                PopupState::Editing(buffer) => buffer.errors().clone(),
                _ => Default::default(),
            };
            for (field, message) in errors.iter() {
                eprintln!("{}: {}", field, message);
            }
            bail!("validation failed for {}", kind.as_str())
        }
    }
}

fn cmd_rm(output: Output, kind: EntityKind, id: &str) -> Result<()> {
    let mut store = seed::seed_store(kind);
    let mut orch = CrudOrchestrator::new(kind);

    match store.get(id).cloned() {
        Some(record) => {
            orch.request_delete(record);
            if let Some(mutation) = orch.confirm_delete() {
                store.apply(mutation);
                store.publish();
            }
        }
        // absent target: benign no-op, mirrors the store contract
        None => info!(id, "no such record; nothing to delete"),
    }

    match output {
        Output::Human => println!("{} record(s) remain", store.len()),
        Output::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "deleted": store.get(id).is_none(),
                    "remaining": store.len(),
                }))?
            )
        }
    }
    Ok(())
}

fn cmd_schema(output: Output, kind: EntityKind) -> Result<()> {
    let columns = builtin_columns_for(kind);
    let fields = tabula_schema::field_specs_for(kind);

    match output {
        Output::Human => {
            println!("columns:");
            for c in &columns {
                let mut flags = Vec::new();
                if c.sortable {
                    flags.push("sortable");
                }
                if c.filterable {
                    flags.push("filterable");
                }
                if c.hideable {
                    flags.push("hideable");
                }
                println!("  {} ({:?}) {}", c.id, c.value_type, flags.join(", "));
            }
            println!("fields:");
            for f in fields {
                let mut rules = Vec::new();
                if f.required {
                    rules.push("required".to_string());
                }
                if let (Some(min), Some(max)) = (f.min, f.max) {
                    rules.push(format!("range {}..={}", min, max));
                }
                if !f.choices.is_empty() {
                    rules.push(format!("one of {}", f.choices.join("|")));
                }
                println!("  {} ({:?}) {}", f.name, f.value_type, rules.join(", "));
            }
        }
        Output::Json => {
            let columns: Vec<_> = columns
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "id": c.id,
                        "label": c.label,
                        "type": format!("{:?}", c.value_type),
                        "sortable": c.sortable,
                        "filterable": c.filterable,
                        "hideable": c.hideable,
                    })
                })
                .collect();
            let fields: Vec<_> = fields
                .iter()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "type": format!("{:?}", f.value_type),
                        "required": f.required,
                        "min": f.min,
                        "max": f.max,
                        "choices": f.choices,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "entity": kind.as_str(),
                    "columns": columns,
                    "fields": fields,
                }))?
            );
        }
    }
    Ok(())
}
