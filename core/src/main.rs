//! Penguinboard CLI - compute the dashboard's chart structures from a CSV
//!
//! # Main Commands
//!
//! ```bash
//! penguinboard render                      # Every chart for the current selection
//! penguinboard render --selection sel.json # Same, from a saved selection snapshot
//! penguinboard selection                   # Print the opening selection as JSON
//! ```
//!
//! # Single Charts
//!
//! ```bash
//! penguinboard flow --dims island,species,diet --sex female
//! penguinboard matrix --fields body_mass_g,bill_depth_mm --group-by diet
//! penguinboard crosstab --pivot diet
//! penguinboard scatter
//! penguinboard parse input.csv             # Just parse CSV to JSON
//! ```
//!
//! Without an input file, the path comes from `PENGUINBOARD_DATA` (a `.env`
//! file is read if present).

use clap::{Args, Parser, Subcommand};
use penguinboard::aggregate::pipeline::flow_panel;
use penguinboard::config::parse_delimiter;
use penguinboard::logs::{log_error, DASHBOARD_LOG};
use penguinboard::{
    build_aggregate_matrix, build_scatter_matrix, parse_csv_file, render_dashboard, reshape,
    CategoricalField, CategoricalFilters, DashboardConfig, DashboardView, FlowPanel, NumericField,
    ParseResult, ProportionTable, SelectionState,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "penguinboard")]
#[command(about = "Aggregate penguin observations into dashboard chart data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the observations come from
#[derive(Args)]
struct Source {
    /// Input CSV file (default: $PENGUINBOARD_DATA)
    input: Option<PathBuf>,

    /// CSV delimiter, `tab` for tabs (auto-detect if not specified)
    #[arg(short, long, value_parser = parse_delimiter)]
    delimiter: Option<char>,
}

/// Value filters for the flow diagram (default: every value)
#[derive(Args)]
struct FilterArgs {
    /// Allowed species, comma separated
    #[arg(long, value_delimiter = ',')]
    species: Option<Vec<String>>,

    /// Allowed sexes, comma separated
    #[arg(long, value_delimiter = ',')]
    sex: Option<Vec<String>>,

    /// Allowed years, comma separated
    #[arg(long, value_delimiter = ',')]
    year: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output the records as JSON
    Parse {
        #[command(flatten)]
        source: Source,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the flow diagram graph
    Flow {
        #[command(flatten)]
        source: Source,

        /// Ordered dimensions, comma separated (2 or 3)
        #[arg(long, value_delimiter = ',', default_value = "island,species,diet")]
        dims: Vec<CategoricalField>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the grouped-mean heatmap matrix
    Matrix {
        #[command(flatten)]
        source: Source,

        /// Measurements, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<NumericField>>,

        /// Grouping field for the rows
        #[arg(short, long, default_value = "species")]
        group_by: CategoricalField,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reshape the species x diet proportions for the grouped bar chart
    Crosstab {
        /// Outer bar grouping (species or diet)
        #[arg(short, long, default_value = "species")]
        pivot: CategoricalField,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the pairwise scatter matrix
    Scatter {
        #[command(flatten)]
        source: Source,

        /// Measurements, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<NumericField>>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compute every chart for one selection snapshot
    Render {
        #[command(flatten)]
        source: Source,

        /// Selection snapshot JSON (default: $PENGUINBOARD_SELECTION or the opening selection)
        #[arg(short, long)]
        selection: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the opening selection for a dataset
    Selection {
        #[command(flatten)]
        source: Source,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { source, output } => cmd_parse(&source, output.as_deref()),

        Commands::Flow {
            source,
            dims,
            filters,
            output,
        } => cmd_flow(&source, dims, &filters, output.as_deref()),

        Commands::Matrix {
            source,
            fields,
            group_by,
            output,
        } => cmd_matrix(&source, fields, group_by, output.as_deref()),

        Commands::Crosstab { pivot, output } => cmd_crosstab(pivot, output.as_deref()),

        Commands::Scatter {
            source,
            fields,
            output,
        } => cmd_scatter(&source, fields, output.as_deref()),

        Commands::Render {
            source,
            selection,
            output,
        } => cmd_render(&source, selection.as_deref(), output.as_deref()),

        Commands::Selection { source, output } => cmd_selection(&source, output.as_deref()),
    };

    if let Err(e) = result {
        log_error(format!("Error: {}", e));
        std::process::exit(1);
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Resolve configuration from the environment and CLI, then load the CSV.
fn load(source: &Source, selection: Option<&Path>) -> Result<(DashboardConfig, ParseResult), Box<dyn std::error::Error>> {
    let config = DashboardConfig::from_env()?.with_overrides(
        source.input.as_deref(),
        source.delimiter,
        selection,
    );

    eprintln!("📄 Loading: {}", config.data_path.display());
    let result = parse_csv_file(&config.data_path, config.delimiter)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if config.delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Records: {}", result.records.len());

    Ok((config, result))
}

fn cmd_parse(source: &Source, output: Option<&Path>) -> CmdResult {
    let (_, result) = load(source, None)?;
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_flow(
    source: &Source,
    dims: Vec<CategoricalField>,
    filters: &FilterArgs,
    output: Option<&Path>,
) -> CmdResult {
    let (_, result) = load(source, None)?;
    let store = result.records;

    let mut allowed = CategoricalFilters::allow_all(&store);
    for (field, values) in [
        (CategoricalField::Species, &filters.species),
        (CategoricalField::Sex, &filters.sex),
        (CategoricalField::Year, &filters.year),
    ] {
        if let Some(values) = values {
            allowed = allowed.with_allowed(field, values.iter().cloned());
        }
    }

    let selection = SelectionState::defaults_for(&store)
        .with_flow_dimensions(dims)
        .with_filters(allowed);

    let panel = flow_panel(&store, &selection);
    if let FlowPanel::Notice { message } = &panel {
        eprintln!("⚠️  {}", message);
    }

    let json = serde_json::to_string_pretty(&panel)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_matrix(
    source: &Source,
    fields: Option<Vec<NumericField>>,
    group_by: CategoricalField,
    output: Option<&Path>,
) -> CmdResult {
    let (_, result) = load(source, None)?;
    let selection = SelectionState::defaults_for(&result.records)
        .with_numeric_fields(fields.unwrap_or_else(|| NumericField::ALL.to_vec()))
        .with_grouping_field(group_by);

    let matrix = build_aggregate_matrix(
        result.records.records(),
        &selection.active_numeric_fields,
        selection.grouping_field,
    );
    eprintln!(
        "📊 {} groups × {} fields by {}",
        matrix.groups.len(),
        matrix.fields.len(),
        matrix.grouping_field
    );

    let json = serde_json::to_string_pretty(&matrix)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_crosstab(pivot: CategoricalField, output: Option<&Path>) -> CmdResult {
    let series = reshape(&ProportionTable::species_diet(), pivot)?;
    eprintln!(
        "📊 {} groups of {} bars by {}",
        series.groups.len(),
        series.sub_groups.len(),
        series.pivot
    );

    let json = serde_json::to_string_pretty(&series)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_scatter(source: &Source, fields: Option<Vec<NumericField>>, output: Option<&Path>) -> CmdResult {
    let (_, result) = load(source, None)?;
    let fields = fields.unwrap_or_else(|| NumericField::ALL.to_vec());

    let matrix = build_scatter_matrix(result.records.records(), &fields);
    eprintln!("📊 {} panels, {} species", matrix.panels.len(), matrix.species.len());

    let json = serde_json::to_string_pretty(&matrix)?;
    write_output(&json, output)?;

    Ok(())
}

/// Rendered view plus the warnings raised while building it.
#[derive(Serialize)]
struct RenderOutput {
    #[serde(flatten)]
    view: DashboardView,
    notices: Vec<String>,
}

fn cmd_render(source: &Source, selection: Option<&Path>, output: Option<&Path>) -> CmdResult {
    let (config, result) = load(source, selection)?;
    if let Some(path) = &config.selection_path {
        eprintln!("   Selection: {}", path.display());
    }

    let selection = config.selection(&result.records)?;
    let mut collector = DASHBOARD_LOG.collector();
    let view = render_dashboard(&result.records, &selection)?;
    let rendered = RenderOutput {
        view,
        notices: collector.drain(),
    };

    let json = serde_json::to_string_pretty(&rendered)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_selection(source: &Source, output: Option<&Path>) -> CmdResult {
    let (_, result) = load(source, None)?;
    let selection = SelectionState::defaults_for(&result.records);
    write_output(&selection.to_json()?, output)?;
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> CmdResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
