use std::path::PathBuf;

/// Census indicator join and precinct overlay CLI (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "arealink", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory holding boundary datasets and bundled tables [env: FILTER_DATA_DIR]
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Join one indicator table to its boundaries and write GeoJSON
    Generate(GenerateArgs),

    /// Join several bundled indicator tables against one boundary load
    Batch(BatchArgs),

    /// Disaggregate zone jobs onto a named precinct (prints JSON)
    Overlay(OverlayArgs),
}

/// Explicit target identifiers shared by `generate` and `batch`.
#[derive(clap::Args, Debug)]
pub struct TargetArgs {
    /// Comma-separated ids to include (defaults to every id in the table)
    #[arg(long, conflicts_with = "ids_file")]
    pub ids: Option<String>,

    /// File with one id per line
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub ids_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Indicator name, e.g. income, "industry specialisation", total_jobs
    pub indicator: String,

    /// Input CSV table
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub table: PathBuf,

    /// Geography scale: sa1, mb or dzn (defaults to the indicator's)
    #[arg(short, long)]
    pub scale: Option<String>,

    /// Boundary dataset (.shp or .geojson), resolved from the data directory by default
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub boundary: Option<PathBuf>,

    /// Output directory [env: FILTER_OUT_DIR]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(clap::Args, Debug)]
pub struct BatchArgs {
    /// Comma-separated indicators, or "all" for every bundled table
    #[arg(long, default_value = "all")]
    pub dataset: String,

    /// Geography scale of the bundled tables
    #[arg(short, long, default_value = "sa1")]
    pub scale: String,

    /// Boundary dataset (.shp or .geojson), resolved from the data directory by default
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub boundary: Option<PathBuf>,

    /// Output directory [env: FILTER_OUT_DIR]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub targets: TargetArgs,
}

#[derive(clap::Args, Debug)]
pub struct OverlayArgs {
    /// Precinct name, matched exactly against the `name` property
    pub precinct: String,

    /// Census year: 2011, 2016 or 2021
    #[arg(short, long, default_value_t = 2011)]
    pub year: u16,

    /// Directory holding the precinct and zone GeoJSON [env: FILTER_OVERLAY_DIR]
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub overlay_dir: Option<PathBuf>,

    /// Target EPSG code in which areas are measured
    #[arg(long, default_value_t = 3857)]
    pub epsg: u32,

    /// Intersect zones on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Stop scanning zones after this many milliseconds
    #[arg(long)]
    pub budget_ms: Option<u64>,
}
