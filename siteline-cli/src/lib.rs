//! Command-line interface for the Siteline engine.
//!
//! Two subcommands: `check` validates a field-mapping file and lists any
//! missing roles; `sync` runs one synchronization pass over a JSON dataset
//! against a console surface, geocoding over HTTP or from coordinates
//! embedded in the dataset (`--offline`).

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use geo::{Coord, Rect};
use thiserror::Error;

use siteline_core::{
    CircleSpec, FieldMapping, GeocodeCallback, GeocodeFailure, Geocoder, MapSurface, MappingError,
    MarkerSpec, OverlayHandle, RecordTable, ResolveError, Role, SyncEngine, resolve_records,
};
use siteline_data::geocode::{GeocoderBuildError, HttpGeocoder, HttpGeocoderConfig};
use siteline_data::source::{JsonRecordSource, JsonSourceError};

/// Dataset table consulted by `--offline` for known coordinates.
const GEOCODES_TABLE: &str = "geocodes";

/// Run the Siteline CLI with the current process arguments.
///
/// # Errors
///
/// Returns a [`CliError`] for argument, configuration, or data problems;
/// the binary prints it and exits non-zero.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;
    match cli.command {
        Command::Check(args) => {
            run_check(&args)?;
            println!("field mapping is ready");
        }
        Command::Sync(args) => {
            let summary = run_sync(&args)?;
            print_summary(&summary);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(
    name = "siteline",
    about = "Render linked requirement and listing records onto a map surface",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a field-mapping file.
    Check(CheckArgs),
    /// Run one sync pass over a JSON dataset.
    Sync(SyncArgs),
}

/// Arguments for the `check` subcommand.
#[derive(Debug, Clone, Parser)]
struct CheckArgs {
    /// Path to the field-mapping JSON file.
    #[arg(long, value_name = "path")]
    mapping: PathBuf,
}

/// Arguments for the `sync` subcommand.
#[derive(Debug, Clone, Parser)]
struct SyncArgs {
    /// Path to the dataset JSON file.
    #[arg(long, value_name = "path")]
    dataset: PathBuf,
    /// Path to the field-mapping JSON file.
    #[arg(long, value_name = "path")]
    mapping: PathBuf,
    /// Base URL of the geocoding service.
    #[arg(long, value_name = "url", default_value = "https://nominatim.openstreetmap.org")]
    geocoder_url: String,
    /// Geocode from the dataset's embedded coordinates instead of HTTP.
    #[arg(long)]
    offline: bool,
}

fn run_check(args: &CheckArgs) -> Result<(), CliError> {
    let mapping = load_mapping(&args.mapping)?;
    mapping.validate()?;
    Ok(())
}

/// Outcome of one CLI sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    /// Records in both collections.
    pub expected: usize,
    /// Successfully geocoded records.
    pub resolved: usize,
    /// Records whose geocode failed.
    pub failed: usize,
    /// Records with no address.
    pub missing_address: usize,
    /// Markers placed.
    pub markers: usize,
    /// Circles placed.
    pub circles: usize,
    /// Whether the viewport was fitted.
    pub fitted: bool,
}

fn run_sync(args: &SyncArgs) -> Result<SyncSummary, CliError> {
    let mapping = load_mapping(&args.mapping)?;
    mapping.validate()?;
    let source = JsonRecordSource::from_path(&args.dataset)?;
    let sets = resolve_records(&source, &mapping)?;

    let geocoder: Box<dyn Geocoder> = if args.offline {
        Box::new(OfflineGeocoder::from_source(&source)?)
    } else {
        let mut config = HttpGeocoderConfig::new(args.geocoder_url.clone());
        if let Some(key) = mapping.value_of(Role::ApiKey) {
            config = config.with_api_key(key);
        }
        Box::new(HttpGeocoder::with_config(config)?)
    };

    let engine = SyncEngine::new(ConsoleSurface::default());
    let pass = engine.sync(geocoder.as_ref(), &sets);

    let surface = engine.surface();
    let surface = surface.borrow();
    Ok(SyncSummary {
        expected: pass.expected(),
        resolved: pass.resolved(),
        failed: pass.failed(),
        missing_address: pass.missing_address(),
        markers: surface.markers,
        circles: surface.circles,
        fitted: pass.did_fit_bounds(),
    })
}

fn print_summary(summary: &SyncSummary) {
    println!(
        "synced {} records: {} resolved, {} failed, {} without an address",
        summary.expected, summary.resolved, summary.failed, summary.missing_address
    );
    println!(
        "placed {} markers and {} circles; viewport {}",
        summary.markers,
        summary.circles,
        if summary.fitted { "fitted" } else { "unchanged" }
    );
}

fn load_mapping(path: &Path) -> Result<FieldMapping, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadMapping {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}

/// Map surface that narrates placements to stdout.
#[derive(Debug, Default)]
struct ConsoleSurface {
    next_handle: u64,
    markers: usize,
    circles: usize,
}

impl ConsoleSurface {
    fn assign_handle(&mut self) -> OverlayHandle {
        self.next_handle += 1;
        OverlayHandle(self.next_handle)
    }
}

impl MapSurface for ConsoleSurface {
    fn add_marker(&mut self, marker: MarkerSpec) -> OverlayHandle {
        self.markers += 1;
        println!(
            "  {} {:?} at ({:.5}, {:.5})",
            marker.kind, marker.title, marker.position.x, marker.position.y
        );
        self.assign_handle()
    }

    fn add_circle(&mut self, circle: CircleSpec) -> OverlayHandle {
        self.circles += 1;
        println!(
            "  coverage circle r={:.0}m at ({:.5}, {:.5})",
            circle.radius_meters, circle.center.x, circle.center.y
        );
        self.assign_handle()
    }

    fn remove_overlay(&mut self, _handle: OverlayHandle) {}

    fn open_popup(&mut self, _html: &str, _anchor: OverlayHandle) {}

    fn fit_bounds(&mut self, bounds: &Rect<f64>) {
        println!(
            "  viewport fitted to ({:.5}, {:.5})..({:.5}, {:.5})",
            bounds.min().x,
            bounds.min().y,
            bounds.max().x,
            bounds.max().y
        );
    }
}

/// Geocoder backed by the dataset's `geocodes` table.
///
/// Each record needs an `Address` text cell plus `Lat` and `Lng` number
/// cells; addresses not in the table fail with
/// [`GeocodeFailure::NoResults`].
#[derive(Debug, Clone, Default)]
struct OfflineGeocoder {
    positions: HashMap<String, Coord<f64>>,
}

impl OfflineGeocoder {
    fn from_source(source: &JsonRecordSource) -> Result<Self, CliError> {
        let table = siteline_core::RecordSource::table(source, GEOCODES_TABLE)
            .ok_or(CliError::MissingGeocodes)?;
        let mut positions = HashMap::new();
        for id in table.record_ids() {
            let address = table.text_cell(&id, "Address");
            let x = table.number_cell(&id, "Lng");
            let y = table.number_cell(&id, "Lat");
            if let (Some(address), Some(x), Some(y)) = (address, x, y) {
                positions.insert(address, Coord { x, y });
            }
        }
        Ok(Self { positions })
    }
}

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, address: &str, deliver: GeocodeCallback) {
        let outcome = self
            .positions
            .get(address)
            .copied()
            .ok_or(GeocodeFailure::NoResults);
        deliver(outcome);
    }
}

/// Errors emitted by the Siteline CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// The field-mapping file could not be read.
    #[error("failed to read field mapping at {path}: {source}")]
    ReadMapping {
        /// Location of the mapping file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The field-mapping file did not parse.
    #[error("failed to parse field mapping: {0}")]
    ParseMapping(#[from] serde_json::Error),
    /// The field mapping is incomplete.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// Resolving records against the dataset failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The dataset could not be loaded.
    #[error(transparent)]
    Source(#[from] JsonSourceError),
    /// The HTTP geocoder could not be constructed.
    #[error(transparent)]
    Geocoder(#[from] GeocoderBuildError),
    /// `--offline` requires a `geocodes` table in the dataset.
    #[error("dataset has no {GEOCODES_TABLE:?} table; --offline needs one")]
    MissingGeocodes,
}
