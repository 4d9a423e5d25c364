//! Command-line front end for the wildfire risk core.
//! JSON results go to stdout, logs to stderr.

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ember_core::region::RegionResolver;
use ember_core::request::{AreaRequest, PointRequest};
use ember_core::{Bounds, Coordinate, EmberConfig, Request, RiskService};

#[derive(Parser, Debug)]
#[command(name = "ember", about = "Wildfire risk prediction", version)]
struct Args {
    /// JSON config file; flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact path.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Seed for synthetic-feature noise (reproducible output).
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Risk prediction for one point.
    Predict {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// ISO-8601 date; defaults to today (UTC).
        #[arg(long)]
        date: Option<String>,
        /// JSON object of external feature values, e.g. {"red": 0.3, "nir": 0.6}.
        #[arg(long)]
        features: Option<PathBuf>,
    },
    /// 20×20 risk map over a bounding box.
    Map {
        #[arg(long, allow_hyphen_values = true)]
        north: f64,
        #[arg(long, allow_hyphen_values = true)]
        south: f64,
        #[arg(long, allow_hyphen_values = true)]
        east: f64,
        #[arg(long, allow_hyphen_values = true)]
        west: f64,
        #[arg(long)]
        date: Option<String>,
    },
    /// Predictions for a JSON array of {latitude, longitude}.
    Batch {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        date: Option<String>,
    },
    /// Region name for a coordinate.
    Region {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Read one JSON request from stdin.
    Request,
    /// Report how the model was resolved.
    ModelStatus,
}

#[derive(Serialize)]
struct RegionOutput {
    latitude: f64,
    longitude: f64,
    region: &'static str,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = load_config(&args)?;
    debug!(?config, "configuration loaded");

    match args.command {
        Command::Region { lat, lng } => {
            let region = RegionResolver::default().resolve(lat, lng);
            emit(&RegionOutput { latitude: lat, longitude: lng, region })
        }
        Command::Predict { lat, lng, date, features } => {
            let request = point_request(lat, lng, date, features.as_deref())?;
            let service = RiskService::new(&config);
            emit(&service.handle(request))
        }
        Command::Map { north, south, east, west, date } => {
            let service = RiskService::new(&config);
            emit(&service.handle(area_request(north, south, east, west, date)))
        }
        Command::Batch { input, date } => {
            let text = fs::read_to_string(&input)
                .with_context(|| format!("cannot read {}", input.display()))?;
            let coords: Vec<Coordinate> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array of coordinates", input.display()))?;
            let service = RiskService::new(&config);
            emit(&service.handle_batch(&coords, date.as_deref()))
        }
        Command::Request => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("cannot read request from stdin")?;
            let request: Request = serde_json::from_str(&text).context("malformed request")?;
            let service = RiskService::new(&config);
            emit(&service.handle(request))
        }
        Command::ModelStatus => {
            let service = RiskService::new(&config);
            emit(&service.model_status())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "ember=debug,ember_core=debug" } else { "ember=info,ember_core=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(args: &Args) -> Result<EmberConfig> {
    let mut config = match &args.config {
        Some(path) => EmberConfig::from_file(path)
            .with_context(|| format!("cannot load config {}", path.display()))?,
        None => EmberConfig::default(),
    };
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    Ok(config)
}

// Flag subcommands go through the same entry point as `ember request`, so bad
// coordinates, bounds or dates come back as an error prediction.

fn point_request(lat: f64, lng: f64, date: Option<String>, features: Option<&Path>) -> Result<Request> {
    let features = features.map(read_features).transpose()?;
    Ok(Request::Point(PointRequest { latitude: lat, longitude: lng, features, date }))
}

fn area_request(north: f64, south: f64, east: f64, west: f64, date: Option<String>) -> Request {
    Request::Area(AreaRequest { bounds: Bounds::new(north, south, east, west), date })
}

fn read_features(path: &Path) -> Result<HashMap<String, f64>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON object of numbers", path.display()))
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::features::noise::NoisePolicy;
    use ember_core::model::ModelState;
    use ember_core::{Provenance, Response};

    fn service() -> RiskService {
        RiskService::with_model(ModelState::Fallback, NoisePolicy::Zero)
    }

    fn command(argv: &[&str]) -> Command {
        Args::try_parse_from(argv).unwrap().command
    }

    fn is_error_fallback(resp: &Response) -> bool {
        matches!(resp, Response::Prediction(p) if p.provenance == Provenance::ErrorFallback)
    }

    #[test]
    fn inverted_map_bounds_give_error_prediction() {
        let Command::Map { north, south, east, west, date } =
            command(&["ember", "map", "--north", "28", "--south", "29", "--east", "78", "--west", "77"])
        else {
            panic!("expected map");
        };
        let resp = service().handle(area_request(north, south, east, west, date));
        assert!(is_error_fallback(&resp));
    }

    #[test]
    fn bad_date_flags_give_error_predictions() {
        let Command::Predict { lat, lng, date, features } =
            command(&["ember", "predict", "--lat", "28.6", "--lng", "77.2", "--date", "yesterday"])
        else {
            panic!("expected predict");
        };
        let request = point_request(lat, lng, date, features.as_deref()).unwrap();
        assert!(is_error_fallback(&service().handle(request)));

        let Command::Map { north, south, east, west, date } = command(&[
            "ember", "map", "--north", "29", "--south", "28", "--east", "78", "--west", "77", "--date", "2024-02-30",
        ]) else {
            panic!("expected map");
        };
        assert!(is_error_fallback(&service().handle(area_request(north, south, east, west, date))));
    }

    #[test]
    fn predict_flags_with_features_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.json");
        fs::write(&path, r#"{"red": 0.3, "nir": 0.6}"#).unwrap();

        let request = point_request(28.6139, 77.209, Some("2024-04-10".into()), Some(&path)).unwrap();
        match service().handle(request) {
            Response::Prediction(p) => {
                assert!(!p.is_error());
                assert_eq!(p.provenance, Provenance::SatelliteHeuristic);
            }
            Response::Map(_) => panic!("expected a prediction"),
        }
    }
}
