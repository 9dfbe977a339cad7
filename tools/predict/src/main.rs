//! One-shot crop suggestion from the command line.
//! Prints the prediction as JSON on stdout.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crop_core::{Feature, Model, Predictor};
use crop_store::SubmissionStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "predict", about = "Suggest crops for one set of soil and climate measurements")]
struct Args {
    /// Nitrogen content (0-100).
    #[arg(long = "n", allow_hyphen_values = true)]
    nitrogen: String,

    /// Phosphorus content.
    #[arg(long = "p", allow_hyphen_values = true)]
    phosphorus: String,

    /// Potassium content.
    #[arg(long = "k", allow_hyphen_values = true)]
    potassium: String,

    /// Temperature in degrees Celsius.
    #[arg(long, allow_hyphen_values = true)]
    temperature: String,

    /// Relative humidity in percent.
    #[arg(long, allow_hyphen_values = true)]
    humidity: String,

    /// Soil pH (0-14).
    #[arg(long, allow_hyphen_values = true)]
    ph: String,

    /// Rainfall in millimetres.
    #[arg(long, allow_hyphen_values = true)]
    rainfall: String,

    /// Model artifact JSON.
    #[arg(short, long, env = "CROP_MODEL", default_value = "data/model.json")]
    model: PathBuf,

    /// Record the submission in this SQLite file. Nothing is recorded when absent.
    #[arg(short, long, env = "CROP_DATABASE")]
    database: Option<PathBuf>,
}

impl Args {
    fn fields(&self) -> HashMap<String, String> {
        Feature::ALL
            .iter()
            .map(|f| {
                let value = match f {
                    Feature::Nitrogen => &self.nitrogen,
                    Feature::Phosphorus => &self.phosphorus,
                    Feature::Potassium => &self.potassium,
                    Feature::Temperature => &self.temperature,
                    Feature::Humidity => &self.humidity,
                    Feature::Ph => &self.ph,
                    Feature::Rainfall => &self.rainfall,
                };
                (f.form_key().to_string(), value.clone())
            })
            .collect()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let model = Model::load(&args.model)
        .with_context(|| format!("loading model artifact {}", args.model.display()))?;
    let mut predictor = Predictor::new(Arc::new(model));
    if let Some(path) = &args.database {
        let store = SubmissionStore::open(path)
            .with_context(|| format!("opening submission store {}", path.display()))?;
        predictor = predictor.with_recorder(Arc::new(store));
    }

    let prediction = predictor.predict(&args.fields()).context("prediction rejected")?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}
