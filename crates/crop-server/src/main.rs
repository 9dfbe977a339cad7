//! HTTP front end: form pages and a JSON API over the crop prediction pipeline.

mod render;
mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crop_core::{Model, Predictor};
use crop_store::SubmissionStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use routes::AppState;

#[derive(Parser, Debug)]
#[command(name = "crop-server", about = "Serve crop suggestions for soil and climate measurements")]
struct Args {
    /// Model artifact JSON (normalization, centroids, crop labels).
    #[arg(long, env = "CROP_MODEL", default_value = "data/model.json")]
    model: PathBuf,

    /// SQLite file receiving every validated submission.
    #[arg(long, env = "CROP_DATABASE", default_value = "farmer_data.db")]
    database: PathBuf,

    /// Listen address.
    #[arg(long, env = "CROP_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    // Nothing is served until the model has loaded and validated.
    let model = Model::load(&args.model)
        .with_context(|| format!("loading model artifact {}", args.model.display()))?;
    let store = Arc::new(
        SubmissionStore::open(&args.database)
            .with_context(|| format!("opening submission store {}", args.database.display()))?,
    );
    info!(path = %store.path().display(), "submission store open");

    let predictor = Predictor::new(Arc::new(model)).with_recorder(store.clone());
    let app = routes::router(AppState {
        predictor: Arc::new(predictor),
        store,
    });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %args.bind, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
