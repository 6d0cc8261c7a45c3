use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use stress_ai::config::AppConfig;
use stress_ai::error::AppError;
use stress_ai::pipeline::context::PredictionContext;
use stress_ai::pipeline::labels::StressLevel;
use stress_ai::pipeline::mappings::MappingTable;
use stress_ai::pipeline::model::{
    self, ModelArtifacts, TrainedStressModel, TrainingReport, ENSEMBLE_TREES,
};
use stress_ai::routes::{router, AppState};
use stress_ai::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Stress Level Predictor",
    about = "Serve or train the lifestyle-survey stress level predictor",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Train a model from the survey dataset and persist the artifacts
    Train(TrainArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Override the configured training dataset path
    #[arg(long)]
    dataset: Option<PathBuf>,
    /// Override the configured mapping resource path
    #[arg(long)]
    mappings: Option<PathBuf>,
    /// Train without writing the model artifacts
    #[arg(long)]
    skip_persist: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Train(args) => run_train(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let mappings = MappingTable::from_path(&config.resources.mappings_path)?;
    info!(
        mappings = %config.resources.mappings_path.display(),
        "loaded category mappings"
    );

    let artifacts = ModelArtifacts {
        model_path: config.resources.model_path.clone(),
        features_path: config.resources.features_path.clone(),
    };
    let (model, source) =
        model::load_or_train(&artifacts, &config.resources.dataset_path, &mappings)?;
    info!(source = source.label(), "model ready");

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        context: Arc::new(PredictionContext::new(mappings, model)),
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = router(state).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "stress level predictor ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let mappings_path = args
        .mappings
        .unwrap_or_else(|| config.resources.mappings_path.clone());
    let dataset_path = args
        .dataset
        .unwrap_or_else(|| config.resources.dataset_path.clone());

    let mappings = MappingTable::from_path(&mappings_path)?;
    let (model, report) = model::train_from_path(&dataset_path, &mappings)?;

    if args.skip_persist {
        println!("Skipping artifact persistence (--skip-persist)");
    } else {
        let artifacts = ModelArtifacts {
            model_path: config.resources.model_path.clone(),
            features_path: config.resources.features_path.clone(),
        };
        model::persist(&artifacts, &model)?;
        println!(
            "Artifacts written: {} and {}",
            artifacts.model_path.display(),
            artifacts.features_path.display()
        );
    }

    render_training_report(&dataset_path, &model, &report);
    Ok(())
}

fn render_training_report(
    dataset_path: &std::path::Path,
    model: &TrainedStressModel,
    report: &TrainingReport,
) {
    println!("\nTraining summary for {}", dataset_path.display());
    println!("Ensemble: {ENSEMBLE_TREES} trees");
    println!(
        "Rows: {} read, {} trained, {} dropped (unmapped values), {} dropped (unbinnable score)",
        report.total_rows, report.trained_rows, report.dropped_unmapped, report.dropped_unlabeled
    );

    println!("\nLabel distribution");
    for level in StressLevel::ordered() {
        println!(
            "- {}: {} rows",
            level.label(),
            report.class_counts[level.class()]
        );
    }

    println!("\nFeature importance");
    let mut pairs = model.importance_pairs();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (feature, weight) in pairs {
        println!("- {feature}: {weight:.4}");
    }
}
