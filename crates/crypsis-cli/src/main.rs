use anyhow::{bail, Context, Result};
use clap::Parser;
use ndarray::Array1;
use ndarray_npy::ReadNpyExt;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crypsis_core::EngineConfig;
use crypsis_engine::{
    BoundaryClassifier, EmbeddingStore, Pocket, PredictionPipeline, ProteinStructure,
};

#[derive(Parser)]
#[command(name = "crypsis")]
#[command(about = "Cryptic pocket detection and refinement", long_about = None)]
struct Cli {
    /// Input structure file (.pdb, .pdb1, or .cif)
    #[arg(short, long)]
    input: PathBuf,

    /// Per-residue binding scores (.npy float vector or .json array)
    #[arg(short, long)]
    scores: PathBuf,

    /// Output path for the job record JSON
    #[arg(short, long)]
    output: PathBuf,

    /// Directory of chain-keyed embedding files ("{chain}.npy")
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Boundary classifier weights (.npz)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Config TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip boundary refinement even when a model is available
    #[arg(long, default_value_t = false)]
    no_refine: bool,
}

/// Persisted job record, one per completed run.
#[derive(Serialize)]
struct JobRecord {
    status: String,
    prediction: Vec<f64>,
    clusters: Vec<i32>,
    pockets: Vec<Pocket>,
    sequence: Vec<char>,
    residue_ids: Vec<String>,
    input_structure: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let started = Instant::now();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let structure = ProteinStructure::from_file(&cli.input)
        .with_context(|| format!("parsing structure {}", cli.input.display()))?;
    log::info!(
        "parsed {} residues across {} chains from {}",
        structure.residue_count(),
        structure.chain_order.len(),
        cli.input.display()
    );

    let scores = load_scores(&cli.scores)
        .with_context(|| format!("loading scores from {}", cli.scores.display()))?;

    let pipeline = PredictionPipeline::new(config)?;

    let result = match (&cli.model, &cli.embeddings, cli.no_refine) {
        (Some(model_path), Some(embeddings_dir), false) => {
            let model = BoundaryClassifier::from_npz(model_path)
                .with_context(|| format!("loading classifier from {}", model_path.display()))?;
            let store = EmbeddingStore::new(embeddings_dir);
            pipeline.run(&structure, &cli.input, &scores, &store, &model)?
        }
        (None, None, _) | (_, _, true) => {
            log::info!("running without boundary refinement");
            pipeline.run_unrefined(&structure, &scores)?
        }
        _ => bail!("--model and --embeddings must be given together"),
    };

    let record = JobRecord {
        status: "SUCCESS".to_string(),
        prediction: scores,
        clusters: result.labels,
        pockets: result.pockets,
        sequence: result.sequence.chars().collect(),
        residue_ids: result.residue_keys,
        input_structure: cli
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let out = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    serde_json::to_writer(out, &record)?;

    log::info!(
        "wrote {} pockets to {} in {:.2?}",
        record.pockets.len(),
        cli.output.display(),
        started.elapsed()
    );
    Ok(())
}

/// Load the binding score vector from a `.npy` file (f64 or f32) or a JSON
/// array.
fn load_scores(path: &Path) -> Result<Vec<f64>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.ends_with(".npy") {
        let file = File::open(path)?;
        match Array1::<f64>::read_npy(file) {
            Ok(array) => Ok(array.to_vec()),
            Err(_) => {
                // scoring models commonly persist float32
                let file = File::open(path)?;
                let array = Array1::<f32>::read_npy(file)
                    .context("scores .npy is neither a float64 nor a float32 vector")?;
                Ok(array.iter().map(|&v| f64::from(v)).collect())
            }
        }
    } else if name.ends_with(".json") {
        let file = File::open(path)?;
        let scores: Vec<f64> = serde_json::from_reader(file).context("scores JSON must be an array of numbers")?;
        Ok(scores)
    } else {
        bail!("unsupported score format: {}", path.display());
    }
}
