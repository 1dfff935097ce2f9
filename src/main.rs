//! `tensor-rnn` command line: generate chaotic series and train forecasters.

use std::path::PathBuf;
use std::process::ExitCode;

use burn::backend::{Autodiff, NdArray};
use burn::config::Config;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use tensor_rnn::data::{load_series, logistic_dataset, lorenz_dataset, save_series, SeriesFile, SeriesKind};
use tensor_rnn::train::{train, TrainingConfig};
use tensor_rnn::{Result, TensorRnnError};

type TrainBackend = Autodiff<NdArray<f32>>;

#[derive(Parser)]
#[command(name = "tensor-rnn", version, about = "High-order tensor-train RNN forecasting")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a synthetic chaotic dataset
    Generate(GenerateArgs),
    /// Train a forecaster on a generated dataset
    Train(TrainArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Generator {
    /// Logistic map, 1 channel per sample
    Logistic,
    /// Lorenz attractor, 3 channels per sample
    Lorenz,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(value_enum)]
    kind: Generator,

    /// Integration steps before subsampling
    #[arg(long, default_value = "10000")]
    steps: usize,

    /// Keep every n-th step
    #[arg(long, default_value = "1")]
    freq: usize,

    /// Independent series, placed side by side
    #[arg(long, default_value = "1")]
    samples: usize,

    /// Seed for the random initial conditions
    #[arg(long, default_value = "42")]
    seed: u64,

    #[arg(long)]
    out: PathBuf,
}

#[derive(Args)]
struct TrainArgs {
    /// Series file written by `generate`
    #[arg(long)]
    data: PathBuf,

    /// Directory for the checkpoint and predictions
    #[arg(long)]
    out: PathBuf,

    /// Training configuration JSON; defaults to the tiny preset
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    hidden_size: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    #[arg(long)]
    num_steps: Option<usize>,
}

fn generate(args: GenerateArgs) -> Result<()> {
    let (kind, series) = match args.kind {
        Generator::Logistic => (
            SeriesKind::Logistic,
            logistic_dataset(args.samples, args.steps, args.freq, args.seed)?,
        ),
        Generator::Lorenz => (
            SeriesKind::Lorenz,
            lorenz_dataset(args.samples, args.steps, args.freq, args.seed)?,
        ),
    };
    let file = SeriesFile {
        kind,
        num_steps: args.steps,
        num_freq: args.freq,
        num_samples: args.samples,
        seed: args.seed,
        series,
    };
    save_series(&args.out, &file)
}

fn run_training(args: TrainArgs) -> Result<()> {
    let file = load_series(&args.data)?;
    let channels = file.num_channels();

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading training configuration");
            TrainingConfig::load(path)
                .map_err(|err| TensorRnnError::config(format!("{:?}", err)))?
        }
        None => TrainingConfig::tiny(channels),
    };
    if let Some(hidden_size) = args.hidden_size {
        config.model.hidden_size = hidden_size;
    }
    if let Some(learning_rate) = args.learning_rate {
        config.learning_rate = learning_rate;
    }
    if let Some(num_steps) = args.num_steps {
        config.num_steps = num_steps;
        config.eval_num_steps = num_steps;
    }

    let device = Default::default();
    let report = train::<TrainBackend>(&config, &file.series, &args.out, &device)?;
    if let Some(last) = report.epochs.last() {
        info!(
            epochs = report.epochs.len(),
            train_error = last.train_error,
            valid_error = last.valid_error,
            test_error = report.test_error,
            "training finished"
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => generate(args),
        Command::Train(args) => run_training(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
