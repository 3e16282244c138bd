use std::path::{Path, PathBuf};

use acmodel_rs::{AcModel, Hmm, ProtoConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[path = "acm/summary_formatter.rs"]
mod summary_formatter;

#[derive(Debug, Parser)]
#[command(name = "acm")]
#[command(about = "Inspect, resolve and merge HTK acoustic models")]
struct Cli {
    /// Log filter, e.g. `info` or `acmodel_rs=debug`.
    #[arg(long, env = "ACM_LOG", default_value = "warn", global = true)]
    log: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge another model into a base model.
    Merge {
        /// Base model files (`macros`, `hmmdefs`, ...).
        #[arg(long = "model", required = true, num_args = 1..)]
        model: Vec<PathBuf>,
        /// Model files merged into the base.
        #[arg(long = "other", required = true, num_args = 1..)]
        other: Vec<PathBuf>,
        /// Weight of the base model for shared phonemes, in [0, 1].
        #[arg(long, env = "ACM_GAMMA", default_value_t = 0.5)]
        gamma: f64,
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// Also write the merge counters as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Inline every state and transition macro.
    Fill {
        #[arg(long = "model", required = true, num_args = 1..)]
        model: Vec<PathBuf>,
        #[arg(long, short = 'o')]
        out: PathBuf,
    },
    /// Write an untrained proto model.
    Proto {
        #[arg(long, env = "ACM_VEC_SIZE")]
        vec_size: Option<usize>,
        #[arg(long)]
        mixtures: Option<usize>,
        /// JSON proto settings; flags override its values.
        #[arg(long, env = "ACM_PROTO_CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, short = 'o')]
        out: PathBuf,
        /// Also write the short-pause model built from the same settings.
        #[arg(long)]
        sp: Option<PathBuf>,
    },
    /// Print a summary of a model.
    Info {
        #[arg(long = "model", required = true, num_args = 1..)]
        model: Vec<PathBuf>,
        /// Write the summary as JSON instead of printing it.
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("acm: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).map_err(|e| format!("bad --log: {e}"))?)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Merge {
            model,
            other,
            gamma,
            out,
            json,
        } => {
            let mut base = load(&model)?;
            let other = load(&other)?;
            let merge_report = base
                .merge_model(&other, gamma)
                .map_err(|e| format!("merge failed: {e}"))?;
            save(&base, &out)?;
            summary_formatter::print_merge_report(&merge_report);
            if let Some(path) = json {
                summary_formatter::write_json(&path, &merge_report)?;
            }
        }
        Command::Fill { model, out } => {
            let mut acmodel = load(&model)?;
            acmodel
                .fill_hmms()
                .map_err(|e| format!("macro resolution failed: {e}"))?;
            save(&acmodel, &out)?;
        }
        Command::Proto {
            vec_size,
            mixtures,
            config,
            out,
            sp,
        } => {
            let mut proto_config = match config {
                Some(path) => ProtoConfig::load(&path).map_err(|e| e.to_string())?,
                None => ProtoConfig::default(),
            };
            if let Some(vec_size) = vec_size {
                proto_config.vec_size = vec_size;
            }
            if let Some(mixtures) = mixtures {
                proto_config.mixture_count = mixtures;
            }
            let options = proto_config.options();
            let proto = Hmm::create_proto_with(&proto_config).map_err(|e| e.to_string())?;
            proto
                .save_with_options(&out, &options)
                .map_err(|e| format!("Failed to write '{}': {e}", out.display()))?;
            if let Some(path) = sp {
                Hmm::create_sp_with(&proto_config)
                    .map_err(|e| e.to_string())?
                    .save_with_options(&path, &options)
                    .map_err(|e| format!("Failed to write '{}': {e}", path.display()))?;
            }
        }
        Command::Info { model, json } => {
            let summary = summary_formatter::summarize(&load(&model)?);
            match json {
                Some(path) => summary_formatter::write_json(&path, &summary)?,
                None => summary_formatter::print_summary(&summary),
            }
        }
    }
    Ok(())
}

fn load(paths: &[PathBuf]) -> Result<AcModel, String> {
    for path in paths {
        require_path_exists(path)?;
    }
    AcModel::load_htk(paths).map_err(|e| format!("Failed to load model: {e}"))
}

fn save(model: &AcModel, path: &Path) -> Result<(), String> {
    model
        .save_htk(path)
        .map_err(|e| format!("Failed to write '{}': {e}", path.display()))
}

fn require_path_exists(path: &Path) -> Result<(), String> {
    if path.exists() {
        Ok(())
    } else {
        Err(format!("Model file not found: {}", path.display()))
    }
}
