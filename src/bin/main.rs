//! gkmcv Command Line Interface
//!
//! Computes a gapped k-mer kernel through the native engine, or reads a
//! stored kernel matrix, and reports its cross-validated AUC.

use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use gkmcv::api::GkmCv;
use gkmcv::core::Result;
use gkmcv::data::read_matrix;
use gkmcv::evaluation::{CrossValidator, Evaluation, EvaluationMode};
use gkmcv::kernel::{KernelConfig, KernelMatrix, NativeEngine};
use gkmcv::persistence::SurrogateFile;
use log::{error, info};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "gkmcv")]
#[command(about = "Cross-validated AUC for gapped k-mer kernel SVMs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "gkmcv contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the kernel for two sequence files and evaluate it
    Kernel(KernelArgs),
    /// Evaluate a kernel matrix stored as text
    Matrix(MatrixArgs),
    /// Display surrogate model information
    Surrogate(SurrogateArgs),
}

/// How to turn a matrix into an AUC
#[derive(Args)]
struct EvaluationArgs {
    /// Number of cross-validation folds
    #[arg(long, default_value = "5")]
    ncv: usize,

    /// Surrogate model file; estimates the AUC from a single fit instead of folding
    #[arg(long)]
    surrogate: Option<PathBuf>,

    /// Evaluate folds one after another instead of in parallel
    #[arg(long)]
    sequential: bool,

    /// Print per-fold results
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct KernelArgs {
    /// Positive sequence file
    #[arg(long)]
    pos: PathBuf,

    /// Negative sequence file
    #[arg(long)]
    neg: PathBuf,

    /// Kernel engine shared library
    #[arg(long, default_value = NativeEngine::DEFAULT_LIBRARY)]
    engine_lib: PathBuf,

    /// Word length (L)
    #[arg(short = 'L', long, default_value = "10")]
    word_length: usize,

    /// Informative columns (K)
    #[arg(short = 'K', long, default_value = "6")]
    informative_columns: usize,

    /// Maximum mismatches (d)
    #[arg(long, default_value = "3")]
    max_mismatch: usize,

    /// Longest sequence the engine reads
    #[arg(long, default_value = "10000")]
    max_seq_len: usize,

    /// Kernel matrix capacity in sequences
    #[arg(long, default_value = "15000")]
    max_num_seq: usize,

    /// Kernel variant code passed to the engine
    #[arg(long, default_value = "0")]
    kernel_variant: i32,

    /// Do not count reverse complements
    #[arg(long)]
    no_reverse_complement: bool,

    /// Add pseudocounts
    #[arg(long)]
    pseudocount: bool,

    /// Wildcard mismatch penalty
    #[arg(long, default_value = "1.0")]
    wildcard_lambda: f64,

    /// Maximum wildcard mismatches
    #[arg(long, default_value = "2")]
    wildcard_mismatch: usize,

    /// Alphabet definition file
    #[arg(long)]
    alphabet: Option<PathBuf>,

    /// Engine worker threads
    #[arg(short = 'T', long, default_value = "1")]
    threads: usize,

    #[command(flatten)]
    evaluation: EvaluationArgs,
}

impl KernelArgs {
    fn to_config(&self) -> KernelConfig {
        KernelConfig {
            word_length: self.word_length,
            informative_columns: self.informative_columns,
            max_mismatch: self.max_mismatch,
            max_seq_len: self.max_seq_len,
            max_num_seq: self.max_num_seq,
            kernel_variant: self.kernel_variant,
            add_reverse_complement: !self.no_reverse_complement,
            use_pseudocount: self.pseudocount,
            pos_file: self.pos.clone(),
            neg_file: self.neg.clone(),
            wildcard_lambda: self.wildcard_lambda,
            wildcard_mismatch: self.wildcard_mismatch,
            alphabet_file: self.alphabet.clone(),
            max_threads: self.threads,
            ..KernelConfig::default()
        }
    }
}

#[derive(Args)]
struct MatrixArgs {
    /// Kernel matrix file (header `n_pos n_neg`, then one row per line)
    matrix: PathBuf,

    #[command(flatten)]
    evaluation: EvaluationArgs,
}

#[derive(Args)]
struct SurrogateArgs {
    /// Surrogate model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Kernel(args) => kernel_command(args),
        Commands::Matrix(args) => matrix_command(args),
        Commands::Surrogate(args) => surrogate_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn kernel_command(args: KernelArgs) -> Result<()> {
    let config = args.to_config();
    config.validate()?;

    info!("Loading kernel engine from: {:?}", args.engine_lib);
    let gkm = GkmCv::load_native(&args.engine_lib)?;

    let matrix = gkm.compute_matrix(&config)?;
    info!(
        "Kernel matrix: {} positive and {} negative sequences",
        matrix.n_pos(),
        matrix.n_neg()
    );

    evaluate_and_report(&matrix, &args.evaluation)
}

fn matrix_command(args: MatrixArgs) -> Result<()> {
    info!("Loading kernel matrix from: {:?}", args.matrix);
    let matrix = read_matrix(&args.matrix)?;
    info!(
        "Loaded {}x{} matrix ({} positive, {} negative)",
        matrix.n_seqs(),
        matrix.n_seqs(),
        matrix.n_pos(),
        matrix.n_neg()
    );

    evaluate_and_report(&matrix, &args.evaluation)
}

fn surrogate_command(args: SurrogateArgs) -> Result<()> {
    let surrogate = SurrogateFile::load_from_file(&args.model)?;
    surrogate.print_summary();
    Ok(())
}

fn evaluate_and_report(matrix: &KernelMatrix, args: &EvaluationArgs) -> Result<()> {
    let validator = CrossValidator::default().with_parallel(!args.sequential);

    let surrogate = args
        .surrogate
        .as_ref()
        .map(SurrogateFile::load_from_file)
        .transpose()?;
    let mode = match &surrogate {
        Some(file) => {
            info!("Estimating AUC with a {} surrogate", file.model.kind());
            EvaluationMode::Surrogate(file.regressor())
        }
        None => EvaluationMode::KFold { folds: args.ncv },
    };

    let evaluation = validator.evaluate_detailed(matrix, mode)?;
    if args.detailed {
        print_details(&evaluation);
    }
    println!("{:.6}", evaluation.auc());

    Ok(())
}

fn print_details(evaluation: &Evaluation) {
    match evaluation {
        Evaluation::KFold(report) => {
            println!("=== Cross-Validation Results ===");
            println!("Folds: {}", report.folds.len());
            for fold in &report.folds {
                println!(
                    "Fold {}: train={} test={} SVs={} AUC={:.6}",
                    fold.fold, fold.n_train, fold.n_test, fold.n_support_vectors, fold.auc
                );
            }
            println!("Fold AUC std: {:.6}", report.auc_std());
        }
        Evaluation::Surrogate(estimate) => {
            println!("=== Surrogate Estimate ===");
            println!(
                "Support vectors: {} of {} (nu = {:.6})",
                estimate.n_support_vectors, estimate.n_training, estimate.nu
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_kernel_args_to_config() {
        let cli = Cli::parse_from([
            "gkmcv",
            "kernel",
            "--pos",
            "pos.fa",
            "--neg",
            "neg.fa",
            "-L",
            "11",
            "-K",
            "7",
            "--max-mismatch",
            "2",
            "--no-reverse-complement",
            "-T",
            "4",
        ]);
        let Commands::Kernel(args) = cli.command else {
            panic!("expected the kernel subcommand");
        };

        let config = args.to_config();
        assert_eq!(config.word_length, 11);
        assert_eq!(config.informative_columns, 7);
        assert_eq!(config.max_mismatch, 2);
        assert!(!config.add_reverse_complement);
        assert_eq!(config.max_threads, 4);
        assert_eq!(config.max_num_seq, 15_000);
        assert_eq!(args.evaluation.ncv, 5);
        assert_eq!(args.engine_lib, PathBuf::from("GkmKernel.so"));
    }

    #[test]
    fn test_debug_flag_is_global() {
        let cli = Cli::parse_from(["gkmcv", "matrix", "kernel.txt", "-d", "--ncv", "3"]);
        assert!(cli.debug);
        let Commands::Matrix(args) = cli.command else {
            panic!("expected the matrix subcommand");
        };
        assert_eq!(args.evaluation.ncv, 3);
    }
}
