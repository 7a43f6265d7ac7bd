use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use acceptability::config::{EarlyStoppingConfig, StreamConfig, UnderfillPolicy};
use acceptability::{
    AcceptabilityDataset, EarlyStopping, LmDataset, MemoryCheckpoint, MetricMap,
};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use serde_json::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Acceptability and language-model corpus toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a language-model token stream and report its windows
    Inspect(InspectArgs),
    /// Summarise an acceptability TSV file
    Acceptability(AcceptabilityArgs),
    /// Replay a series of validation metrics through early stopping
    Replay(ReplayArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum UnderfillArg {
    Pad,
    Error,
    Truncate,
}

impl From<UnderfillArg> for UnderfillPolicy {
    fn from(value: UnderfillArg) -> Self {
        match value {
            UnderfillArg::Pad => UnderfillPolicy::PadWithEnd,
            UnderfillArg::Error => UnderfillPolicy::Error,
            UnderfillArg::Truncate => UnderfillPolicy::Truncate,
        }
    }
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Tab-separated corpus; the sentence is the fourth field
    #[arg(short, long, value_name = "PATH")]
    corpus: PathBuf,

    /// Vocabulary file with one token per line
    #[arg(long, value_name = "PATH")]
    vocab: PathBuf,

    /// Window length
    #[arg(short = 'l', long, value_name = "LEN")]
    seq_length: Option<usize>,

    /// What to do when the corpus cannot fill the stream
    #[arg(long, value_enum, default_value_t = UnderfillArg::Pad)]
    underfill: UnderfillArg,

    /// Number of windows to print
    #[arg(long, value_name = "COUNT", default_value_t = 0)]
    show: usize,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AcceptabilityArgs {
    /// Tab-separated acceptability file
    path: PathBuf,

    /// Emit JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Monitored metric for epochs 1, 2, ...
    #[arg(required = true, allow_negative_numbers = true)]
    values: Vec<f64>,

    /// Epochs tolerated without improvement
    #[arg(short, long, value_name = "EPOCHS")]
    patience: Option<usize>,

    /// Lower values are better
    #[arg(long)]
    minimize: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Inspect(args) => run_inspect(args),
        Commands::Acceptability(args) => run_acceptability(args),
        Commands::Replay(args) => run_replay(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    use log::LevelFilter;

    let level = if quiet > 0 {
        match quiet {
            1 => LevelFilter::Warn,
            _ => LevelFilter::Error,
        }
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    builder.format_timestamp_millis();
    builder.filter_level(level);
    let _ = builder.try_init();
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let mut cfg = StreamConfig::builder().underfill(args.underfill.into());
    if let Some(seq_length) = args.seq_length {
        cfg = cfg.seq_length(seq_length);
    }
    let cfg = cfg.build()?;

    let start = Instant::now();
    let dataset = LmDataset::from_paths(&args.corpus, &args.vocab, &cfg)
        .with_context(|| format!("failed to build dataset from {}", args.corpus.display()))?;
    let elapsed = start.elapsed();
    let vocab = dataset
        .vocab()
        .context("dataset was built without a vocabulary")?;
    let metrics = dataset.tokens().metrics();
    info!("dataset ready in {elapsed:.2?}");

    let shown: Vec<_> = dataset
        .iter()
        .take(args.show)
        .map(|(input, target)| {
            let words: Vec<&str> = input
                .iter()
                .map(|&id| vocab.get_token(id as usize).unwrap_or("?"))
                .collect();
            json!({ "input": input, "target": target, "text": words.join(" ") })
        })
        .collect();

    if args.json {
        let summary = json!({
            "corpus": args.corpus.display().to_string(),
            "vocab_size": vocab.size(),
            "seq_length": dataset.seq_length(),
            "windows": dataset.len(),
            "stream": metrics,
            "samples": shown,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Vocab size   : {}", vocab.size());
        println!("Seq length   : {}", dataset.seq_length());
        println!("Lines        : {} ({} skipped)", metrics.lines_read, metrics.lines_skipped);
        println!("Raw tokens   : {}", metrics.raw_tokens);
        println!(
            "Stream size  : {} (written {}, padded {})",
            metrics.final_size, metrics.written, metrics.padded
        );
        println!("Windows      : {}", dataset.len());
        for sample in &shown {
            println!("  {}", sample["text"].as_str().unwrap_or_default());
        }
    }
    Ok(())
}

fn run_acceptability(args: AcceptabilityArgs) -> Result<()> {
    let data = AcceptabilityDataset::from_path(&args.path)
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    let (acceptable, unacceptable) = data.label_counts()?;
    let mut sources: BTreeMap<&str, usize> = BTreeMap::new();
    for example in &data {
        *sources.entry(example.source.as_str()).or_default() += 1;
    }

    if args.json {
        let summary = json!({
            "path": args.path.display().to_string(),
            "examples": data.len(),
            "acceptable": acceptable,
            "unacceptable": unacceptable,
            "sources": sources,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Examples     : {}", data.len());
        println!("Acceptable   : {acceptable}");
        println!("Unacceptable : {unacceptable}");
        for (source, count) in &sources {
            println!("  {source:<12} {count}");
        }
    }
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let mut cfg = EarlyStoppingConfig::builder().minimize(args.minimize);
    if let Some(patience) = args.patience {
        cfg = cfg.patience(patience);
    }
    let mut stopper = EarlyStopping::new(MemoryCheckpoint::new(), cfg.build());
    // The "model" is the epoch it was taken from, so a restore shows which epoch won.
    for (idx, &value) in args.values.iter().enumerate() {
        let epoch = idx + 1;
        let mut model = epoch;
        if stopper.evaluate(&mut model, value, MetricMap::new(), epoch)? {
            println!("stopped at epoch {epoch}; restored model from epoch {model}");
            break;
        }
    }
    println!("{}", stopper.summary());
    Ok(())
}
