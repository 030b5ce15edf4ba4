//! Trains the chatbot intent classifier and writes its artifacts.

use std::io::Write;
use std::path::PathBuf;

use parley::config::TrainConfig;
use parley::logging;
use parley::ml::EpochStats;
use parley::pipeline;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let (mut config, source) =
        TrainConfig::resolve(options.config.as_deref()).map_err(|err| err.to_string())?;
    match &source {
        Some(path) => tracing::info!("Using config {}", path.display()),
        None => tracing::info!("No config file found; using defaults"),
    }
    options.apply(&mut config);
    let config = config.normalized();

    let mut progress = |stats: &EpochStats| {
        print!(
            "\rEpoch {}/{}  loss={:.4}  accuracy={:.4}",
            stats.epoch + 1,
            stats.epochs,
            stats.loss,
            stats.accuracy
        );
        let _ = std::io::stdout().flush();
        if stats.epoch + 1 == stats.epochs {
            println!();
        }
    };
    let summary = pipeline::run(&config, Some(&mut progress)).map_err(|err| err.to_string())?;

    println!();
    println!("Final Training Accuracy: {:.4}", summary.final_accuracy);
    println!("Final Training Loss: {:.4}", summary.final_loss);
    println!(
        "Fit on training patterns (no dropout): {:.4} over {} examples, {} words, seed {}",
        summary.fit_accuracy, summary.examples, summary.vocabulary_len, summary.seed
    );
    for (idx, stats) in summary.per_class.iter().enumerate() {
        println!(
            "class {:>2} {:<20}  precision={:.3}  recall={:.3}  support={}",
            idx, stats.tag, stats.precision, stats.recall, stats.support
        );
    }
    println!("Model written to {}", summary.model_path().display());
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    intents: Option<PathBuf>,
    out: Option<PathBuf>,
    epochs: Option<usize>,
    batch_size: Option<usize>,
    seed: Option<u64>,
}

impl CliOptions {
    fn apply(&self, config: &mut TrainConfig) {
        if let Some(path) = &self.intents {
            config.intents_path = path.clone();
        }
        if let Some(path) = &self.out {
            config.output_dir = path.clone();
        }
        if let Some(epochs) = self.epochs {
            config.training.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            config.training.batch_size = batch_size;
        }
        if let Some(seed) = self.seed {
            config.training.seed = Some(seed);
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => options.config = Some(flag_value(&mut args, &flag)?.into()),
            "--intents" => options.intents = Some(flag_value(&mut args, &flag)?.into()),
            "--out" => options.out = Some(flag_value(&mut args, &flag)?.into()),
            "--epochs" => options.epochs = Some(parse_flag(&mut args, &flag)?),
            "--batch" => options.batch_size = Some(parse_flag(&mut args, &flag)?),
            "--seed" => options.seed = Some(parse_flag(&mut args, &flag)?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
    }
    Ok(options)
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_flag<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, String> {
    let value = flag_value(args, flag)?;
    value
        .parse()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "parley-train",
        "",
        "Trains the intent classifier from intents.json and writes words, classes,",
        "model, training data and history as JSON.",
        "",
        "Usage:",
        "  parley-train [options]",
        "",
        "Options:",
        "  --config <file>   TOML config (default: ./parley.toml, then .parley/config.toml)",
        "  --intents <file>  Intents JSON (default chatbot/intents.json)",
        "  --out <dir>       Output directory (default model)",
        "  --epochs <n>      Training epochs (default 200)",
        "  --batch <n>       Batch size (default 5)",
        "  --seed <n>        RNG seed (default: random)",
    ]
    .join("\n")
}
