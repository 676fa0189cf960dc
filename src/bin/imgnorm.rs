use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgnorm", version)]
struct Cli {
    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one storage notification and print the invocation result as JSON.
    Handle(HandleArgs),
    /// Handle every `*.json` notification in a directory, in parallel.
    Batch(BatchArgs),
    /// Print the scaling plan for an image size.
    Plan(PlanArgs),
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    /// Pipeline config JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bucket whose notifications are accepted.
    #[arg(long, env = "IMGNORM_SOURCE_BUCKET")]
    source_bucket: Option<String>,

    /// Bucket receiving normalized images.
    #[arg(long, env = "IMGNORM_DESTINATION_BUCKET")]
    destination_bucket: Option<String>,

    /// Output extension (`png`, `jpg`, `jpeg`).
    #[arg(long)]
    output_extension: Option<String>,

    /// How failures after validation are reported.
    #[arg(long, value_enum)]
    error_policy: Option<ErrorPolicyChoice>,
}

#[derive(Parser, Debug)]
struct HandleArgs {
    /// Notification JSON.
    #[arg(long)]
    event: PathBuf,

    /// Directory holding one subdirectory per bucket.
    #[arg(long, env = "IMGNORM_STORAGE_ROOT")]
    storage_root: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory of notification JSON files.
    #[arg(long)]
    events: PathBuf,

    /// Directory holding one subdirectory per bucket.
    #[arg(long, env = "IMGNORM_STORAGE_ROOT")]
    storage_root: PathBuf,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Source width in pixels.
    #[arg(long)]
    width: u32,

    /// Source height in pixels.
    #[arg(long)]
    height: u32,

    /// Pipeline config JSON providing the scaling policy.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ErrorPolicyChoice {
    Surface,
    Swallow,
}

impl From<ErrorPolicyChoice> for imgnorm::ErrorPolicy {
    fn from(c: ErrorPolicyChoice) -> Self {
        match c {
            ErrorPolicyChoice::Surface => Self::Surface,
            ErrorPolicyChoice::Swallow => Self::Swallow,
        }
    }
}

#[derive(serde::Serialize)]
struct BatchLine<'a> {
    event: &'a Path,
    result: imgnorm::InvocationResult,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match cli.cmd {
        Command::Handle(args) => cmd_handle(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Plan(args) => cmd_plan(args),
    }
}

fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: ConfigArgs) -> anyhow::Result<imgnorm::PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => imgnorm::PipelineConfig::from_path(path)?,
        None => {
            let src = args
                .source_bucket
                .clone()
                .context("--source-bucket (or IMGNORM_SOURCE_BUCKET) is required without --config")?;
            let dst = args.destination_bucket.clone().context(
                "--destination-bucket (or IMGNORM_DESTINATION_BUCKET) is required without --config",
            )?;
            imgnorm::PipelineConfig::new(src, dst)
        }
    };

    if let Some(src) = args.source_bucket {
        cfg.source_bucket = src;
    }
    if let Some(dst) = args.destination_bucket {
        cfg.destination_bucket = dst;
    }
    if let Some(ext) = args.output_extension {
        cfg.output = imgnorm::OutputFormat::from_extension(&ext)?;
    }
    if let Some(policy) = args.error_policy {
        cfg.error_policy = policy.into();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_handle(args: HandleArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(args.config)?;
    let storage = imgnorm::FsStorage::new(args.storage_root);
    let pipeline = imgnorm::Pipeline::new(cfg, &storage)?;

    let notification = imgnorm::Notification::from_path(&args.event)?;
    let result = pipeline.handle(&notification);

    println!("{}", serde_json::to_string(&result)?);
    Ok(exit_code(result.success))
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_config(args.config)?;
    let storage = imgnorm::FsStorage::new(args.storage_root);
    let pipeline = imgnorm::Pipeline::new(cfg, &storage)?;

    let events = list_event_files(&args.events)?;
    tracing::info!(count = events.len(), "processing notifications");

    let run = || -> Vec<imgnorm::InvocationResult> {
        events
            .par_iter()
            .map(|path| match imgnorm::Notification::from_path(path) {
                Ok(n) => pipeline.handle(&n),
                Err(e) => {
                    tracing::error!(event = %path.display(), "unreadable notification: {e}");
                    imgnorm::InvocationResult::failed(
                        format!("Unreadable notification: {}", path.display()),
                        Some(e.to_string()),
                    )
                }
            })
            .collect()
    };

    let results = match args.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("build rayon pool")?
            .install(run),
        None => run(),
    };

    let mut all_ok = true;
    for (event, result) in events.iter().zip(results) {
        all_ok &= result.success;
        let line = BatchLine { event, result };
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(exit_code(all_ok))
}

fn cmd_plan(args: PlanArgs) -> anyhow::Result<ExitCode> {
    let policy = match &args.config {
        Some(path) => imgnorm::PipelineConfig::from_path(path)?.scaling,
        None => imgnorm::ScalingPolicy::default(),
    };
    let dims = imgnorm::ImageDimensions::new(args.width, args.height)?;
    let plan = imgnorm::plan_with_policy(dims, &policy);
    println!("{}", serde_json::to_string(&plan)?);
    Ok(ExitCode::SUCCESS)
}

fn list_event_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("read events dir '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "json") {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
