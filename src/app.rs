use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::collate::Collation;
use crate::config::{self, ConfigFile};
use crate::dataset::{DataSource, Loader, LoaderOptions};
use crate::lookup::Session;
use crate::output::{self, OutputFormat, OutputRecord};
use crate::render::Renderer;

const LOADING_MESSAGE: &str = "Đang tải dữ liệu...";
const PROMPT: &str = "Mã định danh: ";

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: DataSource,
    identifiers: Vec<String>,
    loader_options: LoaderOptions,
    collation: Collation,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let raw_source = args
        .source
        .or(cfg.source)
        .unwrap_or_else(|| config::DEFAULT_SOURCE.to_string());
    let source = DataSource::parse(&config::expand_home(raw_source.trim()))
        .map_err(|e| format!("invalid source '{raw_source}': {e}"))?;

    let timeout_seconds = args.timeout.or(cfg.timeout);
    if timeout_seconds == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let collation = match args.collation.or(cfg.collation) {
        Some(raw) => validation::validate_collation(&raw)?,
        None => Collation::default(),
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_home(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(validation::validate_output_format(&raw)?),
        None => None,
    };

    let identifiers = args
        .identifiers
        .into_iter()
        .map(|id| id.trim().to_string())
        .collect();

    Ok(RunConfig {
        source,
        identifiers,
        loader_options: LoaderOptions {
            timeout_seconds,
            proxy,
            ..LoaderOptions::default()
        },
        collation,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn loading_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.set_message(LOADING_MESSAGE);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_outcome(record: &OutputRecord) {
    match record {
        OutputRecord::Found { notice, record, .. } => {
            println!("{}", notice.green().bold());
            print!("{}", output::render_record_text(record));
        }
        OutputRecord::Error { message, .. } => {
            println!("{}", output::terminal_safe(message).red().bold());
        }
    }
}

async fn read_identifiers_interactively(
    session: &Session,
    records: &mut Vec<OutputRecord>,
) -> Result<(), String> {
    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            print!("{PROMPT}");
            let _ = std::io::stdout().flush();
        }
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => return Err(format!("failed to read stdin: {e}")),
        };
        // Piped input may carry trailing blank lines; only a prompt answers them.
        if !interactive && line.trim().is_empty() {
            continue;
        }
        let outcome = output::build_record(&line, &session.submit_plain(&line));
        print_outcome(&outcome);
        println!();
        records.push(outcome);
    }
    Ok(())
}

async fn write_output(
    path: &str,
    format: Option<OutputFormat>,
    session: &Session,
    records: &[OutputRecord],
) -> Result<(), String> {
    let format = format
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(OutputFormat::Text);
    let rendered = output::render(format, &session.status_line(), records);

    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(&rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))?;
    info!(path, records = records.len(), "wrote output file");
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    let loader = Loader::new(run.source.clone(), &run.loader_options).map_err(|e| e.to_string())?;
    format_kv_line("Source", &output::terminal_safe(&run.source.display_name()));

    let pb = loading_spinner();
    let session = Session::start(&loader, Renderer::new(run.collation)).await;
    pb.finish_and_clear();

    let status = session.status_line();
    let line = output::terminal_safe(&status.to_string());
    if status.is_failure() {
        println!("{}", line.red().bold());
    } else {
        println!("{}", line.dimmed());
    }
    println!();

    let mut records: Vec<OutputRecord> = Vec::new();
    if run.identifiers.is_empty() {
        read_identifiers_interactively(&session, &mut records).await?;
    } else {
        for identifier in run.identifiers.iter() {
            let outcome = output::build_record(identifier, &session.submit_plain(identifier));
            print_outcome(&outcome);
            println!();
            records.push(outcome);
        }
    }
    debug!(lookups = records.len(), "lookups finished");

    if let Some(path) = run.output.as_deref() {
        write_output(path, run.output_format, &session, &records).await?;
    }

    match session.load_error() {
        Some(e) => Err(format!(
            "no data loaded from {}: {e}",
            run.source.display_name()
        )),
        None => Ok(()),
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                return e.print().map_err(|e| format!("failed to print help: {e}"));
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args
        .config
        .clone()
        .map(|p| PathBuf::from(config::expand_home(&p)));
    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path, pass --config".to_string())?;
        if config::ensure_default_config_file(&path)? {
            format_kv_line("Config", &format!("created {}", path.display()));
        } else {
            format_kv_line("Config", &format!("{} already exists", path.display()));
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    init_tracing(run.verbose);
    if run.no_color {
        colored::control::set_override(false);
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;
    rt.block_on(run_async(run))
}
