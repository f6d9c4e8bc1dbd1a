use crate::cli::args::CliArgs;
use crate::collate::Collation;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.source.as_deref() {
        if raw.trim().is_empty() {
            return Err("invalid --source, expected a URL or file path".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.collation.as_deref() {
        validate_collation(raw)?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        validate_output_format(raw)?;
    }
    Ok(())
}

pub fn validate_collation(raw: &str) -> Result<Collation, String> {
    Collation::parse(raw)
        .ok_or_else(|| format!("invalid collation '{raw}', expected vi or ordinal"))
}

pub fn validate_output_format(raw: &str) -> Result<OutputFormat, String> {
    OutputFormat::parse(raw)
        .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))
}
