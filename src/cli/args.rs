use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gradelookup",
    version,
    about = "look up a student's scores in a published grade book",
    long_about = "gradelookup loads a JSON grade book once, then prints the score table for each identifier you give it.\n\nExamples:\n  gradelookup -s https://school.example/data/grades.json -i ABC123\n  gradelookup -s ./data/grades.json            (interactive: one identifier per line)\n  gradelookup -i ABC123 -i XYZ789 -o result.html\n\nTip: Use --config to persist the data source and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity on stderr (-v, -vv, -vvv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 's',
        long = "src",
        visible_alias = "source",
        value_name = "URL|FILE",
        help_heading = "Input",
        help = "Grade book location: an http(s) URL or a local JSON file (default: data/grades.json)."
    )]
    pub source: Option<String>,

    #[arg(
        short = 'i',
        long = "id",
        visible_alias = "identifier",
        value_name = "ID",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "Identifier to look up (repeatable). Without it, identifiers are read from stdin."
    )]
    pub identifiers: Vec<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.gradelookup/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Request timeout in seconds (default: wait indefinitely)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'l',
        long = "col",
        visible_alias = "collation",
        value_name = "LOCALE",
        help_heading = "Display",
        help = "Ordering for unrecognised score columns: vi or ordinal."
    )]
    pub collation: Option<String>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the status line and every lookup result to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output file format (text, json, html); inferred from the extension when omitted."
    )]
    pub output_format: Option<String>,
}
