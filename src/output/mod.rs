pub mod report;

use serde::Serialize;

use crate::lookup::{LookupError, StatusLine, FOUND_NOTICE};
use crate::render::{escape_html, IdentityHeader, RenderedRecord, ScoreTable, NO_SCORE_COLUMNS_NOTICE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One submitted identifier and what came back for it. Records are kept
/// unescaped; only the HTML renderers escape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutputRecord {
    Found {
        identifier: String,
        notice: String,
        record: RenderedRecord,
    },
    Error {
        identifier: String,
        message: String,
    },
}

impl OutputRecord {
    pub fn identifier(&self) -> &str {
        match self {
            Self::Found { identifier, .. } | Self::Error { identifier, .. } => identifier,
        }
    }
}

pub fn build_record(
    identifier: &str,
    result: &Result<RenderedRecord, LookupError>,
) -> OutputRecord {
    let identifier = identifier.trim().to_string();
    match result {
        Ok(record) => OutputRecord::Found {
            identifier,
            notice: FOUND_NOTICE.to_string(),
            record: record.clone(),
        },
        Err(e) => OutputRecord::Error {
            identifier,
            message: e.to_string(),
        },
    }
}

/// Header captions paired with their values, in display order.
pub fn header_rows(header: &IdentityHeader) -> [(&'static str, &str); 6] {
    [
        ("Họ và tên", header.full_name.as_str()),
        ("Lớp", header.class_name.as_str()),
        ("MSHS", header.internal_id.as_str()),
        ("Mã định danh", header.identifier.as_str()),
        ("Email", header.email.as_str()),
        ("Ngày sinh", header.birth_date.as_str()),
    ]
}

/// Header block plus a one-row score table. Takes the unescaped record and
/// escapes every field on insertion.
pub fn render_record_html(record: &RenderedRecord) -> String {
    let record = record.escaped();
    let mut out = String::new();
    out.push_str("<div>\n");
    for (caption, value) in header_rows(&record.header) {
        out.push_str(&format!("  <div><b>{caption}:</b> {value}</div>\n"));
    }
    out.push_str("</div>\n");

    match &record.scores {
        ScoreTable::NoScoreColumns => {
            out.push_str(&format!("<p class=\"bad\">{NO_SCORE_COLUMNS_NOTICE}</p>\n"));
        }
        ScoreTable::Columns(cells) => {
            let thead: String = cells
                .iter()
                .map(|c| format!("<th>{}</th>", c.label))
                .collect();
            let tvals: String = cells
                .iter()
                .map(|c| format!("<td>{}</td>", c.value))
                .collect();
            out.push_str("<div class=\"table-wrap\">\n");
            out.push_str("  <table class=\"table\">\n");
            out.push_str(&format!("    <thead><tr>{thead}</tr></thead>\n"));
            out.push_str(&format!("    <tbody><tr>{tvals}</tr></tbody>\n"));
            out.push_str("  </table>\n");
            out.push_str("</div>\n");
        }
    }
    out
}

pub fn render_outcome_html(record: &OutputRecord) -> String {
    match record {
        OutputRecord::Found { notice, record, .. } => {
            format!("<p class=\"ok\">{notice}</p>\n{}", render_record_html(record))
        }
        OutputRecord::Error { message, .. } => {
            format!("<p class=\"bad\">{}</p>\n", escape_html(message))
        }
    }
}

fn pad(value: &str, width: usize) -> String {
    let len = value.chars().count();
    let mut out = value.to_string();
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    out
}

/// Control characters (ANSI escapes included) become U+FFFD so data from the
/// grade book cannot drive the terminal.
pub fn terminal_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { '\u{fffd}' } else { c })
        .collect()
}

/// Terminal rendering: header lines, then labels over values.
pub fn render_record_text(record: &RenderedRecord) -> String {
    let mut out = String::new();
    for (caption, value) in header_rows(&record.header) {
        out.push_str(&format!("{caption}: {}\n", terminal_safe(value)));
    }
    match &record.scores {
        ScoreTable::NoScoreColumns => {
            out.push_str(NO_SCORE_COLUMNS_NOTICE);
            out.push('\n');
        }
        ScoreTable::Columns(cells) => {
            let cells: Vec<(String, String)> = cells
                .iter()
                .map(|c| (terminal_safe(&c.label), terminal_safe(&c.value)))
                .collect();
            let widths: Vec<usize> = cells
                .iter()
                .map(|(label, value)| label.chars().count().max(value.chars().count()))
                .collect();
            let labels: Vec<String> = cells
                .iter()
                .zip(widths.iter())
                .map(|((label, _), w)| pad(label, *w))
                .collect();
            let values: Vec<String> = cells
                .iter()
                .zip(widths.iter())
                .map(|((_, value), w)| pad(value, *w))
                .collect();
            out.push('\n');
            out.push_str(labels.join(" | ").trim_end());
            out.push('\n');
            out.push_str(values.join(" | ").trim_end());
            out.push('\n');
        }
    }
    out
}

pub fn render_text(status: &StatusLine, records: &[OutputRecord]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&terminal_safe(&status.to_string()));
    out.push('\n');
    for r in records {
        out.push('\n');
        out.push_str(&format!("[{}]\n", terminal_safe(r.identifier())));
        match r {
            OutputRecord::Found { notice, record, .. } => {
                out.push_str(notice);
                out.push('\n');
                out.push_str(&render_record_text(record));
            }
            OutputRecord::Error { message, .. } => {
                out.push_str(&terminal_safe(message));
                out.push('\n');
            }
        }
    }
    out.into_bytes()
}

#[derive(Serialize)]
struct JsonReport<'a> {
    status: String,
    results: &'a [OutputRecord],
}

pub fn render_json(status: &StatusLine, records: &[OutputRecord]) -> Vec<u8> {
    let report = JsonReport {
        status: status.to_string(),
        results: records,
    };
    serde_json::to_vec_pretty(&report).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn render_html(status: &StatusLine, records: &[OutputRecord]) -> Vec<u8> {
    report::render_html(status, records)
}

pub fn render(format: OutputFormat, status: &StatusLine, records: &[OutputRecord]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(status, records),
        OutputFormat::Json => render_json(status, records),
        OutputFormat::Html => render_html(status, records),
    }
}
