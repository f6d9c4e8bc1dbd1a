use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::collate::Collation;
use crate::dataset::{Record, Value};

pub const FULL_NAME: &str = "Họ và tên";
pub const CLASS_NAME: &str = "Tên lớp";
pub const INTERNAL_ID: &str = "MSHS";
pub const IDENTIFIER: &str = "Mã định danh";
pub const EMAIL: &str = "Email";
pub const BIRTH_DATE: &str = "Ngày sinh";
pub const SEQUENCE: &str = "STT";

/// Columns describing the student rather than a score. Matched verbatim.
pub const IDENTITY_COLUMNS: [&str; 7] = [
    SEQUENCE,
    CLASS_NAME,
    IDENTIFIER,
    INTERNAL_ID,
    FULL_NAME,
    EMAIL,
    BIRTH_DATE,
];

/// Display labels keyed by normalized column name.
pub const LABELS: [(&str, &str); 7] = [
    ("TX1", "Thường xuyên 1"),
    ("TX2", "Thường xuyên 2"),
    ("TX3", "Thường xuyên 3"),
    ("GKTN", "Giữa Kỳ Trắc Nghiệm"),
    ("GKTH", "Giữa Kỳ Thực Hành"),
    ("CKTN", "Cuối Kỳ Trắc Nghiệm"),
    ("CKTH", "Cuối Kỳ Thực Hành"),
];

/// Left-to-right order of the known score columns.
pub const PRIORITY: [&str; 7] = ["TX1", "TX2", "TX3", "GKTN", "GKTH", "CKTN", "CKTH"];

pub const EMPTY_CELL: &str = "-";
pub const NO_SCORE_COLUMNS_NOTICE: &str = "Không có cột điểm để hiển thị.";

/// `"TX 1"`, `"tx1"` and `"Tx\t1"` all become `"TX1"`.
pub fn normalize_key(name: &str) -> String {
    static BLANKS: OnceLock<Regex> = OnceLock::new();
    let blanks =
        BLANKS.get_or_init(|| Regex::new(r"[\s\x{FEFF}]+").expect("static pattern compiles"));
    blanks.replace_all(name, "").to_uppercase()
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Unescaped display label; unknown columns keep their original name.
pub fn label_for(column: &str) -> String {
    let key = normalize_key(column);
    LABELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| column.to_string())
}

pub fn priority_of(column: &str) -> Option<usize> {
    let key = normalize_key(column);
    PRIORITY.iter().position(|p| *p == key)
}

pub fn is_identity_column(column: &str) -> bool {
    IDENTITY_COLUMNS.contains(&column)
}

pub fn display_value(value: &Value) -> String {
    if value.is_blank() {
        EMPTY_CELL.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IdentityHeader {
    pub full_name: String,
    pub class_name: String,
    pub internal_id: String,
    pub identifier: String,
    pub email: String,
    pub birth_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScoreCell {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "cells", rename_all = "snake_case")]
pub enum ScoreTable {
    Columns(Vec<ScoreCell>),
    NoScoreColumns,
}

impl ScoreTable {
    pub fn cells(&self) -> &[ScoreCell] {
        match self {
            Self::Columns(cells) => cells,
            Self::NoScoreColumns => &[],
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.cells().iter().map(|c| c.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<&str> {
        self.cells().iter().map(|c| c.value.as_str()).collect()
    }
}

/// Display-ready student record. Strings are HTML-escaped when it came from
/// [`Renderer::render`] and raw when it came from [`Renderer::render_plain`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedRecord {
    pub header: IdentityHeader,
    pub scores: ScoreTable,
}

impl RenderedRecord {
    /// Copy with every header field, label and value HTML-escaped.
    pub fn escaped(&self) -> RenderedRecord {
        let h = &self.header;
        RenderedRecord {
            header: IdentityHeader {
                full_name: escape_html(&h.full_name),
                class_name: escape_html(&h.class_name),
                internal_id: escape_html(&h.internal_id),
                identifier: escape_html(&h.identifier),
                email: escape_html(&h.email),
                birth_date: escape_html(&h.birth_date),
            },
            scores: match &self.scores {
                ScoreTable::NoScoreColumns => ScoreTable::NoScoreColumns,
                ScoreTable::Columns(cells) => ScoreTable::Columns(
                    cells
                        .iter()
                        .map(|c| ScoreCell {
                            label: escape_html(&c.label),
                            value: escape_html(&c.value),
                        })
                        .collect(),
                ),
            },
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Renderer {
    collation: Collation,
}

impl Renderer {
    pub fn new(collation: Collation) -> Self {
        Self { collation }
    }

    pub fn collation(&self) -> Collation {
        self.collation
    }

    /// Known columns first in `PRIORITY` order, then the rest by collation.
    pub fn compare_columns(&self, a: &str, b: &str) -> Ordering {
        let rank = |column: &str| priority_of(column).unwrap_or(PRIORITY.len());
        rank(a)
            .cmp(&rank(b))
            .then_with(|| self.collation.compare(a, b))
    }

    /// Non-identity columns in display order.
    pub fn score_columns<'a>(&self, record: &'a Record) -> Vec<&'a str> {
        let mut columns: Vec<&str> = record
            .columns()
            .map(|(name, _)| name)
            .filter(|name| !is_identity_column(name))
            .collect();
        columns.sort_by(|a, b| self.compare_columns(a, b));
        columns
    }

    /// Escaped for insertion into markup.
    pub fn render(&self, record: &Record) -> RenderedRecord {
        self.render_plain(record).escaped()
    }

    /// Same layout as [`Renderer::render`] with the text left as written.
    pub fn render_plain(&self, record: &Record) -> RenderedRecord {
        let header = IdentityHeader {
            full_name: header_field(record, FULL_NAME),
            class_name: header_field(record, CLASS_NAME),
            internal_id: header_field(record, INTERNAL_ID),
            identifier: header_field(record, IDENTIFIER),
            email: header_field(record, EMAIL),
            birth_date: header_field(record, BIRTH_DATE),
        };

        let columns = self.score_columns(record);
        let scores = if columns.is_empty() {
            ScoreTable::NoScoreColumns
        } else {
            ScoreTable::Columns(
                columns
                    .into_iter()
                    .map(|column| ScoreCell {
                        label: label_for(column),
                        value: display_value(record.value(column)),
                    })
                    .collect(),
            )
        };

        RenderedRecord { header, scores }
    }
}

pub fn render(record: &Record) -> RenderedRecord {
    Renderer::default().render(record)
}

fn header_field(record: &Record, column: &str) -> String {
    record.value(column).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_whitespace_and_uppercases() {
        assert_eq!(normalize_key("TX 1"), "TX1");
        assert_eq!(normalize_key("gk tn"), "GKTN");
        assert_eq!(normalize_key(" ck\tth\n"), "CKTH");
        assert_eq!(normalize_key("tx\u{a0}2"), "TX2");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in ["TX 1", "điểm cộng", "Straße", "  ", "GKTH", "a\u{feff}b"] {
            let once = normalize_key(raw);
            assert_eq!(normalize_key(&once), once, "{raw}");
        }
    }

    #[test]
    fn spelling_variants_share_a_label() {
        assert_eq!(label_for("TX 1"), "Thường xuyên 1");
        assert_eq!(label_for("tx1"), "Thường xuyên 1");
        assert_eq!(label_for("Ck Th"), "Cuối Kỳ Thực Hành");
        assert_eq!(label_for("Ghi chú"), "Ghi chú");
    }

    #[test]
    fn escape_replaces_the_five_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("Nguyễn Văn A"), "Nguyễn Văn A");
    }

    #[test]
    fn escaped_output_has_no_raw_special_characters() {
        for raw in ["&", "<<>>", "\"'", "a&b<c>d\"e'f", "&amp;"] {
            let escaped = escape_html(raw);
            let stripped = escaped
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&quot;", "")
                .replace("&#39;", "");
            assert!(
                !stripped.contains(&['&', '<', '>', '"', '\''][..]),
                "{raw} -> {escaped}"
            );
        }
    }

    #[test]
    fn priority_columns_lead_then_unknowns_by_name() {
        let record: Record = ["CKTH", "TX2", "Custom", "TX1"]
            .into_iter()
            .map(|c| (c, Value::from(1)))
            .collect();
        assert_eq!(
            Renderer::default().score_columns(&record),
            vec!["TX1", "TX2", "CKTH", "Custom"]
        );
    }

    #[test]
    fn unknown_columns_use_vietnamese_order() {
        let record: Record = ["Xếp loại", "Điểm cộng", "Bonus", "gk th"]
            .into_iter()
            .map(|c| (c, Value::Null))
            .collect();
        assert_eq!(
            Renderer::new(Collation::Vietnamese).score_columns(&record),
            vec!["gk th", "Bonus", "Điểm cộng", "Xếp loại"]
        );
        assert_eq!(
            Renderer::new(Collation::Ordinal).score_columns(&record),
            vec!["gk th", "Bonus", "Xếp loại", "Điểm cộng"]
        );
    }

    #[test]
    fn identity_columns_are_excluded_from_scores() {
        let record = Record::new()
            .with(SEQUENCE, 1)
            .with(FULL_NAME, "Trần Thị B")
            .with(EMAIL, "b@example.com")
            .with("TX1", 9);
        let rendered = render(&record);
        assert_eq!(rendered.scores.labels(), vec!["Thường xuyên 1"]);
        assert_eq!(rendered.header.full_name, "Trần Thị B");
        assert_eq!(rendered.header.email, "b@example.com");
        assert_eq!(rendered.header.class_name, "");
    }

    #[test]
    fn blank_values_render_as_dash_but_zero_does_not() {
        let record = Record::new()
            .with("TX1", Value::Null)
            .with("TX2", "")
            .with("TX3", 0)
            .with("GKTN", Value::Absent);
        let rendered = render(&record);
        assert_eq!(rendered.scores.values(), vec!["-", "-", "0", "-"]);
    }

    #[test]
    fn values_and_labels_are_escaped() {
        let record = Record::new()
            .with(FULL_NAME, "<b>An</b>")
            .with("<i>", "a & b");
        let rendered = render(&record);
        assert_eq!(rendered.header.full_name, "&lt;b&gt;An&lt;/b&gt;");
        assert_eq!(rendered.scores.labels(), vec!["&lt;i&gt;"]);
        assert_eq!(rendered.scores.values(), vec!["a &amp; b"]);
    }

    #[test]
    fn plain_rendering_keeps_text_as_written() {
        let record = Record::new()
            .with(FULL_NAME, "O'Neil")
            .with("Ghi chú", "Đạt & tốt");
        let plain = Renderer::default().render_plain(&record);
        assert_eq!(plain.header.full_name, "O'Neil");
        assert_eq!(plain.scores.values(), vec!["Đạt & tốt"]);
        assert_eq!(plain.escaped(), render(&record));
    }

    #[test]
    fn identity_only_record_has_no_score_table() {
        let record = Record::new()
            .with(FULL_NAME, "Lê C")
            .with(INTERNAL_ID, "0042");
        let rendered = render(&record);
        assert_eq!(rendered.scores, ScoreTable::NoScoreColumns);
        assert_eq!(rendered.header.internal_id, "0042");
    }

    #[test]
    fn numeric_header_fields_use_display_form() {
        let record = Record::new().with(INTERNAL_ID, 42).with(BIRTH_DATE, Value::Null);
        let rendered = render(&record);
        assert_eq!(rendered.header.internal_id, "42");
        assert_eq!(rendered.header.birth_date, "");
    }
}
