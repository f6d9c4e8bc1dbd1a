use std::io::Write;

use crate::collate::Collation;
use crate::dataset::{DataSource, Dataset, Loader, LoaderOptions, Record, Value};
use crate::lookup::{lookup, LookupError, Session};
use crate::output::{self, OutputFormat};
use crate::render::{render, Renderer, ScoreTable};

const SAMPLE: &str = r#"{
  "last_updated": "2024-05-01 08:00:00",
  "records": {
    "ABC123": {"STT": 1, "Họ và tên": "Nguyễn Văn A", "Tên lớp": "10A1", "TX1": 8, "TX2": null},
    "XYZ789": {"Họ và tên": "Trần Thị B", "CKTH": 9.5, "Ghi chú": "", "tx 3": 0, "TX1": "7"},
    "ONLY01": {"Họ và tên": "Lê C", "MSHS": "HS001"},
    "NULL01": null
  }
}"#;

fn sample() -> Dataset {
    Dataset::from_json_str(SAMPLE).unwrap()
}

fn offline() -> LoaderOptions {
    LoaderOptions {
        system_proxy: false,
        ..LoaderOptions::default()
    }
}

#[test]
fn documented_example_renders_header_and_scores() {
    let dataset = sample();
    let rendered = lookup(Some(&dataset), "ABC123").unwrap();
    assert_eq!(rendered.header.full_name, "Nguyễn Văn A");
    assert_eq!(rendered.header.class_name, "10A1");
    assert_eq!(rendered.header.email, "");
    assert_eq!(
        rendered.scores.labels(),
        vec!["Thường xuyên 1", "Thường xuyên 2"]
    );
    assert_eq!(rendered.scores.values(), vec!["8", "-"]);
}

#[test]
fn mixed_columns_follow_priority_then_collation() {
    let dataset = sample();
    let rendered = lookup(Some(&dataset), "XYZ789").unwrap();
    assert_eq!(
        rendered.scores.labels(),
        vec![
            "Thường xuyên 1",
            "Thường xuyên 3",
            "Cuối Kỳ Thực Hành",
            "Ghi chú"
        ]
    );
    assert_eq!(rendered.scores.values(), vec!["7", "0", "9.5", "-"]);
}

#[test]
fn identity_only_record_is_a_notice() {
    let dataset = sample();
    let rendered = lookup(Some(&dataset), "ONLY01").unwrap();
    assert_eq!(rendered.scores, ScoreTable::NoScoreColumns);
    assert_eq!(rendered.header.internal_id, "HS001");
}

#[test]
fn null_entries_and_unknown_ids_are_not_found() {
    let dataset = sample();
    for id in ["NULL01", "abc123", "ABC 123"] {
        assert_eq!(
            lookup(Some(&dataset), id),
            Err(LookupError::NotFound {
                identifier: id.to_string()
            })
        );
    }
}

#[test]
fn unknown_columns_order_depends_on_collation() {
    let record = Record::new()
        .with("Điểm cộng", 1)
        .with("Đánh giá", "Đạt")
        .with("Bài tập", 5)
        .with("Zeta", 2);
    let vi = Renderer::new(Collation::Vietnamese).render(&record);
    assert_eq!(vi.scores.labels(), vec!["Bài tập", "Đánh giá", "Điểm cộng", "Zeta"]);

    let ordinal = Renderer::new(Collation::Ordinal).render(&record);
    assert_eq!(
        ordinal.scores.labels(),
        vec!["Bài tập", "Zeta", "Điểm cộng", "Đánh giá"]
    );

    let record = Record::new().with("ăn", 1).with("az", 2).with("b", 3);
    let vi = Renderer::new(Collation::Vietnamese).render(&record);
    assert_eq!(vi.scores.labels(), vec!["az", "ăn", "b"]);
    let ordinal = Renderer::new(Collation::Ordinal).render(&record);
    assert_eq!(ordinal.scores.labels(), vec!["az", "b", "ăn"]);
}

#[test]
fn rendering_never_fails_on_odd_values() {
    let record = Record::new()
        .with("TX1", Value::Text("<b>10</b>".to_string()))
        .with("TX2", Value::Absent)
        .with("   ", "blank name")
        .with("\u{feff}GK TN", 6.25)
        .with("CKTN", 1e21);
    let rendered = render(&record);
    assert_eq!(
        rendered.scores.labels(),
        vec![
            "Thường xuyên 1",
            "Thường xuyên 2",
            "Giữa Kỳ Trắc Nghiệm",
            "Cuối Kỳ Trắc Nghiệm",
            "   "
        ]
    );
    assert_eq!(rendered.scores.values()[0], "&lt;b&gt;10&lt;/b&gt;");
    assert_eq!(rendered.scores.values()[1], "-");
    assert_eq!(rendered.scores.values()[2], "6.25");
    assert_eq!(rendered.scores.values()[3], "1e+21");
}

#[test]
fn bad_entry_beside_good_ones_is_only_not_found() {
    let dataset = Dataset::from_json_str(
        r#"{"last_updated": "x", "records": {"A1": {"Họ và tên": "An", "TX1": 8}, "B2": "oops"}}"#,
    )
    .unwrap();
    assert!(lookup(Some(&dataset), "A1").is_ok());
    assert_eq!(
        lookup(Some(&dataset), "B2"),
        Err(LookupError::NotFound {
            identifier: "B2".to_string()
        })
    );
}

#[tokio::test]
async fn file_backed_session_end_to_end() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let source = DataSource::parse(&file.path().display().to_string()).unwrap();
    let loader = Loader::new(source, &offline()).unwrap();
    let session = Session::start(&loader, Renderer::default()).await;

    assert_eq!(
        session.status_line().to_string(),
        "Cập nhật lần cuối: 2024-05-01 08:00:00"
    );

    let records = vec![
        output::build_record("ABC123", &session.submit_plain("ABC123")),
        output::build_record("  ", &session.submit_plain("  ")),
        output::build_record("NOPE", &session.submit_plain("NOPE")),
    ];
    let text = String::from_utf8(output::render(
        OutputFormat::Text,
        &session.status_line(),
        &records,
    ))
    .unwrap();
    assert!(text.starts_with("Cập nhật lần cuối: 2024-05-01 08:00:00\n"));
    assert!(text.contains("[ABC123]\nTìm thấy dữ liệu.\nHọ và tên: Nguyễn Văn A\n"));
    assert!(text.contains("Vui lòng nhập mã định danh."));
    assert!(text.contains("[NOPE]\nKhông tìm thấy mã định danh này.\n"));
}

#[tokio::test]
async fn failed_load_leaves_session_without_data() {
    let dir = tempfile::tempdir().unwrap();
    let source = DataSource::File(dir.path().join("missing.json"));
    let loader = Loader::new(source, &offline()).unwrap();
    let session = Session::start(&loader, Renderer::default()).await;

    assert!(session.dataset().is_none());
    assert!(session.load_error().is_some());
    assert!(session.status_line().is_failure());
    assert_eq!(session.submit("ABC123"), Err(LookupError::NoData));

    let html = String::from_utf8(output::render(
        OutputFormat::Html,
        &session.status_line(),
        &[output::build_record("ABC123", &session.submit_plain("ABC123"))],
    ))
    .unwrap();
    assert!(html.contains("class=\"bad\">Lỗi tải dữ liệu: "));
    assert!(html.contains("<p class=\"bad\">Chưa có dữ liệu.</p>"));
}
