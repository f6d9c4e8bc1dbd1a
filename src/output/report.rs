use super::{render_outcome_html, OutputRecord};
use crate::lookup::StatusLine;
use crate::render::escape_html;

/// Standalone page: status line, then one section per submitted identifier.
pub fn render_html(status: &StatusLine, records: &[OutputRecord]) -> Vec<u8> {
    let meta_class = if status.is_failure() { "bad" } else { "meta" };
    let meta = escape_html(&status.to_string());

    let mut sections = String::new();
    for r in records {
        sections.push_str("    <section class=\"result\">\n");
        sections.push_str(&format!(
            "      <h2>{}</h2>\n",
            escape_html(r.identifier())
        ));
        sections.push_str(&render_outcome_html(r));
        sections.push_str("    </section>\n");
    }

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="vi">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Tra cứu điểm</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 0; background: #f8fafc; color: #0f172a; }}
    main {{ max-width: 960px; margin: 0 auto; padding: 24px; }}
    .meta {{ color: #475569; }}
    .ok {{ color: #15803d; font-weight: 600; }}
    .bad {{ color: #b91c1c; font-weight: 600; }}
    .result {{ background: #fff; border: 1px solid #e2e8f0; border-radius: 12px; padding: 16px; margin: 16px 0; }}
    .table-wrap {{ overflow-x: auto; margin-top: 12px; }}
    .table {{ border-collapse: collapse; white-space: nowrap; }}
    .table th, .table td {{ border: 1px solid #cbd5e1; padding: 6px 10px; text-align: center; }}
    .table th {{ background: #f1f5f9; }}
  </style>
</head>
<body>
  <main>
    <h1>Tra cứu điểm</h1>
    <p id="meta" class="{meta_class}">{meta}</p>
{sections}  </main>
</body>
</html>
"####
    );
    html.into_bytes()
}
