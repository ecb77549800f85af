//! Server-rendered HTML for the comparison form.
//!
//! A single page: the form, an optional result or error panel, and a sidebar
//! with setup instructions. Form values and error messages go through
//! `html_escape`; the comparison report is rendered from Markdown with raw
//! HTML demoted to text.

use crate::config::ServerConfig;
use crate::output::ComparisonReport;
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// The values shown in the form's text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    pub spreadsheet_name: String,
    pub worksheet_name: String,
}

impl FormValues {
    pub fn defaults(server: &ServerConfig) -> Self {
        Self {
            spreadsheet_name: server.default_spreadsheet.clone(),
            worksheet_name: server.default_worksheet.clone(),
        }
    }
}

/// What to show under the form.
#[derive(Debug)]
pub enum Outcome<'a> {
    Report(&'a ComparisonReport),
    Error(String),
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 18rem; background: #f0f2f6; padding: 1.5rem; box-sizing: border-box; }
main { flex: 1; padding: 2rem 3rem; max-width: 56rem; }
label { display: block; margin-top: 1rem; font-weight: 600; }
input[type=text] { width: 100%; padding: .4rem; box-sizing: border-box; }
button { margin-top: 1.5rem; padding: .5rem 1.2rem; }
.error { background: #fde8e8; color: #9b1c1c; padding: .8rem 1rem; border-radius: .3rem; margin-top: 1.5rem; }
.result { background: #fafafa; border: 1px solid #ddd; padding: 0 1rem; }
.result table { border-collapse: collapse; }
.result th, .result td { border: 1px solid #ccc; padding: .3rem .6rem; }
#busy { display: none; margin-top: 1rem; }
#busy.on { display: block; }
"#;

const SCRIPT: &str = r#"
document.getElementById('compare-form').addEventListener('submit', function () {
  document.getElementById('busy').classList.add('on');
  document.getElementById('run').disabled = true;
});
"#;

/// Render the whole page.
pub fn render(server: &ServerConfig, form: &FormValues, outcome: Option<Outcome<'_>>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Curriculum Comparison App</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&sidebar(server));
    html.push_str("<main>\n<h1>Curriculum Comparison App</h1>\n");
    html.push_str(&form_html(form));
    match outcome {
        Some(Outcome::Report(report)) => html.push_str(&report_html(report)),
        Some(Outcome::Error(message)) => {
            html.push_str("<div class=\"error\" role=\"alert\">");
            html.push_str(&encode_text(&message));
            html.push_str("</div>\n");
        }
        None => {}
    }
    html.push_str("</main>\n<script>");
    html.push_str(SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

fn form_html(form: &FormValues) -> String {
    format!(
        r#"<form id="compare-form" method="post" action="/compare" enctype="multipart/form-data">
<label for="pdf">Upload PDF Brochure</label>
<input id="pdf" name="pdf" type="file" accept="application/pdf,.pdf">
<label for="spreadsheet_name">Spreadsheet Name</label>
<input id="spreadsheet_name" name="spreadsheet_name" type="text" value="{}">
<label for="worksheet_name">Worksheet Name</label>
<input id="worksheet_name" name="worksheet_name" type="text" value="{}">
<button id="run" type="submit">Run Comparison</button>
<div id="busy">Processing...</div>
</form>
"#,
        encode_double_quoted_attribute(&form.spreadsheet_name),
        encode_double_quoted_attribute(&form.worksheet_name),
    )
}

fn report_html(report: &ComparisonReport) -> String {
    format!(
        "<h2>Comparison Results</h2>\n<div class=\"result\">\n{}</div>\n\
         <p><small>{} brochure items, {} sheet rows, {} ms, {} / {} tokens</small></p>\n",
        render_markdown(&report.result),
        report.pdf_items.len(),
        report.sheet_rows,
        report.stats.total_duration_ms,
        report.stats.total_input_tokens,
        report.stats.total_output_tokens,
    )
}

/// Render model-written Markdown to HTML.
///
/// Raw HTML blocks and inline tags come out as escaped text, and links or
/// images with a script-capable scheme point nowhere.
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url.trim_start().to_ascii_lowercase();
    if ["javascript:", "vbscript:", "data:"]
        .iter()
        .any(|s| scheme.starts_with(s))
    {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn sidebar(server: &ServerConfig) -> String {
    let mut html = String::from(
        "<aside>\n<h2>Setup Instructions</h2>\n<ol>\n\
         <li>Put your OpenAI credentials under <code>general</code> in the secrets file.</li>\n\
         <li>Add the Google Sheets service-account credentials under <code>google_sheets</code>.</li>\n\
         <li>First add the curriculum to the master curriculum sheet below.</li>\n\
         </ol>\n",
    );
    if let Some(url) = server.master_sheet_url.as_deref() {
        html.push_str(&format!(
            "<p><a href=\"{}\" target=\"_blank\" rel=\"noopener\">&#128202; {}</a></p>\n",
            encode_double_quoted_attribute(url),
            encode_text(&server.default_spreadsheet),
        ));
    }
    html.push_str("</aside>\n");
    html
}
