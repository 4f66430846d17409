pub mod pdf;

use crate::error::{Error, Result};
use crate::planner::ItineraryResult;
use askama::Template;
use pulldown_cmark::{Event, Options, Parser, html};

#[derive(Template)]
#[template(path = "plan.html")]
struct PlanPage<'a> {
    destination: &'a str,
    model: &'a str,
    usage: String,
    generated_at: String,
    plan_html: String,
    raw_markdown: &'a str,
    download_name: String,
    export_error: String,
}

#[derive(Template)]
#[template(path = "form.html")]
struct FormPage<'a> {
    form: &'a FormView,
    notice: &'a str,
    notice_class: &'a str,
}

/// Form values echoed back to the user, plus an optional notice.
#[derive(Debug, Clone, Default)]
pub struct FormView {
    pub destination: String,
    pub days: String,
    pub interests: String,
    pub guardrails: String,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone)]
pub enum Notice {
    Info(String),
    Warning(String),
    Error(String),
}

impl Notice {
    fn parts(&self) -> (&str, &str) {
        match self {
            Self::Info(m) => (m.as_str(), "notice-info"),
            Self::Warning(m) => (m.as_str(), "notice-warning"),
            Self::Error(m) => (m.as_str(), "notice-error"),
        }
    }
}

pub fn render_form_page(form: &FormView) -> Result<String> {
    let (notice, notice_class) = form.notice.as_ref().map(Notice::parts).unwrap_or(("", ""));
    FormPage {
        form,
        notice,
        notice_class,
    }
    .render()
    .map_err(|e| Error::template(format!("form page: {e}")))
}

pub fn render_plan_page(result: &ItineraryResult) -> Result<String> {
    PlanPage {
        destination: result.request.destination(),
        model: &result.model,
        usage: result.usage.map(|u| u.to_string()).unwrap_or_default(),
        generated_at: result.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        plan_html: markdown_to_html(&result.markdown),
        raw_markdown: &result.markdown,
        download_name: download_file_name(result.request.destination()),
        export_error: String::new(),
    }
    .render()
    .map_err(|e| Error::template(format!("plan page: {e}")))
}

/// Plan page shown when the PDF export failed: the itinerary stays visible.
pub fn render_export_failure(destination: &str, markdown: &str, error: &Error) -> Result<String> {
    PlanPage {
        destination,
        model: "",
        usage: String::new(),
        generated_at: String::new(),
        plan_html: markdown_to_html(markdown),
        raw_markdown: markdown,
        download_name: download_file_name(destination),
        export_error: error.to_string(),
    }
    .render()
    .map_err(|e| Error::template(format!("plan page: {e}")))
}

/// Render model markdown to HTML. Raw HTML in the model output is shown as
/// text, never injected.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// `travel_guide_Tokyo_Japan.pdf` for "Tokyo, Japan".
pub fn download_file_name(destination: &str) -> String {
    let stem: String = destination
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| !matches!(c, '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|'))
        .collect();
    format!("travel_guide_{stem}.pdf")
}
