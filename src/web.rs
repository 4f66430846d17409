use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::error::Error;
use crate::output::{self, FormView, Notice, pdf};
use crate::planner::Planner;
use crate::trip::TripRequest;

pub struct AppState {
    pub planner: Planner,
}

#[derive(Debug, Deserialize)]
pub struct TripForm {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub days: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub guardrails: String,
}

impl TripForm {
    fn into_view(self, notice: Notice) -> FormView {
        FormView {
            destination: self.destination,
            days: self.days,
            interests: self.interests,
            guardrails: self.guardrails,
            notice: Some(notice),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportForm {
    pub destination: String,
    pub markdown: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan))
        .route("/export", post(export))
        .route("/selftest", get(self_test))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(planner: Planner, host: &str, port: u16) -> anyhow::Result<()> {
    let state = Arc::new(AppState { planner });
    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server running at http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

fn page(status: StatusCode, rendered: crate::error::Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("render failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn index() -> Response {
    let form = FormView {
        notice: Some(Notice::Info(
            "Fill in the fields above and click Generate Travel Plan.".into(),
        )),
        ..FormView::default()
    };
    page(StatusCode::OK, output::render_form_page(&form))
}

async fn plan(State(state): State<Arc<AppState>>, Form(form): Form<TripForm>) -> Response {
    let request = match TripRequest::from_form(
        &form.destination,
        &form.days,
        &form.interests,
        &form.guardrails,
    ) {
        Ok(request) => request,
        Err(e) => {
            let view = form.into_view(Notice::Warning(e.to_string()));
            return page(
                StatusCode::UNPROCESSABLE_ENTITY,
                output::render_form_page(&view),
            );
        }
    };

    match state.planner.plan(request).await {
        Ok(result) => page(StatusCode::OK, output::render_plan_page(&result)),
        Err(e) => {
            tracing::error!("itinerary generation failed: {e}");
            let status = match e {
                Error::AllModelsUnavailable { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let message = format!(
                "Could not generate a travel plan. Try again, \
                 or verify your API key/model access in Diagnostics. ({e})"
            );
            let view = form.into_view(Notice::Error(message));
            page(status, output::render_form_page(&view))
        }
    }
}

async fn export(Form(form): Form<ExportForm>) -> Response {
    match pdf::export_pdf(&form.destination, &form.markdown, Utc::now()) {
        Ok(bytes) => {
            let file_name: String = output::download_file_name(&form.destination)
                .chars()
                .map(|c| if c.is_ascii_graphic() { c } else { '_' })
                .collect();
            let disposition = format!("attachment; filename=\"{file_name}\"");
            (
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("PDF export failed: {e}");
            page(
                StatusCode::INTERNAL_SERVER_ERROR,
                output::render_export_failure(&form.destination, &form.markdown, &e),
            )
        }
    }
}

async fn self_test(State(state): State<Arc<AppState>>) -> Response {
    let notice = match state.planner.self_test().await {
        Ok(c) => Notice::Info(format!("Self-test response from {}: {}", c.model, c.text.trim())),
        Err(e) => Notice::Error(format!("Self-test failed: {e}")),
    };
    let form = FormView {
        notice: Some(notice),
        ..FormView::default()
    };
    page(StatusCode::OK, output::render_form_page(&form))
}

async fn health() -> &'static str {
    "ok"
}
