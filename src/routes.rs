use crate::error::AppError;
use crate::pipeline::context::{PredictionContext, StressPrediction};
use crate::pipeline::encoding::SurveyAnswers;
use crate::pipeline::mappings::{Category, MappingTable};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<PredictionContext>,
    pub readiness: Arc<AtomicBool>,
    pub metrics: PrometheusHandle,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/predict", post(predict_endpoint))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: &'static str,
    pub feature_importance: BTreeMap<String, f64>,
    pub recommendations: Vec<String>,
}

impl From<StressPrediction> for PredictResponse {
    fn from(outcome: StressPrediction) -> Self {
        Self {
            prediction: outcome.prediction.label(),
            feature_importance: outcome.feature_importance.into_iter().collect(),
            recommendations: outcome.recommendations,
        }
    }
}

pub(crate) async fn predict_endpoint(
    State(state): State<AppState>,
    Json(answers): Json<SurveyAnswers>,
) -> Result<Json<PredictResponse>, AppError> {
    let outcome = state.context.predict(&answers).map_err(AppError::from)?;
    Ok(Json(PredictResponse::from(outcome)))
}

pub(crate) async fn landing_page(State(state): State<AppState>) -> Html<String> {
    Html(render_landing(state.context.mappings()))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// The landing form: one select per survey category, options taken from the
/// mapping table, submitted as JSON to the prediction endpoint.
fn render_landing(mappings: &MappingTable) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Stress Level Predictor</title>\n</head>\n<body>\n\
         <h1>Stress Level Predictor</h1>\n<form id=\"predictionForm\">\n",
    );

    for category in Category::ordered() {
        page.push_str(&format!(
            "<label for=\"{id}\">{label}</label>\n<select id=\"{id}\" name=\"{id}\">\n",
            id = category.field(),
            label = html_escape(category.label()),
        ));
        for (value, _code) in mappings.options(category) {
            let escaped = html_escape(value);
            page.push_str(&format!(
                "<option value=\"{escaped}\">{escaped}</option>\n"
            ));
        }
        page.push_str("</select><br>\n");
    }

    page.push_str(
        "<button type=\"submit\">Predict</button>\n</form>\n<pre id=\"result\"></pre>\n\
         <script>\n\
         document.getElementById('predictionForm').addEventListener('submit', async (e) => {\n\
           e.preventDefault();\n\
           const data = {};\n\
           for (const select of document.querySelectorAll('select')) {\n\
             data[select.id] = select.value;\n\
           }\n\
           const response = await fetch('/api/v1/predict', {\n\
             method: 'POST',\n\
             headers: { 'Content-Type': 'application/json' },\n\
             body: JSON.stringify(data)\n\
           });\n\
           const result = await response.json();\n\
           document.getElementById('result').textContent = JSON.stringify(result, null, 2);\n\
         });\n\
         </script>\n</body>\n</html>\n",
    );

    page
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
