//! Page routes: intro/main rendering, navigation and the prediction form
//!
//! Every request recomputes the visible page from its own inputs plus the
//! session's navigation flag.

use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use cqp_common::features::SCORE_MIN;
use cqp_common::{Error, Feature, FeatureCount, ModelCatalog, ModelEntry, NavAction, Page};
use tracing::{error, info, warn};

use crate::pages::{escape, render_intro, render_main, MainView};
use crate::session::Session;
use crate::AppState;

/// Main-page inputs resolved against the catalog
struct Selection<'a> {
    count: FeatureCount,
    models: &'a [ModelEntry],
    selected: &'a ModelEntry,
    country: String,
    /// Slider positions for display
    sliders: Vec<(Feature, f64)>,
    /// Values to predict with, or why they cannot be used
    values: Result<BTreeMap<String, f64>, String>,
}

impl<'a> Selection<'a> {
    /// Interpret request parameters the way the input widgets would
    ///
    /// An unknown feature count falls back to the default, a model outside
    /// the chosen list falls back to that list's default entry, and a
    /// slider without a value is drawn at the bottom of the score range.
    ///
    /// The values to predict with are exactly the feature fields the form
    /// submitted, including fields of features the selected model does not
    /// use. Display defaults never reach the handler, so a form that still
    /// carries another model's sliders is rejected there.
    fn from_params(catalog: &'a ModelCatalog, params: &HashMap<String, String>) -> Result<Self, Error> {
        let count = params
            .get("features")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .and_then(|n| FeatureCount::try_from(n).ok())
            .unwrap_or_default();

        let models = catalog.list_entries(count)?;
        let selected = match params.get("model") {
            Some(id) => match models.iter().find(|e| &e.identifier == id) {
                Some(entry) => entry,
                None => catalog.default_entry(count)?,
            },
            None => catalog.default_entry(count)?,
        };

        let mut submitted = Vec::new();
        let mut invalid = Vec::new();
        for feature in Feature::ALL {
            let Some(raw) = params.get(feature.name()) else {
                continue;
            };
            match raw.trim().parse::<f64>() {
                Ok(value) => {
                    submitted.push((feature, value));
                }
                Err(_) => invalid.push(format!("{} = '{}'", feature, raw)),
            }
        }

        let sliders = selected
            .features
            .iter()
            .map(|f| {
                let value = submitted
                    .iter()
                    .find(|(submitted, _)| submitted == f)
                    .map_or(SCORE_MIN, |(_, value)| *value);
                (*f, value)
            })
            .collect();

        let values: Result<BTreeMap<String, f64>, String> = if invalid.is_empty() {
            Ok(submitted
                .into_iter()
                .map(|(feature, value)| (feature.name().to_string(), value))
                .collect())
        } else {
            Err(format!("not a number: {}", invalid.join(", ")))
        };

        Ok(Self {
            count,
            models,
            selected,
            country: params
                .get("country")
                .map(|c| c.trim().to_string())
                .unwrap_or_default(),
            sliders,
            values,
        })
    }

    fn view(&self, outcome: Option<Result<cqp_common::PredictionResult, String>>) -> MainView<'a> {
        MainView {
            count: self.count,
            models: self.models,
            selected: self.selected,
            country: self.country.clone(),
            values: self.sliders.clone(),
            outcome,
        }
    }
}

/// Attach the session cookie for new sessions
fn with_session(session: Session, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if let Some(cookie) = session.set_cookie() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    response
}

fn error_page(e: &Error) -> Response {
    error!("Cannot render main page: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!(
            "<!DOCTYPE html><html><body><h1>Coffee Quality Prediction App</h1>\
             <p>{}</p></body></html>",
            escape(&e.to_string())
        )),
    )
        .into_response()
}

/// GET /
///
/// Intro or main page depending on the session's navigation state. On the
/// main page the query string carries the current selections.
pub async fn serve_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;

    let response = match state.sessions.page(session.id).await {
        Page::Intro => Html(render_intro()).into_response(),
        Page::Main => match Selection::from_params(state.handler.catalog(), &params) {
            Ok(selection) => Html(render_main(&selection.view(None))).into_response(),
            Err(e) => error_page(&e),
        },
    };

    with_session(session, response)
}

/// POST /enter
pub async fn enter(State(state): State<AppState>, headers: HeaderMap) -> Response {
    navigate(state, headers, NavAction::Enter).await
}

/// POST /back
pub async fn go_back(State(state): State<AppState>, headers: HeaderMap) -> Response {
    navigate(state, headers, NavAction::GoBack).await
}

async fn navigate(state: AppState, headers: HeaderMap, action: NavAction) -> Response {
    let session = state.sessions.resolve(&headers).await;
    state.sessions.apply(session.id, action).await;
    with_session(session, Redirect::to("/"))
}

/// POST /predict
///
/// Form submission from the main page. Renders the main page again with
/// either the prediction or the failure, replacing any earlier outcome.
pub async fn predict_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    let session = state.sessions.resolve(&headers).await;
    if state.sessions.page(session.id).await != Page::Main {
        return with_session(session, Redirect::to("/"));
    }

    let selection = match Selection::from_params(state.handler.catalog(), &params) {
        Ok(selection) => selection,
        Err(e) => return with_session(session, error_page(&e)),
    };

    let outcome = match &selection.values {
        Ok(values) => state
            .handler
            .predict(selection.selected, &selection.country, values)
            .await,
        Err(msg) => Err(Error::Validation(msg.clone())),
    };

    let outcome = match outcome {
        Ok(result) => {
            info!("{} predicted {:?}", result.model, result.prediction);
            Ok(result)
        }
        Err(e) => {
            warn!("Prediction with {} failed: {}", selection.selected.identifier, e);
            Err(e.to_string())
        }
    };

    with_session(
        session,
        Html(render_main(&selection.view(Some(outcome)))),
    )
}
