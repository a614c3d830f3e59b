//! Route handlers for the dashboard

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use estate_core::{ChartCategory, Error};
use estate_dashboard::{FormInput, ViewLoad, ViewName};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::state::{AppState, Session, SESSION_COOKIE};
use crate::templates;
use crate::WebError;

type HandlerResult<T> = Result<T, WebError>;

/// Resolve the caller's session, issuing a cookie for new ones
async fn session_for(state: &AppState, cookies: &Cookies) -> Arc<Mutex<Session>> {
    let id = cookies
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let (id, session, created) = state.session(id).await;
    if created {
        let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
        cookies.add(cookie);
    }
    session
}

/// Mark `name` in the sidebar and route to it.
///
/// The session is unlocked while the fragment and backend are fetched, so
/// other requests on the same session are not held up by a slow backend.
/// `None` means the view was already active or a newer load replaced this
/// one. Load failures render the retry panel instead of an error status so
/// HTMX swaps them in.
async fn open_view(
    state: &AppState,
    session: &Mutex<Session>,
    name: ViewName,
    force: bool,
) -> HandlerResult<Option<String>> {
    let pending = {
        let mut session = session.lock().await;
        session.sidebar.select_view(name)?;
        if force {
            Some(session.router.begin_reload(name)?)
        } else {
            session.router.begin_load(name)?
        }
    };
    let Some(pending) = pending else {
        return Ok(None);
    };

    let loaded = pending.run(&state.services).await;

    let mut session = session.lock().await;
    let html = match session.router.finish(loaded) {
        Ok(ViewLoad::Unchanged | ViewLoad::Superseded) => return Ok(None),
        Ok(ViewLoad::Loaded { fragment }) => match session.router.current() {
            Some(controller) => templates::view_html(&fragment, controller),
            None => templates::load_failed_html(name, "view did not initialise"),
        },
        Err(err) => templates::load_failed_html(name, &err.to_string()),
    };
    Ok(Some(html))
}

// ============== Page Handlers ==============

/// Dashboard shell with the first view freshly loaded
pub async fn index(State(state): State<Arc<AppState>>, cookies: Cookies) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;

    let main = open_view(&state, &session, ViewName::ALL[0], true)
        .await?
        .unwrap_or_default();
    let session = session.lock().await;
    Ok(Html(templates::page_html(&session.sidebar, &main)))
}

// ============== View Router ==============

async fn view_response(state: &AppState, cookies: &Cookies, name: &str, force: bool) -> HandlerResult<Response> {
    let name: ViewName = name.parse()?;
    let session = session_for(state, cookies).await;

    match open_view(state, &session, name, force).await? {
        None => Ok(StatusCode::NO_CONTENT.into_response()),
        Some(html) => {
            let session = session.lock().await;
            let nav = templates::nav_html(&session.sidebar, true);
            Ok(Html(format!("{}{}", html, nav)).into_response())
        }
    }
}

/// Load a view; 204 when it is already active
pub async fn view(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(name): Path<String>,
) -> HandlerResult<Response> {
    view_response(&state, &cookies, &name, false).await
}

/// Retry a view load, bypassing the same-view guard
pub async fn view_reload(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(name): Path<String>,
) -> HandlerResult<Response> {
    view_response(&state, &cookies, &name, true).await
}

// ============== Analysis ==============

#[derive(Debug, Deserialize)]
pub struct CityInput {
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Deserialize)]
pub struct ModalQuery {
    pub src: String,
}

/// Category nav click
pub async fn analysis_category(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Path(key): Path<String>,
) -> HandlerResult<Html<String>> {
    let category = ChartCategory::from_key(&key)?;
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let view = session.router.analysis_mut()?;
    view.select_category(category)?;
    Ok(Html(templates::analysis_html(view)))
}

/// District-chart city change
pub async fn analysis_city(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(input): Form<CityInput>,
) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let view = session.router.analysis_mut()?;
    view.on_city_change(&input.city)?;
    Ok(Html(templates::analysis_html(view)))
}

pub async fn analysis_modal_open(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(query): Query<ModalQuery>,
) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let view = session.router.analysis_mut()?;
    view.open_modal(&query.src)?;
    Ok(Html(templates::modal_html(view.modal())))
}

pub async fn analysis_modal_close(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let view = session.router.analysis_mut()?;
    view.close_modal();
    Ok(Html(templates::modal_html(view.modal())))
}

// ============== Prediction ==============

#[derive(Debug, Deserialize)]
pub struct YearInput {
    #[serde(default)]
    pub year: String,
}

/// City -> district cascade
pub async fn prediction_districts(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(input): Query<CityInput>,
) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let form = session.router.prediction_mut()?;
    form.on_city_change(&input.city)?;
    Ok(Html(templates::district_field_html(form)))
}

/// Year -> month cascade
pub async fn prediction_months(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Query(input): Query<YearInput>,
) -> HandlerResult<Html<String>> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;

    let form = session.router.prediction_mut()?;
    form.on_year_change(&input.year)?;
    Ok(Html(templates::month_field_html(form)))
}

/// Submit the form and wait for the outcome.
///
/// The session lock is released while the request is in flight so a newer
/// submit can supersede it; a superseded request answers 204. The outcome
/// is applied by a detached task, so the form settles even when the client
/// goes away before the backend answers.
pub async fn prediction_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(input): Form<FormInput>,
) -> HandlerResult<Response> {
    let session = session_for(&state, &cookies).await;

    let pending = {
        let mut guard = session.lock().await;
        let form = guard.router.prediction_mut()?;
        match form.submit(&input, state.services.api.clone(), state.timing) {
            Ok(pending) => pending,
            Err(err @ (Error::InvalidInput(_) | Error::UnknownCity(_))) => {
                return Ok(Html(templates::result_error_html(&err.to_string())).into_response());
            }
            Err(err) => return Err(err.into()),
        }
    };

    let settle = tokio::spawn(async move {
        let ticket = pending.ticket();
        let outcome = pending.wait().await;

        let mut guard = session.lock().await;
        let form = guard.router.prediction_mut().ok()?;
        if !form.complete(ticket, outcome) {
            tracing::debug!("Dropping superseded prediction {:?}", ticket);
            return None;
        }
        Some(format!(
            "{}{}",
            templates::result_html(form.result()),
            templates::overlay_html(form.overlay(), true)
        ))
    });

    match settle.await? {
        Some(html) => Ok(Html(html).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

// ============== Chrome ==============

#[derive(Debug, Deserialize)]
pub struct WidthInput {
    pub width: u32,
}

pub async fn sidebar_toggle(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(input): Form<WidthInput>,
) -> Html<String> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;
    session.sidebar.toggle(input.width);
    Html(templates::sidebar_html(&session.sidebar))
}

pub async fn sidebar_resize(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(input): Form<WidthInput>,
) -> Html<String> {
    let session = session_for(&state, &cookies).await;
    let mut session = session.lock().await;
    session.sidebar.resize(input.width);
    Html(templates::sidebar_html(&session.sidebar))
}

// ============== API + Static ==============

/// Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "estate-web",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.uptime_secs(),
        "sessions": state.session_count().await,
    }))
}

/// CSS stylesheet
pub async fn style_css() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], templates::STYLE_CSS)
}
