//! Route tests driven through the axum router

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use estate_api::PriceApi;
use estate_config::Config;
use estate_core::{Error, PredictionMetadata, PredictionRequest, PredictionResult, Result};
use estate_dashboard::{AssetProbe, FormState, StaticFragments};
use estate_web::{create_router, AppState};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

#[derive(Default)]
struct Backend {
    online: bool,
    /// Metadata requests never answer
    hung: bool,
    predict_delay: Duration,
}

#[async_trait]
impl PriceApi for Backend {
    async fn cities(&self) -> Result<Vec<String>> {
        Ok(vec!["თბილისი".into()])
    }

    async fn districts(&self, _city: &str) -> Result<Vec<String>> {
        Ok(vec!["ვაკე".into(), "საბურთალო".into()])
    }

    async fn available_dates(&self) -> Result<BTreeMap<i32, Vec<u32>>> {
        Ok(BTreeMap::from([(2023, vec![1, 6, 12]), (2024, vec![3, 6])]))
    }

    async fn metadata(&self) -> Result<PredictionMetadata> {
        if self.hung {
            return std::future::pending().await;
        }
        if !self.online {
            return Err(Error::Network("connection refused".into()));
        }
        let mut metadata = estate_api::compose_legacy_metadata(self).await?;
        metadata.defaults.year = 2024;
        metadata.defaults.month = 6;
        Ok(metadata)
    }

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult> {
        assert_eq!(request.city, "თბილისი");
        tokio::time::sleep(self.predict_delay).await;
        Ok(PredictionResult {
            price_per_sqm: 1500.5,
            total_price: 120040.0,
            monthly_rent: 900.0,
        })
    }
}

struct AllCharts;

impl AssetProbe for AllCharts {
    fn exists(&self, _path: &str) -> bool {
        true
    }
}

fn app(online: bool) -> Router {
    create_router(state_with(Backend {
        online,
        ..Backend::default()
    }))
}

fn state_with(backend: Backend) -> Arc<AppState> {
    let mut config = Config::default();
    config.api.min_busy_ms = 0;
    let fragments = StaticFragments::new([
        ("analysis.html", "<h1>Analysis</h1><!-- view-body -->"),
        ("prediction.html", "<h1>Prediction</h1><!-- view-body -->"),
    ]);
    let state = AppState::new(config, Arc::new(backend), Arc::new(fragments), Arc::new(AllCharts)).unwrap();
    Arc::new(state)
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, cookie: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Open the dashboard and return the session cookie header value
async fn open_session(app: &Router) -> String {
    let response = app.clone().oneshot(get("/", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("estate_session="));
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn index_renders_analysis_view() {
    let app = app(true);
    let response = app.clone().oneshot(get("/", "")).await.unwrap();
    let html = body(response).await;

    assert!(html.contains("<h1>Analysis</h1>"));
    assert!(html.contains("id=\"analysis-body\""));
    assert!(html.contains("src=\"/charts/city_distribution_pie.png\""));
    assert!(html.contains("class=\"sidebar desktop-expanded\""));
}

#[tokio::test]
async fn same_view_is_not_reloaded() {
    let app = app(true);
    let cookie = open_session(&app).await;

    let response = app.clone().oneshot(get("/view/analysis", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get("/view/prediction", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("<h1>Prediction</h1>"));
    assert!(html.contains("hx-swap-oob=\"true\""));

    let response = app.clone().oneshot(get("/view/nowhere", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn district_category_and_city_change() {
    let app = app(true);
    let cookie = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(post("/analysis/category/price-by-district", &cookie, ""))
        .await
        .unwrap();
    let html = body(response).await;
    assert!(html.contains("id=\"analysis-city\""));

    let response = app
        .clone()
        .oneshot(post("/analysis/city", &cookie, "city=%E1%83%91%E1%83%90%E1%83%97%E1%83%A3%E1%83%9B%E1%83%98"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert_eq!(html.matches("/charts/avg_price_by_street/ბათუმი/").count(), 4);

    let response = app
        .clone()
        .oneshot(post("/analysis/category/unknown", &cookie, ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stale_view_requests_conflict() {
    let app = app(true);
    let cookie = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(get("/prediction/months?year=2023", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn prediction_flow() {
    let app = app(true);
    let cookie = open_session(&app).await;
    app.clone().oneshot(get("/view/prediction", &cookie)).await.unwrap();

    let response = app
        .clone()
        .oneshot(get("/prediction/months?year=2023", &cookie))
        .await
        .unwrap();
    let html = body(response).await;
    assert!(html.contains("<option value=\"12\" selected>December</option>"));

    let form = "city=%E1%83%97%E1%83%91%E1%83%98%E1%83%9A%E1%83%98%E1%83%A1%E1%83%98\
                &district=&area_m2=80&bedrooms=2&floor=3&year=2024&month=6";
    let response = app
        .clone()
        .oneshot(post("/prediction/submit", &cookie, form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("Price per sqm: $1500.50"));
    assert!(html.contains("Total apartment price: $120040.00"));
    assert!(html.contains("Estimated monthly rent: $900.00"));

    let response = app
        .clone()
        .oneshot(post("/prediction/submit", &cookie, "area_m2=abc"))
        .await
        .unwrap();
    let html = body(response).await;
    assert!(html.contains("class=\"result error\""));
}

#[tokio::test]
async fn backend_down_shows_retry_panel() {
    let app = app(false);
    let cookie = open_session(&app).await;

    let response = app.clone().oneshot(get("/view/prediction", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("Failed to load Price Prediction."));
    assert!(html.contains("hx-post=\"/view/prediction/reload\""));

    // nothing is active, so the next nav click tries again
    let response = app.clone().oneshot(get("/view/prediction", &cookie)).await.unwrap();
    assert!(body(response).await.contains("Failed to load"));
}

#[tokio::test]
async fn sidebar_toggle_and_resize() {
    let app = app(true);
    let cookie = open_session(&app).await;

    let response = app
        .clone()
        .oneshot(post("/sidebar/toggle", &cookie, "width=1024"))
        .await
        .unwrap();
    assert!(body(response).await.contains("sidebar desktop-collapsed"));

    let response = app
        .clone()
        .oneshot(post("/sidebar/resize", &cookie, "width=500"))
        .await
        .unwrap();
    assert!(body(response).await.contains("sidebar mobile-closed"));
}

#[tokio::test]
async fn health_and_stylesheet() {
    let app = app(true);

    let response = app.clone().oneshot(get("/api/health", "")).await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "estate-web");

    let response = app.clone().oneshot(get("/static/style.css", "")).await.unwrap();
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/css"
    );
}

const SUBMIT_FORM: &str = "city=%E1%83%97%E1%83%91%E1%83%98%E1%83%9A%E1%83%98%E1%83%A1%E1%83%98\
                           &district=&area_m2=80&bedrooms=2&floor=3&year=2024&month=6";

#[tokio::test]
async fn hung_backend_leaves_session_usable() {
    let app = create_router(state_with(Backend {
        online: true,
        hung: true,
        ..Backend::default()
    }));
    let cookie = open_session(&app).await;

    let loading = tokio::spawn(app.clone().oneshot(get("/view/prediction", &cookie)));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!loading.is_finished());

    let response = tokio::time::timeout(
        Duration::from_secs(1),
        app.clone().oneshot(post("/sidebar/toggle", &cookie, "width=1024")),
    )
    .await
    .expect("sidebar toggle waited on the metadata fetch")
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = tokio::time::timeout(Duration::from_secs(1), app.clone().oneshot(get("/", &cookie)))
        .await
        .expect("page reload waited on the metadata fetch")
        .unwrap();
    assert!(body(response).await.contains("<h1>Analysis</h1>"));

    loading.abort();
}

#[tokio::test]
async fn dropped_submit_still_settles_form() {
    let state = state_with(Backend {
        online: true,
        predict_delay: Duration::from_millis(200),
        ..Backend::default()
    });
    let app = create_router(state.clone());
    let cookie = open_session(&app).await;
    app.clone().oneshot(get("/view/prediction", &cookie)).await.unwrap();

    // the client gives up before the backend answers
    let submit = app.clone().oneshot(post("/prediction/submit", &cookie, SUBMIT_FORM));
    assert!(tokio::time::timeout(Duration::from_millis(50), submit).await.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let id = cookie.trim_start_matches("estate_session=").parse().unwrap();
    let (_, session, created) = state.session(Some(id)).await;
    assert!(!created);
    let mut session = session.lock().await;
    let form = session.router.prediction_mut().unwrap();
    assert_eq!(form.state(), &FormState::Ready);
    assert!(!form.is_submitting());
    assert!(!form.overlay().is_visible());
    assert!(form.result().is_some_and(|result| result.is_success()));
}
