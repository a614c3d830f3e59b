//! HttpPriceApi against in-process axum backends

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use estate_api::{HttpPriceApi, PriceApi};
use estate_core::{Error, PredictionRequest};
use serde_json::{json, Value};
use std::time::Duration;

async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/api", addr)
}

fn request() -> PredictionRequest {
    PredictionRequest {
        city: "თბილისი".into(),
        district: Some("ვაკე".into()),
        area_m2: 80.0,
        bedrooms: Some(2),
        floor: Some(3),
        year: 2024,
        month: 6,
    }
}

fn metadata_json() -> Value {
    json!({
        "cities": ["თბილისი"],
        "districts_by_city": {"თბილისი": ["ვაკე"]},
        "validation_bounds": {
            "area_m2": {"min": 20, "max": 300},
            "bedrooms": {"min": 1, "max": 6},
            "floor": {"min": 1, "max": 40}
        },
        "available_dates": {"2023": [1, 6, 12], "2024": [3, 6]},
        "defaults": {"bedrooms": 2, "floor": 3, "year": 2024, "month": 6}
    })
}

#[tokio::test]
async fn test_metadata() {
    let base = spawn_backend(
        Router::new().route("/api/model/metadata", get(|| async { Json(metadata_json()) })),
    )
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let meta = api.metadata().await.unwrap();
    assert_eq!(meta.cities, vec!["თბილისი"]);
    assert_eq!(meta.months_for(2023), vec![1, 6, 12]);
    assert!(meta.validation_bounds.is_some());
}

#[tokio::test]
async fn test_districts_decodes_city_path() {
    let base = spawn_backend(Router::new().route(
        "/api/districts/:city",
        get(|Path(city): Path<String>| async move { Json(vec![format!("{}-center", city)]) }),
    ))
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let districts = api.districts("ქუთაისი").await.unwrap();
    assert_eq!(districts, vec!["ქუთაისი-center"]);
}

#[tokio::test]
async fn test_predict_success() {
    let base = spawn_backend(Router::new().route(
        "/api/predict",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["area_m2"], 80.0);
            Json(json!({"price_per_sqm": 1500.5, "total_price": 120040.0, "monthly_rent": 900.0}))
        }),
    ))
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let result = api.predict(&request()).await.unwrap();
    assert_eq!(result.total_price, 120040.0);
}

#[tokio::test]
async fn test_predict_http_error_is_network() {
    let base = spawn_backend(Router::new().route(
        "/api/predict",
        post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "bad district") }),
    ))
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let err = api.predict(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Network(ref m) if m.contains("422")));
}

#[tokio::test]
async fn test_predict_malformed_body() {
    let base = spawn_backend(
        Router::new().route("/api/predict", post(|| async { "this is not json" })),
    )
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let err = api.predict(&request()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}

#[tokio::test]
async fn test_predict_timeout() {
    let base = spawn_backend(Router::new().route(
        "/api/predict",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"price_per_sqm": 1.0, "total_price": 1.0, "monthly_rent": 1.0}))
        }),
    ))
    .await;
    let api = HttpPriceApi::new(&base)
        .unwrap()
        .predict_timeout(Duration::from_millis(100));

    let err = api.predict(&request()).await.unwrap_err();
    assert_eq!(err, Error::Timeout(100));
}

#[tokio::test]
async fn test_metadata_timeout() {
    let base = spawn_backend(Router::new().route(
        "/api/model/metadata",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(metadata_json())
        }),
    ))
    .await;
    let api = HttpPriceApi::new(&base)
        .unwrap()
        .request_timeout(Duration::from_millis(100));

    let err = api.metadata().await.unwrap_err();
    assert_eq!(err, Error::Timeout(100));
}

#[tokio::test]
async fn test_legacy_lookup_timeout() {
    let base = spawn_backend(
        Router::new()
            .route("/api/cities", get(|| async { Json(json!(["თბილისი"])) }))
            .route(
                "/api/districts/:city",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!([]))
                }),
            )
            .route("/api/available-dates", get(|| async { Json(json!({"2024": [1]})) })),
    )
    .await;
    let api = HttpPriceApi::new(&base)
        .unwrap()
        .request_timeout(Duration::from_millis(100));

    let err = api.metadata().await.unwrap_err();
    assert_eq!(err, Error::Timeout(100));
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpPriceApi::new(&format!("http://{}/api", addr)).unwrap();
    assert!(matches!(api.cities().await, Err(Error::Network(_))));
}

#[tokio::test]
async fn test_legacy_metadata_composition() {
    let base = spawn_backend(
        Router::new()
            .route("/api/cities", get(|| async { Json(json!(["ბათუმი", "თბილისი"])) }))
            .route(
                "/api/districts/:city",
                get(|Path(city): Path<String>| async move {
                    Json(json!([format!("{} district", city)]))
                }),
            )
            .route(
                "/api/available-dates",
                get(|| async { Json(json!({"2023": [4, 11], "2024": [2, 5]})) }),
            ),
    )
    .await;
    let api = HttpPriceApi::new(&base).unwrap();

    let meta = api.metadata().await.unwrap();
    assert_eq!(meta.cities, vec!["ბათუმი", "თბილისი"]);
    assert_eq!(meta.districts_for("ბათუმი"), ["ბათუმი district"]);
    assert!(meta.validation_bounds.is_none());
    assert_eq!((meta.defaults.year, meta.defaults.month), (2024, 5));
}
