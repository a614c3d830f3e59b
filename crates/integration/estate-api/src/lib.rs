//! Price-prediction backend client
//!
//! The dashboard talks to the backend through [`PriceApi`]; [`HttpPriceApi`]
//! is the reqwest implementation against the `/api` REST surface:
//!
//! | Endpoint            | Method | Body                         |
//! |---------------------|--------|------------------------------|
//! | `/cities`           | GET    | `[city]`                     |
//! | `/districts/{city}` | GET    | `[district]`                 |
//! | `/available-dates`  | GET    | `{year: [month]}`            |
//! | `/model/metadata`   | GET    | [`PredictionMetadata`]       |
//! | `/predict`          | POST   | [`PredictionRequest`] → [`PredictionResult`] |

mod http;

pub use http::HttpPriceApi;

use async_trait::async_trait;
use estate_core::{Defaults, Error, PredictionMetadata, PredictionRequest, PredictionResult, Result};
use std::collections::BTreeMap;

/// Backend operations the dashboard depends on
#[async_trait]
pub trait PriceApi: Send + Sync {
    async fn cities(&self) -> Result<Vec<String>>;

    async fn districts(&self, city: &str) -> Result<Vec<String>>;

    async fn available_dates(&self) -> Result<BTreeMap<i32, Vec<u32>>>;

    async fn metadata(&self) -> Result<PredictionMetadata>;

    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult>;
}

/// Build metadata from the per-resource endpoints of backends that predate
/// `/model/metadata`. Districts are fetched concurrently; defaults are the
/// latest available year and month. No validation bounds are known.
pub async fn compose_legacy_metadata<A>(api: &A) -> Result<PredictionMetadata>
where
    A: PriceApi + ?Sized,
{
    let (cities, available_dates) = futures::try_join!(api.cities(), api.available_dates())?;

    let districts = futures::future::try_join_all(cities.iter().map(|city| async move {
        let districts = api.districts(city).await?;
        Ok::<_, Error>((city.clone(), districts))
    }))
    .await?;

    let defaults = Defaults::derive(&available_dates)
        .ok_or_else(|| Error::MalformedResponse("no available dates".to_string()))?;

    Ok(PredictionMetadata {
        cities,
        districts_by_city: districts.into_iter().collect(),
        validation_bounds: None,
        available_dates,
        defaults,
    })
}
