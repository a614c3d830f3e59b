//! Prediction data model
//!
//! Shapes exchanged with the price-prediction backend: the metadata that
//! parameterizes the form controls, the request built from the form, and the
//! three-figure result.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive numeric bounds for a form field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Every integer in `[ceil(min), floor(max)]`, ascending
    pub fn integer_range(&self) -> Vec<i64> {
        let lo = self.min.ceil() as i64;
        let hi = self.max.floor() as i64;
        if lo > hi {
            return Vec::new();
        }
        (lo..=hi).collect()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Per-field bounds enforced by the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationBounds {
    pub area_m2: Bounds,
    pub bedrooms: Bounds,
    pub floor: Bounds,
}

/// Values preselected when the form loads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub floor: Option<i32>,
    pub year: i32,
    pub month: u32,
}

impl Defaults {
    /// Latest available year and its latest month, nothing else preselected.
    ///
    /// Returns `None` when no dates are available.
    pub fn derive(available_dates: &BTreeMap<i32, Vec<u32>>) -> Option<Self> {
        let (year, months) = available_dates
            .iter()
            .rev()
            .find(|(_, months)| !months.is_empty())?;
        let month = months.iter().copied().max()?;
        Some(Self {
            city: None,
            bedrooms: None,
            floor: None,
            year: *year,
            month,
        })
    }
}

/// Configuration data for the prediction form, fetched once per activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub cities: Vec<String>,
    #[serde(default)]
    pub districts_by_city: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub validation_bounds: Option<ValidationBounds>,
    pub available_dates: BTreeMap<i32, Vec<u32>>,
    pub defaults: Defaults,
}

impl PredictionMetadata {
    /// Years with data, ascending
    pub fn sorted_years(&self) -> Vec<i32> {
        self.available_dates.keys().copied().collect()
    }

    /// Months available for `year`, ascending and deduplicated
    pub fn months_for(&self, year: i32) -> Vec<u32> {
        let mut months = self
            .available_dates
            .get(&year)
            .cloned()
            .unwrap_or_default();
        months.sort_unstable();
        months.dedup();
        months
    }

    /// Districts of `city` in backend order, empty for unknown cities
    pub fn districts_for(&self, city: &str) -> &[String] {
        self.districts_by_city
            .get(city)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Month to preselect after choosing `year`.
    ///
    /// The default month for the default year, the latest month otherwise.
    /// Falls back to the latest month when the default month is not offered.
    pub fn month_for_year(&self, year: i32) -> Option<u32> {
        let months = self.months_for(year);
        if year == self.defaults.year && months.contains(&self.defaults.month) {
            return Some(self.defaults.month);
        }
        months.last().copied()
    }
}

/// Payload posted to the predict endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub city: String,
    pub district: Option<String>,
    pub area_m2: f64,
    pub bedrooms: Option<u32>,
    pub floor: Option<i32>,
    pub year: i32,
    pub month: u32,
}

/// Price estimate returned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub price_per_sqm: f64,
    pub total_price: f64,
    pub monthly_rent: f64,
}

impl PredictionResult {
    /// Reject values that cannot be displayed as prices
    pub fn validate(self) -> Result<Self> {
        let fields = [
            ("price_per_sqm", self.price_per_sqm),
            ("total_price", self.total_price),
            ("monthly_rent", self.monthly_rent),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(Error::MalformedResponse(format!(
                    "{} is not a finite number",
                    name
                )));
            }
        }
        Ok(self)
    }

    /// The three result lines, each with two decimal places
    pub fn display_lines(&self) -> [String; 3] {
        [
            format!("Price per sqm: ${:.2}", self.price_per_sqm),
            format!("Total apartment price: ${:.2}", self.total_price),
            format!("Estimated monthly rent: ${:.2}", self.monthly_rent),
        ]
    }
}
