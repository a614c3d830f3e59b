//! Prediction Form Controller
//!
//! ```text
//!   init ──► Loading ──ok──► Ready ──submit──► Submitting ──► Ready | Error
//!               │                                  ▲   │
//!               └─err──► Unavailable               └───┘ resubmit aborts
//! ```
//!
//! The form owns the select controls, the result panel and the loading
//! overlay. A submit spawns the request on the runtime and hands back a
//! [`PendingPrediction`]; its outcome is applied through [`PredictionForm::complete`],
//! which ignores tickets that a later submit has superseded.

use crate::chrome::LoadingOverlay;
use estate_api::PriceApi;
use estate_core::{
    month_name, Error, PredictionMetadata, PredictionRequest, PredictionResult, Result,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::Instant;

pub const TIMEOUT_MESSAGE: &str = "The prediction took too long. Please try again.";
pub const FAILURE_MESSAGE: &str = "Prediction failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    /// Metadata fetch in flight
    Loading,
    Ready,
    /// Predict request in flight, inputs locked
    Submitting,
    /// Last submit failed, form usable again
    Error(String),
    /// Metadata could not be loaded
    Unavailable,
}

impl FormState {
    pub fn is_interactive(&self) -> bool {
        matches!(self, FormState::Ready | FormState::Error(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    fn plain(value: impl ToString) -> Self {
        let value = value.to_string();
        Self {
            label: value.clone(),
            value,
        }
    }
}

/// A dropdown (or, with no options, a free input) and its current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectControl {
    options: Vec<SelectOption>,
    selected: Option<String>,
    enabled: bool,
}

impl SelectControl {
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn fill(&mut self, options: Vec<SelectOption>, selected: Option<String>) {
        self.selected = selected.filter(|s| options.is_empty() || options.iter().any(|o| &o.value == s));
        self.options = options;
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.options.clear();
        self.selected = None;
        self.enabled = false;
    }

    fn set_selected(&mut self, value: Option<&str>) {
        self.selected = value.filter(|v| !v.is_empty()).map(str::to_string);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormControls {
    pub city: SelectControl,
    pub district: SelectControl,
    pub area: SelectControl,
    pub bedrooms: SelectControl,
    pub floor: SelectControl,
    pub year: SelectControl,
    pub month: SelectControl,
}

/// Raw submitted form values. Unset or blank fields stay `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    pub city: Option<String>,
    pub district: Option<String>,
    pub area_m2: Option<String>,
    pub bedrooms: Option<String>,
    pub floor: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub predict_timeout: Duration,
    pub min_busy: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            predict_timeout: Duration::from_secs(10),
            min_busy: Duration::from_millis(1000),
        }
    }
}

/// What the result box shows after a submit
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPanel {
    Success(PredictionResult),
    TimedOut,
    /// Carries the underlying reason for logs; users see the generic message
    Failed(String),
}

impl ResultPanel {
    pub fn lines(&self) -> Vec<String> {
        match self {
            ResultPanel::Success(result) => result.display_lines().to_vec(),
            ResultPanel::TimedOut => vec![TIMEOUT_MESSAGE.to_string()],
            ResultPanel::Failed(_) => vec![FAILURE_MESSAGE.to_string()],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResultPanel::Success(_))
    }
}

/// Issue one predict request, bounded by the timeout and never resolving
/// before the minimum busy time has passed.
pub async fn run_prediction(api: &dyn PriceApi, request: &PredictionRequest, timing: Timing) -> ResultPanel {
    let started = Instant::now();

    let outcome = match tokio::time::timeout(timing.predict_timeout, api.predict(request)).await {
        Ok(Ok(result)) => ResultPanel::Success(result),
        Ok(Err(err)) if err.is_timeout() => ResultPanel::TimedOut,
        Ok(Err(err)) => ResultPanel::Failed(err.to_string()),
        Err(_) => ResultPanel::TimedOut,
    };

    tokio::time::sleep_until(started + timing.min_busy).await;
    outcome
}

/// Identifies one submit; only the latest is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug)]
pub struct PendingPrediction {
    ticket: Ticket,
    handle: JoinHandle<ResultPanel>,
}

impl PendingPrediction {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// The outcome, or `None` once the request has been aborted
    pub async fn wait(self) -> Option<ResultPanel> {
        match self.handle.await {
            Ok(outcome) => Some(outcome),
            Err(err) if err.is_cancelled() => None,
            Err(err) => Some(ResultPanel::Failed(err.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct PredictionForm {
    state: FormState,
    metadata: Option<PredictionMetadata>,
    controls: FormControls,
    result: Option<ResultPanel>,
    overlay: LoadingOverlay,
    generation: u64,
    in_flight: Option<(Ticket, AbortHandle)>,
}

impl Default for PredictionForm {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictionForm {
    pub fn new() -> Self {
        Self {
            state: FormState::Loading,
            metadata: None,
            controls: FormControls::default(),
            result: None,
            overlay: LoadingOverlay::default(),
            generation: 0,
            in_flight: None,
        }
    }

    /// Fetch metadata and populate every control
    pub async fn init(&mut self, api: &dyn PriceApi) -> Result<()> {
        self.state = FormState::Loading;
        match api.metadata().await {
            Ok(metadata) => {
                self.populate(metadata);
                tracing::info!("Prediction form ready");
                Ok(())
            }
            Err(err) => {
                tracing::error!("Failed to load prediction metadata: {}", err);
                self.state = FormState::Unavailable;
                Err(err)
            }
        }
    }

    /// Fill the controls from `metadata` and cascade the default year
    pub fn populate(&mut self, metadata: PredictionMetadata) {
        let defaults = metadata.defaults.clone();
        let controls = &mut self.controls;

        let default_city = defaults.city.filter(|c| metadata.cities.contains(c));
        controls.city.fill(
            metadata.cities.iter().map(SelectOption::plain).collect(),
            default_city.clone(),
        );
        match &default_city {
            Some(city) => controls.district.fill(
                metadata.districts_for(city).iter().map(SelectOption::plain).collect(),
                None,
            ),
            None => controls.district.disable(),
        }

        let range = |bounds: Option<estate_core::Bounds>| -> Vec<SelectOption> {
            bounds
                .map(|b| b.integer_range().into_iter().map(SelectOption::plain).collect())
                .unwrap_or_default()
        };
        let bounds = metadata.validation_bounds;
        controls.area.fill(range(bounds.map(|b| b.area_m2)), None);
        controls
            .bedrooms
            .fill(range(bounds.map(|b| b.bedrooms)), defaults.bedrooms.map(|v| v.to_string()));
        controls
            .floor
            .fill(range(bounds.map(|b| b.floor)), defaults.floor.map(|v| v.to_string()));

        let years = metadata.sorted_years();
        let year = if years.contains(&defaults.year) {
            Some(defaults.year)
        } else {
            years.last().copied()
        };
        controls.year.fill(
            years.into_iter().map(SelectOption::plain).collect(),
            year.map(|y| y.to_string()),
        );

        self.metadata = Some(metadata);
        self.fill_months(year);
        self.result = None;
        self.state = FormState::Ready;
    }

    /// City changed: repopulate districts. An empty city disables them.
    pub fn on_city_change(&mut self, city: &str) -> Result<()> {
        let metadata = self.metadata()?;
        if city.is_empty() {
            self.controls.city.set_selected(None);
            self.controls.district.disable();
            return Ok(());
        }
        if !metadata.cities.iter().any(|c| c == city) {
            return Err(Error::UnknownCity(city.to_string()));
        }

        let districts = metadata
            .districts_for(city)
            .iter()
            .map(SelectOption::plain)
            .collect();
        self.controls.city.set_selected(Some(city));
        self.controls.district.fill(districts, None);
        Ok(())
    }

    /// Year changed: repopulate months and preselect one
    pub fn on_year_change(&mut self, year: &str) -> Result<()> {
        self.metadata()?;
        if year.is_empty() {
            self.controls.year.set_selected(None);
            self.fill_months(None);
            return Ok(());
        }
        let parsed: i32 = parse_value("year", year)?;
        if !self.metadata()?.available_dates.contains_key(&parsed) {
            return Err(Error::InvalidInput(format!("year {} has no data", parsed)));
        }
        self.controls.year.set_selected(Some(year));
        self.fill_months(Some(parsed));
        Ok(())
    }

    fn fill_months(&mut self, year: Option<i32>) {
        let Some((metadata, year)) = self.metadata.as_ref().zip(year) else {
            self.controls.month.disable();
            return;
        };
        let months = metadata.months_for(year);
        if months.is_empty() {
            self.controls.month.disable();
            return;
        }
        let options = months
            .iter()
            .map(|&m| match month_name(m) {
                Some(name) => SelectOption::new(m.to_string(), name),
                None => SelectOption::plain(m),
            })
            .collect();
        let selected = metadata.month_for_year(year).map(|m| m.to_string());
        self.controls.month.fill(options, selected);
    }

    /// Validate and coerce submitted values into a request
    pub fn build_request(&self, input: &FormInput) -> Result<PredictionRequest> {
        let metadata = self.metadata()?;

        let city = required("city", &input.city)?;
        if !metadata.cities.iter().any(|c| c == city) {
            return Err(Error::UnknownCity(city.to_string()));
        }
        let district = optional_text(&input.district);
        if let Some(district) = district {
            if !metadata.districts_for(city).iter().any(|d| d == district) {
                return Err(Error::InvalidInput(format!(
                    "district '{}' is not available for '{}'",
                    district, city
                )));
            }
        }

        let area_m2: f64 = parse_value("area_m2", required("area_m2", &input.area_m2)?)?;
        if !area_m2.is_finite() || area_m2 <= 0.0 {
            return Err(Error::InvalidInput("area_m2 must be a positive number".to_string()));
        }
        let bedrooms: Option<u32> = parse_optional("bedrooms", &input.bedrooms)?;
        let floor: Option<i32> = parse_optional("floor", &input.floor)?;

        if let Some(bounds) = metadata.validation_bounds {
            check_bounds("area_m2", area_m2, bounds.area_m2)?;
            if let Some(bedrooms) = bedrooms {
                check_bounds("bedrooms", f64::from(bedrooms), bounds.bedrooms)?;
            }
            if let Some(floor) = floor {
                check_bounds("floor", f64::from(floor), bounds.floor)?;
            }
        }

        let year: i32 = parse_value("year", required("year", &input.year)?)?;
        let month: u32 = parse_value("month", required("month", &input.month)?)?;
        if !metadata.months_for(year).contains(&month) {
            return Err(Error::InvalidInput(format!(
                "month {} is not available for year {}",
                month, year
            )));
        }

        Ok(PredictionRequest {
            city: city.to_string(),
            district: district.map(str::to_string),
            area_m2,
            bedrooms,
            floor,
            year,
            month,
        })
    }

    /// Build the request, abort any in-flight one and spawn the new one.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit(&mut self, input: &FormInput, api: Arc<dyn PriceApi>, timing: Timing) -> Result<PendingPrediction> {
        if matches!(self.state, FormState::Loading | FormState::Unavailable) {
            return Err(Error::InvalidInput("the form is not ready".to_string()));
        }
        let request = self.build_request(input)?;
        self.remember(input);

        if let Some((ticket, handle)) = self.in_flight.take() {
            tracing::warn!("Superseding in-flight prediction {:?}", ticket);
            handle.abort();
        }

        self.generation += 1;
        let ticket = Ticket(self.generation);
        self.state = FormState::Submitting;
        self.overlay.show();

        let handle = tokio::spawn(async move { run_prediction(api.as_ref(), &request, timing).await });
        self.in_flight = Some((ticket, handle.abort_handle()));
        Ok(PendingPrediction { ticket, handle })
    }

    /// Apply the outcome of `ticket`. Returns `false` when it was superseded.
    pub fn complete(&mut self, ticket: Ticket, outcome: Option<ResultPanel>) -> bool {
        match self.in_flight {
            Some((current, _)) if current == ticket => {}
            _ => return false,
        }
        let Some(outcome) = outcome else {
            return false;
        };

        self.in_flight = None;
        self.overlay.hide();
        self.state = match &outcome {
            ResultPanel::Success(_) => FormState::Ready,
            ResultPanel::TimedOut => FormState::Error(TIMEOUT_MESSAGE.to_string()),
            ResultPanel::Failed(reason) => {
                tracing::warn!("Prediction failed: {}", reason);
                FormState::Error(FAILURE_MESSAGE.to_string())
            }
        };
        self.result = Some(outcome);
        true
    }

    /// Abort any in-flight request and lock the form
    pub fn dispose(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
        self.overlay.hide();
        self.state = FormState::Loading;
    }

    fn remember(&mut self, input: &FormInput) {
        let controls = &mut self.controls;
        controls.district.set_selected(input.district.as_deref());
        controls.area.set_selected(input.area_m2.as_deref().map(str::trim));
        controls.bedrooms.set_selected(input.bedrooms.as_deref().map(str::trim));
        controls.floor.set_selected(input.floor.as_deref().map(str::trim));
        controls.month.set_selected(input.month.as_deref());
    }

    pub fn metadata(&self) -> Result<&PredictionMetadata> {
        self.metadata
            .as_ref()
            .ok_or_else(|| Error::MissingElement("prediction metadata".to_string()))
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn controls(&self) -> &FormControls {
        &self.controls
    }

    pub fn result(&self) -> Option<&ResultPanel> {
        self.result.as_ref()
    }

    pub fn overlay(&self) -> &LoadingOverlay {
        &self.overlay
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }
}

fn optional_text(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(field: &str, raw: &'a Option<String>) -> Result<&'a str> {
    optional_text(raw).ok_or_else(|| Error::InvalidInput(format!("{} is required", field)))
}

fn parse_value<T: FromStr>(field: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{} must be a number, got '{}'", field, raw)))
}

fn parse_optional<T: FromStr>(field: &str, raw: &Option<String>) -> Result<Option<T>> {
    optional_text(raw).map(|v| parse_value(field, v)).transpose()
}

fn check_bounds(field: &str, value: f64, bounds: estate_core::Bounds) -> Result<()> {
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} must be between {} and {}",
            field, bounds.min, bounds.max
        )))
    }
}
