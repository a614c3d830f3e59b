//! Chart Catalog
//!
//! Static mapping from a nav category to the precomputed chart images that
//! the analysis pipeline writes under the charts directory. One category
//! (`PriceByDistrict`) is parameterized by a city; the sectioned categories
//! resolve to titled groups.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Cities the chart generator produces per-city charts for
pub const CITIES: [&str; 3] = ["ბათუმი", "თბილისი", "ქუთაისი"];

/// City shown when the city-dependent category is first activated
pub const DEFAULT_CITY: &str = "ქუთაისი";

/// Listing transaction type, as used in chart file stems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Sale,
    DailyRent,
    MonthlyRent,
    Mortgage,
}

impl TransactionType {
    /// Display order of the four sub-category charts
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Sale,
        TransactionType::DailyRent,
        TransactionType::MonthlyRent,
        TransactionType::Mortgage,
    ];

    /// File stem written by the chart generator
    pub fn file_stem(&self) -> &'static str {
        match self {
            TransactionType::Sale => "იყიდება",
            TransactionType::DailyRent => "ქირავდება დღიურად",
            TransactionType::MonthlyRent => "ქირავდება თვიურად",
            TransactionType::Mortgage => "გირავდება",
        }
    }
}

/// A nav category of the analysis view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartCategory {
    Distribution,
    PriceByCity,
    PricePerSqm,
    AreaBin,
    PriceByDistrict,
    MarketOverview,
    PriceAnalysis,
    ApartmentCharacteristics,
    LocationInsights,
    TimeAnalysis,
}

impl ChartCategory {
    /// Nav order. The first entry is the default category.
    pub const ALL: [ChartCategory; 10] = [
        ChartCategory::Distribution,
        ChartCategory::PriceByCity,
        ChartCategory::PricePerSqm,
        ChartCategory::AreaBin,
        ChartCategory::PriceByDistrict,
        ChartCategory::MarketOverview,
        ChartCategory::PriceAnalysis,
        ChartCategory::ApartmentCharacteristics,
        ChartCategory::LocationInsights,
        ChartCategory::TimeAnalysis,
    ];

    pub fn default_category() -> Self {
        Self::ALL[0]
    }

    pub fn key(&self) -> &'static str {
        match self {
            ChartCategory::Distribution => "distribution",
            ChartCategory::PriceByCity => "price-by-city",
            ChartCategory::PricePerSqm => "price-per-sqm",
            ChartCategory::AreaBin => "area-bin",
            ChartCategory::PriceByDistrict => "price-by-district",
            ChartCategory::MarketOverview => "market-overview",
            ChartCategory::PriceAnalysis => "price-analysis",
            ChartCategory::ApartmentCharacteristics => "apartment-characteristics",
            ChartCategory::LocationInsights => "location-insights",
            ChartCategory::TimeAnalysis => "time-analysis",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartCategory::Distribution => "City Distribution",
            ChartCategory::PriceByCity => "Average Price by City",
            ChartCategory::PricePerSqm => "Price per sqm by City",
            ChartCategory::AreaBin => "Price by Area",
            ChartCategory::PriceByDistrict => "Price by District",
            ChartCategory::MarketOverview => "Market Overview",
            ChartCategory::PriceAnalysis => "Price Analysis",
            ChartCategory::ApartmentCharacteristics => "Apartment Characteristics",
            ChartCategory::LocationInsights => "Location Insights",
            ChartCategory::TimeAnalysis => "Time Analysis",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key() == key)
            .ok_or_else(|| Error::UnknownCategory(key.to_string()))
    }

    /// Whether the city selector drives this category
    pub fn requires_city(&self) -> bool {
        matches!(self, ChartCategory::PriceByDistrict)
    }
}

impl std::fmt::Display for ChartCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Charts shown together, optionally under a section title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartGroup {
    pub title: Option<String>,
    pub paths: Vec<String>,
}

impl ChartGroup {
    pub fn untitled(paths: Vec<String>) -> Self {
        Self { title: None, paths }
    }

    pub fn titled(title: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            title: Some(title.into()),
            paths,
        }
    }

    /// All paths of all groups in display order
    pub fn all_paths(groups: &[ChartGroup]) -> Vec<String> {
        groups.iter().flat_map(|g| g.paths.iter().cloned()).collect()
    }
}

type Section = (&'static str, &'static [&'static str]);

const MARKET_OVERVIEW: &[Section] = &[
    ("City Distribution", &["market_overview/city_distribution_pie_chart.png"]),
    ("Transaction Type", &["market_overview/transaction_type_bar_chart.png"]),
];

const PRICE_ANALYSIS: &[Section] = &[
    (
        "Median Price Comparison",
        &[
            "price_analysis/median_bar_charts/median_price_for_sale.png",
            "price_analysis/median_bar_charts/median_price_monthly_rent.png",
        ],
    ),
    (
        "Price Distribution Histograms",
        &[
            "price_analysis/price_histograms/price_for_sale_batumi.png",
            "price_analysis/price_histograms/price_for_sale_kutaisi.png",
            "price_analysis/price_histograms/price_for_sale_tbilisi.png",
            "price_analysis/price_histograms/price_monthly_rent_batumi.png",
            "price_analysis/price_histograms/price_monthly_rent_kutaisi.png",
            "price_analysis/price_histograms/price_monthly_rent_tbilisi.png",
        ],
    ),
    (
        "Price per sqm Distribution",
        &[
            "price_analysis/price_per_sqm_boxplots/price_per_sqm_for_sale.png",
            "price_analysis/price_per_sqm_boxplots/price_per_sqm_monthly_rent.png",
        ],
    ),
];

const APARTMENT_CHARACTERISTICS: &[Section] = &[
    (
        "Area Histograms",
        &[
            "apartment_characteristics/area_histograms/area_for_sale.png",
            "apartment_characteristics/area_histograms/area_monthly_rent.png",
        ],
    ),
    (
        "Bedrooms vs Price Boxplot",
        &[
            "apartment_characteristics/bedrooms_vs_price_boxplot/for_sale.png",
            "apartment_characteristics/bedrooms_vs_price_boxplot/monthly_rent.png",
        ],
    ),
    (
        "Floor Distribution by City",
        &[
            "apartment_characteristics/floor_bar_charts/floor_batumi.png",
            "apartment_characteristics/floor_bar_charts/floor_kutaisi.png",
            "apartment_characteristics/floor_bar_charts/floor_tbilisi.png",
        ],
    ),
];

const LOCATION_INSIGHTS: &[Section] = &[
    (
        "Districts Distribution by City",
        &[
            "location_insights/districts_bar_charts/districts_in_batumi.png",
            "location_insights/districts_bar_charts/districts_in_kutaisi.png",
            "location_insights/districts_bar_charts/districts_in_tbilisi.png",
        ],
    ),
    (
        "Price per sqm by District",
        &[
            "location_insights/price_per_sqm_by_district_boxplots/batumi.png",
            "location_insights/price_per_sqm_by_district_boxplots/kutaisi.png",
            "location_insights/price_per_sqm_by_district_boxplots/tbilisi.png",
        ],
    ),
];

const TIME_ANALYSIS: &[Section] = &[
    (
        "Median Price per sqm Trend",
        &[
            "time_analysis/price_trend/median_price_per_sqm_batumi.png",
            "time_analysis/price_trend/median_price_per_sqm_kutaisi.png",
            "time_analysis/price_trend/median_price_per_sqm_tbilisi.png",
        ],
    ),
    ("Listings Over Time", &["time_analysis/listings_over_time.png"]),
];

/// Resolves categories to image paths rooted at the charts URL prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartCatalog {
    root: String,
}

impl ChartCatalog {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    /// URL prefix every chart path starts with
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn cities(&self) -> &'static [&'static str] {
        &CITIES
    }

    pub fn default_city(&self) -> &'static str {
        DEFAULT_CITY
    }

    pub fn is_known_city(&self, city: &str) -> bool {
        CITIES.contains(&city)
    }

    /// Resolve a category to its chart groups.
    ///
    /// `city` is only consulted for city-dependent categories, which fail
    /// without one.
    pub fn resolve(&self, category: ChartCategory, city: Option<&str>) -> Result<Vec<ChartGroup>> {
        let groups = match category {
            ChartCategory::Distribution => {
                vec![ChartGroup::untitled(vec![self.path("city_distribution_pie.png")])]
            }
            ChartCategory::PriceByCity => vec![ChartGroup::untitled(
                TransactionType::ALL
                    .iter()
                    .map(|t| self.path(&format!("avg_price_by_city/{}.png", t.file_stem())))
                    .collect(),
            )],
            ChartCategory::PricePerSqm => {
                vec![ChartGroup::untitled(vec![self.path("avg_price_per_sqm_by_city.png")])]
            }
            ChartCategory::AreaBin => vec![ChartGroup::untitled(
                CITIES
                    .iter()
                    .map(|c| self.path(&format!("price_by_area_bin_per_city_for_sale/{}.png", c)))
                    .collect(),
            )],
            ChartCategory::PriceByDistrict => {
                let city = city.ok_or_else(|| {
                    Error::InvalidInput(format!("category '{}' requires a city", category))
                })?;
                vec![ChartGroup::untitled(self.district_paths(city)?)]
            }
            ChartCategory::MarketOverview => self.sections(MARKET_OVERVIEW),
            ChartCategory::PriceAnalysis => self.sections(PRICE_ANALYSIS),
            ChartCategory::ApartmentCharacteristics => self.sections(APARTMENT_CHARACTERISTICS),
            ChartCategory::LocationInsights => self.sections(LOCATION_INSIGHTS),
            ChartCategory::TimeAnalysis => self.sections(TIME_ANALYSIS),
        };
        Ok(groups)
    }

    /// The four transaction-type charts rooted at a city's base path
    pub fn district_paths(&self, city: &str) -> Result<Vec<String>> {
        if !self.is_known_city(city) {
            return Err(Error::UnknownCity(city.to_string()));
        }
        let base = format!("avg_price_by_street/{}", city);
        Ok(TransactionType::ALL
            .iter()
            .map(|t| self.path(&format!("{}/{}.png", base, t.file_stem())))
            .collect())
    }

    fn path(&self, relative: &str) -> String {
        format!("{}/{}", self.root, relative)
    }

    fn sections(&self, sections: &[Section]) -> Vec<ChartGroup> {
        sections
            .iter()
            .map(|(title, paths)| {
                ChartGroup::titled(*title, paths.iter().map(|p| self.path(p)).collect())
            })
            .collect()
    }
}

impl Default for ChartCatalog {
    fn default() -> Self {
        Self::new("/charts")
    }
}
