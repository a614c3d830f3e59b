//! Analysis view controller
//!
//! Category nav, the city-dependent selector and the chart modal, all acting
//! on one [`ImagePanel`]. Constructed per view activation and dropped on
//! navigation.

use crate::group::ExclusiveGroup;
use crate::panel::{AssetProbe, ImagePanel};
use estate_core::{ChartCatalog, ChartCategory, Error, Result};
use std::sync::Arc;

/// Secondary dropdown shown only for city-dependent categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitySelector {
    visible: bool,
    options: Vec<String>,
    selected: Option<String>,
}

impl CitySelector {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn show(&mut self, cities: &[&str], selected: &str) {
        self.visible = true;
        self.options = cities.iter().map(|c| c.to_string()).collect();
        self.selected = Some(selected.to_string());
    }

    fn hide(&mut self) {
        self.visible = false;
        self.options.clear();
        self.selected = None;
    }
}

/// Enlarged view of one displayed chart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartModal {
    image: Option<String>,
}

impl ChartModal {
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    fn open(&mut self, src: &str) {
        self.image = Some(src.to_string());
    }

    fn close(&mut self) {
        self.image = None;
    }
}

#[derive(Debug)]
pub struct AnalysisView {
    catalog: ChartCatalog,
    nav: ExclusiveGroup<ChartCategory>,
    city: CitySelector,
    panel: ImagePanel,
    modal: ChartModal,
}

impl AnalysisView {
    pub fn new(catalog: ChartCatalog, probe: Arc<dyn AssetProbe>) -> Self {
        Self {
            catalog,
            nav: ExclusiveGroup::new(ChartCategory::ALL),
            city: CitySelector::default(),
            panel: ImagePanel::new(probe),
            modal: ChartModal::default(),
        }
    }

    /// Activate the default category, as if its button had been clicked
    pub fn init(&mut self) -> Result<()> {
        self.select_category(ChartCategory::default_category())
    }

    /// Nav click: mark `category` active and render its charts.
    ///
    /// City-dependent categories open with the fixed default city so the
    /// first render is never empty.
    pub fn select_category(&mut self, category: ChartCategory) -> Result<()> {
        let catalog = &self.catalog;
        let city = &mut self.city;
        let panel = &mut self.panel;
        self.modal.close();

        self.nav.select(category, |category| {
            if category.requires_city() {
                let default_city = catalog.default_city();
                let groups = catalog.resolve(category, Some(default_city))?;
                city.show(catalog.cities(), default_city);
                panel.render(&groups);
            } else {
                let groups = catalog.resolve(category, None)?;
                city.hide();
                panel.render(&groups);
            }
            tracing::debug!("Analysis category -> {}", category);
            Ok(())
        })
    }

    /// City selector change. An empty selection is ignored.
    pub fn on_city_change(&mut self, city: &str) -> Result<()> {
        let active = self
            .nav
            .active()
            .ok_or_else(|| Error::MissingElement("active chart category".to_string()))?;
        if !active.requires_city() || !self.city.is_visible() {
            return Err(Error::InvalidInput(format!(
                "category '{}' has no city selector",
                active
            )));
        }
        if city.is_empty() {
            return Ok(());
        }

        let paths = self.catalog.district_paths(city)?;
        self.city.selected = Some(city.to_string());
        self.modal.close();
        self.panel.render_paths(paths);
        Ok(())
    }

    /// Open the modal on a chart that is currently displayed
    pub fn open_modal(&mut self, src: &str) -> Result<()> {
        if !self.panel.contains_chart(src) {
            return Err(Error::InvalidInput(format!("chart '{}' is not displayed", src)));
        }
        self.modal.open(src);
        Ok(())
    }

    pub fn close_modal(&mut self) {
        self.modal.close();
    }

    pub fn dispose(&mut self) {
        self.modal.close();
        self.city.hide();
        self.panel.clear();
        self.nav.clear();
    }

    pub fn active_category(&self) -> Option<ChartCategory> {
        self.nav.active()
    }

    pub fn nav(&self) -> &ExclusiveGroup<ChartCategory> {
        &self.nav
    }

    pub fn city_selector(&self) -> &CitySelector {
        &self.city
    }

    pub fn panel(&self) -> &ImagePanel {
        &self.panel
    }

    pub fn modal(&self) -> &ChartModal {
        &self.modal
    }
}
