//! View Router
//!
//! Owns the lifecycle of the single active view controller. Every view is
//! registered up front with its fragment and controller factory; loading a
//! view disposes the previous controller before the new one is built, so no
//! handler can act on a view that has been swapped out.

use crate::analysis::AnalysisView;
use crate::fragments::FragmentSource;
use crate::panel::AssetProbe;
use crate::prediction::PredictionForm;
use estate_api::PriceApi;
use estate_core::{ChartCatalog, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    Analysis,
    Prediction,
}

impl ViewName {
    /// Sidebar order. The first entry is shown on page load.
    pub const ALL: [ViewName; 2] = [ViewName::Analysis, ViewName::Prediction];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewName::Analysis => "analysis",
            ViewName::Prediction => "prediction",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewName::Analysis => "Data Analysis",
            ViewName::Prediction => "Price Prediction",
        }
    }
}

impl FromStr for ViewName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::UnknownView(s.to_string()))
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependencies handed to view controllers
#[derive(Clone)]
pub struct ViewServices {
    pub api: Arc<dyn PriceApi>,
    pub catalog: ChartCatalog,
    pub probe: Arc<dyn AssetProbe>,
}

/// The controller of the active view
#[derive(Debug)]
pub enum ViewController {
    Analysis(AnalysisView),
    Prediction(PredictionForm),
}

impl ViewController {
    pub fn name(&self) -> ViewName {
        match self {
            ViewController::Analysis(_) => ViewName::Analysis,
            ViewController::Prediction(_) => ViewName::Prediction,
        }
    }

    pub async fn init(&mut self, services: &ViewServices) -> Result<()> {
        match self {
            ViewController::Analysis(view) => view.init(),
            ViewController::Prediction(form) => form.init(services.api.as_ref()).await,
        }
    }

    pub fn dispose(&mut self) {
        match self {
            ViewController::Analysis(view) => view.dispose(),
            ViewController::Prediction(form) => form.dispose(),
        }
    }
}

/// How a view is fetched and constructed
#[derive(Clone, Copy)]
pub struct ViewDescriptor {
    pub fragment_path: &'static str,
    pub factory: fn(&ViewServices) -> ViewController,
}

impl fmt::Debug for ViewDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewDescriptor")
            .field("fragment_path", &self.fragment_path)
            .finish_non_exhaustive()
    }
}

fn analysis_controller(services: &ViewServices) -> ViewController {
    ViewController::Analysis(AnalysisView::new(services.catalog.clone(), services.probe.clone()))
}

fn prediction_controller(_services: &ViewServices) -> ViewController {
    ViewController::Prediction(PredictionForm::new())
}

#[derive(Debug, Clone)]
pub struct ViewRegistry {
    entries: Vec<(ViewName, ViewDescriptor)>,
}

impl ViewRegistry {
    /// Fails when any view has no descriptor
    pub fn new(entries: Vec<(ViewName, ViewDescriptor)>) -> Result<Self> {
        if let Some(missing) = ViewName::ALL
            .iter()
            .find(|name| !entries.iter().any(|(n, _)| n == *name))
        {
            return Err(Error::UnknownView(missing.to_string()));
        }
        Ok(Self { entries })
    }

    /// The dashboard's two views
    pub fn standard() -> Result<Self> {
        Self::new(vec![
            (
                ViewName::Analysis,
                ViewDescriptor {
                    fragment_path: "analysis.html",
                    factory: analysis_controller,
                },
            ),
            (
                ViewName::Prediction,
                ViewDescriptor {
                    fragment_path: "prediction.html",
                    factory: prediction_controller,
                },
            ),
        ])
    }

    pub fn descriptor(&self, name: ViewName) -> Result<&ViewDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, d)| d)
            .ok_or_else(|| Error::UnknownView(name.to_string()))
    }
}

/// Result of a guarded load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewLoad {
    /// The view was already active or already loading
    Unchanged,
    Loaded { fragment: String },
    /// A newer load started before this one finished
    Superseded,
}

/// A view load taken out of the router.
///
/// Fetching and initialising runs without access to the router, so the
/// owner of the router can release it while the backend answers.
pub struct PendingLoad {
    name: ViewName,
    generation: u64,
    descriptor: ViewDescriptor,
    fragments: Arc<dyn FragmentSource>,
}

impl PendingLoad {
    pub fn name(&self) -> ViewName {
        self.name
    }

    /// Fetch the fragment, then build and initialise the controller
    pub async fn run(self, services: &ViewServices) -> LoadedView {
        let outcome = self.build(services).await;
        LoadedView {
            name: self.name,
            generation: self.generation,
            outcome,
        }
    }

    async fn build(&self, services: &ViewServices) -> Result<(String, ViewController)> {
        let fragment = match self.fragments.fetch(self.descriptor.fragment_path).await {
            Ok(fragment) => fragment,
            Err(err) => {
                tracing::error!("Failed to load view '{}': {}", self.name, err);
                return Err(err);
            }
        };

        let mut controller = (self.descriptor.factory)(services);
        if let Err(err) = controller.init(services).await {
            tracing::error!("Failed to initialise view '{}': {}", self.name, err);
            return Err(err);
        }
        Ok((fragment, controller))
    }
}

impl fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLoad")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Outcome of [`PendingLoad::run`], handed back to [`ViewRouter::finish`]
#[derive(Debug)]
pub struct LoadedView {
    name: ViewName,
    generation: u64,
    outcome: Result<(String, ViewController)>,
}

pub struct ViewRouter {
    registry: Arc<ViewRegistry>,
    fragments: Arc<dyn FragmentSource>,
    current: Option<ViewController>,
    /// Target and generation of the load in progress
    loading: Option<(ViewName, u64)>,
    generation: u64,
}

impl ViewRouter {
    pub fn new(registry: Arc<ViewRegistry>, fragments: Arc<dyn FragmentSource>) -> Self {
        Self {
            registry,
            fragments,
            current: None,
            loading: None,
            generation: 0,
        }
    }

    /// Load `name` unless it is already the active view
    pub async fn load_view(&mut self, name: ViewName, services: &ViewServices) -> Result<ViewLoad> {
        match self.begin_load(name)? {
            None => Ok(ViewLoad::Unchanged),
            Some(pending) => {
                let loaded = pending.run(services).await;
                self.finish(loaded)
            }
        }
    }

    /// Load `name` even when it is already active
    pub async fn reload_view(&mut self, name: ViewName, services: &ViewServices) -> Result<String> {
        let loaded = self.begin_reload(name)?.run(services).await;
        match self.finish(loaded)? {
            ViewLoad::Loaded { fragment } => Ok(fragment),
            ViewLoad::Unchanged | ViewLoad::Superseded => Err(Error::StaleView(name.to_string())),
        }
    }

    /// Start loading `name`; `None` when it is already active or loading
    pub fn begin_load(&mut self, name: ViewName) -> Result<Option<PendingLoad>> {
        let loading = self.loading.map(|(target, _)| target);
        if self.current_view() == Some(name) || loading == Some(name) {
            tracing::debug!("View '{}' already active", name);
            return Ok(None);
        }
        self.start(name).map(Some)
    }

    /// Start loading `name`, bypassing the same-view guard
    pub fn begin_reload(&mut self, name: ViewName) -> Result<PendingLoad> {
        self.start(name)
    }

    fn start(&mut self, name: ViewName) -> Result<PendingLoad> {
        let descriptor = *self.registry.descriptor(name)?;
        self.dispose();

        self.generation += 1;
        self.loading = Some((name, self.generation));
        Ok(PendingLoad {
            name,
            generation: self.generation,
            descriptor,
            fragments: self.fragments.clone(),
        })
    }

    /// Install a finished load unless a newer one has started since.
    ///
    /// A failed load leaves no view active.
    pub fn finish(&mut self, loaded: LoadedView) -> Result<ViewLoad> {
        if self.loading != Some((loaded.name, loaded.generation)) {
            tracing::debug!("Discarding superseded load of view '{}'", loaded.name);
            if let Ok((_, mut controller)) = loaded.outcome {
                controller.dispose();
            }
            return Ok(ViewLoad::Superseded);
        }

        self.loading = None;
        let (fragment, controller) = loaded.outcome?;
        tracing::info!("View '{}' loaded", loaded.name);
        self.current = Some(controller);
        Ok(ViewLoad::Loaded { fragment })
    }

    pub fn current_view(&self) -> Option<ViewName> {
        self.current.as_ref().map(ViewController::name)
    }

    pub fn current(&self) -> Option<&ViewController> {
        self.current.as_ref()
    }

    pub fn analysis_mut(&mut self) -> Result<&mut AnalysisView> {
        match self.current.as_mut() {
            Some(ViewController::Analysis(view)) => Ok(view),
            _ => Err(Error::StaleView(ViewName::Analysis.to_string())),
        }
    }

    pub fn prediction_mut(&mut self) -> Result<&mut PredictionForm> {
        match self.current.as_mut() {
            Some(ViewController::Prediction(form)) => Ok(form),
            _ => Err(Error::StaleView(ViewName::Prediction.to_string())),
        }
    }

    /// Dispose the active controller and drop any load in progress
    pub fn dispose(&mut self) {
        self.loading = None;
        if let Some(mut controller) = self.current.take() {
            controller.dispose();
        }
    }
}

impl fmt::Debug for ViewRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRouter")
            .field("current", &self.current_view())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::StaticFragments;
    use async_trait::async_trait;
    use estate_core::{PredictionMetadata, PredictionRequest, PredictionResult};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingFragments {
        inner: StaticFragments,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl FragmentSource for CountingFragments {
        async fn fetch(&self, path: &str) -> Result<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(path).await
        }
    }

    struct Backend {
        up: AtomicBool,
    }

    #[async_trait]
    impl PriceApi for Backend {
        async fn cities(&self) -> Result<Vec<String>> {
            Ok(vec!["თბილისი".into()])
        }

        async fn districts(&self, _city: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        async fn available_dates(&self) -> Result<BTreeMap<i32, Vec<u32>>> {
            Ok(BTreeMap::from([(2024, vec![3, 6])]))
        }

        async fn metadata(&self) -> Result<PredictionMetadata> {
            if !self.up.load(Ordering::SeqCst) {
                return Err(Error::Network("connection refused".into()));
            }
            estate_api::compose_legacy_metadata(self).await
        }

        async fn predict(&self, _request: &PredictionRequest) -> Result<PredictionResult> {
            Err(Error::Network("unused".into()))
        }
    }

    struct NoFiles;

    impl AssetProbe for NoFiles {
        fn exists(&self, _path: &str) -> bool {
            false
        }
    }

    fn setup(files: &[(&str, &str)], backend_up: bool) -> (ViewRouter, Arc<CountingFragments>, ViewServices) {
        let fragments = Arc::new(CountingFragments {
            inner: StaticFragments::new(files.iter().copied()),
            fetches: AtomicUsize::new(0),
        });
        let router = ViewRouter::new(Arc::new(ViewRegistry::standard().unwrap()), fragments.clone());
        let services = ViewServices {
            api: Arc::new(Backend {
                up: AtomicBool::new(backend_up),
            }),
            catalog: ChartCatalog::default(),
            probe: Arc::new(NoFiles),
        };
        (router, fragments, services)
    }

    const ALL_FILES: &[(&str, &str)] = &[
        ("analysis.html", "<h1>Analysis</h1>"),
        ("prediction.html", "<h1>Prediction</h1>"),
    ];

    #[test]
    fn test_view_names() {
        assert_eq!("analysis".parse::<ViewName>().unwrap(), ViewName::Analysis);
        assert!(matches!("home".parse::<ViewName>(), Err(Error::UnknownView(_))));
        assert_eq!(ViewName::Prediction.to_string(), "prediction");
    }

    #[test]
    fn test_registry_requires_every_view() {
        let standard = ViewRegistry::standard().unwrap();
        let analysis_only = vec![(ViewName::Analysis, *standard.descriptor(ViewName::Analysis).unwrap())];
        assert!(matches!(
            ViewRegistry::new(analysis_only),
            Err(Error::UnknownView(name)) if name == "prediction"
        ));
        assert!(ViewRegistry::new(standard.entries.clone()).is_ok());
    }

    #[tokio::test]
    async fn test_same_view_fetches_once() {
        let (mut router, fragments, services) = setup(ALL_FILES, true);

        let first = router.load_view(ViewName::Analysis, &services).await.unwrap();
        assert_eq!(
            first,
            ViewLoad::Loaded {
                fragment: "<h1>Analysis</h1>".into()
            }
        );
        let second = router.load_view(ViewName::Analysis, &services).await.unwrap();
        assert_eq!(second, ViewLoad::Unchanged);
        assert_eq!(fragments.fetches.load(Ordering::SeqCst), 1);

        router.reload_view(ViewName::Analysis, &services).await.unwrap();
        assert_eq!(fragments.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_switch_disposes_previous() {
        let (mut router, _, services) = setup(ALL_FILES, true);
        router.load_view(ViewName::Analysis, &services).await.unwrap();
        assert!(router.analysis_mut().is_ok());

        router.load_view(ViewName::Prediction, &services).await.unwrap();
        assert_eq!(router.current_view(), Some(ViewName::Prediction));
        assert!(matches!(router.analysis_mut(), Err(Error::StaleView(_))));
        assert!(router.prediction_mut().unwrap().state().is_interactive());
    }

    #[tokio::test]
    async fn test_fragment_failure_leaves_no_view() {
        let (mut router, _, services) = setup(&[("analysis.html", "<h1>Analysis</h1>")], true);
        router.load_view(ViewName::Analysis, &services).await.unwrap();

        let err = router.load_view(ViewName::Prediction, &services).await.unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert_eq!(router.current_view(), None);
    }

    #[tokio::test]
    async fn test_init_failure_allows_retry() {
        let (mut router, fragments, services) = setup(ALL_FILES, false);
        assert!(router.load_view(ViewName::Prediction, &services).await.is_err());
        assert_eq!(router.current_view(), None);

        // a second attempt is not swallowed by the guard
        assert!(router.load_view(ViewName::Prediction, &services).await.is_err());
        assert_eq!(fragments.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_newer_load_supersedes_pending_one() {
        let (mut router, _, services) = setup(ALL_FILES, true);

        let prediction = router.begin_load(ViewName::Prediction).unwrap().unwrap();
        // a repeat click while the first load is out is a no-op
        assert!(router.begin_load(ViewName::Prediction).unwrap().is_none());

        let analysis = router.begin_reload(ViewName::Analysis).unwrap();
        let loaded = analysis.run(&services).await;
        assert!(matches!(router.finish(loaded), Ok(ViewLoad::Loaded { .. })));

        let late = prediction.run(&services).await;
        assert_eq!(router.finish(late).unwrap(), ViewLoad::Superseded);
        assert_eq!(router.current_view(), Some(ViewName::Analysis));
    }

    #[tokio::test]
    async fn test_dispose_drops_pending_load() {
        let (mut router, _, services) = setup(ALL_FILES, true);
        let pending = router.begin_load(ViewName::Analysis).unwrap().unwrap();
        router.dispose();

        let loaded = pending.run(&services).await;
        assert_eq!(router.finish(loaded).unwrap(), ViewLoad::Superseded);
        assert_eq!(router.current_view(), None);
    }
}
