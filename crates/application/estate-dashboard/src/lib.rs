//! # Estate Dashboard
//!
//! Server-side view controllers for the dashboard. Each browser session owns
//! one [`ViewRouter`] and one [`Sidebar`]; HTTP handlers drive them and
//! render the resulting state.
//!
//! ```text
//!   Sidebar ──ViewChanged──► ViewRouter ──► ViewController
//!                                              ├── AnalysisView
//!                                              │     ExclusiveGroup<ChartCategory>
//!                                              │     CitySelector ──► ImagePanel
//!                                              │     ChartModal
//!                                              └── PredictionForm
//!                                                    FormControls ──► PriceApi
//!                                                    LoadingOverlay, ResultPanel
//! ```

pub mod analysis;
pub mod chrome;
pub mod fragments;
pub mod group;
pub mod panel;
pub mod prediction;
pub mod router;

pub use analysis::{AnalysisView, ChartModal, CitySelector};
pub use chrome::{LoadingOverlay, Presentation, Sidebar, ViewChanged, MOBILE_BREAKPOINT};
pub use fragments::{DirFragments, FragmentSource, StaticFragments};
pub use group::ExclusiveGroup;
pub use panel::{AssetProbe, ChartDir, ImagePanel, PanelItem, PanelSection};
pub use prediction::{
    run_prediction, FormControls, FormInput, FormState, PendingPrediction, PredictionForm,
    ResultPanel, SelectControl, SelectOption, Ticket, Timing,
};
pub use router::{
    LoadedView, PendingLoad, ViewController, ViewDescriptor, ViewLoad, ViewName, ViewRegistry, ViewRouter,
    ViewServices,
};
