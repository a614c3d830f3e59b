//! Application state for the dashboard server

use chrono::{DateTime, Utc};
use estate_api::{HttpPriceApi, PriceApi};
use estate_config::{Config, ConfigError};
use estate_core::ChartCatalog;
use estate_dashboard::{
    AssetProbe, ChartDir, DirFragments, FragmentSource, Sidebar, StaticFragments, Timing,
    ViewRegistry, ViewRouter, ViewServices,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::WebError;

/// Session cookie name
pub const SESSION_COOKIE: &str = "estate_session";

/// Viewport width assumed until the browser reports its own
const INITIAL_WIDTH: u32 = 1280;

/// Partials compiled into the binary, used when no partials directory exists
pub fn embedded_fragments() -> StaticFragments {
    StaticFragments::new([
        ("analysis.html", include_str!("../partials/analysis.html")),
        ("prediction.html", include_str!("../partials/prediction.html")),
    ])
}

/// Per-browser dashboard state
#[derive(Debug)]
pub struct Session {
    pub router: ViewRouter,
    pub sidebar: Sidebar,
}

struct SessionEntry {
    session: Arc<Mutex<Session>>,
    last_seen: DateTime<Utc>,
}

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub services: ViewServices,
    pub timing: Timing,
    registry: Arc<ViewRegistry>,
    fragments: Arc<dyn FragmentSource>,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    session_ttl: chrono::Duration,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: Config,
        api: Arc<dyn PriceApi>,
        fragments: Arc<dyn FragmentSource>,
        probe: Arc<dyn AssetProbe>,
    ) -> Result<Self, WebError> {
        let session_ttl = chrono::Duration::from_std(config.server.session_ttl()).map_err(|_| {
            ConfigError::InvalidValue {
                key: "server.session_ttl_minutes".to_string(),
                value: config.server.session_ttl_minutes.to_string(),
            }
        })?;
        let services = ViewServices {
            api,
            catalog: ChartCatalog::new(config.assets.charts_url.clone()),
            probe,
        };
        let timing = Timing {
            predict_timeout: config.api.predict_timeout(),
            min_busy: config.api.min_busy(),
        };
        Ok(Self {
            config,
            services,
            timing,
            registry: Arc::new(ViewRegistry::standard()?),
            fragments,
            sessions: RwLock::new(HashMap::new()),
            session_ttl,
            started_at: Utc::now(),
        })
    }

    /// Wire the HTTP backend client, partials and chart directory from `config`
    pub fn from_config(config: Config) -> Result<Self, WebError> {
        let api = HttpPriceApi::new(&config.api.base_url)?
            .request_timeout(config.api.request_timeout())
            .predict_timeout(config.api.predict_timeout());

        let fragments: Arc<dyn FragmentSource> = if config.assets.partials_dir.is_dir() {
            tracing::info!("Serving partials from {}", config.assets.partials_dir.display());
            Arc::new(DirFragments::new(config.assets.partials_dir.clone()))
        } else {
            tracing::info!("Using embedded partials");
            Arc::new(embedded_fragments())
        };

        if !config.assets.charts_dir.is_dir() {
            tracing::warn!(
                "Charts directory {} not found, charts will render as placeholders",
                config.assets.charts_dir.display()
            );
        }
        let probe = Arc::new(ChartDir::new(
            config.assets.charts_url.clone(),
            config.assets.charts_dir.clone(),
        ));

        Self::new(config, Arc::new(api), fragments, probe)
    }

    /// Look up the session for `id`, creating one when it is unknown or expired.
    ///
    /// Returns the session id, the session and whether it was created.
    pub async fn session(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Session>>, bool) {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        self.prune(&mut sessions, now);

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.session.clone(), false);
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session {
            router: ViewRouter::new(self.registry.clone(), self.fragments.clone()),
            sidebar: Sidebar::new(INITIAL_WIDTH, self.config.ui.mobile_breakpoint),
        }));
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::debug!("Created session {}", id);
        (id, session, true)
    }

    fn prune(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: DateTime<Utc>) {
        let ttl = self.session_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            let alive = now - entry.last_seen < ttl;
            if !alive {
                if let Ok(mut session) = entry.session.try_lock() {
                    session.router.dispose();
                }
            }
            alive
        });
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::info!("Pruned {} idle sessions", pruned);
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
