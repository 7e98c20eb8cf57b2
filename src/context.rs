//! Application lifetime: config load at startup, the lazily opened panel,
//! and config save at shutdown.

use tracing::warn;

use crate::{
    config::{ConfigSaveError, ConfigStore, PLUGIN_NAME, SavedQuery},
    engine::QueryEngine,
    host::Notifier,
    shell::QueryPanel,
};

/// Everything a session needs, passed around explicitly.
pub struct AppContext<N: Notifier> {
    store: Option<ConfigStore>,
    saved: Option<SavedQuery>,
    engine: QueryEngine,
    panel: Option<QueryPanel>,
    notifier: N,
}

impl<N: Notifier> AppContext<N> {
    /// Start a session, loading the saved query if there is one.
    ///
    /// A config that fails to load is announced and otherwise ignored; the
    /// session continues with defaults.
    pub fn init(store: Option<ConfigStore>, notifier: N) -> Self {
        let saved = match store.as_ref().map(ConfigStore::load) {
            Some(Ok(saved)) => saved,
            Some(Err(e)) => {
                warn!(error = %e, "config load failed, using defaults");
                notifier.notify(
                    PLUGIN_NAME,
                    &format!("{} error loading config: {}", PLUGIN_NAME, e),
                );
                None
            }
            None => None,
        };

        AppContext {
            store,
            saved,
            engine: QueryEngine::new(),
            panel: None,
            notifier,
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn saved(&self) -> Option<&SavedQuery> {
        self.saved.as_ref()
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel.is_some()
    }

    /// Show the panel, creating it on first use from the saved config.
    pub fn open_panel(&mut self) -> &mut QueryPanel {
        let saved = &self.saved;
        self.panel.get_or_insert_with(|| match saved {
            Some(saved) => QueryPanel::from_saved(saved),
            None => QueryPanel::new(),
        })
    }

    /// Panel, engine and notifier borrowed together for an Execute.
    pub fn parts(&mut self) -> (Option<&mut QueryPanel>, &QueryEngine, &N) {
        (self.panel.as_mut(), &self.engine, &self.notifier)
    }

    /// End the session, saving the panel text if the panel was ever opened.
    pub fn shutdown(self) -> Result<(), ConfigSaveError> {
        match (&self.store, &self.panel) {
            (Some(store), Some(panel)) => store.save(&panel.saved()),
            _ => Ok(()),
        }
    }
}
