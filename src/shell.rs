//! State and actions of the query panel, independent of how it is drawn.

use tracing::debug;

use crate::{
    config::SavedQuery,
    engine::{QueryEngine, QuerySpec},
    host::{LineSource, Notifier, OutputSink},
};

/// Query shown in a fresh panel and restored by Clear.
pub const DEFAULT_QUERY: &str = "from l in lines\nselect l";

/// Query text, helper text and the Execute / Clear actions.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPanel {
    query: String,
    helpers: String,
}

impl Default for QueryPanel {
    fn default() -> Self {
        QueryPanel {
            query: DEFAULT_QUERY.to_string(),
            helpers: String::new(),
        }
    }
}

impl QueryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Panel seeded with previously saved text.
    pub fn from_saved(saved: &SavedQuery) -> Self {
        QueryPanel {
            query: saved.query.clone(),
            helpers: saved.helpers.clone(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn helpers(&self) -> &str {
        &self.helpers
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn set_helpers(&mut self, helpers: impl Into<String>) {
        self.helpers = helpers.into();
    }

    /// Reset the query to the default; helpers are kept.
    pub fn clear(&mut self) {
        self.query = DEFAULT_QUERY.to_string();
    }

    pub fn spec(&self) -> QuerySpec {
        QuerySpec::new(self.query.as_str()).with_helpers(self.helpers.as_str())
    }

    pub fn saved(&self) -> SavedQuery {
        SavedQuery {
            query: self.query.clone(),
            helpers: self.helpers.clone(),
        }
    }

    /// Run the current text against `source`.
    ///
    /// On success the output goes to a fresh buffer in `sink`; on failure
    /// the report is shown through `notifier` and `sink` is left untouched.
    /// Returns whether the run succeeded.
    pub fn execute(
        &mut self,
        engine: &QueryEngine,
        source: &dyn LineSource,
        sink: &mut dyn OutputSink,
        notifier: &dyn Notifier,
    ) -> bool {
        match engine.run_into(&self.spec(), source, sink) {
            Ok(count) => {
                debug!(lines = count, "execute succeeded");
                true
            }
            Err(e) => {
                notifier.notify(e.title(), &e.to_string());
                false
            }
        }
    }
}
