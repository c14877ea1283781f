//! Construction-time configuration for a data source

use std::fmt;
use std::sync::Arc;

use crate::diff::{DiffEngine, Differ};
use crate::identifier::Identifiable;
use crate::policy::ReloadPolicy;

/// Options for [`DiffableDataSource`](crate::DiffableDataSource)
///
/// The diff engine is the strategy point for hosts that already ship a
/// native engine: wrap it behind [`DiffEngine`] and pass it here.
/// Without an explicit engine the built-in [`Differ`] is used with
/// `reload_policy`.
///
/// `default_animation` is the flag used by
/// [`DiffableDataSource::apply_default`](crate::DiffableDataSource::apply_default);
/// it starts out `true`.
pub struct DataSourceOptions<S: Identifiable, I: Identifiable> {
    reload_policy: ReloadPolicy,
    default_animation: bool,
    engine: Option<Arc<dyn DiffEngine<S, I>>>,
}

impl<S: Identifiable, I: Identifiable> Default for DataSourceOptions<S, I> {
    fn default() -> Self {
        Self {
            reload_policy: ReloadPolicy::default(),
            default_animation: true,
            engine: None,
        }
    }
}

impl<S: Identifiable, I: Identifiable> fmt::Debug for DataSourceOptions<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceOptions")
            .field("reload_policy", &self.reload_policy)
            .field("default_animation", &self.default_animation)
            .field("engine", &self.engine.as_ref().map(|e| e.name()))
            .finish()
    }
}

impl<S, I> DataSourceOptions<S, I>
where
    S: Identifiable + Send + Sync + 'static,
    S::Id: Send + Sync,
    I: Identifiable + Send + Sync + 'static,
    I::Id: Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload policy of the built-in differ (ignored when an engine is set)
    pub fn with_reload_policy(mut self, reload_policy: ReloadPolicy) -> Self {
        self.reload_policy = reload_policy;
        self
    }

    pub fn with_default_animation(mut self, animate: bool) -> Self {
        self.default_animation = animate;
        self
    }

    /// Use `engine` instead of the built-in differ
    pub fn with_engine(mut self, engine: Arc<dyn DiffEngine<S, I>>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.reload_policy
    }

    pub fn default_animation(&self) -> bool {
        self.default_animation
    }

    /// Resolve the engine to use
    pub(crate) fn into_engine(self) -> Arc<dyn DiffEngine<S, I>> {
        match self.engine {
            Some(engine) => engine,
            None => Arc::new(Differ::new().with_reload_policy(self.reload_policy)),
        }
    }
}
