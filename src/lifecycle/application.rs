//! Application Bootstrap
//!
//! Loads the config document, builds the bean graph from the registered roots
//! and hands the result to a [`Collaborator`].

use super::{Collaborator, shutdown_signal, spawn_reload_task};
use crate::config::{ConfigFormat, ConfigSource, ConfigStore};
use crate::di::{Bean, BeanRef, Container, EntityType, HasContainer, ReloadSummary, Shared};
use crate::error::{Result, WireError};
use crate::role::Role;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A built bean graph and the config it reads from.
///
/// # Example
///
/// ```rust,ignore
/// use wirebean::lifecycle::Application;
///
/// #[tokio::main]
/// async fn main() {
///     let app = Application::builder()
///         .config_file("config.yaml")
///         .root::<App>()
///         .reload_interval(Duration::from_secs(30))
///         .build_or_exit();
///
///     app.run(HttpServer).await.unwrap();
/// }
/// ```
pub struct Application {
    container: Container,
    reload_interval: Option<Duration>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn bean<T: Bean>(&self) -> Result<Shared<T>> {
        self.container.bean::<T>()
    }

    pub fn named<T: Bean>(&self, name: &str) -> Result<Shared<T>> {
        self.container.named::<T>(name)
    }

    pub fn beans_with_role(&self, role: Role) -> Vec<BeanRef> {
        self.container.beans_with_role(role)
    }

    pub fn controllers(&self) -> Vec<BeanRef> {
        self.container.beans_with_role(Role::Controller)
    }

    pub fn middlewares(&self) -> Vec<BeanRef> {
        self.container.beans_with_role(Role::Middleware)
    }

    pub fn routers(&self) -> Vec<BeanRef> {
        self.container.beans_with_role(Role::Router)
    }

    pub fn repositories(&self) -> Vec<BeanRef> {
        self.container.beans_with_role(Role::Repository)
    }

    pub fn testing(&self) -> Vec<BeanRef> {
        self.container.beans_with_role(Role::Testing)
    }

    pub fn entities(&self) -> &[EntityType] {
        self.container.entities()
    }

    /// Run `f` against the test bean `T` registered with
    /// [`ApplicationBuilder::with_test`].
    pub fn test<T: Bean, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let bean = self.container.bean::<T>()?;
        let guard = crate::di::read_lock(&bean);
        Ok(f(&guard))
    }

    pub fn reload(&self) -> Result<ReloadSummary> {
        self.container.reload()
    }

    pub fn reload_with(&self, document: Value) -> Result<ReloadSummary> {
        self.container.reload_with(document)
    }

    /// Hand the application to `collaborator` until it returns or a shutdown
    /// signal arrives. Periodic reload runs meanwhile if configured.
    pub async fn run<C: Collaborator>(self, collaborator: C) -> Result<()> {
        let app = Arc::new(self);
        let reload = app
            .reload_interval
            .map(|every| spawn_reload_task(Arc::clone(&app), every));

        tracing::info!("Starting {}", collaborator.name());
        let result = tokio::select! {
            result = collaborator.start(Arc::clone(&app)) => {
                result.map_err(WireError::Collaborator)
            },
            _ = shutdown_signal() => {
                tracing::info!("Shutting down application...");
                Ok(())
            },
        };

        if let Some(handle) = reload {
            handle.abort();
        }
        result
    }
}

impl HasContainer for Application {
    fn get_container(&self) -> &Container {
        &self.container
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("container", &self.container)
            .field("reload_interval", &self.reload_interval)
            .finish()
    }
}

type RootBuilder = Box<dyn FnOnce(&mut Container) -> Result<()> + Send>;
type MarkerInstaller = Box<dyn FnOnce(&mut Container) + Send>;

/// Builder for [`Application`]
pub struct ApplicationBuilder {
    source: ConfigSource,
    markers: Vec<MarkerInstaller>,
    roots: Vec<RootBuilder>,
    reload_interval: Option<Duration>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self {
            source: ConfigSource::Empty,
            markers: Vec::new(),
            roots: Vec::new(),
            reload_interval: None,
        }
    }

    /// Read config from a file; `.yml`/`.yaml` files are parsed as YAML.
    pub fn config_file(self, path: impl Into<PathBuf>) -> Self {
        self.config_source(ConfigSource::file(path))
    }

    pub fn config_str(self, text: impl Into<String>, format: ConfigFormat) -> Self {
        self.config_source(ConfigSource::Inline {
            text: text.into(),
            format,
        })
    }

    pub fn config_value(self, document: Value) -> Self {
        self.config_source(ConfigSource::Document(document))
    }

    pub fn config_source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    /// Treat structs embedding `M` as `role`.
    pub fn component_marker<M: 'static>(mut self, role: Role) -> Self {
        self.markers
            .push(Box::new(move |container| container.component_marker::<M>(role)));
        self
    }

    /// Build the graph reachable from `T`.
    pub fn root<T: Bean>(mut self) -> Self {
        self.roots.push(Box::new(|container| {
            container.build::<T>()?;
            Ok(())
        }));
        self
    }

    /// Build a test bean; it is reachable through [`Application::test`].
    pub fn with_test<T: Bean>(self) -> Self {
        self.root::<T>()
    }

    pub fn reload_interval(mut self, every: Duration) -> Self {
        self.reload_interval = Some(every);
        self
    }

    /// Load config and build every root.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be read or parsed, or if the
    /// graph is miswired (ambiguous beans, bad factory results).
    pub fn build(self) -> Result<Application> {
        tracing::info!("Starting application initialization...");
        let config = ConfigStore::load(self.source)?;
        let mut container = Container::new(config);
        for install in self.markers {
            install(&mut container);
        }
        for build in self.roots {
            build(&mut container)?;
        }
        tracing::info!(
            "Application initialization complete: {} bean(s), {} factory method(s)",
            container.len(),
            container.factory_names().len()
        );

        Ok(Application {
            container,
            reload_interval: self.reload_interval,
        })
    }

    /// [`ApplicationBuilder::build`], ending the process on failure.
    pub fn build_or_exit(self) -> Application {
        exit_on_error(self.build())
    }
}

/// Unwrap `result`, logging the error and exiting with status 1 otherwise.
pub fn exit_on_error<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Autowired, Tag, TypeDef};
    use crate::role::{Component, Controller, Testing};
    use async_trait::async_trait;
    use serde_json::json;

    struct Audited;

    #[derive(Default)]
    struct Ledger {
        owner: String,
    }

    impl Bean for Ledger {
        fn define(def: &mut TypeDef<Self>) {
            def.embed::<Audited>()
                .value("owner", "ledger.owner", None, |l| &mut l.owner);
        }
    }

    #[derive(Default)]
    struct Home;

    impl Bean for Home {
        fn define(def: &mut TypeDef<Self>) {
            def.embed::<Controller>().prefix("/");
        }
    }

    #[derive(Default)]
    struct Root {
        home: Autowired<Home>,
        ledger: Autowired<Ledger>,
    }

    impl Bean for Root {
        fn define(def: &mut TypeDef<Self>) {
            def.autowired("home", Tag::new(), |r| &mut r.home)
                .autowired("ledger", Tag::new(), |r| &mut r.ledger);
        }
    }

    #[derive(Default)]
    struct LedgerTest {
        ledger: Autowired<Ledger>,
    }

    impl Bean for LedgerTest {
        fn define(def: &mut TypeDef<Self>) {
            def.embed::<Testing>()
                .autowired("ledger", Tag::new(), |t| &mut t.ledger);
        }
    }

    #[derive(Default)]
    struct Helper;

    impl Bean for Helper {
        fn define(def: &mut TypeDef<Self>) {
            def.embed::<Component>();
        }
    }

    #[test]
    fn test_component_marker_and_test_beans() {
        let app = Application::builder()
            .config_value(json!({"ledger": {"owner": "ops"}}))
            .component_marker::<Audited>(Role::GenericComponent)
            .root::<Root>()
            .with_test::<LedgerTest>()
            .build()
            .unwrap();

        assert_eq!(app.controllers().len(), 1);
        assert_eq!(app.controllers()[0].prefix.as_deref(), Some("/"));
        assert_eq!(app.testing().len(), 1);

        let owner = app
            .test::<LedgerTest, _>(|t| t.ledger.read(|l| l.owner.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(owner, "ops");
        assert!(app.bean::<Ledger>().is_ok());
        assert!(app.bean::<Helper>().is_err());
    }

    #[test]
    fn test_unmarked_type_stays_unwired() {
        let app = Application::builder().root::<Root>().build().unwrap();
        assert!(app.bean::<Ledger>().is_err());
        assert_eq!(app.container().len(), 2);
    }

    struct Probe;

    #[async_trait]
    impl Collaborator for Probe {
        async fn start(&self, app: Arc<Application>) -> anyhow::Result<()> {
            anyhow::ensure!(app.controllers().len() == 1, "expected one controller");
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Collaborator for Failing {
        async fn start(&self, _app: Arc<Application>) -> anyhow::Result<()> {
            anyhow::bail!("port in use")
        }
    }

    #[tokio::test]
    async fn test_run_hands_over_to_collaborator() {
        let app = Application::builder().root::<Root>().build().unwrap();
        app.run(Probe).await.unwrap();

        let app = Application::builder().root::<Root>().build().unwrap();
        let err = app.run(Failing).await.unwrap_err();
        assert!(matches!(err, WireError::Collaborator(_)));
    }

    #[test]
    fn test_bad_config_fails_build() {
        let result = Application::builder()
            .config_str("{not json", ConfigFormat::Json)
            .root::<Root>()
            .build();
        assert!(matches!(result, Err(WireError::Config(_))));
    }
}
