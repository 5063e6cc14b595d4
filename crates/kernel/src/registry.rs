use anyhow::Context;
use std::sync::Arc;

use bookshelf_db::{Database, IndexDef};

use crate::module::{InitCtx, Module};

/// Module registry driving the module lifecycle in registration order
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module; names must be unique
    pub fn register(&mut self, module: Arc<dyn Module>) -> anyhow::Result<()> {
        if self.get_module(module.name()).is_some() {
            anyhow::bail!("module '{}' is already registered", module.name());
        }
        self.modules.push(module);
        Ok(())
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> &[Arc<dyn Module>] {
        &self.modules
    }

    /// Get a module by name
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Initialize all modules
    pub async fn init_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Create every declared index on the database
    pub async fn ensure_indexes(&self, database: &Database) -> anyhow::Result<()> {
        for (module, index) in self.collect_indexes() {
            database.ensure_index(&index).await.with_context(|| {
                format!(
                    "failed to create index '{}' for module '{}'",
                    index.name, module
                )
            })?;
        }

        Ok(())
    }

    /// Start all modules
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect index definitions from all modules, sorted for deterministic ordering
    pub fn collect_indexes(&self) -> Vec<(&'static str, IndexDef)> {
        let mut indexes: Vec<(&'static str, IndexDef)> = self
            .modules
            .iter()
            .flat_map(|module| {
                module
                    .indexes()
                    .into_iter()
                    .map(move |index| (module.name(), index))
            })
            .collect();

        indexes.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.1.name.cmp(b.1.name)));
        indexes
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn indexes(&self) -> Vec<IndexDef> {
            vec![IndexDef {
                collection: self.name,
                name: "by_name",
                fields: &["name"],
                unique: false,
            }]
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    fn module(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Module> {
        Arc::new(TestModule {
            name,
            log: log.clone(),
        })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
        assert!(registry.collect_indexes().is_empty());
    }

    #[test]
    fn test_duplicate_module_names_are_rejected() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(module("books", &log)).unwrap();
        assert!(registry.register(module("books", &log)).is_err());
    }

    #[test]
    fn test_index_collection_is_sorted_by_module() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(module("zeta", &log)).unwrap();
        registry.register(module("alpha", &log)).unwrap();

        let modules: Vec<&str> = registry.collect_indexes().iter().map(|(m, _)| *m).collect();
        assert_eq!(modules, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register(module("first", &log)).unwrap();
        registry.register(module("second", &log)).unwrap();

        let settings = Settings::default();
        let database = Database::in_memory().await.unwrap();
        let ctx = InitCtx {
            settings: &settings,
            database: &database,
        };

        registry.init_all(&ctx).await.unwrap();
        registry.ensure_indexes(&database).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();

        assert_eq!(database.indexes("first").await.unwrap(), vec!["by_name"]);
        assert_eq!(database.indexes("second").await.unwrap(), vec!["by_name"]);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start first", "start second", "stop second", "stop first"]
        );
    }
}
