use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;

/// Provider of module-specific configuration (raw JSON sections only).
pub trait ConfigProvider: Send + Sync {
    /// Returns raw JSON section for the module, if any.
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value>;
}

impl ConfigProvider for ::runtime::AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        ::runtime::AppConfigProvider::get_module_config(self, module_name)
    }
}

#[derive(Clone)]
pub struct ModuleCtx {
    pub(crate) db: Option<DatabaseConnection>,
    pub(crate) config_provider: Option<Arc<dyn ConfigProvider>>,
    pub(crate) client_hub: Arc<ClientHub>,
    pub(crate) cancellation_token: CancellationToken,
    pub(crate) module_name: Option<Arc<str>>,
}

/// Builds the base context shared by every phase. Tests use it to hand a
/// module a context without running the full runner.
pub struct ModuleCtxBuilder {
    inner: ModuleCtx,
}

impl ModuleCtxBuilder {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            inner: ModuleCtx {
                db: None,
                config_provider: None,
                client_hub: Arc::new(ClientHub::default()),
                cancellation_token: token,
                module_name: None,
            },
        }
    }

    pub fn with_db(mut self, db: DatabaseConnection) -> Self {
        self.inner.db = Some(db);
        self
    }

    pub fn with_config_provider(mut self, p: Arc<dyn ConfigProvider>) -> Self {
        self.inner.config_provider = Some(p);
        self
    }

    pub fn with_client_hub(mut self, hub: Arc<ClientHub>) -> Self {
        self.inner.client_hub = hub;
        self
    }

    pub fn build(self) -> ModuleCtx {
        self.inner
    }
}

impl ModuleCtx {
    /// Scope context to a specific module name.
    pub fn for_module(mut self, name: &str) -> Self {
        self.module_name = Some(Arc::<str>::from(name));
        self
    }

    pub fn db(&self) -> Option<&DatabaseConnection> {
        self.db.as_ref()
    }

    /// Like [`ModuleCtx::db`] but fails with the module name in the message.
    pub fn db_required(&self) -> anyhow::Result<DatabaseConnection> {
        self.db.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "module '{}' requires a database but none is configured",
                self.current_module().unwrap_or("<unscoped>")
            )
        })
    }

    pub fn client_hub(&self) -> Arc<ClientHub> {
        self.client_hub.clone()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation_token
    }

    pub fn current_module(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    /// Best-effort: deserialize the module's config into `T`, fallback to `T::default()`
    /// if the section is missing. An invalid section is logged and also falls back.
    pub fn module_config<T: DeserializeOwned + Default>(&self) -> T {
        let (Some(name), Some(p)) = (&self.module_name, &self.config_provider) else {
            return T::default();
        };
        match p.get_module_config(name) {
            Some(v) => serde_json::from_value::<T>(v.clone()).unwrap_or_else(|e| {
                tracing::warn!(module = %name, error = %e, "Invalid module config; using defaults");
                T::default()
            }),
            None => T::default(),
        }
    }
}
