use axum::Router;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::contracts::{
    DbModule, Module, OpenApiRegistry, RestHostModule, RestfulModule, StatefulModule,
};

/// One module and the capabilities it exposes.
pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub core: Arc<dyn Module>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub rest_host: Option<Arc<dyn RestHostModule>>,
    pub db: Option<Arc<dyn DbModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

impl ModuleEntry {
    pub fn new(name: &'static str, core: Arc<dyn Module>) -> Self {
        Self {
            name,
            deps: &[],
            core,
            rest: None,
            rest_host: None,
            db: None,
            stateful: None,
        }
    }

    pub fn depends_on(mut self, deps: &'static [&'static str]) -> Self {
        self.deps = deps;
        self
    }

    pub fn rest(mut self, m: Arc<dyn RestfulModule>) -> Self {
        self.rest = Some(m);
        self
    }

    pub fn rest_host(mut self, m: Arc<dyn RestHostModule>) -> Self {
        self.rest_host = Some(m);
        self
    }

    pub fn db(mut self, m: Arc<dyn DbModule>) -> Self {
        self.db = Some(m);
        self
    }

    pub fn stateful(mut self, m: Arc<dyn StatefulModule>) -> Self {
        self.stateful = Some(m);
        self
    }
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// Collects entries in any order; `build` validates and orders them.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<ModuleEntry>,
}

impl RegistryBuilder {
    pub fn module(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Validate names, dependencies and the single REST host, then order modules
    /// so every dependency comes before its dependents. Ties keep registration order.
    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        let mut index: HashMap<&'static str, usize> = HashMap::new();
        for (i, e) in self.entries.iter().enumerate() {
            if index.insert(e.name, i).is_some() {
                return Err(RegistryError::DuplicateModule(e.name));
            }
        }

        let hosts: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|e| e.rest_host.is_some())
            .map(|e| e.name)
            .collect();
        if hosts.len() > 1 {
            return Err(RegistryError::MultipleRestHosts(hosts));
        }

        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(self.entries.len());
        for e in &self.entries {
            let mut deps = Vec::with_capacity(e.deps.len());
            for &d in e.deps {
                let Some(&di) = index.get(d) else {
                    return Err(RegistryError::UnknownDependency {
                        module: e.name,
                        depends_on: d.to_string(),
                    });
                };
                deps.push(di);
            }
            edges.push(deps);
        }

        let order = topo_order(&self.entries, &edges)?;

        let mut slots: Vec<Option<ModuleEntry>> = self.entries.into_iter().map(Some).collect();
        let modules: Vec<ModuleEntry> = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();

        tracing::info!(
            modules = ?modules.iter().map(|e| e.name).collect::<Vec<_>>(),
            "Module dependency order resolved"
        );
        Ok(ModuleRegistry { modules })
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Depth-first post-order over dependency edges; a back edge is reported
/// with the full cycle path.
fn topo_order(entries: &[ModuleEntry], deps: &[Vec<usize>]) -> Result<Vec<usize>, RegistryError> {
    fn visit(
        node: usize,
        entries: &[ModuleEntry],
        deps: &[Vec<usize>],
        marks: &mut [Mark],
        path: &mut Vec<usize>,
        out: &mut Vec<usize>,
    ) -> Result<(), RegistryError> {
        marks[node] = Mark::OnPath;
        path.push(node);
        for &d in &deps[node] {
            match marks[d] {
                Mark::Done => {}
                Mark::Unvisited => visit(d, entries, deps, marks, path, out)?,
                Mark::OnPath => {
                    let start = path.iter().position(|&n| n == d).unwrap_or(0);
                    let mut cycle: Vec<&'static str> =
                        path[start..].iter().map(|&i| entries[i].name).collect();
                    cycle.push(entries[d].name);
                    return Err(RegistryError::CycleDetected { path: cycle });
                }
            }
        }
        path.pop();
        marks[node] = Mark::Done;
        out.push(node);
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; entries.len()];
    let mut out = Vec::with_capacity(entries.len());
    let mut path = Vec::new();
    for i in 0..entries.len() {
        if marks[i] == Mark::Unvisited {
            visit(i, entries, deps, &mut marks, &mut path, &mut out)?;
        }
    }
    Ok(out)
}

/// The final, dependency-ordered runtime registry.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn get_module(&self, name: &str) -> Option<Arc<dyn Module>> {
        self.modules
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.core.clone())
    }

    // ---- Ordered phases: init → DB → REST (sync) → start → stop ----

    pub async fn run_init_phase(&self, base_ctx: &ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &DatabaseConnection) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                tracing::debug!(module = e.name, "Running migrations");
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    pub fn run_rest_phase(
        &self,
        base_ctx: &ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        let Some(host_entry) = self.modules.iter().find(|e| e.rest_host.is_some()) else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Err(RegistryError::RestRequiresHost);
        };
        let host_ctx = base_ctx.clone().for_module(host_entry.name);
        let registry: &dyn OpenApiRegistry = host.as_registry();

        router = host
            .rest_prepare(&host_ctx, router)
            .map_err(|source| RegistryError::RestPrepare {
                module: host_entry.name,
                source,
            })?;

        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, registry)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        host.rest_finalize(&host_ctx, router)
            .map_err(|source| RegistryError::RestFinalize {
                module: host_entry.name,
                source,
            })
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Stops in reverse order; failures are logged and do not abort the phase.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
    }
}

/// Structured errors for the module registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("initialization failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST modules are registered but no REST host module is present")]
    RestRequiresHost,
    #[error("multiple REST host modules: {0:?}")]
    MultipleRestHosts(Vec<&'static str>),
    #[error("module '{0}' is registered twice")]
    DuplicateModule(&'static str),
    #[error("module '{module}' depends on unknown module '{depends_on}'")]
    UnknownDependency {
        module: &'static str,
        depends_on: String,
    },
    #[error("cyclic dependency detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<&'static str> },
}
