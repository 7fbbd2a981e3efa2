//! Optional host capabilities: the module system and its exports

use crate::viewer::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;

/// Failure raised by a host function
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A callable export of a host module
pub type HostFn = Arc<dyn Fn(&[Value]) -> Result<Value, HostError> + Send + Sync>;

/// One host module: a named table of replaceable exports
#[derive(Clone)]
pub struct ModuleHandle {
    name: Arc<str>,
    exports: Arc<RwLock<HashMap<String, HostFn>>>,
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("exports", &self.export_names())
            .finish()
    }
}

impl ModuleHandle {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            exports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder-style export registration
    pub fn with_export<F>(self, export: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, HostError> + Send + Sync + 'static,
    {
        self.replace(export, Arc::new(f));
        self
    }

    /// Export names, sorted
    pub fn export_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.exports.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn get(&self, export: &str) -> Option<HostFn> {
        self.exports.read().get(export).cloned()
    }

    /// Swap in `f`, returning what was there before
    pub fn replace(&self, export: &str, f: HostFn) -> Option<HostFn> {
        self.exports.write().insert(export.to_string(), f)
    }

    /// Call an export the way host code would, through the current binding
    pub fn call(&self, export: &str, args: &[Value]) -> Result<Value, HostError> {
        let f = self
            .get(export)
            .ok_or_else(|| HostError::new(format!("{}.{} is not a function", self.name, export)))?;
        f(args)
    }
}

/// The host's module system, when it exposes one
pub trait HostModules: Send + Sync {
    fn require(&self, id: &str) -> Option<ModuleHandle>;

    /// Every known module id, if the host can enumerate them
    fn module_ids(&self) -> Option<Vec<String>>;
}

pub type SharedModules = Arc<dyn HostModules>;

/// In-process module table
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Arc<RwLock<HashMap<String, ModuleHandle>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, module: ModuleHandle) -> &Self {
        self.modules.write().insert(module.name().to_string(), module);
        self
    }
}

impl HostModules for ModuleRegistry {
    fn require(&self, id: &str) -> Option<ModuleHandle> {
        self.modules.read().get(id).cloned()
    }

    fn module_ids(&self) -> Option<Vec<String>> {
        let mut ids: Vec<_> = self.modules.read().keys().cloned().collect();
        ids.sort();
        Some(ids)
    }
}

/// A host module as listed in the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub id: String,
    pub exports: Vec<String>,
}

impl ModuleEntry {
    pub fn label(&self) -> String {
        format!("{} ({} exports)", self.id, self.exports.len())
    }
}

/// Every module the host can enumerate, with its exports, sorted by id.
///
/// A host that cannot enumerate its modules yields an empty list.
pub fn list_modules(modules: &dyn HostModules) -> Vec<ModuleEntry> {
    let Some(ids) = modules.module_ids() else {
        tracing::debug!("host cannot enumerate its modules");
        return Vec::new();
    };
    let mut entries: Vec<_> = ids
        .into_iter()
        .filter_map(|id| {
            let handle = modules.require(&id)?;
            Some(ModuleEntry {
                exports: handle.export_names(),
                id,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.id.cmp(&b.id));
    entries
}

/// Resolve the module system once.
///
/// A directly exposed `primary` wins. Otherwise wait for the host to hand
/// one over on `fallback`; a dropped sender means the host has none. There
/// is no timeout and no error: absence is `None`.
pub async fn acquire_modules(
    primary: Option<SharedModules>,
    fallback: Option<oneshot::Receiver<SharedModules>>,
) -> Option<SharedModules> {
    if let Some(modules) = primary {
        tracing::debug!("module system exposed directly");
        return Some(modules);
    }

    let Some(receiver) = fallback else {
        tracing::warn!("no route to the host module system");
        return None;
    };

    match receiver.await {
        Ok(modules) => {
            tracing::debug!("module system handed over by host");
            Some(modules)
        }
        Err(_) => {
            tracing::warn!("host closed the module hand-over without a module system");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_module() -> ModuleHandle {
        ModuleHandle::new("wap").with_export("encode", |args| Ok(args.first().cloned().unwrap_or(Value::Null)))
    }

    #[test]
    fn test_replace_returns_previous_binding() {
        let module = echo_module();
        let previous = module.replace("encode", Arc::new(|_| Ok(Value::from("patched"))));
        assert!(previous.is_some());
        assert!(matches!(module.call("encode", &[]), Ok(Value::String(s)) if s == "patched"));
        assert!(module.call("missing", &[]).is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = ModuleRegistry::new();
        registry.register(echo_module());
        assert!(registry.require("wap").is_some());
        assert!(registry.require("other").is_none());
        assert_eq!(registry.module_ids(), Some(vec!["wap".to_string()]));
    }

    #[test]
    fn test_list_modules_with_exports() {
        let registry = ModuleRegistry::new();
        registry
            .register(echo_module().with_export("decode", |_| Ok(Value::Null)))
            .register(ModuleHandle::new("logger"));

        let entries = list_modules(&registry);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "logger");
        assert!(entries[0].exports.is_empty());
        assert_eq!(entries[1].exports, vec!["decode".to_string(), "encode".to_string()]);
        assert_eq!(entries[1].label(), "wap (2 exports)");
    }

    #[test]
    fn test_list_modules_without_enumeration() {
        struct Opaque;
        impl HostModules for Opaque {
            fn require(&self, _id: &str) -> Option<ModuleHandle> {
                None
            }
            fn module_ids(&self) -> Option<Vec<String>> {
                None
            }
        }
        assert!(list_modules(&Opaque).is_empty());
    }

    #[tokio::test]
    async fn test_acquire_prefers_primary() {
        let primary: SharedModules = Arc::new(ModuleRegistry::new());
        assert!(acquire_modules(Some(primary), None).await.is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_fallback() {
        let (tx, rx) = oneshot::channel::<SharedModules>();
        tokio::spawn(async move {
            let _ = tx.send(Arc::new(ModuleRegistry::new()));
        });
        assert!(acquire_modules(None, Some(rx)).await.is_some());
    }

    #[tokio::test]
    async fn test_acquire_resolves_none_when_host_gives_up() {
        let (tx, rx) = oneshot::channel::<SharedModules>();
        drop(tx);
        assert!(acquire_modules(None, Some(rx)).await.is_none());
        assert!(acquire_modules(None, None).await.is_none());
    }
}
