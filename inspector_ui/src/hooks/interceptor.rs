//! Wrapping host exports so their traffic lands in the log buffer

use super::capability::{HostError, HostFn, HostModules, ModuleHandle};
use super::HookError;
use crate::capture::SharedCapture;
use crate::viewer::Value;
use std::sync::Arc;

/// Which part of an intercepted call becomes the record payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    FirstArg,
    AllArgs,
    /// The original's return value; failed calls record nothing
    Result,
}

/// Where a hook attaches and what it records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSpec {
    pub name: &'static str,
    pub module: &'static str,
    pub export: &'static str,
    pub category: &'static str,
    pub payload: PayloadSource,
}

pub const STANDARD_HOOKS: [HookSpec; 6] = [
    HookSpec {
        name: "app state sync",
        module: "sync_request_builder",
        export: "build_sync_iq_node",
        category: "app_state",
        payload: PayloadSource::FirstArg,
    },
    HookSpec {
        name: "internal log",
        module: "logger",
        export: "log",
        category: "logs",
        payload: PayloadSource::AllArgs,
    },
    HookSpec {
        name: "received stanza",
        module: "wap",
        export: "decode_stanza",
        category: "received",
        payload: PayloadSource::Result,
    },
    HookSpec {
        name: "decode",
        module: "protobuf",
        export: "decode_protobuf",
        category: "decode",
        payload: PayloadSource::Result,
    },
    HookSpec {
        name: "sent stanza",
        module: "wap",
        export: "encode_stanza",
        category: "sent",
        payload: PayloadSource::FirstArg,
    },
    HookSpec {
        name: "encode",
        module: "send_msg_api",
        export: "encode_and_pad",
        category: "encode",
        payload: PayloadSource::FirstArg,
    },
];

/// Records one host call per invocation, around an untouched original
#[derive(Clone)]
pub struct Interceptor {
    spec: HookSpec,
    capture: SharedCapture,
}

impl Interceptor {
    pub fn new(spec: HookSpec, capture: SharedCapture) -> Self {
        Self { spec, capture }
    }

    fn payload(&self, args: &[Value], result: &Result<Value, HostError>) -> Result<Option<Vec<Value>>, HookError> {
        match self.spec.payload {
            PayloadSource::FirstArg => args
                .first()
                .map(|arg| Some(vec![arg.clone()]))
                .ok_or_else(|| HookError::Payload(format!("{} called without arguments", self.spec.export))),
            PayloadSource::AllArgs => Ok(Some(args.to_vec())),
            PayloadSource::Result => Ok(result.as_ref().ok().map(|value| vec![value.clone()])),
        }
    }

    /// Run `original`, then record best-effort. The original's outcome is
    /// returned unchanged whatever happens to the record.
    pub fn invoke(&self, original: &HostFn, args: &[Value]) -> Result<Value, HostError> {
        let result = original(args);

        let recorded = self.payload(args, &result).and_then(|payload| match payload {
            Some(payload) => self.capture.record(self.spec.category, payload).map_err(HookError::from),
            None => Ok(None),
        });
        if let Err(e) = recorded {
            tracing::warn!(hook = self.spec.name, error = %e, "dropped intercepted record");
        }

        result
    }

    /// The replacement export that calls through to `original`
    pub fn wrap(self, original: HostFn) -> HostFn {
        Arc::new(move |args: &[Value]| self.invoke(&original, args))
    }
}

struct InstalledHook {
    spec: HookSpec,
    module: ModuleHandle,
    original: HostFn,
}

/// The set of hooks currently patched into the host
pub struct HookSet {
    capture: SharedCapture,
    installed: Vec<InstalledHook>,
    active: bool,
}

impl HookSet {
    /// Install every hook in `specs` whose module and export exist.
    ///
    /// Missing modules are logged and skipped; the rest still install.
    pub fn install(modules: &dyn HostModules, capture: SharedCapture, specs: &[HookSpec]) -> Self {
        let mut installed = Vec::new();
        for spec in specs {
            match Self::attach(modules, &capture, spec) {
                Ok(hook) => {
                    tracing::info!(hook = spec.name, "hook installed");
                    installed.push(hook);
                }
                Err(e) => tracing::warn!(hook = spec.name, error = %e, "hook skipped"),
            }
        }
        Self {
            capture,
            installed,
            active: true,
        }
    }

    pub fn install_standard(modules: &dyn HostModules, capture: SharedCapture) -> Self {
        Self::install(modules, capture, &STANDARD_HOOKS)
    }

    fn attach(modules: &dyn HostModules, capture: &SharedCapture, spec: &HookSpec) -> Result<InstalledHook, HookError> {
        let module = modules
            .require(spec.module)
            .ok_or_else(|| HookError::UnavailableCapability(format!("module {}", spec.module)))?;
        let original = module.get(spec.export).ok_or_else(|| HookError::MissingExport {
            module: spec.module.to_string(),
            export: spec.export.to_string(),
        })?;
        module.replace(spec.export, Interceptor::new(*spec, capture.clone()).wrap(original.clone()));
        Ok(InstalledHook {
            spec: *spec,
            module,
            original,
        })
    }

    /// Names of the hooks that attached
    pub fn installed(&self) -> Vec<&'static str> {
        self.installed.iter().map(|hook| hook.spec.name).collect()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Restore every original export, disable capture and clear the buffer
    pub fn stop(&mut self) {
        for hook in &self.installed {
            hook.module.replace(hook.spec.export, hook.original.clone());
        }
        self.capture.set_all_enabled(false);
        self.capture.set_all_categories(false);
        self.capture.clear();
        self.active = false;
        tracing::info!(hooks = self.installed.len(), "hooks stopped");
    }

    /// Re-enable capture and patch the originals again
    pub fn restart(&mut self) {
        self.capture.set_all_enabled(true);
        self.capture.set_all_categories(true);
        for hook in &self.installed {
            let wrapped = Interceptor::new(hook.spec, self.capture.clone()).wrap(hook.original.clone());
            hook.module.replace(hook.spec.export, wrapped);
        }
        self.active = true;
        tracing::info!(hooks = self.installed.len(), "hooks restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureBuffer;
    use crate::hooks::ModuleRegistry;

    fn host() -> ModuleRegistry {
        let registry = ModuleRegistry::new();
        registry.register(
            ModuleHandle::new("wap")
                .with_export("encode_stanza", |args| Ok(Value::from(format!("bytes:{}", args.len()))))
                .with_export("decode_stanza", |args| match args.first() {
                    Some(Value::String(s)) if s == "corrupt" => Err(HostError::new("bad frame")),
                    Some(arg) => Ok(Value::object([("tag", arg.clone())])),
                    None => Ok(Value::Null),
                }),
        );
        registry.register(ModuleHandle::new("logger").with_export("log", |_| Ok(Value::Undefined)));
        registry
    }

    fn payload_text(capture: &SharedCapture) -> Vec<String> {
        capture
            .list()
            .iter()
            .map(|r| format!("{}:{}", r.category, r.payload_json()))
            .collect()
    }

    #[test]
    fn test_standard_hooks_skip_missing_modules() {
        let capture = SharedCapture::new(CaptureBuffer::for_logs(20));
        let hooks = HookSet::install_standard(&host(), capture);
        assert_eq!(hooks.installed(), vec!["internal log", "received stanza", "sent stanza"]);
    }

    #[test]
    fn test_intercepted_calls_are_recorded() {
        let registry = host();
        let capture = SharedCapture::new(CaptureBuffer::for_logs(20));
        let _hooks = HookSet::install_standard(&registry, capture.clone());
        let wap = registry.require("wap").unwrap();
        let logger = registry.require("logger").unwrap();

        let sent = wap.call("encode_stanza", &[Value::from("iq"), Value::from(1i64)]);
        assert!(matches!(sent, Ok(Value::String(s)) if s == "bytes:2"));
        wap.call("decode_stanza", &[Value::from("message")]).unwrap();
        logger.call("log", &[Value::from("a"), Value::from("b")]).unwrap();

        assert_eq!(
            payload_text(&capture),
            vec![
                "logs:[\"a\",\"b\"]".to_string(),
                "received:[{\"tag\":\"message\"}]".to_string(),
                "sent:[\"iq\"]".to_string(),
            ]
        );
    }

    #[test]
    fn test_original_error_passes_through() {
        let registry = host();
        let capture = SharedCapture::new(CaptureBuffer::for_logs(20));
        let _hooks = HookSet::install_standard(&registry, capture.clone());

        let result = registry.require("wap").unwrap().call("decode_stanza", &[Value::from("corrupt")]);
        assert_eq!(result.unwrap_err().message, "bad frame");
        assert!(capture.list().is_empty());
    }

    #[test]
    fn test_payload_failure_does_not_affect_call() {
        let registry = host();
        let capture = SharedCapture::new(CaptureBuffer::for_logs(20));
        let _hooks = HookSet::install_standard(&registry, capture.clone());

        let result = registry.require("wap").unwrap().call("encode_stanza", &[]);
        assert!(matches!(result, Ok(Value::String(s)) if s == "bytes:0"));
        assert!(capture.list().is_empty());
    }

    #[test]
    fn test_record_into_unknown_category_is_contained() {
        let registry = host();
        let capture = SharedCapture::new(CaptureBuffer::for_events(20));
        let _hooks = HookSet::install_standard(&registry, capture.clone());

        assert!(registry.require("logger").unwrap().call("log", &[Value::Null]).is_ok());
        assert!(capture.list().is_empty());
    }

    #[test]
    fn test_stop_restores_and_restart_repatches() {
        let registry = host();
        let capture = SharedCapture::new(CaptureBuffer::for_logs(20));
        let mut hooks = HookSet::install_standard(&registry, capture.clone());
        let logger = registry.require("logger").unwrap();

        logger.call("log", &[Value::from("before")]).unwrap();
        hooks.stop();
        assert!(capture.list().is_empty());
        assert!(!capture.status().enabled);

        logger.call("log", &[Value::from("while stopped")]).unwrap();
        assert!(capture.list().is_empty());

        hooks.restart();
        logger.call("log", &[Value::from("after")]).unwrap();
        assert_eq!(payload_text(&capture), vec!["logs:[\"after\"]".to_string()]);
        assert!(hooks.is_active());
    }
}
