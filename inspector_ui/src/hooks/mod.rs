//! Instrumentation of a host client
//!
//! Every capability here is optional. When the host does not expose one,
//! the matching hook logs the gap and the rest of the inspector carries on.

pub mod capability;
pub mod events;
pub mod interceptor;

pub use capability::{
    acquire_modules, list_modules, HostError, HostFn, HostModules, ModuleEntry, ModuleHandle, ModuleRegistry,
    SharedModules,
};
pub use events::{
    EventBus, EventCallback, EventCapture, EventMode, LocalEventBus, MutationCallback, MutationSource, LOADED_EVENT,
    MUTATION_EVENT,
};
pub use interceptor::{HookSet, HookSpec, Interceptor, PayloadSource, STANDARD_HOOKS};

use crate::capture::CaptureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HookError {
    #[error("capability unavailable: {0}")]
    UnavailableCapability(String),
    #[error("{module} has no export {export}")]
    MissingExport { module: String, export: String },
    #[error("could not prepare record: {0}")]
    Payload(String),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}
