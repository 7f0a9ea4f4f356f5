//! # KeyHints Core
//!
//! Service kernel for keyhints.
//!
//! ## Core Items
//!
//! - [`Kernel`] - Owns settings, browsing state, completer sets and the hint bus
//! - [`LifecycleManager`] - Ordered startup and shutdown of background services
//! - [`CompleterRegistry`] - Completer sets by name ("omni", "bookmarks", "tabs")
//! - [`BrowserEvent`] - Tab and history events fed in by browser glue

pub mod events;
mod hooks;
pub mod kernel;
pub mod lifecycle;
pub mod registry;
mod services;

pub use events::BrowserEvent;
pub use kernel::{Kernel, completer_names};
pub use lifecycle::{KernelState, LifecycleHook, LifecycleManager, ShutdownSignal};
pub use registry::CompleterRegistry;
pub use services::BrowserSources;
