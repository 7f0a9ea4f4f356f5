//! # KeyHints Protocols
//!
//! Shared definitions for the keyhints workspace.
//! Contains data types, messages and trait seams - no engines.
//!
//! ## Core Items
//!
//! - [`HintDescriptor`] - Cross-frame identity of one clickable opportunity
//! - [`HintMessage`] - The hint-coordination messages exchanged between frames
//! - [`Suggestion`] - One ranked omnibar candidate
//! - [`Completer`] - Trait for asynchronous suggestion sources
//! - [`SettingsStore`] - Trait for the settings collaborator
//! - [`FrameTransport`] - Trait for delivering messages to frames

pub mod completer;
pub mod error;
pub mod hint;
pub mod settings;
pub mod suggestion;
pub mod transport;
pub mod types;

pub use completer::{
    CompleterOutput, Completer, CompletionRequest, CompletionResponse, Continuation,
    SuggestionFilter,
};
pub use error::{CompletionError, HintError, KernelError, ProtocolError, TransportError};
pub use hint::{FrameId, HintDescriptor, HintMessage, KeyState, LinkHintMode, TabId};
pub use settings::{SettingsChange, SettingsStore};
pub use suggestion::{RelevancyFn, Suggestion, SuggestionKind};
pub use transport::FrameTransport;
pub use types::*;
