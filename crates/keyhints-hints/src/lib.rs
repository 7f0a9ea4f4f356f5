//! # KeyHints Hints
//!
//! Link hints: finding clickable elements in a frame, labelling them,
//! matching typed keys against the labels and coordinating one hint session
//! across every frame of a tab.
//!
//! ## Core Items
//!
//! - [`LocalHints`] - Clickable, visible elements of one document
//! - [`MarkerMatcher`] - Alphabet and filtered label matching
//! - [`LinkHintsMode`] - One frame's view of an active hint session
//! - [`FrameCoordinator`] / [`TabCoordinator`] - The two ends of the hint protocol
//! - [`HintBus`] - Runs frames and tabs as tasks over channels
//! - [`LinkActivator`] - Performs the selected link action

pub mod activator;
pub mod bus;
pub mod dom;
pub mod frame;
pub mod keys;
pub mod link_hints_mode;
pub mod link_text;
pub mod local_hints;
pub mod marker;
pub mod matcher;
pub mod mode;
pub mod rect;
pub mod tab;

pub use activator::{Activation, ClickModifiers, LinkAction, LinkActivator, RecordingActivator, resolve_action};
pub use bus::{FrameHandle, HintBus};
pub use dom::{Document, DocumentSpec, Element, ElementId, NodeSpec, Viewport};
pub use frame::{FrameCoordinator, FrameEffect, FrameSnapshot, MarkerView};
pub use keys::KeyEvent;
pub use link_hints_mode::{KeyResponse, LinkHintsMode, Resolution};
pub use link_text::{generate_link_text, render_marker_text};
pub use local_hints::{HintOptions, HintReason, LocalHint, LocalHints};
pub use marker::HintMarker;
pub use matcher::{AlphabetHints, FilterHints, MarkerMatcher, MatchOutcome, hint_strings, matcher_for};
pub use mode::{HandlerResult, HandlerStack, ModeKind, Trigger};
pub use rect::Rect;
pub use tab::{TabCoordinator, TabEffect};
