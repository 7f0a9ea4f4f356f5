//! What selecting a hint does, and the seam that performs it.
//!
//! The frame coordinator decides on a [`LinkAction`]; a [`LinkActivator`]
//! carries it out against the real page (or records it, in tests and the
//! CLI).

use async_trait::async_trait;
use keyhints_protocols::{FrameId, HintError, LinkHintMode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementId};
use crate::local_hints::{HintReason, LocalHint};

#[cfg(test)]
#[path = "activator_tests.rs"]
mod tests;

/// Input types that behave like buttons and are clicked without focusing.
const BUTTON_INPUT_TYPES: [&str; 5] = ["button", "submit", "reset", "image", "checkbox"];

/// Modifier keys held down for a simulated click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickModifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ClickModifiers {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::default()
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LinkAction {
    /// Give keyboard focus to the frame itself.
    FocusFrame,
    /// Make the element the target of scrolling commands.
    SelectScroller,
    /// Open or close a `<details>` element.
    ToggleDetails,
    /// Focus a text control and select its contents.
    FocusAndSelect,
    Click {
        modifiers: ClickModifiers,
        /// Focus the element before clicking it.
        focus_first: bool,
    },
    CopyUrl { url: String },
    OpenIncognito { url: String },
    CopyText { text: String },
    Hover,
    Focus,
}

impl std::fmt::Display for LinkAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkAction::FocusFrame => write!(f, "focus-frame"),
            LinkAction::SelectScroller => write!(f, "select-scroller"),
            LinkAction::ToggleDetails => write!(f, "toggle-details"),
            LinkAction::FocusAndSelect => write!(f, "focus-and-select"),
            LinkAction::Click { .. } => write!(f, "click"),
            LinkAction::CopyUrl { .. } => write!(f, "copy-url"),
            LinkAction::OpenIncognito { .. } => write!(f, "open-incognito"),
            LinkAction::CopyText { .. } => write!(f, "copy-text"),
            LinkAction::Hover => write!(f, "hover"),
            LinkAction::Focus => write!(f, "focus"),
        }
    }
}

/// A resolved hint selection, ready to be performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activation {
    pub frame_id: FrameId,
    pub element: ElementId,
    pub tag: String,
    pub href: Option<String>,
    pub text: String,
    pub action: LinkAction,
}

/// Decide what selecting `hint` does in `mode`.
pub fn resolve_action(
    doc: &Document,
    hint: &LocalHint,
    mode: LinkHintMode,
) -> Result<LinkAction, HintError> {
    match hint.reason {
        Some(HintReason::Frame) => return Ok(LinkAction::FocusFrame),
        Some(HintReason::Scroll) => return Ok(LinkAction::SelectScroller),
        Some(HintReason::Open) => return Ok(LinkAction::ToggleDetails),
        None => {}
    }

    let element = doc.element(hint.element);
    if element.is_selectable() {
        return Ok(LinkAction::FocusAndSelect);
    }

    let href = || {
        element
            .href()
            .map(str::to_string)
            .ok_or_else(|| HintError::ActionFailed(format!("<{}> has no href", element.tag)))
    };
    let click = |modifiers| LinkAction::Click {
        modifiers,
        focus_first: needs_focus_before_click(doc, hint.element),
    };

    Ok(match mode {
        LinkHintMode::OpenInCurrentTab => click(ClickModifiers::none()),
        LinkHintMode::OpenInNewBgTab | LinkHintMode::OpenWithQueue => click(ClickModifiers::ctrl()),
        LinkHintMode::OpenInNewFgTab => click(ClickModifiers::ctrl_shift()),
        LinkHintMode::DownloadLinkUrl => click(ClickModifiers::alt()),
        LinkHintMode::CopyLinkUrl => LinkAction::CopyUrl { url: href()? },
        LinkHintMode::OpenIncognito => LinkAction::OpenIncognito { url: href()? },
        LinkHintMode::CopyLinkText => {
            let text = doc.text_content(hint.element).trim().to_string();
            if text.is_empty() {
                return Err(HintError::ActionFailed("no text found".to_string()));
            }
            LinkAction::CopyText { text }
        }
        LinkHintMode::HoverLink => LinkAction::Hover,
        LinkHintMode::FocusElement => LinkAction::Focus,
    })
}

fn needs_focus_before_click(doc: &Document, id: ElementId) -> bool {
    let element = doc.element(id);
    match element.tag.as_str() {
        "input" => !BUTTON_INPUT_TYPES.contains(&element.input_type().as_str()),
        "select" | "object" | "embed" => true,
        _ => false,
    }
}

/// Performs activations against the page.
#[async_trait]
pub trait LinkActivator: Send + Sync {
    async fn perform(&self, activation: &Activation) -> Result<(), HintError>;
}

/// Keeps every activation instead of performing it.
#[derive(Debug, Default)]
pub struct RecordingActivator {
    performed: Mutex<Vec<Activation>>,
}

impl RecordingActivator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn performed(&self) -> Vec<Activation> {
        self.performed.lock().clone()
    }
}

#[async_trait]
impl LinkActivator for RecordingActivator {
    async fn perform(&self, activation: &Activation) -> Result<(), HintError> {
        self.performed.lock().push(activation.clone());
        Ok(())
    }
}
