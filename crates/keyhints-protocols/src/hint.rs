//! Hint-coordination protocol definitions.
//!
//! Only small serializable payloads cross frame boundaries: descriptors,
//! indices and keystroke queues. DOM elements never leave their frame.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HintError;

#[cfg(test)]
#[path = "hint_tests.rs"]
mod tests;

/// Identifies one execution context (frame) within a tab.
pub type FrameId = u64;

/// Identifies a browser tab.
pub type TabId = u64;

/// Cross-frame identity of a clickable opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintDescriptor {
    /// Frame owning the underlying element.
    pub frame_id: FrameId,
    /// Index into the owning frame's private candidate list.
    pub local_index: usize,
    /// Only populated when filter-mode hinting is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
}

impl HintDescriptor {
    pub fn new(frame_id: FrameId, local_index: usize) -> Self {
        Self {
            frame_id,
            local_index,
            link_text: None,
        }
    }

    pub fn with_link_text(mut self, link_text: impl Into<String>) -> Self {
        self.link_text = Some(link_text.into());
        self
    }
}

/// Accumulated keystroke state broadcast on every hint keypress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyState {
    pub hint_keystroke_queue: Vec<char>,
    pub link_text_keystroke_queue: Vec<char>,
    pub tab_count: i32,
}

/// What happens to the element behind the selected hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkHintMode {
    OpenInCurrentTab,
    OpenInNewBgTab,
    OpenInNewFgTab,
    OpenWithQueue,
    CopyLinkUrl,
    OpenIncognito,
    DownloadLinkUrl,
    CopyLinkText,
    HoverLink,
    FocusElement,
}

impl LinkHintMode {
    /// Modes in wire order; `mode_index` values index into this table.
    pub const ALL: [LinkHintMode; 10] = [
        LinkHintMode::OpenInCurrentTab,
        LinkHintMode::OpenInNewBgTab,
        LinkHintMode::OpenInNewFgTab,
        LinkHintMode::OpenWithQueue,
        LinkHintMode::CopyLinkUrl,
        LinkHintMode::OpenIncognito,
        LinkHintMode::DownloadLinkUrl,
        LinkHintMode::CopyLinkText,
        LinkHintMode::HoverLink,
        LinkHintMode::FocusElement,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Result<Self, HintError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(HintError::InvalidMode(index))
    }

    /// Modes which only make sense for elements carrying an `href`.
    pub fn requires_href(self) -> bool {
        matches!(self, LinkHintMode::CopyLinkUrl | LinkHintMode::OpenIncognito)
    }

    /// Modes whose target can be flipped with Shift or Control while hinting.
    pub fn toggles_with_modifiers(self) -> bool {
        matches!(
            self,
            LinkHintMode::OpenInCurrentTab
                | LinkHintMode::OpenWithQueue
                | LinkHintMode::OpenInNewBgTab
                | LinkHintMode::OpenInNewFgTab
        )
    }

    /// Mode entered while Shift is held.
    pub fn toggled_by_shift(self) -> Self {
        if !self.toggles_with_modifiers() {
            return self;
        }
        match self {
            LinkHintMode::OpenInCurrentTab => LinkHintMode::OpenInNewBgTab,
            _ => LinkHintMode::OpenInCurrentTab,
        }
    }

    /// Mode entered while Control (or Meta) is held.
    pub fn toggled_by_control(self) -> Self {
        if !self.toggles_with_modifiers() {
            return self;
        }
        match self {
            LinkHintMode::OpenInNewFgTab => LinkHintMode::OpenInNewBgTab,
            _ => LinkHintMode::OpenInNewFgTab,
        }
    }

    /// Status line shown while the mode is active.
    pub fn hud_text(self) -> &'static str {
        match self {
            LinkHintMode::OpenInCurrentTab => "Open link in current tab",
            LinkHintMode::OpenInNewBgTab => "Open link in new tab",
            LinkHintMode::OpenInNewFgTab => "Open link in new tab and switch to it",
            LinkHintMode::OpenWithQueue => "Open multiple links in new tabs",
            LinkHintMode::CopyLinkUrl => "Copy link URL to Clipboard",
            LinkHintMode::OpenIncognito => "Open link in incognito window",
            LinkHintMode::DownloadLinkUrl => "Download link URL",
            LinkHintMode::CopyLinkText => "Copy link text to Clipboard",
            LinkHintMode::HoverLink => "Hover link",
            LinkHintMode::FocusElement => "Focus element",
        }
    }
}

impl fmt::Display for LinkHintMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkHintMode::OpenInCurrentTab => "open-in-current-tab",
            LinkHintMode::OpenInNewBgTab => "open-in-new-bg-tab",
            LinkHintMode::OpenInNewFgTab => "open-in-new-fg-tab",
            LinkHintMode::OpenWithQueue => "open-with-queue",
            LinkHintMode::CopyLinkUrl => "copy-link-url",
            LinkHintMode::OpenIncognito => "open-incognito",
            LinkHintMode::DownloadLinkUrl => "download-link-url",
            LinkHintMode::CopyLinkText => "copy-link-text",
            LinkHintMode::HoverLink => "hover-link",
            LinkHintMode::FocusElement => "focus-element",
        };
        write!(f, "{}", name)
    }
}

/// Messages exchanged between frames and the tab-level coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum HintMessage {
    /// A frame saw the activation key; every frame should start suppressing keys.
    #[serde(rename_all = "camelCase")]
    PrepareToActivateMode {
        mode_index: usize,
        is_help_dialog: bool,
    },

    /// Ask a frame for its local descriptors.
    #[serde(rename_all = "camelCase")]
    GetHintDescriptors {
        mode_index: usize,
        is_help_dialog: bool,
    },

    /// A frame's reply to `GetHintDescriptors`.
    #[serde(rename_all = "camelCase")]
    PostHintDescriptors {
        hint_descriptors: Vec<HintDescriptor>,
    },

    /// Every frame's descriptors except the recipient's own.
    #[serde(rename_all = "camelCase")]
    ActivateMode {
        hint_descriptors: BTreeMap<FrameId, Vec<HintDescriptor>>,
        mode_index: usize,
        originating_frame_id: FrameId,
    },

    UpdateKeyState(KeyState),

    RotateHints,

    #[serde(rename_all = "camelCase")]
    SetOpenLinkMode { mode_index: usize },

    ActivateActiveHintMarker,

    #[serde(rename_all = "camelCase")]
    Exit { is_success: bool },
}

impl HintMessage {
    /// Wire name of the message.
    pub fn name(&self) -> &'static str {
        match self {
            HintMessage::PrepareToActivateMode { .. } => "prepareToActivateMode",
            HintMessage::GetHintDescriptors { .. } => "getHintDescriptors",
            HintMessage::PostHintDescriptors { .. } => "postHintDescriptors",
            HintMessage::ActivateMode { .. } => "activateMode",
            HintMessage::UpdateKeyState(_) => "updateKeyState",
            HintMessage::RotateHints => "rotateHints",
            HintMessage::SetOpenLinkMode { .. } => "setOpenLinkMode",
            HintMessage::ActivateActiveHintMarker => "activateActiveHintMarker",
            HintMessage::Exit { .. } => "exit",
        }
    }
}
