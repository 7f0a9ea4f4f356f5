//! Frame-side hint coordination.
//!
//! A [`FrameCoordinator`] owns one frame's document and key-handling modes.
//! It is a synchronous state machine: every entry point returns the
//! [`FrameEffect`]s the caller must carry out (messages to the tab, timers,
//! link activations, HUD and flash updates). The bus runs it inside a task.

use std::collections::BTreeMap;
use std::mem;
use std::time::Duration;

use keyhints_config::Settings;
use keyhints_protocols::{FrameId, HintDescriptor, HintMessage, KeyState, LinkHintMode};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::activator::{Activation, LinkAction, resolve_action};
use crate::dom::Document;
use crate::keys::KeyEvent;
use crate::link_hints_mode::{LinkHintsMode, Resolution};
use crate::local_hints::{HintOptions, LocalHint, LocalHints};
use crate::matcher::matcher_for;
use crate::mode::{ExitedMode, HandlerResult, HandlerStack, ModeId, ModeKind, Trigger};
use crate::rect::Rect;

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;

const NO_LINKS: &str = "No links to select.";

/// Work a frame asks its runtime to do.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEffect {
    /// Message for the tab coordinator.
    Send(HintMessage),
    /// Call [`FrameCoordinator::on_timeout`] with these values after `after`.
    StartTimer {
        mode: ModeId,
        generation: u64,
        after: Duration,
    },
    Activate(Activation),
    /// Highlight rects, cleared after `clear_after` or by [`FrameEffect::ClearFlash`].
    Flash {
        rects: Vec<Rect>,
        clear_after: Option<Duration>,
    },
    ClearFlash,
    Hud(String),
}

/// Work deferred until hint mode exits.
#[derive(Debug, Clone, PartialEq)]
enum ExitHook {
    ActivateLink { hint: LocalHint, mode: LinkHintMode },
    RemoveFlash,
    Reactivate { mode: LinkHintMode, count: usize },
}

/// Serializable view of one marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub frame_id: FrameId,
    pub local_index: usize,
    pub is_local: bool,
    pub hint_string: String,
    pub rendered: String,
    pub visible: bool,
}

/// Serializable view of a frame's hint state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame_id: FrameId,
    pub modes: Vec<String>,
    pub mode: Option<LinkHintMode>,
    pub markers: Vec<MarkerView>,
    pub key_state: Option<KeyState>,
    pub active_hint: Option<usize>,
}

pub struct FrameCoordinator {
    frame_id: FrameId,
    settings: Settings,
    resolver: LocalHints,
    document: Document,
    is_help_dialog: bool,
    window_focused: bool,
    stack: HandlerStack,
    /// Hints reported for the session being set up.
    local_hints: Vec<LocalHint>,
    local_descriptors: Vec<HintDescriptor>,
    session: Option<LinkHintsMode>,
    /// Keydowns swallowed while waiting for the other frames.
    cached_keys: Vec<KeyEvent>,
    on_exit: Vec<ExitHook>,
}

impl FrameCoordinator {
    pub fn new(frame_id: FrameId, document: Document, settings: Settings) -> Self {
        Self {
            frame_id,
            resolver: LocalHints::new(settings.hints.clone()),
            settings,
            document,
            is_help_dialog: false,
            window_focused: false,
            stack: HandlerStack::new(),
            local_hints: Vec::new(),
            local_descriptors: Vec::new(),
            session: None,
            cached_keys: Vec::new(),
            on_exit: Vec::new(),
        }
    }

    pub fn with_focus(mut self, focused: bool) -> Self {
        self.window_focused = focused;
        self
    }

    pub fn with_help_dialog(mut self, is_help_dialog: bool) -> Self {
        self.is_help_dialog = is_help_dialog;
        self
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.window_focused = focused;
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let session = self.session.as_ref();
        FrameSnapshot {
            frame_id: self.frame_id,
            modes: self.stack.kinds().iter().map(ToString::to_string).collect(),
            mode: session.map(LinkHintsMode::mode),
            markers: session
                .map(|s| {
                    s.markers()
                        .iter()
                        .map(|m| MarkerView {
                            frame_id: m.descriptor.frame_id,
                            local_index: m.descriptor.local_index,
                            is_local: m.is_local,
                            hint_string: m.hint_string.clone(),
                            rendered: m.rendered.clone(),
                            visible: m.visible,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            key_state: session.map(LinkHintsMode::key_state),
            active_hint: session.and_then(LinkHintsMode::active_hint),
        }
    }

    fn millis(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    /// Start hint mode from this frame. Keys are cached until the other
    /// frames have reported their hints.
    pub fn activate(&mut self, mode: LinkHintMode, count: usize) -> Vec<FrameEffect> {
        if self.session.take().is_some() {
            debug!(frame_id = self.frame_id, "replacing active hint session");
        }
        self.stack.remove_kind(ModeKind::LinkHints);
        self.stack.remove_kind(ModeKind::SuppressKeys);
        self.cached_keys.clear();

        let entry = self.stack.push(ModeKind::SuppressKeys);
        self.on_exit = vec![ExitHook::Reactivate { mode, count }];
        info!(frame_id = self.frame_id, mode = %mode, count, "activating link hints");

        vec![
            FrameEffect::StartTimer {
                mode: entry.id,
                generation: entry.timer_generation,
                after: Self::millis(self.settings.hints.suppression_timeout_ms),
            },
            FrameEffect::Send(HintMessage::PrepareToActivateMode {
                mode_index: mode.index(),
                is_help_dialog: self.is_help_dialog,
            }),
        ]
    }

    /// A message relayed by the tab coordinator.
    pub fn handle_message(&mut self, message: HintMessage) -> Vec<FrameEffect> {
        trace!(frame_id = self.frame_id, message = message.name(), "frame received message");
        match message {
            HintMessage::GetHintDescriptors {
                mode_index,
                is_help_dialog,
            } => self.get_hint_descriptors(mode_index, is_help_dialog),
            HintMessage::ActivateMode {
                hint_descriptors,
                mode_index,
                originating_frame_id,
            } => self.activate_mode(hint_descriptors, mode_index, originating_frame_id),
            HintMessage::Exit { is_success } => self.exit(is_success),
            HintMessage::PrepareToActivateMode { .. } | HintMessage::PostHintDescriptors { .. } => {
                trace!(frame_id = self.frame_id, "tab-side message ignored by frame");
                Vec::new()
            }
            message => {
                let Some(session) = self.session.as_mut() else {
                    trace!(frame_id = self.frame_id, message = message.name(), "hints not active");
                    return Vec::new();
                };
                match message {
                    HintMessage::UpdateKeyState(state) => {
                        let resolution = session.update_key_state(state);
                        self.resolve(resolution)
                    }
                    HintMessage::RotateHints => {
                        session.rotate_hints();
                        Vec::new()
                    }
                    HintMessage::SetOpenLinkMode { mode_index } => {
                        match LinkHintMode::from_index(mode_index) {
                            Ok(mode) => session.set_open_link_mode(mode),
                            Err(e) => warn!(frame_id = self.frame_id, error = %e, "ignoring open-link mode"),
                        }
                        Vec::new()
                    }
                    HintMessage::ActivateActiveHintMarker => match session.active_hint() {
                        Some(marker) => self.activate_link(marker, false),
                        None => Vec::new(),
                    },
                    _ => Vec::new(),
                }
            }
        }
    }

    fn get_hint_descriptors(&mut self, mode_index: usize, is_help_dialog: bool) -> Vec<FrameEffect> {
        let require_href = match LinkHintMode::from_index(mode_index) {
            Ok(mode) => mode.requires_href(),
            Err(e) => {
                warn!(frame_id = self.frame_id, error = %e, "descriptor request for unknown mode");
                false
            }
        };

        let filter_mode = self.settings.filter_link_hints;
        self.local_hints = if is_help_dialog && !self.is_help_dialog {
            Vec::new()
        } else {
            self.resolver.get_local_hints(
                &self.document,
                HintOptions {
                    require_href,
                    filter_mode,
                    window_focused: self.window_focused,
                },
            )
        };
        self.local_descriptors = self
            .local_hints
            .iter()
            .enumerate()
            .map(|(local_index, hint)| {
                let descriptor = HintDescriptor::new(self.frame_id, local_index);
                match (&hint.link_text, filter_mode) {
                    (Some(text), true) => descriptor.with_link_text(text.clone()),
                    _ => descriptor,
                }
            })
            .collect();
        debug!(
            frame_id = self.frame_id,
            hints = self.local_descriptors.len(),
            "posting hint descriptors"
        );

        vec![FrameEffect::Send(HintMessage::PostHintDescriptors {
            hint_descriptors: self.local_descriptors.clone(),
        })]
    }

    fn activate_mode(
        &mut self,
        mut hint_descriptors: BTreeMap<FrameId, Vec<HintDescriptor>>,
        mode_index: usize,
        originating_frame_id: FrameId,
    ) -> Vec<FrameEffect> {
        hint_descriptors.insert(self.frame_id, mem::take(&mut self.local_descriptors));
        let descriptors: Vec<HintDescriptor> = hint_descriptors.into_values().flatten().collect();

        self.stack.remove_kind(ModeKind::SuppressKeys);
        let cached_keys = mem::take(&mut self.cached_keys);
        let is_originating = self.frame_id == originating_frame_id;
        if !is_originating {
            self.on_exit.clear();
        }

        let mode = match LinkHintMode::from_index(mode_index) {
            Ok(mode) => mode,
            Err(e) => {
                warn!(frame_id = self.frame_id, error = %e, "cannot activate hints");
                return self.exit(false);
            }
        };

        let mut effects = Vec::new();
        if descriptors.is_empty() {
            if is_originating {
                effects.push(FrameEffect::Hud(NO_LINKS.to_string()));
            }
            effects.extend(self.exit(false));
            return effects;
        }

        self.stack.push(ModeKind::LinkHints);
        self.session = Some(LinkHintsMode::new(
            mode,
            self.frame_id,
            descriptors,
            &self.local_hints,
            matcher_for(&self.settings),
            self.settings.filter_link_hints,
        ));
        if self.window_focused {
            effects.push(FrameEffect::Hud(mode.hud_text().to_string()));
        }

        for event in cached_keys.iter().filter(|e| !e.repeat) {
            let (_, replayed) = self.on_key_down(event);
            effects.extend(replayed);
        }
        effects
    }

    /// Act on a key-state update.
    fn resolve(&mut self, resolution: Resolution) -> Vec<FrameEffect> {
        match resolution {
            Resolution::Narrowed => Vec::new(),
            Resolution::NoMatch => self.exit(false),
            Resolution::Single {
                marker,
                user_might_over_type,
            } => self.activate_link(marker, user_might_over_type),
        }
    }

    fn activate_link(&mut self, marker: usize, user_might_over_type: bool) -> Vec<FrameEffect> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let Some(matched) = session.marker(marker).cloned() else {
            warn!(frame_id = self.frame_id, marker, "matched marker out of range");
            return Vec::new();
        };
        session.hide_markers();
        let mode = session.mode();

        let local = if matched.is_local {
            self.local_hints.get(matched.descriptor.local_index).cloned()
        } else {
            None
        };
        debug!(
            frame_id = self.frame_id,
            owner = matched.descriptor.frame_id,
            hint = %matched.hint_string,
            local = local.is_some(),
            "hint matched"
        );

        let mut effects = Vec::new();
        if let Some(hint) = &local {
            self.on_exit.push(ExitHook::ActivateLink {
                hint: hint.clone(),
                mode,
            });
        }

        if user_might_over_type {
            if let Some(hint) = &local {
                effects.push(FrameEffect::Flash {
                    rects: vec![hint.rect],
                    clear_after: None,
                });
                self.on_exit.push(ExitHook::RemoveFlash);
            }
            if self.window_focused {
                let kind = if self.settings.wait_for_enter_for_filtered_hints {
                    ModeKind::WaitForEnter
                } else {
                    ModeKind::TypingProtector
                };
                let entry = self.stack.push(kind);
                if kind == ModeKind::TypingProtector {
                    effects.push(FrameEffect::StartTimer {
                        mode: entry.id,
                        generation: entry.timer_generation,
                        after: Self::millis(self.settings.hints.typing_protector_ms),
                    });
                }
                if let Some(indicator) = kind.indicator() {
                    effects.push(FrameEffect::Hud(indicator.to_string()));
                }
            }
        } else if let Some(hint) = &local {
            effects.push(FrameEffect::Flash {
                rects: vec![hint.rect],
                clear_after: Some(Self::millis(self.settings.hints.flash_ms)),
            });
            effects.push(FrameEffect::Send(HintMessage::Exit { is_success: true }));
        }
        effects
    }

    pub fn on_key_down(&mut self, event: &KeyEvent) -> (HandlerResult, Vec<FrameEffect>) {
        let bubble = self.stack.bubble(Trigger::from_key(event));
        let mut effects = Vec::new();

        if let Some(entry) = bubble.extended {
            effects.push(FrameEffect::StartTimer {
                mode: entry.id,
                generation: entry.timer_generation,
                after: Self::millis(self.settings.hints.typing_protector_ms),
            });
        }
        if let Some(exited) = bubble.exited {
            effects.extend(self.on_mode_exited(exited));
        }

        let mut result = bubble.result;
        if let Some(entry) = bubble.handled_by {
            match entry.kind {
                ModeKind::LinkHints => {
                    if let Some(session) = self.session.as_mut() {
                        let response = session.on_key_down(event);
                        result = response.result;
                        effects.extend(response.broadcast.into_iter().map(FrameEffect::Send));
                        if response.exit {
                            self.stack.remove(entry.id);
                            effects.push(FrameEffect::Send(HintMessage::Exit { is_success: false }));
                        }
                    }
                }
                ModeKind::SuppressKeys => self.cached_keys.push(event.clone()),
                ModeKind::TypingProtector | ModeKind::WaitForEnter => {}
            }
        }
        (result, effects)
    }

    pub fn on_key_up(&mut self, event: &KeyEvent) -> (HandlerResult, Vec<FrameEffect>) {
        if !self.stack.contains(ModeKind::LinkHints) {
            return (HandlerResult::Continue, Vec::new());
        }
        match self.session.as_mut() {
            Some(session) => {
                let (result, messages) = session.on_key_up(event);
                (result, messages.into_iter().map(FrameEffect::Send).collect())
            }
            None => (HandlerResult::Continue, Vec::new()),
        }
    }

    /// A mouse click anywhere in the frame.
    pub fn on_click(&mut self) -> Vec<FrameEffect> {
        let bubble = self.stack.bubble(Trigger::Click);
        match bubble.exited {
            Some(exited) => self.on_mode_exited(exited),
            None => Vec::new(),
        }
    }

    pub fn on_timeout(&mut self, mode: ModeId, generation: u64) -> Vec<FrameEffect> {
        match self.stack.timeout(mode, generation) {
            Some(exited) => self.on_mode_exited(exited),
            None => {
                trace!(frame_id = self.frame_id, mode, generation, "stale timer");
                Vec::new()
            }
        }
    }

    fn on_mode_exited(&mut self, exited: ExitedMode) -> Vec<FrameEffect> {
        debug!(frame_id = self.frame_id, mode = %exited.kind, success = ?exited.success, "mode exited");
        match exited.kind {
            ModeKind::SuppressKeys => {
                self.cached_keys.clear();
                Vec::new()
            }
            ModeKind::LinkHints | ModeKind::TypingProtector | ModeKind::WaitForEnter => {
                vec![FrameEffect::Send(HintMessage::Exit {
                    is_success: exited.success.unwrap_or(false),
                })]
            }
        }
    }

    /// Leave hint mode and run the exit hooks, newest first.
    fn exit(&mut self, is_success: bool) -> Vec<FrameEffect> {
        for kind in [
            ModeKind::LinkHints,
            ModeKind::SuppressKeys,
            ModeKind::TypingProtector,
            ModeKind::WaitForEnter,
        ] {
            self.stack.remove_kind(kind);
        }
        self.session = None;
        self.cached_keys.clear();
        self.local_descriptors.clear();

        let mut effects = Vec::new();
        let hooks = mem::take(&mut self.on_exit);
        for hook in hooks.into_iter().rev() {
            match hook {
                ExitHook::ActivateLink { hint, mode } if is_success => {
                    effects.extend(self.perform_activation(&hint, mode));
                }
                ExitHook::ActivateLink { .. } => {}
                ExitHook::RemoveFlash => effects.push(FrameEffect::ClearFlash),
                ExitHook::Reactivate { mode, count } => {
                    if is_success && (count > 1 || mode == LinkHintMode::OpenWithQueue) {
                        effects.extend(self.activate(mode, count.saturating_sub(1)));
                    }
                }
            }
        }
        effects
    }

    fn perform_activation(&mut self, hint: &LocalHint, mode: LinkHintMode) -> Vec<FrameEffect> {
        let action = match resolve_action(&self.document, hint, mode) {
            Ok(action) => action,
            Err(e) => {
                warn!(frame_id = self.frame_id, error = %e, "link action failed");
                return vec![FrameEffect::Hud(e.to_string())];
            }
        };
        if action == LinkAction::ToggleDetails {
            if self.document.element(hint.element).has_attr("open") {
                self.document.remove_attribute(hint.element, "open");
            } else {
                self.document.set_attribute(hint.element, "open", "");
            }
        }

        let element = self.document.element(hint.element);
        let activation = Activation {
            frame_id: self.frame_id,
            element: hint.element,
            tag: element.tag.clone(),
            href: element.href().map(str::to_string),
            text: self.document.text_content(hint.element).trim().to_string(),
            action,
        };
        info!(
            frame_id = self.frame_id,
            element = activation.element,
            tag = %activation.tag,
            action = %activation.action,
            "activating link"
        );
        vec![FrameEffect::Activate(activation)]
    }
}
