//! One frame's view of an active hint session.
//!
//! Every participating frame holds the same ordered marker list and runs the
//! same matcher over the same broadcast keystrokes, so all frames agree on
//! labels and matches without exchanging anything but key state.

use keyhints_protocols::{FrameId, HintDescriptor, HintMessage, KeyState, LinkHintMode};
use tracing::{debug, trace};

use crate::keys::KeyEvent;
use crate::local_hints::LocalHint;
use crate::marker::HintMarker;
use crate::matcher::MarkerMatcher;
use crate::mode::HandlerResult;

#[cfg(test)]
#[path = "link_hints_mode_tests.rs"]
mod tests;

/// Markers are drawn above page content.
const BASE_Z_INDEX: i64 = 2_140_000_000;

/// Response to a keydown while hints are showing.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResponse {
    pub result: HandlerResult,
    /// Messages for every frame in the tab, this one included.
    pub broadcast: Vec<HintMessage>,
    /// Leave hint mode without success.
    pub exit: bool,
}

impl KeyResponse {
    fn suppress() -> Self {
        Self {
            result: HandlerResult::Suppress,
            broadcast: Vec::new(),
            exit: false,
        }
    }
}

/// What a key-state update resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing matches; hint mode ends here.
    NoMatch,
    /// Exactly one marker left.
    Single {
        marker: usize,
        user_might_over_type: bool,
    },
    /// Several markers still match.
    Narrowed,
}

pub struct LinkHintsMode {
    mode: LinkHintMode,
    frame_id: FrameId,
    markers: Vec<HintMarker>,
    matcher: Box<dyn MarkerMatcher>,
    filter_mode: bool,
    tab_count: i32,
    /// Held modifier keys and the mode to restore on release.
    held_modifiers: Vec<(String, LinkHintMode)>,
    next_z_index: i64,
}

impl LinkHintsMode {
    /// `descriptors` is the merged list in frame order; local descriptors
    /// index into `local_hints`.
    pub fn new(
        mode: LinkHintMode,
        frame_id: FrameId,
        descriptors: Vec<HintDescriptor>,
        local_hints: &[LocalHint],
        matcher: Box<dyn MarkerMatcher>,
        filter_mode: bool,
    ) -> Self {
        let markers = descriptors
            .into_iter()
            .enumerate()
            .map(|(i, descriptor)| {
                let local = (descriptor.frame_id == frame_id)
                    .then(|| local_hints.get(descriptor.local_index))
                    .flatten();
                HintMarker::new(descriptor, local, i as u64 + 1)
            })
            .collect();

        let mut this = Self {
            mode,
            frame_id,
            markers,
            matcher,
            filter_mode,
            tab_count: 0,
            held_modifiers: Vec::new(),
            next_z_index: BASE_Z_INDEX,
        };
        for index in 0..this.markers.len() {
            if this.markers[index].is_local {
                this.markers[index].z_index = this.next_z_index();
            }
        }
        this.matcher.fill_in_markers(&mut this.markers);
        debug!(
            frame_id,
            mode = %mode,
            markers = this.markers.len(),
            local = this.markers.iter().filter(|m| m.is_local).count(),
            "hint markers created"
        );
        this
    }

    fn next_z_index(&mut self) -> i64 {
        self.next_z_index += 1;
        self.next_z_index
    }

    pub fn mode(&self) -> LinkHintMode {
        self.mode
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn markers(&self) -> &[HintMarker] {
        &self.markers
    }

    pub fn marker(&self, index: usize) -> Option<&HintMarker> {
        self.markers.get(index)
    }

    pub fn tab_count(&self) -> i32 {
        self.tab_count
    }

    pub fn active_hint(&self) -> Option<usize> {
        self.matcher.active_hint()
    }

    pub fn key_state(&self) -> KeyState {
        KeyState {
            hint_keystroke_queue: self.matcher.hint_keystroke_queue().to_vec(),
            link_text_keystroke_queue: self.matcher.link_text_keystroke_queue().to_vec(),
            tab_count: self.tab_count,
        }
    }

    fn update_visible_markers(&self) -> HintMessage {
        HintMessage::UpdateKeyState(self.key_state())
    }

    pub fn on_key_down(&mut self, event: &KeyEvent) -> KeyResponse {
        let mut response = KeyResponse::suppress();
        let previous_tab_count = self.tab_count;
        self.tab_count = 0;

        let is_modifier = matches!(event.key.as_str(), "Shift" | "Control");
        if is_modifier && !self.filter_mode && self.mode.toggles_with_modifiers() {
            self.tab_count = previous_tab_count;
            let next = if event.key == "Shift" {
                self.mode.toggled_by_shift()
            } else {
                self.mode.toggled_by_control()
            };
            self.held_modifiers.push((event.key.clone(), self.mode));
            self.mode = next;
            response.broadcast.push(HintMessage::SetOpenLinkMode {
                mode_index: next.index(),
            });
        } else if event.is_backspace() {
            if self.matcher.pop_key_char() {
                response.broadcast.push(self.update_visible_markers());
            } else {
                response.exit = true;
            }
        } else if event.is_enter() {
            if self.matcher.active_hint().is_some() {
                response.broadcast.push(HintMessage::ActivateActiveHintMarker);
            }
        } else if event.is_tab() {
            self.tab_count = if event.shift {
                previous_tab_count - 1
            } else {
                previous_tab_count + 1
            };
            response.broadcast.push(self.update_visible_markers());
        } else if event.key == " " && self.matcher.should_rotate_hints(event) {
            self.tab_count = previous_tab_count;
            response.broadcast.push(HintMessage::RotateHints);
        } else if !event.repeat {
            match event.key_char() {
                Some(ch) => {
                    let ch = if self.filter_mode {
                        ch
                    } else {
                        ch.to_lowercase().next().unwrap_or(ch)
                    };
                    self.matcher.push_key_char(ch);
                    response.broadcast.push(self.update_visible_markers());
                }
                None => response.result = HandlerResult::Pass,
            }
        }
        response
    }

    /// Releasing a toggling modifier restores the mode from before it was
    /// pressed.
    pub fn on_key_up(&mut self, event: &KeyEvent) -> (HandlerResult, Vec<HintMessage>) {
        let Some(position) = self.held_modifiers.iter().position(|(key, _)| *key == event.key) else {
            return (HandlerResult::Continue, Vec::new());
        };
        let (_, previous) = self.held_modifiers.remove(position);
        self.mode = previous;
        (
            HandlerResult::Continue,
            vec![HintMessage::SetOpenLinkMode {
                mode_index: previous.index(),
            }],
        )
    }

    /// Apply key state broadcast by the typing frame.
    pub fn update_key_state(&mut self, state: KeyState) -> Resolution {
        self.matcher
            .set_keystroke_queues(state.hint_keystroke_queue, state.link_text_keystroke_queue);
        let outcome = self.matcher.get_matching_hints(&mut self.markers, state.tab_count);
        trace!(
            frame_id = self.frame_id,
            matched = outcome.links_matched.len(),
            "key state updated"
        );
        match outcome.links_matched.as_slice() {
            [] => Resolution::NoMatch,
            [marker] => {
                self.hide_markers();
                Resolution::Single {
                    marker: *marker,
                    user_might_over_type: outcome.user_might_over_type,
                }
            }
            matched => {
                for marker in &mut self.markers {
                    marker.visible = false;
                }
                for index in matched {
                    self.markers[*index].visible = true;
                }
                Resolution::Narrowed
            }
        }
    }

    pub fn hide_markers(&mut self) {
        for marker in &mut self.markers {
            marker.visible = false;
        }
    }

    pub fn set_open_link_mode(&mut self, mode: LinkHintMode) {
        self.mode = mode;
    }

    /// Group visible local markers into stacks of overlapping labels and
    /// rotate z-indices within each stack, bringing hidden labels forward.
    pub fn rotate_hints(&mut self) {
        let local: Vec<usize> = (0..self.markers.len())
            .filter(|i| self.markers[*i].is_local && self.markers[*i].visible)
            .collect();

        let mut stacks: Vec<Vec<usize>> = Vec::new();
        for index in local {
            let Some(label) = self.markers[index].label_box() else {
                continue;
            };
            let overlaps = |stack: &Vec<usize>| {
                stack.iter().any(|other| {
                    self.markers[*other]
                        .label_box()
                        .is_some_and(|other| label.intersects(&other))
                })
            };

            let mut merged: Option<usize> = None;
            let mut kept: Vec<Vec<usize>> = Vec::with_capacity(stacks.len() + 1);
            for stack in stacks {
                if !overlaps(&stack) {
                    kept.push(stack);
                    continue;
                }
                match merged {
                    None => {
                        let mut stack = stack;
                        stack.push(index);
                        merged = Some(kept.len());
                        kept.push(stack);
                    }
                    Some(target) => kept[target].extend(stack),
                }
            }
            if merged.is_none() {
                kept.push(vec![index]);
            }
            stacks = kept;
        }

        for stack in stacks.iter().filter(|s| s.len() > 1) {
            let mut z_indices: Vec<i64> = stack.iter().map(|i| self.markers[*i].z_index).collect();
            z_indices.push(z_indices[0]);
            for (position, index) in stack.iter().enumerate() {
                self.markers[*index].z_index = z_indices[position + 1];
            }
        }
    }
}
