//! Tab-side hint coordination.
//!
//! The tab coordinator is the hub of the hint protocol: it collects hint
//! descriptors from every frame when a frame asks to start hint mode, hands
//! each frame the descriptors of the others, and relays every later message
//! to all participants.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use keyhints_protocols::{FrameId, HintDescriptor, HintMessage, TabId};
use tracing::{debug, trace, warn};

#[cfg(test)]
#[path = "tab_tests.rs"]
mod tests;

/// Work the tab coordinator asks its runtime to do.
#[derive(Debug, Clone, PartialEq)]
pub enum TabEffect {
    Deliver {
        frame_id: FrameId,
        message: HintMessage,
    },
    /// Call [`TabCoordinator::on_timeout`] with `generation` after `after`.
    StartTimer { generation: u64, after: Duration },
}

#[derive(Debug, Default)]
struct CollectionState {
    /// Frames asked for descriptors that have not answered.
    pending: BTreeSet<FrameId>,
    hint_descriptors: BTreeMap<FrameId, Vec<HintDescriptor>>,
    originating_frame_id: FrameId,
    mode_index: usize,
    /// Frames taking part in the current session.
    participants: BTreeSet<FrameId>,
}

pub struct TabCoordinator {
    tab_id: TabId,
    /// Registered frames, in registration order.
    frames: Vec<FrameId>,
    state: Option<CollectionState>,
    generation: u64,
    descriptor_timeout: Duration,
}

impl TabCoordinator {
    pub fn new(tab_id: TabId, descriptor_timeout: Duration) -> Self {
        Self {
            tab_id,
            frames: Vec::new(),
            state: None,
            generation: 0,
            descriptor_timeout,
        }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn frames(&self) -> &[FrameId] {
        &self.frames
    }

    /// True while descriptors are still being collected.
    pub fn is_collecting(&self) -> bool {
        self.state.as_ref().is_some_and(|s| !s.pending.is_empty())
    }

    pub fn register(&mut self, frame_id: FrameId) {
        if !self.frames.contains(&frame_id) {
            self.frames.push(frame_id);
            trace!(tab_id = self.tab_id, frame_id, "frame registered");
        }
    }

    /// Forget a frame. A frame that leaves mid-collection counts as having
    /// posted no descriptors.
    pub fn unregister(&mut self, frame_id: FrameId) -> Vec<TabEffect> {
        self.frames.retain(|f| *f != frame_id);
        let Some(state) = self.state.as_mut() else {
            return Vec::new();
        };
        state.participants.remove(&frame_id);
        if state.pending.remove(&frame_id) {
            debug!(tab_id = self.tab_id, frame_id, "frame left while collecting descriptors");
            if state.pending.is_empty() {
                return self.finish();
            }
        }
        Vec::new()
    }

    pub fn handle_message(&mut self, from: FrameId, message: HintMessage) -> Vec<TabEffect> {
        trace!(tab_id = self.tab_id, from, message = message.name(), "tab received message");
        match message {
            HintMessage::PrepareToActivateMode {
                mode_index,
                is_help_dialog,
            } => self.prepare(from, mode_index, is_help_dialog),
            HintMessage::PostHintDescriptors { hint_descriptors } => {
                self.post_hint_descriptors(from, hint_descriptors)
            }
            message => self.forward(message),
        }
    }

    fn prepare(&mut self, from: FrameId, mode_index: usize, is_help_dialog: bool) -> Vec<TabEffect> {
        self.generation += 1;
        self.state = Some(CollectionState {
            pending: self.frames.iter().copied().collect(),
            hint_descriptors: BTreeMap::new(),
            originating_frame_id: from,
            mode_index,
            participants: BTreeSet::new(),
        });
        debug!(
            tab_id = self.tab_id,
            from,
            mode_index,
            frames = self.frames.len(),
            generation = self.generation,
            "collecting hint descriptors"
        );

        let mut effects: Vec<TabEffect> = self
            .frames
            .iter()
            .map(|frame_id| TabEffect::Deliver {
                frame_id: *frame_id,
                message: HintMessage::GetHintDescriptors {
                    mode_index,
                    is_help_dialog,
                },
            })
            .collect();
        effects.push(TabEffect::StartTimer {
            generation: self.generation,
            after: self.descriptor_timeout,
        });
        effects
    }

    fn post_hint_descriptors(&mut self, from: FrameId, descriptors: Vec<HintDescriptor>) -> Vec<TabEffect> {
        let Some(state) = self.state.as_mut() else {
            trace!(tab_id = self.tab_id, from, "unsolicited descriptors ignored");
            return Vec::new();
        };
        if !state.pending.remove(&from) {
            trace!(tab_id = self.tab_id, from, "descriptors from frame not being waited on");
            return Vec::new();
        }
        state.hint_descriptors.insert(from, descriptors);
        if state.pending.is_empty() {
            return self.finish();
        }
        Vec::new()
    }

    /// The descriptor timer fired. Frames that have not answered by now are
    /// left out of the session.
    pub fn on_timeout(&mut self, generation: u64) -> Vec<TabEffect> {
        if generation != self.generation {
            return Vec::new();
        }
        let Some(state) = self.state.as_ref() else {
            return Vec::new();
        };
        if state.pending.is_empty() {
            return Vec::new();
        }
        warn!(
            tab_id = self.tab_id,
            silent = ?state.pending,
            "frames did not post hint descriptors in time"
        );
        self.finish()
    }

    /// Send every frame that posted the descriptors of all the others.
    fn finish(&mut self) -> Vec<TabEffect> {
        let Some(state) = self.state.as_mut() else {
            return Vec::new();
        };
        state.pending.clear();
        state.participants = state.hint_descriptors.keys().copied().collect();
        debug!(
            tab_id = self.tab_id,
            participants = state.participants.len(),
            hints = state.hint_descriptors.values().map(Vec::len).sum::<usize>(),
            "activating hint mode"
        );

        state
            .participants
            .iter()
            .map(|frame_id| {
                let mut others = state.hint_descriptors.clone();
                others.remove(frame_id);
                TabEffect::Deliver {
                    frame_id: *frame_id,
                    message: HintMessage::ActivateMode {
                        hint_descriptors: others,
                        mode_index: state.mode_index,
                        originating_frame_id: state.originating_frame_id,
                    },
                }
            })
            .collect()
    }

    /// Relay a message to every frame in the session, or to every frame in
    /// the tab outside one.
    fn forward(&mut self, message: HintMessage) -> Vec<TabEffect> {
        let recipients: Vec<FrameId> = match &self.state {
            Some(state) if !state.participants.is_empty() => state.participants.iter().copied().collect(),
            _ => self.frames.clone(),
        };
        if matches!(message, HintMessage::Exit { .. }) {
            self.state = None;
        }
        recipients
            .into_iter()
            .map(|frame_id| TabEffect::Deliver {
                frame_id,
                message: message.clone(),
            })
            .collect()
    }
}
