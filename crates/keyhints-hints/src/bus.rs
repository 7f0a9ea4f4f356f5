//! In-process runtime for the hint protocol.
//!
//! Each frame runs as its own task around a [`FrameCoordinator`]; one task
//! runs the [`TabCoordinator`]s of every tab. Tasks talk only through
//! unbounded channels, so ordering is preserved per sender/receiver pair and
//! nothing else. [`HintBus`] is the [`FrameTransport`] between them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use keyhints_protocols::{FrameId, FrameTransport, HintMessage, LinkHintMode, TabId, TransportError};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, trace, warn};

use crate::activator::LinkActivator;
use crate::frame::{FrameCoordinator, FrameEffect, FrameSnapshot};
use crate::keys::KeyEvent;
use crate::mode::ModeId;
use crate::tab::{TabCoordinator, TabEffect};

enum TabInbound {
    Message {
        tab_id: TabId,
        from: FrameId,
        message: HintMessage,
    },
    Register {
        tab_id: TabId,
        frame_id: FrameId,
    },
    Unregister {
        tab_id: TabId,
        frame_id: FrameId,
    },
    Timeout {
        tab_id: TabId,
        generation: u64,
    },
}

enum FrameInbound {
    Message(HintMessage),
    KeyDown(KeyEvent),
    KeyUp(KeyEvent),
    Click,
    Activate { mode: LinkHintMode, count: usize },
    Focus(bool),
    Timeout { mode: ModeId, generation: u64 },
    Snapshot(oneshot::Sender<FrameSnapshot>),
}

struct FrameSlot {
    sender: mpsc::UnboundedSender<FrameInbound>,
    cancel: CancellationToken,
}

struct BusInner {
    tab_sender: mpsc::UnboundedSender<TabInbound>,
    frames: DashMap<(TabId, FrameId), FrameSlot>,
    activator: Arc<dyn LinkActivator>,
    descriptor_timeout: Duration,
    cancel: CancellationToken,
}

/// Connects frames to their tab coordinator.
#[derive(Clone)]
pub struct HintBus {
    inner: Arc<BusInner>,
}

impl HintBus {
    /// Start the tab task. Must be called within a tokio runtime.
    pub fn new(activator: Arc<dyn LinkActivator>, descriptor_timeout: Duration) -> Self {
        let (tab_sender, tab_receiver) = mpsc::unbounded_channel();
        let bus = Self {
            inner: Arc::new(BusInner {
                tab_sender,
                frames: DashMap::new(),
                activator,
                descriptor_timeout,
                cancel: CancellationToken::new(),
            }),
        };
        let runner = bus.clone();
        tokio::spawn(
            async move { runner.run_tabs(tab_receiver).await }
                .instrument(tracing::debug_span!("hint_tabs")),
        );
        bus
    }

    /// Attach a frame to `tab_id` and start its task.
    pub fn add_frame(&self, tab_id: TabId, coordinator: FrameCoordinator) -> FrameHandle {
        let frame_id = coordinator.frame_id();
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = self.inner.cancel.child_token();
        if let Some(old) = self.inner.frames.insert(
            (tab_id, frame_id),
            FrameSlot {
                sender: sender.clone(),
                cancel: cancel.clone(),
            },
        ) {
            warn!(tab_id, frame_id, "replacing frame with the same id");
            old.cancel.cancel();
        }
        let _ = self.inner.tab_sender.send(TabInbound::Register { tab_id, frame_id });

        let runner = FrameRunner {
            bus: self.clone(),
            tab_id,
            coordinator,
            sender: sender.clone(),
            cancel,
        };
        tokio::spawn(
            runner
                .run(receiver)
                .instrument(tracing::debug_span!("hint_frame", tab_id, frame_id)),
        );
        debug!(tab_id, frame_id, "frame attached");

        FrameHandle {
            bus: self.clone(),
            tab_id,
            frame_id,
            sender,
        }
    }

    /// Detach a frame; the tab treats it as having nothing to offer.
    pub fn remove_frame(&self, tab_id: TabId, frame_id: FrameId) {
        if let Some((_, slot)) = self.inner.frames.remove(&(tab_id, frame_id)) {
            slot.cancel.cancel();
        }
        let _ = self.inner.tab_sender.send(TabInbound::Unregister { tab_id, frame_id });
        debug!(tab_id, frame_id, "frame detached");
    }

    /// Detach every frame of a closed tab.
    pub fn remove_tab(&self, tab_id: TabId) {
        for frame_id in self.frames(tab_id) {
            self.remove_frame(tab_id, frame_id);
        }
    }

    /// Attached frames of a tab, ascending.
    pub fn frames(&self, tab_id: TabId) -> Vec<FrameId> {
        let mut frames: Vec<FrameId> = self
            .inner
            .frames
            .iter()
            .filter(|entry| entry.key().0 == tab_id)
            .map(|entry| entry.key().1)
            .collect();
        frames.sort_unstable();
        frames
    }

    /// Stop every task.
    pub fn shutdown(&self) {
        info!(frames = self.inner.frames.len(), "hint bus shutting down");
        self.inner.cancel.cancel();
        self.inner.frames.clear();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    async fn run_tabs(self, mut receiver: mpsc::UnboundedReceiver<TabInbound>) {
        let mut tabs: BTreeMap<TabId, TabCoordinator> = BTreeMap::new();
        let timeout = self.inner.descriptor_timeout;
        loop {
            let inbound = tokio::select! {
                _ = self.inner.cancel.cancelled() => break,
                inbound = receiver.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => break,
                },
            };

            let (tab_id, effects) = match inbound {
                TabInbound::Register { tab_id, frame_id } => {
                    tabs.entry(tab_id)
                        .or_insert_with(|| TabCoordinator::new(tab_id, timeout))
                        .register(frame_id);
                    continue;
                }
                TabInbound::Unregister { tab_id, frame_id } => {
                    let effects = tabs
                        .get_mut(&tab_id)
                        .map(|tab| tab.unregister(frame_id))
                        .unwrap_or_default();
                    (tab_id, effects)
                }
                TabInbound::Message {
                    tab_id,
                    from,
                    message,
                } => {
                    let tab = tabs
                        .entry(tab_id)
                        .or_insert_with(|| TabCoordinator::new(tab_id, timeout));
                    (tab_id, tab.handle_message(from, message))
                }
                TabInbound::Timeout { tab_id, generation } => {
                    let effects = tabs
                        .get_mut(&tab_id)
                        .map(|tab| tab.on_timeout(generation))
                        .unwrap_or_default();
                    (tab_id, effects)
                }
            };

            for effect in effects {
                match effect {
                    TabEffect::Deliver { frame_id, message } => {
                        if let Err(e) = self.send_to_frame(tab_id, frame_id, message).await {
                            warn!(tab_id, frame_id, error = %e, "could not deliver hint message");
                        }
                    }
                    TabEffect::StartTimer { generation, after } => {
                        let sender = self.inner.tab_sender.clone();
                        let cancel = self.inner.cancel.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = cancel.cancelled() => {}
                                _ = tokio::time::sleep(after) => {
                                    let _ = sender.send(TabInbound::Timeout { tab_id, generation });
                                }
                            }
                        });
                    }
                }
            }
        }
        debug!("hint tab task stopped");
    }
}

#[async_trait]
impl FrameTransport for HintBus {
    async fn send_to_tab(
        &self,
        tab_id: TabId,
        from: FrameId,
        message: HintMessage,
    ) -> Result<(), TransportError> {
        if self.is_shut_down() {
            return Err(TransportError::Closed);
        }
        self.inner
            .tab_sender
            .send(TabInbound::Message {
                tab_id,
                from,
                message,
            })
            .map_err(|_| TransportError::Closed)
    }

    async fn send_to_frame(
        &self,
        tab_id: TabId,
        frame_id: FrameId,
        message: HintMessage,
    ) -> Result<(), TransportError> {
        let slot = self
            .inner
            .frames
            .get(&(tab_id, frame_id))
            .ok_or(TransportError::UnknownFrame(frame_id))?;
        slot.sender
            .send(FrameInbound::Message(message))
            .map_err(|_| TransportError::Closed)
    }
}

struct FrameRunner {
    bus: HintBus,
    tab_id: TabId,
    coordinator: FrameCoordinator,
    sender: mpsc::UnboundedSender<FrameInbound>,
    cancel: CancellationToken,
}

impl FrameRunner {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<FrameInbound>) {
        loop {
            let inbound = tokio::select! {
                _ = self.cancel.cancelled() => break,
                inbound = receiver.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => break,
                },
            };

            let effects = match inbound {
                FrameInbound::Message(message) => self.coordinator.handle_message(message),
                FrameInbound::KeyDown(event) => self.coordinator.on_key_down(&event).1,
                FrameInbound::KeyUp(event) => self.coordinator.on_key_up(&event).1,
                FrameInbound::Click => self.coordinator.on_click(),
                FrameInbound::Activate { mode, count } => self.coordinator.activate(mode, count),
                FrameInbound::Focus(focused) => {
                    self.coordinator.set_focused(focused);
                    Vec::new()
                }
                FrameInbound::Timeout { mode, generation } => self.coordinator.on_timeout(mode, generation),
                FrameInbound::Snapshot(reply) => {
                    let _ = reply.send(self.coordinator.snapshot());
                    Vec::new()
                }
            };

            for effect in effects {
                self.execute(effect).await;
            }
        }
        trace!(tab_id = self.tab_id, frame_id = self.coordinator.frame_id(), "frame task stopped");
    }

    async fn execute(&self, effect: FrameEffect) {
        let frame_id = self.coordinator.frame_id();
        match effect {
            FrameEffect::Send(message) => {
                if let Err(e) = self.bus.send_to_tab(self.tab_id, frame_id, message).await {
                    warn!(tab_id = self.tab_id, frame_id, error = %e, "could not reach tab coordinator");
                }
            }
            FrameEffect::StartTimer {
                mode,
                generation,
                after,
            } => {
                let sender = self.sender.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(after) => {
                            let _ = sender.send(FrameInbound::Timeout { mode, generation });
                        }
                    }
                });
            }
            FrameEffect::Activate(activation) => {
                if let Err(e) = self.bus.inner.activator.perform(&activation).await {
                    warn!(tab_id = self.tab_id, frame_id, error = %e, "link activation failed");
                }
            }
            FrameEffect::Flash { rects, clear_after } => {
                debug!(frame_id, rects = rects.len(), clear_after = ?clear_after, "flash");
            }
            FrameEffect::ClearFlash => trace!(frame_id, "flash cleared"),
            FrameEffect::Hud(text) => info!(tab_id = self.tab_id, frame_id, hud = %text, "hud"),
        }
    }
}

/// Drives one frame from outside: user input and inspection.
#[derive(Clone)]
pub struct FrameHandle {
    bus: HintBus,
    tab_id: TabId,
    frame_id: FrameId,
    sender: mpsc::UnboundedSender<FrameInbound>,
}

impl FrameHandle {
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    fn send(&self, inbound: FrameInbound) -> Result<(), TransportError> {
        self.sender.send(inbound).map_err(|_| TransportError::Closed)
    }

    /// Start hint mode from this frame, as if the user pressed the hint key.
    pub fn activate(&self, mode: LinkHintMode, count: usize) -> Result<(), TransportError> {
        self.send(FrameInbound::Activate { mode, count })
    }

    pub fn key_down(&self, event: KeyEvent) -> Result<(), TransportError> {
        self.send(FrameInbound::KeyDown(event))
    }

    pub fn key_up(&self, event: KeyEvent) -> Result<(), TransportError> {
        self.send(FrameInbound::KeyUp(event))
    }

    /// Press each key of a sequence such as `ab<Enter>`.
    pub fn type_keys(&self, sequence: &str) -> Result<(), TransportError> {
        for event in KeyEvent::parse_sequence(sequence) {
            self.key_down(event)?;
        }
        Ok(())
    }

    pub fn click(&self) -> Result<(), TransportError> {
        self.send(FrameInbound::Click)
    }

    pub fn set_focused(&self, focused: bool) -> Result<(), TransportError> {
        self.send(FrameInbound::Focus(focused))
    }

    pub async fn snapshot(&self) -> Result<FrameSnapshot, TransportError> {
        let (reply, receiver) = oneshot::channel();
        self.send(FrameInbound::Snapshot(reply))?;
        receiver.await.map_err(|_| TransportError::Closed)
    }

    pub fn detach(&self) {
        self.bus.remove_frame(self.tab_id, self.frame_id);
    }
}
