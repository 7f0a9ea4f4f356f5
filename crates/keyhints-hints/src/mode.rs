//! Key-handling modes and the stack they are stacked on.
//!
//! Each mode kind has a fixed transition table: for every trigger it either
//! exits (optionally reporting success to its owner), restarts its timer,
//! handles the event itself, or lets the event bubble to the mode below.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::keys::KeyEvent;

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;

pub type ModeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeKind {
    /// Hints are showing and keys go to the marker matcher.
    LinkHints,
    /// Between the activation key and markers appearing: swallow and cache
    /// keydowns so fast typists lose nothing.
    SuppressKeys,
    /// After a filter-mode match: swallow keys briefly in case the user is
    /// still typing link text.
    TypingProtector,
    /// After a filter-mode match: wait for Enter to confirm.
    WaitForEnter,
}

impl ModeKind {
    /// The transition table.
    pub fn transition(self, trigger: Trigger) -> Transition {
        use Transition::*;
        use Trigger::*;
        match (self, trigger) {
            (ModeKind::LinkHints, Escape | Click) => Exit(Some(false)),
            (ModeKind::LinkHints, Enter | AnyKey) => Handle,
            (ModeKind::LinkHints, Timeout) => Ignore,

            (ModeKind::SuppressKeys, Escape | Timeout) => Exit(None),
            (ModeKind::SuppressKeys, Enter | AnyKey) => Handle,
            (ModeKind::SuppressKeys, Click) => Ignore,

            (ModeKind::TypingProtector, Timeout) => Exit(Some(true)),
            (ModeKind::TypingProtector, Escape | Enter | AnyKey) => Extend,
            (ModeKind::TypingProtector, Click) => Ignore,

            (ModeKind::WaitForEnter, Enter) => Exit(Some(true)),
            (ModeKind::WaitForEnter, Escape) => Exit(Some(false)),
            (ModeKind::WaitForEnter, AnyKey) => Handle,
            (ModeKind::WaitForEnter, Timeout | Click) => Ignore,
        }
    }

    /// Status text shown while the mode is on top.
    pub fn indicator(self) -> Option<&'static str> {
        match self {
            ModeKind::WaitForEnter => Some("Hit <Enter> to proceed..."),
            _ => None,
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeKind::LinkHints => "link-hints",
            ModeKind::SuppressKeys => "suppress-keys",
            ModeKind::TypingProtector => "typing-protector",
            ModeKind::WaitForEnter => "wait-for-enter",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Escape,
    /// The mode's timer fired.
    Timeout,
    Click,
    Enter,
    AnyKey,
}

impl Trigger {
    pub fn from_key(event: &KeyEvent) -> Self {
        if event.is_escape() {
            Trigger::Escape
        } else if event.is_enter() {
            Trigger::Enter
        } else {
            Trigger::AnyKey
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Leave the mode. `Some` carries the success flag for the mode's owner.
    Exit(Option<bool>),
    /// Restart the mode's timer.
    Extend,
    /// The mode's own handler takes the event.
    Handle,
    /// Keep bubbling.
    Ignore,
}

/// What happens to a key event after the stack has seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// Let the next handler see it.
    Continue,
    /// Swallow it.
    Suppress,
    /// Hand it to the page.
    Pass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeEntry {
    pub id: ModeId,
    pub kind: ModeKind,
    /// Bumped on every timer restart; stale timeouts carry an old value.
    pub timer_generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitedMode {
    pub id: ModeId,
    pub kind: ModeKind,
    pub success: Option<bool>,
}

/// Outcome of bubbling one trigger through the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub result: HandlerResult,
    /// Mode whose own handler should process the event.
    pub handled_by: Option<ModeEntry>,
    /// Mode whose timer was restarted.
    pub extended: Option<ModeEntry>,
    pub exited: Option<ExitedMode>,
}

impl Bubble {
    fn pass() -> Self {
        Self {
            result: HandlerResult::Pass,
            handled_by: None,
            extended: None,
            exited: None,
        }
    }

    fn suppress() -> Self {
        Self {
            result: HandlerResult::Suppress,
            ..Self::pass()
        }
    }
}

/// Active modes, newest on top. Every hint mode suppresses all keyboard
/// events, so a trigger stops at the first mode that does not ignore it.
#[derive(Debug, Default)]
pub struct HandlerStack {
    entries: Vec<ModeEntry>,
    next_id: ModeId,
}

impl HandlerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: ModeKind) -> ModeEntry {
        self.next_id += 1;
        let entry = ModeEntry {
            id: self.next_id,
            kind,
            timer_generation: 0,
        };
        self.entries.push(entry);
        entry
    }

    pub fn remove(&mut self, id: ModeId) -> Option<ModeEntry> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(position))
    }

    /// Remove every mode of `kind`.
    pub fn remove_kind(&mut self, kind: ModeKind) -> Vec<ModeEntry> {
        let (removed, kept) = self.entries.iter().partition(|e| e.kind == kind);
        self.entries = kept;
        removed
    }

    pub fn find(&self, kind: ModeKind) -> Option<ModeEntry> {
        self.entries.iter().rev().find(|e| e.kind == kind).copied()
    }

    pub fn contains(&self, kind: ModeKind) -> bool {
        self.find(kind).is_some()
    }

    pub fn top(&self) -> Option<ModeEntry> {
        self.entries.last().copied()
    }

    pub fn kinds(&self) -> Vec<ModeKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn restart_timer(&mut self, id: ModeId) -> Option<ModeEntry> {
        let entry = self.entries.iter_mut().find(|e| e.id == id)?;
        entry.timer_generation += 1;
        Some(*entry)
    }

    /// Offer a trigger to each mode from the top down.
    pub fn bubble(&mut self, trigger: Trigger) -> Bubble {
        for entry in self.entries.clone().into_iter().rev() {
            match entry.kind.transition(trigger) {
                Transition::Ignore => continue,
                Transition::Exit(success) => {
                    self.remove(entry.id);
                    return Bubble {
                        exited: Some(ExitedMode {
                            id: entry.id,
                            kind: entry.kind,
                            success,
                        }),
                        ..Bubble::suppress()
                    };
                }
                Transition::Extend => {
                    return Bubble {
                        extended: self.restart_timer(entry.id),
                        ..Bubble::suppress()
                    };
                }
                Transition::Handle => {
                    return Bubble {
                        handled_by: Some(entry),
                        ..Bubble::suppress()
                    };
                }
            }
        }
        Bubble::pass()
    }

    /// Deliver a timer expiry. Stale generations and removed modes are
    /// ignored.
    pub fn timeout(&mut self, id: ModeId, generation: u64) -> Option<ExitedMode> {
        let entry = self.entries.iter().find(|e| e.id == id).copied()?;
        if entry.timer_generation != generation {
            return None;
        }
        match entry.kind.transition(Trigger::Timeout) {
            Transition::Exit(success) => {
                self.remove(id);
                Some(ExitedMode {
                    id,
                    kind: entry.kind,
                    success,
                })
            }
            _ => None,
        }
    }
}
