//! Kernel lifecycle management.
//!
//! Services that need to run background work (the settings watcher, the
//! hint bus) register a [`LifecycleHook`]. Hooks start in priority order and
//! stop in reverse, each stop bounded by the shutdown timeout.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use tokio::time::timeout;
use tracing::{error, info, warn};

use keyhints_protocols::KernelError;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;

/// Kernel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KernelState {
    Created = 0,
    Starting = 1,
    Running = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl From<u8> for KernelState {
    fn from(v: u8) -> Self {
        match v {
            1 => KernelState::Starting,
            2 => KernelState::Running,
            3 => KernelState::ShuttingDown,
            4 => KernelState::Stopped,
            _ => KernelState::Created,
        }
    }
}

impl fmt::Display for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelState::Created => "created",
            KernelState::Starting => "starting",
            KernelState::Running => "running",
            KernelState::ShuttingDown => "shutting-down",
            KernelState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Broadcast fired once when the kernel begins shutting down.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self { sender }
    }

    pub fn trigger(&self) {
        let _ = self.sender.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// A kernel component with startup and shutdown work.
#[async_trait::async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn on_start(&self) -> Result<(), KernelError>;

    async fn on_stop(&self) -> Result<(), KernelError>;

    /// Higher starts earlier and stops later.
    fn priority(&self) -> i32 {
        priority::DEFAULT
    }
}

pub struct LifecycleManager {
    state: AtomicU8,
    hooks: RwLock<Vec<Arc<dyn LifecycleHook>>>,
    shutdown_signal: ShutdownSignal,
    shutdown_timeout: Duration,
}

impl LifecycleManager {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            state: AtomicU8::new(KernelState::Created as u8),
            hooks: RwLock::new(Vec::new()),
            shutdown_signal: ShutdownSignal::new(),
            shutdown_timeout,
        }
    }

    pub fn state(&self) -> KernelState {
        KernelState::from(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == KernelState::Running
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown_signal
    }

    pub async fn register_hook(&self, hook: Arc<dyn LifecycleHook>) {
        let mut hooks = self.hooks.write().await;
        hooks.push(hook);
        hooks.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// Names of the registered hooks, in start order.
    pub async fn hook_names(&self) -> Vec<String> {
        self.hooks
            .read()
            .await
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    fn transition(&self, from: KernelState, to: KernelState) -> Result<(), KernelError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|current| {
                KernelError::InvalidState(format!(
                    "cannot go to {to} from {}",
                    KernelState::from(current)
                ))
            })
    }

    /// Start every hook. A failing hook stops the ones already started and
    /// leaves the kernel stopped.
    pub async fn start(&self) -> Result<(), KernelError> {
        self.transition(KernelState::Created, KernelState::Starting)?;
        info!("Kernel starting...");

        let hooks = self.hooks.read().await;
        for (i, hook) in hooks.iter().enumerate() {
            if let Err(e) = hook.on_start().await {
                error!(hook = hook.name(), "failed to start: {}", e);
                for started in hooks.iter().take(i).rev() {
                    let _ = started.on_stop().await;
                }
                self.state.store(KernelState::Stopped as u8, Ordering::SeqCst);
                return Err(e);
            }
        }

        self.state.store(KernelState::Running as u8, Ordering::SeqCst);
        info!(hooks = hooks.len(), "Kernel started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), KernelError> {
        self.transition(KernelState::Running, KernelState::ShuttingDown)?;
        info!("Kernel shutting down...");
        self.shutdown_signal.trigger();

        let hooks = self.hooks.read().await;
        let mut failures = 0;
        for hook in hooks.iter().rev() {
            match timeout(self.shutdown_timeout, hook.on_stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(hook = hook.name(), "stop error: {}", e);
                    failures += 1;
                }
                Err(_) => {
                    warn!(hook = hook.name(), "stop timed out");
                    failures += 1;
                }
            }
        }

        self.state.store(KernelState::Stopped as u8, Ordering::SeqCst);
        info!("Kernel stopped");

        if failures == 0 {
            Ok(())
        } else {
            Err(KernelError::HookFailed(format!(
                "{failures} hooks failed during shutdown"
            )))
        }
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// Priority levels for lifecycle hooks.
pub mod priority {
    pub const SETTINGS: i32 = 1000;
    pub const HINTS: i32 = 500;
    pub const COMPLETION: i32 = 300;
    pub const DEFAULT: i32 = 0;
}
