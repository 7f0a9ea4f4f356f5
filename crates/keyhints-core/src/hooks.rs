//! Lifecycle hooks for the kernel's background work.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, warn};

use keyhints_completion::CompletionSearch;
use keyhints_hints::HintBus;
use keyhints_protocols::{KernelError, SettingsChange, SettingsStore};

use crate::lifecycle::{LifecycleHook, priority};
use crate::registry::CompleterRegistry;
use crate::services::Services;

/// Keys re-applied after the watcher falls behind the change feed.
const LIVE_KEYS: [&str; 3] = ["search_engines", "search_url", "exclusion_rules"];

// ============================================================================
// Settings watcher
// ============================================================================

/// Applies settings changes to live services as they happen.
pub(crate) struct SettingsWatcher {
    services: Arc<Services>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SettingsWatcher {
    pub fn new(services: Arc<Services>) -> Self {
        Self {
            services,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl LifecycleHook for SettingsWatcher {
    fn name(&self) -> &str {
        "settings-watcher"
    }

    async fn on_start(&self) -> Result<(), KernelError> {
        let mut changes = self.services.settings.subscribe();
        let services = self.services.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(
            async move {
                loop {
                    let change = tokio::select! {
                        _ = cancel.cancelled() => break,
                        change = changes.recv() => change,
                    };
                    match change {
                        Ok(change) => {
                            debug!(key = %change.key, "settings changed");
                            services.apply_setting(&change);
                        }
                        Err(RecvError::Lagged(missed)) => {
                            warn!(missed, "settings watcher fell behind, re-reading");
                            for key in LIVE_KEYS {
                                services.apply_setting(&SettingsChange {
                                    key: key.to_string(),
                                    value: None,
                                });
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            .instrument(tracing::debug_span!("settings_watcher")),
        );
        *self.task.lock() = Some(task);
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), KernelError> {
        self.cancel.cancel();
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        Ok(())
    }

    fn priority(&self) -> i32 {
        priority::SETTINGS
    }
}

// ============================================================================
// Hint runtime
// ============================================================================

/// Owns the hint bus shutdown.
pub(crate) struct HintRuntime {
    bus: HintBus,
}

impl HintRuntime {
    pub fn new(bus: HintBus) -> Self {
        Self { bus }
    }
}

#[async_trait::async_trait]
impl LifecycleHook for HintRuntime {
    fn name(&self) -> &str {
        "hint-bus"
    }

    async fn on_start(&self) -> Result<(), KernelError> {
        if self.bus.is_shut_down() {
            return Err(KernelError::InvalidState("hint bus already shut down".to_string()));
        }
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), KernelError> {
        self.bus.shutdown();
        Ok(())
    }

    fn priority(&self) -> i32 {
        priority::HINTS
    }
}

// ============================================================================
// Completion runtime
// ============================================================================

/// Primes the completer sets on start and cancels in-flight queries on stop.
pub(crate) struct CompletionRuntime {
    completers: Arc<CompleterRegistry>,
    search: Arc<CompletionSearch>,
}

impl CompletionRuntime {
    pub fn new(completers: Arc<CompleterRegistry>, search: Arc<CompletionSearch>) -> Self {
        Self { completers, search }
    }
}

#[async_trait::async_trait]
impl LifecycleHook for CompletionRuntime {
    fn name(&self) -> &str {
        "completion"
    }

    async fn on_start(&self) -> Result<(), KernelError> {
        for name in self.completers.names() {
            if let Some(completer) = self.completers.get(&name) {
                completer.refresh().await;
            }
        }
        debug!(completers = self.completers.len(), "completers primed");
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), KernelError> {
        self.completers.cancel_all();
        self.search.cancel();
        Ok(())
    }

    fn priority(&self) -> i32 {
        priority::COMPLETION
    }
}
