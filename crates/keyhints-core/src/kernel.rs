//! Service kernel.
//!
//! The kernel owns every long-lived service: the settings store, tab
//! recency, the history cache, the completer sets and the hint bus. Browser
//! glue feeds it [`BrowserEvent`]s and asks it for completions and frames.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info};

use keyhints_completion::{
    BookmarkCompleter, CompletionSearch, DomainCompleter, HistoryCache, HistoryCompleter,
    MultiCompleter, ResponseReceiver, SearchEngineCompleter, TabCompleter, TabRecency,
};
use keyhints_config::{ExclusionRules, MemorySettingsStore, Settings, UrlStatus};
use keyhints_hints::{Document, FrameCoordinator, FrameHandle, HintBus, LinkActivator};
use keyhints_protocols::{
    Completer, CompletionRequest, FrameId, KernelError, SettingsStore, TabId,
};

use crate::events::BrowserEvent;
use crate::hooks::{CompletionRuntime, HintRuntime, SettingsWatcher};
use crate::lifecycle::{KernelState, LifecycleHook, LifecycleManager, ShutdownSignal};
use crate::registry::CompleterRegistry;
use crate::services::{BrowserSources, Services};

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;

/// Names of the standard completer sets.
pub mod completer_names {
    pub const OMNI: &str = "omni";
    pub const BOOKMARKS: &str = "bookmarks";
    pub const TABS: &str = "tabs";
}

pub struct Kernel {
    services: Arc<Services>,
    search: Arc<CompletionSearch>,
    completers: Arc<CompleterRegistry>,
    hint_bus: HintBus,
    lifecycle: LifecycleManager,
}

impl Kernel {
    /// Build the kernel and its standard completer sets. Must be called
    /// within a tokio runtime.
    pub fn new(
        settings: Settings,
        sources: BrowserSources,
        activator: Arc<dyn LinkActivator>,
    ) -> Result<Self, KernelError> {
        let store = MemorySettingsStore::new(&settings)
            .map_err(|e| KernelError::Settings(e.to_string()))?;

        let completion = &settings.completion;
        let search = Arc::new(CompletionSearch::new(completion.clone()));
        let history_cache = Arc::new(HistoryCache::new(sources.history.clone(), completion.history_size));
        let tab_recency = Arc::new(TabRecency::new());
        let domains = Arc::new(DomainCompleter::new(history_cache.clone()));
        let search_engines = Arc::new(SearchEngineCompleter::new(search.clone(), settings.search_url.clone()));
        search_engines.set_search_engines(&settings.search_engines);

        let services = Arc::new(Services {
            settings: Arc::new(store),
            tab_recency: tab_recency.clone(),
            history_cache: history_cache.clone(),
            domains: domains.clone(),
            search_engines: search_engines.clone(),
            exclusions: RwLock::new(ExclusionRules::new(settings.exclusion_rules.clone())),
        });

        let bookmarks: Arc<dyn Completer> = Arc::new(BookmarkCompleter::new(sources.bookmarks.clone()));
        let tabs: Arc<dyn Completer> = Arc::new(TabCompleter::new(sources.tabs.clone(), tab_recency));
        let history: Arc<dyn Completer> = Arc::new(HistoryCompleter::new(history_cache));
        let max_results = completion.max_results;

        let completers = Arc::new(CompleterRegistry::new());
        completers.register(
            completer_names::OMNI,
            Arc::new(MultiCompleter::new(
                vec![
                    bookmarks.clone(),
                    history,
                    domains,
                    tabs.clone(),
                    search_engines,
                ],
                max_results,
            )),
        )?;
        completers.register(
            completer_names::BOOKMARKS,
            Arc::new(MultiCompleter::new(vec![bookmarks], max_results)),
        )?;
        completers.register(
            completer_names::TABS,
            Arc::new(MultiCompleter::new(vec![tabs], max_results)),
        )?;

        let hint_bus = HintBus::new(
            activator,
            Duration::from_millis(settings.hints.descriptor_timeout_ms),
        );

        Ok(Self {
            services,
            search,
            completers,
            hint_bus,
            lifecycle: LifecycleManager::default(),
        })
    }

    /// Start background services.
    pub async fn start(&self) -> Result<(), KernelError> {
        if self.state() != KernelState::Created {
            return Err(KernelError::InvalidState(format!(
                "cannot start from {}",
                self.state()
            )));
        }
        let hooks: [Arc<dyn LifecycleHook>; 3] = [
            Arc::new(SettingsWatcher::new(self.services.clone())),
            Arc::new(HintRuntime::new(self.hint_bus.clone())),
            Arc::new(CompletionRuntime::new(self.completers.clone(), self.search.clone())),
        ];
        for hook in hooks {
            self.lifecycle.register_hook(hook).await;
        }
        self.lifecycle.start().await
    }

    pub async fn stop(&self) -> Result<(), KernelError> {
        info!("Stopping kernel...");
        self.lifecycle.stop().await
    }

    pub fn state(&self) -> KernelState {
        self.lifecycle.state()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        self.lifecycle.shutdown_signal()
    }

    pub async fn register_lifecycle_hook(&self, hook: Arc<dyn LifecycleHook>) {
        self.lifecycle.register_hook(hook).await;
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn settings(&self) -> &Arc<MemorySettingsStore> {
        &self.services.settings
    }

    /// Typed view of the current settings.
    pub fn current_settings(&self) -> Result<Settings, KernelError> {
        self.services
            .settings
            .snapshot()
            .map_err(|e| KernelError::Settings(e.to_string()))
    }

    /// Change a setting. Live services pick it up once the kernel runs.
    pub fn set_setting(&self, key: &str, value: Value) {
        self.services.settings.set(key, value);
    }

    pub fn url_status(&self, url: &str) -> UrlStatus {
        self.services.url_status(url)
    }

    // ========================================================================
    // Completion
    // ========================================================================

    pub fn completers(&self) -> &Arc<CompleterRegistry> {
        &self.completers
    }

    pub fn search(&self) -> &Arc<CompletionSearch> {
        &self.search
    }

    pub fn tab_recency(&self) -> &Arc<TabRecency> {
        &self.services.tab_recency
    }

    pub fn history_cache(&self) -> &Arc<HistoryCache> {
        &self.services.history_cache
    }

    pub fn search_engine_completer(&self) -> &Arc<SearchEngineCompleter> {
        &self.services.search_engines
    }

    /// Run a query against the completer set named by `request.name`.
    pub fn complete(&self, request: CompletionRequest) -> Result<ResponseReceiver, KernelError> {
        let completer = self
            .completers
            .get(&request.name)
            .ok_or_else(|| KernelError::NotFound(request.name.clone()))?;
        debug!(name = %request.name, query = %request.query, "completion request");
        Ok(completer.filter(request))
    }

    pub async fn refresh(&self, name: &str) -> Result<(), KernelError> {
        let completer = self
            .completers
            .get(name)
            .ok_or_else(|| KernelError::NotFound(name.to_string()))?;
        completer.refresh().await;
        Ok(())
    }

    pub fn cancel(&self, name: &str) -> Result<(), KernelError> {
        let completer = self
            .completers
            .get(name)
            .ok_or_else(|| KernelError::NotFound(name.to_string()))?;
        completer.cancel();
        Ok(())
    }

    // ========================================================================
    // Events and frames
    // ========================================================================

    pub fn dispatch(&self, event: BrowserEvent) {
        debug!(event = event.name(), "browser event");
        self.services.apply_event(&event);
        if let BrowserEvent::TabRemoved { tab_id } = event {
            self.hint_bus.remove_tab(tab_id);
        }
    }

    pub fn hint_bus(&self) -> &HintBus {
        &self.hint_bus
    }

    /// Attach a frame's document to the hint bus with the current settings.
    pub fn attach_frame(
        &self,
        tab_id: TabId,
        frame_id: FrameId,
        document: Document,
        focused: bool,
    ) -> Result<FrameHandle, KernelError> {
        if self.hint_bus.is_shut_down() {
            return Err(KernelError::InvalidState("hint bus is shut down".to_string()));
        }
        let coordinator =
            FrameCoordinator::new(frame_id, document, self.current_settings()?).with_focus(focused);
        Ok(self.hint_bus.add_frame(tab_id, coordinator))
    }
}
