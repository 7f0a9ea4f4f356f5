//! Fans a request out to several completers and ranks the merged results.
//!
//! At most one query runs at a time. A request that arrives meanwhile
//! replaces any request already waiting; the replaced request's receiver
//! closes without a result.

use std::sync::Arc;

use futures::future::join_all;
use keyhints_protocols::{
    Completer, CompletionRequest, CompletionResponse, Suggestion, SuggestionFilter,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::prepare::prepare_suggestions;
use crate::ranking::REGEXP_CACHE;

#[cfg(test)]
#[path = "multi_completer_tests.rs"]
mod tests;

pub type ResponseSender = mpsc::UnboundedSender<CompletionResponse>;
pub type ResponseReceiver = mpsc::UnboundedReceiver<CompletionResponse>;

struct PendingQuery {
    request: CompletionRequest,
    sender: ResponseSender,
}

#[derive(Default)]
struct QueryState {
    in_progress: bool,
    pending: Option<PendingQuery>,
}

pub struct MultiCompleter {
    completers: Vec<Arc<dyn Completer>>,
    max_results: usize,
    state: Mutex<QueryState>,
}

impl MultiCompleter {
    pub fn new(completers: Vec<Arc<dyn Completer>>, max_results: usize) -> Self {
        Self {
            completers,
            max_results,
            state: Mutex::new(QueryState::default()),
        }
    }

    pub fn completers(&self) -> &[Arc<dyn Completer>] {
        &self.completers
    }

    /// Start (or queue) a query. Each delivery of ranked results arrives on
    /// the returned receiver, which closes once the query is finished.
    pub fn filter(self: &Arc<Self>, request: CompletionRequest) -> ResponseReceiver {
        let (sender, receiver) = mpsc::unbounded_channel();
        {
            let mut state = self.state.lock();
            if state.in_progress {
                if state.pending.is_some() {
                    trace!("dropping superseded completion request");
                }
                state.pending = Some(PendingQuery { request, sender });
                drop(state);
                for completer in &self.completers {
                    completer.cancel();
                }
                return receiver;
            }
            state.in_progress = true;
        }

        let this = self.clone();
        tokio::spawn(async move { this.drive(request, sender).await });
        receiver
    }

    /// Reload every completer's backing data.
    pub async fn refresh(&self) {
        join_all(self.completers.iter().map(|c| c.refresh())).await;
    }

    pub fn cancel(&self) {
        for completer in &self.completers {
            completer.cancel();
        }
    }

    fn has_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    async fn drive(self: Arc<Self>, mut request: CompletionRequest, mut sender: ResponseSender) {
        loop {
            self.run_query(request, &sender).await;
            let next = {
                let mut state = self.state.lock();
                match state.pending.take() {
                    Some(next) => next,
                    None => {
                        state.in_progress = false;
                        return;
                    }
                }
            };
            request = next.request;
            sender = next.sender;
        }
    }

    fn apply_filters(filters: &[SuggestionFilter], mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
        for filter in filters {
            suggestions = filter(suggestions);
        }
        suggestions
    }

    fn deliver(
        &self,
        request: &CompletionRequest,
        suggestions: Vec<Suggestion>,
        may_cache_results: bool,
        sender: &ResponseSender,
    ) {
        let mut results = prepare_suggestions(suggestions, self.max_results);
        for completer in &self.completers {
            completer.post_process_suggestions(request, &mut results);
        }
        debug!(
            query = %request.query,
            results = results.len(),
            may_cache_results,
            "delivering completions"
        );
        // A closed receiver means nobody is listening any more.
        let _ = sender.send(CompletionResponse {
            results,
            may_cache_results,
        });
    }

    async fn run_query(&self, mut request: CompletionRequest, sender: &ResponseSender) {
        REGEXP_CACHE.clear();
        for completer in &self.completers {
            completer.preprocess_request(&mut request);
        }

        let outputs = join_all(self.completers.iter().map(|c| c.filter(&request))).await;

        let mut suggestions = Vec::new();
        let mut filters = Vec::new();
        let mut continuations = Vec::new();
        for output in outputs {
            suggestions.extend(output.suggestions);
            filters.extend(output.filter);
            continuations.extend(output.continuation);
        }

        let suggestions = Self::apply_filters(&filters, suggestions);
        let run_continuations = !continuations.is_empty() && !self.has_pending();

        // Skip an empty first delivery when more results are coming, so the
        // list does not collapse and re-expand.
        if !suggestions.is_empty() || !run_continuations {
            self.deliver(
                &request,
                suggestions.clone(),
                continuations.is_empty(),
                sender,
            );
        }
        if !run_continuations {
            return;
        }

        let extra: Vec<Suggestion> = join_all(continuations).await.into_iter().flatten().collect();
        if self.has_pending() {
            debug!(query = %request.query, "discarding continuation results for superseded query");
            return;
        }
        let mut merged = suggestions;
        merged.extend(extra);
        let merged = Self::apply_filters(&filters, merged);
        self.deliver(&request, merged, true, sender);
    }
}
