//! [`FilterChain`]: an ordered list of filters and the begin/end running
//! rules for a call.

use std::sync::Arc;

use polyrpc_types::ModuleData;
use tracing::debug;

use crate::filter::Filter;

/// The outcome of running the chain's begin-filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginOutcome {
    /// Every begin-filter returned `true`; proceed to the transport subtask.
    Proceed,
    /// Some begin-filter returned `false`, naming its position in the chain.
    /// Remaining begin-filters and the transport are both skipped; end-filters
    /// still run.
    Rejected { filter_index: usize },
}

impl BeginOutcome {
    #[must_use]
    pub fn proceeds(self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Filters run in registration order for begin-hooks, and in the *same*
/// (not reversed) order for end-hooks.
#[derive(Default, Clone)]
pub struct FilterChain {
    filters: Vec<Arc<dyn Filter>>,
}

impl FilterChain {
    #[must_use]
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    pub fn push(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub async fn run_client_begin(&self, data: &mut ModuleData) -> BeginOutcome {
        for (index, filter) in self.filters.iter().enumerate() {
            if !filter.client_begin(data).await {
                debug!(filter = filter.name(), index, "begin-filter rejected call");
                return BeginOutcome::Rejected { filter_index: index };
            }
        }
        BeginOutcome::Proceed
    }

    pub async fn run_server_begin(&self, data: &mut ModuleData) -> BeginOutcome {
        for (index, filter) in self.filters.iter().enumerate() {
            if !filter.server_begin(data).await {
                debug!(filter = filter.name(), index, "begin-filter rejected call");
                return BeginOutcome::Rejected { filter_index: index };
            }
        }
        BeginOutcome::Proceed
    }

    pub async fn run_client_end(&self, data: &mut ModuleData) {
        for filter in &self.filters {
            if !filter.client_end(data).await {
                debug!(filter = filter.name(), "end-filter reported failure (ignored, all ends still run)");
            }
        }
    }

    pub async fn run_server_end(&self, data: &mut ModuleData) {
        for filter in &self.filters {
            if !filter.server_end(data).await {
                debug!(filter = filter.name(), "end-filter reported failure (ignored, all ends still run)");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use polyrpc_types::ModuleData;

    use super::{BeginOutcome, FilterChain};
    use crate::filter::{BoxFuture, Filter};

    struct Recorder {
        order: Arc<std::sync::Mutex<Vec<&'static str>>>,
        name: &'static str,
        accept: bool,
    }

    impl Filter for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn client_begin<'a>(&'a self, _data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
            Box::pin(async move {
                self.order.lock().expect("lock").push(self.name);
                self.accept
            })
        }

        fn client_end<'a>(&'a self, _data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
            Box::pin(async move {
                self.order.lock().expect("lock").push(self.name);
                true
            })
        }
    }

    #[tokio::test]
    async fn begin_filters_run_in_order_and_short_circuit() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut chain = FilterChain::new();
        chain.push(Arc::new(Recorder {
            order: order.clone(),
            name: "first",
            accept: true,
        }));
        chain.push(Arc::new(Recorder {
            order: order.clone(),
            name: "second",
            accept: false,
        }));
        chain.push(Arc::new(Recorder {
            order: order.clone(),
            name: "third",
            accept: true,
        }));

        let mut data = ModuleData::new();
        let outcome = chain.run_client_begin(&mut data).await;
        assert_eq!(outcome, BeginOutcome::Rejected { filter_index: 1 });
        assert_eq!(*order.lock().expect("lock"), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn end_filters_all_run_regardless_of_result() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut chain = FilterChain::new();
        chain.push(Arc::new(Recorder {
            order: order.clone(),
            name: "a",
            accept: false,
        }));
        chain.push(Arc::new(Recorder {
            order: order.clone(),
            name: "b",
            accept: true,
        }));

        let mut data = ModuleData::new();
        chain.run_client_end(&mut data).await;
        assert_eq!(*order.lock().expect("lock"), vec!["a", "b"]);
    }
}
