//! The [`Filter`] trait: the plugin interface for observing or mutating a
//! call as it passes through the begin/end hooks of each phase.
//!
//! A filter has up to four hooks, one per phase of a call. Hooks are async
//! (a filter may itself perform I/O, e.g. exporting a trace span) and return
//! a `bool`: `false` aborts the call. `dyn Filter` needs to be usable behind
//! an `Arc` in an ordered chain, so hooks return a manually boxed future
//! rather than using an `async fn` in the trait (which is not object-safe).

use std::future::Future;
use std::pin::Pin;

use polyrpc_types::ModuleData;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A call-lifecycle observer/mutator.
///
/// All hooks default to a no-op that returns `true` (proceed), so a filter
/// only needs to implement the phases it cares about.
pub trait Filter: Send + Sync {
    /// A short name used in tracing/log output; defaults to the type name.
    fn name(&self) -> &str {
        "filter"
    }

    fn client_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        let _ = data;
        Box::pin(async { true })
    }

    fn client_end<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        let _ = data;
        Box::pin(async { true })
    }

    fn server_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        let _ = data;
        Box::pin(async { true })
    }

    fn server_end<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        let _ = data;
        Box::pin(async { true })
    }

    /// If this filter wants a side-effect task appended to the call's series
    /// (e.g. exporting a trace after the fact), it returns one here.
    /// `None` is the common case: no subtask appended.
    fn create_filter_task(&self, data: &ModuleData) -> Option<BoxFuture<'static, ()>> {
        let _ = data;
        None
    }
}
