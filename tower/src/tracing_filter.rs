//! A reference filter: a tracing-span filter showing the shape of a filter
//! implementation rather than a complete exporter. It opens a [`tracing`]
//! span per call and records module-data entries as span fields; it never
//! rejects a call.

use polyrpc_types::ModuleData;
use tracing::info_span;

use crate::filter::{BoxFuture, Filter};

/// Emits a `tracing` span around the begin/end of a call, recording
/// module-data keys present at each boundary. Exporting that span anywhere
/// (OTLP, a log sink, ...) is the embedder's job — this filter only shapes
/// the data.
#[derive(Debug, Default)]
pub struct TracingFilter {
    span_name: &'static str,
}

impl TracingFilter {
    #[must_use]
    pub fn new(span_name: &'static str) -> Self {
        Self { span_name }
    }

    fn record(&self, phase: &'static str, data: &ModuleData) {
        let span = info_span!("rpc_call", name = self.span_name, phase, entries = data.len());
        let _entered = span.enter();
        for (key, value) in data.iter() {
            tracing::event!(tracing::Level::DEBUG, key, value, "module-data entry");
        }
    }
}

impl Filter for TracingFilter {
    fn name(&self) -> &str {
        self.span_name
    }

    fn client_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.record("client_begin", data);
            true
        })
    }

    fn client_end<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.record("client_end", data);
            true
        })
    }

    fn server_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.record("server_begin", data);
            true
        })
    }

    fn server_end<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            self.record("server_end", data);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_types::ModuleData;

    use super::TracingFilter;
    use crate::filter::Filter;

    #[tokio::test]
    async fn never_rejects_a_call() {
        let filter = TracingFilter::new("test");
        let mut data = ModuleData::new();
        data.insert("trace-id".to_owned(), "abc".to_owned()).expect("value within limit");
        assert!(filter.client_begin(&mut data).await);
        assert!(filter.server_begin(&mut data).await);
        assert!(filter.server_end(&mut data).await);
        assert!(filter.client_end(&mut data).await);
    }
}
