//! [`CallContext`]: per-call state visible to handler code.
//!
//! One `CallContext` is created per client call or per server request and is
//! dropped once the callback/handler returns (or, for an async handler, once
//! the last subtask appended to its [`Series`] completes). It is the single
//! place a handler reaches to read the inbound meta, set reply-side
//! compression/data-type, and append a subtask for a deferred reply: the
//! handler may append a subtask to `ctx`'s series, and the reply is
//! scheduled after that subtask completes.
//!
//! Handlers are written against `Fn(Req, CallContext) -> Fut` and receive
//! `ctx` by value rather than `&mut CallContext` (a stub never hands `ctx`
//! back once the handler returns), so every field a handler can mutate —
//! module-data, status, reply data/compress type, the attachment — lives
//! behind a shared cell. A clone retained by the dispatch loop before
//! calling the handler therefore observes whatever the handler set, the same
//! way [`Series`] already shares its subtask queue across clones: module-data
//! set during the handler is what ends up serialized into reply meta.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use polyrpc_tower::{Series, Subtask};
use polyrpc_types::{CallStatus, CompressType, DataType, ModuleData};

struct Shared {
    module_data: ModuleData,
    status: CallStatus,
    reply_data_type: DataType,
    reply_compress_type: CompressType,
    attachment: Option<Bytes>,
}

/// Per-call state handed to handlers and filters.
///
/// Cheaply cloneable: every clone shares the same [`Series`] and the same
/// mutable-state cell, so a handler that receives `ctx` by value and a
/// dispatch loop that kept a clone before invoking the handler observe each
/// other's writes.
#[derive(Clone)]
pub struct CallContext {
    series: Series,
    shared: Arc<Mutex<Shared>>,
    remote_addr: Option<SocketAddr>,
    request_data_type: DataType,
}

impl CallContext {
    #[must_use]
    pub fn new(request_data_type: DataType, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            series: Series::new(),
            shared: Arc::new(Mutex::new(Shared {
                module_data: ModuleData::new(),
                status: CallStatus::Ok,
                reply_data_type: request_data_type,
                reply_compress_type: CompressType::None,
                attachment: None,
            })),
            remote_addr,
            request_data_type,
        }
    }

    fn shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("call context state poisoned")
    }

    #[must_use]
    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Appends a subtask to this call's series, for an async handler that
    /// defers its reply behind a nested call.
    pub fn append_subtask(&self, subtask: Subtask) {
        self.series.push(subtask);
    }

    #[must_use]
    pub fn module_data(&self) -> ModuleData {
        self.shared().module_data.clone()
    }

    /// Runs `f` against the shared module-data map, returning whatever `f`
    /// returns. Used both by handler code (to insert a baggage entry) and by
    /// the dispatch loop (to run begin/end filters directly against the same
    /// storage a handler will observe).
    pub fn with_module_data_mut<R>(&self, f: impl FnOnce(&mut ModuleData) -> R) -> R {
        f(&mut self.shared().module_data)
    }

    /// Replaces the module-data map wholesale; used when the dispatch loop
    /// populates it from inbound meta before `server_begin` runs.
    pub fn set_module_data(&self, module_data: ModuleData) {
        self.shared().module_data = module_data;
    }

    #[must_use]
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    #[must_use]
    pub fn status(&self) -> CallStatus {
        self.shared().status
    }

    pub fn set_status(&self, status: CallStatus) {
        self.shared().status = status;
    }

    #[must_use]
    pub fn request_data_type(&self) -> DataType {
        self.request_data_type
    }

    #[must_use]
    pub fn reply_data_type(&self) -> DataType {
        self.shared().reply_data_type
    }

    /// Overrides the serializer used for the reply payload; defaults to the
    /// request's data type, overridable by the handler on a per-call basis.
    pub fn set_reply_data_type(&self, data_type: DataType) {
        self.shared().reply_data_type = data_type;
    }

    #[must_use]
    pub fn reply_compress_type(&self) -> CompressType {
        self.shared().reply_compress_type
    }

    pub fn set_reply_compress_type(&self, compress_type: CompressType) {
        self.shared().reply_compress_type = compress_type;
    }

    #[must_use]
    pub fn attachment(&self) -> Option<Bytes> {
        self.shared().attachment.clone()
    }

    pub fn set_attachment(&self, attachment: Bytes) {
        self.shared().attachment = Some(attachment);
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_types::{CallStatus, DataType};

    use super::CallContext;

    #[test]
    fn reply_data_type_defaults_to_request_data_type() {
        let ctx = CallContext::new(DataType::TextJson, None);
        assert_eq!(ctx.reply_data_type(), DataType::TextJson);
    }

    #[test]
    fn status_defaults_to_ok_and_is_settable() {
        let ctx = CallContext::new(DataType::SchemaABinary, None);
        assert_eq!(ctx.status(), CallStatus::Ok);
        ctx.set_status(CallStatus::UndefinedError);
        assert_eq!(ctx.status(), CallStatus::UndefinedError);
    }

    #[test]
    fn a_clone_observes_mutations_made_through_another_clone() {
        let ctx = CallContext::new(DataType::TextJson, None);
        let clone = ctx.clone();

        clone.set_status(CallStatus::MethodNotFound);
        clone.with_module_data_mut(|data| {
            data.insert("k", "v").expect("fits");
        });

        assert_eq!(ctx.status(), CallStatus::MethodNotFound);
        assert_eq!(ctx.module_data().get("k"), Some("v"));
    }
}
