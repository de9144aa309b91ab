//! [`Service`] and [`ServiceBuilder`]: the ergonomic layer application code
//! writes against, modeled on the `Service`/`ServiceBuilder` pair used to
//! describe RPC surfaces against a typed `Context` in hash-graph's own RPC
//! layer.
//!
//! A [`Service`] is a named bundle of methods; [`ServiceBuilder`] lets a
//! crate assemble one with a fluent chain and hand the result to
//! [`ServiceRegistry::register_service`](crate::registry::ServiceRegistry::register_service).

use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use polyrpc_types::{CallStatus, DataType};
use thiserror::Error;

use crate::context::CallContext;
use crate::stub::{stub_from_handler, MethodStub};

/// Errors a handler raises to signal a typed application failure, separate
/// from transport or meta failures. Surfaces to the caller as
/// [`CallStatus::UndefinedError`](polyrpc_types::CallStatus::UndefinedError).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<HandlerError> for CallStatus {
    fn from(_: HandlerError) -> Self {
        CallStatus::UndefinedError
    }
}

/// A bundle of methods registered together under one service name.
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn methods(&self) -> Vec<(String, Arc<dyn MethodStub>)>;
}

/// Fluent builder for a [`Service`], following the `ServiceBuilder::new(name)
/// .add_method(...).build()` shape application code writes against.
pub struct ServiceBuilder {
    name: String,
    methods: Vec<(String, Arc<dyn MethodStub>)>,
}

impl ServiceBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    /// Registers `name` against a handler together with its payload codec,
    /// as produced by [`stub_from_handler`].
    #[must_use]
    pub fn add_method<Req, Resp, Dec, Enc, H, Fut>(
        mut self,
        name: impl Into<String>,
        decode: Dec,
        encode: Enc,
        handler: H,
    ) -> Self
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        Dec: Fn(&[u8], DataType) -> Result<Req, CallStatus> + Send + Sync + 'static,
        Enc: Fn(&Resp, DataType) -> Result<Bytes, CallStatus> + Send + Sync + Clone + 'static,
        H: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, CallStatus>> + Send + 'static,
    {
        self.methods
            .push((name.into(), stub_from_handler(decode, encode, handler)));
        self
    }

    /// Registers a pre-built stub directly, bypassing the codec-pair
    /// convenience of [`Self::add_method`]; useful for methods that need
    /// bespoke decode/encode behavior (e.g. streaming attachments).
    #[must_use]
    pub fn add_raw_method(mut self, name: impl Into<String>, stub: Arc<dyn MethodStub>) -> Self {
        self.methods.push((name.into(), stub));
        self
    }

    #[must_use]
    pub fn build(self) -> BuiltService {
        BuiltService {
            name: self.name,
            methods: self.methods,
        }
    }
}

pub struct BuiltService {
    name: String,
    methods: Vec<(String, Arc<dyn MethodStub>)>,
}

impl Service for BuiltService {
    fn name(&self) -> &str {
        &self.name
    }

    fn methods(&self) -> Vec<(String, Arc<dyn MethodStub>)> {
        self.methods.clone()
    }
}

#[cfg(test)]
mod tests {
    use polyrpc_types::DataType;

    use super::{Service, ServiceBuilder};
    use crate::context::CallContext;
    use crate::registry::ServiceRegistry;

    fn decode_text(bytes: &[u8], _tag: DataType) -> Result<String, polyrpc_types::CallStatus> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| polyrpc_types::CallStatus::MetaError)
    }

    fn encode_text(value: &String, _tag: DataType) -> Result<bytes::Bytes, polyrpc_types::CallStatus> {
        Ok(bytes::Bytes::copy_from_slice(value.as_bytes()))
    }

    #[tokio::test]
    async fn a_built_service_registers_and_dispatches() {
        let service = ServiceBuilder::new("greeter")
            .add_method("hello", decode_text, encode_text, |name: String, _ctx| async move {
                Ok(format!("hello {name}"))
            })
            .build();

        assert_eq!(service.name(), "greeter");

        let registry = ServiceRegistry::new();
        registry.register_service(&service).expect("registers cleanly");

        let stub = registry.lookup("greeter", "hello").expect("present");
        let ctx = CallContext::new(DataType::TextJson, None);
        let reply = stub
            .call(bytes::Bytes::from_static(b"world"), ctx)
            .await
            .expect("handler succeeds");
        assert_eq!(reply, bytes::Bytes::from_static(b"hello world"));
    }
}
