//! [`MethodStub`]: the type-erased entry the registry stores per method.
//! A stub owns the decode/handle/encode chain for exactly one `(Req, Resp)`
//! pair so that [`ServiceRegistry`](crate::registry::ServiceRegistry)
//! can hold a homogeneous map keyed only by `(service, method)` strings.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use polyrpc_types::{CallStatus, DataType};

use crate::context::CallContext;

pub type StubFuture = Pin<Box<dyn Future<Output = Result<Bytes, CallStatus>> + Send>>;

/// A type-erased, callable method: decode the request payload, run the
/// handler, encode the response payload. Implementations are produced by
/// [`ServiceBuilder::add_method`](crate::service::ServiceBuilder::add_method)
/// and never written by hand.
pub trait MethodStub: Send + Sync {
    fn call(&self, payload: Bytes, ctx: CallContext) -> StubFuture;
}

impl<F> MethodStub for F
where
    F: Fn(Bytes, CallContext) -> StubFuture + Send + Sync,
{
    fn call(&self, payload: Bytes, ctx: CallContext) -> StubFuture {
        self(payload, ctx)
    }
}

/// Builds a [`MethodStub`] out of a typed async handler plus its codec pair.
///
/// `decode`/`encode` are the payload (de)serializers for `Req`/`Resp`, each
/// given the [`DataType`] negotiated for this call — the caller may override
/// it on a per-call basis, and the receiver honors the tag carried in meta —
/// ordinarily a thin wrapper around `polyrpc_codec::serialize::{decode,
/// encode}` (see [`codec_decoder`]/[`codec_encoder`]), but left generic so a
/// method can reject data types it does not support. `handler` is user code.
/// Decode failures surface as [`CallStatus::MetaError`](polyrpc_types::CallStatus::MetaError)
/// without ever invoking the handler.
pub fn stub_from_handler<Req, Resp, Dec, Enc, H, Fut>(
    decode: Dec,
    encode: Enc,
    handler: H,
) -> Arc<dyn MethodStub>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    Dec: Fn(&[u8], DataType) -> Result<Req, CallStatus> + Send + Sync + 'static,
    Enc: Fn(&Resp, DataType) -> Result<Bytes, CallStatus> + Send + Sync + Clone + 'static,
    H: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, CallStatus>> + Send + 'static,
{
    struct Stub<Dec, Enc, H, Req, Resp, Fut> {
        decode: Dec,
        encode: Enc,
        handler: H,
        _marker: std::marker::PhantomData<fn(Req) -> (Resp, Fut)>,
    }

    impl<Req, Resp, Dec, Enc, H, Fut> MethodStub for Stub<Dec, Enc, H, Req, Resp, Fut>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        Dec: Fn(&[u8], DataType) -> Result<Req, CallStatus> + Send + Sync + 'static,
        Enc: Fn(&Resp, DataType) -> Result<Bytes, CallStatus> + Send + Sync + Clone + 'static,
        H: Fn(Req, CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp, CallStatus>> + Send + 'static,
    {
        fn call(&self, payload: Bytes, ctx: CallContext) -> StubFuture {
            let request = (self.decode)(&payload, ctx.request_data_type());
            let encode = self.encode.clone();
            let ctx_for_encode = ctx.clone();
            match request {
                Ok(request) => {
                    let reply = (self.handler)(request, ctx);
                    Box::pin(async move {
                        let resp = reply.await?;
                        encode(&resp, ctx_for_encode.reply_data_type())
                    })
                }
                Err(status) => Box::pin(async move { Err(status) }),
            }
        }
    }

    Arc::new(Stub {
        decode,
        encode,
        handler,
        _marker: std::marker::PhantomData,
    })
}

/// A [`stub_from_handler`] `decode` argument that defers to
/// `polyrpc_codec::serialize::decode`, honoring whatever [`DataType`] the
/// call negotiated rather than assuming a fixed wire format.
///
/// # Errors
///
/// Returns [`CallStatus::MetaError`] if the negotiated codec fails to decode
/// the payload into `T`.
pub fn codec_decoder<T>() -> impl Fn(&[u8], DataType) -> Result<T, CallStatus> + Clone
where
    T: serde::de::DeserializeOwned,
{
    |bytes, tag| polyrpc_codec::serialize::decode(tag, bytes).map_err(|_report| CallStatus::MetaError)
}

/// The `encode` counterpart to [`codec_decoder`].
///
/// # Errors
///
/// Returns [`CallStatus::ResponseDecodeFailed`] if the negotiated codec fails
/// to encode `T`. Despite the name (the reply-encode failure has no distinct
/// status in §3's enumeration from the handler's point of view; the
/// receiving client maps transport-level encode/decode failures separately),
/// this is the best available fit.
pub fn codec_encoder<T>() -> impl Fn(&T, DataType) -> Result<Bytes, CallStatus> + Clone
where
    T: serde::Serialize,
{
    |value, tag| polyrpc_codec::serialize::encode(tag, value).map_err(|_report| CallStatus::ResponseDecodeFailed)
}

#[cfg(test)]
mod tests {
    use polyrpc_types::DataType;

    use super::*;
    use crate::context::CallContext;

    struct Echo;
    impl MethodStub for Echo {
        fn call(&self, payload: Bytes, _ctx: CallContext) -> StubFuture {
            Box::pin(async move { Ok(payload) })
        }
    }

    #[tokio::test]
    async fn a_stub_can_be_invoked_through_the_trait_object() {
        let stub: Arc<dyn MethodStub> = Arc::new(Echo);
        let ctx = CallContext::new(DataType::TextJson, None);
        let reply = stub.call(Bytes::from_static(b"hi"), ctx).await.expect("ok");
        assert_eq!(reply, Bytes::from_static(b"hi"));
    }

    #[tokio::test]
    async fn codec_decoder_and_encoder_honor_the_negotiated_data_type() {
        let stub = stub_from_handler(
            codec_decoder::<String>(),
            codec_encoder::<String>(),
            |name: String, _ctx| async move { Ok(format!("hi {name}")) },
        );

        let ctx = CallContext::new(DataType::TextJson, None);
        let payload = polyrpc_codec::serialize::encode(DataType::TextJson, &"world".to_owned()).expect("encodes");
        let reply = stub.call(payload, ctx).await.expect("handler succeeds");
        let decoded: String = polyrpc_codec::serialize::decode(DataType::TextJson, &reply).expect("decodes");
        assert_eq!(decoded, "hi world");
    }
}
