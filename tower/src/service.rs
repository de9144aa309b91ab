//! Wires [`FilterChain`] and [`CallTimeouts`] around a transport subtask as
//! a [`tower_service::Service`], folding the three-phase pipeline
//! (begin-filters → transport → end-filters) into async/await over a filter
//! vector. `polyrpc-net` supplies the transport `S`; `polyrpc-client` supplies
//! the chain.

use std::convert::Infallible;
use std::task::{Context, Poll};

use polyrpc_types::{CallStatus, ModuleData};
use tower::ServiceExt;
use tower_layer::Layer;
use tower_service::Service;
use tracing::warn;

use crate::chain::FilterChain;
use crate::filter::BoxFuture;
use crate::timeouts::CallTimeouts;

/// Which side of the call is running: selects `client_*` vs `server_*`
/// filter hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// One call's request plus the module-data it carries into the pipeline.
pub struct Call<Req> {
    pub module_data: ModuleData,
    pub request: Req,
}

impl<Req> Call<Req> {
    #[must_use]
    pub fn new(request: Req) -> Self {
        Self {
            module_data: ModuleData::new(),
            request,
        }
    }
}

/// One call's outcome: the module-data that survived end-filters, the
/// transport response (absent on any failure), and the wire-visible status.
pub struct CallResponse<Resp> {
    pub module_data: ModuleData,
    pub response: Option<Resp>,
    pub status: CallStatus,
}

/// A [`tower_service::Service`] that runs the begin/end filter hooks around
/// an inner transport service, translating inner failures into
/// [`CallStatus`] rather than a `Service::Error`.
#[derive(Clone)]
pub struct FilterService<S> {
    inner: S,
    chain: FilterChain,
    timeouts: CallTimeouts,
    role: Role,
}

impl<S> FilterService<S> {
    pub fn new(inner: S, chain: FilterChain, timeouts: CallTimeouts, role: Role) -> Self {
        Self {
            inner,
            chain,
            timeouts,
            role,
        }
    }
}

impl<S, Req, Resp> Service<Call<Req>> for FilterService<S>
where
    S: Service<Req, Response = Resp> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug + Send + 'static,
    Req: Send + 'static,
    Resp: Send + 'static,
{
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Infallible>>;
    type Response = CallResponse<Resp>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        // Readiness of the transport is awaited just-in-time inside `call`
        // (via `ServiceExt::ready`), since the begin-filters must run first
        // regardless of transport readiness.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, call: Call<Req>) -> Self::Future {
        let chain = self.chain.clone();
        let timeouts = self.timeouts;
        let role = self.role;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Call { mut module_data, request } = call;

            let begin_outcome = match role {
                Role::Client => chain.run_client_begin(&mut module_data).await,
                Role::Server => chain.run_server_begin(&mut module_data).await,
            };

            let (response, status) = if begin_outcome.proceeds() {
                let transport = async {
                    match inner.ready().await {
                        Ok(ready) => match ready.call(request).await {
                            Ok(resp) => Ok(resp),
                            Err(error) => {
                                warn!(?error, "transport subtask failed");
                                Err(CallStatus::UpstreamFailed)
                            }
                        },
                        Err(error) => {
                            warn!(?error, "transport not ready");
                            Err(CallStatus::RequestSendFailed)
                        }
                    }
                };
                match timeouts.with_overall_deadline(transport).await {
                    Ok(Ok(resp)) => (Some(resp), CallStatus::Ok),
                    Ok(Err(status)) => (None, status),
                    Err(status) => (None, status),
                }
            } else {
                (None, CallStatus::MetaError)
            };

            match role {
                Role::Client => chain.run_client_end(&mut module_data).await,
                Role::Server => chain.run_server_end(&mut module_data).await,
            }

            Ok(CallResponse {
                module_data,
                response,
                status,
            })
        })
    }
}

/// A [`tower_layer::Layer`] that wraps a transport service in a
/// [`FilterService`].
pub struct FilterLayer {
    chain: FilterChain,
    timeouts: CallTimeouts,
    role: Role,
}

impl FilterLayer {
    #[must_use]
    pub fn new(chain: FilterChain, timeouts: CallTimeouts, role: Role) -> Self {
        Self { chain, timeouts, role }
    }
}

impl<S> Layer<S> for FilterLayer {
    type Service = FilterService<S>;

    fn layer(&self, inner: S) -> FilterService<S> {
        FilterService::new(inner, self.chain.clone(), self.timeouts, self.role)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use polyrpc_types::{CallStatus, ModuleData};
    use tower::service_fn;

    use super::{Call, FilterService, Role};
    use crate::chain::FilterChain;
    use crate::filter::{BoxFuture, Filter};
    use crate::timeouts::CallTimeouts;

    async fn echo(request: String) -> Result<String, Infallible> {
        Ok(request)
    }

    #[tokio::test]
    async fn proceeds_through_transport_when_no_filters_reject() {
        let inner = service_fn(echo);
        let mut service = FilterService::new(inner, FilterChain::new(), CallTimeouts::default(), Role::Client);

        let response = tower::Service::call(&mut service, Call::new("hi".to_owned()))
            .await
            .expect("infallible");
        assert_eq!(response.status, CallStatus::Ok);
        assert_eq!(response.response, Some("hi".to_owned()));
    }

    struct AlwaysReject;
    impl Filter for AlwaysReject {
        fn client_begin<'a>(&'a self, data: &'a mut ModuleData) -> BoxFuture<'a, bool> {
            let _ = data;
            Box::pin(async { false })
        }
    }

    #[tokio::test]
    async fn a_rejecting_begin_filter_skips_the_transport() {
        let inner = service_fn(echo);
        let mut chain = FilterChain::new();
        chain.push(Arc::new(AlwaysReject));
        let mut service = FilterService::new(inner, chain, CallTimeouts::default(), Role::Client);

        let response = tower::Service::call(&mut service, Call::new("hi".to_owned()))
            .await
            .expect("infallible");
        assert_eq!(response.status, CallStatus::MetaError);
        assert_eq!(response.response, None);
    }
}
