use axum::extract::Request;
use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::BlobGateway;

/// A gateway wired into a served router: request ids and tracing spans
/// around every request.
#[derive(Clone)]
pub struct GatewayApp {
    pub gateway: BlobGateway,
    pub router: Router<()>,
}

impl GatewayApp {
    pub fn new(gateway: BlobGateway) -> Self {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                tracing::debug_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id());

        let router = gateway.router().layer(middleware);
        Self { gateway, router }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "blobway gateway listening");
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn gateway_app(gateway: BlobGateway) -> GatewayApp {
    GatewayApp::new(gateway)
}
