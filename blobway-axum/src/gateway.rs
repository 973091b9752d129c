//! The read side of blobway over HTTP.
//!
//! Every request walks the same steps: favicon short-circuit, path decode,
//! namespace resolution, an existence check, the cache policy, and finally the payload
//! stream. Each step can only end the request with a well-defined status.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use blobway_core::{BlobwayError, Mode};
use blobway_store::{
    route, BlobAdapter, BlobError, BlobPath, NamespaceResolver, OpenedBlob, Sublevel, Version,
    FAVICON_PATH,
};
use futures::TryStreamExt;

use crate::config::{CachePolicy, GatewayConfig};
use crate::error::{store_error, BlobwayAxumError};

/// Caller-supplied funnel for not-found and server failures.
///
/// The hook receives the unredacted error and decides the whole response.
pub type ErrorHook = Arc<dyn Fn(BlobwayError) -> Response + Send + Sync>;

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Clone)]
pub struct BlobGateway {
    root: Sublevel,
    resolver: NamespaceResolver,
    config: GatewayConfig,
    error_hook: Option<ErrorHook>,
}

impl BlobGateway {
    pub fn new(root: Sublevel, config: GatewayConfig) -> Self {
        Self {
            resolver: NamespaceResolver::from_config(&config.store),
            root,
            config,
            error_hook: None,
        }
    }

    /// Route not-found and server failures through `hook` instead of the
    /// built-in JSON error body.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(BlobwayError) -> Response + Send + Sync + 'static,
    {
        self.error_hook = Some(Arc::new(hook));
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn root(&self) -> &Sublevel {
        &self.root
    }

    /// Write entry point for the root store
    pub fn writer(&self) -> BlobAdapter {
        BlobAdapter::new(self.root.clone(), self.config.store.clone())
    }

    /// Canonical path builder for blobs in the root store
    pub fn url_builder(&self) -> impl Fn(&str) -> String + Clone + Send + Sync + 'static {
        let root = self.root.clone();
        move |id: &str| route::encode(&root, id)
    }

    /// Router answering every path through [`BlobGateway::handle`]
    pub fn router(&self) -> Router {
        Router::new().fallback(serve).with_state(self.clone())
    }

    /// Answer one request. Never panics on malformed input; every failure
    /// ends in a status code.
    pub async fn handle(&self, req: Request) -> Response {
        let scope = RequestScope::new(self.config.mode, self.error_hook.clone());
        // The body is never read, and the parts are what has to live across awaits
        let (parts, _) = req.into_parts();

        if parts.method != Method::GET {
            tracing::debug!(method = %parts.method, "rejecting non-GET request");
            return scope.method_not_allowed(&parts.method);
        }

        let path = parts.uri.path();
        if path == FAVICON_PATH {
            return StatusCode::OK.into_response();
        }

        let Some(BlobPath { id, namespaces }) = route::decode(path) else {
            tracing::debug!(path, "path does not name a blob");
            return scope.not_found(format!("No blob at {path}"));
        };

        let store = match self.resolver.resolve(&self.root, namespaces.as_slice()).await {
            Ok(store) => store,
            Err(err) => return scope.store_failure(err),
        };
        let blobs = BlobAdapter::new(store, self.config.store.clone());

        match self.config.policy {
            CachePolicy::ExistenceOnly => match blobs.exists(&id).await {
                Ok(true) => self.stream(&scope, &blobs, &id, false).await,
                Ok(false) => scope.not_found(format!("No blob at {path}")),
                Err(err) => scope.store_failure(err),
            },
            CachePolicy::Conditional => match blobs.version(&id).await {
                Ok(Some(version)) if if_none_match(&parts.headers, version) => {
                    tracing::debug!(%id, %version, "client copy is current");
                    not_modified(&id, version)
                }
                Ok(Some(_)) => self.stream(&scope, &blobs, &id, true).await,
                Ok(None) => scope.not_found(format!("No blob at {path}")),
                Err(err) => scope.store_failure(err),
            },
        }
    }

    async fn stream(
        &self,
        scope: &RequestScope,
        blobs: &BlobAdapter,
        id: &str,
        with_etag: bool,
    ) -> Response {
        // The existence check said present, but a concurrent delete can still win
        let opened = match blobs.open(id).await {
            Ok(Some(opened)) => opened,
            Ok(None) => return scope.not_found(format!("Blob {id} disappeared")),
            Err(err) => return scope.store_failure(err),
        };

        let OpenedBlob {
            version,
            size_bytes,
            stream,
            ..
        } = opened;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type(id));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size_bytes));
        if with_etag {
            headers.insert(header::ETAG, HeaderValue::from(version.get()));
        }

        tracing::debug!(id, %version, size_bytes, "streaming blob");

        let id = id.to_string();
        let stream = stream.inspect_err(move |err| {
            tracing::error!(id = %id, error = %err, "blob stream failed after headers were sent");
        });

        (StatusCode::OK, headers, Body::from_stream(stream)).into_response()
    }
}

impl std::fmt::Debug for BlobGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobGateway")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("error_hook", &self.error_hook.is_some())
            .finish()
    }
}

async fn serve(State(gateway): State<BlobGateway>, req: Request) -> Response {
    gateway.handle(req).await
}

/// Error reporting for a single request.
///
/// Built fresh for each request, so nothing about one request's failure
/// handling can leak into another.
struct RequestScope {
    mode: Mode,
    hook: Option<ErrorHook>,
}

impl RequestScope {
    fn new(mode: Mode, hook: Option<ErrorHook>) -> Self {
        Self { mode, hook }
    }

    fn not_found(&self, message: String) -> Response {
        self.report(BlobwayError::not_found(message))
    }

    fn store_failure(&self, err: BlobError) -> Response {
        let err = store_error(err);
        if err.kind.is_server_error() {
            tracing::warn!(error = %err, source = ?err.source, "store failure while serving blob");
        } else {
            tracing::debug!(error = %err, "blob address rejected");
        }
        self.report(err)
    }

    fn method_not_allowed(&self, method: &Method) -> Response {
        let err = BlobwayError::method_not_allowed(format!("{method} is not supported"));
        let mut res = BlobwayAxumError::from(err).into_response_with(self.mode);
        res.headers_mut()
            .insert(header::ALLOW, HeaderValue::from_static("GET"));
        res
    }

    fn report(&self, err: BlobwayError) -> Response {
        match &self.hook {
            Some(hook) => hook(err),
            None => BlobwayAxumError::from(err).into_response_with(self.mode),
        }
    }
}

fn not_modified(id: &str, version: Version) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type(id));
    headers.insert(header::ETAG, HeaderValue::from(version.get()));
    (StatusCode::NOT_MODIFIED, headers).into_response()
}

fn content_type(id: &str) -> HeaderValue {
    let mime = mime_guess::from_path(id).first_or_octet_stream();
    HeaderValue::from_str(mime.as_ref()).unwrap_or(HeaderValue::from_static(OCTET_STREAM))
}

/// Whether any `If-None-Match` entity tag names `version`.
///
/// Accepts the bare marker, its quoted form, weak tags and `*`.
fn if_none_match(headers: &HeaderMap, version: Version) -> bool {
    let current = version.to_string();
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .any(|tag| {
            if tag == "*" {
                return true;
            }
            let tag = tag.strip_prefix("W/").unwrap_or(tag);
            let tag = tag
                .strip_prefix('"')
                .and_then(|t| t.strip_suffix('"'))
                .unwrap_or(tag);
            tag == current
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn matches_bare_and_quoted_tags() {
        assert!(if_none_match(&headers("7"), Version(7)));
        assert!(if_none_match(&headers("\"7\""), Version(7)));
        assert!(if_none_match(&headers("W/\"7\""), Version(7)));
    }

    #[test]
    fn matches_any_list_element_or_wildcard() {
        assert!(if_none_match(&headers("\"3\", \"7\""), Version(7)));
        assert!(if_none_match(&headers("*"), Version(7)));
    }

    #[test]
    fn stale_or_missing_tags_do_not_match() {
        assert!(!if_none_match(&headers("6"), Version(7)));
        assert!(!if_none_match(&headers("70"), Version(7)));
        assert!(!if_none_match(&HeaderMap::new(), Version(7)));
    }

    #[test]
    fn content_type_follows_the_id_extension() {
        assert_eq!(content_type("song.mp3"), "audio/mpeg");
        assert_eq!(content_type("notes.txt"), "text/plain");
        assert_eq!(content_type("42"), OCTET_STREAM);
    }
}
