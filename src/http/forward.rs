//! Forwarding to the upstream API.
//!
//! # Responsibilities
//! - Build the upstream request from the inbound one and the mapped target
//! - Drop connection-specific headers, including those named in `Connection`,
//!   and those the proxy sets itself
//! - Pin the Accept header to the upstream API version
//! - Copy status, headers and body of the upstream response back unmodified
//!
//! # Design Decisions
//! - One shared, internally pooled client for all requests
//! - Request bodies are only sent for methods that carry one, and are buffered
//!   (bounded) so the upstream sees a Content-Length
//! - Response bodies are streamed, not buffered
//! - Redirects are passed back to the caller, not followed

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Response},
};
use url::Url;

use crate::http::response::ProxyError;
use crate::routing::MappedTarget;

/// Inbound headers never copied to the upstream request.
const SKIPPED_HEADERS: [HeaderName; 8] = [
    header::ACCEPT,
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
];

/// Hop-by-hop headers without a constant in `http::header`.
const SKIPPED_HEADER_NAMES: [&str; 2] = ["keep-alive", "proxy-connection"];

/// Sends rewritten requests to the upstream API.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    base: Url,
    accept: HeaderValue,
    max_body_bytes: usize,
}

impl Forwarder {
    pub fn new(client: reqwest::Client, base: Url, accept: HeaderValue, max_body_bytes: usize) -> Self {
        Self {
            client,
            base,
            accept,
            max_body_bytes,
        }
    }

    /// Upstream URL for a mapped target: base scheme and authority, mapped path and query.
    pub fn target_url(&self, target: &MappedTarget) -> Url {
        let mut url = self.base.clone();
        url.set_path(&target.path);
        url.set_query(target.query.as_deref());
        url
    }

    /// Forward the request to `target` and return the upstream response.
    pub async fn forward(&self, request: Request<Body>, target: &MappedTarget) -> Result<Response<Body>, ProxyError> {
        let url = self.target_url(target);
        let (parts, body) = request.into_parts();

        let mut upstream = self
            .client
            .request(parts.method.clone(), url.clone())
            .headers(forwardable_headers(&parts.headers, &self.accept));

        if carries_body(&parts.method) {
            let bytes = axum::body::to_bytes(body, self.max_body_bytes)
                .await
                .map_err(ProxyError::RequestBody)?;
            upstream = upstream.body(bytes);
        }

        tracing::debug!(method = %parts.method, url = %url, "Forwarding request upstream");
        let upstream_response = upstream.send().await.map_err(ProxyError::Forward)?;

        let status = upstream_response.status();
        let headers = upstream_response.headers().clone();
        let mut response = Response::new(Body::from_stream(upstream_response.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Whether requests with this method forward their body.
pub fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Copy inbound headers for the upstream request, with Accept pinned to `accept`.
pub fn forwardable_headers(inbound: &HeaderMap, accept: &HeaderValue) -> HeaderMap {
    let connection_scoped = connection_tokens(inbound);

    let mut headers = HeaderMap::with_capacity(inbound.len() + 1);
    for (name, value) in inbound {
        if SKIPPED_HEADERS.contains(name)
            || SKIPPED_HEADER_NAMES.contains(&name.as_str())
            || connection_scoped.iter().any(|token| token == name.as_str())
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers.insert(header::ACCEPT, accept.clone());
    headers
}

/// Header names listed in the inbound `Connection` headers, lowercased.
fn connection_tokens(inbound: &HeaderMap) -> Vec<String> {
    inbound
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|token| token.trim().to_ascii_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}
