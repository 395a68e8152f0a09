//! Forwarding of allowed requests to the upstream application.

use std::str::FromStr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::HeaderValue,
        uri::{Authority, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::http::middleware::Limited;
use crate::observability::metrics;

/// Header telling the upstream that the request was over its rate.
pub const X_RATELIMIT_LIMITED: &str = "x-ratelimit-limited";

/// State injected into the forwarding handler.
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Forward the request to the upstream and relay its response.
pub async fn forward(State(state): State<ProxyState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let limited = Limited::of(&request);

    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot build upstream URI");
            metrics::record_request(&method, 400, start);
            return (StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };

    if limited {
        parts
            .headers
            .insert(X_RATELIMIT_LIMITED, HeaderValue::from_static("true"));
    }
    if let Ok(host) = HeaderValue::from_str(state.upstream.as_str()) {
        parts.headers.insert(axum::http::header::HOST, host);
    }

    tracing::debug!(method = %parts.method, uri = %parts.uri, limited, "Forwarding request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(error = %e, upstream = %state.upstream, "Upstream error");
            metrics::record_request(&method, 502, start);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

impl ProxyState {
    pub fn new(client: Client<HttpConnector, Body>, upstream: &str) -> Option<Self> {
        Some(Self {
            client,
            upstream: Authority::from_str(upstream).ok()?,
        })
    }
}
