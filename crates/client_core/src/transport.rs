//! Generic HTTP request executor used by the gateways.

use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub content_type: Option<String>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        self.content_type = Some(content_type.into());
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Executes one endpoint. Implementations must report non-2xx responses as
/// [`TransportError::Status`]; they never retry.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send_raw(&self, endpoint: &Endpoint) -> Result<RawResponse, TransportError>;
}

pub async fn send_json<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    endpoint: &Endpoint,
) -> Result<T, TransportError> {
    let response = transport.send_raw(endpoint).await?;
    serde_json::from_slice(&response.body).map_err(TransportError::Decode)
}

pub struct ReqwestTransport {
    http: Client,
    base_url: Url,
    default_headers: BTreeMap<String, String>,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| TransportError::InvalidRequest(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidRequest(format!(
                "{base_url} cannot be used as a base url"
            )));
        }
        let http = Client::builder().timeout(request_timeout).build()?;
        let mut default_headers = BTreeMap::new();
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        Ok(Self {
            http,
            base_url,
            default_headers,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends the endpoint path to the base url path and adds the query.
    pub fn url_for(&self, endpoint: &Endpoint) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        let clean_path = endpoint.path.trim_start_matches('/');
        url.set_path(&format!("{base_path}/{clean_path}"));

        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                endpoint
                    .query
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }
        Ok(url)
    }

    /// Defaults first, endpoint headers replace defaults of the same name.
    pub fn headers_for(&self, endpoint: &Endpoint) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.default_headers.iter().chain(endpoint.headers.iter()) {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| TransportError::InvalidRequest(format!("header {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| TransportError::InvalidRequest(format!("header {name}: {err}")))?;
            headers.insert(name, value);
        }
        if let Some(content_type) = &endpoint.content_type {
            let value = HeaderValue::from_str(content_type).map_err(|err| {
                TransportError::InvalidRequest(format!("content type {content_type}: {err}"))
            })?;
            headers.insert(CONTENT_TYPE, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send_raw(&self, endpoint: &Endpoint) -> Result<RawResponse, TransportError> {
        let url = self.url_for(endpoint)?;
        debug!(method = ?endpoint.method, %url, "sending request");

        let headers = self.headers_for(endpoint)?;
        let mut request = self
            .http
            .request(endpoint.method.as_reqwest(), url.clone())
            .headers(headers);
        if let Some(body) = &endpoint.body {
            request = request.body(body.clone());
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        debug!(%url, status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
