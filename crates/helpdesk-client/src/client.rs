//! Credentialed HTTP access to the helpdesk API.
//!
//! Every request carries the session cookie from a shared jar. State-changing
//! requests also carry the CSRF token: when the `XSRF-TOKEN` cookie is missing
//! the client first asks `GET /csrf` to issue one.

use std::{
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use helpdesk_core::{HelpdeskConfig, User};
use reqwest::{
    Method, StatusCode, Url,
    cookie::{CookieStore, Jar},
    header,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::ClientError;

const API_PREFIX: &str = "api";
const CSRF_COOKIE: &str = "XSRF-TOKEN";
const CSRF_HEADER: &str = "X-XSRF-TOKEN";
const LOGIN_PATH: &str = "/auth/login";
const SAFE_METHODS: [Method; 4] = [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE];

/// Shared handle to the helpdesk API. Cloning is cheap; clones share the
/// connection pool, cookie jar and identity cache.
#[derive(Debug, Clone)]
pub struct HelpdeskClient {
    http: reqwest::Client,
    base_url: Url,
    cookies: Arc<Jar>,
    identity: Arc<RwLock<Option<User>>>,
}

impl HelpdeskClient {
    /// Creates a client for the backend at `endpoint`; `/api` is appended.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(endpoint)?;
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            cookies,
            identity: Arc::new(RwLock::new(None)),
        })
    }

    pub fn from_config(config: &HelpdeskConfig) -> Result<Self, ClientError> {
        Self::new(&config.endpoint, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn url_with_segments(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                ClientError::InvalidEndpoint(format!("{} cannot be a base URL", self.base_url))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.send(Method::GET, url, query, None::<&()>).await?;
        Ok(response.json::<T>().await?)
    }

    pub(crate) async fn post_json<TReq: Serialize + ?Sized, TRes: DeserializeOwned>(
        &self,
        url: Url,
        body: &TReq,
    ) -> Result<TRes, ClientError> {
        let response = self.send(Method::POST, url, &[], Some(body)).await?;
        Ok(response.json::<TRes>().await?)
    }

    pub(crate) async fn post_empty<TReq: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &TReq,
    ) -> Result<(), ClientError> {
        self.send(Method::POST, url, &[], Some(body)).await?;
        Ok(())
    }

    pub(crate) async fn patch_json<TReq: Serialize + ?Sized, TRes: DeserializeOwned>(
        &self,
        url: Url,
        body: &TReq,
    ) -> Result<TRes, ClientError> {
        let response = self.send(Method::PATCH, url, &[], Some(body)).await?;
        Ok(response.json::<TRes>().await?)
    }

    async fn send<TReq: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
        body: Option<&TReq>,
    ) -> Result<reqwest::Response, ClientError> {
        let path = url.path().to_string();
        let needs_csrf = !SAFE_METHODS.contains(&method);
        if needs_csrf {
            self.ensure_csrf_cookie().await;
        }

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if needs_csrf && let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%method, path = %path, status = status.as_u16(), "helpdesk request");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED && !path.ends_with(LOGIN_PATH) {
            self.clear_identity();
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status, &body))
    }

    /// Current value of the `XSRF-TOKEN` cookie for the API origin.
    pub fn csrf_token(&self) -> Option<String> {
        let cookies = self.cookies.cookies(&self.base_url)?;
        let cookies = cookies.to_str().ok()?;
        cookies
            .split(';')
            .map(str::trim)
            .find_map(|cookie| cookie.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
            .map(str::to_string)
    }

    async fn ensure_csrf_cookie(&self) {
        if self.csrf_token().is_some() {
            return;
        }
        let url = match self.url_with_segments(&["csrf"]) {
            Ok(url) => url,
            Err(err) => {
                debug!(error = %err, "cannot build CSRF url");
                return;
            }
        };
        // Failure is ignored; the real request reports the problem.
        match self.http.get(url).send().await {
            Ok(response) => debug!(status = response.status().as_u16(), "requested CSRF token"),
            Err(err) => debug!(error = %err, "CSRF token request failed"),
        }
    }

    pub(crate) fn cached_identity(&self) -> Option<User> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store_identity(&self, user: Option<User>) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    pub(crate) fn clear_identity(&self) {
        self.store_identity(None);
    }
}

fn normalize_base_url(endpoint: &str) -> Result<Url, ClientError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidEndpoint(
            "endpoint must not be empty".to_string(),
        ));
    }
    let mut url = Url::parse(trimmed)
        .map_err(|err| ClientError::InvalidEndpoint(format!("{trimmed}: {err}")))?;
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidEndpoint(format!("{trimmed} cannot be a base URL")))?
        .pop_if_empty()
        .push(API_PREFIX);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, method, path},
    };

    use super::*;
    use crate::testing::client_for;

    #[test]
    fn test_normalize_base_url_appends_api() {
        let url = normalize_base_url(" https://desk.example.com/ ").unwrap();
        assert_eq!(url.as_str(), "https://desk.example.com/api");

        let url = normalize_base_url("https://example.com/helpdesk").unwrap();
        assert_eq!(url.as_str(), "https://example.com/helpdesk/api");
    }

    #[test]
    fn test_normalize_base_url_rejects_empty_and_relative() {
        assert!(matches!(
            normalize_base_url("   "),
            Err(ClientError::InvalidEndpoint(_))
        ));
        assert!(normalize_base_url("desk.example.com").is_err());
    }

    #[test]
    fn test_url_with_segments_escapes() {
        let client = HelpdeskClient::new("https://desk.example.com", Duration::from_secs(1)).unwrap();
        let url = client.url_with_segments(&["tickets", "7", "comments"]).unwrap();
        assert_eq!(url.as_str(), "https://desk.example.com/api/tickets/7/comments");
    }

    #[tokio::test]
    async fn test_unsafe_request_fetches_csrf_token_first() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/csrf"))
            .respond_with(
                ResponseTemplate::new(204).insert_header("set-cookie", "XSRF-TOKEN=tok-123; Path=/"),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .and(header("x-xsrf-token", "tok-123"))
            .and(body_json(json!({"ping": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.url_with_segments(&["echo"]).unwrap();
        for _ in 0..2 {
            let reply: serde_json::Value = client
                .post_json(url.clone(), &json!({"ping": true}))
                .await
                .unwrap();
            assert_eq!(reply, json!({"pong": true}));
        }
        assert_eq!(client.csrf_token().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_get_does_not_request_csrf() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/csrf"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.url_with_segments(&["ping"]).unwrap();
        let reply: Vec<u8> = client.get_json(url, &[]).await.unwrap();
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn test_csrf_failure_does_not_block_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/csrf"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/echo"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.url_with_segments(&["echo"]).unwrap();
        client.post_empty(url, &json!({})).await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_clears_cached_identity() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tickets"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.store_identity(Some(
            serde_json::from_value(json!({"id": 1, "username": "ana", "role": "AGENT"})).unwrap(),
        ));

        let url = client.url_with_segments(&["tickets"]).unwrap();
        let err = client
            .get_json::<serde_json::Value>(url, &[])
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert!(client.cached_identity().is_none());
    }
}
