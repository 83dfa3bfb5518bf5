//! Job tracker HTTP client
//!
//! Every API call goes through [`JobTrackClient::send`], which attaches the
//! stored access token and, on a first 401, renews it through the
//! [`RefreshCoordinator`] and replays the request once.

pub mod answers;
pub mod applications;
pub mod auth;
pub mod config;
pub mod error;
pub mod jobs;
pub mod refresh;
pub mod session;
pub mod token_store;

use error::ClientError;
use refresh::{HttpTokenRefresher, RefreshCoordinator, TokenRefresher};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, Method, StatusCode, header};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use token_store::{MemoryTokenStore, TokenStore};
use tracing::debug;

/// Default user agent
pub const USER_AGENT: &str = concat!("jobtrack-client/", env!("CARGO_PKG_VERSION"));

/// File sent as one part of a multipart body
#[derive(Clone)]
pub struct FilePart {
    /// Form field name, e.g. `resume`
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Content type is inferred from the file extension when it is a known document type
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            field: field.into(),
            content_type: document_content_type(&file_name).map(str::to_string),
            file_name,
            bytes,
        }
    }

    fn to_part(&self) -> Result<Part, ClientError> {
        let part = Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        match &self.content_type {
            Some(content_type) => Ok(part.mime_str(content_type)?),
            None => Ok(part),
        }
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn document_content_type(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        _ => None,
    }
}

/// Request body kept in a form that can be sent again after a refresh
#[derive(Debug, Clone)]
pub enum ApiBody {
    Json(serde_json::Value),
    /// Rebuilt into a fresh multipart form on every attempt
    Multipart(Vec<FilePart>),
}

/// A replayable API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<ApiBody>,
    /// Public requests carry no bearer token and never trigger a refresh
    pub public: bool,
    /// Set once the request has been replayed after a refresh
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            public: false,
            retried: false,
        }
    }

    /// Request to an endpoint that does not require authentication
    pub fn public(method: Method, path: impl Into<String>) -> Self {
        Self {
            public: true,
            ..Self::new(method, path)
        }
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(ApiBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    /// Attach a file as a multipart body, replacing any JSON body
    pub fn file(mut self, file: FilePart) -> Self {
        match &mut self.body {
            Some(ApiBody::Multipart(parts)) => parts.push(file),
            _ => self.body = Some(ApiBody::Multipart(vec![file])),
        }
        self
    }
}

/// Job tracker API client
#[derive(Clone)]
pub struct JobTrackClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl JobTrackClient {
    /// Create a new client with default configuration and in-memory tokens
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    pub fn builder() -> JobTrackClientBuilder {
        JobTrackClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Token store shared with the refresh coordinator
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Refresh coordinator used by this client
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Whether an access token is stored
    pub fn is_logged_in(&self) -> bool {
        self.tokens.access().is_some()
    }

    /// Create a request builder, attaching `access` as a bearer credential if given
    pub fn request(
        &self,
        method: Method,
        path: &str,
        access: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);

        if let Some(token) = access {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        request
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        access: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut builder = self.request(request.method.clone(), &request.path, access);
        match &request.body {
            Some(ApiBody::Json(body)) => builder = builder.json(body),
            Some(ApiBody::Multipart(files)) => {
                let mut form = Form::new();
                for file in files {
                    form = form.part(file.field.clone(), file.to_part()?);
                }
                builder = builder.multipart(form);
            }
            None => {}
        }
        Ok(builder.send().await?)
    }

    /// Send a request with the stored access token.
    ///
    /// Responses other than 401 are returned untouched. A first 401 triggers a
    /// (shared) token refresh and a single replay with the new token. If the
    /// refresh fails the original 401 is returned as
    /// [`ClientError::AuthenticationFailed`]; if the replay is rejected with
    /// 401 too the session is cleared and that response is returned.
    pub async fn send(&self, mut request: ApiRequest) -> Result<reqwest::Response, ClientError> {
        if request.public {
            return self.dispatch(&request, None).await;
        }

        let access = self.tokens.access();
        let response = self.dispatch(&request, access.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if request.retried {
            return Ok(self.terminal_unauthorized(response));
        }

        request.retried = true;
        let original = ClientError::from_response(response).await;
        debug!(method = %request.method, path = %request.path, "Access token rejected, refreshing");

        let Ok(fresh) = self.coordinator.refresh().await else {
            return Err(original);
        };

        let response = self.dispatch(&request, Some(&fresh)).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(self.terminal_unauthorized(response));
        }
        Ok(response)
    }

    fn terminal_unauthorized(&self, response: reqwest::Response) -> reqwest::Response {
        debug!(url = %response.url(), "Request rejected after refresh, clearing session");
        self.tokens.clear();
        response
    }

    /// Send a request and decode a JSON success body
    pub async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(ClientError::from_response(response).await)
        }
    }

    /// Send a request whose success response carries no body of interest
    pub async fn execute_empty(&self, request: ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::from_response(response).await)
        }
    }
}

/// Builder for JobTrackClient
#[derive(Default)]
pub struct JobTrackClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    refresh_timeout: Option<Duration>,
    user_agent: Option<String>,
    tokens: Option<Arc<dyn TokenStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl JobTrackClientBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the timeout for the token refresh call only
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use the given token store instead of an in-memory one
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Replace the HTTP refresher
    pub fn refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the client
    pub fn build(self) -> Result<JobTrackClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url is empty".into()));
        }

        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder =
            client_builder.user_agent(self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()));

        let client = client_builder.build()?;

        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new()));
        let refresher = self.refresher.unwrap_or_else(|| {
            Arc::new(HttpTokenRefresher::new(
                client.clone(),
                &base_url,
                self.refresh_timeout,
            ))
        });
        let coordinator = Arc::new(RefreshCoordinator::new(Arc::clone(&tokens), refresher));

        Ok(JobTrackClient {
            client,
            base_url,
            tokens,
            coordinator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_part_infers_document_types() {
        let resume = FilePart::new("resume", "CV.PDF", b"%PDF".to_vec());
        assert_eq!(resume.content_type.as_deref(), Some("application/pdf"));

        let unknown = FilePart::new("cover_letter", "letter", Vec::new());
        assert_eq!(unknown.content_type, None);
    }

    #[test]
    fn files_accumulate_into_one_multipart_body() {
        let request = ApiRequest::new(Method::PATCH, "/api/applications/7/")
            .file(FilePart::new("resume", "resume.pdf", vec![1]))
            .file(FilePart::new("cover_letter", "letter.txt", vec![2]));

        match request.body {
            Some(ApiBody::Multipart(files)) => {
                let fields: Vec<_> = files.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(fields, ["resume", "cover_letter"]);
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }
}
