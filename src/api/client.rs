//! HTTP client for the clipper backend.
//!
//! Every call except `login` and `register` needs a bearer token. Calls made
//! without one fail with [`Error::NotAuthenticated`] before anything is sent.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::clip::SnippetSink;
use crate::config::ClipperConfig;
use crate::error::{Error, Result};
use crate::identifiers::{CategoryId, SnippetId};

use super::models::{
    Category, CategoryAssignment, Credentials, LoginResponse, NewCategory, Profile, SavePayload,
    Snippet, SnippetStats,
};

// ============================================================================
// ApiClient
// ============================================================================

/// Backend REST client.
///
/// # Example
///
/// ```no_run
/// use web_clipper::{ApiClient, ClipperConfig, Result};
///
/// # async fn example() -> Result<()> {
/// let config = ClipperConfig::builder().api_url("http://localhost:3000").build()?;
/// let mut client = ApiClient::new(&config)?;
///
/// let login = client.login("ada", "hunter2").await?;
/// client.set_token(Some(login.token));
///
/// for snippet in client.list_snippets().await? {
///     println!("{} {}", snippet.kind, snippet.content);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for the configured API URL and token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClipperConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base: config.api_url().clone(),
            token: config.token().map(str::to_string),
        })
    }

    /// Replaces the bearer token.
    #[inline]
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token.filter(|t| !t.is_empty());
    }

    /// Returns the bearer token, if any.
    #[inline]
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Returns the API base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }
}

// ============================================================================
// Auth
// ============================================================================

impl ApiClient {
    /// Exchanges credentials for a token.
    ///
    /// The token is not stored; pass it to [`set_token`](Self::set_token).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with the server's message on rejection.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self
            .http
            .post(self.endpoint("api/login")?)
            .json(&Credentials { username, password });

        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Creates an account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the name is taken or the server fails.
    pub async fn register(&self, username: &str, password: &str) -> Result<Value> {
        let request = self
            .http
            .post(self.endpoint("api/register")?)
            .json(&Credentials { username, password });

        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Fetches the account the token belongs to.
    ///
    /// Useful for checking a stored token before a clip.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAuthenticated`] without a token
    /// - [`Error::Unauthorized`] if the token is rejected
    pub async fn profile(&self) -> Result<Profile> {
        self.get_json("api/profile").await
    }
}

// ============================================================================
// Snippets
// ============================================================================

impl ApiClient {
    /// Saves a clip.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAuthenticated`] without a token
    /// - [`Error::Unauthorized`] on 401/403
    /// - [`Error::Save`] on any other failure status
    pub async fn save(&self, payload: &SavePayload) -> Result<Value> {
        let request = self
            .authorized(self.http.post(self.endpoint("api/save")?))?
            .json(payload);

        debug!(kind = %payload.kind, source_url = %payload.source_url, "Saving snippet");

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(Error::from);
        }

        if is_auth_status(status) {
            return Err(Error::unauthorized(failure_message(response).await));
        }

        let message = json_message(response).await;
        warn!(status = status.as_u16(), message = ?message, "Save rejected");
        Err(Error::save(Some(status.as_u16()), message))
    }

    /// Lists the user's snippets, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`], [`Error::Unauthorized`] or
    /// [`Error::Api`].
    pub async fn list_snippets(&self) -> Result<Vec<Snippet>> {
        self.get_json("api/snippets").await
    }

    /// Deletes a snippet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 if the snippet does not exist.
    pub async fn delete_snippet(&self, id: &SnippetId) -> Result<()> {
        let url = self.endpoint(&format!("api/snippets/{id}"))?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }

    /// Moves a snippet into `category`, or out of any category with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 if the snippet does not exist.
    pub async fn set_snippet_category(
        &self,
        id: &SnippetId,
        category: Option<&CategoryId>,
    ) -> Result<Snippet> {
        let url = self.endpoint(&format!("api/snippets/{id}/category"))?;
        let request = self
            .authorized(self.http.patch(url))?
            .json(&CategoryAssignment {
                category_id: category,
            });

        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Fetches the dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`], [`Error::Unauthorized`] or
    /// [`Error::Api`].
    pub async fn stats(&self) -> Result<SnippetStats> {
        self.get_json("api/stats").await
    }
}

// ============================================================================
// Categories
// ============================================================================

impl ApiClient {
    /// Lists the user's categories, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAuthenticated`], [`Error::Unauthorized`] or
    /// [`Error::Api`].
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get_json("api/categories").await
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] if the server rejects it.
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let request = self
            .authorized(self.http.post(self.endpoint("api/categories")?))?
            .json(category);

        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Renames or restyles a category.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 if the category does not exist.
    pub async fn update_category(&self, id: &CategoryId, category: &NewCategory) -> Result<Category> {
        let url = self.endpoint(&format!("api/categories/{id}"))?;
        let request = self.authorized(self.http.put(url))?.json(category);

        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Deletes a category. Its snippets become uncategorized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Api`] with status 404 if the category does not exist.
    pub async fn delete_category(&self, id: &CategoryId) -> Result<()> {
        let url = self.endpoint(&format!("api/categories/{id}"))?;
        self.send(self.authorized(self.http.delete(url))?).await?;
        Ok(())
    }
}

// ============================================================================
// Internal
// ============================================================================

impl ApiClient {
    /// Resolves `path` against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Adds the bearer token.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.token.as_deref().ok_or(Error::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authorized(self.http.get(self.endpoint(path)?))?;
        self.send(request).await?.json().await.map_err(Error::from)
    }

    /// Sends a request and maps failure statuses to errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();

        debug!(status = status.as_u16(), url = %response.url(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let message = failure_message(response).await;
        if is_auth_status(status) {
            Err(Error::unauthorized(message))
        } else {
            Err(Error::api(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl SnippetSink for ApiClient {
    async fn save(&self, payload: &SavePayload) -> Result<Value> {
        ApiClient::save(self, payload).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn is_auth_status(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Reads `message` or `error` from a JSON error body.
async fn json_message(response: Response) -> Option<String> {
    let body: Value = response.json().await.ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Server message, falling back to the status reason.
async fn failure_message(response: Response) -> String {
    let status = response.status();
    json_message(response).await.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    })
}

// ============================================================================
// Tests
// ============================================================================
