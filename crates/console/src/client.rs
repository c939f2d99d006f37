//! Identity service client.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the bearer
//! token and owns the single 401 hook. Call sites never handle 401 themselves.

use std::sync::{Arc, RwLock};

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use tenantdesk_auth::BearerToken;

use crate::config::ConsoleConfig;
use crate::error::ClientError;
use crate::types::{LoginRequest, LoginResponse, UserInfoDto};

/// Callback fired when an authenticated request is answered with 401.
///
/// Receives the token the failed request carried.
pub type UnauthorizedHook = Arc<dyn Fn(&BearerToken) + Send + Sync>;

/// Shared slot holding the bearer token attached to outgoing requests.
///
/// Readable by any holder; only the auth session writes it.
#[derive(Debug, Clone, Default)]
pub struct CredentialCell(Arc<RwLock<Option<BearerToken>>>);

impl CredentialCell {
    pub fn current(&self) -> Option<BearerToken> {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn set(&self, token: BearerToken) {
        *self.0.write().unwrap_or_else(|p| p.into_inner()) = Some(token);
    }

    pub(crate) fn clear(&self) {
        *self.0.write().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

/// Whether a request should carry the current bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Anonymous,
    Bearer,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: CredentialCell,
    on_unauthorized: UnauthorizedHook,
}

impl core::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        config: &ConsoleConfig,
        credentials: CredentialCell,
        on_unauthorized: UnauthorizedHook,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            credentials,
            on_unauthorized,
        })
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request, applying the bearer token and the global 401 hook.
    pub(crate) async fn execute(&self, builder: RequestBuilder, auth: Auth) -> Result<Response, ClientError> {
        let token = match auth {
            Auth::Bearer => self.credentials.current(),
            Auth::Anonymous => None,
        };

        let builder = match &token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some(token) = &token {
                warn!(url = %response.url(), "authenticated request answered 401; discarding session");
                (self.on_unauthorized)(token);
                return Err(ClientError::SessionExpired);
            }
        }

        Ok(response)
    }

    /// Send an authenticated request and decode a JSON body.
    pub(crate) async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = self.execute(builder, Auth::Bearer).await?;
        decode(response).await
    }

    /// Send an authenticated request whose body is ignored.
    pub(crate) async fn fetch_empty(&self, builder: RequestBuilder) -> Result<(), ClientError> {
        let response = self.execute(builder, Auth::Bearer).await?;
        ensure_success(response).await.map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Authentication endpoints
    // ─────────────────────────────────────────────────────────────────────

    /// `POST /api/auth/login`.
    ///
    /// Sent without a bearer token so that bad credentials are reported as
    /// [`ClientError::Authentication`] and never tear down a live session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let builder = self.request(Method::POST, "/api/auth/login").json(&body);
        let response = self.execute(builder, Auth::Anonymous).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::BAD_REQUEST {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<LoginResponse>(&text)
                .map(|r| r.message)
                .unwrap_or(text);
            debug!(status = status.as_u16(), "login rejected by identity service");
            return Err(ClientError::Authentication(message));
        }

        let login: LoginResponse = decode(response).await?;
        match (&login.token, login.success) {
            (Some(token), true) if !token.is_empty() => Ok(login),
            _ => Err(ClientError::Authentication(login.message)),
        }
    }

    /// `GET /api/auth/me`: the authoritative identity for the current token.
    pub async fn me(&self) -> Result<UserInfoDto, ClientError> {
        self.fetch(self.request(Method::GET, "/api/auth/me")).await
    }

    /// `GET /api/auth/validate`.
    pub async fn validate(&self) -> Result<UserInfoDto, ClientError> {
        self.fetch(self.request(Method::GET, "/api/auth/validate")).await
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Parse(e.to_string()))
}
