use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use frag_types::OwnerId;

use crate::config::AuthConfig;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Principal used when authentication is disabled and no credentials are sent.
pub const DEV_PRINCIPAL: &str = "dev@localhost";

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub principal: String,
}

impl Identity {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }

    /// The owner id every fragment operation for this caller is scoped to.
    pub fn owner(&self) -> OwnerId {
        OwnerId::from_principal(&self.principal)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Anonymous,
}

impl Credentials {
    /// Read credentials from the `Authorization` header.
    pub fn from_headers(headers: &HeaderMap) -> ServerResult<Self> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(Self::Anonymous);
        };
        let value = value
            .to_str()
            .map_err(|_| ServerError::Unauthorized("malformed authorization header".into()))?;
        let (scheme, encoded) = value
            .split_once(' ')
            .ok_or_else(|| ServerError::Unauthorized("malformed authorization header".into()))?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(ServerError::Unauthorized(format!(
                "unsupported authorization scheme: {scheme}"
            )));
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|raw| String::from_utf8(raw).ok())
            .ok_or_else(|| ServerError::Unauthorized("malformed basic credentials".into()))?;
        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| ServerError::Unauthorized("malformed basic credentials".into()))?;
        Ok(Self::Basic {
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts every request. A Basic username, if sent, becomes the principal.
pub struct NoAuth;

#[async_trait]
impl AuthProvider for NoAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Basic { username, .. } if !username.is_empty() => {
                Ok(Identity::new(username.clone()))
            }
            _ => Ok(Identity::new(DEV_PRINCIPAL)),
        }
    }
}

/// HTTP Basic against a fixed user table.
pub struct BasicAuth {
    users: BTreeMap<String, String>,
}

impl BasicAuth {
    pub fn new(users: BTreeMap<String, String>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AuthProvider for BasicAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        let Credentials::Basic { username, password } = credentials else {
            return Err(ServerError::Unauthorized("missing credentials".into()));
        };
        match self.users.get(username) {
            Some(expected) if expected == password => Ok(Identity::new(username.clone())),
            _ => Err(ServerError::Unauthorized("invalid username or password".into())),
        }
    }
}

pub fn provider_from_config(config: &AuthConfig) -> Arc<dyn AuthProvider> {
    match config {
        AuthConfig::None => Arc::new(NoAuth),
        AuthConfig::Basic { users } => Arc::new(BasicAuth::new(users.clone())),
    }
}

/// Middleware: authenticate the request and attach its [`Identity`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ServerResult<Response> {
    let credentials = Credentials::from_headers(request.headers())?;
    let identity = state.auth.authenticate(&credentials).await?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
