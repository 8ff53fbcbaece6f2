use std::sync::Arc;

use frag_model::FragmentService;

use crate::auth::AuthProvider;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: FragmentService,
    pub auth: Arc<dyn AuthProvider>,
    /// Base for `Location` headers, without a trailing slash.
    pub api_url: String,
}

impl AppState {
    /// `api_url` is expected without a trailing slash; see
    /// [`ServerConfig::base_url`](crate::config::ServerConfig::base_url).
    pub fn new(service: FragmentService, auth: Arc<dyn AuthProvider>, api_url: &str) -> Self {
        Self {
            service,
            auth,
            api_url: api_url.to_string(),
        }
    }

    pub fn fragment_url(&self, id: &str) -> String {
        format!("{}/v1/fragments/{id}", self.api_url)
    }
}
