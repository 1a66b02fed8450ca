// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::errors::AuthError;
use crate::token::Token;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use std::time::Duration;
use tokio::time::Instant;

pub(crate) const MDS_DEFAULT_URI: &str = "/computeMetadata/v1/instance/service-accounts/default";
pub(crate) const METADATA_FLAVOR_VALUE: &str = "Google";
pub(crate) const METADATA_FLAVOR: &str = "metadata-flavor";
pub(crate) const METADATA_ROOT: &str = "http://metadata.google.internal";
pub(crate) const GCE_METADATA_HOST_ENV_VAR: &str = "GCE_METADATA_HOST";

// Budget for the availability probe. The metadata service answers within
// milliseconds when present; off Google Cloud the hostname does not resolve
// or the connection is refused well within this budget.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// A client for the GCP Compute Engine Metadata Service (MDS).
///
/// Used to discover the ambient workload identity and to mint the
/// IAM-scoped access token that authenticates `signBlob` calls.
#[derive(Clone, Debug)]
pub(crate) struct Client {
    endpoint: String,
    inner: ReqwestClient,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub(crate) struct MdsTokenResponse {
    pub(crate) access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expires_in: Option<u64>,
    pub(crate) token_type: String,
}

impl Client {
    /// Creates a new client for the Metadata Service.
    pub(crate) fn new(endpoint_override: Option<String>) -> Self {
        let endpoint = Self::resolve_endpoint(endpoint_override)
            .trim_end_matches('/')
            .to_string();
        Self {
            endpoint,
            inner: ReqwestClient::new(),
        }
    }

    fn resolve_endpoint(endpoint_override: Option<String>) -> String {
        if let Ok(host) = std::env::var(GCE_METADATA_HOST_ENV_VAR) {
            // Check GCE_METADATA_HOST environment variable first
            format!("http://{host}")
        } else if let Some(e) = endpoint_override {
            // Else, check if an endpoint was provided to the builder
            e
        } else {
            // Else, use the default metadata root
            METADATA_ROOT.to_string()
        }
    }

    /// Creates a GET request to the MDS service with the correct headers.
    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.endpoint, path);
        self.inner
            .get(url)
            .header(METADATA_FLAVOR, METADATA_FLAVOR_VALUE)
    }

    /// True if an ambient identity is discoverable, independent of whether
    /// that identity holds any signing permission.
    pub(crate) async fn is_available(&self) -> bool {
        self.get("/").timeout(PROBE_TIMEOUT).send().await.is_ok()
    }

    /// Fetches the email of the default service account.
    pub(crate) async fn email(&self) -> Result<String> {
        let path = format!("{MDS_DEFAULT_URI}/email");
        let response = self
            .get(&path)
            .send()
            .await
            .map_err(AuthError::no_ambient_identity)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::no_ambient_identity(format!(
                "failed to fetch email, status {status}: {body}"
            )));
        }

        response.text().await.map_err(AuthError::unexpected_response)
    }

    /// Fetches an access token for the default service account, restricted
    /// to `scopes`.
    pub(crate) async fn access_token(&self, scopes: &[&str]) -> Result<Token> {
        let path = format!("{MDS_DEFAULT_URI}/token");
        let request = self.get(&path).query(&[("scopes", scopes.join(","))]);

        let response = request.send().await.map_err(AuthError::transport)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::signing_denied(status, body));
        }

        let response = response
            .json::<MdsTokenResponse>()
            .await
            .map_err(AuthError::unexpected_response)?;

        Ok(Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at: response
                .expires_in
                .map(|d| Instant::now() + Duration::from_secs(d)),
            scope: None,
        })
    }
}
