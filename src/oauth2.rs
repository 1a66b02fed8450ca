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
use http::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// The OAuth2 token endpoint. Also the `aud` claim of every assertion.
pub(crate) const TOKEN_URI: &str = "https://www.googleapis.com/oauth2/v4/token";

/// JWT-bearer grant type, RFC 7523.
pub(crate) const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    grant_type: &'a str,
    assertion: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<u64>,
    scope: Option<String>,
}

/// Exchanges a signed assertion for an access token using the JWT-bearer
/// grant.
///
/// Single attempt, no retry: the caller owns any resilience policy.
#[derive(Clone, Debug)]
pub(crate) struct ExchangeClient {
    endpoint: String,
    inner: reqwest::Client,
}

impl ExchangeClient {
    pub(crate) fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            inner: reqwest::Client::new(),
        }
    }

    pub(crate) async fn exchange(&self, assertion: &str) -> Result<Token> {
        let body = ExchangeRequest {
            grant_type: JWT_BEARER_GRANT_TYPE,
            assertion,
        };
        tracing::debug!(endpoint = %self.endpoint, "exchanging signed assertion for access token");

        let response = self
            .inner
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(AuthError::transport)?;

        if !response.status().is_success() {
            // Surface the endpoint's error payload verbatim, e.g.
            // `invalid_grant` or `unauthorized_client`.
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::exchange_rejected(status, body));
        }

        let response = response
            .json::<TokenResponse>()
            .await
            .map_err(AuthError::unexpected_response)?;

        Ok(Token {
            token: response.access_token,
            token_type: response.token_type,
            expires_at: response
                .expires_in
                .map(|d| Instant::now() + Duration::from_secs(d)),
            scope: response.scope,
        })
    }
}
