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

use tokio::time::Instant;

/// An OAuth2 access token impersonating a Google Workspace user.
///
/// Tokens are not cached or persisted by this crate; the lifetime is owned
/// entirely by the caller.
#[derive(Clone, PartialEq)]
pub struct Token {
    /// The actual token string.
    ///
    /// This is the value used in the `Authorization:` header.
    pub token: String,

    /// The type of the token, typically `"Bearer"`.
    pub token_type: String,

    /// The instant at which the token expires.
    ///
    /// `None` if the token endpoint did not report an `expires_in` value.
    /// Note that an `Instant` is not valid across processes.
    pub expires_at: Option<Instant>,

    /// The scopes granted by the token endpoint, if reported.
    pub scope: Option<String>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("token", &"[censored]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}
