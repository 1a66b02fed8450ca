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

//! Domain-wide delegation tokens for Google Workspace APIs.
//!
//! This crate acquires short-lived OAuth2 access tokens that impersonate a
//! Google Workspace user via [domain-wide delegation]. Workloads running on
//! Google Cloud do not need a distributed service account key: the JWT
//! assertion is signed remotely through the IAM Credentials `signBlob` API
//! using the workload's ambient identity. Outside Google Cloud, a service
//! account key file referenced by `GOOGLE_APPLICATION_CREDENTIALS` is used
//! instead.
//!
//! Each call performs one end-to-end acquisition: build the assertion, sign
//! it, and exchange it at the OAuth2 token endpoint with the JWT-bearer
//! grant. Tokens are not cached and requests are not retried; callers own
//! the token lifecycle.
//!
//! Example usage:
//!
//! ```no_run
//! # use google_delegated_auth::credentials::Builder;
//! # tokio_test::block_on(async {
//! let credentials = Builder::new().build().await?;
//! let token = credentials
//!     .access_token("alice@example.com", &["https://mail.google.com".to_string()])
//!     .await?;
//! println!("token type: {}", token.token_type);
//! # Ok::<(), google_delegated_auth::errors::AuthError>(())
//! # });
//! ```
//!
//! [domain-wide delegation]: https://developers.google.com/workspace/guides/create-credentials#optional_set_up_domain-wide_delegation_for_a_service_account

/// Errors raised while acquiring delegated tokens.
pub mod errors;

/// The facade used to acquire delegated tokens and authenticated clients.
pub mod credentials;

/// The access token type returned by the facade.
pub mod token;

/// The dual-mode assertion signers (remote `signBlob` and local key).
pub mod signer;

pub(crate) mod jws;
pub(crate) mod mds;
pub(crate) mod oauth2;

/// A `Result` alias where the `Err` case is
/// `google_delegated_auth::errors::AuthError`.
pub type Result<T> = std::result::Result<T, crate::errors::AuthError>;
