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
use serde::Serialize;
use std::time::Duration;
use time::OffsetDateTime;

// Services reject assertions with `iat` in the future. Unfortunately all
// machines have some amount of clock skew, and it is possible that the
// machine creating this assertion has a clock a few seconds ahead of the
// machines receiving it. Backdate the assertion by 10 seconds to avoid most
// clock skew problems. The backdation shifts `iat` and `exp` equally, so the
// requested lifetime is preserved exactly.
pub(crate) const CLOCK_SKEW_FUDGE: Duration = Duration::from_secs(10);

/// Encodes `input` as URL-safe base64 without padding.
pub(crate) fn b64<T: AsRef<[u8]>>(input: T) -> String {
    use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

/// The header that describes how an assertion was signed.
///
/// Identical for every assertion produced by this crate: the IAM `signBlob`
/// API and local service account keys both produce RS256 signatures.
#[derive(Serialize)]
pub(crate) struct JwsHeader<'a> {
    pub alg: &'a str,
    pub typ: &'a str,
}

impl JwsHeader<'_> {
    pub(crate) fn encode(&self) -> Result<String> {
        let json = serde_json::to_string(&self).map_err(AuthError::unexpected_response)?;
        Ok(b64(json.as_bytes()))
    }
}

/// The claim set of a delegation assertion.
#[derive(Serialize)]
pub(crate) struct JwsClaims {
    pub iss: String,
    pub sub: String,
    pub scope: String,
    pub aud: String,
    #[serde(with = "time::serde::timestamp")]
    pub exp: OffsetDateTime,
    #[serde(with = "time::serde::timestamp")]
    pub iat: OffsetDateTime,
}

impl JwsClaims {
    pub(crate) fn encode(&self) -> Result<String> {
        if self.exp < self.iat {
            return Err(AuthError::invalid_argument(format!(
                "expiration time {:?} must be later than issued time {:?}",
                self.exp, self.iat
            )));
        }
        let json = serde_json::to_string(&self).map_err(AuthError::unexpected_response)?;
        Ok(b64(json.as_bytes()))
    }
}

/// Validates the caller-supplied parts of an assertion.
///
/// Called before the issuer identity is resolved, so malformed input fails
/// without any network traffic.
pub(crate) fn validate_request(subject: &str, scopes: &[String], lifetime: Duration) -> Result<()> {
    if subject.is_empty() {
        return Err(AuthError::invalid_argument("subject must not be empty"));
    }
    if scopes.is_empty() || scopes.iter().any(String::is_empty) {
        return Err(AuthError::invalid_argument(
            "scopes must be a non-empty list of non-empty scope strings",
        ));
    }
    if lifetime.is_zero() {
        return Err(AuthError::invalid_argument(
            "assertion lifetime must be positive",
        ));
    }
    Ok(())
}

/// Builds the unsigned `base64url(header) + "." + base64url(claims)` segment
/// of a delegation assertion.
///
/// Reads the current time for `iat`/`exp`, so two calls with identical
/// inputs yield different byte strings.
pub(crate) fn unsigned_assertion(
    issuer: &str,
    subject: &str,
    scopes: &[String],
    lifetime: Duration,
    audience: &str,
) -> Result<String> {
    validate_request(subject, scopes, lifetime)?;

    let now = OffsetDateTime::now_utc() - CLOCK_SKEW_FUDGE;
    let claims = JwsClaims {
        iss: issuer.to_string(),
        sub: subject.to_string(),
        scope: scopes.join(" "),
        aud: audience.to_string(),
        exp: now + lifetime,
        iat: now,
    };
    let header = JwsHeader {
        alg: "RS256",
        typ: "JWT",
    };
    Ok(format!("{}.{}", header.encode()?, claims.encode()?))
}
