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

use http::StatusCode;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Represents an error acquiring a delegated access token.
///
/// Every failure surfaces to the immediate caller unaltered. There is no
/// local recovery and no retry: a partial token is never usable. Use the
/// predicates to distinguish the failure classes, and [is_retryable] to
/// decide whether an outer retry loop could help.
///
/// [is_retryable]: AuthError::is_retryable
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub struct AuthError(AuthErrorKind);

impl AuthError {
    /// Malformed caller input, such as an empty scope list or subject.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.0, AuthErrorKind::InvalidArgument(_))
    }

    /// No ambient identity is discoverable from the metadata service.
    pub fn is_no_ambient_identity(&self) -> bool {
        matches!(self.0, AuthErrorKind::NoAmbientIdentity(_))
    }

    /// The calling identity lacks the token-creator/signer role.
    pub fn is_signing_denied(&self) -> bool {
        matches!(self.0, AuthErrorKind::SigningDenied { .. })
    }

    /// The configured credential file does not exist.
    pub fn is_credential_file_not_found(&self) -> bool {
        matches!(self.0, AuthErrorKind::CredentialFileNotFound { .. })
    }

    /// The credential file could not be parsed as a service account key.
    pub fn is_credential_file_malformed(&self) -> bool {
        matches!(self.0, AuthErrorKind::CredentialFileMalformed(_))
    }

    /// A problem producing a signature with the local private key.
    pub fn is_signing(&self) -> bool {
        matches!(self.0, AuthErrorKind::Signing(_))
    }

    /// The token endpoint rejected the assertion. The endpoint's error
    /// payload is preserved verbatim, see [error_payload].
    ///
    /// [error_payload]: AuthError::error_payload
    pub fn is_exchange_rejected(&self) -> bool {
        matches!(self.0, AuthErrorKind::TokenExchangeRejected { .. })
    }

    /// A connectivity problem reaching the signing service or the token
    /// endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(self.0, AuthErrorKind::Transport(_))
    }

    /// A successful HTTP response whose body could not be decoded.
    pub fn is_unexpected_response(&self) -> bool {
        matches!(self.0, AuthErrorKind::UnexpectedResponse(_))
    }

    /// Neither an ambient identity nor a credential file is available. This
    /// is terminal, as opposed to a transient failure.
    pub fn is_cannot_authenticate(&self) -> bool {
        matches!(self.0, AuthErrorKind::CannotAuthenticate)
    }

    /// Returns `true` if the operation that produced this error might
    /// succeed upon retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self.0, AuthErrorKind::Transport(_))
    }

    /// The HTTP status reported by the remote service, when the failure was
    /// a service-level denial.
    pub fn http_status(&self) -> Option<StatusCode> {
        match &self.0 {
            AuthErrorKind::SigningDenied { status, .. }
            | AuthErrorKind::TokenExchangeRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The verbatim error payload reported by the remote service, when the
    /// failure was a service-level denial.
    pub fn error_payload(&self) -> Option<&str> {
        match &self.0 {
            AuthErrorKind::SigningDenied { body, .. }
            | AuthErrorKind::TokenExchangeRejected { body, .. } => Some(body),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument<T: Into<String>>(message: T) -> Self {
        Self(AuthErrorKind::InvalidArgument(message.into()))
    }

    pub(crate) fn no_ambient_identity<T: Into<BoxError>>(source: T) -> Self {
        Self(AuthErrorKind::NoAmbientIdentity(source.into()))
    }

    pub(crate) fn signing_denied(status: StatusCode, body: String) -> Self {
        Self(AuthErrorKind::SigningDenied { status, body })
    }

    pub(crate) fn credential_file_not_found<T: Into<String>>(
        path: T,
        source: std::io::Error,
    ) -> Self {
        Self(AuthErrorKind::CredentialFileNotFound {
            path: path.into(),
            source,
        })
    }

    pub(crate) fn credential_file_malformed<T: Into<BoxError>>(source: T) -> Self {
        Self(AuthErrorKind::CredentialFileMalformed(source.into()))
    }

    pub(crate) fn signing<T: Into<BoxError>>(source: T) -> Self {
        Self(AuthErrorKind::Signing(source.into()))
    }

    pub(crate) fn exchange_rejected(status: StatusCode, body: String) -> Self {
        Self(AuthErrorKind::TokenExchangeRejected { status, body })
    }

    pub(crate) fn transport<T: Into<BoxError>>(source: T) -> Self {
        Self(AuthErrorKind::Transport(source.into()))
    }

    pub(crate) fn unexpected_response<T: Into<BoxError>>(source: T) -> Self {
        Self(AuthErrorKind::UnexpectedResponse(source.into()))
    }

    pub(crate) fn cannot_authenticate() -> Self {
        Self(AuthErrorKind::CannotAuthenticate)
    }
}

#[derive(thiserror::Error, Debug)]
enum AuthErrorKind {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no ambient identity available: {0}")]
    NoAmbientIdentity(#[source] BoxError),
    #[error("signing request denied with status {status}: {body}")]
    SigningDenied { status: StatusCode, body: String },
    #[error("credential file {path} not found")]
    CredentialFileNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed credential file: {0}")]
    CredentialFileMalformed(#[source] BoxError),
    #[error("failed to sign assertion: {0}")]
    Signing(#[source] BoxError),
    #[error("token endpoint rejected the assertion with status {status}: {body}")]
    TokenExchangeRejected { status: StatusCode, body: String },
    #[error("transient network error: {0}")]
    Transport(#[source] BoxError),
    #[error("unexpected response from service: {0}")]
    UnexpectedResponse(#[source] BoxError),
    #[error("cannot authenticate: no ambient identity and no credential file configured")]
    CannotAuthenticate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn invalid_argument() {
        let e = AuthError::invalid_argument("scopes must not be empty");
        assert!(e.is_invalid_argument(), "{e}");
        assert!(!e.is_retryable(), "{e}");
        assert!(e.to_string().contains("scopes must not be empty"), "{e}");
    }

    #[test]
    fn signing_denied_preserves_payload() {
        let e = AuthError::signing_denied(
            StatusCode::FORBIDDEN,
            r#"{"error":"permission denied"}"#.to_string(),
        );
        assert!(e.is_signing_denied(), "{e}");
        assert_eq!(e.http_status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(e.error_payload(), Some(r#"{"error":"permission denied"}"#));
        assert!(e.to_string().contains("permission denied"), "{e}");
    }

    #[test]
    fn exchange_rejected_preserves_payload() {
        let e = AuthError::exchange_rejected(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant"}"#.to_string(),
        );
        assert!(e.is_exchange_rejected(), "{e}");
        assert_eq!(e.http_status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(e.error_payload(), Some(r#"{"error":"invalid_grant"}"#));
        assert!(e.to_string().contains("invalid_grant"), "{e}");
    }

    #[test]
    fn file_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let e = AuthError::credential_file_not_found("/tmp/key.json", io);
        assert!(e.is_credential_file_not_found(), "{e}");
        assert!(e.to_string().contains("/tmp/key.json"), "{e}");
        assert!(std::error::Error::source(&e).is_some(), "{e}");

        let e = AuthError::credential_file_malformed("missing client_email");
        assert!(e.is_credential_file_malformed(), "{e}");
        assert!(!e.is_retryable(), "{e}");
    }

    #[test]
    fn cannot_authenticate_is_terminal() {
        let e = AuthError::cannot_authenticate();
        assert!(e.is_cannot_authenticate(), "{e}");
        assert!(!e.is_retryable(), "{e}");
        assert!(!e.is_transport(), "{e}");
        assert!(e.to_string().contains("cannot authenticate"), "{e}");
    }

    #[test_case(AuthError::transport("connection refused"), true)]
    #[test_case(AuthError::no_ambient_identity("no route to host"), false)]
    #[test_case(AuthError::signing("bad key"), false)]
    #[test_case(AuthError::unexpected_response("not json"), false)]
    fn retryable(e: AuthError, want: bool) {
        assert_eq!(e.is_retryable(), want, "{e}");
    }
}
