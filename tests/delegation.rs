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

//! End-to-end acquisition against stub HTTP servers: the full remote
//! (metadata service + signBlob) path, the local key file path, and the
//! terminal no-credential condition.

use base64::{Engine, prelude::BASE64_STANDARD};
use google_delegated_auth::credentials::{Builder, CREDENTIALS_FILE_ENV_VAR};
use httptest::{Expectation, Server, matchers::*, responders::*};
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use scoped_env::ScopedEnv;
use serde_json::json;
use serial_test::{parallel, serial};

type TestResult = anyhow::Result<()>;

const MDS_DEFAULT_URI: &str = "/computeMetadata/v1/instance/service-accounts/default";

// A JWT-bearer exchange body carrying a three-segment, URL-safe assertion.
const ASSERTION_BODY: &str = concat!(
    r#""grant_type":"urn:ietf:params:oauth:grant-type:jwt-bearer""#,
    r#".*"assertion":"[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+""#,
);

fn scopes(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
#[parallel]
async fn remote_path_end_to_end() -> TestResult {
    let server = Server::run();

    // Availability probe.
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/"),
            request::headers(contains(("metadata-flavor", "Google"))),
        ])
        .respond_with(status_code(200)),
    );
    // Ambient identity: resolved for the `iss` claim and the signBlob URL.
    server.expect(
        Expectation::matching(request::method_path(
            "GET",
            format!("{MDS_DEFAULT_URI}/email"),
        ))
        .times(1..)
        .respond_with(status_code(200).body("ambient-sa@test-project.iam.gserviceaccount.com")),
    );
    // The signing credential requests only the IAM scope, not the scopes of
    // the final token.
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", format!("{MDS_DEFAULT_URI}/token")),
            request::query(url_decoded(contains((
                "scopes",
                "https://www.googleapis.com/auth/iam".to_string()
            )))),
        ])
        .respond_with(json_encoded(json!({
            "access_token": "mds-token",
            "expires_in": 600,
            "token_type": "Bearer",
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path(
                "POST",
                "/v1/projects/-/serviceAccounts/ambient-sa@test-project.iam.gserviceaccount.com:signBlob"
            ),
            request::headers(contains(("authorization", "Bearer mds-token"))),
        ])
        .respond_with(json_encoded(json!({
            "signedBlob": BASE64_STANDARD.encode("remote-signature"),
        }))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/oauth2/token"),
            request::body(matches(ASSERTION_BODY)),
        ])
        .respond_with(json_encoded(json!({
            "access_token": "tok123",
            "token_type": "Bearer",
            "expires_in": 3600,
        }))),
    );

    let endpoint = server.url("").to_string().trim_end_matches('/').to_string();
    let credentials = Builder::new()
        .mds_endpoint(endpoint.clone())
        .iam_endpoint(endpoint)
        .token_uri(server.url("/oauth2/token").to_string())
        .build()
        .await?;

    let token = credentials
        .access_token("alice@example.com", &scopes(&["https://mail.google.com"]))
        .await?;
    assert_eq!(token.token, "tok123");
    assert_eq!(token.token_type, "Bearer");
    assert!(token.expires_at.is_some());
    Ok(())
}

fn write_key_file(client_email: &str) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048)?
        .to_pkcs8_pem(LineEnding::LF)?
        .to_string();
    let file = tempfile::NamedTempFile::new()?;
    serde_json::to_writer(
        &file,
        &json!({
            "type": "service_account",
            "client_email": client_email,
            "private_key_id": "test-private-key-id",
            "private_key": private_key,
            "project_id": "test-project",
        }),
    )?;
    Ok(file)
}

#[tokio::test]
#[parallel]
async fn local_key_path_end_to_end() -> TestResult {
    let key_file = write_key_file("local-sa@test-project.iam.gserviceaccount.com")?;

    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/oauth2/token"),
            request::headers(contains(("content-type", "application/json"))),
            request::body(matches(ASSERTION_BODY)),
        ])
        .respond_with(json_encoded(json!({
            "access_token": "tok123",
            "token_type": "Bearer",
            "expires_in": 3600,
        }))),
    );

    // Nothing listens on port 1: the ambient probe fails fast and detection
    // falls back to the key file.
    let credentials = Builder::new()
        .mds_endpoint("http://127.0.0.1:1")
        .credentials_file(key_file.path())
        .token_uri(server.url("/oauth2/token").to_string())
        .build()
        .await?;

    let token = credentials
        .access_token("alice@example.com", &scopes(&["https://mail.google.com"]))
        .await?;
    assert_eq!(token.token, "tok123");
    assert_eq!(token.token_type, "Bearer");
    Ok(())
}

#[tokio::test]
#[parallel]
async fn rejected_assertion_surfaces_endpoint_error() -> TestResult {
    let key_file = write_key_file("local-sa@test-project.iam.gserviceaccount.com")?;

    let response_body = r#"{"error":"invalid_grant","error_description":"Not authorized"}"#;
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/oauth2/token"))
            .respond_with(status_code(400).body(response_body)),
    );

    let credentials = Builder::new()
        .mds_endpoint("http://127.0.0.1:1")
        .credentials_file(key_file.path())
        .token_uri(server.url("/oauth2/token").to_string())
        .build()
        .await?;

    let err = credentials
        .access_token("alice@example.com", &scopes(&["https://mail.google.com"]))
        .await
        .unwrap_err();
    assert!(err.is_exchange_rejected(), "{err}");
    assert_eq!(err.http_status(), Some(http::StatusCode::BAD_REQUEST));
    assert_eq!(err.error_payload(), Some(response_body));
    Ok(())
}

#[tokio::test]
#[serial]
async fn no_credentials_is_terminal_without_network() {
    let _e = ScopedEnv::remove(CREDENTIALS_FILE_ENV_VAR);
    let err = Builder::new()
        .mds_endpoint("http://127.0.0.1:1")
        .build()
        .await
        .unwrap_err();
    assert!(err.is_cannot_authenticate(), "{err}");
    assert!(!err.is_retryable(), "{err}");
}
