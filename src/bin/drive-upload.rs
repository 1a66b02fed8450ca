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

//! Creates one file in Drive with a delegated token.
//!
//! Usage: `drive-upload <owner>`

use google_delegated_auth::credentials::Builder;
use http::header::CONTENT_TYPE;

const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(owner) = args.next() else {
        eprintln!("usage: drive-upload <owner>");
        std::process::exit(1);
    };

    let credentials = Builder::new().build().await?;
    let client = credentials
        .authenticated_client(&owner, &[DRIVE_SCOPE.to_string()])
        .await?;

    let file: serde_json::Value = client
        .request(
            reqwest::Method::POST,
            "https://www.googleapis.com/upload/drive/v3/files?uploadType=media",
        )
        .header(CONTENT_TYPE, "text/plain")
        .body("Created with a domain-wide delegation token.\n")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("file created: id {}", file["id"]);
    Ok(())
}
