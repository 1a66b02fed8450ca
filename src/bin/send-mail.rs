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

//! Sends one message through the Gmail API with a delegated token.
//!
//! Usage: `send-mail <sender> <recipient>`

use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use google_delegated_auth::credentials::Builder;

const MAIL_SCOPE: &str = "https://mail.google.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(sender), Some(recipient)) = (args.next(), args.next()) else {
        eprintln!("usage: send-mail <sender> <recipient>");
        std::process::exit(1);
    };

    let credentials = Builder::new().build().await?;
    let client = credentials
        .authenticated_client(&sender, &[MAIL_SCOPE.to_string()])
        .await?;

    let message = format!(
        "From: {sender}\r\nTo: {recipient}\r\nSubject: Delegated send test\r\n\r\n\
         Sent with a domain-wide delegation token.\r\n"
    );
    let url = format!("https://gmail.googleapis.com/gmail/v1/users/{sender}/messages/send");
    let sent: serde_json::Value = client
        .request(reqwest::Method::POST, url)
        .json(&serde_json::json!({ "raw": BASE64_URL_SAFE_NO_PAD.encode(message) }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    println!("message sent: id {}", sent["id"]);
    Ok(())
}
