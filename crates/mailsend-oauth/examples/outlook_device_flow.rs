//! Example: device-code authorization against Microsoft.
//!
//! This example demonstrates how to:
//! 1. Configure the Microsoft provider for Graph `Mail.Send`
//! 2. Request a device authorization and display the user code
//! 3. Poll until the user approves on another device
//!
//! ## Prerequisites
//!
//! 1. Register an application in Azure AD:
//!    - Create a new app registration
//!    - Enable "Allow public client flows"
//!    - Note your Application (client) ID
//!
//! 2. Set environment variables:
//!    ```bash
//!    export OAUTH_CLIENT_ID="your-client-id-here"
//!    ```
//!
//! ## Running
//!
//! ```bash
//! cargo run --example outlook_device_flow
//! ```

use mailsend_oauth::{DeviceFlow, OAuthClient, Provider};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client_id =
        env::var("OAUTH_CLIENT_ID").expect("OAUTH_CLIENT_ID environment variable not set");

    println!("mailsend OAuth2 Example - Microsoft device flow");
    println!("===============================================\n");

    let provider = Provider::microsoft("organizations")?;
    println!("  Provider: {}", provider.name);
    println!("  Scopes: {:?}\n", provider.default_scopes);

    let client = OAuthClient::new(&client_id, provider);
    let flow = DeviceFlow::new(client);

    let auth = flow.request_device_authorization(None).await?;
    println!("Visit:      {}", auth.verification_uri);
    println!("Enter code: {}\n", auth.user_code);

    // Poll until the user approves on another device.
    let interval = std::time::Duration::from_secs(u64::from(auth.interval));
    let token = loop {
        match flow.poll_for_token(&auth.device_code, interval).await {
            Ok(token) => break token,
            Err(mailsend_oauth::Error::OAuth { ref error, .. })
                if error == "authorization_pending" || error == "slow_down" =>
            {
                println!("  waiting for approval...");
            }
            Err(e) => return Err(e.into()),
        }
    };

    println!("Authorized!");
    println!("  Token type: {}", token.token_type);
    if let Some(expires_at) = token.expires_at {
        println!("  Expires at: {expires_at}");
    }
    println!("  Refresh token present: {}", token.refresh_token.is_some());

    Ok(())
}
