//! Example: build a message and capture it with the dry-run backend.
//!
//! No network access or credentials needed; the message lands as a
//! `.eml` file (plus JSON metadata) in a local directory.
//!
//! ## Running
//!
//! ```bash
//! cargo run --example send_dry_run
//! ```

use mailsend::{Backend, EmailClient, MessageBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let out_dir = std::env::temp_dir().join("mailsend-example");
    let client = EmailClient::with_config_dir(std::env::temp_dir().join("mailsend-example-cfg"))
        .backend(Backend::DryRun)
        .dry_run_dir(&out_dir);

    let message = MessageBuilder::new()
        .from("Example Sender <sender@example.com>")?
        .to("recipient@example.com")?
        .cc("watcher@example.com")?
        .subject("Dry-run demo")
        .text_body("This message was captured locally, not sent.")
        .html_body("<p>This message was <b>captured locally</b>, not sent.</p>")
        .build()?;

    client.send(&message).await?;
    println!("Captured message under {}", out_dir.display());
    Ok(())
}
