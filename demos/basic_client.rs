//! Basic realtime client session.
//!
//! Demonstrates:
//! - Building a client against a WebSocket endpoint
//! - Listening to lifecycle and application events
//! - Connecting as a user and sending a chat message
//! - Graceful disconnect on Ctrl+C
//!
//! Usage:
//!   cargo run --example basic_client -- --url ws://localhost:3001/realtime --token <token>
//!   cargo run --example basic_client -- --admin --debug
//!   cargo run --example basic_client -- --no-wait

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use fintrack_realtime::{ClientType, RealtimeClient, StaticCredentials, channel};
use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "ws://localhost:3001/realtime";

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    url: String,
    token: String,
    admin: bool,
    debug: bool,
    no_wait: bool,
}

impl Args {
    /// Parse command-line arguments.
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|i| args.get(i + 1))
                .cloned()
        };

        Self {
            url: value_of("--url").unwrap_or_else(|| DEFAULT_URL.to_owned()),
            token: value_of("--token")
                .or_else(|| std::env::var("FINTRACK_ACCESS_TOKEN").ok())
                .unwrap_or_default(),
            admin: args.iter().any(|a| a == "--admin"),
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
        }
    }
}

/// Body of a `user_message` event.
#[derive(Debug, Deserialize)]
struct ChatMessage {
    text: String,
    #[serde(default)]
    sender: Option<String>,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Basic Client ===\n");

    // ========================================================================
    // Build Client
    // ========================================================================

    println!("[Setup] Building client for {}", args.url);
    let client = RealtimeClient::builder()
        .url(&args.url)
        .credentials(StaticCredentials::new(args.token.clone()))
        .reconnection_delay(Duration::from_secs(2))
        .build()
        .context("invalid client configuration")?;

    // ========================================================================
    // Listeners
    // ========================================================================

    client.on(channel::CONNECTED, |sid| println!("[Event] connected: {sid}"));
    client.on(channel::DISCONNECTED, |reason| {
        println!("[Event] disconnected: {reason}");
    });
    client.on(channel::CONNECT_ERROR, |error| println!("[Event] connect error: {error}"));
    client.on(channel::RECONNECTED, |attempt| {
        println!("[Event] reconnected after {attempt} attempt(s)");
    });
    client.on(channel::RECONNECT_FAILED, |_| println!("[Event] gave up reconnecting"));
    client.on(channel::AUTH_ERROR, |body| println!("[Event] auth error: {body}"));

    client.on_typed(channel::USER_MESSAGE, |message: ChatMessage| {
        let sender = message.sender.as_deref().unwrap_or("server");
        println!("[Chat] {sender}: {}", message.text);
    });
    client.on(channel::ADMIN_TYPING, |_| println!("[Chat] admin is typing..."));

    // ========================================================================
    // Connect
    // ========================================================================

    let role = if args.admin {
        ClientType::Admin
    } else {
        ClientType::User
    };

    println!("[Connect] Connecting as {role}...");
    let session_id = client.connect(role).await.context("connect failed")?;
    println!("          ✓ Session {session_id}\n");

    client.send(channel::TEST_CONNECTION, json!({ "timestamp": 0 }));
    client.send("chat_message", json!({ "text": "How much did I spend on groceries?" }));

    // ========================================================================
    // Wait and Disconnect
    // ========================================================================

    if args.no_wait {
        println!("[--no-wait] Skipping wait");
    } else {
        println!("Press Ctrl+C to exit...");
        tokio::signal::ctrl_c().await.ok();
    }

    client.disconnect();
    println!("\n=== Done ===");
    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
fn init_logging(debug: bool) {
    let filter = if debug {
        "fintrack_realtime=debug"
    } else {
        "fintrack_realtime=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
