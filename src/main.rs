#![cfg_attr(not(test), deny(clippy::panic))]

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use trivion::config;
use trivion::logging;
use trivion::server::TrivionServer;
use trivion::websocket;

/// Trivion -- real-time multiplayer quiz server over WebSockets
#[derive(Parser, Debug)]
#[command(name = "trivion")]
#[command(about = "A real-time multiplayer quiz server over WebSockets")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present; PORT and PUBSUB_URL
    // env vars override.
    let cfg = Arc::new(config::load());

    if cli.print_config {
        let json = serde_json::to_string_pretty(&*cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let validation_result = config::validate_config(&cfg);

    if cli.validate_config {
        match validation_result {
            Ok(()) => {
                println!("Configuration validation passed");
                println!();
                println!("Configuration summary:");
                println!("  Port: {}", cfg.port);
                println!(
                    "  Pub/sub fabric: {}",
                    cfg.pubsub_url.as_deref().unwrap_or("in-process")
                );
                println!(
                    "  Heartbeat: ping every {} s, timeout {} s",
                    cfg.server.heartbeat_interval_secs, cfg.server.heartbeat_timeout_secs
                );
                println!(
                    "  Reconnection window: {} s",
                    cfg.server.reconnect_window_secs
                );
                println!("  Countdown: {} s", cfg.game.countdown_secs);
                return Ok(());
            }
            Err(e) => {
                eprintln!("Configuration validation failed:\n{e}");
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = validation_result {
        anyhow::bail!("Invalid configuration:\n{e}");
    }

    logging::init_with_config(&cfg.logging);

    let port: u16 = cfg.port;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "Starting Trivion server");

    let server = TrivionServer::new(cfg.clone());
    server.spawn_reconnect_sweeper();

    let app = websocket::create_router(&cfg.cors_origins).with_state(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        cors_origins = %cfg.cors_origins,
        "Server started - WebSocket: /ws, Admin API: /api, Health: /health"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
