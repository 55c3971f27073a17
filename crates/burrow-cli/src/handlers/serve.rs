//! Serve command handler.
//!
//! Starts the server, prints lifecycle events as they arrive, and stops it
//! on Ctrl+C. If the session ends on its own (crash or session limit) the
//! command returns as soon as the last event has been printed.

use std::future::Future;

use anyhow::Result;
use burrow_core::{
    EVENT_QUEUE_CAPACITY, EventKind, ServerEvent, ServerEventReceiver, ServerService,
    event_channel, validate_port,
};
use tracing::{debug, info};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Execute the serve command.
///
/// # Arguments
///
/// * `ctx` - The CLI context providing the server service
/// * `path` - Source file of the server
/// * `port` - Port override; the configured default is used when `None`
pub async fn execute(ctx: &CliContext, path: &str, port: Option<String>) -> Result<()> {
    let port = port.unwrap_or_else(|| ctx.default_port().to_string());
    let shutdown = async {
        // Failing to install the handler leaves only the session's own end
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    run(ctx.service(), path, &port, shutdown).await
}

/// Drive one session until `shutdown` resolves or the session ends.
pub async fn run(
    service: &dyn ServerService,
    path: &str,
    port: &str,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    validate_port(port).map_err(CliError::from)?;

    let (tx, rx) = event_channel(EVENT_QUEUE_CAPACITY);
    let mut printer = tokio::spawn(print_events(rx));

    if let Err(e) = service.start_server(path, port, tx).await {
        // The service dropped its sender, so the printer drains and exits
        let _ = printer.await;
        return Err(CliError::from(e).into());
    }

    println!("Serving {path} on port {port} (Press Ctrl+C to stop)");

    tokio::select! {
        () = shutdown => {
            info!("Shutdown requested");
            if let Err(e) = service.stop_server().await {
                // Lost the race against a background teardown
                debug!(error = %e, "Stop after shutdown request failed");
            }
            let _ = printer.await;
        }
        _ = &mut printer => {
            debug!("Session ended on its own");
        }
    }

    let status = service.status();
    if status.running {
        return Err(CliError::Server("server still running after shutdown".to_string()).into());
    }
    if status.status_text != burrow_core::IDLE_STATUS_TEXT {
        return Err(CliError::Server(status.status_text).into());
    }
    Ok(())
}

/// Print events until every sender is gone.
async fn print_events(mut rx: ServerEventReceiver) {
    while let Some(event) = rx.recv().await {
        print_event(&event);
    }
}

fn print_event(event: &ServerEvent) {
    match event.kind {
        EventKind::Update => println!("{}", event.message),
        EventKind::Error => eprintln!("error: {}", event.message),
    }
}
