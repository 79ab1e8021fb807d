//! Interactive mode for the server.
//!
//! Prompts the user for bind address and port before starting the server.

use corona_stats_source::config::AppConfig;
use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks for a bind address and port, defaulting to the values in
/// `config`, and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run(mut config: AppConfig) -> std::io::Result<()> {
    println!("Corona Stats Server");
    println!();

    config.server.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.server.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| config.server.bind_addr.clone());

    config.server.port = Input::new()
        .with_prompt("Port")
        .default(config.server.port)
        .interact_text()
        .unwrap_or(config.server.port);

    let addr = format!("{}:{}", config.server.bind_addr, config.server.port);

    if !Confirm::new()
        .with_prompt(format!("Load {} and start server on {addr}?", config.source))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config).await
}
