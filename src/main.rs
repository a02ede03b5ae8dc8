use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use pulse_cli::app::App;
use pulse_cli::cli::{Cli, Commands};
use pulse_cli::core::client::{ApiClient, DashboardApi};
use pulse_cli::core::config::Settings;
use pulse_cli::utils::{display_or_unknown, format_percent, AppConfig, UsageLevel};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        None => {
            // No command - run the interactive dashboard
            let settings = Settings::from_env();
            let api = Arc::new(ApiClient::new(&settings)?);
            let mut app = App::new(api, &settings);
            app.run().await?;
        }
        #[cfg(feature = "server")]
        Some(Commands::Serve { port, host, cors }) => {
            init_tracing();
            let settings = Settings::from_env();
            pulse_cli::server::run(host, port, cors, settings).await?;
        }
        Some(Commands::Status { url, save }) => {
            init_tracing();
            handle_status(url, save).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

async fn handle_status(url: Option<String>, save: bool) -> Result<()> {
    let mut settings = Settings::from_env();
    if let Some(url) = url {
        settings.api_base_url = url.trim_end_matches('/').to_string();
        if save {
            let mut prefs = AppConfig::load().unwrap_or_default();
            prefs.set_api_url(settings.api_base_url.clone())?;
            println!("Saved {} to {}", settings.api_base_url, AppConfig::config_path()?.display());
        }
    }

    let client = ApiClient::new(&settings)?;
    println!("Pulse Backend Status - {}\n", client.base_url());

    match client.check_health().await {
        Ok(health) => {
            let status = display_or_unknown(health.status.as_deref());
            println!("{:<14} {}", "Health", status.green());
        }
        Err(e) => {
            println!("{:<14} {}", "Health", "unreachable".red());
            println!("\n{}", e);
            return Ok(());
        }
    }

    let greeting = client.fetch_greeting().await?;
    println!(
        "{:<14} {}",
        "Backend",
        display_or_unknown(greeting.message.as_deref())
    );
    print_version_row(greeting.version.as_deref());

    let snapshot = client.fetch_snapshot().await?;
    println!(
        "{:<14} {}",
        "Host",
        display_or_unknown(snapshot.hostname.as_deref())
    );
    println!(
        "{:<14} {}",
        "Environment",
        display_or_unknown(snapshot.environment.as_deref())
    );
    print_metric_row("CPU", snapshot.cpu_percent);
    print_metric_row("Memory", snapshot.memory_percent);
    print_metric_row("Disk", snapshot.disk_percent);

    Ok(())
}

fn print_version_row(server_version: Option<&str>) {
    let client_version = env!("CARGO_PKG_VERSION");
    let matches = match server_version.and_then(|v| semver::Version::parse(v).ok()) {
        Some(server) => semver::Version::parse(client_version)
            .map(|client| client == server)
            .unwrap_or(false),
        None => false,
    };

    let rendered = display_or_unknown(server_version);
    if matches {
        println!("{:<14} {}", "Version", rendered);
    } else {
        println!(
            "{:<14} {} {}",
            "Version",
            rendered,
            format!("(client is {})", client_version).yellow()
        );
    }
}

fn print_metric_row(name: &str, value: Option<f64>) {
    let rendered = format_percent(value);
    match value.map(UsageLevel::from_percent) {
        Some(level) => {
            let colored = match level {
                UsageLevel::Normal => rendered.green(),
                UsageLevel::Elevated => rendered.yellow(),
                UsageLevel::Critical => rendered.red(),
            };
            println!("{:<14} {} ({})", name, colored, level.label());
        }
        None => println!("{:<14} {}", name, rendered.dimmed()),
    }
}
