//! Waxx CLI
//!
//! Look up devices and brands against the Waxx verification API, or print
//! the signed headers for a request.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waxx_core::api::WaxxClient;
use waxx_core::config::Config;
use waxx_core::device_id::{is_separated_serial, normalize_serial};
use waxx_core::signing::{RequestParams, RequestSigner};

#[derive(Debug, Parser)]
#[command(name = "waxx", version, about = "Waxx device verification client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch device info for a device ID or tag serial number
    Device {
        /// Device ID; a separated tag serial (`04:a1:b2`) is normalized
        id: String,
    },
    /// List all brands
    Brands,
    /// Print the signed headers for a GET request
    Sign {
        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Use this timestamp instead of the current time
        #[arg(long, requires = "nonce")]
        timestamp: Option<String>,
        /// Use this nonce instead of a random one
        #[arg(long, requires = "timestamp")]
        nonce: Option<String>,
    },
    /// Send a signed JSON POST to an endpoint
    Post {
        endpoint: String,
        /// JSON request body
        body: String,
    },
}

/// Device ID to query for a command-line argument. Separated tag serials are
/// normalized like scanned serials; anything else is sent as given.
fn device_mac_from_arg(raw: &str) -> String {
    let id = raw.trim();
    if is_separated_serial(id) {
        normalize_serial(id)
    } else {
        id.to_string()
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waxx=info,waxx_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Device { id } => {
            let device_mac = device_mac_from_arg(&id);
            if device_mac.is_empty() {
                bail!("Device ID is empty");
            }
            info!(device_mac = %device_mac, "Fetching device info");
            let client = WaxxClient::from_config(config)?;
            let info = client.get_device_info(&device_mac).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Command::Brands => {
            let client = WaxxClient::from_config(config)?;
            let brands = client.get_all_brands().await?;
            for brand in &brands {
                println!(
                    "{}\t{}\t{}",
                    brand.brand_id,
                    brand.name().unwrap_or("(unnamed)"),
                    brand.website().unwrap_or("")
                );
            }
        }
        Command::Sign {
            params,
            timestamp,
            nonce,
        } => {
            let signer = RequestSigner::new(config.credential);
            let params: RequestParams = params.into_iter().collect();
            let headers = match (timestamp, nonce) {
                (Some(timestamp), Some(nonce)) => signer.sign_with(timestamp, nonce, &params)?,
                _ => signer.sign(&params)?,
            };
            if !params.is_empty() {
                println!("?{}", params.to_query_string());
            }
            for (name, value) in headers.into_pairs() {
                println!("{}: {}", name, value);
            }
        }
        Command::Post { endpoint, body } => {
            let body: serde_json::Value =
                serde_json::from_str(&body).context("Request body is not valid JSON")?;
            let client = WaxxClient::from_config(config)?;
            let response: waxx_core::types::ApiResponse<serde_json::Value> =
                client.post_signed(&endpoint, &body).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
