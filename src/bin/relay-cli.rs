use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for a running netrelay service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay a curl command through the service
    Curl {
        /// Full command line, e.g. "curl -H 'Accept: */*' https://example.com"
        command: String,
    },
    /// Scan TCP ports on a host
    Scan {
        #[arg(long)]
        host: String,
        /// Port spec such as "22,80,8000-8010"
        #[arg(long, default_value = "")]
        ports: String,
        /// Scan every port from 1 to 65535
        #[arg(long)]
        all: bool,
        /// Per-port connect timeout in milliseconds
        #[arg(long, default_value_t = 0)]
        timeout: i64,
        /// Concurrent probes
        #[arg(long, default_value_t = 0)]
        batch_size: i64,
    },
    /// Check service status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Curl { command } => {
            client
                .post(format!("{}/cors-proxy", base))
                .json(&json!({ "curlParam": command }))
                .send()
                .await?
        }
        Commands::Scan { host, ports, all, timeout, batch_size } => {
            client
                .post(format!("{}/port-scan", base))
                .json(&json!({
                    "host": host,
                    "ports": ports,
                    "scanAll": all,
                    "timeout": timeout,
                    "batchSize": batch_size,
                }))
                .send()
                .await?
        }
        Commands::Status => client.get(format!("{}/status", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
