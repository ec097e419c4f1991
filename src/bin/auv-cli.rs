use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "auv-cli")]
#[command(about = "Operator CLI for the AUV simulator API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show vehicle position, velocity, attitude and controls
    Status,
    /// Set the pitch fin angle in degrees
    Pitch {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
    /// Set the yaw fin angle in degrees
    Yaw {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
    /// Set propeller throttle in percent
    Prop {
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("auv-cli/0.1"));
    let client = reqwest::Client::builder()
        .default_headers(headers)
        .build()?;

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/status", cli.url)).send().await?,
        Commands::Pitch { value } => post_value(&client, &cli.url, "pitch", value).await?,
        Commands::Yaw { value } => post_value(&client, &cli.url, "yaw", value).await?,
        Commands::Prop { value } => post_value(&client, &cli.url, "prop", value).await?,
    };
    print_response(res).await
}

async fn post_value(
    client: &reqwest::Client,
    url: &str,
    path: &str,
    value: i64,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .post(format!("{url}/{path}"))
        .json(&json!({ "value": value }))
        .send()
        .await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let body: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
