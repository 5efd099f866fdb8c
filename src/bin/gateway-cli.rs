use clap::{Parser, Subcommand};
use gateway_client::GatewayClient;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Query a running model gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "MODEL_GATEWAY_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is up
    Health,
    /// List active routes
    Routes,
    /// Show one route
    Route { name: String },
    /// Send a JSON payload to a route
    Query {
        name: String,
        /// Request body, e.g. '{"prompt": "hello"}'
        #[arg(short, long)]
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = GatewayClient::new(&cli.url);

    let output = match cli.command {
        Commands::Health => client.health().await?,
        Commands::Routes => serde_json::to_value(client.search_routes().await?)?,
        Commands::Route { name } => serde_json::to_value(client.get_route(&name).await?)?,
        Commands::Query { name, data } => {
            let payload: Value = serde_json::from_str(&data)?;
            client.query(&name, &payload).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
