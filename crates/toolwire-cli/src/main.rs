use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use toolwire_client::{ClientConfig, HealthStatus, ToolClient};

mod call_cmd;

#[derive(Parser)]
#[command(name = "toolwire", about = "Toolwire CLI - call tools over SSE-backed channels")]
struct Cli {
    /// Tool server URL
    #[arg(long, env = "TOOLWIRE_URL", default_value = toolwire_client::config::DEFAULT_BASE_URL)]
    url: String,

    /// Seconds to wait for a response after the request is accepted
    #[arg(long, env = "TOOLWIRE_RESPONSE_TIMEOUT_SECS", default_value_t = 30)]
    response_timeout: u64,

    /// Seconds to wait for a channel to announce its session
    #[arg(long, env = "TOOLWIRE_ESTABLISH_TIMEOUT_SECS", default_value_t = 10)]
    establish_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a tool on a channel and print its output
    Call {
        /// Channel the tool lives on (e.g. dex, bridge)
        channel: String,

        /// Tool name (e.g. `GET_TOKENS`)
        tool: String,

        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },

    /// List the tools a channel offers
    Tools {
        /// Channel to query
        channel: String,
    },

    /// Check whether the tool server is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ClientConfig::new(&cli.url)
        .with_response_timeout(Duration::from_secs(cli.response_timeout))
        .with_establish_timeout(Duration::from_secs(cli.establish_timeout));
    let client = ToolClient::new(config);

    let outcome = match cli.command {
        Commands::Call {
            channel,
            tool,
            args,
        } => call_cmd::run(&client, &channel, &tool, &args).await,
        Commands::Tools { channel } => call_cmd::list(&client, &channel).await,
        Commands::Health => {
            let status = client.check_health().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if matches!(status, HealthStatus::Connected) {
                Ok(())
            } else {
                Err(call_cmd::Failed)
            }
        }
    };

    client.shutdown().await;

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
