use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use fundchat::{config::Config, logging::init_logging, models::ModelType, proxy, repl::Repl};

#[derive(Parser)]
#[command(name = "fundchat", version, about = "Chat with fund documents through a hosted LLM")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the credential-injecting chat proxy.
    Serve {
        /// Address to bind, overriding the config file.
        #[arg(long)]
        listen: Option<String>,
    },
    /// Open an interactive chat session.
    Chat {
        /// Model id or label to start with.
        #[arg(long)]
        model: Option<String>,
        /// Log at the configured level instead of warnings only.
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let mut config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Command::Serve { listen } => {
            init_logging(&config.log_level);
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            proxy::serve(&config).await?;
        }
        Command::Chat { model, verbose } => {
            init_logging(if verbose { config.log_level.as_str() } else { "warn" });
            let model = model
                .map(|m| m.parse::<ModelType>())
                .transpose()
                .map_err(anyhow::Error::msg)?;
            let mut repl = Repl::connect(&config, model).await?;
            repl.run().await?;
        }
    }

    Ok(())
}
