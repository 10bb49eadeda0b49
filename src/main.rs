use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use spy_cat_agency::config::SpyCatConfig;
use spy_cat_agency::shutdown::shutdown_signal;
use spy_cat_agency::{init_telemetry, shutdown_telemetry, Application, DatabaseManager};

#[derive(Parser)]
#[command(name = "spy-cat-agency")]
#[command(version)]
#[command(about = "REST service managing spy cats, their missions and targets")]
#[command(long_about = "Spy Cat Agency keeps track of field agents (cats), the missions they are \
                       assigned to and the targets of each mission. Configuration is read from \
                       spy-cat.toml, .spy-cat-rc and SPY_CAT_* environment variables.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Interface to bind
        #[arg(long, help = "Override server.host from configuration")]
        host: Option<String>,
        /// Port to bind
        #[arg(long, help = "Override server.port from configuration")]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    SpyCatConfig::load_env_file()?;
    let mut config = SpyCatConfig::load()?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            tokio::runtime::Runtime::new()?.block_on(async { serve_command(config).await })
        }
        Commands::Migrate => {
            tokio::runtime::Runtime::new()?.block_on(async { migrate_command(config).await })
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn serve_command(config: SpyCatConfig) -> Result<()> {
    init_telemetry(&config.observability)?;

    let app = Application::build(&config).await?;
    let listener = TcpListener::bind(config.bind_address()).await?;
    app.serve(listener, shutdown_signal()).await?;

    shutdown_telemetry();
    Ok(())
}

async fn migrate_command(mut config: SpyCatConfig) -> Result<()> {
    init_telemetry(&config.observability)?;

    config.database.auto_migrate = false;
    let database = DatabaseManager::new(&config.database).await?;
    database.migrate().await?;
    database.shutdown().await;

    println!("Migrations applied to {}", config.database.url);
    Ok(())
}
