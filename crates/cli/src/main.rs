use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Personal book-tracking list server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load Shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            shelf_app::app::serve(&settings).await?;
        }
        Commands::Migrate => {
            let db = shelf_app::app::connect(&settings).await?;
            let registry = shelf_app::app::registry()?;
            let applied = shelf_app::app::migrate(&registry, &db).await?;
            db.close().await;
            println!("applied {applied} migration(s)");
        }
        Commands::Config => {
            println!("environment: {:?}", settings.environment);
            println!(
                "server: {}:{} (timeout {} ms)",
                settings.server.host, settings.server.port, settings.server.request_timeout_ms
            );
            println!(
                "database: max_connections={} acquire_timeout_ms={}",
                settings.database.max_connections, settings.database.acquire_timeout_ms
            );
            println!("cors: {}", settings.cors.allowed_origins.join(", "));
            println!("log format: {:?}", settings.telemetry.log_format);
        }
    }

    Ok(())
}
