use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Bookshelf operator CLI
#[derive(Parser)]
#[command(name = "bookshelf-cli")]
#[command(about = "Run and administer the bookshelf REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port override (takes precedence over configuration)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending schema migrations and exit
    Migrate,
    /// Print the effective configuration as JSON and exit
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().context("failed to load bookshelf settings")?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookshelf_telemetry::init(&settings.log)?;
            bookshelf_app::run(settings).await
        }
        Commands::Migrate => {
            bookshelf_telemetry::init(&settings.log)?;
            bookshelf_app::migrate(&settings).await
        }
        Commands::Config => {
            settings.database.url = settings.database.redacted_url();
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
    }
}
