use anyhow::Context;
use bookshelf_app::modules::books::report;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about = "Book catalogue API")]
struct Cli {
    /// Override `server.host`
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override `server.port`
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the API index as JSON
    Routes,
    /// Print the resolved configuration as JSON
    Settings,
    /// List stored books and publish-year coverage
    Check,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    cli.apply_overrides(&mut settings);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "bookshelf serve");
            bookshelf_app::run(settings).await
        }
        Command::Routes => {
            let database = settings.database.connect().await?;
            let registry = bookshelf_app::build_registry(&database)?;
            let index = bookshelf_http::router::api_index(&registry);
            println!("{}", serde_json::to_string_pretty(&index)?);
            Ok(())
        }
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Command::Check => {
            let database = settings.database.connect().await?;
            println!("Connected to {}", database.endpoint());

            let report = report::inspect(&database).await;
            database.close();
            let report = report.context("failed to read the books table")?;

            println!("{report}");
            println!("Database connection closed");
            Ok(())
        }
    }
}
