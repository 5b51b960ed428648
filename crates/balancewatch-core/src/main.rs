//! BalanceWatch CLI
//!
//! Command-line interface for the BalanceWatch balance monitor.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use uuid::Uuid;

use balancewatch::api::{AppState, HttpServer};
use balancewatch::config::Config;
use balancewatch::db::{CredentialStore, Database, MemoryStore, SettingsStore};
use balancewatch::models::{CheckResult, CredentialInput, Exchange, SettingsInput, WalletType};
use balancewatch::monitor::{
    build_notifier, BalanceSource, CredentialSelector, HttpBalanceSource, MonitorLoop,
    SettingsProvider, TracingObserver,
};

/// BalanceWatch - Exchange wallet balance alerts
#[derive(Parser)]
#[command(name = "balancewatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "BALANCEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (for commands that support it)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor continuously and serve the HTTP API
    Serve {
        /// HTTP API port (overrides configuration)
        #[arg(long, env = "BALANCEWATCH_HTTP_PORT")]
        http_port: Option<u16>,

        /// Keep credentials and settings in memory instead of PostgreSQL
        #[arg(long)]
        memory: bool,
    },

    /// Run a single balance check
    Check,

    /// Manage exchange credentials
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommands,
    },

    /// Manage monitoring settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Database management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum CredentialsCommands {
    /// List stored credentials
    List,

    /// Store the API key for an exchange wallet
    Set {
        /// Exchange (binance, bybit, okx, bitget)
        #[arg(long)]
        exchange: Exchange,

        /// Wallet type (spot, futures, funding, margin, unified)
        #[arg(long)]
        wallet_type: WalletType,

        /// API key
        #[arg(long, env = "BALANCEWATCH_API_KEY")]
        api_key: String,

        /// Encrypted API secret
        #[arg(long, env = "BALANCEWATCH_API_SECRET", hide_env_values = true)]
        secret: String,

        /// Make this the active credential
        #[arg(long)]
        activate: bool,
    },

    /// Make a stored credential the active one
    Activate {
        /// Credential ID
        credential_id: Uuid,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show the settings in force
    Show,

    /// Replace the current settings
    Set {
        /// Seconds between checks
        #[arg(long, default_value = "60")]
        interval: i32,

        /// Balance threshold
        #[arg(long, allow_negative_numbers = true)]
        threshold: f64,

        /// Alert when the balance drops below the threshold
        #[arg(long)]
        below: bool,

        /// Alert when the balance rises above the threshold
        #[arg(long)]
        above: bool,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Serve { http_port, memory } => run_serve(config, http_port, memory).await,
        Commands::Check => run_check(config, cli.format).await,
        Commands::Credentials { command } => run_credentials(config, command, cli.format).await,
        Commands::Settings { command } => run_settings(config, command, cli.format).await,
        Commands::Db { command } => run_db(config, command).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &Config, verbose: bool) {
    let log_level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Stores the commands operate on
struct Stores {
    credentials: Arc<dyn CredentialStore>,
    settings: Arc<dyn SettingsStore>,
    selector: Arc<dyn CredentialSelector>,
    provider: Arc<dyn SettingsProvider>,
    database: Option<Database>,
}

impl Stores {
    async fn postgres(config: &Config) -> anyhow::Result<Self> {
        let db = Database::new(config)
            .await
            .context("failed to connect to the database")?;
        db.migrate().await?;

        let credentials = Arc::new(db.credentials());
        let settings = Arc::new(db.settings());
        Ok(Self {
            credentials: credentials.clone(),
            settings: settings.clone(),
            selector: credentials,
            provider: settings,
            database: Some(db),
        })
    }

    fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            credentials: store.clone(),
            settings: store.clone(),
            selector: store.clone(),
            provider: store,
            database: None,
        }
    }
}

fn build_monitor(config: &Config, stores: &Stores) -> anyhow::Result<MonitorLoop> {
    let source: Arc<dyn BalanceSource> = Arc::new(HttpBalanceSource::new(&config.balance_source)?);
    let sink = build_notifier(&config.notifier)?;

    Ok(MonitorLoop::new(
        stores.selector.clone(),
        stores.provider.clone(),
        source,
        sink,
        config.monitor.notification_cooldown_seconds,
    )
    .with_default_interval(Duration::from_secs(
        config.monitor.default_polling_interval_seconds,
    )))
}

async fn run_serve(config: Config, http_port: Option<u16>, memory: bool) -> anyhow::Result<()> {
    let stores = if memory {
        info!("Using in-memory storage; configuration is lost on exit");
        Stores::memory()
    } else {
        Stores::postgres(&config).await?
    };

    let monitor = Arc::new(build_monitor(&config, &stores)?);
    let handle = monitor.start_continuous(Arc::new(TracingObserver));

    let port = http_port.unwrap_or(config.server.http_port);
    let addr = format!("{}:{}", config.server.host, port);
    info!("Starting BalanceWatch API on {}", addr);

    let state = AppState {
        monitor,
        credentials: stores.credentials,
        settings: stores.settings,
        database: stores.database,
    };

    let shutdown = handle.cancellation_token();
    let server = HttpServer::new(state);
    let mut server_task = tokio::spawn(async move {
        server
            .serve(&addr, async move { shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("\nShutting down...");
            handle.stop().await;
            server_task.await??;
        }
        // The server exited on its own, e.g. the port was taken
        served = &mut server_task => {
            handle.stop().await;
            served??;
        }
    }

    Ok(())
}

async fn run_check(config: Config, format: OutputFormat) -> anyhow::Result<()> {
    let stores = Stores::postgres(&config).await?;
    let monitor = build_monitor(&config, &stores)?;

    let result = monitor.check_once().await?;
    print_check(&result, format)?;
    Ok(())
}

fn print_check(result: &CheckResult, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            println!("Balance:      {:.2}", result.balance);
            println!("Threshold:    {:.2}", result.threshold);
            println!("Crossing:     {:?}", result.decision);
            println!("Alert sent:   {}", if result.notification_sent { "yes" } else { "no" });
            println!("Checked at:   {}", result.timestamp.to_rfc3339());
        }
    }
    Ok(())
}

async fn run_credentials(
    config: Config,
    command: CredentialsCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let stores = Stores::postgres(&config).await?;

    match command {
        CredentialsCommands::List => {
            let credentials = stores.credentials.list().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&credentials)?),
                OutputFormat::Text => {
                    if credentials.is_empty() {
                        println!("No credentials stored");
                    }
                    for credential in credentials {
                        println!(
                            "{} {} {:<16} updated {}",
                            if credential.is_active { "*" } else { " " },
                            credential.id,
                            credential.platform.to_string(),
                            credential.updated_at.to_rfc3339()
                        );
                    }
                }
            }
        }
        CredentialsCommands::Set {
            exchange,
            wallet_type,
            api_key,
            secret,
            activate,
        } => {
            let mut credential = stores
                .credentials
                .upsert(CredentialInput {
                    exchange,
                    wallet_type,
                    api_key,
                    encrypted_secret: secret,
                })
                .await?;

            if activate {
                credential = stores.credentials.activate(credential.id).await?;
            }

            println!(
                "Stored credential {} for {}{}",
                credential.id,
                credential.platform,
                if credential.is_active { " (active)" } else { "" }
            );
        }
        CredentialsCommands::Activate { credential_id } => {
            let credential = stores.credentials.activate(credential_id).await?;
            println!("Activated {} ({})", credential.id, credential.platform);
        }
    }

    Ok(())
}

async fn run_settings(
    config: Config,
    command: SettingsCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let stores = Stores::postgres(&config).await?;

    let settings = match command {
        SettingsCommands::Show => stores.settings.resolve_current().await?,
        SettingsCommands::Set {
            interval,
            threshold,
            below,
            above,
        } => {
            stores
                .settings
                .update_or_create(SettingsInput {
                    polling_interval_seconds: interval,
                    balance_threshold: threshold,
                    notify_on_balance_below: below,
                    notify_on_balance_above: above,
                })
                .await?
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Text => {
            if settings.is_default() {
                println!("(no settings stored, showing defaults)");
            }
            println!("Polling interval: {}s", settings.polling_interval_seconds);
            println!("Threshold:        {:.2}", settings.balance_threshold);
            println!("Alert below:      {}", settings.notify_on_balance_below);
            println!("Alert above:      {}", settings.notify_on_balance_above);
        }
    }

    Ok(())
}

async fn run_db(config: Config, command: DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            let db = Database::new(&config).await?;
            db.migrate().await?;
            println!("Migrations applied");
        }
    }
    Ok(())
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "balancewatch", &mut io::stdout());
}
