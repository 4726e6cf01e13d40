use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio::auth::TokenGenerator;
use folio::config::ServerConfig;
use folio::error::Error;
use folio::server::validation::validate_username;
use folio::server::{AppState, create_router};
use folio::store::{SqliteStore, Store};

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "A hierarchical document repository server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and folio.toml
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and superuser token)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Name of the superuser to create
        #[arg(long, default_value = "admin")]
        username: String,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print a token for it
    Add {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        #[arg(long)]
        username: String,

        /// Grant superuser rights
        #[arg(long)]
        superuser: bool,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let store = SqliteStore::new(config.db_path())
        .with_context(|| format!("failed to open {}", config.db_path().display()))?;
    store.initialize()?;
    Ok(store)
}

fn run_init(data_dir: PathBuf, username: &str) -> anyhow::Result<()> {
    validate_username(username).map_err(anyhow::Error::msg)?;

    fs::create_dir_all(&data_dir)?;
    let config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    let store = open_store(&config)?;

    let token_file = config.admin_token_path();
    if store.has_superuser()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let user = store.create_user(username, true)?;
    let issued = TokenGenerator::new()?.issue_stored(&store, user.id, None)?;

    fs::write(&token_file, &issued.raw)?;
    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Superuser '{username}' token (save this, it won't be shown again):");
    println!();
    println!("  {}", issued.raw);
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    Ok(())
}

fn run_user_add(data_dir: PathBuf, username: &str, superuser: bool) -> anyhow::Result<()> {
    validate_username(username).map_err(anyhow::Error::msg)?;

    let config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    if !config.db_path().exists() {
        bail!("Server not initialized. Run 'folio admin init' first.");
    }
    let store = open_store(&config)?;

    let user = match store.create_user(username, superuser) {
        Ok(user) => user,
        Err(Error::AlreadyExists) => bail!("User '{username}' already exists"),
        Err(e) => return Err(e.into()),
    };
    let issued = TokenGenerator::new()?.issue_stored(&store, user.id, None)?;

    println!("Created user '{}' (id {}) with token:", user.username, user.id);
    println!();
    println!("  {}", issued.raw);

    Ok(())
}

async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    data_dir: PathBuf,
) -> anyhow::Result<()> {
    let mut config = ServerConfig {
        data_dir,
        ..Default::default()
    };
    config.merge_file()?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    if !config.db_path().exists() {
        bail!(
            "Server not initialized. Run 'folio admin init' first to create the database and admin token."
        );
    }
    let store = open_store(&config)?;
    if !store.has_superuser()? {
        bail!(
            "Server not initialized. Run 'folio admin init' first to create the database and admin token."
        );
    }

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(Arc::new(store), config)?);
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir, username } => run_init(data_dir, &username)?,
            AdminCommands::User {
                command:
                    UserCommands::Add {
                        data_dir,
                        username,
                        superuser,
                    },
            } => run_user_add(data_dir, &username, superuser)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => run_serve(host, port, data_dir).await?,
    }

    Ok(())
}
