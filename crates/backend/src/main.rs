use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gatehouse::auth::{CredentialHasher, TokenService};
use gatehouse::config::AppConfig;
use gatehouse::routes::build_router;
use gatehouse::store::{establish_connection_pool, IdentityStore, PgStore};
use gatehouse::AppState;
use gatehouse_types::Role;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "User management and session authentication server")]
struct Cli {
    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Give an existing account the admin role
    ///
    /// Registration always creates plain users, so this is how the first
    /// administrator is made.
    GrantAdmin {
        /// Email of the account to promote
        #[arg(long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let pool = establish_connection_pool(&cli.database_url)?;
    let store = Arc::new(PgStore::new(pool));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(store).await,
        Command::GrantAdmin { email } => grant_admin(store.as_ref(), &email).await,
    }
}

async fn serve(store: Arc<PgStore>) -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!("Starting gatehouse with {:?}", config);

    let tokens = TokenService::from_settings(&config.auth).context("Invalid token keys")?;
    let hasher = CredentialHasher::new(config.hasher).context("Invalid Argon2 parameters")?;

    let state = AppState::new(
        store.clone(),
        store,
        Arc::new(tokens),
        Arc::new(hasher),
        config.cookies,
    );
    let app = build_router(state, config.client_origin.as_deref());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn grant_admin(store: &dyn IdentityStore, email: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    let mut identity = store
        .find_by_email(&email)
        .await?
        .with_context(|| format!("No account registered for {}", email))?;

    if identity.role == Role::Admin {
        tracing::info!("{} is already an admin", email);
        return Ok(());
    }

    identity.role = Role::Admin;
    identity.updated_at = chrono::Utc::now();
    store.update(identity).await?;

    tracing::info!("Granted admin role to {}", email);
    Ok(())
}
