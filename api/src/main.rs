use std::net::SocketAddr;
use std::process::ExitCode;

use groupware_api::app::build_app;
use groupware_api::config::{Config, ConfigError, Environment, dotenv_failure};
use groupware_api::shutdown::{self, Outcome};
use groupware_api::state::AppState;
use groupware_core::Translations;
use groupware_core::i18n::I18nError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load translations: {0}")]
    I18n(#[from] I18nError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present (dev only)
    let dotenv = dotenvy::dotenv();

    let config = Config::from_env();
    init_tracing(
        config
            .as_ref()
            .map(|config| config.environment)
            .unwrap_or(Environment::Production),
    );
    if let Some(err) = dotenv_failure(dotenv) {
        tracing::warn!(error = %err, "Ignoring unreadable .env file");
    }

    let result = match config {
        Ok(config) => run(config).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server stopped with an error");
            ExitCode::FAILURE
        }
    }
}

/// Pretty output in development, structured JSON everywhere else.
fn init_tracing(environment: Environment) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "groupware_api=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_development() {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    let translations = match &config.locales_dir {
        Some(dir) => Translations::load_dir(dir, &config.default_locale)?,
        None => Translations::embedded(&config.default_locale)?,
    };
    tracing::info!(
        languages = ?translations.languages(),
        default = translations.default_language(),
        "Translations loaded"
    );

    let host = config.host.clone();
    let port = config.port;
    let environment = config.environment;
    let grace = config.shutdown_timeout;
    let app = build_app(AppState::new(config, translations))?;

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, ?environment, "Groupware API listening");
    if environment.is_development() {
        tracing::info!("API docs available at http://{addr}/api-docs");
    }

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel();
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown::signal().await;
        tracing::info!(?grace, "Shutdown signal received, draining connections");
        let _ = signalled_tx.send(());
    });

    match shutdown::drain(server, signalled_rx, grace, shutdown::signal()).await? {
        Outcome::Drained => tracing::info!("Server stopped"),
        Outcome::TimedOut => tracing::warn!("Connections still open after grace period, exiting"),
        Outcome::Forced => tracing::warn!("Second shutdown signal received, exiting"),
    }
    Ok(())
}
