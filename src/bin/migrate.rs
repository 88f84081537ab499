use color_eyre::{
    Section,
    eyre::{Result, WrapErr},
};
use latchkey::{Settings, adapters::config::env::JWT_SECRET_ENV_VAR, configure_postgresql, init_tracing};

/// Apply the PostgreSQL schema migrations using the configured database.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let settings = Settings::load()
        .wrap_err("Failed to load settings")
        .suggestion(format!("Is {JWT_SECRET_ENV_VAR} set?"))?;

    configure_postgresql(&settings.postgres)
        .await
        .wrap_err("Failed to migrate PostgreSQL")?;

    tracing::info!("Database is up to date");
    Ok(())
}
