use std::sync::Arc;

use clap::Parser;
use learnhub::{
    config::AppConfig,
    db,
    seed::{seed_admin, SeedOutcome, ADMIN_EMAIL, ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD},
    users::{
        repo::{PgUserRepository, UserRepository},
        services::DefaultUserService,
    },
};

#[derive(Parser)]
#[command(name = "migrate", about = "Create the schema and seed the admin account")]
struct Cli {
    /// Password for the admin account; only used when it is first created
    #[arg(long, default_value = DEFAULT_ADMIN_PASSWORD)]
    admin_password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    learnhub::init_tracing(config.server.is_release());

    let pool = db::connect(&config.database).await?;

    tracing::info!("running migrations");
    db::run_migrations(&pool).await?;
    tracing::info!("schema up to date");

    let repo = Arc::new(PgUserRepository::new(pool.clone())) as Arc<dyn UserRepository>;
    let users = DefaultUserService::new(repo);
    let seeded = seed_admin(&users, &cli.admin_password).await;
    pool.close().await;

    match seeded? {
        SeedOutcome::Created(user) => {
            tracing::info!(user_id = user.id, username = ADMIN_USERNAME, email = ADMIN_EMAIL, "admin account ready");
        }
        SeedOutcome::AlreadyExists => {
            tracing::info!(username = ADMIN_USERNAME, "admin account untouched");
        }
    }
    Ok(())
}
