use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use sn_core::db::Database;
use sn_moderation::{accounts, punishments, Role};

#[derive(Parser)]
#[command(name = "sn", version, about = "Social node moderation services")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    UserApi,
    AdminApi,
    Migrate,
    Moderator {
        #[command(subcommand)]
        command: ModeratorCommand,
    },
    Punishments {
        #[command(subcommand)]
        command: PunishmentsCommand,
    },
}

#[derive(Subcommand)]
enum ModeratorCommand {
    /// Creates the first admin account. Does nothing once an admin exists.
    Bootstrap {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SN_BOOTSTRAP_PASSWORD")]
        password: String,
    },
    Promote {
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "moderator")]
        role: Role,
    },
}

#[derive(Subcommand)]
enum PunishmentsCommand {
    /// Lifts every punishment whose expiry has passed.
    Expire,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::UserApi => {
            let config = sn_user_api::load_config()?;
            sn_user_api::run(config).await?;
        }
        Commands::AdminApi => {
            let config = sn_admin_api::load_config()?;
            sn_admin_api::run(config).await?;
        }
        Commands::Migrate => {
            sn_core::logging::init("sn-cli");
            let database_url = sn_core::config::required_env("DATABASE_URL")?;
            let pool = sn_core::db::connect(&database_url).await?;
            sn_core::migrations::run(&pool).await?;
            tracing::info!("migrations applied");
        }
        Commands::Moderator { command } => {
            sn_core::logging::init("sn-cli");
            let db = open_database().await?;
            match command {
                ModeratorCommand::Bootstrap { username, password } => {
                    if accounts::count_with_role(&db, Role::Admin).await? > 0 {
                        tracing::info!("admin account already exists");
                    } else {
                        let account =
                            accounts::create_account(&db, &username, &password, Role::Admin)
                                .await?;
                        tracing::info!(account_id = %account.account_id, "admin account created");
                    }
                }
                ModeratorCommand::Promote { username, role } => {
                    let account = accounts::find_by_username(&db, &username)
                        .await?
                        .ok_or_else(|| anyhow!("account not found: {username}"))?;
                    let account = accounts::set_role(
                        &db,
                        sn_moderation::SYSTEM_ACTOR,
                        &account.account_id,
                        role,
                    )
                    .await?;
                    tracing::info!(
                        account_id = %account.account_id,
                        role = account.role.as_str(),
                        "account role updated"
                    );
                }
            }
        }
        Commands::Punishments { command } => {
            sn_core::logging::init("sn-cli");
            let db = open_database().await?;
            match command {
                PunishmentsCommand::Expire => {
                    let now = chrono::Utc::now().timestamp();
                    let expired = punishments::expire_punishments(&db, now).await?;
                    tracing::info!(expired, "expired punishments lifted");
                }
            }
        }
    }

    Ok(())
}

async fn open_database() -> Result<Database> {
    let database_url = sn_core::config::required_env("DATABASE_URL")?;
    let pool = sn_core::db::connect(&database_url).await?;
    Ok(Database::new(pool))
}
