//! `donorhub` command-line client.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use donorhub_auth::{nav_items, select_view};
use donorhub_client::{
    AppState, AuthError, ClientConfig, Navigation, ProfileUpdate, RegisterForm, UserQuery,
    landing_for,
};
use donorhub_core::{Role, UserId};

#[derive(Parser, Debug)]
#[command(name = "donorhub")]
#[command(version, about = "DonorHub client", long_about = None)]
struct Cli {
    /// Backend base URL (defaults to DONORHUB_API_URL or http://localhost:5001/api)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Session database file
    #[arg(long, global = true)]
    session_db: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Keep the session in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(long, env = "DONORHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        phone: String,

        #[arg(long, default_value = "donor")]
        role: Role,

        #[arg(long)]
        organization: Option<String>,

        #[arg(long, env = "DONORHUB_PASSWORD", hide_env_values = true)]
        password: String,

        /// Defaults to the password when omitted
        #[arg(long, env = "DONORHUB_PASSWORD_CONFIRMATION", hide_env_values = true)]
        confirm_password: Option<String>,
    },

    /// Update fields of the signed-in profile
    UpdateProfile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        organization: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the current session
    Whoami,

    /// Resolve a navigation target against the current session
    Nav { path: String },

    /// Show the role-specific dashboard
    Dashboard,

    /// Administrator operations
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    /// Platform totals
    Stats,

    /// List users
    Users {
        #[arg(long, default_value = "1")]
        page: u32,

        #[arg(long, default_value = "20")]
        per_page: u32,

        #[arg(short, long, default_value = "")]
        query: String,
    },

    /// Change a user's role
    SetRole { user_id: UserId, role: Role },

    /// Delete a user
    DeleteUser { user_id: UserId },

    /// Recent system reports
    Reports {
        #[arg(short = 'n', long, default_value = "50")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    donorhub_observability::init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let state = if cli.ephemeral {
        AppState::ephemeral(&config).await?
    } else {
        AppState::open(&config).await?
    };

    match cli.command {
        Commands::Login { email, password } => {
            let identity = state.gateway.login(&email, &password).await.map_err(auth_failure)?;
            print_json(&json!({ "user": identity, "landing": landing_for(&identity) }))?;
        }
        Commands::Register {
            name,
            email,
            phone,
            role,
            organization,
            password,
            confirm_password,
        } => {
            let form = RegisterForm {
                name,
                email,
                phone,
                role,
                organization,
                password_confirmation: confirm_password.unwrap_or_else(|| password.clone()),
                password,
            };
            let identity = state.gateway.register(&form).await.map_err(auth_failure)?;
            print_json(&json!({ "user": identity, "landing": landing_for(&identity) }))?;
        }
        Commands::UpdateProfile {
            name,
            email,
            phone,
            organization,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                phone,
                address: None,
                organization,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update");
            }
            let identity = state.gateway.update_profile(&update).await.map_err(auth_failure)?;
            print_json(&json!({ "user": identity }))?;
        }
        Commands::Logout => {
            state.gateway.logout().await;
            print_json(&json!({ "authenticated": false }))?;
        }
        Commands::Whoami => {
            let session = state.session.current();
            print_json(&json!({
                "authenticated": session.is_authenticated(),
                "user": session.identity(),
                "nav": nav_items(session.role()),
            }))?;
        }
        Commands::Nav { path } => match state.navigator.navigate(&path) {
            Navigation::Render(route) => {
                print_json(&json!({ "render": route.path, "page": format!("{:?}", route.page) }))?
            }
            Navigation::Redirect(target) => print_json(&json!({ "redirect": target }))?,
        },
        Commands::Dashboard => {
            let role = state.session.current().role();
            let data = state
                .dashboard
                .counts()
                .await
                .context("failed to load dashboard data")?;
            print_json(&json!({
                "view": select_view(role, &data.counts),
                "recentActivity": data.recent_activity,
            }))?;
        }
        Commands::Admin(command) => run_admin(&state, command).await?,
    }

    Ok(())
}

async fn run_admin(state: &AppState, command: AdminCommands) -> Result<()> {
    match command {
        AdminCommands::Stats => {
            let stats = state.admin.stats().await.context("failed to load stats")?;
            print_json(&stats)
        }
        AdminCommands::Users {
            page,
            per_page,
            query,
        } => {
            let users = state
                .admin
                .users(&UserQuery {
                    page,
                    per_page,
                    q: query,
                })
                .await
                .context("failed to list users")?;
            print_json(&users)
        }
        AdminCommands::SetRole { user_id, role } => {
            state
                .admin
                .update_user_role(&user_id, role)
                .await
                .with_context(|| format!("failed to change role of {user_id}"))?;
            print_json(&json!({ "id": user_id, "role": role }))
        }
        AdminCommands::DeleteUser { user_id } => {
            state
                .admin
                .delete_user(&user_id)
                .await
                .with_context(|| format!("failed to delete {user_id}"))?;
            print_json(&json!({ "deleted": user_id }))
        }
        AdminCommands::Reports { limit } => {
            let reports = state.admin.reports(limit).await.context("failed to load reports")?;
            print_json(&reports)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config = ClientConfig::new(url.clone(), config.session_db_path.clone())
            .with_timeout(config.request_timeout);
    }
    if let Some(path) = &cli.session_db {
        config.session_db_path = path.clone();
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            anyhow::bail!("--timeout must be greater than zero");
        }
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn auth_failure(err: AuthError) -> anyhow::Error {
    tracing::debug!(error = %err, "auth operation failed");
    anyhow::anyhow!(err.user_message())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}
