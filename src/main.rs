use std::path::PathBuf;
use std::sync::Arc;

use admin_console::config::{ClientConfig, ConfigError};
use admin_console::net::api::Resource;
use admin_console::net::http::HttpError;
use admin_console::net::types::{LogQuery, PageQuery, ProfileUpdate};
use admin_console::notify::TracingNotifier;
use admin_console::router::RouteError;
use admin_console::state::permission::PermissionError;
use admin_console::state::session::SessionError;
use admin_console::storage::FileRepository;
use admin_console::util::format::format_date_time;
use admin_console::Console;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("request failed: {0}")]
    Http(#[from] HttpError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Permission(#[from] PermissionError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("not logged in; run `admin-console login` first")]
    NotLoggedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "admin-console", about = "Admin console API client")]
struct Cli {
    /// Overrides `ADMIN_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `ADMIN_STATE_FILE`.
    #[arg(long)]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,
    },
    Logout,
    Whoami,
    Permissions,
    /// Run the navigation guard against a console path.
    Navigate {
        path: String,
    },
    Logs(LogsCommand),
    Resource(ResourceCommand),
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
struct LogsCommand {
    #[command(subcommand)]
    command: LogsSubcommand,
}

#[derive(Subcommand, Debug)]
enum LogsSubcommand {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        operation: Option<String>,
        #[arg(long)]
        status: Option<i32>,
    },
    Clear,
}

#[derive(Args, Debug)]
struct ResourceCommand {
    #[arg(value_enum)]
    kind: ResourceKind,
    #[command(subcommand)]
    command: ResourceSubcommand,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ResourceKind {
    Users,
    Roles,
    Permissions,
    Menus,
}

#[derive(Subcommand, Debug)]
enum ResourceSubcommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Update {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.base_url.as_deref() {
        config.base_url = ClientConfig::with_base_url(url)?.base_url;
    }
    if let Some(path) = cli.state_file {
        config.state_file = path;
    }

    let repo = Arc::new(FileRepository::new(config.state_file.clone()));
    let console = Console::new(&config, repo, Arc::new(TracingNotifier))?;

    match cli.command {
        Command::Login { username, password } => {
            let payload = console.session.login(&username, &password).await?;
            print_json(&json!({ "token": payload.token }))
        }
        Command::Logout => {
            console.session.logout();
            Ok(())
        }
        Command::Whoami => {
            require_login(&console)?;
            let user = console.session.fetch_current_user().await?;
            print_json(&serde_json::to_value(user)?)
        }
        Command::Permissions => {
            require_login(&console)?;
            let set = console.permissions.fetch_permissions().await?;
            print_json(&serde_json::to_value(set)?)
        }
        Command::Navigate { path } => {
            let nav = console.router.navigate(&path).await?;
            print_json(&json!({
                "location": nav.location.to_string(),
                "route": nav.route.map(|r| r.name),
                "redirected": nav.redirected,
            }))
        }
        Command::Logs(logs) => run_logs(&console, logs).await,
        Command::Resource(resource) => run_resource(&console, resource).await,
        Command::Profile(profile) => run_profile(&console, profile).await,
    }
}

fn require_login(console: &Console) -> Result<(), CliError> {
    if console.session.is_logged_in() { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

async fn run_logs(console: &Console, logs: LogsCommand) -> Result<(), CliError> {
    require_login(console)?;
    match logs.command {
        LogsSubcommand::List { page, page_size, username, module, operation, status } => {
            let query = LogQuery {
                page: Some(page),
                page_size: Some(page_size),
                username,
                module,
                operation,
                status,
            };
            let page = console.api.operation_logs(&query).await?;
            for log in &page.items {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    log.id,
                    format_date_time(&log.created_at),
                    log.username,
                    log.module,
                    log.operation,
                    log.status
                );
            }
            println!("page {} ({} total)", page.page, page.total);
            Ok(())
        }
        LogsSubcommand::Clear => {
            let ack = console.api.clear_operation_logs().await?;
            print_json(&serde_json::to_value(ack)?)
        }
    }
}

async fn run_resource(console: &Console, resource: ResourceCommand) -> Result<(), CliError> {
    require_login(console)?;
    let value = match resource.kind {
        ResourceKind::Users => resource_action(console.api.users(), resource.command).await?,
        ResourceKind::Roles => resource_action(console.api.roles(), resource.command).await?,
        ResourceKind::Permissions => resource_action(console.api.permissions(), resource.command).await?,
        ResourceKind::Menus => resource_action(console.api.menus(), resource.command).await?,
    };
    print_json(&value)
}

async fn resource_action<T>(resource: Resource<T>, command: ResourceSubcommand) -> Result<Value, CliError>
where
    T: DeserializeOwned + Serialize,
{
    let value = match command {
        ResourceSubcommand::List { page: None, page_size: None } if resource.path() == "/menus" => {
            serde_json::to_value(resource.list_all().await?)?
        }
        ResourceSubcommand::List { page, page_size } => {
            serde_json::to_value(resource.list_page(&PageQuery { page, page_size }).await?)?
        }
        ResourceSubcommand::Create { data } => {
            let body: Value = serde_json::from_str(&data)?;
            serde_json::to_value(resource.create(&body).await?)?
        }
        ResourceSubcommand::Update { id, data } => {
            let body: Value = serde_json::from_str(&data)?;
            resource.update(id, &body).await?
        }
        ResourceSubcommand::Delete { id } => resource.delete(id).await?,
    };
    Ok(value)
}

async fn run_profile(console: &Console, profile: ProfileCommand) -> Result<(), CliError> {
    require_login(console)?;
    match profile.command {
        ProfileSubcommand::Update { nickname, email, avatar } => {
            console.session.fetch_current_user().await?;
            let user = console
                .session
                .update_profile(&ProfileUpdate { nickname, email, avatar })
                .await?;
            print_json(&serde_json::to_value(user)?)
        }
        ProfileSubcommand::Password { old, new } => {
            console.session.update_password(&old, &new).await?;
            Ok(())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
