//! agentwatch - Client for the agent and page-reminder service
//!
//! Command-line host: bootstraps the session, checks the route guard for the
//! page a command belongs to, runs the command and prints notices.

use agentwatch::{
    api::{AgentPatch, AgentStatus, NewReminder, ReminderPatch, ScrapeRequest},
    chat::SendOutcome,
    config::ClientConfig,
    guard::{GuardDecision, Route},
    notifier::{self, Notice},
    resources::{AgentAction, AgentFilter, ReminderAction, ReminderFilter},
    Client,
};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agentwatch")]
#[command(version)]
#[command(about = "Client for the agent and page-reminder service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "AGENTWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// API base URL, overrides the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "AGENTWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "AGENTWATCH_PASSWORD", hide_env_values = true)]
        password: String,

        /// Full name
        #[arg(short, long)]
        name: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Delete the account
    DeleteAccount {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Request a password reset link
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },

    /// Set a new password from a reset link
    ResetPassword {
        /// Token from the reset link
        #[arg(short, long)]
        token: String,

        /// New password
        #[arg(short, long, env = "AGENTWATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Manage agents
    #[command(subcommand)]
    Agents(AgentCommands),

    /// Manage reminders
    #[command(subcommand)]
    Reminders(ReminderCommands),

    /// Ask an agent a question
    Chat {
        agent_id: String,

        /// Message to send
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(Subcommand)]
enum AgentCommands {
    /// List agents
    List {
        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,
    },

    /// Create an agent
    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        role: String,
    },

    /// Rename an agent or change its role
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        role: Option<String>,
    },

    /// Activate or deactivate an agent
    Status {
        id: String,

        #[arg(value_enum)]
        status: Switch,
    },

    /// Delete an agent
    Delete { id: String },

    /// Add a web page to an agent's knowledge base
    Scrape {
        id: String,

        url: String,

        #[arg(long)]
        css_selector: Option<String>,

        #[arg(long)]
        xpath: Option<String>,

        /// Follow links from the page
        #[arg(long)]
        multi_page: bool,

        #[arg(long, requires = "multi_page")]
        max_pages: Option<u32>,

        /// Re-scrape on a schedule
        #[arg(long)]
        auto_scrape: bool,

        #[arg(long, requires = "auto_scrape")]
        interval_hours: Option<u32>,
    },

    /// Re-scrape an agent's primary source
    Refresh { id: String },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// List reminders
    List {
        /// Include paused reminders
        #[arg(long)]
        all: bool,
    },

    /// Show a reminder and its recent changes
    Show { id: String },

    /// Watch a page and mail on change
    Create {
        #[arg(short, long)]
        url: String,

        #[arg(short, long)]
        email: String,

        /// Hours between checks (1-168)
        #[arg(short, long, default_value_t = 24)]
        interval_hours: u32,

        #[arg(long)]
        css_selector: Option<String>,

        #[arg(long)]
        xpath: Option<String>,
    },

    /// Change a reminder
    Update {
        id: String,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        interval_hours: Option<u32>,

        #[arg(long)]
        css_selector: Option<String>,

        #[arg(long)]
        xpath: Option<String>,
    },

    /// Turn a reminder on or off
    Toggle {
        id: String,

        #[arg(value_enum)]
        state: Switch,
    },

    /// Delete a reminder
    Delete { id: String },

    /// Check a reminder's page now
    Trigger { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusFilter {
    All,
    Active,
    Inactive,
}

impl From<StatusFilter> for AgentFilter {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::All => AgentFilter::All,
            StatusFilter::Active => AgentFilter::Active,
            StatusFilter::Inactive => AgentFilter::Inactive,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    #[value(alias = "active")]
    On,
    #[value(alias = "inactive")]
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("agentwatch={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides()
    .with_base_url_override(cli.base_url.clone());

    if let Commands::Config { default } = cli.command {
        return show_config(if default { None } else { Some(&config) });
    }

    let (notifier, mut notices) = notifier::channel();
    let client = Client::builder()
        .config(config)
        .notifier(notifier)
        .build()?;

    let result = run(&client, cli.command).await;
    print_notices(&mut notices);
    result
}

/// Page a command acts on
fn route_for(command: &Commands) -> Route {
    match command {
        Commands::Login { .. } | Commands::Signup { .. } | Commands::ForgotPassword { .. } => {
            Route::Login
        }
        Commands::ResetPassword { token, .. } => Route::ResetPassword {
            token: Some(token.clone()),
        },
        Commands::Agents(_) => Route::Agents,
        Commands::Reminders(_) => Route::Reminders,
        Commands::Chat { agent_id, .. } => Route::Chat {
            agent_id: agent_id.clone(),
        },
        Commands::Logout | Commands::Whoami | Commands::DeleteAccount { .. } | Commands::Config { .. } => {
            Route::Home
        }
    }
}

async fn run(client: &Client, command: Commands) -> Result<()> {
    let status = client.session().bootstrap().await;
    tracing::debug!("Session bootstrapped: {}", status);

    let route = route_for(&command);
    match client.guard().settle(&route).await {
        GuardDecision::Render => {}
        GuardDecision::Redirect(_) | GuardDecision::Redirected => {
            bail!("Not logged in. Run `agentwatch login` first.")
        }
        GuardDecision::Loading => bail!("Session could not be resolved"),
    }

    match command {
        Commands::Login { email, password } => {
            let user = client.session().login(&email, &password).await?;
            println!("Login successful. Welcome, {}!", user.display_name());
        }
        Commands::Signup {
            email,
            password,
            name,
        } => {
            let user = client.session().signup(&email, &password, &name).await?;
            println!("Account created. Welcome, {}!", user.display_name());
        }
        Commands::Logout => {
            client.session().logout().await;
        }
        Commands::Whoami => {
            if let Some(user) = client.session().user() {
                println!("{} <{}>", user.display_name(), user.email);
            }
        }
        Commands::DeleteAccount { yes } => {
            if !yes {
                bail!("Refusing to delete the account without --yes");
            }
            client.session().delete_account().await?;
        }
        Commands::ForgotPassword { email } => {
            println!("{}", client.session().forgot_password(&email).await?);
        }
        Commands::ResetPassword { token, password } => {
            println!("{}", client.session().reset_password(&token, &password).await?);
        }
        Commands::Agents(command) => run_agents(client, command).await?,
        Commands::Reminders(command) => run_reminders(client, command).await?,
        Commands::Chat { agent_id, message } => {
            run_chat(client, &agent_id, &message.join(" ")).await?
        }
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn run_agents(client: &Client, command: AgentCommands) -> Result<()> {
    let agents = client.agents();

    let action = match command {
        AgentCommands::List { status } => {
            agents.load(status.into()).await?;
            for agent in agents.items() {
                println!(
                    "{}  {:<8}  {:>5} chunks  {}  ({})",
                    agent.id,
                    agent.status,
                    agent.knowledge_chunk_count,
                    agent.name,
                    agent.role
                );
            }
            return Ok(());
        }
        AgentCommands::Create { name, role } => AgentAction::Create { name, role },
        AgentCommands::Update { id, name, role } => AgentAction::Update {
            id,
            patch: AgentPatch { name, role },
        },
        AgentCommands::Status { id, status } => AgentAction::SetStatus {
            id,
            status: match status {
                Switch::On => AgentStatus::Active,
                Switch::Off => AgentStatus::Inactive,
            },
        },
        AgentCommands::Delete { id } => AgentAction::Delete { id },
        AgentCommands::Scrape {
            id,
            url,
            css_selector,
            xpath,
            multi_page,
            max_pages,
            auto_scrape,
            interval_hours,
        } => AgentAction::Scrape(ScrapeRequest {
            css_selector,
            xpath,
            multi_page,
            max_pages,
            auto_scrape,
            scrape_interval_hours: interval_hours,
            ..ScrapeRequest::single_page(id, url)
        }),
        AgentCommands::Refresh { id } => AgentAction::Refresh { id },
    };

    agents.mutate(action).await?;
    Ok(())
}

async fn run_reminders(client: &Client, command: ReminderCommands) -> Result<()> {
    let reminders = client.reminders();

    let action = match command {
        ReminderCommands::List { all } => {
            let filter = if all {
                ReminderFilter::All
            } else {
                ReminderFilter::ActiveOnly
            };
            reminders.load(filter).await?;
            for reminder in reminders.items() {
                println!(
                    "{}  {:<6}  every {:>3}h  {} -> {}",
                    reminder.id,
                    if reminder.is_active { "on" } else { "paused" },
                    reminder.interval_hours,
                    reminder.url,
                    reminder.email
                );
            }
            return Ok(());
        }
        ReminderCommands::Show { id } => {
            let detail = reminders.get(&id).await?;
            let reminder = &detail.reminder;
            println!("{} -> {}", reminder.url, reminder.email);
            println!(
                "{}, every {}h, last checked {}",
                if reminder.is_active { "active" } else { "paused" },
                reminder.interval_hours,
                reminder.last_scraped_at.as_deref().unwrap_or("never")
            );
            for change in &detail.history {
                println!(
                    "  {}  {}",
                    change.detected_at.as_deref().unwrap_or("-"),
                    change.change_summary.as_deref().unwrap_or("")
                );
            }
            return Ok(());
        }
        ReminderCommands::Create {
            url,
            email,
            interval_hours,
            css_selector,
            xpath,
        } => ReminderAction::Create(NewReminder {
            css_selector,
            xpath,
            ..NewReminder::new(url, email, interval_hours)
        }),
        ReminderCommands::Update {
            id,
            url,
            email,
            interval_hours,
            css_selector,
            xpath,
        } => ReminderAction::Update {
            id,
            patch: ReminderPatch {
                url,
                email,
                interval_hours,
                css_selector,
                xpath,
            },
        },
        ReminderCommands::Toggle { id, state } => ReminderAction::Toggle {
            id,
            is_active: matches!(state, Switch::On),
        },
        ReminderCommands::Delete { id } => ReminderAction::Delete { id },
        ReminderCommands::Trigger { id } => ReminderAction::TriggerNow { id },
    };

    reminders.mutate(action).await?;
    Ok(())
}

async fn run_chat(client: &Client, agent_id: &str, message: &str) -> Result<()> {
    let chat = client.chat(agent_id);
    let detail = chat.open().await?;
    if detail.needs_source() {
        println!(
            "{} has no knowledge sources yet. Add one with `agentwatch agents scrape {} <url>`.",
            detail.agent.name, agent_id
        );
    }

    match chat.send(message).await {
        SendOutcome::Replied(reply) => {
            println!("{}", reply.content);
            if let Some(url) = reply.source_url {
                match reply.chunks_used {
                    Some(chunks) => println!("\nSource: {} ({} chunks)", url, chunks),
                    None => println!("\nSource: {}", url),
                }
            }
        }
        SendOutcome::Failed(reason) => {
            for message in chat.messages().iter().skip(1) {
                println!("{}", message.content);
            }
            bail!(reason);
        }
        SendOutcome::Ignored => bail!("Nothing to send"),
    }
    Ok(())
}

fn print_notices(notices: &mut mpsc::UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        println!("{}", notice);
    }
}

fn show_config(config: Option<&ClientConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}
