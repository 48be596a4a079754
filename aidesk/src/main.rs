// aidesk - AI chat assistant client
// Entry point and command-line interface

use aidesk::app::AppState;
use aidesk::commands::{self, Composer, Insertion};
use aidesk::config::{ClientConfig, DEFAULT_SETTINGS_USER, PROVIDER_API_KEY_ENV};
use aidesk::models::{ProjectTreeNode, ProviderConfig, SettingsCategory, TemplateFilter, Theme};
use aidesk::secret::ApiKey;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "aidesk")]
#[command(about = "aidesk - AI chat assistant client", long_about = None)]
struct Cli {
    /// Backend base URL (overrides AIDESK_API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Local data directory (overrides AIDESK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },
    /// Manage chat sessions of the current project
    Sessions {
        #[command(subcommand)]
        action: SessionsAction,
    },
    /// Switch projects and exchange messages
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
    /// List and apply message templates
    Templates {
        #[command(subcommand)]
        action: TemplatesAction,
    },
    /// Manage AI providers and their credentials
    Providers {
        #[command(subcommand)]
        action: ProvidersAction,
    },
    /// Show, export and import settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show recent activity
    Activity,
    /// Show application information
    Info,
}

#[derive(Subcommand)]
enum ProjectsAction {
    /// List projects
    List,
    /// Show the project tree
    Tree {
        /// Only show the subtree under this project
        #[arg(long)]
        root: Option<String>,
    },
    /// Create a project
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename a project
    Rename { id: String, name: String },
    /// Delete a project
    Delete {
        id: String,
        /// Also delete child projects
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List sessions of the current project
    List {
        #[arg(long)]
        include_inactive: bool,
    },
    /// Create a session in the current project
    New { title: Option<String> },
    /// Delete a session
    Delete {
        id: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Make a project current and open its latest session
    Switch { project_id: String },
    /// Send a message to the current session
    Send { content: String },
    /// Print the messages of the current session
    History,
}

#[derive(Subcommand)]
enum TemplatesAction {
    /// List templates
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        project: Option<String>,
    },
    /// Fill a template and print or send the result
    Apply {
        id: String,
        /// Placeholder value as key=value
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Send the result to the current session
        #[arg(long)]
        send: bool,
    },
}

#[derive(Subcommand)]
enum ProvidersAction {
    /// List known providers
    List,
    /// Store an API key for a provider on the backend.
    ///
    /// The key is read from AIDESK_PROVIDER_API_KEY, or from stdin with
    /// --api-key-stdin.
    Configure {
        provider_id: String,
        /// Read the API key from the first line of stdin
        #[arg(long)]
        api_key_stdin: bool,
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        organization_id: Option<String>,
    },
    /// Show whether a provider is configured
    Status { provider_id: String },
    /// Make a provider current
    Select { provider_id: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show effective settings
    Show,
    /// Show one settings category
    Category { name: String },
    /// Set the theme (light, dark or system)
    Theme { theme: String },
    /// Export settings to a file
    Export { path: PathBuf },
    /// Import settings from a file
    Import { path: PathBuf },
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aidesk=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let state = AppState::setup(config).context("failed to initialize aidesk")?;

    match cli.command {
        Commands::Projects { action } => run_projects(&state, action).await?,
        Commands::Sessions { action } => run_sessions(&state, action).await?,
        Commands::Chat { action } => run_chat(&state, action).await?,
        Commands::Templates { action } => run_templates(&state, action).await?,
        Commands::Providers { action } => run_providers(&state, action).await?,
        Commands::Settings { action } => run_settings(&state, action).await?,
        Commands::Activity => {
            for entry in state.user_state.state().recent_activity {
                println!(
                    "{}  {:?} {:?} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.action,
                    entry.kind,
                    entry.title
                );
            }
        }
        Commands::Info => {
            let info = commands::get_app_info(&state);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}

async fn run_projects(state: &AppState, action: ProjectsAction) -> Result<()> {
    match action {
        ProjectsAction::List => {
            state.projects.load_projects().await?;
            for row in commands::project_rows(state) {
                let marker = if row.is_current { "*" } else { " " };
                let lock = if row.delete_enabled { "" } else { " (protected)" };
                println!("{} {}  {}{}", marker, row.project.id, row.project.name, lock);
            }
        }
        ProjectsAction::Tree { root } => {
            let tree = state.projects.load_tree().await?;
            match root {
                Some(id) => {
                    let Some(node) = tree.iter().find_map(|n| n.find(&id)) else {
                        bail!("Project {} is not in the tree", id);
                    };
                    print_tree(node, 0);
                }
                None => tree.iter().for_each(|node| print_tree(node, 0)),
            }
        }
        ProjectsAction::Create {
            name,
            description,
            parent,
        } => {
            let project = commands::create_project(state, &name, description, parent).await?;
            println!("Created project {} ({})", project.name, project.id);
        }
        ProjectsAction::Rename { id, name } => {
            let project = commands::rename_project(state, &id, &name).await?;
            println!("Renamed project {} to {}", project.id, project.name);
        }
        ProjectsAction::Delete { id, force } => {
            commands::delete_project(state, &id, force).await?;
            println!("Deleted project {}", id);
        }
    }
    Ok(())
}

fn print_tree(node: &ProjectTreeNode, depth: usize) {
    let size = node.subtree_size();
    let suffix = if size > 1 {
        format!(" ({} projects)", size)
    } else {
        String::new()
    };
    println!(
        "{}{}  {}{}",
        "  ".repeat(depth),
        node.project.id,
        node.project.name,
        suffix
    );
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

async fn run_sessions(state: &AppState, action: SessionsAction) -> Result<()> {
    match action {
        SessionsAction::List { include_inactive } => {
            let project_id = state.projects.current_project_id();
            state
                .sessions
                .load_sessions(project_id.as_deref(), include_inactive)
                .await?;
            let current = state.sessions.current_session_id();
            for session in state.sessions.recent_sessions(usize::MAX) {
                let marker = if current.as_deref() == Some(session.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {}  {} ({} messages)",
                    marker, session.id, session.title, session.message_count
                );
            }
        }
        SessionsAction::New { title } => {
            let session = commands::new_session(state, title.as_deref()).await?;
            println!("Created session {} ({})", session.title, session.id);
        }
        SessionsAction::Delete { id, force } => {
            commands::delete_session(state, &id, force).await?;
            println!("Deleted session {}", id);
        }
    }
    Ok(())
}

async fn run_chat(state: &AppState, action: ChatAction) -> Result<()> {
    match action {
        ChatAction::Switch { project_id } => {
            state.projects.load_projects().await?;
            let session = commands::switch_project(state, &project_id).await?;
            println!("Project {} is current, session: {}", project_id, session.title);
        }
        ChatAction::Send { content } => {
            let message = commands::send_user_message(state, &content).await?;
            println!("Sent message {}", message.id);
        }
        ChatAction::History => {
            let Some(session_id) = state.sessions.current_session_id() else {
                bail!("No session is open; run `aidesk chat switch <project>` first");
            };
            for message in state.sessions.load_messages(&session_id).await? {
                println!("[{:?}] {}", message.role, message.content);
            }
        }
    }
    Ok(())
}

async fn run_templates(state: &AppState, action: TemplatesAction) -> Result<()> {
    match action {
        TemplatesAction::List { category, project } => {
            let filter = TemplateFilter {
                project_id: project,
                category,
            };
            for template in state.templates.load_templates(filter).await? {
                println!("{}  {} [{}]", template.id, template.name, template.category);
            }
        }
        TemplatesAction::Apply { id, params, send } => {
            let content = match commands::begin_insertion(state, &id).await? {
                Insertion::Ready(content) => content,
                Insertion::NeedsParameters(pending) => {
                    let params: HashMap<String, String> = params.into_iter().collect();
                    pending.submit(state, &params).await?
                }
            };

            let mut composer = Composer::new();
            composer.insert(&content);

            if send {
                let message = commands::send_user_message(state, &composer.take()).await?;
                println!("Sent message {}", message.id);
            } else {
                println!("{}", composer.draft());
            }
        }
    }
    Ok(())
}

async fn run_providers(state: &AppState, action: ProvidersAction) -> Result<()> {
    state.providers.load_providers().await?;

    match action {
        ProvidersAction::List => {
            let current = state.providers.state().current_provider_id;
            for provider in state.providers.state().providers {
                let marker = if current.as_deref() == Some(provider.id.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{} {}  {}", marker, provider.id, provider.display_name);
            }
        }
        ProvidersAction::Configure {
            provider_id,
            api_key_stdin,
            base_url,
            organization_id,
        } => {
            let api_key = if api_key_stdin {
                ApiKey::read_from(std::io::stdin().lock())?
            } else {
                ApiKey::from_env(PROVIDER_API_KEY_ENV)?
            };

            let mut config = ProviderConfig::new(provider_id.clone(), api_key);
            config.base_url = base_url;
            config.organization_id = organization_id;

            if !state.providers.save_provider_config(config).await {
                let error = state.providers.state().status.error.unwrap_or_default();
                bail!("{}", error);
            }
            println!("Provider {} configured", provider_id);
        }
        ProvidersAction::Status { provider_id } => {
            let status = state.providers.load_provider_config(&provider_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ProvidersAction::Select { provider_id } => {
            if state.providers.get_provider(&provider_id).is_none() {
                bail!("Unknown provider: {}", provider_id);
            }
            state.providers.select_provider(Some(provider_id.clone()));
            println!("Provider {} selected", provider_id);
        }
    }
    Ok(())
}

async fn run_settings(state: &AppState, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = state.settings.load_effective().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Category { name } => {
            let category = match name.as_str() {
                "preferences" => SettingsCategory::Preferences,
                "ui_state" => SettingsCategory::UiState,
                other => bail!("Unknown settings category: {}", other),
            };
            let value = state.settings.load_category(category).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        SettingsAction::Theme { theme } => {
            let theme: Theme = theme.parse()?;
            commands::update_theme(state, theme).await?;
            println!("Theme set to {:?}", theme);
        }
        SettingsAction::Export { path } => {
            commands::export_settings_to_file(state, DEFAULT_SETTINGS_USER, &path).await?;
            println!("Settings exported to {}", path.display());
        }
        SettingsAction::Import { path } => {
            commands::import_settings_from_file(state, &path).await?;
            println!("Settings imported from {}", path.display());
        }
    }
    Ok(())
}
