use anyhow::{anyhow, bail, Result};
use asktracker_core::session::session_path;
use asktracker_core::{
    backend_from_config, ChatController, ChatSettings, Config, EngineSettings, ErrorKind,
    FeedbackApiClient, FeedbackDraft, FeedbackEngine, FeedbackId, FeedbackPatch, Session,
    SessionGuard, SubmitOutcome,
};
use clap::{Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Password};
use std::io::IsTerminal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

mod auth;
mod render;

use auth::AuthClient;

#[derive(Parser)]
#[command(name = "asktracker")]
#[command(about = "Track feedback and ask an AI assistant about it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and save the session
    Login {
        email: String,
        /// Prompted for (hidden) when omitted; piped stdin is read as-is
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        name: String,
        email: String,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Forget the saved session
    Logout,
    /// Show who is signed in
    Whoami,
    /// List all feedback
    List {
        /// Only show your own feedback
        #[arg(long)]
        mine: bool,
    },
    /// Submit new feedback
    Create { title: String, message: String },
    /// Change the title or message of your feedback
    Edit {
        id: FeedbackId,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Delete your feedback
    Delete { id: FeedbackId },
    /// Talk to the assistant
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Login { email, password } => login(&config, &email, password).await?,
        Commands::Register {
            name,
            email,
            password,
        } => register(&config, &name, &email, password).await?,
        Commands::Logout => logout()?,
        Commands::Whoami => whoami()?,
        Commands::List { mine } => list(&config, mine).await?,
        Commands::Create { title, message } => create(&config, title, message).await?,
        Commands::Edit { id, title, message } => edit(&config, id, title, message).await?,
        Commands::Delete { id } => delete(&config, id).await?,
        Commands::Chat => chat(&config).await?,
    }

    Ok(())
}

fn init_tracing() {
    // Logs go to stderr so command output on stdout stays clean.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("asktracker=info,asktracker_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, PartialEq, Eq)]
enum PasswordSource {
    Given(String),
    /// Hidden prompt on the terminal.
    Prompt,
    /// One line from piped stdin.
    Piped,
}

fn password_source(given: Option<String>, interactive: bool) -> PasswordSource {
    match given {
        Some(password) => PasswordSource::Given(password),
        None if interactive => PasswordSource::Prompt,
        None => PasswordSource::Piped,
    }
}

async fn read_password(given: Option<String>) -> Result<String> {
    let password = match password_source(given, std::io::stdin().is_terminal()) {
        PasswordSource::Given(password) => password,
        PasswordSource::Prompt => {
            tokio::task::spawn_blocking(|| {
                Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("Password")
                    .interact()
            })
            .await??
        }
        PasswordSource::Piped => {
            let mut line = String::new();
            BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        bail!("a password is required");
    }
    Ok(password)
}

async fn login(config: &Config, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password).await?;
    let client = AuthClient::new(config.api_url()?, config.request_timeout())?;
    let record = client.login(email, &password).await?;
    auth::store_session(&record, &session_path()?)?;
    println!("Signed in as {} <{}>", record.user.display_name, record.user.email);
    Ok(())
}

async fn register(config: &Config, name: &str, email: &str, password: Option<String>) -> Result<()> {
    let password = read_password(password).await?;
    let client = AuthClient::new(config.api_url()?, config.request_timeout())?;
    let identity = client.register(name, email, &password).await?;
    println!(
        "Account created for {}. Sign in with `asktracker login {}`.",
        identity.display_name, identity.email
    );
    Ok(())
}

fn logout() -> Result<()> {
    if auth::clear_session(&session_path()?)? {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

fn whoami() -> Result<()> {
    let guard = SessionGuard::load()?;
    match guard.current_identity() {
        Some(identity) => println!("{} <{}> (id {})", identity.display_name, identity.email, identity.id),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn require_session() -> Result<Session> {
    SessionGuard::load()?
        .session()
        .cloned()
        .ok_or_else(|| anyhow!("not signed in; run `asktracker login <email>` first"))
}

fn engine(config: &Config) -> Result<FeedbackEngine<FeedbackApiClient>> {
    let session = require_session()?;
    let client = FeedbackApiClient::new(config.api_url()?, config.request_timeout())?;
    Ok(FeedbackEngine::new(client, session, EngineSettings::from_config(config)))
}

/// Turn an engine failure into an error carrying the banner text.
async fn surface<T>(
    engine: &FeedbackEngine<FeedbackApiClient>,
    result: Result<T, ErrorKind>,
) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(kind) => {
            let banner = engine.last_error_banner().await.unwrap_or_else(|| kind.to_string());
            engine.dismiss_error().await;
            Err(anyhow!(banner))
        }
    }
}

async fn list(config: &Config, mine: bool) -> Result<()> {
    let engine = engine(config)?;
    surface(&engine, engine.refresh().await).await?;

    let me = engine.session().user_id();
    let mut items = engine.items().await;
    if mine {
        items.retain(|i| i.is_owned_by(me));
    }
    println!("{}", render::items(&items, me));
    Ok(())
}

async fn create(config: &Config, title: String, message: String) -> Result<()> {
    let draft = FeedbackDraft::new(title, message);
    if !draft.is_complete() {
        bail!("both a title and a message are required");
    }

    let engine = engine(config)?;
    let item = surface(&engine, engine.create(draft).await).await?;
    println!("Created feedback #{}", item.id);
    Ok(())
}

/// Load the list and make sure `id` is there and belongs to the caller.
async fn owned(engine: &FeedbackEngine<FeedbackApiClient>, id: FeedbackId) -> Result<()> {
    surface(engine, engine.refresh().await).await?;
    if engine.item(id).await.is_none() {
        bail!("feedback #{id} not found");
    }
    if !engine.owns(id).await {
        bail!("feedback #{id} belongs to someone else");
    }
    Ok(())
}

async fn edit(
    config: &Config,
    id: FeedbackId,
    title: Option<String>,
    message: Option<String>,
) -> Result<()> {
    if title.is_none() && message.is_none() {
        bail!("nothing to change; pass --title and/or --message");
    }

    let engine = engine(config)?;
    owned(&engine, id).await?;

    let current = engine
        .item(id)
        .await
        .ok_or_else(|| anyhow!("feedback #{id} not found"))?;
    let patch = FeedbackPatch::new(
        title.unwrap_or(current.title),
        message.unwrap_or(current.body),
    );
    if !patch.is_complete() {
        bail!("title and message cannot be blank");
    }

    let item = surface(&engine, engine.update(id, patch).await).await?;
    println!("{}", render::item(&item, engine.session().user_id()));
    Ok(())
}

async fn delete(config: &Config, id: FeedbackId) -> Result<()> {
    let engine = engine(config)?;
    owned(&engine, id).await?;
    surface(&engine, engine.remove(id).await).await?;
    println!("Deleted feedback #{id}");
    Ok(())
}

async fn chat(config: &Config) -> Result<()> {
    let controller = ChatController::new(backend_from_config(config)?, ChatSettings::from_config(config));
    eprintln!(
        "{}",
        render::chat_banner(config.provider()?, &config.completion_model()?, controller.has_backend())
    );

    for message in controller.history().await {
        println!("{}", render::chat_line(&message));
    }
    eprintln!("Type /reset to start over, /quit or Ctrl-D to leave.");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => {
                controller.reset().await;
                for message in controller.history().await {
                    println!("{}", render::chat_line(&message));
                }
                continue;
            }
            _ => {}
        }

        match controller.submit(&line).await {
            SubmitOutcome::Replied(reply)
            | SubmitOutcome::Degraded(reply)
            | SubmitOutcome::Guidance(reply) => println!("{}", render::chat_line(&reply)),
            SubmitOutcome::Rejected(_) | SubmitOutcome::Discarded => {}
        }
    }

    Ok(())
}
