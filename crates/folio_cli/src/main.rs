//! Admin entry point for a Folio deployment.
//!
//! # Responsibility
//! - Provision users and inspect the article store from the command line.
//! - Load configuration and logging the same way a server process would.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_core::{
    hash_password, init_logging, ArticleRepository, Folio, FolioConfig, JsonUserDirectory,
    LogTarget, PageRequest, User, UserDirectory,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "folio", version, about = "Folio content backend administration")]
struct Cli {
    /// JSON config file; FOLIO_* environment variables override it.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print an argon2 hash for a password.
    HashPassword { password: String },
    /// Add a user, or replace the password of an existing one.
    AddUser { username: String, password: String },
    /// Print one page of articles as JSON.
    List {
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long, default_value_t = 5)]
        limit: i64,
    },
    /// Print one article as JSON.
    Show { id: i64 },
    /// Open both data files and report their sizes.
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = FolioConfig::load(cli.config.as_deref()).context("failed to load config")?;
    init_logging(
        config.effective_log_level(),
        LogTarget::from_dir(config.log_dir.as_deref()),
    )
    .context("failed to initialize logging")?;

    match cli.command {
        Command::HashPassword { password } => {
            println!("{}", hash_password(&password)?);
        }
        Command::AddUser { username, password } => {
            let directory = JsonUserDirectory::new(&config.users_file);
            let replaced = directory
                .upsert_user(User::new(username.as_str(), hash_password(&password)?))
                .with_context(|| {
                    format!("failed to update `{}`", config.users_file.display())
                })?;
            let verb = if replaced { "updated" } else { "added" };
            println!("{verb} user `{username}`");
        }
        Command::List { page, limit } => {
            let folio = Folio::open(config)?;
            let articles = folio.articles().paginate(PageRequest::new(page, limit))?;
            println!("{}", serde_json::to_string_pretty(&articles)?);
        }
        Command::Show { id } => {
            let folio = Folio::open(config)?;
            let article = folio.articles().get(id)?;
            println!("{}", serde_json::to_string_pretty(&article)?);
        }
        Command::Check => {
            let folio = Folio::open(config)?;
            let articles = folio.article_store().list_articles()?;
            let users = JsonUserDirectory::new(&folio.config().users_file)
                .load_users()
                .with_context(|| {
                    format!("failed to read `{}`", folio.config().users_file.display())
                })?;
            log::info!(
                "event=check module=cli status=ok articles={} users={}",
                articles.len(),
                users.len()
            );
            println!("articles: {}", articles.len());
            println!("users: {}", users.len());
        }
    }

    Ok(())
}
