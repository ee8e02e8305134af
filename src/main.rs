//! scribe - CLI entry point.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use scribe::commit::{DiffSummarizer, is_valid_prefix};
use scribe::config::{AppConfig, CliOverrides, default_config_path, write_template};
use scribe::error::ConfigError;
use scribe::git::{GitCli, RepoContext, check_git_installed};
use scribe::llm::GeminiClient;
use scribe::notes::NoteStore;
use scribe::pipeline::{Mode, Outcome, PipelineConfig, run_pipeline};

/// Write conventional commit messages from staged changes using Gemini.
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Write conventional commit messages from staged changes using Gemini")]
#[command(version)]
struct Cli {
    /// Print the generated message without committing
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Model to use (overrides config and environment)
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// API key to use (overrides config and environment)
    #[arg(long)]
    api_key: Option<String>,

    /// Ticket prefix to put in front of the message, e.g. JR-1234
    #[arg(short = 'p', long)]
    prefix: Option<String>,

    /// Do not detect a ticket prefix from the branch name
    #[arg(long)]
    no_auto_prefix: bool,

    /// Regenerate the message of the last commit and amend it
    #[arg(short = 'r', long)]
    regenerate: bool,

    /// Show debug logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Save a note to include as context in the next commit message
    #[arg(short = 'n', long, value_name = "TEXT", group = "side")]
    note: Option<String>,

    /// List saved notes for this repository
    #[arg(long, group = "side")]
    list_notes: bool,

    /// Delete all saved notes for this repository
    #[arg(long, group = "side")]
    clear_notes: bool,

    /// Write a config file template
    #[arg(long, group = "side")]
    init_config: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("Error: {}", describe(&error));
        std::process::exit(1);
    }
}

/// One-line diagnostic: the step that failed plus the error it failed with.
///
/// Library errors already embed their own causes, so only the first cause
/// below the context is shown.
fn describe(error: &anyhow::Error) -> String {
    match error.chain().nth(1) {
        Some(cause) => format!("{error}: {cause}"),
        None => error.to_string(),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        return init_config();
    }

    if cli.note.is_some() || cli.list_notes || cli.clear_notes {
        return run_notes_command(&cli);
    }

    let config = AppConfig::load(&CliOverrides {
        api_key: cli.api_key.clone(),
        model: cli.model.clone(),
        disable_auto_prefix: cli.no_auto_prefix,
    });
    let api_key = config
        .require_api_key()
        .context("Cannot generate a commit message")?;

    check_git_installed().context("git is required")?;
    let repo = discover_repo()?;

    let invalid_prefix = cli
        .prefix
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty() && !is_valid_prefix(p));
    if let Some(prefix) = invalid_prefix {
        eprintln!(
            "Warning: prefix '{prefix}' does not look like a ticket id (expected ABC-123, ABC123 or #123). Using it anyway."
        );
    }

    let llm = GeminiClient::new(api_key, config.model.clone())
        .context("Failed to create the Gemini client")?
        .with_base_url(config.base_url.clone());
    let git = GitCli::new(repo.root.clone());
    let notes = NoteStore::for_repo(&repo);

    let pipeline_config = PipelineConfig {
        mode: if cli.regenerate {
            Mode::Regenerate
        } else {
            Mode::Commit
        },
        dry_run: cli.dry_run,
        prefix_override: cli.prefix.clone(),
        auto_prefix: config.auto_prefix_from_branch,
        prefix_format: config.prefix_format,
        summarizer: DiffSummarizer::default(),
    };

    let outcome = run_pipeline(&pipeline_config, &git, &llm, &notes)
        .await
        .context("Failed to generate commit message")?;
    report(&outcome);

    Ok(())
}

fn report(outcome: &Outcome) {
    let generated = outcome.generated();
    if generated.summarized {
        eprintln!("Diff was too large; the message was generated from a change summary.");
    }

    match outcome {
        Outcome::DryRun { generated, previous } => {
            if let Some(previous) = previous {
                eprintln!("Current message ({}): {}", previous.hash, previous.message.trim());
            }
            println!("{}", generated.message);
            eprintln!("Dry run: nothing was committed.");
        }
        Outcome::Committed(generated) => {
            println!("Committed: {}", generated.message);
            if generated.notes_used > 0 {
                println!("Used and cleared {} note(s).", generated.notes_used);
            }
        }
        Outcome::Amended {
            generated,
            previous,
        } => {
            println!("Amended {}", previous.hash);
            println!("  was: {}", previous.message.trim());
            println!("  now: {}", generated.message);
            if generated.notes_used > 0 {
                println!("Used and cleared {} note(s).", generated.notes_used);
            }
        }
    }
}

fn discover_repo() -> Result<RepoContext> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    RepoContext::discover(&cwd).context("Failed to locate the git repository")
}

fn run_notes_command(cli: &Cli) -> Result<()> {
    let repo = discover_repo()?;
    let store = NoteStore::for_repo(&repo);

    if let Some(message) = cli.note.as_deref() {
        store.add(message).context("Failed to save note")?;
        let count = store.list().len();
        println!("Note saved ({count} pending for the next commit).");
    } else if cli.list_notes {
        let notes = store.list();
        if notes.is_empty() {
            println!("No notes for this repository.");
        }
        for (i, note) in notes.iter().enumerate() {
            let when = note.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
            println!("{}. [{}] {}", i + 1, when, note.message);
        }
    } else if store.clear().context("Failed to clear notes")? {
        println!("Notes cleared.");
    } else {
        println!("No notes to clear.");
    }

    Ok(())
}

fn init_config() -> Result<()> {
    let path = default_config_path().context("Failed to choose a config location")?;

    if path.exists() {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()
            .map_err(|_| ConfigError::Cancelled)
            .context("Config initialisation stopped")?;

        if !overwrite {
            println!("Kept existing config at {}", path.display());
            return Ok(());
        }
    }

    write_template(&path).context("Failed to write config template")?;

    println!("Wrote config template to {}", path.display());
    println!("Set \"apiKey\" to your Gemini API key, or export SCRIBE_API_KEY.");
    println!();
    println!("Tip: add an alias to your shell profile for quicker commits:");
    println!("  alias gcm='scribe'");

    Ok(())
}
