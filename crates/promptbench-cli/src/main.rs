//! Promptbench CLI - compose, run and save prompts
//!
//! An interactive shell over one workbench session, plus one-shot commands
//! for saved snapshots.

mod config;
mod render;
mod shell;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use promptbench::{
    DispatchOutcome, FileStore, PromptField, ProviderRegistry, SnapshotLibrary, Variable,
    Workbench,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use config::Config;
use render::SavedKind;
use shell::{find_saved, parse_var, Shell};

#[derive(Parser)]
#[command(name = "promptbench")]
#[command(about = "Promptbench CLI - compose, run and save prompts", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/promptbench/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved snapshots (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Shell,

    /// Manage saved prompts, models and variable sets
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Run one prompt against a saved model and print the output
    Run {
        /// Saved model name or #position
        #[arg(short, long)]
        model: String,
        /// Saved prompt name or #position
        #[arg(short, long)]
        prompt: Option<String>,
        /// System prompt text (overrides the saved prompt)
        #[arg(long)]
        system: Option<String>,
        /// User prompt text (overrides the saved prompt)
        #[arg(long)]
        user: Option<String>,
        /// Saved variable set name or #position
        #[arg(long)]
        variables: Option<String>,
        /// Extra variable, applied after the saved set (name=value)
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<Variable>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved entries
    List {
        kind: Option<SavedKind>,
    },
    /// Remove a saved entry by position
    Remove {
        kind: SavedKind,
        /// Position as listed by `saved list`
        position: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => cmd_shell(&config).await,
        Commands::Saved { action } => cmd_saved(&config, action),
        Commands::Run {
            model,
            prompt,
            system,
            user,
            variables,
            vars,
        } => cmd_run(&config, model, prompt, system, user, variables, vars).await,
        Commands::Config => cmd_config(&config, cli.config),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_library(config: &Config) -> Result<SnapshotLibrary<FileStore>> {
    let dir = config.data_dir()?;
    tracing::debug!(dir = %dir.display(), "Opening snapshot store");
    let store = FileStore::open(&dir)?;
    SnapshotLibrary::open(store)
        .with_context(|| format!("Failed to load saved snapshots from {:?}", dir))
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_shell(config: &Config) -> Result<()> {
    let library = open_library(config)?;
    let bench = Workbench::new(config.defaults.clone());
    let mut shell = Shell::new(bench, library, ProviderRegistry::default());
    shell.run().await
}

fn cmd_saved(config: &Config, action: SavedAction) -> Result<()> {
    let mut library = open_library(config)?;

    match action {
        SavedAction::List { kind } => render::print_saved(&library, kind),
        SavedAction::Remove { kind, position } => {
            let index = position.checked_sub(1).context("Positions start at 1")?;
            let removed = match kind {
                SavedKind::Prompts => library.remove_prompt(index)?,
                SavedKind::Models => library.remove_model(index)?,
                SavedKind::Variables => library.remove_variable_set(index)?,
            };
            if !removed {
                bail!("No saved entry #{}", position);
            }
            println!("{} Removed #{}", "✓".green(), position);
        }
    }

    Ok(())
}

async fn cmd_run(
    config: &Config,
    model: String,
    prompt: Option<String>,
    system: Option<String>,
    user: Option<String>,
    variables: Option<String>,
    vars: Vec<Variable>,
) -> Result<()> {
    let library = open_library(config)?;
    let mut bench = Workbench::new(config.defaults.clone());
    let models = bench.models();
    let (model_id, prompt_id) = (models[0].id, models[0].prompts[0].id);

    let saved_model = find_saved(library.models(), &model)?;
    bench.load_model(saved_model, model_id);

    if let Some(reference) = prompt {
        bench.load_prompt(find_saved(library.prompts(), &reference)?);
    }
    if let Some(text) = system {
        bench.update_prompt(model_id, prompt_id, PromptField::SystemPrompt, text);
    }
    if let Some(text) = user {
        bench.update_prompt(model_id, prompt_id, PromptField::UserPrompt, text);
    }

    let mut bound = match variables {
        Some(reference) => find_saved(library.variable_sets(), &reference)?
            .variables
            .clone(),
        None => Vec::new(),
    };
    bound.extend(vars);
    bench.set_variables(bound);

    let outcome = bench
        .run_prompt(&ProviderRegistry::default(), model_id, prompt_id)
        .await;
    let output = bench
        .model(model_id)
        .and_then(|m| m.prompt(prompt_id))
        .map(|p| p.output.clone())
        .unwrap_or_default();

    match outcome {
        DispatchOutcome::Completed => {
            println!("{}", output);
            Ok(())
        }
        DispatchOutcome::Failed(message) => bail!("{}", message),
        other => bail!("Prompt was not run: {}", render::outcome_label(&other)),
    }
}

fn cmd_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::config_path()?,
    };

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", path);
    println!("  Data dir: {:?}", config.data_dir()?);
    println!("{}", "New model defaults:".bold());
    println!("  Provider: {}", config.defaults.provider.to_string().cyan());
    println!("  Model: {}", config.defaults.model.cyan());
    println!("  Temperature: {}", config.defaults.temperature);
    println!("  Max tokens: {}", config.defaults.max_tokens);
    println!("  Endpoint: {}", config.defaults.endpoint);

    Ok(())
}
