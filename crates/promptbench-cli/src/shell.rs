//! Interactive shell over one workbench session
//!
//! Models, prompts and variables are addressed by 1-based position as
//! listed by `models` and `var list`. Saved snapshots are addressed by name
//! (first match) or by `#position` as listed by `saved`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;
use promptbench::domain::Named;
use promptbench::{
    DispatchOutcome, KeyValueStore, ModelUpdate, PromptField, ProviderRegistry, SnapshotLibrary,
    Variable, VariableField, Workbench,
};
use std::io::IsTerminal;
use uuid::Uuid;

use crate::render::{self, SavedKind};

#[derive(Parser)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    /// List models with their prompts
    #[command(alias = "ls")]
    Models,

    /// Model operations
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Prompt operations
    Prompt {
        #[command(subcommand)]
        action: PromptAction,
    },

    /// Variable operations
    Var {
        #[command(subcommand)]
        action: VarAction,
    },

    /// Global prompt mode
    Global {
        #[command(subcommand)]
        action: GlobalAction,
    },

    /// Run one prompt
    Run {
        /// Model position
        model: usize,
        /// Prompt position (ignored in global mode)
        #[arg(default_value = "1")]
        prompt: usize,
    },

    /// Run every prompt, one at a time
    RunAll,

    /// List saved snapshots
    Saved {
        kind: Option<SavedKind>,
    },

    /// Remove a saved snapshot
    Unsave {
        kind: SavedKind,
        /// Position as listed by `saved`
        position: usize,
    },

    /// Leave the shell
    #[command(alias = "quit")]
    Exit,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Add a model with default settings
    Add,
    /// Remove a model
    Rm { model: usize },
    /// Set a field (provider, model, temperature, max-tokens, api-key, endpoint)
    Set {
        model: usize,
        field: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Save a model's settings under a name
    Save { model: usize, name: String },
    /// Load saved settings into a model (keeps its prompts)
    Load {
        /// Saved model name or #position
        saved: String,
        model: usize,
    },
}

#[derive(Subcommand)]
enum PromptAction {
    /// Add a blank prompt to a model
    Add { model: usize },
    /// Remove a prompt
    Rm { model: usize, prompt: usize },
    /// Set prompt text (field: system, user, output)
    Set {
        model: usize,
        prompt: usize,
        field: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Show a prompt in full
    Show { model: usize, prompt: usize },
    /// Save a prompt pair (the global pair in global mode)
    Save {
        name: String,
        model: Option<usize>,
        prompt: Option<usize>,
    },
    /// Load a saved prompt pair into the global pair or every prompt
    Load {
        /// Saved prompt name or #position
        saved: String,
    },
}

#[derive(Subcommand)]
enum VarAction {
    /// Add a variable
    Add {
        name: Option<String>,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Set a variable field (name, value)
    Set {
        index: usize,
        field: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Remove a variable
    Rm { index: usize },
    /// List variables
    List,
    /// Save the variable list under a name
    Save { name: String },
    /// Replace the variable list with a saved set
    Load {
        /// Saved set name or #position
        saved: String,
    },
}

#[derive(Subcommand)]
enum GlobalAction {
    /// Use one shared prompt pair for every model
    On,
    /// Use each model's own prompts
    Off,
    /// Flip the mode
    Toggle,
    /// Set global prompt text (field: system, user)
    Set {
        field: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
    /// Show the global prompt pair
    Show,
}

/// What the loop does after a command
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// One interactive session
pub struct Shell<S: KeyValueStore> {
    bench: Workbench,
    library: SnapshotLibrary<S>,
    registry: ProviderRegistry,
}

impl<S: KeyValueStore> Shell<S> {
    pub fn new(bench: Workbench, library: SnapshotLibrary<S>, registry: ProviderRegistry) -> Self {
        Self {
            bench,
            library,
            registry,
        }
    }

    /// Read and execute lines until `exit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        let interactive = std::io::stdin().is_terminal();
        if interactive {
            println!(
                "{} Type {} for commands, {} to leave.",
                "promptbench".cyan().bold(),
                "help".cyan(),
                "exit".cyan()
            );
        }
        loop {
            let line = if interactive {
                match Input::<String>::new()
                    .with_prompt("pb")
                    .allow_empty(true)
                    .interact_text()
                {
                    Ok(line) => line,
                    Err(_) => break,
                }
            } else {
                let mut line = String::new();
                if std::io::stdin()
                    .read_line(&mut line)
                    .context("Failed to read input")?
                    == 0
                {
                    break;
                }
                line
            };

            match self.execute(&line).await {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("{} {:#}", "error:".red(), e),
            }
        }

        Ok(())
    }

    /// Parse and execute one line
    pub async fn execute(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            return Ok(Flow::Continue);
        }

        let words = split_line(line)?;
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(e) => {
                e.print().context("Failed to print command usage")?;
                return Ok(Flow::Continue);
            }
        };

        match parsed.command {
            ShellCommand::Models => render::print_models(&self.bench),
            ShellCommand::Model { action } => self.model(action)?,
            ShellCommand::Prompt { action } => self.prompt(action)?,
            ShellCommand::Var { action } => self.var(action)?,
            ShellCommand::Global { action } => self.global(action),
            ShellCommand::Run { model, prompt } => self.run_one(model, prompt).await?,
            ShellCommand::RunAll => self.run_all().await,
            ShellCommand::Saved { kind } => render::print_saved(&self.library, kind),
            ShellCommand::Unsave { kind, position } => self.unsave(kind, position)?,
            ShellCommand::Exit => return Ok(Flow::Exit),
        }

        Ok(Flow::Continue)
    }

    fn model(&mut self, action: ModelAction) -> Result<()> {
        match action {
            ModelAction::Add => {
                self.bench.add_model();
                println!("{} Added m{}", "✓".green(), self.bench.models().len());
            }
            ModelAction::Rm { model } => {
                let model_id = self.model_id(model)?;
                self.bench.remove_model(model_id);
                println!("{} Removed m{}", "✓".green(), model);
            }
            ModelAction::Set {
                model,
                field,
                value,
            } => {
                let model_id = self.model_id(model)?;
                let update = ModelUpdate::parse(&field, &value.join(" "))?;
                self.bench.update_model(model_id, update);
            }
            ModelAction::Save { model, name } => {
                let model_id = self.model_id(model)?;
                self.library.save_model_from(&self.bench, &name, model_id)?;
                println!("{} Saved model '{}'", "✓".green(), name);
            }
            ModelAction::Load { saved, model } => {
                let model_id = self.model_id(model)?;
                let entry = find_saved(self.library.models(), &saved)?.clone();
                self.bench.load_model(&entry, model_id);
                println!("{} Loaded '{}' into m{}", "✓".green(), entry.name, model);
            }
        }
        Ok(())
    }

    fn prompt(&mut self, action: PromptAction) -> Result<()> {
        match action {
            PromptAction::Add { model } => {
                let model_id = self.model_id(model)?;
                self.bench.add_prompt(model_id);
                let count = self.bench.model(model_id).map_or(0, |m| m.prompts.len());
                println!("{} Added m{} p{}", "✓".green(), model, count);
            }
            PromptAction::Rm { model, prompt } => {
                let (model_id, prompt_id) = self.prompt_id(model, prompt)?;
                self.bench.remove_prompt(model_id, prompt_id);
            }
            PromptAction::Set {
                model,
                prompt,
                field,
                text,
            } => {
                let (model_id, prompt_id) = self.prompt_id(model, prompt)?;
                let field: PromptField = field.parse()?;
                self.bench
                    .update_prompt(model_id, prompt_id, field, text.join(" "));
            }
            PromptAction::Show { model, prompt } => {
                let (model_id, prompt_id) = self.prompt_id(model, prompt)?;
                if let Some(p) = self.bench.model(model_id).and_then(|m| m.prompt(prompt_id)) {
                    println!("{}\n{}", "System:".bold(), p.system_prompt);
                    println!("{}\n{}", "User:".bold(), p.user_prompt);
                    println!("{}\n{}", "Output:".bold(), p.output);
                }
            }
            PromptAction::Save {
                name,
                model,
                prompt,
            } => {
                let target = match (model, prompt) {
                    (Some(m), Some(p)) => Some(self.prompt_id(m, p)?),
                    (Some(m), None) => Some(self.prompt_id(m, 1)?),
                    _ => None,
                };
                self.library.save_prompt_from(&self.bench, &name, target)?;
                println!("{} Saved prompt '{}'", "✓".green(), name);
            }
            PromptAction::Load { saved } => {
                let entry = find_saved(self.library.prompts(), &saved)?.clone();
                self.bench.load_prompt(&entry);
                let scope = if self.bench.uses_global_prompt() {
                    "global prompt"
                } else {
                    "every prompt"
                };
                println!("{} Loaded '{}' into {}", "✓".green(), entry.name, scope);
            }
        }
        Ok(())
    }

    fn var(&mut self, action: VarAction) -> Result<()> {
        match action {
            VarAction::Add { name, value } => {
                let index = self.bench.add_variable();
                if let Some(name) = name {
                    self.bench.update_variable(index, VariableField::Name, name);
                }
                self.bench
                    .update_variable(index, VariableField::Value, value.join(" "));
            }
            VarAction::Set { index, field, text } => {
                let index = self.variable_index(index)?;
                let field: VariableField = field.parse()?;
                self.bench.update_variable(index, field, text.join(" "));
            }
            VarAction::Rm { index } => {
                let index = self.variable_index(index)?;
                self.bench.remove_variable(index);
            }
            VarAction::List => render::print_variables(&self.bench.variables()),
            VarAction::Save { name } => {
                self.library.save_variables_from(&self.bench, &name)?;
                println!("{} Saved variable set '{}'", "✓".green(), name);
            }
            VarAction::Load { saved } => {
                let entry = find_saved(self.library.variable_sets(), &saved)?.clone();
                self.bench.load_variables(&entry);
                println!(
                    "{} Loaded '{}' ({} variables)",
                    "✓".green(),
                    entry.name,
                    entry.variables.len()
                );
            }
        }
        Ok(())
    }

    fn global(&mut self, action: GlobalAction) {
        match action {
            GlobalAction::On => self.bench.set_global_mode(true),
            GlobalAction::Off => self.bench.set_global_mode(false),
            GlobalAction::Toggle => {
                self.bench.toggle_global_prompt();
            }
            GlobalAction::Set { field, text } => {
                let updated = field
                    .parse::<PromptField>()
                    .map(|field| self.bench.set_global_prompt(field, text.join(" ")))
                    .unwrap_or(false);
                if !updated {
                    eprintln!("{} Global field must be system or user", "error:".red());
                }
            }
            GlobalAction::Show => {
                let global = self.bench.global_prompt();
                println!("{}\n{}", "System:".bold(), global.system_prompt);
                println!("{}\n{}", "User:".bold(), global.user_prompt);
            }
        }
        let mode = if self.bench.uses_global_prompt() {
            "on".green()
        } else {
            "off".dimmed()
        };
        println!("Global prompt mode: {}", mode);
    }

    async fn run_one(&mut self, model: usize, prompt: usize) -> Result<()> {
        let (model_id, prompt_id) = if self.bench.uses_global_prompt() {
            self.prompt_id(model, 1)?
        } else {
            self.prompt_id(model, prompt)?
        };
        let outcome = self.bench.run_prompt(&self.registry, model_id, prompt_id).await;
        println!("m{} {}", model, render::outcome_label(&outcome));
        self.print_output(model_id, prompt_id, &outcome);
        Ok(())
    }

    async fn run_all(&mut self) {
        let positions: Vec<(Uuid, usize)> = self
            .bench
            .models()
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i + 1))
            .collect();
        let reports = self.bench.run_all(&self.registry).await;
        for report in &reports {
            let model = positions
                .iter()
                .find(|(id, _)| *id == report.model_id)
                .map_or(0, |(_, pos)| *pos);
            println!("m{} {}", model, render::outcome_label(&report.outcome));
            self.print_output(report.model_id, report.prompt_id, &report.outcome);
        }
        let done = reports.iter().filter(|r| r.outcome.is_completed()).count();
        println!("{}/{} prompts completed", done, reports.len());
    }

    fn print_output(&self, model_id: Uuid, prompt_id: Uuid, outcome: &DispatchOutcome) {
        if !matches!(outcome, DispatchOutcome::Completed | DispatchOutcome::Failed(_)) {
            return;
        }
        if let Some(prompt) = self.bench.model(model_id).and_then(|m| m.prompt(prompt_id)) {
            println!("{}", prompt.output);
        }
    }

    fn unsave(&mut self, kind: SavedKind, position: usize) -> Result<()> {
        let index = position.checked_sub(1).context("Positions start at 1")?;
        let removed = match kind {
            SavedKind::Prompts => self.library.remove_prompt(index)?,
            SavedKind::Models => self.library.remove_model(index)?,
            SavedKind::Variables => self.library.remove_variable_set(index)?,
        };
        if !removed {
            bail!("No saved entry #{}", position);
        }
        println!("{} Removed #{}", "✓".green(), position);
        Ok(())
    }

    fn model_id(&self, position: usize) -> Result<Uuid> {
        position
            .checked_sub(1)
            .and_then(|i| self.bench.models().get(i).map(|m| m.id))
            .with_context(|| format!("No model m{}", position))
    }

    fn prompt_id(&self, model: usize, prompt: usize) -> Result<(Uuid, Uuid)> {
        let model_id = self.model_id(model)?;
        let prompt_id = prompt
            .checked_sub(1)
            .and_then(|i| {
                self.bench
                    .model(model_id)
                    .and_then(|m| m.prompts.get(i).map(|p| p.id))
            })
            .with_context(|| format!("No prompt m{} p{}", model, prompt))?;
        Ok((model_id, prompt_id))
    }

    fn variable_index(&self, position: usize) -> Result<usize> {
        position
            .checked_sub(1)
            .filter(|i| *i < self.bench.variables().len())
            .with_context(|| format!("No variable v{}", position))
    }

    #[cfg(test)]
    pub fn bench(&self) -> &Workbench {
        &self.bench
    }

    #[cfg(test)]
    pub fn library(&self) -> &SnapshotLibrary<S> {
        &self.library
    }
}

/// Find a saved entry by `#position` or by name (first match)
pub fn find_saved<'a, T: Named>(items: &'a [T], reference: &str) -> Result<&'a T> {
    if let Some(position) = reference.strip_prefix('#') {
        let position: usize = position
            .parse()
            .with_context(|| format!("Invalid position: {}", reference))?;
        return position
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .with_context(|| format!("No saved entry {}", reference));
    }
    items
        .iter()
        .find(|item| item.name() == reference)
        .with_context(|| format!("No saved entry named '{}'", reference))
}

/// Split a line into words, honoring quotes and backslash escapes
///
/// `\n` inside or outside quotes becomes a newline.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                match chars.next() {
                    Some('n') => current.push('\n'),
                    Some(next) => current.push(next),
                    None => current.push('\\'),
                }
                in_word = true;
            }
            c if Some(c) == quote => quote = None,
            c if quote.is_some() => current.push(c),
            '"' | '\'' => {
                quote = Some(c);
                in_word = true;
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("Unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Parse `name=value` for `--var`
pub fn parse_var(raw: &str) -> Result<Variable, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{}'", raw))?;
    Ok(Variable::new(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use promptbench::{
        CompletionProvider, CompletionRequest, DomainError, MemoryStore, ModelDefaults, Provider,
    };
    use std::sync::Arc;

    struct EchoProvider;

    #[async_trait]
    impl CompletionProvider for EchoProvider {
        fn provider(&self) -> Provider {
            Provider::OpenAI
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
            Ok(format!(
                "{} / {}",
                request.messages[0].content, request.messages[1].content
            ))
        }
    }

    fn shell(store: MemoryStore) -> Shell<MemoryStore> {
        let library = SnapshotLibrary::open(store).unwrap();
        let registry = ProviderRegistry::empty().register(Arc::new(EchoProvider));
        Shell::new(Workbench::new(ModelDefaults::default()), library, registry)
    }

    async fn exec(shell: &mut Shell<MemoryStore>, lines: &[&str]) {
        for line in lines {
            assert_eq!(shell.execute(line).await.unwrap(), Flow::Continue, "{}", line);
        }
    }

    #[test]
    fn test_split_line_quotes_and_escapes() {
        assert_eq!(
            split_line(r#"prompt set 1 1 user "Say {word}" now"#).unwrap(),
            vec!["prompt", "set", "1", "1", "user", "Say {word}", "now"]
        );
        assert_eq!(split_line(r"a\ b 'c d' e\nf").unwrap(), vec!["a b", "c d", "e\nf"]);
        assert_eq!(split_line(r#"x "" y"#).unwrap(), vec!["x", "", "y"]);
        assert!(split_line("\"open").is_err());
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var("lang=French").unwrap(), Variable::new("lang", "French"));
        assert_eq!(parse_var("eq=a=b").unwrap(), Variable::new("eq", "a=b"));
        assert!(parse_var("novalue").is_err());
    }

    #[test]
    fn test_find_saved_by_name_and_position() {
        let sets = vec![
            promptbench::SavedVariableSet {
                name: "a".into(),
                variables: vec![],
            },
            promptbench::SavedVariableSet {
                name: "b".into(),
                variables: vec![],
            },
        ];
        assert_eq!(find_saved(&sets, "b").unwrap().name, "b");
        assert_eq!(find_saved(&sets, "#1").unwrap().name, "a");
        assert!(find_saved(&sets, "#3").is_err());
        assert!(find_saved(&sets, "#0").is_err());
        assert!(find_saved(&sets, "c").is_err());
    }

    #[tokio::test]
    async fn test_edit_and_run_through_shell() {
        let mut shell = shell(MemoryStore::new());
        exec(
            &mut shell,
            &[
                "var add who Ada Lovelace",
                "prompt set 1 1 system Be brief.",
                "prompt set 1 1 user \"Greet {who}.\"",
                "model set 1 temperature 0.2",
                "run 1 1",
            ],
        )
        .await;

        let models = shell.bench().models();
        assert_eq!(models[0].temperature, 0.2);
        assert_eq!(models[0].prompts[0].output, "Be brief. / Greet Ada Lovelace.");
    }

    #[tokio::test]
    async fn test_invalid_input_is_an_error_not_a_change() {
        let mut shell = shell(MemoryStore::new());
        assert!(shell.execute("model set 1 temperature 3").await.is_err());
        assert!(shell.execute("prompt set 2 1 user hi").await.is_err());
        assert!(shell.execute("var rm 1").await.is_err());
        assert_eq!(shell.bench().models()[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn test_save_and_load_through_shell() {
        let store = MemoryStore::new();
        let mut first = shell(store.clone());
        exec(
            &mut first,
            &[
                "var add lang French",
                "var save langs",
                "model set 1 model gpt-4o",
                "model save 1 big",
                "prompt set 1 1 user Translate",
                "prompt save greet 1 1",
            ],
        )
        .await;

        let mut second = shell(store);
        exec(
            &mut second,
            &["model add", "model load big 2", "var load #1", "prompt load greet"],
        )
        .await;

        let bench = second.bench();
        assert_eq!(bench.models()[0].model, "gpt-3.5-turbo");
        assert_eq!(bench.models()[1].model, "gpt-4o");
        assert_eq!(bench.variables().as_ref(), &vec![Variable::new("lang", "French")]);
        assert!(bench
            .models()
            .iter()
            .all(|m| m.prompts[0].user_prompt == "Translate"));

        exec(&mut second, &["unsave vars 1"]).await;
        assert!(second.library().variable_sets().is_empty());
    }

    #[tokio::test]
    async fn test_global_mode_run_all() {
        let mut shell = shell(MemoryStore::new());
        exec(
            &mut shell,
            &[
                "model add",
                "global on",
                "global set system shared",
                "global set user for {x}",
                "var add x all",
                "run-all",
            ],
        )
        .await;

        for model in shell.bench().models().iter() {
            assert_eq!(model.prompts[0].output, "shared / for all");
        }
    }

    #[tokio::test]
    async fn test_usage_errors_keep_the_session() {
        let mut shell = shell(MemoryStore::new());
        assert_eq!(shell.execute("frobnicate").await.unwrap(), Flow::Continue);
        assert_eq!(shell.execute("run").await.unwrap(), Flow::Continue);
        assert_eq!(shell.execute("help").await.unwrap(), Flow::Continue);
        assert_eq!(shell.bench().models().len(), 1);
    }

    #[tokio::test]
    async fn test_exit() {
        let mut shell = shell(MemoryStore::new());
        assert_eq!(shell.execute("exit").await.unwrap(), Flow::Exit);
        assert_eq!(shell.execute("   ").await.unwrap(), Flow::Continue);
    }
}
