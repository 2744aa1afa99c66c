//! Terminal rendering for workbench state and saved snapshots

use clap::ValueEnum;
use colored::Colorize;
use promptbench::{
    DispatchOutcome, KeyValueStore, ModelConfig, SnapshotLibrary, Variable, Workbench,
};

/// Saved collection selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SavedKind {
    #[value(alias = "prompt")]
    Prompts,
    #[value(alias = "model")]
    Models,
    #[value(aliases = ["vars", "variable"])]
    Variables,
}

pub fn print_models(bench: &Workbench) {
    let models = bench.models();
    if models.is_empty() {
        println!("No models. Add one with {}", "model add".cyan());
        return;
    }
    for (i, model) in models.iter().enumerate() {
        print_model(i + 1, model, bench.uses_global_prompt());
    }
}

fn print_model(position: usize, model: &ModelConfig, global: bool) {
    let key = if model.api_key.is_empty() {
        "no key".red()
    } else {
        "key set".green()
    };
    println!(
        "{} {} [{}] temp {} max {} {} {}",
        format!("m{}", position).bold(),
        model.model.cyan().bold(),
        model.provider.to_string().yellow(),
        model.temperature,
        model.max_tokens,
        key,
        model.endpoint.dimmed()
    );
    for (j, prompt) in model.prompts.iter().enumerate() {
        let label = format!("  p{}", j + 1);
        if global && j > 0 {
            println!("{} {}", label.dimmed(), "(not run in global mode)".dimmed());
            continue;
        }
        println!(
            "{} {} {}",
            label,
            "system:".dimmed(),
            truncate_string(&prompt.system_prompt, 60)
        );
        println!(
            "     {} {}",
            "user:".dimmed(),
            truncate_string(&prompt.user_prompt, 60)
        );
        if !prompt.output.is_empty() {
            println!(
                "     {} {}",
                "output:".dimmed(),
                truncate_string(&prompt.output, 60)
            );
        }
    }
}

pub fn print_variables(variables: &[Variable]) {
    if variables.is_empty() {
        println!("No variables.");
        return;
    }
    for (i, variable) in variables.iter().enumerate() {
        println!(
            "  {} {} = {}",
            format!("v{}", i + 1).bold(),
            variable.token().cyan(),
            truncate_string(&variable.value, 60)
        );
    }
}

pub fn print_saved<S: KeyValueStore>(library: &SnapshotLibrary<S>, kind: Option<SavedKind>) {
    let show = |k: SavedKind| kind.is_none() || kind == Some(k);

    if show(SavedKind::Prompts) {
        println!("{}", "Saved prompts:".bold());
        if library.prompts().is_empty() {
            println!("  {}", "none".dimmed());
        }
        for (i, saved) in library.prompts().iter().enumerate() {
            println!(
                "  #{} {} {}",
                i + 1,
                saved.name.cyan(),
                truncate_string(&saved.content.user_prompt, 50).dimmed()
            );
        }
    }

    if show(SavedKind::Models) {
        println!("{}", "Saved models:".bold());
        if library.models().is_empty() {
            println!("  {}", "none".dimmed());
        }
        for (i, saved) in library.models().iter().enumerate() {
            println!(
                "  #{} {} {} [{}]",
                i + 1,
                saved.name.cyan(),
                saved.config.model,
                saved.config.provider.to_string().yellow()
            );
        }
    }

    if show(SavedKind::Variables) {
        println!("{}", "Saved variable sets:".bold());
        if library.variable_sets().is_empty() {
            println!("  {}", "none".dimmed());
        }
        for (i, saved) in library.variable_sets().iter().enumerate() {
            let names: Vec<&str> = saved.variables.iter().map(|v| v.name.as_str()).collect();
            println!(
                "  #{} {} ({})",
                i + 1,
                saved.name.cyan(),
                names.join(", ").dimmed()
            );
        }
    }
}

/// One-line summary of a dispatch outcome
pub fn outcome_label(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Completed => "done".green().to_string(),
        DispatchOutcome::Failed(_) => "failed".red().to_string(),
        DispatchOutcome::Unsupported(provider) => {
            format!("{} has no request path", provider).yellow().to_string()
        }
        DispatchOutcome::Skipped => "skipped".dimmed().to_string(),
        DispatchOutcome::Busy => "already running".yellow().to_string(),
    }
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    let flat = s.replace('\n', " ");
    let chars: Vec<char> = flat.chars().take(max_chars).collect();
    if flat.chars().count() > max_chars {
        format!("{}...", chars.into_iter().collect::<String>())
    } else {
        flat
    }
}
