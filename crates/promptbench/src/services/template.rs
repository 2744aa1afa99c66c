//! Template substitution
//!
//! Replaces `{name}` tokens with variable values. Matching is literal and
//! case-sensitive. When several variables share a name the one declared
//! last wins. Inserted values are never re-scanned, so a value that
//! contains `{other}` comes through verbatim.

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::{PromptContent, Variable};

/// Substitute every bound `{name}` token in `text`
pub fn substitute(text: &str, variables: &[Variable]) -> String {
    if variables.is_empty() {
        return text.to_string();
    }

    let mut bindings: HashMap<&str, &str> = HashMap::with_capacity(variables.len());
    for variable in variables {
        bindings.insert(variable.name.as_str(), variable.value.as_str());
    }
    // Longest names first so `{a}b}` prefers a variable named `a}b` over `a`
    let mut names: Vec<&str> = bindings.keys().copied().collect();
    names.sort_by_key(|name| Reverse(name.len()));

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let matched = names.iter().copied().find(|name| {
            after
                .strip_prefix(name)
                .is_some_and(|tail| tail.starts_with('}'))
        });
        match matched {
            Some(name) => {
                out.push_str(bindings[name]);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Substitute both halves of a prompt pair
pub fn substitute_pair(content: &PromptContent, variables: &[Variable]) -> PromptContent {
    PromptContent {
        system_prompt: substitute(&content.system_prompt, variables),
        user_prompt: substitute(&content.user_prompt, variables),
    }
}
