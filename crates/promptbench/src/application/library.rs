//! Snapshot library - named prompts, models and variable sets
//!
//! Each collection is read once when the library is opened and written back
//! in full after every save or remove.

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::Workbench;
use crate::domain::errors::DomainError;
use crate::domain::{
    ModelSnapshot, Named, PromptContent, SavedModel, SavedPrompt, SavedVariableSet, Variable,
};
use crate::ports::KeyValueStore;

pub const SAVED_PROMPTS_KEY: &str = "savedPrompts";
pub const SAVED_MODELS_KEY: &str = "savedModels";
pub const SAVED_VARIABLES_KEY: &str = "savedVariables";

/// Saved collections bound to a key-value store
#[derive(Debug)]
pub struct SnapshotLibrary<S: KeyValueStore> {
    store: S,
    prompts: Vec<SavedPrompt>,
    models: Vec<SavedModel>,
    variable_sets: Vec<SavedVariableSet>,
}

impl<S: KeyValueStore> SnapshotLibrary<S> {
    /// Load all three collections; absent keys load as empty
    ///
    /// Stored data that does not parse fails with
    /// [`DomainError::CorruptStore`] and is left as it is.
    pub fn open(store: S) -> Result<Self, DomainError> {
        let prompts = read_collection(&store, SAVED_PROMPTS_KEY)?;
        let models = read_collection(&store, SAVED_MODELS_KEY)?;
        let variable_sets = read_collection(&store, SAVED_VARIABLES_KEY)?;
        tracing::debug!(
            prompts = prompts.len(),
            models = models.len(),
            variable_sets = variable_sets.len(),
            "Snapshot library loaded"
        );
        Ok(Self {
            store,
            prompts,
            models,
            variable_sets,
        })
    }

    pub fn prompts(&self) -> &[SavedPrompt] {
        &self.prompts
    }

    pub fn models(&self) -> &[SavedModel] {
        &self.models
    }

    pub fn variable_sets(&self) -> &[SavedVariableSet] {
        &self.variable_sets
    }

    // ============================================
    // Lookup (first match wins on duplicate names)
    // ============================================

    pub fn find_prompt(&self, name: &str) -> Option<&SavedPrompt> {
        find_by_name(&self.prompts, name)
    }

    pub fn find_model(&self, name: &str) -> Option<&SavedModel> {
        find_by_name(&self.models, name)
    }

    pub fn find_variable_set(&self, name: &str) -> Option<&SavedVariableSet> {
        find_by_name(&self.variable_sets, name)
    }

    // ============================================
    // Save
    // ============================================

    pub fn save_prompt(&mut self, name: &str, content: PromptContent) -> Result<(), DomainError> {
        let entry = SavedPrompt {
            name: checked_name(name)?,
            content,
        };
        append(&self.store, SAVED_PROMPTS_KEY, &mut self.prompts, entry)
    }

    pub fn save_model(&mut self, name: &str, config: ModelSnapshot) -> Result<(), DomainError> {
        let entry = SavedModel {
            name: checked_name(name)?,
            config,
        };
        append(&self.store, SAVED_MODELS_KEY, &mut self.models, entry)
    }

    pub fn save_variable_set(
        &mut self,
        name: &str,
        variables: Vec<Variable>,
    ) -> Result<(), DomainError> {
        let entry = SavedVariableSet {
            name: checked_name(name)?,
            variables,
        };
        append(&self.store, SAVED_VARIABLES_KEY, &mut self.variable_sets, entry)
    }

    /// Save the workbench's prompt pair (the global pair in global mode)
    pub fn save_prompt_from(
        &mut self,
        workbench: &Workbench,
        name: &str,
        target: Option<(Uuid, Uuid)>,
    ) -> Result<(), DomainError> {
        let content = workbench.prompt_content(target)?;
        self.save_prompt(name, content)
    }

    /// Save a live model's settings without its ID
    pub fn save_model_from(
        &mut self,
        workbench: &Workbench,
        name: &str,
        model_id: Uuid,
    ) -> Result<(), DomainError> {
        let snapshot = workbench.model_snapshot(model_id)?;
        self.save_model(name, snapshot)
    }

    /// Save the live variable list
    pub fn save_variables_from(
        &mut self,
        workbench: &Workbench,
        name: &str,
    ) -> Result<(), DomainError> {
        self.save_variable_set(name, workbench.variables().as_ref().clone())
    }

    // ============================================
    // Remove
    // ============================================

    pub fn remove_prompt(&mut self, index: usize) -> Result<bool, DomainError> {
        remove_at(&self.store, SAVED_PROMPTS_KEY, &mut self.prompts, index)
    }

    pub fn remove_model(&mut self, index: usize) -> Result<bool, DomainError> {
        remove_at(&self.store, SAVED_MODELS_KEY, &mut self.models, index)
    }

    pub fn remove_variable_set(&mut self, index: usize) -> Result<bool, DomainError> {
        remove_at(&self.store, SAVED_VARIABLES_KEY, &mut self.variable_sets, index)
    }
}

fn checked_name(name: &str) -> Result<String, DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Snapshot name must not be empty"));
    }
    Ok(name.to_string())
}

fn find_by_name<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

fn read_collection<T: DeserializeOwned>(
    store: &impl KeyValueStore,
    key: &str,
) -> Result<Vec<T>, DomainError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(key, error = %e, "Stored snapshots are malformed");
            DomainError::corrupt_store(key, e)
        }),
        None => Ok(Vec::new()),
    }
}

fn write_collection<T: Serialize>(
    store: &impl KeyValueStore,
    key: &str,
    items: &[T],
) -> Result<(), DomainError> {
    let raw = serde_json::to_string(items)
        .map_err(|e| DomainError::Storage(format!("Failed to serialize {}: {}", key, e)))?;
    store.set(key, &raw)
}

// The in-memory collection only changes once the write succeeded
fn append<T: Serialize + Clone>(
    store: &impl KeyValueStore,
    key: &str,
    items: &mut Vec<T>,
    entry: T,
) -> Result<(), DomainError> {
    let mut next = items.clone();
    next.push(entry);
    write_collection(store, key, &next)?;
    *items = next;
    tracing::info!(key, count = items.len(), "Snapshot saved");
    Ok(())
}

fn remove_at<T: Serialize + Clone>(
    store: &impl KeyValueStore,
    key: &str,
    items: &mut Vec<T>,
    index: usize,
) -> Result<bool, DomainError> {
    if index >= items.len() {
        return Ok(false);
    }
    let mut next = items.clone();
    next.remove(index);
    write_collection(store, key, &next)?;
    *items = next;
    tracing::info!(key, index, "Snapshot removed");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FileStore, MemoryStore};
    use crate::domain::{ModelUpdate, PromptField};

    #[test]
    fn test_missing_keys_load_empty() {
        let library = SnapshotLibrary::open(MemoryStore::new()).unwrap();
        assert!(library.prompts().is_empty());
        assert!(library.models().is_empty());
        assert!(library.variable_sets().is_empty());
    }

    #[test]
    fn test_variable_set_round_trip() {
        let store = MemoryStore::new();
        let mut library = SnapshotLibrary::open(store.clone()).unwrap();
        let mut bench = Workbench::default();
        bench.set_variables(vec![Variable::new("a", "1")]);
        library.save_variables_from(&bench, "X").unwrap();

        let reloaded = SnapshotLibrary::open(store).unwrap();
        let saved = reloaded.find_variable_set("X").unwrap();
        let mut fresh = Workbench::default();
        fresh.load_variables(saved);
        assert_eq!(fresh.variables().as_ref(), &vec![Variable::new("a", "1")]);
    }

    #[test]
    fn test_saved_model_excludes_id_and_loads_into_other_model() {
        let store = MemoryStore::new();
        let mut library = SnapshotLibrary::open(store.clone()).unwrap();
        let mut bench = Workbench::default();
        let source = bench.models()[0].id;
        bench.update_model(source, ModelUpdate::Model("gpt-4o".into()));
        bench.update_model(source, ModelUpdate::Temperature(0.2));
        library.save_model_from(&bench, "precise", source).unwrap();

        let raw = store.get(SAVED_MODELS_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json[0]["config"].get("id").is_none());
        assert_eq!(json[0]["name"], "precise");

        let target = bench.add_model();
        let target_prompts = bench.model(target).unwrap().prompts.clone();
        let saved = library.find_model("precise").unwrap().clone();
        assert!(bench.load_model(&saved, target));

        let loaded = bench.model(target).unwrap();
        assert_eq!(loaded.id, target);
        assert_eq!(loaded.prompts, target_prompts);
        assert_eq!(loaded.model, "gpt-4o");
        assert_eq!(loaded.temperature, 0.2);
    }

    #[test]
    fn test_save_prompt_from_local_and_global() {
        let mut library = SnapshotLibrary::open(MemoryStore::new()).unwrap();
        let mut bench = Workbench::default();
        let model_id = bench.models()[0].id;
        let prompt_id = bench.models()[0].prompts[0].id;
        bench.update_prompt(model_id, prompt_id, PromptField::SystemPrompt, "local sys");
        bench.set_global_prompt(PromptField::SystemPrompt, "global sys");

        library
            .save_prompt_from(&bench, "local", Some((model_id, prompt_id)))
            .unwrap();
        bench.set_global_mode(true);
        library.save_prompt_from(&bench, "global", None).unwrap();

        assert_eq!(library.prompts()[0].content.system_prompt, "local sys");
        assert_eq!(library.prompts()[1].content.system_prompt, "global sys");
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let store = MemoryStore::new();
        let mut library = SnapshotLibrary::open(store.clone()).unwrap();
        let err = library
            .save_prompt("  ", PromptContent::default())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(library.prompts().is_empty());
        assert_eq!(store.get(SAVED_PROMPTS_KEY).unwrap(), None);
    }

    #[test]
    fn test_duplicate_names_coexist_first_match_wins() {
        let mut library = SnapshotLibrary::open(MemoryStore::new()).unwrap();
        library
            .save_prompt("dup", PromptContent::new("first", ""))
            .unwrap();
        library
            .save_prompt("dup", PromptContent::new("second", ""))
            .unwrap();
        assert_eq!(library.prompts().len(), 2);
        assert_eq!(library.find_prompt("dup").unwrap().content.system_prompt, "first");
    }

    #[test]
    fn test_remove_by_index_persists() {
        let store = MemoryStore::new();
        let mut library = SnapshotLibrary::open(store.clone()).unwrap();
        library.save_variable_set("a", vec![]).unwrap();
        library.save_variable_set("b", vec![]).unwrap();

        assert!(library.remove_variable_set(0).unwrap());
        assert!(!library.remove_variable_set(5).unwrap());

        let reloaded = SnapshotLibrary::open(store).unwrap();
        assert_eq!(reloaded.variable_sets().len(), 1);
        assert_eq!(reloaded.variable_sets()[0].name, "b");
    }

    #[test]
    fn test_malformed_store_fails_with_key() {
        let store = MemoryStore::new();
        store.set(SAVED_MODELS_KEY, "{not json").unwrap();

        let err = SnapshotLibrary::open(store.clone()).unwrap_err();
        match err {
            DomainError::CorruptStore { key, .. } => assert_eq!(key, SAVED_MODELS_KEY),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(store.get(SAVED_MODELS_KEY).unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_reads_browser_shaped_json() {
        let store = MemoryStore::new();
        store
            .set(
                SAVED_PROMPTS_KEY,
                r#"[{"name":"greet","content":{"systemPrompt":"s","userPrompt":"u"}}]"#,
            )
            .unwrap();
        store
            .set(
                SAVED_MODELS_KEY,
                r#"[{"name":"m","config":{"provider":"openai","model":"gpt-4","temperature":0.2,"maxTokens":300,"apiKey":"sk-test","endpoint":"https://example.test/v1/chat/completions","prompts":[{"id":1700000000000,"systemPrompt":"","userPrompt":"","output":""}]}}]"#,
            )
            .unwrap();
        store
            .set(
                SAVED_VARIABLES_KEY,
                r#"[{"name":"set","variables":[{"name":"a","value":"1"}]}]"#,
            )
            .unwrap();

        let library = SnapshotLibrary::open(store).unwrap();
        assert_eq!(library.prompts()[0].content, PromptContent::new("s", "u"));
        assert_eq!(library.variable_sets()[0].variables[0], Variable::new("a", "1"));

        let mut bench = Workbench::default();
        let model_id = bench.models()[0].id;
        assert!(bench.load_model(&library.models()[0], model_id));
        let loaded = bench.model(model_id).unwrap();
        assert_eq!(loaded.model, "gpt-4");
        assert_eq!(loaded.max_tokens, 300);
        assert_eq!(loaded.prompts.len(), 1);
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut library = SnapshotLibrary::open(FileStore::open(dir.path()).unwrap()).unwrap();
            library
                .save_prompt("kept", PromptContent::new("sys", "user"))
                .unwrap();
        }
        let library = SnapshotLibrary::open(FileStore::open(dir.path()).unwrap()).unwrap();
        assert_eq!(library.prompts().len(), 1);
        assert_eq!(library.prompts()[0].name, "kept");
    }
}
