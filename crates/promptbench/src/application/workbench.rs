//! Workbench - the live editing state
//!
//! Holds the model configs (each with its own prompts), the global variable
//! list and the global prompt pair. The model and variable collections are
//! copy-on-write: every mutation builds a new collection and swaps it in, so
//! a snapshot taken with [`Workbench::models`] or [`Workbench::variables`]
//! never changes underneath its holder.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::{
    ModelConfig, ModelDefaults, ModelSnapshot, ModelUpdate, Prompt, PromptContent, PromptField,
    SavedModel, SavedPrompt, SavedVariableSet, Variable, VariableField,
};
use crate::services::dispatch::{
    build_request, error_output, DispatchOutcome, PendingDispatch, ProviderRegistry,
};

/// One entry of a run-all report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub model_id: Uuid,
    pub prompt_id: Uuid,
    pub outcome: DispatchOutcome,
}

/// Live workbench state
#[derive(Debug, Clone)]
pub struct Workbench {
    models: Arc<Vec<ModelConfig>>,
    variables: Arc<Vec<Variable>>,
    global_prompt: PromptContent,
    use_global_prompt: bool,
    defaults: ModelDefaults,
    in_flight: HashSet<(Uuid, Uuid)>,
}

impl Workbench {
    /// A workbench with one default model and no variables
    pub fn new(defaults: ModelDefaults) -> Self {
        let first = ModelConfig::new(&defaults);
        Self {
            models: Arc::new(vec![first]),
            variables: Arc::new(Vec::new()),
            global_prompt: PromptContent::default(),
            use_global_prompt: false,
            defaults,
            in_flight: HashSet::new(),
        }
    }

    // ============================================
    // Accessors
    // ============================================

    pub fn models(&self) -> Arc<Vec<ModelConfig>> {
        Arc::clone(&self.models)
    }

    pub fn model(&self, model_id: Uuid) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == model_id)
    }

    pub fn variables(&self) -> Arc<Vec<Variable>> {
        Arc::clone(&self.variables)
    }

    pub fn global_prompt(&self) -> &PromptContent {
        &self.global_prompt
    }

    pub fn uses_global_prompt(&self) -> bool {
        self.use_global_prompt
    }

    pub fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    pub fn is_in_flight(&self, model_id: Uuid, prompt_id: Uuid) -> bool {
        self.in_flight.contains(&(model_id, prompt_id))
    }

    // ============================================
    // Models
    // ============================================

    /// Append a model built from the defaults and return its ID
    pub fn add_model(&mut self) -> Uuid {
        let model = ModelConfig::new(&self.defaults);
        let id = model.id;
        let mut next = self.models.as_ref().clone();
        next.push(model);
        self.models = Arc::new(next);
        id
    }

    /// Replace one settings field of a model
    pub fn update_model(&mut self, model_id: Uuid, update: ModelUpdate) -> bool {
        self.map_model(model_id, |model| model.with_update(update))
    }

    pub fn remove_model(&mut self, model_id: Uuid) -> bool {
        if self.model(model_id).is_none() {
            return false;
        }
        let next = self
            .models
            .iter()
            .filter(|m| m.id != model_id)
            .cloned()
            .collect();
        self.models = Arc::new(next);
        true
    }

    // ============================================
    // Prompts
    // ============================================

    /// Append a blank prompt to a model and return its ID
    pub fn add_prompt(&mut self, model_id: Uuid) -> Option<Uuid> {
        let prompt = Prompt::new();
        let id = prompt.id;
        let added = self.map_model(model_id, |model| {
            let mut prompts = model.prompts.clone();
            prompts.push(prompt);
            model.with_prompts(prompts)
        });
        added.then_some(id)
    }

    pub fn update_prompt(
        &mut self,
        model_id: Uuid,
        prompt_id: Uuid,
        field: PromptField,
        value: impl Into<String>,
    ) -> bool {
        let value = value.into();
        self.map_prompt(model_id, prompt_id, |prompt| prompt.with_field(field, value))
    }

    pub fn remove_prompt(&mut self, model_id: Uuid, prompt_id: Uuid) -> bool {
        let exists = self
            .model(model_id)
            .is_some_and(|m| m.prompt(prompt_id).is_some());
        if !exists {
            return false;
        }
        self.map_model(model_id, |model| {
            let prompts = model
                .prompts
                .iter()
                .filter(|p| p.id != prompt_id)
                .cloned()
                .collect();
            model.with_prompts(prompts)
        })
    }

    // ============================================
    // Variables
    // ============================================

    /// Append a blank variable and return its index
    pub fn add_variable(&mut self) -> usize {
        let mut next = self.variables.as_ref().clone();
        next.push(Variable::default());
        self.variables = Arc::new(next);
        self.variables.len() - 1
    }

    pub fn update_variable(
        &mut self,
        index: usize,
        field: VariableField,
        value: impl Into<String>,
    ) -> bool {
        if index >= self.variables.len() {
            return false;
        }
        let mut next = self.variables.as_ref().clone();
        next[index] = next[index].with_field(field, value);
        self.variables = Arc::new(next);
        true
    }

    pub fn remove_variable(&mut self, index: usize) -> bool {
        if index >= self.variables.len() {
            return false;
        }
        let next = self
            .variables
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, v)| v.clone())
            .collect();
        self.variables = Arc::new(next);
        true
    }

    /// Replace the whole variable list
    pub fn set_variables(&mut self, variables: Vec<Variable>) {
        self.variables = Arc::new(variables);
    }

    // ============================================
    // Global prompt
    // ============================================

    pub fn set_global_prompt(&mut self, field: PromptField, value: impl Into<String>) -> bool {
        match field {
            PromptField::SystemPrompt => self.global_prompt.system_prompt = value.into(),
            PromptField::UserPrompt => self.global_prompt.user_prompt = value.into(),
            PromptField::Output => return false,
        }
        true
    }

    /// Flip global-prompt mode and return the new setting
    pub fn toggle_global_prompt(&mut self) -> bool {
        self.use_global_prompt = !self.use_global_prompt;
        self.use_global_prompt
    }

    pub fn set_global_mode(&mut self, enabled: bool) {
        self.use_global_prompt = enabled;
    }

    // ============================================
    // Snapshots
    // ============================================

    /// Text pair a "save prompt" action captures
    ///
    /// In global mode this is the global pair and `target` is ignored.
    pub fn prompt_content(&self, target: Option<(Uuid, Uuid)>) -> Result<PromptContent, DomainError> {
        if self.use_global_prompt {
            return Ok(self.global_prompt.clone());
        }
        let (model_id, prompt_id) =
            target.ok_or_else(|| DomainError::validation("No prompt selected to save"))?;
        let model = self
            .model(model_id)
            .ok_or_else(|| DomainError::not_found("ModelConfig", model_id))?;
        let prompt = model
            .prompt(prompt_id)
            .ok_or_else(|| DomainError::not_found("Prompt", prompt_id))?;
        Ok(PromptContent::from(prompt))
    }

    /// Settings a "save model" action captures
    pub fn model_snapshot(&self, model_id: Uuid) -> Result<ModelSnapshot, DomainError> {
        self.model(model_id)
            .map(ModelSnapshot::from)
            .ok_or_else(|| DomainError::not_found("ModelConfig", model_id))
    }

    /// Load a saved prompt pair
    ///
    /// Global mode overwrites the global pair; otherwise every live prompt's
    /// text is overwritten and outputs are kept.
    pub fn load_prompt(&mut self, saved: &SavedPrompt) {
        let content = &saved.content;
        if self.use_global_prompt {
            self.global_prompt = content.clone();
            return;
        }
        let next = self
            .models
            .iter()
            .map(|model| {
                let prompts = model
                    .prompts
                    .iter()
                    .map(|prompt| Prompt {
                        system_prompt: content.system_prompt.clone(),
                        user_prompt: content.user_prompt.clone(),
                        ..prompt.clone()
                    })
                    .collect();
                model.with_prompts(prompts)
            })
            .collect();
        self.models = Arc::new(next);
    }

    /// Load saved settings into one model, keeping its ID and prompts
    pub fn load_model(&mut self, saved: &SavedModel, model_id: Uuid) -> bool {
        self.map_model(model_id, |model| model.with_snapshot(&saved.config))
    }

    /// Replace the live variable list with a saved set
    pub fn load_variables(&mut self, saved: &SavedVariableSet) {
        self.set_variables(saved.variables.clone());
    }

    // ============================================
    // Dispatch
    // ============================================

    /// Snapshot a prompt for dispatch and mark it in flight
    ///
    /// Returns the outcome directly when nothing is to be sent: unknown
    /// target, non-first prompt in global mode, a dispatch already in flight,
    /// or a provider with no request path.
    ///
    /// The marker stays set until [`Workbench::finish_dispatch`] or
    /// [`Workbench::cancel_dispatch`] is called with the returned handle. A
    /// caller that drops the send future (or a [`Workbench::run_prompt`]
    /// future) part way must cancel, or the prompt reports `Busy` for the
    /// rest of the session.
    pub fn begin_dispatch(
        &mut self,
        registry: &ProviderRegistry,
        model_id: Uuid,
        prompt_id: Uuid,
    ) -> Result<PendingDispatch, DispatchOutcome> {
        let model = self.model(model_id).ok_or(DispatchOutcome::Skipped)?;
        let prompt = model.prompt(prompt_id).ok_or(DispatchOutcome::Skipped)?;

        let content = if self.use_global_prompt {
            if model.prompts.first().map(|p| p.id) != Some(prompt_id) {
                return Err(DispatchOutcome::Skipped);
            }
            self.global_prompt.clone()
        } else {
            PromptContent::from(prompt)
        };

        let provider = registry
            .get(model.provider)
            .ok_or(DispatchOutcome::Unsupported(model.provider))?;

        if self.is_in_flight(model_id, prompt_id) {
            return Err(DispatchOutcome::Busy);
        }

        let request = build_request(model, &content, &self.variables);
        self.in_flight.insert((model_id, prompt_id));
        Ok(PendingDispatch::new(model_id, prompt_id, request, provider))
    }

    /// Record a dispatch result and clear the in-flight marker
    ///
    /// If the target was removed meanwhile the result is dropped.
    pub fn finish_dispatch(
        &mut self,
        pending: &PendingDispatch,
        result: Result<String, DomainError>,
    ) -> DispatchOutcome {
        let (model_id, prompt_id) = (pending.model_id, pending.prompt_id);
        self.in_flight.remove(&(model_id, prompt_id));

        let (output, outcome) = match result {
            Ok(text) => (text, DispatchOutcome::Completed),
            Err(err) => {
                tracing::warn!(%model_id, %prompt_id, error = %err, "Dispatch failed");
                let output = error_output(&err);
                (output.clone(), DispatchOutcome::Failed(output))
            }
        };

        if self.update_prompt(model_id, prompt_id, PromptField::Output, output) {
            outcome
        } else {
            tracing::debug!(%model_id, %prompt_id, "Dispatch target gone, result dropped");
            DispatchOutcome::Skipped
        }
    }

    /// Abandon a dispatch without recording a result
    pub fn cancel_dispatch(&mut self, pending: PendingDispatch) {
        let (model_id, prompt_id) = (pending.model_id, pending.prompt_id);
        self.in_flight.remove(&(model_id, prompt_id));
        tracing::debug!(%model_id, %prompt_id, "Dispatch cancelled");
    }

    /// Run one prompt and write its output
    pub async fn run_prompt(
        &mut self,
        registry: &ProviderRegistry,
        model_id: Uuid,
        prompt_id: Uuid,
    ) -> DispatchOutcome {
        let pending = match self.begin_dispatch(registry, model_id, prompt_id) {
            Ok(pending) => pending,
            Err(outcome) => {
                tracing::info!(%model_id, %prompt_id, ?outcome, "Prompt not dispatched");
                return outcome;
            }
        };
        let result = pending.send().await;
        let outcome = self.finish_dispatch(&pending, result);
        tracing::info!(%model_id, %prompt_id, completed = outcome.is_completed(), "Prompt run finished");
        outcome
    }

    /// Run every runnable prompt one after another
    ///
    /// Models run in declaration order and prompts in list order; each
    /// dispatch completes before the next starts. In global mode only each
    /// model's first prompt runs, carrying the global pair.
    pub async fn run_all(&mut self, registry: &ProviderRegistry) -> Vec<RunReport> {
        let targets: Vec<(Uuid, Uuid)> = self
            .models
            .iter()
            .flat_map(|model| {
                let prompts: Vec<&Prompt> = if self.use_global_prompt {
                    model.prompts.iter().take(1).collect()
                } else {
                    model.prompts.iter().collect()
                };
                prompts.into_iter().map(move |p| (model.id, p.id))
            })
            .collect();

        let mut reports = Vec::with_capacity(targets.len());
        for (model_id, prompt_id) in targets {
            let outcome = self.run_prompt(registry, model_id, prompt_id).await;
            reports.push(RunReport {
                model_id,
                prompt_id,
                outcome,
            });
        }
        reports
    }

    // ============================================
    // Copy-on-write helpers
    // ============================================

    fn map_model(&mut self, model_id: Uuid, f: impl FnOnce(&ModelConfig) -> ModelConfig) -> bool {
        let Some(pos) = self.models.iter().position(|m| m.id == model_id) else {
            return false;
        };
        let mut next = self.models.as_ref().clone();
        next[pos] = f(&self.models[pos]);
        self.models = Arc::new(next);
        true
    }

    fn map_prompt(
        &mut self,
        model_id: Uuid,
        prompt_id: Uuid,
        f: impl FnOnce(&Prompt) -> Prompt,
    ) -> bool {
        let Some(pos) = self
            .model(model_id)
            .and_then(|m| m.prompts.iter().position(|p| p.id == prompt_id))
        else {
            return false;
        };
        self.map_model(model_id, |model| {
            let mut prompts = model.prompts.clone();
            prompts[pos] = f(&prompts[pos]);
            model.with_prompts(prompts)
        })
    }
}

impl Default for Workbench {
    fn default() -> Self {
        Self::new(ModelDefaults::default())
    }
}
