// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent: one memory-grounded, tool-enabled model turn per `run`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use arc_swap::ArcSwapOption;
use mnemo_config::model::{AgentConfig, MnemoConfig};
use mnemo_context::{
    FileSoul, FlushSettings, NoSkills, PromptParts, SkillSource, SoulSource, base_prompt,
    build_system_prompt, run_memory_flush, should_flush,
};
use mnemo_core::MnemoError;
use mnemo_core::traits::Scheduler;
use mnemo_core::types::{ProviderMessage, ProviderRequest, ScheduledJob};
use mnemo_memory::MemoryStore;
use mnemo_memory::types::truncate_chars;
use mnemo_models::{ModelHandle, ModelInfo, ModelRegistry, ModelSpec, ProviderFactory};
use mnemo_tools::{
    SCHEDULE_TOOL_NAMES, Tool, ToolRegistry, register_memory_tools, register_schedule_tools,
    run_tool_loop,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::run::{RunContext, RunStats};
use crate::scheduled::AgentJobHandler;

/// Provider calls allowed per run.
pub const MAX_STEPS: usize = 10;

/// Reply when no model could be resolved.
pub const NO_MODEL_REPLY: &str = "Error: No model available. Set an API key.";

/// Character cap of the exchange summary appended to the daily log.
pub const DAILY_SUMMARY_MAX_CHARS: usize = 500;

/// Assembles an [`Agent`]. Memory tools are always registered.
pub struct AgentBuilder {
    config: AgentConfig,
    flush: FlushSettings,
    registry: ModelRegistry,
    factory: Arc<dyn ProviderFactory>,
    store: Arc<MemoryStore>,
    soul: Option<Arc<dyn SoulSource>>,
    skills: Arc<dyn SkillSource>,
    tools: ToolRegistry,
}

impl AgentBuilder {
    pub fn new(
        config: &MnemoConfig,
        store: Arc<MemoryStore>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            config: config.agent.clone(),
            flush: FlushSettings::from(&config.context),
            registry: ModelRegistry::from_config(config),
            factory,
            store,
            soul: None,
            skills: Arc::new(NoSkills),
            tools: ToolRegistry::new(),
        }
    }

    /// Replaces the registry built from config.
    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Personality source. Defaults to `SOUL.md` in the memory root.
    pub fn soul(mut self, soul: Arc<dyn SoulSource>) -> Self {
        self.soul = Some(soul);
        self
    }

    pub fn skills(mut self, skills: Arc<dyn SkillSource>) -> Self {
        self.skills = skills;
        self
    }

    /// Registers an extra tool.
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn build(self) -> Agent {
        let mut tools = self.tools;
        register_memory_tools(&mut tools, self.store.clone());
        let soul: Arc<dyn SoulSource> = match self.soul {
            Some(soul) => soul,
            None => Arc::new(FileSoul::in_root(self.store.root())),
        };

        Agent {
            config: self.config,
            flush: self.flush,
            registry: self.registry,
            factory: self.factory,
            model: ArcSwapOption::empty(),
            store: self.store,
            soul,
            skills: self.skills,
            tools: RwLock::new(tools),
            first_run: AtomicBool::new(false),
            last_run_stats: Mutex::new(None),
        }
    }
}

/// Orchestrates model selection, prompt assembly, the tool loop and memory.
pub struct Agent {
    config: AgentConfig,
    flush: FlushSettings,
    registry: ModelRegistry,
    factory: Arc<dyn ProviderFactory>,
    model: ArcSwapOption<ModelHandle>,
    store: Arc<MemoryStore>,
    soul: Arc<dyn SoulSource>,
    skills: Arc<dyn SkillSource>,
    tools: RwLock<ToolRegistry>,
    first_run: AtomicBool,
    last_run_stats: Mutex<Option<RunStats>>,
}

impl Agent {
    pub fn builder(
        config: &MnemoConfig,
        store: Arc<MemoryStore>,
        factory: Arc<dyn ProviderFactory>,
    ) -> AgentBuilder {
        AgentBuilder::new(config, store, factory)
    }

    /// Indexes the memory corpus, detects a first run and resolves the
    /// initial model.
    ///
    /// An explicitly configured model wins; otherwise the best available
    /// model for the configured tier is used. Finding no model is not an
    /// error: [`run`](Self::run) then answers with [`NO_MODEL_REPLY`].
    pub async fn init(&self) -> Result<(), MnemoError> {
        self.store.init().await?;

        let first_run = !self.soul.exists().await;
        self.first_run.store(first_run, Ordering::SeqCst);

        match self.skills.load_all().await {
            Ok(count) => debug!(count, "skills loaded"),
            Err(e) => warn!(error = %e, "failed to load skills"),
        }

        let spec = match self.config.model.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(self.registry.resolve(name)),
            _ => self.registry.pick_best(self.config.tier),
        };
        let Some(spec) = spec else {
            warn!(tier = %self.config.tier, "no model available; set a provider API key");
            return Ok(());
        };

        match self.registry.build_handle(spec, self.factory.as_ref()) {
            Ok(handle) => {
                info!(model = %handle.spec.id, provider = %handle.spec.provider, first_run, "agent ready");
                self.model.store(Some(Arc::new(handle)));
            }
            Err(e) => warn!(error = %e, "failed to build model handle"),
        }
        Ok(())
    }

    /// Runs one turn. Never fails: errors come back as `"Error: ..."` text.
    pub async fn run(&self, messages: &[ProviderMessage]) -> String {
        let mut ctx = RunContext::new();
        self.run_with_context(messages, &mut ctx).await
    }

    /// Like [`run`](Self::run), reporting tool calls and stats through `ctx`.
    pub async fn run_with_context(&self, messages: &[ProviderMessage], ctx: &mut RunContext) -> String {
        let tools = self.tools.read().await.clone();
        self.execute(messages, ctx, tools).await
    }

    /// Runs a fired job's prompt without the scheduling tools.
    pub async fn run_scheduled(&self, job: &ScheduledJob) -> String {
        let tools = self.tools.read().await.without(&SCHEDULE_TOOL_NAMES);
        let messages = [ProviderMessage::user(format!(
            "[Scheduled task: {}] This request was started by a scheduled job. \
             Do not create, change or remove scheduled tasks while handling it.\n\n{}",
            job.name, job.prompt
        ))];
        let mut ctx = RunContext::new();
        info!(job = %job.name, id = %job.id, "running scheduled job");
        self.execute(&messages, &mut ctx, tools).await
    }

    async fn execute(
        &self,
        messages: &[ProviderMessage],
        ctx: &mut RunContext,
        tools: ToolRegistry,
    ) -> String {
        let Some(model) = self.model.load_full() else {
            return NO_MODEL_REPLY.to_string();
        };
        match self.turn(&model, messages, ctx, &tools).await {
            Ok(text) => text,
            Err(e) => {
                warn!(model = %model.spec.id, error = %e, "run failed");
                format!("Error: {e}")
            }
        }
    }

    async fn turn(
        &self,
        model: &ModelHandle,
        messages: &[ProviderMessage],
        ctx: &mut RunContext,
        tools: &ToolRegistry,
    ) -> Result<String, MnemoError> {
        let started = Instant::now();
        let provider = model.provider.as_ref();

        if should_flush(messages, model.spec.context_window, self.flush.threshold) {
            info!(model = %model.spec.id, "context near limit, flushing memory");
            if let Err(e) =
                run_memory_flush(provider, &model.spec.id, tools, messages, self.flush.max_tokens).await
            {
                warn!(error = %e, "memory flush failed");
            }
        }

        let system_prompt = self.system_prompt().await;
        let request = ProviderRequest {
            model: model.spec.id.clone(),
            system_prompt: Some(system_prompt),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            tools: None,
        };

        let outcome = run_tool_loop(provider, tools, request, MAX_STEPS, &mut |name: &str| {
            ctx.observe(name)
        })
        .await?;

        let stats = RunStats {
            model: model.spec.label.clone(),
            input_tokens: outcome.usage.input_tokens,
            output_tokens: outcome.usage.output_tokens,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        debug!(?stats, steps = outcome.steps, "run finished");
        ctx.stats = Some(stats.clone());
        *self
            .last_run_stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(stats);

        let summary = exchange_summary(messages, &outcome.text);
        if let Err(e) = self.store.append_to_daily(&summary).await {
            warn!(error = %e, "failed to log exchange to daily memory");
        }

        Ok(outcome.text)
    }

    async fn system_prompt(&self) -> String {
        let onboarding = self
            .first_run
            .load(Ordering::SeqCst)
            .then(|| self.soul.build_onboarding_prompt());
        build_system_prompt(&PromptParts {
            base: base_prompt(&self.config),
            soul: self.soul.build_context().await,
            onboarding,
            memory: self.store.build_prompt_context().await,
            skills: self.skills.build_context().await,
        })
    }

    /// Switches model. Unknown names are accepted as custom models.
    pub fn set_model(&self, name: &str) -> Result<ModelSpec, MnemoError> {
        let spec = self.registry.resolve(name);
        let handle = self.registry.build_handle(spec, self.factory.as_ref())?;
        info!(model = %handle.spec.id, custom = handle.spec.custom, "model switched");
        let spec = handle.spec.clone();
        self.model.store(Some(Arc::new(handle)));
        Ok(spec)
    }

    /// The current model, if any.
    pub fn get_model_info(&self) -> Option<ModelSpec> {
        self.model.load_full().map(|handle| handle.spec.clone())
    }

    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.registry.list()
    }

    /// Whether the current model accepts images.
    pub fn supports_vision(&self) -> bool {
        self.model
            .load_full()
            .is_some_and(|handle| handle.spec.vision)
    }

    pub fn needs_onboarding(&self) -> bool {
        self.first_run.load(Ordering::SeqCst)
    }

    /// Ends onboarding, creating a default soul file if none was written.
    pub async fn complete_onboarding(&self) -> Result<(), MnemoError> {
        self.soul.create_default().await?;
        self.first_run.store(false, Ordering::SeqCst);
        info!("onboarding complete");
        Ok(())
    }

    /// Stats of the most recent completed run.
    pub fn last_run_stats(&self) -> Option<RunStats> {
        self.last_run_stats
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Registers a tool for subsequent runs.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        self.tools.write().await.register(tool);
    }

    /// Sorted names of the registered tools.
    pub async fn tool_names(&self) -> Vec<String> {
        self.tools
            .read()
            .await
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Adds the scheduling tools and makes this agent the scheduler's job
    /// handler. The handler holds a weak reference.
    pub async fn attach_scheduler(self: &Arc<Self>, scheduler: Arc<dyn Scheduler>) {
        register_schedule_tools(&mut *self.tools.write().await, scheduler.clone());
        scheduler.set_handler(Arc::new(AgentJobHandler::new(Arc::downgrade(self))));
        info!("scheduler attached");
    }
}

/// One-line record of an exchange for the daily log.
fn exchange_summary(messages: &[ProviderMessage], reply: &str) -> String {
    let asked = messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(ProviderMessage::text)
        .unwrap_or_default();
    let line = format!("User: {} | Assistant: {}", collapse(&asked), collapse(reply));
    truncate_chars(&line, DAILY_SUMMARY_MAX_CHARS).to_string()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
