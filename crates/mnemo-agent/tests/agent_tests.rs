// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end agent runs against a scripted provider and a temporary corpus.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use mnemo_agent::{Agent, NO_MODEL_REPLY, RunContext};
use mnemo_config::model::MnemoConfig;
use mnemo_core::traits::Scheduler;
use mnemo_core::types::{ModelTier, NewJob, ProviderKind, ProviderMessage};
use mnemo_memory::{FixedClock, MemoryStore};
use mnemo_models::{Credentials, ModelRegistry, ModelSpec, default_catalog};
use mnemo_test_utils::{
    InMemoryScheduler, MockProvider, MockProviderFactory, text_response, tool_response,
};
use serde_json::json;
use tempfile::TempDir;
use tracing_test::traced_test;

struct Harness {
    dir: TempDir,
    provider: Arc<MockProvider>,
    factory: Arc<MockProviderFactory>,
    agent: Arc<Agent>,
}

fn anthropic_only() -> ModelRegistry {
    ModelRegistry::new(
        default_catalog(),
        Credentials::from_keys([(ProviderKind::Anthropic, "sk-ant-test".to_string())]),
    )
}

async fn harness_with(registry: ModelRegistry, config: impl FnOnce(&mut MnemoConfig)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("MEMORY.md"), "## User Profile\nName: Alek\n").unwrap();

    let mut cfg = MnemoConfig::default();
    cfg.memory.root_dir = dir.path().to_string_lossy().into_owned();
    config(&mut cfg);

    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    let store = Arc::new(MemoryStore::open_with_clock(&cfg.memory, None, clock).await.unwrap());

    let provider = Arc::new(MockProvider::new());
    let factory = Arc::new(MockProviderFactory::new(provider.clone()));
    let agent = Agent::builder(&cfg, store, factory.clone())
        .registry(registry)
        .build();
    agent.init().await.unwrap();

    Harness {
        dir,
        provider,
        factory,
        agent: Arc::new(agent),
    }
}

async fn harness() -> Harness {
    harness_with(anthropic_only(), |_| {}).await
}

fn ask(text: &str) -> Vec<ProviderMessage> {
    vec![ProviderMessage::user(text)]
}

#[tokio::test]
async fn no_credentials_returns_literal_error() {
    let registry = ModelRegistry::new(default_catalog(), Credentials::default());
    let h = harness_with(registry, |_| {}).await;

    assert_eq!(h.agent.run(&ask("hello")).await, NO_MODEL_REPLY);
    assert!(h.agent.get_model_info().is_none());
    assert!(h.agent.last_run_stats().is_none());
    assert_eq!(h.provider.call_count().await, 0);
}

#[tokio::test]
async fn init_picks_tool_capable_model_for_tier() {
    let h = harness().await;
    let model = h.agent.get_model_info().unwrap();
    assert_eq!(model.id, "claude-sonnet-4-5-20250929");
    assert_eq!(model.tier, ModelTier::Smart);
    assert_eq!(h.factory.built(), vec![model.id.clone()]);
}

#[tokio::test]
async fn configured_model_wins_even_if_unknown() {
    let h = harness_with(anthropic_only(), |cfg| {
        cfg.agent.model = Some("claude-experimental-9".to_string());
    })
    .await;
    let model = h.agent.get_model_info().unwrap();
    assert_eq!(model.id, "claude-experimental-9");
    assert!(model.custom);
    assert_eq!(model.provider, ProviderKind::Anthropic);
}

#[tokio::test]
async fn run_grounds_prompt_in_memory_and_logs_the_exchange() {
    let h = harness().await;
    h.provider.push(text_response("Hi Alek!")).await;

    let reply = h.agent.run(&ask("Do you remember my name?")).await;
    assert_eq!(reply, "Hi Alek!");

    let request = &h.provider.requests().await[0];
    let system = request.system_prompt.as_deref().unwrap();
    assert!(system.contains("# Long-term Memory"));
    assert!(system.contains("Name: Alek"));
    assert!(system.contains("# Onboarding"), "first run has no soul file");
    let tools: Vec<&str> = request
        .tools
        .as_ref()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(tools, vec!["memory_get", "memory_search", "memory_write"]);

    let stats = h.agent.last_run_stats().unwrap();
    assert_eq!(stats.model, "Claude Sonnet 4.5");
    assert_eq!(stats.input_tokens, 10);
    assert_eq!(stats.output_tokens, 20);

    let log = std::fs::read_to_string(h.dir.path().join("daily/2025-01-01.md")).unwrap();
    assert!(log.starts_with("# 2025-01-01\n"));
    assert!(log.contains("User: Do you remember my name? | Assistant: Hi Alek!"));
}

#[tokio::test]
async fn onboarding_ends_with_a_soul_file() {
    let h = harness().await;
    assert!(h.agent.needs_onboarding());

    h.agent.complete_onboarding().await.unwrap();
    assert!(!h.agent.needs_onboarding());
    assert!(h.dir.path().join("SOUL.md").exists());

    h.agent.run(&ask("hi")).await;
    let system = h.provider.requests().await[0].system_prompt.clone().unwrap();
    assert!(!system.contains("# Onboarding"));
    assert!(system.contains("# Soul"));
}

#[tokio::test]
async fn tool_calls_reach_the_per_call_observer() {
    let h = harness().await;
    h.provider
        .push(tool_response("memory_search", json!({"query": "Alek"})))
        .await;
    h.provider.push(text_response("Your name is Alek.")).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut ctx = RunContext::with_observer(move |name| sink.lock().unwrap().push(name.to_string()));

    let reply = h.agent.run_with_context(&ask("What's my name?"), &mut ctx).await;
    assert_eq!(reply, "Your name is Alek.");
    assert_eq!(seen.lock().unwrap().as_slice(), ["memory_search"]);

    let stats = ctx.stats.unwrap();
    assert_eq!(stats.input_tokens, 20);
    assert_eq!(stats.output_tokens, 40);
}

#[tokio::test]
#[traced_test]
async fn provider_errors_become_error_text() {
    let h = harness().await;
    h.provider.push_error("upstream timeout").await;

    let reply = h.agent.run(&ask("hello")).await;
    assert!(reply.starts_with("Error: "), "{reply}");
    assert!(reply.contains("upstream timeout"));
    assert!(logs_contain("run failed"));
    assert!(h.agent.last_run_stats().is_none());
}

#[tokio::test]
async fn long_conversations_flush_before_the_turn() {
    let small = ModelSpec {
        id: "tiny-model".to_string(),
        label: "Tiny".to_string(),
        provider: ProviderKind::Anthropic,
        tier: ModelTier::Smart,
        tool_use: true,
        vision: false,
        context_window: 1_000,
        custom: false,
    };
    let registry = ModelRegistry::new(
        vec![small],
        Credentials::from_keys([(ProviderKind::Anthropic, "sk-ant-test".to_string())]),
    );
    let h = harness_with(registry, |_| {}).await;

    h.provider
        .push(tool_response(
            "memory_write",
            json!({"path": "MEMORY.md", "content": "## Plans\nTrip to Kyoto in April\n"}),
        ))
        .await;
    h.provider.push(text_response("saved")).await;
    h.provider.push(text_response("Sounds like a great trip.")).await;

    // ~1000 tokens at 4 chars per token
    let messages = ask(&format!("I'm going to Kyoto in April. {}", "blah ".repeat(800)));
    let reply = h.agent.run(&messages).await;
    assert_eq!(reply, "Sounds like a great trip.");

    let requests = h.provider.requests().await;
    assert_eq!(requests.len(), 3);
    assert!(requests[0].system_prompt.as_deref().unwrap().contains("memory keeper"));
    let main_system = requests[2].system_prompt.as_deref().unwrap();
    assert!(main_system.contains("Trip to Kyoto in April"), "flushed fact is in the prompt");

    let memory = std::fs::read_to_string(h.dir.path().join("MEMORY.md")).unwrap();
    assert!(memory.contains("## User Profile\nName: Alek\n"));
    assert!(memory.contains("## Plans\nTrip to Kyoto in April\n"));
}

#[tokio::test]
async fn short_conversations_do_not_flush() {
    let h = harness().await;
    h.agent.run(&ask("hi")).await;
    assert_eq!(h.provider.call_count().await, 1);
}

#[tokio::test]
async fn set_model_accepts_known_and_custom_names() {
    let h = harness().await;

    let spec = h.agent.set_model("claude haiku 4.5").unwrap();
    assert_eq!(spec.id, "claude-haiku-4-5-20251001");
    assert!(h.agent.supports_vision());

    let spec = h.agent.set_model("llama-3.3-70b").unwrap();
    assert!(spec.custom);
    assert!(!h.agent.supports_vision());
    assert_eq!(h.agent.get_model_info().unwrap().id, "llama-3.3-70b");

    h.agent.run(&ask("hi")).await;
    assert_eq!(h.provider.requests().await[0].model, "llama-3.3-70b");

    let listed = h.agent.list_models();
    assert_eq!(listed.len(), default_catalog().len());
    assert!(
        listed
            .iter()
            .filter(|m| m.available)
            .all(|m| m.spec.provider == ProviderKind::Anthropic)
    );
}

#[tokio::test]
async fn scheduled_jobs_run_without_scheduling_tools() {
    let h = harness().await;
    let scheduler = Arc::new(InMemoryScheduler::new());
    h.agent.attach_scheduler(scheduler.clone()).await;

    assert!(scheduler.has_handler());
    assert!(h.agent.tool_names().await.contains(&"schedule_add".to_string()));

    let job = scheduler
        .add_job(NewJob {
            name: "morning brief".to_string(),
            schedule: "0 8 * * *".to_string(),
            prompt: "Summarise today's plans.".to_string(),
        })
        .await
        .unwrap();
    h.provider.push(text_response("Nothing planned today.")).await;

    let output = scheduler.fire(&job.id).await.unwrap();
    assert_eq!(output, "Nothing planned today.");

    let request = &h.provider.requests().await[0];
    let prompt = request.messages[0].text();
    assert!(prompt.starts_with("[Scheduled task: morning brief]"));
    assert!(prompt.ends_with("Summarise today's plans."));
    let names: Vec<&str> = request
        .tools
        .as_ref()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert!(names.iter().all(|n| !n.starts_with("schedule_")));
    assert!(names.contains(&"memory_search"));
}

#[tokio::test]
async fn dropped_agent_leaves_jobs_harmless() {
    let h = harness().await;
    let scheduler = Arc::new(InMemoryScheduler::new());
    h.agent.attach_scheduler(scheduler.clone()).await;
    let job = scheduler
        .add_job(NewJob {
            name: "ping".to_string(),
            schedule: "* * * * *".to_string(),
            prompt: "ping".to_string(),
        })
        .await
        .unwrap();

    drop(h.agent);
    let output = scheduler.fire(&job.id).await.unwrap();
    assert!(output.starts_with("Error: "));
}
