// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subcommand implementations for the `mnemo` binary.
//!
//! Commands that print tables honor `--json` for scripting and disable
//! colors under `--plain` or when stdout is not a TTY.

use std::io::IsTerminal;

use mnemo_config::MnemoConfig;
use mnemo_config::model::EmbeddingProviderKind;
use mnemo_core::MnemoError;
use mnemo_memory::{IndexStats, MemoryStore, SearchResult, embedder_from_config};
use mnemo_models::{ModelInfo, ModelRegistry};
use serde::Serialize;
use tracing::info;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub root: String,
    pub index: IndexStats,
    pub embedding: String,
    pub model: Option<String>,
    pub providers: Vec<String>,
}

async fn open_store(config: &MnemoConfig) -> Result<MemoryStore, MnemoError> {
    let embedder = embedder_from_config(&config.memory.embedding, &config.providers)?;
    let store = MemoryStore::open(&config.memory, embedder).await?;
    store.init().await?;
    Ok(store)
}

fn embedding_label(config: &MnemoConfig) -> String {
    let embedding = &config.memory.embedding;
    let provider = match embedding.provider {
        EmbeddingProviderKind::None => return "none (keyword search only)".to_string(),
        EmbeddingProviderKind::OpenAi => "openai",
        EmbeddingProviderKind::Ollama => "ollama",
    };
    match &embedding.model {
        Some(model) => format!("{provider} ({model})"),
        None => provider.to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

pub async fn status(config: &MnemoConfig, json: bool, plain: bool) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    let registry = ModelRegistry::from_config(config);
    let model = match &config.agent.model {
        Some(name) => Some(registry.resolve(name)),
        None => registry.pick_best(config.agent.tier),
    };

    let report = StatusReport {
        root: store.root().display().to_string(),
        index: store.stats().await?,
        embedding: embedding_label(config),
        model: model.map(|spec| format!("{} [{}]", spec.label, spec.id)),
        providers: registry
            .credentials()
            .providers()
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    if json {
        print_json(&report);
    } else {
        print!("{}", render_status(&report, use_color(plain)));
    }
    Ok(())
}

fn render_status(report: &StatusReport, use_color: bool) -> String {
    use colored::Colorize;

    let mut out = String::new();
    out.push_str("\n  mnemo status\n");
    out.push_str(&format!("  {}\n", "-".repeat(35)));
    out.push_str(&format!("    Root:       {}\n", report.root));
    out.push_str(&format!(
        "    Index:      {} files, {} chunks, {} vectors\n",
        report.index.files, report.index.chunks, report.index.vectors
    ));
    if let Some(dims) = report.index.dimensions {
        out.push_str(&format!("    Dimensions: {dims}\n"));
    }
    out.push_str(&format!("    Embedding:  {}\n", report.embedding));

    let model = match (&report.model, use_color) {
        (Some(model), true) => model.green().to_string(),
        (Some(model), false) => model.clone(),
        (None, true) => "none (set an API key)".red().to_string(),
        (None, false) => "none (set an API key)".to_string(),
    };
    out.push_str(&format!("    Model:      {model}\n"));

    let providers = if report.providers.is_empty() {
        "-".to_string()
    } else {
        report.providers.join(", ")
    };
    out.push_str(&format!("    Providers:  {providers}\n\n"));
    out
}

pub async fn reindex(config: &MnemoConfig) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    let files = store.reindex_all().await?;
    let stats = store.stats().await?;
    info!(files, chunks = stats.chunks, "reindex complete");
    println!(
        "Indexed {files} files ({} chunks, {} vectors)",
        stats.chunks, stats.vectors
    );
    Ok(())
}

pub async fn search(config: &MnemoConfig, query: &str, json: bool) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    let results = store.search(query).await;
    if json {
        print_json(&results);
    } else {
        print!("{}", render_results(&results));
    }
    Ok(())
}

fn render_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No matching memories.\n".to_string();
    }
    let mut out = String::new();
    for result in results {
        out.push_str(&format!(
            "{}:{}-{}  ({:.3}, {})\n",
            result.path,
            result.start_line,
            result.end_line,
            result.score,
            result.source.as_str()
        ));
        for line in result.snippet.lines() {
            out.push_str(&format!("    {line}\n"));
        }
        out.push('\n');
    }
    out
}

pub async fn context(config: &MnemoConfig) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    println!("{}", store.build_prompt_context().await);
    Ok(())
}

pub async fn lines(
    config: &MnemoConfig,
    path: &str,
    from: usize,
    count: usize,
) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    let text = store.get_lines(path, from, count).await;
    if text.is_empty() {
        return Err(MnemoError::Memory(format!("no lines at {path}:{from}")));
    }
    println!("{text}");
    Ok(())
}

pub async fn append(config: &MnemoConfig, text: &str) -> Result<(), MnemoError> {
    let store = open_store(config).await?;
    store.append_to_daily(text).await?;
    println!("Appended to today's log");
    Ok(())
}

pub fn models(config: &MnemoConfig, json: bool) {
    let models = ModelRegistry::from_config(config).list();
    if json {
        print_json(&models);
    } else {
        print!("{}", render_models(&models));
    }
}

fn render_models(models: &[ModelInfo]) -> String {
    let mut out = String::new();
    for info in models {
        let spec = &info.spec;
        let mark = if info.available { "*" } else { " " };
        let mut caps = Vec::new();
        if spec.tool_use {
            caps.push("tools");
        }
        if spec.vision {
            caps.push("vision");
        }
        out.push_str(&format!(
            "{mark} {:<32} {:<20} {:<9} {:<5} {:>8}  {}\n",
            spec.id,
            spec.label,
            spec.provider,
            spec.tier,
            spec.context_window,
            caps.join(",")
        ));
    }
    out
}
