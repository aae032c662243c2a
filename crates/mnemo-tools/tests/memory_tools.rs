// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use chrono::NaiveDate;
use mnemo_config::model::MemoryConfig;
use mnemo_memory::{FixedClock, MemoryStore};
use mnemo_tools::{ToolRegistry, register_memory_tools};
use serde_json::json;
use tempfile::TempDir;

async fn setup() -> (TempDir, Arc<MemoryStore>, ToolRegistry) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("MEMORY.md"),
        "## User Profile\nName: Alek\n\n## Preferences\nOat milk in coffee\n",
    )
    .unwrap();
    let config = MemoryConfig {
        root_dir: dir.path().to_string_lossy().into_owned(),
        ..MemoryConfig::default()
    };
    let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()));
    let store = Arc::new(MemoryStore::open_with_clock(&config, None, clock).await.unwrap());
    store.init().await.unwrap();

    let mut registry = ToolRegistry::new();
    register_memory_tools(&mut registry, store.clone());
    (dir, store, registry)
}

#[tokio::test]
async fn search_returns_json_hits() {
    let (_dir, _store, tools) = setup().await;
    let out = tools
        .get("memory_search")
        .unwrap()
        .invoke(json!({"query": "oat milk"}))
        .await
        .unwrap();

    assert!(!out.is_error);
    let hits: serde_json::Value = serde_json::from_str(&out.content).unwrap();
    assert_eq!(hits[0]["path"], "MEMORY.md");
    assert_eq!(hits[0]["source"], "memory");
    assert!(hits[0]["snippet"].as_str().unwrap().contains("Oat milk"));
}

#[tokio::test]
async fn search_without_hits_says_so() {
    let (_dir, _store, tools) = setup().await;
    let out = tools
        .get("memory_search")
        .unwrap()
        .invoke(json!({"query": "zeppelin"}))
        .await
        .unwrap();
    assert_eq!(out.content, "No matching memories.");
}

#[tokio::test]
async fn get_reads_a_line_slice() {
    let (_dir, _store, tools) = setup().await;
    let get = tools.get("memory_get").unwrap();

    let out = get
        .invoke(json!({"path": "MEMORY.md", "from": 4, "lines": 2}))
        .await
        .unwrap();
    assert_eq!(out.content, "## Preferences\nOat milk in coffee");

    let out = get.invoke(json!({"path": "missing.md"})).await.unwrap();
    assert!(out.is_error);
}

#[tokio::test]
async fn write_merges_long_term_memory() {
    let (dir, store, tools) = setup().await;
    let out = tools
        .get("memory_write")
        .unwrap()
        .invoke(json!({"path": "MEMORY.md", "content": "## User Profile\nName: Alek\nPronouns: they/them\n\n"}))
        .await
        .unwrap();
    assert!(!out.is_error, "{}", out.content);

    let merged = std::fs::read_to_string(dir.path().join("MEMORY.md")).unwrap();
    assert!(merged.contains("Pronouns: they/them"));
    assert!(merged.contains("## Preferences\nOat milk in coffee\n"));
    assert_eq!(store.search("pronouns").await.len(), 1);
}

#[tokio::test]
async fn write_outside_root_is_an_error_result() {
    let (_dir, _store, tools) = setup().await;
    let out = tools
        .get("memory_write")
        .unwrap()
        .invoke(json!({"path": "../../etc/motd", "content": "hi"}))
        .await
        .unwrap();
    assert!(out.is_error);
}

#[tokio::test]
async fn write_to_a_daily_log_is_an_error_result() {
    let (dir, store, tools) = setup().await;
    store.append_to_daily("Lunch with Sam").await.unwrap();

    let out = tools
        .get("memory_write")
        .unwrap()
        .invoke(json!({"path": "daily/2025-03-14.md", "content": "wiped"}))
        .await
        .unwrap();
    assert!(out.is_error);
    assert!(out.content.contains("append-only"));

    let log = std::fs::read_to_string(dir.path().join("daily/2025-03-14.md")).unwrap();
    assert!(log.contains("Lunch with Sam"));
}
