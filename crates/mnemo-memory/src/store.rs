// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user memory store: the corpus on disk plus its index.
//!
//! Layout under the memory root:
//!
//! ```text
//! MEMORY.md            long-term facts, merged section by section on write
//! daily/YYYY-MM-DD.md  append-only log, one file per UTC date
//! index.sqlite         chunk, full-text and vector indexes
//! ```
//!
//! The store does not watch the filesystem. Writes made through it reindex
//! synchronously; anything else must call [`MemoryStore::on_file_changed`].

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use mnemo_config::model::MemoryConfig;
use mnemo_core::error::MnemoError;
use mnemo_core::traits::EmbeddingAdapter;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::embedder::EmbeddingPool;
use crate::indexer::MemoryIndexer;
use crate::sections::merge_sections;
use crate::types::{DAILY_DIR, IndexStats, LONG_TERM_FILE, SearchResult, SearchSettings};

/// File name of the index database inside the memory root.
pub const INDEX_FILE: &str = "index.sqlite";

/// Yesterday's log contributes at most this many entries to the prompt.
const YESTERDAY_TAIL_ENTRIES: usize = 5;

/// Keeps the longest suffix of whole lines of `content` that fits in
/// `max_bytes` bytes. Content already within budget is returned unchanged.
pub fn trim_to_tail(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut used = 0;
    let mut start = lines.len();
    for (i, line) in lines.iter().enumerate().rev() {
        let cost = line.len() + 1;
        if used + cost > max_bytes {
            break;
        }
        used += cost;
        start = i;
    }
    lines[start..].join("\n")
}

/// Returns the last `n` `## ` entries of a daily log.
///
/// Text before the first entry (the date header) is dropped. A log without
/// entries is returned trimmed.
pub fn last_entries(content: &str, n: usize) -> String {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with("## ") {
            starts.push(offset);
        }
        offset += line.len();
    }

    if starts.is_empty() {
        return content.trim().to_string();
    }
    if n == 0 {
        return String::new();
    }
    let first = starts[starts.len().saturating_sub(n)];
    content[first..].trim_end().to_string()
}

/// The memory corpus of one user.
pub struct MemoryStore {
    root: PathBuf,
    indexer: MemoryIndexer,
    memory_max_bytes: usize,
    daily_tail_entries: usize,
    clock: Arc<dyn Clock>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(root: PathBuf, indexer: MemoryIndexer, config: &MemoryConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            root,
            indexer,
            memory_max_bytes: config.memory_max_bytes,
            daily_tail_entries: config.daily_tail_entries,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the store rooted at `config.root_dir`, creating the directory and
    /// its index database if needed. Call [`init`](Self::init) before use.
    pub async fn open(
        config: &MemoryConfig,
        embedder: Option<Arc<dyn EmbeddingAdapter>>,
    ) -> Result<Self, MnemoError> {
        Self::open_with_clock(config, embedder, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        config: &MemoryConfig,
        embedder: Option<Arc<dyn EmbeddingAdapter>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MnemoError> {
        let root = PathBuf::from(&config.root_dir);
        tokio::fs::create_dir_all(&root).await?;

        let pool = embedder.map(|adapter| EmbeddingPool::new(adapter, config.embedding.concurrency));
        let indexer =
            MemoryIndexer::open(root.join(INDEX_FILE), SearchSettings::from(config), pool).await?;
        Ok(Self::new(root, indexer, config, clock))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn indexer(&self) -> &MemoryIndexer {
        &self.indexer
    }

    /// Ensures the daily directory exists and reindexes the whole corpus.
    pub async fn init(&self) -> Result<(), MnemoError> {
        tokio::fs::create_dir_all(self.root.join(DAILY_DIR)).await?;
        let files = self.reindex_all().await?;
        info!(root = %self.root.display(), files, "memory store initialised");
        Ok(())
    }

    /// Reindexes `MEMORY.md` and every daily log, and drops index entries for
    /// files that no longer exist. Returns the number of files indexed.
    pub async fn reindex_all(&self) -> Result<usize, MnemoError> {
        let mut paths = Vec::new();
        if tokio::fs::try_exists(self.root.join(LONG_TERM_FILE)).await? {
            paths.push(LONG_TERM_FILE.to_string());
        }

        match tokio::fs::read_dir(self.root.join(DAILY_DIR)).await {
            Ok(mut entries) => {
                let mut daily = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    if name.ends_with(".md") && entry.file_type().await?.is_file() {
                        daily.push(format!("{DAILY_DIR}/{name}"));
                    }
                }
                daily.sort();
                paths.extend(daily);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        for path in &paths {
            let content = tokio::fs::read_to_string(self.root.join(path)).await?;
            self.indexer.index_file(path, &content).await?;
        }

        for stale in self.indexer.indexed_paths().await? {
            if !paths.contains(&stale) {
                debug!(path = %stale, "dropping index entries for missing file");
                self.indexer.remove_file(&stale).await?;
            }
        }

        Ok(paths.len())
    }

    /// Builds the memory block injected into the system prompt.
    ///
    /// Sections, in order and each only when non-empty: the tail of
    /// `MEMORY.md` within the byte budget, the last entries of today's log,
    /// and the last five entries of yesterday's log.
    pub async fn build_prompt_context(&self) -> String {
        let mut sections = Vec::new();

        let long_term = self.read_or_empty(LONG_TERM_FILE).await;
        if !long_term.trim().is_empty() {
            let body = trim_to_tail(long_term.trim_end(), self.memory_max_bytes);
            sections.push(format!("# Long-term Memory\n\n{body}"));
        }

        let today = self.clock.today();
        let log = self.read_or_empty(&daily_path(&today.to_string())).await;
        if !log.trim().is_empty() {
            let tail = last_entries(&log, self.daily_tail_entries);
            sections.push(format!("# Today ({today})\n\n{tail}"));
        }

        let yesterday = self.clock.yesterday();
        let log = self.read_or_empty(&daily_path(&yesterday.to_string())).await;
        if !log.trim().is_empty() {
            let tail = last_entries(&log, YESTERDAY_TAIL_ENTRIES);
            sections.push(format!("# Yesterday ({yesterday})\n\n{tail}"));
        }

        sections.join("\n\n")
    }

    /// Hybrid search over the corpus. Never fails.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.indexer.search(query).await
    }

    /// Returns `count` lines of `path` starting at 1-based line `from`.
    ///
    /// An invalid path or unreadable file yields an empty string.
    pub async fn get_lines(&self, path: &str, from: usize, count: usize) -> String {
        let full = match self.resolve(path) {
            Ok((_, full)) => full,
            Err(e) => {
                warn!(path, error = %e, "rejected line read");
                return String::new();
            }
        };
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => content
                .lines()
                .skip(from.saturating_sub(1))
                .take(count)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                debug!(path, error = %e, "line read failed");
                String::new()
            }
        }
    }

    /// Appends a timestamped entry to today's log and reindexes it.
    pub async fn append_to_daily(&self, text: &str) -> Result<(), MnemoError> {
        let _guard = self.write_lock.lock().await;

        let date = self.clock.today().to_string();
        let rel = daily_path(&date);
        let full = self.root.join(&rel);

        let mut content = match tokio::fs::read_to_string(&full).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        if content.is_empty() {
            content = format!("# {date}\n");
        } else if !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&format!("\n## {}\n{}\n", self.clock.local_time_label(), text.trim_end()));

        tokio::fs::create_dir_all(self.root.join(DAILY_DIR)).await?;
        tokio::fs::write(&full, &content).await?;
        self.indexer.index_file(&rel, &content).await?;
        debug!(path = %rel, "daily entry appended");
        Ok(())
    }

    /// Re-reads `path` and reindexes it, or drops it from the index if the
    /// file is gone.
    pub async fn on_file_changed(&self, path: &str) -> Result<(), MnemoError> {
        let (key, full) = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => {
                self.indexer.index_file(&key, &content).await?;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.indexer.remove_file(&key).await?;
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    /// Section-merges `content` into `MEMORY.md` and reindexes it. Returns
    /// the file as written.
    ///
    /// Daily logs are append-only and rejected here; use
    /// [`append_to_daily`](Self::append_to_daily).
    pub async fn write_file(&self, path: &str, content: &str) -> Result<String, MnemoError> {
        let (key, full) = self.resolve(path)?;
        if key != LONG_TERM_FILE {
            return Err(MnemoError::Memory(format!(
                "{key} is an append-only daily log; only {LONG_TERM_FILE} can be written"
            )));
        }
        let _guard = self.write_lock.lock().await;

        let existing = match tokio::fs::read_to_string(&full).await {
            Ok(existing) => existing,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let written = merge_sections(&existing, content);

        tokio::fs::write(&full, &written).await?;
        self.indexer.index_file(&key, &written).await?;
        info!(path = %key, bytes = written.len(), "memory file written");
        Ok(written)
    }

    pub async fn stats(&self) -> Result<IndexStats, MnemoError> {
        self.indexer.stats().await
    }

    /// Maps a corpus-relative path to its index key (`/`-separated, no `.`
    /// components) and its location under the root.
    ///
    /// Only `MEMORY.md` and `daily/<name>.md` belong to the corpus; the index
    /// database and anything else under the root are rejected.
    fn resolve(&self, path: &str) -> Result<(String, PathBuf), MnemoError> {
        let mut parts = Vec::new();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => {
                    return Err(MnemoError::Memory(format!(
                        "memory path must be relative to the memory root: {path}"
                    )));
                }
            }
        }

        let in_corpus = match parts.as_slice() {
            [file] => file == LONG_TERM_FILE,
            [dir, file] => dir == DAILY_DIR && file.ends_with(".md") && file.len() > ".md".len(),
            _ => false,
        };
        if !in_corpus {
            return Err(MnemoError::Memory(format!(
                "not a memory file: {path:?} (expected {LONG_TERM_FILE} or {DAILY_DIR}/YYYY-MM-DD.md)"
            )));
        }
        let key = parts.join("/");
        let full = self.root.join(&key);
        Ok((key, full))
    }

    async fn read_or_empty(&self, rel: &str) -> String {
        tokio::fs::read_to_string(self.root.join(rel))
            .await
            .unwrap_or_default()
    }
}

fn daily_path(date: &str) -> String {
    format!("{DAILY_DIR}/{date}.md")
}
