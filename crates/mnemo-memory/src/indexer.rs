// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite index over the memory corpus: chunk table, FTS5 index and an
//! optional sqlite-vec index.
//!
//! All statements run on tokio-rusqlite's single background thread. Index
//! mutations additionally hold an async write lock for their whole duration
//! (cache lookup, embedding, transaction), so there is one writer per index.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Once, OnceLock};

use mnemo_core::error::MnemoError;
use rusqlite::OptionalExtension;
use rusqlite::ffi::sqlite3_auto_extension;
use sqlite_vec::sqlite3_vec_init;
use tokio::sync::Mutex;
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::chunker::{chunk_file, hash_text};
use crate::embedder::EmbeddingPool;
use crate::retriever::merge_hybrid_results;
use crate::types::{Chunk, IndexStats, RawHit, SearchResult, SearchSettings, vec_to_blob};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

const VECTOR_DIMS_KEY: &str = "vector_dims";

static VEC_EXTENSION: Once = Once::new();

/// Registers sqlite-vec so every connection opened afterwards has `vec0`.
fn register_sqlite_vec() {
    VEC_EXTENSION.call_once(|| {
        // SAFETY: sqlite3_vec_init has the signature SQLite expects of an
        // extension entry point; the crate declares it without arguments.
        unsafe {
            sqlite3_auto_extension(Some(std::mem::transmute::<
                *const (),
                unsafe extern "C" fn(
                    *mut rusqlite::ffi::sqlite3,
                    *mut *mut std::ffi::c_char,
                    *const rusqlite::ffi::sqlite3_api_routines,
                ) -> i32,
            >(sqlite3_vec_init as *const ())));
        }
        debug!("sqlite-vec auto-extension registered");
    });
}

/// Applies pending schema migrations; refinery tracks them in its own table.
fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), MnemoError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| MnemoError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}

/// Convert a tokio-rusqlite error into MnemoError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> MnemoError {
    MnemoError::Storage {
        source: Box::new(e),
    }
}

/// Deterministic vec0 rowid for a chunk id; vec0 tables key on integers.
fn vec_rowid(chunk_id: &str) -> i64 {
    let hash = hash_text(chunk_id);
    let n = u64::from_str_radix(&hash[..16], 16).unwrap_or(0);
    (n >> 1) as i64
}

fn stored_dims(conn: &rusqlite::Connection) -> rusqlite::Result<Option<usize>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM index_meta WHERE key = ?1",
            [VECTOR_DIMS_KEY],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()))
}

/// Creates the vector table for `dims`, rebuilding it if it was created for
/// a different dimensionality. Returns true when an existing table was dropped.
fn ensure_vector_table(conn: &rusqlite::Connection, dims: usize) -> rusqlite::Result<bool> {
    let rebuilt = match stored_dims(conn)? {
        Some(current) if current == dims => return Ok(false),
        Some(current) => {
            warn!(
                from = current,
                to = dims,
                "embedding dimensionality changed, rebuilding vector index"
            );
            conn.execute_batch("DROP TABLE IF EXISTS chunks_vec")?;
            true
        }
        None => false,
    };

    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(\
         embedding float[{dims}] distance_metric=cosine, +chunk_id text)"
    ))?;
    conn.execute(
        "INSERT INTO index_meta (key, value) VALUES (?1, ?2) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        rusqlite::params![VECTOR_DIMS_KEY, dims.to_string()],
    )?;
    Ok(rebuilt)
}

fn delete_vector(conn: &rusqlite::Connection, chunk_id: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM chunks_vec WHERE rowid = ?1", [vec_rowid(chunk_id)])?;
    Ok(())
}

fn insert_vector(conn: &rusqlite::Connection, chunk_id: &str, vector: &[f32]) -> rusqlite::Result<()> {
    // vec0 has no upsert.
    delete_vector(conn, chunk_id)?;
    conn.execute(
        "INSERT INTO chunks_vec (rowid, embedding, chunk_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![vec_rowid(chunk_id), vec_to_blob(vector), chunk_id],
    )?;
    Ok(())
}

fn chunk_ids_for_path(conn: &rusqlite::Connection, path: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM chunks WHERE path = ?1")?;
    let ids = stmt
        .query_map([path], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn delete_text_rows(conn: &rusqlite::Connection, path: &str) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM chunks_fts WHERE path = ?1", [path])?;
    conn.execute("DELETE FROM chunks WHERE path = ?1", [path])?;
    Ok(())
}

/// Wraps `query` as one FTS5 phrase, doubling embedded quotes. `None` when
/// the quotes in `query` do not pair up.
fn fts_phrase(query: &str) -> Option<String> {
    if query.matches('"').count() % 2 != 0 {
        return None;
    }
    Some(format!("\"{}\"", query.replace('"', "\"\"")))
}

/// Searchable index of one user's memory corpus.
pub struct MemoryIndexer {
    conn: Connection,
    embedder: Option<EmbeddingPool>,
    /// Output size of `embedder`, learned from its first vector.
    embedder_dims: OnceLock<usize>,
    settings: SearchSettings,
    write_lock: Mutex<()>,
}

impl MemoryIndexer {
    /// Opens (or creates) the index database at `path` and applies migrations.
    pub async fn open(
        path: impl AsRef<Path>,
        settings: SearchSettings,
        embedder: Option<EmbeddingPool>,
    ) -> Result<Self, MnemoError> {
        register_sqlite_vec();
        let conn = Connection::open(path.as_ref())
            .await
            .map_err(|e| MnemoError::Storage {
                source: Box::new(e),
            })?;
        Self::from_connection(conn, settings, embedder).await
    }

    /// Opens a throwaway in-memory index.
    pub async fn open_in_memory(
        settings: SearchSettings,
        embedder: Option<EmbeddingPool>,
    ) -> Result<Self, MnemoError> {
        register_sqlite_vec();
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| MnemoError::Storage {
                source: Box::new(e),
            })?;
        Self::from_connection(conn, settings, embedder).await
    }

    async fn from_connection(
        conn: Connection,
        settings: SearchSettings,
        embedder: Option<EmbeddingPool>,
    ) -> Result<Self, MnemoError> {
        conn.call(|conn| {
            // journal_mode reports the resulting mode as a row.
            conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(run_migrations).await.map_err(|e| MnemoError::Storage {
            source: Box::new(e),
        })?;

        Ok(Self {
            conn,
            embedder,
            embedder_dims: OnceLock::new(),
            settings,
            write_lock: Mutex::new(()),
        })
    }

    /// Whether vector search is active. Fixed at construction.
    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Replaces every indexed row for `path` with chunks of `content`.
    ///
    /// Chunk and full-text rows are always rewritten. Vector rows are keyed by
    /// chunk id: ids that reappear keep their vector without re-embedding, ids
    /// that disappeared lose theirs. Returns the number of chunks indexed.
    pub async fn index_file(&self, path: &str, content: &str) -> Result<usize, MnemoError> {
        let _guard = self.write_lock.lock().await;

        let chunks = chunk_file(
            path,
            content,
            self.settings.chunk_size,
            self.settings.chunk_overlap,
        );
        let vectors = match &self.embedder {
            Some(pool) => self.embed_uncached(pool, &chunks).await?,
            None => Vec::new(),
        };

        let count = chunks.len();
        let embedded = vectors.len();
        let path_owned = path.to_string();
        let indexed_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let old_ids = chunk_ids_for_path(&tx, &path_owned)?;
                delete_text_rows(&tx, &path_owned)?;

                for chunk in &chunks {
                    tx.execute(
                        "INSERT INTO chunks (id, path, start_line, end_line, text, hash, indexed_at) \
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        rusqlite::params![
                            chunk.id,
                            chunk.path,
                            chunk.start_line as i64,
                            chunk.end_line as i64,
                            chunk.text,
                            chunk.hash,
                            indexed_at,
                        ],
                    )?;
                    tx.execute(
                        "INSERT INTO chunks_fts (text, id, path, start_line, end_line) \
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        rusqlite::params![
                            chunk.text,
                            chunk.id,
                            chunk.path,
                            chunk.start_line as i64,
                            chunk.end_line as i64,
                        ],
                    )?;
                }

                if let Some(dims) = vectors.first().map(|(_, v)| v.len()) {
                    ensure_vector_table(&tx, dims)?;
                    for (id, vector) in &vectors {
                        if vector.len() != dims {
                            warn!(chunk_id = %id, "embedding length differs within one file, skipped");
                            continue;
                        }
                        insert_vector(&tx, id, vector)?;
                    }
                }

                if stored_dims(&tx)?.is_some() {
                    let new_ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
                    for id in old_ids.iter().filter(|id| !new_ids.contains(id.as_str())) {
                        delete_vector(&tx, id)?;
                    }
                }

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(path, chunks = count, embedded, "file indexed");
        Ok(count)
    }

    /// Embeds the chunks that have no vector row yet.
    ///
    /// When the embedder's dimensionality differs from the index's, the
    /// cached chunks are embedded too, since the index will be rebuilt. If
    /// every chunk is cached and the embedder's size is not yet known, one
    /// cached chunk is embedded to learn it.
    async fn embed_uncached(
        &self,
        pool: &EmbeddingPool,
        chunks: &[Chunk],
    ) -> Result<Vec<(String, Vec<f32>)>, MnemoError> {
        let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
        let (dims, cached) = self
            .conn
            .call(move |conn| {
                let dims = stored_dims(conn)?;
                let mut cached = HashSet::new();
                if dims.is_some() {
                    let mut stmt = conn.prepare("SELECT 1 FROM chunks_vec WHERE rowid = ?1")?;
                    for id in ids {
                        if stmt.exists([vec_rowid(&id)])? {
                            cached.insert(id);
                        }
                    }
                }
                Ok((dims, cached))
            })
            .await
            .map_err(map_tr_err)?;

        let (hits, missing): (Vec<&Chunk>, Vec<&Chunk>) =
            chunks.iter().partition(|c| cached.contains(&c.id));
        debug!(cached = hits.len(), missing = missing.len(), "embedding cache checked");

        let mut vectors = pool.embed_chunks(&missing).await;
        if let Some((_, first)) = vectors.first() {
            let _ = self.embedder_dims.set(first.len());
        }
        if hits.is_empty() {
            return Ok(vectors);
        }

        let current = match self.embedder_dims.get() {
            Some(current) => Some(*current),
            None => match pool.embed_one(&hits[0].text).await {
                Ok(vector) => Some(*self.embedder_dims.get_or_init(|| vector.len())),
                Err(e) => {
                    warn!(error = %e, "could not check embedding dimensionality");
                    None
                }
            },
        };
        let resized = matches!((dims, current), (Some(stored), Some(current)) if stored != current);
        if resized {
            vectors.extend(pool.embed_chunks(&hits).await);
        }
        Ok(vectors)
    }

    /// Deletes every row for `path` from all three indexes.
    pub async fn remove_file(&self, path: &str) -> Result<(), MnemoError> {
        let _guard = self.write_lock.lock().await;
        let path_owned = path.to_string();
        let removed = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let ids = chunk_ids_for_path(&tx, &path_owned)?;
                if stored_dims(&tx)?.is_some() {
                    for id in &ids {
                        delete_vector(&tx, id)?;
                    }
                }
                delete_text_rows(&tx, &path_owned)?;
                tx.commit()?;
                Ok(ids.len())
            })
            .await
            .map_err(map_tr_err)?;
        info!(path, chunks = removed, "file removed from index");
        Ok(())
    }

    /// Hybrid search. Never fails: a failing modality contributes no hits.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let limit = self.settings.max_results * 2;

        let keyword = self.keyword_search(query, limit).await.unwrap_or_else(|e| {
            warn!(error = %e, "keyword search failed");
            Vec::new()
        });
        let vector = if self.embedder.is_some() {
            self.vector_search(query, limit).await.unwrap_or_else(|e| {
                warn!(error = %e, "vector search failed");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        debug!(keyword = keyword.len(), vector = vector.len(), "search candidates");
        merge_hybrid_results(keyword, vector, &self.settings)
    }

    /// FTS5 phrase search. Scores are negated BM25, so larger is better.
    ///
    /// The query is matched as one phrase. A query with unbalanced double
    /// quotes is malformed and rejected.
    pub async fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>, MnemoError> {
        let phrase = fts_phrase(query)
            .ok_or_else(|| MnemoError::Memory(format!("unbalanced quotes in query: {query}")))?;
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT path, start_line, end_line, text, bm25(chunks_fts) FROM chunks_fts \
                     WHERE chunks_fts MATCH ?1 ORDER BY bm25(chunks_fts) LIMIT ?2",
                )?;
                let hits = stmt
                    .query_map(rusqlite::params![phrase, limit as i64], |row| {
                        let bm25: f64 = row.get(4)?;
                        Ok(RawHit {
                            path: row.get(0)?,
                            start_line: row.get::<_, i64>(1)? as usize,
                            end_line: row.get::<_, i64>(2)? as usize,
                            text: row.get(3)?,
                            score: -bm25,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(hits)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Nearest-neighbour search; score is `1 - cosine distance`.
    pub async fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<RawHit>, MnemoError> {
        let Some(pool) = &self.embedder else {
            return Ok(Vec::new());
        };
        let dims = self
            .conn
            .call(|conn| stored_dims(conn))
            .await
            .map_err(map_tr_err)?;
        let Some(dims) = dims else {
            return Ok(Vec::new());
        };

        let query_vector = pool.embed_one(query).await?;
        if query_vector.len() != dims {
            warn!(
                query = query_vector.len(),
                index = dims,
                "query embedding does not match index dimensionality"
            );
            return Ok(Vec::new());
        }

        let blob = vec_to_blob(&query_vector);
        self.conn
            .call(move |conn| {
                let mut knn = conn.prepare(
                    "SELECT chunk_id, distance FROM chunks_vec \
                     WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
                )?;
                let neighbours = knn
                    .query_map(rusqlite::params![blob, limit as i64], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                let mut lookup =
                    conn.prepare("SELECT path, start_line, end_line, text FROM chunks WHERE id = ?1")?;
                let mut hits = Vec::with_capacity(neighbours.len());
                for (id, distance) in neighbours {
                    let hit = lookup
                        .query_row([&id], |row| {
                            Ok(RawHit {
                                path: row.get(0)?,
                                start_line: row.get::<_, i64>(1)? as usize,
                                end_line: row.get::<_, i64>(2)? as usize,
                                text: row.get(3)?,
                                score: 1.0 - distance,
                            })
                        })
                        .optional()?;
                    if let Some(hit) = hit {
                        hits.push(hit);
                    }
                }
                Ok(hits)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Most recently indexed chunks, approximated by path then start line,
    /// both descending. Correct for ISO-dated daily files.
    pub async fn recent_chunks(&self, limit: usize) -> Result<Vec<Chunk>, MnemoError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, path, start_line, end_line, text, hash FROM chunks \
                     ORDER BY path DESC, start_line DESC LIMIT ?1",
                )?;
                let chunks = stmt
                    .query_map([limit as i64], |row| {
                        Ok(Chunk {
                            id: row.get(0)?,
                            path: row.get(1)?,
                            start_line: row.get::<_, i64>(2)? as usize,
                            end_line: row.get::<_, i64>(3)? as usize,
                            text: row.get(4)?,
                            hash: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(chunks)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Distinct corpus paths that currently have chunks.
    pub async fn indexed_paths(&self) -> Result<Vec<String>, MnemoError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT DISTINCT path FROM chunks ORDER BY path")?;
                let paths = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(paths)
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn stats(&self) -> Result<IndexStats, MnemoError> {
        self.conn
            .call(|conn| {
                let (files, chunks): (i64, i64) = conn.query_row(
                    "SELECT COUNT(DISTINCT path), COUNT(*) FROM chunks",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                let dimensions = stored_dims(conn)?;
                let vectors: i64 = if dimensions.is_some() {
                    conn.query_row("SELECT COUNT(*) FROM chunks_vec", [], |row| row.get(0))?
                } else {
                    0
                };
                Ok(IndexStats {
                    files: files as usize,
                    chunks: chunks as usize,
                    vectors: vectors as usize,
                    dimensions,
                })
            })
            .await
            .map_err(map_tr_err)
    }
}
