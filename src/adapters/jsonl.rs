//! JSON Lines document store.
//!
//! Collections live as `<root>/<database>/<collection>.jsonl`, one JSON
//! document per line, appended in insertion order. Inserts append;
//! replace and delete rewrite the file through a temporary sibling and an
//! atomic rename, so readers never observe a half-written collection.
//! Duplicate identifiers are reported in the standard shape (code 11000,
//! `E11000` message text).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::watch;

use crate::adapters::traits::{
    DocumentReader, DocumentStream, EnsureOutcome, StoreInfo, TargetCollection, WriteOutcome,
};
use crate::domain::document::{display_id, ensure_id, id_key, DocumentRecord, ID_FIELD};
use crate::domain::errors::{StoreError, WriteFailure};

/// Directory-backed store of JSON Lines collections.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    root: PathBuf,
}

impl JsonlStore {
    /// Creates a store rooted at `root`; nothing is touched on disk until
    /// a collection is written.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns a handle to a collection under this root.
    pub fn collection(&self, database: &str, collection: &str) -> JsonlCollection {
        JsonlCollection {
            root: self.root.clone(),
            database: database.to_string(),
            collection: collection.to_string(),
        }
    }
}

/// Handle to one `.jsonl` collection file.
#[derive(Debug, Clone)]
pub struct JsonlCollection {
    root: PathBuf,
    database: String,
    collection: String,
}

impl JsonlCollection {
    fn path(&self) -> Result<PathBuf, StoreError> {
        check_name(&self.database)?;
        check_name(&self.collection)?;
        Ok(self
            .root
            .join(&self.database)
            .join(format!("{}.jsonl", self.collection)))
    }

    /// Loads every document in the file; a missing file is an empty
    /// collection.
    async fn load_documents(&self) -> Result<Vec<Value>, StoreError> {
        let path = self.path()?;
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut documents = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|err| {
                StoreError::new(format!(
                    "invalid JSON on line {} of {}: {err}",
                    line_no + 1,
                    path.display()
                ))
            })?;
            documents.push(value);
        }
        Ok(documents)
    }

    async fn load_id_keys(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self
            .load_documents()
            .await?
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD))
            .map(id_key)
            .collect())
    }

    /// Appends pre-serialized lines, creating the file and its parent
    /// directory on first write.
    async fn append(&self, buffer: &str) -> Result<(), StoreError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let path = self.path()?;
        create_parent(&path).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Replaces the whole file through a temporary sibling and a rename.
    async fn rewrite(&self, documents: &[Value]) -> Result<(), StoreError> {
        let path = self.path()?;
        create_parent(&path).await?;
        let mut buffer = String::new();
        for doc in documents {
            buffer.push_str(&serde_json::to_string(doc)?);
            buffer.push('\n');
        }
        let tmp = path.with_extension("jsonl.tmp");
        fs::write(&tmp, buffer).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    fn info_sync(&self) -> StoreInfo {
        StoreInfo {
            kind: "jsonl".to_string(),
            location: self.root.display().to_string(),
            collection: format!("{}/{}", self.database, self.collection),
        }
    }
}

#[async_trait]
impl DocumentReader for JsonlCollection {
    /// Counts lines without parsing them; blank lines are skipped.
    async fn count_documents(&self) -> Result<u64, StoreError> {
        let path = self.path()?;
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut lines = BufReader::new(file).lines();
        let mut count = 0u64;
        while let Some(line) = lines.next_line().await? {
            if !line.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn stream_documents(
        &self,
        cancel: watch::Receiver<bool>,
        keep_alive: bool,
    ) -> Result<DocumentStream, StoreError> {
        let path = self.path()?;
        tracing::debug!(path = %path.display(), keep_alive, "opening jsonl stream");
        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(futures::stream::empty().boxed());
            }
            Err(err) => return Err(err.into()),
        };
        let lines = BufReader::new(file).lines();
        let display = path.display().to_string();

        let stream = futures::stream::unfold(
            (lines, cancel, display, 0u64),
            |(mut lines, cancel, display, mut line_no)| async move {
                loop {
                    if *cancel.borrow() {
                        return None;
                    }
                    match lines.next_line().await {
                        Ok(Some(line)) => {
                            line_no += 1;
                            if line.trim().is_empty() {
                                continue;
                            }
                            let item = serde_json::from_str::<Value>(&line)
                                .map(DocumentRecord::new)
                                .map_err(|err| {
                                    StoreError::new(format!(
                                        "invalid JSON on line {line_no} of {display}: {err}"
                                    ))
                                });
                            return Some((item, (lines, cancel, display, line_no)));
                        }
                        Ok(None) => return None,
                        Err(err) => {
                            return Some((Err(err.into()), (lines, cancel, display, line_no)));
                        }
                    }
                }
            },
        );
        Ok(stream.boxed())
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        Ok(self.info_sync())
    }
}

#[async_trait]
impl TargetCollection for JsonlCollection {
    async fn ensure_exists(&self) -> Result<EnsureOutcome, StoreError> {
        let path = self.path()?;
        if fs::try_exists(&path).await? {
            return Ok(EnsureOutcome { created: false });
        }
        create_parent(&path).await?;
        File::create(&path).await?;
        Ok(EnsureOutcome { created: true })
    }

    async fn insert_many(
        &self,
        documents: &[Value],
        ordered: bool,
    ) -> Result<WriteOutcome, StoreError> {
        let mut ids = self.load_id_keys().await?;
        let mut buffer = String::new();
        let mut inserted = 0u64;
        let mut failures = Vec::new();

        for (index, doc) in documents.iter().enumerate() {
            let mut doc = doc.clone();
            let id = ensure_id(&mut doc);
            if let Some(id) = &id {
                let key = id_key(id);
                if ids.contains(&key) {
                    let failure = WriteFailure::new(
                        index,
                        format!("E11000 duplicate key error: _id {}", display_id(Some(id))),
                    )
                    .with_code(11000)
                    .with_id(display_id(Some(id)));
                    if ordered {
                        // Persist what landed before the duplicate.
                        self.append(&buffer).await?;
                        return Err(StoreError::new(
                            "E11000 duplicate key error, insert stopped",
                        )
                        .with_code(11000)
                        .with_applied(inserted)
                        .with_failures(vec![failure]));
                    }
                    failures.push(failure);
                    continue;
                }
                ids.insert(key);
            }
            buffer.push_str(&serde_json::to_string(&doc)?);
            buffer.push('\n');
            inserted += 1;
        }

        self.append(&buffer).await?;
        if !failures.is_empty() {
            return Err(StoreError::new(format!(
                "{} document(s) had duplicate keys",
                failures.len()
            ))
            .with_code(11000)
            .with_applied(inserted)
            .with_failures(failures));
        }
        Ok(WriteOutcome {
            inserted,
            ..WriteOutcome::default()
        })
    }

    async fn replace_upsert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError> {
        let mut stored = self.load_documents().await?;
        let mut replaced = 0u64;
        let mut created = 0u64;

        for doc in documents {
            let mut doc = doc.clone();
            match doc.get(ID_FIELD).cloned() {
                Some(id) => {
                    let position = stored
                        .iter()
                        .position(|existing| existing.get(ID_FIELD) == Some(&id));
                    match position {
                        Some(position) => {
                            stored[position] = doc;
                            replaced += 1;
                        }
                        None => {
                            stored.push(doc);
                            created += 1;
                        }
                    }
                }
                None => {
                    ensure_id(&mut doc);
                    stored.push(doc);
                    created += 1;
                }
            }
        }

        self.rewrite(&stored).await?;
        Ok(WriteOutcome {
            replaced,
            created,
            ..WriteOutcome::default()
        })
    }

    async fn delete_then_insert(&self, documents: &[Value]) -> Result<WriteOutcome, StoreError> {
        let mut stored = self.load_documents().await?;
        let incoming: HashSet<String> = documents
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD))
            .map(id_key)
            .collect();
        stored.retain(|doc| {
            doc.get(ID_FIELD)
                .map(|id| !incoming.contains(&id_key(id)))
                .unwrap_or(true)
        });
        for doc in documents {
            let mut doc = doc.clone();
            ensure_id(&mut doc);
            stored.push(doc);
        }

        self.rewrite(&stored).await?;
        Ok(WriteOutcome {
            replaced: documents.len() as u64,
            ..WriteOutcome::default()
        })
    }

    async fn info(&self) -> Result<StoreInfo, StoreError> {
        Ok(self.info_sync())
    }
}

async fn create_parent(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Rejects names that would walk out of the store root.
fn check_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StoreError::new(format!(
            "invalid database or collection name '{name}'"
        )));
    }
    Ok(())
}
