use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use log::{debug, warn};
use crate::{Error, Ids, Result};
use crate::engine::{Codec, Filesystem, FsError, JsonCodec, LocalFs};

/// File-per-record store rooted at an absolute base directory.
///
/// A record for `(topic, id)` lives at `<base>/<topic>/<id>.<ext>`. The store
/// keeps no state beyond its configuration; every call goes to disk.
pub struct Store<F = LocalFs, C = JsonCodec> {
    base_dir: PathBuf,
    extension: String,
    fs: F,
    codec: C,
}

impl Store {
    /// Creates a JSON store on the local filesystem.
    ///
    /// `base_dir` must be absolute. Nothing is touched on disk until the first write.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::with_parts(base_dir, LocalFs, JsonCodec)
    }
}

impl<F: Filesystem, C: Codec> Store<F, C> {
    /// Creates a store over custom filesystem and codec implementations.
    pub fn with_parts<P: AsRef<Path>>(base_dir: P, fs: F, codec: C) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        if base_dir.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("base directory must not be empty".to_string()));
        }
        if !base_dir.is_absolute() {
            return Err(Error::InvalidArgument(format!(
                "base directory must be an absolute path, got {:?}",
                base_dir
            )));
        }
        let extension = codec.extension().to_string();
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            extension,
            fs,
            codec,
        })
    }

    /// Overrides the record file extension. A single leading dot is ignored.
    pub fn with_extension(mut self, extension: &str) -> Result<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        if extension.is_empty() || extension.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidArgument(format!("invalid file extension {:?}", extension)));
        }
        self.extension = extension.to_string();
        Ok(self)
    }

    /// Directory holding one subdirectory per topic.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Record file extension, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns a [`TopicScope`] pinned to `topic`.
    pub fn topic<'a>(&'a self, topic: &str) -> TopicScope<'a, F, C> {
        TopicScope {
            store: self,
            topic: topic.to_string(),
        }
    }

    /// Reads a record. Returns `None` if the topic or the id does not exist.
    pub fn get(&self, topic: &str, id: &str) -> Result<Option<Value>> {
        check_name("topic", topic)?;
        check_name("id", id)?;
        self.read_record(topic, id)
    }

    /// Reads a record and converts it into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, topic: &str, id: &str) -> Result<Option<T>> {
        match self.get(topic, id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Writes a record, creating the topic directory if needed and replacing
    /// any previous value.
    pub fn put(&self, topic: &str, id: &str, value: Value) -> Result<()> {
        check_name("topic", topic)?;
        check_name("id", id)?;
        self.write_record(topic, id, &value)
    }

    /// Serializes `value` and writes it as a record.
    pub fn put_as<T: Serialize>(&self, topic: &str, id: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.put(topic, id, value)
    }

    /// Lists the ids stored under `topic`, in directory order.
    pub fn ids(&self, topic: &str) -> Result<Vec<String>> {
        check_name("topic", topic)?;
        self.list_ids(topic)
    }

    /// Reads every record under `topic`, keyed by id.
    pub fn all(&self, topic: &str) -> Result<HashMap<String, Value>> {
        check_name("topic", topic)?;
        Ok(self.read_topic(topic)?.into_iter().collect())
    }

    /// Reads every record under `topic`, in the same order as [`Store::ids`].
    pub fn values(&self, topic: &str) -> Result<Vec<Value>> {
        check_name("topic", topic)?;
        Ok(self.read_topic(topic)?.into_iter().map(|(_, v)| v).collect())
    }

    /// Moves records from `topic` to `new_topic`, keeping their ids.
    ///
    /// Ids missing from `topic` are skipped. Returns the moved ids in
    /// processing order. Not atomic: a failure part-way leaves earlier ids
    /// moved.
    pub fn move_records(&self, topic: &str, ids: impl Into<Ids>, new_topic: &str) -> Result<Vec<String>> {
        let ids = ids.into();
        check_name("topic", topic)?;
        check_name("topic", new_topic)?;
        check_ids(&ids)?;
        if topic == new_topic {
            return Err(Error::InvalidArgument(format!(
                "cannot move records from topic {:?} onto itself",
                topic
            )));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Moving {} id(s) from {:?} to {:?}", ids.len(), topic, new_topic);
        let mut moved = Vec::new();
        let mut seen = HashSet::new();
        for id in ids.iter() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(value) = self.read_record(topic, id)? {
                self.write_record(new_topic, id, &value)?;
                moved.push(id.to_string());
            }
        }

        if moved.is_empty() {
            return Ok(moved);
        }
        self.delete_records(topic, moved.iter().map(String::as_str))?;
        debug!("Moved {} record(s) from {:?} to {:?}", moved.len(), topic, new_topic);
        Ok(moved)
    }

    /// Deletes records, then removes the topic directory if it became empty.
    ///
    /// Ids without a file are skipped. Returns the deleted ids in input order.
    pub fn delete(&self, topic: &str, ids: impl Into<Ids>) -> Result<Vec<String>> {
        let ids = ids.into();
        check_name("topic", topic)?;
        check_ids(&ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.delete_records(topic, ids.iter())
    }

    /// Removes the existing ids under `topic` that appear in `ids`.
    ///
    /// Walks the directory listing rather than the requested ids, so the result
    /// is in directory order. Unlike [`Store::delete`], the topic directory is
    /// left in place even if it ends up empty.
    pub fn purge<I, S>(&self, topic: &str, ids: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_name("topic", topic)?;
        let wanted: HashSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();

        let mut removed = Vec::new();
        for id in self.list_ids(topic)? {
            if wanted.contains(&id) && self.remove_record(topic, &id)? {
                removed.push(id);
            }
        }
        debug!("Purged {} record(s) from {:?}", removed.len(), topic);
        Ok(removed)
    }

    /// Removes every record under `topic` and then the topic directory itself.
    pub fn clean(&self, topic: &str) -> Result<Vec<String>> {
        check_name("topic", topic)?;
        let ids = self.list_ids(topic)?;
        self.delete_records(topic, ids.iter().map(String::as_str))
    }

    fn topic_dir(&self, topic: &str) -> PathBuf {
        self.base_dir.join(topic)
    }

    fn record_path(&self, topic: &str, id: &str) -> PathBuf {
        self.topic_dir(topic).join(format!("{}.{}", id, self.extension))
    }

    fn read_record(&self, topic: &str, id: &str) -> Result<Option<Value>> {
        let path = self.record_path(topic, id);
        let bytes = match self.fs.read_file(&path) {
            Ok(bytes) => bytes,
            Err(FsError::NotFound) => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(|source| Error::CorruptData { path, source })
    }

    fn write_record(&self, topic: &str, id: &str, value: &Value) -> Result<()> {
        let text = self.codec.encode(value).map_err(Error::Serialization)?;

        let dir = self.topic_dir(topic);
        self.fs.create_dir_all(&dir).map_err(|e| io_error(dir, e))?;

        let path = self.record_path(topic, id);
        self.fs.write_file(&path, &text).map_err(|e| io_error(path, e))
    }

    /// Reads the records of `topic` in listing order. Files that disappear
    /// between the listing and the read are skipped.
    fn read_topic(&self, topic: &str) -> Result<Vec<(String, Value)>> {
        let mut records = Vec::new();
        for id in self.list_ids(topic)? {
            match self.read_record(topic, &id)? {
                Some(value) => records.push((id, value)),
                None => warn!("Record {:?} vanished from topic {:?} while reading", id, topic),
            }
        }
        Ok(records)
    }

    fn list_ids(&self, topic: &str) -> Result<Vec<String>> {
        let dir = self.topic_dir(topic);
        let names = match self.fs.list_dir(&dir) {
            Ok(names) => names,
            Err(FsError::NotFound) => return Ok(Vec::new()),
            Err(e) => return Err(io_error(dir, e)),
        };

        let suffix = format!(".{}", self.extension);
        Ok(names
            .into_iter()
            .filter_map(|name| {
                let id = name.strip_suffix(&suffix)?;
                if check_name("id", id).is_ok() {
                    Some(id.to_string())
                } else {
                    None
                }
            })
            .collect())
    }

    /// Deletes one record file. Returns `false` if it was already gone.
    fn remove_record(&self, topic: &str, id: &str) -> Result<bool> {
        let path = self.record_path(topic, id);
        match self.fs.delete_file(&path) {
            Ok(()) => Ok(true),
            Err(FsError::NotFound) => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }

    fn delete_records<'i>(&self, topic: &str, ids: impl Iterator<Item = &'i str>) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for id in ids {
            if self.remove_record(topic, id)? {
                deleted.push(id.to_string());
            }
        }
        self.remove_topic_dir_if_empty(topic)?;
        debug!("Deleted {} record(s) from {:?}", deleted.len(), topic);
        Ok(deleted)
    }

    fn remove_topic_dir_if_empty(&self, topic: &str) -> Result<()> {
        let dir = self.topic_dir(topic);
        match self.fs.remove_dir_if_empty(&dir) {
            Ok(()) => {
                debug!("Removed empty topic directory {:?}", dir);
                Ok(())
            }
            Err(FsError::NotFound) | Err(FsError::NotEmpty) => Ok(()),
            Err(e) => Err(io_error(dir, e)),
        }
    }
}

/// A [`Store`] view pinned to a single topic.
pub struct TopicScope<'a, F = LocalFs, C = JsonCodec> {
    store: &'a Store<F, C>,
    topic: String,
}

impl<'a, F: Filesystem, C: Codec> TopicScope<'a, F, C> {
    /// The topic this scope is pinned to.
    pub fn name(&self) -> &str {
        &self.topic
    }

    pub fn get(&self, id: &str) -> Result<Option<Value>> {
        self.store.get(&self.topic, id)
    }

    pub fn put(&self, id: &str, value: Value) -> Result<()> {
        self.store.put(&self.topic, id, value)
    }

    pub fn delete(&self, ids: impl Into<Ids>) -> Result<Vec<String>> {
        self.store.delete(&self.topic, ids)
    }

    pub fn ids(&self) -> Result<Vec<String>> {
        self.store.ids(&self.topic)
    }

    pub fn all(&self) -> Result<HashMap<String, Value>> {
        self.store.all(&self.topic)
    }

    pub fn values(&self) -> Result<Vec<Value>> {
        self.store.values(&self.topic)
    }

    pub fn clean(&self) -> Result<Vec<String>> {
        self.store.clean(&self.topic)
    }
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", kind)));
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::InvalidArgument(format!("{} {:?} is not a valid file name", kind, name)));
    }
    Ok(())
}

fn check_ids(ids: &Ids) -> Result<()> {
    ids.iter().try_for_each(|id| check_name("id", id))
}

fn io_error(path: PathBuf, e: FsError) -> Error {
    Error::Io {
        path,
        source: e.into_io(),
    }
}
