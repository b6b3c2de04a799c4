//! Fingerprinted request/result storage

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use dirs::{cache_dir, home_dir};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The complete parameter set of a job request, keyed by parameter name.
///
/// Parameters are held in a sorted map, so two requests built in different
/// insertion orders serialize identically and produce the same
/// [`Fingerprint`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(BTreeMap<String, String>);

impl RequestParams {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parameter, returning the previous value if one was set
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Insert a parameter, returning `self` for chaining
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a parameter value by name
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the parameter set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over parameters in sorted key order
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Compute the deterministic fingerprint of this parameter set
    ///
    /// The fingerprint is the SHA-512 digest of the canonical JSON encoding
    /// (sorted keys), rendered as lowercase hex.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let bytes = serde_json::to_vec(self)
            .map_err(|e| Error::serialization(format!("Failed to encode parameters: {e}")))?;
        let digest = Sha512::digest(bytes);
        Ok(Fingerprint(hex::encode(digest)))
    }
}

impl FromIterator<(String, String)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RequestParams {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Deterministic identity of a parameter set, used as the entry file name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Get the hex representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored job result payload
///
/// Text results are kept as UTF-8 strings; binary results (rendered images,
/// archives) are base64-encoded so an entry is always a single JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoredValue {
    /// UTF-8 text payload
    Text {
        /// The payload
        data: String,
    },
    /// Binary payload, base64-encoded on disk
    Bytes {
        /// Base64 encoding of the payload
        data: String,
    },
}

impl StoredValue {
    /// Create a text payload
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    /// Create a binary payload
    #[must_use]
    pub fn bytes(data: &[u8]) -> Self {
        Self::Bytes {
            data: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data),
        }
    }

    /// Classify a raw payload: valid UTF-8 is stored as text, anything else
    /// as binary
    #[must_use]
    pub fn from_payload(payload: Vec<u8>) -> Self {
        match String::from_utf8(payload) {
            Ok(data) => Self::Text { data },
            Err(e) => Self::bytes(e.as_bytes()),
        }
    }

    /// Borrow the payload as text, if it is text
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { data } => Some(data),
            Self::Bytes { .. } => None,
        }
    }

    /// Decode the payload into raw bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Text { data } => Ok(data.clone().into_bytes()),
            Self::Bytes { data } => {
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data)
                    .map_err(|e| Error::serialization(format!("Invalid base64 payload: {e}")))
            }
        }
    }
}

/// A cache entry as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Parameters that produced the result
    pub params: RequestParams,
    /// The stored result payload
    pub result: StoredValue,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

/// Outcome of [`CacheStore::begin`]
#[derive(Debug)]
pub enum Lookup {
    /// A valid entry exists
    Hit(StoredValue),
    /// No entry exists; the caller may produce the result and commit it
    Miss(WriteIntent),
}

/// Permission to write the result of a request that missed the cache
///
/// Produced by [`CacheStore::begin`]. Holds the resolved entry path and a
/// snapshot of the parameters so the eventual write is a single call. Nothing
/// is written until [`commit`](Self::commit); dropping the intent leaves the
/// cache untouched.
#[derive(Debug)]
pub struct WriteIntent {
    path: PathBuf,
    params: RequestParams,
}

impl WriteIntent {
    /// Write the result, consuming the intent
    pub fn commit(self, result: StoredValue) -> Result<()> {
        let entry = CacheEntry {
            params: self.params,
            result,
            created_at: Utc::now(),
        };
        write_entry(&self.path, &entry)
    }
}

/// Filesystem-backed store for fingerprinted request/result pairs
///
/// Entries live at `{root}/{scope}/{fingerprint}` as JSON documents. The
/// scope keeps results from different services apart even when two requests
/// share a parameter set.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at the given directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of the store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path an entry for the given fingerprint occupies, whether or not
    /// it exists
    #[must_use]
    pub fn entry_path(&self, scope: &str, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(scope).join(fingerprint.as_str())
    }

    /// Look up a stored result
    ///
    /// Returns `Ok(None)` when no entry exists. An entry that exists but does
    /// not parse, or whose recorded parameters differ from the requested
    /// ones, is reported as [`Error::Corruption`] rather than silently
    /// served.
    pub fn lookup(&self, scope: &str, params: &RequestParams) -> Result<Option<StoredValue>> {
        let path = self.entry_path(scope, &params.fingerprint()?);
        read_entry(&path, params)
    }

    /// Look up a stored result, or obtain a [`WriteIntent`] for the caller
    /// to fill once the result has been produced
    pub fn begin(&self, scope: &str, params: &RequestParams) -> Result<Lookup> {
        let fingerprint = params.fingerprint()?;
        let path = self.entry_path(scope, &fingerprint);
        if let Some(value) = read_entry(&path, params)? {
            tracing::debug!(scope, fingerprint = %fingerprint, "cache hit");
            return Ok(Lookup::Hit(value));
        }
        tracing::debug!(scope, fingerprint = %fingerprint, "cache miss");
        Ok(Lookup::Miss(WriteIntent {
            path,
            params: params.clone(),
        }))
    }

    /// Write a result for the given parameters, replacing any existing entry
    pub fn store(&self, scope: &str, params: &RequestParams, result: StoredValue) -> Result<()> {
        let path = self.entry_path(scope, &params.fingerprint()?);
        let entry = CacheEntry {
            params: params.clone(),
            result,
            created_at: Utc::now(),
        };
        write_entry(&path, &entry)
    }

    /// Remove the entry for the given parameters
    ///
    /// Returns whether an entry was removed.
    pub fn evict(&self, scope: &str, params: &RequestParams) -> Result<bool> {
        let path = self.entry_path(scope, &params.fingerprint()?);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "evicted cache entry");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(e, &path, "remove")),
        }
    }
}

fn read_entry(path: &Path, params: &RequestParams) -> Result<Option<StoredValue>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(e, path, "read")),
    };
    let entry: CacheEntry = serde_json::from_str(&content)
        .map_err(|e| Error::corruption(path, format!("entry does not parse as JSON: {e}")))?;

    // Fingerprint collision guard: the stored parameters must be the ones
    // that were asked for.
    if entry.params != *params {
        return Err(Error::corruption(
            path,
            "recorded parameters do not match the requested parameters",
        ));
    }
    if let StoredValue::Bytes { data } = &entry.result {
        if base64::Engine::decode(&base64::engine::general_purpose::STANDARD, data).is_err() {
            return Err(Error::corruption(path, "binary payload is not valid base64"));
        }
    }
    Ok(Some(entry.result))
}

fn write_entry(path: &Path, entry: &CacheEntry) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!("entry path {} has no parent", path.display()))
    })?;
    fs::create_dir_all(parent).map_err(|e| Error::io(e, parent, "create_dir_all"))?;

    let json = serde_json::to_vec_pretty(entry)
        .map_err(|e| Error::serialization(format!("Failed to serialize cache entry: {e}")))?;

    // Write to a temporary file in the same directory, then rename into
    // place so readers never observe a partially written entry.
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| Error::io(e, parent, "create"))?;
    tmp.write_all(&json)
        .map_err(|e| Error::io(e, tmp.path(), "write"))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| Error::io(e, tmp.path(), "sync"))?;
    tmp.persist(path).map_err(|e| Error::io(e.error, path, "rename"))?;
    Ok(())
}

/// Inputs for determining the default cache root directory
#[derive(Debug, Clone)]
struct RootInputs {
    env_cache_dir: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    os_cache_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

fn root_from_inputs(inputs: RootInputs) -> Result<PathBuf> {
    // Resolution order (first writable wins):
    // 1) EBITOOLS_CACHE_DIR (explicit override)
    // 2) XDG_CACHE_HOME/ebitools
    // 3) OS cache dir/ebitools
    // 4) ~/.ebitools-cache
    // 5) TMPDIR/ebitools-cache (fallback)
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(dir) = inputs.env_cache_dir.filter(|p| !p.as_os_str().is_empty()) {
        candidates.push(dir);
    }
    if let Some(xdg) = inputs.xdg_cache_home {
        candidates.push(xdg.join("ebitools"));
    }
    if let Some(os_cache) = inputs.os_cache_dir {
        candidates.push(os_cache.join("ebitools"));
    }
    if let Some(home) = inputs.home_dir {
        candidates.push(home.join(".ebitools-cache"));
    }
    candidates.push(inputs.temp_dir.join("ebitools-cache"));

    for path in candidates {
        // If the path already exists, ensure it is writable; some CI
        // environments provide read-only cache directories under $HOME.
        if path.exists() {
            let probe = path.join(".write_probe");
            match fs::OpenOptions::new()
                .create(true)
                .truncate(true)
                .write(true)
                .open(&probe)
            {
                Ok(_) => {
                    let _ = fs::remove_file(&probe);
                    return Ok(path);
                }
                Err(_) => {
                    // Not writable, try next candidate
                    continue;
                }
            }
        }
        if fs::create_dir_all(&path).is_ok() {
            return Ok(path);
        }
        // Permission denied or other errors - try next candidate
    }
    Err(Error::configuration(
        "Failed to determine a writable cache directory",
    ))
}

/// Resolve the default on-disk location for the cache
pub fn default_cache_root() -> Result<PathBuf> {
    let inputs = RootInputs {
        env_cache_dir: std::env::var("EBITOOLS_CACHE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        xdg_cache_home: std::env::var("XDG_CACHE_HOME")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        os_cache_dir: cache_dir(),
        home_dir: home_dir(),
        temp_dir: std::env::temp_dir(),
    };
    root_from_inputs(inputs)
}
