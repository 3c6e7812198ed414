//! Load and save values in a `KEY=VALUE` configuration file
//!
//! Every operation rereads the file from disk; nothing is cached between
//! calls and nothing is locked. Callers that save from several processes
//! must serialize access themselves.

use crate::file::{is_valid_key, ConfigFile, Line, SetOutcome};
use crate::value::{unquote, ConfigValue};
use crate::{ConfigError, Result};
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

/// Values keyed by configuration key, in insertion order
pub type Entries = IndexMap<String, ConfigValue>;

/// Which of the selected keys [`ConfigStore::save`] writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveMode {
    /// Skip keys that are missing from the entries or hold an empty value
    #[default]
    NonEmptyOnly,
    /// Skip only keys missing from the entries; empty values are written
    DeclaredOnly,
}

impl std::fmt::Display for SaveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveMode::NonEmptyOnly => write!(f, "non-empty-only"),
            SaveMode::DeclaredOnly => write!(f, "declared-only"),
        }
    }
}

/// Keys considered by [`ConfigStore::save`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeySelector {
    /// Every key already assigned in the file
    #[default]
    Existing,
    /// Exactly these keys, whether or not the file assigns them yet
    Keys(Vec<String>),
}

impl KeySelector {
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeySelector::Keys(keys.into_iter().map(Into::into).collect())
    }
}

/// A configuration file on disk
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the requested keys.
    ///
    /// Keys that are not assigned in the file, or whose value decodes to an
    /// empty scalar or array, are left out of the result. When a key is
    /// assigned more than once the last assignment wins. An empty key list
    /// loads nothing.
    ///
    /// Fails if the file is missing, not a regular file or not readable.
    pub fn load<S: AsRef<str>>(&self, keys: &[S]) -> Result<Entries> {
        let content = self.read()?;
        if keys.is_empty() {
            return Ok(Entries::new());
        }

        let wanted: IndexSet<&str> = keys.iter().map(|k| k.as_ref()).collect();
        let file = ConfigFile::parse(&content);

        let mut found: IndexMap<&str, ConfigValue> = IndexMap::new();
        for (key, raw) in file.lines().iter().filter_map(|line| match line {
            Line::Assignment { key, value, .. } => Some((key.as_str(), value.as_str())),
            _ => None,
        }) {
            if raw.is_empty() || !wanted.contains(key) {
                continue;
            }
            found.insert(key, ConfigValue::decode(raw));
        }

        let mut entries = Entries::new();
        for key in wanted {
            match found.swap_remove(key) {
                Some(value) if !value.is_empty() => {
                    debug!("Loaded {} from {}", key, self.path.display());
                    entries.insert(key.to_string(), value);
                }
                Some(_) => debug!("{} is empty in {}", key, self.path.display()),
                None => debug!("{} not found in {}", key, self.path.display()),
            }
        }

        Ok(entries)
    }

    /// Look up the text of a single key.
    ///
    /// Returns an empty string when the file does not exist, the key is not
    /// assigned or its value is empty. The last line assigning the key is
    /// used. Unlike [`ConfigStore::load`] this never fails.
    pub fn load_value(&self, key: &str) -> String {
        if !is_valid_key(key) || !self.path.is_file() {
            return String::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return String::new();
            }
        };

        let prefix = format!("{}=", key);
        content
            .replace('\r', "")
            .lines()
            .filter(|line| line.starts_with(&prefix))
            .last()
            .map(|line| unquote(&line[prefix.len()..]).to_string())
            .unwrap_or_default()
    }

    /// Keys assigned in the file, in order of first appearance
    pub fn keys(&self) -> Result<Vec<String>> {
        let content = self.read()?;
        Ok(ConfigFile::parse(&content).assignable_keys())
    }

    /// Write the non-empty values of the selected keys into the file.
    pub fn save(&self, entries: &Entries, selector: &KeySelector) -> Result<()> {
        self.save_with_mode(entries, selector, SaveMode::NonEmptyOnly)
    }

    /// Write `entries` into the file.
    ///
    /// The selector decides which keys are considered: an explicit list, or
    /// the keys already assigned in the file. Each considered key present in
    /// `entries` (and non-empty, in [`SaveMode::NonEmptyOnly`]) replaces the
    /// last assignment of that key in place, dropping earlier duplicates, or
    /// is appended after a blank line when the file does not assign it yet.
    ///
    /// All keys and values are checked before anything is written, so a
    /// failed save leaves the file untouched, and so does a save where every
    /// key is skipped. Lines that are not rewritten keep their exact bytes,
    /// line endings included.
    ///
    /// The new content replaces the file atomically: it is written to a
    /// temporary file in the same directory, which is then renamed over the
    /// target. This needs write access to that directory. Only the
    /// permission bits are carried over, so the replaced file belongs to the
    /// user running the save rather than to the original owner.
    pub fn save_with_mode(
        &self,
        entries: &Entries,
        selector: &KeySelector,
        mode: SaveMode,
    ) -> Result<()> {
        let content = self.read()?;
        let mut file = ConfigFile::parse(&content);
        debug!("Saving {} ({})", self.path.display(), mode);

        let selected = match selector {
            KeySelector::Keys(keys) => keys.clone(),
            KeySelector::Existing => file.assignable_keys(),
        };

        let mut updates = Vec::new();
        for key in &selected {
            if !is_valid_key(key) {
                return Err(ConfigError::InvalidKey(key.clone()));
            }

            let Some(value) = entries.get(key) else {
                debug!("Skipping {}: not declared", key);
                continue;
            };

            if mode == SaveMode::NonEmptyOnly && value.is_empty() {
                debug!("Skipping {}: empty value", key);
                continue;
            }

            if let Some(reason) = value.unrepresentable_reason() {
                return Err(ConfigError::Unrepresentable {
                    key: key.clone(),
                    reason,
                });
            }

            updates.push((key, value));
        }

        if updates.is_empty() {
            debug!("Nothing to save in {}", self.path.display());
            return Ok(());
        }

        for (key, value) in updates {
            match file.set(key, value) {
                SetOutcome::Replaced { line, removed: 0 } => {
                    debug!("Updated {} on line {}", key, line + 1)
                }
                SetOutcome::Replaced { line, removed } => debug!(
                    "Updated {} on line {}, removed {} earlier assignment(s)",
                    key,
                    line + 1,
                    removed
                ),
                SetOutcome::Appended => debug!("Appended {}", key),
            }
        }

        let rendered = file.render();
        if rendered == content {
            debug!("{} is already up to date", self.path.display());
            return Ok(());
        }

        self.write(&rendered)
    }

    /// Read the whole file, enforcing the path preconditions
    fn read(&self) -> Result<String> {
        if self.path.as_os_str().is_empty() {
            error!("No configuration file given");
            return Err(ConfigError::Missing);
        }

        if !self.path.is_file() {
            error!("Configuration file {} not found", self.path.display());
            return Err(ConfigError::NotFound(self.path.clone()));
        }

        fs::read_to_string(&self.path).map_err(|source| {
            error!(
                "Configuration file {} is not readable: {}",
                self.path.display(),
                source
            );
            ConfigError::Unreadable {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Replace the file through a temporary file in the same directory
    fn write(&self, content: &str) -> Result<()> {
        let target = fs::canonicalize(&self.path)?;
        let dir = target.parent().unwrap_or_else(|| Path::new("/"));
        let permissions = fs::metadata(&target)?.permissions();

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().set_permissions(permissions)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| ConfigError::Io(e.error))?;

        debug!("Wrote {}", target.display());
        Ok(())
    }
}
