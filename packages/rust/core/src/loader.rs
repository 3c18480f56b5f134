//! Fragment loading: resolving section descriptors against a case directory.
//!
//! [`FragmentStore`] is the only place assembly touches storage. The
//! filesystem implementation decodes text with a legacy-encoding fallback
//! (documents converted from office files are often GBK); [`MemoryStore`]
//! serves tests and callers that already hold the fragments.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use encoding_rs::{GB18030, GBK};
use tracing::debug;

use patentdraft_shared::{Fragment, PatentDraftError, Result, SectionDescriptor};

/// Source of section fragments, keyed by canonical file name.
pub trait FragmentStore {
    /// Where `filename` lives (or would live) in this store.
    fn locate(&self, filename: &str) -> PathBuf;

    /// Full text of `filename`, or `None` when it does not exist.
    fn read_text(&self, filename: &str) -> Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// DirStore
// ---------------------------------------------------------------------------

/// Fragments stored as files in a case directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Open a case directory. Fails when it is missing or not a directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            return Err(PatentDraftError::missing_input(dir));
        }
        if !dir.is_dir() {
            return Err(PatentDraftError::validation(format!(
                "not a directory: {}",
                dir.display()
            )));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FragmentStore for DirStore {
    fn locate(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    fn read_text(&self, filename: &str) -> Result<Option<String>> {
        let path = self.locate(filename);
        match std::fs::read(&path) {
            Ok(bytes) => decode_text(&bytes)
                .map(Some)
                .ok_or(PatentDraftError::Encoding { path }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PatentDraftError::io(path, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Fragments held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    root: PathBuf,
    files: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            files: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, filename: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.files.insert(filename.into(), text.into());
        self
    }
}

impl FragmentStore for MemoryStore {
    fn locate(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    fn read_text(&self, filename: &str) -> Result<Option<String>> {
        Ok(self.files.get(filename).cloned())
    }
}

// ---------------------------------------------------------------------------
// Loading & decoding
// ---------------------------------------------------------------------------

/// Load one section. A missing file yields an absent fragment, not an error.
pub fn load_fragment(store: &impl FragmentStore, section: &SectionDescriptor) -> Result<Fragment> {
    let source_path = store.locate(section.filename);
    match store.read_text(section.filename)? {
        Some(text) => {
            debug!(file = section.filename, len = text.len(), "fragment loaded");
            Ok(Fragment::present(source_path, text.trim()))
        }
        None => {
            debug!(file = section.filename, "fragment absent");
            Ok(Fragment::absent(source_path))
        }
    }
}

/// Read a text file the caller explicitly named (prompt, context, claims).
///
/// Unlike fragments, a missing file here is a [`PatentDraftError::MissingInput`].
pub fn read_text_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PatentDraftError::missing_input(path),
        _ => PatentDraftError::io(path, e),
    })?;
    decode_text(&bytes).ok_or_else(|| PatentDraftError::Encoding {
        path: path.to_path_buf(),
    })
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to GBK then GB18030.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_string());
    }

    [GBK, GB18030].into_iter().find_map(|encoding| {
        let decoded = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
        debug!(encoding = encoding.name(), "decoded with legacy encoding");
        Some(decoded.into_owned())
    })
}
