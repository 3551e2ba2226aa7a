//! Loader context seam
//!
//! The bundler hands each loader invocation a context describing the module
//! being loaded. [`LoaderContext`] is the subset the placeholder transform
//! needs, so hosts (the Rolldown plugin, tests) can inject their own.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Host services available to one loader invocation.
pub trait LoaderContext: Send + Sync {
    /// Absolute path of the asset being loaded.
    fn resource_path(&self) -> &Path;

    /// Raw loader options as configured by the user, if any.
    fn options(&self) -> Option<&serde_json::Value>;

    /// Mark whether the loader result may be cached by the host.
    fn cacheable(&self, flag: bool);

    /// Emit an additional output file alongside the bundle.
    fn emit_file(&self, name: &str, content: Vec<u8>);
}

/// A file emitted through [`LoaderContext::emit_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// In-memory loader context.
///
/// Emitted files are collected and can be drained by the host after the
/// loader finishes.
#[derive(Debug, Clone)]
pub struct MemoryLoaderContext {
    resource_path: PathBuf,
    options: Option<serde_json::Value>,
    cacheable: Arc<Mutex<bool>>,
    emitted: Arc<Mutex<Vec<EmittedFile>>>,
}

impl MemoryLoaderContext {
    /// Create a context for the given asset with no options
    pub fn new(resource_path: impl Into<PathBuf>) -> Self {
        Self {
            resource_path: resource_path.into(),
            options: None,
            cacheable: Arc::new(Mutex::new(false)),
            emitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Attach raw loader options
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Whether the loader marked its result cacheable
    pub fn is_cacheable(&self) -> bool {
        *self.cacheable.lock()
    }

    /// Snapshot of the files emitted so far
    pub fn emitted_files(&self) -> Vec<EmittedFile> {
        self.emitted.lock().clone()
    }

    /// Remove and return the files emitted so far
    pub fn take_emitted_files(&self) -> Vec<EmittedFile> {
        std::mem::take(&mut *self.emitted.lock())
    }
}

impl LoaderContext for MemoryLoaderContext {
    fn resource_path(&self) -> &Path {
        &self.resource_path
    }

    fn options(&self) -> Option<&serde_json::Value> {
        self.options.as_ref()
    }

    fn cacheable(&self, flag: bool) {
        *self.cacheable.lock() = flag;
    }

    fn emit_file(&self, name: &str, content: Vec<u8>) {
        self.emitted.lock().push(EmittedFile {
            name: name.to_string(),
            content,
        });
    }
}
