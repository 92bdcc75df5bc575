// riddlebot-core/src/loader.rs
//!
//! Module discovery and loading. A `ModuleSource` knows how to find and
//! instantiate definition units; the `ModuleCache` sits on top of it and
//! gives reload its semantics: `load` returns the cached instance until
//! `invalidate` drops everything under a root, after which the next `load`
//! re-executes the module body from scratch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use libloading::{Library, Symbol};
use tracing::{debug, error};

use riddlebot_common::error::Error;
use riddlebot_common::models::definition::Definition;

/// A source of loadable definition modules.
pub trait ModuleSource: Send + Sync {
    /// Every loadable module path under `root`, recursively, in sorted
    /// order so collision handling is reproducible.
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, Error>;

    fn is_loadable(&self, path: &Path) -> bool;

    /// Executes the module body and returns a fresh definition instance.
    fn instantiate(&self, path: &Path) -> Result<Definition, Error>;
}

/// Loads definitions from dynamic libraries. Each library exports a
/// constructor under the `riddlebot_definition` symbol:
///
/// ```ignore
/// #[no_mangle]
/// pub extern "C" fn riddlebot_definition() -> *mut Definition { ... }
/// ```
pub struct LibraryModuleSource;

impl LibraryModuleSource {
    #[cfg(target_os = "windows")]
    const EXTENSION: &'static str = "dll";
    #[cfg(target_os = "macos")]
    const EXTENSION: &'static str = "dylib";
    #[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
    const EXTENSION: &'static str = "so";

    fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), Error> {
        let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            if path.is_dir() {
                Self::walk(&path, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(Self::EXTENSION) {
                out.push(path);
            }
        }
        Ok(())
    }
}

impl ModuleSource for LibraryModuleSource {
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        if !root.exists() {
            debug!("Module folder '{}' does not exist; skipping.", root.display());
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        Self::walk(root, &mut paths)?;
        Ok(paths)
    }

    fn is_loadable(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(Self::EXTENSION)
    }

    fn instantiate(&self, path: &Path) -> Result<Definition, Error> {
        unsafe {
            let lib = Library::new(path)?;
            let constructor: Symbol<unsafe extern "C" fn() -> *mut Definition> =
                lib.get(b"riddlebot_definition")?;
            let raw = constructor();
            if raw.is_null() {
                return Err(Error::Load(format!(
                    "Constructor in {} returned null",
                    path.display()
                )));
            }
            let definition = *Box::from_raw(raw);
            // The definition's handler code lives inside the library, so the
            // handle must stay open for the life of the process.
            std::mem::forget(lib);
            Ok(definition)
        }
    }
}

type DefinitionCtor = dyn Fn() -> Definition + Send + Sync;

/// In-memory source mapping virtual paths to definition constructors. Used
/// for built-in definitions and for exercising registration and reload
/// without a real filesystem.
#[derive(Default)]
pub struct StaticModuleSource {
    modules: Mutex<HashMap<PathBuf, Arc<DefinitionCtor>>>,
}

impl StaticModuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        path: impl Into<PathBuf>,
        ctor: impl Fn() -> Definition + Send + Sync + 'static,
    ) {
        let mut modules = self.modules.lock().unwrap();
        modules.insert(path.into(), Arc::new(ctor));
    }

    pub fn remove(&self, path: &Path) {
        let mut modules = self.modules.lock().unwrap();
        modules.remove(path);
    }
}

impl ModuleSource for StaticModuleSource {
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        let modules = self.modules.lock().unwrap();
        let mut paths: Vec<PathBuf> = modules
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn is_loadable(&self, path: &Path) -> bool {
        self.modules.lock().unwrap().contains_key(path)
    }

    fn instantiate(&self, path: &Path) -> Result<Definition, Error> {
        let ctor = {
            let modules = self.modules.lock().unwrap();
            modules.get(path).cloned()
        };
        match ctor {
            Some(ctor) => Ok(ctor()),
            None => Err(Error::Load(format!(
                "{} is not a loadable module",
                path.display()
            ))),
        }
    }
}

/// Process-local module cache. Explicit, rather than relying on any ambient
/// runtime caching, so reload behavior is observable and testable.
pub struct ModuleCache {
    source: Arc<dyn ModuleSource>,
    loaded: Mutex<HashMap<PathBuf, Definition>>,
}

impl ModuleCache {
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, Error> {
        self.source.discover(root)
    }

    /// Returns the cached instance for `path`, instantiating (and caching)
    /// it on first use.
    pub fn load(&self, path: &Path) -> Result<Definition, Error> {
        {
            let loaded = self.loaded.lock().unwrap();
            if let Some(def) = loaded.get(path) {
                return Ok(def.clone());
            }
        }
        if !self.source.is_loadable(path) {
            return Err(Error::Load(format!(
                "{} is not a loadable module",
                path.display()
            )));
        }
        let definition = self.source.instantiate(path)?;
        let mut loaded = self.loaded.lock().unwrap();
        loaded.insert(path.to_path_buf(), definition.clone());
        Ok(definition)
    }

    /// Drops the cached state for every module under `root`. The next
    /// `load` of any of them re-executes the module body, which is what
    /// lets hot-reload observe edited modules.
    pub fn invalidate(&self, root: &Path) {
        let mut loaded = self.loaded.lock().unwrap();
        let before = loaded.len();
        loaded.retain(|path, _| !path.starts_with(root));
        debug!(
            "Invalidated {} cached module(s) under {}",
            before - loaded.len(),
            root.display()
        );
    }

    pub fn cached_count(&self) -> usize {
        self.loaded.lock().unwrap().len()
    }
}

/// Discover-and-load over a set of roots. Load failures are logged and the
/// offending module skipped; a root whose discovery fails is logged and the
/// remaining roots proceed.
pub fn load_all(cache: &ModuleCache, roots: &[PathBuf]) -> Vec<(PathBuf, Definition)> {
    let mut out = Vec::new();
    for root in roots {
        let paths = match cache.discover(root) {
            Ok(paths) => paths,
            Err(e) => {
                error!("Error discovering modules under {}: {e}", root.display());
                continue;
            }
        };
        for path in paths {
            match cache.load(&path) {
                Ok(def) => out.push((path, def)),
                Err(e) => {
                    error!("Error loading module {}: {e}", path.display());
                }
            }
        }
    }
    out
}
