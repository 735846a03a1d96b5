//! Per-module cache of opened debug info
//!
//! Opening a binary and reading its symbol table is the expensive part of
//! symbolization, so the contexts of the most recently used modules are kept.
//! With the default capacity of one, switching modules releases the previous
//! context before the next one is opened.

use log::{debug, info, warn};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::debug_info::{DebugContainer, DebugInfoLoader, SymbolSource, SymbolTable};
use super::line_resolver::resolve_location;
use crate::domain::{ResolvedLocation, SymbolizeError};

/// Opened debug info and symbol table of one module
pub struct ModuleSymbolContext<C> {
    path: PathBuf,
    container: C,
    symbols: SymbolTable,
}

impl<C: DebugContainer> ModuleSymbolContext<C> {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn container(&self) -> &C {
        &self.container
    }

    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Resolve an offset relative to this module's load base
    #[must_use]
    pub fn resolve(&self, offset: u64) -> Option<ResolvedLocation> {
        resolve_location(&self.container, &self.symbols, offset)
    }
}

/// Bounded cache of [`ModuleSymbolContext`]s keyed by module path
pub struct ModuleSymbolCache<L: DebugInfoLoader> {
    loader: L,
    capacity: usize,
    /// Most recently used first
    contexts: VecDeque<ModuleSymbolContext<L::Container>>,
    last_failure: Option<PathBuf>,
}

impl<L: DebugInfoLoader> ModuleSymbolCache<L> {
    /// Single-slot cache
    pub fn new(loader: L) -> Self {
        Self::with_capacity(loader, 1)
    }

    /// Cache holding up to `capacity` modules (at least one)
    pub fn with_capacity(loader: L, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { loader, capacity, contexts: VecDeque::with_capacity(capacity), last_failure: None }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Path of the most recently used module
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.contexts.front().map(ModuleSymbolContext::path)
    }

    /// Make `path` the current module, opening it if it is not cached
    ///
    /// # Errors
    /// Returns the loader's error if the module cannot be opened, or
    /// [`SymbolizeError::Unavailable`] if the same module failed to open on the
    /// previous attempt
    pub fn ensure_loaded(
        &mut self,
        path: &Path,
    ) -> Result<&ModuleSymbolContext<L::Container>, SymbolizeError> {
        if let Some(pos) = self.contexts.iter().position(|ctx| ctx.path == path) {
            if pos != 0 {
                if let Some(ctx) = self.contexts.remove(pos) {
                    self.contexts.push_front(ctx);
                }
            }
            return Ok(&self.contexts[0]);
        }

        if self.last_failure.as_deref() == Some(path) {
            return Err(SymbolizeError::Unavailable(path.to_path_buf()));
        }

        // Release before acquiring, even if the open below fails
        while self.contexts.len() >= self.capacity {
            if let Some(evicted) = self.contexts.pop_back() {
                debug!("Releasing debug info for {}", evicted.path.display());
            }
        }

        let container = match self.loader.open(path) {
            Ok(container) => container,
            Err(e) => {
                warn!("{e}");
                self.last_failure = Some(path.to_path_buf());
                return Err(e);
            }
        };
        self.last_failure = None;

        let symbols = read_symbol_table(&container, path);
        info!(
            "Loaded debug info for {} ({} sections, {} symbols)",
            path.display(),
            container.sections().len(),
            symbols.len()
        );

        self.contexts.push_front(ModuleSymbolContext {
            path: path.to_path_buf(),
            container,
            symbols,
        });
        Ok(&self.contexts[0])
    }

    /// Release every cached module
    pub fn clear(&mut self) {
        self.contexts.clear();
        self.last_failure = None;
    }
}

/// Prefer the full symbol table, fall back to the dynamic one
fn read_symbol_table<C: DebugContainer>(container: &C, path: &Path) -> SymbolTable {
    if !container.has_symbol_table() {
        if path.is_absolute() {
            warn!("{} is flagged as having no symbols", path.display());
        } else {
            debug!("{} is flagged as having no symbols", path.display());
        }
        return SymbolTable::default();
    }

    let symbols = container.read_symbols(SymbolSource::Static);
    if !symbols.is_empty() {
        return symbols;
    }

    let symbols = container.read_symbols(SymbolSource::Dynamic);
    if symbols.is_empty() {
        warn!("Found no symbols in {}", path.display());
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::debug_info::{SectionInfo, SymbolEntry};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Open(PathBuf),
        Release(PathBuf),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct TrackedContainer {
        path: PathBuf,
        has_symbols: bool,
        static_symbols: Vec<SymbolEntry>,
        dynamic_symbols: Vec<SymbolEntry>,
        log: Log,
    }

    impl Drop for TrackedContainer {
        fn drop(&mut self) {
            self.log.borrow_mut().push(Event::Release(self.path.clone()));
        }
    }

    impl DebugContainer for TrackedContainer {
        fn sections(&self) -> &[SectionInfo] {
            &[]
        }

        fn has_symbol_table(&self) -> bool {
            self.has_symbols
        }

        fn read_symbols(&self, source: SymbolSource) -> SymbolTable {
            match source {
                SymbolSource::Static => SymbolTable::new(self.static_symbols.clone()),
                SymbolSource::Dynamic => SymbolTable::new(self.dynamic_symbols.clone()),
            }
        }

        fn find_nearest_line(
            &self,
            _section: &SectionInfo,
            _symbols: &SymbolTable,
            _offset: u64,
        ) -> Option<ResolvedLocation> {
            None
        }
    }

    struct TrackingLoader {
        log: Log,
    }

    impl DebugInfoLoader for TrackingLoader {
        type Container = TrackedContainer;

        fn open(&self, path: &Path) -> Result<TrackedContainer, SymbolizeError> {
            if path.to_string_lossy().contains("missing") {
                return Err(SymbolizeError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            self.log.borrow_mut().push(Event::Open(path.to_path_buf()));
            let symbol = |name: &str| SymbolEntry { address: 0x10, size: 4, name: name.into() };
            Ok(TrackedContainer {
                path: path.to_path_buf(),
                has_symbols: !path.to_string_lossy().contains("stripped"),
                static_symbols: if path.to_string_lossy().contains("dynonly") {
                    Vec::new()
                } else {
                    vec![symbol("static_fn")]
                },
                dynamic_symbols: vec![symbol("dynamic_fn")],
                log: Rc::clone(&self.log),
            })
        }
    }

    fn cache(capacity: usize) -> (ModuleSymbolCache<TrackingLoader>, Log) {
        let log: Log = Rc::default();
        (ModuleSymbolCache::with_capacity(TrackingLoader { log: Rc::clone(&log) }, capacity), log)
    }

    fn open(path: &str) -> Event {
        Event::Open(PathBuf::from(path))
    }

    fn release(path: &str) -> Event {
        Event::Release(PathBuf::from(path))
    }

    #[test]
    fn test_same_module_is_not_reopened() {
        let (mut cache, log) = cache(1);
        cache.ensure_loaded(Path::new("/bin/a")).unwrap();
        cache.ensure_loaded(Path::new("/bin/a")).unwrap();

        assert_eq!(*log.borrow(), vec![open("/bin/a")]);
        assert_eq!(cache.current_path(), Some(Path::new("/bin/a")));
    }

    #[test]
    fn test_switch_releases_before_acquiring() {
        let (mut cache, log) = cache(1);
        for path in ["/bin/a", "/bin/b", "/bin/a", "/bin/a", "/bin/c"] {
            cache.ensure_loaded(Path::new(path)).unwrap();
        }

        assert_eq!(
            *log.borrow(),
            vec![
                open("/bin/a"),
                release("/bin/a"),
                open("/bin/b"),
                release("/bin/b"),
                open("/bin/a"),
                release("/bin/a"),
                open("/bin/c"),
            ]
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_open_still_releases_previous() {
        let (mut cache, log) = cache(1);
        cache.ensure_loaded(Path::new("/bin/a")).unwrap();
        let err = cache.ensure_loaded(Path::new("/bin/missing")).err().unwrap();

        assert!(matches!(err, SymbolizeError::Open { .. }));
        assert_eq!(*log.borrow(), vec![open("/bin/a"), release("/bin/a")]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_failed_module_is_not_retried() {
        let (mut cache, _log) = cache(1);
        assert!(cache.ensure_loaded(Path::new("/bin/missing")).is_err());
        let err = cache.ensure_loaded(Path::new("/bin/missing")).err().unwrap();
        assert!(matches!(err, SymbolizeError::Unavailable(_)));
    }

    #[test]
    fn test_drop_releases_exactly_once() {
        let (mut cache, log) = cache(1);
        cache.ensure_loaded(Path::new("/bin/a")).unwrap();
        drop(cache);

        assert_eq!(*log.borrow(), vec![open("/bin/a"), release("/bin/a")]);
    }

    #[test]
    fn test_lru_keeps_recent_modules() {
        let (mut cache, log) = cache(2);
        for path in ["/bin/a", "/bin/b", "/bin/a", "/bin/c"] {
            cache.ensure_loaded(Path::new(path)).unwrap();
        }

        // b was least recently used when c arrived
        assert_eq!(
            *log.borrow(),
            vec![open("/bin/a"), open("/bin/b"), release("/bin/b"), open("/bin/c")]
        );
        assert_eq!(cache.current_path(), Some(Path::new("/bin/c")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_single_slot() {
        let (cache, _log) = cache(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_prefers_static_symbols() {
        let (mut cache, _log) = cache(1);
        let ctx = cache.ensure_loaded(Path::new("/bin/a")).unwrap();
        assert_eq!(ctx.symbols().nearest(0x10).map(|s| s.name.as_str()), Some("static_fn"));
    }

    #[test]
    fn test_falls_back_to_dynamic_symbols() {
        let (mut cache, _log) = cache(1);
        let ctx = cache.ensure_loaded(Path::new("/lib/dynonly.so")).unwrap();
        assert_eq!(ctx.symbols().nearest(0x10).map(|s| s.name.as_str()), Some("dynamic_fn"));
    }

    #[test]
    fn test_module_without_symbols_keeps_container() {
        let (mut cache, _log) = cache(1);
        let ctx = cache.ensure_loaded(Path::new("/lib/stripped.so")).unwrap();
        assert!(ctx.symbols().is_empty());
        assert_eq!(ctx.path(), Path::new("/lib/stripped.so"));
    }

    #[test]
    fn test_clear_releases_everything() {
        let (mut cache, log) = cache(2);
        cache.ensure_loaded(Path::new("/bin/a")).unwrap();
        cache.ensure_loaded(Path::new("/bin/b")).unwrap();
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(log.borrow().iter().filter(|e| matches!(e, Event::Release(_))).count(), 2);
    }
}
