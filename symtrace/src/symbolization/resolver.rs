//! The `SymbolResolver` capability and its implementations
//!
//! [`ObjectSymbolResolver`] reads debug info from the loaded modules'
//! files; on Windows [`super::dbghelp::DbgHelpResolver`] asks the OS
//! debug-help library instead. [`platform_resolver`] picks one at build time.

use log::debug;

use super::debug_info::DebugInfoLoader;
use super::module_locator::{locate_module, ModuleEnumerator};
use super::symbol_cache::ModuleSymbolCache;
use crate::config::TraceConfig;
use crate::domain::{Address, ResolvedLocation};

/// Resolves runtime addresses of the current process to source locations
pub trait SymbolResolver {
    /// Resolve one address; `None` means the caller should print it raw
    fn resolve(&mut self, addr: Address) -> Option<ResolvedLocation>;
}

impl<R: SymbolResolver + ?Sized> SymbolResolver for Box<R> {
    fn resolve(&mut self, addr: Address) -> Option<ResolvedLocation> {
        (**self).resolve(addr)
    }
}

/// Resolution through the loaded modules' object files
///
/// Locates the owning module, switches the symbol cache to it, and resolves
/// the module-relative offset against its sections.
pub struct ObjectSymbolResolver<E, L: DebugInfoLoader> {
    modules: E,
    cache: ModuleSymbolCache<L>,
}

impl<E: ModuleEnumerator, L: DebugInfoLoader> ObjectSymbolResolver<E, L> {
    pub fn new(modules: E, loader: L) -> Self {
        Self::with_cache(modules, ModuleSymbolCache::new(loader))
    }

    pub fn with_cache(modules: E, cache: ModuleSymbolCache<L>) -> Self {
        Self { modules, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &ModuleSymbolCache<L> {
        &self.cache
    }
}

impl<E: ModuleEnumerator, L: DebugInfoLoader> SymbolResolver for ObjectSymbolResolver<E, L> {
    fn resolve(&mut self, addr: Address) -> Option<ResolvedLocation> {
        let Some(module) = locate_module(&self.modules, addr) else {
            debug!("Address {addr} is outside every loaded module");
            return None;
        };

        let offset = module.relative(addr);
        let context = match self.cache.ensure_loaded(module.symbol_path()) {
            Ok(context) => context,
            Err(e) => {
                debug!("Cannot resolve {addr}: {e}");
                return None;
            }
        };

        context.resolve(offset)
    }
}

/// Resolver for platforms without a supported debug-info mechanism
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedResolver;

impl SymbolResolver for UnsupportedResolver {
    fn resolve(&mut self, _addr: Address) -> Option<ResolvedLocation> {
        None
    }
}

/// The resolver for the platform this crate was built for
#[cfg(target_os = "linux")]
#[must_use]
pub fn platform_resolver(config: &TraceConfig) -> Box<dyn SymbolResolver> {
    use super::module_locator::DlPhdrEnumerator;
    use super::object_file::ObjectLoader;

    let cache = ModuleSymbolCache::with_capacity(ObjectLoader, config.cache_capacity);
    Box::new(ObjectSymbolResolver::with_cache(DlPhdrEnumerator, cache))
}

/// The resolver for the platform this crate was built for
#[cfg(windows)]
#[must_use]
pub fn platform_resolver(_config: &TraceConfig) -> Box<dyn SymbolResolver> {
    match super::dbghelp::DbgHelpResolver::new() {
        Ok(resolver) => Box::new(resolver),
        Err(e) => {
            log::warn!("{e}");
            Box::new(UnsupportedResolver)
        }
    }
}

/// The resolver for the platform this crate was built for
#[cfg(not(any(target_os = "linux", windows)))]
#[must_use]
pub fn platform_resolver(_config: &TraceConfig) -> Box<dyn SymbolResolver> {
    debug!("No symbol resolver for this platform, frames print raw");
    Box::new(UnsupportedResolver)
}
