//! Lazily loaded, per-instance type library.
//!
//! The loader and library are traits so the load-once state machine can be
//! exercised without OLE; the Windows implementations live in `ole`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(any(test, feature = "test-support"))]
use mockall::automock;

use crate::errors::{DispatchError, DispatchResult};
use crate::exe_path::path_relative_to_executable;
use crate::typedefs::{DispId, InterfaceId};

/// File name of the type library shipped next to the host executable.
pub const DEFAULT_TYPE_LIBRARY_FILE: &str = "sic1.tlb";

/// Number of type descriptions an adapter exposes.
pub const TYPE_INFO_COUNT: u32 = 1;

/// Where a type library is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeLibrarySource {
    /// A file in the directory of the running executable.
    ExecutableRelative(PathBuf),
    /// A path handed to the loader as is.
    Path(PathBuf),
}

impl TypeLibrarySource {
    /// Produces the path to load. Executable-relative sources are resolved
    /// on every call.
    pub fn resolve(&self) -> DispatchResult<PathBuf> {
        match self {
            Self::ExecutableRelative(file) => path_relative_to_executable(file),
            Self::Path(path) => Ok(path.clone()),
        }
    }
}

impl Default for TypeLibrarySource {
    fn default() -> Self {
        Self::ExecutableRelative(PathBuf::from(DEFAULT_TYPE_LIBRARY_FILE))
    }
}

/// A loaded type library.
#[cfg_attr(any(test, feature = "test-support"), automock(type TypeInfo = String;))]
pub trait TypeLibrary {
    /// Description of a single interface.
    type TypeInfo;

    /// Looks up the description of `iid`.
    ///
    /// # Errors
    /// [`DispatchError::InterfaceNotFound`] carrying the underlying code.
    fn type_info_of(&self, iid: InterfaceId) -> DispatchResult<Self::TypeInfo>;
}

/// Opens type library files.
#[cfg_attr(any(test, feature = "test-support"), automock(type Library = MockTypeLibrary;))]
pub trait TypeLibraryLoader {
    type Library: TypeLibrary;

    /// # Errors
    /// [`DispatchError::TypeLibraryLoad`] carrying the underlying code.
    fn load(&self, path: &Path) -> DispatchResult<Self::Library>;
}

/// Name resolution on an interface description.
pub trait TypeDescription {
    /// Resolves member names to dispatch IDs, one per name, in order.
    ///
    /// # Errors
    /// The failure reported by the description (e.g. `DISP_E_UNKNOWNNAME`).
    fn member_ids(&self, names: &[&str]) -> DispatchResult<Vec<DispId>>;
}

/// Type description produced by a loader's library.
pub type TypeInfoOf<L> = <<L as TypeLibraryLoader>::Library as TypeLibrary>::TypeInfo;

/// A type library that is loaded on first use and then kept.
///
/// Starts unloaded. The first successful [`type_info`](Self::type_info)
/// call loads and caches the library for the rest of the instance's life;
/// a failed load leaves it unloaded so a later call retries. The cache is
/// behind a mutex, so concurrent first calls load once.
pub struct LazyTypeLibrary<L: TypeLibraryLoader> {
    loader: L,
    source: TypeLibrarySource,
    library: Mutex<Option<L::Library>>,
}

impl<L: TypeLibraryLoader> LazyTypeLibrary<L> {
    pub fn new(loader: L, source: TypeLibrarySource) -> Self {
        Self {
            loader,
            source,
            library: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &TypeLibrarySource {
        &self.source
    }

    pub fn type_info_count(&self) -> u32 {
        TYPE_INFO_COUNT
    }

    pub fn is_loaded(&self) -> bool {
        self.cache().is_some()
    }

    /// Returns the description of `iid`, loading the library if needed.
    ///
    /// # Errors
    /// - [`DispatchError::IndexOutOfRange`] for any `index` other than 0,
    ///   whatever the load state.
    /// - Path resolution and load failures, leaving the instance unloaded.
    /// - The library's lookup failure; the library stays cached.
    pub fn type_info(&self, index: u32, iid: InterfaceId) -> DispatchResult<TypeInfoOf<L>> {
        if index != 0 {
            return Err(DispatchError::IndexOutOfRange(index));
        }

        let mut cache = self.cache();
        let library = match cache.take() {
            Some(library) => library,
            None => self.load()?,
        };
        let library = cache.insert(library);

        library.type_info_of(iid).inspect_err(|err| {
            tracing::warn!(%iid, code = %err.hresult(), "Interface lookup failed");
        })
    }

    /// Resolves member names of `iid` to dispatch IDs.
    pub fn member_ids(&self, iid: InterfaceId, names: &[&str]) -> DispatchResult<Vec<DispId>>
    where
        TypeInfoOf<L>: TypeDescription,
    {
        self.type_info(0, iid)?.member_ids(names)
    }

    fn load(&self) -> DispatchResult<L::Library> {
        let path = self.source.resolve()?;
        tracing::debug!(path = %path.display(), "Loading type library");

        match self.loader.load(&path) {
            Ok(library) => {
                tracing::info!(path = %path.display(), "Type library loaded");
                Ok(library)
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    code = %err.hresult(),
                    error = %err,
                    "Type library load failed"
                );
                Err(err)
            }
        }
    }

    // The cache is a plain `Option`, so a poisoned lock holds a usable value.
    fn cache(&self) -> MutexGuard<'_, Option<L::Library>> {
        self.library.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: TypeLibraryLoader + Default> Default for LazyTypeLibrary<L> {
    fn default() -> Self {
        Self::new(L::default(), TypeLibrarySource::default())
    }
}

impl<L: TypeLibraryLoader> std::fmt::Debug for LazyTypeLibrary<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyTypeLibrary")
            .field("source", &self.source)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
