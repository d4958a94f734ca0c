//! # tlb-dispatch
//!
//! Late-bound automation for strongly-typed COM interfaces.
//!
//! An object implementing some interface `IHost` becomes scriptable by also
//! implementing `IDispatch` and answering those calls from the type library
//! that describes `IHost`. The library is a file shipped next to the host
//! executable, loaded once per object on first use.
//!
//! ## Features
//! - `test-support`: Enables `MockTypeLibraryLoader`/`MockTypeLibrary` via
//!   `mockall` and the plain-text [`testing`] loader.
//!
//! The path helpers, error types and the lazy type library are available on
//! every platform; the OLE backend, [`Dispatcher`] and [`ComGuard`] are
//! Windows only.

mod errors;
mod exe_path;
mod type_library;
mod typedefs;

#[cfg(windows)]
mod com_guard;
#[cfg(windows)]
mod dispatcher;
#[cfg(windows)]
mod ole;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

// Stable public API
pub use errors::{
    DispatchError, DispatchResult, HResult, format_hresult, friendly_dispatch_hint,
    friendly_hresult_hint,
};
pub use exe_path::{executable_directory, path_relative_to_executable};
pub use type_library::{
    DEFAULT_TYPE_LIBRARY_FILE, LazyTypeLibrary, TYPE_INFO_COUNT, TypeDescription, TypeInfoOf,
    TypeLibrary, TypeLibraryLoader, TypeLibrarySource,
};
pub use typedefs::{DispId, InterfaceId};

#[cfg(windows)]
pub use com_guard::{Apartment, ComGuard};
#[cfg(windows)]
pub use dispatcher::Dispatcher;
#[cfg(windows)]
pub use ole::OleTypeLibLoader;

// Test support re-export
#[cfg(any(test, feature = "test-support"))]
pub use type_library::{MockTypeLibrary, MockTypeLibraryLoader};

#[cfg(windows)]
#[doc(hidden)]
pub mod __private {
    pub use windows::Win32::System::Com::{
        DISPATCH_FLAGS, DISPPARAMS, EXCEPINFO, IDispatch_Impl, ITypeInfo,
    };
    pub use windows::Win32::System::Variant::VARIANT;
    pub use windows_core::{ComObjectInterface, GUID, PCWSTR, Result};
}
