//! `IDispatch` support for typed COM interfaces.
//!
//! A [`Dispatcher`] answers the four `IDispatch` methods for one interface
//! `I` from the type library that describes it. Objects embed one and let
//! [`impl_dispatch!`](crate::impl_dispatch) write the `IDispatch_Impl`
//! forwarding:
//!
//! ```ignore
//! #[implement(IHost, IDispatch)]
//! struct Host {
//!     dispatch: Dispatcher<IHost>,
//! }
//!
//! impl IHost_Impl for Host_Impl { /* typed methods */ }
//!
//! impl_dispatch!(Host_Impl, IHost, dispatch);
//! ```

use std::marker::PhantomData;

use windows::Win32::System::Com::{DISPATCH_FLAGS, DISPPARAMS, EXCEPINFO, ITypeInfo};
use windows::Win32::System::Variant::VARIANT;
use windows_core::{Interface, PCWSTR};

use crate::errors::DispatchResult;
use crate::ole::OleTypeLibLoader;
use crate::type_library::{LazyTypeLibrary, TypeLibrary, TypeLibraryLoader, TypeLibrarySource};
use crate::typedefs::{DispId, InterfaceId};

/// Late-bound access to interface `I`, described by a lazily loaded type
/// library.
pub struct Dispatcher<I: Interface, L: TypeLibraryLoader = OleTypeLibLoader> {
    type_library: LazyTypeLibrary<L>,
    _interface: PhantomData<fn() -> I>,
}

impl<I: Interface> Dispatcher<I> {
    /// Reads `sic1.tlb` from the executable directory on first use.
    pub fn new() -> Self {
        Self::with_source(TypeLibrarySource::default())
    }

    pub fn with_source(source: TypeLibrarySource) -> Self {
        Self::with_loader(OleTypeLibLoader, source)
    }
}

impl<I: Interface> Default for Dispatcher<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, L> Dispatcher<I, L>
where
    I: Interface,
    L: TypeLibraryLoader,
    L::Library: TypeLibrary<TypeInfo = ITypeInfo>,
{
    pub fn with_loader(loader: L, source: TypeLibrarySource) -> Self {
        Self {
            type_library: LazyTypeLibrary::new(loader, source),
            _interface: PhantomData,
        }
    }

    pub fn interface_id() -> InterfaceId {
        I::IID.into()
    }

    pub fn is_loaded(&self) -> bool {
        self.type_library.is_loaded()
    }

    /// `IDispatch::GetTypeInfoCount`.
    pub fn type_info_count(&self) -> u32 {
        self.type_library.type_info_count()
    }

    /// `IDispatch::GetTypeInfo`. Only index 0 exists.
    pub fn type_info(&self, index: u32) -> DispatchResult<ITypeInfo> {
        self.type_library.type_info(index, Self::interface_id())
    }

    /// `IDispatch::GetIDsOfNames`, forwarded to the type description.
    ///
    /// Errors from the type description are returned as they came, error
    /// info included.
    ///
    /// # Safety
    ///
    /// `names` must point to `count` valid strings and `ids` must have room
    /// for `count` values, as the `IDispatch` contract requires.
    pub unsafe fn ids_of_names(
        &self,
        names: *const PCWSTR,
        count: u32,
        ids: *mut i32,
    ) -> windows_core::Result<()> {
        let info = self.type_info(0)?;
        // SAFETY: Pointer validity is the caller's obligation, passed through.
        unsafe { info.GetIDsOfNames(names, count, ids) }
    }

    /// `IDispatch::Invoke`, forwarded to the type description with `this`
    /// as the instance whose vtable receives the call. The callee's result
    /// is returned unchanged.
    ///
    /// # Safety
    ///
    /// `params`, `result`, `exception` and `arg_error` must satisfy the
    /// `IDispatch::Invoke` contract; `this` must be the object that owns
    /// this dispatcher.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn invoke(
        &self,
        this: &I,
        member: i32,
        flags: DISPATCH_FLAGS,
        params: *const DISPPARAMS,
        result: *mut VARIANT,
        exception: *mut EXCEPINFO,
        arg_error: *mut u32,
    ) -> windows_core::Result<()> {
        let info = self.type_info(0)?;
        tracing::trace!(member, flags = flags.0, "Forwarding late-bound call");
        // SAFETY: `this` is a live `I` pointer; the remaining pointers come
        // from the caller under the `Invoke` contract. `ITypeInfo::Invoke`
        // does not write through `params`.
        unsafe {
            info.Invoke(
                this.as_raw(),
                member,
                flags,
                params.cast_mut(),
                result,
                exception,
                arg_error,
            )
        }
    }

    /// Resolves member names to dispatch IDs without raw pointers.
    pub fn member_ids(&self, names: &[&str]) -> DispatchResult<Vec<DispId>> {
        self.type_library.member_ids(Self::interface_id(), names)
    }
}

impl<I: Interface, L: TypeLibraryLoader> std::fmt::Debug for Dispatcher<I, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("interface", &InterfaceId::from(I::IID))
            .field("type_library", &self.type_library)
            .finish()
    }
}

/// Implements `IDispatch_Impl` for a `#[implement]` object by forwarding to
/// one of its [`Dispatcher`] fields.
///
/// Arguments: the generated `_Impl` type, the interface the dispatcher
/// describes (also listed in `#[implement]`), and the field name.
/// Adapter failures reach the caller as the matching status code; failures
/// from the type description pass through untouched.
#[macro_export]
macro_rules! impl_dispatch {
    ($object:ident, $interface:ty, $field:ident) => {
        impl $crate::__private::IDispatch_Impl for $object {
            fn GetTypeInfoCount(&self) -> $crate::__private::Result<u32> {
                Ok(self.$field.type_info_count())
            }

            fn GetTypeInfo(
                &self,
                itinfo: u32,
                _lcid: u32,
            ) -> $crate::__private::Result<$crate::__private::ITypeInfo> {
                self.$field.type_info(itinfo).map_err(Into::into)
            }

            fn GetIDsOfNames(
                &self,
                _riid: *const $crate::__private::GUID,
                rgsznames: *const $crate::__private::PCWSTR,
                cnames: u32,
                _lcid: u32,
                rgdispid: *mut i32,
            ) -> $crate::__private::Result<()> {
                // SAFETY: Arguments are forwarded unchanged from the COM caller.
                unsafe { self.$field.ids_of_names(rgsznames, cnames, rgdispid) }
            }

            fn Invoke(
                &self,
                dispidmember: i32,
                _riid: *const $crate::__private::GUID,
                _lcid: u32,
                wflags: $crate::__private::DISPATCH_FLAGS,
                pdispparams: *const $crate::__private::DISPPARAMS,
                pvarresult: *mut $crate::__private::VARIANT,
                pexcepinfo: *mut $crate::__private::EXCEPINFO,
                puargerr: *mut u32,
            ) -> $crate::__private::Result<()> {
                let this =
                    <Self as $crate::__private::ComObjectInterface<$interface>>::as_interface_ref(
                        self,
                    );
                // SAFETY: `this` is this object's own interface; the other
                // arguments are forwarded unchanged from the COM caller.
                unsafe {
                    self.$field.invoke(
                        &this,
                        dispidmember,
                        wflags,
                        pdispparams,
                        pvarresult,
                        pexcepinfo,
                        puargerr,
                    )
                }
            }
        }
    };
}
