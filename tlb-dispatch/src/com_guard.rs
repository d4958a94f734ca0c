//! RAII guard for COM initialization/teardown.
//!
//! Ensures `CoUninitialize` is called exactly once per successful
//! `CoInitializeEx`, even on early returns or panics.

use std::marker::PhantomData;

use windows::Win32::System::Com::{
    COINIT, COINIT_APARTMENTTHREADED, COINIT_MULTITHREADED, CoInitializeEx, CoUninitialize,
};

use crate::errors::DispatchResult;

/// COM apartment a thread joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Apartment {
    /// STA, the model scripting hosts run automation objects in.
    #[default]
    SingleThreaded,
    /// MTA.
    MultiThreaded,
}

impl Apartment {
    fn coinit(self) -> COINIT {
        match self {
            Self::SingleThreaded => COINIT_APARTMENTTHREADED,
            Self::MultiThreaded => COINIT_MULTITHREADED,
        }
    }
}

/// Drop guard for COM thread initialization.
///
/// # Thread Safety
///
/// `ComGuard` is `!Send` and `!Sync`. COM initialization is per-thread, so
/// the guard must be created and dropped on the same OS thread.
///
/// # Examples
///
/// ```no_run
/// use tlb_dispatch::{Apartment, ComGuard};
///
/// let _guard = ComGuard::new(Apartment::SingleThreaded)?;
/// // ... COM operations ...
/// # Ok::<(), tlb_dispatch::DispatchError>(())
/// ```
#[derive(Debug)]
pub struct ComGuard {
    apartment: Apartment,
    /// Prevents `Send + Sync` auto-derivation. COM init is per-thread.
    _not_send: PhantomData<*mut ()>,
}

impl ComGuard {
    /// Initializes COM on the current thread.
    ///
    /// `S_FALSE` (already initialized in the same apartment) counts as
    /// success and is still balanced on drop.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `CoInitializeEx` fails, e.g. `RPC_E_CHANGED_MODE`
    /// when the thread already joined the other apartment.
    pub fn new(apartment: Apartment) -> DispatchResult<Self> {
        // SAFETY: Plain FFI call; a successful result is balanced by
        // `CoUninitialize` in `Drop`.
        let hr = unsafe { CoInitializeEx(None, apartment.coinit()) };

        if let Err(e) = hr.ok() {
            tracing::error!(error = ?e, ?apartment, "COM initialization failed");
            return Err(e.into());
        }

        tracing::debug!(?apartment, "COM initialized");

        Ok(Self {
            apartment,
            _not_send: PhantomData,
        })
    }

    pub fn apartment(&self) -> Apartment {
        self.apartment
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        tracing::debug!(apartment = ?self.apartment, "COM teardown");
        // SAFETY: Paired with the successful `CoInitializeEx` in `new()`,
        // on the same thread (!Send).
        unsafe {
            CoUninitialize();
        }
    }
}
