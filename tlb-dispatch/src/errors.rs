use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::typedefs::InterfaceId;

/// Result type alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// A COM status code.
///
/// Kept as a plain `i32` so the error taxonomy is usable on every platform;
/// on Windows it converts losslessly to and from `windows::core::HRESULT`.
///
/// # Examples
///
/// ```
/// use tlb_dispatch::HResult;
///
/// assert_eq!(HResult::from_win32(126), HResult::MOD_NOT_FOUND);
/// assert_eq!(HResult::MOD_NOT_FOUND.to_string(), "0x8007007E");
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HResult(pub i32);

#[allow(clippy::cast_possible_wrap)]
impl HResult {
    pub const S_OK: Self = Self(0);
    pub const E_FAIL: Self = Self(0x8000_4005_u32 as i32);
    pub const E_INVALIDARG: Self = Self(0x8007_0057_u32 as i32);
    pub const DISP_E_MEMBERNOTFOUND: Self = Self(0x8002_0003_u32 as i32);
    pub const DISP_E_UNKNOWNNAME: Self = Self(0x8002_0006_u32 as i32);
    pub const TYPE_E_ELEMENTNOTFOUND: Self = Self(0x8002_802B_u32 as i32);
    pub const TYPE_E_CANTLOADLIBRARY: Self = Self(0x8002_9C4A_u32 as i32);
    /// `HRESULT_FROM_WIN32(ERROR_MOD_NOT_FOUND)`.
    pub const MOD_NOT_FOUND: Self = Self::from_win32(126);

    /// Equivalent of the `HRESULT_FROM_WIN32` macro.
    pub const fn from_win32(code: u32) -> Self {
        if code as i32 <= 0 {
            Self(code as i32)
        } else {
            Self(((code & 0x0000_FFFF) | (7 << 16) | 0x8000_0000) as i32)
        }
    }

    pub const fn is_failure(self) -> bool {
        self.0 < 0
    }

    #[allow(clippy::cast_sign_loss)]
    pub const fn as_u32(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for HResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.as_u32())
    }
}

/// Centralized error enum for the dispatch adapter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The process image path query failed or its result was truncated.
    #[error("Executable path query failed: {0}")]
    ExecutablePath(#[source] std::io::Error),

    /// The executable path did not contain a directory separator.
    #[error("Executable path has no directory component: {}", .0.display())]
    ModuleNotFound(PathBuf),

    /// Only type info index 0 exists.
    #[error("Type info index {0} does not exist (only index 0 is available)")]
    IndexOutOfRange(u32),

    /// The type library file could not be loaded.
    #[error("Failed to load type library {}: {code} ({})", .path.display(), hint_or_default(.code))]
    TypeLibraryLoad { path: PathBuf, code: HResult },

    /// The loaded type library does not describe the requested interface.
    #[error("Type library has no description of interface {iid}: {code} ({})", hint_or_default(.code))]
    InterfaceNotFound { iid: InterfaceId, code: HResult },

    /// Text that is not a registry-format interface identifier.
    #[error("Invalid interface identifier: {0:?}")]
    InvalidInterfaceId(String),

    /// A forwarded COM call failed; `code` is what the callee reported.
    #[error("COM error: {code} {message} ({})", hint_or_default(.code))]
    Com { code: HResult, message: String },
}

impl DispatchError {
    /// The status code reported at the COM boundary for this error.
    pub fn hresult(&self) -> HResult {
        match self {
            Self::ExecutablePath(err) => err
                .raw_os_error()
                .and_then(|code| u32::try_from(code).ok())
                .map_or(HResult::E_FAIL, HResult::from_win32),
            Self::ModuleNotFound(_) => HResult::MOD_NOT_FOUND,
            Self::IndexOutOfRange(_) => HResult::TYPE_E_ELEMENTNOTFOUND,
            Self::InvalidInterfaceId(_) => HResult::E_INVALIDARG,
            Self::TypeLibraryLoad { code, .. }
            | Self::InterfaceNotFound { code, .. }
            | Self::Com { code, .. } => *code,
        }
    }
}

#[cfg(windows)]
impl From<windows::core::Error> for DispatchError {
    fn from(err: windows::core::Error) -> Self {
        Self::Com {
            code: HResult(err.code().0),
            message: err.message(),
        }
    }
}

#[cfg(windows)]
impl From<DispatchError> for windows::core::Error {
    fn from(err: DispatchError) -> Self {
        Self::from_hresult(windows::core::HRESULT(err.hresult().0))
    }
}

fn hint_or_default(code: &HResult) -> &'static str {
    friendly_hresult_hint(*code).unwrap_or("No hint available")
}

/// Helper to format an [`HResult`] with its friendly hint.
pub fn format_hresult(code: HResult) -> String {
    match friendly_hresult_hint(code) {
        Some(hint) => format!("{code}: {hint}"),
        None => code.to_string(),
    }
}

/// Maps status codes seen around type libraries and late-bound calls to
/// actionable hints.
pub fn friendly_hresult_hint(code: HResult) -> Option<&'static str> {
    match code.as_u32() {
        0x8002_802B => Some("Element not found in the type library (TYPE_E_ELEMENTNOTFOUND)"),
        0x8002_9C4A => Some("Type library file is missing or corrupt (TYPE_E_CANTLOADLIBRARY)"),
        0x8002_0006 => Some("Member name is not declared by the interface (DISP_E_UNKNOWNNAME)"),
        0x8002_0003 => Some("Member ID is not declared by the interface (DISP_E_MEMBERNOTFOUND)"),
        0x8002_0004 => Some("A required argument was not supplied (DISP_E_PARAMNOTFOUND)"),
        0x8002_0005 => Some("Argument has the wrong type (DISP_E_TYPEMISMATCH)"),
        0x8002_000E => Some("Wrong number of arguments (DISP_E_BADPARAMCOUNT)"),
        0x8002_0009 => Some("The invoked member raised an exception (DISP_E_EXCEPTION)"),
        0x8007_007E => Some("Executable directory could not be determined (ERROR_MOD_NOT_FOUND)"),
        0x8007_0002 | 0x8007_0003 => Some("Type library file not found next to the executable"),
        0x8007_0057 => Some("Invalid argument (E_INVALIDARG)"),
        _ => None,
    }
}

/// Maps a [`DispatchError`] to a friendly hint when its code is known.
pub fn friendly_dispatch_hint(error: &DispatchError) -> Option<&'static str> {
    friendly_hresult_hint(error.hresult())
}
