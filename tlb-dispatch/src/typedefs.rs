use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::errors::DispatchError;

/// A COM interface identifier.
///
/// Stored in the same 128-bit layout as `GUID::from_u128`, so the value
/// written in registry format reads left to right as the hex digits.
///
/// # Examples
///
/// ```
/// use tlb_dispatch::InterfaceId;
///
/// let iid: InterfaceId = "{00020400-0000-0000-C000-000000000046}".parse().unwrap();
/// assert_eq!(iid, InterfaceId::from_u128(0x00020400_0000_0000_c000_000000000046));
/// assert_eq!(iid.to_string(), "{00020400-0000-0000-C000-000000000046}");
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InterfaceId(Uuid);

impl InterfaceId {
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub const fn to_u128(self) -> u128 {
        self.0.as_u128()
    }
}

impl FromStr for InterfaceId {
    type Err = DispatchError;

    /// Accepts the registry form with or without braces, in either case.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(text.trim())
            .map(Self)
            .map_err(|_| DispatchError::InvalidInterfaceId(text.to_string()))
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0.braced())
    }
}

#[cfg(windows)]
impl From<windows_core::GUID> for InterfaceId {
    fn from(guid: windows_core::GUID) -> Self {
        Self::from_u128(guid.to_u128())
    }
}

#[cfg(windows)]
impl From<InterfaceId> for windows_core::GUID {
    fn from(iid: InterfaceId) -> Self {
        Self::from_u128(iid.to_u128())
    }
}

/// Numeric identifier of an automation member.
///
/// # Examples
///
/// ```
/// use tlb_dispatch::DispId;
/// let id = DispId(0x6001_0000);
/// assert_eq!(id.to_string(), "0x60010000");
/// ```
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DispId(pub i32);

impl DispId {
    /// `DISPID_VALUE`, the default member.
    pub const VALUE: Self = Self(0);
    /// `DISPID_UNKNOWN`.
    pub const UNKNOWN: Self = Self(-1);
}

impl fmt::Display for DispId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "{}", self.0)
        } else {
            write!(f, "0x{:08X}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IID_IDISPATCH: InterfaceId =
        InterfaceId::from_u128(0x00020400_0000_0000_c000_000000000046);

    #[test]
    fn test_parse_without_braces_and_lowercase() {
        let iid: InterfaceId = "00020400-0000-0000-c000-000000000046".parse().unwrap();
        assert_eq!(iid, IID_IDISPATCH);
    }

    #[test]
    fn test_display_is_registry_format() {
        assert_eq!(
            InterfaceId::from_u128(0x12345678_9abc_def0_1122_334455667788).to_string(),
            "{12345678-9ABC-DEF0-1122-334455667788}"
        );
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for text in [
            "",
            "{00020400-0000-0000-C000-000000000046",
            "00020400-0000-0000-C000",
            "00020400-0000-0000-C000-00000000004G",
            "000204000-000-0000-C000-000000000046",
            "+0020400-0000-0000-C000-000000000046",
        ] {
            let err = text.parse::<InterfaceId>().unwrap_err();
            assert!(
                matches!(err, DispatchError::InvalidInterfaceId(ref t) if t == text),
                "unexpected result for {text:?}: {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_trims_whitespace_and_round_trips_through_u128() {
        let iid: InterfaceId = "  {5E2C41A0-8C1B-4D7E-9F00-6A3B2C1D0E9F}\n".parse().unwrap();
        assert_eq!(iid.to_u128(), 0x5e2c_41a0_8c1b_4d7e_9f00_6a3b_2c1d_0e9f);
        assert_eq!(iid.to_string(), "{5E2C41A0-8C1B-4D7E-9F00-6A3B2C1D0E9F}");
    }

    #[test]
    fn test_default_is_nil() {
        assert_eq!(
            InterfaceId::default().to_string(),
            "{00000000-0000-0000-0000-000000000000}"
        );
    }

    #[test]
    fn test_dispid_display() {
        assert_eq!(DispId::VALUE.to_string(), "0x00000000");
        assert_eq!(DispId::UNKNOWN.to_string(), "-1");
    }

    #[cfg(windows)]
    #[test]
    fn test_guid_conversion_matches_windows_layout() {
        use windows::Win32::System::Com::IDispatch;
        use windows_core::Interface;

        assert_eq!(InterfaceId::from(IDispatch::IID), IID_IDISPATCH);
        assert_eq!(windows_core::GUID::from(IID_IDISPATCH), IDispatch::IID);
    }
}
