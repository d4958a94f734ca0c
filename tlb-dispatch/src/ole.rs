//! OLE Automation implementations of the type library traits.

use std::path::Path;

use windows::Win32::System::Com::{ITypeInfo, ITypeLib};
use windows::Win32::System::Ole::LoadTypeLib;
use windows_core::{GUID, HSTRING, PCWSTR};

use crate::errors::{DispatchError, DispatchResult, HResult};
use crate::type_library::{TypeDescription, TypeLibrary, TypeLibraryLoader};
use crate::typedefs::{DispId, InterfaceId};

/// Loads `.tlb` files (or type library resources) through `LoadTypeLib`.
///
/// A bare file name is searched for by OLE, which is how the system
/// `stdole2.tlb` can be opened without a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OleTypeLibLoader;

impl TypeLibraryLoader for OleTypeLibLoader {
    type Library = ITypeLib;

    fn load(&self, path: &Path) -> DispatchResult<ITypeLib> {
        let file = HSTRING::from(path);
        // SAFETY: `file` is a null-terminated wide string that outlives the call.
        unsafe { LoadTypeLib(&file) }.map_err(|err| DispatchError::TypeLibraryLoad {
            path: path.to_path_buf(),
            code: HResult(err.code().0),
        })
    }
}

impl TypeLibrary for ITypeLib {
    type TypeInfo = ITypeInfo;

    fn type_info_of(&self, iid: InterfaceId) -> DispatchResult<ITypeInfo> {
        let guid = GUID::from(iid);
        // SAFETY: `guid` is a valid GUID for the duration of the call.
        unsafe { self.GetTypeInfoOfGuid(&guid) }.map_err(|err| {
            DispatchError::InterfaceNotFound {
                iid,
                code: HResult(err.code().0),
            }
        })
    }
}

impl TypeDescription for ITypeInfo {
    // One call per name: extra names in a single call are parameter names
    // of the first.
    fn member_ids(&self, names: &[&str]) -> DispatchResult<Vec<DispId>> {
        names
            .iter()
            .map(|name| -> DispatchResult<DispId> {
                let wide = HSTRING::from(*name);
                let pointer = PCWSTR(wide.as_ptr());
                let mut id = DispId::UNKNOWN.0;
                // SAFETY: One valid string kept alive by `wide` and room for
                // one id.
                unsafe { self.GetIDsOfNames(&pointer, 1, &mut id) }?;
                Ok(DispId(id))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::com_guard::{Apartment, ComGuard};
    use windows::Win32::System::Com::IDispatch;
    use windows_core::Interface;

    fn stdole() -> ITypeLib {
        OleTypeLibLoader.load(Path::new("stdole2.tlb")).unwrap()
    }

    #[test]
    fn test_load_system_library_and_find_idispatch() {
        let _guard = ComGuard::new(Apartment::MultiThreaded).unwrap();
        let info = stdole().type_info_of(IDispatch::IID.into()).unwrap();
        let ids = info.member_ids(&["GetTypeInfoCount"]).unwrap();
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], DispId::UNKNOWN);
    }

    #[test]
    fn test_missing_file_reports_load_error() {
        let _guard = ComGuard::new(Apartment::MultiThreaded).unwrap();
        let dir = std::env::temp_dir().join("tlb-dispatch-missing");
        let path = dir.join("absent.tlb");
        let err = OleTypeLibLoader.load(&path).unwrap_err();
        assert!(matches!(err, DispatchError::TypeLibraryLoad { path: ref p, .. } if *p == path));
        assert!(err.hresult().is_failure());
    }

    #[test]
    fn test_unknown_interface_reports_element_not_found() {
        let _guard = ComGuard::new(Apartment::MultiThreaded).unwrap();
        let iid = InterfaceId::from_u128(0x5e2c_41a0_8c1b_4d7e_9f00_6a3b_2c1d_0e9f);
        let err = stdole().type_info_of(iid).unwrap_err();
        assert_eq!(err.hresult(), HResult::TYPE_E_ELEMENTNOTFOUND);
    }

    #[test]
    fn test_unknown_name_reports_disp_e_unknownname() {
        let _guard = ComGuard::new(Apartment::MultiThreaded).unwrap();
        let info = stdole().type_info_of(IDispatch::IID.into()).unwrap();
        let err = info.member_ids(&["NoSuchMember"]).unwrap_err();
        assert_eq!(err.hresult(), HResult::DISP_E_UNKNOWNNAME);
    }
}
