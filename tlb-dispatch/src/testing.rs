//! Plain-text stand-in for a type library, for tests on any platform.
//!
//! ```text
//! # comment
//! [{5E2C41A0-8C1B-4D7E-9F00-6A3B2C1D0E9F}]
//! Reset = 1
//! GetState = 0x60020000
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::{DispatchError, DispatchResult, HResult};
use crate::type_library::{TypeDescription, TypeLibrary, TypeLibraryLoader};
use crate::typedefs::{DispId, InterfaceId};

/// Reads the text format above and counts how often it was asked to.
#[derive(Debug, Default)]
pub struct TextTypeLibraryLoader {
    loads: AtomicUsize,
}

impl TextTypeLibraryLoader {
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl TypeLibraryLoader for TextTypeLibraryLoader {
    type Library = TextTypeLibrary;

    fn load(&self, path: &Path) -> DispatchResult<TextTypeLibrary> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(path).map_err(|err| DispatchError::TypeLibraryLoad {
            path: path.to_path_buf(),
            code: err
                .raw_os_error()
                .and_then(|code| u32::try_from(code).ok())
                .map_or(HResult::TYPE_E_CANTLOADLIBRARY, HResult::from_win32),
        })?;
        TextTypeLibrary::parse(&text).ok_or_else(|| DispatchError::TypeLibraryLoad {
            path: path.to_path_buf(),
            code: HResult::TYPE_E_CANTLOADLIBRARY,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextTypeLibrary {
    interfaces: HashMap<InterfaceId, TextTypeInfo>,
}

impl TextTypeLibrary {
    /// `None` on any malformed line.
    pub fn parse(text: &str) -> Option<Self> {
        let mut interfaces = HashMap::new();
        let mut current: Option<InterfaceId> = None;

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                let iid: InterfaceId = line.strip_prefix('[')?.strip_suffix(']')?.parse().ok()?;
                interfaces.entry(iid).or_insert_with(TextTypeInfo::default);
                current = Some(iid);
                continue;
            }

            let (name, id) = line.split_once('=')?;
            let info = interfaces.get_mut(&current?)?;
            info.members.push((name.trim().to_string(), parse_dispid(id.trim())?));
        }

        Some(Self { interfaces })
    }
}

#[allow(clippy::cast_possible_wrap)]
fn parse_dispid(text: &str) -> Option<DispId> {
    match text.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok().map(|v| DispId(v as i32)),
        None => text.parse().ok().map(DispId),
    }
}

impl TypeLibrary for TextTypeLibrary {
    type TypeInfo = TextTypeInfo;

    fn type_info_of(&self, iid: InterfaceId) -> DispatchResult<TextTypeInfo> {
        self.interfaces
            .get(&iid)
            .cloned()
            .ok_or(DispatchError::InterfaceNotFound {
                iid,
                code: HResult::TYPE_E_ELEMENTNOTFOUND,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTypeInfo {
    members: Vec<(String, DispId)>,
}

impl TypeDescription for TextTypeInfo {
    // Names match case-insensitively, as automation clients expect.
    fn member_ids(&self, names: &[&str]) -> DispatchResult<Vec<DispId>> {
        names
            .iter()
            .map(|name| {
                self.members
                    .iter()
                    .find(|(member, _)| member.eq_ignore_ascii_case(name))
                    .map(|(_, id)| *id)
                    .ok_or_else(|| DispatchError::Com {
                        code: HResult::DISP_E_UNKNOWNNAME,
                        message: "Unknown name.".into(),
                    })
            })
            .collect()
    }
}
