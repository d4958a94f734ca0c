//! Paths relative to the running executable.
//!
//! Type libraries ship beside the host binary, so they are located from the
//! process image path and never from the working directory.

use std::path::{Path, PathBuf};

use crate::errors::{DispatchError, DispatchResult};

/// Returns the directory that contains the running executable.
///
/// # Errors
///
/// [`DispatchError::ExecutablePath`] when the image path query fails or is
/// truncated, [`DispatchError::ModuleNotFound`] when the reported path has
/// no directory component.
pub fn executable_directory() -> DispatchResult<PathBuf> {
    let executable = current_executable_path()?;
    directory_of(&executable).map(Path::to_path_buf)
}

/// Joins `relative` onto the executable directory.
///
/// # Examples
///
/// ```
/// let path = tlb_dispatch::path_relative_to_executable("sic1.tlb").unwrap();
/// assert!(path.ends_with("sic1.tlb"));
/// ```
pub fn path_relative_to_executable(relative: impl AsRef<Path>) -> DispatchResult<PathBuf> {
    Ok(executable_directory()?.join(relative))
}

fn directory_of(path: &Path) -> DispatchResult<&Path> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
        _ => Err(DispatchError::ModuleNotFound(path.to_path_buf())),
    }
}

#[cfg(windows)]
fn current_executable_path() -> DispatchResult<PathBuf> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows::Win32::Foundation::MAX_PATH;
    use windows::Win32::System::LibraryLoader::GetModuleFileNameW;

    let mut buffer = [0u16; MAX_PATH as usize];
    // SAFETY: `GetModuleFileNameW` writes at most `buffer.len()` UTF-16 units
    // into the slice it is given. `None` selects the current process image.
    let written = unsafe { GetModuleFileNameW(None, &mut buffer) } as usize;

    // A full buffer means the path was truncated.
    if written == 0 || written == buffer.len() {
        let err = std::io::Error::last_os_error();
        tracing::error!(error = %err, "GetModuleFileNameW failed");
        return Err(DispatchError::ExecutablePath(err));
    }

    Ok(PathBuf::from(OsString::from_wide(&buffer[..written])))
}

#[cfg(not(windows))]
fn current_executable_path() -> DispatchResult<PathBuf> {
    std::env::current_exe().map_err(|err| {
        tracing::error!(error = %err, "current_exe failed");
        DispatchError::ExecutablePath(err)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_of_strips_file_name() {
        let dir = directory_of(Path::new("/opt/host/bin/app")).unwrap();
        assert_eq!(dir, Path::new("/opt/host/bin"));
    }

    #[cfg(windows)]
    #[test]
    fn test_directory_of_windows_path() {
        let dir = directory_of(Path::new(r"C:\Games\Host\host.exe")).unwrap();
        assert_eq!(dir, Path::new(r"C:\Games\Host"));
    }

    #[test]
    fn test_directory_of_bare_file_name_is_module_not_found() {
        let err = directory_of(Path::new("app.exe")).unwrap_err();
        assert!(matches!(err, DispatchError::ModuleNotFound(ref p) if p == Path::new("app.exe")));
        assert_eq!(err.hresult(), crate::HResult::MOD_NOT_FOUND);
    }

    #[test]
    fn test_executable_directory_matches_current_exe() {
        let expected = std::env::current_exe().unwrap();
        let dir = executable_directory().unwrap();
        assert_eq!(Some(dir.as_path()), expected.parent());
    }

    const EXPECTED_DIRECTORY_VAR: &str = "TLB_DISPATCH_EXPECTED_EXE_DIR";

    // Re-runs itself in a child test process started from a scratch
    // directory, so the working directory of sibling tests never changes.
    #[test]
    fn test_executable_directory_ignores_working_directory() {
        if let Some(expected) = std::env::var_os(EXPECTED_DIRECTORY_VAR) {
            assert_ne!(std::env::current_dir().unwrap(), PathBuf::from(&expected));
            assert_eq!(executable_directory().unwrap(), PathBuf::from(expected));
            return;
        }

        let scratch = tempfile::tempdir().unwrap();
        let output = std::process::Command::new(std::env::current_exe().unwrap())
            .args([
                "--exact",
                "exe_path::tests::test_executable_directory_ignores_working_directory",
            ])
            .current_dir(scratch.path())
            .env(EXPECTED_DIRECTORY_VAR, executable_directory().unwrap())
            .output()
            .unwrap();

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success(), "child test failed:\n{stdout}");
        assert!(stdout.contains("1 passed"), "child test did not run:\n{stdout}");
    }

    #[test]
    fn test_path_relative_to_executable_joins_name() {
        let path = path_relative_to_executable("sic1.tlb").unwrap();
        assert_eq!(path.file_name().unwrap(), "sic1.tlb");
        assert_eq!(path.parent().unwrap(), executable_directory().unwrap());
    }
}
