use std::fmt;
use std::path::PathBuf;

use tlb_dispatch::{
    DispId, DispatchError, DispatchResult, InterfaceId, LazyTypeLibrary, TypeDescription,
    TypeInfoOf, TypeLibraryLoader, format_hresult,
};

/// Outcome of resolving one member name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberOutcome {
    Resolved(DispId),
    /// Display text of the error, with its hint when one is known.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberLine {
    pub name: String,
    pub outcome: MemberOutcome,
}

/// What `tlb-probe` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub path: PathBuf,
    pub interface: InterfaceId,
    pub members: Vec<MemberLine>,
}

impl ProbeReport {
    pub fn all_resolved(&self) -> bool {
        self.members
            .iter()
            .all(|line| matches!(line.outcome, MemberOutcome::Resolved(_)))
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type library: {}", self.path.display())?;
        writeln!(f, "interface:    {}", self.interface)?;
        for line in &self.members {
            match &line.outcome {
                MemberOutcome::Resolved(id) => writeln!(f, "{} = {id}", line.name)?,
                MemberOutcome::Failed(reason) => writeln!(f, "{}: {reason}", line.name)?,
            }
        }
        Ok(())
    }
}

/// Loads the library through `library` and resolves `names` on `interface`.
///
/// Library and interface failures abort the probe; a name that does not
/// resolve is recorded in the report.
pub fn probe<L>(
    library: &LazyTypeLibrary<L>,
    interface: InterfaceId,
    names: &[String],
) -> DispatchResult<ProbeReport>
where
    L: TypeLibraryLoader,
    TypeInfoOf<L>: TypeDescription,
{
    let path = library.source().resolve()?;
    let info = library.type_info(0, interface)?;

    let members = names
        .iter()
        .map(|name| {
            let outcome = match info.member_ids(&[name.as_str()]) {
                Ok(ids) => ids.first().copied().map_or_else(
                    || MemberOutcome::Failed("no dispatch ID returned".into()),
                    MemberOutcome::Resolved,
                ),
                Err(err) => MemberOutcome::Failed(describe(&err)),
            };
            tracing::debug!(name = %name, ?outcome, "Member resolved");
            MemberLine {
                name: name.clone(),
                outcome,
            }
        })
        .collect();

    Ok(ProbeReport {
        path,
        interface,
        members,
    })
}

fn describe(err: &DispatchError) -> String {
    match err {
        DispatchError::Com { message, .. } if !message.is_empty() => {
            format!("{} {message}", format_hresult(err.hresult()))
        }
        _ => format_hresult(err.hresult()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlb_dispatch::testing::TextTypeLibraryLoader;
    use tlb_dispatch::{HResult, TypeLibrarySource};

    const IID_HOST: InterfaceId =
        InterfaceId::from_u128(0x5e2c_41a0_8c1b_4d7e_9f00_6a3b_2c1d_0e9f);

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_probe_reports_each_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.tlb");
        std::fs::write(
            &path,
            format!("[{IID_HOST}]\nReset = 1\nGetState = 0x60020000\n"),
        )
        .unwrap();
        let library = LazyTypeLibrary::new(
            TextTypeLibraryLoader::default(),
            TypeLibrarySource::Path(path.clone()),
        );

        let report =
            probe(&library, IID_HOST, &names(&["Reset", "Explode", "getstate"])).unwrap();

        assert_eq!(report.path, path);
        assert_eq!(report.members[0].outcome, MemberOutcome::Resolved(DispId(1)));
        assert_eq!(
            report.members[1].outcome,
            MemberOutcome::Failed(
                "0x80020006: Member name is not declared by the interface (DISP_E_UNKNOWNNAME) Unknown name."
                    .into()
            )
        );
        assert_eq!(
            report.members[2].outcome,
            MemberOutcome::Resolved(DispId(0x6002_0000))
        );
        assert!(!report.all_resolved());

        let text = report.to_string();
        assert!(text.contains("Reset = 0x00000001"));
        assert!(text.contains("interface:    {5E2C41A0-8C1B-4D7E-9F00-6A3B2C1D0E9F}"));
    }

    #[test]
    fn test_probe_fails_on_unknown_interface() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.tlb");
        std::fs::write(&path, "[{00020400-0000-0000-C000-000000000046}]\nInvoke = 3\n").unwrap();
        let library = LazyTypeLibrary::new(
            TextTypeLibraryLoader::default(),
            TypeLibrarySource::Path(path),
        );

        let err = probe(&library, IID_HOST, &names(&["Reset"])).unwrap_err();
        assert_eq!(err.hresult(), HResult::TYPE_E_ELEMENTNOTFOUND);
        assert!(library.is_loaded());
    }

    #[test]
    fn test_probe_propagates_load_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.tlb");
        let library = LazyTypeLibrary::new(
            TextTypeLibraryLoader::default(),
            TypeLibrarySource::Path(path.clone()),
        );

        let err = probe(&library, IID_HOST, &names(&["Reset"])).unwrap_err();
        assert!(matches!(err, DispatchError::TypeLibraryLoad { path: ref p, .. } if *p == path));
        assert!(!library.is_loaded());
    }

    #[test]
    fn test_empty_name_list_is_all_resolved() {
        let report = ProbeReport {
            path: PathBuf::from("sic1.tlb"),
            interface: IID_HOST,
            members: Vec::new(),
        };
        assert!(report.all_resolved());
    }
}
