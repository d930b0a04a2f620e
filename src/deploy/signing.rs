//! Code signing for simulator deployment.
//!
//! Embedded frameworks are signed before the main bundle: signing the
//! container first would be invalidated by re-signing its contents.

use super::{
    error::{Error, Result},
    fs,
    process::{CODESIGN, CommandRunner, Invocation, SECURITY},
    resolver::ResolvedBundle,
};
use std::{fmt, path::PathBuf};

/// Code signing identity from the login keychain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningIdentity {
    /// Display name, e.g. `Apple Development: Jane Doe (ABCDEF1234)`
    pub name: String,
    /// SHA-1 fingerprint passed to `codesign -s`
    pub id: String,
}

impl SigningIdentity {
    /// True if `query` is this identity's fingerprint or exact display name.
    pub fn matches(&self, query: &str) -> bool {
        self.id.eq_ignore_ascii_case(query) || self.name == query
    }
}

impl fmt::Display for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Result of looking up `--identity` among the keychain identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMatch {
    Found(SigningIdentity),
    NotFound,
    /// Several distinct certificates share the requested display name
    Ambiguous(Vec<SigningIdentity>),
}

/// Finds the identity whose fingerprint or display name is `query`.
///
/// Entries repeated with the same fingerprint (one certificate listed from
/// several keychains) count once.
pub fn find_identity(identities: &[SigningIdentity], query: &str) -> IdentityMatch {
    let mut matches: Vec<SigningIdentity> = Vec::new();
    for identity in identities.iter().filter(|identity| identity.matches(query)) {
        if !matches.iter().any(|m| m.id.eq_ignore_ascii_case(&identity.id)) {
            matches.push(identity.clone());
        }
    }

    match matches.len() {
        0 => IdentityMatch::NotFound,
        1 => IdentityMatch::Found(matches.remove(0)),
        _ => IdentityMatch::Ambiguous(matches),
    }
}

/// What [`sign_bundle`] signed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningReport {
    pub frameworks: Vec<PathBuf>,
    pub bundle: PathBuf,
}

/// Lists valid code signing identities via `security find-identity`.
pub async fn list_identities<R: CommandRunner>(runner: &R) -> Result<Vec<SigningIdentity>> {
    let invocation = Invocation::new(SECURITY).args(["find-identity", "-v", "-p", "codesigning"]);
    let output = runner.run(&invocation).await?.check(&invocation)?;
    Ok(parse_identities(&output.stdout_str()))
}

/// Parses `security find-identity -v` output.
///
/// ```text
///   1) 51ADE4986E0033A5DB1C794E0D1473D74FD6F871 "Apple Development: Jane Doe (ABCDEF1234)"
///      1 valid identities found
/// ```
pub fn parse_identities(output: &str) -> Vec<SigningIdentity> {
    output.lines().filter_map(parse_identity_line).collect()
}

fn parse_identity_line(line: &str) -> Option<SigningIdentity> {
    let (index, rest) = line.trim().split_once(')')?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (id, quoted) = rest.trim_start().split_once(char::is_whitespace)?;
    if id.len() != 40 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let quoted = quoted.trim().strip_prefix('"')?;
    let name = &quoted[..quoted.rfind('"')?];

    Some(SigningIdentity {
        name: name.to_string(),
        id: id.to_string(),
    })
}

/// Signs every entry of `Frameworks/`, then the bundle itself.
///
/// Stops at the first failure; nothing already signed is rolled back.
pub async fn sign_bundle<R: CommandRunner>(
    runner: &R,
    bundle: &ResolvedBundle,
    identity: &SigningIdentity,
) -> Result<SigningReport> {
    let frameworks = sign_frameworks(runner, bundle, identity).await?;
    sign_main_bundle(runner, bundle, identity).await?;

    Ok(SigningReport {
        frameworks,
        bundle: bundle.path().to_path_buf(),
    })
}

/// Signs every entry of `Frameworks/` in file-name order. A bundle without
/// `Frameworks/` signs nothing.
pub async fn sign_frameworks<R: CommandRunner>(
    runner: &R,
    bundle: &ResolvedBundle,
    identity: &SigningIdentity,
) -> Result<Vec<PathBuf>> {
    let frameworks_dir = bundle.frameworks_dir();
    if !frameworks_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut signed = Vec::new();
    for framework in fs::sorted_entries(&frameworks_dir).await? {
        log::debug!("Signing framework {}", framework.display());
        codesign(runner, &framework, identity).await?;
        signed.push(framework);
    }
    Ok(signed)
}

/// Signs the bundle directory itself. Call after [`sign_frameworks`].
pub async fn sign_main_bundle<R: CommandRunner>(
    runner: &R,
    bundle: &ResolvedBundle,
    identity: &SigningIdentity,
) -> Result<()> {
    log::debug!("Signing bundle {}", bundle.path().display());
    codesign(runner, bundle.path(), identity).await
}

async fn codesign<R: CommandRunner>(
    runner: &R,
    target: &std::path::Path,
    identity: &SigningIdentity,
) -> Result<()> {
    let invocation = Invocation::new(CODESIGN)
        .args(["-f", "-s", identity.id.as_str()])
        .path_arg(target)?;
    let output = runner.run(&invocation).await?;

    if !output.succeeded() {
        return Err(Error::SigningFailure {
            path: target.to_path_buf(),
            status: output.status,
            stderr: output.stderr_str(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::process::ProcessOutput;
    use crate::deploy::testing::ScriptedRunner;
    use crate::deploy::workspace::ScratchWorkspace;
    use crate::source::PackageReference;

    const JANE: &str = "51ADE4986E0033A5DB1C794E0D1473D74FD6F871";

    fn identity() -> SigningIdentity {
        SigningIdentity {
            name: "Apple Development: Jane Doe (ABCDEF1234)".into(),
            id: JANE.into(),
        }
    }

    async fn staged_bundle(
        temp: &std::path::Path,
        frameworks: &[&str],
    ) -> (ScratchWorkspace, ResolvedBundle) {
        let app = temp.join("Demo.app");
        std::fs::create_dir_all(&app).unwrap();
        for framework in frameworks {
            std::fs::create_dir_all(app.join("Frameworks").join(framework)).unwrap();
        }
        let package = PackageReference::parse(&app).unwrap();
        let workspace = ScratchWorkspace::create(Some(&temp.join("scratch"))).unwrap();
        let bundle = super::super::resolver::resolve_bundle(&ScriptedRunner::new(), &package, &workspace)
            .await
            .unwrap();
        (workspace, bundle)
    }

    #[test]
    fn parses_find_identity_output() {
        let output = format!(
            "  1) {JANE} \"Apple Development: Jane Doe (ABCDEF1234)\"\n  \
             2) 0123456789ABCDEF0123456789ABCDEF01234567 \"Apple Distribution: Example Corp (XYZ987)\"\n     \
             2 valid identities found\n"
        );

        let identities = parse_identities(&output);
        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0], identity());
        assert_eq!(identities[1].name, "Apple Distribution: Example Corp (XYZ987)");
    }

    #[test]
    fn ignores_summary_and_malformed_lines() {
        let output = "\n     0 valid identities found\n  1) not-a-hash \"Broken\"\nPolicy: Code Signing\n";
        assert!(parse_identities(output).is_empty());
    }

    #[test]
    fn keeps_name_before_trailing_status() {
        let output = "  1) 0123456789ABCDEF0123456789ABCDEF01234567 \"Apple Development: Old Cert (Q1)\" (CSSMERR_TP_CERT_REVOKED)\n";

        let identities = parse_identities(output);
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].name, "Apple Development: Old Cert (Q1)");
    }

    #[test]
    fn matches_by_id_or_name() {
        let identity = identity();
        assert!(identity.matches(&JANE.to_lowercase()));
        assert!(identity.matches("Apple Development: Jane Doe (ABCDEF1234)"));
        assert!(!identity.matches("Apple Development"));
    }

    #[test]
    fn renewed_certificate_names_are_ambiguous() {
        let renewed = SigningIdentity {
            name: identity().name,
            id: "0123456789ABCDEF0123456789ABCDEF01234567".into(),
        };
        let identities = [identity(), renewed.clone()];

        match find_identity(&identities, "Apple Development: Jane Doe (ABCDEF1234)") {
            IdentityMatch::Ambiguous(found) => assert_eq!(found, identities),
            other => panic!("unexpected match: {other:?}"),
        }
        assert_eq!(
            find_identity(&identities, &renewed.id.to_lowercase()),
            IdentityMatch::Found(renewed)
        );
        assert_eq!(find_identity(&identities, "Jane"), IdentityMatch::NotFound);
    }

    #[test]
    fn same_certificate_listed_twice_is_one_match() {
        let identities = [identity(), identity()];

        assert_eq!(
            find_identity(&identities, "Apple Development: Jane Doe (ABCDEF1234)"),
            IdentityMatch::Found(identity())
        );
    }

    #[tokio::test]
    async fn frameworks_and_bundle_sign_separately() {
        let temp = tempfile::tempdir().unwrap();
        let (_workspace, bundle) = staged_bundle(temp.path(), &["A.framework"]).await;
        let runner = ScriptedRunner::new();

        let frameworks = sign_frameworks(&runner, &bundle, &identity()).await.unwrap();
        assert_eq!(frameworks, [bundle.frameworks_dir().join("A.framework")]);
        assert_eq!(runner.calls_to(CODESIGN, &[]).len(), 1);

        sign_main_bundle(&runner, &bundle, &identity()).await.unwrap();
        let calls = runner.calls_to(CODESIGN, &[]);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].args[3], bundle.path().to_str().unwrap());
    }

    #[tokio::test]
    async fn signs_frameworks_before_bundle() {
        let temp = tempfile::tempdir().unwrap();
        let (_workspace, bundle) =
            staged_bundle(temp.path(), &["B.framework", "A.framework", "libswiftCore.dylib"]).await;
        let runner = ScriptedRunner::new();

        let report = sign_bundle(&runner, &bundle, &identity()).await.unwrap();

        let calls = runner.calls_to(CODESIGN, &[]);
        assert_eq!(calls.len(), 4);
        let targets: Vec<PathBuf> = calls.iter().map(|c| PathBuf::from(&c.args[3])).collect();
        assert_eq!(
            targets,
            [
                bundle.frameworks_dir().join("A.framework"),
                bundle.frameworks_dir().join("B.framework"),
                bundle.frameworks_dir().join("libswiftCore.dylib"),
                bundle.path().to_path_buf(),
            ]
        );
        assert!(calls.iter().all(|c| c.args[..3] == ["-f", "-s", JANE]));
        assert_eq!(report.frameworks.len(), 3);
        assert_eq!(report.bundle, bundle.path());
    }

    #[tokio::test]
    async fn signs_only_bundle_without_frameworks() {
        let temp = tempfile::tempdir().unwrap();
        let (_workspace, bundle) = staged_bundle(temp.path(), &[]).await;
        let runner = ScriptedRunner::new();

        let report = sign_bundle(&runner, &bundle, &identity()).await.unwrap();

        assert!(report.frameworks.is_empty());
        assert_eq!(runner.calls_to(CODESIGN, &[]).len(), 1);
    }

    #[tokio::test]
    async fn framework_failure_stops_signing() {
        let temp = tempfile::tempdir().unwrap();
        let (_workspace, bundle) = staged_bundle(temp.path(), &["A.framework", "B.framework"]).await;
        let runner = ScriptedRunner::new().on(CODESIGN, &[], |invocation| {
            if invocation.args[3].ends_with("A.framework") {
                Ok(ProcessOutput::failure(1, "errSecInternalComponent\n"))
            } else {
                Ok(ProcessOutput::success(""))
            }
        });

        let err = sign_bundle(&runner, &bundle, &identity()).await.unwrap_err();

        match err {
            Error::SigningFailure { path, status, stderr } => {
                assert!(path.ends_with("Frameworks/A.framework"));
                assert_eq!(status, 1);
                assert_eq!(stderr, "errSecInternalComponent");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(runner.calls_to(CODESIGN, &[]).len(), 1);
    }

    #[tokio::test]
    async fn lists_identities_through_security() {
        let runner = ScriptedRunner::new().respond(
            SECURITY,
            &["find-identity"],
            ProcessOutput::success(format!(
                "  1) {JANE} \"Apple Development: Jane Doe (ABCDEF1234)\"\n     1 valid identities found\n"
            )),
        );

        let identities = list_identities(&runner).await.unwrap();
        assert_eq!(identities, [identity()]);
        assert_eq!(
            runner.calls()[0].args,
            ["find-identity", "-v", "-p", "codesigning"]
        );
    }
}
