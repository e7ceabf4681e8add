//! Checking service: walks one exchange set and verifies every chain.
//!
//! Sequences the gates and passes over a container source: the trust
//! anchor window, structural validation, the per-cell legacy signature
//! pass, the manifest pass, and coverage reconciliation. Cryptographic and
//! format decisions stay in the domain layer; this service only resolves
//! paths, drives the two-tier verification, and aggregates outcomes into a
//! `CheckReport`.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::adapters::{read_entry, Source};
use crate::domain::anchor::RootTrustAnchor;
use crate::domain::crypto::DsaPublicKey;
use crate::domain::manifest::{DataServerRecord, FileSignatureRecord, SignatureManifest};
use crate::domain::naming;
use crate::domain::outcome::{CheckReport, VerificationOutcome};
use crate::domain::sanity;
use crate::domain::sigrecord::SignatureRecord;
use crate::infra::error::CheckResult;

/// Fixed manifest location relative to the container root.
pub const MANIFEST_PATH: &str = "INFO/S63_SIGNATURES.XML";

/// File names that are expected to carry no signature.
const UNSIGNED_ALLOW_LIST: [&str; 2] = ["IHO.PUB", "IHO.CRT"];

/// Case-insensitive lookup from any computed path to the canonical entry.
struct EntryIndex {
    entries: HashMap<String, String>,
}

impl EntryIndex {
    fn new(paths: &[String]) -> Self {
        let entries = paths
            .iter()
            .map(|path| (Self::key(path), path.clone()))
            .collect();
        Self { entries }
    }

    fn key(path: &str) -> String {
        path.to_ascii_uppercase()
    }

    /// Resolve a computed path to the entry actually listed, if any.
    fn resolve(&self, path: &str) -> Option<&str> {
        self.entries.get(&Self::key(path)).map(String::as_str)
    }
}

/// Verifies the signature chains of one exchange set against a root
/// trust anchor.
pub struct Checker<'a> {
    anchor: &'a RootTrustAnchor,
}

impl<'a> Checker<'a> {
    #[must_use]
    pub fn new(anchor: &'a RootTrustAnchor) -> Self {
        Self { anchor }
    }

    /// Run the full check over one container.
    ///
    /// Fatal conditions (expired anchor, unreadable container, structural
    /// failure) surface as errors before any per-file verdict exists; all
    /// other failures are recorded per file and the run continues.
    pub fn check(&self, source: &dyn Source) -> CheckResult<CheckReport> {
        self.anchor.ensure_current(Utc::now().date_naive())?;
        self.check_dated(source)
    }

    /// As `check`, with the anchor window already vetted by the caller.
    pub fn check_dated(&self, source: &dyn Source) -> CheckResult<CheckReport> {
        sanity::ensure_exchange_set(source.paths())?;

        let index = EntryIndex::new(source.paths());
        let mut report = CheckReport::default();
        let mut covered: HashSet<String> = HashSet::new();

        self.check_cells(source, &index, &mut covered, &mut report)?;
        self.check_manifest(source, &index, &mut covered, &mut report)?;

        Ok(report)
    }

    /// Legacy pass: every cell file must have a verifiable signature
    /// record at its derived sibling path.
    fn check_cells(
        &self,
        source: &dyn Source,
        index: &EntryIndex,
        covered: &mut HashSet<String>,
        report: &mut CheckReport,
    ) -> CheckResult<()> {
        let cells: Vec<&String> = source
            .paths()
            .iter()
            .filter(|path| naming::is_cell_file(path))
            .collect();
        log::info!("checking {} cell files", cells.len());

        for cell in cells {
            covered.insert(EntryIndex::key(cell));

            let signature_entry = naming::signature_path_for(cell)
                .and_then(|derived| index.resolve(&derived).map(str::to_string));

            let outcome = match signature_entry {
                None => VerificationOutcome::MissingSignature,
                Some(signature_path) => {
                    covered.insert(EntryIndex::key(&signature_path));
                    self.check_cell(source, cell, &signature_path)?
                }
            };

            log::debug!("{cell}: {outcome}");
            report.record(cell.clone(), outcome);
        }
        Ok(())
    }

    /// Two-tier verification of one cell against its signature record.
    fn check_cell(
        &self,
        source: &dyn Source,
        cell_path: &str,
        signature_path: &str,
    ) -> CheckResult<VerificationOutcome> {
        let record = match SignatureRecord::parse(&read_entry(source, signature_path)?) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("{signature_path}: {e}");
                return Ok(VerificationOutcome::BadSignature);
            }
        };

        // Tier 1: the SA endorses the data server certificate text.
        if !self
            .anchor
            .key()
            .verify(&record.certificate_text(), &record.certificate_signature())
        {
            return Ok(VerificationOutcome::UnresolvedSigner);
        }

        // Tier 2: the data server signs the cell bytes.
        let server_key = match record.data_server_key() {
            Ok(key) => key,
            Err(e) => {
                log::warn!("{signature_path}: {e}");
                return Ok(VerificationOutcome::BadSignature);
            }
        };
        let cell_bytes = read_entry(source, cell_path)?;
        if server_key.verify(&cell_bytes, &record.cell_signature()) {
            Ok(VerificationOutcome::Pass)
        } else {
            Ok(VerificationOutcome::BadSignature)
        }
    }

    /// Manifest pass plus coverage reconciliation.
    ///
    /// Without a manifest there is no reference list to reconcile
    /// against, so coverage is skipped with an advisory.
    fn check_manifest(
        &self,
        source: &dyn Source,
        index: &EntryIndex,
        covered: &mut HashSet<String>,
        report: &mut CheckReport,
    ) -> CheckResult<()> {
        let Some(manifest_path) = index.resolve(MANIFEST_PATH).map(str::to_string) else {
            log::info!("no signature manifest at {MANIFEST_PATH}");
            report.advise(format!(
                "no signature manifest ({MANIFEST_PATH}); coverage not checked"
            ));
            return Ok(());
        };

        let manifest = match SignatureManifest::parse(&read_entry(source, &manifest_path)?) {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("{manifest_path}: {e}");
                report.record(manifest_path, VerificationOutcome::BadSignature);
                report.advise("signature manifest unreadable; coverage not checked");
                return Ok(());
            }
        };
        log::info!(
            "manifest lists {} data servers, {} file signatures",
            manifest.data_servers().len(),
            manifest.file_signatures().len()
        );

        // Tier 1 once per data server; a failed endorsement invalidates
        // every file that server signed.
        let servers: HashMap<&str, Option<&DataServerRecord>> = manifest
            .data_servers()
            .iter()
            .map(|server| (server.id(), self.endorse(server).then_some(server)))
            .collect();

        for file_signature in manifest.file_signatures() {
            let target = file_signature.entry_path();
            let resolved = index.resolve(&target).map(str::to_string);
            if let Some(entry) = &resolved {
                covered.insert(EntryIndex::key(entry));
            }

            let outcome = match servers.get(file_signature.data_server_id()) {
                None | Some(None) => VerificationOutcome::UnresolvedSigner,
                Some(Some(server)) => match &resolved {
                    None => {
                        log::warn!("manifest references missing file {target}");
                        VerificationOutcome::BadSignature
                    }
                    Some(entry) => match server.key() {
                        Ok(key) => self.check_manifest_file(source, entry, key, file_signature)?,
                        Err(e) => {
                            log::warn!("{entry}: {e}");
                            VerificationOutcome::BadSignature
                        }
                    },
                },
            };

            let reported = resolved.unwrap_or(target);
            log::debug!("{reported}: {outcome}");
            report.record(reported, outcome);
        }

        self.reconcile_coverage(source, &manifest_path, covered, report);
        Ok(())
    }

    fn endorse(&self, server: &DataServerRecord) -> bool {
        let endorsed = self
            .anchor
            .key()
            .verify(server.certificate_text(), server.certificate_signature());
        if !endorsed {
            log::warn!("data server {} certificate not endorsed by SA", server.id());
        }
        endorsed
    }

    fn check_manifest_file(
        &self,
        source: &dyn Source,
        entry: &str,
        server_key: &DsaPublicKey,
        file_signature: &FileSignatureRecord,
    ) -> CheckResult<VerificationOutcome> {
        let bytes = read_entry(source, entry)?;
        if server_key.verify(&bytes, file_signature.signature()) {
            Ok(VerificationOutcome::Pass)
        } else {
            Ok(VerificationOutcome::BadSignature)
        }
    }

    /// Every entry must be addressed by one of the two schemes or sit on
    /// the allow-list of expected-unsigned artifacts.
    fn reconcile_coverage(
        &self,
        source: &dyn Source,
        manifest_path: &str,
        covered: &HashSet<String>,
        report: &mut CheckReport,
    ) {
        for entry in source.paths() {
            if covered.contains(&EntryIndex::key(entry)) || allow_listed(entry, manifest_path) {
                continue;
            }
            log::debug!("{entry}: uncovered");
            report.record(entry.clone(), VerificationOutcome::Uncovered);
        }
    }
}

fn allow_listed(entry: &str, manifest_path: &str) -> bool {
    if entry.eq_ignore_ascii_case(manifest_path) {
        return true;
    }
    let name = entry.rsplit('/').next().unwrap_or(entry);
    UNSIGNED_ALLOW_LIST
        .iter()
        .any(|allowed| name.eq_ignore_ascii_case(allowed))
}
