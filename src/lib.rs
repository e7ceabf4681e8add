//! S-63 exchange set signature checker.
//!
//! Verifies that every chart cell and support file in an ENC exchange set
//! is traceable to the scheme administrator through the S-63 data
//! protection signature chain. Exchange sets may arrive as a directory
//! tree, a ZIP archive, or an ISO disc image; cells are checked against
//! their per-cell signature records and other files against the XML
//! signature manifest, and every container entry must be accounted for by
//! one of the two schemes.

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

use std::path::Path;

pub use adapters::{open_source, FolderSource, IsoSource, Source, ZipSource};
pub use domain::anchor::{load_pub_file, RootTrustAnchor};
pub use domain::crypto::{DsaPublicKey, DsaSignature};
pub use domain::outcome::{CheckReport, VerificationOutcome};
pub use infra::error::{CheckError, CheckResult};
pub use infra::report::{OutputDetail, Reporter};
pub use pipelines::check::CheckWorkflow;
pub use services::checker::MANIFEST_PATH;

/// Check the exchange set at `path` against `anchor`.
///
/// `path` may name a folder, a `.iso` image or a `.zip` archive. Fatal
/// conditions (expired anchor, unreadable container, not an exchange set)
/// surface as errors; per-file verdicts are collected in the returned
/// report.
pub fn check_exchange_set(path: &Path, anchor: &RootTrustAnchor) -> CheckResult<CheckReport> {
    log::info!("checking exchange set at {}", path.display());

    let report = CheckWorkflow::new(anchor.clone()).run(path)?;

    log::info!(
        "checked {} files, {} failures",
        report.outcomes().len(),
        report.failures().count()
    );
    Ok(report)
}
