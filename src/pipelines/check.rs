//! `CheckWorkflow`: high-level facade for checking an exchange set.
//!
//! Opens the right container source for a path and delegates to the
//! checking service.

use std::path::Path;

use crate::adapters::open_source;
use crate::domain::anchor::RootTrustAnchor;
use crate::domain::outcome::CheckReport;
use crate::infra::error::CheckResult;
use crate::services::checker::Checker;

/// Orchestrates one signature check run over an exchange set.
pub struct CheckWorkflow {
    anchor: RootTrustAnchor,
}

impl CheckWorkflow {
    #[must_use]
    pub fn new(anchor: RootTrustAnchor) -> Self {
        Self { anchor }
    }

    /// Run the check over the folder, `.iso` image or `.zip` archive at
    /// `path`. Container handles are released when the run completes,
    /// whatever the outcome.
    pub fn run(&self, path: &Path) -> CheckResult<CheckReport> {
        let source = open_source(path)?;
        Checker::new(&self.anchor).check(source.as_ref())
    }
}
