//! Console reporting with selectable detail.
//!
//! The checker library records outcomes; presentation is the caller's
//! concern. `Reporter` carries the chosen detail level and writes plain
//! lines to stdout, so the silent mode produces no output at all.

/// How much to say on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDetail {
    /// Verdict and failing files only
    Basic,
    /// Every file checked, then the verdict
    Verbose,
    /// Nothing; the exit code is the answer
    Silent,
}

impl OutputDetail {
    /// Resolve the detail level from the two CLI flags.
    ///
    /// Silent wins when both are given.
    #[must_use]
    pub fn from_flags(silent: bool, verbose: bool) -> Self {
        if silent {
            OutputDetail::Silent
        } else if verbose {
            OutputDetail::Verbose
        } else {
            OutputDetail::Basic
        }
    }
}

/// Plain line writer honouring the detail level.
pub struct Reporter {
    detail: OutputDetail,
}

impl Reporter {
    #[must_use]
    pub fn new(detail: OutputDetail) -> Self {
        Self { detail }
    }

    #[must_use]
    pub fn detail(&self) -> OutputDetail {
        self.detail
    }

    /// Write a line unless silent.
    pub fn line(&self, line: &str) {
        if self.detail != OutputDetail::Silent {
            println!("{line}");
        }
    }

    /// Write a line only in verbose mode.
    pub fn verbose(&self, line: &str) {
        if self.detail == OutputDetail::Verbose {
            println!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_from_flags() {
        assert_eq!(OutputDetail::from_flags(false, false), OutputDetail::Basic);
        assert_eq!(OutputDetail::from_flags(false, true), OutputDetail::Verbose);
        assert_eq!(OutputDetail::from_flags(true, false), OutputDetail::Silent);
        // silent takes precedence over verbose
        assert_eq!(OutputDetail::from_flags(true, true), OutputDetail::Silent);
    }
}
