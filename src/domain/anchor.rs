//! The root trust anchor: the scheme administrator's public key.
//!
//! Every chain check ends at this key. It is injected into the checker as
//! an explicit value so tests can substitute synthetic keys; the loader
//! reads the published `IHO.PUB` file, which uses the same four labelled
//! hex blocks as the certificate half of a signature record.

use std::path::Path;

use chrono::NaiveDate;

use crate::domain::crypto::DsaPublicKey;
use crate::domain::sigrecord::{decode_hex_run, read_heading_value_pairs, CERT_HEADINGS};
use crate::infra::error::{CheckError, CheckResult};

/// The scheme administrator's public key plus its validity window.
#[derive(Debug, Clone)]
pub struct RootTrustAnchor {
    key: DsaPublicKey,
    not_before: NaiveDate,
    not_after: NaiveDate,
}

impl RootTrustAnchor {
    #[must_use]
    pub fn new(key: DsaPublicKey, not_before: NaiveDate, not_after: NaiveDate) -> Self {
        Self {
            key,
            not_before,
            not_after,
        }
    }

    /// Refuse to run outside the validity window.
    ///
    /// The window bounds are exclusive: `today` must lie strictly inside.
    /// An out-of-date anchor is a fatal condition, not a per-file failure.
    pub fn ensure_current(&self, today: NaiveDate) -> CheckResult<()> {
        if today <= self.not_before || today >= self.not_after {
            return Err(CheckError::TrustAnchor(format!(
                "SA certificate not valid on {today} (valid after {} and before {})",
                self.not_before, self.not_after
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn key(&self) -> &DsaPublicKey {
        &self.key
    }
}

/// Load the SA public key from a `.PUB` file.
///
/// The format is four heading+value pairs, `// BIG p` through `// BIG y`,
/// with hex byte-group values.
pub fn load_pub_file(path: &Path) -> CheckResult<DsaPublicKey> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CheckError::TrustAnchor(format!("cannot read {}: {e}", path.display())))?;
    parse_pub_text(&text)
}

fn parse_pub_text(text: &str) -> CheckResult<DsaPublicKey> {
    let pairs = read_heading_value_pairs(text, &CERT_HEADINGS)?;
    let values: Vec<Vec<u8>> = pairs
        .iter()
        .map(|(_, value)| decode_hex_run(value))
        .collect::<CheckResult<_>>()?;
    DsaPublicKey::from_raw(&values[0], &values[1], &values[2], &values[3])
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUB: &str = "// BIG p\n\
        FCA6 82CE 8E12 CABA 26EF CCF7 110E 526D B078 B05E DECB CD1E B4A2 08F3 AE16 17AE 01F3 5B91 A47E 6DF6 3413 C5E1 2ED0 899B CD13 2ACD 50D9 9151 BDC4 3EE7 3759 2E17.\n\
        // BIG q\n\
        962E DDCC 369C BA8E BB26 0EE6 B6A1 26D9 346E 38C5.\n\
        // BIG g\n\
        6784 71B2 7A9C F44E E91A 49C5 147D B1A9 AAF2 44F0 5A43 4D64 8693 1D2D 1427 1B9E 3503 0B71 FD73 DA17 9069 B32E 2935 630E 1C20 6235 4D0D A20A 6C41 6E50 BE79 4CA4.\n\
        // BIG y\n\
        4645 6F86 5627 2ECE 4121 5354 D4EA AD75 1C62 71AA E80D 92DF EBB2 3212 3AAF 07AE E04E D252 58FF 3BCE 15E1 CDAA C7FC 7623 E9A6 5058 678C 8BB7 0419 265A 08D5 4786.\n";

    fn anchor() -> RootTrustAnchor {
        RootTrustAnchor::new(
            parse_pub_text(PUB).expect("pub text parses"),
            NaiveDate::from_ymd_opt(2013, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2033, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_parses_pub_file_format() {
        let key = parse_pub_text(PUB).expect("pub text parses");
        assert_eq!(key.p().bits(), 512);
        assert_eq!(key.q().bits(), 160);
    }

    #[test]
    fn test_window_is_strict() {
        let anchor = anchor();
        let inside = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        assert!(anchor.ensure_current(inside).is_ok());

        // the bounds themselves are outside
        assert!(anchor
            .ensure_current(NaiveDate::from_ymd_opt(2013, 1, 1).unwrap())
            .is_err());
        assert!(anchor
            .ensure_current(NaiveDate::from_ymd_opt(2033, 1, 1).unwrap())
            .is_err());

        assert!(anchor
            .ensure_current(NaiveDate::from_ymd_opt(2035, 3, 2).unwrap())
            .is_err());
        assert!(anchor
            .ensure_current(NaiveDate::from_ymd_opt(2001, 3, 2).unwrap())
            .is_err());
    }

    #[test]
    fn test_rejects_truncated_pub_file() {
        let truncated: String = PUB.lines().take(5).collect::<Vec<_>>().join("\n");
        assert!(parse_pub_text(&truncated).is_err());
    }
}
