//! Parser for the fixed 8-section per-cell signature record.
//!
//! A cell signature file is ASCII text: eight heading lines, each followed
//! by a value line of space-separated 2-hex-digit byte groups with a
//! trailing period. Sections appear in a fixed order; headings are matched
//! case-insensitively. The last four sections (the data server certificate:
//! `p`, `q`, `g`, `y`) are also exposed as the exact text the scheme
//! administrator signed, because the endorsement covers the formatted lines
//! rather than the decoded integers.

use crate::domain::crypto::{DsaPublicKey, DsaSignature};
use crate::infra::error::{CheckError, CheckResult};

/// Heading lines of the four certificate sections, in record order.
pub(crate) const CERT_HEADINGS: [&str; 4] = ["// BIG p", "// BIG q", "// BIG g", "// BIG y"];

const RECORD_HEADINGS: [&str; 8] = [
    "// Signature part R:", // DS signature of the cell, R
    "// Signature part S:", // DS signature of the cell, S
    "// Signature part R:", // SA signature of the DS certificate, R
    "// Signature part S:", // SA signature of the DS certificate, S
    "// BIG p",
    "// BIG q",
    "// BIG g",
    "// BIG y",
];

/// A parsed per-cell signature record.
#[derive(Debug, Clone)]
pub struct SignatureRecord {
    /// The sixteen heading and value lines exactly as read, minus line
    /// terminators.
    content: Vec<String>,
    /// Decoded value byte runs, one per section.
    values: Vec<Vec<u8>>,
}

impl SignatureRecord {
    /// Parse a record from the raw bytes of a signature file.
    pub fn parse(data: &[u8]) -> CheckResult<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| CheckError::Format("signature file is not ASCII text".to_string()))?;

        let pairs = read_heading_value_pairs(text, &RECORD_HEADINGS)?;

        let mut content = Vec::with_capacity(16);
        let mut values = Vec::with_capacity(8);
        for (heading, value) in pairs {
            values.push(decode_hex_run(&value)?);
            content.push(heading);
            content.push(value);
        }

        Ok(Self { content, values })
    }

    /// The data server's signature over the cell contents.
    #[must_use]
    pub fn cell_signature(&self) -> DsaSignature {
        DsaSignature::from_raw(&self.values[0], &self.values[1])
    }

    /// The scheme administrator's endorsement of the data server
    /// certificate.
    #[must_use]
    pub fn certificate_signature(&self) -> DsaSignature {
        DsaSignature::from_raw(&self.values[2], &self.values[3])
    }

    /// The data server public key carried in the certificate sections.
    pub fn data_server_key(&self) -> CheckResult<DsaPublicKey> {
        DsaPublicKey::from_raw(
            &self.values[4],
            &self.values[5],
            &self.values[6],
            &self.values[7],
        )
    }

    /// The exact bytes the SA endorsement covers: the last four
    /// heading+value pairs re-serialized with CRLF terminators, value
    /// lines keeping their trailing period as read.
    #[must_use]
    pub fn certificate_text(&self) -> Vec<u8> {
        let mut text = String::new();
        for line in &self.content[8..16] {
            text.push_str(line);
            text.push_str("\r\n");
        }
        text.into_bytes()
    }
}

/// Read `headings.len()` heading+value line pairs in strict order.
///
/// Each heading must case-insensitively equal the expected string for its
/// position. Trailing lines beyond the last pair are ignored.
pub(crate) fn read_heading_value_pairs(
    text: &str,
    headings: &[&str],
) -> CheckResult<Vec<(String, String)>> {
    let mut lines = text.lines();
    let mut pairs = Vec::with_capacity(headings.len());

    for expected in headings {
        let heading = lines
            .next()
            .ok_or_else(|| CheckError::Format(format!("expected {expected} in signature file")))?;
        if !heading.eq_ignore_ascii_case(expected) {
            return Err(CheckError::Format(format!(
                "expected {expected} in signature file, found {heading}"
            )));
        }

        let value = lines.next().ok_or_else(|| {
            CheckError::Format(format!("missing value line after {expected}"))
        })?;

        // Lines are kept exactly as read (minus terminators): the signed
        // payload is the literal text, so re-serialization must not
        // normalize anything else.
        pairs.push((heading.to_string(), value.to_string()));
    }

    Ok(pairs)
}

/// Decode a run of space-separated hex byte groups, with an optional
/// trailing period, into bytes.
pub(crate) fn decode_hex_run(line: &str) -> CheckResult<Vec<u8>> {
    let sanitised: String = line
        .trim()
        .trim_matches('.')
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    hex::decode(&sanitised)
        .map_err(|e| CheckError::Format(format!("bad hex run in signature file: {e}")))
}
