//! Shared fixtures: a synthetic scheme administrator and data server.
//!
//! Integration tests need real signature chains, so this module carries a
//! complete miniature S-63 signing side: the 512-bit DSA domain parameters
//! from the published sample signature file, fixed private keys, and a
//! deterministic signing nonce. Everything derived from these values is
//! computed at test run time.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use num_bigint::BigUint;
use sha1::{Digest, Sha1};
use tempfile::TempDir;

use s63check::{DsaPublicKey, RootTrustAnchor};

const PARAM_P: &str = "FCA682CE8E12CABA26EFCCF7110E526DB078B05EDECBCD1EB4A208F3AE1617AE01F35B91A47E6DF63413C5E12ED0899BCD132ACD50D99151BDC43EE737592E17";
const PARAM_Q: &str = "962EDDCC369CBA8EBB260EE6B6A126D9346E38C5";
const PARAM_G: &str = "678471B27A9CF44EE91A49C5147DB1A9AAF244F05A434D6486931D2D14271B9E35030B71FD73DA179069B32E2935630E1C2062354D0DA20A6C416E50BE794CA4";

const SA_PRIVATE: &str = "1234567890ABCDEF1234567890ABCDEF12345678";
const DS_PRIVATE: &str = "0FEDCBA987654321FEDCBA987654321FEDCBA98";

/// Fixed signing nonce base; bumped until `r` and `s` are nonzero.
const NONCE: &str = "3CA1B2201BE876660E5597ADCED81260FA48723";

fn big(hex: &str) -> BigUint {
    BigUint::parse_bytes(hex.as_bytes(), 16).expect("fixture hex parses")
}

/// Left-pad a value to a fixed big-endian width.
pub fn fixed_bytes(value: &BigUint, width: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut out = vec![0u8; width.saturating_sub(bytes.len())];
    out.extend_from_slice(&bytes);
    out
}

/// Format bytes the way signature files do: uppercase hex in groups of
/// two bytes.
pub fn hex_groups(bytes: &[u8]) -> String {
    bytes
        .chunks(2)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A miniature signing side: the SA key endorses the DS certificate, the
/// DS key signs artifacts.
pub struct TestSigner {
    p: BigUint,
    q: BigUint,
    g: BigUint,
    sa_x: BigUint,
    sa_y: BigUint,
    ds_x: BigUint,
    ds_y: BigUint,
}

impl Default for TestSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSigner {
    pub fn new() -> Self {
        let p = big(PARAM_P);
        let q = big(PARAM_Q);
        let g = big(PARAM_G);
        let sa_x = big(SA_PRIVATE);
        let sa_y = g.modpow(&sa_x, &p);
        let ds_x = big(DS_PRIVATE);
        let ds_y = g.modpow(&ds_x, &p);
        Self {
            p,
            q,
            g,
            sa_x,
            sa_y,
            ds_x,
            ds_y,
        }
    }

    /// The SA public key as a `RootTrustAnchor` valid around today.
    pub fn anchor(&self) -> RootTrustAnchor {
        RootTrustAnchor::new(
            self.sa_public_key(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        )
    }

    /// The SA public key inside a long-expired window.
    pub fn expired_anchor(&self) -> RootTrustAnchor {
        RootTrustAnchor::new(
            self.sa_public_key(),
            NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2002, 1, 1).unwrap(),
        )
    }

    pub fn sa_public_key(&self) -> DsaPublicKey {
        DsaPublicKey::from_raw(
            &fixed_bytes(&self.p, 64),
            &fixed_bytes(&self.q, 20),
            &fixed_bytes(&self.g, 64),
            &fixed_bytes(&self.sa_y, 64),
        )
        .expect("fixture SA key is valid")
    }

    /// The SA public key in the four-block `.PUB` file format.
    pub fn sa_pub_text(&self) -> String {
        let values = [
            hex_groups(&fixed_bytes(&self.p, 64)),
            hex_groups(&fixed_bytes(&self.q, 20)),
            hex_groups(&fixed_bytes(&self.g, 64)),
            hex_groups(&fixed_bytes(&self.sa_y, 64)),
        ];
        let headings = ["// BIG p", "// BIG q", "// BIG g", "// BIG y"];
        let mut text = String::new();
        for (heading, value) in headings.iter().zip(values) {
            text.push_str(heading);
            text.push_str("\r\n");
            text.push_str(&value);
            text.push_str(".\r\n");
        }
        text
    }

    fn sign_with(&self, x: &BigUint, message: &[u8]) -> (BigUint, BigUint) {
        let z = BigUint::from_bytes_be(&Sha1::digest(message));
        let zero = BigUint::from(0u32);
        let mut k = big(NONCE);
        loop {
            let r = self.g.modpow(&k, &self.p) % &self.q;
            let k_inv = k.modpow(&(&self.q - 2u32), &self.q);
            let s = (k_inv * (&z + x * &r)) % &self.q;
            if r != zero && s != zero {
                return (r, s);
            }
            k += 1u32;
        }
    }

    pub fn sa_sign(&self, message: &[u8]) -> (BigUint, BigUint) {
        self.sign_with(&self.sa_x, message)
    }

    pub fn ds_sign(&self, message: &[u8]) -> (BigUint, BigUint) {
        self.sign_with(&self.ds_x, message)
    }

    /// The DS certificate as formatted hex values: p, q, g, y.
    fn certificate_values(&self) -> [String; 4] {
        [
            hex_groups(&fixed_bytes(&self.p, 64)),
            hex_groups(&fixed_bytes(&self.q, 20)),
            hex_groups(&fixed_bytes(&self.g, 64)),
            hex_groups(&fixed_bytes(&self.ds_y, 64)),
        ]
    }

    /// The exact text block the SA endorses for the DS certificate.
    pub fn certificate_text(&self) -> String {
        let headings = ["// BIG p", "// BIG q", "// BIG g", "// BIG y"];
        let mut text = String::new();
        for (heading, value) in headings.iter().zip(self.certificate_values()) {
            text.push_str(heading);
            text.push_str("\r\n");
            text.push_str(&value);
            text.push_str(".\r\n");
        }
        text
    }

    /// A complete, valid signature record for `cell` contents.
    pub fn signature_record(&self, cell: &[u8]) -> String {
        let (cell_r, cell_s) = self.ds_sign(cell);
        let (cert_r, cert_s) = self.sa_sign(self.certificate_text().as_bytes());
        self.signature_record_from_parts(&cell_r, &cell_s, &cert_r, &cert_s)
    }

    /// A record whose SA endorsement does not verify.
    pub fn signature_record_bad_endorsement(&self, cell: &[u8]) -> String {
        let (cell_r, cell_s) = self.ds_sign(cell);
        let (cert_r, cert_s) = self.sa_sign(self.certificate_text().as_bytes());
        let tampered = (cert_r + 1u32) % &self.q;
        self.signature_record_from_parts(&cell_r, &cell_s, &tampered, &cert_s)
    }

    fn signature_record_from_parts(
        &self,
        cell_r: &BigUint,
        cell_s: &BigUint,
        cert_r: &BigUint,
        cert_s: &BigUint,
    ) -> String {
        let mut text = String::new();
        for (heading, value) in [
            ("// Signature part R:", cell_r),
            ("// Signature part S:", cell_s),
            ("// Signature part R:", cert_r),
            ("// Signature part S:", cert_s),
        ] {
            text.push_str(heading);
            text.push_str("\r\n");
            text.push_str(&hex_groups(&fixed_bytes(value, 20)));
            text.push_str(".\r\n");
        }
        text.push_str(&self.certificate_text());
        text
    }

    /// A signature manifest covering `files`, all signed by data server
    /// `PM`. Entries may reference other (unregistered) server IDs.
    /// With `tamper_certificate` the SA endorsement is broken so every
    /// entry should come back as an unresolved signer.
    pub fn manifest_xml(&self, files: &[ManifestFile<'_>], tamper_certificate: bool) -> String {
        let (cert_r, cert_s) = self.sa_sign(self.certificate_text().as_bytes());
        let cert_r = if tamper_certificate {
            (cert_r + 1u32) % &self.q
        } else {
            cert_r
        };
        let [p, q, g, y] = self.certificate_values();

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <digitalSignatures xmlns=\"http://www.iho.int/s63/1.1.1\">\n\
             <dataServers>\n\
             <dataServer dataServerID=\"PM\">\n",
        );
        xml.push_str(&format!(
            "<Parameters><P>{p}</P><Q>{q}</Q><G>{g}</G></Parameters>\n\
             <PublicKey><Y>{y}</Y></PublicKey>\n\
             <dataserverCertificate><R>{}</R><S>{}</S></dataserverCertificate>\n\
             </dataServer>\n</dataServers>\n<fileSignatures>\n",
            hex_groups(&fixed_bytes(&cert_r, 20)),
            hex_groups(&fixed_bytes(&cert_s, 20)),
        ));

        for file in files {
            let (r, s) = self.ds_sign(file.content);
            xml.push_str(&format!(
                "<fileSignature dataServerID=\"{}\">\n\
                 <fileLocation>{}</fileLocation>\n\
                 <fileName>{}</fileName>\n\
                 <Signature><R>{}</R><S>{}</S></Signature>\n\
                 </fileSignature>\n",
                file.server_id,
                file.location,
                file.name,
                hex_groups(&fixed_bytes(&r, 20)),
                hex_groups(&fixed_bytes(&s, 20)),
            ));
        }

        xml.push_str("</fileSignatures>\n</digitalSignatures>\n");
        xml
    }
}

/// One manifest-signed file.
pub struct ManifestFile<'a> {
    pub server_id: &'a str,
    pub location: &'a str,
    pub name: &'a str,
    pub content: &'a [u8],
}

/// A scratch exchange set on disk.
pub struct ExchangeSet {
    dir: TempDir,
}

impl Default for ExchangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeSet {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp exchange set"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, bytes: &[u8]) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(path, bytes).expect("write exchange set file");
    }

    pub fn write_text(&self, relative: &str, text: &str) {
        self.write(relative, text.as_bytes());
    }
}

/// Cell bytes used across scenarios.
pub const CELL_BYTES: &[u8] = b"S-57 cell payload: the checker only hashes these bytes";

/// Scenario A layout: one valid ENC profile with one correctly chained
/// cell signature and no manifest.
pub fn valid_enc_set(signer: &TestSigner) -> ExchangeSet {
    let set = ExchangeSet::new();
    set.write("SERIAL.ENC", b"PM,DVD,1\r\n");
    set.write("ENC_ROOT/CATALOG.031", b"catalog placeholder");
    set.write("ENC_ROOT/GB61032A.000", CELL_BYTES);
    set.write_text(
        "ENC_ROOT/GN61032A.000",
        &signer.signature_record(CELL_BYTES),
    );
    set
}
