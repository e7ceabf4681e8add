//! DSA primitives for the S-63 data protection scheme.
//!
//! S-63 signatures are bare `R`/`S` pairs over legacy 512-bit domain
//! parameters with a 160-bit subgroup, and the digest is fixed to SHA-1.
//! Keys and signatures arrive as raw big-endian byte runs from the
//! signature record, the XML manifest, or the SA public key file; they are
//! held as arbitrary-precision integers and verified with the FIPS-186
//! equation directly so range checks and digest truncation stay explicit.

use num_bigint::BigUint;
use sha1::{Digest, Sha1};

use crate::infra::error::{CheckError, CheckResult};

/// A DSA public key: domain parameters `p`, `q`, `g` plus the public
/// value `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaPublicKey {
    p: BigUint,
    q: BigUint,
    g: BigUint,
    y: BigUint,
}

/// A DSA signature as the raw pair `(r, s)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsaSignature {
    r: BigUint,
    s: BigUint,
}

impl DsaPublicKey {
    /// Build a key from big-endian parameter byte runs.
    ///
    /// Only structural sanity is enforced here; a key that fails these
    /// checks can never verify anything, so rejecting it early gives the
    /// caller a clearer error than a silent verification failure.
    pub fn from_raw(p: &[u8], q: &[u8], g: &[u8], y: &[u8]) -> CheckResult<Self> {
        let p = BigUint::from_bytes_be(p);
        let q = BigUint::from_bytes_be(q);
        let g = BigUint::from_bytes_be(g);
        let y = BigUint::from_bytes_be(y);

        let three = BigUint::from(3u32);
        if q < three || p <= q {
            return Err(CheckError::Crypto(
                "DSA domain parameters out of range".to_string(),
            ));
        }
        if g <= BigUint::from(1u32) || g >= p || y == BigUint::from(0u32) || y >= p {
            return Err(CheckError::Crypto(
                "DSA generator or public value out of range".to_string(),
            ));
        }

        Ok(Self { p, q, g, y })
    }

    /// Verify `signature` over `message`, hashing with SHA-1.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &DsaSignature) -> bool {
        let digest = Sha1::digest(message);
        self.verify_prehash(&digest, signature)
    }

    /// FIPS-186 verification over an already-computed digest.
    fn verify_prehash(&self, digest: &[u8], signature: &DsaSignature) -> bool {
        let r = &signature.r;
        let s = &signature.s;

        let zero = BigUint::from(0u32);
        if *r == zero || r >= &self.q || *s == zero || s >= &self.q {
            return false;
        }

        // q is prime, so s^-1 = s^(q-2) (mod q).
        let w = s.modpow(&(&self.q - 2u32), &self.q);

        // Leftmost min(bits(q), bits(digest)) bits of the digest.
        let mut z = BigUint::from_bytes_be(digest);
        let digest_bits = (digest.len() as u64) * 8;
        let q_bits = self.q.bits();
        if digest_bits > q_bits {
            z >>= (digest_bits - q_bits) as usize;
        }

        let u1 = (&z * &w) % &self.q;
        let u2 = (r * &w) % &self.q;
        let v = (self.g.modpow(&u1, &self.p) * self.y.modpow(&u2, &self.p)) % &self.p % &self.q;

        v == *r
    }

    #[must_use]
    pub fn p(&self) -> &BigUint {
        &self.p
    }

    #[must_use]
    pub fn q(&self) -> &BigUint {
        &self.q
    }

    #[must_use]
    pub fn g(&self) -> &BigUint {
        &self.g
    }

    #[must_use]
    pub fn y(&self) -> &BigUint {
        &self.y
    }
}

impl DsaSignature {
    /// Build a signature from big-endian `r` and `s` byte runs.
    ///
    /// Out-of-range components are accepted here and rejected during
    /// verification, so a corrupted signature is a verification failure
    /// rather than a parse failure.
    #[must_use]
    pub fn from_raw(r: &[u8], s: &[u8]) -> Self {
        Self {
            r: BigUint::from_bytes_be(r),
            s: BigUint::from_bytes_be(s),
        }
    }

    #[must_use]
    pub fn r(&self) -> &BigUint {
        &self.r
    }

    #[must_use]
    pub fn s(&self) -> &BigUint {
        &self.s
    }
}
