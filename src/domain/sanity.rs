//! Exchange set structural validation.
//!
//! Confirms an input actually is an S-63 exchange set before any signature
//! work begins. Both full media (AVCS or PRIMAR DVDs, update CDs) and adhoc
//! exchange sets built for a specific vessel are accepted: the layout must
//! match either the AIO profile or the ENC profile. A mismatch is a fatal
//! structural error, not a per-file failure.

use crate::infra::error::{CheckError, CheckResult};

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent_name(path: &str) -> Option<&str> {
    let mut parts = path.rsplit('/');
    parts.next()?;
    parts.next()
}

/// Check the entry list against the two recognized profiles.
///
/// AIO profile: exactly one `SERIAL.AIO`, no `SERIAL.ENC`, exactly one
/// `CATALOG.031`. ENC profile: one `SERIAL.ENC` per `CATALOG.031`. In both
/// profiles each catalog must sit directly inside an `ENC_ROOT` folder.
pub fn ensure_exchange_set(paths: &[String]) -> CheckResult<()> {
    let catalogs: Vec<&String> = paths
        .iter()
        .filter(|p| file_name(p).eq_ignore_ascii_case("CATALOG.031"))
        .collect();
    let serial_aio = paths
        .iter()
        .filter(|p| file_name(p).eq_ignore_ascii_case("SERIAL.AIO"))
        .count();
    let serial_enc = paths
        .iter()
        .filter(|p| file_name(p).eq_ignore_ascii_case("SERIAL.ENC"))
        .count();

    if serial_aio > 0 {
        if serial_aio != 1 {
            return Err(CheckError::Structure(
                "can only check one AIO exchange set".to_string(),
            ));
        }
        if serial_enc > 0 {
            return Err(CheckError::Structure(
                "cannot check a mixture of AIO and ENC exchange sets".to_string(),
            ));
        }
        if catalogs.len() != 1 {
            return Err(CheckError::Structure(
                "wrong number of CATALOG.031 for an AIO exchange set".to_string(),
            ));
        }
    } else if serial_enc > 0 {
        if serial_enc != catalogs.len() {
            return Err(CheckError::Structure(
                "number of CATALOG.031 does not match number of SERIAL.ENC".to_string(),
            ));
        }
    } else {
        return Err(CheckError::Structure(
            "no SERIAL.AIO or SERIAL.ENC marker found".to_string(),
        ));
    }

    for catalog in catalogs {
        let parent = parent_name(catalog);
        if !parent.is_some_and(|name| name.eq_ignore_ascii_case("ENC_ROOT")) {
            return Err(CheckError::Structure(format!(
                "CATALOG.031 is not in folder ENC_ROOT: {catalog}"
            )));
        }
    }

    Ok(())
}
