//! Cell file naming rules.
//!
//! Classifies which container entries are chart cells and derives the
//! expected signature file path for a cell. Both rules operate on the full
//! entry path with `/` separators.

/// File name portion of an entry path.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split a file name into stem and extension (extension includes the dot).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx..]),
        None => (name, ""),
    }
}

/// Does this entry path name a chart cell file?
///
/// The stem must be exactly eight characters. A stem starting `GB8` is the
/// Admiralty Information Overlay special case and is always a cell.
/// Otherwise the third stem character is the usage band, `'1'` to `'6'`,
/// and the extension is a dot plus a three-digit update number.
#[must_use]
pub fn is_cell_file(path: &str) -> bool {
    let name = file_name(path);
    if !name.is_ascii() {
        return false;
    }
    let (stem, ext) = split_extension(name);

    if stem.len() != 8 {
        return false;
    }

    if stem[..3].eq_ignore_ascii_case("GB8") {
        return true;
    }

    let third = stem.as_bytes()[2];
    if !(b'1'..=b'6').contains(&third) {
        return false;
    }

    if ext.len() != 4 {
        return false;
    }

    ext[1..].parse::<u32>().is_ok()
}

/// Derive the signature file path for a cell path.
///
/// The character ten positions from the end of the path (the usage band
/// digit of the cell name) is shifted up by 24 character codes. Returns
/// `None` when the shifted code would pass `'Z'`, in which case no
/// signature path exists for this cell.
#[must_use]
pub fn signature_path_for(cell_path: &str) -> Option<String> {
    let mut chars: Vec<char> = cell_path.chars().collect();
    let idx = chars.len().checked_sub(10)?;

    let shifted = char::from_u32(chars[idx] as u32 + 24)?;
    if shifted > 'Z' {
        return None;
    }

    chars[idx] = shifted;
    Some(chars.into_iter().collect())
}
