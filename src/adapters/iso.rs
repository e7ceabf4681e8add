//! ISO 9660 disc image source.
//!
//! Only what checking needs: enumerate the file entries once and read one
//! entry at a time by its extent. Joliet supplementary descriptors are
//! preferred for long names, `;n` version suffixes are hidden. Multi-extent
//! files, interleaving and extended attributes are not supported.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use crate::adapters::{not_found, Source};
use crate::infra::error::{CheckError, CheckResult};

const SECTOR_SIZE: u64 = 2048;
const MAX_DIR_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy)]
struct Extent {
    lba: u32,
    size: u32,
}

/// An exchange set mastered onto an ISO 9660 image.
pub struct IsoSource {
    file: Mutex<File>,
    root: String,
    paths: Vec<String>,
    index: HashMap<String, Extent>,
}

impl IsoSource {
    pub fn open(path: &Path) -> CheckResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| CheckError::Container(format!("cannot open {}: {e}", path.display())))?;

        let (root_extent, joliet) = locate_root(&mut file)?;

        let mut paths = Vec::new();
        let mut index = HashMap::new();
        walk(&mut file, root_extent, joliet, "", 0, &mut paths, &mut index)?;
        paths.sort();

        Ok(Self {
            file: Mutex::new(file),
            root: path.display().to_string(),
            paths,
            index,
        })
    }
}

impl Source for IsoSource {
    fn root(&self) -> &str {
        &self.root
    }

    fn paths(&self) -> &[String] {
        &self.paths
    }

    fn open(&self, path: &str) -> CheckResult<Box<dyn Read + '_>> {
        let extent = *self.index.get(path).ok_or_else(|| not_found(path))?;
        let mut file = self.file.lock().unwrap();
        let data = read_block(
            &mut file,
            u64::from(extent.lba) * SECTOR_SIZE,
            extent.size as usize,
        )?;
        Ok(Box::new(Cursor::new(data)))
    }
}

/// Scan the volume descriptor set for the root directory record,
/// preferring a Joliet supplementary descriptor over the primary one.
fn locate_root(file: &mut File) -> CheckResult<(Extent, bool)> {
    let mut primary = None;
    let mut joliet = None;

    for sector in 16..64u64 {
        let descriptor = read_block(file, sector * SECTOR_SIZE, SECTOR_SIZE as usize)?;
        if &descriptor[1..6] != b"CD001" {
            return Err(CheckError::Container(
                "not an ISO 9660 image: bad volume descriptor".to_string(),
            ));
        }
        match descriptor[0] {
            1 => primary = Some(root_record(&descriptor)?),
            2 if is_joliet(&descriptor[88..120]) => joliet = Some(root_record(&descriptor)?),
            255 => break,
            _ => {}
        }
    }

    if let Some(extent) = joliet {
        Ok((extent, true))
    } else if let Some(extent) = primary {
        Ok((extent, false))
    } else {
        Err(CheckError::Container(
            "no primary volume descriptor found".to_string(),
        ))
    }
}

/// UCS-2 escape sequences marking a Joliet supplementary descriptor.
fn is_joliet(escapes: &[u8]) -> bool {
    matches!(escapes, [0x25, 0x2F, 0x40 | 0x43 | 0x45, ..])
}

/// The 34-byte root directory record embedded in a volume descriptor.
fn root_record(descriptor: &[u8]) -> CheckResult<Extent> {
    parse_extent(&descriptor[156..190])
}

fn parse_extent(record: &[u8]) -> CheckResult<Extent> {
    if record.len() < 34 {
        return Err(CheckError::Container(
            "directory record too short".to_string(),
        ));
    }
    Ok(Extent {
        lba: u32::from_le_bytes(record[2..6].try_into().unwrap()),
        size: u32::from_le_bytes(record[10..14].try_into().unwrap()),
    })
}

fn walk(
    file: &mut File,
    extent: Extent,
    joliet: bool,
    prefix: &str,
    depth: usize,
    paths: &mut Vec<String>,
    index: &mut HashMap<String, Extent>,
) -> CheckResult<()> {
    if depth > MAX_DIR_DEPTH {
        return Err(CheckError::Container(
            "directory nesting too deep".to_string(),
        ));
    }

    let data = read_block(file, u64::from(extent.lba) * SECTOR_SIZE, extent.size as usize)?;

    let mut subdirectories = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let record_len = data[offset] as usize;
        if record_len == 0 {
            // Records do not span sectors; a zero length pads to the next.
            offset = (offset / SECTOR_SIZE as usize + 1) * SECTOR_SIZE as usize;
            continue;
        }
        if offset + record_len > data.len() {
            return Err(CheckError::Container(
                "directory record overruns its extent".to_string(),
            ));
        }
        let record = &data[offset..offset + record_len];
        offset += record_len;

        let child = parse_extent(record)?;
        let name_len = record[32] as usize;
        if 33 + name_len > record.len() {
            return Err(CheckError::Container(
                "directory record name overruns the record".to_string(),
            ));
        }
        let raw_name = &record[33..33 + name_len];
        if let [0x00] | [0x01] = raw_name {
            continue; // self and parent entries
        }

        let name = hide_version(&decode_name(raw_name, joliet));
        if name.is_empty() {
            continue;
        }
        let full = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };

        let flags = record[25];
        if flags & 0x02 != 0 {
            subdirectories.push((child, full));
        } else {
            index.insert(full.clone(), child);
            paths.push(full);
        }
    }

    for (child, full) in subdirectories {
        walk(file, child, joliet, &full, depth + 1, paths, index)?;
    }
    Ok(())
}

fn decode_name(raw: &[u8], joliet: bool) -> String {
    if joliet {
        // Joliet identifiers are UCS-2 big endian.
        raw.chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .map(|unit| char::from_u32(u32::from(unit)).unwrap_or('_'))
            .collect()
    } else {
        raw.iter().map(|&b| char::from(b)).collect()
    }
}

/// Drop the `;n` version suffix and the bare trailing dot of
/// extension-less names.
fn hide_version(name: &str) -> String {
    let name = name.split(';').next().unwrap_or(name);
    name.strip_suffix('.').unwrap_or(name).to_string()
}

fn read_block(file: &mut File, offset: u64, len: usize) -> CheckResult<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut data = vec![0u8; len];
    file.read_exact(&mut data)
        .map_err(|_| CheckError::Container("image truncated".to_string()))?;
    Ok(data)
}
