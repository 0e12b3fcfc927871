//! Binary index-file readers, one per driver-record family.
//!
//! All index files are arrays of fixed-width little-endian records.
//! A missing index file means the testament (or the whole lexicon) is
//! simply absent; a file whose size is not a multiple of the record
//! width is corrupt and fails that testament only.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, error, info, warn};

use super::blocks::decode_block;
use super::config::ModuleConfig;
use super::data::slice_available;
use super::error::{Result, SwordError};
use super::models::{
    BlockType, BookIndex, DriverType, EntryLocation, EntrySlot, EntryValue, KeyedStore,
    Testament, VerseLocation, VersifiedStore,
};
use super::versification::VersificationIndex;

/// Strong's lexicons whose bare 5-digit keys get a `G` prefix.
const STRONGS_GREEK_MODULES: &[&str] = &["greekhebrew", "strongsgreek", "strongsrealgreek"];
/// Strong's lexicons whose bare 5-digit keys get an `H` prefix.
const STRONGS_HEBREW_MODULES: &[&str] = &["hebrewgreek", "strongshebrew", "strongsrealhebrew"];
/// Modules that declare CHAPTER blocks but ship `b`-infix files.
const BOOK_LETTER_QUIRKS: &[&str] = &["byz", "tr", "whnu"];

/// Read a whole fixed-width record file. `Ok(None)` when the file does
/// not exist; `TruncatedIndex` when it ends mid-record.
fn read_table(path: &Path, width: usize) -> Result<Option<Vec<u8>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if bytes.len() % width != 0 {
        return Err(SwordError::TruncatedIndex {
            path: path.to_path_buf(),
        });
    }
    Ok(Some(bytes))
}

/// As [`read_table`], but for a companion file that must exist once its
/// sibling has been found.
fn read_required_table(path: &Path, width: usize) -> Result<Vec<u8>> {
    read_table(path, width)?.ok_or_else(|| {
        SwordError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is missing", path.display()),
        ))
    })
}

// ---------------------------------------------------------------------------
// Versified modules (Bibles, commentaries, RawFiles)

/// Build the store of a versified module from its per-testament index
/// files. A failure in one testament is logged and leaves the other
/// usable.
pub fn load_versified(
    config: &ModuleConfig,
    versification: &VersificationIndex,
    folder: &Path,
    in_memory: bool,
) -> Result<VersifiedStore> {
    let compression = config.compression()?;
    if config.driver.is_compressed() && compression.is_none() {
        return Err(SwordError::InvalidConf(format!(
            "{} declares compressed driver {} without a CompressType",
            config.abbreviation,
            config.driver.as_str()
        )));
    }

    let mut resolved: BTreeMap<&'static str, HashMap<(u16, u16), String>> = BTreeMap::new();
    let mut indexed: BTreeMap<&'static str, BookIndex> = BTreeMap::new();
    let mut loaded_any = false;
    for testament in [Testament::Ot, Testament::Nt] {
        let outcome = if config.driver.is_compressed() {
            load_compressed_testament(
                config,
                versification,
                folder,
                testament,
                in_memory,
                &mut resolved,
                &mut indexed,
            )
        } else {
            load_raw_testament(
                config,
                versification,
                folder,
                testament,
                in_memory,
                &mut resolved,
                &mut indexed,
            )
        };
        match outcome {
            Ok(true) => loaded_any = true,
            Ok(false) => info!(
                "No {} data available for {} module",
                testament.basename().to_uppercase(),
                config.name
            ),
            Err(e) => error!(
                "Skipping unreadable {} testament of {}: {}",
                testament.basename().to_uppercase(),
                config.name,
                e
            ),
        }
    }
    if !loaded_any {
        warn!("No data available for {} module", config.name);
    }
    Ok(if in_memory {
        VersifiedStore::Resolved(resolved)
    } else {
        VersifiedStore::Indexed(indexed)
    })
}

fn load_raw_testament(
    config: &ModuleConfig,
    versification: &VersificationIndex,
    folder: &Path,
    testament: Testament,
    in_memory: bool,
    resolved: &mut BTreeMap<&'static str, HashMap<(u16, u16), String>>,
    indexed: &mut BTreeMap<&'static str, BookIndex>,
) -> Result<bool> {
    let length_width = if config.driver == DriverType::RawCom4 { 4 } else { 2 };
    let record_width = 4 + length_width;
    let idx_path = folder.join(format!("{}.vss", testament.basename()));
    let Some(table) = read_table(&idx_path, record_width)? else {
        return Ok(false);
    };
    let data_path = folder.join(testament.basename());
    let data = if in_memory {
        Some(fs::read(&data_path)?)
    } else {
        None
    };

    let mut slots = 0usize;
    for (slot, record) in table.chunks_exact(record_width).enumerate() {
        let offset = LittleEndian::read_u32(&record[..4]);
        let length = if length_width == 4 {
            LittleEndian::read_i32(&record[4..8]).max(0) as u32
        } else {
            i32::from(LittleEndian::read_i16(&record[4..6])).max(0) as u32
        };
        let Some((book, chapter, verse)) = versification.linear_to_reference(testament, slot)
        else {
            warn!(
                "Ignoring record {} of {} beyond the {} layout",
                slot,
                idx_path.display(),
                versification.scheme()
            );
            continue;
        };
        if let Some(data) = &data {
            let bytes =
                slice_available(data, offset as usize, length as usize, &config.abbreviation);
            let text = config.decode_text(bytes).trim().to_string();
            resolved.entry(book).or_default().insert((chapter, verse), text);
        } else {
            indexed
                .entry(book)
                .or_insert_with(|| BookIndex {
                    data_path: data_path.clone(),
                    entries: HashMap::new(),
                })
                .entries
                .insert((chapter, verse), VerseLocation::Raw { offset, length });
        }
        slots += 1;
    }
    debug!(
        "Read {} {} index entries for {}",
        slots,
        testament.basename().to_uppercase(),
        config.name
    );
    Ok(true)
}

/// The file-name infix of a compressed versified module's index and data
/// files (`ot.bzs` vs `ot.czs`).
fn compressed_letter(config: &ModuleConfig) -> Result<char> {
    let block_type = config.block_type.ok_or_else(|| {
        SwordError::InvalidConf(format!(
            "{} declares {} without a BlockType",
            config.abbreviation,
            config.driver.as_str()
        ))
    })?;
    if block_type == BlockType::Chapter
        && BOOK_LETTER_QUIRKS.contains(&config.abbreviation.as_str())
    {
        // These modules ship book-infix files despite declaring CHAPTER.
        return Ok(BlockType::Book.letter());
    }
    Ok(block_type.letter())
}

fn load_compressed_testament(
    config: &ModuleConfig,
    versification: &VersificationIndex,
    folder: &Path,
    testament: Testament,
    in_memory: bool,
    resolved: &mut BTreeMap<&'static str, HashMap<(u16, u16), String>>,
    indexed: &mut BTreeMap<&'static str, BookIndex>,
) -> Result<bool> {
    let letter = compressed_letter(config)?;
    let basename = testament.basename();
    let zs_path = folder.join(format!("{}.{}zs", basename, letter));
    let Some(block_bytes) = read_table(&zs_path, 12)? else {
        return Ok(false);
    };
    let block_table: Vec<(u32, u32, u32)> = block_bytes
        .chunks_exact(12)
        .map(|r| {
            (
                LittleEndian::read_u32(&r[..4]),
                LittleEndian::read_u32(&r[4..8]),
                LittleEndian::read_u32(&r[8..12]),
            )
        })
        .collect();

    let zv_path = folder.join(format!("{}.{}zv", basename, letter));
    let verse_bytes = read_required_table(&zv_path, 10)?;
    let data_path = folder.join(format!("{}.{}zz", basename, letter));

    // In-memory loads inflate every block up front; index-only loads
    // defer that to lookup time through the block cache.
    let blocks: Option<Vec<Vec<u8>>> = if in_memory {
        let data = fs::read(&data_path)?;
        Some(
            block_table
                .iter()
                .map(|&(offset, compressed_len, uncompressed_len)| {
                    if compressed_len == 0 {
                        return Vec::new();
                    }
                    let compressed = slice_available(
                        &data,
                        offset as usize,
                        compressed_len as usize,
                        &config.abbreviation,
                    );
                    match decode_block(compressed, config.cipher_key()) {
                        Ok(block) => {
                            if block.len() != uncompressed_len as usize {
                                warn!(
                                    "Block at {} of {} inflated to {} bytes, expected {}",
                                    offset,
                                    data_path.display(),
                                    block.len(),
                                    uncompressed_len
                                );
                            }
                            block
                        }
                        Err(e) => {
                            error!(
                                "Cannot inflate block at {} of {}: {}",
                                offset,
                                data_path.display(),
                                e
                            );
                            Vec::new()
                        }
                    }
                })
                .collect(),
        )
    } else {
        None
    };

    for (slot, record) in verse_bytes.chunks_exact(10).enumerate() {
        let block_number = LittleEndian::read_i32(&record[..4]);
        let verse_offset = LittleEndian::read_i32(&record[4..8]).max(0) as u32;
        let verse_len = LittleEndian::read_i16(&record[8..10]).max(0) as u16;
        let Some((book, chapter, verse)) = versification.linear_to_reference(testament, slot)
        else {
            warn!(
                "Ignoring record {} of {} beyond the {} layout",
                slot,
                zv_path.display(),
                versification.scheme()
            );
            continue;
        };
        if block_number < 0 || block_number as usize >= block_table.len() {
            error!(
                "Ignoring invalid block number {} for {} {}:{} in {}",
                block_number, book, chapter, verse, config.name
            );
            continue;
        }
        let (block_offset, compressed_len, uncompressed_len) = block_table[block_number as usize];
        if let Some(blocks) = &blocks {
            let text = if verse_len == 0 {
                String::new()
            } else {
                let bytes = slice_available(
                    &blocks[block_number as usize],
                    verse_offset as usize,
                    usize::from(verse_len),
                    &config.abbreviation,
                );
                config.decode_text(bytes).trim().to_string()
            };
            resolved.entry(book).or_default().insert((chapter, verse), text);
        } else {
            indexed
                .entry(book)
                .or_insert_with(|| BookIndex {
                    data_path: data_path.clone(),
                    entries: HashMap::new(),
                })
                .entries
                .insert(
                    (chapter, verse),
                    VerseLocation::Compressed {
                        block_offset,
                        compressed_len,
                        uncompressed_len,
                        verse_offset,
                        verse_len,
                    },
                );
        }
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// Keyed stores (lexicons, general books)

fn empty_keyed(in_memory: bool, data_path: &Path) -> KeyedStore {
    if in_memory {
        KeyedStore::Resolved(BTreeMap::new())
    } else {
        KeyedStore::Indexed {
            data_path: data_path.to_path_buf(),
            entries: BTreeMap::new(),
        }
    }
}

fn push_entry(map: &mut BTreeMap<String, EntryValue>, key: String, text: String, module: &str) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(EntryValue::One(text));
        }
        Entry::Occupied(mut slot) => {
            debug!("Found duplicate {:?} key in {}", slot.key(), module);
            match slot.get_mut() {
                EntryValue::One(first) => {
                    let first = std::mem::take(first);
                    *slot.get_mut() = EntryValue::Many(vec![first, text]);
                }
                EntryValue::Many(list) => list.push(text),
            }
        }
    }
}

fn push_location(
    map: &mut BTreeMap<String, EntrySlot>,
    key: String,
    location: EntryLocation,
    module: &str,
) {
    match map.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(EntrySlot::One(location));
        }
        Entry::Occupied(mut slot) => {
            debug!("Found duplicate {:?} key in {}", slot.key(), module);
            match slot.get_mut() {
                EntrySlot::One(first) => {
                    let first = *first;
                    *slot.get_mut() = EntrySlot::Many(vec![first, location]);
                }
                EntrySlot::Many(list) => list.push(location),
                EntrySlot::CrossRef(_) => {
                    warn!(
                        "Real {:?} entry displaces a synthesized cross-reference in {}",
                        slot.key(),
                        module
                    );
                    *slot.get_mut() = EntrySlot::One(location);
                }
            }
        }
    }
}

/// Load an uncompressed lexicon (`RawLD`/`RawLD4`). Keys live inside the
/// data chunks, so the `.dat` file is scanned even in index-only mode.
pub fn load_raw_lexicon(
    config: &ModuleConfig,
    folder: &Path,
    stem: &str,
    in_memory: bool,
) -> Result<KeyedStore> {
    let length_width = if config.driver == DriverType::RawLd4 { 4 } else { 2 };
    let record_width = 4 + length_width;
    let idx_path = folder.join(format!("{}.idx", stem));
    let data_path = folder.join(format!("{}.dat", stem));
    let Some(table) = read_table(&idx_path, record_width)? else {
        warn!("Cannot find {} for {} module", idx_path.display(), config.name);
        return Ok(empty_keyed(in_memory, &data_path));
    };
    let data = fs::read(&data_path)?;

    let mut resolved: BTreeMap<String, EntryValue> = BTreeMap::new();
    let mut indexed: BTreeMap<String, EntrySlot> = BTreeMap::new();
    for record in table.chunks_exact(record_width) {
        let offset = LittleEndian::read_u32(&record[..4]);
        let length = if length_width == 4 {
            LittleEndian::read_i32(&record[4..8])
        } else {
            i32::from(LittleEndian::read_i16(&record[4..6]))
        };
        if length <= 0 {
            continue;
        }
        let chunk = slice_available(&data, offset as usize, length as usize, &config.abbreviation);
        let Some(newline) = chunk.iter().position(|&b| b == b'\n') else {
            warn!(
                "Lexicon chunk at {} of {} has no key line",
                offset,
                data_path.display()
            );
            continue;
        };
        let entry_bytes = &chunk[newline + 1..];
        let mut key = config.decode_text(&chunk[..newline]).trim().to_uppercase();
        if key.ends_with('\\') {
            key.pop();
        }
        key = strongs_adjusted(config, key);
        // Byte range of the entry with surrounding whitespace dropped.
        let leading = entry_bytes
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
        let trimmed = entry_bytes.trim_ascii();
        if in_memory {
            push_entry(&mut resolved, key, config.decode_text(trimmed), &config.name);
        } else {
            let location = EntryLocation::Raw {
                offset: offset + (newline + 1 + leading) as u32,
                length: trimmed.len() as u32,
            };
            push_location(&mut indexed, key, location, &config.name);
        }
    }

    Ok(if in_memory {
        expand_resolved(&mut resolved, &config.name);
        KeyedStore::Resolved(resolved)
    } else {
        expand_indexed(&mut indexed, &config.name);
        KeyedStore::Indexed {
            data_path,
            entries: indexed,
        }
    })
}

/// Apply the `G`/`H` prefix the Strong's-number modules leave implicit.
fn strongs_adjusted(config: &ModuleConfig, key: String) -> String {
    let abbreviation = config.abbreviation.as_str();
    if key.len() == 5 && key.bytes().all(|b| b.is_ascii_digit()) {
        if STRONGS_GREEK_MODULES.contains(&abbreviation) {
            return format!("G{}", key);
        }
        if STRONGS_HEBREW_MODULES.contains(&abbreviation) {
            return format!("H{}", key);
        }
    }
    key
}

/// Load a compressed lexicon (`zLD`): string keys in `.idx`/`.dat`, a
/// block table in `.zdx`, compressed chunk blocks in `.zdt`.
pub fn load_z_lexicon(
    config: &ModuleConfig,
    folder: &Path,
    stem: &str,
    in_memory: bool,
) -> Result<KeyedStore> {
    let data_path = folder.join(format!("{}.zdt", stem));
    let idx_path = folder.join(format!("{}.idx", stem));
    let Some(idx) = read_table(&idx_path, 8)? else {
        warn!("Cannot find {} for {} module", idx_path.display(), config.name);
        return Ok(empty_keyed(in_memory, &data_path));
    };
    let key_data = fs::read(folder.join(format!("{}.dat", stem)))?;

    // Key records: a string, CRLF, then block and chunk numbers.
    let mut keys: Vec<(String, u32, u32)> = Vec::new();
    for record in idx.chunks_exact(8) {
        let offset = LittleEndian::read_u32(&record[..4]) as usize;
        let length = LittleEndian::read_u32(&record[4..8]) as usize;
        if length == 0 {
            continue;
        }
        let chunk = slice_available(&key_data, offset, length, &config.abbreviation);
        if chunk.len() < 10 {
            warn!(
                "Key record at {} of {} is too short ({} bytes)",
                offset,
                idx_path.display(),
                chunk.len()
            );
            continue;
        }
        let split = chunk.len() - 10;
        let key = config.decode_text(&chunk[..split]).to_uppercase();
        let block = LittleEndian::read_u32(&chunk[split + 2..split + 6]);
        let chunk_number = LittleEndian::read_u32(&chunk[split + 6..split + 10]);
        keys.push((key, block, chunk_number));
    }
    debug!("Read {} lexicon key entries for {}", keys.len(), config.name);

    let zdx_path = folder.join(format!("{}.zdx", stem));
    let block_bytes = read_required_table(&zdx_path, 8)?;
    let block_table: Vec<(u32, u32)> = block_bytes
        .chunks_exact(8)
        .map(|r| (LittleEndian::read_u32(&r[..4]), LittleEndian::read_u32(&r[4..8])))
        .collect();

    if in_memory {
        let data = fs::read(&data_path)?;
        let blocks: Vec<Vec<String>> = block_table
            .iter()
            .map(|&(offset, compressed_len)| {
                if compressed_len == 0 {
                    return Vec::new();
                }
                let compressed = slice_available(
                    &data,
                    offset as usize,
                    compressed_len as usize,
                    &config.abbreviation,
                );
                match decode_block(compressed, config.cipher_key()) {
                    Ok(block) => split_chunk_block(config, &block),
                    Err(e) => {
                        error!(
                            "Cannot inflate block at {} of {}: {}",
                            offset,
                            data_path.display(),
                            e
                        );
                        Vec::new()
                    }
                }
            })
            .collect();
        let mut resolved = BTreeMap::new();
        for (key, block, chunk_number) in keys {
            let text = match blocks
                .get(block as usize)
                .and_then(|chunks| chunks.get(chunk_number as usize))
            {
                Some(text) => text.clone(),
                None => {
                    error!(
                        "Skipped non-existing chunk {}/{} for {:?} in {}",
                        block, chunk_number, key, config.name
                    );
                    String::new()
                }
            };
            push_entry(&mut resolved, key, text, &config.name);
        }
        expand_resolved(&mut resolved, &config.name);
        Ok(KeyedStore::Resolved(resolved))
    } else {
        let mut indexed = BTreeMap::new();
        for (key, block, chunk_number) in keys {
            let Some(&(block_offset, compressed_len)) = block_table.get(block as usize) else {
                error!(
                    "Skipped non-existing block {} for {:?} in {}",
                    block, key, config.name
                );
                continue;
            };
            push_location(
                &mut indexed,
                key,
                EntryLocation::Compressed {
                    block_offset,
                    compressed_len,
                    chunk: chunk_number,
                },
                &config.name,
            );
        }
        expand_indexed(&mut indexed, &config.name);
        Ok(KeyedStore::Indexed {
            data_path,
            entries: indexed,
        })
    }
}

/// Split a decompressed lexicon block into its chunk strings. The block
/// opens with a chunk count, then per-chunk (offset, length) pairs; each
/// chunk's final byte is a NUL and is dropped.
pub fn split_chunk_block(config: &ModuleConfig, block: &[u8]) -> Vec<String> {
    if block.len() < 4 {
        warn!("Lexicon block in {} is too short for a chunk count", config.name);
        return Vec::new();
    }
    let count = LittleEndian::read_u32(&block[..4]) as usize;
    let mut chunks = Vec::with_capacity(count);
    let mut ix = 4;
    for _ in 0..count {
        if ix + 8 > block.len() {
            warn!("Lexicon block directory in {} ends early", config.name);
            break;
        }
        let offset = LittleEndian::read_u32(&block[ix..ix + 4]) as usize;
        let length = LittleEndian::read_u32(&block[ix + 4..ix + 8]) as usize;
        ix += 8;
        let bytes = if length == 0 {
            &[][..]
        } else {
            slice_available(block, offset, length - 1, &config.abbreviation)
        };
        chunks.push(config.decode_text(bytes).trim().to_string());
    }
    chunks
}

/// Load an uncompressed general book (`RawGenBook`): `.idx` holds plain
/// offsets into `.dat` key records, whose trailers point into `.bdt`.
pub fn load_gen_book(
    config: &ModuleConfig,
    folder: &Path,
    stem: &str,
    in_memory: bool,
) -> Result<KeyedStore> {
    let data_path = folder.join(format!("{}.bdt", stem));
    let idx_path = folder.join(format!("{}.idx", stem));
    let Some(idx) = read_table(&idx_path, 4)? else {
        warn!("Cannot find {} for {} module", idx_path.display(), config.name);
        return Ok(empty_keyed(in_memory, &data_path));
    };
    let key_data = fs::read(folder.join(format!("{}.dat", stem)))?;
    let payload = if in_memory {
        Some(fs::read(&data_path)?)
    } else {
        None
    };

    let mut resolved: BTreeMap<String, EntryValue> = BTreeMap::new();
    let mut indexed: BTreeMap<String, EntrySlot> = BTreeMap::new();
    for record in idx.chunks_exact(4) {
        let offset = LittleEndian::read_u32(record) as usize;
        // Key records are bounded in practice; 210 bytes covers the three
        // leading numbers, the key string, and the 10-byte trailer. The
        // probe legitimately comes up short near the end of the file.
        let end = offset.saturating_add(210).min(key_data.len());
        let header = &key_data[offset.min(key_data.len())..end];
        if header.len() < 12 {
            warn!(
                "Genbook key record at {} of {} is too short",
                offset,
                idx_path.display()
            );
            continue;
        }
        let Some(nul) = header[12..].iter().position(|&b| b == 0) else {
            warn!(
                "Genbook key at {} of {} overruns the record buffer",
                offset,
                idx_path.display()
            );
            continue;
        };
        let key_bytes = &header[12..12 + nul];
        if key_bytes.is_empty() {
            // The first record is the tree root and has no key.
            continue;
        }
        let trailer = &header[12 + nul + 1..];
        if trailer.len() < 10 {
            warn!(
                "Genbook trailer at {} of {} is incomplete",
                offset,
                idx_path.display()
            );
            continue;
        }
        let key = config.decode_text(key_bytes).to_uppercase();
        let marker = LittleEndian::read_i16(&trailer[..2]);
        if marker != 8 {
            // Marker 0 denotes a keyed node with no payload of its own.
            debug!("Genbook entry {:?} carries no payload (marker {})", key, marker);
            continue;
        }
        let entry_offset = LittleEndian::read_i32(&trailer[2..6]);
        let entry_length = LittleEndian::read_i32(&trailer[6..10]);
        if entry_offset < 0 || entry_length < 0 {
            warn!(
                "Genbook entry {:?} has a negative payload range in {}",
                key, config.name
            );
            continue;
        }
        if let Some(payload) = &payload {
            let bytes = slice_available(
                payload,
                entry_offset as usize,
                entry_length as usize,
                &config.abbreviation,
            );
            let text = config.decode_text(bytes).trim().to_string();
            push_entry(&mut resolved, key, text, &config.name);
        } else {
            push_location(
                &mut indexed,
                key,
                EntryLocation::Raw {
                    offset: entry_offset as u32,
                    length: entry_length as u32,
                },
                &config.name,
            );
        }
    }

    Ok(if in_memory {
        KeyedStore::Resolved(resolved)
    } else {
        KeyedStore::Indexed {
            data_path,
            entries: indexed,
        }
    })
}

// ---------------------------------------------------------------------------
// Lexicon cross-reference synthesis

/// Derive redirect keys from punctuation inside real keys: a key with
/// semicolons yields one redirect per segment, otherwise the prefix up
/// to the first space/comma/hyphen. Real keys are never overwritten;
/// several keys collapsing onto the same derived key fold into one
/// combined redirect.
fn build_cross_references<V>(store: &BTreeMap<String, V>) -> Vec<(String, String)> {
    const SUFFIX: &str = " (auto-added)";
    let mut added: BTreeMap<String, String> = BTreeMap::new();
    for key in store.keys() {
        let derived: Vec<String> = if key.contains(';') {
            key.split(';').map(|bit| bit.trim().to_string()).collect()
        } else if let Some(split) = key.find([' ', ',', '-']) {
            vec![key[..split].to_string()]
        } else {
            continue;
        };
        for new_key in derived {
            if new_key.is_empty() || store.contains_key(&new_key) {
                continue;
            }
            match added.entry(new_key) {
                Entry::Occupied(mut slot) => {
                    let previous = slot.get();
                    let stem = previous[..previous.len() - SUFFIX.len()].to_string();
                    *slot.get_mut() = format!("{} or '{}'{}", stem, key, SUFFIX);
                }
                Entry::Vacant(slot) => {
                    slot.insert(format!("See '{}'{}", key, SUFFIX));
                }
            }
        }
    }
    added.into_iter().collect()
}

fn expand_resolved(map: &mut BTreeMap<String, EntryValue>, module: &str) {
    let additions = build_cross_references(map);
    if !additions.is_empty() {
        debug!(
            "{} cross-reference keys auto-added to {}",
            additions.len(),
            module
        );
    }
    for (key, text) in additions {
        map.insert(key, EntryValue::One(text));
    }
}

fn expand_indexed(map: &mut BTreeMap<String, EntrySlot>, module: &str) {
    let additions = build_cross_references(map);
    if !additions.is_empty() {
        debug!(
            "{} cross-reference keys auto-added to {}",
            additions.len(),
            module
        );
    }
    for (key, text) in additions {
        map.insert(key, EntrySlot::CrossRef(text));
    }
}
