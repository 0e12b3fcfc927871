//! Raw data-file access and the per-module decompressed-block cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

use log::{trace, warn};

use super::error::Result;

/// Cache of decompressed blocks, keyed by (unit, file offset) where the
/// unit is a book code or a fixed data-file tag. Unbounded by design:
/// modules are processed as whole units and the cache dies with the
/// module handle. Interior mutability keeps lookups `&self`; module
/// handles are single-threaded.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: RefCell<HashMap<(String, u32), Rc<Vec<u8>>>>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a decompressed block, loading it through `load` on first use.
    pub fn get_or_load(
        &self,
        unit: &str,
        offset: u32,
        load: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<Rc<Vec<u8>>> {
        if let Some(block) = self.blocks.borrow().get(&(unit.to_string(), offset)) {
            trace!("Block cache hit for {} @ {}", unit, offset);
            return Ok(Rc::clone(block));
        }
        let block = Rc::new(load()?);
        self.blocks
            .borrow_mut()
            .insert((unit.to_string(), offset), Rc::clone(&block));
        Ok(block)
    }
}

/// Seek into a data file and read `length` bytes. A short read is a
/// data-integrity warning, not an error: whatever bytes were available
/// come back.
pub fn read_raw(path: &Path, offset: u64, length: usize) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buffer = Vec::with_capacity(length);
    file.take(length as u64).read_to_end(&mut buffer)?;
    if buffer.len() < length {
        warn!(
            "Data file {} ends early: wanted {} bytes at offset {}, got {}",
            path.display(),
            length,
            offset,
            buffer.len()
        );
    }
    Ok(buffer)
}

/// Slice `[offset, offset+length)` out of an in-memory buffer, clipping
/// to the bytes actually present. Out-of-range requests warn and return
/// the available remainder (possibly empty).
pub fn slice_available<'a>(bytes: &'a [u8], offset: usize, length: usize, what: &str) -> &'a [u8] {
    let start = offset.min(bytes.len());
    let end = offset.saturating_add(length).min(bytes.len());
    if end - start < length {
        warn!(
            "{} truncated: wanted {} bytes at offset {}, only {} available",
            what,
            length,
            offset,
            end - start
        );
    }
    &bytes[start..end]
}
