//! Crosswire Sword binary module codec.
//!
//! Reads Sword-format Bible, commentary, lexicon and general-book
//! modules straight from their on-disk binary layout: `.conf`
//! descriptors under `mods.d/`, fixed-width index files, raw or
//! block-compressed (and optionally enciphered) data files. No native
//! Sword engine is involved.

mod blocks;
mod cipher;
mod collection;
mod config;
mod data;
mod error;
mod index;
mod models;
mod versification;

pub use blocks::decode_block;
pub use cipher::SapphireCipher;
pub use collection::SwordCollection;
pub use config::{ConfValue, ModuleConfig, AUTO_MEMORY_MAX_SIZE};
pub use error::{Result, SwordError};
pub use models::{
    BlockType, BookIndex, Category, CipherState, CompressionType, DriverType, EntryLocation,
    EntrySlot, EntryValue, KeyedStore, LoadMode, RecordLayout, Store, Testament, VerseLocation,
    VersifiedStore,
};
pub use versification::{
    KjvVerseCounts, OffsetBase, VerseCountSource, VersificationIndex, FRONT_MATTER,
};

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use data::{read_raw, slice_available, BlockCache};

/// The pluggable query surface a front-end talks to.
///
/// [`SwordCollection`] provides the pure-codec implementation; a wrapper
/// around the native Sword engine can stand behind the same interface
/// when that library is installed.
pub trait SwordBackend {
    type Handle;

    /// Known module abbreviations with their driver types, optionally
    /// filtered by driver-type or generic type names.
    fn list_modules(&self, type_filter: Option<&[&str]>) -> Vec<(String, DriverType)>;

    fn open_module(&self, abbreviation: &str, mode: LoadMode) -> Result<Self::Handle>;

    fn verse(&self, handle: &Self::Handle, book: &str, chapter: u16, verse: u16)
        -> Option<String>;

    fn entry(&self, handle: &Self::Handle, key: &str) -> Option<EntryValue>;
}

/// A loaded module: its parsed configuration, its index or resolved
/// store, and the per-module cache of decompressed blocks.
///
/// Lookups never fail hard: data-level problems are logged and the one
/// affected reference returns `None`, leaving the rest of the module
/// usable.
#[derive(Debug)]
pub struct SwordModule {
    config: ModuleConfig,
    versification: Option<VersificationIndex>,
    store: Store,
    cache: BlockCache,
}

impl SwordModule {
    /// Load a module's index (and, in memory mode, its full text) from a
    /// Sword installation root. A locked module is rejected before any
    /// data file is touched.
    ///
    /// Versified layouts use the built-in [`KjvVerseCounts`]; schemes with
    /// deutero-canonical books need [`Self::load_with_counts`] and a
    /// richer count source to make those books addressable.
    pub fn load(config: ModuleConfig, root: &Path, mode: LoadMode) -> Result<Self> {
        Self::load_with_counts(config, root, mode, &KjvVerseCounts)
    }

    /// As [`Self::load`], with an injectable chapter/verse-count source
    /// backing the module's versification scheme.
    pub fn load_with_counts(
        config: ModuleConfig,
        root: &Path,
        mode: LoadMode,
        counts: &dyn VerseCountSource,
    ) -> Result<Self> {
        if config.is_locked() {
            return Err(SwordError::Locked(config.name.clone()));
        }
        // Surface an unsupported CompressType now, not at first lookup.
        config.compression()?;
        let in_memory = match mode {
            LoadMode::InMemory => true,
            LoadMode::IndexOnly => false,
            LoadMode::Auto => config
                .install_size()
                .is_some_and(|size| size <= AUTO_MEMORY_MAX_SIZE),
        };
        info!(
            "Loading {:?} module ({}, {})",
            config.abbreviation,
            config.driver.as_str(),
            if in_memory { "in memory" } else { "index only" }
        );

        let (folder, stem) = resolve_data_location(root, &config.data_path);
        let (versification, store) = match config.driver.layout() {
            RecordLayout::Versified => {
                let versification = VersificationIndex::build(&config.versification, counts)?;
                let store = index::load_versified(&config, &versification, &folder, in_memory)?;
                (Some(versification), Store::Versified(store))
            }
            RecordLayout::Lexicon => {
                let store = if config.driver == DriverType::ZLd {
                    index::load_z_lexicon(&config, &folder, &stem, in_memory)?
                } else {
                    index::load_raw_lexicon(&config, &folder, &stem, in_memory)?
                };
                (None, Store::Keyed(store))
            }
            RecordLayout::GenBook => {
                let store = index::load_gen_book(&config, &folder, &stem, in_memory)?;
                (None, Store::Keyed(store))
            }
        };
        Ok(Self {
            config,
            versification,
            store,
            cache: BlockCache::new(),
        })
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// The versification scheme, for versified modules only.
    pub fn versification(&self) -> Option<&VersificationIndex> {
        self.versification.as_ref()
    }

    /// True when the whole module was resolved to text at load time.
    pub fn is_in_memory(&self) -> bool {
        match &self.store {
            Store::Versified(VersifiedStore::Resolved(_)) => true,
            Store::Versified(VersifiedStore::Indexed(_)) => false,
            Store::Keyed(KeyedStore::Resolved(_)) => true,
            Store::Keyed(KeyedStore::Indexed { .. }) => false,
        }
    }

    /// The raw markup text of one verse. `None` when the reference is
    /// outside the module, the testament is absent, or the record cannot
    /// be read; the empty string when the reference exists but holds no
    /// text.
    pub fn verse(&self, book: &str, chapter: u16, verse: u16) -> Option<String> {
        let Store::Versified(store) = &self.store else {
            return None;
        };
        match store {
            VersifiedStore::Resolved(books) => books.get(book)?.get(&(chapter, verse)).cloned(),
            VersifiedStore::Indexed(books) => {
                let book_index = books.get(book)?;
                let location = *book_index.entries.get(&(chapter, verse))?;
                match self.read_verse(book, &book_index.data_path, location) {
                    Ok(text) => Some(text),
                    Err(e) => {
                        error!(
                            "Cannot read {} {}:{} from {}: {}",
                            book, chapter, verse, self.config.name, e
                        );
                        None
                    }
                }
            }
        }
    }

    /// The raw markup text of one lexicon/genbook entry; a list when the
    /// key occurred more than once. Auto-added cross-references come back
    /// as their `See '<key>' (auto-added)` redirect text.
    pub fn entry(&self, key: &str) -> Option<EntryValue> {
        let Store::Keyed(store) = &self.store else {
            return None;
        };
        match store {
            KeyedStore::Resolved(entries) => entries.get(key).cloned(),
            KeyedStore::Indexed { data_path, entries } => match entries.get(key)? {
                EntrySlot::CrossRef(text) => Some(EntryValue::One(text.clone())),
                EntrySlot::One(location) => match self.read_entry(data_path, *location) {
                    Ok(text) => Some(EntryValue::One(text)),
                    Err(e) => {
                        error!("Cannot read {:?} from {}: {}", key, self.config.name, e);
                        None
                    }
                },
                EntrySlot::Many(locations) => {
                    let mut texts = Vec::with_capacity(locations.len());
                    for &location in locations {
                        match self.read_entry(data_path, location) {
                            Ok(text) => texts.push(text),
                            Err(e) => {
                                error!(
                                    "Cannot read duplicate {:?} from {}: {}",
                                    key, self.config.name, e
                                );
                                texts.push(String::new());
                            }
                        }
                    }
                    Some(EntryValue::Many(texts))
                }
            },
        }
    }

    fn read_verse(&self, book: &str, data_path: &Path, location: VerseLocation) -> Result<String> {
        match location {
            VerseLocation::Raw { offset, length } => {
                if length == 0 {
                    return Ok(String::new());
                }
                let bytes = read_raw(data_path, u64::from(offset), length as usize)?;
                Ok(self.config.decode_text(&bytes).trim().to_string())
            }
            VerseLocation::Compressed {
                block_offset,
                compressed_len,
                uncompressed_len,
                verse_offset,
                verse_len,
            } => {
                if compressed_len == 0 || verse_len == 0 {
                    return Ok(String::new());
                }
                let block = self.cache.get_or_load(book, block_offset, || {
                    let compressed =
                        read_raw(data_path, u64::from(block_offset), compressed_len as usize)?;
                    let block = decode_block(&compressed, self.config.cipher_key())?;
                    if block.len() != uncompressed_len as usize {
                        warn!(
                            "Block at {} of {} inflated to {} bytes, expected {}",
                            block_offset,
                            data_path.display(),
                            block.len(),
                            uncompressed_len
                        );
                    }
                    Ok(block)
                })?;
                let bytes = slice_available(
                    &block,
                    verse_offset as usize,
                    usize::from(verse_len),
                    &self.config.abbreviation,
                );
                Ok(self.config.decode_text(bytes).trim().to_string())
            }
        }
    }

    fn read_entry(&self, data_path: &Path, location: EntryLocation) -> Result<String> {
        match location {
            EntryLocation::Raw { offset, length } => {
                if length == 0 {
                    return Ok(String::new());
                }
                let bytes = read_raw(data_path, u64::from(offset), length as usize)?;
                Ok(self.config.decode_text(&bytes).trim().to_string())
            }
            EntryLocation::Compressed {
                block_offset,
                compressed_len,
                chunk,
            } => {
                if compressed_len == 0 {
                    return Ok(String::new());
                }
                let block = self.cache.get_or_load("zdt", block_offset, || {
                    let compressed =
                        read_raw(data_path, u64::from(block_offset), compressed_len as usize)?;
                    decode_block(&compressed, self.config.cipher_key())
                })?;
                let mut chunks = index::split_chunk_block(&self.config, &block);
                if (chunk as usize) < chunks.len() {
                    Ok(chunks.swap_remove(chunk as usize))
                } else {
                    error!(
                        "Non-existing chunk {} in block at {} of {}",
                        chunk, block_offset, self.config.name
                    );
                    Ok(String::new())
                }
            }
        }
    }
}

/// Resolve a conf `DataPath` against the installation root. The path
/// usually names the module's data folder, but some modules append the
/// data files' name stem as a final component.
fn resolve_data_location(root: &Path, data_path: &str) -> (PathBuf, String) {
    let relative = data_path.trim_start_matches("./");
    let folder = root.join(relative);
    if folder.is_dir() {
        return (folder, String::new());
    }
    let stem = relative.rsplit('/').next().unwrap_or("").to_string();
    let parent = match folder.parent() {
        Some(parent) => parent.to_path_buf(),
        None => folder.clone(),
    };
    (parent, stem)
}
