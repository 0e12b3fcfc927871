//! Data structures shared by the Sword module codec components.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::error::{Result, SwordError};

/// Sword's internal storage-format tag, declared by the `ModDrv` conf field.
///
/// The driver type fixes the on-disk file layout, the index record widths
/// and whether the text store is block-compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DriverType {
    RawText,
    ZText,
    RawCom,
    RawCom4,
    ZCom,
    RawLd,
    RawLd4,
    ZLd,
    RawGenBook,
    RawFiles,
}

impl DriverType {
    /// Parse a `ModDrv` value, normalizing the two known historical
    /// typos (`ztext` in CzeB21, `zld` in a few lexicons).
    pub fn parse(value: &str) -> Result<Self> {
        let fixed = match value {
            "ztext" => "zText",
            "zld" => "zLD",
            other => other,
        };
        match fixed {
            "RawText" => Ok(Self::RawText),
            "zText" => Ok(Self::ZText),
            "RawCom" => Ok(Self::RawCom),
            "RawCom4" => Ok(Self::RawCom4),
            "zCom" => Ok(Self::ZCom),
            "RawLD" => Ok(Self::RawLd),
            "RawLD4" => Ok(Self::RawLd4),
            "zLD" => Ok(Self::ZLd),
            "RawGenBook" => Ok(Self::RawGenBook),
            "RawFiles" => Ok(Self::RawFiles),
            other => Err(SwordError::UnknownDriverType(other.to_string())),
        }
    }

    /// The canonical spelling used in conf files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawText => "RawText",
            Self::ZText => "zText",
            Self::RawCom => "RawCom",
            Self::RawCom4 => "RawCom4",
            Self::ZCom => "zCom",
            Self::RawLd => "RawLD",
            Self::RawLd4 => "RawLD4",
            Self::ZLd => "zLD",
            Self::RawGenBook => "RawGenBook",
            Self::RawFiles => "RawFiles",
        }
    }

    /// The generic human-readable module type name Sword front-ends use.
    pub fn generic_name(&self) -> &'static str {
        match self.category() {
            Category::Bible => "Biblical Texts",
            Category::Commentary => "Commentaries",
            Category::Dictionary => "Lexicons / Dictionaries",
            Category::General => "Generic Books",
        }
    }

    /// Module category, fixed per driver type.
    pub fn category(&self) -> Category {
        match self {
            Self::RawText | Self::ZText => Category::Bible,
            Self::RawCom | Self::RawCom4 | Self::ZCom => Category::Commentary,
            Self::RawLd | Self::RawLd4 | Self::ZLd => Category::Dictionary,
            Self::RawGenBook | Self::RawFiles => Category::General,
        }
    }

    /// Which record-layout family the driver's index files belong to.
    ///
    /// Note that `RawFiles` stores versified data despite carrying the
    /// General category.
    pub fn layout(&self) -> RecordLayout {
        match self {
            Self::RawText | Self::ZText | Self::RawCom | Self::RawCom4 | Self::ZCom
            | Self::RawFiles => RecordLayout::Versified,
            Self::RawLd | Self::RawLd4 | Self::ZLd => RecordLayout::Lexicon,
            Self::RawGenBook => RecordLayout::GenBook,
        }
    }

    /// True for the block-compressed drivers.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::ZText | Self::ZCom | Self::ZLd)
    }
}

/// Broad content category, derived deterministically from [`DriverType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Bible,
    Commentary,
    Dictionary,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bible => "Bible",
            Self::Commentary => "Commentary",
            Self::Dictionary => "Dictionary",
            Self::General => "General",
        }
    }
}

/// Record-layout family: decides which index reader a module needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// Book/chapter/verse structured text (Bibles, commentaries, RawFiles).
    Versified,
    /// Keyed lexicon / dictionary entries.
    Lexicon,
    /// Keyed general-book entries.
    GenBook,
}

/// Validated block-compression algorithm (`CompressType`). Only ZIP
/// (zlib deflate) ever shipped in the modules this crate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    Zip,
}

/// Compression granularity of a block-compressed module (`BlockType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Book,
    Chapter,
}

impl BlockType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "BOOK" => Some(Self::Book),
            "CHAPTER" => Some(Self::Chapter),
            _ => None,
        }
    }

    /// The single-letter infix used in compressed index/data file names
    /// (`ot.bzs` vs `ot.czs`).
    pub fn letter(&self) -> char {
        match self {
            Self::Book => 'b',
            Self::Chapter => 'c',
        }
    }
}

/// One of the two testament files of a versified module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament {
    Ot,
    Nt,
}

impl Testament {
    pub fn basename(&self) -> &'static str {
        match self {
            Self::Ot => "ot",
            Self::Nt => "nt",
        }
    }
}

/// Encryption state derived from the `CipherKey` conf field.
///
/// A *non-empty* key means the module is encrypted but decryptable; an
/// *empty* key field means the key was deliberately withheld (locked);
/// an absent field means the module is not encrypted at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CipherState {
    NotEncrypted,
    Unlocked(String),
    Locked,
}

/// How much of a module to pull into memory at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Resolve every entry to text immediately; no further disk access.
    InMemory,
    /// Keep only location descriptors; read data files at query time.
    IndexOnly,
    /// `InMemory` when the conf `InstallSize` is at or below 40 000 bytes,
    /// `IndexOnly` otherwise (or when no size is declared).
    Auto,
}

/// Location of one verse/entry inside a versified module's data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerseLocation {
    /// Plain seek+read into the `ot`/`nt` file.
    Raw { offset: u32, length: u32 },
    /// A byte range inside a compressed block of the `.bzz`/`.czz` file.
    Compressed {
        block_offset: u32,
        compressed_len: u32,
        uncompressed_len: u32,
        verse_offset: u32,
        verse_len: u16,
    },
}

/// Location of one lexicon/genbook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLocation {
    /// Plain seek+read into the `.dat`/`.bdt` file.
    Raw { offset: u32, length: u32 },
    /// A chunk inside a compressed block of the `.zdt` file (zLD).
    Compressed {
        block_offset: u32,
        compressed_len: u32,
        chunk: u32,
    },
}

/// Index-only slot for a keyed (lexicon/genbook) entry.
#[derive(Debug, Clone)]
pub enum EntrySlot {
    One(EntryLocation),
    /// Duplicate keys fold into a list.
    Many(Vec<EntryLocation>),
    /// Synthesized cross-reference; resolved at index-build time even in
    /// index-only mode, because no data file backs it.
    CrossRef(String),
}

/// Resolved value of a keyed entry, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    One(String),
    Many(Vec<String>),
}

impl EntryValue {
    /// Convenience accessor for the single-entry case.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Self::One(s) => Some(s),
            Self::Many(_) => None,
        }
    }
}

/// Per-book index of a versified module in index-only mode.
#[derive(Debug)]
pub struct BookIndex {
    /// The data file this book's locations point into.
    pub data_path: PathBuf,
    /// Keyed by (chapter, verse); chapter 0 is front matter, verse 0 a
    /// chapter heading.
    pub entries: HashMap<(u16, u16), VerseLocation>,
}

/// Index table of a versified module. Exactly one representation is
/// populated per loaded module.
#[derive(Debug)]
pub enum VersifiedStore {
    Resolved(BTreeMap<&'static str, HashMap<(u16, u16), String>>),
    Indexed(BTreeMap<&'static str, BookIndex>),
}

/// Index table of a keyed (lexicon/genbook) module.
#[derive(Debug)]
pub enum KeyedStore {
    Resolved(BTreeMap<String, EntryValue>),
    Indexed {
        data_path: PathBuf,
        entries: BTreeMap<String, EntrySlot>,
    },
}

/// The loaded store of a module, tagged by layout family.
#[derive(Debug)]
pub enum Store {
    Versified(VersifiedStore),
    Keyed(KeyedStore),
}
