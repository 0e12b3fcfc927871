//! # sword-reader
//!
//! A reader for Crosswire Sword modules (Bibles, commentaries,
//! lexicons/dictionaries and general books) that decodes their on-disk
//! binary layout directly: `.conf` descriptors, fixed-width index
//! files, block-compressed data files and the Sapphire stream cipher
//! used by encrypted modules.
//!
//! Lookups return the raw markup the module stores (OSIS/GBF/ThML);
//! translating that markup is the caller's job.
pub mod sword;

// Re-export the main types for convenience
pub use sword::{
    Category, DriverType, EntryValue, LoadMode, ModuleConfig, Result, SwordBackend,
    SwordCollection, SwordError, SwordModule, VersificationIndex,
};
