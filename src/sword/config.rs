//! Sword `.conf` module-definition parsing.
//!
//! A conf file is line-oriented `Field=Value` text opened by a `[Name]`
//! header line. The parser carries the accumulated quirk fixes real-world
//! modules need: continuation lines, BOM stripping, versioned `_`-suffixed
//! fields, known repeatable fields, and a handful of historical typo
//! repairs (`ztext`, `zld`, `Zip`, `Book`, `MinumumVersion`, plus the
//! `burjudson` truncated-continuation bug).

use std::collections::BTreeMap;

use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};
use log::{debug, info, warn};

use super::error::{Result, SwordError};
use super::models::{BlockType, Category, CipherState, CompressionType, DriverType};

/// Fields that use the `Base_subfield=` versioned pattern (e.g. `History_en=`).
const VERSIONED_FIELDS: &[&str] = &[
    "History",
    "Description",
    "About",
    "Copyright",
    "DistributionNotes",
];

/// Fields that legitimately repeat verbatim and accumulate into a list.
const REPEATABLE_FIELDS: &[&str] = &[
    "GlobalOptionFilter",
    "DictionaryModule",
    "DistributionLicense",
    "Feature",
    "LCSH",
    "Obsoletes",
    "TextSource",
];

/// Every documented conf field name; anything else logs a warning.
const KNOWN_FIELDS: &[&str] = &[
    // Descriptive fields
    "Name", "Abbreviation", "Font", "Lang", "Direction", "Version", "History",
    "Description", "TextSource", "Source", "LCSH", "ShortPromo", "Promo",
    "Obsoletes", "GlossaryFrom", "GlossaryTo", "DistributionSource",
    "DistributionNotes", "DistributionLicense", "Category", "Feature",
    "Versification", "Scope", "About", "Notes", "NoticeLink", "NoticeText",
    "Copyright", "CopyrightHolder", "CopyrightDate", "CopyrightContactName",
    "CopyrightContactEmail", "CopyrightContactAddress", "CopyrightContactNotes",
    "ShortCopyright", "CopyrightNotes", "CopyrightYear", "DictionaryModule",
    "ReferenceBible", "Siglum1", "Siglum2",
    // Technical fields
    "ModDrv", "DataPath", "Encoding", "SourceType", "GlobalOptionFilter",
    "CaseSensitiveKeys", "SearchOption", "CompressType", "BlockType",
    "MinimumVersion", "MinimumSwordVersion", "SwordVersionDate", "OSISVersion",
    "minMKVersion", "DisplayLevel", "LangSortOrder", "LangSortSkipChars",
    "StrongsPadding", "CipherKey", "InstallSize", "BlockCount", "OSISqToTick",
    "MinimumBlockNumber", "MaximumBlockNumber",
];

/// Modules that declare UTF-8 but actually ship ISO-8859-15 text.
const LATIN15_OVERRIDES: &[&str] = &["ab", "barnes", "navelinked", "dandettebiblen"];

/// If a module's conf `InstallSize` is at or below this, `LoadMode::Auto`
/// resolves the whole module into memory.
pub const AUTO_MEMORY_MAX_SIZE: u64 = 40_000;

/// A parsed conf field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfValue {
    Single(String),
    /// A field that occurred more than once.
    List(Vec<String>),
    /// A versioned field: (subfield, value) pairs, e.g. `("en", "…")`
    /// for `History_en=…`. A bare occurrence uses an empty subfield.
    Versioned(Vec<(String, String)>),
}

impl ConfValue {
    /// The value when the field occurred exactly once.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            _ => None,
        }
    }

    /// All plain values (one for `Single`, each for `List`, none for
    /// `Versioned`).
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::List(v) => v.iter().map(String::as_str).collect(),
            Self::Versioned(_) => Vec::new(),
        }
    }
}

/// One module's parsed descriptor: the structured fields the codec needs
/// plus the full key/value map for callers that want the rest.
#[derive(Debug, Clone)]
pub struct ModuleConfig {
    /// Lowercase file-stem of the `.conf` file; the immutable catalog key.
    pub abbreviation: String,
    /// Display name from the `[Name]` header.
    pub name: String,
    pub driver: DriverType,
    pub category: Category,
    pub encoding: &'static Encoding,
    pub versification: String,
    /// Relative path into the module tree; may embed a filename stem.
    pub data_path: String,
    pub cipher: CipherState,
    pub block_type: Option<BlockType>,
    /// Raw `CompressType` value; validated when the module is loaded.
    pub compress_type: Option<String>,
    fields: BTreeMap<String, ConfValue>,
}

impl ModuleConfig {
    /// Parse a conf file. The `abbreviation` is the lowercase `.conf`
    /// file stem. Pure: no filesystem access, no side effects beyond
    /// logging.
    pub fn parse(abbreviation: &str, bytes: &[u8]) -> Result<Self> {
        debug!("Parsing conf for module {:?}", abbreviation);
        let text = decode_conf_text(bytes);
        let (name, fields) = parse_conf_lines(abbreviation, &text)?;

        let name = if name.is_empty() {
            warn!("Empty [Name] header in {:?} conf; using abbreviation", abbreviation);
            abbreviation.to_string()
        } else {
            name
        };

        let driver = match fields.get("ModDrv").and_then(ConfValue::as_str) {
            Some(value) => DriverType::parse(value)?,
            None => {
                return Err(SwordError::InvalidConf(format!(
                    "missing ModDrv line in {:?} conf",
                    abbreviation
                )))
            }
        };
        let category = driver.category();

        let encoding = match fields.get("Encoding").and_then(ConfValue::as_str) {
            None => WINDOWS_1252, // the ISO-8859-1 default
            Some("UTF-8") => {
                if LATIN15_OVERRIDES.contains(&abbreviation) {
                    // Historical modules that declare UTF-8 but are not.
                    ISO_8859_15
                } else {
                    UTF_8
                }
            }
            Some(other) => return Err(SwordError::UnsupportedEncoding(other.to_string())),
        };

        let versification = fields
            .get("Versification")
            .and_then(ConfValue::as_str)
            .unwrap_or("KJV")
            .to_string();

        let data_path = match fields.get("DataPath").and_then(ConfValue::as_str) {
            Some(p) => p.to_string(),
            None => {
                return Err(SwordError::InvalidConf(format!(
                    "missing DataPath line in {:?} conf",
                    abbreviation
                )))
            }
        };

        let cipher = match fields.get("CipherKey") {
            None => CipherState::NotEncrypted,
            Some(v) => match v.as_str() {
                Some("") | None => {
                    info!("Module {:?} is locked (cipher key withheld)", name);
                    CipherState::Locked
                }
                Some(key) => {
                    info!("Module {:?} is encrypted but unlocked", name);
                    CipherState::Unlocked(key.to_string())
                }
            },
        };

        // Fix an inconsistency in at least the Clarke commentary.
        let block_type = match fields.get("BlockType").and_then(ConfValue::as_str) {
            None => None,
            Some("Book") | Some("BOOK") => Some(BlockType::Book),
            Some("CHAPTER") => Some(BlockType::Chapter),
            Some(other) => {
                warn!("Unrecognized BlockType {:?} in {:?} conf", other, abbreviation);
                None
            }
        };

        let compress_type = fields
            .get("CompressType")
            .and_then(ConfValue::as_str)
            .map(str::to_string);

        for key in fields.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                warn!("Unexpected {:?} Sword conf key in {:?}", key, abbreviation);
            }
        }

        Ok(Self {
            abbreviation: abbreviation.to_string(),
            name,
            driver,
            category,
            encoding,
            versification,
            data_path,
            cipher,
            block_type,
            compress_type,
            fields,
        })
    }

    /// Raw access to any parsed field.
    pub fn get(&self, field: &str) -> Option<&ConfValue> {
        self.fields.get(field)
    }

    /// The value of a single-occurrence field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(ConfValue::as_str)
    }

    pub fn language(&self) -> Option<&str> {
        self.get_str("Lang")
    }

    /// Declared features (the `Feature` field may repeat).
    pub fn features(&self) -> Vec<&str> {
        self.fields
            .get("Feature")
            .map(ConfValue::values)
            .unwrap_or_default()
    }

    pub fn install_size(&self) -> Option<u64> {
        self.get_str("InstallSize").and_then(|s| s.parse().ok())
    }

    /// True when the module is encrypted and the key is withheld.
    pub fn is_locked(&self) -> bool {
        self.cipher == CipherState::Locked
    }

    /// The cipher key, when the module is encrypted and decryptable.
    pub fn cipher_key(&self) -> Option<&str> {
        match &self.cipher {
            CipherState::Unlocked(key) => Some(key),
            _ => None,
        }
    }

    /// Validate the declared `CompressType`. Only ZIP (zlib deflate) is
    /// supported; LZSS never shipped in modules this crate targets.
    pub fn compression(&self) -> Result<Option<CompressionType>> {
        match self.compress_type.as_deref() {
            None => Ok(None),
            Some("ZIP") => Ok(Some(CompressionType::Zip)),
            Some(other) => Err(SwordError::UnsupportedCompression(other.to_string())),
        }
    }

    /// Decode raw module bytes with this module's declared encoding.
    /// Malformed sequences are replaced, with a warning, rather than
    /// failing the lookup.
    pub fn decode_text(&self, bytes: &[u8]) -> String {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors {
            warn!(
                "Malformed {} text in module {:?}; bad sequences replaced",
                self.encoding.name(),
                self.abbreviation
            );
        }
        text.into_owned()
    }
}

/// Conf files are read as ISO-8859-1 regardless of the module's declared
/// data encoding, matching the reference behavior. A UTF-8 BOM is
/// stripped first.
fn decode_conf_text(bytes: &[u8]) -> String {
    let bytes = [&b"\xef\xbb\xbf"[..], b"\xff\xfe", b"\xfe\xff"]
        .iter()
        .find_map(|bom| bytes.strip_prefix(*bom))
        .unwrap_or(bytes);
    bytes.iter().map(|&b| b as char).collect()
}

/// The line-assembly and key/value half of the parser: returns the
/// `[Name]` header contents and the accumulated field map.
fn parse_conf_lines(
    abbreviation: &str,
    text: &str,
) -> Result<(String, BTreeMap<String, ConfValue>)> {
    let mut fields = BTreeMap::new();
    let mut name: Option<String> = None;
    let mut pending = String::new();
    let mut continuation = false;

    for raw in text.lines() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let line = line.strip_prefix('\u{feff}').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if continuation {
            pending.push_str(line);
            continuation = false;
        } else {
            pending = line.to_string();
        }
        if pending.ends_with('\\') {
            pending.pop();
            continuation = true;
        }
        // The burjudson module truncates one line without a backslash.
        if abbreviation == "burjudson" && pending.ends_with(" available from ") {
            continuation = true;
        }
        if continuation {
            continue;
        }

        if name.is_none() {
            // First logical line must carry the module name in brackets.
            if pending.starts_with('[') && pending.ends_with(']') && !pending.contains('=') {
                name = Some(pending[1..pending.len() - 1].to_string());
                continue;
            }
            return Err(SwordError::InvalidConf(format!(
                "first line of {:?} conf is not a [Name] header: {:?}",
                abbreviation, pending
            )));
        }

        // Fix a module error in strongsrealgreek.conf.
        if pending.contains("History=1.4-081031=") {
            pending = pending.replacen('=', "_", 1);
        }
        let Some((key, value)) = pending.split_once('=') else {
            warn!(
                "Missing = in {:?} conf line (line ignored): {:?}",
                abbreviation, pending
            );
            continue;
        };
        let mut key = key.to_string();
        let mut value = value.to_string();

        // Spelling error in several modules: nheb, cslelizabeth, morphgnt…
        if key == "MinumumVersion" {
            key = "MinimumVersion".to_string();
        }
        // Casing error in romcor.conf.
        if key == "CompressType" && value == "Zip" {
            value = "ZIP".to_string();
        }

        insert_field(abbreviation, &mut fields, key, value);
    }

    match name {
        Some(name) => Ok((name, fields)),
        None => Err(SwordError::InvalidConf(format!(
            "no [Name] header found in {:?} conf",
            abbreviation
        ))),
    }
}

fn insert_field(
    abbreviation: &str,
    fields: &mut BTreeMap<String, ConfValue>,
    key: String,
    value: String,
) {
    // Versioned fields collapse onto their base name as (subfield, value).
    for base in VERSIONED_FIELDS {
        let (base_key, subfield) = if key == *base {
            (*base, String::new())
        } else if let Some(rest) = key.strip_prefix(&format!("{}_", base)) {
            (*base, rest.to_string())
        } else {
            continue;
        };
        match fields
            .entry(base_key.to_string())
            .or_insert_with(|| ConfValue::Versioned(Vec::new()))
        {
            ConfValue::Versioned(pairs) => pairs.push((subfield, value)),
            other => {
                warn!(
                    "Field {:?} in {:?} conf mixes plain and versioned forms",
                    base_key, abbreviation
                );
                *other = ConfValue::Versioned(vec![(subfield, value)]);
            }
        }
        return;
    }

    match fields.entry(key) {
        std::collections::btree_map::Entry::Vacant(slot) => {
            slot.insert(ConfValue::Single(value));
        }
        std::collections::btree_map::Entry::Occupied(mut slot) => {
            let key = slot.key().clone();
            match slot.get_mut() {
                ConfValue::Single(old) if *old == value => {
                    info!(
                        "Conf file for {:?} has duplicate {}={} lines",
                        abbreviation, key, value
                    );
                }
                ConfValue::Single(old) => {
                    if !REPEATABLE_FIELDS.contains(&key.as_str()) {
                        warn!(
                            "Unexpected repeated {:?} field in {:?} conf; keeping both values",
                            key, abbreviation
                        );
                    }
                    let first = std::mem::take(old);
                    *slot.get_mut() = ConfValue::List(vec![first, value]);
                }
                ConfValue::List(list) => list.push(value),
                ConfValue::Versioned(_) => unreachable!("versioned fields handled above"),
            }
        }
    }
}
