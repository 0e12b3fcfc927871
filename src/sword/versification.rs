//! Versification schemes and the linear verse-slot layout.
//!
//! Versified modules store one record per *slot* in a fixed linear layout
//! that the index files never spell out: each testament file begins with
//! two front-matter slots, then for every book in the scheme's canonical
//! order a book-introduction slot, and for every chapter a chapter-heading
//! slot followed by one slot per verse. Mapping a record number back to a
//! `(book, chapter, verse)` reference therefore needs the scheme's book
//! ordering and per-chapter verse counts, which is what this module
//! provides.

use std::collections::BTreeMap;

use log::{debug, warn};

use super::error::{Result, SwordError};
use super::models::Testament;

/// Book code used for the two reserved front-matter slots.
pub const FRONT_MATTER: &str = "FRT";

/// The protestant Old Testament canon, in order.
const OT39: &[&str] = &[
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "SA1", "SA2",
    "KI1", "KI2", "CH1", "CH2", "EZR", "NEH", "EST", "JOB", "PSA", "PRO",
    "ECC", "SNG", "ISA", "JER", "LAM", "EZE", "DAN", "HOS", "JOL", "AMO",
    "OBA", "JNA", "MIC", "NAH", "HAB", "ZEP", "HAG", "ZEC", "MAL",
];

/// The New Testament canon, in order.
const NT27: &[&str] = &[
    "MAT", "MRK", "LUK", "JHN", "ACT", "ROM", "CO1", "CO2", "GAL", "EPH",
    "PHP", "COL", "TH1", "TH2", "TI1", "TI2", "TIT", "PHM", "HEB", "JAM",
    "PE1", "PE2", "JN1", "JN2", "JN3", "JDE", "REV",
];

/// Apocrypha appended to the OT by the KJVA scheme.
const KJVA_EXTRA: &[&str] = &[
    "GES", "LES", "TOB", "JDT", "ESA", "WIS", "SIR", "BAR", "PAZ", "SUS",
    "BEL", "MAN", "MA1", "MA2",
];

/// The Vulgate's interleaved 46-book OT ordering.
const VULG_OT: &[&str] = &[
    "GEN", "EXO", "LEV", "NUM", "DEU", "JOS", "JDG", "RUT", "SA1", "SA2",
    "KI1", "KI2", "CH1", "CH2", "EZR", "NEH", "TOB", "JDT", "EST", "JOB",
    "PSA", "PRO", "ECC", "SNG", "WIS", "SIR", "ISA", "JER", "LAM", "BAR",
    "EZE", "DAN", "HOS", "JOL", "AMO", "OBA", "JNA", "MIC", "NAH", "HAB",
    "ZEP", "HAG", "ZEC", "MAL", "MA1", "MA2",
];

/// Appendix books the Vulgate scheme places after the NT.
const VULG_NT_EXTRA: &[&str] = &["MAN", "GES", "LES", "PS2", "LAO"];

/// Rahlfs' Septuagint ordering (Joshua/Judges carry the LXX A-text codes).
const RAHLFS_OT: &[&str] = &[
    "GEN", "EXO", "LEV", "NUM", "DEU", "JSA", "JGB", "RUT", "SA1", "SA2",
    "KI1", "KI2", "CH1", "CH2", "EZR", "NEH", "TOB", "JDT", "EST", "JOB",
    "PSA", "PRO", "ECC", "SNG", "WIS", "SIR", "ISA", "JER", "LAM", "BAR",
    "EZE", "DAN", "HOS", "JOL", "AMO", "OBA", "JNA", "MIC", "NAH", "HAB",
    "ZEP", "HAG", "ZEC", "MAL", "MA1", "MA2",
];

/// Per-book chapter/verse-count lookup backing a versification scheme.
///
/// The built-in [`KjvVerseCounts`] covers the 66-book protestant canon;
/// callers with richer book-organization data can supply their own source
/// to light up the deutero-canonical books of the KJVA/Vulg/Rahlfs
/// schemes.
pub trait VerseCountSource {
    /// Verse counts per chapter for a book code, in chapter order, or
    /// `None` when the book is unknown to this source.
    fn verse_counts(&self, book: &str) -> Option<&[u16]>;
}

/// Which record-numbering base a slot position is expressed in.
///
/// Uncompressed testament files number their own records from zero, but
/// compressed block-index files may count across both testaments, so all
/// three bases must stay addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetBase {
    /// OT slots first, NT slots appended after them.
    Combined,
    OtOnly,
    NtOnly,
}

/// Per-book slot arithmetic, in testament-local numbering.
#[derive(Debug)]
struct BookSlots {
    testament: Testament,
    /// `[0]` is the slot of the chapter-1 heading; `[c]` for `c >= 1` is
    /// the slot of chapter `c`'s first verse.
    chapter_offsets: Vec<usize>,
    verse_counts: Vec<u16>,
}

/// A built versification scheme: the full linear slot layout for both
/// testaments plus per-book chapter tables.
#[derive(Debug)]
pub struct VersificationIndex {
    name: String,
    ot: Vec<(&'static str, u16, u16)>,
    nt: Vec<(&'static str, u16, u16)>,
    books: BTreeMap<&'static str, BookSlots>,
}

impl VersificationIndex {
    /// Build the slot layout for a named scheme. Books the count source
    /// does not know are skipped with a warning; an unrecognized scheme
    /// name is fatal for the module that declared it.
    pub fn build(name: &str, source: &dyn VerseCountSource) -> Result<Self> {
        let (ot_books, nt_books) = scheme_books(name)?;
        let mut books = BTreeMap::new();
        let ot = build_testament(name, Testament::Ot, &ot_books, source, &mut books);
        let nt = build_testament(name, Testament::Nt, &nt_books, source, &mut books);
        debug!(
            "Built {:?} versification: {} OT slots, {} NT slots",
            name,
            ot.len(),
            nt.len()
        );
        Ok(Self {
            name: name.to_string(),
            ot,
            nt,
            books,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.name
    }

    /// Number of slots in one testament's linear layout.
    pub fn slot_count(&self, testament: Testament) -> usize {
        match testament {
            Testament::Ot => self.ot.len(),
            Testament::Nt => self.nt.len(),
        }
    }

    /// Map a testament-local record number back to its reference.
    /// Chapter 0 is the book introduction, verse 0 a chapter heading, and
    /// the [`FRONT_MATTER`] book covers the two reserved leading slots.
    /// `None` once the index runs past the testament's layout.
    pub fn linear_to_reference(
        &self,
        testament: Testament,
        index: usize,
    ) -> Option<(&'static str, u16, u16)> {
        match testament {
            Testament::Ot => self.ot.get(index).copied(),
            Testament::Nt => self.nt.get(index).copied(),
        }
    }

    /// Which testament a book belongs to in this scheme.
    pub fn testament_of(&self, book: &str) -> Option<Testament> {
        self.books.get(book).map(|b| b.testament)
    }

    pub fn chapter_count(&self, book: &str) -> Option<u16> {
        self.books.get(book).map(|b| b.verse_counts.len() as u16)
    }

    pub fn verses_in_chapter(&self, book: &str, chapter: u16) -> Option<u16> {
        let slots = self.books.get(book)?;
        if chapter == 0 {
            return None;
        }
        slots.verse_counts.get(usize::from(chapter) - 1).copied()
    }

    /// Slot position of a reference, in the requested numbering base.
    /// `None` when the reference is outside the scheme, or when the base
    /// does not cover the book's testament.
    pub fn verse_slot(
        &self,
        book: &str,
        chapter: u16,
        verse: u16,
        base: OffsetBase,
    ) -> Option<usize> {
        let slots = self.books.get(book)?;
        let local = slots.local_slot(chapter, verse)?;
        match (base, slots.testament) {
            (OffsetBase::Combined, Testament::Ot) => Some(local),
            (OffsetBase::Combined, Testament::Nt) => Some(self.ot.len() + local),
            (OffsetBase::OtOnly, Testament::Ot) => Some(local),
            (OffsetBase::NtOnly, Testament::Nt) => Some(local),
            _ => None,
        }
    }
}

impl BookSlots {
    fn local_slot(&self, chapter: u16, verse: u16) -> Option<usize> {
        let first_heading = *self.chapter_offsets.first()?;
        if chapter == 0 {
            // The book-introduction slot sits just before chapter 1's
            // heading.
            return (verse == 0).then(|| first_heading - 1);
        }
        let first_verse = *self.chapter_offsets.get(usize::from(chapter))?;
        if verse == 0 {
            return Some(first_verse - 1);
        }
        let count = self.verse_counts[usize::from(chapter) - 1];
        (verse <= count).then(|| first_verse + usize::from(verse) - 1)
    }
}

fn scheme_books(name: &str) -> Result<(Vec<&'static str>, Vec<&'static str>)> {
    match name {
        "KJV" | "NRSV" | "Synodal" | "SynodalProt" | "Catholic" | "Catholic2" | "German"
        | "Leningrad" | "LXX" | "MT" => Ok((OT39.to_vec(), NT27.to_vec())),
        "KJVA" => {
            let mut ot = OT39.to_vec();
            ot.extend_from_slice(KJVA_EXTRA);
            Ok((ot, NT27.to_vec()))
        }
        "Vulg" => {
            let mut nt = NT27.to_vec();
            nt.extend_from_slice(VULG_NT_EXTRA);
            Ok((VULG_OT.to_vec(), nt))
        }
        "Rahlfs" => Ok((RAHLFS_OT.to_vec(), NT27.to_vec())),
        other => Err(SwordError::UnknownVersification(other.to_string())),
    }
}

fn build_testament(
    scheme: &str,
    testament: Testament,
    book_order: &[&'static str],
    source: &dyn VerseCountSource,
    books: &mut BTreeMap<&'static str, BookSlots>,
) -> Vec<(&'static str, u16, u16)> {
    let mut linear = vec![(FRONT_MATTER, 0, 0), (FRONT_MATTER, 0, 0)];
    for &book in book_order {
        let Some(counts) = source.verse_counts(book) else {
            warn!(
                "No verse counts for {:?} in the {:?} scheme; book skipped",
                book, scheme
            );
            continue;
        };
        linear.push((book, 0, 0));
        let mut chapter_offsets = Vec::with_capacity(counts.len() + 1);
        for (chapter0, &verses) in counts.iter().enumerate() {
            let chapter = (chapter0 + 1) as u16;
            if chapter == 1 {
                chapter_offsets.push(linear.len());
            }
            linear.push((book, chapter, 0));
            chapter_offsets.push(linear.len());
            for verse in 1..=verses {
                linear.push((book, chapter, verse));
            }
        }
        books.insert(
            book,
            BookSlots {
                testament,
                chapter_offsets,
                verse_counts: counts.to_vec(),
            },
        );
    }
    linear
}

/// The standard KJV chapter/verse counts for the 66-book canon.
pub struct KjvVerseCounts;

impl VerseCountSource for KjvVerseCounts {
    fn verse_counts(&self, book: &str) -> Option<&[u16]> {
        let counts: &[u16] = match book {
            "GEN" => &[
                31, 25, 24, 26, 32, 22, 24, 22, 29, 32, 32, 20, 18, 24, 21, 16, 27, 33, 38, 18,
                34, 24, 20, 67, 34, 35, 46, 22, 35, 43, 55, 32, 20, 31, 29, 43, 36, 30, 23, 23,
                57, 38, 34, 34, 28, 34, 31, 22, 33, 26,
            ],
            "EXO" => &[
                22, 25, 22, 31, 23, 30, 25, 32, 35, 29, 10, 51, 22, 31, 27, 36, 16, 27, 25, 26,
                36, 31, 33, 18, 40, 37, 21, 43, 46, 38, 18, 35, 23, 35, 35, 38, 29, 31, 43, 38,
            ],
            "LEV" => &[
                17, 16, 17, 35, 19, 30, 38, 36, 24, 20, 47, 8, 59, 57, 33, 34, 16, 30, 37, 27,
                24, 33, 44, 23, 55, 46, 34,
            ],
            "NUM" => &[
                54, 34, 51, 49, 31, 27, 89, 26, 23, 36, 35, 16, 33, 45, 41, 50, 13, 32, 22, 29,
                35, 41, 30, 25, 18, 65, 23, 31, 40, 16, 54, 42, 56, 29, 34, 13,
            ],
            "DEU" => &[
                46, 37, 29, 49, 33, 25, 26, 20, 29, 22, 32, 32, 18, 29, 23, 22, 20, 22, 21, 20,
                23, 30, 25, 22, 19, 19, 26, 68, 29, 20, 30, 52, 29, 12,
            ],
            "JOS" => &[
                18, 24, 17, 24, 15, 27, 26, 35, 27, 43, 23, 24, 33, 15, 63, 10, 18, 28, 51, 9,
                45, 34, 16, 33,
            ],
            "JDG" => &[
                36, 23, 31, 24, 31, 40, 25, 35, 57, 18, 40, 15, 25, 20, 20, 31, 13, 31, 30, 48,
                25,
            ],
            "RUT" => &[22, 23, 18, 22],
            "SA1" => &[
                28, 36, 21, 22, 12, 21, 17, 22, 27, 27, 15, 25, 23, 52, 35, 23, 58, 30, 24, 42,
                15, 23, 29, 22, 44, 25, 12, 25, 11, 31, 13,
            ],
            "SA2" => &[
                27, 32, 39, 12, 25, 23, 29, 18, 13, 19, 27, 31, 39, 33, 37, 23, 29, 33, 43, 26,
                22, 51, 39, 25,
            ],
            "KI1" => &[
                53, 46, 28, 34, 18, 38, 51, 66, 28, 29, 43, 33, 34, 31, 34, 34, 24, 46, 21, 43,
                29, 53,
            ],
            "KI2" => &[
                18, 25, 27, 44, 27, 33, 20, 29, 37, 36, 21, 21, 25, 29, 38, 20, 41, 37, 37, 21,
                26, 20, 37, 20, 30,
            ],
            "CH1" => &[
                54, 55, 24, 43, 26, 81, 40, 40, 44, 14, 47, 40, 14, 17, 29, 43, 27, 17, 19, 8,
                30, 19, 32, 31, 31, 32, 34, 21, 30,
            ],
            "CH2" => &[
                17, 18, 17, 22, 14, 42, 22, 18, 31, 19, 23, 16, 22, 15, 19, 14, 19, 34, 11, 37,
                20, 12, 21, 27, 28, 23, 9, 27, 36, 27, 21, 33, 25, 33, 27, 23,
            ],
            "EZR" => &[11, 70, 13, 24, 17, 22, 28, 36, 15, 44],
            "NEH" => &[11, 20, 32, 23, 19, 19, 73, 18, 38, 39, 36, 47, 31],
            "EST" => &[22, 23, 15, 17, 14, 14, 10, 17, 32, 3],
            "JOB" => &[
                22, 13, 26, 21, 27, 30, 21, 22, 35, 22, 20, 25, 28, 22, 35, 22, 16, 21, 29, 29,
                34, 30, 17, 25, 6, 14, 23, 28, 25, 31, 40, 22, 33, 37, 16, 33, 24, 41, 30, 24,
                34, 17,
            ],
            "PSA" => &[
                6, 12, 8, 8, 12, 10, 17, 9, 20, 18, 7, 8, 6, 7, 5, 11, 15, 50, 14, 9, 13, 31, 6,
                10, 22, 12, 14, 9, 11, 12, 24, 11, 22, 22, 28, 12, 40, 22, 13, 17, 13, 11, 5, 26,
                17, 11, 9, 14, 20, 23, 19, 9, 6, 7, 23, 13, 11, 11, 17, 12, 8, 12, 11, 10, 13,
                20, 7, 35, 36, 5, 24, 20, 28, 23, 10, 12, 20, 72, 13, 19, 16, 8, 18, 12, 13, 17,
                7, 18, 52, 17, 16, 15, 5, 23, 11, 13, 12, 9, 9, 5, 8, 28, 22, 35, 45, 48, 43, 13,
                31, 7, 10, 10, 9, 8, 18, 19, 2, 29, 176, 7, 8, 9, 4, 8, 5, 6, 5, 6, 8, 8, 3, 18,
                3, 3, 21, 26, 9, 8, 24, 13, 10, 7, 12, 15, 21, 10, 20, 14, 9, 6,
            ],
            "PRO" => &[
                33, 22, 35, 27, 23, 35, 27, 36, 18, 32, 31, 28, 25, 35, 33, 33, 28, 24, 29, 30,
                31, 29, 35, 34, 28, 28, 27, 28, 27, 33, 31,
            ],
            "ECC" => &[18, 26, 22, 16, 20, 12, 29, 17, 18, 20, 10, 14],
            "SNG" => &[17, 17, 11, 16, 16, 13, 13, 14],
            "ISA" => &[
                31, 22, 26, 6, 30, 13, 25, 22, 21, 34, 16, 6, 22, 32, 9, 14, 14, 7, 25, 6, 17,
                25, 18, 23, 12, 21, 13, 29, 24, 33, 9, 20, 24, 17, 10, 22, 38, 22, 8, 31, 29, 25,
                28, 28, 25, 13, 15, 22, 26, 11, 23, 15, 12, 17, 13, 12, 21, 14, 21, 22, 11, 12,
                19, 12, 25, 24,
            ],
            "JER" => &[
                19, 37, 25, 31, 31, 30, 34, 22, 26, 25, 23, 17, 27, 22, 21, 21, 27, 23, 15, 18,
                14, 30, 40, 10, 38, 24, 22, 17, 32, 24, 40, 44, 26, 22, 19, 32, 21, 28, 18, 16,
                18, 22, 13, 30, 5, 28, 7, 47, 39, 46, 64, 34,
            ],
            "LAM" => &[22, 22, 66, 22, 22],
            "EZE" => &[
                28, 10, 27, 17, 17, 14, 27, 18, 11, 22, 25, 28, 23, 23, 8, 63, 24, 32, 14, 49,
                32, 31, 49, 27, 17, 21, 36, 26, 21, 26, 18, 32, 33, 31, 15, 38, 28, 23, 29, 49,
                26, 20, 27, 31, 25, 24, 23, 35,
            ],
            "DAN" => &[21, 49, 30, 37, 31, 28, 28, 27, 27, 21, 45, 13],
            "HOS" => &[11, 23, 5, 19, 15, 11, 16, 14, 17, 15, 12, 14, 16, 9],
            "JOL" => &[20, 32, 21],
            "AMO" => &[15, 16, 15, 13, 27, 14, 17, 14, 15],
            "OBA" => &[21],
            "JNA" => &[17, 10, 10, 11],
            "MIC" => &[16, 13, 12, 13, 15, 16, 20],
            "NAH" => &[15, 13, 19],
            "HAB" => &[17, 20, 19],
            "ZEP" => &[18, 15, 20],
            "HAG" => &[15, 23],
            "ZEC" => &[21, 13, 10, 14, 11, 15, 14, 23, 17, 12, 17, 14, 9, 21],
            "MAL" => &[14, 17, 18, 6],
            "MAT" => &[
                25, 23, 17, 25, 48, 34, 29, 34, 38, 42, 30, 50, 58, 36, 39, 28, 27, 35, 30, 34,
                46, 46, 39, 51, 46, 75, 66, 20,
            ],
            "MRK" => &[45, 28, 35, 41, 43, 56, 37, 38, 50, 52, 33, 44, 37, 72, 47, 20],
            "LUK" => &[
                80, 52, 38, 44, 39, 49, 50, 56, 62, 42, 54, 59, 35, 35, 32, 31, 37, 43, 48, 47,
                38, 71, 56, 53,
            ],
            "JHN" => &[
                51, 25, 36, 54, 47, 71, 53, 59, 41, 42, 57, 50, 38, 31, 27, 33, 26, 40, 42, 31,
                25,
            ],
            "ACT" => &[
                26, 47, 26, 37, 42, 15, 60, 40, 43, 48, 30, 25, 52, 28, 41, 40, 34, 28, 41, 38,
                40, 30, 35, 27, 27, 32, 44, 31,
            ],
            "ROM" => &[32, 29, 31, 25, 21, 23, 25, 39, 33, 21, 36, 21, 14, 23, 33, 27],
            "CO1" => &[31, 16, 23, 21, 13, 20, 40, 13, 27, 33, 34, 31, 13, 40, 58, 24],
            "CO2" => &[24, 17, 18, 18, 21, 18, 16, 24, 15, 18, 33, 21, 14],
            "GAL" => &[24, 21, 29, 31, 26, 18],
            "EPH" => &[23, 22, 21, 32, 33, 24],
            "PHP" => &[30, 30, 21, 23],
            "COL" => &[29, 23, 25, 18],
            "TH1" => &[10, 20, 13, 18, 28],
            "TH2" => &[12, 17, 18],
            "TI1" => &[20, 15, 16, 16, 25, 21],
            "TI2" => &[18, 26, 17, 22],
            "TIT" => &[16, 15, 15],
            "PHM" => &[25],
            "HEB" => &[14, 18, 19, 16, 14, 20, 28, 13, 28, 39, 40, 29, 25],
            "JAM" => &[27, 26, 18, 17, 20],
            "PE1" => &[25, 25, 22, 19, 14],
            "PE2" => &[21, 22, 18],
            "JN1" => &[10, 29, 24, 21, 21],
            "JN2" => &[13],
            "JN3" => &[14],
            "JDE" => &[25],
            "REV" => &[
                20, 29, 22, 11, 14, 17, 17, 13, 21, 11, 19, 17, 18, 20, 8, 21, 18, 24, 21, 15,
                27, 21,
            ],
            _ => return None,
        };
        Some(counts)
    }
}
