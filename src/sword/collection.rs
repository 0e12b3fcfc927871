//! Discovery and cataloging of the modules under Sword search roots.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::config::ModuleConfig;
use super::error::{Result, SwordError};
use super::models::{Category, DriverType, EntryValue, LoadMode};
use super::{SwordBackend, SwordModule};

#[derive(Debug)]
struct CatalogEntry {
    /// The search root the module was found under; data paths resolve
    /// against it.
    root: PathBuf,
    config: ModuleConfig,
}

/// A catalog of the modules found under one or more Sword installation
/// roots, indexed by abbreviation, category, driver type, language and
/// declared feature.
///
/// Roots are scanned in the order they were added; when two roots carry
/// the same abbreviation, the first one found wins.
#[derive(Debug, Default)]
pub struct SwordCollection {
    roots: Vec<PathBuf>,
    modules: BTreeMap<String, CatalogEntry>,
    by_category: BTreeMap<Category, Vec<String>>,
    by_driver: BTreeMap<DriverType, Vec<String>>,
    by_language: BTreeMap<String, Vec<String>>,
    by_feature: BTreeMap<String, Vec<String>>,
}

impl SwordCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    pub fn add_search_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Scan every root's `mods.d/` folder and rebuild the whole catalog
    /// from scratch. A malformed conf file excludes that one module only.
    /// Returns the number of cataloged modules.
    pub fn discover(&mut self) -> Result<usize> {
        self.modules.clear();
        for root in &self.roots {
            let mods_d = root.join("mods.d");
            let entries = match fs::read_dir(&mods_d) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cannot scan {}: {}", mods_d.display(), e);
                    continue;
                }
            };
            // Directory order is platform-dependent; sort for a
            // deterministic catalog.
            let mut conf_paths: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "conf"))
                .collect();
            conf_paths.sort();

            for path in conf_paths {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if stem == "globals" {
                    // globals.conf describes the installation, not a module.
                    continue;
                }
                let abbreviation = stem.to_lowercase();
                if self.modules.contains_key(&abbreviation) {
                    info!(
                        "Ignoring duplicate module {:?} in {} (first found wins)",
                        abbreviation,
                        root.display()
                    );
                    continue;
                }
                let bytes = match fs::read(&path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Cannot read {}: {}", path.display(), e);
                        continue;
                    }
                };
                match ModuleConfig::parse(&abbreviation, &bytes) {
                    Ok(config) => {
                        debug!("Cataloged {:?} from {}", abbreviation, root.display());
                        self.modules.insert(
                            abbreviation,
                            CatalogEntry {
                                root: root.clone(),
                                config,
                            },
                        );
                    }
                    Err(e) => {
                        warn!("Skipping unusable module {:?}: {}", abbreviation, e);
                    }
                }
            }
        }
        self.rebuild_indices();
        info!("Discovered {} Sword modules", self.modules.len());
        Ok(self.modules.len())
    }

    fn rebuild_indices(&mut self) {
        self.by_category.clear();
        self.by_driver.clear();
        self.by_language.clear();
        self.by_feature.clear();
        for (abbreviation, entry) in &self.modules {
            let config = &entry.config;
            self.by_category
                .entry(config.category)
                .or_default()
                .push(abbreviation.clone());
            self.by_driver
                .entry(config.driver)
                .or_default()
                .push(abbreviation.clone());
            if let Some(language) = config.language() {
                self.by_language
                    .entry(language.to_string())
                    .or_default()
                    .push(abbreviation.clone());
            }
            for feature in config.features() {
                self.by_feature
                    .entry(feature.to_string())
                    .or_default()
                    .push(abbreviation.clone());
            }
        }
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn abbreviations(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Case-insensitive lookup by abbreviation or by display name.
    pub fn config(&self, name: &str) -> Option<&ModuleConfig> {
        let lowered = name.to_lowercase();
        if let Some(entry) = self.modules.get(&lowered) {
            return Some(&entry.config);
        }
        self.modules
            .values()
            .find(|entry| entry.config.name.to_lowercase() == lowered)
            .map(|entry| &entry.config)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.by_category.keys().copied()
    }

    pub fn modules_in_category(&self, category: Category) -> &[String] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn modules_with_driver(&self, driver: DriverType) -> &[String] {
        self.by_driver
            .get(&driver)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.by_language.keys().map(String::as_str)
    }

    pub fn modules_in_language(&self, language: &str) -> &[String] {
        self.by_language
            .get(language)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn modules_with_feature(&self, feature: &str) -> &[String] {
        self.by_feature
            .get(feature)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Load a cataloged module against the root it was discovered under.
    pub fn open(&self, name: &str, mode: LoadMode) -> Result<SwordModule> {
        let lowered = name.to_lowercase();
        let entry = match self.modules.get(&lowered) {
            Some(entry) => entry,
            None => self
                .modules
                .values()
                .find(|entry| entry.config.name.to_lowercase() == lowered)
                .ok_or_else(|| SwordError::UnknownModule(name.to_string()))?,
        };
        SwordModule::load(entry.config.clone(), &entry.root, mode)
    }

    pub fn search_roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl SwordBackend for SwordCollection {
    type Handle = SwordModule;

    fn list_modules(&self, type_filter: Option<&[&str]>) -> Vec<(String, DriverType)> {
        self.modules
            .iter()
            .filter(|(_, entry)| {
                type_filter.map_or(true, |wanted| {
                    wanted.iter().any(|name| {
                        name.eq_ignore_ascii_case(entry.config.driver.as_str())
                            || name.eq_ignore_ascii_case(entry.config.driver.generic_name())
                    })
                })
            })
            .map(|(abbreviation, entry)| (abbreviation.clone(), entry.config.driver))
            .collect()
    }

    fn open_module(&self, abbreviation: &str, mode: LoadMode) -> Result<SwordModule> {
        self.open(abbreviation, mode)
    }

    fn verse(
        &self,
        handle: &SwordModule,
        book: &str,
        chapter: u16,
        verse: u16,
    ) -> Option<String> {
        handle.verse(book, chapter, verse)
    }

    fn entry(&self, handle: &SwordModule, key: &str) -> Option<EntryValue> {
        handle.entry(key)
    }
}

impl Extend<PathBuf> for SwordCollection {
    fn extend<T: IntoIterator<Item = PathBuf>>(&mut self, roots: T) {
        self.roots.extend(roots);
    }
}

impl<'a> Extend<&'a Path> for SwordCollection {
    fn extend<T: IntoIterator<Item = &'a Path>>(&mut self, roots: T) {
        self.roots.extend(roots.into_iter().map(Path::to_path_buf));
    }
}
