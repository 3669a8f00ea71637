use crate::core::error::LabelError;
use crate::models::label::LabelEntry;
use std::collections::BTreeMap;
use std::path::Path;

/// Static class-index to label mapping, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct LabelTable {
    entries: BTreeMap<usize, LabelEntry>,
}

impl LabelTable {
    /// The nine-class pest taxonomy the published model was trained on
    pub fn builtin() -> Self {
        let entries = [
            (0, "Aphid", "Pyrethroids", "aphid"),
            (1, "Armyworm", "Bacillus thuringiensis", "armyworm"),
            (2, "Caterpillar", "Insecticidal Soap", "caterpillar"),
            (3, "Whitefly", "Neem Oil", "whitefly"),
            (4, "Thrips", "Spinosad", "thrips"),
            (5, "Leafhopper", "Malathion", "leafhopper"),
            (6, "Root Knot Nematode", "Fumigants", "root_knot_nematode"),
            (7, "Cucumber Beetle", "Diazinon", "cucumber_beetle"),
            (8, "Aphid (Green)", "Chlorpyrifos", "green_aphid"),
        ]
        .into_iter()
        .map(|(index, pest, pesticide, slug)| {
            let entry = LabelEntry::new(
                index,
                pest,
                pesticide,
                format!("pesticide_images/{slug}_pesticide.jpg"),
            );
            (index, entry)
        })
        .collect();

        Self { entries }
    }

    pub fn from_entries(entries: Vec<LabelEntry>) -> Result<Self, LabelError> {
        let mut map = BTreeMap::new();
        for entry in entries {
            let index = entry.index;
            if map.insert(index, entry).is_some() {
                return Err(LabelError::DuplicateIndex(index));
            }
        }

        Ok(Self { entries: map })
    }

    /// Load a JSON array of `{index, pest, pesticide, image}` objects
    pub fn from_file(path: &Path) -> Result<Self, LabelError> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<LabelEntry> = serde_json::from_str(&content)?;
        Self::from_entries(entries)
    }

    /// None means the index is outside the table, which callers report
    /// as an unrecognized pest rather than an error
    pub fn resolve(&self, class_index: usize) -> Option<&LabelEntry> {
        self.entries.get(&class_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabelEntry> {
        self.entries.values()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::builtin()
    }
}
