//! Section catalogs: the fixed skeleton of a patent application draft.
//!
//! A catalog decides which fragment files make up a document, in what order
//! they appear and what title precedes each. Two static variants exist:
//! [`SectionCatalog::plain`] for clean concatenation and
//! [`SectionCatalog::placeholder`] for a filing-order draft whose titles carry
//! umbrella headings and bracketed gaps for a human to fill in.

use patentdraft_shared::SectionDescriptor;

pub const BACKGROUND_FILE: &str = "01_背景技术.md";
pub const CLAIMS_FILE: &str = "02_权利要求书.md";
pub const EFFECTS_FILE: &str = "03_有益效果.md";
pub const EMBODIMENT_FILE: &str = "04_具体实施方式.md";
pub const ABSTRACT_FILE: &str = "05_摘要.md";

/// Suffix appended to the claims file stem for the split-off explanation.
pub const EXPLANATION_SUFFIX: &str = "_解释";

/// Generation order, short titles.
static PLAIN_SECTIONS: [SectionDescriptor; 5] = [
    SectionDescriptor::required(BACKGROUND_FILE, "背景技术"),
    SectionDescriptor::required(CLAIMS_FILE, "权利要求书"),
    SectionDescriptor::required(EFFECTS_FILE, "有益效果"),
    SectionDescriptor::required(EMBODIMENT_FILE, "具体实施方式"),
    SectionDescriptor::required(ABSTRACT_FILE, "摘要"),
];

/// Filing order, with umbrella headings and placeholders.
static PLACEHOLDER_SECTIONS: [SectionDescriptor; 5] = [
    SectionDescriptor::required(ABSTRACT_FILE, "摘要"),
    SectionDescriptor::required(CLAIMS_FILE, "权利要求书"),
    SectionDescriptor::required(BACKGROUND_FILE, "技术领域\n\n[待补充]\n\n## 背景技术"),
    SectionDescriptor::required(
        EFFECTS_FILE,
        "发明内容\n\n[技术问题待补充]\n\n[技术方案待补充]\n\n### 有益效果",
    ),
    SectionDescriptor::required(EMBODIMENT_FILE, "具体实施方式"),
];

/// An ordered, immutable list of section descriptors.
#[derive(Debug, Clone, Copy)]
pub struct SectionCatalog {
    sections: &'static [SectionDescriptor],
}

impl SectionCatalog {
    pub const fn new(sections: &'static [SectionDescriptor]) -> Self {
        Self { sections }
    }

    /// Short-title catalog used for plain concatenation.
    pub fn plain() -> Self {
        Self::new(&PLAIN_SECTIONS)
    }

    /// Placeholder-title catalog used for the filing-order draft.
    pub fn placeholder() -> Self {
        Self::new(&PLACEHOLDER_SECTIONS)
    }

    pub fn sections(&self) -> &'static [SectionDescriptor] {
        self.sections
    }

    pub fn get(&self, filename: &str) -> Option<&'static SectionDescriptor> {
        self.sections.iter().find(|s| s.filename == filename)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn catalogs_cover_the_same_files() {
        let plain: HashSet<_> = SectionCatalog::plain().sections().iter().map(|s| s.filename).collect();
        let placeholder: HashSet<_> = SectionCatalog::placeholder()
            .sections()
            .iter()
            .map(|s| s.filename)
            .collect();

        assert_eq!(plain.len(), 5, "filenames must be unique");
        assert_eq!(plain, placeholder);
    }

    #[test]
    fn placeholder_catalog_is_in_filing_order() {
        let order: Vec<_> = SectionCatalog::placeholder()
            .sections()
            .iter()
            .map(|s| s.filename)
            .collect();
        assert_eq!(
            order,
            [ABSTRACT_FILE, CLAIMS_FILE, BACKGROUND_FILE, EFFECTS_FILE, EMBODIMENT_FILE]
        );
    }

    #[test]
    fn placeholder_titles_carry_umbrella_headings() {
        let catalog = SectionCatalog::placeholder();

        let background = catalog.get(BACKGROUND_FILE).unwrap();
        assert!(background.title.starts_with("技术领域"));
        assert!(background.title.ends_with("## 背景技术"));

        let effects = catalog.get(EFFECTS_FILE).unwrap();
        assert!(effects.title.contains("[技术问题待补充]"));
        assert!(effects.title.contains("[技术方案待补充]"));
        assert!(effects.title.ends_with("### 有益效果"));
    }

    #[test]
    fn every_section_is_required() {
        assert!(SectionCatalog::plain().sections().iter().all(|s| s.required));
        assert!(SectionCatalog::placeholder().sections().iter().all(|s| s.required));
    }

    #[test]
    fn lookup_by_filename() {
        assert_eq!(SectionCatalog::plain().get(CLAIMS_FILE).unwrap().title, "权利要求书");
        assert!(SectionCatalog::plain().get("99_unknown.md").is_none());
    }
}
