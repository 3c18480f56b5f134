//! Domain logic for patentdraft.
//!
//! Section catalogs, fragment loading, draft assembly, claims splitting,
//! document conversion and section generation. The CLI is a thin layer over
//! the functions exported here.

pub mod assembler;
pub mod catalog;
pub mod claims;
pub mod convert;
pub mod draft;
pub mod loader;
pub mod render;

pub use assembler::{AssembledDocument, DocumentAssembler, DraftStyle, assemble_case, case_identifier};
pub use catalog::SectionCatalog;
pub use claims::{DelimiterRule, split_claims};
pub use render::{PlaceholderPolicy, PlainPolicy, RenderPolicy};
