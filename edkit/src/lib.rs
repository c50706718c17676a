//! Core engines for a tabbed source-code editor: rule-based syntax
//! highlighting, single-buffer find/replace, multi-file search/replace, and
//! the open-document registry that maps search hits back onto editor tabs.
//!
//! The GUI shell (windows, menus, the text widget itself) is a collaborator,
//! reached only through the [`buffer::TextBuffer`] trait and plain file I/O.

pub mod buffer;
pub mod buffer_search;
pub mod config;
pub mod errors;
pub mod file_search;
pub mod highlight;
pub mod query;
pub mod registry;
pub mod results;

pub use buffer::{ActiveDocumentProvider, PlainBuffer, TextBuffer};
pub use config::Settings;
pub use errors::{EditError, EditResult};
pub use file_search::FileFilters;
pub use highlight::{HighlightRule, HighlightRuleSet, Style, StyleSpan};
pub use query::{Direction, SearchQuery};
pub use registry::{OpenDocument, OpenDocumentRegistry, Resolution};
pub use results::{FileSearchOutput, SearchMatch};
