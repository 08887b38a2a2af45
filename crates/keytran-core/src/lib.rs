// Keytran Core Library
// LDML keyboard transform and reorder rule engine

pub mod config;
pub mod rules;
pub mod uset;

pub use config::{RuleError, RuleFile};
pub use rules::element::{Element, ElementKind, ElementList, SortKey, SortKeys};
pub use rules::engine::{AnyGroup, Applied, Transforms};
pub use rules::reorder::{ReorderEntry, ReorderGroup};
pub use rules::transform::{TransformEntry, TransformGroup};
pub use uset::UnicodeSet;
