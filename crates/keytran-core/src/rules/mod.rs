// Keytran Rules Module
// Rule groups, elements, and the apply engine

pub mod element;
pub mod engine;
pub mod reorder;
pub mod transform;

pub use element::{Element, ElementKind, ElementList, SortKey, SortKeys};
pub use engine::{AnyGroup, Applied, Transforms};
pub use reorder::{ReorderEntry, ReorderGroup};
pub use transform::{TransformEntry, TransformGroup};
