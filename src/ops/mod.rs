pub mod decorate;
pub mod hierarchy;
pub mod load;

pub use hierarchy::HierarchyStore;
pub use load::Loader;
