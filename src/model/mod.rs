pub mod config;
pub mod entity;
pub mod timeline;
pub mod view;

pub use config::*;
pub use entity::*;
pub use timeline::*;
pub use view::*;
