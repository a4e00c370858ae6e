//! Assemble a program → project → milestone → task hierarchy from records
//! that arrive in any order, and flatten it for a timeline renderer.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod render;
