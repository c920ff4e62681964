//! Match metadata loading and roster resolution

pub mod resolver;
pub mod source;

pub use resolver::*;
pub use source::*;
