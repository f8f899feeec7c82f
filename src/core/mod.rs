pub mod types;
pub mod constants;
pub mod catalog;

pub use types::*;
pub use constants::*;
