pub mod patch;

pub use patch::run as patch;
