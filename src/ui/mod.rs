//! Terminal-facing helpers

pub mod logger;

pub use logger::init_logger;
