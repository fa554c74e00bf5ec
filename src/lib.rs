// Metis Backend - Core Library
// Exposes all modules for use in the CLI, the API server, and tests

pub mod config;
pub mod error;
pub mod graduates;
pub mod items;
pub mod logging;
pub mod spreadsheet;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{Config, CorsOrigins, LogFormat};
pub use error::{MetisError, Result};
pub use graduates::{CacheState, GraduateReader, GraduateRow};
pub use items::{Item, ItemRegistry, ItemUpdate, NewItem};
pub use logging::init_logging;
pub use spreadsheet::{AutoSource, Cell, CsvSource, SheetRow, SheetSource, WorkbookSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
