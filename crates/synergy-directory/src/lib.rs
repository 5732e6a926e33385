//! Synergy Directory
//!
//! The Pi-ready company directory: companies grouped by category, with
//! search, headline stats and a load-time integrity check.
//!
//! The full dataset is embedded in the binary; [`Directory::from_path`]
//! loads a replacement from disk.
//!
//! ```
//! use synergy_directory::Directory;
//!
//! let dir = Directory::builtin().unwrap();
//! let hits = dir.search("amazon", None);
//! assert!(hits.iter().any(|m| m.company.domain == "amazon.com"));
//! ```

mod company;
mod directory;
mod error;

pub use company::{parse_revenue, Category, Company};
pub use directory::{
    CategoryCount, CompanyMatch, Directory, DirectoryStats, IntegrityReport, ALL_CATEGORIES,
    BUILTIN_COMPANY_COUNT,
};
pub use error::{Error, Result};
