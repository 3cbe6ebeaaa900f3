//! Output generation for a curation run.
//!
//! # Submodules
//!
//! - [`json`]: writes the classified and rejected dumps, the per-bucket files and the selection
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── classified_articles.json
//!     ├── rejected_articles.json
//!     ├── selected_articles.json
//!     └── categorized/
//!         ├── global_startup.json
//!         ├── global_fintech.json
//!         └── east_asia_blockchain.json
//! ```

pub mod json;
