//! # Catalog Course Search
//!
//! Faceted search parameters for the course catalog: keeping the filters in
//! step with the browsable URL and the navigation history.
//!
//! ## Features
//!
//! - Query string ⇄ [`SearchParams`] codec with stable, sorted output
//! - Hierarchical facet values resolved from `L-`/`P-` path keys
//! - A pure reducer turning user [`Action`]s into new parameters
//! - A history bridge writing at most one entry per dispatch batch
//!
//! ## Example
//!
//! ```
//! use catalog_course_search::Action;
//! use catalog_course_search::FilterDefinition;
//! use catalog_course_search::HistoryBridge;
//! use catalog_course_search::HistoryWrite;
//! use catalog_course_search::MemoryHistory;
//! use catalog_course_search::SearchConfig;
//!
//! let history = MemoryHistory::new("/search?subjects=P-0005");
//! let (mut bridge, mounted) = HistoryBridge::mount(history, SearchConfig::default())?;
//! assert_eq!(mounted, HistoryWrite::Replace);
//!
//! let write = bridge.dispatch(vec![Action::FilterAdd {
//!     filter: FilterDefinition::multi("subjects", "Subjects"),
//!     payload: "L-000500013".to_string(),
//! }])?;
//! assert_eq!(write, HistoryWrite::Push);
//! assert_eq!(
//!     bridge.port().current().map(|entry| entry.url.as_str()),
//!     Some("/search?limit=20&offset=0&subjects=L-000500013")
//! );
//! # Ok::<(), catalog_course_search::HistoryError>(())
//! ```

pub mod catalog;
pub mod codec;
mod config;
mod error;
pub mod history;
pub mod path_key;
pub mod proto;
pub mod reducer;

pub use catalog::FilterCatalog;
pub use catalog::StaticFilterCatalog;
pub use codec::decode;
pub use codec::encode;
pub use config::SearchConfig;
pub use error::ConfigError;
pub use error::HistoryError;
pub use history::HistoryBridge;
pub use history::HistoryPort;
pub use history::HistoryWrite;
pub use history::MemoryHistory;
pub use proto::Action;
pub use proto::FilterDefinition;
pub use proto::FilterValue;
pub use proto::HistoryEntry;
pub use proto::HistoryState;
pub use proto::ParamValue;
pub use proto::SearchParams;
pub use reducer::reduce;
