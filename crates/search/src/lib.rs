//! Read path: advanced query parsing and the cache-aside search
//! service.

pub mod parser;
pub mod service;

pub use parser::{build_filters, parse_query, ParsedQuery};
pub use service::{SearchOptions, SearchService};
