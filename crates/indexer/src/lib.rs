//! Ingest side of the system: message producers (historical backfill,
//! realtime events, file imports), the ingest service that feeds the
//! search engine, checkpoint state, and the channel registry.

pub mod client;
pub mod historical;
pub mod import;
pub mod ingest;
pub mod realtime;
pub mod registry;
pub mod state;

pub use client::{ChatClient, ImportChatClient};
pub use historical::HistoricalSync;
pub use ingest::{IngestResult, IngestService};
pub use realtime::RealtimeListener;
pub use registry::{Channel, ChannelRegistry};
pub use state::StateStore;
