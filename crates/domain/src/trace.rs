use serde::Serialize;

/// Structured trace events emitted across all telsearch crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    EngineCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    BatchIngested {
        channel_id: i64,
        submitted: usize,
        accepted: usize,
    },
    CheckpointAdvanced {
        channel_id: i64,
        last_msg_id: i64,
    },
    CacheLookup {
        hit: bool,
    },
    FloodWait {
        channel_id: i64,
        seconds: u64,
    },
    SearchServed {
        query_chars: usize,
        limit: usize,
        offset: usize,
        cached: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ts_event");
    }
}
