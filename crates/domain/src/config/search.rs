use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size used when the caller does not specify one.
    #[serde(default = "d_default_limit")]
    pub default_limit: usize,
    /// Hard cap on the page size a caller may request.
    #[serde(default = "d_max_limit")]
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: d_default_limit(),
            max_limit: d_max_limit(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_default_limit() -> usize {
    20
}
fn d_max_limit() -> usize {
    100
}
