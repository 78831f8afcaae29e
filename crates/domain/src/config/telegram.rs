use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::{env_parse, env_set};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Telegram
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot token for the search bot front-end.
    #[serde(default)]
    pub bot_token: String,
    /// MTProto API id. Required for crawling.
    #[serde(default)]
    pub api_id: i64,
    /// MTProto API hash. Required for crawling.
    #[serde(default)]
    pub api_hash: String,
}

impl TelegramConfig {
    pub(super) fn overlay(&mut self, get: &impl Fn(&str) -> Option<String>) -> Result<()> {
        env_set(get, "TELEGRAM_BOT_TOKEN", &mut self.bot_token);
        env_parse(get, "TELEGRAM_API_ID", &mut self.api_id)?;
        env_set(get, "TELEGRAM_API_HASH", &mut self.api_hash);
        Ok(())
    }
}
