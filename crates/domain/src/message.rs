//! Message models: the raw producer record and the indexable document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Producer record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A raw message as delivered by a producer (historical backfill,
/// realtime events, file import). Producers guarantee no ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInput {
    pub chat_id: i64,
    pub msg_id: i64,
    #[serde(default)]
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub chat_title: String,
    #[serde(default)]
    pub chat_username: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Indexable document
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The canonical document produced by the transform pipeline and stored
/// in the search index. `id` is the engine's primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDoc {
    /// `"{chat_id}_{msg_id}"`, globally unique.
    pub id: String,
    pub chat_id: i64,
    #[serde(default)]
    pub chat_title: String,
    #[serde(default)]
    pub chat_username: String,
    pub msg_id: i64,
    pub date: DateTime<Utc>,
    /// Original text, as received.
    #[serde(default)]
    pub text: String,
    /// NFC-normalized, whitespace-collapsed text.
    #[serde(default)]
    pub text_norm: String,
    /// Pinyin romanization of the simplified form.
    #[serde(default)]
    pub pinyin: String,
    /// Traditional Chinese variant of `text_norm`.
    #[serde(default)]
    pub trad: String,
    /// Simplified Chinese variant of `text_norm`.
    #[serde(default)]
    pub simp: String,
    /// Simhash fingerprint of `text_norm`, hex string.
    #[serde(default)]
    pub simhash: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
}

impl MessageDoc {
    /// The document as sent to the search index. `date` is flattened to
    /// Unix seconds so range filters compare integers.
    pub fn to_index_value(&self) -> Value {
        json!({
            "id": self.id,
            "chat_id": self.chat_id,
            "chat_title": self.chat_title,
            "chat_username": self.chat_username,
            "msg_id": self.msg_id,
            "date": self.date.timestamp(),
            "text": self.text,
            "text_norm": self.text_norm,
            "pinyin": self.pinyin,
            "trad": self.trad,
            "simp": self.simp,
            "simhash": self.simhash,
            "url": self.url,
            "media_type": self.media_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn index_value_flattens_date_to_unix_seconds() {
        let doc = MessageDoc {
            id: "123_456".into(),
            chat_id: 123,
            chat_title: String::new(),
            chat_username: String::new(),
            msg_id: 456,
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            text: "hello".into(),
            text_norm: "hello".into(),
            pinyin: String::new(),
            trad: String::new(),
            simp: String::new(),
            simhash: "0".into(),
            url: None,
            media_type: None,
        };

        let value = doc.to_index_value();
        assert_eq!(value["id"], "123_456");
        assert_eq!(value["date"], 1_704_067_200i64);
        assert!(value["url"].is_null());
    }
}
