//! Transform raw messages into indexable documents.

use ts_domain::message::{MessageDoc, MessageInput};

use crate::{dedup, normalizer};

/// Build the canonical indexable document for a raw message.
///
/// Pure: no I/O, and never fails. The document id is deterministic given
/// `chat_id` and `msg_id`; when the input has no URL but a channel
/// username is known, a permalink is synthesized.
pub fn transform(input: &MessageInput) -> MessageDoc {
    let text = input.text.clone().unwrap_or_default();
    let text_norm = normalizer::normalize(&text);
    let simp = normalizer::to_simplified(&text_norm);
    let trad = normalizer::to_traditional(&text_norm);
    let pinyin = normalizer::to_pinyin(&simp);
    let simhash = dedup::compute_simhash(&text_norm);

    let url = match input.url.as_deref().filter(|u| !u.is_empty()) {
        Some(u) => Some(u.to_owned()),
        None if !input.chat_username.is_empty() => Some(format!(
            "https://t.me/{}/{}",
            input.chat_username, input.msg_id
        )),
        None => None,
    };

    MessageDoc {
        id: format!("{}_{}", input.chat_id, input.msg_id),
        chat_id: input.chat_id,
        chat_title: input.chat_title.clone(),
        chat_username: input.chat_username.clone(),
        msg_id: input.msg_id,
        date: input.date,
        text,
        text_norm,
        pinyin,
        trad,
        simp,
        simhash,
        url,
        media_type: input.media_type.clone(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn input(text: &str) -> MessageInput {
        MessageInput {
            chat_id: 123,
            msg_id: 456,
            text: Some(text.into()),
            date: Utc::now(),
            chat_title: String::new(),
            chat_username: String::new(),
            url: None,
            media_type: None,
        }
    }

    #[test]
    fn id_is_deterministic() {
        let doc = transform(&input("hello there"));
        assert_eq!(doc.id, "123_456");
    }

    #[test]
    fn derived_fields_follow_the_normalized_text() {
        let doc = transform(&input("  hello   world  "));
        assert_eq!(doc.text_norm, "hello world");
        assert_eq!(doc.text_norm, normalizer::normalize(&doc.text));
        assert_eq!(doc.simhash, dedup::compute_simhash(&doc.text_norm));
    }

    #[test]
    fn url_synthesized_from_username() {
        let mut raw = input("hello there");
        raw.chat_username = "somechannel".into();
        let doc = transform(&raw);
        assert_eq!(doc.url.as_deref(), Some("https://t.me/somechannel/456"));
    }

    #[test]
    fn explicit_url_passes_through() {
        let mut raw = input("hello there");
        raw.chat_username = "somechannel".into();
        raw.url = Some("https://t.me/c/999/456".into());
        let doc = transform(&raw);
        assert_eq!(doc.url.as_deref(), Some("https://t.me/c/999/456"));
    }

    #[test]
    fn missing_username_leaves_url_empty() {
        let doc = transform(&input("hello there"));
        assert_eq!(doc.url, None);
    }

    #[test]
    fn chinese_variants_are_populated() {
        let doc = transform(&input("電腦很快"));
        assert_eq!(doc.simp, "电脑很快");
        assert_eq!(doc.trad, "電腦很快");
        assert!(!doc.pinyin.is_empty());
    }
}
