//! Document filtering predicates.

use ts_domain::message::MessageDoc;

/// Default minimum text length (in characters) for indexing.
pub const DEFAULT_MIN_LEN: usize = 5;

/// Media type marking service messages (joins, pins, etc.).
const SERVICE_MEDIA_TYPE: &str = "service";

/// Boolean predicates over transformed documents. A document is indexed
/// only when every predicate holds.
#[derive(Debug, Default, Clone)]
pub struct MessageFilter;

impl MessageFilter {
    pub fn new() -> Self {
        Self
    }

    /// Reject empty or whitespace-only messages.
    pub fn filter_empty(&self, doc: &MessageDoc) -> bool {
        !doc.text.trim().is_empty()
    }

    /// Reject service messages. Producers usually drop these before they
    /// reach the pipeline; the check stays for robustness.
    pub fn filter_service(&self, doc: &MessageDoc) -> bool {
        doc.media_type.as_deref() != Some(SERVICE_MEDIA_TYPE)
    }

    /// Reject messages shorter than `min_len` characters after trimming.
    pub fn filter_by_length(&self, doc: &MessageDoc, min_len: usize) -> bool {
        doc.text.trim().chars().count() >= min_len
    }

    /// Apply every filter.
    pub fn apply_all(&self, doc: &MessageDoc, min_len: usize) -> bool {
        self.filter_empty(doc) && self.filter_service(doc) && self.filter_by_length(doc, min_len)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_doc() -> MessageDoc {
        MessageDoc {
            id: "123_456".into(),
            chat_id: 123,
            chat_title: String::new(),
            chat_username: String::new(),
            msg_id: 456,
            date: Utc::now(),
            text: "Hello world".into(),
            text_norm: "hello world".into(),
            pinyin: "hello world".into(),
            trad: String::new(),
            simp: String::new(),
            simhash: "abc".into(),
            url: None,
            media_type: None,
        }
    }

    #[test]
    fn empty_filter() {
        let filter = MessageFilter::new();
        let mut doc = sample_doc();
        assert!(filter.filter_empty(&doc));

        doc.text = String::new();
        assert!(!filter.filter_empty(&doc));

        doc.text = "   ".into();
        assert!(!filter.filter_empty(&doc));
    }

    #[test]
    fn service_filter() {
        let filter = MessageFilter::new();
        let mut doc = sample_doc();
        assert!(filter.filter_service(&doc));

        doc.media_type = Some("service".into());
        assert!(!filter.filter_service(&doc));
    }

    #[test]
    fn length_filter() {
        let filter = MessageFilter::new();
        let mut doc = sample_doc();

        doc.text = "Hi".into();
        assert!(!filter.filter_by_length(&doc, 5));

        doc.text = "Hello".into();
        assert!(filter.filter_by_length(&doc, 5));

        doc.text = String::new();
        assert!(!filter.filter_by_length(&doc, 5));
    }

    #[test]
    fn apply_all_is_a_conjunction() {
        let filter = MessageFilter::new();
        let mut doc = sample_doc();
        assert!(filter.apply_all(&doc, DEFAULT_MIN_LEN));

        doc.text = "Hi".into();
        assert!(!filter.apply_all(&doc, DEFAULT_MIN_LEN));

        doc.text = String::new();
        assert!(!filter.apply_all(&doc, DEFAULT_MIN_LEN));

        doc.text = "Valid text".into();
        doc.media_type = Some("service".into());
        assert!(!filter.apply_all(&doc, DEFAULT_MIN_LEN));
    }
}
