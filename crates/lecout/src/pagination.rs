// Pagination Engine
//
// *La Page* (The Page) - Offset pagination over a deterministically ordered
// sequence, with the offset carried in an opaque continuation token.

use crate::error::{CoutError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Page size used when the caller asks for zero or a negative size
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Maximum accepted token length before decoding is attempted
const MAX_TOKEN_LEN: usize = 64;

/// Reversible mapping between offsets and page tokens.
///
/// Callers depend only on this pair, never on a concrete token layout.
/// Implementations must satisfy `decode(encode(n)) == n` for every `n` and
/// `encode(decode(t)) == t` for every token `decode` accepts.
pub trait PageTokenCodec {
    /// Encode an offset
    fn encode(&self, offset: usize) -> String;

    /// Decode a token produced by [`PageTokenCodec::encode`]
    fn decode(&self, token: &str) -> Result<usize>;
}

/// Base64 of the decimal offset
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64OffsetCodec;

impl PageTokenCodec for Base64OffsetCodec {
    fn encode(&self, offset: usize) -> String {
        STANDARD.encode(offset.to_string())
    }

    fn decode(&self, token: &str) -> Result<usize> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(CoutError::invalid_token(token, "token exceeds max length"));
        }

        let bytes = STANDARD
            .decode(token)
            .map_err(|e| CoutError::invalid_token(token, format!("not base64: {e}")))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| CoutError::invalid_token(token, "payload is not UTF-8"))?;

        let offset: usize = text
            .parse()
            .map_err(|_| CoutError::invalid_token(token, "payload is not a non-negative integer"))?;

        // Reject "007" or "+7" so every accepted token is the canonical encoding.
        if offset.to_string() != text {
            return Err(CoutError::invalid_token(token, "payload is not canonical"));
        }

        Ok(offset)
    }
}

/// One page of a paginated sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page
    pub items: Vec<T>,
    /// Token for the following page; empty when this is the last page
    pub next_page_token: String,
    /// Offset of the first record on this page
    pub offset: usize,
    /// Length of the whole sequence
    pub total: usize,
}

impl<T> Page<T> {
    /// Whether another page follows
    pub fn has_more(&self) -> bool {
        !self.next_page_token.is_empty()
    }
}

/// Paginate with the default [`Base64OffsetCodec`].
pub fn paginate<T: Clone>(records: &[T], page_size: i32, page_token: &str) -> Result<Page<T>> {
    paginate_with(&Base64OffsetCodec, records, page_size, page_token)
}

/// Paginate `records` starting at the offset carried by `page_token`.
///
/// An empty token starts at offset zero. An offset at or past the end yields
/// an empty page and an empty next token.
pub fn paginate_with<T: Clone, C: PageTokenCodec + ?Sized>(
    codec: &C,
    records: &[T],
    page_size: i32,
    page_token: &str,
) -> Result<Page<T>> {
    let page_size = effective_page_size(page_size);
    let offset = if page_token.is_empty() {
        0
    } else {
        codec.decode(page_token)?
    };
    let total = records.len();

    if offset >= total {
        return Ok(Page {
            items: Vec::new(),
            next_page_token: String::new(),
            offset,
            total,
        });
    }

    let end = offset.saturating_add(page_size).min(total);
    let next_page_token = if end < total {
        codec.encode(end)
    } else {
        String::new()
    };

    Ok(Page {
        items: records[offset..end].to_vec(),
        next_page_token,
        offset,
        total,
    })
}

/// Resolve a requested page size, substituting the default for non-positive values
pub fn effective_page_size(page_size: i32) -> usize {
    if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_page_and_token() {
        let records: Vec<u32> = (0..10).collect();
        let page = paginate(&records, 4, "").unwrap();
        assert_eq!(page.items, vec![0, 1, 2, 3]);
        assert!(page.has_more());

        let next = paginate(&records, 4, &page.next_page_token).unwrap();
        assert_eq!(next.items, vec![4, 5, 6, 7]);
        assert_eq!(next.offset, 4);
    }

    #[test]
    fn test_non_positive_page_size_uses_default() {
        let records: Vec<u32> = (0..120).collect();
        assert_eq!(paginate(&records, 0, "").unwrap().items.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(paginate(&records, -3, "").unwrap().items.len(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_offset_at_or_past_end_is_terminal() {
        let records: Vec<u32> = (0..5).collect();
        let codec = Base64OffsetCodec;

        for offset in [5, 6, 1_000] {
            let page = paginate(&records, 10, &codec.encode(offset)).unwrap();
            assert!(page.items.is_empty());
            assert!(page.next_page_token.is_empty());
        }
    }

    #[test]
    fn test_empty_sequence() {
        let records: Vec<u32> = Vec::new();
        let page = paginate(&records, 10, "").unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_more());
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let records: Vec<u32> = (0..5).collect();
        let codec = Base64OffsetCodec;
        let bad = [
            "not-base64!!".to_string(),
            STANDARD.encode("-1"),
            STANDARD.encode("abc"),
            STANDARD.encode("007"),
            STANDARD.encode("+7"),
            "A".repeat(100),
        ];
        for token in bad {
            let err = paginate(&records, 2, &token).unwrap_err();
            assert!(matches!(err, CoutError::InvalidToken { .. }), "{token}");
            assert!(codec.decode(&token).is_err());
        }
    }

    #[test]
    fn test_three_pages_of_120() {
        let records: Vec<u32> = (0..120).collect();
        let p1 = paginate(&records, 50, "").unwrap();
        assert_eq!(p1.items.len(), 50);
        assert!(!p1.next_page_token.is_empty());

        let p2 = paginate(&records, 50, &p1.next_page_token).unwrap();
        assert_eq!(p2.items.len(), 50);
        assert!(!p2.next_page_token.is_empty());

        let p3 = paginate(&records, 50, &p2.next_page_token).unwrap();
        assert_eq!(p3.items.len(), 20);
        assert!(p3.next_page_token.is_empty());
    }

    proptest! {
        #[test]
        fn prop_offset_roundtrip(offset in 0usize..usize::MAX) {
            let codec = Base64OffsetCodec;
            prop_assert_eq!(codec.decode(&codec.encode(offset)).unwrap(), offset);
        }

        #[test]
        fn prop_token_roundtrip(offset in 0usize..1_000_000) {
            let codec = Base64OffsetCodec;
            let token = codec.encode(offset);
            let decoded = codec.decode(&token).unwrap();
            prop_assert_eq!(codec.encode(decoded), token);
        }

        #[test]
        fn prop_pages_reassemble_sequence(len in 0usize..400, page_size in 1i32..70) {
            let records: Vec<usize> = (0..len).collect();
            let mut collected = Vec::new();
            let mut token = String::new();
            loop {
                let page = paginate(&records, page_size, &token).unwrap();
                collected.extend(page.items);
                if page.next_page_token.is_empty() {
                    break;
                }
                token = page.next_page_token;
            }
            prop_assert_eq!(collected, records);
        }
    }
}
