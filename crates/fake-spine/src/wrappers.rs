//! # Matcher Helpers
//!
//! Ready-made predicates for SOAP requests.

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::errors::MatcherError;
use crate::matching::RequestMatcher;

/// WS-Addressing namespace holding the `MessageID` header.
pub const WS_ADDRESSING_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";

fn is_message_id(ns: &ResolveResult<'_>, local_name: &[u8]) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == WS_ADDRESSING_NS.as_bytes())
        && local_name == b"MessageID"
}

fn malformed(e: impl std::fmt::Display) -> MatcherError {
    MatcherError::MalformedXml(e.to_string())
}

/// Whether the first WS-Addressing `MessageID` below the root of `body` is
/// `uuid:<message_id>`.
///
/// The whole document is parsed, so a body that is malformed anywhere is an
/// error even when the `MessageID` itself matched. The element's value is
/// its text and CDATA up to its first child. Returns `Ok(false)` when the
/// body has no such element.
pub fn body_contains_message_id(body: &str, message_id: &str) -> Result<bool, MatcherError> {
    let expected = format!("uuid:{}", message_id);
    let mut reader = NsReader::from_str(body);
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut collecting = false;
    let mut found: Option<String> = None;

    loop {
        let (ns, event) = reader.read_resolved_event().map_err(malformed)?;

        match event {
            Event::Start(element) => {
                collecting = false;
                if depth == 0 && seen_root {
                    return Err(malformed("content after the root element"));
                }
                if found.is_none()
                    && depth > 0
                    && is_message_id(&ns, element.local_name().as_ref())
                {
                    found = Some(String::new());
                    collecting = true;
                }
                depth += 1;
                seen_root = true;
            }
            Event::Empty(element) => {
                collecting = false;
                if depth == 0 && seen_root {
                    return Err(malformed("content after the root element"));
                }
                if found.is_none()
                    && depth > 0
                    && is_message_id(&ns, element.local_name().as_ref())
                {
                    found = Some(String::new());
                }
                seen_root = true;
            }
            Event::End(_) => {
                collecting = false;
                depth = depth.saturating_sub(1);
            }
            Event::Text(text) if collecting => {
                let value = text.unescape().map_err(malformed)?;
                if let Some(found) = found.as_mut() {
                    found.push_str(&value);
                }
            }
            Event::CData(data) if collecting => {
                let value = std::str::from_utf8(&data).map_err(malformed)?;
                if let Some(found) = found.as_mut() {
                    found.push_str(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(malformed("no root element"));
    }
    if depth > 0 {
        return Err(malformed("unclosed element at end of document"));
    }

    match found {
        Some(value) => {
            tracing::info!(value = %value, "Element matching MessageID found");
            Ok(value == expected)
        }
        None => {
            tracing::info!(message_id, "Message id not found");
            Ok(false)
        }
    }
}

/// Matcher accepting requests whose SOAP body carries `message_id`.
pub fn message_id_matcher(
    unique_identifier: impl Into<String>,
    message_id: impl Into<String>,
) -> RequestMatcher {
    let message_id = message_id.into();
    RequestMatcher::new(unique_identifier, move |request| {
        body_contains_message_id(&request.body, &message_id)
    })
}
