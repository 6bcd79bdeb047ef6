//! MIME parse boundary — raw RFC-822 bytes into a `ParsedMessage`.

use mail_parser::{HeaderValue, MessageParser, MimeHeaders};

use crate::error::MailError;

/// One decoded attachment part.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub content_type: String,
    pub filename: String,
    pub data: Vec<u8>,
}

/// A parsed inbound email, owned and lifetime-free.
#[derive(Debug, Clone)]
pub struct ParsedMessage {
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    /// Header name/value pairs in message order. Values that have no
    /// reasonable text rendering (e.g. Received traces) come out empty.
    pub headers: Vec<(String, String)>,
    pub attachments: Vec<Attachment>,
}

/// Parse raw email bytes. Fails only when the input is not recognizably
/// a MIME message; missing fields default to empty strings.
pub fn parse_raw(raw: &[u8]) -> Result<ParsedMessage, MailError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailError::Unparsable("not a valid MIME message".into()))?;

    let from = extract_sender(&parsed);
    let subject = parsed.subject().unwrap_or_default().to_string();
    let text = parsed
        .body_text(0)
        .map(|s| s.to_string())
        .unwrap_or_default();
    let html = parsed
        .body_html(0)
        .map(|s| s.to_string())
        .unwrap_or_default();

    let headers = parsed
        .headers()
        .iter()
        .map(|h| (h.name().to_string(), header_value_text(h.value())))
        .collect();

    let attachments = parsed
        .attachments()
        .map(|part| {
            let content_type = match MimeHeaders::content_type(part) {
                Some(ct) => match ct.subtype() {
                    Some(sub) => format!("{}/{}", ct.ctype(), sub),
                    None => ct.ctype().to_string(),
                },
                None => String::new(),
            };
            let filename = MimeHeaders::attachment_name(part)
                .unwrap_or_default()
                .to_string();
            Attachment {
                content_type,
                filename,
                data: part.contents().to_vec(),
            }
        })
        .collect();

    Ok(ParsedMessage {
        from,
        subject,
        text,
        html,
        headers,
        attachments,
    })
}

/// Extract the sender address from a parsed email.
fn extract_sender(parsed: &mail_parser::Message) -> String {
    parsed
        .from()
        .and_then(|addr| addr.first())
        .and_then(|a| a.address())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".into())
}

/// Best-effort text rendering for a header value.
fn header_value_text(value: &HeaderValue) -> String {
    match value {
        HeaderValue::Text(text) => text.to_string(),
        HeaderValue::TextList(list) => list.join(", "),
        HeaderValue::DateTime(dt) => dt.to_rfc3339(),
        HeaderValue::ContentType(ct) => match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        },
        HeaderValue::Address(addr) => addr
            .first()
            .and_then(|a| a.address())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
