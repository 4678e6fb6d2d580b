//! Utility functions for keeping secrets out of surfaced strings.

use url::form_urlencoded;

/// Replacement text for every masked occurrence of a secret.
pub const REDACTION_MASK: &str = "[REDACTED]";

/// Replace every occurrence of `secret` in `message` with [`REDACTION_MASK`].
///
/// Both the literal secret and its form-urlencoded spelling are masked, since
/// the token travels in connection URLs. Masks already present in `message`
/// are opaque: matching never starts or ends inside one, so redacting twice
/// gives the same result as redacting once. An empty secret leaves the
/// message untouched.
pub fn redact(message: &str, secret: &str) -> String {
    if secret.is_empty() {
        return message.to_string();
    }
    let encoded: String = form_urlencoded::byte_serialize(secret.as_bytes()).collect();
    let mut forms = vec![secret];
    if encoded != secret {
        forms.push(encoded.as_str());
    }
    forms.sort_by_key(|form| std::cmp::Reverse(form.len()));

    let mut out = String::with_capacity(message.len());
    for (i, segment) in message.split(REDACTION_MASK).enumerate() {
        if i > 0 {
            out.push_str(REDACTION_MASK);
        }
        mask_segment(&mut out, segment, &forms);
    }
    out
}

fn mask_segment(out: &mut String, segment: &str, forms: &[&str]) {
    let mut rest = segment;
    while let Some(c) = rest.chars().next() {
        match forms.iter().find(|form| rest.starts_with(**form)) {
            Some(form) => {
                out.push_str(REDACTION_MASK);
                rest = &rest[form.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}
