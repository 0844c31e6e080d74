//! MIME body tree
//!
//! Gmail returns message bodies as a nested payload where every part either
//! carries data or holds child parts. [`BodyNode`] makes that shape explicit so
//! the "which part is the body" rule can be applied and tested without the API.

use base64::prelude::*;

use crate::gmail::api::{MessageBody, MessagePart, MessagePayload};

/// A node in a message's MIME tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyNode {
    /// A part with (possibly absent) base64url-encoded data
    Leaf {
        mime_type: String,
        data: Option<String>,
    },
    /// A multipart container
    Multipart {
        mime_type: String,
        children: Vec<BodyNode>,
    },
}

impl BodyNode {
    /// Build a leaf from a MIME type and encoded data
    pub fn leaf(mime_type: impl Into<String>, data: Option<&str>) -> Self {
        Self::Leaf {
            mime_type: mime_type.into(),
            data: data.map(str::to_string),
        }
    }

    /// Build a multipart node from children
    pub fn multipart(mime_type: impl Into<String>, children: Vec<BodyNode>) -> Self {
        Self::Multipart {
            mime_type: mime_type.into(),
            children,
        }
    }

    /// Convert a Gmail message payload into a body tree
    pub fn from_payload(payload: &MessagePayload) -> Self {
        Self::from_parts(
            payload.mime_type.as_deref(),
            payload.body.as_ref(),
            payload.parts.as_deref(),
        )
    }

    fn from_part(part: &MessagePart) -> Self {
        Self::from_parts(
            part.mime_type.as_deref(),
            part.body.as_ref(),
            part.parts.as_deref(),
        )
    }

    fn from_parts(
        mime_type: Option<&str>,
        body: Option<&MessageBody>,
        parts: Option<&[MessagePart]>,
    ) -> Self {
        let mime_type = mime_type.unwrap_or_default().to_string();
        match parts {
            Some(parts) if !parts.is_empty() => Self::Multipart {
                mime_type,
                children: parts.iter().map(Self::from_part).collect(),
            },
            _ => Self::Leaf {
                mime_type,
                data: body.and_then(|b| b.data.clone()),
            },
        }
    }

    /// Find the encoded data of the first `text/plain` leaf that has data.
    ///
    /// Traversal is depth-first pre-order (document order) using an explicit
    /// stack, so deeply nested payloads cannot overflow the call stack.
    pub fn first_plain_text_leaf(&self) -> Option<&str> {
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { mime_type, data } => {
                    if is_plain_text(mime_type)
                        && let Some(data) = data.as_deref()
                        && !data.is_empty()
                    {
                        return Some(data);
                    }
                }
                Self::Multipart { children, .. } => {
                    stack.extend(children.iter().rev());
                }
            }
        }

        None
    }

    /// Decoded plain-text body of the message.
    ///
    /// Uses the first plain-text leaf. A single-part message (root is a leaf)
    /// falls back to its own data whatever its type. Anything else yields an
    /// empty string.
    pub fn plain_text(&self) -> String {
        let data = self.first_plain_text_leaf().or(match self {
            Self::Leaf { data, .. } => data.as_deref(),
            Self::Multipart { .. } => None,
        });

        data.and_then(decode_base64_body).unwrap_or_default()
    }
}

impl Drop for BodyNode {
    // Flatten children onto a heap stack so dropping a deep tree stays iterative
    fn drop(&mut self) {
        let Self::Multipart { children, .. } = self else {
            return;
        };
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Self::Multipart { children, .. } = &mut node {
                pending.append(children);
            }
        }
    }
}

fn is_plain_text(mime_type: &str) -> bool {
    mime_type
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/plain"))
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
/// Bytes that are not UTF-8 (e.g. a Latin-1 part) are decoded lossily.
fn decode_base64_body(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    let decoded = decoders
        .iter()
        .find_map(|decoder| decoder.decode(data).ok())?;

    Some(match String::from_utf8(decoded) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
