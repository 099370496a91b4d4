//! Rendered preview payloads.
//!
//! The decode service may return either a bare base64 PNG or a complete
//! data URI. [`Preview`] keeps the distinction so that callers can render
//! either form without re-inspecting the string.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Prefix prepended to raw payloads to make them embeddable.
pub const DEFAULT_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Scheme that marks a payload as already embeddable.
const DATA_URI_SCHEME: &str = "data:";

/// A rendered image for one artifact code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Preview {
    /// A complete data URI, usable as an image source as-is.
    Embeddable(String),
    /// A bare base64 PNG payload without any prefix.
    Raw(String),
}

impl Preview {
    /// Classify a payload by checking for a data-URI prefix.
    pub fn from_payload(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        if payload.starts_with(DATA_URI_SCHEME) {
            Self::Embeddable(payload)
        } else {
            Self::Raw(payload)
        }
    }

    /// Render as a data URI, prepending [`DEFAULT_DATA_URI_PREFIX`] when
    /// the payload is raw.
    pub fn to_data_uri(&self) -> Cow<'_, str> {
        match self {
            Self::Embeddable(uri) => Cow::Borrowed(uri),
            Self::Raw(payload) => Cow::Owned(format!("{DEFAULT_DATA_URI_PREFIX}{payload}")),
        }
    }

    pub fn is_embeddable(&self) -> bool {
        matches!(self, Self::Embeddable(_))
    }
}

impl From<String> for Preview {
    fn from(payload: String) -> Self {
        Self::from_payload(payload)
    }
}

impl From<&str> for Preview {
    fn from(payload: &str) -> Self {
        Self::from_payload(payload)
    }
}
