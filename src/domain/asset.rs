use std::fmt::{Debug, Formatter};

use bytes::Bytes;

/// A binary file received from a customer, ready to be handed to an asset host.
#[derive(Clone, PartialEq)]
pub struct Asset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Asset {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        let content_type: String = content_type.into();
        Self {
            file_name: file_name.into(),
            content_type: content_type.trim().to_ascii_lowercase(),
            bytes: bytes.into(),
        }
    }

    /// True for a bare `image/<subtype>` media type, the only form the asset
    /// host accepts as a part type.
    pub fn is_image(&self) -> bool {
        match self.content_type.split_once('/') {
            Some(("image", subtype)) => !subtype.is_empty() && subtype.chars().all(is_token_char),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// File name without its extension, used as the hosted image title.
    pub fn stem(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.file_name,
        }
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

// Payloads can be megabytes; keep them out of span fields and logs.
impl Debug for Asset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
