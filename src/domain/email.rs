use std::fmt::{Debug, Formatter};

use bytes::Bytes;

/// An outbound notification for the business inbox.
///
/// Sender and recipients belong to the mailer configuration, not to the message.
#[derive(Clone, PartialEq)]
pub struct Email {
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Bytes,
}

impl Email {
    pub fn new(subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        self.attachments.push(Attachment {
            file_name: file_name.into(),
            content: content.into(),
        });
        self
    }
}

impl Debug for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Email")
            .field("subject", &self.subject)
            .field("html_len", &self.html.len())
            .field("attachments", &self.attachments)
            .finish()
    }
}

impl Debug for Attachment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("len", &self.content.len())
            .finish()
    }
}
