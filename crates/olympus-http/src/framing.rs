use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

/// Incremental per-connection message buffer.
///
/// Received bytes are accumulated until a full message is available.
/// A message is complete once the blank line ending its head has been seen, and as many body
/// bytes as its `Content-Length` names have arrived.
/// Anything after a complete message stays buffered, so pipelined requests come out one at a
/// time.
pub struct MessageBuffer {
    data: BytesMut,
    /// Position up to which `data` has been searched for the end of the head.
    scanned: usize,
    head: Option<Head>,
    max_head_size: usize,
    max_body_size: usize,
}

#[derive(Clone, Copy)]
struct Head {
    length: usize,
    content_length: usize,
}

/// Result of checking the buffer for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// No complete message yet.
    Pending,
    /// The head just completed, but its body is still arriving.
    ///
    /// Only reported once per message.
    Head(Bytes),
    /// A complete message, removed from the buffer.
    Message(Bytes),
}

/// The buffered data can't be framed into a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The head grew past the size limit before it ended.
    #[error("message head exceeds {limit} bytes")]
    HeadTooLarge {
        /// Largest accepted head, in bytes.
        limit: usize,
    },
    /// The head announced a body larger than the size limit.
    #[error("message body of {length} bytes exceeds {limit} bytes")]
    BodyTooLarge {
        /// Announced body length.
        length: usize,
        /// Largest accepted body, in bytes.
        limit: usize,
    },
    /// The `Content-Length` value is not a number.
    #[error("invalid content length {0:?}")]
    InvalidContentLength(String),
}

impl MessageBuffer {
    /// Empty buffer, enforcing the given head and body size limits.
    pub fn new(max_head_size: usize, max_body_size: usize) -> Self {
        Self {
            data: BytesMut::new(),
            scanned: 0,
            head: None,
            max_head_size,
            max_body_size,
        }
    }

    /// Append received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check if a complete message is buffered, and split it off if so.
    pub fn next_frame(&mut self) -> Result<Frame, FramingError> {
        let head = match self.head {
            Some(head) => head,
            None => {
                let Some(head) = self.scan_head()? else {
                    return Ok(Frame::Pending);
                };
                self.head = Some(head);

                // Clients waiting for an interim response need to hear about this right away
                if self.data.len() < head.length + head.content_length {
                    let bytes = Bytes::copy_from_slice(&self.data[..head.length]);
                    return Ok(Frame::Head(bytes));
                }

                head
            }
        };

        let total = head.length + head.content_length;
        if self.data.len() < total {
            return Ok(Frame::Pending);
        }

        let message = self.data.split_to(total).freeze();
        self.head = None;
        self.scanned = 0;

        Ok(Frame::Message(message))
    }

    fn scan_head(&mut self) -> Result<Option<Head>, FramingError> {
        // Empty lines before a request line are ignored
        if self.scanned == 0 {
            let leading = self
                .data
                .iter()
                .take_while(|byte| matches!(byte, b'\r' | b'\n'))
                .count();
            self.data.advance(leading);
        }

        let Some(length) = head_length_from(&self.data, self.scanned) else {
            if self.data.len() > self.max_head_size {
                return Err(FramingError::HeadTooLarge {
                    limit: self.max_head_size,
                });
            }

            // The terminator may be split over reads, so re-check the tail next time
            self.scanned = self.data.len().saturating_sub(2);
            return Ok(None);
        };

        if length > self.max_head_size {
            return Err(FramingError::HeadTooLarge {
                limit: self.max_head_size,
            });
        }

        let content_length = content_length(&self.data[..length])?;
        if content_length > self.max_body_size {
            return Err(FramingError::BodyTooLarge {
                length: content_length,
                limit: self.max_body_size,
            });
        }

        let head = Head {
            length,
            content_length,
        };
        Ok(Some(head))
    }
}

/// Length of the message head, including the blank line that ends it.
///
/// Accepts both CRLF and bare LF line endings.
pub(crate) fn head_length(data: &[u8]) -> Option<usize> {
    head_length_from(data, 0)
}

fn head_length_from(data: &[u8], from: usize) -> Option<usize> {
    for (i, byte) in data.iter().enumerate().skip(from) {
        if *byte != b'\n' {
            continue;
        }

        match &data[i + 1..] {
            [b'\n', ..] => return Some(i + 2),
            [b'\r', b'\n', ..] => return Some(i + 3),
            _ => {}
        }
    }

    None
}

fn content_length(head: &[u8]) -> Result<usize, FramingError> {
    let text = String::from_utf8_lossy(head);

    for line in text.lines().skip(1) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("content-length") {
            continue;
        }

        let value = value.trim();
        return value
            .parse()
            .map_err(|_| FramingError::InvalidContentLength(value.to_string()));
    }

    Ok(0)
}
