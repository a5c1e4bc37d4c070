use bytes::{Buf, Bytes};

/// One frame of a decoded request: the head first, then body pieces.
#[derive(Debug)]
pub enum Message<T, Data: Buf = Bytes> {
    Header(T),
    Payload(PayloadItem<Data>),
}

impl<T, D: Buf> Message<T, D> {
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Message::Payload(_))
    }

    /// The body piece, or `None` for a head frame.
    pub fn into_payload(self) -> Option<PayloadItem<D>> {
        match self {
            Message::Payload(item) => Some(item),
            Message::Header(_) => None,
        }
    }
}

/// A piece of body data, or the marker that the body is complete.
///
/// The same items flow out of the payload decoders and into the chunk encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    Chunk(Data),
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, PayloadItem::Chunk(_))
    }

    /// Bytes carried by this item, `0` for the end marker.
    pub fn remaining(&self) -> usize {
        match self {
            PayloadItem::Chunk(data) => data.remaining(),
            PayloadItem::Eof => 0,
        }
    }
}

impl PayloadItem {
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            PayloadItem::Chunk(bytes) => Some(bytes),
            PayloadItem::Eof => None,
        }
    }
}

impl From<Bytes> for PayloadItem {
    fn from(bytes: Bytes) -> Self {
        PayloadItem::Chunk(bytes)
    }
}

/// Body framing selected from the request headers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Exactly this many bytes follow the head
    Length(u64),
    /// `Transfer-Encoding: chunked`
    Chunked,
    /// No body
    Empty,
}

impl PayloadSize {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty)
    }

    /// The announced body length, when it is known up front.
    pub fn known_length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Empty => Some(0),
            PayloadSize::Chunked => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_item_sizes() {
        assert_eq!(PayloadItem::from(Bytes::from_static(b"abc")).remaining(), 3);
        assert_eq!(PayloadItem::<Bytes>::Eof.remaining(), 0);
    }

    #[test]
    fn known_length() {
        assert_eq!(PayloadSize::Length(7).known_length(), Some(7));
        assert_eq!(PayloadSize::Empty.known_length(), Some(0));
        assert_eq!(PayloadSize::Chunked.known_length(), None);
    }

    #[test]
    fn message_kinds() {
        let head: Message<&str> = Message::Header("GET / HTTP/1.1");
        assert!(head.is_header());
        assert!(head.into_payload().is_none());

        let body: Message<&str> = Message::Payload(PayloadItem::Eof);
        assert!(body.is_payload());
        assert_eq!(body.into_payload(), Some(PayloadItem::Eof));
    }
}
