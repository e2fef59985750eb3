//! DMAP, the tagged binary encoding used in DAAP response bodies.
//!
//! An element is a 4-byte ASCII tag, a big-endian `u32` payload length and
//! the payload. Whether a payload is a nested list, text or an integer is
//! not on the wire; it is implied by the tag.

use std::fmt;
use thiserror::Error;

/// A four-character content code such as `mlog` or `miid`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag(pub [u8; 4]);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmapValue {
    Container(Vec<DmapItem>),
    Int(u64),
    Text(String),
    /// Payload of a tag we do not interpret.
    Raw(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmapItem {
    pub tag: Tag,
    pub value: DmapValue,
}

impl DmapItem {
    pub fn new(tag: &[u8; 4], value: DmapValue) -> Self {
        Self {
            tag: Tag(*tag),
            value,
        }
    }

    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.tag.0 == *tag
    }

    pub fn children(&self) -> &[DmapItem] {
        match &self.value {
            DmapValue::Container(items) => items,
            _ => &[],
        }
    }

    /// First direct child carrying `tag`.
    pub fn child(&self, tag: &[u8; 4]) -> Option<&DmapItem> {
        self.children().iter().find(|item| item.is(tag))
    }

    pub fn as_int(&self) -> Option<u64> {
        match self.value {
            DmapValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            DmapValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn child_int(&self, tag: &[u8; 4]) -> Option<u64> {
        self.child(tag).and_then(DmapItem::as_int)
    }

    pub fn child_text(&self, tag: &[u8; 4]) -> Option<&str> {
        self.child(tag).and_then(DmapItem::as_text)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DmapError {
    #[error("element header truncated at offset {offset}")]
    TruncatedHeader { offset: usize },
    #[error("`{tag}` declares {declared} bytes but only {available} remain")]
    TruncatedPayload {
        tag: Tag,
        declared: usize,
        available: usize,
    },
    #[error("`{tag}` integer has unsupported width {len}")]
    IntegerWidth { tag: Tag, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Container,
    Text,
    Int,
    Raw,
}

fn kind_of(tag: &[u8; 4]) -> Kind {
    match tag {
        b"mlog" | b"msrv" | b"avdb" | b"adbs" | b"mlcl" | b"mlit" | b"mdcl" | b"aply"
        | b"apso" | b"mupd" | b"mccr" => Kind::Container,
        b"minm" | b"asar" | b"asal" | b"asaa" | b"asfm" | b"asgn" | b"ascm" | b"ascp"
        | b"asdt" | b"mcna" => Kind::Text,
        b"mstt" | b"mlid" | b"miid" | b"mimc" | b"mctc" | b"mtco" | b"mrco" | b"astm"
        | b"asyr" | b"astn" | b"asbr" | b"assz" | b"mikd" | b"muty" | b"mper" | b"msdc"
        | b"mslr" | b"mstm" | b"msau" | b"musr" => Kind::Int,
        _ => Kind::Raw,
    }
}

/// Wire width used when encoding integers.
fn int_width(tag: &[u8; 4]) -> usize {
    match tag {
        b"mikd" | b"muty" | b"mslr" | b"msau" => 1,
        b"asyr" | b"astn" | b"asbr" => 2,
        b"mper" => 8,
        _ => 4,
    }
}

/// Decodes a sequence of sibling elements.
pub fn decode(bytes: &[u8]) -> Result<Vec<DmapItem>, DmapError> {
    let mut items = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + 8)
            .ok_or(DmapError::TruncatedHeader { offset })?;
        let tag = [header[0], header[1], header[2], header[3]];
        let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
        let start = offset + 8;
        let payload = bytes
            .get(start..start.saturating_add(len))
            .ok_or(DmapError::TruncatedPayload {
                tag: Tag(tag),
                declared: len,
                available: bytes.len() - start,
            })?;
        items.push(DmapItem {
            tag: Tag(tag),
            value: decode_value(&tag, payload)?,
        });
        offset = start + len;
    }
    Ok(items)
}

fn decode_value(tag: &[u8; 4], payload: &[u8]) -> Result<DmapValue, DmapError> {
    Ok(match kind_of(tag) {
        Kind::Container => DmapValue::Container(decode(payload)?),
        Kind::Text => DmapValue::Text(String::from_utf8_lossy(payload).into_owned()),
        Kind::Int => match payload.len() {
            1 | 2 | 4 | 8 => DmapValue::Int(
                payload
                    .iter()
                    .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)),
            ),
            len => {
                return Err(DmapError::IntegerWidth {
                    tag: Tag(*tag),
                    len,
                })
            }
        },
        Kind::Raw => DmapValue::Raw(payload.to_vec()),
    })
}

/// Encodes elements back into wire form.
pub fn encode(items: &[DmapItem]) -> Vec<u8> {
    let mut out = Vec::new();
    for item in items {
        let payload = match &item.value {
            DmapValue::Container(children) => encode(children),
            DmapValue::Text(text) => text.as_bytes().to_vec(),
            DmapValue::Raw(bytes) => bytes.clone(),
            DmapValue::Int(value) => {
                let width = int_width(&item.tag.0);
                value.to_be_bytes()[8 - width..].to_vec()
            }
        };
        out.extend_from_slice(&item.tag.0);
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&payload);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_login_response() {
        // mlog { mstt: 200, mlid: 1337 }
        let bytes = [
            b'm', b'l', b'o', b'g', 0, 0, 0, 24, //
            b'm', b's', b't', b't', 0, 0, 0, 4, 0, 0, 0, 200, //
            b'm', b'l', b'i', b'd', 0, 0, 0, 4, 0, 0, 0x05, 0x39,
        ];
        let items = decode(&bytes).unwrap();
        assert_eq!(items.len(), 1);
        let login = &items[0];
        assert!(login.is(b"mlog"));
        assert_eq!(login.child_int(b"mstt"), Some(200));
        assert_eq!(login.child_int(b"mlid"), Some(1337));
    }

    #[test]
    fn integer_width_follows_payload_length() {
        let items = decode(&[b'm', b'i', b'k', b'd', 0, 0, 0, 1, 2]).unwrap();
        assert_eq!(items[0].as_int(), Some(2));

        let err = decode(&[b'm', b'i', b'i', b'd', 0, 0, 0, 3, 0, 0, 1]).unwrap_err();
        assert!(matches!(err, DmapError::IntegerWidth { len: 3, .. }));
    }

    #[test]
    fn unknown_tags_keep_raw_bytes() {
        let items = decode(&[b'z', b'z', b'z', b'z', 0, 0, 0, 2, 0xde, 0xad]).unwrap();
        assert_eq!(items[0].value, DmapValue::Raw(vec![0xde, 0xad]));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let err = decode(&[b'm', b'l', b'o', b'g', 0, 0]).unwrap_err();
        assert_eq!(err, DmapError::TruncatedHeader { offset: 0 });
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let err = decode(&[b'm', b'i', b'n', b'm', 0, 0, 0, 10, b'a', b'b']).unwrap_err();
        assert!(matches!(
            err,
            DmapError::TruncatedPayload {
                declared: 10,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn nested_truncation_is_rejected() {
        // The outer container is complete but its child lies about its size.
        let bytes = [
            b'm', b'l', b'c', b'l', 0, 0, 0, 9, //
            b'm', b'i', b'n', b'm', 0, 0, 0, 9, b'x',
        ];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn encoded_listing_decodes_to_same_tree() {
        let tree = vec![DmapItem::new(
            b"adbs",
            DmapValue::Container(vec![
                DmapItem::new(b"mstt", DmapValue::Int(200)),
                DmapItem::new(
                    b"mlcl",
                    DmapValue::Container(vec![DmapItem::new(
                        b"mlit",
                        DmapValue::Container(vec![
                            DmapItem::new(b"mikd", DmapValue::Int(2)),
                            DmapItem::new(b"miid", DmapValue::Int(41)),
                            DmapItem::new(b"minm", DmapValue::Text("Aerodynamic".into())),
                            DmapItem::new(b"asyr", DmapValue::Int(2001)),
                            DmapItem::new(b"mper", DmapValue::Int(u64::MAX)),
                        ]),
                    )]),
                ),
            ]),
        )];

        let bytes = encode(&tree);
        assert_eq!(decode(&bytes).unwrap(), tree);
    }

    #[test]
    fn text_is_utf8() {
        let tree = vec![DmapItem::new(b"asar", DmapValue::Text("Beyoncé".into()))];
        let decoded = decode(&encode(&tree)).unwrap();
        assert_eq!(decoded[0].as_text(), Some("Beyoncé"));
    }
}
