//! Little-endian named binary tags
//!
//! Only the tag kinds a structure record uses are supported. Layout per
//! named tag: `id: u8`, `name_len: u16`, `name: utf8`, then the payload.

/// Tag ids
pub const TAG_END: u8 = 0;
pub const TAG_INT: u8 = 3;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Int(i32),
    String(String),
    /// Elements must all be the same kind
    List(Vec<Tag>),
    /// Entries are written in insertion order
    Compound(Vec<(String, Tag)>),
}

impl Tag {
    pub fn id(&self) -> u8 {
        match self {
            Tag::Int(_) => TAG_INT,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
        }
    }

    pub fn compound() -> Self {
        Tag::Compound(Vec::new())
    }

    pub fn int_list(values: &[i32]) -> Self {
        Tag::List(values.iter().copied().map(Tag::Int).collect())
    }

    /// Append an entry to a compound; no-op on other kinds
    pub fn with(mut self, name: impl Into<String>, value: Tag) -> Self {
        if let Tag::Compound(entries) = &mut self {
            entries.push((name.into(), value));
        }
        self
    }

    /// Look up a compound entry by name
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match self {
            Tag::Compound(entries) => entries.iter().find(|(n, _)| n == name).map(|(_, t)| t),
            _ => None,
        }
    }
}

/// Encode `tag` as the root tag named `name`
pub fn encode(name: &str, tag: &Tag) -> Vec<u8> {
    let mut writer = NbtWriter::new();
    writer.write_named(name, tag);
    writer.buffer
}

struct NbtWriter {
    buffer: Vec<u8>,
}

impl NbtWriter {
    fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    fn write_named(&mut self, name: &str, tag: &Tag) {
        self.buffer.push(tag.id());
        self.write_str(name);
        self.write_payload(tag);
    }

    fn write_payload(&mut self, tag: &Tag) {
        match tag {
            Tag::Int(v) => self.buffer.extend_from_slice(&v.to_le_bytes()),
            Tag::String(s) => self.write_str(s),
            Tag::List(items) => {
                let element = items.first().map_or(TAG_END, Tag::id);
                debug_assert!(
                    items.iter().all(|t| t.id() == element),
                    "list elements must share a tag kind"
                );
                self.buffer.push(element);
                self.buffer
                    .extend_from_slice(&(items.len() as i32).to_le_bytes());
                for item in items {
                    self.write_payload(item);
                }
            }
            Tag::Compound(entries) => {
                for (name, value) in entries {
                    self.write_named(name, value);
                }
                self.buffer.push(TAG_END);
            }
        }
    }

    fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        assert!(bytes.len() <= u16::MAX as usize, "tag string too long");
        self.buffer
            .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        self.buffer.extend_from_slice(bytes);
    }
}
