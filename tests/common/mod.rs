// ABOUTME: Test-only builder that lays out JSONB documents byte by byte.
// ABOUTME: Produces the same container layout the decoder expects, plus the matching Value.

#![allow(dead_code)]

use mysql_jsonb::{type_code, Map, Value};

/// A document node to encode.
#[derive(Debug, Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    Opaque(u8, Vec<u8>),
    Array(Vec<Node>),
    Object(Vec<(String, Node)>),
}

impl Node {
    fn tag(&self, large: bool) -> u8 {
        match self {
            Node::Null | Node::Bool(_) => type_code::LITERAL,
            Node::Int16(_) => type_code::INT16,
            Node::UInt16(_) => type_code::UINT16,
            Node::Int32(_) => type_code::INT32,
            Node::UInt32(_) => type_code::UINT32,
            Node::Int64(_) => type_code::INT64,
            Node::UInt64(_) => type_code::UINT64,
            Node::Double(_) => type_code::DOUBLE,
            Node::Str(_) => type_code::STRING,
            Node::Opaque(..) => type_code::OPAQUE,
            Node::Array(_) if large => type_code::LARGE_ARRAY,
            Node::Array(_) => type_code::SMALL_ARRAY,
            Node::Object(_) if large => type_code::LARGE_OBJECT,
            Node::Object(_) => type_code::SMALL_OBJECT,
        }
    }

    /// The value the decoder should produce for this node.
    pub fn expected(&self) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int16(n) => Value::Int(i64::from(*n)),
            Node::UInt16(n) => Value::UInt(u64::from(*n)),
            Node::Int32(n) => Value::Int(i64::from(*n)),
            Node::UInt32(n) => Value::UInt(u64::from(*n)),
            Node::Int64(n) => Value::Int(*n),
            Node::UInt64(n) => Value::UInt(*n),
            Node::Double(f) => Value::Double(*f),
            Node::Str(s) => Value::String(s.clone()),
            Node::Opaque(..) => panic!("opaque rendering is checked separately"),
            Node::Array(items) => Value::Array(items.iter().map(Node::expected).collect()),
            Node::Object(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    map.insert(k.clone(), v.expected());
                }
                Value::Object(map)
            }
        }
    }
}

fn literal_code(node: &Node) -> Option<u32> {
    match node {
        Node::Null => Some(0),
        Node::Bool(true) => Some(1),
        Node::Bool(false) => Some(2),
        _ => None,
    }
}

fn var_len(mut len: usize, out: &mut Vec<u8>) {
    loop {
        let byte = (len & 0x7f) as u8;
        len >>= 7;
        if len == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn put_uint(out: &mut Vec<u8>, value: usize, large: bool) {
    if large {
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.extend_from_slice(&(value as u16).to_le_bytes());
    }
}

fn set_uint(out: &mut [u8], at: usize, value: usize, large: bool) {
    if large {
        out[at..at + 4].copy_from_slice(&(value as u32).to_le_bytes());
    } else {
        out[at..at + 2].copy_from_slice(&(value as u16).to_le_bytes());
    }
}

/// Inline slot bytes, if this node is stored inside its value-entry.
fn inline_slot(node: &Node, large: bool) -> Option<Vec<u8>> {
    let width = if large { 4 } else { 2 };
    let mut bytes = match node {
        Node::Null | Node::Bool(_) => literal_code(node)?.to_le_bytes()[..width].to_vec(),
        Node::Int16(n) => n.to_le_bytes().to_vec(),
        Node::UInt16(n) => n.to_le_bytes().to_vec(),
        Node::Int32(n) if large => n.to_le_bytes().to_vec(),
        Node::UInt32(n) if large => n.to_le_bytes().to_vec(),
        _ => return None,
    };
    bytes.resize(width, 0);
    Some(bytes)
}

/// Bytes of a value stored by offset (no tag for scalars; containers carry their own).
fn data_bytes(node: &Node, large: bool) -> Vec<u8> {
    match node {
        Node::Int32(n) => n.to_le_bytes().to_vec(),
        Node::UInt32(n) => n.to_le_bytes().to_vec(),
        Node::Int64(n) => n.to_le_bytes().to_vec(),
        Node::UInt64(n) => n.to_le_bytes().to_vec(),
        Node::Double(f) => f.to_le_bytes().to_vec(),
        Node::Str(s) => {
            let mut out = Vec::new();
            var_len(s.len(), &mut out);
            out.extend_from_slice(s.as_bytes());
            out
        }
        Node::Opaque(field_type, payload) => {
            let mut out = vec![*field_type];
            var_len(payload.len(), &mut out);
            out.extend_from_slice(payload);
            out
        }
        Node::Array(_) | Node::Object(_) => container(node, large),
        other => panic!("{other:?} is always inlined"),
    }
}

fn container(node: &Node, large: bool) -> Vec<u8> {
    let (keys, values): (Vec<Option<&str>>, Vec<&Node>) = match node {
        Node::Array(items) => (vec![None; items.len()], items.iter().collect()),
        Node::Object(entries) => entries.iter().map(|(k, v)| (Some(k.as_str()), v)).unzip(),
        _ => unreachable!(),
    };
    let is_object = matches!(node, Node::Object(_));
    let width = if large { 4 } else { 2 };

    let mut out = vec![node.tag(large)];
    put_uint(&mut out, values.len(), large);
    put_uint(&mut out, 0, large); // patched below

    let key_table = out.len();
    if is_object {
        out.resize(out.len() + values.len() * (width + 2), 0);
    }
    let value_table = out.len();
    out.resize(out.len() + values.len() * (1 + width), 0);

    for (i, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            let at = key_table + i * (width + 2);
            let offset = out.len();
            set_uint(&mut out, at, offset, large);
            out[at + width..at + width + 2].copy_from_slice(&(key.len() as u16).to_le_bytes());
            out.extend_from_slice(key.as_bytes());
        }
    }

    for (i, value) in values.iter().enumerate() {
        let at = value_table + i * (1 + width);
        out[at] = value.tag(large);
        match inline_slot(value, large) {
            Some(slot) => out[at + 1..at + 1 + width].copy_from_slice(&slot),
            None => {
                let offset = out.len();
                set_uint(&mut out, at + 1, offset, large);
                out.extend(data_bytes(value, large));
            }
        }
    }

    let total = out.len() - 1;
    set_uint(&mut out, 1 + width, total, large);
    out
}

/// Encode a whole document, using the given size class for every container.
pub fn encode(node: &Node, large: bool) -> Vec<u8> {
    match node {
        Node::Array(_) | Node::Object(_) => container(node, large),
        Node::Null | Node::Bool(_) => vec![type_code::LITERAL, literal_code(node).unwrap() as u8],
        Node::Int16(n) => [&[type_code::INT16][..], &n.to_le_bytes()].concat(),
        Node::UInt16(n) => [&[type_code::UINT16][..], &n.to_le_bytes()].concat(),
        other => {
            let mut out = vec![other.tag(large)];
            out.extend(data_bytes(other, large));
            out
        }
    }
}
