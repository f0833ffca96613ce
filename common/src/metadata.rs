use minicbor::data::{Int, Type};
use std::collections::BTreeMap;

/// Transaction metadata, ordered by label
pub type Metadata = BTreeMap<MetadatumLabel, Metadatum>;

pub type MetadatumLabel = u64;

/// Label under which the bridge records its bookkeeping
pub const BRIDGE_METADATA_LABEL: MetadatumLabel = 1;

/// Structured metadata value. Maps keep their entries in declaration order so
/// the encoding does not depend on how they were assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadatum {
    /// Any CBOR integer, -2^64 ..= 2^64-1
    Int(Int),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Metadatum {
    pub fn text(text: impl Into<String>) -> Self {
        Metadatum::Text(text.into())
    }

    pub fn uint(value: u64) -> Self {
        Metadatum::Int(Int::from(value))
    }

    pub fn int(value: i64) -> Self {
        Metadatum::Int(Int::from(value))
    }

    /// Map with text keys, in the given order
    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Metadatum)>) -> Self {
        Metadatum::Map(fields.into_iter().map(|(k, v)| (Metadatum::text(k), v)).collect())
    }

    /// Look up a text key in a map
    pub fn get(&self, key: &str) -> Option<&Metadatum> {
        match self {
            Metadatum::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                Metadatum::Text(text) if text == key => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Metadatum::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }
}

impl<C> minicbor::Encode<C> for Metadatum {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            Metadatum::Int(value) => {
                e.int(*value)?;
            }
            Metadatum::Bytes(bytes) => {
                e.bytes(bytes)?;
            }
            Metadatum::Text(text) => {
                e.str(text)?;
            }
            Metadatum::Array(items) => {
                e.array(items.len() as u64)?;
                for item in items {
                    e.encode_with(item, ctx)?;
                }
            }
            Metadatum::Map(entries) => {
                e.map(entries.len() as u64)?;
                for (key, value) in entries {
                    e.encode_with(key, ctx)?.encode_with(value, ctx)?;
                }
            }
        }
        Ok(())
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Metadatum {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        match d.datatype()? {
            Type::U8
            | Type::U16
            | Type::U32
            | Type::U64
            | Type::I8
            | Type::I16
            | Type::I32
            | Type::I64
            | Type::Int => Ok(Metadatum::Int(d.int()?)),
            Type::Bytes => Ok(Metadatum::Bytes(d.bytes()?.to_vec())),
            Type::String => Ok(Metadatum::Text(d.str()?.to_owned())),
            Type::Array | Type::ArrayIndef => {
                let len = d.array()?;
                let mut items: Vec<Metadatum> = Vec::new();
                while has_next(d, len, items.len())? {
                    items.push(d.decode_with(ctx)?);
                }
                Ok(Metadatum::Array(items))
            }
            Type::Map | Type::MapIndef => {
                let len = d.map()?;
                let mut entries: Vec<(Metadatum, Metadatum)> = Vec::new();
                while has_next(d, len, entries.len())? {
                    let key: Metadatum = d.decode_with(ctx)?;
                    entries.push((key, d.decode_with(ctx)?));
                }
                Ok(Metadatum::Map(entries))
            }
            other => Err(minicbor::decode::Error::type_mismatch(other)
                .with_message("unsupported metadatum type")),
        }
    }
}

/// Whether a container of `len` entries (`None` if indefinite) has more after `seen`.
/// Consumes the break that ends an indefinite container.
fn has_next(
    d: &mut minicbor::Decoder<'_>,
    len: Option<u64>,
    seen: usize,
) -> Result<bool, minicbor::decode::Error> {
    match len {
        Some(n) => Ok((seen as u64) < n),
        None if d.datatype()? == Type::Break => {
            d.set_position(d.position() + 1);
            Ok(false)
        }
        None => Ok(true),
    }
}
