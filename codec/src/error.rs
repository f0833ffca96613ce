use minicbor::{Decode, Encode};
use thiserror::Error;

/// Decoding failure, naming the entity that could not be read
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode {entity}: {source}")]
    Decode {
        entity: &'static str,
        source: minicbor::decode::Error,
    },

    #[error("{remaining} trailing bytes after {entity}")]
    TrailingBytes {
        entity: &'static str,
        remaining: usize,
    },

    #[error("invalid hex for {entity}: {source}")]
    Hex {
        entity: &'static str,
        source: hex::FromHexError,
    },
}

/// A value with a canonical CBOR form
pub trait Entity: Encode<()> + for<'b> Decode<'b, ()> {
    /// Name reported in decode errors
    const NAME: &'static str;
}

/// Canonical encoding of `value`
pub fn encode<T: Entity>(value: &T) -> Vec<u8> {
    // Writing to a Vec is infallible and every entity encoder is total
    minicbor::to_vec(value).expect("Failed to encode entity to CBOR")
}

/// Decode exactly one `T` from `bytes`
pub fn decode<T: Entity>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut decoder = minicbor::Decoder::new(bytes);
    let value = decoder.decode::<T>().map_err(|source| CodecError::Decode {
        entity: T::NAME,
        source,
    })?;

    let remaining = bytes.len() - decoder.position();
    if remaining > 0 {
        return Err(CodecError::TrailingBytes {
            entity: T::NAME,
            remaining,
        });
    }
    Ok(value)
}

pub fn decode_hex<T: Entity>(text: &str) -> Result<T, CodecError> {
    let bytes = hex::decode(text.trim()).map_err(|source| CodecError::Hex {
        entity: T::NAME,
        source,
    })?;
    decode(&bytes)
}
