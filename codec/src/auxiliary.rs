use cardano_bridge_common::{AuxiliaryDataHash, Metadata, crypto::hash_256};
use minicbor::{Decoder, Encoder, data::Tag, decode, encode};

use crate::error::{Entity, encode as encode_entity};

/// Tag marking the post-Alonzo auxiliary data map
pub const AUXILIARY_DATA_TAG: u64 = 259;

const AUX_METADATA: u64 = 0;

/// Transaction auxiliary data: `#6.259({0: {label: metadatum}})`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxiliaryData {
    pub metadata: Metadata,
}

impl AuxiliaryData {
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }

    /// Hash committed to by the transaction body
    pub fn hash(&self) -> AuxiliaryDataHash {
        hash_256(&encode_entity(self))
    }
}

impl Entity for AuxiliaryData {
    const NAME: &'static str = "AuxiliaryData";
}

impl<C> encode::Encode<C> for AuxiliaryData {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.tag(Tag::new(AUXILIARY_DATA_TAG))?;
        let fields = u64::from(!self.metadata.is_empty());
        e.map(fields)?;
        if !self.metadata.is_empty() {
            e.u64(AUX_METADATA)?.map(self.metadata.len() as u64)?;
            for (label, metadatum) in &self.metadata {
                e.u64(*label)?.encode_with(metadatum, ctx)?;
            }
        }
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for AuxiliaryData {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        let tag = d.tag()?;
        if tag.as_u64() != AUXILIARY_DATA_TAG {
            return Err(decode::Error::message(format!(
                "expected tag {AUXILIARY_DATA_TAG}, found {}",
                tag.as_u64()
            )));
        }

        let len = d
            .map()?
            .ok_or_else(|| decode::Error::message("AuxiliaryData must be a definite map"))?;

        let mut auxiliary_data = AuxiliaryData::default();
        for _ in 0..len {
            match d.u64()? {
                AUX_METADATA => {
                    let entries = d
                        .map()?
                        .ok_or_else(|| decode::Error::message("metadata must be a definite map"))?;
                    for _ in 0..entries {
                        let label = d.u64()?;
                        let metadatum = d.decode_with(ctx)?;
                        if auxiliary_data.metadata.insert(label, metadatum).is_some() {
                            return Err(decode::Error::message(format!(
                                "duplicate metadata label {label}"
                            )));
                        }
                    }
                }
                key => {
                    return Err(decode::Error::message(format!(
                        "unsupported AuxiliaryData field {key}"
                    )));
                }
            }
        }
        Ok(auxiliary_data)
    }
}
