use minicbor::{Decoder, Encoder, decode, encode};

use crate::{
    error::{CodecError, Entity, decode as decode_entity, decode_hex, encode as encode_entity},
    tx::Transaction,
    witness::VKeyWitness,
};

/// Hand-off blob from a signer to the submitter: `[transaction, witness]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WitnessEnvelope {
    pub transaction: Transaction,
    pub witness: VKeyWitness,
}

impl WitnessEnvelope {
    pub fn new(transaction: Transaction, witness: VKeyWitness) -> Self {
        Self {
            transaction,
            witness,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_entity(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        decode_entity(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        decode_hex(text)
    }
}

impl Entity for WitnessEnvelope {
    const NAME: &'static str = "WitnessEnvelope";
}

impl<C> encode::Encode<C> for WitnessEnvelope {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?.encode_with(&self.transaction, ctx)?.encode_with(self.witness, ctx)?;
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for WitnessEnvelope {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        if d.array()? != Some(2) {
            return Err(decode::Error::message("WitnessEnvelope must be a 2 element array"));
        }
        let transaction = d.decode_with(ctx)?;
        let witness = d.decode_with(ctx)?;
        Ok(Self::new(transaction, witness))
    }
}
