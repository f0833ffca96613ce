use cardano_bridge_common::{PolicyScript, Signature, VerificationKey, hash::KeyHash};
use minicbor::{Decoder, Encoder, decode, encode};

use crate::error::Entity;

const WITNESS_VKEYS: u64 = 0;
const WITNESS_NATIVE_SCRIPTS: u64 = 1;

/// Detached signature over a transaction body hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VKeyWitness {
    pub vkey: VerificationKey,
    pub signature: Signature,
}

impl VKeyWitness {
    pub fn new(vkey: VerificationKey, signature: Signature) -> Self {
        Self { vkey, signature }
    }

    /// Zero-filled witness with the encoded size of a real one
    pub fn placeholder() -> Self {
        Self::new(VerificationKey::zero(), Signature::zero())
    }

    pub fn key_hash(&self) -> KeyHash {
        self.vkey.hash()
    }

    /// Check the signature against a body hash (or any message)
    pub fn verify(&self, message: impl AsRef<[u8]>) -> bool {
        self.vkey.verify(message, &self.signature)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessSet {
    pub vkey_witnesses: Vec<VKeyWitness>,
    pub policy_scripts: Vec<PolicyScript>,
}

impl WitnessSet {
    pub fn is_empty(&self) -> bool {
        self.vkey_witnesses.is_empty() && self.policy_scripts.is_empty()
    }
}

impl Entity for VKeyWitness {
    const NAME: &'static str = "VKeyWitness";
}

impl Entity for WitnessSet {
    const NAME: &'static str = "WitnessSet";
}

impl<C> encode::Encode<C> for VKeyWitness {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?.encode_with(self.vkey, ctx)?.encode_with(self.signature, ctx)?;
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for VKeyWitness {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        if d.array()? != Some(2) {
            return Err(decode::Error::message("VKeyWitness must be a 2 element array"));
        }
        let vkey = d.decode_with(ctx)?;
        let signature = d.decode_with(ctx)?;
        Ok(Self::new(vkey, signature))
    }
}

impl<C> encode::Encode<C> for WitnessSet {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        let fields = u64::from(!self.vkey_witnesses.is_empty())
            + u64::from(!self.policy_scripts.is_empty());
        e.map(fields)?;
        if !self.vkey_witnesses.is_empty() {
            e.u64(WITNESS_VKEYS)?.encode_with(&self.vkey_witnesses, ctx)?;
        }
        if !self.policy_scripts.is_empty() {
            e.u64(WITNESS_NATIVE_SCRIPTS)?.encode_with(&self.policy_scripts, ctx)?;
        }
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for WitnessSet {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        let len = d
            .map()?
            .ok_or_else(|| decode::Error::message("WitnessSet must be a definite map"))?;

        let mut witness_set = WitnessSet::default();
        for _ in 0..len {
            match d.u64()? {
                WITNESS_VKEYS => witness_set.vkey_witnesses = d.decode_with(ctx)?,
                WITNESS_NATIVE_SCRIPTS => witness_set.policy_scripts = d.decode_with(ctx)?,
                key => {
                    return Err(decode::Error::message(format!(
                        "unsupported WitnessSet field {key}"
                    )));
                }
            }
        }
        Ok(witness_set)
    }
}
