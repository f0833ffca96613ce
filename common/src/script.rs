use std::collections::HashSet;

use crate::{
    crypto::keyhash_224_tagged,
    hash::{KeyHash, ScriptHash},
    types::Slot,
};

/// Native (multisig / timelock) policy script
///
/// Encodes as the ledger's native script arrays:
/// `[0, keyhash]`, `[1, [..]]`, `[2, [..]]`, `[3, k, [..]]`, `[4, slot]`, `[5, slot]`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum PolicyScript {
    /// Requires a witness from the key with this hash
    Signature(KeyHash),
    AllOf(Vec<PolicyScript>),
    AnyOf(Vec<PolicyScript>),
    /// At least `threshold` of the children must hold
    AtLeast(u32, Vec<PolicyScript>),
    /// Valid only while the slot is before this one (the ledger's "invalid hereafter")
    TimeBefore(Slot),
    /// Valid only from this slot onwards (the ledger's "invalid before")
    TimeAfter(Slot),
}

impl<'b, C> minicbor::decode::Decode<'b, C> for PolicyScript {
    fn decode(d: &mut minicbor::Decoder<'b>, ctx: &mut C) -> Result<Self, minicbor::decode::Error> {
        let size = d.array()?;

        let assert_size = |expected| {
            // NOTE: unwrap_or allows for indefinite arrays.
            if expected != size.unwrap_or(expected) {
                return Err(minicbor::decode::Error::message(
                    "unexpected array size in PolicyScript",
                ));
            }
            Ok(())
        };

        let variant = d.u32()?;

        let script = match variant {
            0 => {
                assert_size(2)?;
                Ok(PolicyScript::Signature(d.decode_with(ctx)?))
            }
            1 => {
                assert_size(2)?;
                Ok(PolicyScript::AllOf(d.decode_with(ctx)?))
            }
            2 => {
                assert_size(2)?;
                Ok(PolicyScript::AnyOf(d.decode_with(ctx)?))
            }
            3 => {
                assert_size(3)?;
                Ok(PolicyScript::AtLeast(d.decode_with(ctx)?, d.decode_with(ctx)?))
            }
            4 => {
                assert_size(2)?;
                Ok(PolicyScript::TimeAfter(d.decode_with(ctx)?))
            }
            5 => {
                assert_size(2)?;
                Ok(PolicyScript::TimeBefore(d.decode_with(ctx)?))
            }
            _ => Err(minicbor::decode::Error::message(format!(
                "unknown variant id {variant} for PolicyScript"
            ))),
        }?;

        if size.is_none() {
            let next = d.datatype()?;
            if next != minicbor::data::Type::Break {
                return Err(minicbor::decode::Error::type_mismatch(next));
            }
            d.set_position(d.position() + 1);
        }

        Ok(script)
    }
}

impl<C> minicbor::encode::Encode<C> for PolicyScript {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        match self {
            PolicyScript::Signature(hash) => {
                e.array(2)?.u8(0)?;
                e.encode_with(hash, ctx)?;
            }
            PolicyScript::AllOf(scripts) => {
                e.array(2)?.u8(1)?;
                e.encode_with(scripts, ctx)?;
            }
            PolicyScript::AnyOf(scripts) => {
                e.array(2)?.u8(2)?;
                e.encode_with(scripts, ctx)?;
            }
            PolicyScript::AtLeast(threshold, scripts) => {
                e.array(3)?.u8(3)?.u32(*threshold)?;
                e.encode_with(scripts, ctx)?;
            }
            PolicyScript::TimeAfter(slot) => {
                e.array(2)?.u8(4)?.u64(*slot)?;
            }
            PolicyScript::TimeBefore(slot) => {
                e.array(2)?.u8(5)?.u64(*slot)?;
            }
        }

        Ok(())
    }
}

impl PolicyScript {
    /// Script hash: Blake2b-224 over the native script tag (0) and the CBOR of the script
    pub fn compute_hash(&self) -> ScriptHash {
        let raw_bytes = minicbor::to_vec(self).expect("Failed to encode PolicyScript to CBOR");
        keyhash_224_tagged(0, &raw_bytes)
    }

    /// Evaluate the script against a set of key hashes that provided witnesses and
    /// the transaction validity interval `[low_bnd, upp_bnd)`
    pub fn eval(
        &self,
        vkey_hashes_provided: &HashSet<KeyHash>,
        low_bnd: Option<Slot>,
        upp_bnd: Option<Slot>,
    ) -> bool {
        match self {
            Self::AllOf(scripts) => {
                scripts.iter().all(|script| script.eval(vkey_hashes_provided, low_bnd, upp_bnd))
            }
            Self::AnyOf(scripts) => {
                scripts.iter().any(|script| script.eval(vkey_hashes_provided, low_bnd, upp_bnd))
            }
            Self::Signature(hash) => vkey_hashes_provided.contains(hash),
            Self::AtLeast(threshold, scripts) => {
                let count = scripts
                    .iter()
                    .filter(|script| script.eval(vkey_hashes_provided, low_bnd, upp_bnd))
                    .count();
                count >= *threshold as usize
            }
            Self::TimeAfter(slot) => match low_bnd {
                Some(low) => *slot <= low,
                None => false,
            },
            Self::TimeBefore(slot) => match upp_bnd {
                Some(upp) => *slot >= upp,
                None => false,
            },
        }
    }

    /// Number of key participants anywhere in the script. This is the largest
    /// number of witnesses a complete signing round can attach.
    pub fn signer_count(&self) -> usize {
        match self {
            Self::Signature(_) => 1,
            Self::AllOf(scripts) | Self::AnyOf(scripts) | Self::AtLeast(_, scripts) => {
                scripts.iter().map(PolicyScript::signer_count).sum()
            }
            Self::TimeBefore(_) | Self::TimeAfter(_) => 0,
        }
    }

    /// Fewest witnesses that can satisfy the script
    pub fn required_signers(&self) -> usize {
        match self {
            Self::Signature(_) => 1,
            Self::AllOf(scripts) => scripts.iter().map(PolicyScript::required_signers).sum(),
            Self::AnyOf(scripts) => {
                scripts.iter().map(PolicyScript::required_signers).min().unwrap_or(0)
            }
            Self::AtLeast(threshold, scripts) => {
                let mut costs: Vec<usize> =
                    scripts.iter().map(PolicyScript::required_signers).collect();
                costs.sort_unstable();
                costs.into_iter().take(*threshold as usize).sum()
            }
            Self::TimeBefore(_) | Self::TimeAfter(_) => 0,
        }
    }

    /// Every key hash referenced by the script, in declaration order
    pub fn key_hashes(&self) -> Vec<KeyHash> {
        let mut hashes = Vec::new();
        self.collect_key_hashes(&mut hashes);
        hashes
    }

    fn collect_key_hashes(&self, hashes: &mut Vec<KeyHash>) {
        match self {
            Self::Signature(hash) => hashes.push(*hash),
            Self::AllOf(scripts) | Self::AnyOf(scripts) | Self::AtLeast(_, scripts) => {
                scripts.iter().for_each(|script| script.collect_key_hashes(hashes))
            }
            Self::TimeBefore(_) | Self::TimeAfter(_) => {}
        }
    }
}
