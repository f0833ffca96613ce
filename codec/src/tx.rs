//! Transaction model and its canonical encoding
//!
//! ```text
//! transaction = [body, witness_set, is_valid, auxiliary_data / null]
//! body        = { 0: [* input], 1: [* output], 2: fee, 3: ttl, ? 7: auxiliary_data_hash }
//! input       = [tx_hash, index]
//! output      = [address, amount]
//! ```

use cardano_bridge_common::{
    Address, AuxiliaryDataHash, Lovelace, Slot, TxHash, crypto::hash_256,
};
use minicbor::{Decoder, Encoder, decode, encode};

use crate::{
    auxiliary::AuxiliaryData,
    error::{CodecError, Entity, decode_hex, encode as encode_entity},
    witness::WitnessSet,
};

const BODY_INPUTS: u64 = 0;
const BODY_OUTPUTS: u64 = 1;
const BODY_FEE: u64 = 2;
const BODY_TTL: u64 = 3;
const BODY_AUX_DATA_HASH: u64 = 7;

/// Reference to an unspent output, with the amount it carries
///
/// `amount` is not part of the encoding; a decoded input carries 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    pub tx_hash: TxHash,
    pub index: u16,
    pub amount: Lovelace,
}

impl TxInput {
    pub fn new(tx_hash: TxHash, index: u16, amount: Lovelace) -> Self {
        Self {
            tx_hash,
            index,
            amount,
        }
    }

    /// The `(tx_hash, index)` pair naming the spent output
    pub fn outpoint(&self) -> (TxHash, u16) {
        (self.tx_hash, self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub address: Address,
    pub amount: Lovelace,
}

impl TxOutput {
    pub fn new(address: Address, amount: Lovelace) -> Self {
        Self { address, amount }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxBody {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub fee: Lovelace,
    /// Absolute slot after which the transaction is invalid
    pub ttl: Slot,
    pub auxiliary_data_hash: Option<AuxiliaryDataHash>,
}

impl TxBody {
    /// Blake2b-256 of the encoded body; this is what witnesses sign
    pub fn hash(&self) -> TxHash {
        hash_256(&encode_entity(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub body: TxBody,
    pub witness_set: WitnessSet,
    pub is_valid: bool,
    pub auxiliary_data: Option<AuxiliaryData>,
}

impl Default for Transaction {
    fn default() -> Self {
        Self {
            body: TxBody::default(),
            witness_set: WitnessSet::default(),
            is_valid: true,
            auxiliary_data: None,
        }
    }
}

impl Transaction {
    /// Transaction id
    pub fn hash(&self) -> TxHash {
        self.body.hash()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        encode_entity(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        crate::error::decode(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        decode_hex(text)
    }

    /// Encoded size in bytes
    pub fn size(&self) -> u64 {
        self.to_bytes().len() as u64
    }
}

impl Entity for TxInput {
    const NAME: &'static str = "TxInput";
}

impl Entity for TxOutput {
    const NAME: &'static str = "TxOutput";
}

impl Entity for TxBody {
    const NAME: &'static str = "TxBody";
}

impl Entity for Transaction {
    const NAME: &'static str = "Transaction";
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &str) -> Result<(), decode::Error> {
    match slot.replace(value) {
        Some(_) => Err(decode::Error::message(format!("duplicate TxBody field {field}"))),
        None => Ok(()),
    }
}

fn expect_array(d: &mut Decoder<'_>, len: u64, entity: &str) -> Result<(), decode::Error> {
    match d.array()? {
        Some(n) if n == len => Ok(()),
        _ => Err(decode::Error::message(format!(
            "{entity} must be a {len} element array"
        ))),
    }
}

impl<C> encode::Encode<C> for TxInput {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?.encode_with(self.tx_hash, ctx)?.u16(self.index)?;
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for TxInput {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        expect_array(d, 2, "TxInput")?;
        let tx_hash = d.decode_with(ctx)?;
        let index = d.u16()?;
        Ok(Self::new(tx_hash, index, 0))
    }
}

impl<C> encode::Encode<C> for TxOutput {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(2)?.encode_with(&self.address, ctx)?.u64(self.amount)?;
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for TxOutput {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        expect_array(d, 2, "TxOutput")?;
        let address = d.decode_with(ctx)?;
        let amount = d.u64()?;
        Ok(Self::new(address, amount))
    }
}

impl<C> encode::Encode<C> for TxBody {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        let fields = if self.auxiliary_data_hash.is_some() { 5 } else { 4 };
        e.map(fields)?;
        e.u64(BODY_INPUTS)?.encode_with(&self.inputs, ctx)?;
        e.u64(BODY_OUTPUTS)?.encode_with(&self.outputs, ctx)?;
        e.u64(BODY_FEE)?.u64(self.fee)?;
        e.u64(BODY_TTL)?.u64(self.ttl)?;
        if let Some(hash) = &self.auxiliary_data_hash {
            e.u64(BODY_AUX_DATA_HASH)?.encode_with(hash, ctx)?;
        }
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for TxBody {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        let len = d
            .map()?
            .ok_or_else(|| decode::Error::message("TxBody must be a definite map"))?;

        let mut inputs = None;
        let mut outputs = None;
        let mut fee = None;
        let mut ttl = None;
        let mut auxiliary_data_hash = None;

        for _ in 0..len {
            match d.u64()? {
                BODY_INPUTS => set_once(&mut inputs, d.decode_with(ctx)?, "inputs")?,
                BODY_OUTPUTS => set_once(&mut outputs, d.decode_with(ctx)?, "outputs")?,
                BODY_FEE => set_once(&mut fee, d.u64()?, "fee")?,
                BODY_TTL => set_once(&mut ttl, d.u64()?, "ttl")?,
                BODY_AUX_DATA_HASH => {
                    set_once(&mut auxiliary_data_hash, d.decode_with(ctx)?, "auxiliary_data_hash")?
                }
                key => {
                    return Err(decode::Error::message(format!(
                        "unsupported TxBody field {key}"
                    )));
                }
            }
        }

        let missing = |field: &str| decode::Error::message(format!("TxBody is missing {field}"));
        Ok(Self {
            inputs: inputs.ok_or_else(|| missing("inputs"))?,
            outputs: outputs.ok_or_else(|| missing("outputs"))?,
            fee: fee.ok_or_else(|| missing("fee"))?,
            ttl: ttl.ok_or_else(|| missing("ttl"))?,
            auxiliary_data_hash,
        })
    }
}

impl<C> encode::Encode<C> for Transaction {
    fn encode<W: encode::Write>(
        &self,
        e: &mut Encoder<W>,
        ctx: &mut C,
    ) -> Result<(), encode::Error<W::Error>> {
        e.array(4)?;
        e.encode_with(&self.body, ctx)?;
        e.encode_with(&self.witness_set, ctx)?;
        e.bool(self.is_valid)?;
        match &self.auxiliary_data {
            Some(auxiliary_data) => e.encode_with(auxiliary_data, ctx)?,
            None => e.null()?,
        };
        Ok(())
    }
}

impl<'b, C> decode::Decode<'b, C> for Transaction {
    fn decode(d: &mut Decoder<'b>, ctx: &mut C) -> Result<Self, decode::Error> {
        expect_array(d, 4, "Transaction")?;
        let body = d.decode_with(ctx)?;
        let witness_set = d.decode_with(ctx)?;
        let is_valid = d.bool()?;
        let auxiliary_data = if d.datatype()? == minicbor::data::Type::Null {
            d.null()?;
            None
        } else {
            Some(d.decode_with(ctx)?)
        };
        Ok(Self {
            body,
            witness_set,
            is_valid,
            auxiliary_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::decode as decode_entity, witness::VKeyWitness};
    use cardano_bridge_common::{
        Metadatum, NetworkId, PolicyScript, Signature, VerificationKey, crypto::keyhash_224,
    };
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;
    use std::collections::BTreeMap;

    fn address(n: u8) -> Address {
        Address::enterprise(NetworkId::Testnet, &keyhash_224(&[n]))
    }

    fn body() -> TxBody {
        TxBody {
            inputs: vec![TxInput::new(TxHash::new([1; 32]), 0, 0)],
            outputs: vec![TxOutput::new(address(1), 1_000_000)],
            fee: 170_000,
            ttl: 1_300,
            auxiliary_data_hash: None,
        }
    }

    #[derive(Clone, Debug)]
    struct ArbitraryBody(TxBody);

    impl Arbitrary for ArbitraryBody {
        fn arbitrary(g: &mut Gen) -> Self {
            let inputs = (0..u8::arbitrary(g) % 4)
                .map(|n| TxInput::new(TxHash::new([n; 32]), u16::arbitrary(g), 0))
                .collect();
            let outputs = (0..u8::arbitrary(g) % 4)
                .map(|n| TxOutput::new(address(n), u64::arbitrary(g)))
                .collect();
            ArbitraryBody(TxBody {
                inputs,
                outputs,
                fee: u64::arbitrary(g),
                ttl: u64::arbitrary(g),
                auxiliary_data_hash: bool::arbitrary(g).then(|| hash_256(&[u8::arbitrary(g)])),
            })
        }
    }

    #[test]
    fn input_is_hash_and_index_only() {
        let input = TxInput::new(TxHash::new([0xab; 32]), 3, 5_000_000);
        let bytes = encode_entity(&input);
        assert_eq!(bytes.len(), 1 + 2 + 32 + 1);
        assert_eq!(bytes[0], 0x82);
        assert_eq!(*bytes.last().unwrap(), 0x03);
        assert_eq!(decode_entity::<TxInput>(&bytes).unwrap().amount, 0);
    }

    #[test]
    fn body_fields_in_key_order() {
        let bytes = encode_entity(&body());
        assert_eq!(bytes[0], 0xa4);
        assert_eq!(bytes[1], 0x00);

        let mut with_metadata = body();
        with_metadata.auxiliary_data_hash = Some(hash_256(b"aux"));
        assert_eq!(encode_entity(&with_metadata)[0], 0xa5);
    }

    #[test]
    fn fee_width_changes_size() {
        let mut small = body();
        small.fee = 23;
        let mut large = body();
        large.fee = 24;
        assert_eq!(encode_entity(&large).len(), encode_entity(&small).len() + 1);
    }

    #[quickcheck]
    fn body_round_trip(body: ArbitraryBody) -> bool {
        decode_entity::<TxBody>(&encode_entity(&body.0)).unwrap() == body.0
    }

    #[quickcheck]
    fn body_hash_is_stable(body: ArbitraryBody) -> bool {
        body.0.hash() == body.0.clone().hash()
            && body.0.hash() == decode_entity::<TxBody>(&encode_entity(&body.0)).unwrap().hash()
    }

    #[test]
    fn transaction_round_trip() {
        let mut metadata = BTreeMap::new();
        metadata.insert(1, Metadatum::record([("batch_nonce_id", Metadatum::uint(1))]));
        let tx = Transaction {
            body: body(),
            witness_set: WitnessSet {
                vkey_witnesses: vec![VKeyWitness::new(VerificationKey::zero(), Signature::zero())],
                policy_scripts: vec![PolicyScript::Signature(keyhash_224(b"k"))],
            },
            is_valid: true,
            auxiliary_data: Some(AuxiliaryData::new(metadata)),
        };

        let decoded = Transaction::from_hex(&tx.to_hex()).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.body.hash());
    }

    #[test]
    fn transaction_without_metadata_ends_with_null() {
        let tx = Transaction {
            body: body(),
            ..Default::default()
        };
        let bytes = tx.to_bytes();
        assert_eq!(bytes[0], 0x84);
        assert_eq!(&bytes[bytes.len() - 3..], &[0xa0, 0xf5, 0xf6]);
        assert_eq!(tx.size(), bytes.len() as u64);
    }

    #[test]
    fn decode_errors_name_the_entity() {
        let err = Transaction::from_bytes(&[0x83, 0x00]).unwrap_err();
        assert!(err.to_string().contains("Transaction"));

        let err = decode_entity::<TxOutput>(&[0x82]).unwrap_err();
        assert!(err.to_string().contains("TxOutput"));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut bytes = encode_entity(&body());
        bytes.push(0x00);
        assert!(matches!(
            decode_entity::<TxBody>(&bytes),
            Err(CodecError::TrailingBytes { remaining: 1, .. })
        ));
    }

    #[test]
    fn body_missing_fields() {
        // {0: []}
        let err = decode_entity::<TxBody>(&[0xa1, 0x00, 0x80]).unwrap_err();
        assert!(err.to_string().contains("missing outputs"));
    }

    #[test]
    fn body_repeated_field_rejected() {
        // {2: 1, 2: 2, 0: [], 1: [], 3: 0}
        let bytes = [0xa5, 0x02, 0x01, 0x02, 0x02, 0x00, 0x80, 0x01, 0x80, 0x03, 0x00];
        let err = decode_entity::<TxBody>(&bytes).unwrap_err();
        assert!(err.to_string().contains("duplicate TxBody field fee"));
    }

    #[test]
    fn outpoint_ignores_amount() {
        let a = TxInput::new(TxHash::new([4; 32]), 1, 5_000_000);
        let b = TxInput::new(TxHash::new([4; 32]), 1, 0);
        assert_eq!(a.outpoint(), b.outpoint());
        assert_ne!(a.outpoint(), TxInput::new(TxHash::new([4; 32]), 2, 0).outpoint());
    }
}
