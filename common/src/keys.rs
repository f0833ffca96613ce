//! Ed25519 keys used to witness transactions
//!
use crate::{crypto::keyhash_224, hash::KeyHash};
use cryptoxide::ed25519::{self, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use std::{convert::TryFrom, fmt, str::FromStr};
use thiserror::Error;

/// Ed25519 verification key. Can be used to verify a [`Signature`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerificationKey([u8; Self::SIZE]);

/// Ed25519 Signature. Is created by a [`SigningKey`] and is verified
/// with a [`VerificationKey`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; Self::SIZE]);

/// Ed25519 signing key, either a 32 byte seed or a 64 byte extended
/// (BIP32-Ed25519 derived) secret.
#[derive(Clone)]
pub struct SigningKey {
    secret: Secret,
    public: VerificationKey,
}

#[derive(Clone)]
enum Secret {
    Normal([u8; 64]),
    Extended([u8; 64]),
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid size {0}, expecting {expected}", expected = VerificationKey::SIZE)]
    InvalidVerificationKeySize(usize),

    #[error("Invalid size {0}, expecting {expected}", expected = Signature::SIZE)]
    InvalidSignatureSize(usize),

    #[error("Invalid signing key size {0}, expecting 32 or 64")]
    InvalidSigningKeySize(usize),

    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

macro_rules! impl_size_zero {
    ($Type:ty, $Size:expr) => {
        impl $Type {
            /// This is the size of the type in bytes.
            pub const SIZE: usize = $Size;

            #[inline]
            pub const fn zero() -> Self {
                Self([0; Self::SIZE])
            }
        }
    };
}

impl_size_zero!(VerificationKey, PUBLIC_KEY_LENGTH);
impl_size_zero!(Signature, SIGNATURE_LENGTH);

impl VerificationKey {
    /// verify the cryptographic [`Signature`] against the `message` and the
    /// [`VerificationKey`] `self`.
    #[inline]
    pub fn verify<T>(&self, message: T, signature: &Signature) -> bool
    where
        T: AsRef<[u8]>,
    {
        ed25519::verify(message.as_ref(), &self.0, &signature.0)
    }

    /// Blake2b-224 of the key, as referenced by policy scripts and addresses
    pub fn hash(&self) -> KeyHash {
        keyhash_224(&self.0)
    }
}

impl SigningKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(bytes);
                let (keypair, public) = ed25519::keypair(&seed);
                Ok(Self {
                    secret: Secret::Normal(keypair),
                    public: VerificationKey(public),
                })
            }
            64 => {
                let mut extended = [0u8; 64];
                extended.copy_from_slice(bytes);
                let public = ed25519::extended_to_public(&extended);
                Ok(Self {
                    secret: Secret::Extended(extended),
                    public: VerificationKey(public),
                })
            }
            n => Err(KeyError::InvalidSigningKeySize(n)),
        }
    }

    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        Self::from_bytes(&hex::decode(text.trim())?)
    }

    pub fn public_key(&self) -> VerificationKey {
        self.public
    }

    pub fn sign<T>(&self, message: T) -> Signature
    where
        T: AsRef<[u8]>,
    {
        match &self.secret {
            Secret::Normal(keypair) => Signature(ed25519::signature(message.as_ref(), keypair)),
            Secret::Extended(extended) => {
                Signature(ed25519::signature_extended(message.as_ref(), extended))
            }
        }
    }
}

/* Format ****************************************************************** */

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_ref()))
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_ref()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature<Ed25519>").field(&hex::encode(self.as_ref())).finish()
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerificationKey<Ed25519>").field(&hex::encode(self.as_ref())).finish()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey").field("public", &self.public).finish_non_exhaustive()
    }
}

/* AsRef ******************************************************************* */

impl AsRef<[u8]> for VerificationKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/* Conversion ************************************************************** */

impl From<[u8; Self::SIZE]> for VerificationKey {
    fn from(bytes: [u8; Self::SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<[u8; Self::SIZE]> for Signature {
    fn from(bytes: [u8; Self::SIZE]) -> Self {
        Self(bytes)
    }
}

impl<'a> TryFrom<&'a [u8]> for VerificationKey {
    type Error = KeyError;
    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        if value.len() != Self::SIZE {
            Err(KeyError::InvalidVerificationKeySize(value.len()))
        } else {
            let mut s = Self::zero();
            s.0.copy_from_slice(value);
            Ok(s)
        }
    }
}

impl<'a> TryFrom<&'a [u8]> for Signature {
    type Error = KeyError;
    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        if value.len() != Self::SIZE {
            Err(KeyError::InvalidSignatureSize(value.len()))
        } else {
            let mut s = Self::zero();
            s.0.copy_from_slice(value);
            Ok(s)
        }
    }
}

impl FromStr for VerificationKey {
    type Err = hex::FromHexError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut r = Self::zero();
        hex::decode_to_slice(s, &mut r.0)?;
        Ok(r)
    }
}

impl FromStr for Signature {
    type Err = hex::FromHexError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut r = Self::zero();
        hex::decode_to_slice(s, &mut r.0)?;
        Ok(r)
    }
}

/* CBOR ******************************************************************** */

macro_rules! impl_cbor_bytes {
    ($Type:ty) => {
        impl<C> minicbor::Encode<C> for $Type {
            fn encode<W: minicbor::encode::Write>(
                &self,
                e: &mut minicbor::Encoder<W>,
                _ctx: &mut C,
            ) -> Result<(), minicbor::encode::Error<W::Error>> {
                e.bytes(&self.0)?.ok()
            }
        }

        impl<'a, C> minicbor::Decode<'a, C> for $Type {
            fn decode(
                d: &mut minicbor::Decoder<'a>,
                _ctx: &mut C,
            ) -> Result<Self, minicbor::decode::Error> {
                <$Type>::try_from(d.bytes()?)
                    .map_err(|e| minicbor::decode::Error::message(e.to_string()))
            }
        }
    };
}

impl_cbor_bytes!(VerificationKey);
impl_cbor_bytes!(Signature);

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, TestResult};
    use quickcheck_macros::quickcheck;

    impl Arbitrary for VerificationKey {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut s = Self::zero();
            s.0.iter_mut().for_each(|byte| {
                *byte = u8::arbitrary(g);
            });
            s
        }
    }

    impl Arbitrary for Signature {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut s = Self::zero();
            s.0.iter_mut().for_each(|byte| {
                *byte = u8::arbitrary(g);
            });
            s
        }
    }

    #[derive(Clone, Debug)]
    struct Seed([u8; 32]);

    impl Arbitrary for Seed {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut seed = [0u8; 32];
            seed.iter_mut().for_each(|byte| *byte = u8::arbitrary(g));
            Seed(seed)
        }
    }

    #[quickcheck]
    fn verify_random_signature_does_not_work(
        key: VerificationKey,
        signature: Signature,
        message: Vec<u8>,
    ) -> bool {
        // 2^-96 chance of a false positive even for an empty message
        !key.verify(message, &signature)
    }

    #[quickcheck]
    fn sign_then_verify(seed: Seed, message: Vec<u8>) -> bool {
        let key = SigningKey::from_bytes(&seed.0).unwrap();
        let signature = key.sign(&message);
        key.public_key().verify(&message, &signature)
    }

    #[quickcheck]
    fn signature_bound_to_message(seed: Seed, message: Vec<u8>) -> TestResult {
        let key = SigningKey::from_bytes(&seed.0).unwrap();
        let signature = key.sign(&message);
        let mut tampered = message.clone();
        tampered.push(0);
        TestResult::from_bool(!key.public_key().verify(&tampered, &signature))
    }

    #[quickcheck]
    fn verification_key_try_from_incorrect_size(bytes: Vec<u8>) -> TestResult {
        if bytes.len() == VerificationKey::SIZE {
            return TestResult::discard();
        }
        match VerificationKey::try_from(bytes.as_slice()) {
            Ok(_) => TestResult::error(
                "Expecting to fail with invalid size instead of having a valid value",
            ),
            Err(KeyError::InvalidVerificationKeySize(n)) => TestResult::from_bool(n == bytes.len()),
            Err(e) => TestResult::error(e.to_string()),
        }
    }

    #[quickcheck]
    fn signature_from_str(signature: Signature) -> TestResult {
        let s = signature.to_string();

        match s.parse::<Signature>() {
            Ok(decoded) => TestResult::from_bool(decoded == signature),
            Err(error) => TestResult::error(error.to_string()),
        }
    }

    #[test]
    fn signing_key_sizes() {
        assert!(SigningKey::from_bytes(&[7u8; 32]).is_ok());
        assert!(SigningKey::from_bytes(&[7u8; 31]).is_err());
        assert!(matches!(
            SigningKey::from_hex("abcd"),
            Err(KeyError::InvalidSigningKeySize(2))
        ));
        assert!(matches!(SigningKey::from_hex("zz"), Err(KeyError::Hex(_))));
    }

    #[test]
    fn extended_key_signs_verifiably() {
        // An extended secret is the clamped SHA-512 expansion of a seed; the
        // scalar half must have its low three bits cleared and bit 254 set.
        let mut extended = [0x42u8; 64];
        extended[0] &= 0b1111_1000;
        extended[31] &= 0b0111_1111;
        extended[31] |= 0b0100_0000;
        let key = SigningKey::from_bytes(&extended).unwrap();
        let signature = key.sign(b"body hash");
        assert!(key.public_key().verify(b"body hash", &signature));
    }

    #[test]
    fn key_hash_is_28_bytes() {
        let key = SigningKey::from_bytes(&[1u8; 32]).unwrap();
        assert_eq!(key.public_key().hash().len(), 28);
        assert_eq!(key.public_key().hash(), keyhash_224(key.public_key().as_ref()));
    }
}
