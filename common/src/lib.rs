// Cardano bridge common library - main library exports

pub mod address;
pub mod configuration;
pub mod crypto;
pub mod hash;
pub mod keys;
pub mod metadata;
pub mod protocol_params;
pub mod script;
pub mod types;
pub mod validation;

// Flattened re-exports
pub use self::address::{Address, AddressError};
pub use self::hash::{AuxiliaryDataHash, Hash, KeyHash, ScriptHash, TxHash};
pub use self::keys::{KeyError, Signature, SigningKey, VerificationKey};
pub use self::metadata::{Metadata, Metadatum, MetadatumLabel};
pub use self::protocol_params::{ProtocolParameters, ProtocolVersion};
pub use self::script::PolicyScript;
pub use self::types::*;
pub use self::validation::{InsufficientFundsError, PolicyError, ValidationError};
