// Cardano bridge transaction construction - main library exports

pub mod batch;
pub mod builder;
pub mod coin_selection;
pub mod deposit;
pub mod error;
pub mod fee;
pub mod policy;
pub mod signing;
pub mod validation;

// Flattened re-exports
pub use self::batch::{BatchPlan, BatchRequest, build_batch};
pub use self::builder::{TTL_HORIZON, TxBuilder};
pub use self::coin_selection::select_inputs;
pub use self::deposit::{DepositPlan, DepositRequest, build_deposit};
pub use self::error::TxBuildError;
pub use self::fee::{LinearFee, compute_min_fee, placeholder_witnesses};
pub use self::policy::{build_k_of_n, policy_from_config};
pub use self::signing::{finalize_with_witnesses, hash_body, sign, sign_transaction, witness};
