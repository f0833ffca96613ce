mod auxiliary;
mod envelope;
mod error;
mod tx;
mod witness;

pub use auxiliary::*;
pub use envelope::*;
pub use error::*;
pub use tx::*;
pub use witness::*;
