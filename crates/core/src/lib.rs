// Barrister Core - Contract, Envelopes & Ports
// NO transport dependencies: everything here is pure data and logic

pub mod contract;
pub mod error;
pub mod port;
pub mod protocol;

pub use contract::{Coercer, Contract, DefaultCoercer, ValidationError};
pub use error::{ContractError, Result};
pub use protocol::{error_code, ErrorObject, Request, Response, IDL_METHOD};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
