//! Payment gateway connection settings.
//!
//! Each provider carries its own credential shape; secrets are held in
//! [`secrecy::SecretString`] so they never show up in `Debug` output or logs.

mod credentials;
mod methods;

pub use credentials::*;
pub use methods::*;
