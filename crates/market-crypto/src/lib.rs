//! Hash oracles for the market catalog.
//!
//! An oracle maps an item's [`CanonicalFields`](market_types::CanonicalFields)
//! to a fixed-size [`ContentHash`](market_types::ContentHash). Two oracles
//! ship here:
//!
//! - [`Keccak256Oracle`] -- Keccak-256 over the Solidity tightly-packed
//!   encoding, the value `soliditySha3(string,string,string,string,string)`
//!   produces. This is the default so hashes can be re-checked on-chain.
//! - [`Blake3Oracle`] -- domain-separated, length-prefixed BLAKE3.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod domain;
pub mod keccak;
pub mod oracle;

pub use domain::Blake3Oracle;
pub use keccak::Keccak256Oracle;
pub use oracle::{HashAlgorithm, HashOracle, OracleError, OracleResult};
