//! Deterministic block replay for the IPALA keeper.
//!
//! Loads a TOML scenario (keeper config, genesis balances, blocks of claims),
//! replays it against an in-memory store and reports every block result plus
//! the final registry, queue and balances.

#![deny(unsafe_code)]

mod runner;
mod scenario;

pub use runner::{run, AccountBalances, BlockReport, RunOptions, SimReport, TxReport};
pub use scenario::{BlockSpec, GenesisAccount, SimConfig};
