// SPL Token Migration Program
// Native Solana implementation - NO ANCHOR

use solana_program::entrypoint;

pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod instruction;
pub mod processor;
pub mod state;
pub mod token;

// Program ID
solana_program::declare_id!("TokenMigrate1111111111111111111111111111111");

pub use crate::error::*;
pub use crate::events::*;
pub use crate::processor::*;

// Program entrypoint
#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process_instruction);
