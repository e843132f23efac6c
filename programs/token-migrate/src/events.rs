//! Event logging for the migration program
//!
//! Events are append-only log lines; the program never reads them back.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{msg, pubkey::Pubkey};

use crate::constants::EVENT_LOG_MARKER;

/// Event type discriminator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    // Role events
    OutputManagerAdded = 1,
    OutputManagerRemoved = 2,
    RecovererAdded = 3,
    RecovererRemoved = 4,
    ActiveOutputManagerSet = 5,

    // Token flow events
    Migrated = 10,
    TokensRecovered = 11,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub enum MigrateEvent {
    OutputManagerAdded {
        account: Pubkey,
    },
    OutputManagerRemoved {
        account: Pubkey,
    },
    RecovererAdded {
        account: Pubkey,
    },
    RecovererRemoved {
        account: Pubkey,
    },
    ActiveOutputManagerSet {
        active_manager: Pubkey,
    },
    Migrated {
        migrator: Pubkey,
        migrated_tokens: u128,
        distributed_tokens: u128,
    },
    TokensRecovered {
        recoverer: Pubkey,
        token: Pubkey,
        amount: u128,
    },
}

impl MigrateEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::OutputManagerAdded { .. } => EventType::OutputManagerAdded,
            Self::OutputManagerRemoved { .. } => EventType::OutputManagerRemoved,
            Self::RecovererAdded { .. } => EventType::RecovererAdded,
            Self::RecovererRemoved { .. } => EventType::RecovererRemoved,
            Self::ActiveOutputManagerSet { .. } => EventType::ActiveOutputManagerSet,
            Self::Migrated { .. } => EventType::Migrated,
            Self::TokensRecovered { .. } => EventType::TokensRecovered,
        }
    }

    pub fn emit(&self) {
        emit_event(self.event_type(), self);
    }
}

/// Emit event to program logs
pub fn emit_event<T: BorshSerialize>(event_type: EventType, event_data: &T) {
    msg!("{}", EVENT_LOG_MARKER);
    msg!("TYPE:{:?}", event_type);

    if let Ok(data) = event_data.try_to_vec() {
        msg!("DATA:{}", bs58::encode(&data).into_string());
    }
}

/// Decode the payload of a `DATA:` log line back into an event
pub fn parse_event_data(log: &str) -> Option<MigrateEvent> {
    let encoded = log
        .trim_start_matches("Program log: ")
        .strip_prefix("DATA:")?;
    let bytes = bs58::decode(encoded).into_vec().ok()?;
    MigrateEvent::try_from_slice(&bytes).ok()
}
