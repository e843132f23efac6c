pub mod migration;
pub mod recovery;

pub use migration::MigrationEngine;
pub use recovery::RecoveryEngine;
