pub mod active_manager;
pub mod ledger;
pub mod migrator;
pub mod record;
pub mod roles;

pub use active_manager::*;
pub use ledger::*;
pub use migrator::*;
pub use record::*;
pub use roles::*;
