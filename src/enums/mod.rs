pub mod alias_action;
pub use alias_action::*;

pub mod migration_state;
pub use migration_state::*;

pub mod migration_step;
pub use migration_step::*;
