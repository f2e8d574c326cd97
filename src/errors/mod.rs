pub mod gateway_error;
pub use gateway_error::*;

pub mod migration_error;
pub use migration_error::*;
