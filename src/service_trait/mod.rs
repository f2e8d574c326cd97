pub mod alias_service;
pub use alias_service::*;

pub mod confirm_service;
pub use confirm_service::*;

pub mod migration_service;
pub use migration_service::*;

pub mod planner_service;
pub use planner_service::*;

pub mod progress_service;
pub use progress_service::*;

pub mod task_monitor_service;
pub use task_monitor_service::*;
