pub mod alias_service_impl;
pub use alias_service_impl::*;

pub mod confirm_service_impl;
pub use confirm_service_impl::*;

pub mod migration_service_impl;
pub use migration_service_impl::*;

pub mod planner_service_impl;
pub use planner_service_impl::*;

pub mod progress_service_impl;
pub use progress_service_impl::*;

pub mod task_monitor_service_impl;
pub use task_monitor_service_impl::*;
