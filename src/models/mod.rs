pub mod alias_binding;
pub use alias_binding::*;

pub mod mapping_document;
pub use mapping_document::*;

pub mod migration_options;
pub use migration_options::*;

pub mod migration_outcome;
pub use migration_outcome::*;

pub mod migration_plan;
pub use migration_plan::*;

pub mod progress_row;
pub use progress_row::*;

pub mod reindex_spec;
pub use reindex_spec::*;

pub mod task_status;
pub use task_status::*;
