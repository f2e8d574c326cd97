pub mod es_repository;
pub use es_repository::*;

#[cfg(test)]
pub mod mock_es_repository;
