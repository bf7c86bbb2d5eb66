pub mod backend_repo;
pub mod token_store;
pub mod tomtom_repo;
