pub mod proof_storage;

pub use proof_storage::*;
