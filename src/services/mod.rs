pub mod accounts;
pub mod blob_store;
pub mod deletion;
pub mod hierarchy;
pub mod reconciliation;
pub mod upload;
pub mod worker;
