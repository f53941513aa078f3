//! Business rules of the directory and the ledger, independent of HTTP.

pub mod employee;
pub mod leave;
