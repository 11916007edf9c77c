//! Security module for account credentials

mod password;

pub use password::{hash_password, verify_password};
