//! Auth-domain credential model.

pub mod credential;

pub use credential::*;
