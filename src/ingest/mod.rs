//! External data-provider clients and record normalization.

pub mod openf1;

pub use openf1::OpenF1Client;
