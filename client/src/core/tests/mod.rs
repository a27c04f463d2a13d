//! Session tests driven by a mocked transport

pub mod helpers;
pub mod session;
