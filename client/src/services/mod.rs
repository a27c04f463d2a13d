//! Service implementations
//!
//! Real implementations of all service traits for production use

pub mod http_transport;

pub use http_transport::ReqwestTransport;
