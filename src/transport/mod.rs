//! # Transport Layer
//!
//! Encryption for switch connections. Plain TCP needs no wrapper; TLS is
//! negotiated per connection with an acceptor built here.

pub mod tls;

pub use tls::TlsServerConfig;
