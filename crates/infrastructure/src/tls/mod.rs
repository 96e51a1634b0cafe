mod cert;
mod danger;
mod handshaker;

pub use handshaker::RustlsTlsHandshaker;
