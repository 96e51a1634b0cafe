mod auto_discover;
mod errors;
mod root;

pub use auto_discover::AutoDiscoverConfig;
pub use errors::ConfigError;
pub use root::{RootConfig, TlsCheckerEntry};
