mod alidns;
mod dnspod;

pub use alidns::{AliDnsClient, AliDnsFactory};
pub use dnspod::{DnsPodClient, DnsPodFactory};
