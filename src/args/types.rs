use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Address family used when dialing a target.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStack {
    /// Let the resolver pick either family.
    Tcp,
    #[default]
    Tcp4,
    Tcp6,
}

impl NetworkStack {
    /// Local bind address that restricts outgoing connections to this family.
    #[must_use]
    pub const fn local_address(self) -> Option<IpAddr> {
        match self {
            Self::Tcp => None,
            Self::Tcp4 => Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            Self::Tcp6 => Some(IpAddr::V6(Ipv6Addr::UNSPECIFIED)),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tcp4 => "tcp4",
            Self::Tcp6 => "tcp6",
        }
    }
}
