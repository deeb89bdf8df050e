//! CIDR parsing and matching for network restrictions.

use crate::errors::{Error, Result};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// An IPv4 or IPv6 network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Returns true if `ip` belongs to this network.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                mask_v4(u32::from(*ip), self.prefix) == u32::from(net)
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                mask_v6(u128::from(*ip), self.prefix) == u128::from(net)
            }
            (IpAddr::V4(_), IpAddr::V6(ip)) => ip
                .to_ipv4_mapped()
                .is_some_and(|v4| self.contains(&IpAddr::V4(v4))),
            (IpAddr::V6(_), IpAddr::V4(_)) => false,
        }
    }

    /// Returns true if `other` is fully inside this network.
    pub fn contains_network(&self, other: &Cidr) -> bool {
        other.network.is_ipv4() == self.network.is_ipv4()
            && other.prefix >= self.prefix
            && self.contains(&other.network)
    }

    pub fn network(&self) -> IpAddr {
        self.network
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }
}

impl FromStr for Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s, None),
        };

        let ip: IpAddr = addr
            .trim()
            .parse()
            .map_err(|_| Error::restriction(format!("invalid CIDR address '{s}'")))?;

        let max = if ip.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|p| *p <= max)
                .ok_or_else(|| Error::restriction(format!("invalid CIDR prefix in '{s}'")))?,
            None => max,
        };

        let network = match ip {
            IpAddr::V4(v4) => IpAddr::V4(Ipv4Addr::from(mask_v4(u32::from(v4), prefix))),
            IpAddr::V6(v6) => IpAddr::V6(mask_v6(u128::from(v6), prefix).into()),
        };

        Ok(Self { network, prefix })
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

fn mask_v4(value: u32, prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => value & (u32::MAX << (32 - u32::from(p))),
    }
}

fn mask_v6(value: u128, prefix: u8) -> u128 {
    match prefix {
        0 => 0,
        p => value & (u128::MAX << (128 - u32::from(p))),
    }
}

/// Parse a source address that may carry a port, folding loopback
/// addresses to `127.0.0.1`.
pub fn normalize_source_ip(source: &str) -> Result<IpAddr> {
    let ip = match source.parse::<SocketAddr>() {
        Ok(addr) => addr.ip(),
        Err(_) => source
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| Error::restriction(format!("missing or invalid origin IP '{source}'")))?,
    };

    if ip.is_loopback() {
        return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    Ok(match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    })
}
