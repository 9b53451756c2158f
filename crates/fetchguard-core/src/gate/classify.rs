//! Address classification for resolved (or literal) IPs.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::decision::DenyReason;

/// Well-known cloud instance metadata address.
pub const CLOUD_METADATA_V4: Ipv4Addr = Ipv4Addr::new(169, 254, 169, 254);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressClass {
    Public,
    Loopback,
    LinkLocal,
    Private,
    CloudMetadata,
}

impl AddressClass {
    /// `None` for public addresses.
    pub fn deny_reason(self) -> Option<DenyReason> {
        match self {
            AddressClass::Public => None,
            AddressClass::Loopback => Some(DenyReason::Loopback),
            AddressClass::LinkLocal => Some(DenyReason::LinkLocal),
            AddressClass::Private => Some(DenyReason::PrivateRange),
            AddressClass::CloudMetadata => Some(DenyReason::CloudMetadataEndpoint),
        }
    }
}

/// Classifies one address. Metadata is checked before generic link-local.
pub fn classify_ip(ip: IpAddr) -> AddressClass {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

fn classify_v4(v4: Ipv4Addr) -> AddressClass {
    if v4 == CLOUD_METADATA_V4 {
        AddressClass::CloudMetadata
    } else if v4.octets()[0] == 127 {
        AddressClass::Loopback
    } else if v4.is_link_local() {
        AddressClass::LinkLocal
    } else if v4.is_private() {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

fn classify_v6(v6: Ipv6Addr) -> AddressClass {
    // ::ffff:a.b.c.d reaches the same host as a.b.c.d.
    if let Some(v4) = v6.to_ipv4_mapped() {
        return classify_v4(v4);
    }
    let first = v6.segments()[0];
    if v6 == Ipv6Addr::LOCALHOST {
        AddressClass::Loopback
    } else if first & 0xffc0 == 0xfe80 {
        AddressClass::LinkLocal
    } else if first & 0xfe00 == 0xfc00 {
        AddressClass::Private
    } else {
        AddressClass::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(s: &str) -> AddressClass {
        classify_ip(s.parse().unwrap())
    }

    #[test]
    fn metadata_before_link_local() {
        assert_eq!(class("169.254.169.254"), AddressClass::CloudMetadata);
        assert_eq!(class("169.254.169.253"), AddressClass::LinkLocal);
    }

    #[test]
    fn loopback_whole_127_block() {
        assert_eq!(class("127.0.0.1"), AddressClass::Loopback);
        assert_eq!(class("127.255.0.9"), AddressClass::Loopback);
        assert_eq!(class("::1"), AddressClass::Loopback);
    }

    #[test]
    fn private_ranges() {
        assert_eq!(class("10.1.2.3"), AddressClass::Private);
        assert_eq!(class("172.16.0.1"), AddressClass::Private);
        assert_eq!(class("172.31.255.255"), AddressClass::Private);
        assert_eq!(class("192.168.1.1"), AddressClass::Private);
        assert_eq!(class("fd12:3456::1"), AddressClass::Private);
        assert_eq!(class("fc00::1"), AddressClass::Private);
    }

    #[test]
    fn range_edges_are_public() {
        assert_eq!(class("172.15.255.255"), AddressClass::Public);
        assert_eq!(class("172.32.0.0"), AddressClass::Public);
        assert_eq!(class("11.0.0.1"), AddressClass::Public);
        assert_eq!(class("fe00::1"), AddressClass::Public);
    }

    #[test]
    fn ipv6_link_local_prefix() {
        assert_eq!(class("fe80::1"), AddressClass::LinkLocal);
        assert_eq!(class("febf::1"), AddressClass::LinkLocal);
        assert_eq!(class("fec0::1"), AddressClass::Public);
    }

    #[test]
    fn ipv4_mapped_uses_embedded_address() {
        assert_eq!(class("::ffff:127.0.0.1"), AddressClass::Loopback);
        assert_eq!(class("::ffff:169.254.169.254"), AddressClass::CloudMetadata);
        assert_eq!(class("::ffff:93.184.216.34"), AddressClass::Public);
    }

    #[test]
    fn public_addresses() {
        assert_eq!(class("93.184.216.34"), AddressClass::Public);
        assert_eq!(class("2606:2800:220:1:248:1893:25c8:1946"), AddressClass::Public);
        assert_eq!(AddressClass::Public.deny_reason(), None);
    }
}
