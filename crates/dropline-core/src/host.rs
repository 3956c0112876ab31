//! Local device identity.
//!
//! Receivers need a display name and the IP address peers should connect to.
//! Both come from a [`HostResolver`] so front ends and tests can substitute
//! their own answers.

use std::net::{IpAddr, UdpSocket};

use crate::error::{Error, Result};

/// Address used to pick the outbound interface. Nothing is sent to it.
const ROUTE_PROBE_ADDR: &str = "8.8.8.8:80";

/// Source of the local device name and outbound address.
pub trait HostResolver {
    /// Human-readable name for this device.
    fn device_name(&self) -> Result<String>;

    /// IP address of the interface used to reach the network.
    fn local_ip(&self) -> Result<IpAddr>;
}

/// Resolver backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn device_name(&self) -> Result<String> {
        let name = hostname::get()?;
        Ok(name.to_string_lossy().into_owned())
    }

    /// Connecting a UDP socket only selects a route, so this works without
    /// any packet leaving the host.
    fn local_ip(&self) -> Result<IpAddr> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(ROUTE_PROBE_ADDR)?;
        let ip = socket.local_addr()?.ip();

        if ip.is_unspecified() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "no route to the local network",
            )));
        }
        Ok(ip)
    }
}

/// Resolver returning fixed values.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    /// Name to report
    pub name: String,
    /// Address to report
    pub ip: IpAddr,
}

impl HostResolver for StaticResolver {
    fn device_name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn local_ip(&self) -> Result<IpAddr> {
        Ok(self.ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_static_resolver() {
        let resolver = StaticResolver {
            name: "bench".to_string(),
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        };
        assert_eq!(resolver.device_name().unwrap(), "bench");
        assert_eq!(resolver.local_ip().unwrap(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[test]
    fn test_system_device_name_is_not_empty() {
        let name = SystemResolver.device_name().expect("hostname");
        assert!(!name.is_empty());
    }
}
