//! Interface lookup for live capture

use airscope_core::{Error, MacAddr, Result};
use pnet_datalink::NetworkInterface;

/// Name prefixes used by wireless drivers and monitor interfaces
const WIRELESS_PREFIXES: [&str; 5] = ["wlan", "wlp", "wlx", "wifi", "mon"];

/// A local network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub description: String,
    /// Hardware address; monitor interfaces usually share the radio's
    pub mac: Option<MacAddr>,
    pub is_up: bool,
    pub is_loopback: bool,
}

impl InterfaceInfo {
    fn from_datalink(iface: &NetworkInterface) -> Self {
        Self {
            name: iface.name.clone(),
            description: iface.description.clone(),
            mac: iface
                .mac
                .map(|m| MacAddr::new([m.0, m.1, m.2, m.3, m.4, m.5]))
                .filter(|mac| *mac != MacAddr::ZERO),
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }

    /// Up and not a loopback
    pub fn is_capture_capable(&self) -> bool {
        self.is_up && !self.is_loopback
    }

    pub fn looks_wireless(&self) -> bool {
        is_wireless_name(&self.name)
    }
}

/// Check a name against common wireless naming (`wlan0`, `wlp3s0`, `wlan0mon`, `mon0`)
pub fn is_wireless_name(name: &str) -> bool {
    WIRELESS_PREFIXES.iter().any(|prefix| name.starts_with(prefix)) || name.ends_with("mon")
}

/// Every interface on the host
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces: Vec<InterfaceInfo> = pnet_datalink::interfaces()
        .iter()
        .map(InterfaceInfo::from_datalink)
        .collect();
    if interfaces.is_empty() {
        return Err(Error::Capture("No network interfaces found".to_string()));
    }
    Ok(interfaces)
}

/// Look an interface up by name
pub fn get_interface(name: &str) -> Result<InterfaceInfo> {
    pnet_datalink::interfaces()
        .iter()
        .find(|iface| iface.name == name)
        .map(InterfaceInfo::from_datalink)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}

/// Interfaces that are up and named like wireless devices
pub fn list_wireless_interfaces() -> Result<Vec<InterfaceInfo>> {
    let mut interfaces = list_interfaces()?;
    interfaces.retain(|iface| iface.is_capture_capable() && iface.looks_wireless());
    Ok(interfaces)
}

/// Hardware address of an interface; the analyzer never registers it as a client
pub fn interface_mac(name: &str) -> Result<Option<MacAddr>> {
    get_interface(name).map(|iface| iface.mac)
}
