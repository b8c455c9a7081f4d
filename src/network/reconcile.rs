//! Reconciliation of a raw neighbor-table scan against known device
//! identities. Pure data-in/data-out: acquisition of the scan text and the
//! identity table is the caller's job, so this stays independently testable.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;

use crate::db::KnownDevice;

/// A device seen in the current scan. Transient; never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredDevice {
    pub id: i64,
    pub name: String,
    pub mac_address: String,
    pub ip_address: String,
    pub device_type: String,
    pub status: String,
}

/// Merge one neighbor-table scan against known device identities.
///
/// Each non-blank line is scanned for a parenthesized IPv4 address and a MAC
/// of six colon- or hyphen-separated octet pairs; lines missing either are
/// skipped. MACs are normalized to uppercase colon form. A MAC repeated
/// within one scan keeps its first occurrence, so the output holds at most
/// one entry per hardware address, in encounter order. Never fails.
pub fn reconcile(raw: &str, known: &[KnownDevice]) -> Vec<DiscoveredDevice> {
    let ip_re = Regex::new(r"\(([0-9.]+)\)").expect("ip pattern");
    let mac_re =
        Regex::new(r"[0-9a-fA-F]{2}(?:[:-][0-9a-fA-F]{2}){5}").expect("mac pattern");

    let mut seen = HashSet::new();
    let mut devices = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(ip) = ip_re.captures(line).and_then(|c| c.get(1)) else {
            continue;
        };
        let Some(mac) = mac_re.find(line) else { continue };
        let mac = mac.as_str().to_uppercase().replace('-', ":");
        if !seen.insert(mac.clone()) {
            continue;
        }

        let running = (devices.len() + 1) as i64;
        let device = match known.iter().find(|d| d.mac.eq_ignore_ascii_case(&mac)) {
            Some(k) => DiscoveredDevice {
                id: k.id,
                name: k.name.clone(),
                mac_address: mac,
                ip_address: ip.as_str().to_string(),
                device_type: k.device_type.clone(),
                status: "active".to_string(),
            },
            None => DiscoveredDevice {
                id: running,
                name: format!("Device-{running}"),
                mac_address: mac,
                ip_address: ip.as_str().to_string(),
                device_type: "unknown".to_string(),
                status: "active".to_string(),
            },
        };
        devices.push(device);
    }
    devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laptop() -> KnownDevice {
        KnownDevice {
            id: 7,
            mac: "AA:BB:CC:DD:EE:FF".to_string(),
            name: "Laptop".to_string(),
            device_type: "laptop".to_string(),
        }
    }

    #[test]
    fn test_known_device_is_merged() {
        let raw = "? (192.168.1.5) at AA:BB:CC:DD:EE:FF [ether] on eth0";
        let devices = reconcile(raw, &[laptop()]);
        assert_eq!(
            devices,
            vec![DiscoveredDevice {
                id: 7,
                name: "Laptop".to_string(),
                mac_address: "AA:BB:CC:DD:EE:FF".to_string(),
                ip_address: "192.168.1.5".to_string(),
                device_type: "laptop".to_string(),
                status: "active".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_device_is_synthesized() {
        let raw = "? (10.0.0.9) at 11:22:33:44:55:66 [ether] on wlan0";
        let devices = reconcile(raw, &[laptop()]);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, 1);
        assert_eq!(devices[0].name, "Device-1");
        assert_eq!(devices[0].device_type, "unknown");
        assert_eq!(devices[0].status, "active");
    }

    #[test]
    fn test_mac_is_normalized() {
        let raw = "? (10.0.0.9) at aa-bb-cc-dd-ee-ff [ether] on eth0";
        let devices = reconcile(raw, &[laptop()]);
        assert_eq!(devices[0].mac_address, "AA:BB:CC:DD:EE:FF");
        assert_eq!(devices[0].name, "Laptop");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let raw = "\n\
                   gateway incomplete\n\
                   ? (192.168.1.1) at <incomplete> on eth0\n\
                   no ip here at 11:22:33:44:55:66\n\
                   ? (192.168.1.5) at AA:BB:CC:DD:EE:FF [ether] on eth0\n\
                   %% garbage %%\n";
        let devices = reconcile(raw, &[]);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_address, "192.168.1.5");
    }

    #[test]
    fn test_duplicate_macs_keep_first_occurrence() {
        let raw = "? (192.168.1.5) at AA:BB:CC:DD:EE:FF [ether] on eth0\n\
                   ? (192.168.1.6) at aa:bb:cc:dd:ee:ff [ether] on wlan0\n";
        let devices = reconcile(raw, &[]);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].ip_address, "192.168.1.5");
    }

    #[test]
    fn test_running_count_spans_known_and_unknown() {
        let raw = "? (192.168.1.5) at AA:BB:CC:DD:EE:FF [ether] on eth0\n\
                   ? (192.168.1.6) at 11:22:33:44:55:66 [ether] on eth0\n\
                   ? (192.168.1.7) at 22:33:44:55:66:77 [ether] on eth0\n";
        let devices = reconcile(raw, &[laptop()]);
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].name, "Laptop");
        assert_eq!(devices[1].name, "Device-2");
        assert_eq!(devices[1].id, 2);
        assert_eq!(devices[2].name, "Device-3");
    }

    #[test]
    fn test_empty_input_yields_empty_list() {
        assert!(reconcile("", &[laptop()]).is_empty());
    }
}
