//! Network telemetry wrappers feeding the status endpoint.
//!
//! Every probe degrades independently to an unknown/offline value; the
//! collector itself never fails.

use std::time::Duration;

use serde::Serialize;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const UNKNOWN: &str = "unknown";

#[derive(Debug, Serialize)]
pub struct NetworkStatus {
    /// Mbps estimate from cumulative interface counters.
    pub download_speed: f64,
    pub upload_speed: f64,
    pub connected_devices: usize,
    pub status: String,
    pub uptime: String,
    pub external_ip: String,
    pub dns_server: String,
}

pub async fn collect() -> NetworkStatus {
    let (rx_bytes, tx_bytes) = interface_counters().unwrap_or((0, 0));
    let connected_devices = match read_neighbor_table().await {
        Ok(raw) => raw.lines().filter(|l| !l.trim().is_empty()).count(),
        Err(e) => {
            tracing::warn!("neighbor table unavailable: {e}");
            0
        }
    };
    let online = probe_connectivity().await;

    NetworkStatus {
        download_speed: to_mbps(rx_bytes),
        upload_speed: to_mbps(tx_bytes),
        connected_devices,
        status: if online { "ONLINE" } else { "OFFLINE" }.to_string(),
        uptime: read_uptime().unwrap_or_else(|| UNKNOWN.to_string()),
        external_ip: fetch_external_ip().await.unwrap_or_else(|| UNKNOWN.to_string()),
        dns_server: read_dns_server().unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/// Snapshot of the OS neighbor cache, as text for the reconciler.
pub async fn read_neighbor_table() -> anyhow::Result<String> {
    let output = tokio::process::Command::new("arp")
        .arg("-a")
        .output()
        .await?;
    if !output.status.success() {
        anyhow::bail!("arp -a exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

async fn probe_connectivity() -> bool {
    tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect("8.8.8.8:53"))
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false)
}

/// Sum of rx/tx byte counters across non-loopback interfaces.
fn interface_counters() -> Option<(u64, u64)> {
    let data = std::fs::read_to_string("/proc/net/dev").ok()?;
    let mut rx = 0u64;
    let mut tx = 0u64;
    for line in data.lines().skip(2) {
        let Some((iface, rest)) = line.split_once(':') else {
            continue;
        };
        if iface.trim() == "lo" {
            continue;
        }
        let fields: Vec<&str> = rest.split_whitespace().collect();
        // rx bytes is the first column, tx bytes the ninth
        if fields.len() > 8 {
            rx += fields[0].parse::<u64>().unwrap_or(0);
            tx += fields[8].parse::<u64>().unwrap_or(0);
        }
    }
    Some((rx, tx))
}

fn to_mbps(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 / 1024.0 * 8.0 * 10.0).round() / 10.0
}

fn read_uptime() -> Option<String> {
    let data = std::fs::read_to_string("/proc/uptime").ok()?;
    let seconds: f64 = data.split_whitespace().next()?.parse().ok()?;
    Some(format_uptime(seconds))
}

fn format_uptime(seconds: f64) -> String {
    let days = (seconds / 86_400.0) as u64;
    let hours = ((seconds % 86_400.0) / 3_600.0) as u64;
    format!("{days} days, {hours} hrs")
}

fn read_dns_server() -> Option<String> {
    let data = std::fs::read_to_string("/etc/resolv.conf").ok()?;
    data.lines()
        .filter_map(|line| line.strip_prefix("nameserver"))
        .map(|rest| rest.trim().to_string())
        .find(|s| !s.is_empty())
}

async fn fetch_external_ip() -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .ok()?;
    let ip = client
        .get("https://api.ipify.org")
        .send()
        .await
        .ok()?
        .text()
        .await
        .ok()?;
    let ip = ip.trim().to_string();
    (!ip.is_empty()).then_some(ip)
}
