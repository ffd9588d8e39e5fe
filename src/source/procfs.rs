// Linux /proc and dnsmasq parsers. Pure functions over file contents so they can be
// fed fixtures; the reads themselves live in HostSource.

use std::collections::HashMap;

/// One complete neighbour entry from /proc/net/arp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip_address: String,
    pub mac_address: String,
    pub device: String,
}

const ATF_COM: u32 = 0x2;

/// Complete (resolved) entries only; incomplete and all-zero MACs are skipped.
pub fn parse_arp(content: &str) -> Vec<ArpEntry> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 6 {
                return None;
            }
            let flags = u32::from_str_radix(cols[2].trim_start_matches("0x"), 16).ok()?;
            if flags & ATF_COM == 0 || cols[3] == "00:00:00:00:00:00" {
                return None;
            }
            Some(ArpEntry {
                ip_address: cols[0].to_string(),
                mac_address: cols[3].to_ascii_lowercase(),
                device: cols[5].to_string(),
            })
        })
        .collect()
}

/// dnsmasq lease file: `<expiry> <mac> <ip> <hostname> <client-id>`. Returns mac -> hostname;
/// "*" hostnames are unknown and left out.
pub fn parse_leases(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let _expiry = cols.next()?;
            let mac = cols.next()?;
            let _ip = cols.next()?;
            let hostname = cols.next()?;
            if hostname == "*" {
                return None;
            }
            Some((mac.to_ascii_lowercase(), hostname.to_string()))
        })
        .collect()
}

/// TCP segment counters from /proc/net/snmp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpCounters {
    pub out_segs: u64,
    pub retrans_segs: u64,
}

/// The "Tcp:" header/value line pair. None if absent or malformed.
pub fn parse_tcp_counters(content: &str) -> Option<TcpCounters> {
    let mut tcp_lines = content.lines().filter(|l| l.starts_with("Tcp:"));
    let header: Vec<&str> = tcp_lines.next()?.split_whitespace().skip(1).collect();
    let values: Vec<&str> = tcp_lines.next()?.split_whitespace().skip(1).collect();
    let field = |name: &str| -> Option<u64> {
        let idx = header.iter().position(|h| *h == name)?;
        values.get(idx)?.parse().ok()
    };
    Some(TcpCounters {
        out_segs: field("OutSegs")?,
        retrans_segs: field("RetransSegs")?,
    })
}

/// Link quality for `interface` (or the first wireless interface) from /proc/net/wireless,
/// scaled from the driver's 0..70 range to a percentage.
pub fn parse_wireless_quality(content: &str, interface: Option<&str>) -> Option<f64> {
    content.lines().skip(2).find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        let name = name.trim();
        if interface.is_some_and(|i| i != name) {
            return None;
        }
        let link = rest.split_whitespace().nth(1)?.trim_end_matches('.');
        let link: f64 = link.parse().ok()?;
        Some((link / 70.0 * 100.0).clamp(0.0, 100.0))
    })
}
