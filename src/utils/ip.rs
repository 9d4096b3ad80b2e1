//! IP 地址处理工具

use std::net::{IpAddr, SocketAddr};

/// 检查 IP 是否为私有地址或 localhost
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            // fc00::/7 (ULA)、fe80::/10 (link-local)、::1
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// 解析客户端地址，兼容 `ip:port` 与转发头中的列表（取第一个）
pub fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    let first = raw.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    if let Ok(socket_addr) = first.parse::<SocketAddr>() {
        return Some(socket_addr.ip());
    }
    first.parse::<IpAddr>().ok()
}
