//! Port specification parsing.

use thiserror::Error;

pub const MIN_PORT: u32 = 1;
pub const MAX_PORT: u32 = 65535;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortSpecError {
    #[error("invalid port range: {0}")]
    InvalidPortRange(String),

    #[error("invalid port (expected 1-65535): {0}")]
    InvalidPort(String),
}

/// Expand a spec such as `"22,80,8000-8010"` into ports, in encounter order.
///
/// Overlapping entries are kept as written, so `"1-3,2"` yields `[1, 2, 3, 2]`.
/// An empty spec yields an empty list.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>, PortSpecError> {
    let mut ports = Vec::new();
    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some((start, end)) = part.split_once('-') {
            let invalid = || PortSpecError::InvalidPortRange(part.to_string());
            let start: i64 = start.trim().parse().map_err(|_| invalid())?;
            let end: i64 = end.trim().parse().map_err(|_| invalid())?;
            if start < MIN_PORT as i64 || end > MAX_PORT as i64 || start > end {
                return Err(invalid());
            }
            // Bounds checked above, so the casts cannot truncate.
            ports.extend(start as u16..=end as u16);
        } else {
            let port: i64 = part
                .parse()
                .map_err(|_| PortSpecError::InvalidPort(part.to_string()))?;
            if !(MIN_PORT as i64..=MAX_PORT as i64).contains(&port) {
                return Err(PortSpecError::InvalidPort(part.to_string()));
            }
            ports.push(port as u16);
        }
    }
    Ok(ports)
}

/// Every TCP port, 1 through 65535.
pub fn all_ports() -> Vec<u16> {
    (1..=u16::MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_and_range_in_order() {
        assert_eq!(parse_ports("20-22,80").unwrap(), vec![20, 21, 22, 80]);
        assert_eq!(parse_ports(" 443 , 80 ,, ").unwrap(), vec![443, 80]);
        assert_eq!(parse_ports("65535").unwrap(), vec![65535]);
        assert!(parse_ports("").unwrap().is_empty());
    }

    #[test]
    fn test_overlaps_are_not_deduplicated() {
        assert_eq!(parse_ports("1-3,2").unwrap(), vec![1, 2, 3, 2]);
    }

    #[test]
    fn test_invalid_single_ports() {
        assert_eq!(parse_ports("70000"), Err(PortSpecError::InvalidPort("70000".into())));
        assert_eq!(parse_ports("0"), Err(PortSpecError::InvalidPort("0".into())));
        assert_eq!(parse_ports("80,http"), Err(PortSpecError::InvalidPort("http".into())));
    }

    #[test]
    fn test_invalid_ranges() {
        assert_eq!(parse_ports("50-10"), Err(PortSpecError::InvalidPortRange("50-10".into())));
        assert_eq!(parse_ports("0-10"), Err(PortSpecError::InvalidPortRange("0-10".into())));
        assert_eq!(parse_ports("1-70000"), Err(PortSpecError::InvalidPortRange("1-70000".into())));
        assert_eq!(parse_ports("1-a"), Err(PortSpecError::InvalidPortRange("1-a".into())));
        assert_eq!(parse_ports("1-2-3"), Err(PortSpecError::InvalidPortRange("1-2-3".into())));
    }

    #[test]
    fn test_all_ports() {
        let ports = all_ports();
        assert_eq!(ports.len(), 65535);
        assert_eq!(ports[0], 1);
        assert_eq!(ports[65534], 65535);
    }
}
