// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Parsers for RouterOS human-readable durations and sizes

/// Parse a RouterOS uptime string to seconds
///
/// Accepts formats like: 1w2d3h4m5s, 2w1d, 05:23:10, 1h5m, 30s.
/// Every unit is optional and the parts are additive.
#[must_use]
pub fn parse_uptime(s: &str) -> u64 {
    let s = s.trim();
    if s.contains(':') {
        // [Nd]HH:MM:SS or MM:SS as printed by some RouterOS versions
        let (days, clock) = match s.split_once('d') {
            Some((d, rest)) => (d.parse::<u64>().unwrap_or(0), rest),
            None => (0, s),
        };
        let parts: Vec<u64> = clock
            .split(':')
            .map(|p| p.parse::<u64>().unwrap_or(0))
            .collect();
        let clock_secs = match parts.as_slice() {
            [h, m, sec] => h
                .saturating_mul(3600)
                .saturating_add(m.saturating_mul(60))
                .saturating_add(*sec),
            [m, sec] => m.saturating_mul(60).saturating_add(*sec),
            _ => 0,
        };
        return days.saturating_mul(86_400).saturating_add(clock_secs);
    }
    let mut total = 0u64;
    let mut num = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            num.push(ch);
            continue;
        }
        if num.is_empty() {
            continue;
        }
        let value = num.parse::<u64>().unwrap_or(0);
        let unit_seconds = match ch {
            'w' => 7 * 24 * 3600,
            'd' => 24 * 3600,
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => 0,
        };
        total = total.saturating_add(value.saturating_mul(unit_seconds));
        num.clear();
    }
    if !num.is_empty() {
        // trailing number without unit -> seconds
        total = total.saturating_add(num.parse::<u64>().unwrap_or(0));
    }
    total
}

/// Parse a RouterOS size string (`512MiB`, `2GiB`, `1007.2KiB`, `4096`) to bytes
///
/// Plain numbers are already bytes. Unparseable input yields 0.
#[must_use]
pub fn parse_bytes(s: &str) -> u64 {
    let s = s.trim();
    if let Ok(n) = s.parse::<u64>() {
        return n;
    }
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let Ok(value) = number.parse::<f64>() else {
        return 0;
    };
    let multiplier: u64 = match unit.trim() {
        "" | "B" => 1,
        "KiB" | "KB" | "k" => 1 << 10,
        "MiB" | "MB" | "M" => 1 << 20,
        "GiB" | "GB" | "G" => 1 << 30,
        "TiB" | "TB" | "T" => 1 << 40,
        _ => return 0,
    };
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let bytes = (value * multiplier as f64).round() as u64;
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uptime_all_units() {
        assert_eq!(parse_uptime("1w2d3h4m5s"), 604_800 + 172_800 + 10_800 + 240 + 5);
        assert_eq!(parse_uptime("1w2d3h4m5s"), 788_645);
    }

    #[test]
    fn test_parse_uptime_zero() {
        assert_eq!(parse_uptime("0s"), 0);
        assert_eq!(parse_uptime(""), 0);
    }

    #[test]
    fn test_parse_uptime_partial_units() {
        assert_eq!(parse_uptime("1d2h3m4s"), 93_784);
        assert_eq!(parse_uptime("1h5m"), 3_900);
        assert_eq!(parse_uptime("30s"), 30);
        assert_eq!(parse_uptime("2w"), 1_209_600);
        assert_eq!(parse_uptime("3d"), 259_200);
    }

    #[test]
    fn test_parse_uptime_clock_formats() {
        assert_eq!(parse_uptime("05:23:10"), 19_390);
        assert_eq!(parse_uptime("23:10"), 1_390);
        assert_eq!(parse_uptime("2d05:23:10"), 2 * 86_400 + 19_390);
    }

    #[test]
    fn test_parse_uptime_garbled_counts_saturate() {
        assert_eq!(parse_uptime("40000000000000w"), u64::MAX);
        assert_eq!(parse_uptime("1w18446744073709551615s"), u64::MAX);
        assert_eq!(parse_uptime("99999999999999999d23:59:59"), u64::MAX);
        assert_eq!(parse_uptime("9999999999999999999:00:00"), u64::MAX);
    }

    #[test]
    fn test_parse_bytes_units() {
        assert_eq!(parse_bytes("2GiB"), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_bytes("512MiB"), 512 * 1024 * 1024);
        assert_eq!(parse_bytes("64KiB"), 64 * 1024);
        assert_eq!(parse_bytes("1TiB"), 1 << 40);
    }

    #[test]
    fn test_parse_bytes_numeric() {
        assert_eq!(parse_bytes("0"), 0);
        assert_eq!(parse_bytes("1073741824"), 1_073_741_824);
    }

    #[test]
    fn test_parse_bytes_fractional() {
        assert_eq!(parse_bytes("1.5KiB"), 1536);
        assert_eq!(parse_bytes("0.5GiB"), 512 * 1024 * 1024);
    }

    #[test]
    fn test_parse_bytes_garbage() {
        assert_eq!(parse_bytes(""), 0);
        assert_eq!(parse_bytes("lots"), 0);
        assert_eq!(parse_bytes("12parsecs"), 0);
    }
}
