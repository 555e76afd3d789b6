// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use mikrotik_dashboard::{encode_length, encode_sentence, parse_bytes, parse_uptime};

#[test]
fn test_encode_length_boundary_values() {
    // 1-byte: 0..0x80
    assert_eq!(encode_length(0x7F), vec![0x7F]);
    // 2-byte: 0x80..0x4000
    assert_eq!(encode_length(0x80), vec![0x80, 0x80]);
    assert_eq!(encode_length(0x3FFF), vec![0xBF, 0xFF]);
    // 3-byte: 0x4000..0x20_0000
    assert_eq!(encode_length(0x4000), vec![0xC0, 0x40, 0x00]);
    // 4-byte: 0x20_0000..0x1000_0000
    assert_eq!(encode_length(0x0020_0000), vec![0xE0, 0x20, 0x00, 0x00]);
    // 5-byte: 0x1000_0000+
    assert_eq!(
        encode_length(0x1000_0000),
        vec![0xF0, 0x10, 0x00, 0x00, 0x00]
    );
}

#[test]
fn test_encode_sentence_login() {
    let bytes = encode_sentence(&["/login", "=name=admin", "=password="]);

    let mut expected = vec![6];
    expected.extend_from_slice(b"/login");
    expected.push(11);
    expected.extend_from_slice(b"=name=admin");
    expected.push(10);
    expected.extend_from_slice(b"=password=");
    expected.push(0);
    assert_eq!(bytes, expected);
}

#[test]
fn test_encode_sentence_long_word_uses_two_byte_length() {
    let comment = format!("=comment={}", "x".repeat(200));
    let bytes = encode_sentence(&["/ip/address/set", comment.as_str()]);
    let word_start = 1 + "/ip/address/set".len();
    assert_eq!(&bytes[word_start..word_start + 2], &encode_length(comment.len())[..]);
    assert_eq!(bytes.last(), Some(&0));
}

#[test]
fn test_parse_uptime_examples() {
    assert_eq!(parse_uptime("1w2d3h4m5s"), 788_645);
    assert_eq!(parse_uptime("0s"), 0);
    assert_eq!(parse_uptime("3h"), 10_800);
    assert_eq!(parse_uptime("01:02:03"), 3_723);
}

#[test]
fn test_parse_bytes_examples() {
    assert_eq!(parse_bytes("2GiB"), 2 * 1024 * 1024 * 1024);
    assert_eq!(parse_bytes("512MiB"), 512 * 1024 * 1024);
    assert_eq!(parse_bytes("0"), 0);
    assert_eq!(parse_bytes("268435456"), 268_435_456);
}
