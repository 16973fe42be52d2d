const HEX_DIGITS: &[u8] = b"0123456789abcdef";

pub fn fmt_hex(xs: &[u8]) -> String {
    let mut s = String::with_capacity(xs.len() * 2);
    for x in xs {
        s.push(HEX_DIGITS[(x >> 4) as usize] as char);
        s.push(HEX_DIGITS[(x & 0xf) as usize] as char);
    }
    s
}

#[test]
fn fmt_hex_test() {
    assert_eq!(fmt_hex(&[]), "");
    assert_eq!(fmt_hex(&[0x00, 0x0f, 0xa5, 0xff]), "000fa5ff");
}
