//! Byte-level UTF-8 scalar decoding with lossy recovery.
//!
//! The edit buffer is mostly UTF-8 but may hold arbitrary octets after a
//! quoted-insert, so navigation decodes with Go `DecodeRune`-style recovery:
//! an invalid byte is treated as one scalar of replacement width.

/// Classification of the leading bytes of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum First {
    /// A complete scalar occupies this many leading bytes (1..=4).
    Complete(usize),
    /// A well-formed prefix of a multi-byte scalar; more bytes may complete it.
    NeedMore,
    /// The leading byte(s) cannot form a scalar.
    Invalid,
}

/// Classify the first UTF-8 scalar of `data`. `data` must be non-empty.
pub(crate) fn first_scalar(data: &[u8]) -> First {
    let want = match data[0] {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return First::Invalid,
    };
    let have = data.len().min(want);
    if !data[1..have].iter().all(|b| (0x80..=0xbf).contains(b)) {
        return First::Invalid;
    }
    if have < want {
        return First::NeedMore;
    }
    match std::str::from_utf8(&data[..want]) {
        Ok(_) => First::Complete(want),
        Err(_) => First::Invalid,
    }
}

/// Decode the first scalar of `data`, yielding the replacement character and
/// a length of 1 for invalid or truncated input. `data` must be non-empty.
pub(crate) fn decode_first(data: &[u8]) -> (char, usize) {
    match first_scalar(data) {
        First::Complete(n) => match std::str::from_utf8(&data[..n]) {
            Ok(s) => match s.chars().next() {
                Some(c) => (c, n),
                None => (char::REPLACEMENT_CHARACTER, 1),
            },
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        },
        First::NeedMore | First::Invalid => (char::REPLACEMENT_CHARACTER, 1),
    }
}

/// Decode the last scalar of `data`, with the same recovery as
/// [`decode_first`]. `data` must be non-empty.
pub(crate) fn decode_last(data: &[u8]) -> (char, usize) {
    for k in 1..=data.len().min(4) {
        let tail = &data[data.len() - k..];
        if let Ok(s) = std::str::from_utf8(tail) {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return (c, k);
            }
            break;
        }
    }
    (char::REPLACEMENT_CHARACTER, 1)
}

/// Number of scalars in `data`, counting each invalid byte as one.
pub(crate) fn count_scalars(data: &[u8]) -> usize {
    let mut rest = data;
    let mut n = 0;
    while !rest.is_empty() {
        let (_, size) = decode_first(rest);
        rest = &rest[size..];
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_and_multibyte_forwards() {
        assert_eq!(decode_first(b"abc"), ('a', 1));
        assert_eq!(decode_first("é!".as_bytes()), ('é', 2));
        assert_eq!(decode_first("愛x".as_bytes()), ('愛', 3));
        assert_eq!(decode_first("🦀".as_bytes()), ('🦀', 4));
    }

    #[test]
    fn invalid_bytes_are_single_replacement_scalars() {
        assert_eq!(decode_first(&[0xff, b'a']), (char::REPLACEMENT_CHARACTER, 1));
        assert_eq!(decode_first(&[0x80]), (char::REPLACEMENT_CHARACTER, 1));
        // A truncated lead byte at the end of a buffer decodes as one byte.
        assert_eq!(decode_first(&[0xe3]), (char::REPLACEMENT_CHARACTER, 1));
    }

    #[test]
    fn backwards_decoding() {
        assert_eq!(decode_last(b"abc"), ('c', 1));
        assert_eq!(decode_last("aé".as_bytes()), ('é', 2));
        assert_eq!(decode_last("x愛".as_bytes()), ('愛', 3));
        assert_eq!(decode_last(&[b'a', 0xff]), (char::REPLACEMENT_CHARACTER, 1));
    }

    #[test]
    fn partial_scalar_needs_more() {
        assert_eq!(first_scalar(&[0xe3, 0x81]), First::NeedMore);
        assert_eq!(first_scalar("あ".as_bytes()), First::Complete(3));
        assert_eq!(first_scalar(&[0xe3, 0x28]), First::Invalid);
    }

    #[test]
    fn scalar_counting_mixes_valid_and_invalid() {
        assert_eq!(count_scalars(b""), 0);
        assert_eq!(count_scalars(b"ab"), 2);
        assert_eq!(count_scalars("aあb".as_bytes()), 3);
        assert_eq!(count_scalars(&[0xff, 0xfe, b'a']), 3);
    }
}
