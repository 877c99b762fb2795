//! Sentence validation: `$<body>*HH`, where HH is the XOR of every byte
//! of `<body>` in hex.

/// Leading byte of every sentence.
pub const SENTINEL: u8 = b'$';

/// Separates the body from the checksum.
pub const CHECKSUM_DELIMITER: u8 = b'*';

/// Separates fields within the body.
pub const FIELD_SEPARATOR: char = ',';

/// XOR of all bytes.
#[inline]
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, &b| acc ^ b)
}

/// A checksum-verified sentence body (between `$` and `*`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sentence<'a> {
    body: &'a str,
}

impl<'a> Sentence<'a> {
    /// Body text, e.g. `GPGGA,123519,4807.038,N,...`.
    #[inline]
    pub fn body(&self) -> &'a str {
        self.body
    }

    /// Leading tag, e.g. `GPGGA`.
    #[inline]
    pub fn tag(&self) -> &'a str {
        self.fields().next().unwrap_or("")
    }

    /// Comma-separated fields, tag first.
    ///
    /// Empty fields are kept: `a,,b` yields `a`, ``, `b`.
    #[inline]
    pub fn fields(&self) -> core::str::Split<'a, char> {
        self.body.split(FIELD_SEPARATOR)
    }
}

/// Check a candidate line and return its body if the checksum matches.
///
/// The line must start with `$`, contain a `*` (the last one is used), be
/// followed by exactly two hex digits, and the XOR of the bytes in between
/// must equal them. Non-ASCII bodies are rejected.
pub fn validate(line: &[u8]) -> Option<Sentence<'_>> {
    if line.first() != Some(&SENTINEL) {
        return None;
    }

    let star = line.iter().rposition(|&b| b == CHECKSUM_DELIMITER)?;
    if star == 0 {
        return None;
    }

    let provided = parse_hex_pair(&line[star + 1..])?;
    let body = &line[1..star];
    if checksum(body) != provided {
        return None;
    }

    let body = core::str::from_utf8(body).ok()?;
    Some(Sentence { body })
}

fn parse_hex_pair(digits: &[u8]) -> Option<u8> {
    match digits {
        [hi, lo] => Some(hex_value(*hi)? << 4 | hex_value(*lo)?),
        _ => None,
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}
