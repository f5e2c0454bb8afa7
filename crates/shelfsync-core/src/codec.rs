//! Reversible character-substitution codec for transmitted secrets.
//!
//! Not encryption. The client applies the forward substitution before
//! sending a password over the wire; the service reverses it before use.
//! Characters outside the table pass through unchanged in both directions.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Substitution pairs: (transmitted char, real char).
const DECODE_PAIRS: &[(char, char)] = &[
    ('0', 'N'),
    ('1', 'U'),
    ('2', 'E'),
    ('3', 'p'),
    ('4', 'i'),
    ('5', 'S'),
    ('6', 'Z'),
    ('7', 'f'),
    ('8', '4'),
    ('9', 'c'),
    ('N', '0'),
    ('i', '1'),
    ('T', '2'),
    ('F', '3'),
    ('V', '5'),
    ('L', '6'),
    ('k', '7'),
    ('I', '8'),
    ('z', '9'),
    ('a', 'T'),
    ('b', 'L'),
    ('c', 'h'),
    ('d', 'G'),
    ('e', 'r'),
    ('f', 'R'),
    ('g', 'O'),
    ('h', 'b'),
    ('j', 'P'),
    ('l', 'H'),
    ('m', 'W'),
    ('n', 'v'),
    ('o', 'a'),
    ('p', 'I'),
    ('q', 't'),
    ('r', 'Q'),
    ('s', 'A'),
    ('t', 'z'),
    ('u', 'V'),
    ('v', 'j'),
    ('w', 'u'),
    ('x', 's'),
    ('y', 'M'),
    ('A', 'k'),
    ('B', 'F'),
    ('C', 'K'),
    ('D', 'B'),
    ('E', 'm'),
    ('G', 'd'),
    ('H', 'D'),
    ('J', 'x'),
    ('K', 'C'),
    ('M', 'g'),
    ('O', 'o'),
    ('P', 'l'),
    ('Q', 'y'),
    ('R', 'Y'),
    ('S', 'n'),
    ('U', 'q'),
    ('W', 'X'),
    ('X', 'J'),
    ('Y', 'e'),
    ('Z', 'w'),
];

static DECODE_MAP: Lazy<HashMap<char, char>> =
    Lazy::new(|| DECODE_PAIRS.iter().copied().collect());

static ENCODE_MAP: Lazy<HashMap<char, char>> =
    Lazy::new(|| DECODE_PAIRS.iter().map(|&(from, to)| (to, from)).collect());

/// Reverse the substitution applied by the client.
pub fn decode(secret: &str) -> String {
    secret
        .chars()
        .map(|c| DECODE_MAP.get(&c).copied().unwrap_or(c))
        .collect()
}

/// Apply the forward substitution (what a client does before transmitting).
pub fn encode(secret: &str) -> String {
    secret
        .chars()
        .map(|c| ENCODE_MAP.get(&c).copied().unwrap_or(c))
        .collect()
}
