//! Texture name classification and randomized replacement.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of name bytes that are regenerated. The 16th byte of the on-disk
/// field is left alone.
pub const OBFUSCATED_LEN: usize = 15;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Prefixes the engine gives meaning to, longest-first within each family.
const SPECIAL_PREFIXES: [&str; 7] = ["*water", "*lava", "*slime", "*tele", "*", "{", "sky"];

/// How a texture name is treated during obfuscation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameClass<'a> {
    /// `+<frame><base>`: one frame of an animation group.
    Animated { marker: &'a [u8], base: &'a [u8] },
    /// Liquid, sky, fence or other prefix the engine matches on.
    Special(&'a [u8]),
    Plain,
}

/// Strip a raw name field down to its meaningful bytes.
pub fn normalize_name(raw: &[u8]) -> &[u8] {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut name = &raw[..end];
    while let [rest @ .., b' '] = name {
        name = rest;
    }
    name
}

pub fn classify(name: &[u8]) -> NameClass<'_> {
    if name.len() > 1 && name[0] == b'+' {
        return NameClass::Animated {
            marker: &name[..2],
            base: &name[2..],
        };
    }
    SPECIAL_PREFIXES
        .iter()
        .map(|prefix| prefix.as_bytes())
        .find(|prefix| name.starts_with(prefix))
        .map_or(NameClass::Plain, NameClass::Special)
}

/// Generates replacement texture names.
///
/// Animation frames sharing a base name get the same random remainder for as
/// long as this obfuscator lives.
pub struct TextureNameObfuscator<R> {
    rng: R,
    anim_cache: HashMap<Vec<u8>, Vec<u8>>,
}

impl TextureNameObfuscator<StdRng> {
    /// Seed from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::seeded(nanos)
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> TextureNameObfuscator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            anim_cache: HashMap::new(),
        }
    }

    /// Produce the replacement for a raw name field.
    pub fn obfuscate(&mut self, raw: &[u8]) -> Vec<u8> {
        let name = normalize_name(raw);
        match classify(name) {
            NameClass::Animated { marker, base } => {
                let suffix_len = OBFUSCATED_LEN - marker.len();
                let suffix = match self.anim_cache.get(base) {
                    Some(cached) => cached.clone(),
                    None => {
                        let fresh = self.random_chars(suffix_len);
                        self.anim_cache.insert(base.to_vec(), fresh.clone());
                        fresh
                    }
                };
                let mut out = marker.to_vec();
                out.extend_from_slice(&suffix);
                out
            }
            NameClass::Special(prefix) => self.preserve_and_scramble(prefix),
            NameClass::Plain => self.random_chars(OBFUSCATED_LEN),
        }
    }

    /// Keep `prefix` and pad it with random characters to the fixed width.
    /// A prefix that already fills the width is truncated instead.
    pub fn preserve_and_scramble(&mut self, prefix: &[u8]) -> Vec<u8> {
        if prefix.len() >= OBFUSCATED_LEN {
            return prefix[..OBFUSCATED_LEN].to_vec();
        }
        let mut out = prefix.to_vec();
        out.extend(self.random_chars(OBFUSCATED_LEN - prefix.len()));
        out
    }

    fn random_chars(&mut self, len: usize) -> Vec<u8> {
        (0..len)
            .map(|_| ALPHABET[self.rng.gen_range(0..ALPHABET.len())])
            .collect()
    }
}
