//! Sapphire II stream cipher, used by encrypted Sword modules.
//!
//! This is the cipher from Michael Paul Johnson's public-domain
//! `sapphire.cpp`: a 256-byte substitution table plus five 8-bit state
//! variables (`rotor`, `ratchet`, `avalanche`, `last_plain`,
//! `last_cipher`), keyed by a Fisher-Yates-style shuffle driven by a
//! key-dependent pseudo-random byte generator.
//!
//! The cipher is self-synchronizing and symmetric: encryption and
//! decryption run the identical table-shuffling step and differ only in
//! which byte feeds the `last_plain`/`last_cipher` chaining variables.
//! Every independent block must be processed from a freshly keyed cipher;
//! state never carries over between blocks.

use log::trace;

/// Keyed cipher state. One instance decrypts (or encrypts) exactly one
/// byte stream; create a fresh instance per block.
pub struct SapphireCipher {
    cards: [u8; 256],
    rotor: u8,
    ratchet: u8,
    avalanche: u8,
    last_plain: u8,
    last_cipher: u8,
}

/// Key-dependent pseudo-random byte in `0..=limit`.
///
/// `mask` is the smallest all-ones value covering `limit`; candidates
/// above `limit` are rejected, with a retry limiter that forces a modulo
/// after 11 attempts to avoid rare long rejection loops.
fn key_rand(cards: &[u8; 256], limit: u8, key: &[u8], rsum: &mut u8, keypos: &mut usize) -> u8 {
    if limit == 0 {
        return 0;
    }
    let mut mask: u32 = 1;
    while mask < u32::from(limit) {
        mask = (mask << 1) + 1;
    }
    let mut retry_limiter = 0;
    loop {
        *rsum = cards[usize::from(*rsum)].wrapping_add(key[*keypos]);
        *keypos += 1;
        if *keypos >= key.len() {
            *keypos = 0;
            // Makes key "aaaa" differ from key "aaaaaaaa".
            *rsum = rsum.wrapping_add(key.len() as u8);
        }
        let mut u = (mask as u8) & *rsum;
        retry_limiter += 1;
        if retry_limiter > 11 {
            u %= limit;
        }
        if u <= limit {
            return u;
        }
    }
}

impl SapphireCipher {
    /// Key the cipher. Keys may be up to 256 bytes; pass phrases are used
    /// directly. An empty key selects the fixed hashing setup from the
    /// reference implementation.
    pub fn new(key: &[u8]) -> Self {
        if key.is_empty() {
            // hash_init(): cards in inverse order, small odd indices.
            let mut cards = [0u8; 256];
            for (j, card) in cards.iter_mut().enumerate() {
                *card = 255 - j as u8;
            }
            return Self {
                cards,
                rotor: 1,
                ratchet: 3,
                avalanche: 5,
                last_plain: 7,
                last_cipher: 11,
            };
        }

        trace!("Keying Sapphire cipher with a {}-byte key", key.len());
        let mut cards = [0u8; 256];
        for (j, card) in cards.iter_mut().enumerate() {
            *card = j as u8;
        }
        // Swap the card at each position with some key-selected other card.
        let mut rsum = 0u8;
        let mut keypos = 0usize;
        for j in (0..=255usize).rev() {
            let to_swap = key_rand(&cards, j as u8, key, &mut rsum, &mut keypos);
            cards.swap(j, usize::from(to_swap));
        }
        // Indices start at different card values instead of all zero, so
        // less is known about the table when the first byte is emitted.
        Self {
            rotor: cards[1],
            ratchet: cards[3],
            avalanche: cards[5],
            last_plain: cards[7],
            last_cipher: cards[usize::from(rsum)],
            cards,
        }
    }

    /// One shuffle step: rotate/swap four table entries and accumulate the
    /// avalanche byte. Returns the XOR whitening byte for this position.
    fn advance(&mut self) -> u8 {
        self.ratchet = self
            .ratchet
            .wrapping_add(self.cards[usize::from(self.rotor)]);
        self.rotor = self.rotor.wrapping_add(1);
        let swap_temp = self.cards[usize::from(self.last_cipher)];
        self.cards[usize::from(self.last_cipher)] = self.cards[usize::from(self.ratchet)];
        self.cards[usize::from(self.ratchet)] = self.cards[usize::from(self.last_plain)];
        self.cards[usize::from(self.last_plain)] = self.cards[usize::from(self.rotor)];
        self.cards[usize::from(self.rotor)] = swap_temp;
        self.avalanche = self
            .avalanche
            .wrapping_add(self.cards[usize::from(swap_temp)]);

        let t1 = self.cards[usize::from(
            self.cards[usize::from(self.ratchet)]
                .wrapping_add(self.cards[usize::from(self.rotor)]),
        )];
        let t2 = self.cards[usize::from(
            self.cards[usize::from(
                self.cards[usize::from(self.last_plain)]
                    .wrapping_add(self.cards[usize::from(self.last_cipher)])
                    .wrapping_add(self.cards[usize::from(self.avalanche)]),
            )],
        )];
        t1 ^ t2
    }

    /// Decrypt a single cipher byte.
    pub fn decrypt_byte(&mut self, byte: u8) -> u8 {
        let whitening = self.advance();
        self.last_plain = byte ^ whitening;
        self.last_cipher = byte;
        self.last_plain
    }

    /// Encrypt a single plain byte.
    pub fn encrypt_byte(&mut self, byte: u8) -> u8 {
        let whitening = self.advance();
        self.last_cipher = byte ^ whitening;
        self.last_plain = byte;
        self.last_cipher
    }

    /// Decrypt a whole block.
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&b| self.decrypt_byte(b)).collect()
    }

    /// Encrypt a whole block.
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter().map(|&b| self.encrypt_byte(b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plain() -> Vec<u8> {
        (0u8..=255).cycle().take(1000).collect()
    }

    #[test]
    fn round_trips_with_the_same_key() {
        let plain = sample_plain();
        let encrypted = SapphireCipher::new(b"secret key").encrypt(&plain);
        assert_ne!(encrypted, plain);
        let decrypted = SapphireCipher::new(b"secret key").decrypt(&encrypted);
        assert_eq!(decrypted, plain);
    }

    #[test]
    fn wrong_key_does_not_recover_the_plaintext() {
        let plain = sample_plain();
        let encrypted = SapphireCipher::new(b"secret key").encrypt(&plain);
        let garbled = SapphireCipher::new(b"other key").decrypt(&encrypted);
        assert_ne!(garbled, plain);
    }

    #[test]
    fn key_length_changes_the_stream() {
        // "aaaa" and "aaaaaaaa" cycle the same bytes; only the length
        // feedback separates them.
        let plain = sample_plain();
        let short = SapphireCipher::new(b"aaaa").encrypt(&plain);
        let long = SapphireCipher::new(b"aaaaaaaa").encrypt(&plain);
        assert_ne!(short, long);
    }

    #[test]
    fn empty_key_uses_the_fixed_setup() {
        let plain = sample_plain();
        let encrypted = SapphireCipher::new(b"").encrypt(&plain);
        assert_ne!(encrypted, plain);
        assert_eq!(SapphireCipher::new(b"").decrypt(&encrypted), plain);
    }

    #[test]
    fn matches_the_reference_key_stream() {
        // Fixed vector from the public-domain sapphire.cpp algorithm:
        // decrypting the bytes 0..=63 under the key "testkey 123".
        let input: Vec<u8> = (0u8..64).collect();
        let expected: [u8; 64] = [
            0x46, 0x97, 0xd9, 0x08, 0xa5, 0x15, 0xa3, 0x4c, 0xc3, 0x6d, 0xe0, 0xd9, 0xfa, 0x21,
            0xb2, 0x8f, 0x74, 0xf7, 0x59, 0x7b, 0x72, 0x2e, 0x92, 0x27, 0x05, 0x27, 0xfc, 0x8b,
            0x3d, 0xa1, 0xea, 0x66, 0xf4, 0xaf, 0xb7, 0x8d, 0x57, 0x53, 0xaf, 0x63, 0xa3, 0x8f,
            0xfa, 0x83, 0x76, 0x1b, 0x67, 0xec, 0x85, 0xec, 0xa1, 0x96, 0xee, 0x57, 0xda, 0x81,
            0xad, 0x1e, 0x79, 0x3d, 0xf5, 0x8e, 0x41, 0x47,
        ];
        let decrypted = SapphireCipher::new(b"testkey 123").decrypt(&input);
        assert_eq!(decrypted, expected);
    }

    #[test]
    fn state_chains_across_bytes() {
        // The same byte twice in a row must not encrypt identically.
        let mut cipher = SapphireCipher::new(b"key");
        let first = cipher.encrypt_byte(b'x');
        let second = cipher.encrypt_byte(b'x');
        assert_ne!(first, second);
    }
}
