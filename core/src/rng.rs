//! Deterministic random generation for ids, keys and synthetic accounts.
//!
//! RULE: Nothing in the simulator calls a platform RNG.
//! All randomness flows through SimRng streams derived from the session
//! seed, one stream per purpose, so adding a purpose never shifts the
//! values another purpose produces.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const HEX: &[u8] = b"0123456789abcdef";

/// A named, deterministic RNG stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Derive a stream from the session seed and a stable stream index.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// `len` characters drawn uniformly from `alphabet`.
    pub fn string_from(&mut self, alphabet: &[u8], len: usize) -> String {
        (0..len)
            .map(|_| alphabet[self.next_u64_below(alphabet.len() as u64) as usize] as char)
            .collect()
    }
}

/// Stable stream assignments.
/// NEVER reorder or remove entries — only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum Stream {
    Ids = 0,
    Keys = 1,
    Accounts = 2,
    Names = 3,
    Balances = 4,
}

impl Stream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ids      => "ids",
            Self::Keys     => "keys",
            Self::Accounts => "accounts",
            Self::Names    => "names",
            Self::Balances => "balances",
        }
    }
}

/// All generator streams for one session.
pub struct IdGenerator {
    ids:      SimRng,
    keys:     SimRng,
    accounts: SimRng,
    pub names:    SimRng,
    pub balances: SimRng,
}

impl IdGenerator {
    pub fn new(master_seed: u64) -> Self {
        let stream = |s: Stream| SimRng::new(master_seed, s as u64).with_name(s.name());
        Self {
            ids:      stream(Stream::Ids),
            keys:     stream(Stream::Keys),
            accounts: stream(Stream::Accounts),
            names:    stream(Stream::Names),
            balances: stream(Stream::Balances),
        }
    }

    /// Nine base-36 characters.
    pub fn id(&mut self) -> String {
        self.ids.string_from(BASE36, 9)
    }

    /// `sk_test_` followed by 32 base-36 characters.
    pub fn api_key(&mut self) -> String {
        format!("sk_test_{}", self.keys.string_from(BASE36, 32))
    }

    /// Sixteen decimal digits.
    pub fn account_number(&mut self) -> String {
        self.accounts.string_from(&BASE36[..10], 16)
    }

    /// `0x` followed by 40 lowercase hex digits.
    pub fn wallet_address(&mut self) -> String {
        format!("0x{}", self.accounts.string_from(HEX, 40))
    }
}
