pub use sodiumoxide::randombytes::randombytes;

use sodiumoxide::crypto::box_;

/// This random generator should be used instead of `rand` and the rest
/// anywhere in the code (even in tests). We have a rule that insecure
/// randomness should generally not be used.
///
/// You should call `sealedenvelope::init()` before using `GoodRand`.
pub trait GoodRand {
    fn rand() -> Self;
}

/// Generate `n` random bytes.
pub fn random_bytes(n: usize) -> Vec<u8> {
    randombytes(n)
}

/// Generate a random integer in range [0, n).
pub fn randomnumber(n: u64) -> u64 {
    // We want to avoid modulo bias, so we use the arc4random_uniform
    // implementation (http://stackoverflow.com/a/20051580/615030).
    if n < 2 {
        return 0;
    }
    let min: u64 = n.wrapping_neg() % n; // 2^64 mod n == (2^64 - n) mod n
    let mut r: u64 = GoodRand::rand();
    while r < min {
        r = GoodRand::rand();
    }
    r % n
}

// implementations of GoodRand /////////////////////////////////////////////

impl GoodRand for u64 {
    fn rand() -> u64 {
        let mut x = [0u8; 8];
        x.copy_from_slice(&randombytes(8));
        u64::from_le_bytes(x)
    }
}

impl GoodRand for String {
    /// A short string of random lowercase letters.
    fn rand() -> String {
        let len = randomnumber(64) as usize;
        (0..len)
            .map(|_| (b'a' + randomnumber(26) as u8) as char)
            .collect()
    }
}

/// Random bytes shaped like a public key. Opening an envelope against one
/// of these exercises the wrong-key path.
impl GoodRand for box_::PublicKey {
    fn rand() -> box_::PublicKey {
        let mut k = [0u8; box_::PUBLICKEYBYTES];
        k.copy_from_slice(&randombytes(box_::PUBLICKEYBYTES));
        box_::PublicKey(k)
    }
}

#[test]
fn distribution_test() {
    const ITERATIONS: usize = 100_000;
    const SPREAD: u64 = 5;
    const TOLERANCE: f64 = 0.03; // 3 percent
    crate::init().unwrap();
    let mut buckets = vec![0i64; SPREAD as usize];
    for _ in 0..ITERATIONS {
        let n = randomnumber(SPREAD) as usize;
        buckets[n] += 1;
    }

    for b in buckets {
        let expected = ITERATIONS as f64 / SPREAD as f64;
        let relative_deviation = (b as f64 - expected).abs() / expected;
        assert!(relative_deviation < TOLERANCE);
    }
}
