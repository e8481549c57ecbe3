//! Pseudo-random number generation.
//!
//! JSF64 is the hot generator (also used at compile-plan time to derive the
//! zobrist keys); splitmix64 seeds it. OS entropy backs the single-seed
//! constructor.

use rand::RngCore;

/// Bob Jenkins' small fast 64-bit generator.
#[derive(Clone, Debug)]
pub struct Jsf64Rng {
    a: u64,
    b: u64,
    c: u64,
    d: u64,
}

impl Jsf64Rng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        let mut a: u64 = 0xF1EA_5EED;
        let mut b = seed;
        let mut c = seed;
        let mut d = seed;

        let mut i = 0;
        while i < 20 {
            let e = a.wrapping_sub(b.rotate_left(7));
            a = b ^ c.rotate_left(13);
            b = c.wrapping_add(d.rotate_left(37));
            c = d.wrapping_add(e);
            d = e.wrapping_add(a);
            i += 1;
        }

        Jsf64Rng { a, b, c, d }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let e = self.a.wrapping_sub(self.b.rotate_left(7));
        self.a = self.b ^ self.c.rotate_left(13);
        self.b = self.c.wrapping_add(self.d.rotate_left(37));
        self.c = self.d.wrapping_add(e);
        self.d = e.wrapping_add(self.a);
        self.d
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Unbiased value in [0, bound) via Lemire's multiply-shift rejection
    pub fn next_u32_bounded(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }

        let mut x = self.next_u32();
        let mut m = u64::from(x) * u64::from(bound);
        let mut l = m as u32;

        if l < bound {
            let mut t = bound.wrapping_neg();

            if t >= bound {
                t -= bound;
                if t >= bound {
                    t %= bound;
                }
            }

            while l < t {
                x = self.next_u32();
                m = u64::from(x) * u64::from(bound);
                l = m as u32;
            }
        }

        (m >> 32) as u32
    }
}

/// splitmix64, suitable for seeding `Jsf64Rng`.
#[derive(Clone, Debug)]
pub struct SeedGenerator {
    state: u64,
}

impl SeedGenerator {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        SeedGenerator { state: seed }
    }

    /// Seeded from OS entropy
    #[must_use]
    pub fn from_entropy() -> Self {
        SeedGenerator::new(generate_single_seed())
    }

    pub fn next_seed(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);

        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);

        z ^ (z >> 31)
    }
}

/// One 64-bit seed from OS entropy.
#[must_use]
pub fn generate_single_seed() -> u64 {
    rand::rngs::OsRng.next_u64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsf64_deterministic() {
        let mut a = Jsf64Rng::new(0xDEAD_BEEF);
        let mut b = Jsf64Rng::new(0xDEAD_BEEF);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_jsf64_seed_sensitivity() {
        let mut a = Jsf64Rng::new(1);
        let mut b = Jsf64Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_bounded_in_range() {
        let mut rng = Jsf64Rng::new(42);
        for bound in [1u32, 2, 7, 100, 8192] {
            for _ in 0..200 {
                assert!(rng.next_u32_bounded(bound) < bound);
            }
        }
        assert_eq!(rng.next_u32_bounded(0), 0);
    }

    #[test]
    fn test_splitmix_known_values() {
        // reference values for seed 0 from the splitmix64 paper code
        let mut gen = SeedGenerator::new(0);
        assert_eq!(gen.next_seed(), 0xE220_A839_7B1D_CDAF);
        assert_eq!(gen.next_seed(), 0x6E78_9E6A_A1B9_65F4);
    }
}
