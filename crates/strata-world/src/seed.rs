/// A world seed and the noise-domain offset derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed {
    pub seed: i32,
    pub offset: (i32, i32),
}

impl WorldSeed {
    /// Offset is `(seed % 10000, (seed / 10000) % 10000)` with truncating division.
    pub fn from_seed(seed: i32) -> Self {
        Self {
            seed,
            offset: (seed % 10_000, (seed / 10_000) % 10_000),
        }
    }

    pub fn random() -> Self {
        Self::from_seed(fastrand::i32(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_splits_seed_digits() {
        let s = WorldSeed::from_seed(123_456_789);
        assert_eq!(s.offset, (6789, 2345));
        let n = WorldSeed::from_seed(-98_765);
        assert_eq!(n.offset, (-8765, -9));
    }

    #[test]
    fn offset_stays_below_ten_thousand() {
        for seed in [i32::MIN, i32::MAX, 0, -1, 9_999, 10_000] {
            let s = WorldSeed::from_seed(seed);
            assert!(s.offset.0.abs() < 10_000);
            assert!(s.offset.1.abs() < 10_000);
        }
    }
}
