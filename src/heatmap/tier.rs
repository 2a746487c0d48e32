/// Visits above this are `High`
pub const HIGH_ABOVE: u32 = 10;
/// Visits above this (and up to `HIGH_ABOVE`) are `Medium`
pub const MEDIUM_ABOVE: u32 = 5;

/// Discrete density class for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DensityTier {
    Low,
    Medium,
    High,
}

impl DensityTier {
    /// All tiers, back to front in draw order
    pub const ALL: [DensityTier; 3] = [DensityTier::Low, DensityTier::Medium, DensityTier::High];

    pub fn classify(visit_count: u32) -> Self {
        if visit_count > HIGH_ABOVE {
            DensityTier::High
        } else if visit_count > MEDIUM_ABOVE {
            DensityTier::Medium
        } else {
            DensityTier::Low
        }
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            DensityTier::Low => "low",
            DensityTier::Medium => "med",
            DensityTier::High => "high",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(DensityTier::classify(0), DensityTier::Low);
        assert_eq!(DensityTier::classify(1), DensityTier::Low);
        assert_eq!(DensityTier::classify(5), DensityTier::Low);
        assert_eq!(DensityTier::classify(6), DensityTier::Medium);
        assert_eq!(DensityTier::classify(10), DensityTier::Medium);
        assert_eq!(DensityTier::classify(11), DensityTier::High);
        assert_eq!(DensityTier::classify(u32::MAX), DensityTier::High);
    }

    #[test]
    fn test_monotonic() {
        let mut prev = DensityTier::classify(0);
        for count in 1..200 {
            let tier = DensityTier::classify(count);
            assert!(tier >= prev, "tier dropped at {count}");
            prev = tier;
        }
    }
}
