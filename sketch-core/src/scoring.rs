/// Guesses within the first 15 seconds earn the top tier.
const HIGH_TIER_BEFORE: u32 = 15;
/// Guesses before the 20 second mark earn the middle tier.
const MID_TIER_BEFORE: u32 = 20;
/// The drawer receives this fraction of every award their word earns.
const DRAWER_SHARE_FACTOR: f64 = 5.0;

/// Pure point arithmetic, kept free of timers and sockets so it can be
/// tested on its own. Faster correct guesses are worth more; the drawer is
/// rewarded proportionally so drawing well pays off no matter how quickly
/// guesses land.
pub struct ScoringPolicy;

impl ScoringPolicy {
    /// Base points for a correct guess after `elapsed_seconds` of round
    /// time. Monotonically non-increasing.
    pub fn score_for(elapsed_seconds: u32) -> f64 {
        if elapsed_seconds < HIGH_TIER_BEFORE {
            100.0
        } else if elapsed_seconds < MID_TIER_BEFORE {
            50.0
        } else {
            25.0
        }
    }

    /// The drawer's cut of a guesser's award. Fractional results are kept
    /// as-is and accumulate without truncation.
    pub fn drawer_share(base_points: f64) -> f64 {
        base_points / DRAWER_SHARE_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(ScoringPolicy::score_for(0), 100.0);
        assert_eq!(ScoringPolicy::score_for(5), 100.0);
        assert_eq!(ScoringPolicy::score_for(14), 100.0);
        assert_eq!(ScoringPolicy::score_for(15), 50.0);
        assert_eq!(ScoringPolicy::score_for(16), 50.0);
        assert_eq!(ScoringPolicy::score_for(19), 50.0);
        assert_eq!(ScoringPolicy::score_for(20), 25.0);
        assert_eq!(ScoringPolicy::score_for(25), 25.0);
        assert_eq!(ScoringPolicy::score_for(1000), 25.0);
    }

    #[test]
    fn monotonically_non_increasing() {
        let mut previous = f64::MAX;
        for elapsed in 0..60 {
            let points = ScoringPolicy::score_for(elapsed);
            assert!(
                points <= previous,
                "score_for({}) = {} exceeds score_for({}) = {}",
                elapsed,
                points,
                elapsed.saturating_sub(1),
                previous
            );
            previous = points;
        }
    }

    #[test]
    fn drawer_share_is_a_fifth() {
        assert_eq!(ScoringPolicy::drawer_share(100.0), 20.0);
        assert_eq!(ScoringPolicy::drawer_share(50.0), 10.0);
        assert_eq!(ScoringPolicy::drawer_share(25.0), 5.0);
        // Fractional shares stay fractional
        assert_eq!(ScoringPolicy::drawer_share(1.0), 0.2);
    }
}
