use crate::models::customer::Tier;
use crate::models::venue_settings::Thresholds;

/// Maps a valid balance to a tier, evaluated top-down. Pure and
/// side-effect-free: the cached tier on the customer row is only ever a
/// materialization of this function over the ledger.
pub fn classify(balance: i32, thresholds: &Thresholds) -> Tier {
    if balance >= thresholds.green_min {
        Tier::Green
    } else if balance >= thresholds.yellow_min {
        Tier::Yellow
    } else {
        Tier::Red
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_are_200_and_500() {
        let t = Thresholds::default();
        assert_eq!(t.yellow_min, 200);
        assert_eq!(t.green_min, 500);
    }

    #[test]
    fn classifies_across_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(classify(0, &t), Tier::Red);
        assert_eq!(classify(199, &t), Tier::Red);
        assert_eq!(classify(200, &t), Tier::Yellow);
        assert_eq!(classify(300, &t), Tier::Yellow);
        assert_eq!(classify(499, &t), Tier::Yellow);
        assert_eq!(classify(500, &t), Tier::Green);
        assert_eq!(classify(10_000, &t), Tier::Green);
    }

    #[test]
    fn classification_is_idempotent() {
        let t = Thresholds {
            yellow_min: 50,
            green_min: 75,
        };
        for balance in [0, 49, 50, 74, 75, 1000] {
            assert_eq!(classify(balance, &t), classify(balance, &t));
        }
    }

    #[test]
    fn classification_is_monotone_in_balance() {
        let t = Thresholds::default();
        let mut previous = classify(0, &t);
        for balance in 1..600 {
            let current = classify(balance, &t);
            assert!(current >= previous, "tier regressed at balance {balance}");
            previous = current;
        }
    }

    #[test]
    fn equal_thresholds_skip_the_middle_tier() {
        let t = Thresholds {
            yellow_min: 100,
            green_min: 100,
        };
        assert_eq!(classify(99, &t), Tier::Red);
        assert_eq!(classify(100, &t), Tier::Green);
    }
}
