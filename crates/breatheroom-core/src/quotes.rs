//! Motivational quotes shown during a session.

use rand::seq::SliceRandom;
use rand::Rng;

pub const QUOTES: [&str; 12] = [
    "Breathe in peace, breathe out stress",
    "Each breath brings you closer to calm",
    "You're taking great care of yourself",
    "Feel your mind becoming clearer",
    "Let go of what doesn't serve you",
    "You're getting stronger with each breath",
    "Embrace the peaceful moment",
    "Your mind is becoming calmer",
    "You're doing great!",
    "Feel the tension melting away",
    "Peace begins with this moment",
    "You're creating positive change",
];

/// Pick a quote uniformly at random.
pub fn pick<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    QUOTES.choose(rng).copied().unwrap_or(QUOTES[0])
}

/// Whether a quote should be shown when `time_left_secs` remain.
pub fn is_quote_second(time_left_secs: u32, every_secs: u32) -> bool {
    every_secs > 0 && time_left_secs % every_secs == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::collections::HashSet;

    #[test]
    fn picks_come_from_the_list() {
        let mut rng = Pcg64::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let q = pick(&mut rng);
            assert!(QUOTES.contains(&q));
            seen.insert(q);
        }
        assert_eq!(seen.len(), QUOTES.len());
    }

    #[test]
    fn quote_every_five_seconds() {
        assert!(is_quote_second(295, 5));
        assert!(is_quote_second(0, 5));
        assert!(!is_quote_second(299, 5));
        assert!(!is_quote_second(10, 0));
    }
}
