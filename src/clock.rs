use chrono::{Local, Timelike};

/// Local wall-clock reading used by the clock hands and the day/night body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct WallTime {
    pub(crate) hour: u32,
    pub(crate) minute: u32,
    pub(crate) second: u32,
    pub(crate) millis: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Hand {
    Hour,
    Minute,
    Second,
}

impl WallTime {
    pub(crate) fn new(hour: u32, minute: u32, second: u32) -> Self {
        Self {
            hour,
            minute,
            second,
            millis: 0,
        }
    }

    pub(crate) fn now() -> Self {
        let t = Local::now();
        Self {
            hour: t.hour(),
            minute: t.minute(),
            second: t.second(),
            // Leap seconds report 1000..2000 here.
            millis: (t.nanosecond() / 1_000_000).min(999),
        }
    }

    pub(crate) fn is_am(&self) -> bool {
        self.hour < 12
    }

    /// Fraction of a full turn in `[0, 1)`, carrying the next-smaller unit.
    pub(crate) fn angle(&self, hand: Hand) -> f32 {
        let a = match hand {
            Hand::Hour => ((self.hour % 12) as f32 + self.minute as f32 / 60.0) / 12.0,
            Hand::Minute => (self.minute as f32 + self.second as f32 / 60.0) / 60.0,
            Hand::Second => (self.second as f32 + self.millis as f32 / 1000.0) / 60.0,
        };
        a.rem_euclid(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn midnight_is_zero_everywhere() {
        let t = WallTime::new(0, 0, 0);
        for hand in [Hand::Hour, Hand::Minute, Hand::Second] {
            assert_eq!(t.angle(hand), 0.0);
        }
    }

    #[test]
    fn half_past_puts_minute_hand_halfway() {
        assert_eq!(WallTime::new(0, 30, 0).angle(Hand::Minute), 0.5);
    }

    #[rstest]
    #[case(WallTime::new(3, 0, 0), Hand::Hour, 0.25)]
    #[case(WallTime::new(15, 0, 0), Hand::Hour, 0.25)]
    #[case(WallTime::new(6, 30, 0), Hand::Hour, 6.5 / 12.0)]
    #[case(WallTime::new(0, 15, 30), Hand::Minute, 15.5 / 60.0)]
    #[case(WallTime { hour: 0, minute: 0, second: 45, millis: 500 }, Hand::Second, 45.5 / 60.0)]
    fn fractional_carry(#[case] t: WallTime, #[case] hand: Hand, #[case] want: f32) {
        assert!((t.angle(hand) - want).abs() < 1e-6);
    }

    #[test]
    fn angles_increase_within_a_turn() {
        let mut prev = -1.0;
        for s in 0..60 {
            let a = WallTime::new(10, 20, s).angle(Hand::Second);
            assert!(a > prev && a < 1.0);
            prev = a;
        }
    }

    #[test]
    fn am_pm_split_at_noon() {
        assert!(WallTime::new(11, 59, 59).is_am());
        assert!(!WallTime::new(12, 0, 0).is_am());
        assert!(WallTime::new(0, 0, 0).is_am());
    }
}
