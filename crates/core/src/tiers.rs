use log::warn;

/// Sentinel meaning "leave this item untouched".
pub const SKIP: i64 = 0;

/// Map an item's declared stack capacity to the target "maxed" count.
///
/// Capacity 1 marks quest-critical singletons whose presence or absence
/// game scripting depends on; normalizing them risks breaking
/// progression, so they map to [`SKIP`]. Unrecognized capacities also
/// map to [`SKIP`] after a logged warning. A return of 0 is never a
/// legitimate target count on its own.
pub fn desired_count(declared_capacity: i64) -> i64 {
    match declared_capacity {
        1 => SKIP,
        99 => 66,
        999 => 666,
        c if c >= 9999 => 6666,
        other => {
            warn!("unhandled capacity tier {other}; skipping item");
            SKIP
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tiers() {
        assert_eq!(desired_count(1), 0);
        assert_eq!(desired_count(99), 66);
        assert_eq!(desired_count(999), 666);
        assert_eq!(desired_count(9999), 6666);
    }

    #[test]
    fn capacities_above_highest_tier_clamp_to_it() {
        assert_eq!(desired_count(10_000), 6666);
        assert_eq!(desired_count(99_999), 6666);
        assert_eq!(desired_count(i64::MAX), 6666);
    }

    #[test]
    fn unrecognized_tiers_are_skipped() {
        assert_eq!(desired_count(50), SKIP);
        assert_eq!(desired_count(0), SKIP);
        assert_eq!(desired_count(-5), SKIP);
        assert_eq!(desired_count(100), SKIP);
    }
}
