use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::check_in::CheckIn;
use crate::models::customer::Customer;
use crate::models::ledger_entry::{CreateEntryData, LedgerEntry, PointCategory};
use crate::services::ledger;

/// Trailing window over which distinct visit days are counted.
pub const WINDOW_DAYS: i64 = 30;

/// Step table mapping distinct visit days in the window to bonus points,
/// evaluated top-down, highest qualifying threshold wins.
pub fn bonus_for_days(days: i32) -> i32 {
    if days >= 20 {
        100
    } else if days >= 15 {
        75
    } else if days >= 10 {
        50
    } else if days >= 5 {
        25
    } else {
        0
    }
}

/// Points to grant given the current step value and the customer's
/// recorded high-water mark. Only the rise is credited; a fall grants
/// nothing (and is never clawed back).
pub fn bonus_delta(current_level: i32, recorded_level: i32) -> i32 {
    (current_level - recorded_level).max(0)
}

/// A customer's current frequency standing.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyStanding {
    pub days_visited: i32,
    pub bonus_level: i32,
}

/// Points credited by one application of the bonus policy.
#[derive(Debug, Clone, Copy)]
pub struct BonusGrant {
    pub days_visited: i32,
    pub points: i32,
}

/// Distinct visit days in the trailing window and the step value they map
/// to, as of `as_of`.
pub async fn standing<'e>(
    db: impl PgExecutor<'e>,
    customer_id: Uuid,
    as_of: DateTime<Utc>,
) -> Result<FrequencyStanding, sqlx::Error> {
    let days_visited =
        CheckIn::distinct_days_in_window(db, customer_id, as_of, WINDOW_DAYS).await?;

    Ok(FrequencyStanding {
        days_visited,
        bonus_level: bonus_for_days(days_visited),
    })
}

/// Applies the high-water-mark bonus policy inside the caller's
/// transaction: a rise above `recorded_level` credits the difference as a
/// frequency-bonus ledger entry; a fall lowers the stored mark without
/// credit, so a later re-crossing grants again.
pub async fn apply_bonus(
    conn: &mut PgConnection,
    customer_id: Uuid,
    recorded_level: i32,
    now: DateTime<Utc>,
) -> Result<BonusGrant, sqlx::Error> {
    let standing = standing(&mut *conn, customer_id, now).await?;
    let points = bonus_delta(standing.bonus_level, recorded_level);

    if points > 0 {
        LedgerEntry::insert(
            &mut *conn,
            CreateEntryData {
                customer_id,
                points,
                category: PointCategory::FrequencyBonus,
                description: format!(
                    "Frequency bonus: {} visits in {} days",
                    standing.days_visited, WINDOW_DAYS
                ),
                created_at: now,
                expires_at: Some(ledger::expiry_for(now)),
            },
        )
        .await?;

        tracing::info!(
            customer_id = %customer_id,
            days_visited = standing.days_visited,
            points,
            "Granted frequency bonus"
        );
    }

    if standing.bonus_level != recorded_level {
        Customer::set_bonus_level(&mut *conn, customer_id, standing.bonus_level).await?;
    }

    Ok(BonusGrant {
        days_visited: standing.days_visited,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_table_matches_the_program_rules() {
        assert_eq!(bonus_for_days(0), 0);
        assert_eq!(bonus_for_days(4), 0);
        assert_eq!(bonus_for_days(5), 25);
        assert_eq!(bonus_for_days(9), 25);
        assert_eq!(bonus_for_days(10), 50);
        assert_eq!(bonus_for_days(12), 50);
        assert_eq!(bonus_for_days(14), 50);
        assert_eq!(bonus_for_days(15), 75);
        assert_eq!(bonus_for_days(19), 75);
        assert_eq!(bonus_for_days(20), 100);
        assert_eq!(bonus_for_days(31), 100);
    }

    #[test]
    fn crossing_a_threshold_grants_the_difference() {
        // 4 -> 5 visits: first threshold crossed
        assert_eq!(bonus_delta(bonus_for_days(5), 0), 25);
        // 9 -> 10 visits: already granted 25, top up to 50
        assert_eq!(bonus_delta(bonus_for_days(10), 25), 25);
        // Jumping two thresholds at once grants the whole rise
        assert_eq!(bonus_delta(bonus_for_days(16), 25), 50);
    }

    #[test]
    fn holding_a_level_grants_nothing() {
        assert_eq!(bonus_delta(bonus_for_days(12), 50), 0);
        assert_eq!(bonus_delta(bonus_for_days(14), 50), 0);
    }

    #[test]
    fn falling_below_a_level_grants_nothing() {
        // Window rolled off: mark is lowered, never clawed back
        assert_eq!(bonus_delta(bonus_for_days(3), 50), 0);
    }
}
