//! Experience progression.
//!
//! [`apply_xp`] moves a player's `(level, points)` pair forward by an XP
//! gain. At most one level is gained per call, even when the gain would
//! cover several thresholds; the overage carried into the new level is
//! `xp_gained - threshold(level + 1)`, floored at zero.

use tracing::debug;

use crate::levels::LevelTable;

/// A player's position on a level table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Current level.
    pub level: u32,
    /// XP accumulated towards the next level.
    pub points: u32,
}

/// Result of applying an XP gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpOutcome {
    /// Progress before the gain.
    pub before: Progress,
    /// Progress after the gain; this is what gets persisted.
    pub after: Progress,
    /// Threshold for `after.level + 1`.
    pub points_to_next_level: u32,
}

impl XpOutcome {
    /// Whether the gain produced a level-up.
    pub const fn leveled_up(&self) -> bool {
        self.after.level > self.before.level
    }
}

/// Apply `xp_gained` to `progress` using `table`.
///
/// A level-up happens when `points + xp_gained` reaches the threshold for
/// `level + 1` and the player is below the table cap. At the cap, points
/// keep accumulating.
pub fn apply_xp(table: &LevelTable, progress: Progress, xp_gained: u32) -> XpOutcome {
    let next_threshold = table.threshold_for(progress.level.saturating_add(1));
    let overage = i64::from(xp_gained).saturating_sub(i64::from(next_threshold));
    let reached = u64::from(progress.points).saturating_add(u64::from(xp_gained))
        >= u64::from(next_threshold);

    let after = if reached && !table.is_max_level(progress.level) {
        Progress {
            level: progress.level.saturating_add(1),
            points: u32::try_from(overage.max(0)).unwrap_or(u32::MAX),
        }
    } else {
        Progress {
            level: progress.level,
            points: progress.points.saturating_add(xp_gained),
        }
    };

    let outcome = XpOutcome {
        before: progress,
        after,
        points_to_next_level: table.threshold_for(after.level.saturating_add(1)),
    };

    if outcome.leveled_up() {
        debug!(
            from_level = progress.level,
            to_level = after.level,
            carried_points = after.points,
            "level up"
        );
    }

    outcome
}

/// Threshold for the level after `level` on `table`.
pub fn points_to_next_level(table: &LevelTable, level: u32) -> u32 {
    table.threshold_for(level.saturating_add(1))
}
