//! Level threshold tables.
//!
//! A [`LevelTable`] maps a level index to the cumulative XP that level
//! requires. Lookups are total: any level at or past the last index returns
//! the last entry, so callers can ask for `level + 1` at the cap without a
//! bounds check.
//!
//! Two tables ship with the crate:
//!
//! | Table | Seed | Step from `prev` |
//! |-------|------|------------------|
//! | [`PLAYER_LEVELS`] | `0, 100` | `ceil(log10(prev) * 100)` |
//! | [`CREATURE_LEVELS`] | `50` | `ceil(log10(prev) * 10)` |
//!
//! [`CREATURE_LEVELS`] is indexed by the *player's* level and gives the XP a
//! player earns for each creature collected.

use crate::EconomyError;

/// Number of entries in each shipped table (levels `0..=100`).
pub const TABLE_LEN: usize = 101;

/// Cumulative XP required to reach each player level.
const PLAYER_XP: [u32; TABLE_LEN] = [
    0, 100, 300, 548, 822, 1114, 1419, 1735, 2059, 2391, 2729, 3073, 3422, 3776, 4134, 4496, 4862,
    5231, 5603, 5978, 6356, 6737, 7120, 7506, 7894, 8284, 8676, 9070, 9466, 9864, 10264, 10666,
    11069, 11474, 11880, 12288, 12697, 13108, 13520, 13934, 14349, 14765, 15182, 15601, 16021,
    16442, 16864, 17287, 17711, 18136, 18562, 18989, 19417, 19846, 20276, 20707, 21139, 21572,
    22006, 22441, 22877, 23313, 23750, 24188, 24627, 25067, 25507, 25948, 26390, 26833, 27276,
    27720, 28165, 28610, 29056, 29503, 29950, 30398, 30847, 31296, 31746, 32197, 32648, 33100,
    33552, 34005, 34459, 34913, 35368, 35823, 36279, 36735, 37192, 37650, 38108, 38567, 39026,
    39486, 39946, 40407, 40868,
];

/// XP awarded per collected creature, by player level.
const CREATURE_XP: [u32; TABLE_LEN] = [
    50, 67, 86, 106, 127, 149, 171, 194, 217, 241, 265, 290, 315, 340, 366, 392, 418, 445, 472, 499,
    526, 554, 582, 610, 638, 667, 696, 725, 754, 783, 812, 842, 872, 902, 932, 962, 992, 1022, 1053,
    1084, 1115, 1146, 1177, 1208, 1239, 1270, 1302, 1334, 1366, 1398, 1430, 1462, 1494, 1526, 1558,
    1590, 1623, 1656, 1689, 1722, 1755, 1788, 1821, 1854, 1887, 1920, 1953, 1986, 2019, 2053, 2087,
    2121, 2155, 2189, 2223, 2257, 2291, 2325, 2359, 2393, 2427, 2461, 2495, 2529, 2564, 2599, 2634,
    2669, 2704, 2739, 2774, 2809, 2844, 2879, 2914, 2949, 2984, 3019, 3054, 3089, 3124,
];

/// Player leveling thresholds.
pub const PLAYER_LEVELS: LevelTable = LevelTable::from_static(&PLAYER_XP);

/// Per-creature XP reward, indexed by the collecting player's level.
pub const CREATURE_LEVELS: LevelTable = LevelTable::from_static(&CREATURE_XP);

/// An immutable, non-decreasing, non-empty sequence of XP thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTable {
    thresholds: &'static [u32],
}

impl LevelTable {
    /// Build a table from static data, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidLevelTable`] if `thresholds` is empty
    /// or ever decreases.
    pub fn new(thresholds: &'static [u32]) -> Result<Self, EconomyError> {
        if thresholds.is_empty() {
            return Err(EconomyError::InvalidLevelTable("table is empty"));
        }
        if !thresholds.windows(2).all(|pair| matches!(pair, [a, b] if a <= b)) {
            return Err(EconomyError::InvalidLevelTable(
                "thresholds must be non-decreasing",
            ));
        }
        Ok(Self { thresholds })
    }

    /// Wrap the shipped tables; their shape is checked by the unit tests.
    const fn from_static(thresholds: &'static [u32]) -> Self {
        Self { thresholds }
    }

    /// XP threshold for `level`, clamped to the last entry.
    pub fn threshold_for(&self, level: u32) -> u32 {
        let index = usize::try_from(level).unwrap_or(usize::MAX);
        self.thresholds
            .get(index)
            .or_else(|| self.thresholds.last())
            .copied()
            .unwrap_or(0)
    }

    /// The highest level index in the table.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.thresholds.len().saturating_sub(1)).unwrap_or(u32::MAX)
    }

    /// Whether `level` is at (or past) the table cap.
    pub fn is_max_level(&self, level: u32) -> bool {
        level >= self.max_level()
    }
}
