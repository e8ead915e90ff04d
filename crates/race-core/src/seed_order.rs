//! Seed-rank to lane mapping.

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// The lanes assigned to seeds in order of speed.
///
/// Index 0 holds the lane of the fastest seed, index 1 the second fastest,
/// and so on. The table is a permutation of `1..=lane_count`, so its length
/// is the lane capacity of every race it is used for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct SeedOrder(Vec<u32>);

impl SeedOrder {
    /// Creates a seed order after checking it is a permutation of `1..=len`.
    pub fn new(lanes: Vec<u32>) -> Result<Self, ValidationError> {
        if lanes.is_empty() {
            return Err(ValidationError::Empty {
                field: "seed order",
            });
        }
        let lane_count = u32::try_from(lanes.len()).unwrap_or(u32::MAX);
        let mut seen = vec![false; lanes.len()];
        for &lane in &lanes {
            if lane == 0 || lane > lane_count {
                return Err(ValidationError::LaneOutOfRange { lane, lane_count });
            }
            let slot = &mut seen[(lane - 1) as usize];
            if *slot {
                return Err(ValidationError::DuplicateLane { lane });
            }
            *slot = true;
        }
        Ok(Self(lanes))
    }

    /// Builds the conventional center-out order: the fastest seed gets the
    /// middle lane and slower seeds alternate outward toward the edges.
    ///
    /// For ten lanes this is `5, 6, 4, 7, 3, 8, 2, 9, 1, 10`.
    #[must_use]
    pub fn center_out(lane_count: u32) -> Self {
        let mut lanes = Vec::with_capacity(lane_count as usize);
        let mid = lane_count.div_ceil(2);
        lanes.push(mid);
        for offset in 1..=lane_count {
            let above = mid + offset;
            if above <= lane_count {
                lanes.push(above);
            }
            if let Some(below) = mid.checked_sub(offset).filter(|&l| l >= 1) {
                lanes.push(below);
            }
        }
        lanes.truncate(lane_count as usize);
        Self(lanes)
    }

    /// Number of lanes covered by this order.
    #[must_use]
    pub fn lane_count(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }

    /// Lane for the seed at `rank` (0 = fastest).
    #[must_use]
    pub fn lane_for(&self, rank: usize) -> Option<u32> {
        self.0.get(rank).copied()
    }

    /// Lanes in precedence order.
    pub fn lanes(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for SeedOrder {
    fn default() -> Self {
        Self::center_out(10)
    }
}

impl TryFrom<Vec<u32>> for SeedOrder {
    type Error = ValidationError;

    fn try_from(value: Vec<u32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SeedOrder> for Vec<u32> {
    fn from(order: SeedOrder) -> Self {
        order.0
    }
}
