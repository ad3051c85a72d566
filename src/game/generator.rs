use super::constants::{
    DOUBLE_APPLE_LENGTH, LEMON_CHANCE, LEMON_SCORE_THRESHOLD, MAX_REJECTION_ATTEMPTS,
    ROOM_APPLES_PER_OCCUPANT, ROOM_OCCUPANTS_PER_LEMON, SPAWN_MARGIN,
};
use super::types::{Food, FoodKind, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// How many items of which kind the next batch holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodPlan {
    OpenWorld {
        snake_len: usize,
        score: u32,
        bonus_apples: u32,
    },
    Room {
        occupancy: u32,
        bonus_apples: u32,
    },
}

impl FoodPlan {
    pub fn margin(&self) -> i32 {
        match self {
            Self::OpenWorld { .. } => 0,
            Self::Room { .. } => SPAWN_MARGIN,
        }
    }

    pub fn kinds<R: Rng>(&self, rng: &mut R) -> Vec<FoodKind> {
        match *self {
            Self::OpenWorld {
                snake_len,
                score,
                bonus_apples,
            } => {
                let base = if snake_len > DOUBLE_APPLE_LENGTH { 2 } else { 1 };
                (0..base + bonus_apples)
                    .map(|_| {
                        if score > LEMON_SCORE_THRESHOLD && rng.gen_bool(LEMON_CHANCE) {
                            FoodKind::Lemon
                        } else {
                            FoodKind::Apple
                        }
                    })
                    .collect()
            }
            Self::Room {
                occupancy,
                bonus_apples,
            } => {
                let apples = ROOM_APPLES_PER_OCCUPANT * occupancy + bonus_apples;
                let lemons = occupancy / ROOM_OCCUPANTS_PER_LEMON;
                let mut kinds = vec![FoodKind::Apple; apples as usize];
                kinds.extend(std::iter::repeat(FoodKind::Lemon).take(lemons as usize));
                kinds
            }
        }
    }
}

/// Places one food item per requested kind on distinct free cells.
///
/// Cells in `occupied` and cells closer than `margin` to the grid edge are never
/// used. When the grid runs out of free cells the batch comes back short.
pub fn generate<R: Rng>(
    kinds: &[FoodKind],
    grid_size: i32,
    margin: i32,
    occupied: &HashSet<Position>,
    rng: &mut R,
) -> Vec<Food> {
    let mut taken = occupied.clone();
    let mut batch = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let Some(position) = free_cell(grid_size, margin, &taken, rng) else { break };
        taken.insert(position);
        batch.push(Food {
            position,
            kind: *kind,
        });
    }
    batch
}

pub fn generate_batch<R: Rng>(
    plan: FoodPlan,
    grid_size: i32,
    occupied: &HashSet<Position>,
    rng: &mut R,
) -> Vec<Food> {
    let kinds = plan.kinds(rng);
    generate(&kinds, grid_size, plan.margin(), occupied, rng)
}

/// Uniform free cell: rejection sampling first, exhaustive scan once the retry
/// budget is spent.
pub fn free_cell<R: Rng>(
    grid_size: i32,
    margin: i32,
    occupied: &HashSet<Position>,
    rng: &mut R,
) -> Option<Position> {
    let low = margin;
    let high = grid_size - margin;
    if low >= high {
        return None;
    }

    for _ in 0..MAX_REJECTION_ATTEMPTS {
        let candidate = Position::new(rng.gen_range(low..high), rng.gen_range(low..high));
        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }

    let free: Vec<Position> = (low..high)
        .flat_map(|y| (low..high).map(move |x| Position::new(x, y)))
        .filter(|cell| !occupied.contains(cell))
        .collect();
    free.choose(rng).copied()
}
