use super::constants::{BOT_COUNT, BOT_GREEDY_CHANCE, BOT_RANDOM_TURN_CHANCE, SPAWN_MARGIN};
use super::generator::free_cell;
use super::snake::Snake;
use super::types::{is_boundary_ring, Direction, Food, FoodKind, Position};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

pub type BotId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BotColor {
    Red,
    Green,
    Yellow,
    Pink,
    Purple,
}

impl BotColor {
    const PALETTE: [BotColor; 5] = [
        BotColor::Red,
        BotColor::Green,
        BotColor::Yellow,
        BotColor::Pink,
        BotColor::Purple,
    ];

    pub fn for_bot(id: BotId) -> Self {
        let index = id.saturating_sub(1) as usize % Self::PALETTE.len();
        Self::PALETTE[index]
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Red => "bg-red-500",
            Self::Green => "bg-green-500",
            Self::Yellow => "bg-yellow-500",
            Self::Pink => "bg-pink-500",
            Self::Purple => "bg-purple-500",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Bot {
    pub id: BotId,
    pub name: String,
    pub snake: Snake,
    pub direction: Direction,
    pub score: u32,
    pub color: BotColor,
}

impl Bot {
    pub fn new(id: BotId, snake: Snake, direction: Direction) -> Self {
        Self {
            id,
            name: format!("Bot-{id}"),
            snake,
            direction,
            score: 0,
            color: BotColor::for_bot(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Ate {
        bot_id: BotId,
        kind: FoodKind,
        score: u32,
    },
    Respawned {
        bot_id: BotId,
    },
}

/// Materializes the fixed roster for a freshly joined room on free interior cells.
pub fn spawn_roster<R: Rng>(grid_size: i32, occupied: &HashSet<Position>, rng: &mut R) -> Vec<Bot> {
    let mut taken = occupied.clone();
    let mut bots = Vec::with_capacity(BOT_COUNT);
    for index in 0..BOT_COUNT {
        let Some(head) = free_cell(grid_size, SPAWN_MARGIN, &taken, rng) else { break };
        taken.insert(head);
        let direction = Direction::ALL.choose(rng).copied().unwrap_or(Direction::Right);
        bots.push(Bot::new(index as BotId + 1, Snake::new(head), direction));
    }
    bots
}

/// Picks the next heading: an occasional random turn, otherwise a greedy chase
/// of the first food item. Never a 180-degree reversal.
pub fn choose_direction<R: Rng>(bot: &Bot, food: &[Food], rng: &mut R) -> Direction {
    let current = bot.direction;
    if rng.gen_bool(BOT_RANDOM_TURN_CHANCE) {
        let options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| *direction != current.opposite())
            .collect();
        return options.choose(rng).copied().unwrap_or(current);
    }
    if rng.gen_bool(BOT_GREEDY_CHANCE) {
        if let Some(target) = food.first() {
            return greedy_direction(bot.snake.head(), current, target.position).unwrap_or(current);
        }
    }
    current
}

/// Closes the x gap first, then the y gap, skipping a correction that would reverse.
pub fn greedy_direction(head: Position, current: Direction, target: Position) -> Option<Direction> {
    let horizontal = match target.x.cmp(&head.x) {
        std::cmp::Ordering::Greater => Some(Direction::Right),
        std::cmp::Ordering::Less => Some(Direction::Left),
        std::cmp::Ordering::Equal => None,
    };
    let vertical = match target.y.cmp(&head.y) {
        std::cmp::Ordering::Greater => Some(Direction::Down),
        std::cmp::Ordering::Less => Some(Direction::Up),
        std::cmp::Ordering::Equal => None,
    };
    [horizontal, vertical]
        .into_iter()
        .flatten()
        .find(|direction| *direction != current.opposite())
}

/// Advances one bot a single cell.
///
/// `food` is the shared field; eaten items are removed from it. `occupied` is
/// consulted only when the bot has to respawn.
pub fn step_bot<R: Rng>(
    bot: &mut Bot,
    food: &mut Vec<Food>,
    grid_size: i32,
    occupied: &HashSet<Position>,
    rng: &mut R,
) -> Option<BotEvent> {
    bot.direction = choose_direction(bot, food, rng);
    move_bot(bot, food, grid_size, occupied, rng)
}

/// Moves a bot one cell along its committed direction.
pub fn move_bot<R: Rng>(
    bot: &mut Bot,
    food: &mut Vec<Food>,
    grid_size: i32,
    occupied: &HashSet<Position>,
    rng: &mut R,
) -> Option<BotEvent> {
    let head = bot.snake.head();
    let (dx, dy) = bot.direction.delta();
    let next = Position::new(head.x + dx, head.y + dy);

    if is_boundary_ring(next, grid_size) {
        // Hold on the innermost legal cell and turn along the wall.
        let turns = if bot.direction.is_horizontal() {
            [Direction::Up, Direction::Down]
        } else {
            [Direction::Left, Direction::Right]
        };
        bot.direction = turns.choose(rng).copied().unwrap_or(bot.direction);
        return None;
    }

    if bot.snake.tail_segments().any(|segment| segment == next) {
        let respawn = free_cell(grid_size, SPAWN_MARGIN, occupied, rng).unwrap_or(head);
        bot.snake.reset(respawn);
        bot.score = 0;
        tracing::debug!(bot_id = bot.id, "bot respawned after self collision");
        return Some(BotEvent::Respawned { bot_id: bot.id });
    }

    if let Some(index) = food.iter().position(|item| item.position == next) {
        let eaten = food.remove(index);
        bot.score += eaten.kind.points(false);
        bot.snake.advance(next, true);
        return Some(BotEvent::Ate {
            bot_id: bot.id,
            kind: eaten.kind,
            score: bot.score,
        });
    }

    bot.snake.advance(next, false);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn apple(x: i32, y: i32) -> Food {
        Food {
            position: Position::new(x, y),
            kind: FoodKind::Apple,
        }
    }

    fn bot(segments: &[(i32, i32)], direction: Direction) -> Bot {
        let snake =
            Snake::from_segments(segments.iter().map(|(x, y)| Position::new(*x, *y))).unwrap();
        Bot::new(1, snake, direction)
    }

    /// Every `gen_bool` below certainty comes out false.
    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn colors_cycle_through_palette() {
        assert_eq!(BotColor::for_bot(1), BotColor::Red);
        assert_eq!(BotColor::for_bot(2), BotColor::Green);
        assert_eq!(BotColor::for_bot(6), BotColor::Red);
        assert_eq!(BotColor::for_bot(0), BotColor::Red);
        assert_eq!(BotColor::Pink.css_class(), "bg-pink-500");
    }

    #[test]
    fn greedy_prefers_horizontal_correction() {
        let direction = greedy_direction(Position::new(5, 5), Direction::Up, Position::new(9, 1));
        assert_eq!(direction, Some(Direction::Right));
    }

    #[test]
    fn greedy_falls_back_to_vertical_when_horizontal_reverses() {
        let direction =
            greedy_direction(Position::new(5, 5), Direction::Right, Position::new(2, 8));
        assert_eq!(direction, Some(Direction::Down));
    }

    #[test]
    fn greedy_gives_up_when_every_correction_reverses() {
        let direction =
            greedy_direction(Position::new(5, 5), Direction::Right, Position::new(2, 5));
        assert_eq!(direction, None);
    }

    #[test]
    fn random_turns_never_reverse() {
        let mut rng = StdRng::seed_from_u64(11);
        let subject = bot(&[(10, 10)], Direction::Left);
        for _ in 0..500 {
            let direction = choose_direction(&subject, &[], &mut rng);
            assert_ne!(direction, Direction::Right);
        }
    }

    #[test]
    fn bot_keeps_heading_when_no_branch_fires() {
        let subject = bot(&[(10, 10)], Direction::Up);
        let direction = choose_direction(&subject, &[apple(15, 10)], &mut never());
        assert_eq!(direction, Direction::Up);
    }

    #[test]
    fn bot_turns_at_the_wall_without_entering_it() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut subject = bot(&[(1, 5)], Direction::Left);
        let mut food = Vec::new();
        let event = move_bot(&mut subject, &mut food, 12, &HashSet::new(), &mut rng);
        assert_eq!(event, None);
        assert_eq!(subject.snake.head(), Position::new(1, 5));
        assert!(matches!(subject.direction, Direction::Up | Direction::Down));
    }

    #[test]
    fn bot_turns_horizontally_at_top_and_bottom_walls() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut subject = bot(&[(5, 10)], Direction::Down);
        let mut food = Vec::new();
        move_bot(&mut subject, &mut food, 12, &HashSet::new(), &mut rng);
        assert_eq!(subject.snake.head(), Position::new(5, 10));
        assert!(subject.direction.is_horizontal());
    }

    #[test]
    fn bot_eats_and_grows_without_boost() {
        let mut subject = bot(&[(5, 5)], Direction::Right);
        let mut food = vec![apple(6, 5), apple(9, 9)];
        let event = step_bot(&mut subject, &mut food, 20, &HashSet::new(), &mut never());
        assert_eq!(
            event,
            Some(BotEvent::Ate {
                bot_id: 1,
                kind: FoodKind::Apple,
                score: 1
            })
        );
        assert_eq!(subject.snake.len(), 2);
        assert_eq!(food, vec![apple(9, 9)]);
    }

    #[test]
    fn bot_self_collision_respawns_with_zero_score() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut subject = bot(&[(5, 5), (5, 6), (6, 6), (6, 5), (7, 5)], Direction::Right);
        subject.score = 12;
        let mut food = Vec::new();
        let event = move_bot(&mut subject, &mut food, 20, &HashSet::new(), &mut rng);
        assert_eq!(event, Some(BotEvent::Respawned { bot_id: 1 }));
        assert_eq!(subject.score, 0);
        assert_eq!(subject.snake.len(), 1);
        assert!(!is_boundary_ring(subject.snake.head(), 20));
    }

    #[test]
    fn roster_has_two_bots_on_distinct_interior_cells() {
        let mut rng = StdRng::seed_from_u64(3);
        let occupied: HashSet<Position> = [Position::new(5, 5)].into_iter().collect();
        let roster = spawn_roster(30, &occupied, &mut rng);
        assert_eq!(roster.len(), BOT_COUNT);
        assert_eq!(roster[0].id, 1);
        assert_eq!(roster[1].name, "Bot-2");
        assert_ne!(roster[0].snake.head(), roster[1].snake.head());
        for bot in &roster {
            assert!(!occupied.contains(&bot.snake.head()));
            assert!(!is_boundary_ring(bot.snake.head(), 30));
        }
    }
}
