use super::types::Position;
use serde::Serialize;
use std::collections::VecDeque;

/// Grid snake, head first. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snake {
    body: VecDeque<Position>,
}

impl Snake {
    pub fn new(head: Position) -> Self {
        let mut body = VecDeque::with_capacity(8);
        body.push_back(head);
        Self { body }
    }

    /// Builds a snake from head-first segments; `None` when `segments` is empty.
    #[cfg(test)]
    pub fn from_segments(segments: impl IntoIterator<Item = Position>) -> Option<Self> {
        let body: VecDeque<Position> = segments.into_iter().collect();
        if body.is_empty() {
            return None;
        }
        Some(Self { body })
    }

    pub fn head(&self) -> Position {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn segments(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().copied()
    }

    /// Every segment except the head.
    pub fn tail_segments(&self) -> impl Iterator<Item = Position> + '_ {
        self.body.iter().skip(1).copied()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.body.contains(&position)
    }

    /// Pushes a new head; the old tail is dropped unless `grow` is set. A
    /// single-segment snake that does not grow simply relocates.
    pub fn advance(&mut self, new_head: Position, grow: bool) {
        self.body.push_front(new_head);
        if !grow {
            self.body.pop_back();
        }
    }

    pub fn reset(&mut self, head: Position) {
        self.body.clear();
        self.body.push_back(head);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment_move_keeps_length_one() {
        let mut snake = Snake::new(Position::new(5, 5));
        snake.advance(Position::new(6, 5), false);
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(6, 5));
    }

    #[test]
    fn growing_keeps_the_tail() {
        let mut snake =
            Snake::from_segments([Position::new(6, 5), Position::new(5, 5)]).unwrap();
        snake.advance(Position::new(7, 5), true);
        let segments: Vec<Position> = snake.segments().collect();
        assert_eq!(
            segments,
            vec![Position::new(7, 5), Position::new(6, 5), Position::new(5, 5)]
        );
    }

    #[test]
    fn tail_segments_skip_head() {
        let snake = Snake::from_segments([
            Position::new(3, 3),
            Position::new(2, 3),
            Position::new(1, 3),
        ])
        .unwrap();
        let tail: Vec<Position> = snake.tail_segments().collect();
        assert_eq!(tail, vec![Position::new(2, 3), Position::new(1, 3)]);
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(Snake::from_segments(Vec::new()).is_none());
    }

    #[test]
    fn reset_collapses_to_one_segment() {
        let mut snake =
            Snake::from_segments([Position::new(6, 5), Position::new(5, 5)]).unwrap();
        snake.reset(Position::new(9, 9));
        assert_eq!(snake.len(), 1);
        assert_eq!(snake.head(), Position::new(9, 9));
    }

    #[test]
    fn serializes_as_plain_position_list() {
        let snake = Snake::from_segments([Position::new(1, 2)]).unwrap();
        let json = serde_json::to_value(&snake).unwrap();
        assert_eq!(json, serde_json::json!([{ "x": 1, "y": 2 }]));
    }
}
