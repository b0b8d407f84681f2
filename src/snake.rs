use std::collections::VecDeque;

use crate::Coords;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Unit step as (row, col).
    pub fn delta(self) -> Coords {
        match self {
            North => (-1, 0),
            South => (1, 0),
            East => (0, 1),
            West => (0, -1),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            North => South,
            South => North,
            East => West,
            West => East,
        }
    }
}

/// What changed on the board after one call to `Snake::move_step`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub new_head: Coords,
    pub old_head: Coords,
    pub old_tail: Option<Coords>,
}

pub struct Snake {
    head: Coords,
    direction: Direction,
    // Oldest segment at the front, the segment right behind the head at the back
    body: VecDeque<Coords>,
    growth_pending: u32,
}

impl Snake {
    /// Lays out a straight snake of `length` cells ending at `head`, trailing
    /// away from `direction`.
    pub fn new(head: Coords, length: u16, direction: Direction) -> Self {
        let diff = direction.delta();

        let body = (1..length as i16).rev()
            .map(|i| (head.0 - diff.0 * i, head.1 - diff.1 * i))
            .collect();

        Snake { head, direction, body, growth_pending: 0 }
    }

    pub fn head(&self) -> Coords {
        self.head
    }

    pub fn body(&self) -> &VecDeque<Coords> {
        &self.body
    }

    pub fn len(&self) -> usize {
        self.body.len() + 1
    }

    pub fn growth_pending(&self) -> u32 {
        self.growth_pending
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    /// Turns the snake unless `new_direction` would reverse it onto itself.
    /// Returns whether the direction was accepted.
    pub fn set_direction(&mut self, new_direction: Direction) -> bool {
        if new_direction == self.direction.opposite() {
            return false;
        }

        self.direction = new_direction;
        true
    }

    /// Queues `cells` ticks during which the tail is kept.
    pub fn grow(&mut self, cells: u32) {
        self.growth_pending += cells;
    }

    /// Advances one cell in the current direction. Walls and self-hits are
    /// not checked here.
    pub fn move_step(&mut self) -> Step {
        let old_head = self.head;
        let diff = self.direction.delta();
        let new_head = (old_head.0 + diff.0, old_head.1 + diff.1);

        self.body.push_back(old_head);
        self.head = new_head;

        let old_tail = if self.growth_pending > 0 {
            self.growth_pending -= 1;
            None
        } else {
            self.body.pop_front()
        };

        Step { new_head, old_head, old_tail }
    }

    pub fn head_char(&self) -> char {
        match self.direction {
            North => '^',
            South => 'v',
            West => '<',
            East => '>',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_snake_trails_behind_head() {
        let snake = Snake::new((12, 20), 15, East);

        assert_eq!(snake.len(), 15);
        assert_eq!(snake.head(), (12, 20));
        assert_eq!(snake.body().front(), Some(&(12, 6)));
        assert_eq!(snake.body().back(), Some(&(12, 19)));
        assert!(snake.body().iter().all(|&(row, _)| row == 12));
    }

    #[test]
    fn move_without_growth_keeps_length() {
        let mut snake = Snake::new((5, 5), 4, South);
        let before = snake.len();

        let step = snake.move_step();

        assert_eq!(step, Step { new_head: (6, 5), old_head: (5, 5), old_tail: Some((2, 5)) });
        assert_eq!(snake.len(), before);
        assert_eq!(snake.body().back(), Some(&(5, 5)));
    }

    #[test]
    fn move_with_growth_adds_one_cell() {
        let mut snake = Snake::new((5, 5), 4, East);
        snake.grow(2);

        let step = snake.move_step();
        assert_eq!(step.old_tail, None);
        assert_eq!(snake.len(), 5);
        assert_eq!(snake.growth_pending(), 1);

        snake.move_step();
        snake.move_step();
        assert_eq!(snake.len(), 6);
        assert_eq!(snake.growth_pending(), 0);
    }

    #[test]
    fn reversal_is_rejected() {
        for &dir in &[North, South, East, West] {
            let mut snake = Snake::new((10, 10), 3, dir);

            assert!(!snake.set_direction(dir.opposite()));
            assert_eq!(snake.get_direction(), dir);
        }
    }

    #[test]
    fn perpendicular_turns_are_accepted() {
        let mut snake = Snake::new((10, 10), 3, East);

        assert!(snake.set_direction(North));
        assert!(snake.set_direction(West));
        assert_eq!(snake.get_direction(), West);
        assert_eq!(snake.head_char(), '<');
    }
}
