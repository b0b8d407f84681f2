use crate::Coords;
use crate::snake::{Snake, Step};
use crate::term::Surface;

use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Head,
    Body,
    Fruit,
}

/// What the head ran into on a given tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Hit {
    Fruit,
    Collision,
    Nothing,
}

/// Playable interior of a bordered surface: rows `1..=rows` and cols
/// `1..=cols`. Row/col 0 and `rows + 1`/`cols + 1` are the border.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bounds {
    pub rows: i16,
    pub cols: i16,
}

impl Bounds {
    pub fn from_surface(surface: &Surface) -> Self {
        let (height, width, _, _) = surface.bounds();
        Bounds { rows: height as i16 - 2, cols: width as i16 - 2 }
    }

    pub fn contains(&self, pos: Coords) -> bool {
        (1..=self.rows).contains(&pos.0) && (1..=self.cols).contains(&pos.1)
    }

    pub fn interior(&self) -> impl Iterator<Item = Coords> {
        let cols = self.cols;
        (1..=self.rows).flat_map(move |row| (1..=cols).map(move |col| (row, col)))
    }
}

/// Logical occupancy of every interior cell, kept in step with what is drawn.
pub struct Arena {
    bounds: Bounds,
    cells: Vec<Cell>,
}

impl Arena {
    pub fn new(bounds: Bounds) -> Self {
        let size = bounds.rows.max(0) as usize * bounds.cols.max(0) as usize;
        Arena { bounds, cells: vec![Cell::Empty; size] }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// `None` for anything outside the interior, border included.
    pub fn get(&self, pos: Coords) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: Coords, cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            },
            None => false,
        }
    }

    pub fn place_snake(&mut self, snake: &Snake) {
        for pos in snake.body() {
            self.set(*pos, Cell::Body);
        }
        self.set(snake.head(), Cell::Head);
    }

    /// Records a move's effect on the body. The new head is left untouched so
    /// it can still be classified against what was there before.
    pub fn apply_step(&mut self, step: &Step) {
        if let Some(tail) = step.old_tail {
            self.set(tail, Cell::Empty);
        }
        self.set(step.old_head, Cell::Body);
    }

    /// Checks, in order, fruit, own body, then the border.
    pub fn classify(&self, head: Coords) -> Hit {
        match self.get(head) {
            Some(Cell::Fruit) => Hit::Fruit,
            Some(Cell::Body) => Hit::Collision,
            _ if !self.bounds.contains(head) => Hit::Collision,
            _ => Hit::Nothing,
        }
    }

    /// Picks an empty interior cell uniformly at random and marks it as fruit.
    /// Returns `None` when the board is full.
    pub fn spawn_fruit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Coords> {
        let choices: Vec<Coords> = self.bounds.interior()
            .filter(|pos| self.get(*pos) == Some(Cell::Empty))
            .collect();

        let fruit = choices.choose(rng).copied();
        if let Some(pos) = fruit {
            self.set(pos, Cell::Fruit);
        }
        fruit
    }

    fn index(&self, pos: Coords) -> Option<usize> {
        if self.bounds.contains(pos) {
            Some((pos.0 - 1) as usize * self.bounds.cols as usize + (pos.1 - 1) as usize)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::Direction;
    use rand::{SeedableRng, rngs::StdRng};

    fn arena() -> Arena {
        Arena::new(Bounds { rows: 21, cols: 43 })
    }

    #[test]
    fn bounds_come_from_surface_interior() {
        let bounds = Bounds::from_surface(&Surface::new(23, 45, 1, 1));

        assert_eq!(bounds, Bounds { rows: 21, cols: 43 });
        assert!(bounds.contains((1, 1)));
        assert!(bounds.contains((21, 43)));
        assert!(!bounds.contains((0, 5)));
        assert!(!bounds.contains((22, 5)));
        assert!(!bounds.contains((5, 44)));
        assert_eq!(bounds.interior().count(), 21 * 43);
    }

    #[test]
    fn classify_checks_fruit_body_and_walls() {
        let mut arena = arena();
        arena.set((3, 3), Cell::Fruit);
        arena.set((4, 4), Cell::Body);

        assert_eq!(arena.classify((3, 3)), Hit::Fruit);
        assert_eq!(arena.classify((4, 4)), Hit::Collision);
        assert_eq!(arena.classify((5, 5)), Hit::Nothing);

        for &wall in &[(0, 10), (22, 10), (10, 0), (10, 44), (-1, 10), (10, 45)] {
            assert_eq!(arena.classify(wall), Hit::Collision, "{:?}", wall);
        }
    }

    #[test]
    fn classify_is_deterministic() {
        let mut arena = arena();
        arena.place_snake(&Snake::new((12, 20), 15, Direction::East));

        for pos in [(12, 10), (12, 21), (0, 0), (21, 43)] {
            assert_eq!(arena.classify(pos), arena.classify(pos));
        }
    }

    #[test]
    fn apply_step_moves_body_marks() {
        let mut arena = arena();
        let mut snake = Snake::new((12, 20), 15, Direction::East);
        arena.place_snake(&snake);

        let step = snake.move_step();
        arena.apply_step(&step);

        assert_eq!(arena.get((12, 6)), Some(Cell::Empty));
        assert_eq!(arena.get((12, 20)), Some(Cell::Body));
        assert_eq!(arena.get((12, 21)), Some(Cell::Empty));
    }

    #[test]
    fn fruit_never_lands_on_snake() {
        let mut rng = StdRng::seed_from_u64(7);
        let snake = Snake::new((12, 20), 15, Direction::East);

        for _ in 0..200 {
            let mut arena = arena();
            arena.place_snake(&snake);

            let fruit = arena.spawn_fruit(&mut rng).unwrap();
            assert!(arena.bounds().contains(fruit));
            assert_ne!(fruit, snake.head());
            assert!(!snake.body().contains(&fruit));
            assert_eq!(arena.get(fruit), Some(Cell::Fruit));
        }
    }

    #[test]
    fn spawn_fails_on_full_board() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut arena = Arena::new(Bounds { rows: 2, cols: 2 });

        for _ in 0..4 {
            assert!(arena.spawn_fruit(&mut rng).is_some());
        }
        assert_eq!(arena.spawn_fruit(&mut rng), None);
    }
}
