use std::collections::VecDeque;
use std::fmt;

use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng};
use thiserror::Error;

use crate::free_cells::FreeCells;
use crate::geometry::{Arena, Cell};
use Direction::*;
use Outcome::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Up | Down)
    }

    pub fn head_char(self) -> char {
        match self {
            Up => '^',
            Down => 'v',
            Left => '<',
            Right => '>',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Rejected session parameters. Raised before anything is drawn.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("arena {width}x{height} at {origin} reaches past the coordinate range")]
    ArenaTooLarge { origin: Cell, width: i32, height: i32 },
    #[error("arena {width}x{height} has no interior, it must be at least 3x3")]
    ArenaTooSmall { width: i32, height: i32 },
    #[error("start cell {0} is not inside the arena")]
    StartOutsideArena(Cell),
    #[error("the snake needs at least one segment")]
    InitialLengthZero,
    #[error("a snake of length {length} leaves no room for food in {capacity} cells")]
    InitialLengthTooLong { length: usize, capacity: usize },
    #[error("a snake of length {length} laid back from {start} runs into the wall")]
    BodyOutsideArena { start: Cell, length: usize },
    #[error("vertical delay ratio must be a positive number, got {0}")]
    BadVerticalRatio(f64),
    #[error("boost divisor must be at least 1")]
    ZeroBoostDivisor,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Moved,
    Ate,
    /// Every interior cell is covered by the snake.
    Completed,
    Collided,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, Completed | Collided)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    Active,
    GameOver,
    Won,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub outcome: Outcome,
    /// Where the head went, or tried to go on a collision.
    pub head: Cell,
    pub previous_head: Cell,
    /// Tail cell released by a plain move.
    pub vacated: Option<Cell>,
    pub score: u32,
    pub length: usize,
}

/// Authoritative simulation state. The body runs head first, the food is
/// never on the body, and `free` holds every other interior cell.
pub struct GameState<R = StdRng> {
    arena: Arena,
    body: VecDeque<Cell>,
    free: FreeCells,
    food: Option<Cell>,
    direction: Direction,
    pending: Direction,
    score: u32,
    terminal: Option<TickResult>,
    rng: R,
}

impl<R: Rng> GameState<R> {
    pub fn new(
        arena: Arena,
        start: Cell,
        initial_length: usize,
        direction: Direction,
        rng: R,
    ) -> Result<Self, ConfigError> {
        if !arena.is_representable() {
            return Err(ConfigError::ArenaTooLarge { origin: arena.origin, width: arena.width, height: arena.height });
        }
        let capacity = arena.capacity();
        if capacity == 0 {
            return Err(ConfigError::ArenaTooSmall { width: arena.width, height: arena.height });
        }
        if initial_length == 0 {
            return Err(ConfigError::InitialLengthZero);
        }
        if !arena.is_interior(start) {
            return Err(ConfigError::StartOutsideArena(start));
        }
        if initial_length >= capacity {
            return Err(ConfigError::InitialLengthTooLong { length: initial_length, capacity });
        }

        let mut body = VecDeque::with_capacity(initial_length);
        let mut cell = start;
        for _ in 0..initial_length {
            if !arena.is_interior(cell) {
                return Err(ConfigError::BodyOutsideArena { start, length: initial_length });
            }
            body.push_back(cell);
            cell = cell.step(direction.opposite());
        }

        let mut free = FreeCells::with_capacity(capacity);
        for cell in arena.interior().filter(|c| !body.contains(c)) {
            free.insert(cell);
        }

        let mut state = GameState {
            arena,
            body,
            free,
            food: None,
            direction,
            pending: direction,
            score: 0,
            terminal: None,
            rng,
        };
        state.place_food();

        info!(
            "New game: arena {}x{} at {}, snake of {} at {} heading {}",
            arena.width, arena.height, arena.origin, initial_length, start, direction
        );
        Ok(state)
    }

    /// Queues a turn for the next tick. Turning back onto the body is
    /// ignored; returns whether the turn was taken.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.terminal.is_some() || direction == self.direction.opposite() {
            trace!("Ignoring turn {} while heading {}", direction, self.direction);
            return false;
        }

        self.pending = direction;
        true
    }

    pub fn advance(&mut self) -> TickResult {
        if let Some(result) = self.terminal {
            return result;
        }

        self.direction = self.pending;
        let previous_head = self.head();
        let new_head = previous_head.step(self.direction);

        if self.food == Some(new_head) {
            return self.eat(previous_head, new_head);
        }

        // The tail moves out of the way in the same tick, so it's fair game
        let tail = self.tail();
        let hits_body = new_head != tail && self.is_body(new_head);
        if !self.arena.is_interior(new_head) || hits_body {
            let result = self.result(Collided, new_head, previous_head, None);
            info!("Collided at {} with score {}", new_head, self.score);
            self.terminal = Some(result);
            return result;
        }

        self.body.pop_back();
        self.free.insert(tail);
        self.free.remove(new_head);
        self.body.push_front(new_head);

        self.result(Moved, new_head, previous_head, Some(tail))
    }

    /// Moves the food to a random free cell, returning the old spot to the
    /// pool first. None when no free cell is left.
    pub fn place_food(&mut self) -> Option<Cell> {
        if let Some(old) = self.food.take() {
            self.free.insert(old);
        }

        let food = self.free.choose(&mut self.rng)?;
        self.free.remove(food);
        self.food = Some(food);

        debug!("Food placed at {} ({} cells free)", food, self.free.len());
        Some(food)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn body(&self) -> impl ExactSizeIterator<Item = &Cell> + DoubleEndedIterator {
        self.body.iter()
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    /// Direction of the last move.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Direction the next move will take.
    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn free_cells(&self) -> &FreeCells {
        &self.free
    }

    pub fn status(&self) -> Status {
        match self.terminal {
            None => Status::Active,
            Some(TickResult { outcome: Collided, .. }) => Status::GameOver,
            Some(_) => Status::Won,
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    fn eat(&mut self, previous_head: Cell, new_head: Cell) -> TickResult {
        // The food cell left the free set when it was placed
        self.food = None;
        self.body.push_front(new_head);
        self.score += 1;

        if self.free.is_empty() {
            let result = self.result(Completed, new_head, previous_head, None);
            info!("Board filled with score {}", self.score);
            self.terminal = Some(result);
            return result;
        }

        self.place_food();
        self.result(Ate, new_head, previous_head, None)
    }

    fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    fn is_body(&self, cell: Cell) -> bool {
        self.arena.is_interior(cell) && !self.free.contains(cell) && self.food != Some(cell)
    }

    fn result(&self, outcome: Outcome, head: Cell, previous_head: Cell, vacated: Option<Cell>) -> TickResult {
        TickResult { outcome, head, previous_head, vacated, score: self.score, length: self.body.len() }
    }

    #[cfg(test)]
    pub(crate) fn relocate_food(&mut self, cell: Cell) {
        if let Some(old) = self.food.take() {
            self.free.insert(old);
        }
        assert!(self.free.remove(cell), "{cell} is not free");
        self.food = Some(cell);
    }
}
