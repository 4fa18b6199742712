use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use log::info;
use rand::Rng;

use crate::geometry::{Arena, Cell};
use crate::snake::{Direction, GameState, Outcome::*, TickResult};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(75);
pub const DEFAULT_VERTICAL_DELAY_RATIO: f64 = 0.6;
pub const DEFAULT_BOOST_DIVISOR: u32 = 2;
pub const BLINK_INTERVAL: Duration = Duration::from_millis(500);

const PAUSE_MESSAGE: &str = "PAUSED. Press ANY key to continue";

/// Logical inputs the loop reacts to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    Move(Direction),
    TogglePause,
    ToggleSpeedBoost,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyPress {
    Signal(Signal),
    /// Ctrl+C. Ends the session wherever the loop happens to be waiting.
    Interrupt,
    Other,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Glyph {
    Body,
    Head(Direction),
    Dead,
    Food,
    Blank,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Lost,
    Won,
}

pub trait Display {
    fn draw_border(&mut self, arena: &Arena, tone: Tone) -> io::Result<()>;
    fn draw_cell(&mut self, cell: Cell, glyph: Glyph) -> io::Result<()>;
    /// Replaces the status line starting at `at`.
    fn draw_status(&mut self, at: Cell, text: &str) -> io::Result<()>;
    /// Boxed message centered on `center`, drawn over whatever is there.
    fn show_message(&mut self, center: Cell, lines: &[&str]) -> io::Result<()>;
    /// Puts back what the message covered.
    fn hide_message(&mut self) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

pub trait Input {
    /// Waits up to `timeout` for a key press, or indefinitely with `None`.
    /// Returns `None` once the timeout runs out.
    fn read_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyPress>>;

    fn poll_key(&mut self) -> io::Result<Option<KeyPress>> {
        self.read_key(Some(Duration::ZERO))
    }

    fn wait_any_key(&mut self) -> io::Result<KeyPress> {
        loop {
            if let Some(key) = self.read_key(None)? {
                return Ok(key);
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pacing {
    pub base_delay: Duration,
    /// Vertical ticks last `delay / vertical_ratio`; terminal cells are
    /// taller than they are wide.
    pub vertical_ratio: f64,
    pub boost_divisor: u32,
    pub blink_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            base_delay: DEFAULT_DELAY,
            vertical_ratio: DEFAULT_VERTICAL_DELAY_RATIO,
            boost_divisor: DEFAULT_BOOST_DIVISOR,
            blink_interval: BLINK_INTERVAL,
        }
    }
}

impl Pacing {
    pub fn tick_delay(&self, boosted: bool, direction: Direction) -> Duration {
        let delay = if boosted { self.base_delay / self.boost_divisor } else { self.base_delay };

        if direction.is_vertical() {
            Duration::from_nanos((delay.as_nanos() as f64 / self.vertical_ratio).round() as u64)
        } else {
            delay
        }
    }
}

pub struct StatusLine {
    pub eaten: u32,
    pub length: usize,
    pub arena: (i32, i32),
    pub direction: Direction,
    pub delay: Duration,
    pub food: Option<Cell>,
    pub head: Cell,
    pub paused: bool,
    pub boosted: bool,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Eaten: {}, L: {}, S: {}x{}, Dir: {}, Delay: {}, Food: ",
            self.eaten,
            self.length,
            self.arena.0,
            self.arena.1,
            self.direction,
            self.delay.as_millis()
        )?;
        match self.food {
            Some(food) => write!(f, "{}", food)?,
            None => write!(f, "-")?,
        }
        write!(f, ", Head: {}", self.head)?;

        if self.paused {
            write!(f, " Status: PAUSED")?;
        }
        if self.boosted {
            write!(f, " SPEED BOOST")?;
        }
        Ok(())
    }
}

/// How a session ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionEnd {
    /// The terminal tick, `None` if the session was interrupted mid-game.
    pub outcome: Option<TickResult>,
    /// The player asked to leave instead of playing again.
    pub quit: bool,
}

enum Wait {
    Done,
    Interrupted,
}

pub struct SnakeGame<T> {
    term: T,
    pacing: Pacing,
    paused: bool,
    boosted: bool,
}

impl<T: Display + Input> SnakeGame<T> {
    pub fn new(term: T, pacing: Pacing) -> Self {
        SnakeGame { term, pacing, paused: false, boosted: false }
    }

    pub fn term_mut(&mut self) -> &mut T {
        &mut self.term
    }

    /// Returns true if the player interrupted instead of starting.
    pub fn show_intro(&mut self, arena: &Arena) -> io::Result<bool> {
        let lines = &[
            "Arrow keys or WASD to move",
            "P to pause, Space to speed up",
            "CTRL+C to quit",
            "",
            "Press any key to start the game",
        ];

        self.term.show_message(arena.center(), lines)?;
        let key = self.term.wait_any_key()?;
        self.term.hide_message()?;

        Ok(key == KeyPress::Interrupt)
    }

    /// Runs one session on `state` until it ends or the player interrupts.
    pub fn play<R: Rng>(&mut self, state: &mut GameState<R>) -> io::Result<SessionEnd> {
        const INTERRUPTED: SessionEnd = SessionEnd { outcome: None, quit: true };

        self.paused = false;
        self.boosted = false;
        self.draw_board(state)?;

        let mut pending: Option<Signal> = None;

        loop {
            if let Wait::Interrupted = self.collect_keys(&mut pending, None)? {
                info!("Interrupted");
                return Ok(INTERRUPTED);
            }

            match pending.take() {
                Some(Signal::Move(direction)) => {
                    state.set_direction(direction);
                }
                Some(Signal::ToggleSpeedBoost) => {
                    self.boosted = !self.boosted;
                    info!("Speed boost {}", if self.boosted { "on" } else { "off" });
                }
                Some(Signal::TogglePause) => {
                    if let Wait::Interrupted = self.pause(state)? {
                        info!("Interrupted while paused");
                        return Ok(INTERRUPTED);
                    }
                }
                None => {}
            }

            let result = state.advance();
            self.draw_tick(state, &result)?;

            if result.outcome.is_terminal() {
                info!("Session over: {:?}, score {}, length {}", result.outcome, result.score, result.length);
                let quit = self.game_over(state, &result)?;
                return Ok(SessionEnd { outcome: Some(result), quit });
            }

            let deadline = Instant::now() + self.pacing.tick_delay(self.boosted, state.direction());
            if let Wait::Interrupted = self.collect_keys(&mut pending, Some(deadline))? {
                info!("Interrupted");
                return Ok(INTERRUPTED);
            }
        }
    }

    ///////////////////////////////////////////////////////////////////////////

    /// Reads keys into the single pending slot, the latest one winning.
    /// Without a deadline only what's already buffered is read.
    fn collect_keys(&mut self, pending: &mut Option<Signal>, deadline: Option<Instant>) -> io::Result<Wait> {
        loop {
            let key = match deadline {
                None => self.term.poll_key()?,
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Ok(Wait::Done);
                    }
                    self.term.read_key(Some(left))?
                }
            };

            match key {
                Some(KeyPress::Signal(signal)) => *pending = Some(signal),
                Some(KeyPress::Interrupt) => return Ok(Wait::Interrupted),
                Some(KeyPress::Other) => {}
                None if deadline.is_none() => return Ok(Wait::Done),
                None => {}
            }
        }
    }

    fn pause<R: Rng>(&mut self, state: &GameState<R>) -> io::Result<Wait> {
        info!("Paused");
        self.paused = true;
        self.draw_status(state)?;
        self.term.show_message(state.arena().center(), &[PAUSE_MESSAGE])?;

        let key = self.term.wait_any_key()?;
        self.paused = false;
        self.term.hide_message()?;
        if key == KeyPress::Interrupt {
            return Ok(Wait::Interrupted);
        }

        info!("Resumed");
        self.draw_status(state)?;
        self.term.flush()?;
        Ok(Wait::Done)
    }

    /// Blinks the final message until a key arrives. Returns true on Ctrl+C.
    fn game_over<R: Rng>(&mut self, state: &GameState<R>, result: &TickResult) -> io::Result<bool> {
        let (tone, text) = if result.outcome == Completed {
            (Tone::Won, "Completed!")
        } else {
            for cell in state.body() {
                self.term.draw_cell(*cell, Glyph::Dead)?;
            }
            (Tone::Lost, "Game Over!")
        };

        self.term.draw_border(state.arena(), tone)?;
        self.draw_status(state)?;

        let center = state.arena().center();
        let mut visible = false;
        loop {
            if visible {
                self.term.hide_message()?;
            } else {
                self.term.show_message(center, &[text])?;
            }
            visible = !visible;
            self.term.flush()?;

            if let Some(key) = self.term.read_key(Some(self.pacing.blink_interval))? {
                if visible {
                    self.term.hide_message()?;
                }
                return Ok(key == KeyPress::Interrupt);
            }
        }
    }

    fn draw_board<R: Rng>(&mut self, state: &GameState<R>) -> io::Result<()> {
        self.term.draw_border(state.arena(), Tone::Normal)?;

        let head_glyph = Glyph::Head(state.direction());
        for (i, cell) in state.body().enumerate() {
            self.term.draw_cell(*cell, if i == 0 { head_glyph } else { Glyph::Body })?;
        }
        if let Some(food) = state.food() {
            self.term.draw_cell(food, Glyph::Food)?;
        }

        self.draw_status(state)?;
        self.term.flush()
    }

    fn draw_tick<R: Rng>(&mut self, state: &GameState<R>, result: &TickResult) -> io::Result<()> {
        if result.outcome != Collided {
            if let Some(tail) = result.vacated {
                self.term.draw_cell(tail, Glyph::Blank)?;
            }
            self.term.draw_cell(result.previous_head, Glyph::Body)?;
            self.term.draw_cell(result.head, Glyph::Head(state.direction()))?;
        }
        if result.outcome == Ate {
            if let Some(food) = state.food() {
                self.term.draw_cell(food, Glyph::Food)?;
            }
        }

        self.draw_status(state)?;
        self.term.flush()
    }

    fn draw_status<R: Rng>(&mut self, state: &GameState<R>) -> io::Result<()> {
        let arena = state.arena();
        let status = StatusLine {
            eaten: state.score(),
            length: state.len(),
            arena: (arena.width, arena.height),
            direction: state.direction(),
            delay: self.pacing.tick_delay(self.boosted, state.direction()),
            food: state.food(),
            head: state.head(),
            paused: self.paused,
            boosted: self.boosted,
        };

        self.term.draw_status(status_anchor(arena), &status.to_string())
    }
}

/// The status line sits on the row just above the arena.
pub fn status_anchor(arena: &Arena) -> Cell {
    Cell::new(arena.left(), arena.top() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snake::{Direction::*, Outcome, Status};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq)]
    enum Drawn {
        Border(Tone),
        Cell(Cell, Glyph),
        Status(String),
        Message(Vec<String>),
        HideMessage,
    }

    /// Plays back scripted keys and records every draw call. A `None` entry
    /// is a read that times out. Once the script runs dry, immediate polls
    /// see nothing and any real wait gets Ctrl+C.
    #[derive(Default)]
    struct Fake {
        keys: VecDeque<Option<KeyPress>>,
        drawn: Vec<Drawn>,
    }

    impl Fake {
        fn with_keys(keys: Vec<Option<KeyPress>>) -> Self {
            Fake { keys: keys.into(), drawn: vec![] }
        }

        fn statuses(&self) -> Vec<&str> {
            self.drawn
                .iter()
                .filter_map(|d| match d {
                    Drawn::Status(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn messages(&self) -> Vec<Vec<String>> {
            self.drawn
                .iter()
                .filter_map(|d| match d {
                    Drawn::Message(lines) => Some(lines.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Display for Fake {
        fn draw_border(&mut self, _arena: &Arena, tone: Tone) -> io::Result<()> {
            self.drawn.push(Drawn::Border(tone));
            Ok(())
        }

        fn draw_cell(&mut self, cell: Cell, glyph: Glyph) -> io::Result<()> {
            self.drawn.push(Drawn::Cell(cell, glyph));
            Ok(())
        }

        fn draw_status(&mut self, _at: Cell, text: &str) -> io::Result<()> {
            self.drawn.push(Drawn::Status(text.to_string()));
            Ok(())
        }

        fn show_message(&mut self, _center: Cell, lines: &[&str]) -> io::Result<()> {
            self.drawn.push(Drawn::Message(lines.iter().map(|l| l.to_string()).collect()));
            Ok(())
        }

        fn hide_message(&mut self) -> io::Result<()> {
            self.drawn.push(Drawn::HideMessage);
            Ok(())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Input for Fake {
        fn read_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyPress>> {
            match timeout {
                None => loop {
                    match self.keys.pop_front() {
                        Some(Some(key)) => return Ok(Some(key)),
                        Some(None) => continue,
                        None => return Ok(Some(KeyPress::Interrupt)),
                    }
                },
                Some(t) => match self.keys.pop_front() {
                    Some(entry) => Ok(entry),
                    None if t.is_zero() => Ok(None),
                    None => Ok(Some(KeyPress::Interrupt)),
                },
            }
        }
    }

    fn key(signal: Signal) -> Option<KeyPress> {
        Some(KeyPress::Signal(signal))
    }

    fn instant() -> Pacing {
        Pacing { base_delay: Duration::ZERO, ..Pacing::default() }
    }

    /// 10x10 interior, wall on 0 and 11. Food parked in a corner.
    fn state(start: (i32, i32), length: usize, direction: Direction) -> GameState {
        let arena = Arena::new(Cell::new(0, 1), 12, 12);
        let mut state =
            GameState::new(arena, Cell::new(start.0, start.1), length, direction, StdRng::seed_from_u64(5)).unwrap();
        state.relocate_food(Cell::new(1, 11));
        state
    }

    fn play(keys: Vec<Option<KeyPress>>, state: &mut GameState) -> (SessionEnd, Fake) {
        let mut game = SnakeGame::new(Fake::with_keys(keys), instant());
        let end = game.play(state).unwrap();
        (end, game.term)
    }

    #[test]
    fn tick_delay_depends_on_axis_and_boost() {
        let pacing = Pacing::default();

        assert_eq!(pacing.tick_delay(false, Right), Duration::from_millis(75));
        assert_eq!(pacing.tick_delay(false, Left), Duration::from_millis(75));
        assert_eq!(pacing.tick_delay(true, Right), Duration::from_micros(37_500));
        assert_eq!(pacing.tick_delay(false, Up), Duration::from_millis(125));
        assert_eq!(pacing.tick_delay(true, Down), Duration::from_micros(62_500));
    }

    #[test]
    fn runs_into_the_wall_without_input() {
        let mut state = state((9, 4), 2, Right);
        let (end, term) = play(vec![], &mut state);

        let last = end.outcome.unwrap();
        assert_eq!(last.outcome, Outcome::Collided);
        assert_eq!(last.head, Cell::new(11, 4));
        assert!(end.quit);
        assert_eq!(state.status(), Status::GameOver);
        assert!(term.drawn.contains(&Drawn::Border(Tone::Lost)));
        assert!(term.drawn.contains(&Drawn::Cell(Cell::new(10, 4), Glyph::Dead)));
        assert_eq!(term.messages(), vec![vec!["Game Over!".to_string()]]);
    }

    #[test]
    fn draws_incremental_moves() {
        let mut state = state((9, 4), 2, Right);
        let (_, term) = play(vec![], &mut state);

        let moved = [
            Drawn::Cell(Cell::new(8, 4), Glyph::Blank),
            Drawn::Cell(Cell::new(9, 4), Glyph::Body),
            Drawn::Cell(Cell::new(10, 4), Glyph::Head(Right)),
        ];
        assert!(term.drawn.windows(3).any(|w| w == moved));
    }

    #[test]
    fn turn_is_applied_before_the_move() {
        let mut state = state((5, 5), 2, Right);
        let (end, _) = play(vec![key(Signal::Move(Up)), None], &mut state);

        assert_eq!(end.outcome.unwrap().head, Cell::new(5, 1));
    }

    #[test]
    fn latest_turn_wins() {
        let mut state = state((5, 5), 2, Right);
        let keys = vec![key(Signal::Move(Up)), Some(KeyPress::Other), key(Signal::Move(Down)), None];
        let (end, _) = play(keys, &mut state);

        assert_eq!(end.outcome.unwrap().head, Cell::new(5, 12));
    }

    #[test]
    fn reversal_key_is_ignored() {
        let mut state = state((5, 5), 2, Right);
        let (end, _) = play(vec![key(Signal::Move(Left)), None], &mut state);

        assert_eq!(end.outcome.unwrap().head, Cell::new(11, 5));
    }

    #[test]
    fn pause_waits_for_a_key_without_moving() {
        let mut state = state((9, 4), 2, Right);
        // Pause, resume with any key, then run into the wall as usual
        let keys = vec![key(Signal::TogglePause), None, Some(KeyPress::Other)];
        let (end, term) = play(keys, &mut state);

        let statuses = term.statuses();
        let paused_at = statuses.iter().position(|s| s.ends_with("Status: PAUSED")).unwrap();
        // Only the opening board was drawn before the pause
        assert_eq!(paused_at, 1);
        assert!(statuses[paused_at + 1].starts_with("Eaten: 0, L: 2"));
        assert!(statuses[paused_at + 1].contains("Head: 9,4"));
        assert!(!statuses[paused_at + 1].contains("PAUSED"));
        assert_eq!(term.messages()[0], vec![PAUSE_MESSAGE.to_string()]);

        let last = end.outcome.unwrap();
        assert_eq!(last.outcome, Outcome::Collided);
        assert_eq!(last.head, Cell::new(11, 4));
    }

    #[test]
    fn interrupt_while_paused_leaves_state_alone() {
        let mut state = state((5, 5), 2, Right);
        let keys = vec![key(Signal::TogglePause), None, Some(KeyPress::Interrupt)];
        let (end, _) = play(keys, &mut state);

        assert_eq!(end, SessionEnd { outcome: None, quit: true });
        assert_eq!(state.head(), Cell::new(5, 5));
        assert_eq!(state.status(), Status::Active);
    }

    #[test]
    fn interrupt_between_ticks() {
        let mut state = state((3, 5), 2, Right);
        let keys = vec![None, None, Some(KeyPress::Interrupt)];
        let (end, _) = play(keys, &mut state);

        assert_eq!(end.outcome, None);
        assert!(end.quit);
        assert_eq!(state.head(), Cell::new(5, 5));
    }

    #[test]
    fn speed_boost_stays_on() {
        let mut state = state((7, 5), 2, Right);
        let (_, term) = play(vec![key(Signal::ToggleSpeedBoost), None], &mut state);

        let statuses = term.statuses();
        assert!(!statuses[0].contains("SPEED BOOST"));
        assert!(statuses[1..].iter().all(|s| s.ends_with("SPEED BOOST")));
    }

    #[test]
    fn eating_redraws_food() {
        let mut state = state((5, 5), 2, Right);
        state.relocate_food(Cell::new(6, 5));
        let (end, term) = play(vec![], &mut state);

        assert!(end.outcome.unwrap().score >= 1);
        let food = term
            .drawn
            .iter()
            .filter(|d| matches!(d, Drawn::Cell(_, Glyph::Food)))
            .count();
        assert!(food >= 2);
    }

    #[test]
    fn filling_the_board_shows_completed() {
        let arena = Arena::new(Cell::new(0, 1), 3, 5);
        let mut state = GameState::new(arena, Cell::new(1, 3), 2, Down, StdRng::seed_from_u64(9)).unwrap();
        let (end, term) = play(vec![], &mut state);

        assert_eq!(end.outcome.unwrap().outcome, Outcome::Completed);
        assert_eq!(state.status(), Status::Won);
        assert!(term.drawn.contains(&Drawn::Border(Tone::Won)));
        assert_eq!(term.messages(), vec![vec!["Completed!".to_string()]]);
    }

    #[test]
    fn final_message_blinks_until_a_key() {
        let mut state = state((10, 4), 2, Right);
        let keys = vec![None, None, None, Some(KeyPress::Other)];
        let (end, term) = play(keys, &mut state);

        assert!(!end.quit);
        assert_eq!(term.messages().len(), 2);
        let hides = term.drawn.iter().filter(|d| **d == Drawn::HideMessage).count();
        assert_eq!(hides, 2);
    }

    #[test]
    fn intro_reports_interrupt() {
        let arena = Arena::new(Cell::new(0, 1), 12, 12);

        let mut game = SnakeGame::new(Fake::with_keys(vec![Some(KeyPress::Other)]), instant());
        assert!(!game.show_intro(&arena).unwrap());

        let mut game = SnakeGame::new(Fake::with_keys(vec![Some(KeyPress::Interrupt)]), instant());
        assert!(game.show_intro(&arena).unwrap());
    }

    #[test]
    fn status_line_lists_flags() {
        let status = StatusLine {
            eaten: 3,
            length: 8,
            arena: (50, 20),
            direction: Up,
            delay: Duration::from_millis(125),
            food: Some(Cell::new(4, 7)),
            head: Cell::new(10, 12),
            paused: true,
            boosted: true,
        };

        assert_eq!(
            status.to_string(),
            "Eaten: 3, L: 8, S: 50x20, Dir: Up, Delay: 125, Food: 4,7, Head: 10,12 Status: PAUSED SPEED BOOST"
        );
    }
}
