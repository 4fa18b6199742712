use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use simplelog::LevelFilter;

use crate::game::{Pacing, BLINK_INTERVAL};
use crate::geometry::{Arena, Cell};
use crate::snake::{ConfigError, Direction};
use crate::term::Glyphs;

/// Classic snake in the terminal
#[derive(Parser, Debug)]
#[command(name = "termsnake", version, about, long_about = None)]
pub struct Cli {
    /// Arena width, walls included
    #[arg(long, default_value_t = 50)]
    pub width: i32,

    /// Arena height, walls included
    #[arg(long, default_value_t = 20)]
    pub height: i32,

    /// Screen column of the arena's left wall
    #[arg(long, default_value_t = 2)]
    pub origin_x: i32,

    /// Screen row of the arena's top wall; the status line goes above it
    #[arg(long, default_value_t = 2)]
    pub origin_y: i32,

    /// Starting head column, relative to the arena
    #[arg(long, default_value_t = 5)]
    pub start_x: i32,

    /// Starting head row, relative to the arena
    #[arg(long, default_value_t = 5)]
    pub start_y: i32,

    /// Initial number of segments
    #[arg(long, default_value_t = 5)]
    pub length: usize,

    #[arg(long, value_enum, default_value_t = DirectionArg::Right)]
    pub direction: DirectionArg,

    /// Horizontal tick delay in milliseconds
    #[arg(long, default_value_t = 75)]
    pub delay_ms: u64,

    /// Vertical ticks take delay / ratio
    #[arg(long, default_value_t = 0.6)]
    pub vertical_ratio: f64,

    /// Delay divisor while the speed boost is on
    #[arg(long, default_value_t = 2)]
    pub boost_divisor: u32,

    /// Seed for food placement, random when absent
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = 'O')]
    pub snake_char: char,

    #[arg(long, default_value_t = '*')]
    pub food_char: char,

    #[arg(long, default_value = "snake.log")]
    pub log_file: PathBuf,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
    Left,
    Right,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
            DirectionArg::Left => Direction::Left,
            DirectionArg::Right => Direction::Right,
        }
    }
}

/// Everything needed to start sessions, in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub arena: Arena,
    pub start: Cell,
    pub length: usize,
    pub direction: Direction,
    pub pacing: Pacing,
    pub seed: Option<u64>,
    pub glyphs: Glyphs,
}

impl Cli {
    /// Resolves the flags into a session. Arena and snake geometry is
    /// checked when the game state is built; pacing is checked here.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        if !(self.vertical_ratio.is_finite() && self.vertical_ratio > 0.0) {
            return Err(ConfigError::BadVerticalRatio(self.vertical_ratio));
        }
        if self.boost_divisor == 0 {
            return Err(ConfigError::ZeroBoostDivisor);
        }

        let origin = Cell::new(self.origin_x, self.origin_y);

        Ok(SessionConfig {
            arena: Arena::new(origin, self.width, self.height),
            start: Cell::new(origin.x + self.start_x, origin.y + self.start_y),
            length: self.length,
            direction: self.direction.into(),
            pacing: Pacing {
                base_delay: Duration::from_millis(self.delay_ms),
                vertical_ratio: self.vertical_ratio,
                boost_divisor: self.boost_divisor,
                blink_interval: BLINK_INTERVAL,
            },
            seed: self.seed,
            glyphs: Glyphs { body: self.snake_char, food: self.food_char, ..Glyphs::default() },
        })
    }
}
