use std::io::{self, Stdout, Write, stdout};
use std::time::{Duration, Instant};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use thiserror::Error;

use crate::game::{Display, Glyph, Input, KeyPress, Signal, Tone};
use crate::geometry::{Arena, Cell};
use crate::snake::Direction::*;

type TermInt = u16;
type Coords = (TermInt, TermInt);

#[derive(Debug, Error)]
pub enum TermError {
    #[error("arena {width}x{height} at {origin} does not fit a {cols}x{rows} terminal")]
    ArenaDoesNotFit { origin: Cell, width: i32, height: i32, cols: TermInt, rows: TermInt },
    #[error("arena must start below row 0 to leave room for the status line")]
    NoRoomForStatus,
}

/// Characters used on screen. Purely cosmetic.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub body: char,
    pub food: char,
    pub dead: char,
}

impl Default for Glyphs {
    fn default() -> Self {
        Glyphs { body: 'O', food: '*', dead: 'X' }
    }
}

const SNAKE_COLOR: Color = Color::Yellow;
const FOOD_COLOR: Color = Color::Green;
const DEAD_COLOR: Color = Color::Red;

#[derive(Clone, Copy, PartialEq)]
struct Tile {
    ch: char,
    color: Color,
}

const EMPTY: Tile = Tile { ch: ' ', color: Color::Reset };

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<Tile>,
    glyphs: Glyphs,
    current_msg: Option<Message>,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new(glyphs: Glyphs) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let screen = vec![EMPTY; width as usize * height as usize];
        Ok(TermManager { width, height, stdout: stdout(), screen, glyphs, current_msg: None })
    }

    /// Checks the arena and its status line fit on screen.
    pub fn check_fits(&self, arena: &Arena) -> Result<(), TermError> {
        check_fits(arena, self.width, self.height)
    }

    pub fn setup(&mut self) -> io::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)?;
        self.clear()
    }

    pub fn restore(&mut self) -> io::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, style::ResetColor, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn clear(&mut self) -> io::Result<()> {
        execute!(self.stdout, terminal::Clear(ClearType::All))?;
        self.screen = vec![EMPTY; self.width as usize * self.height as usize];
        self.current_msg = None;
        Ok(())
    }

    ///////////////////////////////////////////////////////////////////////////

    fn print_at(&mut self, pos: Coords, tile: Tile) -> io::Result<()> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return Ok(());
        }

        self.print_at_no_save(pos, tile)?;
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = tile;
        Ok(())
    }

    fn print_at_no_save(&mut self, pos: Coords, tile: Tile) -> io::Result<()> {
        // Used for messages, so the buffer still holds what they cover
        if pos.0 >= self.width || pos.1 >= self.height {
            return Ok(());
        }
        queue!(
            self.stdout,
            cursor::MoveTo(pos.0, pos.1),
            style::SetForegroundColor(tile.color),
            style::Print(tile.ch),
            style::ResetColor
        )
    }

    fn tile(&self, glyph: Glyph) -> Tile {
        let (ch, color) = match glyph {
            Glyph::Body => (self.glyphs.body, SNAKE_COLOR),
            Glyph::Head(direction) => (direction.head_char(), SNAKE_COLOR),
            Glyph::Dead => (self.glyphs.dead, DEAD_COLOR),
            Glyph::Food => (self.glyphs.food, FOOD_COLOR),
            Glyph::Blank => return EMPTY,
        };
        Tile { ch, color }
    }
}

impl Display for TermManager {
    fn draw_border(&mut self, arena: &Arena, tone: Tone) -> io::Result<()> {
        let color = match tone {
            Tone::Normal => Color::Reset,
            Tone::Lost => DEAD_COLOR,
            Tone::Won => FOOD_COLOR,
        };
        let (left, top) = coords(arena.origin)?;
        let (right, bottom) = coords(Cell::new(arena.right(), arena.bottom()))?;

        for x in left..=right {
            let ch = if x == left || x == right { '+' } else { '-' };
            self.print_at((x, top), Tile { ch, color })?;
            self.print_at((x, bottom), Tile { ch, color })?;
        }

        for y in top + 1..bottom {
            self.print_at((left, y), Tile { ch: '|', color })?;
            self.print_at((right, y), Tile { ch: '|', color })?;
        }

        Ok(())
    }

    fn draw_cell(&mut self, cell: Cell, glyph: Glyph) -> io::Result<()> {
        let tile = self.tile(glyph);
        self.print_at(coords(cell)?, tile)
    }

    fn draw_status(&mut self, at: Cell, text: &str) -> io::Result<()> {
        let (x0, y) = coords(at)?;
        let mut chars = text.chars();

        for x in x0..self.width {
            let ch = chars.next().unwrap_or(' ');
            self.print_at((x, y), Tile { ch, color: Color::Reset })?;
        }

        Ok(())
    }

    fn show_message(&mut self, center: Cell, lines: &[&str]) -> io::Result<()> {
        if self.current_msg.is_some() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let (cx, cy) = coords(center)?;
        let top_left = (cx.saturating_sub(msg_width / 2), cy.saturating_sub(msg_height / 2));

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1] {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, y), EMPTY)?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), Tile { ch, color: Color::Reset })?;
            }
        }

        self.current_msg = Some(Message { top_left, width: msg_width, height: msg_height });
        self.flush()
    }

    fn hide_message(&mut self) -> io::Result<()> {
        let Some(msg) = self.current_msg.take() else {
            return Ok(());
        };

        // Restore the content from the screen buffer
        for y in msg.top_left.1..msg.top_left.1 + msg.height {
            for x in msg.top_left.0..msg.top_left.0 + msg.width {
                let index = self.width as usize * y as usize + x as usize;
                let tile = self.screen.get(index).copied().unwrap_or(EMPTY);
                self.print_at_no_save((x, y), tile)?;
            }
        }

        self.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Input for TermManager {
    fn read_key(&mut self, timeout: Option<Duration>) -> io::Result<Option<KeyPress>> {
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            if let Some(deadline) = deadline {
                if !event::poll(deadline.saturating_duration_since(Instant::now()))? {
                    return Ok(None);
                }
            }

            if let Event::Key(ev) = event::read()? {
                if let Some(key) = key_press(ev) {
                    return Ok(Some(key));
                }
            }
        }
    }
}

/// The arena needs a row above it for the status line and must end inside
/// a `cols` x `rows` screen.
pub fn check_fits(arena: &Arena, cols: TermInt, rows: TermInt) -> Result<(), TermError> {
    if arena.top() < 1 {
        return Err(TermError::NoRoomForStatus);
    }

    let fits = arena.is_representable()
        && arena.left() >= 0
        && arena.right() < cols as i32
        && arena.bottom() < rows as i32;
    if !fits {
        return Err(TermError::ArenaDoesNotFit {
            origin: arena.origin,
            width: arena.width,
            height: arena.height,
            cols,
            rows,
        });
    }
    Ok(())
}

fn coords(cell: Cell) -> io::Result<Coords> {
    match (TermInt::try_from(cell.x), TermInt::try_from(cell.y)) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(io::Error::new(io::ErrorKind::InvalidInput, format!("cell {} is off screen", cell))),
    }
}

/// Maps a key event to what the game cares about. Releases and repeats
/// are dropped.
fn key_press(ev: KeyEvent) -> Option<KeyPress> {
    if ev.kind != KeyEventKind::Press {
        return None;
    }
    if is_ctrl_c(&ev) {
        return Some(KeyPress::Interrupt);
    }

    let signal = match ev.code {
        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => Signal::Move(Up),
        KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Left => Signal::Move(Left),
        KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Down => Signal::Move(Down),
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Right => Signal::Move(Right),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => Signal::TogglePause,
        KeyCode::Char(' ') => Signal::ToggleSpeedBoost,
        _ => return Some(KeyPress::Other),
    };
    Some(KeyPress::Signal(signal))
}

fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers, .. } if modifiers.contains(KeyModifiers::CONTROL))
}
