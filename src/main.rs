use std::fs::File;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use simplelog::{Config, WriteLogger};

use termsnake::config::{Cli, SessionConfig};
use termsnake::game::SnakeGame;
use termsnake::snake::GameState;
use termsnake::term::TermManager;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The screen belongs to the game, so logs go to a file
    let log_file = File::create(&cli.log_file)
        .with_context(|| format!("cannot create log file {}", cli.log_file.display()))?;
    WriteLogger::init(cli.log_level, Config::default(), log_file).context("cannot initialize logger")?;

    let config = cli.session_config()?;
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Bad geometry is reported before the terminal is taken over
    let term = TermManager::new(config.glyphs)?;
    term.check_fits(&config.arena)?;
    let state = new_game(&config, &mut rng)?;

    let mut game = SnakeGame::new(term, config.pacing);
    let res = match game.term_mut().setup() {
        Ok(()) => run(&mut game, &config, &mut rng, state),
        Err(e) => Err(anyhow::Error::new(e).context("cannot set up the terminal")),
    };
    if let Err(e) = &res {
        error!("{:#}", e);
    }

    game.term_mut().restore()?;
    info!("Bye");
    res
}

fn run(game: &mut SnakeGame<TermManager>, config: &SessionConfig, rng: &mut StdRng, mut state: GameState) -> Result<()> {
    if game.show_intro(&config.arena)? {
        return Ok(());
    }

    loop {
        let end = game.play(&mut state)?;
        if end.quit {
            return Ok(());
        }

        game.term_mut().clear()?;
        state = new_game(config, rng)?;
    }
}

fn new_game(config: &SessionConfig, rng: &mut StdRng) -> Result<GameState> {
    let session_rng = StdRng::seed_from_u64(rng.gen());
    let state = GameState::new(config.arena, config.start, config.length, config.direction, session_rng)?;
    Ok(state)
}
