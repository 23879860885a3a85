//! App: terminal init, main loop, tick and key handling.

use crate::difficulty::Difficulty;
use crate::highscores;
use crate::input::{Action, key_to_action};
use crate::item_queue::ItemQueue;
use crate::mikan_box::MikanBox;
use crate::scene::Scene;
use crate::statistics::{Statistics, StatisticsLogger};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// Redraw at roughly 60 FPS regardless of the tick rate.
const FRAME_MS: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A pair could not enter the box.
    BoxFull,
    /// The box reported an error; the board is kept as it was.
    Halted,
}

pub struct App {
    args: Args,
    theme: Theme,
    scene: Scene,
    difficulty: Rc<RefCell<Difficulty>>,
    /// Level seen at the last tick, to log level changes.
    level: u32,
    screen: Screen,
    paused: bool,
    game_over_reason: Option<GameOverReason>,
    last_tick: Instant,
    tick_interval: Duration,
    best: u64,
    /// TachyonFX fade over the box (created on the first game-over frame).
    game_over_effect: Option<Effect>,
    /// Last time we processed the game-over effect (for delta).
    game_over_effect_process_time: Option<Instant>,
}

/// Statistics, difficulty and item queue wired into a fresh scene.
fn new_scene(config: &GameConfig) -> Result<(Scene, Rc<RefCell<Difficulty>>)> {
    let mut statistics = Statistics::new();
    statistics.add_observer(Box::new(StatisticsLogger));
    let difficulty = Difficulty::attach(&mut statistics, config.seed);
    let queue = ItemQueue::new(Rc::clone(&difficulty), config.preview);
    let mikan_box = MikanBox::new(config.columns, config.rows, config.row_margin, config.cell_size)?;
    let scene = Scene::new(mikan_box, statistics, Box::new(queue))?;
    Ok((scene, difficulty))
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        anyhow::ensure!(
            args.tick_rate.is_finite() && args.tick_rate > 0.0,
            "tick rate must be positive, got {}",
            args.tick_rate
        );
        anyhow::ensure!(
            crate::ui::board_size(config.columns, config.rows).is_some(),
            "a {}x{} box does not fit in a terminal",
            config.columns,
            config.rows
        );
        let (scene, difficulty) = new_scene(&config)?;
        let tick_interval = Duration::from_secs_f64(1.0 / args.tick_rate);
        Ok(Self {
            args,
            theme,
            scene,
            difficulty,
            level: 0,
            screen: Screen::Playing,
            paused: false,
            game_over_reason: None,
            last_tick: Instant::now(),
            tick_interval,
            best: highscores::load_high_score(),
            game_over_effect: None,
            game_over_effect_process_time: None,
        })
    }

    fn reset_game(&mut self) {
        self.scene.reset();
        self.level = 0;
        self.screen = Screen::Playing;
        self.paused = false;
        self.game_over_reason = None;
        self.last_tick = Instant::now();
        self.game_over_effect = None;
        self.game_over_effect_process_time = None;
    }

    /// Keeps the best score on disk; failures only cost the record.
    fn record_score(&mut self) {
        let score = self.scene.statistics().score();
        if score <= self.best {
            return;
        }
        self.best = score;
        if let Err(err) = highscores::save_high_score(score) {
            tracing::warn!(%err, "could not save high score");
        }
    }

    fn game_over(&mut self, reason: GameOverReason) {
        let statistics = self.scene.statistics();
        tracing::info!(
            ?reason,
            score = statistics.score(),
            level = statistics.level(),
            "game over"
        );
        self.screen = Screen::GameOver;
        self.game_over_reason = Some(reason);
        self.record_score();
    }

    fn tick(&mut self) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        match self.scene.tick() {
            Ok(_) if self.scene.is_ended() => self.game_over(GameOverReason::BoxFull),
            Ok(_) => self.log_level_change(),
            Err(err) => {
                tracing::error!(%err, "box error, halting");
                self.game_over(GameOverReason::Halted);
            }
        }
    }

    fn log_level_change(&mut self) {
        let level = self.scene.statistics().level();
        if level == self.level {
            return;
        }
        self.level = level;
        let difficulty = self.difficulty.borrow();
        tracing::info!(
            level,
            speed = difficulty.speed(),
            preservative_stock = difficulty.preservative_stock(),
            preservative_probability = difficulty.preservative_probability(),
            "level up"
        );
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> bool {
        match (self.screen, action) {
            (_, Action::Quit) => {
                self.record_score();
                return false;
            }
            (_, Action::Restart) => self.reset_game(),
            (Screen::Playing, Action::Pause) => self.paused = !self.paused,
            (Screen::Playing, _) if !self.paused && self.scene.grabbed().is_some() => {
                action.direct(&mut self.scene);
            }
            _ => {}
        }
        true
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.scene,
                    &self.theme,
                    self.paused,
                    self.best,
                    self.difficulty.borrow().to_next_level(),
                    self.game_over_reason,
                    &mut self.game_over_effect,
                    &mut self.game_over_effect_process_time,
                    now,
                    self.args.no_animation,
                );
            })?;

            let timeout = Duration::from_millis(FRAME_MS).saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if !self.handle_action(key_to_action(key)) {
                            return Ok(());
                        }
                    }
                }
            }

            while self.last_tick.elapsed() >= self.tick_interval {
                self.last_tick += self.tick_interval;
                self.tick();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn app(argv: &[&str]) -> Result<App> {
        let args = Args::parse_from(std::iter::once("ochimikan").chain(argv.iter().copied()));
        let config = GameConfig::from(&args);
        App::new(args, config, Theme::default())
    }

    #[test]
    fn test_rejects_boxes_too_large_for_a_terminal() {
        assert!(app(&["--columns", "40000"]).is_err());
        assert!(app(&["--rows", "70000"]).is_err());
        assert!(app(&["--columns", "8", "--rows", "12", "--seed", "3"]).is_ok());
    }

    #[test]
    fn test_rejects_bad_tick_rate_and_margin() {
        assert!(app(&["--tick-rate", "0"]).is_err());
        assert!(app(&["--row-margin", "1"]).is_err());
    }
}
