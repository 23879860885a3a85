//! Layout and drawing: box, sidebar, pause and game-over overlays.

use crate::app::{GameOverReason, Screen};
use crate::item::{Item, ItemKind};
use crate::scene::Scene;
use crate::spray::Spray;
use crate::surface::{Renderable, Surface};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Terminal columns per box column.
const ITEM_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 24;
const GAME_OVER_FADE_MS: u32 = 600;
const SPRAY_SYMBOLS: [&str; 4] = ["·", "∘", "°", "˙"];

/// Box size in terminal cells, border included; `None` if it cannot be addressed.
pub fn board_size(columns: usize, rows: usize) -> Option<(u16, u16)> {
    let width = u16::try_from(columns).ok()?.checked_mul(ITEM_WIDTH)?.checked_add(2)?;
    let height = u16::try_from(rows).ok()?.checked_add(2)?;
    // the sidebar sits beside the box
    width.checked_add(SIDEBAR_WIDTH)?;
    Some((width, height))
}

/// Draws items and sprays from box pixels into a buffer region.
///
/// A box column is [`ITEM_WIDTH`] terminal columns wide and a box row is one
/// terminal row. Anything above or outside the visible box is skipped.
pub struct TerminalSurface<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    cell_size: f64,
    theme: &'a Theme,
}

impl<'a> TerminalSurface<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, cell_size: u32, theme: &'a Theme) -> Self {
        Self {
            buf,
            area,
            cell_size: f64::from(cell_size),
            theme,
        }
    }

    /// Terminal position of a box pixel, if it lies inside the area.
    fn position(&self, x: f64, y: f64, sub_columns: u16) -> Option<(u16, u16)> {
        let column = (x / self.cell_size * f64::from(sub_columns)).floor();
        let row = (y / self.cell_size).round();
        let width = f64::from(self.area.width / ITEM_WIDTH * sub_columns);
        if column < 0.0 || row < 0.0 || column >= width || row >= f64::from(self.area.height) {
            return None;
        }
        Some((
            self.area.x + column as u16 * (ITEM_WIDTH / sub_columns),
            self.area.y + row as u16,
        ))
    }
}

impl Surface for TerminalSurface<'_> {
    fn draw_item(&mut self, item: &Item) {
        let Some((x, y)) = self.position(item.x, item.y, 1) else {
            return;
        };
        let color = self.theme.item_color(item);
        let symbol = match item.kind() {
            ItemKind::Mikan if item.is_max_damaged() => "▓▓",
            ItemKind::Mikan => "██",
            ItemKind::Preservative => "▒▒",
        };
        self.buf
            .set_string(x, y, symbol, Style::default().fg(color).bg(self.theme.bg));
    }

    fn draw_spray(&mut self, spray: &Spray) {
        let Some((x, y)) = self.position(spray.x, spray.y, ITEM_WIDTH) else {
            return;
        };
        let symbol = SPRAY_SYMBOLS[usize::from(spray.frame()) % SPRAY_SYMBOLS.len()];
        self.buf[(x, y)]
            .set_symbol(symbol)
            .set_style(Style::default().fg(self.theme.spray));
    }
}

/// Draw the current screen, with the pause overlay or the game-over fade and summary.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    scene: &Scene,
    theme: &Theme,
    paused: bool,
    best: u64,
    to_next_level: u32,
    game_over_reason: Option<GameOverReason>,
    game_over_effect: &mut Option<Effect>,
    effect_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    let board_rect = draw_game(frame, scene, theme, area, best, to_next_level);
    match screen {
        Screen::Playing => {
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::GameOver => {
            if !no_animation {
                apply_game_over_effect(
                    frame,
                    theme,
                    board_rect,
                    game_over_effect,
                    effect_process_time,
                    now,
                );
            }
            draw_game_over(frame, scene, theme, game_over_reason, area, best);
        }
    }
}

/// Fade the box to the background once the game is over (TachyonFX).
fn apply_game_over_effect(
    frame: &mut Frame,
    theme: &Theme,
    board_rect: Rect,
    effect: &mut Option<Effect>,
    process_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *process_time = Some(now);

    let effect = effect.get_or_insert_with(|| {
        fx::fade_to(theme.bg, theme.bg, (GAME_OVER_FADE_MS, Interpolation::Linear))
            .with_area(board_rect)
    });
    frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
}

/// Box + sidebar, centered. Returns the area the items are drawn in.
fn draw_game(
    frame: &mut Frame,
    scene: &Scene,
    theme: &Theme,
    area: Rect,
    best: u64,
    to_next_level: u32,
) -> Rect {
    let mikan_box = scene.mikan_box();
    let (bw, bh) = board_size(mikan_box.column_count(), mikan_box.row_count())
        .unwrap_or((area.width, area.height));
    let total_w = bw.saturating_add(SIDEBAR_WIDTH);
    let total_h = bh.max(SIDEBAR_HEIGHT);

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_h),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);

    let board_rect = draw_board(frame, scene, theme, inner[0]);
    draw_sidebar(frame, scene, theme, inner[1], best, to_next_level);
    board_rect
}

fn draw_board(frame: &mut Frame, scene: &Scene, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" Ochimikan ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in inner.top()..inner.bottom() {
        for x in inner.left()..inner.right() {
            buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(theme.bg));
        }
    }
    let mut surface = TerminalSurface::new(buf, inner, scene.mikan_box().cell_size(), theme);
    scene.render(&mut surface);
    inner
}

const SIDEBAR_HEIGHT: u16 = 18;

fn draw_sidebar(
    frame: &mut Frame,
    scene: &Scene,
    theme: &Theme,
    area: Rect,
    best: u64,
    to_next_level: u32,
) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Next (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(9), // Stats
            Constraint::Length(4), // Keys
        ])
        .split(area);

    // --- Next ---
    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    let mut spans = vec![Span::styled("Next ", title_style)];
    for item in scene.upcoming() {
        spans.push(Span::styled(
            "██",
            Style::default().fg(theme.item_color(item)),
        ));
        spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(spans)).render(next_inner, frame.buffer_mut());

    // --- Stats ---
    let stats = scene.statistics();
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(chunks[2]);
    stats_block.render(chunks[2], frame.buffer_mut());
    let row = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };
    let mut stats_lines = vec![
        row("Score: ", stats.score().to_string()),
        row("Best: ", best.max(stats.score()).to_string()),
        row("Level: ", stats.level().to_string()),
        row("Next level: ", to_next_level.to_string()),
        row("Mikans: ", stats.erased_mikan_count().to_string()),
        row("Preservatives: ", stats.erased_preservative_count().to_string()),
    ];
    if stats.combo_length() > 1 {
        stats_lines.push(Line::from(Span::styled(
            format!("Combo x{}", stats.combo_length()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    Paragraph::new(Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Keys ---
    let hint = Style::default().fg(theme.inactive_fg);
    Paragraph::new(vec![
        Line::from(Span::styled(" ←/→ move  z/x rotate", hint)),
        Line::from(Span::styled(" space release", hint)),
        Line::from(Span::styled(" p pause  r restart", hint)),
    ])
    .render(chunks[3], frame.buffer_mut());
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered(area, 28, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P - Resume    Q - Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    scene: &Scene,
    theme: &Theme,
    reason: Option<GameOverReason>,
    area: Rect,
    best: u64,
) {
    let popup = centered(area, 30, 11);
    let stats = scene.statistics();
    let title = match reason {
        Some(GameOverReason::Halted) => " Game halted ",
        _ => " Game Over ",
    };
    let text = |s: String| Line::from(Span::styled(s, Style::default().fg(theme.main_fg)));
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        text(format!(" Score: {} ", stats.score())),
        text(format!(" Best: {} ", best)),
        text(format!(" Level: {} ", stats.level())),
    ];
    if stats.score() > 0 && stats.score() >= best {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    if reason == Some(GameOverReason::Halted) {
        lines.push(text(" See the log for details ".to_string()));
    }
    lines.push(Line::from(""));
    lines.push(text(" R - Restart    Q - Quit ".to_string()));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Ochimikan ", theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}
