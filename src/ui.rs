use crate::{
    client::{
        AppSnapshot,
        PlayerRow,
    },
    turn::TurnStatus,
    types::BOARD_CELLS,
    profiles,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::stdout;
use unicode_width::UnicodeWidthStr;

const CELL_WIDTH: usize = 7;
const TOKEN_GLYPHS: [&str; 6] = ["●", "▲", "■", "◆", "★", "✦"];
const TOKEN_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
];
const DIE_GLYPHS: [&str; 6] = ["⚀", "⚁", "⚂", "⚃", "⚄", "⚅"];

pub enum UserEvent {
    Quit,
    Roll,
    ExtraRoll,
    Redraw,
}

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            terminal: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    QuitModal,
}

pub type InputEvents = EventStream;

pub fn input_event_stream() -> InputEvents {
    EventStream::new()
}

pub async fn next_raw_event(stream: &mut InputEvents) -> Result<Event> {
    match stream.next().await {
        Some(Ok(event)) => Ok(event),
        Some(Err(err)) => Err(eyre!("reading terminal input failed: {err}")),
        None => Err(eyre!("terminal input stream ended")),
    }
}

/// Map a raw terminal event to a user intent, handling modal state.
pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    match event {
        Event::Resize(_, _) => Some(UserEvent::Redraw),
        Event::Key(key) if key.kind == KeyEventKind::Press => match state.mode {
            Mode::QuitModal => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            },
            Mode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => {
                    state.mode = Mode::QuitModal;
                    Some(UserEvent::Redraw)
                }
                KeyCode::Char('r') => Some(UserEvent::Roll),
                KeyCode::Char('e') => Some(UserEvent::ExtraRoll),
                _ => None,
            },
        },
        _ => None,
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen
    )?;
    // One persistent Terminal so buffers survive across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(14),
            Constraint::Length(8),
        ])
        .split(f.area());

    draw_header(f, chunks[0], snap);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((CELL_WIDTH * 10 + 2) as u16),
            Constraint::Min(32),
        ])
        .split(chunks[1]);
    draw_board(f, middle[0], snap);
    draw_side(f, middle[1], snap);

    draw_bottom(f, chunks[2], snap);

    if state.mode == Mode::QuitModal {
        draw_quit_modal(f);
    }
}

fn draw_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut spans = vec![Span::styled(
        format!("Room {}", snap.room_id),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(room) = &snap.room {
        spans.push(Span::raw(format!(
            " | stake {} | {}/{} players",
            room.stake_amount,
            snap.players.len(),
            room.required_participants
        )));
        let phase = if room.is_over() {
            "finished"
        } else if room.started {
            "running"
        } else {
            "waiting for players"
        };
        spans.push(Span::styled(
            format!(" | {phase}"),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        spans.push(Span::styled(
            " | syncing...",
            Style::default().fg(Color::DarkGray),
        ));
    }
    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Moksha Patam"),
    );
    f.render_widget(header, area);
}

/// The 10x10 serpentine board, numbered 1 at the bottom left, 100 at
/// the top left, tokens drawn at their display positions.
fn draw_board(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::with_capacity(10);
    for band in (0..10u16).rev() {
        let mut cells: Vec<u16> =
            (band * 10 + 1..=band * 10 + 10).collect();
        if band % 2 == 1 {
            cells.reverse();
        }
        let mut spans = Vec::new();
        for cell in cells {
            push_cell(&mut spans, cell, snap);
        }
        lines.push(Line::from(spans));
    }
    let board = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Board"));
    f.render_widget(board, area);
}

fn push_cell(spans: &mut Vec<Span<'static>>, cell: u16, snap: &AppSnapshot) {
    let here: Vec<(usize, &PlayerRow)> = snap
        .players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.display_position == cell)
        .collect();

    let number_style = if cell == BOARD_CELLS {
        Style::default().fg(Color::LightYellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    spans.push(Span::styled(format!("{cell:>3}"), number_style));

    let mut used = 3usize;
    for (idx, player) in &here {
        let glyph = TOKEN_GLYPHS[idx % TOKEN_GLYPHS.len()];
        let mut style = Style::default().fg(TOKEN_COLORS[idx % TOKEN_COLORS.len()]);
        if player.is_current {
            style = style.add_modifier(Modifier::BOLD);
        }
        used += UnicodeWidthStr::width(glyph);
        spans.push(Span::styled(glyph.to_string(), style));
    }
    if used < CELL_WIDTH {
        spans.push(Span::raw(" ".repeat(CELL_WIDTH - used)));
    }
}

fn draw_side(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Length(3),
            Constraint::Min(6),
        ])
        .split(area);

    draw_dice(f, side[0], snap);
    draw_countdown(f, side[1], snap);
    draw_players(f, side[2], snap);
}

fn draw_dice(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    match snap.dice_face {
        Some(face) => {
            let glyph = DIE_GLYPHS[(face as usize - 1) % DIE_GLYPHS.len()];
            let style = if snap.dice_spinning {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::ITALIC)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::styled(format!("{glyph}  {face}"), style));
        }
        None => {
            lines.push(Line::styled(
                "not rolled yet",
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    if snap.dice_spinning {
        lines.push(Line::styled(
            "rolling...",
            Style::default().fg(Color::Yellow),
        ));
    } else {
        match snap.turn {
            TurnStatus::Mine if snap.extra_roll_hint => {
                lines.push(Line::styled(
                    "extra roll ready - press e",
                    Style::default().fg(Color::LightGreen),
                ));
            }
            TurnStatus::Mine if snap.dice_enabled => {
                lines.push(Line::styled(
                    "your turn - press r",
                    Style::default().fg(Color::LightGreen),
                ));
            }
            TurnStatus::Mine => {}
            TurnStatus::Theirs(addr) => {
                lines.push(Line::styled(
                    format!("waiting for {}", profiles::display_name(addr)),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            TurnStatus::Waiting => {
                lines.push(Line::styled(
                    "waiting for the room",
                    Style::default().fg(Color::DarkGray),
                ));
            }
            TurnStatus::Finished(addr) => {
                lines.push(Line::styled(
                    format!("{} won", profiles::display_name(addr)),
                    Style::default().fg(Color::LightYellow),
                ));
            }
        }
    }
    let dice = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Dice"));
    f.render_widget(dice, area);
}

fn draw_countdown(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = match &snap.countdown {
        Some(remaining) => Line::from(remaining.clone()),
        None => Line::styled("-", Style::default().fg(Color::DarkGray)),
    };
    let countdown = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Next slot"));
    f.render_widget(countdown, area);
}

fn draw_players(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = Vec::new();
    if snap.players.is_empty() {
        lines.push(Line::styled(
            "nobody here yet",
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        for (idx, player) in snap.players.iter().enumerate() {
            let glyph = TOKEN_GLYPHS[idx % TOKEN_GLYPHS.len()];
            let mut style =
                Style::default().fg(TOKEN_COLORS[idx % TOKEN_COLORS.len()]);
            if player.is_current {
                style = style.add_modifier(Modifier::BOLD);
            }
            let me_marker = if player.is_me { " (you)" } else { "" };
            let moving = if player.display_position
                != player.authoritative_position
            {
                format!(" -> {}", player.authoritative_position)
            } else {
                String::new()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{glyph} "), style),
                Span::styled(format!("{}{}", player.name, me_marker), style),
                Span::raw(format!(
                    "  cell {}{}  last {}  prasad {}",
                    player.display_position,
                    moving,
                    player.last_roll_value,
                    player.prasad_meter
                )),
            ]));
        }
        let order = snap
            .players
            .iter()
            .map(|p| p.name.as_str())
            .format(" > ");
        lines.push(Line::styled(
            format!("order: {order}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let players = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Players"));
    f.render_widget(players, area);
}

fn draw_bottom(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let status_widget = if snap.errors.is_empty() {
        let mut lines: Vec<Line> = Vec::new();
        if snap.status.trim().is_empty() {
            lines.push(Line::from("Ready"));
        } else {
            for line in snap.status.lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(Color::Green))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for e in &snap.errors {
            lines.push(Line::from(e.clone()));
        }
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Errors"))
            .style(Style::default().fg(Color::Red))
    };
    f.render_widget(status_widget, chunks[0]);

    let help = Paragraph::new(Line::from(
        "r roll | e extra roll | q quit",
    ))
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(help, chunks[1]);
}

fn draw_quit_modal(f: &mut Frame) {
    let area = centered_rect(30, 5, f.area());
    f.render_widget(Clear, area);
    let modal = Paragraph::new(Line::from("Leave the room? (y/n)"))
        .block(Block::default().borders(Borders::ALL).title("Quit"));
    f.render_widget(modal, area);
}

fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let x = outer.x + outer.width.saturating_sub(width) / 2;
    let y = outer.y + outer.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(outer.width),
        height: height.min(outer.height),
    }
}
