use crate::client::AppSnapshot;
use color_eyre::eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use gacha_sim::{
    engine::{COLS, ROWS},
    format::format_currency,
    state::MAX_ATTEMPTS,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;
use std::time::Duration;

pub enum UserEvent {
    Quit,
    Spin,
    Refresh,
    Buy(u64),
    Reset,
    Redraw,
    Tick,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    BuyModal(BuyState),
    ResetModal,
    QuitModal,
}

#[derive(Clone, Debug)]
struct BuyState { quantity: u64 }

impl Default for BuyState { fn default() -> Self { BuyState { quantity: 1 } } }

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
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
        crossterm::event::DisableMouseCapture,
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

/// Waits up to `timeout` for a key; `Tick` when none arrives.
pub fn next_event(state: &mut UiState, timeout: Duration) -> Result<UserEvent> {
    loop {
        if !event::poll(timeout)? {
            return Ok(UserEvent::Tick);
        }
        let Event::Key(k) = event::read()? else { continue; };
        if k.kind != KeyEventKind::Press { continue; }
        match &mut state.mode {
            Mode::BuyModal(bs) => {
                match k.code {
                    KeyCode::Esc => { state.mode = Mode::Normal; return Ok(UserEvent::Redraw); }
                    KeyCode::Enter => { let qty = bs.quantity; state.mode = Mode::Normal; return Ok(UserEvent::Buy(qty)); }
                    KeyCode::Up | KeyCode::Char('+') => { bs.quantity = bs.quantity.saturating_add(1); return Ok(UserEvent::Redraw); }
                    KeyCode::Down | KeyCode::Char('-') => { bs.quantity = bs.quantity.saturating_sub(1); return Ok(UserEvent::Redraw); }
                    KeyCode::Backspace => { bs.quantity /= 10; return Ok(UserEvent::Redraw); }
                    KeyCode::Char(c) => {
                        if let Some(d) = c.to_digit(10) { bs.quantity = bs.quantity.saturating_mul(10).saturating_add(u64::from(d)); }
                        return Ok(UserEvent::Redraw);
                    }
                    _ => continue,
                }
            }
            Mode::ResetModal => {
                match k.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => { state.mode = Mode::Normal; return Ok(UserEvent::Reset); }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => { state.mode = Mode::Normal; return Ok(UserEvent::Redraw); }
                    _ => continue,
                }
            }
            Mode::QuitModal => {
                match k.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => { return Ok(UserEvent::Quit); }
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => { state.mode = Mode::Normal; return Ok(UserEvent::Redraw); }
                    _ => continue,
                }
            }
            Mode::Normal => {}
        }
        return Ok(match k.code {
            KeyCode::Char('q') | KeyCode::Esc => { state.mode = Mode::QuitModal; UserEvent::Redraw },
            KeyCode::Char('s') | KeyCode::Char(' ') => UserEvent::Spin,
            KeyCode::Char('t') => UserEvent::Refresh,
            KeyCode::Char('b') => { state.mode = Mode::BuyModal(BuyState::default()); UserEvent::Redraw },
            KeyCode::Char('r') => { state.mode = Mode::ResetModal; UserEvent::Redraw },
            _ => continue,
        });
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),  // status
            Constraint::Length(11), // grid
            Constraint::Min(5),     // messages
            Constraint::Length(3),  // help
        ])
        .split(f.area());

    draw_status(f, chunks[0], snap);
    draw_grid(f, chunks[1], snap);
    draw_messages(f, chunks[2], snap);
    draw_help(f, chunks[3]);
    draw_modals(f, state);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = match &snap.status {
        Some(s) => {
            let win_rate = s.win_rate().map(|r| format!("{r:.1}%")).unwrap_or_else(|| "-".to_string());
            format!(
                "💰 Balance: {} coins | 🎟️ Tokens: {} | ⚡ Attempts: {}/{}\n🎉 Wins: {} | 😢 Losses: {} | 📈 Win rate: {} | ⏰ Reset in: {}",
                format_currency(s.balance), s.tokens, s.attempts_left, MAX_ATTEMPTS,
                s.total_wins, s.total_losses, win_rate, s.next_reset_label()
            )
        }
        None => String::from("Status unavailable"),
    };
    let title = format!("Status ({})", snap.save_location);
    let p = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_grid(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let block = Block::default().borders(Borders::ALL).title("Gacha");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let Some(grid) = &snap.last_grid else {
        let p = Paragraph::new("Press s to spin").alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray));
        f.render_widget(p, inner);
        return;
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, ROWS as u32); ROWS])
        .split(inner);
    for (r, row_area) in rows.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, COLS as u32); COLS])
            .split(*row_area);
        for (c, cell_area) in cells.iter().enumerate() {
            let winning = snap.winning_lines.iter().any(|l| l.contains(r, c));
            let style = if winning { Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD) } else { Style::default() };
            let p = Paragraph::new(grid.cell(r, c).glyph())
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(style));
            f.render_widget(p, *cell_area);
        }
    }
}

fn draw_messages(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let visible = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = Vec::new();
    if snap.messages.is_empty() {
        lines.push(Line::styled("Welcome to the mini gacha game!", Style::default().fg(Color::DarkGray)));
    }
    let skip = snap.messages.len().saturating_sub(visible);
    for m in snap.messages.iter().skip(skip) {
        let color = if m.is_error { Color::Red } else { Color::Reset };
        lines.push(Line::styled(m.text.clone(), Style::default().fg(color)));
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new("s spin | b buy packs | t refresh status | r reset game | q/Esc quit")
        .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    match &state.mode {
        Mode::BuyModal(bs) => {
            let area = centered_rect(50, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Buy Gacha Packs (1 pack = 5 tokens)");
            let p = Paragraph::new(format!("Packs: {}\nEnter=confirm Esc=cancel +/- or digits to edit", bs.quantity));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::ResetModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Reset");
            let p = Paragraph::new("Reset all game data? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the game? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    let vertical = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1]);

    vertical[1]
}
