use crate::{
    client::{
        AppSnapshot,
        ChainGate,
    },
    config,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        self,
        Event,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::{
    io::stdout,
    sync::{
        Arc,
        atomic::{
            AtomicBool,
            Ordering,
        },
    },
    thread,
    time::Duration,
};
use tokio::sync::mpsc;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub enum UserEvent {
    Quit,
    Connect,
    Mint,
    Redraw,
}

#[derive(Debug)]
pub struct UiState {
    mode: Mode,
    gate: ChainGate,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

impl Default for UiState {
    fn default() -> Self {
        UiState {
            mode: Mode::Normal,
            gate: ChainGate::Disconnected,
            terminal: None,
        }
    }
}

impl UiState {
    /// Raise a blocking notification; all input except dismissal is swallowed
    /// while it is open.
    pub fn open_alert(&mut self, message: String) {
        self.mode = Mode::Alert(message);
    }
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    Alert(String),
}

/// Terminal input as an async stream. The reader lives on its own thread so
/// the event loop can select over keys and chain events; it can be paused
/// while something else (the passphrase prompt) owns the tty.
pub struct InputEvents {
    rx: mpsc::UnboundedReceiver<Event>,
    paused: Arc<AtomicBool>,
}

impl InputEvents {
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    pub async fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        // Let an in-flight poll drain before the tty changes hands.
        tokio::time::sleep(INPUT_POLL_INTERVAL * 2).await;
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }
}

pub fn input_event_stream() -> InputEvents {
    let (tx, rx) = mpsc::unbounded_channel();
    let paused = Arc::new(AtomicBool::new(false));
    let flag = paused.clone();
    thread::spawn(move || {
        loop {
            if flag.load(Ordering::SeqCst) {
                thread::sleep(INPUT_POLL_INTERVAL);
                continue;
            }
            match event::poll(INPUT_POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        }
    });
    InputEvents { rx, paused }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    // Create a single persistent Terminal to preserve buffers across draws
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
    state.gate = snap.gate;
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub async fn next_event(state: &mut UiState, input: &mut InputEvents) -> Result<UserEvent> {
    loop {
        let Some(ev) = input.next().await else {
            return Err(eyre!("input stream ended"));
        };
        match ev {
            Event::Resize(..) => return Ok(UserEvent::Redraw),
            Event::Key(k) if k.kind == KeyEventKind::Press => match &state.mode {
                Mode::Alert(_) => match k.code {
                    KeyCode::Enter | KeyCode::Esc => {
                        state.mode = Mode::Normal;
                        return Ok(UserEvent::Redraw);
                    }
                    _ => {}
                },
                Mode::Normal => match k.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(UserEvent::Quit),
                    KeyCode::Char('c') if state.gate == ChainGate::Disconnected => {
                        return Ok(UserEvent::Connect);
                    }
                    KeyCode::Char('m') if state.gate == ChainGate::ReadyToMint => {
                        return Ok(UserEvent::Mint);
                    }
                    _ => {}
                },
            },
            _ => {}
        }
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    // Clear the whole frame to avoid leftover fragments
    f.render_widget(Clear, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // header
            Constraint::Min(7),    // connect / mint panel
            Constraint::Length(3), // status
            Constraint::Length(5), // errors
            Constraint::Length(3), // footer
        ])
        .split(f.area());

    draw_header(f, chunks[0]);
    draw_body(f, chunks[1], snap);
    draw_status(f, chunks[2], snap);
    draw_errors(f, chunks[3], snap);
    draw_footer(f, chunks[4]);
    draw_modal(f, state);
}

fn draw_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::styled(
            config::APP_TITLE,
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center),
        Line::from(config::APP_SUBTITLE).alignment(Alignment::Center),
    ];
    let header = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_body(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = Vec::new();
    match snap.gate {
        ChainGate::Disconnected => {
            lines.push(Line::from(""));
            lines.push(Line::styled(
                "Sign in with Ethereum",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from(""));
            lines.push(Line::from("Press 'c' to connect your wallet."));
        }
        ChainGate::WrongChain => {
            let account = snap
                .account
                .map(|a| a.to_string())
                .unwrap_or_default();
            let chain = snap.chain_id.clone().unwrap_or_else(|| String::from("unknown"));
            lines.push(Line::from(format!("Connected as {account}.")));
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!(
                    "Wrong network: this page mints on {} ({}), but your wallet is on {}.",
                    config::TARGET_CHAIN.name,
                    config::TARGET_CHAIN.chain_id,
                    chain
                ),
                Style::default().fg(Color::Yellow),
            ));
            lines.push(Line::from(format!(
                "Switch your wallet to {} to mint.",
                config::TARGET_CHAIN.name
            )));
        }
        ChainGate::ReadyToMint => {
            let account = snap
                .account
                .map(|a| a.to_string())
                .unwrap_or_default();
            lines.push(Line::from(format!("Connected as {account}.")));
            lines.push(Line::from(""));
            lines.push(Line::styled(
                "Mint NFT",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::from(""));
            lines.push(Line::from("Press 'm' to mint."));
        }
    }
    let body = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(body, area);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let status = Paragraph::new(snap.status.clone())
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}

fn draw_errors(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = Vec::new();
    if snap.errors.is_empty() {
        lines.push(Line::styled("No errors", Style::default().fg(Color::DarkGray)));
    } else {
        for e in &snap.errors {
            lines.push(Line::from(e.clone()));
        }
    }
    let color = if snap.errors.is_empty() {
        Color::Green
    } else {
        Color::Red
    };
    let errors = Paragraph::new(lines)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("Errors"));
    f.render_widget(errors, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(format!(
        "— {} & {} —   |   c connect | m mint | q/Esc quit",
        config::MOBIUS_HANDLE,
        config::LINENOISE_HANDLE
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

fn draw_modal(f: &mut Frame, state: &UiState) {
    if let Mode::Alert(message) = &state.mode {
        let area = centered_rect(60, 40, f.area());
        let block = Block::default().borders(Borders::ALL).title("Alert");
        let text = format!("{message}\n\nEnter=dismiss");
        let p = Paragraph::new(text).wrap(Wrap { trim: false });
        f.render_widget(Clear, area);
        f.render_widget(block.clone(), area);
        f.render_widget(p, block.inner(area));
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
