use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gamedex_core::{
    CatalogViewState, GameCatalogClient, GameDetail, GameId, GameSummary, LoadStatus,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{error, info};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Screen the detail view returns to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    List,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    List,
    Detail { id: GameId, origin: Origin },
    Search,
}

/// Terminal frontend: list, detail and search screens over the view state.
pub struct GamedexApp<C> {
    view: CatalogViewState<C>,
    screen: Screen,
    list_cursor: Cursor,
    search_cursor: Cursor,
    should_quit: bool,
    theme: Theme,
}

impl<C: GameCatalogClient> GamedexApp<C> {
    pub fn new(view: CatalogViewState<C>) -> Self {
        Self {
            view,
            screen: Screen::List,
            list_cursor: Cursor::default(),
            search_cursor: Cursor::default(),
            should_quit: false,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.view.on_list_screen_enter();

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut list_rx = self.view.subscribe_list_status();
        let mut detail_rx = self.view.subscribe_detail_status();

        let outcome = loop {
            if let Err(err) = terminal.draw(|frame| self.draw(frame)) {
                break Err(err.into());
            }
            if self.should_quit {
                break Ok(());
            }

            tokio::select! {
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(AppEvent::Input(event)) => self.handle_input(event),
                    Some(AppEvent::Tick) => {}
                    None => break Ok(()),
                },
                changed = list_rx.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                    self.list_cursor.clamp(self.view.list().len());
                }
                changed = detail_rx.changed() => {
                    if changed.is_err() {
                        break Ok(());
                    }
                }
            }
        };

        restore_terminal(&mut terminal)?;
        outcome
    }

    fn handle_input(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::List => self.handle_list_key(key),
            Screen::Detail { origin, .. } => self.handle_detail_key(key, origin),
            Screen::Search => self.handle_search_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        let total = self.view.list().len();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.list_cursor.move_by(1, total),
            KeyCode::Char('k') | KeyCode::Up => self.list_cursor.move_by(-1, total),
            KeyCode::Char('g') | KeyCode::Home => self.list_cursor.move_to(0, total),
            KeyCode::Char('G') | KeyCode::End => {
                self.list_cursor.move_to(total.saturating_sub(1), total)
            }
            KeyCode::PageDown => self.list_cursor.page(1, total),
            KeyCode::PageUp => self.list_cursor.page(-1, total),
            KeyCode::Char('r') => {
                info!("reloading game list");
                self.view.on_list_screen_enter();
            }
            KeyCode::Char('/') => {
                self.view.set_active(true);
                self.search_cursor = Cursor::default();
                self.screen = Screen::Search;
            }
            KeyCode::Enter => {
                let selected = self.view.list().items.get(self.list_cursor.index).cloned();
                if let Some(game) = selected {
                    self.open_detail(&game, Origin::List);
                }
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent, origin: Origin) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Left | KeyCode::Char('q') => {
                self.view.on_detail_screen_exit();
                self.screen = match origin {
                    Origin::List => Screen::List,
                    Origin::Search => {
                        self.view.set_active(true);
                        Screen::Search
                    }
                };
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let results = self.search_results();
        match key.code {
            KeyCode::Esc => {
                self.view.set_active(false);
                self.screen = Screen::List;
            }
            KeyCode::Down => self.search_cursor.move_by(1, results.len()),
            KeyCode::Up => self.search_cursor.move_by(-1, results.len()),
            KeyCode::Enter => {
                if let Some(game) = results.get(self.search_cursor.index) {
                    self.view.set_active(false);
                    self.open_detail(game, Origin::Search);
                }
            }
            KeyCode::Backspace => {
                let mut query = self.view.query();
                query.pop();
                self.view.set_query(query);
                self.search_cursor = Cursor::default();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                let mut query = self.view.query();
                query.push(ch);
                self.view.set_query(query);
                self.search_cursor = Cursor::default();
            }
            _ => {}
        }
    }

    fn open_detail(&mut self, game: &GameSummary, origin: Origin) {
        info!(id = game.id, name = %game.name, "opening game detail");
        self.view.on_detail_screen_enter(game.id);
        self.screen = Screen::Detail {
            id: game.id,
            origin,
        };
    }

    /// Results shown under the search bar; nothing until something is typed.
    fn search_results(&self) -> Vec<GameSummary> {
        let query = self.view.query();
        if query.is_empty() {
            return Vec::new();
        }
        self.view.filtered_list(&query)
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(4)])
            .split(frame.size());

        match self.screen {
            Screen::List => self.render_list(frame, chunks[0]),
            Screen::Detail { id, .. } => self.render_detail(frame, chunks[0], id),
            Screen::Search => self.render_search(frame, chunks[0]),
        }
        self.render_status(frame, chunks[1]);
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect) {
        let list = self.view.list();
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let title = format!("Games ({})", list.len());
        self.render_games(frame, body[0], &list.items, true, &title);

        let block = Block::default().borders(Borders::ALL).title("Selected");
        let lines = match list.items.get(self.list_cursor.index) {
            Some(game) => vec![
                Line::from(Span::styled(
                    game.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Id: {}", game.id)),
                Line::from(format!("Image: {}", or_dash(&game.background_image))),
                Line::from(""),
                Line::from(Span::styled(
                    "Enter to open, / to search",
                    Style::default().fg(self.theme.muted),
                )),
            ],
            None => vec![Line::from(match self.view.list_status() {
                LoadStatus::Loading => "Loading games…",
                _ => "No games available",
            })],
        };
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, body[1]);
    }

    fn render_games(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        games: &[GameSummary],
        main_list: bool,
        title: &str,
    ) {
        let height = area.height.saturating_sub(2) as usize;
        let cursor = if main_list {
            &mut self.list_cursor
        } else {
            &mut self.search_cursor
        };
        cursor.height = height;
        cursor.clamp(games.len());
        let Cursor { index, offset, .. } = *cursor;

        let end = (offset + height).min(games.len());
        let visible = games.get(offset..end).unwrap_or_default();
        let mut list_state = ListState::default();
        if !visible.is_empty() {
            list_state.select(Some(index - offset));
        }

        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let marker = if offset + idx == index {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let name = Span::styled(
                    game.name.clone(),
                    Style::default().fg(self.theme.primary_fg),
                );
                ListItem::new(Line::from(vec![marker, name]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, id: GameId) {
        let detail = self.view.detail();
        let status = self.view.detail_status();
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Game #{id}"));

        let mut lines = Vec::new();
        match &status {
            LoadStatus::Loading | LoadStatus::Idle => {
                lines.push(Line::from("Loading details…"));
            }
            LoadStatus::Failed { reason } => {
                lines.push(Line::from(Span::styled(
                    "Could not load this game.",
                    Style::default().fg(self.theme.danger),
                )));
                lines.push(Line::from(Span::styled(
                    reason.clone(),
                    Style::default().fg(self.theme.muted),
                )));
            }
            LoadStatus::Ready { .. } => {
                lines.push(Line::from(Span::styled(
                    detail.name.clone(),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                )));
                let score_style = match detail.score() {
                    Some(score) if score >= 75 => Style::default().fg(self.theme.success),
                    Some(score) if score >= 50 => Style::default().fg(self.theme.warning),
                    Some(_) => Style::default().fg(self.theme.danger),
                    None => Style::default().fg(self.theme.muted),
                };
                lines.push(Line::from(vec![
                    Span::raw("Metacritic: "),
                    Span::styled(score_label(&detail), score_style),
                ]));
                lines.push(Line::from(format!("Website: {}", website_label(&detail))));
                lines.push(Line::from(format!(
                    "Image: {}",
                    or_dash(&detail.background_image)
                )));
                lines.push(Line::from(""));
                for paragraph in detail.description.lines() {
                    lines.push(Line::from(paragraph.to_string()));
                }
            }
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_search(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        let query = self.view.query();
        let bar_style = if self.view.active() {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let bar = Paragraph::new(Line::from(vec![
            Span::styled("🔍 ", bar_style),
            Span::raw(query.clone()),
            Span::styled("▏", bar_style),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Search"));
        frame.render_widget(bar, chunks[0]);

        if query.is_empty() {
            let hint = Paragraph::new(Span::styled(
                "Type to filter loaded games by name",
                Style::default().fg(self.theme.muted),
            ))
            .block(Block::default().borders(Borders::ALL).title("Results"));
            frame.render_widget(hint, chunks[1]);
            return;
        }

        let results = self.search_results();
        let title = format!("Results ({})", results.len());
        self.render_games(frame, chunks[1], &results, false, &title);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let status = self.view.list_status();
        let style = match status {
            LoadStatus::Failed { .. } => Style::default().fg(self.theme.danger),
            LoadStatus::Loading => Style::default().fg(self.theme.warning),
            _ => Style::default(),
        };
        let primary = list_status_line(&status, self.view.list().len());
        let help = match self.screen {
            Screen::List => "j/k move • Enter open • / search • r reload • q quit",
            Screen::Detail { .. } => "Esc back • Ctrl-C quit",
            Screen::Search => "type to filter • ↑/↓ move • Enter open • Esc close",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(primary, style)),
            Line::from(Span::styled(help, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Cursor and scroll offset over a list whose length changes under it.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    index: usize,
    offset: usize,
    height: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            index: 0,
            offset: 0,
            height: 1,
        }
    }
}

impl Cursor {
    fn move_by(&mut self, delta: isize, total: usize) {
        if total == 0 {
            return;
        }
        let target = self.index as isize + delta;
        self.index = target.clamp(0, total as isize - 1) as usize;
        self.ensure_visible(total);
    }

    fn move_to(&mut self, index: usize, total: usize) {
        if total == 0 {
            return;
        }
        self.index = index.min(total - 1);
        self.ensure_visible(total);
    }

    fn page(&mut self, direction: isize, total: usize) {
        let step = self.height.max(1).min(total) as isize;
        self.move_by(direction * step, total);
    }

    fn clamp(&mut self, total: usize) {
        if total == 0 {
            self.index = 0;
            self.offset = 0;
            return;
        }
        if self.index >= total {
            self.index = total - 1;
        }
        self.ensure_visible(total);
    }

    fn ensure_visible(&mut self, total: usize) {
        let height = self.height.max(1);
        if self.index < self.offset {
            self.offset = self.index;
        } else if self.index >= self.offset + height {
            self.offset = self.index + 1 - height;
        }
        self.offset = self.offset.min(total.saturating_sub(height));
    }
}

fn score_label(detail: &GameDetail) -> String {
    match detail.score() {
        Some(score) => format!("{score}/100"),
        None => "No score".to_string(),
    }
}

fn website_label(detail: &GameDetail) -> String {
    detail
        .website_url()
        .map(str::to_string)
        .unwrap_or_else(|| "No website".to_string())
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "—"
    } else {
        value
    }
}

fn list_status_line(status: &LoadStatus, loaded: usize) -> String {
    match status {
        LoadStatus::Idle => "Game list not loaded".to_string(),
        LoadStatus::Loading => "Loading games…".to_string(),
        LoadStatus::Ready { fetched_at } => format!(
            "Loaded {loaded} games • updated {}",
            fetched_at.with_timezone(&Local).format("%H:%M:%S")
        ),
        LoadStatus::Failed { reason } => format!("Could not load games: {reason}"),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    error!(?err, "terminal input failed");
                    break;
                }
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(err) => {
                error!(?err, "terminal poll failed");
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gamedex_core::{
        catalog::{RawGameDetail, RawGameEntry, RawGameList},
        CatalogGateway, FetchError,
    };

    /// Catalog holding a single game.
    struct OneGame;

    impl GameCatalogClient for OneGame {
        async fn list_games(&self) -> Result<RawGameList, FetchError> {
            Ok(RawGameList {
                count: 1,
                results: vec![RawGameEntry {
                    id: 4200,
                    name: Some("Portal 2".to_string()),
                    background_image: None,
                }],
            })
        }

        async fn get_game(&self, _id: GameId) -> Result<RawGameDetail, FetchError> {
            Ok(RawGameDetail {
                name: Some("Portal 2".to_string()),
                ..RawGameDetail::default()
            })
        }
    }

    async fn search_app() -> GamedexApp<OneGame> {
        let view = CatalogViewState::new(CatalogGateway::new(OneGame));
        view.refresh_list().await;
        let mut app = GamedexApp::new(view);
        app.handle_list_key(KeyEvent::new(KeyCode::Char('/'), KeyModifiers::NONE));
        app
    }

    fn type_query(app: &mut GamedexApp<OneGame>, text: &str) {
        for ch in text.chars() {
            app.handle_search_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
        }
    }

    #[tokio::test]
    async fn enter_without_results_keeps_search_active() {
        let mut app = search_app().await;
        assert!(matches!(app.screen, Screen::Search));
        assert!(app.view.active());

        type_query(&mut app, "zzz");
        app.handle_search_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(matches!(app.screen, Screen::Search));
        assert!(app.view.active());
        assert_eq!(app.view.query(), "zzz");
    }

    #[tokio::test]
    async fn enter_on_result_opens_detail() {
        let mut app = search_app().await;

        type_query(&mut app, "portal");
        app.handle_search_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(matches!(
            app.screen,
            Screen::Detail {
                id: 4200,
                origin: Origin::Search
            }
        ));
        assert!(!app.view.active());
    }

    #[test]
    fn sentinels_render_as_absent() {
        let detail = GameDetail::default();
        assert_eq!(score_label(&detail), "No score");
        assert_eq!(website_label(&detail), "No website");

        let scored = GameDetail {
            metacritic: 91,
            website: "https://www.valvesoftware.com".to_string(),
            ..GameDetail::default()
        };
        assert_eq!(score_label(&scored), "91/100");
        assert_eq!(website_label(&scored), "https://www.valvesoftware.com");
    }

    #[test]
    fn cursor_stays_within_list() {
        let mut cursor = Cursor {
            height: 3,
            ..Cursor::default()
        };
        cursor.move_by(10, 5);
        assert_eq!(cursor.index, 4);
        assert_eq!(cursor.offset, 2);

        cursor.clamp(2);
        assert_eq!(cursor.index, 1);
        assert_eq!(cursor.offset, 0);

        cursor.move_by(-5, 2);
        assert_eq!(cursor.index, 0);
        cursor.clamp(0);
        assert_eq!((cursor.index, cursor.offset), (0, 0));
    }

    #[test]
    fn status_line_reports_loaded_items() {
        let ready = LoadStatus::Ready {
            fetched_at: Utc::now(),
        };
        assert!(list_status_line(&ready, 20).starts_with("Loaded 20 games"));

        let failed = LoadStatus::Failed {
            reason: "boom".to_string(),
        };
        assert_eq!(list_status_line(&failed, 0), "Could not load games: boom");
    }
}
