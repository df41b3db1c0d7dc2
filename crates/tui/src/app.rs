use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use poolboard_core::{
    config::AppConfig,
    exclusion::{ExclusionResolver, OverrideStore},
    export::{rows_for_pool, rows_for_providers, write_export},
    models::{Program, ResourcePool},
    resource::{loader::pool_matches, PoolLoader},
    summary::{ProgramSummary, ProviderEntry, ProviderIndex},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
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
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Pools,
    Providers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Users,
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal dashboard over the resource pools of both programs.
pub struct PoolboardApp<S: OverrideStore> {
    config: AppConfig,
    loader: PoolLoader,
    resolver: ExclusionResolver<S>,
    state: UiState,
    theme: Theme,
}

impl<S: OverrideStore> PoolboardApp<S> {
    pub fn new(config: AppConfig, loader: PoolLoader, resolver: ExclusionResolver<S>) -> Self {
        Self {
            config,
            loader,
            resolver,
            state: UiState::default(),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.reload_pools();
        self.state.set_status(format!(
            "Loaded {} pools for {}",
            self.state.pools.len(),
            self.config.label(self.state.program)
        ));

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(AppEvent::Input(event)) => {
                    if let Err(err) = self.handle_input(event) {
                        error!(?err, "input handling failed");
                        self.state.set_status(format!("Error: {err}"));
                    }
                }
                Some(AppEvent::Tick) => self.handle_tick(),
                None => break,
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn reload_pools(&mut self) {
        let pools = self.loader.pools(self.state.program);
        self.state.set_pools(pools);
        self.state.apply_filter();
        info!(
            program = %self.state.program,
            total = self.state.pools.len(),
            "Pools reloaded"
        );
    }

    fn switch_program(&mut self, program: Program) {
        if self.state.program == program {
            return;
        }
        self.state.program = program;
        self.state.focus = Focus::List;
        self.reload_pools();
        self.state.set_status(format!(
            "Showing {} ({} pools)",
            self.config.label(program),
            self.state.pools.len()
        ));
    }

    fn handle_tick(&mut self) {
        if self.state.mode == Mode::Filter {
            self.state
                .set_status(format!("Filter: {}", self.state.filter));
        }
    }

    fn visible_users(&self, pool: &ResourcePool) -> Vec<(String, bool)> {
        pool.users
            .iter()
            .map(|user| {
                let excluded =
                    self.resolver
                        .is_excluded(user, pool.program, &pool.state, pool.visit_type);
                (user.clone(), excluded)
            })
            .filter(|(_, excluded)| !(self.state.hide_excluded && *excluded))
            .collect()
    }

    fn toggle_selected(&mut self, all_visits: bool) {
        if self.state.view != View::Pools {
            self.state
                .set_status("Exclusions are toggled per pool; press p for the pool view".to_string());
            return;
        }
        if self.state.focus != Focus::Users {
            self.state
                .set_status("Press Enter to pick a provider first".to_string());
            return;
        }
        let Some(pool) = self.state.current_pool().cloned() else {
            self.state.set_status("No pool selected".to_string());
            return;
        };
        let users = self.visible_users(&pool);
        let Some((name, _)) = users.get(self.state.user_cursor).cloned() else {
            self.state.set_status("No provider selected".to_string());
            return;
        };

        let visit_type = if all_visits { None } else { pool.visit_type };
        let excluded = self
            .resolver
            .toggle(&name, pool.program, &pool.state, visit_type);
        let scope = match visit_type {
            Some(visit_type) => format!("{} · {}", pool.state, visit_type),
            None => format!("{} (all visits)", pool.state),
        };
        let message = if excluded {
            format!("Excluded {name} from {scope}")
        } else {
            format!("Re-included {name} in {scope}")
        };
        self.state.set_status(message);

        let remaining = self.visible_users(&pool).len();
        self.state.clamp_user_cursor(remaining);
    }

    fn export_view(&mut self) -> Result<()> {
        let (view_name, rows) = match self.state.view {
            View::Pools => {
                let mut rows = Vec::new();
                for pool in &self.state.filtered {
                    let mut pool_rows = rows_for_pool(pool, &self.resolver);
                    if self.state.hide_excluded {
                        pool_rows.retain(|row| row.is_excluded != Some(true));
                    }
                    rows.extend(pool_rows);
                }
                ("pools", rows)
            }
            View::Providers => (
                "providers",
                rows_for_providers(&self.state.filtered_providers, &self.resolver),
            ),
        };
        let path = write_export(&self.config.export_dir, self.state.program, view_name, &rows)?;
        self.state.set_status(format!(
            "Exported {} rows to {}",
            rows.len(),
            path.display()
        ));
        Ok(())
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) => self.handle_key(key)?,
            Event::Resize(_, _) => {}
            Event::Mouse(_) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.state.mode {
            Mode::Filter => self.handle_filter_key(key),
            Mode::Browse => self.handle_browse_key(key),
        }
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Browse;
                self.state.set_status("Filter cancelled".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state
                    .set_status(format!("Filter applied: {}", self.state.filter));
            }
            KeyCode::Backspace => {
                self.state.filter.pop();
                self.state.apply_filter();
                self.state
                    .set_status(format!("Filter: {}", self.state.filter));
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    self.state.filter.push(c);
                    self.state.apply_filter();
                    self.state
                        .set_status(format!("Filter: {}", self.state.filter));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Result<()> {
        let in_users = self.state.focus == Focus::Users;
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.loader.refresh();
                self.reload_pools();
                self.state
                    .set_status(format!("Reloaded {} pools", self.state.pools.len()));
            }
            KeyCode::Tab => self.switch_program(self.state.program.other()),
            KeyCode::Char('1') => self.switch_program(Program::ProgramA),
            KeyCode::Char('2') => self.switch_program(Program::ProgramB),
            KeyCode::Char('j') | KeyCode::Down => {
                if in_users {
                    self.move_user_cursor(1);
                } else {
                    self.state.move_cursor(1);
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if in_users {
                    self.move_user_cursor(-1);
                } else {
                    self.state.move_cursor(-1);
                }
            }
            KeyCode::Char('g') if key.modifiers.is_empty() => self.state.move_to(0),
            KeyCode::Char('G') => self.state.move_to_end(),
            KeyCode::Home => self.state.move_to(0),
            KeyCode::End => self.state.move_to_end(),
            KeyCode::PageDown => self.state.page_down(),
            KeyCode::PageUp => self.state.page_up(),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                if self.state.view == View::Pools && self.state.current_pool().is_some() {
                    self.state.focus = Focus::Users;
                    self.state.user_cursor = 0;
                }
            }
            KeyCode::Esc | KeyCode::Left => self.state.focus = Focus::List,
            KeyCode::Char('/') => {
                self.state.mode = Mode::Filter;
                self.state.focus = Focus::List;
                self.state.set_status("Enter filter text".to_string());
            }
            KeyCode::Char('x') => self.toggle_selected(false),
            KeyCode::Char('X') => self.toggle_selected(true),
            KeyCode::Char('h') => {
                self.state.hide_excluded = !self.state.hide_excluded;
                self.state.user_cursor = 0;
                let message = if self.state.hide_excluded {
                    "Hiding excluded providers"
                } else {
                    "Showing excluded providers"
                };
                self.state.set_status(message.to_string());
            }
            KeyCode::Char('p') => {
                self.state.view = match self.state.view {
                    View::Pools => View::Providers,
                    View::Providers => View::Pools,
                };
                self.state.focus = Focus::List;
                self.state.cursor = 0;
                self.state.offset = 0;
            }
            KeyCode::Char('e') => self.export_view()?,
            KeyCode::Char('R') => {
                self.resolver.reset_overrides();
                self.state
                    .set_status("Local exclusions cleared".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn move_user_cursor(&mut self, delta: isize) {
        let Some(pool) = self.state.current_pool() else {
            return;
        };
        let total = self.visible_users(pool).len();
        if total == 0 {
            self.state.user_cursor = 0;
            return;
        }
        let idx = (self.state.user_cursor as isize + delta).clamp(0, total as isize - 1);
        self.state.user_cursor = idx as usize;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(5),
            ])
            .split(size);

        self.render_tabs(frame, chunks[0]);

        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        match self.state.view {
            View::Pools => {
                self.render_pool_list(frame, body_chunks[0]);
                self.render_pool_detail(frame, body_chunks[1]);
            }
            View::Providers => {
                self.render_provider_list(frame, body_chunks[0]);
                self.render_provider_detail(frame, body_chunks[1]);
            }
        }
        self.render_status(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = Program::ALL
            .iter()
            .enumerate()
            .map(|(idx, program)| Line::from(format!("{} {}", idx + 1, self.config.label(*program))))
            .collect();
        let selected = Program::ALL
            .iter()
            .position(|program| *program == self.state.program)
            .unwrap_or(0);
        let view = match self.state.view {
            View::Pools => "Pools",
            View::Providers => "Providers",
        };
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(view))
            .style(Style::default().fg(self.theme.muted))
            .highlight_style(
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_pool_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let height = self.state.list_height;
        let end = (self.state.offset + height).min(self.state.filtered.len());
        let visible = &self.state.filtered[self.state.offset.min(end)..end];

        let mut list_state = ListState::default();
        if !visible.is_empty() {
            list_state.select(Some(
                self.state
                    .cursor
                    .saturating_sub(self.state.offset)
                    .min(visible.len() - 1),
            ));
        }

        let items: Vec<ListItem> = visible
            .iter()
            .enumerate()
            .map(|(idx, pool)| {
                let is_selected = self.state.cursor == self.state.offset + idx;
                let marker = if is_selected {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                let title = Span::styled(
                    pool.display_name(),
                    Style::default()
                        .fg(self.theme.primary_fg)
                        .add_modifier(Modifier::BOLD),
                );
                let count = Span::styled(
                    format!(" ({})", pool.users.len()),
                    Style::default().fg(self.theme.muted),
                );
                let mut line = vec![marker, title, count];
                let excluded = self
                    .resolver
                    .excluded_count_for_pool(pool.program, &pool.state, pool.visit_type);
                if excluded > 0 {
                    line.push(Span::styled(
                        format!(" −{excluded}"),
                        Style::default().fg(self.theme.danger),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let block = Block::default().borders(Borders::ALL).title("Pools");
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_pool_detail(&self, frame: &mut Frame, area: Rect) {
        let Some(pool) = self.state.current_pool() else {
            let message = if self.state.pools.is_empty() {
                "No pools loaded for this program"
            } else {
                "No pools match the filter"
            };
            let paragraph = Paragraph::new(message)
                .block(Block::default().borders(Borders::ALL).title("Providers"));
            frame.render_widget(paragraph, area);
            return;
        };

        let users = self.visible_users(pool);
        let focused = self.state.focus == Focus::Users;
        let items: Vec<ListItem> = users
            .iter()
            .enumerate()
            .map(|(idx, (name, excluded))| {
                let marker = if focused && idx == self.state.user_cursor {
                    Span::styled("▶ ", Style::default().fg(self.theme.accent))
                } else {
                    Span::raw("  ")
                };
                let name_style = if *excluded {
                    Style::default()
                        .fg(self.theme.muted)
                        .add_modifier(Modifier::CROSSED_OUT)
                } else {
                    Style::default().fg(self.theme.primary_fg)
                };
                let mut line = vec![marker, Span::styled(name.clone(), name_style)];
                if *excluded {
                    line.push(Span::styled(
                        " [excluded]",
                        Style::default().fg(self.theme.danger),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let mut list_state = ListState::default();
        if focused && !users.is_empty() {
            list_state.select(Some(self.state.user_cursor.min(users.len() - 1)));
        }

        let title = format!("{} · {} providers", pool.display_name(), pool.users.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_provider_list(&mut self, frame: &mut Frame, area: Rect) {
        self.state.list_height = area.height.saturating_sub(2) as usize;
        self.state.clamp_cursor();
        self.state.ensure_cursor_visible();

        let height = self.state.list_height;
        let end = (self.state.offset + height).min(self.state.filtered_providers.len());
        let visible = &self.state.filtered_providers[self.state.offset.min(end)..end];

        let mut list_state = ListState::default();
        if !visible.is_empty() {
            list_state.select(Some(
                self.state
                    .cursor
                    .saturating_sub(self.state.offset)
                    .min(visible.len() - 1),
            ));
        }

        let items: Vec<ListItem> = visible
            .iter()
            .map(|provider| {
                let excluded = self.resolver.is_excluded_anywhere(&provider.name);
                let mut line = vec![
                    Span::styled(
                        provider.name.clone(),
                        Style::default().fg(self.theme.primary_fg),
                    ),
                    Span::styled(
                        format!(" · {} states", provider.states().len()),
                        Style::default().fg(self.theme.muted),
                    ),
                ];
                if excluded {
                    line.push(Span::styled(
                        " [excluded]",
                        Style::default().fg(self.theme.danger),
                    ));
                }
                ListItem::new(Line::from(line))
            })
            .collect();

        let title = format!("Providers ({})", self.state.providers.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_provider_detail(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Assignments");
        let Some(provider) = self.state.current_provider() else {
            frame.render_widget(Paragraph::new("No providers available").block(block), area);
            return;
        };

        let mut lines = vec![Line::from(Span::styled(
            provider.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        let (label, colour) = if self.resolver.is_excluded_anywhere(&provider.name) {
            ("Excluded somewhere: yes", self.theme.danger)
        } else {
            ("Excluded somewhere: no", self.theme.success)
        };
        lines.push(Line::from(Span::styled(label, Style::default().fg(colour))));
        lines.push(Line::from(""));

        for assignment in &provider.assignments {
            let scope = match assignment.visit_type {
                Some(visit_type) => format!("{} · {}", assignment.state, visit_type),
                None => assignment.state.clone(),
            };
            let excluded = self.resolver.is_excluded(
                &provider.name,
                self.state.program,
                &assignment.state,
                assignment.visit_type,
            );
            let mut spans = vec![Span::raw(format!("  {scope}"))];
            if excluded {
                spans.push(Span::styled(
                    " [excluded]",
                    Style::default().fg(self.theme.danger),
                ));
            }
            lines.push(Line::from(spans));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Filter {
            format!("Filter: {}", self.state.filter)
        } else {
            self.state.status.clone()
        };
        let summary = ProgramSummary::compute(self.state.program, &self.state.pools, &self.resolver);
        let secondary = format!(
            "Pools: {}  States: {}  Providers: {}  Exclusion entries: {}  Local: {}{}",
            summary.pools,
            summary.states,
            summary.providers,
            summary.excluded,
            self.resolver.overrides().len(),
            if self.state.hide_excluded {
                "  (excluded hidden)"
            } else {
                ""
            }
        );
        let help = Line::from(Span::styled(
            "Tab program · / filter · Enter select · x/X exclude · h hide · p providers · e export · R reset · q quit",
            Style::default().fg(self.theme.muted),
        ));
        let paragraph = Paragraph::new(vec![Line::from(primary), Line::from(secondary), help])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
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
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

struct UiState {
    program: Program,
    view: View,
    focus: Focus,
    mode: Mode,
    pools: Vec<ResourcePool>,
    filtered: Vec<ResourcePool>,
    providers: ProviderIndex,
    filtered_providers: Vec<ProviderEntry>,
    cursor: usize,
    offset: usize,
    list_height: usize,
    user_cursor: usize,
    filter: String,
    status: String,
    hide_excluded: bool,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            program: Program::ProgramA,
            view: View::Pools,
            focus: Focus::List,
            mode: Mode::Browse,
            pools: Vec::new(),
            filtered: Vec::new(),
            providers: ProviderIndex::default(),
            filtered_providers: Vec::new(),
            cursor: 0,
            offset: 0,
            list_height: 1,
            user_cursor: 0,
            filter: String::new(),
            status: "Ready".to_string(),
            hide_excluded: false,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_pools(&mut self, pools: Vec<ResourcePool>) {
        self.providers = ProviderIndex::build(&pools);
        self.pools = pools;
    }

    fn apply_filter(&mut self) {
        let needle = self.filter.trim().to_lowercase();
        if needle.is_empty() {
            self.filtered = self.pools.clone();
        } else {
            self.filtered = self
                .pools
                .iter()
                .filter(|pool| pool_matches(pool, &needle))
                .cloned()
                .collect();
        }
        self.filtered_providers = self.providers.matching(&needle).into_iter().cloned().collect();
        self.cursor = 0;
        self.offset = 0;
        self.user_cursor = 0;
    }

    fn list_len(&self) -> usize {
        match self.view {
            View::Pools => self.filtered.len(),
            View::Providers => self.filtered_providers.len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.user_cursor = 0;
        self.ensure_cursor_visible();
    }

    fn move_to(&mut self, index: usize) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.user_cursor = 0;
        self.ensure_cursor_visible();
    }

    fn move_to_end(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        self.move_to(len - 1);
    }

    fn page_down(&mut self) {
        if self.list_len() == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.list_len());
        self.move_cursor(delta as isize);
    }

    fn page_up(&mut self) {
        if self.list_len() == 0 || self.list_height == 0 {
            return;
        }
        let delta = self.list_height.min(self.list_len());
        self.move_cursor(-(delta as isize));
    }

    fn current_pool(&self) -> Option<&ResourcePool> {
        match self.view {
            View::Pools => self.filtered.get(self.cursor),
            View::Providers => None,
        }
    }

    fn current_provider(&self) -> Option<&ProviderEntry> {
        match self.view {
            View::Providers => self.filtered_providers.get(self.cursor),
            View::Pools => None,
        }
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn clamp_cursor(&mut self) {
        let len = self.list_len();
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn clamp_user_cursor(&mut self, total: usize) {
        if total == 0 {
            self.user_cursor = 0;
        } else if self.user_cursor >= total {
            self.user_cursor = total - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        let len = self.list_len();
        if len == 0 || self.list_height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.list_height;
        let max_offset = len.saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }
}
