//! Terminal front end for the configuration wizards.
//!
//! Layout:
//! - Centered window titled with the flow and its header ("New S3 Connection")
//! - Left banner panel with the step trail
//! - Main content panel rendered from the current step's view-model
//! - Bottom button row from the step schema, e.g. [ Back ] [ Next ] [ Cancel ]
//! - Modal confirmations (Cancel, overwrite) and a file/folder browser
//!
//! Backend calls run on the tokio runtime and come back over an mpsc channel tagged with
//! the navigator generation. Logging is file-only while the terminal is in raw mode.

use crate::api::Backend;
use crate::i18n::Messages;
use crate::models::cluster::ShimIdentifier;
use crate::models::context::{
    FlowKind, LaunchParams, ModeKind, SaveOutcome, SecurityType, WizardContext,
};
use crate::models::files::StagedFile;
use crate::models::test_results::{TestCategory, TestOutcome, TestStatus};
use crate::wizard::browse::{browse_kind, start_dir, BrowseKind, FsPicker, PathEntry, PathPicker};
use crate::wizard::form::FieldId;
use crate::wizard::navigator::{Navigator, Prompt};
use crate::wizard::render::{display_value, overall_line, result_rows, summary_rows, ResultLine, StatusIcon};
use crate::wizard::requests::{execute, PendingRequest, Reply};
use crate::wizard::schema::{self, ButtonAction, StepId};
use crate::wizard::steps::MessageKind;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, info};
use ratatui::backend::{Backend as _, CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// One focusable row of the content panel or the button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Selector(ModeKind),
    Shim(FieldId),
    Field(FieldId),
    Jump(StepId),
    Button(ButtonAction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel {
        yes: bool,
    },
    Message {
        title: String,
        body: String,
    },
    Browse {
        field: FieldId,
        kind: BrowseKind,
        current: PathBuf,
        entries: Vec<PathEntry>,
        selected: usize,
    },
}

enum UiMsg {
    Reply(Reply),
}

/// Runs requests on the runtime and reports back over the UI channel.
struct Spawner {
    handle: Handle,
    backend: Backend,
    tx: mpsc::Sender<UiMsg>,
}

impl Spawner {
    fn spawn(&self, pending: Option<PendingRequest>) {
        let Some(pending) = pending else {
            return;
        };
        let backend = self.backend.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let reply = execute(pending, &backend).await;
            let _ = tx.send(UiMsg::Reply(reply));
        });
    }
}

struct TuiState {
    nav: Navigator,
    focus: usize,
    modal: Option<Modal>,
    quit: bool,
}

impl TuiState {
    fn new(nav: Navigator) -> Self {
        Self {
            nav,
            focus: 0,
            modal: None,
            quit: false,
        }
    }

    fn messages(&self) -> &Messages {
        self.nav.messages()
    }
}

/// Everything needed to start an interactive run.
pub struct TuiOptions {
    pub ctx: WizardContext,
    pub entry: Option<StepId>,
    pub backend: Backend,
    pub messages: Arc<Messages>,
    pub runtime: Handle,
}

pub fn run(opts: TuiOptions) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: start] Starting {:?} wizard ({})",
        opts.ctx.flow,
        opts.ctx.flow_type.as_str()
    );

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, opts);
    restore_terminal(&mut terminal)?;

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, opts: TuiOptions) -> Result<()> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let (tx, rx) = mpsc::channel::<UiMsg>();
    let spawner = Spawner {
        handle: opts.runtime,
        backend: opts.backend,
        tx,
    };

    let mut state = TuiState::new(Navigator::new(opts.ctx, opts.entry, opts.messages));
    let first = state.nav.start();
    spawner.spawn(first);

    while !state.quit {
        drain_messages(&mut state, &rx, &spawner);
        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut state, key.code, &spawner);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

fn drain_messages(state: &mut TuiState, rx: &mpsc::Receiver<UiMsg>, spawner: &Spawner) {
    while let Ok(msg) = rx.try_recv() {
        match msg {
            UiMsg::Reply(reply) => {
                let before = state.nav.step();
                let next = state.nav.finish(reply);
                if state.nav.step() != before {
                    state.focus = 0;
                }
                spawner.spawn(next);
            }
        }
    }
}

fn items(nav: &Navigator) -> Vec<Item> {
    let view = nav.view();
    let mut out: Vec<Item> = view.selectors().iter().copied().map(Item::Selector).collect();
    for f in view.visible_fields() {
        if matches!(f, FieldId::ShimVendor | FieldId::ShimVersion) {
            out.push(Item::Shim(f));
        } else {
            out.push(Item::Field(f));
        }
    }
    if view.step == StepId::Summary {
        out.push(Item::Jump(StepId::Intro));
        out.push(Item::Jump(StepId::Details));
    }
    out.extend(nav.buttons().into_iter().map(|b| Item::Button(b.action)));
    out
}

fn focused_item(state: &TuiState) -> Option<Item> {
    let all = items(&state.nav);
    if all.is_empty() {
        return None;
    }
    all.get(state.focus.min(all.len() - 1)).copied()
}

/// Fields whose value comes from a staged file and cannot be typed.
fn browse_only(field: FieldId) -> bool {
    matches!(
        field,
        FieldId::ImportPath | FieldId::KeytabAuthFile | FieldId::KeytabImpFile | FieldId::DriverPath
    )
}

fn handle_key(state: &mut TuiState, code: KeyCode, spawner: &Spawner) {
    if let Some(modal) = state.modal.take() {
        handle_modal_key(state, modal, code);
        return;
    }

    if state.nav.prompt().is_some() {
        match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let next = state.nav.confirm_overwrite();
                spawner.spawn(next);
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => state.nav.dismiss_prompt(),
            _ => {}
        }
        return;
    }

    let before = state.nav.step();
    let count = items(&state.nav).len().max(1);
    let item = focused_item(state);

    match code {
        KeyCode::Esc => {
            state.modal = Some(Modal::ConfirmCancel { yes: false });
        }
        KeyCode::F(1) => {
            let help = state.nav.help();
            spawner.spawn(Some(help));
            let m = state.messages();
            state.modal = Some(Modal::Message {
                title: m.get(state.nav.step().title_key()),
                body: m.get("tui.help.requested"),
            });
        }
        KeyCode::Tab | KeyCode::Down => state.focus = (state.focus + 1) % count,
        KeyCode::BackTab | KeyCode::Up => state.focus = (state.focus + count - 1) % count,
        KeyCode::Left | KeyCode::Right => {
            let forward = code == KeyCode::Right;
            match item {
                Some(Item::Selector(kind)) => cycle_mode(state, kind, forward),
                Some(Item::Shim(field)) => cycle_shim(state, field, forward),
                Some(Item::Button(_)) => {
                    state.focus = if forward {
                        (state.focus + 1) % count
                    } else {
                        (state.focus + count - 1) % count
                    };
                }
                _ => {}
            }
        }
        KeyCode::Enter => match item {
            Some(Item::Button(action)) => {
                let next = state.nav.press(action);
                spawner.spawn(next);
            }
            Some(Item::Jump(step)) => {
                let next = state.nav.jump(step);
                spawner.spawn(next);
            }
            Some(Item::Field(field)) if field.is_path() => open_browse(state, field),
            Some(Item::Selector(kind)) => cycle_mode(state, kind, true),
            _ => state.focus = (state.focus + 1) % count,
        },
        KeyCode::Char(c) => {
            if let Some(Item::Field(field)) = item {
                if !browse_only(field) {
                    let mut value = state.nav.view().value(field).to_string();
                    value.push(c);
                    state.nav.set_field(field, value);
                }
            }
        }
        KeyCode::Backspace => {
            if let Some(Item::Field(field)) = item {
                if !browse_only(field) {
                    let mut value = state.nav.view().value(field).to_string();
                    value.pop();
                    state.nav.set_field(field, value);
                }
            }
        }
        _ => {}
    }

    if state.nav.step() != before {
        state.focus = 0;
    }
    if state.nav.is_closed() {
        state.quit = true;
    }
}

fn cycle_mode(state: &mut TuiState, kind: ModeKind, forward: bool) {
    let options = kind.options();
    let current = state.nav.view().modes().get(kind);
    let idx = options.iter().position(|m| *m == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % options.len()
    } else {
        (idx + options.len() - 1) % options.len()
    };
    state.nav.select_mode(options[next]);
}

fn cycle_shim(state: &mut TuiState, field: FieldId, forward: bool) {
    let view = state.nav.view();
    let options = if field == FieldId::ShimVendor {
        view.shim_vendors()
    } else {
        view.shim_versions()
    };
    if options.is_empty() {
        return;
    }
    let current = view.value(field).to_string();
    let next = match options.iter().position(|o| *o == current) {
        Some(i) if forward => (i + 1) % options.len(),
        Some(i) => (i + options.len() - 1) % options.len(),
        None => 0,
    };
    let choice = options[next].clone();
    if field == FieldId::ShimVendor {
        state.nav.select_shim_vendor(&choice);
    } else {
        state.nav.select_shim_version(&choice);
    }
}

fn open_browse(state: &mut TuiState, field: FieldId) {
    let current = start_dir(state.nav.view().value(field));
    match FsPicker.entries(&current) {
        Ok(entries) => {
            state.modal = Some(Modal::Browse {
                field,
                kind: browse_kind(field),
                current,
                entries,
                selected: 0,
            });
        }
        Err(e) => state.nav.apply_browse(field, Err(e)),
    }
}

fn handle_modal_key(state: &mut TuiState, modal: Modal, code: KeyCode) {
    match modal {
        Modal::ConfirmCancel { yes } => match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                state.modal = Some(Modal::ConfirmCancel { yes: !yes });
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                state.nav.cancel();
                state.quit = true;
            }
            KeyCode::Enter if yes => {
                state.nav.cancel();
                state.quit = true;
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {}
            _ => state.modal = Some(Modal::ConfirmCancel { yes }),
        },
        Modal::Message { .. } => match code {
            KeyCode::Enter | KeyCode::Esc => {}
            _ => state.modal = Some(modal),
        },
        Modal::Browse {
            field,
            kind,
            current,
            entries,
            selected,
        } => {
            let reopen = |current: PathBuf, entries: Vec<PathEntry>, selected: usize| Modal::Browse {
                field,
                kind,
                current,
                entries,
                selected,
            };
            match code {
                KeyCode::Esc => {}
                KeyCode::Up => {
                    state.modal = Some(reopen(current, entries, selected.saturating_sub(1)));
                }
                KeyCode::Down => {
                    let last = entries.len().saturating_sub(1);
                    state.modal = Some(reopen(current, entries, (selected + 1).min(last)));
                }
                KeyCode::Backspace => {
                    let parent = current.parent().map(|p| p.to_path_buf()).unwrap_or(current);
                    match FsPicker.entries(&parent) {
                        Ok(list) => state.modal = Some(reopen(parent, list, 0)),
                        Err(e) => state.nav.apply_browse(field, Err(e)),
                    }
                }
                KeyCode::Char('s') | KeyCode::Char('S') if kind == BrowseKind::Folder => {
                    state.nav.apply_browse(field, Ok(current));
                }
                KeyCode::Enter => match entries.get(selected).cloned() {
                    Some(entry) if entry.is_dir => match FsPicker.entries(&entry.path) {
                        Ok(list) => state.modal = Some(reopen(entry.path, list, 0)),
                        Err(e) => state.nav.apply_browse(field, Err(e)),
                    },
                    Some(entry) if kind == BrowseKind::File => {
                        state.nav.apply_browse(field, Ok(entry.path));
                    }
                    _ => state.modal = Some(reopen(current, entries, selected)),
                },
                _ => state.modal = Some(reopen(current, entries, selected)),
            }
        }
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, state: &TuiState) {
    let (window_area, _) = centered_window(area, 100, 30);
    let m = state.messages();
    let ctx = state.nav.context();

    let title = format!(
        "{} {}",
        m.get(&ctx.header_key()),
        m.get(ctx.flow.title_key())
    );
    let outer_block = Block::default().borders(Borders::ALL).title(title);
    f.render_widget(outer_block, window_area);

    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(inner);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Min(0)].as_ref())
        .split(rows[0]);

    draw_banner(f, cols[0], state);

    let content_block = Block::default()
        .borders(Borders::ALL)
        .title(m.get(state.nav.step().title_key()));
    let content = Paragraph::new(Text::from(content_lines(state)))
        .block(content_block)
        .wrap(Wrap { trim: false });
    f.render_widget(content, cols[1]);

    draw_buttons(f, rows[1], state);

    if let Some(Prompt::Overwrite { name, .. }) = state.nav.prompt() {
        draw_confirm_modal(
            f,
            window_area,
            &m.get("overwrite.title"),
            &m.format("overwrite.message", &[name.as_str()]),
            m,
        );
    }

    match &state.modal {
        Some(Modal::ConfirmCancel { yes }) => draw_cancel_modal(f, window_area, *yes, m),
        Some(Modal::Message { title, body }) => draw_message_modal(f, window_area, title, body, m),
        Some(Modal::Browse {
            current,
            entries,
            selected,
            kind,
            ..
        }) => draw_browse_modal(f, window_area, current, entries, *selected, *kind, m),
        None => {}
    }
}

/// Step trail for the flow, current step highlighted.
fn trail(ctx: &WizardContext) -> Vec<StepId> {
    match ctx.flow {
        FlowKind::S3 | FlowKind::Catalog => {
            vec![StepId::Intro, StepId::Details, StepId::Summary, StepId::Saved]
        }
        FlowKind::HadoopCluster => {
            let mut steps = vec![schema::entry_step(ctx.flow, ctx.flow_type)];
            if ctx.secure_enabled {
                steps.push(StepId::Security);
                match ctx.modes.security {
                    SecurityType::Kerberos => steps.push(StepId::Kerberos),
                    SecurityType::Knox => steps.push(StepId::Knox),
                    SecurityType::None => {}
                }
            }
            steps.extend([StepId::Status, StepId::Results]);
            steps
        }
        FlowKind::Driver => vec![StepId::AddDriver, StepId::DriverResult],
    }
}

fn draw_banner(f: &mut ratatui::Frame<'_>, area: Rect, state: &TuiState) {
    let m = state.messages();
    let current = state.nav.step();
    let mut lines = vec![Line::from(""), Line::from("")];
    for step in trail(state.nav.context()) {
        let marker = if step == current { "> " } else { "  " };
        let style = if step == current {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}", marker, m.get(step.title_key())),
            style,
        )));
    }
    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn icon_span(icon: StatusIcon) -> Span<'static> {
    let color = match icon {
        StatusIcon::Pass => Color::Green,
        StatusIcon::Warning => Color::Yellow,
        StatusIcon::Fail => Color::Red,
    };
    Span::styled(icon.glyph().to_string(), Style::default().fg(color))
}

fn result_line(line: &ResultLine, indent: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw(indent.to_string()),
        icon_span(line.icon),
        Span::raw(format!(" {}", line.text)),
    ])
}

fn content_lines(state: &TuiState) -> Vec<Line<'static>> {
    let nav = &state.nav;
    let view = nav.view();
    let m = state.messages();
    let all = items(nav);
    let focus = state.focus.min(all.len().saturating_sub(1));
    let required = view.rule().fields();
    let mut lines: Vec<Line<'static>> = Vec::new();

    match view.step {
        StepId::Summary => {
            lines.push(Line::from(m.get("tui.summary.title")));
            lines.push(Line::from(""));
            for row in summary_rows(nav.context(), m) {
                lines.push(Line::from(format!("  {:<28} {}", row.label, row.value)));
            }
            lines.push(Line::from(""));
        }
        StepId::Results => {
            let results = &nav.context().test_results;
            lines.push(result_line(&overall_line(results, m), ""));
            lines.push(Line::from(""));
            for row in result_rows(results, m) {
                lines.push(result_line(&row.category, "  "));
                for t in &row.tests {
                    lines.push(result_line(t, "      "));
                }
            }
            lines.push(Line::from(""));
        }
        _ => {}
    }

    for (i, item) in all.iter().enumerate() {
        let focused = i == focus;
        match item {
            Item::Selector(kind) => {
                let option = m.get(view.modes().get(*kind).label_key());
                lines.push(Line::from(vec![
                    Span::raw(format!("{:<28} ", m.get(kind.label_key()))),
                    Span::styled(format!("< {} >", option), focus_style(focused)),
                ]));
            }
            Item::Shim(field) => {
                lines.push(Line::from(vec![
                    Span::raw(format!("{:<28} ", m.get(field.label_key()))),
                    Span::styled(format!("< {} >", view.value(*field)), focus_style(focused)),
                ]));
            }
            Item::Field(field) => {
                let marker = if required.contains(field) { "*" } else { " " };
                let mut value = display_value(*field, view.value(*field));
                if field.is_path() {
                    value.push_str(" [...]");
                }
                lines.push(Line::from(vec![
                    Span::raw(format!("{:<27}{} ", m.get(field.label_key()), marker)),
                    Span::styled(format!("{:<30}", value), focus_style(focused)),
                ]));
            }
            Item::Jump(step) => {
                lines.push(Line::from(Span::styled(
                    format!("  > {}", m.get(step.title_key())),
                    focus_style(focused),
                )));
            }
            Item::Button(_) => {}
        }
    }

    let bad_ports = view.invalid_ports();
    if !bad_ports.is_empty() {
        let names: Vec<String> = bad_ports.iter().map(|f| m.get(f.label_key())).collect();
        lines.push(Line::from(Span::styled(
            m.format("error.invalid.port", &[names.join(", ").as_str()]),
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(""));
    if nav.is_waiting() || view.step.submits_on_entry() {
        lines.push(Line::from(Span::styled(
            m.get("tui.waiting"),
            Style::default().fg(Color::Cyan),
        )));
    }
    if let Some(msg) = &view.message {
        let color = match msg.kind {
            MessageKind::Success => Color::Green,
            MessageKind::Info => Color::Cyan,
            MessageKind::Error => Color::Red,
        };
        lines.push(Line::from(Span::styled(
            msg.text.clone(),
            Style::default().fg(color),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        m.get("tui.hint"),
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

fn centered_window(area: Rect, width: u16, height: u16) -> (Rect, Rect) {
    let w = width.min(area.width.saturating_sub(2)).max(60);
    let h = height.min(area.height.saturating_sub(2)).max(20);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let rect = Rect {
        x,
        y,
        width: w.min(area.width),
        height: h.min(area.height),
    };
    (rect, rect)
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, state: &TuiState) {
    let m = state.messages();
    let focused = focused_item(state);
    let mut spans = Vec::new();
    for b in state.nav.buttons() {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(button_text(
            &m.get(b.label_key),
            focused == Some(Item::Button(b.action)),
            state.nav.is_enabled(b.action),
        ));
    }
    let p = Paragraph::new(Text::from(Line::from(spans))).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(window_area.width.saturating_sub(4)).max(40);
    let h = height.min(window_area.height.saturating_sub(4)).max(7);
    Rect {
        x: window_area.x + (window_area.width.saturating_sub(w)) / 2,
        y: window_area.y + (window_area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn modal_buttons_area(area: Rect) -> Rect {
    Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    }
}

fn clear(f: &mut ratatui::Frame<'_>, area: Rect) {
    f.render_widget(ratatui::widgets::Clear, area);
}

fn draw_cancel_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, yes: bool, m: &Messages) {
    let area = modal_area(window_area, 56, 7);
    clear(f, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(m.get("tui.cancel.title"));
    let body = Paragraph::new(Text::from(vec![
        Line::from(m.get("tui.cancel.message")),
        Line::from(""),
    ]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    let line = Line::from(vec![
        Span::styled(format!("[ {} ]", m.get("controls.yes.label")), focus_style(yes)),
        Span::raw(" "),
        Span::styled(format!("[ {} ]", m.get("controls.no.label")), focus_style(!yes)),
    ]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_confirm_modal(
    f: &mut ratatui::Frame<'_>,
    window_area: Rect,
    title: &str,
    body: &str,
    m: &Messages,
) {
    let area = modal_area(window_area, 64, 8);
    clear(f, area);
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let p = Paragraph::new(Text::from(body.to_string()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);

    let line = Line::from(vec![
        Span::styled(format!("[ {} ]", m.get("controls.yes.label")), focus_style(true)),
        Span::raw(" "),
        Span::raw(format!("[ {} ]", m.get("controls.no.label"))),
    ]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_message_modal(
    f: &mut ratatui::Frame<'_>,
    window_area: Rect,
    title: &str,
    body: &str,
    m: &Messages,
) {
    let area = modal_area(window_area, 70, 10);
    clear(f, area);
    let block = Block::default().borders(Borders::ALL).title(title.to_string());
    let p = Paragraph::new(Text::from(body.to_string()))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);

    let ok = Span::styled(format!("[ {} ]", m.get("controls.ok.label")), focus_style(true));
    let p = Paragraph::new(Text::from(Line::from(vec![ok]))).alignment(Alignment::Right);
    f.render_widget(p, modal_buttons_area(area));
}

fn draw_browse_modal(
    f: &mut ratatui::Frame<'_>,
    window_area: Rect,
    current: &std::path::Path,
    entries: &[PathEntry],
    selected: usize,
    kind: BrowseKind,
    m: &Messages,
) {
    let area = modal_area(window_area, 78, 16);
    clear(f, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(m.get("tui.browse.title"));
    f.render_widget(block, area);

    let inner = area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)].as_ref())
        .split(inner);

    let mut hint = m.get("tui.browse.hint");
    if kind == BrowseKind::Folder {
        hint.push_str(&format!("  S: {}", m.get("controls.select.label")));
    }
    let header = Paragraph::new(Text::from(vec![
        Line::from(current.to_string_lossy().to_string()),
        Line::from(hint),
    ]))
    .wrap(Wrap { trim: true });
    f.render_widget(header, rows[0]);

    let list_height = rows[1].height as usize;
    let start = selected.saturating_sub(list_height / 2);
    let end = (start + list_height).min(entries.len());

    let mut lines: Vec<Line> = Vec::new();
    for (i, e) in entries.iter().enumerate().take(end).skip(start) {
        let name = if e.is_dir {
            format!("{}/", e.name)
        } else {
            e.name.clone()
        };
        lines.push(Line::from(Span::styled(name, focus_style(i == selected))));
    }
    f.render_widget(Paragraph::new(Text::from(lines)), rows[1]);
}

/// Render one frame into an in-memory terminal and return its text.
fn render_frame(state: &TuiState) -> Result<String> {
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|f| draw(f.size(), f, state))?;
    let size = terminal.backend().size()?;
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..size.height {
        for x in 0..size.width {
            out.push_str(buffer.get(x, y).symbol());
        }
        out.push('\n');
    }
    Ok(out)
}

fn smoke_flow(step: StepId) -> FlowKind {
    match step {
        StepId::Intro | StepId::Details | StepId::Summary | StepId::Saved => FlowKind::S3,
        StepId::AddDriver | StepId::Installing | StepId::DriverResult => FlowKind::Driver,
        _ => FlowKind::HadoopCluster,
    }
}

/// A navigator parked on `step` with sample values. Smoke runs only; no requests are sent.
fn smoke_navigator(step: StepId) -> Navigator {
    let flow = smoke_flow(step);
    let import = step == StepId::Import;
    let mut ctx = WizardContext::launched(flow, import, LaunchParams::default());
    ctx.shims = vec![ShimIdentifier {
        id: "cdp71".into(),
        vendor: "Cloudera".into(),
        version: "7.1".into(),
    }];
    ctx.secure_enabled = true;
    let sample = [
        (FieldId::Name, "analytics"),
        (FieldId::Description, "Shared data lake"),
        (FieldId::AccessKey, "AKIAEXAMPLE"),
        (FieldId::SecretKey, "wJalrXUtnFEMI"),
        (FieldId::Region, "us-east-1"),
        (FieldId::ShimVendor, "Cloudera"),
        (FieldId::ShimVersion, "7.1"),
        (FieldId::HdfsHost, "namenode.example.com"),
        (FieldId::KerberosAuthUsername, "hdfs@EXAMPLE.COM"),
        (FieldId::KerberosAuthPassword, "secret"),
    ];
    for (f, v) in sample {
        ctx.model.set(f, v);
    }
    match step {
        StepId::Kerberos => ctx.modes.security = SecurityType::Kerberos,
        StepId::Knox => ctx.modes.security = SecurityType::Knox,
        StepId::Status => {
            ctx.save_outcome = Some(SaveOutcome {
                name: "analytics".into(),
                success: true,
            })
        }
        StepId::Results => {
            let test = |name: &str, status| TestOutcome {
                test_name: name.into(),
                test_status: status,
                test_active: true,
            };
            ctx.test_results = vec![
                TestCategory {
                    category_name: "Hadoop File System".into(),
                    category_status: Some(TestStatus::Pass),
                    category_active: true,
                    tests: vec![test("Ping file system entry point", Some(TestStatus::Pass))],
                },
                TestCategory {
                    category_name: "Oozie".into(),
                    category_status: None,
                    category_active: false,
                    tests: Vec::new(),
                },
                TestCategory {
                    category_name: "Zookeeper Connection".into(),
                    category_status: Some(TestStatus::Warning),
                    category_active: true,
                    tests: vec![test("Ping Zookeeper ensemble", Some(TestStatus::Warning))],
                },
            ];
        }
        StepId::DriverResult => ctx.driver_installed = Some(true),
        StepId::AddDriver => ctx
            .files
            .set_driver(Some(StagedFile::new("hdp31.kar", vec![0], None))),
        _ => {}
    }
    Navigator::new(ctx, Some(step), Arc::new(Messages::builtin()))
}

/// Non-interactive single-frame render of one step.
pub fn smoke(target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );
    let step = StepId::parse(target).unwrap_or(StepId::Intro);
    let state = TuiState::new(smoke_navigator(step));
    let frame = render_frame(&state)?;
    debug!(
        "[PHASE: tui] [STEP: smoke] Rendered {} line(s) for {}",
        frame.lines().count(),
        step.as_str()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_for(step: StepId) -> String {
        render_frame(&TuiState::new(smoke_navigator(step))).expect("render")
    }

    #[test]
    fn every_step_renders() {
        for step in StepId::ALL {
            assert!(smoke(step.as_str()).is_ok(), "{} failed to render", step.as_str());
        }
    }

    #[test]
    fn secrets_are_masked_on_screen() {
        let frame = frame_for(StepId::Details);
        assert!(!frame.contains("wJalrXUtnFEMI"), "Secret key leaked:\n{}", frame);
        assert!(frame.contains("*************"));
        assert!(frame.contains("AKIAEXAMPLE"));
    }

    #[test]
    fn summary_lists_entered_values() {
        let frame = frame_for(StepId::Summary);
        assert!(frame.contains("analytics"));
        assert!(frame.contains("N/A"), "Blank session token should read N/A");
    }

    #[test]
    fn results_mark_skipped_categories() {
        let frame = frame_for(StepId::Results);
        assert!(frame.contains("Oozie (skipped)"), "Got:\n{}", frame);
        let hadoop = frame.find("Hadoop File System").expect("hadoop row");
        let zk = frame.find("Zookeeper Connection").expect("zk row");
        assert!(hadoop < zk, "Hadoop results come first");
    }

    #[test]
    fn disabled_next_is_shown_for_incomplete_steps() {
        let state = TuiState::new(smoke_navigator(StepId::Knox));
        assert!(!state.nav.is_enabled(ButtonAction::Next));
        assert!(render_frame(&state).expect("render").contains("[ Next ]"));
    }

    #[test]
    fn typing_edits_the_focused_field() {
        let (tx, _rx) = mpsc::channel();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let spawner = Spawner {
            handle: rt.handle().clone(),
            backend: crate::api::Backend::http(
                &crate::config::WizardSettings::load_from(None, false, "CW_TEST_TUI")
                    .expect("settings"),
            )
            .expect("backend"),
            tx,
        };
        let mut state = TuiState::new(smoke_navigator(StepId::Knox));
        for c in "gw".chars() {
            handle_key(&mut state, KeyCode::Char(c), &spawner);
        }
        assert_eq!(state.nav.view().value(FieldId::GatewayUrl), "gw");

        handle_key(&mut state, KeyCode::Backspace, &spawner);
        assert_eq!(state.nav.view().value(FieldId::GatewayUrl), "g");

        handle_key(&mut state, KeyCode::Esc, &spawner);
        assert!(matches!(state.modal, Some(Modal::ConfirmCancel { yes: false })));
        handle_key(&mut state, KeyCode::Char('y'), &spawner);
        assert!(state.quit);
    }
}
