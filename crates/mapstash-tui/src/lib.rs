// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use mapstash_app::{
    DeleteOutcome, Item, ItemCollection, ItemId, ItemStore, ListCommand, ListViewState, Notice,
    NotifyPort, Region, address_link, place_link, visible_items,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use tracing::{debug, info};

const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const CITY_CHIP_KEYS: [char; 3] = ['!', '@', '#'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Browse,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    input_mode: InputMode,
    cursor: usize,
    pending_delete: Option<ItemId>,
    reload_pending: bool,
    status_token: u64,
}

#[derive(Debug, Default)]
struct StatusNotices {
    messages: Vec<String>,
}

impl NotifyPort for StatusNotices {
    fn notify(&mut self, notice: &Notice) {
        self.messages.push(notice.message());
    }
}

pub fn run_app<C: ItemCollection>(
    view: &mut ListViewState,
    store: &mut ItemStore<C>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    start_reload(view, &mut view_data);

    let mut result = Ok(());
    loop {
        process_internal_events(view, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, view, store.items(), &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        // The frame above showed the loading title; load now and redraw.
        if view_data.reload_pending {
            finish_reload(view, store, &mut view_data, &internal_tx);
            continue;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(view, store, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    view: &mut ListViewState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view.dispatch(ListCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view: &mut ListViewState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view.dispatch(ListCommand::SetStatus(message.into()));
    bump_status_token(view_data, internal_tx);
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn start_reload(view: &mut ListViewState, view_data: &mut ViewData) {
    view.dispatch(ListCommand::LoadStarted);
    view_data.reload_pending = true;
}

fn finish_reload<C: ItemCollection>(
    view: &mut ListViewState,
    store: &mut ItemStore<C>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if !std::mem::take(&mut view_data.reload_pending) {
        return;
    }
    match store.load() {
        Ok(count) => {
            view.dispatch(ListCommand::LoadSucceeded);
            debug!(count, "list refreshed");
            emit_status(view, view_data, internal_tx, format!("loaded {count} places"));
        }
        Err(error) => {
            let message = format!("{:#}", anyhow::Error::new(error));
            view.dispatch(ListCommand::LoadFailed(message));
        }
    }
    clamp_cursor(view, store.items(), view_data);
}

fn clamp_cursor(view: &ListViewState, items: &[Item], view_data: &mut ViewData) {
    let visible = visible_items(items, view).len();
    view_data.cursor = view_data.cursor.min(visible.saturating_sub(1));
}

fn selected_item<'a>(
    view: &ListViewState,
    items: &'a [Item],
    view_data: &ViewData,
) -> Option<&'a Item> {
    visible_items(items, view).get(view_data.cursor).copied()
}

fn handle_key_event<C: ItemCollection>(
    view: &mut ListViewState,
    store: &mut ItemStore<C>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if let Some(id) = view_data.pending_delete.take() {
        confirm_delete(view, store, view_data, internal_tx, id, key);
        return false;
    }

    if view_data.input_mode == InputMode::Search {
        handle_search_key(view, view_data, key);
        clamp_cursor(view, store.items(), view_data);
        return false;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => return true,
        (KeyCode::Char('/'), _) => {
            view_data.input_mode = InputMode::Search;
        }
        (KeyCode::Esc, _) => {
            if !view.search_text.is_empty() {
                view.dispatch(ListCommand::ClearSearch);
            }
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            view.dispatch(ListCommand::CycleSort);
            bump_status_token(view_data, internal_tx);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            view.dispatch(ListCommand::CycleRegion);
            let message = format!("region {}", view.region.label());
            emit_status(view, view_data, internal_tx, message);
        }
        (KeyCode::Char(digit @ '0'..='3'), _) => {
            let index = digit as usize - '0' as usize;
            let region = Region::ALL[index];
            view.dispatch(ListCommand::SelectRegion(region));
            emit_status(view, view_data, internal_tx, format!("region {}", region.label()));
        }
        (KeyCode::Char(chip), _) if CITY_CHIP_KEYS.contains(&chip) => {
            toggle_city_chip(view, view_data, internal_tx, chip);
        }
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => {
            view_data.cursor = view_data.cursor.saturating_add(1);
        }
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
        }
        (KeyCode::Enter, _) => {
            if let Some(item) = selected_item(view, store.items(), view_data) {
                view.dispatch(ListCommand::ToggleExpanded(item.id.clone()));
            }
        }
        (KeyCode::Char('m'), _) => {
            let message = match selected_item(view, store.items(), view_data) {
                Some(item) => match place_link(item) {
                    Ok(url) => format!("map {url}"),
                    Err(error) => format!("{error:#}"),
                },
                None => "nothing selected".to_owned(),
            };
            emit_status(view, view_data, internal_tx, message);
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            match selected_item(view, store.items(), view_data) {
                Some(item) => view_data.pending_delete = Some(item.id.clone()),
                None => emit_status(view, view_data, internal_tx, "nothing selected"),
            }
        }
        (KeyCode::Char('R'), _) => {
            start_reload(view, view_data);
        }
        _ => {}
    }

    clamp_cursor(view, store.items(), view_data);
    false
}

fn handle_search_key(view: &mut ListViewState, view_data: &mut ViewData, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) | (KeyCode::Enter, _) => {
            view_data.input_mode = InputMode::Browse;
        }
        (KeyCode::Backspace, _) => {
            view.dispatch(ListCommand::PopSearchChar);
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            view.dispatch(ListCommand::ClearSearch);
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            view.dispatch(ListCommand::PushSearchChar(ch));
        }
        _ => {}
    }
    view_data.cursor = 0;
}

fn toggle_city_chip(
    view: &mut ListViewState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    chip: char,
) {
    let Some(index) = CITY_CHIP_KEYS.iter().position(|key| *key == chip) else {
        return;
    };
    match view.selectable_cities().get(index).copied() {
        Some(city) => {
            view.dispatch(ListCommand::ToggleCity(city));
        }
        None => {
            let message = format!(
                "no city chip {} in {} -- pick a region with 1-3 first",
                index + 1,
                view.region.label()
            );
            emit_status(view, view_data, internal_tx, message);
        }
    }
}

fn confirm_delete<C: ItemCollection>(
    view: &mut ListViewState,
    store: &mut ItemStore<C>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: ItemId,
    key: KeyEvent,
) {
    let accepted = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
    let mut notices = StatusNotices::default();
    let outcome = store.delete(&id, &mut |_: &str| accepted, &mut notices);
    if let Ok(DeleteOutcome::Deleted) = outcome {
        view.dispatch(ListCommand::ItemRemoved(id));
        info!("delete confirmed from list view");
    }
    if let Some(message) = notices.messages.pop() {
        emit_status(view, view_data, internal_tx, message);
    }
    clamp_cursor(view, store.items(), view_data);
}

fn render(
    frame: &mut ratatui::Frame<'_>,
    view: &ListViewState,
    items: &[Item],
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(view, view_data))
        .block(Block::default().title("mapstash").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let visible = visible_items(items, view);
    let expanded = view
        .expanded_id
        .as_ref()
        .and_then(|id| visible.iter().find(|item| &item.id == id).copied());

    let body = match expanded {
        Some(_) => Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(10)])
            .split(layout[1]),
        None => Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1)])
            .split(layout[1]),
    };

    render_list(frame, body[0], view, &visible, items.len(), view_data);

    if let Some(item) = expanded {
        let detail = Paragraph::new(detail_text(item))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(item.display_name().to_owned())
                    .borders(Borders::ALL),
            );
        frame.render_widget(detail, body[1]);
    }

    let status_style = if view.load_error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let status = Paragraph::new(status_text(view, view_data))
        .style(status_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if let Some(id) = &view_data.pending_delete {
        let area = centered_rect(50, 24, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(delete_prompt_text(items, id))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("delete")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(prompt, area);
    }
}

fn render_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    view: &ListViewState,
    visible: &[&Item],
    total: usize,
    view_data: &ViewData,
) {
    let header = Row::new(["name", "city", "category", "saved"].map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = visible.iter().enumerate().map(|(index, item)| {
        let mut style = Style::default();
        if view.expanded_id.as_ref() == Some(&item.id) {
            style = style.add_modifier(Modifier::BOLD);
        }
        if index == view_data.cursor {
            style = style.fg(Color::Black).bg(Color::Cyan);
        }
        Row::new(row_cells(item)).style(style)
    });

    let widths = [
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(14),
        Constraint::Length(10),
    ];
    let title = if view.loading {
        "loading...".to_owned()
    } else {
        format!("{} of {total} places", visible.len())
    };
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn row_cells(item: &Item) -> [String; 4] {
    let category = match &item.category {
        Some(category) => match category.sub_label() {
            Some(sub) => format!("{}/{sub}", category.label()),
            None => category.label().to_owned(),
        },
        None => String::new(),
    };
    [
        item.display_name().to_owned(),
        item.city.map(|city| city.as_str().to_owned()).unwrap_or_default(),
        category,
        format_saved_date(item),
    ]
}

fn format_saved_date(item: &Item) -> String {
    item.created_at
        .and_then(|created| {
            created
                .format(format_description!("[year]-[month]-[day]"))
                .ok()
        })
        .unwrap_or_default()
}

fn header_text(view: &ListViewState, view_data: &ViewData) -> String {
    let cursor = if view_data.input_mode == InputMode::Search {
        "_"
    } else {
        ""
    };
    let chips = view
        .selectable_cities()
        .iter()
        .zip(CITY_CHIP_KEYS)
        .map(|(city, key)| {
            let mark = if view.selected_cities.contains(city) {
                "x"
            } else {
                " "
            };
            format!("{key}[{mark}]{}", city.as_str())
        })
        .collect::<Vec<_>>();
    let chips = if chips.is_empty() {
        String::new()
    } else {
        format!(" | {}", chips.join(" "))
    };
    format!(
        "search: {}{cursor} | sort: {} | region: {}{chips}",
        view.search_text,
        view.sort_mode.label(),
        view.region.label(),
    )
}

fn detail_text(item: &Item) -> String {
    let mut lines = Vec::new();
    if let Some(name) = &item.name {
        lines.push(format!("name         {name}"));
    }
    if let Some(address) = &item.address {
        lines.push(format!("address      {address}"));
    }
    if let Some(city) = item.city {
        lines.push(format!("city         {}", city.as_str()));
    }
    lines.push(format!("link         {}", item.url));
    if let Ok(url) = place_link(item) {
        lines.push(format!("map          {url}"));
    }
    if let Ok(Some(url)) = address_link(item) {
        lines.push(format!("address map  {url}"));
    }
    if let Some(note) = &item.note {
        lines.push(format!("note         {note}"));
    }
    lines.join("\n")
}

fn delete_prompt_text(items: &[Item], id: &ItemId) -> String {
    let name = items
        .iter()
        .find(|item| &item.id == id)
        .map_or("this place", Item::display_name);
    format!("delete {name}?\n\ny confirm | any other key cancels")
}

fn status_text(view: &ListViewState, view_data: &ViewData) -> String {
    let mode = match view_data.input_mode {
        InputMode::Browse => "LIST",
        InputMode::Search => "SEARCH",
    };
    let hints = match view_data.input_mode {
        InputMode::Browse => {
            "j/k | enter expand | / search | s sort | r 0-3 region | !@# city | m map | d delete | R reload | q"
        }
        InputMode::Search => "type to filter | backspace | ctrl+u clear | enter/esc done",
    };
    let mut parts = vec![mode.to_owned()];
    if let Some(error) = &view.load_error {
        parts.push(error.clone());
    }
    if let Some(status) = &view.status_line {
        parts.push(status.clone());
    }
    parts.push(hints.to_owned());
    parts.join(" | ")
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
