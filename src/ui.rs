use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{Component, EventKind, EventOutcome, RenderContext};
use tui_dispatch_components::{
    StatusBar, StatusBarHint, StatusBarProps, StatusBarSection, StatusBarStyle,
};

use crate::action::Action;
use crate::artwork::Artwork;
use crate::artwork_backend::{self, Placement};
use crate::collection::{Entry, RARE_MARKER};
use crate::encounter::Encounter;
use crate::state::{AppState, Dialog};

const BG_BASE: Color = Color::Rgb(22, 24, 34);
const BG_PANEL: Color = Color::Rgb(32, 36, 50);
const BG_DIALOG: Color = Color::Rgb(40, 40, 56);
const TEXT_MAIN: Color = Color::Rgb(232, 232, 240);
const TEXT_DIM: Color = Color::Rgb(160, 164, 184);
const ACCENT_GOLD: Color = Color::Rgb(255, 222, 0);
const ACCENT_RED: Color = Color::Rgb(228, 82, 82);
const HIGHLIGHT_BG: Color = Color::Rgb(255, 203, 5);
const HIGHLIGHT_TEXT: Color = Color::Rgb(20, 20, 28);
const BORDER_ACCENT: Color = Color::Rgb(86, 92, 122);

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const NICKNAME_PLACEHOLDER: &str = "Leave empty for original name";

const ARTWORK_ID_ENCOUNTER: u32 = 1;
const ARTWORK_ID_SELECTED: u32 = 2;
const PREVIEW_WIDTH: u16 = 20;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, _ctx: RenderContext) {
    artwork_backend::clear();
    draw(frame, area, state);
}

/// Draw the whole page, dialogs on top.
pub fn draw(frame: &mut Frame, area: Rect, state: &AppState) {
    frame.render_widget(Block::default().style(Style::default().bg(BG_BASE)), area);

    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(5),    // Encounter + Pokebank
        Constraint::Length(1), // Help bar
    ])
    .split(area);

    render_header(frame, chunks[0], state);

    let body = Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);
    render_encounter(frame, body[0], state);
    render_collection(frame, body[1], state);
    render_help(frame, chunks[2], state);

    match &state.dialog {
        Some(Dialog::Capture { message, .. }) => render_capture_dialog(frame, area, message),
        Some(Dialog::Release { index }) => {
            if let Some(entry) = state.collection.get(*index) {
                render_release_dialog(frame, area, entry);
            }
        }
        Some(Dialog::Nickname { index, draft }) => {
            if let Some(entry) = state.collection.get(*index) {
                render_nickname_dialog(frame, area, entry, draft);
            }
        }
        None => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(Line::default(), BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = Line::from(vec![
        Span::styled(
            " PokéCatch Gen 1 ",
            Style::default().fg(ACCENT_GOLD).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Pokébank ", Style::default().fg(TEXT_DIM)),
        Span::styled(
            state.collection.count_total().to_string(),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("   {RARE_MARKER} Rare "), Style::default().fg(TEXT_DIM)),
        Span::styled(
            state.collection.count_rare().to_string(),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_encounter(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = panel_block(" Wild Pokémon ", BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = match &state.encounter {
        Some(encounter) => encounter_lines(encounter, state.show_artwork),
        None if state.is_searching() => Vec::new(),
        None => vec![
            Line::from(""),
            Line::styled("No wild Pokémon yet.", Style::default().fg(TEXT_DIM)),
            Line::styled("Press n to search.", Style::default().fg(TEXT_DIM)),
        ],
    };

    if state.is_searching() {
        let frame_idx = (state.tick_count as usize) % SPINNER.len();
        lines.push(Line::from(""));
        lines.push(Line::styled(
            format!("Searching {}", SPINNER[frame_idx]),
            Style::default().fg(ACCENT_GOLD),
        ));
    }

    let chunks = Layout::vertical([
        Constraint::Length(lines.len() as u16), // Text
        Constraint::Min(0),                     // Artwork
    ])
    .split(inner);

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    if let Some(encounter) = &state.encounter {
        render_artwork(frame, chunks[1], state, &encounter.image_url, ARTWORK_ID_ENCOUNTER);
    }
}

fn encounter_lines(encounter: &Encounter, show_artwork: bool) -> Vec<Line<'static>> {
    let mut name = vec![Span::styled(
        encounter.display_name.clone(),
        Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
    )];
    if encounter.is_rare_variant {
        name.push(Span::styled(
            format!(" {RARE_MARKER}"),
            Style::default().fg(ACCENT_GOLD),
        ));
    }

    let mut lines = vec![
        Line::styled("A wild Pokémon appeared!", Style::default().fg(TEXT_DIM)),
        Line::from(""),
        Line::from(name),
        Line::styled(
            format!("#{:03} {}", encounter.species_id, encounter.canonical_name),
            Style::default().fg(TEXT_DIM),
        ),
    ];
    if !show_artwork {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            encounter.image_url.clone(),
            Style::default().fg(TEXT_DIM),
        ));
    }
    lines
}

/// Place the decoded image for `url` in `area`, or say it is on its way.
/// Dialogs hide artwork: kitty images are drawn above the text layer.
fn render_artwork(frame: &mut Frame, area: Rect, state: &AppState, url: &str, id: u32) {
    if !state.show_artwork || state.dialog.is_some() {
        return;
    }
    if let Some(artwork) = state.artwork.get(url) {
        if let Some(placement) = artwork_placement(artwork, area, id) {
            artwork_backend::place(placement);
        }
    } else if state.artwork_pending.contains(url) {
        frame.render_widget(
            Paragraph::new("[loading artwork]")
                .alignment(Alignment::Center)
                .style(Style::default().fg(TEXT_DIM)),
            area,
        );
    }
}

/// Centered placement of `artwork` inside `area`, if there is room for it.
fn artwork_placement(artwork: &Artwork, area: Rect, id: u32) -> Option<Placement> {
    if area.width < 2 || area.height < 2 {
        return None;
    }
    let (cols, rows) = artwork.fit(area.width, area.height);
    Some(Placement {
        id,
        x: area.x + area.width.saturating_sub(cols) / 2,
        y: area.y + area.height.saturating_sub(rows) / 2,
        sequence: artwork.kitty_sequence(cols, rows, id),
    })
}

fn render_collection(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = format!(" My Pokébank ({}) ", state.collection.count_total());
    let block = panel_block(title, BG_PANEL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.collection.is_empty() {
        frame.render_widget(
            Paragraph::new(vec![
                Line::from(""),
                Line::styled(
                    "You haven't caught any Pokémon yet.",
                    Style::default().fg(TEXT_DIM),
                ),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let list_area = if state.show_artwork && inner.width >= PREVIEW_WIDTH * 2 {
        let columns =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(PREVIEW_WIDTH)]).split(inner);
        if let Some(entry) = state.selected_entry() {
            render_artwork(frame, columns[1], state, &entry.image_url, ARTWORK_ID_SELECTED);
        }
        columns[0]
    } else {
        inner
    };

    let items: Vec<ListItem> = state.collection.entries().iter().map(entry_row).collect();
    let list = List::new(items).highlight_style(
        Style::default()
            .bg(HIGHLIGHT_BG)
            .fg(HIGHLIGHT_TEXT)
            .add_modifier(Modifier::BOLD),
    );
    let mut list_state = ListState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(list, list_area, &mut list_state);
}

fn entry_row(entry: &Entry) -> ListItem<'static> {
    let mut spans = vec![
        Span::styled(
            format!("#{:03} ", entry.species_id),
            Style::default().fg(TEXT_DIM),
        ),
        Span::raw(entry.full_label()),
    ];
    if entry.is_rare_variant {
        spans.push(Span::styled(
            format!(" {RARE_MARKER}"),
            Style::default().fg(ACCENT_GOLD),
        ));
    }
    ListItem::new(Line::from(spans))
}

fn render_help(frame: &mut Frame, area: Rect, state: &AppState) {
    let hints = match &state.dialog {
        Some(Dialog::Capture { .. }) => vec![StatusBarHint::new("enter", "continue")],
        Some(Dialog::Release { .. }) => vec![
            StatusBarHint::new("y", "release"),
            StatusBarHint::new("n", "cancel"),
        ],
        Some(Dialog::Nickname { .. }) => vec![
            StatusBarHint::new("enter", "save"),
            StatusBarHint::new("esc", "cancel"),
        ],
        None => vec![
            StatusBarHint::new("c", "catch"),
            StatusBarHint::new("n", "search"),
            StatusBarHint::new("↑↓", "select"),
            StatusBarHint::new("e", "nickname"),
            StatusBarHint::new("x", "release"),
            StatusBarHint::new("q", "quit"),
        ],
    };

    let mut status_bar = StatusBar::new();
    <StatusBar as Component<Action>>::render(
        &mut status_bar,
        frame,
        area,
        StatusBarProps {
            left: StatusBarSection::empty(),
            center: StatusBarSection::hints(&hints),
            right: StatusBarSection::empty(),
            style: StatusBarStyle::default(),
            is_focused: false,
        },
    );
}

fn render_capture_dialog(frame: &mut Frame, area: Rect, message: &str) {
    let inner = open_dialog(frame, area, " Pokémon caught! ", 52, 7);
    let lines = vec![
        Line::from(""),
        Line::styled(
            message.to_string(),
            Style::default().fg(TEXT_MAIN).add_modifier(Modifier::BOLD),
        ),
        Line::from(""),
        Line::styled("[ Continue ]", Style::default().fg(ACCENT_GOLD)),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_release_dialog(frame: &mut Frame, area: Rect, entry: &Entry) {
    let inner = open_dialog(frame, area, " Release Pokémon? ", 64, 8);
    let lines = vec![
        Line::from(""),
        Line::styled(
            format!("Are you sure you want to release {}?", entry.full_label()),
            Style::default().fg(TEXT_MAIN),
        ),
        Line::styled("This can't be undone.", Style::default().fg(TEXT_DIM)),
        Line::from(""),
        Line::from(vec![
            Span::styled("[ Cancel ]", Style::default().fg(TEXT_DIM)),
            Span::raw("   "),
            Span::styled(
                "[ Release ]",
                Style::default().fg(ACCENT_RED).add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        inner,
    );
}

fn render_nickname_dialog(frame: &mut Frame, area: Rect, entry: &Entry, draft: &str) {
    let inner = open_dialog(frame, area, " Change nickname ", 52, 7);
    let input = if draft.is_empty() {
        Line::from(vec![
            Span::styled("█", Style::default().fg(ACCENT_GOLD)),
            Span::styled(NICKNAME_PLACEHOLDER, Style::default().fg(TEXT_DIM)),
        ])
    } else {
        Line::from(vec![
            Span::styled(draft.to_string(), Style::default().fg(TEXT_MAIN)),
            Span::styled("█", Style::default().fg(ACCENT_GOLD)),
        ])
    };
    let lines = vec![
        Line::styled(
            format!("#{:03} {}", entry.species_id, entry.display_name),
            Style::default().fg(TEXT_DIM),
        ),
        Line::from(""),
        input,
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Clear a centered box and draw its frame; returns the content area.
fn open_dialog(frame: &mut Frame, area: Rect, title: &'static str, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let dialog_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, dialog_area);
    let block = panel_block(title, BG_DIALOG).border_style(Style::default().fg(ACCENT_GOLD));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);
    inner
}

fn panel_block<'a, T>(title: T, bg: Color) -> Block<'a>
where
    T: Into<Title<'a>>,
{
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(title)
        .style(Style::default().bg(bg).fg(TEXT_MAIN))
        .border_style(Style::default().fg(BORDER_ACCENT))
}

pub fn handle_event(event: &EventKind, state: &AppState) -> EventOutcome<Action> {
    match event {
        EventKind::Resize(width, height) => {
            EventOutcome::action(Action::UiTerminalResize(*width, *height)).with_render()
        }
        EventKind::Key(key) => handle_key(*key, state),
        _ => EventOutcome::ignored(),
    }
}

fn handle_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    if key.kind == KeyEventKind::Release {
        return EventOutcome::ignored();
    }
    match &state.dialog {
        Some(Dialog::Capture { .. }) => handle_capture_key(key),
        Some(Dialog::Release { .. }) => handle_release_key(key),
        Some(Dialog::Nickname { draft, .. }) => handle_nickname_key(key, draft),
        None => handle_main_key(key, state),
    }
}

fn handle_main_key(key: KeyEvent, state: &AppState) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Char('c') | KeyCode::Char(' ') => {
            if state.encounter.is_none() {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::EncounterCapture)
        }
        KeyCode::Char('n') => EventOutcome::action(Action::EncounterSearch),
        KeyCode::Up | KeyCode::Char('k') => {
            if state.selected == 0 {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::CollectionSelect(state.selected - 1))
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected + 1 >= state.collection.len() {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::CollectionSelect(state.selected + 1))
        }
        KeyCode::Char('e') => {
            if state.selected_entry().is_none() {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::NicknameOpen)
        }
        KeyCode::Char('x') | KeyCode::Delete => {
            if state.selected_entry().is_none() {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::ReleaseOpen)
        }
        KeyCode::Char('q') | KeyCode::Esc => EventOutcome::action(Action::Quit),
        _ => EventOutcome::ignored(),
    }
}

fn handle_capture_key(key: KeyEvent) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
            EventOutcome::action(Action::DialogClose)
        }
        _ => EventOutcome::ignored(),
    }
}

fn handle_release_key(key: KeyEvent) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => EventOutcome::action(Action::ReleaseConfirm),
        KeyCode::Char('n') | KeyCode::Esc => EventOutcome::action(Action::DialogClose),
        _ => EventOutcome::ignored(),
    }
}

fn handle_nickname_key(key: KeyEvent, draft: &str) -> EventOutcome<Action> {
    match key.code {
        KeyCode::Enter => EventOutcome::action(Action::NicknameSave),
        KeyCode::Esc => EventOutcome::action(Action::DialogClose),
        KeyCode::Backspace => {
            let mut next = draft.to_string();
            if next.pop().is_none() {
                return EventOutcome::ignored();
            }
            EventOutcome::action(Action::NicknameChange(next))
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut next = draft.to_string();
            next.push(c);
            EventOutcome::action(Action::NicknameChange(next))
        }
        _ => EventOutcome::ignored(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tui_dispatch::testing::*;

    fn state_with_entry() -> AppState {
        let mut state = AppState::default();
        state.encounter = Some(Encounter {
            species_id: 4,
            canonical_name: "charmander".into(),
            display_name: "Charmander".into(),
            standard_image_url: "https://img/4.png".into(),
            image_url: "https://img/4.png".into(),
            is_rare_variant: false,
        });
        if let Some(encounter) = state.encounter.clone() {
            state.collection.capture(&encounter);
        }
        state
    }

    fn actions(outcome: EventOutcome<Action>) -> Vec<Action> {
        outcome.actions.into_iter().collect()
    }

    #[test]
    fn test_main_keys() {
        let state = state_with_entry();
        let outcome = handle_event(&EventKind::Key(key("c")), &state);
        assert_eq!(actions(outcome), vec![Action::EncounterCapture]);

        let outcome = handle_event(&EventKind::Key(key("x")), &state);
        assert_eq!(actions(outcome), vec![Action::ReleaseOpen]);
    }

    #[test]
    fn test_capture_ignored_without_encounter() {
        let state = AppState::default();
        let outcome = handle_event(&EventKind::Key(key("c")), &state);
        assert!(outcome.actions.is_empty());
    }

    #[test]
    fn test_nickname_typing() {
        let mut state = state_with_entry();
        state.dialog = Some(Dialog::Nickname {
            index: 0,
            draft: "Fla".into(),
        });

        let outcome = handle_event(&EventKind::Key(key("m")), &state);
        assert_eq!(actions(outcome), vec![Action::NicknameChange("Flam".into())]);

        let backspace = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        let outcome = handle_event(&EventKind::Key(backspace), &state);
        assert_eq!(actions(outcome), vec![Action::NicknameChange("Fl".into())]);

        // main-view bindings are inert while typing
        let outcome = handle_event(&EventKind::Key(key("q")), &state);
        assert_eq!(actions(outcome), vec![Action::NicknameChange("Flaq".into())]);
    }

    #[test]
    fn test_artwork_placement_centered() {
        let artwork = Artwork {
            payload: "AAAA".into(),
            width: 96,
            height: 96,
        };

        let placement = artwork_placement(&artwork, Rect::new(10, 5, 30, 10), 1).unwrap();

        // 20x10 cells for a square image, centered horizontally
        assert_eq!((placement.x, placement.y), (15, 5));
        assert!(placement.sequence.contains("i=1,c=20,r=10"));
        assert_eq!(artwork_placement(&artwork, Rect::new(0, 0, 1, 10), 1), None);
    }
}
