use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crossterm::event::{Event, KeyCode, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, HighlightSpacing, Row, Table, TableState},
};
use unicode_width::UnicodeWidthStr;

use gridmate::ai::{self, Transformed, Transformer};
use gridmate::io::{self, Cache};
use gridmate::table::{History, Record, RowSet, SortDirection, ViewState, natural_cmp, project};

use crate::util::{abbreviate_home, default_export_name};

const MAX_COLUMN_WIDTH: u16 = 24;

/// The data table editor. All state lives behind an `Arc<RwLock<_>>` so the
/// widget can be cloned into the background transform task; mutations of the
/// store and history run to completion under the write lock.
#[derive(Clone)]
pub struct EditorWidget {
    state: Arc<RwLock<EditorState>>,
    transformer: Option<Arc<dyn Transformer>>,
    cache: Option<Cache>,
    initial_file: Option<PathBuf>,
}

#[derive(Default)]
struct EditorState {
    rowset: RowSet,
    history: History,
    view: ViewState,
    table_state: TableState,
    selected_column: usize,
    mode: Mode,
    // While a transform is outstanding every store mutation is refused; there
    // is no cancellation and no queue.
    busy: bool,
    status: Option<String>,
    file_name: Option<String>,
    throbber: throbber_widgets_tui::ThrobberState,
}

#[derive(Default)]
enum Mode {
    #[default]
    Normal,
    Input {
        kind: InputKind,
        buffer: String,
    },
    ConfirmReset,
}

#[derive(Clone)]
enum InputKind {
    Filter { previous: String },
    EditCell { row: usize, column: String },
    Instruction,
    Open,
    ExportCsv,
    ExportJson,
}

impl InputKind {
    fn prompt(&self) -> &'static str {
        match self {
            InputKind::Filter { .. } => "filter",
            InputKind::EditCell { .. } => "edit cell",
            InputKind::Instruction => "AI instruction",
            InputKind::Open => "open CSV",
            InputKind::ExportCsv => "export CSV to",
            InputKind::ExportJson => "export JSON to",
        }
    }
}

/// What an event handler decided while the state lock was held; work that
/// must not run under the lock (spawning the transform) happens after.
enum Action {
    Handled,
    NotHandled,
    Transform(String),
}

impl crate::widgets::Widget for EditorWidget {
    fn start(&self) {
        let mut state = self.state.write().unwrap();
        if let Some(path) = &self.initial_file {
            self.load_path(&mut state, path.clone());
        } else if let Some(rowset) = self.cache.as_ref().and_then(Cache::load) {
            let label = format!("restored session ({} rows)", rowset.len());
            state.history.initialize(rowset.records(), rowset.columns());
            state.rowset = rowset;
            state.status = Some(label);
            state.table_state.select(Some(0));
        } else {
            state.status = Some("no data; press o to open a CSV file".to_string());
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let mut state = self.state.write().unwrap();
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ]);
        let [title_area, table_area, status_area] = area.layout(&layout);

        self.render_title(&mut state, frame, title_area);
        self.render_table(&mut state, frame, table_area);
        self.render_status(&state, frame, status_area);
    }

    fn handle_event(&self, event: &Event) -> bool {
        let Some(key) = event.as_key_press_event() else {
            return false;
        };
        let action = {
            let mut state = self.state.write().unwrap();
            match &state.mode {
                Mode::Normal => self.on_key_normal(&mut state, key.code, key.modifiers),
                Mode::Input { .. } => self.on_key_input(&mut state, key.code),
                Mode::ConfirmReset => self.on_key_confirm(&mut state, key.code),
            }
        };
        match action {
            Action::Handled => true,
            Action::NotHandled => false,
            Action::Transform(instruction) => {
                self.spawn_transform(instruction);
                true
            }
        }
    }
}

impl EditorWidget {
    pub fn new(
        initial_file: Option<PathBuf>,
        transformer: Option<Arc<dyn Transformer>>,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(EditorState::default())),
            transformer,
            cache,
            initial_file,
        }
    }

    // --- event handling ---

    fn on_key_normal(
        &self,
        state: &mut EditorState,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Action {
        if state.busy && is_mutating_key(code, modifiers) {
            state.status = Some("transform in progress; please wait".to_string());
            return Action::Handled;
        }
        match code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(state, 1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(state, -1),
            KeyCode::Char('g') => state.table_state.select(Some(0)),
            KeyCode::Char('G') => {
                let rows = project(&state.rowset, &state.view).len();
                state.table_state.select(rows.checked_sub(1));
            }
            KeyCode::Char('h') | KeyCode::Left => {
                state.selected_column = state.selected_column.saturating_sub(1);
            }
            KeyCode::Char('l') | KeyCode::Right => {
                let columns = state.rowset.columns().len();
                if state.selected_column + 1 < columns {
                    state.selected_column += 1;
                }
            }
            KeyCode::Char('/') => {
                let previous = state.view.filter.clone();
                state.mode = Mode::Input {
                    buffer: previous.clone(),
                    kind: InputKind::Filter { previous },
                };
            }
            KeyCode::Char('e') | KeyCode::Enter => self.begin_cell_edit(state),
            KeyCode::Char('a') => match state.rowset.add_row() {
                Ok(()) => {
                    self.commit(state, "row added");
                    let rows = project(&state.rowset, &state.view).len();
                    state.table_state.select(rows.checked_sub(1));
                }
                Err(err) => state.status = Some(err.to_string()),
            },
            KeyCode::Char('d') => self.delete_selected(state),
            KeyCode::Char('s') => self.sort_commit(state),
            KeyCode::Char('u') => self.undo(state),
            KeyCode::Char('U') => self.redo(state),
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => self.redo(state),
            KeyCode::Char('t') => {
                if self.transformer.is_none() {
                    state.status =
                        Some("AI transform unavailable: no credential configured".to_string());
                } else if state.rowset.is_empty() {
                    state.status = Some("load some data first".to_string());
                } else {
                    state.mode = Mode::Input {
                        kind: InputKind::Instruction,
                        buffer: String::new(),
                    };
                }
            }
            KeyCode::Char('o') => {
                state.mode = Mode::Input {
                    kind: InputKind::Open,
                    buffer: String::new(),
                };
            }
            KeyCode::Char('w') => {
                state.mode = Mode::Input {
                    kind: InputKind::ExportCsv,
                    buffer: default_export_name("csv"),
                };
            }
            KeyCode::Char('W') => {
                state.mode = Mode::Input {
                    kind: InputKind::ExportJson,
                    buffer: default_export_name("json"),
                };
            }
            KeyCode::Char('y') => Self::copy_selected_row(state),
            KeyCode::Char('R') => state.mode = Mode::ConfirmReset,
            _ => return Action::NotHandled,
        }
        Action::Handled
    }

    fn on_key_input(&self, state: &mut EditorState, code: KeyCode) -> Action {
        let Mode::Input { kind, mut buffer } = std::mem::take(&mut state.mode) else {
            return Action::NotHandled;
        };
        match code {
            KeyCode::Char(c) => {
                buffer.push(c);
                if matches!(kind, InputKind::Filter { .. }) {
                    // The filter is applied live while typing; it is view-only
                    // so this never touches the store.
                    state.view.filter = buffer.clone();
                }
                state.mode = Mode::Input { kind, buffer };
            }
            KeyCode::Backspace => {
                buffer.pop();
                if matches!(kind, InputKind::Filter { .. }) {
                    state.view.filter = buffer.clone();
                }
                state.mode = Mode::Input { kind, buffer };
            }
            KeyCode::Esc => {
                if let InputKind::Filter { previous } = kind {
                    state.view.filter = previous;
                }
            }
            KeyCode::Enter => {
                return self.submit_input(state, kind, buffer);
            }
            _ => {
                state.mode = Mode::Input { kind, buffer };
            }
        }
        Action::Handled
    }

    fn on_key_confirm(&self, state: &mut EditorState, code: KeyCode) -> Action {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.reset(state);
                state.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => state.mode = Mode::Normal,
            _ => {}
        }
        Action::Handled
    }

    fn submit_input(&self, state: &mut EditorState, kind: InputKind, buffer: String) -> Action {
        match kind {
            InputKind::Filter { .. } => {
                state.view.filter = buffer;
                Self::clamp_selection(state);
                Action::Handled
            }
            InputKind::EditCell { row, column } => {
                match state.rowset.set_cell(row, &column, buffer) {
                    Ok(()) => self.commit(state, "cell updated"),
                    Err(err) => state.status = Some(err.to_string()),
                }
                Action::Handled
            }
            InputKind::Instruction => Action::Transform(buffer),
            InputKind::Open => {
                self.load_path(state, PathBuf::from(buffer));
                Action::Handled
            }
            InputKind::ExportCsv => {
                Self::export(state, buffer, io::csv::export);
                Action::Handled
            }
            InputKind::ExportJson => {
                Self::export(state, buffer, io::json::export);
                Action::Handled
            }
        }
    }

    // --- operations ---

    fn move_selection(&self, state: &mut EditorState, delta: i64) {
        let rows = project(&state.rowset, &state.view).len();
        if rows == 0 {
            state.table_state.select(None);
            return;
        }
        let current = state.table_state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, rows as i64 - 1);
        state.table_state.select(Some(next as usize));
    }

    fn clamp_selection(state: &mut EditorState) {
        let rows = project(&state.rowset, &state.view).len();
        match state.table_state.selected() {
            _ if rows == 0 => state.table_state.select(None),
            Some(selected) if selected >= rows => state.table_state.select(Some(rows - 1)),
            None => state.table_state.select(Some(0)),
            _ => {}
        }
    }

    /// Maps the selection in the projected view back onto the store.
    fn selected_row(state: &EditorState) -> Option<usize> {
        let selected = state.table_state.selected()?;
        let rows = project(&state.rowset, &state.view);
        rows.get(selected).map(|(index, _)| *index)
    }

    fn selected_column_name(state: &EditorState) -> Option<String> {
        state
            .rowset
            .columns()
            .get(state.selected_column)
            .cloned()
    }

    fn begin_cell_edit(&self, state: &mut EditorState) {
        let (Some(row), Some(column)) =
            (Self::selected_row(state), Self::selected_column_name(state))
        else {
            state.status = Some("nothing selected".to_string());
            return;
        };
        let buffer = state.rowset.cell(row, &column).to_string();
        state.mode = Mode::Input {
            kind: InputKind::EditCell { row, column },
            buffer,
        };
    }

    fn delete_selected(&self, state: &mut EditorState) {
        let Some(row) = Self::selected_row(state) else {
            state.status = Some("nothing selected".to_string());
            return;
        };
        match state.rowset.delete_row(row) {
            Ok(()) => {
                self.commit(state, "row deleted");
                Self::clamp_selection(state);
            }
            Err(err) => state.status = Some(err.to_string()),
        }
    }

    /// Sorting is a store mutation, deliberately unlike filtering: the
    /// committed record order changes and a history snapshot is pushed.
    fn sort_commit(&self, state: &mut EditorState) {
        let Some(column) = Self::selected_column_name(state) else {
            state.status = Some("no column selected".to_string());
            return;
        };
        state.view.sort_on(&column);
        let direction = state.view.direction;
        let mut records = state.rowset.records().to_vec();
        records.sort_by(|a, b| {
            let ordering = natural_cmp(cell_of(a, &column), cell_of(b, &column));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        state.rowset.reorder(records);
        let label = match direction {
            SortDirection::Ascending => format!("sorted by {column} ascending"),
            SortDirection::Descending => format!("sorted by {column} descending"),
        };
        self.commit(state, &label);
    }

    fn undo(&self, state: &mut EditorState) {
        match state.history.undo() {
            Some(snapshot) => {
                state.rowset.replace(snapshot.records, &snapshot.columns);
                // The restored order must be what renders, not a re-sort.
                state.view.clear_sort();
                Self::clamp_selection(state);
                self.save_slot(state);
                state.status = Some("undone".to_string());
            }
            None => state.status = Some("nothing to undo".to_string()),
        }
    }

    fn redo(&self, state: &mut EditorState) {
        match state.history.redo() {
            Some(snapshot) => {
                state.rowset.replace(snapshot.records, &snapshot.columns);
                state.view.clear_sort();
                Self::clamp_selection(state);
                self.save_slot(state);
                state.status = Some("redone".to_string());
            }
            None => state.status = Some("nothing to redo".to_string()),
        }
    }

    fn reset(&self, state: &mut EditorState) {
        state.rowset.clear();
        state.history = History::default();
        state.view = ViewState::default();
        state.table_state.select(None);
        state.selected_column = 0;
        state.file_name = None;
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.clear() {
                tracing::warn!(error = %err, "failed to clear session slot");
            }
        }
        state.status = Some("table reset".to_string());
    }

    fn copy_selected_row(state: &mut EditorState) {
        let Some(row) = Self::selected_row(state) else {
            state.status = Some("nothing selected".to_string());
            return;
        };
        let mut object = serde_json::Map::new();
        for column in state.rowset.columns() {
            object.insert(
                column.clone(),
                serde_json::Value::String(state.rowset.cell(row, column).to_string()),
            );
        }
        let text = serde_json::Value::Object(object).to_string();
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => state.status = Some("row copied as JSON".to_string()),
            Err(err) => state.status = Some(format!("clipboard error: {err}")),
        }
    }

    fn export(
        state: &mut EditorState,
        path: String,
        render: fn(&RowSet) -> Result<String, io::ExportError>,
    ) {
        match render(&state.rowset) {
            Ok(rendered) => match std::fs::write(&path, rendered) {
                Ok(()) => state.status = Some(format!("exported to {path}")),
                Err(err) => state.status = Some(format!("failed to write {path}: {err}")),
            },
            // Nothing is written on failure, in particular not for an empty
            // store.
            Err(err) => state.status = Some(err.to_string()),
        }
    }

    fn load_path(&self, state: &mut EditorState, path: PathBuf) {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                state.status = Some(format!("cannot read {}: {err}", path.display()));
                return;
            }
        };
        match io::csv::import(&content) {
            Ok(rowset) => {
                // A fresh load is the new history floor, not an undoable step.
                state.history.initialize(rowset.records(), rowset.columns());
                state.rowset = rowset;
                state.view = ViewState::default();
                state.selected_column = 0;
                state.table_state.select(Some(0));
                state.file_name = Some(abbreviate_home(&path));
                self.save_slot(state);
                state.status = Some(format!("loaded {} rows", state.rowset.len()));
            }
            Err(err) => state.status = Some(err.to_string()),
        }
    }

    fn commit(&self, state: &mut EditorState, label: &str) {
        state.history.commit(state.rowset.records(), state.rowset.columns());
        self.save_slot(state);
        state.status = Some(label.to_string());
    }

    fn save_slot(&self, state: &EditorState) {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.save(&state.rowset) {
                tracing::warn!(error = %err, "failed to write session slot");
            }
        }
    }

    fn spawn_transform(&self, instruction: String) {
        let Some(transformer) = self.transformer.clone() else {
            return;
        };
        {
            let mut state = self.state.write().unwrap();
            state.busy = true;
            state.status = Some("waiting for AI reply".to_string());
        }
        let this = self.clone();
        tokio::spawn(async move {
            let snapshot = this.state.read().unwrap().rowset.clone();
            let result = transformer.transform(&snapshot, &instruction).await;
            this.apply_transform_result(result);
        });
    }

    fn apply_transform_result(&self, result: ai::Result<Transformed>) {
        let mut state = self.state.write().unwrap();
        let state = &mut *state;
        // A reply for a run that is no longer outstanding is dropped.
        if !state.busy {
            return;
        }
        state.busy = false;
        match result {
            Ok(transformed) => {
                // Full replacement only after the reply validated as a record
                // array; on any failure above the store and the history stay
                // as they were.
                state.rowset.replace(transformed.records, &transformed.columns);
                state.history.commit(state.rowset.records(), state.rowset.columns());
                state.view.clear_sort();
                Self::clamp_selection(state);
                self.save_slot(state);
                state.status = Some(format!(
                    "AI transform applied ({} rows)",
                    state.rowset.len()
                ));
            }
            Err(err) => {
                tracing::warn!(error = %err, "transform failed");
                state.status = Some(err.to_string());
            }
        }
    }

    // --- rendering ---

    fn render_title(&self, state: &mut EditorState, frame: &mut Frame, area: Rect) {
        let name = state.file_name.as_deref().unwrap_or("(no file)");
        let title = format!(
            " gridmate — {name}  {}×{}",
            state.rowset.len(),
            state.rowset.columns().len()
        );
        if state.busy {
            let layout = Layout::horizontal([Constraint::Fill(1), Constraint::Length(16)]);
            let [text_area, throbber_area] = area.layout(&layout);
            frame.render_widget(Line::from(title).bold(), text_area);
            let throbber = throbber_widgets_tui::Throbber::default().label("transforming");
            frame.render_stateful_widget(throbber, throbber_area, &mut state.throbber);
            state.throbber.calc_next();
        } else {
            frame.render_widget(Line::from(title).bold(), area);
        }
    }

    fn render_table(&self, state: &mut EditorState, frame: &mut Frame, area: Rect) {
        let rows_projected = project(&state.rowset, &state.view);
        let columns = state.rowset.columns();

        let header_cells: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let marker = if state.view.sort_column.as_deref() == Some(column.as_str()) {
                    match state.view.direction {
                        SortDirection::Ascending => " ▲",
                        SortDirection::Descending => " ▼",
                    }
                } else {
                    ""
                };
                let selected = if index == state.selected_column {
                    "*"
                } else {
                    ""
                };
                format!("{selected}{column}{marker}")
            })
            .collect();

        let widths: Vec<Constraint> = columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let cells_max = rows_projected
                    .iter()
                    .map(|(_, record)| cell_of(record, column).width())
                    .max()
                    .unwrap_or(0);
                let width = cells_max
                    .max(header_cells[index].width())
                    .clamp(4, MAX_COLUMN_WIDTH as usize);
                Constraint::Length(width as u16)
            })
            .collect();

        let rows = rows_projected.iter().map(|(_, record)| {
            Row::new(
                columns
                    .iter()
                    .map(|column| cell_of(record, column).to_string())
                    .collect::<Vec<_>>(),
            )
        });

        let mut block = Block::bordered();
        if !state.view.filter.is_empty() {
            block = block.title_bottom(
                Line::from(format!(
                    " {} of {} rows match \"{}\" ",
                    rows_projected.len(),
                    state.rowset.len(),
                    state.view.filter
                ))
                .right_aligned(),
            );
        }

        let table = Table::new(rows, widths)
            .header(Row::new(header_cells).style(Style::new().add_modifier(Modifier::BOLD)))
            .block(block)
            .highlight_spacing(HighlightSpacing::Always)
            .highlight_symbol(">>")
            .row_highlight_style(Style::new().on_blue());
        frame.render_stateful_widget(table, area, &mut state.table_state);
    }

    fn render_status(&self, state: &EditorState, frame: &mut Frame, area: Rect) {
        let line = match &state.mode {
            Mode::Input { kind, buffer } => Line::from(format!("{}: {buffer}_", kind.prompt())),
            Mode::ConfirmReset => {
                Line::from("reset table and clear the saved session? y/n").bold()
            }
            Mode::Normal => match &state.status {
                Some(status) => Line::from(status.as_str()),
                None => Line::from(HELP_LINE).dim(),
            },
        };
        frame.render_widget(line, area);
    }
}

const HELP_LINE: &str = "j/k h/l move  e edit  a add  d delete  s sort  / filter  u/U undo/redo  t transform  o open  w/W export  y copy  R reset  q quit";

fn cell_of<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn is_mutating_key(code: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(
        code,
        KeyCode::Char('e' | 'a' | 'd' | 's' | 'u' | 'U' | 't' | 'o' | 'R') | KeyCode::Enter
    ) || (code == KeyCode::Char('r') && modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct StaticTransformer(&'static str);

    #[async_trait]
    impl Transformer for StaticTransformer {
        async fn transform(
            &self,
            _rowset: &RowSet,
            _instruction: &str,
        ) -> ai::Result<Transformed> {
            ai::parse_reply(self.0)
        }
    }

    fn widget_with(cache: Option<Cache>, transformer: Option<Arc<dyn Transformer>>) -> EditorWidget {
        let widget = EditorWidget::new(None, transformer, cache);
        {
            let mut state = widget.state.write().unwrap();
            let rowset = io::csv::import("name,age\na,3\nb,10\nc,2\n").unwrap();
            state.history.initialize(rowset.records(), rowset.columns());
            state.rowset = rowset;
            state.table_state.select(Some(0));
        }
        widget
    }

    #[tokio::test]
    async fn transform_reply_is_applied_committed_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path().join("slot.json"));
        let widget = widget_with(
            Some(cache.clone()),
            Some(Arc::new(StaticTransformer(r#"[{"name": "z", "age": "1"}]"#))),
        );

        widget.spawn_transform("keep only z".to_string());
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if !widget.state.read().unwrap().busy {
                break;
            }
        }

        let state = widget.state.read().unwrap();
        assert!(!state.busy);
        assert_eq!(state.rowset.len(), 1);
        assert_eq!(state.rowset.cell(0, "name"), "z");
        assert!(state.history.can_undo());
        drop(state);

        let slot = cache.load().unwrap();
        assert_eq!(slot.cell(0, "name"), "z");
    }

    #[test]
    fn stale_transform_reply_is_dropped() {
        let widget = widget_with(None, None);
        let transformed = ai::parse_reply(r#"[{"name": "z", "age": "1"}]"#).unwrap();
        // No transform outstanding, so the reply must not touch anything.
        widget.apply_transform_result(Ok(transformed));

        let state = widget.state.read().unwrap();
        assert_eq!(state.rowset.len(), 3);
        assert!(!state.history.can_undo());
    }

    #[test]
    fn cell_edit_writes_session_slot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::at(dir.path().join("slot.json"));
        let widget = widget_with(Some(cache.clone()), None);

        let mut state = widget.state.write().unwrap();
        widget.submit_input(
            &mut state,
            InputKind::EditCell {
                row: 0,
                column: "name".to_string(),
            },
            "edited".to_string(),
        );
        drop(state);

        let slot = cache.load().unwrap();
        assert_eq!(slot.cell(0, "name"), "edited");
    }

    #[test]
    fn interactive_open_writes_session_slot() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.csv");
        std::fs::write(&input, "name,age\na,3\n").unwrap();
        let cache = Cache::at(dir.path().join("slot.json"));
        let widget = EditorWidget::new(None, None, Some(cache.clone()));

        let mut state = widget.state.write().unwrap();
        widget.submit_input(&mut state, InputKind::Open, input.display().to_string());
        assert_eq!(state.rowset.len(), 1);
        drop(state);

        let slot = cache.load().unwrap();
        assert_eq!(slot.cell(0, "name"), "a");
    }

    #[test]
    fn undo_after_sort_restores_displayed_order() {
        let widget = widget_with(None, None);
        let mut state = widget.state.write().unwrap();
        state.selected_column = 1;
        widget.sort_commit(&mut state);
        let sorted: Vec<&str> = project(&state.rowset, &state.view)
            .iter()
            .map(|(_, record)| record["age"].as_str())
            .collect();
        assert_eq!(sorted, vec!["2", "3", "10"]);

        widget.undo(&mut state);
        let displayed: Vec<&str> = project(&state.rowset, &state.view)
            .iter()
            .map(|(_, record)| record["age"].as_str())
            .collect();
        assert_eq!(displayed, vec!["3", "10", "2"]);
        assert!(state.view.sort_column.is_none());
    }
}
