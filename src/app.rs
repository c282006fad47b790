use crate::clipboard;
use crate::config::Config;
use crate::render::{follow, item_position, wrap_cells, Cell};
use crate::theme::{SpeakerStyles, UiPalette};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use papercut::blocks::{block_index_of_item, derive_blocks, find_block, SegmentationRule};
use papercut::colors::{SpeakerColors, SpeakerPalette};
use papercut::drag::DropTarget;
use papercut::id::SequentialIdGen;
use papercut::record::{format_timestamp, WordRecord};
use papercut::session::Session;
use papercut::transcript::{self, Source};
use papercut::{DropPosition, Editor, Motion};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Paragraph, Tabs};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const EDGE: &str = "\u{258d} ";

pub fn run_app(paths: Vec<PathBuf>, config: Config, log_path: PathBuf) -> Result<()> {
    let mut app = App::new(paths, config, log_path)?;

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard;

    let tick_rate = Duration::from_millis(50);

    loop {
        let size = terminal.size()?;
        let layout = app.layout(size);
        terminal.draw(|f| ui(f, &mut app, &layout))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = stdout.execute(LeaveAlternateScreen);
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Sources,
    PaperCut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Visual,
    Move,
    CommandInput,
}

/// A loaded transcript with its blocks, as shown in the sources pane.
struct SourceView {
    name: String,
    records: Vec<WordRecord>,
    blocks: Vec<papercut::Block>,
}

impl SourceView {
    fn new(source: Source, rule: SegmentationRule, ids: &mut SequentialIdGen) -> Self {
        let blocks = derive_blocks(&source.records, rule, ids);
        Self {
            name: source.name,
            records: source.records,
            blocks,
        }
    }
}

/// Position in the sources pane as (source, item).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SourceCursor {
    source: usize,
    item: usize,
}

struct LayoutInfo {
    tabs: Rect,
    sources: Option<Rect>,
    paper: Rect,
    status: Rect,
}

struct App {
    config: Config,
    ui: UiPalette,
    session: Session,
    session_path: PathBuf,
    log_path: PathBuf,
    editors: Vec<Editor>,
    active: usize,
    sources: Vec<SourceView>,
    source_colors: SpeakerColors,
    source_cursor: SourceCursor,
    source_anchor: Option<SourceCursor>,
    paper_anchor: Option<usize>,
    move_target: usize,
    focus: Pane,
    mode: Mode,
    command_input: String,
    register: String,
    status: Option<String>,
    dirty: bool,
    paper_scroll: usize,
    sources_scroll: usize,
}

impl App {
    fn new(paths: Vec<PathBuf>, config: Config, log_path: PathBuf) -> Result<Self> {
        let rule = config.rule();
        let mut ids = SequentialIdGen::new("source");
        let sources: Vec<SourceView> = transcript::load_sources(&paths)
            .into_iter()
            .map(|source| SourceView::new(source, rule, &mut ids))
            .collect();
        let mut source_colors = SpeakerColors::new();
        for block in sources.iter().flat_map(|s| s.blocks.iter()) {
            source_colors.index_for(&block.speaker);
        }

        let session_path = config.session_path()?;
        let mut session = if session_path.exists() {
            Session::load(&session_path)
                .with_context(|| format!("Failed to load session {}", session_path.display()))?
        } else {
            Session::new()
        };
        if session.is_empty() {
            session.create_tab(None);
        }
        let editors = session
            .tabs()
            .iter()
            .map(|tab| new_editor(&config, tab.content.clone(), tab.split_flags()))
            .collect();
        info!(
            sources = sources.len(),
            tabs = session.len(),
            session = %session_path.display(),
            "editor started"
        );

        let focus = if sources.is_empty() {
            Pane::PaperCut
        } else {
            Pane::Sources
        };
        let status = if paths.is_empty() || !sources.is_empty() {
            None
        } else {
            Some(format!("No transcripts loaded (see {})", log_path.display()))
        };

        Ok(Self {
            config,
            ui: UiPalette::default(),
            session,
            session_path,
            log_path,
            editors,
            active: 0,
            sources,
            source_colors,
            source_cursor: SourceCursor::default(),
            source_anchor: None,
            paper_anchor: None,
            move_target: 0,
            focus,
            mode: Mode::Normal,
            command_input: String::new(),
            register: String::new(),
            status,
            dirty: false,
            paper_scroll: 0,
            sources_scroll: 0,
        })
    }

    fn layout(&self, size: Rect) -> LayoutInfo {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(size);
        let tabs = vertical[0];
        let main = vertical[1];
        let status = vertical[2];

        let (sources, paper) = if self.config.show_sources && !self.sources.is_empty() {
            let sources_width = self
                .config
                .sources_width
                .min(main.width.saturating_sub(20));
            let horiz = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(sources_width), Constraint::Min(20)])
                .split(main);
            (Some(horiz[0]), horiz[1])
        } else {
            (None, main)
        };

        LayoutInfo {
            tabs,
            sources,
            paper,
            status,
        }
    }

    fn editor(&self) -> &Editor {
        &self.editors[self.active]
    }

    fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editors[self.active]
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.mode == Mode::CommandInput {
            return self.handle_command_input(key);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Char('r') {
                self.redo();
            }
            return false;
        }
        if self.mode == Mode::Move {
            self.handle_move_mode(key);
            return false;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Pane::Sources => Pane::PaperCut,
                    Pane::PaperCut if !self.sources.is_empty() => Pane::Sources,
                    Pane::PaperCut => Pane::PaperCut,
                };
                self.leave_visual();
                return false;
            }
            KeyCode::Char(':') => {
                self.mode = Mode::CommandInput;
                self.command_input.clear();
                return false;
            }
            KeyCode::Char(']') => {
                self.switch_tab(1);
                return false;
            }
            KeyCode::Char('[') => {
                self.switch_tab(-1);
                return false;
            }
            KeyCode::Char('u') => {
                self.undo();
                return false;
            }
            KeyCode::Esc => {
                self.leave_visual();
                self.status = None;
                return false;
            }
            _ => {}
        }

        match self.focus {
            Pane::Sources => self.handle_sources_key(key),
            Pane::PaperCut => self.handle_paper_key(key),
        }
        false
    }

    fn handle_command_input(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_input.clear();
            }
            KeyCode::Enter => {
                let command = self.command_input.trim().to_string();
                self.command_input.clear();
                self.mode = Mode::Normal;
                return self.execute_command(&command);
            }
            KeyCode::Backspace => {
                self.command_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.command_input.push(c);
            }
            _ => {}
        }
        false
    }

    fn handle_sources_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_source_by(-1),
            KeyCode::Char('l') | KeyCode::Right => self.move_source_by(1),
            KeyCode::Char('j') | KeyCode::Down => self.move_source_block(true),
            KeyCode::Char('k') | KeyCode::Up => self.move_source_block(false),
            KeyCode::Char('g') | KeyCode::Home => self.set_source_global(0),
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.source_total().saturating_sub(1);
                self.set_source_global(last);
            }
            KeyCode::Char('v') => {
                self.source_anchor = match self.source_anchor {
                    Some(_) => None,
                    None => Some(self.source_cursor),
                };
                self.mode = if self.source_anchor.is_some() {
                    Mode::Visual
                } else {
                    Mode::Normal
                };
            }
            KeyCode::Char('a') => {
                if let Some(items) = self.source_selection() {
                    let count = send_words(self.editor_mut(), &items, true);
                    self.edited(count > 0, format!("Added {count} words"));
                    self.leave_visual();
                }
            }
            KeyCode::Char('i') => {
                if let Some(items) = self.source_selection() {
                    let count = send_words(self.editor_mut(), &items, false);
                    self.edited(count > 0, format!("Inserted {count} words"));
                    self.leave_visual();
                }
            }
            KeyCode::Char('y') => {
                if let Some(items) = self.source_selection() {
                    let text = self.config.wire_format.encode(&items);
                    self.copy_text(text, items.len());
                    self.leave_visual();
                }
            }
            _ => {}
        }
    }

    fn handle_paper_key(&mut self, key: KeyEvent) {
        let motion = match key.code {
            KeyCode::Char('h') | KeyCode::Left => Some(Motion::Left),
            KeyCode::Char('l') | KeyCode::Right => Some(Motion::Right),
            KeyCode::Char('k') | KeyCode::Up => Some(Motion::PrevBlock),
            KeyCode::Char('j') | KeyCode::Down => Some(Motion::NextBlock),
            KeyCode::Char('0') | KeyCode::Home => Some(Motion::BlockStart),
            KeyCode::Char('$') | KeyCode::End => Some(Motion::BlockEnd),
            KeyCode::Char('g') => Some(Motion::DocumentStart),
            KeyCode::Char('G') => Some(Motion::DocumentEnd),
            _ => None,
        };
        if let Some(motion) = motion {
            self.editor_mut().move_cursor(motion);
            return;
        }

        if self.mode == Mode::Visual {
            match key.code {
                KeyCode::Char('d') | KeyCode::Char('x') | KeyCode::Delete => {
                    if let Some((start, end)) = self.paper_selection_positions() {
                        let changed = self.editor_mut().delete_range(&start.0, start.1, &end.0, end.1);
                        self.edited(changed, "Deleted selection".to_string());
                    }
                    self.leave_visual();
                }
                KeyCode::Char('y') => {
                    if let Some((start, end)) = self.paper_selection_positions() {
                        let copied = self.editor().copy_range(&start.0, start.1, &end.0, end.1);
                        if let Some(text) = copied {
                            let count = text.split_whitespace().count();
                            self.copy_text(text, count);
                        }
                    }
                    self.leave_visual();
                }
                KeyCode::Char('v') => self.leave_visual(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Enter => {
                let changed = self.editor_mut().split_at_cursor();
                self.edited(changed, "Split block".to_string());
            }
            KeyCode::Backspace => {
                let changed = self.editor_mut().backspace();
                self.edited(changed, "Deleted word".to_string());
            }
            KeyCode::Delete | KeyCode::Char('x') => {
                let changed = self.editor_mut().delete_forward();
                self.edited(changed, "Deleted word".to_string());
            }
            KeyCode::Char('v') => {
                if let Some(item) = self.paper_item() {
                    self.paper_anchor = Some(item);
                    self.mode = Mode::Visual;
                }
            }
            KeyCode::Char('D') => {
                if let Some(id) = self.cursor_block_id() {
                    let changed = self.editor_mut().delete_block(&id);
                    self.edited(changed, "Deleted block".to_string());
                }
            }
            KeyCode::Char('m') => self.start_move(),
            KeyCode::Char('y') => {
                if let Some(id) = self.cursor_block_id() {
                    if let Some(text) = self.editor().copy_block(&id) {
                        let count = text.split_whitespace().count();
                        self.copy_text(text, count);
                    }
                }
            }
            KeyCode::Char('p') => self.paste(false),
            KeyCode::Char('P') => self.paste(true),
            _ => {}
        }
    }

    fn handle_move_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let last = self.editor().blocks().len();
                self.move_target = (self.move_target + 1).min(last);
                self.update_drop_target();
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_target = self.move_target.saturating_sub(1);
                self.update_drop_target();
            }
            KeyCode::Enter => {
                let changed = self.editor_mut().drop_drag();
                self.mode = Mode::Normal;
                if changed {
                    self.edited(true, "Moved block".to_string());
                } else {
                    self.status = Some("Block not moved".to_string());
                }
            }
            KeyCode::Esc => {
                self.editor_mut().cancel_drag();
                self.mode = Mode::Normal;
                self.status = Some("Move cancelled".to_string());
            }
            _ => {}
        }
    }

    fn start_move(&mut self) {
        let Some(id) = self.cursor_block_id() else {
            return;
        };
        let Some((idx, _)) = find_block(self.editor().blocks(), &id) else {
            return;
        };
        if self.editor_mut().start_drag(&id) {
            self.move_target = idx;
            self.mode = Mode::Move;
            self.status = Some("Move: j/k pick target, Enter drop, Esc cancel".to_string());
        }
    }

    fn update_drop_target(&mut self) {
        let editor = self.editor();
        let blocks = editor.blocks();
        let Some(dragged) = editor
            .drag()
            .dragged()
            .and_then(|id| find_block(blocks, id))
            .map(|(idx, _)| idx)
        else {
            return;
        };
        let target = match blocks.get(self.move_target) {
            None => DropTarget::Trailing,
            Some(block) => DropTarget::Block {
                block_id: block.id.clone(),
                position: if self.move_target < dragged {
                    DropPosition::Above
                } else {
                    DropPosition::Below
                },
            },
        };
        self.editor_mut().hover_drag(target);
    }

    fn execute_command(&mut self, command: &str) -> bool {
        let cmd = command.trim();
        if cmd.is_empty() {
            return false;
        }
        let (name, arg) = match cmd.split_once(' ') {
            Some((name, arg)) => (name, arg.trim()),
            None => (cmd, ""),
        };

        match name {
            "w" | "write" => {
                self.save_session();
            }
            "wq" | "x" => {
                if self.save_session() {
                    return true;
                }
            }
            "q" | "quit" => {
                if self.dirty {
                    self.status = Some("No write since last change (add ! to override)".to_string());
                } else {
                    return true;
                }
            }
            "q!" | "quit!" => return true,
            "new" => {
                let name = (!arg.is_empty()).then_some(arg);
                let id = self.session.create_tab(name);
                let editor = new_editor(&self.config, Vec::new(), Vec::new());
                self.editors.push(editor);
                self.active = self.editors.len() - 1;
                self.focus_new_tab();
                self.dirty = true;
                let title = self.session.tab(&id).map(|t| t.name.clone()).unwrap_or_default();
                self.status = Some(format!("Opened {title}"));
            }
            "close" => self.close_active_tab(),
            "rename" => {
                let id = self.active_tab_id();
                match self.session.rename_tab(&id, arg) {
                    Ok(()) => {
                        self.dirty = true;
                        self.status = Some(format!("Renamed to {arg}"));
                    }
                    Err(err) => self.status = Some(format!("Rename failed: {err}")),
                }
            }
            "speaker" => {
                let block_id = self.editor().cursor().map(|pos| pos.block_id.clone());
                let changed = block_id
                    .is_some_and(|id| self.editor_mut().rename_block_speaker(&id, arg));
                if changed {
                    self.edited(true, format!("Speaker renamed to {arg}"));
                } else {
                    self.status = Some("Usage: :speaker NAME (cursor in a block)".to_string());
                }
            }
            "log" => self.status = Some(format!("Log: {}", self.log_path.display())),
            _ => self.status = Some(format!("Not an editor command: {cmd}")),
        }
        false
    }

    fn close_active_tab(&mut self) {
        if self.editors.len() <= 1 {
            self.status = Some("Cannot close the last PaperCut".to_string());
            return;
        }
        let id = self.active_tab_id();
        match self.session.close_tab(&id) {
            Ok(tab) => {
                self.editors.remove(self.active);
                self.active = self.active.min(self.editors.len() - 1);
                self.focus_new_tab();
                self.dirty = true;
                self.status = Some(format!("Closed {}", tab.name));
            }
            Err(err) => self.status = Some(format!("Close failed: {err}")),
        }
    }

    fn active_tab_id(&self) -> String {
        self.session
            .tabs()
            .get(self.active)
            .map(|tab| tab.id.clone())
            .unwrap_or_default()
    }

    fn switch_tab(&mut self, delta: isize) {
        let len = self.editors.len();
        if len < 2 {
            return;
        }
        self.editor_mut().cancel_drag();
        self.active = (self.active as isize + delta).rem_euclid(len as isize) as usize;
        self.focus_new_tab();
    }

    fn focus_new_tab(&mut self) {
        self.leave_visual();
        self.mode = Mode::Normal;
        self.paper_scroll = 0;
    }

    /// Copies every editor into its session tab and writes the session file.
    fn save_session(&mut self) -> bool {
        let tabs: Vec<String> = self.session.tabs().iter().map(|t| t.id.clone()).collect();
        for (id, editor) in tabs.iter().zip(&self.editors) {
            let content = editor.content().to_vec();
            let splits = editor.document().split_offsets();
            if let Err(err) = self.session.set_content(id, content, splits) {
                warn!(tab = %id, %err, "failed to sync tab");
            }
        }
        match self.session.save(&self.session_path) {
            Ok(()) => {
                self.dirty = false;
                self.status = Some(format!("Saved {}", self.session_path.display()));
                true
            }
            Err(err) => {
                warn!(%err, "session save failed");
                self.status = Some(format!("Save failed: {err}"));
                false
            }
        }
    }

    fn undo(&mut self) {
        if self.editor_mut().undo() {
            self.edited(true, "Undone".to_string());
        } else {
            self.status = Some("Already at oldest change".to_string());
        }
    }

    fn redo(&mut self) {
        if self.editor_mut().redo() {
            self.edited(true, "Redone".to_string());
        } else {
            self.status = Some("Already at newest change".to_string());
        }
    }

    fn paste(&mut self, at_end: bool) {
        let text = clipboard::paste().unwrap_or_else(|| self.register.clone());
        let count = if at_end {
            self.editor_mut().paste_at_end(&text)
        } else {
            self.editor_mut().paste(&text)
        };
        if count == 0 {
            self.status = Some("Nothing to paste".to_string());
        } else {
            self.edited(true, format!("Pasted {count} words"));
        }
    }

    fn copy_text(&mut self, text: String, count: usize) {
        let shared = clipboard::copy(&text);
        self.register = text;
        self.status = Some(if shared {
            format!("Copied {count} words")
        } else {
            format!("Copied {count} words (clipboard unavailable)")
        });
    }

    fn edited(&mut self, changed: bool, message: String) {
        if changed {
            self.dirty = true;
            self.status = Some(message);
        }
    }

    fn leave_visual(&mut self) {
        self.source_anchor = None;
        self.paper_anchor = None;
        if self.mode == Mode::Visual {
            self.mode = Mode::Normal;
        }
    }

    /// The word the PaperCut cursor sits on, or the last word when the
    /// cursor is at the very end.
    fn paper_item(&self) -> Option<usize> {
        let editor = self.editor();
        let len = editor.content().len();
        if len == 0 {
            return None;
        }
        let gap = editor.document().cursor_gap().unwrap_or(len);
        Some(gap.min(len - 1))
    }

    fn cursor_block_id(&self) -> Option<String> {
        let editor = self.editor();
        match editor.cursor() {
            Some(pos) => Some(pos.block_id.clone()),
            None => editor.blocks().last().map(|block| block.id.clone()),
        }
    }

    fn paper_selection(&self) -> Option<(usize, usize)> {
        let anchor = self.paper_anchor?;
        let item = self.paper_item()?;
        let last = self.editor().content().len().checked_sub(1)?;
        let anchor = anchor.min(last);
        Some((anchor.min(item), anchor.max(item)))
    }

    fn paper_selection_positions(&self) -> Option<((String, usize), (String, usize))> {
        let (lo, hi) = self.paper_selection()?;
        let blocks = self.editor().blocks();
        Some((item_position(blocks, lo)?, item_position(blocks, hi)?))
    }

    fn source_total(&self) -> usize {
        self.sources.iter().map(|s| s.records.len()).sum()
    }

    fn source_global(&self) -> usize {
        let before: usize = self.sources[..self.source_cursor.source.min(self.sources.len())]
            .iter()
            .map(|s| s.records.len())
            .sum();
        before + self.source_cursor.item
    }

    fn set_source_global(&mut self, global: usize) {
        let mut rest = global.min(self.source_total().saturating_sub(1));
        for (idx, source) in self.sources.iter().enumerate() {
            if rest < source.records.len() {
                self.source_cursor = SourceCursor {
                    source: idx,
                    item: rest,
                };
                return;
            }
            rest -= source.records.len();
        }
    }

    fn move_source_by(&mut self, delta: isize) {
        if self.source_total() == 0 {
            return;
        }
        let global = self.source_global().saturating_add_signed(delta);
        self.set_source_global(global);
    }

    fn source_block_starts(&self) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut offset = 0;
        for source in &self.sources {
            starts.extend(source.blocks.iter().map(|block| offset + block.start));
            offset += source.records.len();
        }
        starts
    }

    fn move_source_block(&mut self, forward: bool) {
        let global = self.source_global();
        let starts = self.source_block_starts();
        let target = if forward {
            starts.into_iter().find(|&start| start > global)
        } else {
            starts.into_iter().rev().find(|&start| start < global)
        };
        if let Some(target) = target {
            self.set_source_global(target);
        }
    }

    /// Words picked in the sources pane: the visual selection, or the block
    /// under the cursor.
    fn source_selection(&self) -> Option<Vec<WordRecord>> {
        let cursor = self.source_cursor;
        let source = self.sources.get(cursor.source)?;
        if source.records.is_empty() {
            return None;
        }
        let (lo, hi) = match self.source_anchor {
            Some(anchor) if anchor.source == cursor.source => {
                (anchor.item.min(cursor.item), anchor.item.max(cursor.item))
            }
            _ => {
                let idx = block_index_of_item(&source.blocks, cursor.item)?;
                let block = &source.blocks[idx];
                (block.start, block.end() - 1)
            }
        };
        Some(source.records[lo..=hi].to_vec())
    }

    fn source_selected(&self, source: usize, item: usize) -> bool {
        match self.source_anchor {
            Some(anchor) if anchor.source == source && self.source_cursor.source == source => {
                let lo = anchor.item.min(self.source_cursor.item);
                let hi = anchor.item.max(self.source_cursor.item);
                (lo..=hi).contains(&item)
            }
            _ => false,
        }
    }
}

/// Hands source words to a PaperCut through its wire format, as a clipboard
/// paste would. Returns how many words arrived.
fn send_words(editor: &mut Editor, items: &[WordRecord], at_end: bool) -> usize {
    let text = editor.format().encode(items);
    if at_end {
        editor.paste_at_end(&text)
    } else {
        editor.paste(&text)
    }
}

fn new_editor(config: &Config, content: Vec<WordRecord>, splits: Vec<bool>) -> Editor {
    let mut editor = Editor::new(config.rule())
        .with_history_limit(config.history_limit)
        .with_format(config.wire_format);
    editor.load(content, splits);
    editor
}

fn ui(f: &mut ratatui::Frame, app: &mut App, layout: &LayoutInfo) {
    let base_style = app.ui.base_style();

    let titles: Vec<String> = app
        .session
        .tabs()
        .iter()
        .map(|tab| format!(" {} ", tab.name))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.active)
        .style(Style::default().fg(app.ui.muted))
        .highlight_style(Style::default().fg(app.ui.accent).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, layout.tabs);

    if let Some(area) = layout.sources {
        let width = area.width.saturating_sub(2) as usize;
        let height = area.height.saturating_sub(2) as usize;
        let (lines, cursor_line) = app.source_lines(width);
        app.sources_scroll = follow(app.sources_scroll, cursor_line, height, lines.len());
        let focused = app.focus == Pane::Sources;
        let paragraph = Paragraph::new(Text::from(lines))
            .block(
                Block::bordered()
                    .title(" Sources ")
                    .border_type(BorderType::Rounded)
                    .border_style(app.ui.border_style(focused))
                    .style(base_style),
            )
            .style(base_style)
            .scroll((app.sources_scroll as u16, 0));
        f.render_widget(paragraph, area);
    }

    let width = layout.paper.width.saturating_sub(2) as usize;
    let height = layout.paper.height.saturating_sub(2) as usize;
    let (lines, cursor_line) = app.paper_lines(width);
    app.paper_scroll = follow(app.paper_scroll, cursor_line, height, lines.len());
    let name = app
        .session
        .tabs()
        .get(app.active)
        .map(|tab| tab.name.as_str())
        .unwrap_or("PaperCut");
    let title = if app.dirty {
        format!(" *{name} ")
    } else {
        format!(" {name} ")
    };
    let focused = app.focus == Pane::PaperCut;
    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::bordered()
                .title(title)
                .border_type(BorderType::Rounded)
                .border_style(app.ui.border_style(focused))
                .style(base_style),
        )
        .style(base_style)
        .scroll((app.paper_scroll as u16, 0));
    f.render_widget(paragraph, layout.paper);

    f.render_widget(
        Paragraph::new(app.status_line()).style(base_style),
        layout.status,
    );
}

impl App {
    fn status_line(&self) -> Line<'static> {
        if self.mode == Mode::CommandInput {
            return Line::from(vec![
                Span::styled(":", Style::default().fg(self.ui.accent)),
                Span::styled(self.command_input.clone(), self.ui.base_style()),
            ]);
        }

        let sep = || Span::styled(" | ", Style::default().fg(self.ui.muted));
        let mut parts = vec![Span::styled(
            "papercut",
            Style::default().fg(self.ui.accent).add_modifier(Modifier::BOLD),
        )];
        let mode_label = match self.mode {
            Mode::Normal => "normal",
            Mode::Visual => "visual",
            Mode::Move => "move",
            Mode::CommandInput => "cmd",
        };
        parts.push(sep());
        parts.push(Span::styled(mode_label, Style::default().fg(self.ui.accent)));
        parts.push(sep());
        parts.push(Span::styled(
            match self.focus {
                Pane::Sources => "sources",
                Pane::PaperCut => "papercut",
            },
            self.ui.base_style(),
        ));
        parts.push(sep());
        parts.push(Span::styled(
            format!(
                "tab {}/{} | {} words",
                self.active + 1,
                self.editors.len(),
                self.editor().content().len()
            ),
            Style::default().fg(self.ui.muted),
        ));
        if let Some(msg) = &self.status {
            parts.push(sep());
            parts.push(Span::styled(msg.clone(), Style::default().fg(self.ui.accent)));
        }
        Line::from(parts)
    }

    fn drop_marker(&self) -> Line<'static> {
        Line::from(Span::styled(
            "\u{2500}\u{2500}\u{2500}\u{2500} drop here \u{2500}\u{2500}\u{2500}\u{2500}",
            Style::default().fg(self.ui.accent).add_modifier(Modifier::BOLD),
        ))
    }

    /// Lines for the PaperCut pane and the line holding the cursor.
    fn paper_lines(&self, width: usize) -> (Vec<Line<'static>>, Option<usize>) {
        let editor = self.editor();
        let doc = editor.document();
        let blocks = editor.blocks();
        if blocks.is_empty() {
            let hint = "Empty PaperCut. Add words from the sources pane with `a`, or paste with `p`.";
            return (
                vec![Line::from(Span::styled(hint, Style::default().fg(self.ui.muted)))],
                None,
            );
        }

        let focused = self.focus == Pane::PaperCut;
        let cursor = editor.cursor();
        let selection = self.paper_selection();
        let dragged = editor.drag().dragged();
        let target = editor.drag().target();

        let mut lines = Vec::new();
        let mut cursor_line = None;
        for block in blocks {
            let palette = SpeakerPalette::for_index(doc.colors().get(&block.speaker).unwrap_or(0));
            let styles = SpeakerStyles::from_palette(&palette);

            if let Some(DropTarget::Block {
                block_id,
                position: DropPosition::Above,
            }) = target
            {
                if *block_id == block.id {
                    lines.push(self.drop_marker());
                }
            }

            let label_style = if dragged == Some(block.id.as_str()) {
                SpeakerStyles::block_highlight(&palette)
            } else {
                styles.label
            };
            let start = block.start_time().unwrap_or(-1.0);
            lines.push(Line::from(vec![
                Span::styled(EDGE, styles.edge),
                Span::styled(block.speaker.clone(), label_style),
                Span::styled(
                    format!("  {}", format_timestamp(start)),
                    Style::default().fg(self.ui.muted),
                ),
            ]));

            let caret = cursor
                .filter(|pos| pos.block_id == block.id)
                .map(|pos| pos.word_index);
            let mut cells: Vec<Cell> = block
                .items
                .iter()
                .enumerate()
                .map(|(offset, item)| {
                    let index = block.start + offset;
                    let style = if caret == Some(offset) {
                        if focused {
                            styles.hover
                        } else {
                            styles.word.add_modifier(Modifier::UNDERLINED)
                        }
                    } else if selection.is_some_and(|(lo, hi)| (lo..=hi).contains(&index)) {
                        self.ui.selection_style()
                    } else {
                        styles.word
                    };
                    Cell::new(item.word.clone(), style)
                })
                .collect();
            if caret == Some(block.len()) {
                cells.push(Cell::new("\u{258f}", Style::default().fg(self.ui.accent)));
            }

            let first = lines.len();
            let (wrapped, rows) = wrap_cells(cells, width, EDGE, styles.edge);
            if let Some(offset) = caret {
                if let Some(row) = rows.get(offset) {
                    cursor_line = Some(first + row);
                }
            }
            lines.extend(wrapped);

            if let Some(DropTarget::Block {
                block_id,
                position: DropPosition::Below,
            }) = target
            {
                if *block_id == block.id {
                    lines.push(self.drop_marker());
                }
            }
            lines.push(Line::from(""));
        }
        if target == Some(&DropTarget::Trailing) {
            lines.push(self.drop_marker());
        }
        (lines, cursor_line)
    }

    /// Lines for the sources pane and the line holding the sources cursor.
    fn source_lines(&self, width: usize) -> (Vec<Line<'static>>, Option<usize>) {
        let focused = self.focus == Pane::Sources;
        let mut lines = Vec::new();
        let mut cursor_line = None;
        for (source_idx, source) in self.sources.iter().enumerate() {
            lines.push(Line::from(Span::styled(
                format!("\u{2500}\u{2500} {} \u{2500}\u{2500}", source.name),
                Style::default().fg(self.ui.accent).add_modifier(Modifier::BOLD),
            )));
            for block in &source.blocks {
                let palette =
                    SpeakerPalette::for_index(self.source_colors.get(&block.speaker).unwrap_or(0));
                let styles = SpeakerStyles::from_palette(&palette);
                let start = block.start_time().unwrap_or(-1.0);
                lines.push(Line::from(vec![
                    Span::styled(EDGE, styles.edge),
                    Span::styled(block.speaker.clone(), styles.label),
                    Span::styled(
                        format!("  {}", format_timestamp(start)),
                        Style::default().fg(self.ui.muted),
                    ),
                ]));

                let cells: Vec<Cell> = block
                    .items
                    .iter()
                    .enumerate()
                    .map(|(offset, item)| {
                        let index = block.start + offset;
                        let at_cursor = self.source_cursor
                            == SourceCursor {
                                source: source_idx,
                                item: index,
                            };
                        let style = if at_cursor && focused {
                            styles.hover
                        } else if at_cursor {
                            styles.word.add_modifier(Modifier::UNDERLINED)
                        } else if self.source_selected(source_idx, index) {
                            self.ui.selection_style()
                        } else {
                            styles.word
                        };
                        Cell::new(item.word.clone(), style)
                    })
                    .collect();

                let first = lines.len();
                let (wrapped, rows) = wrap_cells(cells, width, EDGE, styles.edge);
                if self.source_cursor.source == source_idx
                    && block.range().contains(&self.source_cursor.item)
                {
                    if let Some(row) = rows.get(self.source_cursor.item - block.start) {
                        cursor_line = Some(first + row);
                    }
                }
                lines.extend(wrapped);
            }
            lines.push(Line::from(""));
        }
        (lines, cursor_line)
    }
}
