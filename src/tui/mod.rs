//! TUI module - Day view dashboard with ratatui

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::session::{Direction as Day, SessionError, WorkoutSession};
use crate::timer::format_clock;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Weight step for +/- (kg)
const WEIGHT_STEP: f64 = 0.25;

const TICK: Duration = Duration::from_secs(1);

const KEY_HELP: &str =
    "←/→ day | ↑/↓ set | space done | +/- kg | ]/[ reps | t today | x reset | q quit";

/// One selectable line: a set of an exercise
#[derive(Debug, Clone, PartialEq)]
struct SetRow {
    exercise: String,
    set: u32,
}

/// App state for TUI
pub struct App {
    session: WorkoutSession,
    rows: Vec<SetRow>,
    table: TableState,
    status: Option<String>,
    last_tick: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(session: WorkoutSession) -> Self {
        let mut app = Self {
            session,
            rows: Vec::new(),
            table: TableState::default(),
            status: None,
            last_tick: Instant::now(),
            should_quit: false,
        };
        app.refresh_rows();
        app
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = self.event_loop(&mut terminal);

        restore_terminal()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;

            if self.last_tick.elapsed() >= TICK {
                self.last_tick = Instant::now();
                if self.session.tick() {
                    self.status = Some("Rest over - next set!".to_string());
                }
            }
        }
        Ok(())
    }

    /// Rebuild the selectable rows after the day changed
    fn refresh_rows(&mut self) {
        let plan = self.session.plan();
        self.rows = plan
            .exercises
            .iter()
            .chain(plan.cardio.as_ref().map(|c| &c.prescription))
            .flat_map(|p| {
                (0..p.sets).map(move |set| SetRow {
                    exercise: p.exercise.clone(),
                    set,
                })
            })
            .collect();
        self.table.select(if self.rows.is_empty() { None } else { Some(0) });
    }

    fn selected(&self) -> Option<SetRow> {
        self.table.selected().and_then(|i| self.rows.get(i)).cloned()
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let plan = self.session.plan();
        let title = format!(
            "{} {}  |  Week {} (cycle {})  |  {}",
            plan.date.format("%A"),
            plan.date,
            plan.position.week,
            plan.position.week_in_cycle,
            plan.position.phase
        );
        let mut label = plan.label();
        if let Some(cardio) = &plan.cardio {
            label.push_str(&format!("  +  {} ({})", cardio.prescription.exercise, cardio.protocol));
        }
        let header = Paragraph::new(vec![
            Line::from(title).style(Style::default().fg(Color::Cyan).bold()),
            Line::from(label),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("liftplan - {}", self.session.identity())),
        );
        frame.render_widget(header, chunks[0]);

        // Sets table
        let table_rows: Vec<Row> = self.rows.iter().map(|row| self.set_row(row)).collect();
        let table = Table::new(
            table_rows,
            [
                Constraint::Length(28),
                Constraint::Length(5),
                Constraint::Length(22),
                Constraint::Length(16),
                Constraint::Length(3),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["Exercise", "Set", "Target", "Actual", "", "Tempo / Rest"])
                .style(Style::default().bold()),
        )
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(if plan.is_rest_day() {
            "Rest day - recover"
        } else {
            "Sets"
        }));
        frame.render_stateful_widget(table, chunks[1], &mut self.table);

        // Footer
        let (done, total) = self.session.progress();
        let timer = if self.session.timer().is_running() {
            format!("Rest {}  |  ", format_clock(self.session.timer().remaining()))
        } else {
            String::new()
        };
        let status = self.status.clone().unwrap_or_else(|| KEY_HELP.to_string());
        let footer = Paragraph::new(format!("{}{}/{} sets  |  {}", timer, done, total, status))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn set_row(&self, row: &SetRow) -> Row<'static> {
        let Some(p) = self.session.plan().prescription(&row.exercise) else {
            return Row::new(vec![Cell::from(row.exercise.clone())]);
        };
        let done = self.session.is_completed(&row.exercise, row.set);

        let name = if row.set == 0 { p.exercise.clone() } else { String::new() };
        let mut target = format!("{} x {}", p.weight, p.reps);
        if p.is_adjusted {
            target.push_str(&format!(" ({:+.2})", p.adjustment));
        }
        let actual = self
            .session
            .record(&row.exercise)
            .and_then(|r| Some((r.weight(row.set as usize)?, r.reps(row.set as usize)?)))
            .map(|(w, r)| format!("{}kg x {}", w, r))
            .unwrap_or_default();
        let indicator = self
            .session
            .performance_indicator(&row.exercise, row.set)
            .map(|i| i.symbol())
            .unwrap_or("");

        let style = if done {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(name),
            Cell::from(format!("{}/{}", row.set + 1, p.sets)),
            Cell::from(target),
            Cell::from(format!("{} {}", actual, indicator)),
            Cell::from(if done { "✓" } else { "·" }),
            Cell::from(format!("{} / {}", p.tempo, p.rest)),
        ])
        .style(style)
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Left | KeyCode::Char('h') => {
                    self.change_day(|s| s.navigate(Day::Previous))
                }
                KeyCode::Right | KeyCode::Char('l') => self.change_day(|s| s.navigate(Day::Next)),
                KeyCode::Char('t') => self.change_day(|s| s.today()),
                KeyCode::Up | KeyCode::Char('k') => self.table.select_previous(),
                KeyCode::Down | KeyCode::Char('j') => self.table.select_next(),
                KeyCode::Char(' ') | KeyCode::Enter => {
                    self.with_selected(|s, row| s.toggle_set(&row.exercise, row.set).map(|_| ()))
                }
                KeyCode::Char('+') | KeyCode::Char('=') => self.with_selected(|s, row| {
                    s.nudge_weight(&row.exercise, row.set, WEIGHT_STEP).map(|_| ())
                }),
                KeyCode::Char('-') => self.with_selected(|s, row| {
                    s.nudge_weight(&row.exercise, row.set, -WEIGHT_STEP).map(|_| ())
                }),
                KeyCode::Char(']') => {
                    self.with_selected(|s, row| s.nudge_reps(&row.exercise, row.set, 1).map(|_| ()))
                }
                KeyCode::Char('[') => self.with_selected(|s, row| {
                    s.nudge_reps(&row.exercise, row.set, -1).map(|_| ())
                }),
                KeyCode::Char('x') => {
                    self.session.reset_sets();
                    self.status = Some("Sets cleared".to_string());
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn change_day<F: FnOnce(&mut WorkoutSession)>(&mut self, change: F) {
        change(&mut self.session);
        self.status = None;
        self.refresh_rows();
    }

    fn with_selected<F>(&mut self, action: F)
    where
        F: FnOnce(&mut WorkoutSession, &SetRow) -> Result<(), SessionError>,
    {
        let Some(row) = self.selected() else {
            return;
        };
        self.status = action(&mut self.session, &row).err().map(|e| e.to_string());
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
