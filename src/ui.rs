use crate::app::{App, Notice};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};
use visit_heatmap::braille::BrailleCanvas;
use visit_heatmap::heatmap::DensityTier;
use visit_heatmap::map::HeatLayers;
use visit_heatmap::scheduler::SchedulerState;

const ORANGE: Color = Color::Rgb(255, 165, 0);

fn tier_color(tier: DensityTier) -> Color {
    match tier {
        DensityTier::Low => Color::Green,
        DensityTier::Medium => ORANGE,
        DensityTier::High => Color::Red,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Split into map area and status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);

    if let Some(notice) = &app.notice {
        render_notice(frame, notice, area);
    }
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Visit Heatmap ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(HeatWidget { layers: &app.layers }, inner);
}

/// Braille heat layers, drawn low tier first so denser blobs sit on top
struct HeatWidget<'a> {
    layers: &'a HeatLayers,
}

impl HeatWidget<'_> {
    /// Render a braille canvas layer with a specific color
    fn render_layer(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for row in 0..area.height {
            for col in 0..area.width {
                // Blank cells leave lower layers visible
                if let Some(ch) = canvas.glyph(col as usize, row as usize) {
                    buf[(area.x + col, area.y + row)].set_char(ch).set_fg(color);
                }
            }
        }
    }
}

impl Widget for HeatWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for tier in DensityTier::ALL {
            Self::render_layer(self.layers.tier(tier), tier_color(tier), area, buf);
        }
        Self::render_layer(&self.layers.marker, Color::Cyan, area, buf);
    }
}

fn sampler_label(app: &App) -> (String, Color) {
    match app.sampler {
        SchedulerState::Idle => ("off".to_string(), Color::DarkGray),
        SchedulerState::Armed => (format!("{} armed", app.source_name), Color::Green),
        SchedulerState::Sampling => (format!("{} sampling", app.source_name), Color::Yellow),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let [low, med, high] = app.pass.tier_counts();
    let (sampler, sampler_color) = sampler_label(app);

    let mut spans = vec![
        Span::styled(" ", dim),
        Span::styled(app.pass.samples.to_string(), Style::default().fg(Color::White)),
        Span::styled(" samples / ", dim),
        Span::styled(app.pass.locations.len().to_string(), Style::default().fg(Color::White)),
        Span::styled(" places ", dim),
        Span::styled(format!("{low}"), Style::default().fg(tier_color(DensityTier::Low))),
        Span::styled(":", dim),
        Span::styled(format!("{med}"), Style::default().fg(tier_color(DensityTier::Medium))),
        Span::styled(":", dim),
        Span::styled(format!("{high}"), Style::default().fg(tier_color(DensityTier::High))),
        Span::styled(" | ", dim),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(" ", dim),
        Span::styled(app.span_label(), Style::default().fg(Color::Yellow)),
        Span::styled(" | ", dim),
        Span::styled(
            if app.follow { "[F]ollow " } else { "[f]ollow " },
            Style::default().fg(if app.follow { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled(sampler, Style::default().fg(sampler_color)),
    ];

    if let Some(err) = &app.last_error {
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(err.clone(), Style::default().fg(Color::Red)));
    }

    spans.push(Span::styled(
        " | hjkl:pan +/-:zoom f:follow r:reset q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(frame: &mut Frame, notice: &Notice, area: Rect) {
    let popup = centered(area, 54, 5);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(Span::styled(
            format!(" {} ", notice.title),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));

    let text = vec![
        Line::from(notice.body),
        Line::from(Span::styled(
            "press any key",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

/// Rect of at most `width`×`height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}
