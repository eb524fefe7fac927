use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, LineGauge, Padding, Paragraph},
};
use strum::IntoEnumIterator;

use super::app::App;
use super::raster::{RasterLayout, RasterView};
use crate::internal::overlay::OverlayMode;

const BACKGROUND: Color = Color::Rgb(24, 24, 28);
const FOREGROUND: Color = Color::Rgb(220, 220, 220);
const ACCENT: Color = Color::Rgb(64, 128, 255);
const MUTED: Color = Color::Rgb(130, 130, 140);

const HANDLE_GLYPH: &str = "↔";
const PICKER_SEPARATOR: &str = "│";
const SLIDER_LABEL_WIDTH: u16 = 14;

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let start = std::time::Instant::now();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Picker
            Constraint::Length(1), // Opacity slider
            Constraint::Min(0),    // Canvas
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    render_picker(app, f, chunks[0]);
    render_slider(app, f, chunks[1]);
    render_canvas(app, f, chunks[2]);
    render_status_bar(app, f, chunks[3]);

    if app.notification.is_some() {
        render_notification(app, f);
    }

    if app.show_help {
        render_help_overlay(f);
    }

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?start.elapsed(), "render.draw");
    }
}

/// Segmented control with one entry per mode. Records each entry's cells for clicks.
pub fn render_picker(app: &mut App, f: &mut Frame, area: Rect) {
    let current = app.overlay.mode();
    let mut spans = Vec::new();
    let mut hit = Vec::new();
    let mut x = area.x;

    for (i, mode) in OverlayMode::iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(PICKER_SEPARATOR, Style::default().fg(MUTED)));
            x += 1;
        }
        let style = match mode == current {
            true => Style::default()
                .fg(BACKGROUND)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
            false => Style::default().fg(FOREGROUND),
        };
        let span = Span::styled(format!(" {} {} ", mode.icon(), mode), style);
        let width = span.width() as u16;
        hit.push((mode, Rect::new(x, area.y, width, 1).intersection(area)));
        x += width;
        spans.push(span);
    }

    app.hit_areas.picker = hit;
    let p = Paragraph::new(Line::from(spans)).style(Style::default().bg(BACKGROUND));
    f.render_widget(p, area);
}

fn render_slider(app: &mut App, f: &mut Frame, area: Rect) {
    f.render_widget(Block::default().style(Style::default().bg(BACKGROUND)), area);

    if app.overlay.mode() != OverlayMode::Layered {
        app.hit_areas.slider = None;
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SLIDER_LABEL_WIDTH), Constraint::Min(0)])
        .split(area);

    let opacity = app.overlay.opacity();
    let label = format!(" Opacity {:>3}%", (opacity * 100.0).round() as u16);
    f.render_widget(
        Paragraph::new(label).style(Style::default().fg(FOREGROUND)),
        chunks[0],
    );

    let gauge = LineGauge::default()
        .label("")
        .line_set(symbols::line::THICK)
        .filled_style(Style::default().fg(ACCENT))
        .unfilled_style(Style::default().fg(MUTED))
        .ratio(opacity as f64);
    f.render_widget(gauge, chunks[1]);

    // The gauge line starts one column after its (empty) label
    let bar = chunks[1];
    app.hit_areas.slider = match bar.width {
        0 | 1 => None,
        w => Some(Rect::new(bar.x + 1, bar.y, w - 1, 1)),
    };
}

fn render_canvas(app: &mut App, f: &mut Frame, area: Rect) {
    let view_start = std::time::Instant::now();
    let layout = RasterLayout::new(area, app.live.dimensions());
    app.hit_areas.canvas = Some(layout);

    f.render_widget(Block::default().style(Style::default().bg(Color::Black)), area);

    let spinner = app.get_spinner_char();
    let composition = app.composition();
    let (progress, split_x) = (composition.progress, composition.split_x);
    f.render_widget(RasterView::new(&composition.frame), area);

    if progress {
        let rect = layout.rect;
        let row = Rect::new(rect.x, rect.y + rect.height / 2, rect.width, 1).intersection(area);
        let p = Paragraph::new(format!(" {} Resolving reference ", spinner))
            .style(Style::default().fg(FOREGROUND).bg(BACKGROUND))
            .alignment(Alignment::Center);
        f.render_widget(p, row);
    }

    if let Some(split) = split_x
        && let Some(column) = layout.column_of(split)
    {
        let row = layout.rect.y + layout.rect.height / 2;
        if let Some(cell) = f.buffer_mut().cell_mut((column, row)) {
            cell.set_symbol(HANDLE_GLYPH).set_fg(Color::Black);
        }
    }

    if app.config.logging.enable_performance_metrics && cfg!(debug_assertions) {
        tracing::debug!(elapsed = ?view_start.elapsed(), view = "canvas", "render.canvas");
    }
}

fn status_text(app: &App) -> String {
    let mode = app.overlay.mode();
    let detail = match mode {
        OverlayMode::Hidden => "1/2/3: Mode".to_string(),
        OverlayMode::Layered => format!(
            "opacity {:.0}% | ←/→: Opacity",
            app.overlay.opacity() * 100.0
        ),
        OverlayMode::Compare => format!(
            "split {:+.0}px | Drag ↔ or [/]: Move",
            app.overlay.split_offset()
        ),
    };
    format!(
        "{} {} | {} | {} | {}",
        mode.icon(),
        mode,
        app.source,
        app.resolution_status(),
        detail
    )
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(20)])
        .split(area);

    let style = Style::default().fg(FOREGROUND).bg(BACKGROUND);
    f.render_widget(Paragraph::new(status_text(app)).style(style), chunks[0]);
    f.render_widget(
        Paragraph::new(format!("?: Help | v{}", app.app_version))
            .style(style.fg(MUTED))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_notification(app: &App, f: &mut Frame) {
    if let Some(notification) = &app.notification {
        let area = f.area();

        let popup_width = (notification.message.chars().count() as u16 + 4)
            .min(area.width.saturating_sub(4));
        let popup_height = 3;

        // Just above the status bar so the canvas stays visible
        let popup_x = (area.width.saturating_sub(popup_width)) / 2;
        let popup_y = area.height.saturating_sub(popup_height + 1);

        let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height).intersection(area);

        use crate::internal::notification::NotificationType;
        let (bg_color, title) = match notification.notification_type {
            NotificationType::Info => (Color::Blue, "Info"),
            NotificationType::Error => (Color::Red, "Error"),
        };

        let popup = Paragraph::new(notification.message.as_str())
            .style(
                Style::default()
                    .bg(bg_color)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(FOREGROUND))
                    .title(title),
            )
            .alignment(Alignment::Center);

        f.render_widget(Clear, popup_area);
        f.render_widget(popup, popup_area);
    }
}

fn help_line(keys: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<10}", keys), Style::default().fg(ACCENT)),
        Span::raw(description),
    ])
}

fn help_heading(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default().add_modifier(Modifier::BOLD).fg(FOREGROUND),
    ))
}

fn render_help_overlay(f: &mut Frame) {
    let area = f.area();

    let popup_width = 48.min(area.width.saturating_sub(4));
    let popup_height = 20.min(area.height.saturating_sub(2));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT))
        .title(" Keyboard Shortcuts (Esc/q to close) ")
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .padding(Padding::new(1, 1, 0, 0))
        .style(Style::default().bg(BACKGROUND).fg(FOREGROUND));

    let lines = vec![
        help_heading("Global"),
        help_line("?", "Show this help"),
        help_line("q / Esc", "Quit"),
        help_line("1 / 2 / 3", "Hidden / Layered / Compare"),
        help_line("Tab", "Next mode"),
        help_line("Shift+Tab", "Previous mode"),
        Line::from(""),
        help_heading("Layered"),
        help_line("← / →", "Opacity down / up"),
        help_line("- / +", "Opacity down / up"),
        help_line("click", "Set opacity on the slider"),
        Line::from(""),
        help_heading("Compare"),
        help_line("drag", "Move the split handle"),
        help_line("[ / ]", "Nudge split left / right"),
        help_line("← / →", "Nudge split left / right"),
    ];

    f.render_widget(Paragraph::new(lines).block(block), popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::internal::models::ReferenceSource;
    use image::{Rgba, RgbaImage};
    use ratatui::{Terminal, backend::TestBackend};

    fn app(mode: OverlayMode) -> App {
        let mut config = AppConfig::default();
        config.overlay.initial_mode = mode;
        App::new(
            config,
            RgbaImage::from_pixel(400, 100, Rgba([0, 0, 200, 255])),
            ReferenceSource::node("abc", "1-2"),
            String::new(),
        )
    }

    #[test]
    fn test_picker_hit_areas_follow_labels() {
        let mut app = app(OverlayMode::Hidden);
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let areas = &app.hit_areas.picker;
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[0], (OverlayMode::Hidden, Rect::new(0, 0, 10, 1)));
        assert_eq!(areas[1], (OverlayMode::Layered, Rect::new(11, 0, 11, 1)));
        assert_eq!(areas[2], (OverlayMode::Compare, Rect::new(23, 0, 11, 1)));
    }

    #[test]
    fn test_slider_only_in_layered() {
        let mut app = app(OverlayMode::Compare);
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert!(app.hit_areas.slider.is_none());

        app.select_mode(OverlayMode::Layered);
        terminal.draw(|f| draw(&mut app, f)).unwrap();
        assert_eq!(
            app.hit_areas.slider,
            Some(Rect::new(SLIDER_LABEL_WIDTH + 1, 1, 40 - SLIDER_LABEL_WIDTH - 1, 1))
        );
    }

    #[test]
    fn test_pending_reference_shows_progress() {
        let mut app = app(OverlayMode::Layered);
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal.draw(|f| draw(&mut app, f)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .map(|(x, y)| buffer[(x, y)].symbol().to_string())
            .collect();
        assert!(text.contains("Resolving reference"));
    }

    #[test]
    fn test_status_text_per_mode() {
        let mut app = app(OverlayMode::Layered);
        assert!(status_text(&app).contains("opacity 50%"));
        app.select_mode(OverlayMode::Compare);
        app.apply_command(crate::internal::ui::keybindings::Command::NudgeRight);
        assert!(status_text(&app).contains("split +8px"));
    }
}
