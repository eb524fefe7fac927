use image::{Rgba, RgbaImage};
use ratatui::{Terminal, backend::TestBackend, buffer::Buffer, style::Color};
use std::sync::Arc;
use tui_figma_overlay::config::AppConfig;
use tui_figma_overlay::internal::ui::app::{Action, App};
use tui_figma_overlay::internal::ui::view;
use tui_figma_overlay::{OverlayMode, ReferenceSource};

fn app(mode: OverlayMode) -> App {
    let mut config = AppConfig::default();
    config.overlay.initial_mode = mode;
    let reference = RgbaImage::from_pixel(400, 100, Rgba([200, 0, 0, 255]));
    let mut app = App::new(
        config,
        RgbaImage::from_pixel(400, 100, Rgba([0, 0, 200, 255])),
        ReferenceSource::inline(reference.clone()),
        String::new(),
    );
    app.handle_action(Action::ReferenceResolved(Ok(Arc::new(reference))));
    app
}

fn row_text(buffer: &Buffer, y: u16) -> String {
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol().to_string())
        .collect()
}

#[test]
fn test_picker_bar_render() {
    let mut app = app(OverlayMode::Layered);
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
    terminal.draw(|f| view::draw(&mut app, f)).unwrap();

    let picker = row_text(terminal.backend().buffer(), 0);
    insta::assert_snapshot!(picker.trim(), @"◌ Hidden │ ◫ Layered │ ◧ Compare");
}

#[test]
fn test_compare_split_render() {
    // 400x100 frame on a 40x9 canvas: 40 columns x 5 rows starting at row 4
    let mut app = app(OverlayMode::Compare);
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
    terminal.draw(|f| view::draw(&mut app, f)).unwrap();

    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(5, 4)].fg, Color::Rgb(200, 0, 0));
    assert_eq!(buffer[(35, 4)].fg, Color::Rgb(0, 0, 200));
    assert_eq!(buffer[(20, 6)].symbol(), "↔");
}

#[test]
fn test_layered_render_blends() {
    let mut app = app(OverlayMode::Layered);
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
    terminal.draw(|f| view::draw(&mut app, f)).unwrap();

    // 50% red over blue everywhere, no handle
    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(5, 4)].fg, Color::Rgb(100, 0, 100));
    assert_eq!(buffer[(35, 4)].fg, Color::Rgb(100, 0, 100));
    assert_ne!(buffer[(20, 6)].symbol(), "↔");
}

#[test]
fn test_hidden_render_shows_live_only() {
    let mut app = app(OverlayMode::Hidden);
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
    terminal.draw(|f| view::draw(&mut app, f)).unwrap();

    let buffer = terminal.backend().buffer();
    assert_eq!(buffer[(5, 4)].fg, Color::Rgb(0, 0, 200));
    assert!(!row_text(buffer, 1).contains("Opacity"));
}
