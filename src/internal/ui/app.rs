use anyhow::Result;
use image::RgbaImage;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::api::DesignService;
use crate::config::AppConfig;
use crate::internal::compose::{Composition, FittedReference, HANDLE_DIAMETER, compose_fitted};
use crate::internal::interaction::DragGesture;
use crate::internal::models::{Bitmap, ReferenceSource};
use crate::internal::notification::Notification;
use crate::internal::overlay::{OverlayMode, OverlayState};
use crate::internal::resolver::{ResolveError, Resolver};
use crate::internal::task::ResolutionTask;
use crate::internal::ui::keybindings::{Command, KeyBindingMap};
use crate::internal::ui::raster::RasterLayout;

use ratatui::Frame;
use ratatui::layout::Rect;

/// Messages delivered to the UI loop through the action channel.
#[derive(Debug)]
pub enum Action {
    ReferenceResolved(Result<Bitmap, ResolveError>),
}

/// Screen regions recorded while drawing, used to hit-test the pointer.
#[derive(Debug, Clone, Default)]
pub struct HitAreas {
    pub picker: Vec<(OverlayMode, Rect)>,
    pub slider: Option<Rect>,
    pub canvas: Option<RasterLayout>,
}

/// Terminal host for one overlay instance.
pub struct App {
    pub running: bool,
    pub app_version: String,
    pub config: AppConfig,
    pub overlay: OverlayState,
    pub source: ReferenceSource,
    pub live: RgbaImage,
    composition: Option<Composition>,
    fitted: Option<FittedReference>,
    pub show_help: bool,
    pub notification: Option<Notification>,
    pub spinner_state: usize,
    pub last_spinner_update: Option<tokio::time::Instant>,
    pub keybindings: KeyBindingMap,
    pub gesture: DragGesture,
    pub hit_areas: HitAreas,
    resolver: Resolver,
    credential: String,
    resolution: Option<ResolutionTask>,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

/// Attach an overlay comparing `live` against `source`, with default configuration.
pub fn compare_with(live: RgbaImage, source: ReferenceSource, initial_mode: OverlayMode) -> App {
    let mut config = AppConfig::default();
    config.overlay.initial_mode = initial_mode;
    let credential = config.network.access_token();
    App::new(config, live, source, credential)
}

impl App {
    #[tracing::instrument(skip_all, fields(source = %source))]
    pub fn new(
        config: AppConfig,
        live: RgbaImage,
        source: ReferenceSource,
        credential: String,
    ) -> Self {
        let start = std::time::Instant::now();
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let service = DesignService::new(
            &config.network,
            config.logging.enable_performance_metrics,
        );

        let mut keybindings =
            crate::internal::ui::keybindings_default::create_default_keybindings();
        if let Some(custom_bindings) = &config.keybindings {
            for conflict in
                crate::internal::ui::keybinding_validator::detect_conflicts(custom_bindings)
            {
                tracing::warn!("{}", conflict.description);
            }
            keybindings.merge_config(custom_bindings);
        }

        tracing::info!(
            "Overlay attached: live frame {}x{}, initial mode {}",
            live.width(),
            live.height(),
            config.overlay.initial_mode
        );

        let overlay = OverlayState::new(config.overlay.initial_mode);
        tracing::info!(elapsed = ?start.elapsed(), "App initialized");

        Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            config,
            overlay,
            source,
            live,
            composition: None,
            fitted: None,
            show_help: false,
            notification: None,
            spinner_state: 0,
            last_spinner_update: None,
            keybindings,
            gesture: DragGesture::default(),
            hit_areas: HitAreas::default(),
            resolver: Resolver::new(service),
            credential,
            resolution: None,
            action_tx,
            action_rx,
        }
    }

    /// Start resolving the reference. Only the first call per instance has an effect.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) {
        if self.resolution.is_some() {
            return;
        }
        tracing::info!("Resolving reference {}", self.source);
        self.resolution = Some(ResolutionTask::spawn(
            self.resolver.clone(),
            self.source.clone(),
            self.credential.clone(),
            self.action_tx.clone(),
            Action::ReferenceResolved,
        ));
    }

    pub fn notify_info(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::info(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    /// Current composition, recomputed after any state change.
    ///
    /// The resampled reference is kept until the reference or the frame size changes.
    pub fn composition(&mut self) -> &Composition {
        if let Some(reference) = self.overlay.resolved_image()
            && !self
                .fitted
                .as_ref()
                .is_some_and(|f| f.matches(reference, self.live.dimensions()))
        {
            tracing::debug!("Resampling reference for {:?}", self.live.dimensions());
            self.fitted = Some(FittedReference::new(reference, self.live.dimensions()));
        }

        let (live, overlay, fitted) = (&self.live, &self.overlay, self.fitted.as_ref());
        let enable_metrics = self.config.logging.enable_performance_metrics;
        self.composition.get_or_insert_with(|| {
            let start = std::time::Instant::now();
            let composed = compose_fitted(live, overlay, fitted);
            if enable_metrics {
                tracing::debug!(elapsed = ?start.elapsed(), mode = %overlay.mode(), "compose");
            }
            composed
        })
    }

    fn invalidate(&mut self) {
        self.composition = None;
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        self.mount();

        let mut event_interval = tokio::time::interval(Duration::from_millis(16));

        loop {
            // Update spinner animation every 100ms
            let now = tokio::time::Instant::now();
            match self.last_spinner_update {
                Some(last_update) if now.duration_since(last_update).as_millis() >= 100 => {
                    self.spinner_state = self.spinner_state.wrapping_add(1);
                    self.last_spinner_update = Some(now);
                }
                Some(_) => {}
                None => self.last_spinner_update = Some(now),
            }

            if let Some(notification) = &self.notification
                && notification.should_dismiss()
            {
                self.clear_notification();
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    while event::poll(Duration::from_millis(0))? {
                        match event::read()? {
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                self.handle_key_event(key);
                            }
                            Event::Mouse(mouse) => self.handle_mouse_event(mouse),
                            _ => {}
                        }
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action);
                }
            }

            if !self.running {
                break;
            }
        }

        if let Some(task) = self.resolution.take()
            && !task.is_finished()
        {
            tracing::info!("Detaching with resolution still in flight");
            task.cancel();
        }
        Ok(())
    }

    /// Wait for the next queued action and apply it. Returns false if the channel closed.
    pub async fn process_next_action(&mut self) -> bool {
        match self.action_rx.recv().await {
            Some(action) => {
                self.handle_action(action);
                true
            }
            None => false,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        // Help overlay traps input
        if self.show_help {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => self.show_help = false,
                _ => {}
            }
            return;
        }

        if let Some(command) = self
            .keybindings
            .get_command(&key, self.overlay.mode().into())
        {
            self.apply_command(command);
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.show_help {
            return;
        }
        let (column, row) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(mode) = self
                    .hit_areas
                    .picker
                    .iter()
                    .find(|(_, rect)| contains(rect, column, row))
                    .map(|(mode, _)| *mode)
                {
                    self.select_mode(mode);
                    return;
                }

                if let Some(slider) = self.hit_areas.slider
                    && contains(&slider, column, row)
                {
                    let ratio = match slider.width {
                        0 | 1 => 1.0,
                        w => (column - slider.x) as f32 / (w - 1) as f32,
                    };
                    self.set_opacity(ratio);
                    return;
                }

                self.begin_drag(column, row);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(layout) = self.hit_areas.canvas
                    && let Some(delta) = self.gesture.delta(layout.frame_x(column))
                    && self.overlay.drag_changed(delta)
                {
                    self.invalidate();
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(layout) = self.hit_areas.canvas
                    && let Some(delta) = self.gesture.end(layout.frame_x(column))
                {
                    tracing::debug!(delta, "Split drag ended");
                    self.overlay.drag_ended(delta);
                    self.invalidate();
                }
            }
            _ => {}
        }
    }

    fn begin_drag(&mut self, column: u16, row: u16) {
        let Some(layout) = self.hit_areas.canvas else {
            return;
        };
        if self.overlay.mode() != OverlayMode::Compare || !layout.contains(column, row) {
            return;
        }
        let Some(split_x) = self.composition().split_x else {
            return;
        };
        // The handle disc, or at least the split column itself
        let tolerance = (HANDLE_DIAMETER as f32 / 2.0).max(layout.pixels_per_column());
        if self.gesture.begin(layout.frame_x(column), split_x, tolerance) {
            tracing::debug!(split_x, "Split drag started");
        }
    }

    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.running = false,
            Command::ToggleHelp => self.show_help = !self.show_help,
            Command::SelectHidden => self.select_mode(OverlayMode::Hidden),
            Command::SelectLayered => self.select_mode(OverlayMode::Layered),
            Command::SelectCompare => self.select_mode(OverlayMode::Compare),
            Command::NextMode => self.select_mode(self.overlay.mode().next()),
            Command::PrevMode => self.select_mode(self.overlay.mode().prev()),
            Command::OpacityUp => {
                self.set_opacity(self.overlay.opacity() + self.config.overlay.opacity_step)
            }
            Command::OpacityDown => {
                self.set_opacity(self.overlay.opacity() - self.config.overlay.opacity_step)
            }
            Command::NudgeLeft => self.nudge(-self.config.overlay.nudge_step),
            Command::NudgeRight => self.nudge(self.config.overlay.nudge_step),
        }
    }

    pub fn select_mode(&mut self, mode: OverlayMode) {
        if self.overlay.set_mode(mode) {
            tracing::info!("Overlay mode: {}", mode);
            self.gesture.cancel();
            self.invalidate();
        }
    }

    /// The slider is only on screen in layered mode.
    fn set_opacity(&mut self, opacity: f32) {
        if self.overlay.mode() != OverlayMode::Layered {
            return;
        }
        self.overlay.set_opacity(opacity);
        self.invalidate();
    }

    fn nudge(&mut self, step: f32) {
        if self.gesture.is_active() {
            return;
        }
        if self.overlay.nudge_split(step) {
            self.invalidate();
        }
    }

    #[tracing::instrument(skip(self, action))]
    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::ReferenceResolved(outcome) => {
                let message = match &outcome {
                    Ok(bitmap) => Ok(format!(
                        "Reference loaded ({}x{})",
                        bitmap.width(),
                        bitmap.height()
                    )),
                    Err(e) => Err(format!("Reference unavailable: {}", e)),
                };
                if !self.overlay.apply_resolution(outcome) {
                    return;
                }
                match message {
                    Ok(msg) => self.notify_info(msg),
                    Err(msg) => self.notify_error(msg),
                }
                self.invalidate();
            }
        }
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.spinner_state % SPINNER.len()]
    }

    /// One-line description of where the reference stands.
    pub fn resolution_status(&self) -> String {
        match (self.overlay.resolved_image(), self.overlay.resolution_error()) {
            (Some(img), _) => format!("reference {}x{}", img.width(), img.height()),
            (None, Some(_)) => "reference failed".to_string(),
            (None, None) => format!("{} resolving", self.get_spinner_char()),
        }
    }

    pub fn ui(&mut self, f: &mut Frame) {
        super::view::draw(self, f);
    }
}

fn contains(rect: &Rect, column: u16, row: u16) -> bool {
    column >= rect.x && column < rect.x + rect.width && row >= rect.y && row < rect.y + rect.height
}
