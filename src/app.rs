use std::time::Duration;

use eframe::egui;
use egui::{Color32, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions, pos2, vec2};

use pixelpad::AppState;
use pixelpad::color::{Preset, Rgb};
use pixelpad::grid::{FIELD_SIZE, GridPoint, PixelsPerSide};
use pixelpad::store::PersistenceStore;
use pixelpad::tools::{PointerEvent, Tool, ToolAction};

/// Swatch shown while there is no previous color to swap back to.
const PREV_PLACEHOLDER: Color32 = Color32::from_rgb(216, 216, 216);
const SWATCH_SIZE: f32 = 24.0;
/// Grid lines get too dense to be useful above this resolution.
const MAX_GRID_OVERLAY: u32 = 64;

pub struct PixelPadApp {
    state: AppState,
    texture: Option<TextureHandle>,
    uploaded_revision: u64,
    show_grid: bool,
    /// Working value of the color picker. Committed once its popup closes so
    /// that dragging through the picker records a single color change.
    picker: [u8; 3],
    picker_dirty: bool,
    hover_cell: Option<GridPoint>,
}

impl PixelPadApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, store: PersistenceStore) -> Self {
        let state = AppState::new(store);
        let picker = state.colors().current.to_array();
        Self {
            state,
            texture: None,
            uploaded_revision: 0,
            show_grid: true,
            picker,
            picker_dirty: false,
            hover_cell: None,
        }
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    fn handle_hotkeys(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let keys: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Key {
                        key,
                        pressed: true,
                        repeat: false,
                        ..
                    } => hotkey_char(*key),
                    _ => None,
                })
                .collect()
        });
        for key in keys {
            if key == 'g' {
                self.show_grid = !self.show_grid;
            } else {
                self.state.hotkey(key);
            }
        }
    }

    /// Translate egui pointer state into canvas-relative pointer events.
    fn forward_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let origin = response.rect.min;
        let (pressed, released, moving, latest) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.latest_pos(),
            )
        });
        let Some(latest) = latest else { return };
        let local = Pos2::ZERO + (latest - origin);

        self.hover_cell = response
            .hover_pos()
            .map(|p| self.state.grid().cell_of(p.x - origin.x, p.y - origin.y));

        let frame = PointerFrame {
            pressed,
            released,
            moving,
            hovered: response.hovered(),
            clicked: response.clicked(),
        };
        for event in frame.events(local, self.state.tools().is_drawing()) {
            self.state.handle_pointer(event);
        }
    }

    // ========================================================================
    // TOOLBAR
    // ========================================================================

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for &tool in Tool::all() {
                let active = self.state.active_tool() == tool;
                if ui
                    .selectable_label(active, tool.label())
                    .on_hover_text(tool_hint(tool))
                    .clicked()
                {
                    self.state.select_tool(tool);
                }
            }
            if ui.button("Clear").on_hover_text("Clear canvas (R)").clicked() {
                self.state.apply_action(ToolAction::Clear);
            }

            ui.separator();

            let current_res = self.state.grid().pixels_per_side;
            for &n in PixelsPerSide::OPTIONS.iter() {
                let Some(res) = PixelsPerSide::new(n) else { continue };
                if ui
                    .selectable_label(current_res == res, format!("{n}×{n}"))
                    .clicked()
                {
                    self.state.set_pixels_per_side(res);
                }
            }

            ui.separator();

            let colors = self.state.colors();
            swatch(ui, colors.current.into(), true).on_hover_text("Current color");
            if ui.color_edit_button_srgb(&mut self.picker).changed() {
                self.picker_dirty = true;
            }

            let prev_fill = colors.previous.map_or(PREV_PLACEHOLDER, Color32::from);
            if swatch(ui, prev_fill, colors.can_swap())
                .on_hover_text("Back to previous color")
                .clicked()
            {
                self.state.swap_colors();
            }

            for &preset in Preset::all() {
                let tip = match preset {
                    Preset::Red => "Red",
                    Preset::Blue => "Blue",
                };
                if swatch(ui, preset.color().into(), true).on_hover_text(tip).clicked() {
                    self.state.select_preset(preset);
                }
            }
        });
    }

    /// Commit the picker value after its popup has closed.
    fn commit_picker(&mut self, ctx: &egui::Context) {
        if !self.picker_dirty || ctx.memory(|m| m.any_popup_open()) {
            return;
        }
        self.picker_dirty = false;
        let picked = Rgb::from(self.picker);
        if picked != self.state.colors().current {
            self.state.pick_color(picked);
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let n = self.state.grid().pixels_per_side.get();
            ui.label(format!("{} · {n}×{n}", self.state.active_tool().label()));
            if let Some(cell) = self.hover_cell {
                ui.separator();
                ui.label(format!("cell {}, {}", cell.x, cell.y));
            }
            if self.state.is_restoring() {
                ui.separator();
                ui.label("Restoring drawing…");
            }
        });
    }

    // ========================================================================
    // CANVAS
    // ========================================================================

    fn sync_texture(&mut self, ctx: &egui::Context) {
        let revision = self.state.revision();
        match &mut self.texture {
            Some(_) if self.uploaded_revision == revision => return,
            Some(texture) => texture.set(self.state.canvas().to_color_image(), TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture(
                    "pixelpad-canvas",
                    self.state.canvas().to_color_image(),
                    TextureOptions::NEAREST,
                ));
            }
        }
        self.uploaded_revision = revision;
    }

    fn canvas_view(&mut self, ui: &mut egui::Ui) {
        let side = FIELD_SIZE as f32;
        let (response, painter) = ui.allocate_painter(vec2(side, side), Sense::click_and_drag());
        let rect = response.rect;

        self.sync_texture(ui.ctx());
        if let Some(texture) = &self.texture {
            let uv = Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0));
            painter.image(texture.id(), rect, uv, Color32::WHITE);
        }

        let grid = self.state.grid();
        let n = grid.pixels_per_side.get();
        if self.show_grid && n <= MAX_GRID_OVERLAY {
            let stroke = Stroke::new(1.0, Color32::from_black_alpha(28));
            let scale = grid.scale();
            for i in 1..n {
                let offset = i as f32 * scale;
                painter.line_segment(
                    [pos2(rect.min.x + offset, rect.min.y), pos2(rect.min.x + offset, rect.max.y)],
                    stroke,
                );
                painter.line_segment(
                    [pos2(rect.min.x, rect.min.y + offset), pos2(rect.max.x, rect.min.y + offset)],
                    stroke,
                );
            }
        }
        painter.rect_stroke(rect, 0.0, Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color));

        self.forward_pointer(ui, &response);
    }
}

impl eframe::App for PixelPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_restore() {
            ctx.request_repaint();
        }
        if self.state.is_restoring() {
            ctx.request_repaint_after(Duration::from_millis(16));
        }

        self.handle_hotkeys(ctx);
        if !self.picker_dirty {
            self.picker = self.state.colors().current.to_array();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| self.canvas_view(ui));
        });

        self.commit_picker(ctx);
    }
}

/// Primary-button state over the canvas for one frame.
#[derive(Clone, Copy, Default)]
struct PointerFrame {
    pressed: bool,
    released: bool,
    moving: bool,
    hovered: bool,
    clicked: bool,
}

impl PointerFrame {
    /// Events to feed the tool controller, in order. A press only counts over
    /// the canvas; moves and the release keep following a stroke that left it.
    fn events(self, at: Pos2, mut drawing: bool) -> Vec<PointerEvent> {
        let mut events = Vec::new();
        if self.pressed && self.hovered {
            events.push(PointerEvent::Down(at));
            drawing = true;
        } else if self.moving && (self.hovered || drawing) {
            events.push(PointerEvent::Move(at));
        }
        if self.released && drawing {
            events.push(PointerEvent::Up(at));
        }
        if self.clicked {
            events.push(PointerEvent::Click(at));
        }
        events
    }
}

fn hotkey_char(key: egui::Key) -> Option<char> {
    match key {
        egui::Key::B => Some('b'),
        egui::Key::P => Some('p'),
        egui::Key::C => Some('c'),
        egui::Key::R => Some('r'),
        egui::Key::G => Some('g'),
        _ => None,
    }
}

fn tool_hint(tool: Tool) -> &'static str {
    match tool {
        Tool::Pencil => "Draw cell by cell (P)",
        Tool::Fill => "Fill the whole grid (B)",
        Tool::Eyedropper => "Pick a color from the canvas (C)",
    }
}

fn swatch(ui: &mut egui::Ui, color: Color32, enabled: bool) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(vec2(SWATCH_SIZE, SWATCH_SIZE), Sense::click());
    if ui.is_rect_visible(rect) {
        let p = ui.painter();
        let fill = if enabled { color } else { color.gamma_multiply(0.45) };
        p.rect_filled(rect, 3.0, fill);
        p.rect_stroke(rect, 3.0, Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const AT: Pos2 = pos2(40.0, 12.0);

    #[test]
    fn press_over_canvas_starts_a_stroke() {
        let frame = PointerFrame { pressed: true, moving: true, hovered: true, ..Default::default() };
        assert_eq!(frame.events(AT, false), vec![PointerEvent::Down(AT)]);
    }

    #[test]
    fn press_outside_canvas_is_ignored() {
        let frame = PointerFrame { pressed: true, ..Default::default() };
        assert!(frame.events(AT, false).is_empty());
    }

    #[test]
    fn drag_keeps_moving_after_leaving_canvas() {
        let frame = PointerFrame { moving: true, ..Default::default() };
        assert_eq!(frame.events(AT, true), vec![PointerEvent::Move(AT)]);
        assert!(frame.events(AT, false).is_empty());

        let hover = PointerFrame { moving: true, hovered: true, ..Default::default() };
        assert_eq!(hover.events(AT, false), vec![PointerEvent::Move(AT)]);
    }

    #[test]
    fn release_ends_only_an_active_stroke() {
        let frame = PointerFrame { released: true, ..Default::default() };
        assert_eq!(frame.events(AT, true), vec![PointerEvent::Up(AT)]);
        assert!(frame.events(AT, false).is_empty());
    }

    #[test]
    fn quick_tap_yields_down_up_click() {
        let frame = PointerFrame {
            pressed: true,
            released: true,
            hovered: true,
            clicked: true,
            ..Default::default()
        };
        assert_eq!(
            frame.events(AT, false),
            vec![PointerEvent::Down(AT), PointerEvent::Up(AT), PointerEvent::Click(AT)]
        );
    }
}
