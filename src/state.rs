//! Application state: the single owner of canvas, grid, colors, the tool
//! machine and storage. Every UI event lands on one of its methods, runs to
//! completion, and writes the affected state through to storage.

use crate::canvas::{RasterCanvas, RenderSurface};
use crate::color::{ColorState, Preset, Rgb};
use crate::grid::{FIELD_SIZE, Grid, GridPoint, PixelsPerSide};
use crate::snapshot::SnapshotLoader;
use crate::store::PersistenceStore;
use crate::tools::{PointerEvent, Tool, ToolAction, ToolController, ToolEffect};

/// Color the clear action paints with.
pub const BACKGROUND: Rgb = Rgb::WHITE;

pub struct AppState {
    canvas: RasterCanvas,
    grid: Grid,
    colors: ColorState,
    tools: ToolController,
    store: PersistenceStore,
    /// Snapshot decode still in flight, if any.
    pending_restore: Option<SnapshotLoader>,
    /// Bumped whenever canvas pixels change, so the view knows to re-upload.
    revision: u64,
}

impl AppState {
    /// Restore from storage, healing missing keys. A stored snapshot is
    /// decoded in the background; see [`AppState::poll_restore`].
    pub fn new(mut store: PersistenceStore) -> Self {
        let restored = store.restore();
        log::info!(
            "restored state: tool={} pixels={} current={} previous={:?}",
            restored.tool.id(),
            restored.pixels_per_side.get(),
            restored.colors.current,
            restored.colors.previous.map(|c| c.to_string()),
        );

        let mut state = Self {
            canvas: RasterCanvas::new(FIELD_SIZE),
            grid: Grid::new(restored.pixels_per_side),
            colors: restored.colors,
            tools: ToolController::new(restored.tool),
            store,
            pending_restore: None,
            revision: 0,
        };

        match restored.snapshot {
            Some(data_url) => state.pending_restore = Some(SnapshotLoader::spawn(data_url)),
            None => state.save_snapshot(),
        }
        state
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn canvas(&self) -> &RasterCanvas {
        &self.canvas
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn colors(&self) -> ColorState {
        self.colors
    }

    pub fn active_tool(&self) -> Tool {
        self.tools.active()
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_restoring(&self) -> bool {
        self.pending_restore.is_some()
    }

    // ------------------------------------------------------------------------
    // Snapshot restore
    // ------------------------------------------------------------------------

    /// Draw the restored snapshot once it has been decoded. Returns `true`
    /// on the call that changed the canvas.
    pub fn poll_restore(&mut self) -> bool {
        let Some(loader) = &self.pending_restore else { return false };
        let Some(result) = loader.try_take() else { return false };
        self.pending_restore = None;

        match result {
            Ok(image) => {
                self.canvas.draw_image(&image);
                self.revision += 1;
                log::info!("canvas snapshot restored ({}x{})", image.width(), image.height());
                // strokes saved while decoding hold a blank background
                self.save_snapshot();
                true
            }
            Err(e) => {
                log::warn!("discarding unreadable canvas snapshot: {e}");
                self.save_snapshot();
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Tools
    // ------------------------------------------------------------------------

    pub fn select_tool(&mut self, tool: Tool) {
        self.tools.select(tool);
        self.store.save_tool(tool);
        log::debug!("tool -> {}", tool.id());
    }

    pub fn apply_action(&mut self, action: ToolAction) {
        match action {
            ToolAction::Select(tool) => self.select_tool(tool),
            ToolAction::Clear => self.clear(),
        }
    }

    /// Hotkey entry point; unknown keys are ignored.
    pub fn hotkey(&mut self, key: char) {
        if let Some(action) = ToolAction::for_hotkey(key) {
            self.apply_action(action);
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let effects = self.tools.handle(event, &self.grid);
        for effect in effects {
            self.apply_effect(effect);
        }
    }

    fn apply_effect(&mut self, effect: ToolEffect) {
        match effect {
            ToolEffect::PaintCells(cells) => self.paint_cells(&cells),
            ToolEffect::FillGrid => self.fill_grid(self.colors.current),
            ToolEffect::Sample(pos) => {
                if let Some(color) = self.canvas.pixel_at(pos.x, pos.y) {
                    self.colors.eyedrop(color);
                    self.store.save_colors(&self.colors);
                }
            }
            ToolEffect::SaveSnapshot => self.save_snapshot(),
        }
    }

    fn paint_cells(&mut self, cells: &[GridPoint]) {
        let color = self.colors.current;
        for &cell in cells {
            self.canvas.fill_rect(self.grid.cell_rect(cell), color);
        }
        self.revision += 1;
    }

    fn fill_grid(&mut self, color: Rgb) {
        self.canvas.fill_rect(self.grid.visible_area(), color);
        self.revision += 1;
    }

    /// Wipe the grid to the background color. The active tool is unchanged.
    pub fn clear(&mut self) {
        self.fill_grid(BACKGROUND);
        self.save_snapshot();
    }

    fn save_snapshot(&mut self) {
        match self.canvas.export_snapshot() {
            Ok(data_url) => self.store.save_snapshot(&data_url),
            Err(e) => log::warn!("could not encode canvas snapshot: {e}"),
        }
    }

    // ------------------------------------------------------------------------
    // Colors
    // ------------------------------------------------------------------------

    pub fn pick_color(&mut self, color: Rgb) {
        self.colors.pick(color);
        self.store.save_colors(&self.colors);
    }

    pub fn swap_colors(&mut self) {
        if self.colors.swap() {
            self.store.save_colors(&self.colors);
        }
    }

    pub fn select_preset(&mut self, preset: Preset) {
        self.colors.preset(preset);
        self.store.save_colors(&self.colors);
    }

    // ------------------------------------------------------------------------
    // Grid
    // ------------------------------------------------------------------------

    /// Change the grid resolution. Existing pixels stay as they are; only
    /// later strokes use the new cell size.
    pub fn set_pixels_per_side(&mut self, pixels: PixelsPerSide) {
        self.grid = Grid::new(pixels);
        self.store.save_pixels_per_side(pixels);
        log::debug!("grid -> {}x{}", pixels.get(), pixels.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, keys};
    use eframe::egui::pos2;
    use pretty_assertions::assert_eq;

    fn fresh() -> AppState {
        AppState::new(PersistenceStore::new(MemoryStore::new()))
    }

    #[test]
    fn every_key_is_present_after_startup() {
        let state = fresh();
        for key in [keys::CURRENT_COLOR, keys::PREV_COLOR, keys::PIXELS, keys::SELECTED_TOOL, keys::SNAPSHOT] {
            assert!(state.store().raw(key).is_some(), "missing {key}");
        }
        assert!(!state.is_restoring());
    }

    #[test]
    fn clear_keeps_tool_and_whitens_grid() {
        let mut state = fresh();
        state.select_tool(Tool::Fill);
        state.pick_color(Rgb::new(9, 9, 9));
        state.handle_pointer(PointerEvent::Click(pos2(10.0, 10.0)));
        assert_eq!(state.canvas().pixel_at(500.0, 500.0), Some(Rgb::new(9, 9, 9)));

        state.hotkey('r');
        assert_eq!(state.active_tool(), Tool::Fill);
        assert_eq!(state.canvas().pixel_at(500.0, 500.0), Some(BACKGROUND));
    }

    #[test]
    fn eyedropper_adopts_canvas_color() {
        let mut state = fresh();
        state.select_preset(Preset::Blue);
        state.handle_pointer(PointerEvent::Down(pos2(10.0, 10.0)));
        state.handle_pointer(PointerEvent::Up(pos2(10.0, 10.0)));

        state.pick_color(Rgb::BLACK);
        state.hotkey('c');
        state.handle_pointer(PointerEvent::Click(pos2(20.0, 20.0)));
        assert_eq!(state.colors(), ColorState::new(Preset::Blue.color(), Some(Rgb::BLACK)));
    }

    #[test]
    fn revision_tracks_canvas_changes() {
        let mut state = fresh();
        let before = state.revision();
        state.handle_pointer(PointerEvent::Move(pos2(1.0, 1.0)));
        assert_eq!(state.revision(), before);
        state.handle_pointer(PointerEvent::Down(pos2(1.0, 1.0)));
        assert!(state.revision() > before);
    }
}
