use eframe::egui::Pos2;

use crate::grid::{Grid, GridPoint};
use crate::line::LinePath;

// ============================================================================
// TOOLS
// ============================================================================

/// Persistent tool modes. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Pencil,
    Fill,
    Eyedropper,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::Pencil, Tool::Fill, Tool::Eyedropper]
    }

    /// Identifier used in storage.
    pub fn id(self) -> &'static str {
        match self {
            Tool::Pencil => "pencil",
            Tool::Fill => "fill",
            Tool::Eyedropper => "eyedropper",
        }
    }

    pub fn from_id(id: &str) -> Option<Tool> {
        match id.trim() {
            "pencil" => Some(Tool::Pencil),
            "fill" => Some(Tool::Fill),
            // older saves call the eyedropper "color"
            "eyedropper" | "color" => Some(Tool::Eyedropper),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Fill => "Fill",
            Tool::Eyedropper => "Eyedropper",
        }
    }

    /// Pointer events this tool listens to.
    pub const fn handlers(self) -> HandlerSet {
        match self {
            Tool::Pencil => HandlerSet::STROKE,
            Tool::Fill | Tool::Eyedropper => HandlerSet::CLICK,
        }
    }
}

/// Anything a tool button or hotkey can trigger. `Clear` happens immediately
/// and leaves the active tool alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolAction {
    Select(Tool),
    Clear,
}

impl ToolAction {
    /// B → fill, P → pencil, C → eyedropper, R → clear.
    pub fn for_hotkey(key: char) -> Option<ToolAction> {
        match key.to_ascii_uppercase() {
            'B' => Some(ToolAction::Select(Tool::Fill)),
            'P' => Some(ToolAction::Select(Tool::Pencil)),
            'C' => Some(ToolAction::Select(Tool::Eyedropper)),
            'R' => Some(ToolAction::Clear),
            _ => None,
        }
    }
}

// ============================================================================
// POINTER EVENTS & DISPATCH TABLE
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Down,
    Move,
    Up,
    Click,
}

/// Pointer input in canvas-relative coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    Click(Pos2),
}

impl PointerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PointerEvent::Down(_) => EventKind::Down,
            PointerEvent::Move(_) => EventKind::Move,
            PointerEvent::Up(_) => EventKind::Up,
            PointerEvent::Click(_) => EventKind::Click,
        }
    }

    pub fn pos(&self) -> Pos2 {
        match *self {
            PointerEvent::Down(p)
            | PointerEvent::Move(p)
            | PointerEvent::Up(p)
            | PointerEvent::Click(p) => p,
        }
    }
}

/// Which event kinds are wired to the active tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerSet {
    pub down: bool,
    pub moved: bool,
    pub up: bool,
    pub click: bool,
}

impl HandlerSet {
    pub const STROKE: HandlerSet = HandlerSet { down: true, moved: true, up: true, click: false };
    pub const CLICK: HandlerSet = HandlerSet { down: false, moved: false, up: false, click: true };

    pub fn accepts(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Down => self.down,
            EventKind::Move => self.moved,
            EventKind::Up => self.up,
            EventKind::Click => self.click,
        }
    }
}

/// What a handler asks the application to do. Applied in order.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolEffect {
    /// Paint these cells with the current color.
    PaintCells(Vec<GridPoint>),
    /// Paint the whole visible grid with the current color.
    FillGrid,
    /// Pick up the color under this canvas position.
    Sample(Pos2),
    /// Write the canvas bitmap through to storage.
    SaveSnapshot,
}

// ============================================================================
// STROKE
// ============================================================================

/// Transient pencil state. Only meaningful between pointer-down and pointer-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerStroke {
    pub is_drawing: bool,
    pub last_point: Option<GridPoint>,
}

impl PointerStroke {
    pub fn begin(&mut self, at: GridPoint) {
        self.is_drawing = true;
        self.last_point = Some(at);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// TOOL CONTROLLER
// ============================================================================

/// Finite state machine over [`Tool`]. The installed handler set always
/// matches the active tool because both change only in [`ToolController::select`].
#[derive(Debug)]
pub struct ToolController {
    active: Tool,
    handlers: HandlerSet,
    stroke: PointerStroke,
}

impl ToolController {
    pub fn new(initial: Tool) -> Self {
        Self {
            active: initial,
            handlers: initial.handlers(),
            stroke: PointerStroke::default(),
        }
    }

    pub fn active(&self) -> Tool {
        self.active
    }

    pub fn handlers(&self) -> HandlerSet {
        self.handlers
    }

    pub fn stroke(&self) -> PointerStroke {
        self.stroke
    }

    pub fn is_drawing(&self) -> bool {
        self.stroke.is_drawing
    }

    /// Tear down the current tool's handlers (dropping any stroke in flight)
    /// and install the new tool's.
    pub fn select(&mut self, tool: Tool) {
        self.stroke.reset();
        self.active = tool;
        self.handlers = tool.handlers();
    }

    /// Route one pointer event to the active tool. Events the tool does not
    /// listen to produce nothing.
    pub fn handle(&mut self, event: PointerEvent, grid: &Grid) -> Vec<ToolEffect> {
        if !self.handlers.accepts(event.kind()) {
            return Vec::new();
        }
        match self.active {
            Tool::Pencil => self.pencil(event, grid),
            Tool::Fill => vec![ToolEffect::FillGrid, ToolEffect::SaveSnapshot],
            Tool::Eyedropper => vec![ToolEffect::Sample(event.pos())],
        }
    }

    fn pencil(&mut self, event: PointerEvent, grid: &Grid) -> Vec<ToolEffect> {
        let pos = event.pos();
        let cell = grid.cell_of(pos.x, pos.y);
        match event {
            PointerEvent::Down(_) => {
                self.stroke.begin(cell);
                vec![ToolEffect::PaintCells(vec![cell]), ToolEffect::SaveSnapshot]
            }
            PointerEvent::Move(_) => {
                if !self.stroke.is_drawing {
                    self.stroke.last_point = None;
                    return Vec::new();
                }
                let path = match self.stroke.last_point {
                    Some(last) => LinePath::new(last, cell).collect(),
                    None => vec![cell],
                };
                self.stroke.last_point = Some(cell);
                vec![ToolEffect::PaintCells(path), ToolEffect::SaveSnapshot]
            }
            PointerEvent::Up(_) => {
                if !self.stroke.is_drawing {
                    return Vec::new();
                }
                self.stroke.reset();
                vec![ToolEffect::PaintCells(vec![cell]), ToolEffect::SaveSnapshot]
            }
            PointerEvent::Click(_) => Vec::new(),
        }
    }
}

impl Default for ToolController {
    fn default() -> Self {
        Self::new(Tool::default())
    }
}
