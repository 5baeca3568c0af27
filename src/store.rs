use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::color::{ColorState, Rgb};
use crate::error::Result;
use crate::grid::PixelsPerSide;
use crate::tools::Tool;

/// Storage keys. These match what the browser build kept in local storage,
/// so exported state files stay interchangeable.
pub mod keys {
    pub const CURRENT_COLOR: &str = "currentColor";
    pub const PREV_COLOR: &str = "prevColor";
    pub const PIXELS: &str = "pixels";
    pub const SELECTED_TOOL: &str = "selectedTool";
    pub const SNAPSHOT: &str = "saved data";
}

/// Stored form of an absent previous color.
const NO_COLOR: &str = "none";

/// Synchronous string key/value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    /// Drop every key.
    fn clear(&mut self);
}

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Default, Debug, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

// ============================================================================
// FileStore: write-through key=value file
// ============================================================================

/// Every `set` rewrites the whole file, one `key=value` per line. Keys never
/// contain `=` or newlines and values never contain newlines, so the first
/// `=` on a line always separates the two.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "pixelpad_state.cfg";

    /// Open (or start) the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut values = BTreeMap::new();
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                for line in content.lines() {
                    let Some((key, val)) = line.split_once('=') else { continue };
                    values.insert(key.trim().to_string(), val.trim().to_string());
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Platform config directory for the state file.
    /// On Linux:   ~/.config/pixelpad/  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PixelPad\
    /// On macOS:   ~/Library/Application Support/PixelPad/
    pub fn default_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| ".".to_string());
            return PathBuf::from(appdata).join("PixelPad");
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("PixelPad");
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("pixelpad")
        }
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = String::new();
        for (key, val) in &self.values {
            content.push_str(key);
            content.push('=');
            content.push_str(val);
            content.push('\n');
        }

        // temp file + rename: the old file stays whole until the new one is complete
        let temp_path = self.temp_path();
        let write_result = (|| -> std::io::Result<()> {
            let mut file = std::fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()
        })();
        if let Err(e) = write_result.and_then(|()| std::fs::rename(&temp_path, &self.path)) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| Self::FILE_NAME.into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn flush_or_log(&self) {
        if let Err(e) = self.flush() {
            log::warn!("could not write {}: {}", self.path.display(), e);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.values.get(key).is_some_and(|v| v == value) {
            return;
        }
        self.values.insert(key.to_string(), value.to_string());
        self.flush_or_log();
    }

    fn clear(&mut self) {
        self.values.clear();
        self.flush_or_log();
    }
}

// ============================================================================
// PersistenceStore: typed view over the raw store
// ============================================================================

/// Everything restored at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct PersistedState {
    pub colors: ColorState,
    pub pixels_per_side: PixelsPerSide,
    pub tool: Tool,
    /// Encoded canvas bitmap, decoded later off the UI thread.
    pub snapshot: Option<String>,
}

pub struct PersistenceStore {
    backend: Box<dyn KeyValueStore>,
}

impl PersistenceStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.backend.get(key)
    }

    pub fn reset(&mut self) {
        self.backend.clear();
    }

    pub fn save_colors(&mut self, colors: &ColorState) {
        self.backend.set(keys::CURRENT_COLOR, &colors.current.to_string());
        let prev = colors.previous.map(|c| c.to_string());
        self.backend.set(keys::PREV_COLOR, prev.as_deref().unwrap_or(NO_COLOR));
    }

    pub fn save_pixels_per_side(&mut self, pixels: PixelsPerSide) {
        self.backend.set(keys::PIXELS, &pixels.get().to_string());
    }

    pub fn save_tool(&mut self, tool: Tool) {
        self.backend.set(keys::SELECTED_TOOL, tool.id());
    }

    pub fn save_snapshot(&mut self, data_url: &str) {
        self.backend.set(keys::SNAPSHOT, data_url);
    }

    pub fn load_snapshot(&self) -> Option<String> {
        self.backend.get(keys::SNAPSHOT).filter(|s| !s.is_empty())
    }

    /// Load every key independently. Missing or undecodable values fall back
    /// to the default, which is written straight back so every key is present
    /// afterwards. The snapshot has no default here; the caller stores the
    /// blank canvas when none was found.
    pub fn restore(&mut self) -> PersistedState {
        let defaults = ColorState::default();

        let current = self.load_or_heal(keys::CURRENT_COLOR, Rgb::parse, defaults.current, |c| c.to_string());
        let previous = self.load_or_heal(
            keys::PREV_COLOR,
            |raw| match raw.trim() {
                NO_COLOR => Some(None),
                other => Rgb::parse(other).map(Some),
            },
            defaults.previous,
            |c| c.map_or_else(|| NO_COLOR.to_string(), |c| c.to_string()),
        );
        let pixels_per_side = self.load_or_heal(
            keys::PIXELS,
            PixelsPerSide::parse,
            PixelsPerSide::DEFAULT,
            |p| p.get().to_string(),
        );
        let tool = self.load_or_heal(keys::SELECTED_TOOL, Tool::from_id, Tool::default(), |t| {
            t.id().to_string()
        });

        PersistedState {
            colors: ColorState::new(current, previous),
            pixels_per_side,
            tool,
            snapshot: self.load_snapshot(),
        }
    }

    fn load_or_heal<T: Copy>(
        &mut self,
        key: &str,
        decode: impl Fn(&str) -> Option<T>,
        default: T,
        encode: impl Fn(T) -> String,
    ) -> T {
        match self.backend.get(key) {
            Some(raw) => match decode(&raw) {
                Some(value) => value,
                None => {
                    log::warn!("ignoring malformed {key:?} value {raw:?}, using default");
                    self.backend.set(key, &encode(default));
                    default
                }
            },
            None => {
                log::debug!("no stored {key:?}, writing default");
                self.backend.set(key, &encode(default));
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Preset;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// MemoryStore whose contents stay observable after being boxed.
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key)
        }
        fn set(&mut self, key: &str, value: &str) {
            self.0.borrow_mut().set(key, value);
        }
        fn clear(&mut self) {
            self.0.borrow_mut().clear();
        }
    }

    #[test]
    fn restore_on_empty_store_writes_defaults() {
        let shared = SharedStore::default();
        let mut store = PersistenceStore::new(shared.clone());

        let state = store.restore();
        assert_eq!(state.colors, ColorState::default());
        assert_eq!(state.pixels_per_side, PixelsPerSide::DEFAULT);
        assert_eq!(state.tool, Tool::Pencil);
        assert_eq!(state.snapshot, None);

        assert_eq!(shared.get(keys::CURRENT_COLOR).as_deref(), Some("rgb(0, 0, 0)"));
        assert_eq!(shared.get(keys::PREV_COLOR).as_deref(), Some("none"));
        assert_eq!(shared.get(keys::PIXELS).as_deref(), Some("4"));
        assert_eq!(shared.get(keys::SELECTED_TOOL).as_deref(), Some("pencil"));
    }

    #[test]
    fn restore_reads_stored_values() {
        let mut raw = MemoryStore::new();
        raw.set(keys::CURRENT_COLOR, "#0080ff");
        raw.set(keys::PREV_COLOR, "rgb(254, 1, 96)");
        raw.set(keys::PIXELS, "32");
        raw.set(keys::SELECTED_TOOL, "color");
        raw.set(keys::SNAPSHOT, "data:image/png;base64,AAAA");

        let state = PersistenceStore::new(raw).restore();
        assert_eq!(
            state.colors,
            ColorState::new(Preset::Blue.color(), Some(Preset::Red.color()))
        );
        assert_eq!(state.pixels_per_side.get(), 32);
        assert_eq!(state.tool, Tool::Eyedropper);
        assert_eq!(state.snapshot.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn malformed_values_fall_back_and_heal() {
        let shared = SharedStore::default();
        {
            let mut raw = shared.clone();
            raw.set(keys::PIXELS, "lots");
            raw.set(keys::CURRENT_COLOR, "purple-ish");
            raw.set(keys::SELECTED_TOOL, "lasso");
        }
        let state = PersistenceStore::new(shared.clone()).restore();

        assert_eq!(state.pixels_per_side, PixelsPerSide::DEFAULT);
        assert_eq!(state.colors.current, Rgb::BLACK);
        assert_eq!(state.tool, Tool::Pencil);
        assert_eq!(shared.get(keys::PIXELS).as_deref(), Some("4"));
        assert_eq!(shared.get(keys::SELECTED_TOOL).as_deref(), Some("pencil"));
    }

    #[test]
    fn saved_colors_match_memory() {
        let shared = SharedStore::default();
        let mut store = PersistenceStore::new(shared.clone());
        let mut colors = ColorState::default();

        colors.preset(Preset::Red);
        store.save_colors(&colors);
        assert_eq!(store.restore().colors, colors);

        colors.swap();
        store.save_colors(&colors);
        assert_eq!(shared.get(keys::PREV_COLOR).as_deref(), Some("none"));
        assert_eq!(store.restore().colors, colors);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("pixelpad-store-{}", std::process::id()));
        let path = dir.join(FileStore::FILE_NAME);
        let _ = std::fs::remove_file(&path);

        let url = "data:image/png;base64,iVBORw0KGgo=";
        {
            let mut store = FileStore::open(&path).unwrap();
            assert_eq!(store.get(keys::SNAPSHOT), None);
            store.set(keys::SNAPSHOT, url);
            store.set(keys::PIXELS, "16");
        }
        let mut reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::SNAPSHOT).as_deref(), Some(url));
        assert_eq!(reopened.get(keys::PIXELS).as_deref(), Some("16"));

        reopened.clear();
        assert_eq!(FileStore::open(&path).unwrap().get(keys::PIXELS), None);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_replaces_file_without_leaving_temp_behind() {
        let dir = std::env::temp_dir().join(format!("pixelpad-atomic-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join(FileStore::FILE_NAME);

        let mut store = FileStore::open(&path).unwrap();
        store.set(keys::PIXELS, "32");
        store.set(keys::SELECTED_TOOL, "fill");

        let temp = store.temp_path();
        assert_eq!(temp.parent(), path.parent());
        assert!(!temp.exists());

        // a stale temp file from an interrupted write is simply replaced
        std::fs::write(&temp, "pixels=garbage").unwrap();
        store.set(keys::PIXELS, "64");
        assert!(!temp.exists());

        let names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![FileStore::FILE_NAME.to_string()]);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::PIXELS).as_deref(), Some("64"));
        assert_eq!(reopened.get(keys::SELECTED_TOOL).as_deref(), Some("fill"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
