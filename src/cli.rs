// ============================================================================
// PixelPad CLI: startup options and headless snapshot export
// ============================================================================
//
// Usage examples:
//   pixelpad                                  (open the pad with saved state)
//   pixelpad --data-dir ./scratch             (keep state somewhere else)
//   pixelpad --ephemeral                      (nothing touches disk)
//   pixelpad --export drawing.png             (write the saved canvas, no GUI)

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use pixelpad::snapshot;
use pixelpad::store::{FileStore, PersistenceStore};

#[derive(Parser, Debug)]
#[command(
    name = "pixelpad",
    about = "Grid-snapped pixel-art pad",
    long_about = "Draw on a 512×512 canvas split into a grid of square cells.\n\
                  Colors, tool, grid size and the drawing itself are saved after\n\
                  every change and restored on the next start."
)]
pub struct CliArgs {
    /// Directory holding the saved state file.
    /// Defaults to the platform config directory.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep all state in memory; nothing is read from or written to disk.
    #[arg(long, conflicts_with = "data_dir")]
    pub ephemeral: bool,

    /// Forget everything saved before starting.
    #[arg(long)]
    pub reset: bool,

    /// Write the saved canvas to a PNG file and exit without opening a window.
    #[arg(long, value_name = "FILE.png")]
    pub export: Option<PathBuf>,

    /// Log debug detail to the session log.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(FileStore::default_dir)
            .join(FileStore::FILE_NAME)
    }

    /// Open the configured store. An unreadable state file degrades to an
    /// in-memory store rather than refusing to start.
    pub fn open_store(&self) -> PersistenceStore {
        let mut store = if self.ephemeral {
            PersistenceStore::in_memory()
        } else {
            let path = self.state_file();
            match FileStore::open(&path) {
                Ok(file) => {
                    log::info!("state file: {}", file.path().display());
                    PersistenceStore::new(file)
                }
                Err(e) => {
                    log::warn!("cannot read {}: {e}; state will not be saved", path.display());
                    PersistenceStore::in_memory()
                }
            }
        };
        if self.reset {
            log::info!("resetting saved state");
            store.reset();
        }
        store
    }
}

/// Headless mode: decode the saved snapshot and write it out as PNG.
pub fn run_export(store: &PersistenceStore, out: &Path) -> ExitCode {
    let Some(data_url) = store.load_snapshot() else {
        eprintln!("No saved drawing to export.");
        return ExitCode::FAILURE;
    };
    let image = match snapshot::decode_data_url(&data_url) {
        Ok(image) => image,
        Err(e) => {
            log::error!("export: saved snapshot unreadable: {e}");
            eprintln!("Saved drawing is unreadable: {e}");
            return ExitCode::FAILURE;
        }
    };
    match image.save_with_format(out, image::ImageFormat::Png) {
        Ok(()) => {
            log::info!("exported {}x{} canvas to {}", image.width(), image.height(), out.display());
            println!("Wrote {}", out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("export to {} failed: {e}", out.display());
            eprintln!("Could not write {}: {e}", out.display());
            ExitCode::FAILURE
        }
    }
}
