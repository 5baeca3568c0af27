mod app;
mod cli;

use app::PixelPadApp;
use clap::Parser;
use eframe::egui;
use pixelpad::logger;

fn main() -> Result<(), eframe::Error> {
    let args = cli::CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init(args.log_level());

    let store = args.open_store();

    // -- Headless export ------------------------------------------------
    if let Some(out) = &args.export {
        let code = cli::run_export(&store, out);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -------------------------------------------------------
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 600.0])
            .with_min_inner_size([560.0, 600.0])
            .with_title("PixelPad"),
        ..Default::default()
    };

    eframe::run_native(
        "PixelPad",
        options,
        Box::new(move |cc| Box::new(PixelPadApp::new(cc, store))),
    )
}
