use bg_remover::app::BgRemoverApp;
use bg_remover::config::CloudConfig;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = CloudConfig::from_env();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([760.0, 480.0])
            .with_min_inner_size([660.0, 400.0])
            .with_title("Image Background Remover"),
        ..Default::default()
    };

    eframe::run_native(
        "Image Background Remover",
        options,
        Box::new(|cc| Ok(Box::new(BgRemoverApp::new(cc, config)?))),
    )
}

#[cfg(target_arch = "wasm32")]
fn main() {
    use wasm_bindgen::JsCast as _;

    eframe::WebLogger::init(log::LevelFilter::Debug).ok();
    let config = CloudConfig::from_env();
    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async move {
        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("the_canvas_id"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element with id the_canvas_id");
            return;
        };

        let started = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| Ok(Box::new(BgRemoverApp::new(cc, config)?))),
            )
            .await;
        if let Err(e) = started {
            log::error!("Failed to start app: {e:?}");
        }
    });
}
