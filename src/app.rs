use std::sync::Arc;

use eframe::egui;

use crate::cloud::{self, SelectedFile};
use crate::config::CloudConfig;
use crate::controller::{Backend, FetchOutcome, PreviewEvent, UploadController, UploadOutcome};
use crate::image_io::{self, DOWNLOAD_FILE_NAME};
use crate::preview::PreviewCanvas;
use crate::task::{OutcomeCell, OutcomeQueue, Spawner};

/// Runs uploads and downloads against the hosted service and wakes the UI
/// when one finishes.
pub struct CloudBackend {
    spawner: Spawner,
    client: reqwest::Client,
    config: Arc<CloudConfig>,
    ctx: egui::Context,
}

impl CloudBackend {
    pub fn new(ctx: egui::Context, config: CloudConfig) -> std::io::Result<Self> {
        Ok(Self {
            spawner: Spawner::new()?,
            client: reqwest::Client::new(),
            config: Arc::new(config),
            ctx,
        })
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }
}

impl Backend for CloudBackend {
    fn upload(&self, file: SelectedFile, done: OutcomeCell<UploadOutcome>) {
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let ctx = self.ctx.clone();
        self.spawner.spawn(async move {
            let start = web_time::Instant::now();
            let outcome = cloud::upload(&client, &config, file).await;
            log::debug!(
                "Upload round trip took {:.0}ms",
                start.elapsed().as_secs_f64() * 1000.0
            );
            done.put(outcome);
            ctx.request_repaint();
        });
    }

    fn fetch(&self, url: String, done: OutcomeQueue<FetchOutcome>) {
        let client = self.client.clone();
        let ctx = self.ctx.clone();
        self.spawner.spawn(async move {
            let outcome = cloud::fetch_image(&client, &url).await;
            done.push((url, outcome));
            ctx.request_repaint();
        });
    }
}

pub struct BgRemoverApp {
    controller: UploadController<CloudBackend>,
    original_canvas: PreviewCanvas,
    processed_canvas: PreviewCanvas,
    #[cfg(target_arch = "wasm32")]
    picked: OutcomeCell<Option<SelectedFile>>,
    #[cfg(target_arch = "wasm32")]
    revokes: image_io::DeferredRevokes,
}

impl BgRemoverApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: CloudConfig) -> std::io::Result<Self> {
        let backend = CloudBackend::new(cc.egui_ctx.clone(), config)?;
        Ok(Self {
            controller: UploadController::new(backend),
            original_canvas: PreviewCanvas::new("uploaded"),
            processed_canvas: PreviewCanvas::new("bg_removed"),
            #[cfg(target_arch = "wasm32")]
            picked: OutcomeCell::new(),
            #[cfg(target_arch = "wasm32")]
            revokes: image_io::DeferredRevokes::default(),
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn choose_image(&mut self, ctx: &egui::Context) {
        let file = rfd::FileDialog::new()
            .add_filter("Images", &image_io::image_extensions())
            .pick_file()
            .and_then(|path| match image_io::read_selected(&path) {
                Ok(file) => Some(file),
                Err(e) => {
                    log::error!("Error loading image: {e}");
                    None
                }
            });
        let events = self.controller.select_file(file);
        self.handle_events(ctx, events);
    }

    /// The browser dialog is async; the pick lands in `picked` and is
    /// handed to the controller on the next frame.
    #[cfg(target_arch = "wasm32")]
    fn choose_image(&mut self, ctx: &egui::Context) {
        let picked = self.picked.clone();
        let ctx = ctx.clone();
        self.controller.backend().spawner().spawn(async move {
            let file = match rfd::AsyncFileDialog::new()
                .add_filter("Images", &image_io::image_extensions())
                .pick_file()
                .await
            {
                Some(handle) => Some(SelectedFile {
                    name: handle.file_name(),
                    bytes: handle.read().await,
                }),
                None => None,
            };
            picked.put(file);
            ctx.request_repaint();
        });
    }

    fn handle_events(&mut self, ctx: &egui::Context, events: Vec<PreviewEvent>) {
        for event in events {
            match event {
                PreviewEvent::OriginalChanged => {
                    if let Some(bytes) = self.controller.original_bytes() {
                        self.original_canvas.load(ctx, bytes);
                    }
                }
                PreviewEvent::ProcessedLoaded => {
                    if let Some(bytes) = self.controller.processed_bytes() {
                        self.processed_canvas.load(ctx, bytes);
                    }
                }
                // The processed canvas keeps its last image until the new one arrives.
                PreviewEvent::ProcessedChanged | PreviewEvent::Notified => {}
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn download_processed(&mut self) {
        let Some(bytes) = self.controller.processed_bytes() else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(DOWNLOAD_FILE_NAME)
            .add_filter("PNG", &["png"])
            .save_file()
        {
            if let Err(e) = image_io::save_bytes(bytes, &path) {
                log::error!("Error saving image: {e}");
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn download_processed(&mut self) {
        let Some(bytes) = self.controller.processed_bytes() else {
            return;
        };
        match image_io::download_bytes(bytes, DOWNLOAD_FILE_NAME) {
            Ok(url) => self.revokes.push(url, web_time::Instant::now()),
            Err(e) => log::error!("Error saving image: {e}"),
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn release_downloads(&mut self, ctx: &egui::Context) {
        for url in self.revokes.due(web_time::Instant::now()) {
            if let Err(e) = image_io::revoke_object_url(&url) {
                log::warn!("{e}");
            }
        }
        if !self.revokes.is_empty() {
            ctx.request_repaint_after(image_io::REVOKE_DELAY);
        }
    }

    fn show_notification(&mut self, ctx: &egui::Context) {
        let Some(message) = self.controller.notification().map(str::to_owned) else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("upload_notification")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Upload failed");
            ui.label(message.as_str());
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if modal.inner || modal.should_close() {
            self.controller.take_notification();
        }
    }
}

impl eframe::App for BgRemoverApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let events = self.controller.poll();
        self.handle_events(ctx, events);

        #[cfg(target_arch = "wasm32")]
        {
            if let Some(file) = self.picked.take() {
                let events = self.controller.select_file(file);
                self.handle_events(ctx, events);
            }
            self.release_downloads(ctx);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Image Background Remover");
                ui.separator();
                if ui.button("Choose Image").clicked() {
                    self.choose_image(ctx);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.controller.original().is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label("Choose an image to begin");
                });
                return;
            }

            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new("Uploaded Image").strong());
                    self.original_canvas.show(ui);
                    if let Some(name) = self.controller.original_name() {
                        ui.label(name);
                    }
                });

                ui.add_space(40.0);

                ui.vertical(|ui| {
                    ui.label(egui::RichText::new("Background Removed").strong());
                    self.processed_canvas.show(ui);

                    if self.controller.processed().is_some() {
                        if let Some([w, h]) = self.processed_canvas.natural_size() {
                            ui.label(format!("{w}×{h}"));
                        }
                        let ready = self.controller.processed_bytes().is_some();
                        if ui
                            .add_enabled(ready, egui::Button::new("Download BG Removed Image"))
                            .clicked()
                        {
                            self.download_processed();
                        }
                    }
                });
            });
        });

        self.show_notification(ctx);
    }
}
