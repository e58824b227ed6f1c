mod components;
mod fetcher;

use classifier::{ClassifierConfig, ImageFile, InferenceService, PredictError, PredictionTicket, UploadController};
use components::{handlers, header, preview_area, results, upload_section, utils};
use fetcher::GlooFetcher;
use gloo_events::EventListener;
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::PredictionResult;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

// Yew msg components
pub enum Msg {
    // Model lifecycle
    ModelLoaded(Result<(), String>),
    RetryModelLoad,

    // File operations
    FilesChosen(Vec<GlooFile>),
    FileRead(u64, GlooFile, ImageFile),
    FileReadFailed(u64, String),
    RemoveImage,

    // Analysis operations
    Analyze,
    PredictionFinished(PredictionTicket, Result<PredictionResult, PredictError>),

    // UI states
    SetDragging(bool),

    // Input events
    HandleDrop(DragEvent),
    HandlePaste(ClipboardEvent),
}

// Main component
pub struct Model {
    service: Rc<InferenceService<GlooFetcher>>,
    upload: UploadController<ObjectUrl>,
    load_error: Option<String>,
    read_error: Option<String>,
    // Bumped per chosen file so a slow read cannot overwrite a newer choice.
    pending_read: u64,
    reading: bool,
    is_dragging: bool,
    paste_listener: Option<EventListener>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let config = ClassifierConfig::load().unwrap_or_else(|e| {
            log::error!("Invalid classifier config, using defaults: {}", e);
            ClassifierConfig::default()
        });
        let upload = UploadController::new(classifier::ImageValidator::new(&config));
        let service = InferenceService::new(config, GlooFetcher).with_message_seed(js_sys::Date::now() as u64);

        let mut model = Self {
            service: Rc::new(service),
            upload,
            load_error: None,
            read_error: None,
            pending_read: 0,
            reading: false,
            is_dragging: false,
            paste_listener: None,
        };

        if let Some(window) = web_sys::window() {
            let link = ctx.link().clone();
            let listener = EventListener::new(&window, "paste", move |event| {
                if let Some(clipboard_event) = event.dyn_ref::<ClipboardEvent>() {
                    link.send_message(Msg::HandlePaste(clipboard_event.clone()));
                }
            });
            model.paste_listener = Some(listener);
        }

        handlers::start_model_load(&model, ctx);
        model
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::ModelLoaded(result) => handlers::handle_model_loaded(self, result),
            Msg::RetryModelLoad => {
                self.load_error = None;
                handlers::start_model_load(self, ctx);
                true
            }

            Msg::FilesChosen(files) => handlers::handle_files_chosen(self, ctx, files),
            Msg::FileRead(id, raw, file) => handlers::handle_file_read(self, id, raw, file),
            Msg::FileReadFailed(id, reason) => handlers::handle_file_read_failed(self, id, reason),
            Msg::RemoveImage => {
                self.pending_read += 1;
                self.reading = false;
                self.read_error = None;
                self.upload.remove();
                true
            }

            Msg::Analyze => handlers::handle_analyze(self, ctx),
            Msg::PredictionFinished(ticket, outcome) => handlers::handle_prediction_finished(self, ticket, outcome),

            Msg::SetDragging(is_dragging) => {
                self.is_dragging = is_dragging;
                true
            }

            Msg::HandleDrop(event) => handlers::handle_drop(self, ctx, event),
            Msg::HandlePaste(event) => handlers::handle_paste(self, ctx, event),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { header::render_header() }

                <main class="main-content">
                    { results::render_model_status(self, ctx) }
                    { upload_section::render_upload_section(self, ctx) }
                    { utils::render_error_message(self) }
                    { preview_area::render_preview_area(self, ctx) }
                    { results::render_results(self) }
                </main>

                <footer class="app-footer">
                    <p>{"Meow or Woof | Runs entirely in your browser"}</p>
                </footer>
            </div>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.upload.remove();
        self.service.unload();
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<Model>::new().render();
}
