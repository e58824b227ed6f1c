use super::super::{Model, Msg};
use super::utils::extract_files;
use classifier::{ImageFile, ModelStatus, PredictError, PredictionTicket};
use gloo_file::{File as GlooFile, ObjectUrl};
use shared::PredictionResult;
use std::rc::Rc;
use wasm_bindgen_futures::spawn_local;
use web_sys::{ClipboardEvent, DragEvent};
use yew::prelude::*;

pub fn start_model_load(model: &Model, ctx: &Context<Model>) {
    let service = Rc::clone(&model.service);
    let link = ctx.link().clone();

    spawn_local(async move {
        let result = service.load_model().await.map_err(|e| e.to_string());
        link.send_message(Msg::ModelLoaded(result));
    });
}

pub fn handle_model_loaded(model: &mut Model, result: Result<(), String>) -> bool {
    match result {
        Ok(()) => {
            log::info!("Model ready");
            model.load_error = None;
        }
        Err(e) => {
            log::error!("Failed to load model: {}", e);
            model.load_error = Some(e);
        }
    }
    true
}

pub fn handle_files_chosen(model: &mut Model, ctx: &Context<Model>, files: Vec<GlooFile>) -> bool {
    // One image at a time: the last file chosen wins.
    let Some(file) = files.into_iter().last() else {
        return false;
    };

    model.pending_read += 1;
    model.read_error = None;

    if let Err(err) = model.upload.validator().check(&file.raw_mime_type(), file.size()) {
        model.reading = false;
        model.upload.reject(err);
        return true;
    }

    model.upload.begin_upload();
    model.reading = true;
    let id = model.pending_read;
    let link = ctx.link().clone();

    spawn_local(async move {
        match gloo_file::futures::read_as_bytes(&file).await {
            Ok(bytes) => {
                let image = ImageFile::new(file.name(), file.raw_mime_type(), bytes);
                link.send_message(Msg::FileRead(id, file, image));
            }
            Err(e) => link.send_message(Msg::FileReadFailed(id, e.to_string())),
        }
    });

    true
}

pub fn handle_file_read(model: &mut Model, id: u64, raw: GlooFile, file: ImageFile) -> bool {
    if id != model.pending_read {
        return false;
    }
    model.reading = false;

    if let Err(e) = model.upload.select(file, |_| ObjectUrl::from(raw)) {
        log::debug!("Selection rejected after read: {}", e);
    }
    true
}

pub fn handle_file_read_failed(model: &mut Model, id: u64, reason: String) -> bool {
    if id != model.pending_read {
        return false;
    }
    log::error!("Failed to read file: {}", reason);
    model.reading = false;
    model.upload.remove();
    model.read_error = Some(classifier::service::USER_FACING_ERROR.to_string());
    true
}

pub fn handle_analyze(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(ticket) = model.upload.begin_prediction() else {
        return false;
    };

    let service = Rc::clone(&model.service);
    let link = ctx.link().clone();

    spawn_local(async move {
        let outcome = service.predict(ticket.file()).await;
        link.send_message(Msg::PredictionFinished(ticket, outcome));
    });

    true
}

pub fn handle_prediction_finished(
    model: &mut Model,
    ticket: PredictionTicket,
    outcome: Result<PredictionResult, PredictError>,
) -> bool {
    if let Err(PredictError::Load(e)) = &outcome {
        model.load_error = Some(e.to_string());
    } else if model.service.status() == ModelStatus::Loaded {
        model.load_error = None;
    }
    model.upload.finish_prediction(ticket, outcome);
    true
}

pub fn handle_drop(model: &mut Model, ctx: &Context<Model>, event: DragEvent) -> bool {
    event.prevent_default();
    model.is_dragging = false;

    if let Some(file_list) = event.data_transfer().and_then(|data| data.files()) {
        let files = extract_files(&file_list);
        if !files.is_empty() {
            ctx.link().send_message(Msg::FilesChosen(files));
        }
    }

    true
}

pub fn handle_paste(_model: &mut Model, ctx: &Context<Model>, event: ClipboardEvent) -> bool {
    if let Some(file_list) = event.clipboard_data().and_then(|data| data.files()) {
        let files = extract_files(&file_list);
        if !files.is_empty() {
            event.prevent_default();
            ctx.link().send_message(Msg::FilesChosen(files));
        }
    }
    false
}
