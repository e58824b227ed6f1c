use super::super::{Model, Msg};
use super::utils::debounce;
use classifier::ModelStatus;
use yew::prelude::*;

pub fn render_preview_area(model: &Model, ctx: &Context<Model>) -> Html {
    let image = model.upload.image();
    let (Some(file), Some(preview)) = (image.file(), image.preview()) else {
        return html! {};
    };

    let link = ctx.link().clone();
    let processing = model.upload.is_processing();
    let model_ready = model.service.status() == ModelStatus::Loaded;

    html! {
        <div id="preview-container" class="preview-container">
            <img src={preview.to_string()} alt={file.name().to_string()} class="preview-image" />
            <div class="button-container">
                <button
                    class="remove-button"
                    onclick={link.callback(|_| Msg::RemoveImage)}
                >
                    {"Remove Image 🗑️"}
                </button>
                <button
                    class="analyze-btn"
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Analyze)
                    })}
                    disabled={processing || !model_ready}
                >
                    { if processing { "Analyzing..." } else { "Cat or Dog?" } }
                </button>
            </div>
        </div>
    }
}
