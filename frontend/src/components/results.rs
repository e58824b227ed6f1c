use super::super::{Model, Msg};
use classifier::{ClassLabel, ModelStatus};
use yew::prelude::*;

pub fn render_results(model: &Model) -> Html {
    if model.upload.is_processing() {
        return html! {
            <div class="result-container">
                <div class="loading">
                    <div class="loading-spinner"></div>
                    <span>{"Analyzing your adorable pet... 🤔"}</span>
                </div>
            </div>
        };
    }

    if let Some(error_msg) = model.upload.prediction_error() {
        return html! {
            <div class="error-message">
                <p>{ error_msg }</p>
            </div>
        };
    }

    let Some(result) = model.upload.prediction() else {
        return html! {};
    };

    let headline = match result.class_label {
        ClassLabel::Cat => "CAT! ₍^. .^₎⟆",
        ClassLabel::Dog => "DOG! ₊˚⊹ ᰔ",
        ClassLabel::Uncertain => "UNCERTAIN (◞‸ ◟)",
    };

    html! {
        <div class="result-container">
            <div class="result-title">{"Analysis Complete!"}</div>
            <div class={classes!("result-prediction", format!("result-{}", result.class_label))}>
                { headline }
            </div>
            if !result.is_uncertain() {
                <div class="result-confidence">
                    { format!("Confidence: {}%", result.confidence_percent().round()) }
                </div>
                <div class="result-message">{ result.message.clone() }</div>
            }
        </div>
    }
}

pub fn render_model_status(model: &Model, ctx: &Context<Model>) -> Html {
    match model.service.status() {
        ModelStatus::Loading | ModelStatus::Unloaded => html! {
            <div class="model-status loading">
                <div class="loading-spinner"></div>
                <span>{"Waking up the pet detector..."}</span>
            </div>
        },
        ModelStatus::Failed => html! {
            <div class="model-status error-message">
                <p>{"The pet detector could not be loaded."}</p>
                if let Some(reason) = &model.load_error {
                    <p class="error-detail">{ reason }</p>
                }
                <button class="analyze-btn" onclick={ctx.link().callback(|_| Msg::RetryModelLoad)}>
                    {"Try again"}
                </button>
            </div>
        },
        ModelStatus::Loaded => html! {},
    }
}
