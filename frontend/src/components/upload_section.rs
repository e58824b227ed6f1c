use super::super::{Model, Msg};
use super::utils::{debounce, extract_files};
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, HtmlInputElement};
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    // The preview replaces the drop zone once an image is accepted.
    if model.upload.image().is_valid() {
        return html! {};
    }

    html! {
        <div class="upload-section">
            { render_file_input_area(model, ctx) }
        </div>
    }
}

fn render_file_input_area(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let handle_change = link.batch_callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let files = input.files().as_ref().map(extract_files).unwrap_or_default();

        input.set_value("");

        (!files.is_empty()).then_some(Msg::FilesChosen(files))
    });

    let handle_drag_over = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(true)
    });

    let handle_drag_leave = link.callback(|e: DragEvent| {
        e.prevent_default();
        Msg::SetDragging(false)
    });

    let handle_drop = link.callback(Msg::HandleDrop);
    let trigger_file_input = Callback::from(|_| {
        let input = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id("file-input"));
        if let Some(html_input) = input.and_then(|input| input.dyn_into::<web_sys::HtmlElement>().ok()) {
            html_input.click();
        }
    });

    let validator = model.upload.validator();

    html! {
        <>
            <input
                type="file"
                id="file-input"
                accept={validator.accept_attribute()}
                style="display: none;"
                onchange={handle_change}
            />

            <div
                id="drop-zone"
                class={classes!("upload-area", model.is_dragging.then_some("drag-over"))}
                ondragover={handle_drag_over}
                ondragleave={handle_drag_leave}
                ondrop={handle_drop}
                onclick={debounce(300, move || trigger_file_input.emit(()))}
            >
                <div class="upload-placeholder">
                    <span class="upload-icon">{"📷"}</span>
                    {
                        if model.reading {
                            html! { <p>{"Reading your photo..."}</p> }
                        } else {
                            html! { <p>{"Drop your cute pet photo here, paste, or click to browse"}</p> }
                        }
                    }
                    <p class="file-types">{ validator.hint() }</p>
                </div>
            </div>
        </>
    }
}
