use yew::prelude::*;

/// Renders the application header
pub fn render_header() -> Html {
    html! {
        <header class="app-header">
            <h1>{"🐱 Meow or Woof? 🐶"}</h1>
            <p class="subtitle">{"Upload a photo and find out whether it's a cat or a dog"}</p>
        </header>
    }
}
