//! Dioxus bindings for the image manager
//!
//! [`use_image_manager`] mirrors the manager state into a signal. The card
//! components only render what they are given; actions go back through
//! event handlers so the caller decides which manager method to run.

use crate::manager::ImageManager;
use crate::models::ListingImage;
use crate::state::ImageManagerState;
use dioxus::prelude::*;

/// Signal that follows every state change of `manager`
pub fn use_image_manager(manager: ImageManager) -> Signal<ImageManagerState> {
    let mut state = use_signal(|| manager.snapshot());

    use_hook(move || {
        let mut rx = manager.subscribe();
        spawn(async move {
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                state.set(next);
            }
        });
    });

    state
}

/// Thumbnail of a file that is queued but not uploaded
#[component]
pub fn PendingImageCard(
    preview_url: Option<String>,
    name: String,
    is_primary: bool,
    #[props(default = None)] upload_error: Option<String>,
    #[props(default = false)] disabled: bool,
    on_remove: EventHandler<()>,
    on_make_primary: EventHandler<()>,
) -> Element {
    let border = if is_primary { "#2e7d32" } else { "#ddd" };

    rsx! {
        div {
            style: "width: 160px; border: 2px solid {border}; border-radius: 8px; overflow: hidden; background: #fafafa;",
            match preview_url {
                Some(url) => rsx! {
                    img {
                        src: "{url}",
                        alt: "{name}",
                        style: "width: 100%; height: 120px; object-fit: cover;",
                    }
                },
                None => rsx! {
                    div {
                        style: "height: 120px; display: flex; align-items: center; justify-content: center; color: #999;",
                        "📷"
                    }
                },
            }
            div { style: "padding: 6px; font-size: 12px; word-break: break-all;", "{name}" }
            if let Some(err) = upload_error {
                div { style: "padding: 0 6px 6px; font-size: 11px; color: #c62828;", "{err}" }
            }
            div {
                style: "display: flex; gap: 4px; padding: 6px;",
                if is_primary {
                    span { style: "font-size: 12px; color: #2e7d32;", "Primary" }
                } else {
                    button {
                        disabled,
                        onclick: move |_| on_make_primary.call(()),
                        "Make primary"
                    }
                }
                button {
                    disabled,
                    onclick: move |_| on_remove.call(()),
                    "Remove"
                }
            }
        }
    }
}

/// Card of an uploaded image
#[component]
pub fn ListingImageCard(
    image: ListingImage,
    #[props(default = false)] disabled: bool,
    on_delete: EventHandler<String>,
    on_make_primary: EventHandler<String>,
) -> Element {
    let border = if image.is_primary { "#2e7d32" } else { "#ddd" };
    let alt = image.alt_text.clone().unwrap_or_else(|| "Forklift".to_string());
    let url = image.url.clone();
    let delete_url = image.url.clone();

    rsx! {
        div {
            style: "width: 200px; border: 2px solid {border}; border-radius: 8px; overflow: hidden;",
            img {
                src: "{image.url}",
                alt: "{alt}",
                style: "width: 100%; height: 150px; object-fit: cover; background: #f0f0f0;",
            }
            div {
                style: "display: flex; gap: 4px; padding: 6px;",
                if image.is_primary {
                    span { style: "font-size: 12px; color: #2e7d32;", "Primary image" }
                } else {
                    button {
                        disabled,
                        onclick: move |_| on_make_primary.call(url.clone()),
                        "Set as primary"
                    }
                }
                button {
                    disabled,
                    onclick: move |_| on_delete.call(delete_url.clone()),
                    "Delete"
                }
            }
        }
    }
}
