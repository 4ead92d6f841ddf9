use crate::context::AppContext;
use crate::models::Forklift;
use crate::services;
use crate::Screen;
use dioxus::prelude::*;

#[component]
pub fn ForkliftListScreen(on_navigate: EventHandler<Screen>) -> Element {
    let app = use_context::<AppContext>();
    let context = use_signal(move || app);
    let mut forklifts = use_signal(Vec::<Forklift>::new);
    let mut search_filter = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);

    let mut load_forklifts = move || {
        let search_value = search_filter();
        let filter = if search_value.is_empty() {
            None
        } else {
            Some(search_value.as_str())
        };

        match services::list_forklifts(&context.read().connection(), filter) {
            Ok(list) => forklifts.set(list),
            Err(e) => {
                log::error!("Failed to load forklifts: {}", e);
                error.set(Some(e.user_message()));
            }
        }
    };

    // Load on mount
    use_effect(move || {
        load_forklifts();
    });

    rsx! {
        div { style: "padding: 16px; max-width: 720px; margin: 0 auto;",

            div { style: "display: flex; justify-content: space-between; align-items: center; margin-bottom: 12px;",
                h1 { style: "color: #0066cc; margin: 0; font-size: 24px;", "Forklifts" }
                button {
                    style: "padding: 10px 16px; font-size: 16px;",
                    onclick: move |_| on_navigate.call(Screen::ForkliftEdit(None)),
                    "+ New forklift"
                }
            }

            input {
                style: "width: 100%; padding: 12px; font-size: 16px; border: 2px solid #e0e0e0; border-radius: 8px; margin-bottom: 12px;",
                r#type: "text",
                placeholder: "Search by name or brand",
                value: "{search_filter}",
                oninput: move |e| {
                    search_filter.set(e.value());
                    load_forklifts();
                },
            }

            if let Some(msg) = error() {
                div { style: "padding: 10px; background: #ffebee; color: #c62828; border-radius: 8px; margin-bottom: 12px;",
                    "{msg}"
                }
            }

            if forklifts().is_empty() {
                div { style: "text-align: center; padding: 40px; color: #999;", "No forklifts yet" }
            } else {
                for forklift in forklifts() {
                    div {
                        key: "{forklift.uuid}",
                        style: "padding: 12px; background: white; border: 1px solid #ddd; border-radius: 8px; margin-bottom: 8px; cursor: pointer;",
                        onclick: move |_| on_navigate.call(Screen::ForkliftEdit(Some(forklift.uuid))),
                        div { style: "font-weight: 600;", "{forklift.display_name()}" }
                        if let Some(created) = forklift.created_at.clone() {
                            div { style: "font-size: 12px; color: #888;", "Created {created}" }
                        }
                    }
                }
            }
        }
    }
}
