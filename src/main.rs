use dioxus::prelude::*;
use std::sync::OnceLock;
use uuid::Uuid;

mod components;
mod config;
mod context;
mod database;
mod error;
mod models;
mod services;

use components::{ForkliftEditScreen, ForkliftListScreen};
use config::AppConfig;
use context::AppContext;

static APP_CONTEXT: OnceLock<AppContext> = OnceLock::new();

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let context = match AppConfig::load().and_then(AppContext::init) {
        Ok(context) => context,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            std::process::exit(1);
        }
    };

    if APP_CONTEXT.set(context).is_err() {
        log::warn!("App context was already initialised");
    }

    dioxus::launch(App);
}

/// Screen navigation
#[derive(Clone, PartialEq, Debug)]
pub enum Screen {
    ForkliftList,
    /// `None` creates a new forklift
    ForkliftEdit(Option<Uuid>),
}

#[component]
fn App() -> Element {
    let ready = use_hook(|| match APP_CONTEXT.get() {
        Some(context) => {
            provide_context(context.clone());
            true
        }
        None => false,
    });
    let mut current_screen = use_signal(|| Screen::ForkliftList);

    if !ready {
        return rsx! {
            div { style: "padding: 16px; color: #c62828;", "The application could not be initialised." }
        };
    }

    rsx! {
        div { style: "height: 100vh; overflow-y: auto; font-family: sans-serif; background: #f5f5f5;",
            match current_screen() {
                Screen::ForkliftList => rsx! {
                    ForkliftListScreen { on_navigate: move |s| current_screen.set(s) }
                },
                Screen::ForkliftEdit(id) => rsx! {
                    ForkliftEditScreen {
                        key: "{id:?}",
                        forklift_id: id,
                        on_navigate: move |s| current_screen.set(s),
                    }
                },
            }
        }
    }
}
