use crate::context::AppContext;
use crate::models::Forklift;
use crate::services;
use crate::Screen;
use dioxus::prelude::*;
use listing_images::{use_image_manager, ListingImageCard, PendingImageCard, SelectedFile};
use rfd::AsyncFileDialog;
use uuid::Uuid;

/// Create or edit a forklift together with its images.
///
/// Images can be picked before the forklift is saved; uploading them needs
/// the saved forklift.
#[component]
pub fn ForkliftEditScreen(forklift_id: Option<Uuid>, on_navigate: EventHandler<Screen>) -> Element {
    let app = use_context::<AppContext>();
    let manager_app = app.clone();
    let context = use_signal(move || app);
    let manager = use_signal(move || manager_app.image_manager(forklift_id));
    let state = use_image_manager(manager.read().clone());

    let mut saved_id = use_signal(|| forklift_id);
    let mut name = use_signal(String::new);
    let mut brand = use_signal(String::new);
    let mut form_error = use_signal(|| None::<String>);

    // Load forklift and images on mount
    use_hook(move || {
        let Some(id) = forklift_id else {
            return;
        };

        match services::get_forklift(&context.read().connection(), &id) {
            Ok(forklift) => {
                name.set(forklift.name);
                brand.set(forklift.brand.unwrap_or_default());
            }
            Err(e) => form_error.set(Some(e.user_message())),
        }

        let m = manager.read().clone();
        spawn(async move {
            if let Err(e) = m.refresh().await {
                log::error!("Failed to load images of {}: {}", id, e);
            }
        });
    });

    let handle_save = move |_| {
        form_error.set(None);

        let brand_value = brand();
        let mut forklift = Forklift::new(name());
        forklift.brand = Some(brand_value.trim().to_string()).filter(|b| !b.is_empty());

        let ctx = context.read();
        let conn = ctx.connection();
        let result = match saved_id() {
            Some(id) => {
                forklift.uuid = id;
                services::update_forklift(&conn, &forklift).map(|_| id)
            }
            None => services::create_forklift(&conn, &forklift),
        };

        match result {
            Ok(id) => {
                if saved_id().is_none() {
                    saved_id.set(Some(id));
                    manager.read().set_forklift(Some(id));
                }
            }
            Err(e) => form_error.set(Some(e.user_message())),
        }
    };

    let pick_files = move |_| {
        let m = manager.read().clone();
        spawn(async move {
            let Some(handles) = AsyncFileDialog::new()
                .set_title("Select images")
                .add_filter("Images", &["jpg", "jpeg", "png", "webp"])
                .pick_files()
                .await
            else {
                return;
            };

            let mut files = Vec::with_capacity(handles.len());
            for handle in handles {
                match SelectedFile::from_path(handle.path()) {
                    Ok(file) => files.push(file),
                    Err(e) => log::warn!("Could not read {}: {}", handle.path().display(), e),
                }
            }

            let added = m.add_files(files);
            log::debug!("Added {} file(s) to the upload queue", added);
        });
    };

    let upload = move |_| {
        let m = manager.read().clone();
        spawn(async move {
            if let Err(e) = m.upload_all_files().await {
                log::error!("Upload failed: {}", e);
            }
        });
    };

    let current = state();
    let busy = current.is_uploading || current.is_deleting || current.is_setting_primary;
    let title = if saved_id().is_some() {
        "Edit forklift"
    } else {
        "New forklift"
    };

    rsx! {
        div { style: "padding: 16px; max-width: 720px; margin: 0 auto;",

            div { style: "display: flex; gap: 12px; align-items: center; margin-bottom: 16px;",
                button { onclick: move |_| on_navigate.call(Screen::ForkliftList), "← Back" }
                h1 { style: "margin: 0; font-size: 22px;", "{title}" }
            }

            // Forklift form
            div { style: "display: flex; flex-direction: column; gap: 8px; margin-bottom: 20px;",
                input {
                    r#type: "text",
                    placeholder: "Name",
                    value: "{name}",
                    oninput: move |e| name.set(e.value()),
                }
                input {
                    r#type: "text",
                    placeholder: "Brand",
                    value: "{brand}",
                    oninput: move |e| brand.set(e.value()),
                }
                if let Some(msg) = form_error() {
                    div { style: "color: #c62828;", "{msg}" }
                }
                button { onclick: handle_save, "Save" }
            }

            h2 { style: "font-size: 18px;", "Images ({current.images.len()}/{current.max_images})" }

            if let Some(msg) = current.error.clone() {
                div {
                    style: "padding: 10px; background: #ffebee; color: #c62828; border-radius: 8px; margin-bottom: 12px; white-space: pre-line;",
                    "{msg}"
                    button {
                        style: "margin-left: 8px;",
                        onclick: move |_| manager.read().clear_error(),
                        "✕"
                    }
                }
            }
            if let Some(msg) = current.success_message.clone() {
                div { style: "padding: 10px; background: #e8f5e9; color: #2e7d32; border-radius: 8px; margin-bottom: 12px;",
                    "{msg}"
                }
            }

            // Uploaded images
            div { style: "display: flex; flex-wrap: wrap; gap: 12px; margin-bottom: 20px;",
                for image in current.images.clone() {
                    ListingImageCard {
                        key: "{image.url}",
                        image: image.clone(),
                        disabled: busy,
                        on_delete: move |url: String| {
                            let m = manager.read().clone();
                            spawn(async move {
                                if let Err(e) = m.delete_image(&url).await {
                                    log::error!("Delete failed: {}", e);
                                }
                            });
                        },
                        on_make_primary: move |url: String| {
                            let m = manager.read().clone();
                            spawn(async move {
                                if let Err(e) = m.set_primary_image(&url).await {
                                    log::error!("Set primary failed: {}", e);
                                }
                            });
                        },
                    }
                }
            }

            // Pending selections
            if !current.upload_files.is_empty() {
                h3 { style: "font-size: 16px;", "Ready to upload" }
                div { style: "display: flex; flex-wrap: wrap; gap: 12px; margin-bottom: 12px;",
                    for (index, entry) in current.upload_files.entries().iter().cloned().enumerate() {
                        PendingImageCard {
                            key: "{entry.preview.id()}",
                            preview_url: manager.read().preview_url(&entry.preview),
                            name: entry.file.name.clone(),
                            is_primary: entry.is_primary,
                            upload_error: entry.upload_error.clone(),
                            disabled: current.is_uploading,
                            on_remove: move |_| manager.read().remove_upload_file(index),
                            on_make_primary: move |_| manager.read().set_primary_upload_file(index),
                        }
                    }
                }
            }

            div { style: "display: flex; gap: 8px;",
                button {
                    disabled: !current.can_add_more() || current.is_uploading,
                    onclick: pick_files,
                    "Add images ({current.available_slots()} left)"
                }
                if !current.upload_files.is_empty() {
                    button {
                        disabled: current.is_uploading,
                        onclick: upload,
                        if current.is_uploading { "Uploading…" } else { "Upload" }
                    }
                    button {
                        disabled: current.is_uploading,
                        onclick: move |_| manager.read().clear_upload_files(),
                        "Clear"
                    }
                }
            }
        }
    }
}
