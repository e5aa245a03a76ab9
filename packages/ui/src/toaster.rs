use api::ToastLevel;
use dioxus::prelude::*;

use crate::toast::use_toasts;

const TOASTER_CSS: Asset = asset!("/assets/toaster.css");

#[component]
pub fn Toaster() -> Element {
    let mut center = use_toasts();
    let entries = center().entries.clone();

    if entries.is_empty() {
        return rsx! {};
    }

    rsx! {
        document::Stylesheet { href: TOASTER_CSS }

        div {
            class: "toaster",
            for entry in entries.iter().rev() {
                div {
                    key: "{entry.id}",
                    class: match entry.toast.level {
                        ToastLevel::Error => "toast error",
                        ToastLevel::Success => "toast success",
                        ToastLevel::Info => "toast info",
                    },
                    span { class: "toast-time", "{entry.timestamp}" }
                    span { class: "toast-message", " {entry.toast.message}" }
                    button {
                        class: "toast-dismiss",
                        onclick: {
                            let id = entry.id;
                            move |_| center.write().dismiss(id)
                        },
                        "×"
                    }
                }
            }
        }
    }
}
