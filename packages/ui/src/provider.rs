//! Context for the API client, the session token and the toast center.

use api::{ApiClient, DynTransport};
use dioxus::prelude::*;

use crate::toast::ToastCenter;

/// Token attached to authenticated requests; `None` for anonymous reads.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
}

/// The client the hooks share; build one with [`ApiClient::into_dyn`].
pub type AppClient = ApiClient<DynTransport>;

pub fn use_api() -> AppClient {
    use_context::<AppClient>()
}

pub fn use_session() -> Signal<Session> {
    use_context::<Signal<Session>>()
}

/// Wrap the admin app with this component so the hooks can find the client.
///
/// Changing `token` drops every cached read before the queries run again, so
/// data fetched for one identity is never shown to another.
#[component]
pub fn ApiProvider(client: AppClient, #[props(default)] token: Option<String>, children: Element) -> Element {
    let mut session = use_signal(|| Session { token: token.clone() });
    let toasts = use_signal(ToastCenter::default);

    let cache = client.cache().clone();
    use_effect(use_reactive((&token,), move |(token,)| {
        if session.peek().token != token {
            tracing::info!(signed_in = token.is_some(), "session token changed, clearing query cache");
            cache.clear();
            session.set(Session { token });
        }
    }));

    use_context_provider(|| client.clone());
    use_context_provider(|| session);
    use_context_provider(|| toasts);

    rsx! {
        {children}
    }
}
