//! `use_create`, `use_update` and `use_delete`.
//!
//! Each returns a `Copy` handle that can be moved into event handlers. A call
//! spawns the request; on success the cache is invalidated by the client, a
//! toast is raised, the `on_success` callback runs and the router navigates to
//! the redirect target when one was configured. Hooks must live under a
//! `Router`.

use std::ops::Deref;

use api::{ApiError, Mutation, MutationOptions, Toast};
use dioxus::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::provider::{use_api, use_session, AppClient};
use crate::toast::{push_toast, use_toasts, ToastCenter, ToastNotifier};

#[derive(Clone, PartialEq)]
struct MutationConfig {
    client: AppClient,
    resource: String,
    options: MutationOptions,
    on_success: Option<Callback<Value>>,
}

/// State shared by the three mutation handles.
#[derive(Clone, Copy)]
pub struct UseMutation {
    config: CopyValue<MutationConfig>,
    session: Signal<crate::provider::Session>,
    toasts: Signal<ToastCenter>,
    navigator: Navigator,
    pending: Signal<bool>,
    error: Signal<Option<ApiError>>,
    last: Signal<Option<Value>>,
}

impl UseMutation {
    pub fn is_pending(&self) -> bool {
        (self.pending)()
    }

    pub fn error(&self) -> Option<ApiError> {
        self.error.read().clone()
    }

    /// Body of the last successful response.
    pub fn data(&self) -> Option<Value> {
        self.last.read().clone()
    }

    /// Send an arbitrary mutation with this hook's options, token and callbacks.
    pub fn run(&self, mutation: api::Result<Mutation>) {
        let mut this = *self;
        let config = self.config.peek().clone();
        let mutation = match mutation {
            Ok(m) => m
                .with_optional_token(self.session.peek().token.clone())
                .with_options(config.options.clone()),
            Err(e) => {
                push_toast(&mut this.toasts, Toast::error(e.user_message()));
                this.error.set(Some(e));
                return;
            }
        };

        spawn(async move {
            this.pending.set(true);
            this.error.set(None);
            let notifier = ToastNotifier(this.toasts);
            match config.client.mutate::<Value>(&mutation, &notifier).await {
                Ok(outcome) => {
                    this.last.set(Some(outcome.data.clone()));
                    if let Some(on_success) = config.on_success {
                        on_success.call(outcome.data);
                    }
                    if let Some(path) = outcome.redirect {
                        this.navigator.push(path);
                    }
                }
                Err(e) => this.error.set(Some(e)),
            }
            this.pending.set(false);
        });
    }
}

fn use_mutation(resource: &str, options: MutationOptions, on_success: Option<Callback<Value>>) -> UseMutation {
    let client = use_api();
    let session = use_session();
    let toasts = use_toasts();
    let navigator = use_navigator();
    let resource = resource.to_string();
    let next = MutationConfig {
        client,
        resource,
        options,
        on_success,
    };
    let mut config = use_hook(|| CopyValue::new(next.clone()));
    if *config.peek() != next {
        config.set(next);
    }

    UseMutation {
        config,
        session,
        toasts,
        navigator,
        pending: use_signal(|| false),
        error: use_signal(|| None),
        last: use_signal(|| None),
    }
}

#[derive(Clone, Copy)]
pub struct UseCreate(UseMutation);

impl UseCreate {
    /// POST `body` to the collection.
    pub fn mutate<B: Serialize>(&self, body: &B) {
        let resource = self.0.config.peek().resource.clone();
        self.0.run(Mutation::create(&resource, body));
    }
}

impl Deref for UseCreate {
    type Target = UseMutation;

    fn deref(&self) -> &UseMutation {
        &self.0
    }
}

#[derive(Clone, Copy)]
pub struct UseUpdate(UseMutation);

impl UseUpdate {
    /// PUT `body` to `<resource>/<id>`.
    pub fn mutate<B: Serialize>(&self, id: impl ToString, body: &B) {
        let resource = self.0.config.peek().resource.clone();
        self.0.run(Mutation::update(&resource, id, body));
    }
}

impl Deref for UseUpdate {
    type Target = UseMutation;

    fn deref(&self) -> &UseMutation {
        &self.0
    }
}

#[derive(Clone, Copy)]
pub struct UseDelete(UseMutation);

impl UseDelete {
    /// DELETE `<resource>/<id>`.
    pub fn mutate(&self, id: impl ToString) {
        let resource = self.0.config.peek().resource.clone();
        self.0.run(Ok(Mutation::delete(&resource, id)));
    }
}

impl Deref for UseDelete {
    type Target = UseMutation;

    fn deref(&self) -> &UseMutation {
        &self.0
    }
}

pub fn use_create(resource: &str, options: MutationOptions, on_success: Option<Callback<Value>>) -> UseCreate {
    UseCreate(use_mutation(resource, options, on_success))
}

pub fn use_update(resource: &str, options: MutationOptions, on_success: Option<Callback<Value>>) -> UseUpdate {
    UseUpdate(use_mutation(resource, options, on_success))
}

pub fn use_delete(resource: &str, options: MutationOptions, on_success: Option<Callback<Value>>) -> UseDelete {
    UseDelete(use_mutation(resource, options, on_success))
}
