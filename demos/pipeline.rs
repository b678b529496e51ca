//! Pipeline demo - one request, two behaviors, one notification.
//!
//! This example demonstrates:
//! - Binding a handler and behaviors with the builder pattern
//! - Onion ordering: the first-registered behavior runs outermost
//! - A validation behavior short-circuiting bad input
//! - Publishing a notification to subscribers
//!
//! Run with `cargo run --example pipeline`.

use std::sync::Arc;

use reqwire::{
    BoxError, CancellationToken, Dispatcher, Next, Notification, Registry, Request,
};

/// Request: create a user with the given name.
struct CreateUser {
    name: String,
}

impl Request for CreateUser {
    type Response = u64;
}

/// Notification published after a user is created.
struct UserCreated {
    id: u64,
}

impl Notification for UserCreated {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let registry = Registry::builder()
        // Terminal handler: allocates the new user id.
        .bind_fn(|req: Arc<CreateUser>, _signal| async move {
            tracing::info!("creating user `{}`", req.name);
            Ok(req.name.len() as u64)
        })
        // Outermost behavior: timing around the whole pipeline.
        .behavior_fn(|_req: Arc<CreateUser>, _signal, next: Next<u64>| async move {
            let started = std::time::Instant::now();
            let out = next().await;
            tracing::info!("request took {:?}", started.elapsed());
            out
        })
        // Inner behavior: validation, short-circuits on empty names.
        .behavior_fn(|req: Arc<CreateUser>, _signal, next: Next<u64>| async move {
            if req.name.is_empty() {
                return Err::<u64, BoxError>("user name must not be empty".into());
            }
            next().await
        })
        .subscribe_fn(|event: Arc<UserCreated>, _signal| async move {
            tracing::info!("audit log: user {} created", event.id);
            Ok(())
        })
        .build()?;

    let dispatcher = Dispatcher::new(registry);
    let signal = CancellationToken::new();

    let id = dispatcher
        .dispatch(
            CreateUser {
                name: "ada".to_string(),
            },
            signal.clone(),
        )
        .await?;
    tracing::info!("created user {}", id);

    dispatcher.publish(UserCreated { id }, signal.clone()).await?;

    // Validation short-circuits before the handler runs.
    let err = dispatcher
        .dispatch(
            CreateUser {
                name: String::new(),
            },
            signal,
        )
        .await
        .expect_err("empty name must be rejected");
    tracing::warn!("rejected: {}", err);

    Ok(())
}
