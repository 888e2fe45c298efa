//! The string-discriminated dispatch registry and its typed adapter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{DispatchError, value_preview};

type HandlerFuture = BoxFuture<'static, Result<(), DispatchError>>;
type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;
type Fallback = Arc<dyn Fn(String, Value) -> HandlerFuture + Send + Sync>;

/// Routes opaque payloads to handlers by a string discriminator.
///
/// A discriminator may accumulate any number of handlers; dispatch runs
/// them in registration order, all of them, and reports every failure.
/// An optional fallback catches discriminators with no handler at all.
///
/// The registry is populated during session setup and is read-only once
/// the serve loop starts; dispatch clones the handler list out of the
/// lock and never holds it across an await.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    handlers: HashMap<String, Vec<Handler>>,
    fallback: Option<Fallback>,
}

impl Registry {
    /// An empty registry with no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed handler for `discriminator`.
    ///
    /// The payload is decoded into `T` before the handler runs; this
    /// adapter is the only place an opaque payload becomes a typed
    /// value. Decode failures are reported with the target type name,
    /// the discriminator, and a bounded payload preview, never
    /// silently dropped.
    pub fn register<T, F, Fut>(&self, discriminator: &str, handler: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let key: Arc<str> = discriminator.into();
        let target = std::any::type_name::<T>();
        let wrapped: Handler = Arc::new(move |payload: Value| {
            let key = Arc::clone(&key);
            match T::deserialize(&payload) {
                Err(source) => {
                    let err = DispatchError::Decode {
                        discriminator: key.to_string(),
                        target,
                        preview: value_preview(&payload),
                        source,
                    };
                    Box::pin(async move { Err(err) })
                }
                Ok(decoded) => {
                    let fut = handler(decoded);
                    Box::pin(async move {
                        fut.await.map_err(|source| DispatchError::Handler {
                            discriminator: key.to_string(),
                            target,
                            source,
                        })
                    })
                }
            }
        });
        self.insert(discriminator, wrapped);
    }

    /// Register a handler that receives the raw payload.
    ///
    /// For handlers that only peek at the payload (e.g. to read an
    /// embedded discriminator) without committing to a shape.
    pub fn register_raw<F, Fut>(&self, discriminator: &str, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let key: Arc<str> = discriminator.into();
        let target = std::any::type_name::<Value>();
        let wrapped: Handler = Arc::new(move |payload: Value| {
            let key = Arc::clone(&key);
            let fut = handler(payload);
            Box::pin(async move {
                fut.await.map_err(|source| DispatchError::Handler {
                    discriminator: key.to_string(),
                    target,
                    source,
                })
            })
        });
        self.insert(discriminator, wrapped);
    }

    /// Set the handler invoked when a discriminator matches nothing.
    ///
    /// Replaces any previously set fallback.
    pub fn set_fallback<F, Fut>(&self, fallback: F)
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let target = std::any::type_name::<Value>();
        let wrapped: Fallback = Arc::new(move |discriminator: String, payload: Value| {
            let fut = fallback(discriminator.clone(), payload);
            Box::pin(async move {
                fut.await.map_err(|source| DispatchError::Handler {
                    discriminator,
                    target,
                    source,
                })
            })
        });
        self.inner.write().fallback = Some(wrapped);
    }

    fn insert(&self, discriminator: &str, handler: Handler) {
        let mut inner = self.inner.write();
        inner
            .handlers
            .entry(discriminator.to_owned())
            .or_default()
            .push(handler);
    }

    /// Route `payload` to the handlers registered for `discriminator`.
    ///
    /// Every matching handler runs, in registration order, regardless of
    /// earlier failures: one failing handler never prevents siblings
    /// from observing the same event. No handlers and no fallback is a
    /// silent no-op; unknown message types are expected during
    /// protocol evolution and must not abort the session.
    pub async fn dispatch(&self, discriminator: &str, payload: &Value) -> Result<(), DispatchError> {
        let (handlers, fallback) = {
            let inner = self.inner.read();
            (
                inner
                    .handlers
                    .get(discriminator)
                    .cloned()
                    .unwrap_or_default(),
                inner.fallback.clone(),
            )
        };

        if handlers.is_empty() {
            return match fallback {
                Some(fallback) => fallback(discriminator.to_owned(), payload.clone()).await,
                None => Ok(()),
            };
        }

        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(err) = handler(payload.clone()).await {
                failures.push(err);
            }
        }
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.swap_remove(0)),
            _ => Err(DispatchError::Multiple(failures)),
        }
    }
}
