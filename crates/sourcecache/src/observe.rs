// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{CachedSource, CachedSourceResult, Error};

impl<P, T, E, A, S> CachedSource<P, T, E, A, S>
where
    P: Clone + Send + 'static,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// Subscribes to every successful source call, from this point on.
    ///
    /// Each item is the parameter that was requested and the result delivered to its callers.
    /// Subscribers that fall behind by more than the broadcast capacity skip the oldest
    /// messages. The stream ends when the cached source and all its in-flight calls are dropped.
    #[must_use]
    pub fn updates(&self) -> BoxStream<'static, (P, CachedSourceResult<T>)> {
        subscribe(&self.updates, "updates")
    }

    /// Subscribes to every failed source call, from this point on.
    ///
    /// Each item is the parameter that was requested and the failure: [`Error::Source`] for an
    /// error the source returned, [`Error::Panicked`] for a source that panicked. Same delivery
    /// rules as [`updates`](Self::updates).
    #[must_use]
    pub fn errors(&self) -> BoxStream<'static, (P, Error<E>)> {
        subscribe(&self.errors, "errors")
    }
}

fn subscribe<M>(sender: &broadcast::Sender<M>, channel: &'static str) -> BoxStream<'static, M>
where
    M: Clone + Send + 'static,
{
    stream::unfold(sender.subscribe(), move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(message) => return Some((message, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(channel, skipped, "subscriber lagged, messages dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
