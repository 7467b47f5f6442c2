//! Scatter/gather barrier for one writing wave.

use crate::error::ApiError;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use tracing::{debug, warn};

/// Run keyed tasks concurrently and wait for all of them.
///
/// Returns one result per key once every task has succeeded. The first failure is returned
/// immediately and the remaining in-flight tasks are dropped. `limit` caps how many tasks
/// run at once; `None` runs the whole batch together. Keys must be unique.
pub async fn scatter_gather<K, T, Fut>(
    tasks: Vec<(K, Fut)>,
    limit: Option<usize>,
) -> Result<HashMap<K, T>, ApiError>
where
    K: Eq + Hash + Clone + Display,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut seen = HashSet::with_capacity(tasks.len());
    for (key, _) in &tasks {
        if !seen.insert(key.clone()) {
            return Err(ApiError::DuplicateTask(key.to_string()));
        }
    }

    let total = tasks.len();
    if total == 0 {
        return Ok(HashMap::new());
    }
    let width = limit.unwrap_or(total).clamp(1, total);
    debug!(total, width, "Scattering tasks");

    let mut pending = stream::iter(
        tasks
            .into_iter()
            .map(|(key, fut)| async move { (key, fut.await) }),
    )
    .buffer_unordered(width);

    let mut gathered = HashMap::with_capacity(total);
    while let Some((key, outcome)) = pending.next().await {
        match outcome {
            Ok(value) => {
                debug!(task = %key, done = gathered.len() + 1, total, "Task completed");
                gathered.insert(key, value);
            }
            Err(err) => {
                warn!(task = %key, error = %err, "Task failed, abandoning batch");
                return Err(err);
            }
        }
    }
    Ok(gathered)
}
