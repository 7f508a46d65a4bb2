use crate::bridge::{Subscription, client_key_of};
use crate::client::{ClientError, QueriesObserver, QueryClient, QueryContext};
use crate::metrics::BridgeMetrics;
use crate::models::{QueryResult, Record, Shared, Value};
use crate::state::{ReactiveList, ReadonlyList, Scope};
use crate::utils::{QueryArgs, parse_query_args};
use std::sync::Arc;

/// Caller-owned, mutable list of query descriptors watched by [`use_queries`]
pub type QueriesInput = Shared<Vec<QueryArgs>>;

/// Normalize every descriptor into an options record
pub fn normalize_queries(queries: &[QueryArgs]) -> Vec<Record> {
    queries.iter().cloned().map(parse_query_args).collect()
}

fn default_queries(client: &dyn QueryClient, normalized: &[Record]) -> Vec<Record> {
    normalized
        .iter()
        .map(|options| client.default_query_observer_options(options))
        .collect()
}

fn detached_results(observer: &dyn QueriesObserver) -> Vec<QueryResult> {
    observer
        .get_current_result()
        .iter()
        .map(QueryResult::detached)
        .collect()
}

struct QueriesBridge {
    client: Arc<dyn QueryClient>,
    observer: Arc<dyn QueriesObserver>,
    state: ReactiveList<QueryResult>,
    subscription: Subscription,
    metrics: Arc<BridgeMetrics>,
}

impl QueriesBridge {
    /// Write each changed result into the container at its index
    fn apply(&self, results: &[QueryResult]) {
        if self.subscription.is_torn_down() {
            tracing::trace!("Ignoring {} results delivered after teardown", results.len());
            self.metrics.record_snapshot_ignored();
            return;
        }

        let mut written = 0;
        for (index, result) in results.iter().enumerate() {
            if self.state.get(index).as_ref() == Some(result) {
                continue;
            }
            self.state.set(index, result.detached());
            written += 1;
        }
        tracing::trace!("Applied query results: {} of {} changed", written, results.len());
        self.metrics.record_snapshot_applied();
    }

    /// Forward changed options to the observer and rebuild the container
    fn reconfigure(&self, normalized: &[Record]) {
        if self.subscription.is_torn_down() {
            tracing::warn!("Options changed after teardown, ignoring");
            return;
        }

        tracing::debug!("Query options changed, tracking {} queries", normalized.len());
        self.observer
            .set_queries(default_queries(self.client.as_ref(), normalized));
        self.metrics.record_option_change();

        self.state.replace_all(detached_results(self.observer.as_ref()));
        self.metrics.record_rebuild();
    }

    fn tear_down(&self) {
        if self.subscription.tear_down() {
            tracing::debug!("Queries bridge torn down");
            self.metrics.record_torn_down();
        }
    }
}

// Dropped without an unmount: every view and the scope are gone
impl Drop for QueriesBridge {
    fn drop(&mut self) {
        self.tear_down();
    }
}

/// Bind a multi-query observer to reactive state owned by `scope`.
///
/// Every descriptor in `queries` is normalized with [`parse_query_args`]; the client is
/// resolved from the `queryClientKey` of the first one. The returned list is index-aligned
/// with `queries` and is updated:
/// - element by element whenever the observer emits results
/// - as a whole after [`Scope::flush`] detects a deep change in `queries`
///
/// Unmounting `scope` releases the observer subscription. Results arriving afterwards
/// are ignored. The returned view keeps the bridge alive on its own; if it is dropped
/// along with every handle of `scope`, the subscription is released then.
///
/// # Errors
/// [`ClientError::ClientNotFound`] if no client is registered for the selected key.
///
/// # Example
/// ```ignore
/// let queries = QueriesInput::new(vec![
///     QueryArgs::KeyFn { key: "todos".into(), query_fn: fetch_todos, options: None },
///     QueryArgs::Options(Record::new().with("queryKey", "user")),
/// ]);
/// let results = use_queries(&scope, &context, &queries)?;
/// assert_eq!(results.len(), 2);
/// ```
pub fn use_queries(
    scope: &Scope,
    context: &QueryContext,
    queries: &QueriesInput,
) -> Result<ReadonlyList<QueryResult>, ClientError> {
    let normalized = normalize_queries(&queries.read());
    let client = context.resolve(client_key_of(normalized.first()).as_deref())?;

    let observer = client.queries_observer(default_queries(client.as_ref(), &normalized));
    let state = ReactiveList::with_capacity(
        detached_results(observer.as_ref()),
        context.change_buffer(),
    );

    let bridge = Arc::new(QueriesBridge {
        client,
        observer,
        state,
        subscription: Subscription::new(),
        metrics: Arc::clone(context.metrics()),
    });

    // The observer holds the listener, so the listener must not keep the bridge alive
    let listener_bridge = Arc::downgrade(&bridge);
    let listener_metrics = Arc::clone(context.metrics());
    let unsubscribe = bridge.observer.subscribe(Arc::new(move |results: &[QueryResult]| {
        match listener_bridge.upgrade() {
            Some(bridge) => bridge.apply(results),
            None => listener_metrics.record_snapshot_ignored(),
        }
    }));
    bridge.subscription.attach(unsubscribe);

    let source_queries = queries.clone();
    let watched_queries = queries.clone();
    let watch_bridge = Arc::clone(&bridge);
    scope.watch_deep(
        move || {
            Value::array(
                normalize_queries(&source_queries.read())
                    .into_iter()
                    .map(Value::Record),
            )
        },
        move |_, _| {
            let normalized = normalize_queries(&watched_queries.read());
            watch_bridge.reconfigure(&normalized);
        },
    );

    let teardown_bridge = Arc::clone(&bridge);
    scope.on_unmounted(move || teardown_bridge.tear_down());

    context.metrics().record_mounted();
    tracing::debug!("Mounted queries bridge with {} queries", normalized.len());

    let view = bridge.state.readonly();
    Ok(view.with_owner(bridge))
}
