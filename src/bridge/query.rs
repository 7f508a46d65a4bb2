use crate::bridge::{Subscription, client_key_of};
use crate::client::{ClientError, QueryClient, QueryContext, QueryObserver};
use crate::metrics::BridgeMetrics;
use crate::models::{QueryResult, Shared, Value};
use crate::state::{ReactiveRecord, ReadonlyRecord, Scope};
use crate::utils::{QueryArgs, parse_query_args};
use std::sync::Arc;

/// Caller-owned, mutable descriptor watched by [`use_query`]
pub type QueryInput = Shared<QueryArgs>;

struct QueryBridge {
    client: Arc<dyn QueryClient>,
    observer: Arc<dyn QueryObserver>,
    state: ReactiveRecord,
    subscription: Subscription,
    metrics: Arc<BridgeMetrics>,
}

impl QueryBridge {
    fn apply(&self, result: &QueryResult) {
        if self.subscription.is_torn_down() {
            tracing::trace!("Ignoring query result delivered after teardown");
            self.metrics.record_snapshot_ignored();
            return;
        }

        let changed = self.state.reconcile(&result.to_record());
        tracing::trace!("Applied query result, changed fields: {:?}", changed);
        self.metrics.record_snapshot_applied();
    }

    fn reconfigure(&self, args: QueryArgs) {
        if self.subscription.is_torn_down() {
            tracing::warn!("Options changed after teardown, ignoring");
            return;
        }

        let options = parse_query_args(args);
        tracing::debug!("Query options changed");
        self.observer
            .set_options(self.client.default_query_observer_options(&options));
        self.metrics.record_option_change();

        self.state
            .reconcile(&self.observer.get_current_result().to_record());
        self.metrics.record_rebuild();
    }

    fn tear_down(&self) {
        if self.subscription.tear_down() {
            tracing::debug!("Query bridge torn down");
            self.metrics.record_torn_down();
        }
    }
}

// Dropped without an unmount: every view and the scope are gone
impl Drop for QueryBridge {
    fn drop(&mut self) {
        self.tear_down();
    }
}

/// Bind a single-query observer to a reactive record owned by `scope`.
///
/// The record carries the result fields in camelCase (`status`, `data`, `isLoading`, ...)
/// and is reconciled in place on every emission, so readers holding the view keep
/// seeing live values.
///
/// Lifetime rules match [`use_queries`](crate::bridge::use_queries): unmounting `scope`
/// releases the subscription, and so does dropping the view together with the scope.
///
/// # Errors
/// [`ClientError::ClientNotFound`] if no client is registered for the selected key.
pub fn use_query(
    scope: &Scope,
    context: &QueryContext,
    args: &QueryInput,
) -> Result<ReadonlyRecord, ClientError> {
    let options = parse_query_args(args.get());
    let client = context.resolve(client_key_of(Some(&options)).as_deref())?;

    let observer = client.query_observer(client.default_query_observer_options(&options));
    let state = ReactiveRecord::with_capacity(
        observer.get_current_result().to_record(),
        context.change_buffer(),
    );

    let bridge = Arc::new(QueryBridge {
        client,
        observer,
        state,
        subscription: Subscription::new(),
        metrics: Arc::clone(context.metrics()),
    });

    let listener_bridge = Arc::downgrade(&bridge);
    let listener_metrics = Arc::clone(context.metrics());
    let unsubscribe = bridge.observer.subscribe(Arc::new(move |result: &QueryResult| {
        match listener_bridge.upgrade() {
            Some(bridge) => bridge.apply(result),
            None => listener_metrics.record_snapshot_ignored(),
        }
    }));
    bridge.subscription.attach(unsubscribe);

    let source_args = args.clone();
    let watched_args = args.clone();
    let watch_bridge = Arc::clone(&bridge);
    scope.watch_deep(
        move || Value::Record(parse_query_args(source_args.get())),
        move |_, _| watch_bridge.reconfigure(watched_args.get()),
    );

    let teardown_bridge = Arc::clone(&bridge);
    scope.on_unmounted(move || teardown_bridge.tear_down());

    context.metrics().record_mounted();
    tracing::debug!("Mounted query bridge");

    let view = bridge.state.readonly();
    Ok(view.with_owner(bridge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MockQueryClient, ResultListener, Unsubscribe};
    use crate::models::{QueryKey, Record};
    use crate::state::StateChange;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeQueryObserver {
        options: Mutex<Option<Record>>,
        result: Mutex<QueryResult>,
        listener: Mutex<Option<ResultListener>>,
        unsubscribe_calls: Arc<AtomicUsize>,
    }

    impl FakeQueryObserver {
        fn emit(&self, result: QueryResult) {
            *self.result.lock() = result.clone();
            let listener = self.listener.lock().clone();
            if let Some(listener) = listener {
                listener(&result);
            }
        }
    }

    impl QueryObserver for FakeQueryObserver {
        fn get_current_result(&self) -> QueryResult {
            self.result.lock().clone()
        }

        fn subscribe(&self, listener: ResultListener) -> Unsubscribe {
            *self.listener.lock() = Some(listener);
            let calls = self.unsubscribe_calls.clone();
            Unsubscribe::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        }

        fn set_options(&self, options: Record) {
            *self.options.lock() = Some(options);
            *self.result.lock() = QueryResult::loading();
        }
    }

    fn setup() -> (Scope, QueryContext, Arc<FakeQueryObserver>) {
        let observer = Arc::new(FakeQueryObserver::default());
        let mut client = MockQueryClient::new();
        client
            .expect_default_query_observer_options()
            .returning(|options| Record::from_fields(options.fields()).with("defaulted", true));
        let client_observer = observer.clone();
        client
            .expect_query_observer()
            .times(1)
            .returning(move |options| {
                *client_observer.options.lock() = Some(options);
                client_observer.clone() as Arc<dyn QueryObserver>
            });

        let context = QueryContext::new();
        context.provide(None, Arc::new(client));
        (Scope::new(), context, observer)
    }

    fn todos() -> QueryInput {
        QueryInput::new(QueryArgs::Key {
            key: QueryKey::from("todos"),
            options: Some(Record::new().with("enabled", true)),
        })
    }

    #[test]
    fn test_initial_record_matches_observer() {
        let (scope, context, observer) = setup();
        let result = use_query(&scope, &context, &todos()).unwrap();

        assert_eq!(result.get("status"), Some(Value::from("idle")));
        assert_eq!(result.get("isIdle"), Some(Value::Bool(true)));

        let options = observer.options.lock().clone().unwrap();
        assert_eq!(options.get("queryKey"), Some(Value::from("todos")));
        assert_eq!(options.get("defaulted"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_emission_reconciles_in_place() {
        let (scope, context, observer) = setup();
        let result = use_query(&scope, &context, &todos()).unwrap();
        let mut rx = result.subscribe();

        observer.emit(QueryResult::success("done"));

        assert_eq!(result.get("data"), Some(Value::from("done")));
        assert_eq!(result.get("isSuccess"), Some(Value::Bool(true)));
        match rx.try_recv().unwrap() {
            StateChange::FieldsChanged { keys } => {
                assert!(keys.contains(&"status".to_string()));
                assert!(!keys.contains(&"failureCount".to_string()));
            }
            other => panic!("unexpected change {:?}", other),
        }
    }

    #[test]
    fn test_options_change_forwards_defaulted_options() {
        let (scope, context, observer) = setup();
        let args = todos();
        let result = use_query(&scope, &context, &args).unwrap();
        observer.emit(QueryResult::success(1));

        *args.write() = QueryArgs::Key {
            key: QueryKey::from("done"),
            options: None,
        };
        assert_eq!(scope.flush(), 1);

        let options = observer.options.lock().clone().unwrap();
        assert_eq!(options.get("queryKey"), Some(Value::from("done")));
        assert_eq!(options.get("enabled"), None);
        assert_eq!(result.get("isLoading"), Some(Value::Bool(true)));
        assert_eq!(context.metrics().option_changes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_unmount_releases_subscription() {
        let (scope, context, observer) = setup();
        let result = use_query(&scope, &context, &todos()).unwrap();

        scope.unmount();
        observer.emit(QueryResult::success("late"));

        assert_eq!(observer.unsubscribe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.get("status"), Some(Value::from("idle")));
        assert_eq!(context.metrics().active_bridges(), 0);
    }

    #[test]
    fn test_missing_keyed_client() {
        let context = QueryContext::new();
        let args = QueryInput::new(QueryArgs::Options(
            Record::new()
                .with("queryKey", "todos")
                .with("queryClientKey", "other"),
        ));

        let err = use_query(&Scope::new(), &context, &args).unwrap_err();
        assert_eq!(err, ClientError::ClientNotFound("QUERY_CLIENT:other".to_string()));
    }
}
