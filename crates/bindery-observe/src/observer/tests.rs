use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use bindery_core::{
    BindingError, BindingObject, ChangeEvent, DynamicObject, MemberBuilder, ObservableList,
    TypeBuilder, TypeRef, Value, ValueType,
};

use super::*;
use crate::config::ObserverConfig;
use crate::provider::ObserverProvider;

fn node_type() -> TypeRef {
    TypeBuilder::class("Node")
        .dynamic_property("A", ValueType::Any)
        .dynamic_property("B", ValueType::Any)
        .dynamic_property("C", ValueType::Any)
        .dynamic_property("Items", ValueType::Any)
        .build()
}

struct Graph {
    root: Arc<DynamicObject>,
    a: Arc<DynamicObject>,
    b: Arc<DynamicObject>,
}

/// `root.A.B.C == 5`
fn graph(ty: &TypeRef) -> Graph {
    let root = DynamicObject::new(ty);
    let a = DynamicObject::new(ty);
    let b = DynamicObject::new(ty);
    b.set("C", 5);
    a.set("B", Value::object(Arc::clone(&b)));
    root.set("A", Value::object(Arc::clone(&a)));
    Graph { root, a, b }
}

fn observe(provider: &ObserverProvider, target: &Value, path: &str, flags: ObserverFlags) -> PathObserver {
    provider.create_observer(target, &provider.parse_path(path), flags)
}

fn last_value(observer: &PathObserver) -> Option<Value> {
    observer.last_member().ok().and_then(|m| m.get_value().ok())
}

#[derive(Default)]
struct Recorder {
    resolved: AtomicUsize,
    changes: Mutex<Vec<String>>,
    errors: Mutex<Vec<BindingError>>,
}

impl Recorder {
    fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }

    fn changes(&self) -> Vec<String> {
        self.changes.lock().unwrap().clone()
    }
}

impl ObserverListener for Recorder {
    fn on_path_members_changed(&self, _observer: &PathObserver) {
        self.resolved.fetch_add(1, Ordering::SeqCst);
    }

    fn on_last_member_changed(&self, _observer: &PathObserver, event: &ChangeEvent) {
        self.changes.lock().unwrap().push(event.member().to_string());
    }

    fn on_error(&self, _observer: &PathObserver, error: &BindingError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

fn listen(observer: &PathObserver) -> Arc<Recorder> {
    let recorder = Arc::new(Recorder::default());
    observer.add_listener(Arc::downgrade(&recorder) as Weak<dyn ObserverListener>);
    recorder
}

#[test]
fn multi_path_reports_terminal_member_on_penultimate_value() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);

    let last = observer.last_member().ok().unwrap();
    assert_eq!(last.member().name(), "C");
    assert_eq!(last.target(), &Value::object(Arc::clone(&g.b)));
    assert_eq!(last.get_value(), Ok(Value::Int(5)));

    let members = observer.members().ok().unwrap();
    let names: Vec<&str> = members.members().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn absent_intermediate_is_unavailable_not_an_error() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let g = graph(&ty);
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let recorder = listen(&observer);
    assert_eq!(recorder.resolved(), 1);

    g.a.set("B", Value::Null);
    assert_eq!(recorder.resolved(), 2);
    assert!(observer.last_member().is_unavailable());
    assert!(observer.last_error().is_none());
    assert!(recorder.errors.lock().unwrap().is_empty());

    let replacement = DynamicObject::new(&ty);
    replacement.set("C", 7);
    g.a.set("B", Value::object(replacement));
    assert_eq!(last_value(&observer), Some(Value::Int(7)));
}

#[test]
fn missing_member_fails_unless_optional() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let target = Value::object(Arc::clone(&g.root));

    let required = observe(&provider, &target, "A.Missing", ObserverFlags::OBSERVABLE);
    let recorder = listen(&required);
    assert_eq!(
        required.last_member().error(),
        Some(&BindingError::invalid_member("Node", "Missing"))
    );
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    assert!(required.last_error().is_some());

    let optional = observe(
        &provider,
        &target,
        "A.Missing",
        ObserverFlags::OBSERVABLE | ObserverFlags::OPTIONAL,
    );
    assert!(optional.last_member().is_unavailable());
    assert!(optional.last_error().is_none());
}

#[test]
fn terminal_changes_reach_listeners() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let recorder = listen(&observer);

    g.b.set("C", 6);
    assert_eq!(recorder.changes(), ["C"]);
    // Unrelated member on the same object.
    g.b.set("A", 1);
    assert_eq!(recorder.changes(), ["C"]);
    assert_eq!(recorder.resolved(), 1);
}

#[test]
fn last_listener_releases_only_the_terminal_subscription() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let recorder = listen(&observer);
    assert_eq!(observer.subscription_counts(), (2, true, false));

    let weak = Arc::downgrade(&recorder) as Weak<dyn ObserverListener>;
    assert!(observer.remove_listener(&weak));
    assert!(!observer.remove_listener(&weak));
    assert_eq!(observer.subscription_counts(), (2, false, false));

    // A new first listener re-subscribes without a full pass.
    let again = listen(&observer);
    assert_eq!(observer.subscription_counts(), (2, true, false));
    assert_eq!(again.resolved(), 0);
}

#[test]
fn root_only_observes_first_link() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let g = graph(&ty);
    let observer = observe(
        &provider,
        &Value::object(Arc::clone(&g.root)),
        "A.B.C",
        ObserverFlags::OBSERVABLE | ObserverFlags::ROOT_ONLY,
    );
    let recorder = listen(&observer);
    assert_eq!(observer.kind(), ObserverKind::RootMultiPath);
    assert_eq!(observer.subscription_counts(), (1, true, false));

    let other = DynamicObject::new(&ty);
    other.set("C", 8);
    // Deeper link: not observed.
    g.a.set("B", Value::object(Arc::clone(&other)));
    assert_eq!(recorder.resolved(), 1);

    g.root.set("A", Value::Null);
    assert_eq!(recorder.resolved(), 2);
    assert!(observer.last_member().is_unavailable());
}

#[test]
fn dispose_is_idempotent_and_terminal() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let recorder = listen(&observer);

    observer.dispose();
    observer.dispose();
    assert!(observer.is_disposed());
    assert_eq!(observer.subscription_counts(), (0, false, false));
    assert_eq!(observer.listener_count(), 0);
    assert!(observer.target().is_none());
    assert_eq!(observer.last_member(), Resolution::Failed(BindingError::Disposed));
    assert_eq!(observer.members().error(), Some(&BindingError::Disposed));

    g.b.set("C", 9);
    assert!(recorder.changes().is_empty());
    assert_eq!(g.b.notifier().map(|n| n.subscriber_count()), Some(0));
}

#[test]
fn non_disposable_ignores_dispose() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(
        &provider,
        &Value::object(Arc::clone(&g.root)),
        "A",
        ObserverFlags::OBSERVABLE | ObserverFlags::NON_DISPOSABLE,
    );
    observer.dispose();
    assert!(!observer.is_disposed());
    assert!(observer.last_member().is_resolved());
}

#[test]
fn target_stays_weakly_held() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let root = DynamicObject::new(&ty);
    root.set("A", 1);
    let observer = observe(&provider, &Value::object(Arc::clone(&root)), "A", ObserverFlags::OBSERVABLE);
    assert_eq!(last_value(&observer), Some(Value::Int(1)));
    assert_eq!(Arc::strong_count(&root), 1);

    drop(root);
    assert!(observer.target().is_none());
    observer.update();
    assert!(observer.last_member().is_unavailable());
}

#[test]
fn retained_target_survives_its_owner() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let root = DynamicObject::new(&ty);
    root.set("A", 3);
    let observer = observe(
        &provider,
        &Value::object(Arc::clone(&root)),
        "A",
        ObserverFlags::OBSERVABLE | ObserverFlags::RETAIN_TARGET,
    );
    drop(root);
    assert_eq!(last_value(&observer), Some(Value::Int(3)));
}

#[test]
fn non_observable_observer_rereads_on_query() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let g = graph(&ty);
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::empty());
    assert_eq!(last_value(&observer), Some(Value::Int(5)));
    assert_eq!(observer.subscription_counts().0, 0);

    let other = DynamicObject::new(&ty);
    other.set("C", 11);
    g.a.set("B", Value::object(other));
    assert_eq!(last_value(&observer), Some(Value::Int(11)));
}

/// Swaps `root.A` the first time it hears about a resolution.
struct Mutator {
    root: Arc<DynamicObject>,
    replacement: Mutex<Option<Value>>,
    resolved: AtomicUsize,
}

impl ObserverListener for Mutator {
    fn on_path_members_changed(&self, _observer: &PathObserver) {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.replacement.lock().unwrap().take() {
            self.root.set("A", next);
        }
    }
}

fn reentrant_run(coalesce: bool) -> (usize, Option<Value>) {
    let config = ObserverConfig {
        coalesce_updates: coalesce,
        ..ObserverConfig::default()
    };
    let provider = ObserverProvider::new(config);
    let ty = node_type();
    let g = graph(&ty);
    let other = DynamicObject::new(&ty);
    let next_b = DynamicObject::new(&ty);
    next_b.set("C", 42);
    other.set("B", Value::object(next_b));

    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let mutator = Arc::new(Mutator {
        root: Arc::clone(&g.root),
        replacement: Mutex::new(Some(Value::object(other))),
        resolved: AtomicUsize::new(0),
    });
    observer.add_listener(Arc::downgrade(&mutator) as Weak<dyn ObserverListener>);
    let value = observer
        .last_member()
        .ok()
        .and_then(|m| m.get_value().ok());
    (mutator.resolved.load(Ordering::SeqCst), value)
}

#[test]
fn change_during_pass_runs_exactly_one_more_pass() {
    assert_eq!(reentrant_run(true), (2, Some(Value::Int(42))));
}

#[test]
fn change_during_pass_is_dropped_without_coalescing() {
    let (passes, value) = reentrant_run(false);
    assert_eq!(passes, 1);
    assert_eq!(value, Some(Value::Int(5)));
}

struct Panicker;

impl ObserverListener for Panicker {
    fn on_path_members_changed(&self, _observer: &PathObserver) {
        panic!("listener exploded");
    }
}

#[test]
fn panicking_listener_does_not_break_fan_out() {
    let provider = ObserverProvider::default();
    let g = graph(&node_type());
    let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", ObserverFlags::OBSERVABLE);
    let panicker = Arc::new(Panicker);
    observer.add_listener(Arc::downgrade(&panicker) as Weak<dyn ObserverListener>);
    let recorder = listen(&observer);

    g.a.set("B", Value::Null);
    assert_eq!(recorder.resolved(), 1);
    assert!(observer.last_member().is_unavailable());
}

#[test]
fn failing_and_panicking_getters_become_errors() {
    let provider = ObserverProvider::default();
    let ty = TypeBuilder::class("Faulty")
        .member(MemberBuilder::property("Broken").getter(|_, _| Err(BindingError::accessor("boom"))))
        .member(MemberBuilder::property("Explodes").getter(|_, _| panic!("getter exploded")))
        .dynamic_property("Next", ValueType::Any)
        .build();
    let target = Value::object(DynamicObject::new(&ty));

    let broken = observe(&provider, &target, "Broken.X", ObserverFlags::OBSERVABLE);
    assert_eq!(broken.last_member().error(), Some(&BindingError::accessor("boom")));

    let exploding = observe(&provider, &target, "Explodes.X", ObserverFlags::OBSERVABLE);
    let Some(BindingError::Accessor(message)) = exploding.last_error().or_else(|| {
        exploding.last_member().error().cloned()
    }) else {
        panic!("expected an accessor error");
    };
    assert!(message.contains("getter exploded"));
}

#[test]
fn stable_path_keeps_the_first_member_chain() {
    let ty = node_type();
    let run = |flags: ObserverFlags| {
        let provider = ObserverProvider::default();
        let g = graph(&ty);
        let observer = observe(&provider, &Value::object(Arc::clone(&g.root)), "A.B.C", flags);
        assert_eq!(last_value(&observer), Some(Value::Int(5)));
        let attached = MemberBuilder::constant("C", Value::Int(100))
            .extension()
            .build_for(&ty);
        provider
            .resolver()
            .register_member(&ty, "C", attached, false)
            .unwrap();
        observer.update();
        last_value(&observer)
    };
    assert_eq!(
        run(ObserverFlags::OBSERVABLE | ObserverFlags::HAS_STABLE_PATH),
        Some(Value::Int(5))
    );
    assert_eq!(run(ObserverFlags::OBSERVABLE), Some(Value::Int(100)));
}

#[test]
fn indexer_path_into_observable_list() {
    let provider = ObserverProvider::default();
    let ty = node_type();
    let root = DynamicObject::new(&ty);
    let list = ObservableList::from_values([Value::Int(10), Value::Int(20), Value::Int(30)]);
    root.set("Items", Value::object(Arc::clone(&list)));

    let observer = observe(&provider, &Value::object(Arc::clone(&root)), "Items[1]", ObserverFlags::OBSERVABLE);
    let recorder = listen(&observer);
    let last = observer.last_member().ok().unwrap();
    assert!(last.member().is_indexer());
    assert_eq!(last.get_value(), Ok(Value::Int(20)));

    list.set(1, 99).unwrap();
    assert_eq!(recorder.changes(), ["Item[]"]);
    list.remove(0).unwrap();
    assert_eq!(last_value(&observer), Some(Value::Int(30)));

    last.set_value(7).unwrap();
    assert_eq!(list.get(1), Some(Value::Int(7)));
}

#[test]
fn method_observer_forwards_event_and_exposes_member() {
    let provider = ObserverProvider::default();
    let button_ty = TypeBuilder::class("Button")
        .member(MemberBuilder::event("Click"))
        .member(MemberBuilder::method("Focus", 0).invoker(|_, _| Ok(Value::Bool(true))))
        .build();
    let ty = node_type();
    let root = DynamicObject::new(&ty);
    let button = DynamicObject::new(&button_ty);
    root.set("A", Value::object(Arc::clone(&button)));
    let target = Value::object(Arc::clone(&root));
    let path = provider.parse_path("A");

    let click = provider.create_method_observer(&target, &path, "Click", ObserverFlags::OBSERVABLE);
    let recorder = listen(&click);
    assert_eq!(click.kind(), ObserverKind::MethodSingle);
    assert_eq!(click.subscription_counts(), (0, true, true));
    let member = click.method_member().ok().unwrap();
    assert_eq!(member.member().name(), "Click");
    assert_eq!(member.target(), &Value::object(Arc::clone(&button)));

    let notifier = button.notifier().unwrap();
    notifier.raise(&ChangeEvent::new("Click", Value::Int(1)));
    assert_eq!(recorder.changes(), ["Click"]);

    let focus = provider.create_method_observer(&target, &path, "Focus", ObserverFlags::OBSERVABLE);
    let method = focus.method_member().ok().unwrap();
    assert_eq!(method.member().invoke(method.target(), &[]), Ok(Value::Bool(true)));

    let missing = provider.create_method_observer(&target, &path, "Nope", ObserverFlags::OBSERVABLE);
    assert!(missing.method_member().error().is_some());
    let optional = provider.create_method_observer(
        &target,
        &path,
        "Nope",
        ObserverFlags::OBSERVABLE | ObserverFlags::OPTIONAL,
    );
    assert!(optional.method_member().is_unavailable());
}

#[test]
fn empty_path_is_the_target_itself() {
    let provider = ObserverProvider::default();
    let root = DynamicObject::new(&node_type());
    let target = Value::object(Arc::clone(&root));
    let observer = observe(&provider, &target, "", ObserverFlags::OBSERVABLE);
    assert_eq!(observer.kind(), ObserverKind::Empty);
    let last = observer.last_member().ok().unwrap();
    assert_eq!(last.get_value(), Ok(target));

    let null = observe(&provider, &Value::Null, "", ObserverFlags::OBSERVABLE);
    assert!(null.last_member().is_unavailable());
}

#[test]
fn panicking_terminal_getter_fails_method_observer_and_recovers() {
    let provider = ObserverProvider::default();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let ty = TypeBuilder::class("Faulty")
        .member(MemberBuilder::property("Explodes").getter(move |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
            panic!("getter exploded")
        }))
        .build();
    let target = Value::object(DynamicObject::new(&ty));
    let observer = provider.create_method_observer(
        &target,
        &provider.parse_path("Explodes"),
        "Click",
        ObserverFlags::OBSERVABLE,
    );

    let Some(BindingError::Accessor(message)) = observer.method_member().error().cloned() else {
        panic!("expected an accessor error");
    };
    assert!(message.contains("getter exploded"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let recorder = listen(&observer);
    observer.update();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.errors.lock().unwrap().len(), 1);
    assert!(observer.last_error().is_some());
    assert_eq!(recorder.resolved(), 0);
}

#[test]
fn panicking_subscription_hook_becomes_an_error() {
    let provider = ObserverProvider::default();
    let ty = TypeBuilder::class("Hooked")
        .member(
            MemberBuilder::property("Value")
                .getter(|_, _| Ok(Value::Int(1)))
                .observe_with(|_, _, _| panic!("hook exploded")),
        )
        .build();
    let target = Value::object(DynamicObject::new(&ty));
    let observer = observe(&provider, &target, "Value", ObserverFlags::OBSERVABLE);
    assert_eq!(last_value(&observer), Some(Value::Int(1)));

    // Late subscription on an already resolved observer.
    let recorder = listen(&observer);
    let errors = recorder.errors.lock().unwrap().clone();
    assert!(matches!(
        errors.as_slice(),
        [BindingError::Accessor(message)] if message.contains("hook exploded")
    ));
    assert!(observer.last_member().error().is_some());

    // Subscription during a pass.
    observer.update();
    assert_eq!(recorder.errors.lock().unwrap().len(), 2);
    assert_eq!(observer.subscription_counts(), (0, false, false));
}

#[test]
fn method_on_unreadable_terminal_is_unavailable() {
    let provider = ObserverProvider::default();
    let ty = TypeBuilder::class("Source")
        .member(MemberBuilder::event("Changed"))
        .build();
    let target = Value::object(DynamicObject::new(&ty));
    let observer = provider.create_method_observer(
        &target,
        &provider.parse_path("Changed"),
        "Focus",
        ObserverFlags::OBSERVABLE,
    );
    assert!(observer.method_member().is_unavailable());
    assert!(observer.last_error().is_none());
}

#[test]
fn dispose_during_a_pass_discards_its_result() {
    let provider = ObserverProvider::default();
    let slot: Arc<Mutex<Option<PathObserver>>> = Arc::new(Mutex::new(None));
    let inner = Arc::clone(&slot);
    let node = node_type();
    let ty = TypeBuilder::class("Disposer")
        .member(MemberBuilder::property("A").getter(move |_, _| {
            if let Some(observer) = inner.lock().unwrap().as_ref() {
                observer.dispose();
            }
            let next = DynamicObject::new(&node);
            next.set("C", 3);
            Ok(Value::object(next))
        }))
        .build();
    let target = Value::object(DynamicObject::new(&ty));
    let observer = observe(&provider, &target, "A.C", ObserverFlags::OBSERVABLE);
    *slot.lock().unwrap() = Some(observer.clone());

    let recorder = listen(&observer);
    assert!(observer.is_disposed());
    assert_eq!(recorder.resolved(), 0);
    assert!(recorder.errors.lock().unwrap().is_empty());
    assert_eq!(observer.subscription_counts(), (0, false, false));
    assert_eq!(observer.last_member().error(), Some(&BindingError::Disposed));

    slot.lock().unwrap().take();
}
