#![no_main]

use arbitrary::Arbitrary;
use bindery_core::{DynamicObject, ObservableList, TypeBuilder, Value, ValueType};
use bindery_observe::{ObserverFlags, ObserverProvider};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Segment {
    Child,
    Items,
    Value,
    Missing(u8),
    Index(i8),
    Pair(i8, i8),
    Quoted(String),
    Raw(String),
}

impl Segment {
    fn push_to(&self, out: &mut String) {
        match self {
            Segment::Child => out.push_str(".Child"),
            Segment::Items => out.push_str(".Items"),
            Segment::Value => out.push_str(".Value"),
            Segment::Missing(n) => out.push_str(&format!(".M{n}")),
            Segment::Index(i) => out.push_str(&format!("[{i}]")),
            Segment::Pair(a, b) => out.push_str(&format!("[{a},{b}]")),
            Segment::Quoted(s) => out.push_str(&format!("['{s}']")),
            Segment::Raw(s) => out.push_str(s),
        }
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    segments: Vec<Segment>,
    optional: bool,
    root_only: bool,
}

fuzz_target!(|input: Input| {
    let ty = TypeBuilder::class("Node")
        .dynamic_property("Child", ValueType::Any)
        .dynamic_property("Items", ValueType::Any)
        .dynamic_property("Value", ValueType::Int)
        .build();
    let root = DynamicObject::new(&ty);
    let child = DynamicObject::new(&ty);
    child.set("Value", 1);
    child.set(
        "Items",
        Value::object(ObservableList::from_values([Value::object(DynamicObject::new(&ty))])),
    );
    root.set("Child", Value::object(child));

    let mut text = String::new();
    for segment in input.segments.iter().take(16) {
        segment.push_to(&mut text);
    }

    let mut flags = ObserverFlags::OBSERVABLE;
    flags.set(ObserverFlags::OPTIONAL, input.optional);
    flags.set(ObserverFlags::ROOT_ONLY, input.root_only);

    let provider = ObserverProvider::default();
    let path = provider.parse_path(&text);
    let observer = provider.create_observer(&Value::object(root.clone()), &path, flags);
    let _ = observer.last_member();
    root.set("Child", Value::Null);
    let _ = observer.members();
    observer.dispose();
});
