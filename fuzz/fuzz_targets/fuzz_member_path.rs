#![no_main]

use bindery_observe::MemberPath;
use bindery_observe::path::{index_arguments, indexer_arity};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let path = MemberPath::parse(text);
    assert_eq!(path, MemberPath::parse(text));
    for segment in path.segments() {
        assert!(!segment.is_empty());
        if let Some(arity) = indexer_arity(segment) {
            assert_eq!(index_arguments(segment).len(), arity);
        }
    }
});
