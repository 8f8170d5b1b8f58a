#![forbid(unsafe_code)]

//! Observable list.
//!
//! [`ObservableList`] is the built-in collection type for indexed paths such
//! as `Items[2].Name`. Its runtime type declares:
//!
//! | Member | Kind | Notes |
//! |--------|------|-------|
//! | `Count` | property | observable, read-only |
//! | `Item` | indexer, arity 1 | observable on `Item[]`, read/write |
//! | `CollectionChanged` | event | args: the action name (`"add"`, `"remove"`, ...) |
//! | `Add` | method, arity 1 | appends its argument |
//!
//! Every structural change publishes `Count`, `Item[]` and
//! `CollectionChanged`, in that order. Replacing an element skips `Count`.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use crate::error::{BindingError, Result};
use crate::member::MemberBuilder;
use crate::notify::{ChangeEvent, ChangeNotifier};
use crate::object::BindingObject;
use crate::sync::{read, write};
use crate::types::{TypeBuilder, TypeRef};
use crate::value::{Value, ValueType};

pub const COUNT: &str = "Count";
pub const INDEXER_CHANNEL: &str = "Item[]";
pub const COLLECTION_CHANGED: &str = "CollectionChanged";

static LIST_TYPE: LazyLock<TypeRef> = LazyLock::new(|| {
    TypeBuilder::class("ObservableList")
        .member(
            MemberBuilder::property(COUNT)
                .value_type(ValueType::Int)
                .observable()
                .get_as::<ObservableList>(|list, _| Ok(Value::Int(to_i64(list.len())))),
        )
        .member(
            MemberBuilder::indexer(1)
                .observable()
                .get_as::<ObservableList>(|list, args| {
                    let items = read(&list.items);
                    let index = checked_index(args, items.len())?;
                    Ok(items[index].clone())
                })
                .set_as::<ObservableList>(|list, args, value| {
                    let index = checked_index(args, list.len())?;
                    list.set(index, value)
                }),
        )
        .member(MemberBuilder::event(COLLECTION_CHANGED))
        .member(
            MemberBuilder::method("Add", 1).invoke_as::<ObservableList>(|list, args| {
                list.push(args[0].clone());
                Ok(Value::Null)
            }),
        )
        .build()
});

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// A list of values that publishes its changes.
#[derive(Default)]
pub struct ObservableList {
    items: RwLock<Vec<Value>>,
    notifier: ChangeNotifier,
}

impl ObservableList {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Arc<Self> {
        Arc::new(Self {
            items: RwLock::new(values.into_iter().collect()),
            notifier: ChangeNotifier::new(),
        })
    }

    /// Runtime type shared by every list.
    #[must_use]
    pub fn list_type() -> TypeRef {
        Arc::clone(&*LIST_TYPE)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        read(&self.items).is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.items).get(index).cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Value> {
        read(&self.items).clone()
    }

    pub fn push(&self, value: impl Into<Value>) {
        write(&self.items).push(value.into());
        self.structure_changed("add");
    }

    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        {
            let mut items = write(&self.items);
            if index > items.len() {
                return Err(out_of_range(index, items.len()));
            }
            items.insert(index, value.into());
        }
        self.structure_changed("add");
        Ok(())
    }

    /// Replace the element at `index`.
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        {
            let mut items = write(&self.items);
            let len = items.len();
            let slot = items.get_mut(index).ok_or_else(|| out_of_range(index, len))?;
            *slot = value.into();
        }
        self.notifier.notify(INDEXER_CHANNEL);
        self.raise_changed("replace");
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<Value> {
        let removed = {
            let mut items = write(&self.items);
            if index >= items.len() {
                return Err(out_of_range(index, items.len()));
            }
            items.remove(index)
        };
        self.structure_changed("remove");
        Ok(removed)
    }

    pub fn clear(&self) {
        write(&self.items).clear();
        self.structure_changed("reset");
    }

    fn structure_changed(&self, action: &str) {
        self.notifier.notify(COUNT);
        self.notifier.notify(INDEXER_CHANNEL);
        self.raise_changed(action);
    }

    fn raise_changed(&self, action: &str) {
        self.notifier
            .raise(&ChangeEvent::new(COLLECTION_CHANGED, Value::from(action)));
    }
}

fn checked_index(args: &[Value], len: usize) -> Result<usize> {
    let raw = args
        .first()
        .and_then(Value::as_int)
        .ok_or_else(|| BindingError::accessor("list index must be an integer"))?;
    usize::try_from(raw)
        .ok()
        .filter(|&i| i < len)
        .ok_or(BindingError::IndexOutOfRange { index: raw, len })
}

fn out_of_range(index: usize, len: usize) -> BindingError {
    BindingError::IndexOutOfRange {
        index: to_i64(index),
        len,
    }
}

impl BindingObject for ObservableList {
    fn type_info(&self) -> TypeRef {
        Self::list_type()
    }

    fn notifier(&self) -> Option<&ChangeNotifier> {
        Some(&self.notifier)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for ObservableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(read(&self.items).iter()).finish()
    }
}
