//! Built-in primitive types.
//!
//! Primitive values have a runtime type like any object so that paths may end
//! on them (`Name`) or walk through them (`Name.Length`).

use std::sync::{Arc, LazyLock};

use crate::error::BindingError;
use crate::member::MemberBuilder;
use crate::types::{TypeBuilder, TypeRef};
use crate::value::{Value, ValueType};

static BOOLEAN: LazyLock<TypeRef> = LazyLock::new(|| TypeBuilder::primitive("Boolean").build());
static INT64: LazyLock<TypeRef> = LazyLock::new(|| TypeBuilder::primitive("Int64").build());
static DOUBLE: LazyLock<TypeRef> = LazyLock::new(|| TypeBuilder::primitive("Double").build());

static STRING: LazyLock<TypeRef> = LazyLock::new(|| {
    TypeBuilder::primitive("String")
        .member(
            MemberBuilder::property("Length")
                .value_type(ValueType::Int)
                .getter(|target, _| {
                    let text = target.as_str().ok_or_else(|| BindingError::TargetMismatch {
                        member: Arc::from("Length"),
                        expected: Arc::from("String"),
                        actual: target.type_name(),
                    })?;
                    let len = i64::try_from(text.chars().count()).unwrap_or(i64::MAX);
                    Ok(Value::Int(len))
                }),
        )
        .build()
});

#[must_use]
pub fn boolean() -> TypeRef {
    Arc::clone(&*BOOLEAN)
}

#[must_use]
pub fn int64() -> TypeRef {
    Arc::clone(&*INT64)
}

#[must_use]
pub fn double() -> TypeRef {
    Arc::clone(&*DOUBLE)
}

#[must_use]
pub fn string() -> TypeRef {
    Arc::clone(&*STRING)
}
