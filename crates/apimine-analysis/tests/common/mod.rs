//! Shared builders for apimine-analysis integration tests.

#![allow(dead_code)]

use apimine_analysis::{History, Label, LabelSet, MethodRef};

pub fn call(name: &str) -> MethodRef {
    MethodRef::new("java.io.File", name, "()V")
}

pub fn call_on(owner: &str, name: &str) -> MethodRef {
    MethodRef::new(owner, name, "()V")
}

pub fn labels(name: &str) -> LabelSet {
    LabelSet::single(Label::method(call(name)))
}

/// Linear history from `(name, weight)` steps; `"?"` is an unknown step.
pub fn linear(steps: &[(&str, u64)]) -> History {
    let mut h = History::new();
    for &(name, weight) in steps {
        if name == "?" {
            h.extend_with_unknown(weight).unwrap();
        } else {
            h.extend_with_method_call(call(name), weight).unwrap();
        }
    }
    h
}

/// One call per listed owner, in order.
pub fn touching(owners: &[&str]) -> History {
    let mut h = History::new();
    for owner in owners {
        h.extend_with_method_call(call_on(owner, "use"), 1).unwrap();
    }
    h
}
