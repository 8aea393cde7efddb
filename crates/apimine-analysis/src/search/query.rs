//! Linear query construction.

use apimine_core::errors::SearchError;

use crate::history::History;
use crate::label::{MethodRef, CONSTRUCTOR_NAME};

const STATIC_PREFIX: &str = "static:";
const UNKNOWN_TOKEN: &str = "?";

#[derive(Debug, Clone)]
enum Step {
    Call(MethodRef, u64),
    Unknown(u64),
}

impl Step {
    fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

/// Builds a linear query history one step at a time.
///
/// ```text
/// java.io.File.<init>(Ljava/lang/String;)V  ?  java.io.File.delete()Z
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    title: Option<String>,
    steps: Vec<Step>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a call with weight 1.
    pub fn call(self, method: MethodRef) -> Self {
        self.call_weighted(method, 1)
    }

    pub fn call_weighted(mut self, method: MethodRef, weight: u64) -> Self {
        self.steps.push(Step::Call(method, weight));
        self
    }

    /// Append an unknown stretch of calls.
    pub fn unknown(mut self) -> Self {
        self.steps.push(Step::Unknown(1));
        self
    }

    /// Parse whitespace-separated steps. A step is `?`, or a method written
    /// `Owner.name(descriptor)`, optionally prefixed with `static:`. The
    /// name `<init>` denotes a constructor.
    pub fn parse(text: &str) -> Result<Self, SearchError> {
        let mut builder = Self::new();
        for token in text.split_whitespace() {
            builder = if token == UNKNOWN_TOKEN {
                builder.unknown()
            } else {
                builder.call(parse_method(token)?)
            };
        }
        Ok(builder)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Build the query history. Empty queries and two unknown steps in a
    /// row are rejected.
    pub fn build(self) -> Result<History, SearchError> {
        if self.steps.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        if let Some(position) = self
            .steps
            .windows(2)
            .position(|pair| pair[0].is_unknown() && pair[1].is_unknown())
        {
            return Err(SearchError::ChainedUnknown {
                position,
                next: position + 1,
            });
        }

        let mut history = match self.title {
            Some(title) => History::titled(title),
            None => History::new(),
        };
        for step in self.steps {
            match step {
                Step::Call(method, weight) => history.extend_with_method_call(method, weight),
                Step::Unknown(weight) => history.extend_with_unknown(weight),
            }
            .map_err(SearchError::from_history)?;
        }
        Ok(history)
    }
}

fn parse_method(token: &str) -> Result<MethodRef, SearchError> {
    let invalid = || SearchError::InvalidStep {
        token: token.to_string(),
    };
    let (is_static, body) = match token.strip_prefix(STATIC_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, token),
    };
    let paren = body.find('(').ok_or_else(invalid)?;
    let (head, descriptor) = body.split_at(paren);
    if !descriptor.contains(')') {
        return Err(invalid());
    }
    let (owner, name) = head.rsplit_once('.').ok_or_else(invalid)?;
    if owner.is_empty() || name.is_empty() {
        return Err(invalid());
    }
    match (name == CONSTRUCTOR_NAME, is_static) {
        (true, true) => Err(invalid()),
        (true, false) => Ok(MethodRef::constructor(owner, descriptor)),
        (false, true) => Ok(MethodRef::static_method(owner, name, descriptor)),
        (false, false) => Ok(MethodRef::new(owner, name, descriptor)),
    }
}
