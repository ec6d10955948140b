//! Handler parameter shapes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How a handler receives its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerShape {
    /// `async ({ a, b }) => ...`: fields are destructured in the parameter list.
    Destructured,

    /// `async (params) => ...`: the whole input is bound to one identifier.
    Positional,
}

impl HandlerShape {
    /// Returns a lowercase label for logs.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Destructured => "destructured",
            Self::Positional => "positional",
        }
    }
}

/// The classified parameter list of a handler.
///
/// For [`HandlerShape::Destructured`], `bindings` holds the destructured field
/// names in source order. For [`HandlerShape::Positional`], it holds the single
/// parameter name.
///
/// # Examples
///
/// ```
/// use ir_core::{HandlerShape, HandlerSignature};
///
/// let sig = HandlerSignature::positional("params", false);
/// assert_eq!(sig.param_name(), Some("params"));
///
/// let sig = HandlerSignature::destructured(["boardId", "instance"], true);
/// assert!(sig.has_instance_field);
/// assert_eq!(sig.param_name(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSignature {
    /// Parameter shape.
    pub shape: HandlerShape,

    /// Field names or the positional parameter name.
    pub bindings: SmallVec<[String; 4]>,

    /// Whether the routing field is already bound.
    pub has_instance_field: bool,
}

impl HandlerSignature {
    /// Creates a destructured signature from its field names.
    #[must_use]
    pub fn destructured<I, S>(fields: I, has_instance_field: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            shape: HandlerShape::Destructured,
            bindings: fields.into_iter().map(Into::into).collect(),
            has_instance_field,
        }
    }

    /// Creates a positional signature for a single parameter.
    #[must_use]
    pub fn positional(param: impl Into<String>, has_instance_field: bool) -> Self {
        let mut bindings = SmallVec::new();
        bindings.push(param.into());
        Self {
            shape: HandlerShape::Positional,
            bindings,
            has_instance_field,
        }
    }

    /// Returns the positional parameter name, if this is a positional handler.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match self.shape {
            HandlerShape::Positional => self.bindings.first().map(String::as_str),
            HandlerShape::Destructured => None,
        }
    }
}
