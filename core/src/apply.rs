//! Server-side transform descriptors.
//!
//! # Design
//! An `Apply` names one transform (`invert`, `drawRect`, ...) and carries its
//! parameters in insertion order. The query string it produces always starts
//! with `apply=<name>`; list parameters repeat their key once per element.
//! Structured list elements (a rectangle, say) are flattened beforehand with
//! [`Apply::sub_params`] into `key/val,key/val` tokens.
//!
//! Values are percent-encoded, keys are not, and neither format escapes its
//! own delimiters inside values. That matches what the store server decodes.

use indexmap::IndexMap;

use crate::encode::quote;
use crate::types::{ParamValue, Scalar};

/// Query key carrying the transform name.
const APPLY_KEY: &str = "apply";

/// One named transform invocation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Apply {
    name: String,
    params: IndexMap<String, ParamValue>,
}

impl Apply {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    pub fn from_params(name: impl Into<String>, params: IndexMap<String, ParamValue>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Add a parameter. Setting an existing key replaces its value in place.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &IndexMap<String, ParamValue> {
        &self.params
    }

    /// Serialize as `apply=<name>&key=val&...`.
    ///
    /// A parameter literally named `apply` is dropped in favour of the
    /// descriptor's name.
    pub fn query(&self) -> String {
        let name = Scalar::Str(self.name.clone());
        let terms = std::iter::once((APPLY_KEY, &name)).chain(
            self.params
                .iter()
                .filter(|(key, _)| key.as_str() != APPLY_KEY)
                .flat_map(|(key, value)| value.values().iter().map(move |v| (key.as_str(), v))),
        );
        join_terms(terms, '=', '&')
    }

    /// Attach the query to `url`.
    pub fn append(&self, url: &str) -> String {
        format!("{url}?{}", self.query())
    }

    /// Flatten a record into one `key/val,key/val` token, for use as a
    /// list element of another parameter.
    pub fn sub_params<I, K, V>(pairs: I) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Scalar>,
    {
        let pairs: Vec<(K, Scalar)> = pairs.into_iter().map(|(k, v)| (k, v.into())).collect();
        join_terms(pairs.iter().map(|(k, v)| (AsRef::<str>::as_ref(k), v)), '/', ',')
    }
}

fn join_terms<'a>(terms: impl Iterator<Item = (&'a str, &'a Scalar)>, kv_sep: char, sep: char) -> String {
    let mut out = String::new();
    for (i, (key, value)) in terms.enumerate() {
        if i > 0 {
            out.push(sep);
        }
        out.push_str(key);
        out.push(kv_sep);
        out.push_str(&quote(&value.to_string()));
    }
    out
}
