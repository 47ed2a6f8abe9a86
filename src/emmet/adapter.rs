//! Expansion boundary
//!
//! Wraps the expansion engine, injecting the host tab-stop syntax and
//! converting engine failures into an empty-template outcome. This is the
//! single call site that touches the abbreviation grammar; everything else
//! treats expansion as `(abbreviation, syntax) -> template`.

use std::sync::Arc;

use tracing::debug;

use crate::emmet::engine::{ExpandOptions, ExpansionEngine};

/// Render a tab-stop field in the host snippet syntax: `${n}` without default
/// text, `${n:placeholder}` with it.
pub fn snippet_field(index: u32, placeholder: Option<&str>) -> String {
    match placeholder {
        Some(text) => format!("${{{}:{}}}", index, text),
        None => format!("${{{}}}", index),
    }
}

/// Engine wrapper used by the completion provider, the expand command and the
/// snippet catalog builder.
#[derive(Clone)]
pub struct ExpansionAdapter {
    engine: Arc<dyn ExpansionEngine>,
}

impl ExpansionAdapter {
    pub fn new(engine: Arc<dyn ExpansionEngine>) -> Self {
        Self { engine }
    }

    /// Expand `abbreviation` for a document in `syntax`.
    ///
    /// Engine failures (empty or malformed input) are recovered here and
    /// reported as an empty template, meaning "no expansion available";
    /// callers treat that the same as finding no abbreviation at all.
    pub fn expand(&self, abbreviation: &str, syntax: &str) -> String {
        let options = ExpandOptions {
            syntax,
            field: snippet_field,
        };
        match self.engine.expand(abbreviation, &options) {
            Ok(template) => template,
            Err(err) => {
                debug!("No expansion for {:?} ({}): {}", abbreviation, syntax, err);
                String::new()
            }
        }
    }
}
