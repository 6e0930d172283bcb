// src/exec/work.rs

//! The work contract.
//!
//! The scheduler never knows what a request does. It only sees a [`Work`]
//! implementation, calls [`Work::execute`] with the opaque driver, and reads
//! the returned [`WorkResult`].

use std::collections::BTreeMap;
use std::fmt;

use crate::exec::results::ResultHistory;

/// Outcome of executing one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkResult {
    pub success: bool,
    pub error_message: Option<String>,
    /// Named outputs (e.g. `stdout`, `returncode`) that later work can refer
    /// to through `{{node.field}}` placeholders.
    pub outputs: BTreeMap<String, String>,
}

impl WorkResult {
    pub fn success() -> Self {
        Self {
            success: true,
            error_message: None,
            outputs: BTreeMap::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            outputs: BTreeMap::new(),
        }
    }

    /// Synthetic result reported for nodes that never ran because something
    /// they depend on failed.
    pub fn skipped() -> Self {
        Self::failure("Skipped due to dependency failure")
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }

    /// Look up a field by name for placeholder substitution.
    ///
    /// `success` and `error_message` are built in; anything else is read from
    /// [`outputs`](Self::outputs).
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "success" => Some(self.success.to_string()),
            "error_message" => Some(self.error_message.clone().unwrap_or_default()),
            other => self.outputs.get(other).cloned(),
        }
    }
}

/// A schedulable unit of work, generic over the driver type `D` that the
/// surrounding application threads through every call.
pub trait Work<D>: Send {
    /// Run the request. An `Err` is turned into a synthetic failed
    /// [`WorkResult`] carrying the error text.
    fn execute(&self, driver: &D) -> anyhow::Result<WorkResult>;

    /// Whether a failure of this work should leave its dependents runnable.
    ///
    /// Consulted exactly once, after a failing execution.
    fn allow_failure(&self) -> bool {
        false
    }

    /// Short label used in diagnostics. Defaults to the type name without its
    /// module path.
    fn label(&self) -> String {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base).to_string()
    }

    /// Rewrite any text that refers to earlier results. Called by the
    /// coordinator right before the work is dispatched.
    fn resolve_placeholders(&mut self, _history: &ResultHistory) {}
}

impl<D> fmt::Debug for dyn Work<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Work({})", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl Work<()> for Echo {
        fn execute(&self, _driver: &()) -> anyhow::Result<WorkResult> {
            Ok(WorkResult::success().with_output("stdout", "hi"))
        }
    }

    #[test]
    fn default_label_is_short_type_name() {
        assert_eq!(<Echo as Work<()>>::label(&Echo), "Echo");
    }

    #[test]
    fn fields_cover_builtins_and_outputs() {
        let res = WorkResult::failure("boom").with_output("returncode", "2");
        assert_eq!(res.field("success").as_deref(), Some("false"));
        assert_eq!(res.field("error_message").as_deref(), Some("boom"));
        assert_eq!(res.field("returncode").as_deref(), Some("2"));
        assert_eq!(res.field("stdout"), None);
    }
}
