// src/exec/results.rs

//! Accumulated results of a run and `{{node.field}}` placeholder substitution.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::trace;

use crate::exec::work::WorkResult;

/// Matches `{{node.result.field}}` as well as the short `{{node.field}}`.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([\w\-]+)\.(?:result\.)?(\w+)\s*\}\}")
        .expect("placeholder pattern is valid")
});

/// Every result recorded so far in a run, keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct ResultHistory {
    results: HashMap<String, WorkResult>,
}

impl ResultHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node_id: &str, result: WorkResult) {
        self.results.insert(node_id.to_string(), result);
    }

    pub fn get(&self, node_id: &str) -> Option<&WorkResult> {
        self.results.get(node_id)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Replace placeholders that refer to recorded results.
    ///
    /// Placeholders naming an unknown node or field are left untouched so the
    /// caller can tell nothing was substituted.
    pub fn substitute(&self, text: &str) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures<'_>| {
                let node = &caps[1];
                let field = &caps[2];
                match self.results.get(node).and_then(|r| r.field(field)) {
                    Some(value) => {
                        trace!(node, field, "substituted result placeholder");
                        value
                    }
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history() -> ResultHistory {
        let mut h = ResultHistory::new();
        h.record(
            "build",
            WorkResult::success()
                .with_output("stdout", "ok")
                .with_output("returncode", "0"),
        );
        h.record("step_1", WorkResult::failure("no such file"));
        h
    }

    #[test]
    fn substitutes_long_and_short_forms() {
        let h = history();
        assert_eq!(
            h.substitute("run {{build.result.stdout}} rc={{build.returncode}}"),
            "run ok rc=0"
        );
        assert_eq!(
            h.substitute("{{ step_1.success }}: {{step_1.error_message}}"),
            "false: no such file"
        );
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        let h = history();
        assert_eq!(h.substitute("{{missing.stdout}}"), "{{missing.stdout}}");
        assert_eq!(h.substitute("{{build.stderr}}"), "{{build.stderr}}");
        assert_eq!(h.substitute("no placeholders"), "no placeholders");
    }
}
