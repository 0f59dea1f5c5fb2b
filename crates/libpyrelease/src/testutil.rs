//! Scripted tool invoker for exercising the release flow without real tools.

use std::sync::{Mutex, PoisonError};

use crate::{
    error::Result,
    process::{Invocation, ToolInvoker, ToolOutput},
};

/// Predicate selecting which invocations a rule applies to.
type Matcher = Box<dyn Fn(&Invocation) -> bool + Send + Sync>;

/// Produces the outcome of a matched invocation, possibly with side effects.
type Responder = Box<dyn Fn(&Invocation) -> ToolOutput + Send + Sync>;

/// Records every invocation and answers from a list of canned responses.
///
/// Invocations that match no rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedInvoker {
    /// Responses, first match wins.
    rules: Vec<(Matcher, Responder)>,
    /// Every invocation seen, in order.
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedInvoker {
    /// An invoker where every tool succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations matching `matcher` with `output`.
    pub fn respond<F>(self, matcher: F, output: ToolOutput) -> Self
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
    {
        self.respond_with(matcher, move |_| output.clone())
    }

    /// Answer invocations matching `matcher` by calling `responder`.
    pub fn respond_with<F, R>(mut self, matcher: F, responder: R) -> Self
    where
        F: Fn(&Invocation) -> bool + Send + Sync + 'static,
        R: Fn(&Invocation) -> ToolOutput + Send + Sync + 'static,
    {
        self.rules.push((Box::new(matcher), Box::new(responder)));
        self
    }

    /// Answer every invocation of `tool` with `output`.
    pub fn respond_tool(self, tool: &'static str, output: ToolOutput) -> Self {
        self.respond(move |inv| inv.tool == tool, output)
    }

    /// Snapshot of recorded invocations.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded invocations of `tool`.
    pub fn calls_for(&self, tool: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.tool == tool)
            .collect()
    }
}

impl ToolInvoker for ScriptedInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        let output = self
            .rules
            .iter()
            .find(|(matcher, _)| matcher(invocation))
            .map(|(_, responder)| responder(invocation))
            .unwrap_or_else(|| ToolOutput::ok(""));
        Ok(output)
    }
}
