//! Scripted command runner for unit tests.

use super::error::Result;
use super::process::{CommandRunner, Invocation, ProcessOutput};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Invocation) -> Result<ProcessOutput> + Send + Sync>;

/// Records every invocation and answers from registered handlers.
///
/// Handlers are matched on program name and leading arguments, first
/// registration wins. Unmatched invocations succeed with empty output.
pub struct ScriptedRunner {
    handlers: Vec<(String, Vec<String>, Handler)>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on<F>(mut self, program: &str, leading: &[&str], handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ProcessOutput> + Send + Sync + 'static,
    {
        self.handlers.push((
            program.to_string(),
            leading.iter().map(|s| s.to_string()).collect(),
            Box::new(handler),
        ));
        self
    }

    pub fn respond(self, program: &str, leading: &[&str], output: ProcessOutput) -> Self {
        self.on(program, leading, move |_| Ok(output.clone()))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str, leading: &[&str]) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|c| c.matches(program, leading))
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());

        for (program, leading, handler) in &self.handlers {
            let leading: Vec<&str> = leading.iter().map(String::as_str).collect();
            if invocation.matches(program, &leading) {
                return handler(invocation);
            }
        }
        Ok(ProcessOutput::success(""))
    }
}

/// `simctl list devices -j` payload with a single iOS device in `state`.
pub fn inventory_with(udid: &str, state: &str) -> String {
    format!(
        r#"{{
  "devices" : {{
    "com.apple.CoreSimulator.SimRuntime.iOS-17-2" : [
      {{
        "state" : "{state}",
        "isAvailable" : true,
        "name" : "iPhone 15",
        "udid" : "{udid}"
      }}
    ]
  }}
}}"#
    )
}
