//! The commands a playground front end issues.

use playground_runtime::{
    BridgeConfig, BridgeStats, HostCallbacks, ModuleLifecycle, ModuleSource, Operation,
    Readiness, Result,
};
use tracing::debug;

use crate::output::{OutputRecord, SharedOutput};

/// Run, format, print and clear over one evaluator module.
///
/// Every command is a no-op until the module is ready. Commands take
/// `&mut self`, so one playground never has two operations in flight.
pub struct Playground {
    lifecycle: ModuleLifecycle,
    output: SharedOutput,
}

impl Playground {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            lifecycle: ModuleLifecycle::new(config),
            output: SharedOutput::new(),
        }
    }

    /// Load the module, routing its `print` calls into the output.
    pub async fn load(&mut self, source: &dyn ModuleSource) -> Result<()> {
        let output = self.output.clone();
        let callbacks = HostCallbacks::new().on_print(move |text| output.append(text));
        self.lifecycle.load(source, callbacks).await
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    /// An observer usable while `load` is in flight.
    pub fn readiness(&self) -> Readiness {
        self.lifecycle.readiness()
    }

    /// Why loading failed, if it did.
    pub fn failure(&self) -> Option<&str> {
        self.lifecycle.failure()
    }

    pub fn stats(&self) -> Option<BridgeStats> {
        self.lifecycle.stats()
    }

    /// Evaluate `source` and append the result to the output.
    ///
    /// Anything the program prints lands in the output first, in order.
    /// Empty source appends an empty line without calling the module.
    pub fn run(&mut self, source: &str) -> Result<()> {
        if !self.lifecycle.is_ready() {
            return Ok(());
        }

        let result = if source.is_empty() {
            String::new()
        } else {
            self.lifecycle.invoke(Operation::Evaluate, source)?
        };
        self.print(&result);
        Ok(())
    }

    /// Format `source`. Empty text means "no change".
    pub fn format(&mut self, source: &str) -> Result<String> {
        if source.is_empty() {
            return Ok(String::new());
        }
        self.lifecycle.invoke(Operation::Format, source)
    }

    /// Format `source` in place. Returns whether it was replaced.
    pub fn apply_format(&mut self, source: &mut String) -> Result<bool> {
        let formatted = self.format(source.as_str())?;
        if formatted.is_empty() {
            debug!("format produced nothing, keeping source");
            return Ok(false);
        }
        *source = formatted;
        Ok(true)
    }

    /// Append a line to the output.
    pub fn print(&self, text: &str) {
        self.output.append(text);
    }

    /// Empty the output. Never touches the module.
    pub fn clear(&self) {
        self.output.clear();
    }

    /// The output as it is now.
    pub fn output(&self) -> OutputRecord {
        self.output.snapshot()
    }
}

impl Default for Playground {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_before_load_are_noops() {
        let mut playground = Playground::default();
        assert!(!playground.is_ready());

        playground.run("puts(1)").unwrap();
        assert!(playground.output().is_empty());
        assert!(playground.output().updated_at().is_none());

        assert_eq!(playground.format("let x=1;").unwrap(), "");

        let mut source = "let x=1;".to_string();
        assert!(!playground.apply_format(&mut source).unwrap());
        assert_eq!(source, "let x=1;");
    }

    #[test]
    fn print_and_clear_work_without_a_module() {
        let playground = Playground::default();
        playground.print("hello");
        assert_eq!(playground.output().text(), "hello\n");
        assert!(playground.output().updated_at().is_some());

        playground.clear();
        assert!(playground.output().is_empty());
        assert!(playground.output().updated_at().is_none());
    }
}
