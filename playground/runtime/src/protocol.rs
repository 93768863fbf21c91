//! Sequencing of a single module operation.
//!
//! One invocation is: write the input, call the export, adopt the result,
//! copy it out, release what the host owns. Calls made while the module is
//! not ready return empty text and never touch memory.

use tracing::{debug, trace, warn};

use crate::abi::{ModuleAbi, Operation};
use crate::config::DisposalPolicy;
use crate::error::Result;
use crate::memory::{HostBuffer, MemoryBridge};
use crate::readiness::Readiness;

/// Drives operations against a module under a fixed disposal policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationProtocol {
    disposal: DisposalPolicy,
}

impl InvocationProtocol {
    pub fn new(disposal: DisposalPolicy) -> Self {
        Self { disposal }
    }

    pub fn disposal(&self) -> DisposalPolicy {
        self.disposal
    }

    /// Run `operation` over `input` if the module is ready.
    ///
    /// Not being ready is not an error: the result is empty text. Errors in
    /// the module's own processing come back as ordinary text; only bridge
    /// failures (allocation, bounds, decoding, traps) are `Err`.
    pub fn invoke<M: ModuleAbi + ?Sized>(
        &self,
        readiness: &Readiness,
        module: &mut M,
        operation: Operation,
        input: &str,
    ) -> Result<String> {
        if !readiness.is_ready() {
            trace!(%operation, state = ?readiness.state(), "module not ready, skipping");
            return Ok(String::new());
        }

        let mut bridge = MemoryBridge::new(module);

        let input_buffer = bridge.write(input)?;
        let input_location = input_buffer.location();
        debug!(%operation, location = input_location, len = input_buffer.len(), "invoking");

        let result_location = match bridge.call(operation, &input_buffer) {
            Ok(location) => location,
            Err(e) => {
                if self.disposal == DisposalPolicy::HostReleases {
                    bridge.release_input_quietly(input_buffer);
                } else {
                    input_buffer.surrender();
                }
                return Err(e);
            }
        };

        let (result, disposed) = if result_location == input_location {
            // The module handed the input back as its result.
            (Ok(input_buffer.into_result()), Ok(()))
        } else {
            // Adopt first: the result is released even if disposing the input fails.
            let adopted = bridge.adopt(result_location);
            (adopted, self.dispose_input(&mut bridge, input_buffer))
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                if let Err(release) = disposed {
                    warn!(error = %release, "failed to release input buffer");
                }
                return Err(e);
            }
        };

        // Release whether or not the text decodes; the buffer is valid either way.
        let text = bridge.read_buffer(&result);
        let released = bridge.release_result(result);
        let text = text?;
        released?;
        disposed?;
        Ok(text)
    }

    fn dispose_input<M: ModuleAbi + ?Sized>(
        &self,
        bridge: &mut MemoryBridge<'_, M>,
        input: HostBuffer,
    ) -> Result<()> {
        match self.disposal {
            DisposalPolicy::HostReleases => bridge.release_input(input),
            DisposalPolicy::ModuleReleases => {
                input.surrender();
                Ok(())
            }
        }
    }
}
