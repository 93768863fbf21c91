//! A loaded module, driven through Wasmtime.
//!
//! The handle owns the Wasmtime store and the typed exports captured at load
//! time. Everything the module needs is validated up front: a missing export
//! or a wrong signature fails the load instead of the first call.

use tracing::debug;
use wasmtime::{
    Caller, Config, Engine, Extern, Instance, Linker, Memory, Module, Store, StoreLimits,
    StoreLimitsBuilder, TypedFunc, WasmParams, WasmResults,
};

use crate::abi::{ModuleAbi, Operation};
use crate::config::{BridgeConfig, ExportNames};
use crate::error::{BridgeError, LoadError, Result};
use crate::memory::read_terminated;

/// Import module name for host callbacks.
pub const HOST_MODULE: &str = "env";

/// Import name of the print callback.
pub const PRINT_IMPORT: &str = "print";

/// Functions the host provides to the module.
pub struct HostCallbacks {
    print: Box<dyn FnMut(&str) + Send>,
}

impl HostCallbacks {
    /// Callbacks that discard what the module prints.
    pub fn new() -> Self {
        Self {
            print: Box::new(|_| {}),
        }
    }

    /// Forward everything the module prints to `print`.
    pub fn on_print(mut self, print: impl FnMut(&str) + Send + 'static) -> Self {
        self.print = Box::new(print);
        self
    }
}

impl Default for HostCallbacks {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCallbacks").finish_non_exhaustive()
    }
}

/// State held by the Wasmtime store for a module.
pub struct HostState {
    callbacks: HostCallbacks,
    limits: StoreLimits,
    memory_export: String,
    /// Bridge error raised inside a host import, reported in place of the
    /// trap it causes.
    fault: Option<BridgeError>,
}

/// The `env.print(location)` import.
fn host_print(mut caller: Caller<'_, HostState>, location: u32) -> wasmtime::Result<()> {
    let export = caller.data().memory_export.clone();
    let Some(memory) = caller.get_export(&export).and_then(Extern::into_memory) else {
        return Err(wasmtime::Error::msg("print called by a module without memory"));
    };

    match read_terminated(memory.data(&caller), location) {
        Ok(text) => {
            debug!(location, text = %text, "module print");
            (caller.data_mut().callbacks.print)(&text);
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            caller.data_mut().fault = Some(e);
            Err(wasmtime::Error::msg(message))
        }
    }
}

/// Counters for calls the host made into the module's allocator.
///
/// `allocations` counts input buffers; `releases` counts every deallocate
/// call, for input and result buffers alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub allocations: u64,
    pub releases: u64,
}

/// The deallocator takes either just the location or the location and the
/// allocated size.
enum Deallocator {
    Unsized(TypedFunc<u32, ()>),
    Sized(TypedFunc<(u32, u32), ()>),
}

/// A module that has been instantiated and validated.
pub struct ModuleHandle {
    store: Store<HostState>,
    memory: Memory,
    allocate: TypedFunc<u32, u32>,
    deallocate: Deallocator,
    evaluate: TypedFunc<u32, u32>,
    format: TypedFunc<u32, u32>,
    exports: ExportNames,
    stats: BridgeStats,
}

fn typed_export<P: WasmParams, R: WasmResults>(
    instance: &Instance,
    store: &mut Store<HostState>,
    name: &str,
    expected: &'static str,
) -> std::result::Result<TypedFunc<P, R>, LoadError> {
    let func = instance
        .get_func(&mut *store, name)
        .ok_or_else(|| LoadError::MissingExport(name.to_string()))?;
    func.typed::<P, R>(&*store)
        .map_err(|_| LoadError::ExportSignature {
            name: name.to_string(),
            expected,
        })
}

impl ModuleHandle {
    /// Compile `bytes`, link the host callbacks and capture the exports.
    pub fn instantiate(
        config: &BridgeConfig,
        bytes: &[u8],
        callbacks: HostCallbacks,
    ) -> std::result::Result<Self, LoadError> {
        let names = &config.exports;

        let engine =
            Engine::new(&Config::new()).map_err(|e| LoadError::Compile(e.to_string()))?;
        let module = Module::new(&engine, bytes).map_err(|e| LoadError::Compile(e.to_string()))?;

        let mut linker = Linker::<HostState>::new(&engine);
        linker
            .func_wrap(HOST_MODULE, PRINT_IMPORT, host_print)
            .map_err(|e| LoadError::Link(e.to_string()))?;

        let state = HostState {
            callbacks,
            limits: StoreLimitsBuilder::new()
                .memory_size(config.max_memory_bytes)
                .build(),
            memory_export: names.memory.clone(),
            fault: None,
        };
        let mut store = Store::new(&engine, state);
        store.limiter(|state| &mut state.limits);

        let instance = linker
            .instantiate(&mut store, &module)
            .map_err(|e| LoadError::Instantiate(e.to_string()))?;

        let memory = instance
            .get_memory(&mut store, &names.memory)
            .ok_or_else(|| LoadError::MissingMemory(names.memory.clone()))?;
        let allocate = typed_export(&instance, &mut store, &names.allocate, "(i32) -> i32")?;
        let deallocate = match typed_export(&instance, &mut store, &names.deallocate, "(i32)") {
            Ok(func) => Deallocator::Unsized(func),
            Err(LoadError::ExportSignature { .. }) => Deallocator::Sized(typed_export(
                &instance,
                &mut store,
                &names.deallocate,
                "(i32) or (i32, i32)",
            )?),
            Err(e) => return Err(e),
        };
        let evaluate = typed_export(&instance, &mut store, &names.evaluate, "(i32) -> i32")?;
        let format = typed_export(&instance, &mut store, &names.format, "(i32) -> i32")?;

        Ok(Self {
            store,
            memory,
            allocate,
            deallocate,
            evaluate,
            format,
            exports: names.clone(),
            stats: BridgeStats::default(),
        })
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Drop any fault left behind by an earlier call. Run before every
    /// export call so a fault is only reported by the call that raised it.
    fn clear_fault(&mut self) {
        self.store.data_mut().fault = None;
    }

    fn take_fault(&mut self) -> Option<BridgeError> {
        self.store.data_mut().fault.take()
    }

    /// Turn a Wasmtime call failure into a bridge error, preferring a fault
    /// recorded by a host import during the call.
    fn trap(&mut self, export: &str, error: wasmtime::Error) -> BridgeError {
        self.take_fault().unwrap_or_else(|| BridgeError::Trap {
            export: export.to_string(),
            message: error.to_string(),
        })
    }
}

impl ModuleAbi for ModuleHandle {
    fn memory(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    fn allocate(&mut self, size: u32) -> Result<u32> {
        self.clear_fault();
        match self.allocate.call(&mut self.store, size) {
            Ok(location) => {
                self.stats.allocations += 1;
                Ok(location)
            }
            Err(e) => Err(self.take_fault().unwrap_or_else(|| BridgeError::Allocation {
                size: size as usize,
                reason: e.to_string(),
            })),
        }
    }

    fn deallocate(&mut self, location: u32, size: u32) -> Result<()> {
        self.clear_fault();
        let outcome = match &self.deallocate {
            Deallocator::Unsized(func) => func.call(&mut self.store, location),
            Deallocator::Sized(func) => func.call(&mut self.store, (location, size)),
        };
        match outcome {
            Ok(()) => {
                self.stats.releases += 1;
                Ok(())
            }
            Err(e) => {
                let export = self.exports.deallocate.clone();
                Err(self.trap(&export, e))
            }
        }
    }

    fn call(&mut self, operation: Operation, location: u32) -> Result<u32> {
        self.clear_fault();
        let func = match operation {
            Operation::Evaluate => &self.evaluate,
            Operation::Format => &self.format,
        };
        match func.call(&mut self.store, location) {
            Ok(result) => Ok(result),
            Err(e) => {
                let export = operation.export_name(&self.exports).to_string();
                Err(self.trap(&export, e))
            }
        }
    }
}
