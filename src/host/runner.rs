//! Guest runner
//!
//! Validates, compiles, links and instantiates a guest module, then calls its
//! entry point and turns however it ended into a [`RunOutcome`].

use super::error::{HostError, HostResult, RunOutcome};
use super::linker::define_syscalls;
use super::loader::ModuleValidator;
use super::session::{HostConfig, Session};
use super::trace::SyscallTrace;
use wasmi::{Engine, Linker, Module, Store};

/// What a finished run leaves behind
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Syscall trace, if tracing was enabled
    pub trace: Option<SyscallTrace>,
}

/// Runs guest modules with one configuration
pub struct Runner {
    engine: Engine,
    config: HostConfig,
}

impl Runner {
    pub fn new(config: HostConfig) -> Self {
        Self {
            engine: Engine::default(),
            config,
        }
    }

    /// Run a module to completion.
    ///
    /// A `proc_exit` anywhere (including the module's start function) ends the
    /// run with that code. Any other trap is an error.
    pub fn run(&self, bytes: &[u8]) -> HostResult<RunReport> {
        ModuleValidator::validate(bytes, &self.config.entry)?;

        let module = Module::new(&self.engine, bytes).map_err(|e| HostError::InvalidModule {
            reason: e.to_string(),
        })?;

        let mut store = Store::new(&self.engine, Session::new(&self.config));
        let mut linker = Linker::<Session>::new(&self.engine);
        define_syscalls(&mut linker, &mut store)?;

        let pre = linker
            .instantiate(&mut store, &module)
            .map_err(|e| HostError::Instantiation {
                reason: e.to_string(),
            })?;

        let instance = match pre.start(&mut store) {
            Ok(instance) => instance,
            Err(e) => {
                return match store.data().exit_code() {
                    Some(code) => Ok(Self::report(&mut store, RunOutcome::exited(code))),
                    None => Err(HostError::Instantiation {
                        reason: e.to_string(),
                    }),
                };
            }
        };

        let entry = instance
            .get_typed_func::<(), ()>(&store, &self.config.entry)
            .map_err(|_| HostError::MissingExport {
                name: self.config.entry.clone(),
            })?;

        log::debug!("calling '{}'", self.config.entry);
        let result = entry.call(&mut store, ());

        let outcome = match (result, store.data().exit_code()) {
            // Descriptors are left as they are on proc_exit
            (_, Some(code)) => RunOutcome::exited(code),
            (Ok(()), None) => {
                store.data_mut().close_all();
                RunOutcome::returned()
            }
            (Err(trap), None) => {
                return Err(HostError::Trap {
                    reason: trap.to_string(),
                });
            }
        };

        log::info!("guest finished with exit code {}", outcome.exit_code);
        Ok(Self::report(&mut store, outcome))
    }

    fn report(store: &mut Store<Session>, outcome: RunOutcome) -> RunReport {
        RunReport {
            outcome,
            trace: store.data_mut().take_trace(),
        }
    }
}
