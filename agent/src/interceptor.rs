//! The boundary between the agent lifecycle and the code that decides what to trace.
//!
//! An interceptor is handed the JVMTI environment at each lifecycle step. It
//! may add its own event callbacks during [`Interceptor::on_load`] and install
//! hooks once the VM has started; records are emitted through
//! [`crate::trace_append`].

use crate::env::{EventCallbacks, Jvmti};
use crate::options::AgentOptions;
use crate::sys::{jthread, JNIEnv};

pub trait Interceptor: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Called from `Agent_OnLoad` before the callbacks are installed.
    ///
    /// Returning an error makes the agent refuse to load.
    fn on_load(
        &self,
        _jvmti: &Jvmti,
        _options: &AgentOptions,
        _callbacks: &mut EventCallbacks,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on VMStart, after the class-name lookup is ready.
    fn on_vm_start(&self, _jvmti: &Jvmti, _env: *mut JNIEnv) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on VMInit.
    fn on_vm_init(
        &self,
        _jvmti: &Jvmti,
        _env: *mut JNIEnv,
        _thread: jthread,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
