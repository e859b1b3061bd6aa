//! jtrace agent - loaded into the JVM with `-agentpath` to record boundary calls.
//!
//! The agent owns one trace file for the life of the VM. Interceptors observe
//! calls and hand them to [`trace_append`]; the record is formatted on the
//! calling thread and written to the file under a single lock.
//!
//! With the default `standalone` feature this crate exports `Agent_OnLoad`
//! and `Agent_OnUnload` itself. Embedders that bring interceptors disable it
//! and call [`export_agent!`] from their own cdylib.

pub mod env;
pub mod error;
pub mod fatal;
pub mod interceptor;
pub mod options;
pub mod sink;
pub mod sys;
pub mod tracer;

pub use env::{ClassNameLookup, EventCallbacks, JniFunctions, JniIntrospection, Jvmti};
pub use error::AgentError;
pub use interceptor::Interceptor;
pub use options::AgentOptions;
pub use sink::TraceSink;
pub use tracer::{TraceCall, Tracer};

use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use jtrace_protocol::{decode_tagged, Argument};
use log::{error, info, warn};

use crate::fatal::{check, guarantee};
use crate::options::init_logging;
use crate::sys::{
    jclass, jint, jthread, jvmtiEnv, jvmtiEventVMInit, jvmtiEventVMStart, JNIEnv, JavaVM,
    JNI_ERR, JNI_OK, JVMTI_EVENT_VM_INIT, JVMTI_EVENT_VM_START,
};

/// Global agent state.
static AGENT: OnceLock<Agent> = OnceLock::new();

/// The loaded agent: trace output, cached lookups and interceptors.
pub struct Agent {
    jvmti: Jvmti,
    tracer: Tracer,
    /// Set once on VMStart.
    class_names: OnceLock<ClassNameLookup>,
    interceptors: Vec<Box<dyn Interceptor>>,
}

impl Agent {
    /// The agent, once `Agent_OnLoad` has succeeded.
    pub fn get() -> Option<&'static Agent> {
        AGENT.get()
    }

    pub fn jvmti(&self) -> &Jvmti {
        &self.jvmti
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// `None` until the VM has started.
    pub fn class_names(&self) -> Option<&ClassNameLookup> {
        self.class_names.get()
    }

    /// Append one call, resolving its class on the calling thread.
    ///
    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread whenever `call` names a class.
    pub unsafe fn append(
        &self,
        env: *mut JNIEnv,
        call: TraceCall<'_, jclass>,
    ) -> error::Result<()> {
        match self.class_names.get() {
            Some(lookup) => {
                let introspection = lookup.introspect(env);
                self.tracer.append(Some(&introspection), call)
            }
            None => self.tracer.append::<JniIntrospection>(None, call),
        }
    }

    unsafe fn start(&self, env: *mut JNIEnv) -> Result<()> {
        let lookup = ClassNameLookup::resolve(&self.jvmti, env)
            .context("failed to resolve java.lang.Class#getName")?;
        if self.class_names.set(lookup).is_err() {
            info!("Class name lookup already resolved");
        }
        for interceptor in &self.interceptors {
            interceptor.on_vm_start(&self.jvmti, env).with_context(|| {
                format!("interceptor '{}' failed on VM start", interceptor.name())
            })?;
        }
        info!("VM started, {} interceptor(s) installed", self.interceptors.len());
        Ok(())
    }

    fn init(&self, env: *mut JNIEnv, thread: jthread) -> Result<()> {
        for interceptor in &self.interceptors {
            interceptor.on_vm_init(&self.jvmti, env, thread).with_context(|| {
                format!("interceptor '{}' failed on VM init", interceptor.name())
            })?;
        }
        info!("VM initialized");
        Ok(())
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Body of `Agent_OnLoad`.
///
/// Configuration and resource failures are returned as errors and abort the
/// VM at the entry point. An interceptor that refuses to load is reported and
/// turned into `JNI_ERR`, which makes the VM exit on its own terms.
///
/// # Safety
/// `vm` must be the `JavaVM` passed to `Agent_OnLoad`; `options` must be null
/// or a NUL-terminated string.
pub unsafe fn load(
    vm: *mut JavaVM,
    options: *const c_char,
    interceptors: Vec<Box<dyn Interceptor>>,
) -> Result<jint> {
    init_logging();

    if AGENT.get().is_some() {
        return Err(AgentError::AlreadyLoaded.into());
    }

    let options = AgentOptions::from_raw(options)?;
    let jvmti = Jvmti::from_java_vm(vm).context("failed to obtain a JVMTI environment")?;
    let tracer = Tracer::new(TraceSink::open(&options.output)?);

    let mut callbacks = EventCallbacks::default();
    restore_lifecycle_callbacks(&mut callbacks);

    for interceptor in &interceptors {
        if let Err(e) = interceptor.on_load(&jvmti, &options, &mut callbacks) {
            error!("Interceptor '{}' failed to load: {:#}", interceptor.name(), e);
            tracer.close()?;
            return Ok(JNI_ERR);
        }
    }
    if restore_lifecycle_callbacks(&mut callbacks) {
        warn!("An interceptor replaced the VMStart or VMInit callback; the agent's own is kept");
    }

    let agent = Agent {
        jvmti,
        tracer,
        class_names: OnceLock::new(),
        interceptors,
    };
    if AGENT.set(agent).is_err() {
        return Err(AgentError::AlreadyLoaded.into());
    }
    let agent = Agent::get().ok_or(AgentError::NotLoaded)?;

    agent.jvmti.set_event_callbacks(&callbacks)?;
    agent.jvmti.enable_event(JVMTI_EVENT_VM_START)?;
    agent.jvmti.enable_event(JVMTI_EVENT_VM_INIT)?;
    for event in callbacks.events() {
        if event != JVMTI_EVENT_VM_START && event != JVMTI_EVENT_VM_INIT {
            agent.jvmti.enable_event(event)?;
        }
    }

    info!(
        "Agent loaded, tracing to {} ({} interceptor(s))",
        options.output.display(),
        agent.interceptors.len()
    );
    Ok(JNI_OK)
}

/// Body of `Agent_OnUnload`: close the trace output.
pub fn unload() -> Result<()> {
    if let Some(agent) = Agent::get() {
        agent.tracer.close()?;
        info!("Agent unloaded");
    }
    Ok(())
}

/// Install the agent's VMStart and VMInit callbacks, returning whether
/// either slot held something else.
fn restore_lifecycle_callbacks(callbacks: &mut EventCallbacks) -> bool {
    let start = on_vm_start as jvmtiEventVMStart as *const c_void;
    let init = on_vm_init as jvmtiEventVMInit as *const c_void;
    let replaced = callbacks.get(JVMTI_EVENT_VM_START) != Some(start)
        || callbacks.get(JVMTI_EVENT_VM_INIT) != Some(init);
    callbacks.set_vm_start(on_vm_start);
    callbacks.set_vm_init(on_vm_init);
    replaced
}

unsafe extern "system" fn on_vm_start(_jvmti: *mut jvmtiEnv, env: *mut JNIEnv) {
    check(!env.is_null(), "VMStart delivered a null JNIEnv");
    let agent = guarantee(Agent::get().ok_or(AgentError::NotLoaded));
    guarantee(agent.start(env));
}

unsafe extern "system" fn on_vm_init(_jvmti: *mut jvmtiEnv, env: *mut JNIEnv, thread: jthread) {
    check(!env.is_null(), "VMInit delivered a null JNIEnv");
    let agent = guarantee(Agent::get().ok_or(AgentError::NotLoaded));
    guarantee(agent.init(env, thread));
}

/// Export `Agent_OnLoad` and `Agent_OnUnload` running the given interceptors.
///
/// ```ignore
/// use jtrace_agent::Interceptor;
///
/// jtrace_agent::export_agent!(vec![Box::new(NativeBind::default()) as Box<dyn Interceptor>]);
/// ```
#[macro_export]
macro_rules! export_agent {
    ($interceptors:expr) => {
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "system" fn Agent_OnLoad(
            vm: *mut $crate::sys::JavaVM,
            options: *mut ::std::ffi::c_char,
            _reserved: *mut ::std::ffi::c_void,
        ) -> $crate::sys::jint {
            $crate::fatal::guarantee($crate::load(vm, options, $interceptors))
        }

        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "system" fn Agent_OnUnload(_vm: *mut $crate::sys::JavaVM) {
            $crate::fatal::guarantee($crate::unload())
        }
    };
}

#[cfg(feature = "standalone")]
export_agent!(Vec::new());

// =============================================================================
// RECORDING
// =============================================================================

/// Append one call to the trace.
///
/// # Safety
/// `env` must be the `JNIEnv` of the current thread whenever `call` names a class.
pub unsafe fn try_trace_append(env: *mut JNIEnv, call: TraceCall<'_, jclass>) -> Result<()> {
    let agent = Agent::get().ok_or(AgentError::NotLoaded)?;
    agent.append(env, call)?;
    Ok(())
}

/// Append one call to the trace, aborting the process on failure.
///
/// # Safety
/// See [`try_trace_append`].
#[track_caller]
pub unsafe fn trace_append(env: *mut JNIEnv, call: TraceCall<'_, jclass>) {
    guarantee(try_trace_append(env, call))
}

/// C entry point for native interceptors.
///
/// `function`, `result` and `clazz` may be null. `argv` is null or a
/// NULL-terminated array of strings in which [`jtrace_protocol::UNQUOTED_TAG`]
/// marks the following string as raw JSON.
///
/// # Safety
/// Every non-null pointer must be valid for the duration of the call, and
/// `env` must be the current thread's `JNIEnv` when `clazz` is non-null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn jtrace_append(
    env: *mut JNIEnv,
    tracer: *const c_char,
    clazz: jclass,
    function: *const c_char,
    result: *const c_char,
    argv: *const *const c_char,
) {
    let mut raw = guarantee(call_from_c(tracer, clazz, function, result, argv));
    guarantee(try_trace_append(env, raw.call()));
}

/// Strings are decoded lossily: the VM hands out Modified UTF-8, which
/// encodes supplementary characters as surrogate pairs.
unsafe fn c_str<'a>(ptr: *const c_char) -> Option<Cow<'a, str>> {
    (!ptr.is_null()).then(|| CStr::from_ptr(ptr).to_string_lossy())
}

/// Collect a NULL-terminated `argv`; a null array is an empty list.
unsafe fn c_tokens<'a>(argv: *const *const c_char) -> Vec<Cow<'a, str>> {
    let mut tokens = Vec::new();
    if argv.is_null() {
        return tokens;
    }
    let mut cursor = argv;
    while let Some(token) = c_str(*cursor) {
        tokens.push(token);
        cursor = cursor.add(1);
    }
    tokens
}

/// A call decoded from C strings, owning whatever had to be repaired.
struct CCall<'a> {
    tracer: Cow<'a, str>,
    function: Option<Cow<'a, str>>,
    result: Option<Cow<'a, str>>,
    class: jclass,
    args: Vec<Argument>,
}

impl CCall<'_> {
    /// Borrow as a [`TraceCall`]; the arguments are moved out.
    fn call(&mut self) -> TraceCall<'_, jclass> {
        let args = std::mem::take(&mut self.args);
        let mut call = TraceCall::new(self.tracer.as_ref()).arguments(args);
        if let Some(function) = self.function.as_deref() {
            call = call.function(function);
        }
        if let Some(result) = self.result.as_deref() {
            call = call.result(result);
        }
        if !self.class.is_null() {
            call = call.class(self.class);
        }
        call
    }
}

unsafe fn call_from_c<'a>(
    tracer: *const c_char,
    clazz: jclass,
    function: *const c_char,
    result: *const c_char,
    argv: *const *const c_char,
) -> error::Result<CCall<'a>> {
    Ok(CCall {
        tracer: c_str(tracer).ok_or(AgentError::NullTracer)?,
        function: c_str(function),
        result: c_str(result),
        class: clazz,
        args: decode_tagged(c_tokens(argv)),
    })
}
