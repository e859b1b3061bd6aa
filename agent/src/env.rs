//! Wrappers over the JVMTI and JNI function tables.
//!
//! `Jvmti` covers the handful of JVMTI calls the lifecycle needs. JNI calls
//! go through [`JniFunctions`], a copy of the VM's *original* JNI table taken
//! at VM start: interceptors may rewire the live table, and the agent's own
//! lookups must not be traced.

use std::ffi::{c_void, CStr};
use std::ptr;

use crate::error::{AgentError, Result};
use crate::sys::{
    jclass, jmethodID, jobject, jstring, jvmtiEnv, jvmtiError, jvmtiEvent, jvmtiEventCallbacks,
    jvmtiEventVMInit, jvmtiEventVMStart, JNIEnv, JNINativeInterface_, JavaVM, JNI_OK,
    JVMTI_ENABLE, JVMTI_ERROR_NONE, JVMTI_EVENT_VM_INIT, JVMTI_EVENT_VM_START,
    JVMTI_MAX_EVENT_TYPE_VAL, JVMTI_MIN_EVENT_TYPE_VAL, JVMTI_VERSION_1_2,
};
use crate::tracer::ClassIntrospection;

fn check_jvmti(call: &'static str, code: jvmtiError) -> Result<()> {
    if code == JVMTI_ERROR_NONE {
        Ok(())
    } else {
        Err(AgentError::Jvmti { call, code })
    }
}

// =============================================================================
// JVMTI
// =============================================================================

/// A JVMTI environment.
pub struct Jvmti {
    env: *mut jvmtiEnv,
}

// A jvmtiEnv may be used from any thread.
unsafe impl Send for Jvmti {}
unsafe impl Sync for Jvmti {}

impl Jvmti {
    /// Obtain a JVMTI environment from the VM.
    ///
    /// # Safety
    /// `vm` must be the `JavaVM` passed to `Agent_OnLoad`.
    pub unsafe fn from_java_vm(vm: *mut JavaVM) -> Result<Self> {
        if vm.is_null() || (*vm).is_null() {
            return Err(AgentError::NullResult("JavaVM"));
        }
        let get_env = (**vm).GetEnv.ok_or(AgentError::MissingFunction("GetEnv"))?;
        let mut env: *mut c_void = ptr::null_mut();
        let code = get_env(vm, &mut env, JVMTI_VERSION_1_2);
        if code != JNI_OK {
            return Err(AgentError::Jni { call: "GetEnv", code });
        }
        if env.is_null() {
            return Err(AgentError::NullResult("GetEnv"));
        }
        Ok(Self { env: env.cast() })
    }

    /// Wrap the environment passed to an event callback.
    ///
    /// # Safety
    /// `env` must be a live JVMTI environment.
    pub unsafe fn from_raw(env: *mut jvmtiEnv) -> Self {
        Self { env }
    }

    pub fn as_raw(&self) -> *mut jvmtiEnv {
        self.env
    }

    fn functions(&self) -> &crate::sys::jvmtiInterface_1_ {
        // SAFETY: constructors guarantee a live environment.
        unsafe { &**self.env }
    }

    /// Install the event callbacks; replaces any previously installed set.
    pub fn set_event_callbacks(&self, callbacks: &EventCallbacks) -> Result<()> {
        let set = self
            .functions()
            .SetEventCallbacks
            .ok_or(AgentError::MissingFunction("SetEventCallbacks"))?;
        let size = std::mem::size_of::<jvmtiEventCallbacks>() as i32;
        let code = unsafe { set(self.env, callbacks.as_raw(), size) };
        check_jvmti("SetEventCallbacks", code)
    }

    /// Enable delivery of `event` on all threads.
    pub fn enable_event(&self, event: jvmtiEvent) -> Result<()> {
        let set_mode = self
            .functions()
            .SetEventNotificationMode
            .ok_or(AgentError::MissingFunction("SetEventNotificationMode"))?;
        let code = unsafe { set_mode(self.env, JVMTI_ENABLE, event, ptr::null_mut()) };
        check_jvmti("SetEventNotificationMode", code)
    }

    /// Copy of the VM's original JNI function table.
    ///
    /// The copy is allocated by the VM and kept for the life of the process.
    pub fn jni_function_table(&self) -> Result<JniFunctions> {
        let get = self
            .functions()
            .GetJNIFunctionTable
            .ok_or(AgentError::MissingFunction("GetJNIFunctionTable"))?;
        let mut table: *mut JNINativeInterface_ = ptr::null_mut();
        let code = unsafe { get(self.env, &mut table) };
        check_jvmti("GetJNIFunctionTable", code)?;
        if table.is_null() {
            return Err(AgentError::NullResult("GetJNIFunctionTable"));
        }
        Ok(JniFunctions { table })
    }
}

/// Event callbacks handed to `SetEventCallbacks`.
#[derive(Clone, Copy, Default)]
pub struct EventCallbacks {
    raw: jvmtiEventCallbacks,
}

impl EventCallbacks {
    fn slot(event: jvmtiEvent) -> Result<usize> {
        if (JVMTI_MIN_EVENT_TYPE_VAL..=JVMTI_MAX_EVENT_TYPE_VAL).contains(&event) {
            Ok((event - JVMTI_MIN_EVENT_TYPE_VAL) as usize)
        } else {
            Err(AgentError::UnknownEvent(event))
        }
    }

    pub fn set_vm_init(&mut self, callback: jvmtiEventVMInit) {
        self.raw.slots[(JVMTI_EVENT_VM_INIT - JVMTI_MIN_EVENT_TYPE_VAL) as usize] =
            callback as *const c_void;
    }

    pub fn set_vm_start(&mut self, callback: jvmtiEventVMStart) {
        self.raw.slots[(JVMTI_EVENT_VM_START - JVMTI_MIN_EVENT_TYPE_VAL) as usize] =
            callback as *const c_void;
    }

    /// Install a callback for any event by number.
    ///
    /// # Safety
    /// `callback` must be null or an `extern "system"` function with the
    /// signature JVMTI defines for `event`.
    pub unsafe fn set_raw(&mut self, event: jvmtiEvent, callback: *const c_void) -> Result<()> {
        let slot = Self::slot(event)?;
        self.raw.slots[slot] = callback;
        Ok(())
    }

    /// The callback installed for `event`, if any.
    pub fn get(&self, event: jvmtiEvent) -> Option<*const c_void> {
        let slot = Self::slot(event).ok()?;
        let callback = self.raw.slots[slot];
        (!callback.is_null()).then_some(callback)
    }

    /// Events that currently have a callback, in event-number order.
    pub fn events(&self) -> Vec<jvmtiEvent> {
        (JVMTI_MIN_EVENT_TYPE_VAL..=JVMTI_MAX_EVENT_TYPE_VAL)
            .filter(|&event| self.get(event).is_some())
            .collect()
    }

    pub fn as_raw(&self) -> &jvmtiEventCallbacks {
        &self.raw
    }
}

// =============================================================================
// JNI
// =============================================================================

/// A JNI function table that is not affected by interception.
#[derive(Clone, Copy)]
pub struct JniFunctions {
    table: *const JNINativeInterface_,
}

// The table is immutable once copied.
unsafe impl Send for JniFunctions {}
unsafe impl Sync for JniFunctions {}

impl JniFunctions {
    fn table(&self) -> &JNINativeInterface_ {
        // SAFETY: only built from a non-null table returned by the VM.
        unsafe { &*self.table }
    }

    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread.
    pub unsafe fn find_class(&self, env: *mut JNIEnv, name: &CStr) -> Result<jclass> {
        let find = self.table().FindClass.ok_or(AgentError::MissingFunction("FindClass"))?;
        non_null("FindClass", find(env, name.as_ptr()))
    }

    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread and `class` a live reference.
    pub unsafe fn get_method_id(
        &self,
        env: *mut JNIEnv,
        class: jclass,
        name: &CStr,
        signature: &CStr,
    ) -> Result<jmethodID> {
        let get = self
            .table()
            .GetMethodID
            .ok_or(AgentError::MissingFunction("GetMethodID"))?;
        let method = get(env, class, name.as_ptr(), signature.as_ptr());
        if method.is_null() {
            Err(AgentError::NullResult("GetMethodID"))
        } else {
            Ok(method)
        }
    }

    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread and `object` a live reference.
    pub unsafe fn get_object_class(&self, env: *mut JNIEnv, object: jobject) -> Result<jclass> {
        let get = self
            .table()
            .GetObjectClass
            .ok_or(AgentError::MissingFunction("GetObjectClass"))?;
        non_null("GetObjectClass", get(env, object))
    }

    /// Call a zero-argument method returning an object.
    ///
    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread, `object` a live
    /// reference and `method` a zero-argument method of its class.
    pub unsafe fn call_object_method(
        &self,
        env: *mut JNIEnv,
        object: jobject,
        method: jmethodID,
    ) -> Result<jobject> {
        let call = self
            .table()
            .CallObjectMethodA
            .ok_or(AgentError::MissingFunction("CallObjectMethodA"))?;
        non_null("CallObjectMethodA", call(env, object, method, ptr::null()))
    }

    /// Copy a Java string into an owned `String`, releasing the VM's view.
    ///
    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread and `string` a live
    /// `java.lang.String` reference.
    pub unsafe fn utf_chars(&self, env: *mut JNIEnv, string: jstring) -> Result<String> {
        let table = self.table();
        let get = table
            .GetStringUTFChars
            .ok_or(AgentError::MissingFunction("GetStringUTFChars"))?;
        let release = table
            .ReleaseStringUTFChars
            .ok_or(AgentError::MissingFunction("ReleaseStringUTFChars"))?;

        let chars = get(env, string, ptr::null_mut());
        if chars.is_null() {
            return Err(AgentError::NullResult("GetStringUTFChars"));
        }
        // Modified UTF-8 only differs from UTF-8 for NUL and supplementary
        // characters; those are replaced rather than rejected.
        let text = CStr::from_ptr(chars).to_string_lossy().into_owned();
        release(env, string, chars);
        Ok(text)
    }

    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread.
    pub unsafe fn delete_local_ref(&self, env: *mut JNIEnv, object: jobject) {
        if let Some(delete) = self.table().DeleteLocalRef {
            if !object.is_null() {
                delete(env, object);
            }
        }
    }
}

fn non_null(call: &'static str, object: jobject) -> Result<jobject> {
    if object.is_null() {
        Err(AgentError::NullResult(call))
    } else {
        Ok(object)
    }
}

/// `java.lang.Class#getName`, resolved once at VM start.
pub struct ClassNameLookup {
    functions: JniFunctions,
    get_name: jmethodID,
}

// Method IDs are valid on every thread for as long as the class is loaded,
// and java.lang.Class is never unloaded.
unsafe impl Send for ClassNameLookup {}
unsafe impl Sync for ClassNameLookup {}

impl ClassNameLookup {
    /// # Safety
    /// `env` must be the `JNIEnv` passed to the VMStart callback.
    pub unsafe fn resolve(jvmti: &Jvmti, env: *mut JNIEnv) -> Result<Self> {
        let functions = jvmti.jni_function_table()?;
        let class = functions.find_class(env, c"java/lang/Class")?;
        let get_name = functions.get_method_id(env, class, c"getName", c"()Ljava/lang/String;");
        functions.delete_local_ref(env, class);
        Ok(Self {
            functions,
            get_name: get_name?,
        })
    }

    pub fn functions(&self) -> &JniFunctions {
        &self.functions
    }

    /// Introspection bound to the calling thread's `JNIEnv`.
    ///
    /// # Safety
    /// `env` must be the `JNIEnv` of the current thread.
    pub unsafe fn introspect(&self, env: *mut JNIEnv) -> JniIntrospection<'_> {
        JniIntrospection { lookup: self, env }
    }
}

/// [`ClassIntrospection`] over one thread's `JNIEnv`.
pub struct JniIntrospection<'a> {
    lookup: &'a ClassNameLookup,
    env: *mut JNIEnv,
}

impl ClassIntrospection for JniIntrospection<'_> {
    type Handle = jobject;

    fn object_class(&self, object: jobject) -> Result<jobject> {
        unsafe { self.lookup.functions.get_object_class(self.env, object) }
    }

    fn call_get_name(&self, class: jobject) -> Result<jobject> {
        unsafe {
            self.lookup
                .functions
                .call_object_method(self.env, class, self.lookup.get_name)
        }
    }

    fn utf_chars(&self, string: jobject) -> Result<String> {
        unsafe { self.lookup.functions.utf_chars(self.env, string) }
    }

    fn delete_local(&self, handle: jobject) {
        unsafe { self.lookup.functions.delete_local_ref(self.env, handle) }
    }
}
