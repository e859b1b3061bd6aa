//! A fake VM with just enough of the JNI and JVMTI tables to drive the agent
//! lifecycle in-process.
//!
//! Class and string handles are pointers to static C strings: `getName` on a
//! class handle returns the handle itself, and reading its UTF chars yields
//! the string. The live `JNIEnv` table is empty, so any name the agent
//! resolves must come through the table returned by `GetJNIFunctionTable`.

#![allow(dead_code)]

use std::ffi::{c_char, c_void, CStr};
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::Mutex;

use jtrace_agent::sys::{
    _jmethodID, jboolean, jclass, jint, jmethodID, jobject, jstring, jthread, jvalue, jvmtiEnv,
    jvmtiError, jvmtiEvent, jvmtiEventCallbacks, jvmtiEventMode, jvmtiEventVMInit,
    jvmtiEventVMStart, jvmtiInterface_1_, JNIEnv, JNIInvokeInterface_, JNINativeInterface_,
    JavaVM, JNI_ERR, JNI_OK, JVMTI_ENABLE, JVMTI_ERROR_NONE, JVMTI_EVENT_VM_INIT,
    JVMTI_EVENT_VM_START, JVMTI_MIN_EVENT_TYPE_VAL, JVMTI_VERSION_1_2,
};

const JVMTI_ERROR_ILLEGAL_ARGUMENT: jvmtiError = 103;

static JVMTI_ENV: AtomicPtr<jvmtiEnv> = AtomicPtr::new(ptr::null_mut());
static ORIGINAL_JNI: AtomicPtr<JNINativeInterface_> = AtomicPtr::new(ptr::null_mut());
static CALLBACKS: Mutex<Vec<usize>> = Mutex::new(Vec::new());
static ENABLED: Mutex<Vec<jvmtiEvent>> = Mutex::new(Vec::new());

pub static FIND_CLASS_CALLS: AtomicUsize = AtomicUsize::new(0);
pub static RELEASED_STRINGS: AtomicUsize = AtomicUsize::new(0);

static GET_NAME_ID: u8 = 0;

/// `SetEventNotificationMode` without its reserved varargs.
type SetModeFn =
    unsafe extern "C" fn(*mut jvmtiEnv, jvmtiEventMode, jvmtiEvent, jthread) -> jvmtiError;

fn get_name_id() -> jmethodID {
    &GET_NAME_ID as *const u8 as *mut _jmethodID
}

/// A handle for a class whose `getName` is `name`.
pub fn class_handle(name: &'static CStr) -> jclass {
    name.as_ptr() as *mut c_char as jobject
}

pub struct FakeVm {
    vm: *mut JavaVM,
    jvmti: *mut jvmtiEnv,
    env: *mut JNIEnv,
}

impl FakeVm {
    /// Build the tables and register them as the process-wide fake VM.
    pub fn new() -> Self {
        let mut invoke: JNIInvokeInterface_ = unsafe { mem::zeroed() };
        invoke.GetEnv = Some(get_env);

        let mut jvmti: jvmtiInterface_1_ = unsafe { mem::zeroed() };
        // SAFETY: no variadic arguments are ever passed, so the stub sees
        // exactly the four named parameters.
        jvmti.SetEventNotificationMode =
            Some(unsafe { mem::transmute(set_event_notification_mode as SetModeFn) });
        jvmti.GetJNIFunctionTable = Some(get_jni_function_table);
        jvmti.SetEventCallbacks = Some(set_event_callbacks);

        let mut original: JNINativeInterface_ = unsafe { mem::zeroed() };
        original.FindClass = Some(find_class);
        original.DeleteLocalRef = Some(delete_local_ref);
        original.GetObjectClass = Some(get_object_class);
        original.GetMethodID = Some(get_method_id);
        original.CallObjectMethodA = Some(call_object_method_a);
        original.GetStringUTFChars = Some(get_string_utf_chars);
        original.ReleaseStringUTFChars = Some(release_string_utf_chars);
        let live: JNINativeInterface_ = unsafe { mem::zeroed() };

        let invoke: &'static JNIInvokeInterface_ = Box::leak(Box::new(invoke));
        let jvmti: &'static jvmtiInterface_1_ = Box::leak(Box::new(jvmti));
        let original: &'static mut JNINativeInterface_ = Box::leak(Box::new(original));
        let live: &'static JNINativeInterface_ = Box::leak(Box::new(live));

        let vm: &'static mut JavaVM = Box::leak(Box::new(invoke as *const _));
        let jvmti_env: &'static mut jvmtiEnv = Box::leak(Box::new(jvmti as *const _));
        let env: &'static mut JNIEnv = Box::leak(Box::new(live as *const _));

        JVMTI_ENV.store(jvmti_env, Ordering::SeqCst);
        ORIGINAL_JNI.store(original, Ordering::SeqCst);

        Self {
            vm,
            jvmti: jvmti_env,
            env,
        }
    }

    pub fn java_vm(&self) -> *mut JavaVM {
        self.vm
    }

    pub fn jni_env(&self) -> *mut JNIEnv {
        self.env
    }

    /// Events enabled through `SetEventNotificationMode`, in call order.
    pub fn enabled_events(&self) -> Vec<jvmtiEvent> {
        ENABLED.lock().unwrap().clone()
    }

    /// The callback the agent installed for `event`, if any.
    pub fn callback(&self, event: jvmtiEvent) -> Option<*const c_void> {
        let slots = CALLBACKS.lock().unwrap();
        let slot = (event - JVMTI_MIN_EVENT_TYPE_VAL) as usize;
        slots
            .get(slot)
            .copied()
            .filter(|&addr| addr != 0)
            .map(|addr| addr as *const c_void)
    }

    /// Deliver VMStart on the calling thread.
    pub fn vm_start(&self) {
        let callback = self.callback(JVMTI_EVENT_VM_START).expect("no VMStart callback");
        unsafe {
            let callback: jvmtiEventVMStart = mem::transmute(callback);
            callback(self.jvmti, self.env);
        }
    }

    /// Deliver VMInit on the calling thread.
    pub fn vm_init(&self) {
        let callback = self.callback(JVMTI_EVENT_VM_INIT).expect("no VMInit callback");
        unsafe {
            let callback: jvmtiEventVMInit = mem::transmute(callback);
            callback(self.jvmti, self.env, ptr::null_mut());
        }
    }
}

// =============================================================================
// INVOCATION AND JVMTI STUBS
// =============================================================================

unsafe extern "system" fn get_env(
    _vm: *mut JavaVM,
    penv: *mut *mut c_void,
    version: jint,
) -> jint {
    if version != JVMTI_VERSION_1_2 {
        return JNI_ERR;
    }
    *penv = JVMTI_ENV.load(Ordering::SeqCst).cast();
    JNI_OK
}

unsafe extern "C" fn set_event_notification_mode(
    _env: *mut jvmtiEnv,
    mode: jvmtiEventMode,
    event: jvmtiEvent,
    _thread: jthread,
) -> jvmtiError {
    if mode == JVMTI_ENABLE {
        ENABLED.lock().unwrap().push(event);
    }
    JVMTI_ERROR_NONE
}

unsafe extern "system" fn get_jni_function_table(
    _env: *mut jvmtiEnv,
    table: *mut *mut JNINativeInterface_,
) -> jvmtiError {
    *table = ORIGINAL_JNI.load(Ordering::SeqCst);
    JVMTI_ERROR_NONE
}

unsafe extern "system" fn set_event_callbacks(
    _env: *mut jvmtiEnv,
    callbacks: *const jvmtiEventCallbacks,
    size: jint,
) -> jvmtiError {
    if callbacks.is_null() || size as usize != mem::size_of::<jvmtiEventCallbacks>() {
        return JVMTI_ERROR_ILLEGAL_ARGUMENT;
    }
    *CALLBACKS.lock().unwrap() = (*callbacks).slots.iter().map(|&p| p as usize).collect();
    JVMTI_ERROR_NONE
}

// =============================================================================
// JNI STUBS
// =============================================================================

unsafe extern "system" fn find_class(_env: *mut JNIEnv, name: *const c_char) -> jclass {
    FIND_CLASS_CALLS.fetch_add(1, Ordering::SeqCst);
    if CStr::from_ptr(name) == c"java/lang/Class" {
        class_handle(c"java.lang.Class")
    } else {
        ptr::null_mut()
    }
}

unsafe extern "system" fn delete_local_ref(_env: *mut JNIEnv, _obj: jobject) {}

unsafe extern "system" fn get_object_class(_env: *mut JNIEnv, obj: jobject) -> jclass {
    if obj.is_null() {
        ptr::null_mut()
    } else {
        class_handle(c"java.lang.Class")
    }
}

unsafe extern "system" fn get_method_id(
    _env: *mut JNIEnv,
    _clazz: jclass,
    name: *const c_char,
    sig: *const c_char,
) -> jmethodID {
    if CStr::from_ptr(name) == c"getName" && CStr::from_ptr(sig) == c"()Ljava/lang/String;" {
        get_name_id()
    } else {
        ptr::null_mut()
    }
}

unsafe extern "system" fn call_object_method_a(
    _env: *mut JNIEnv,
    obj: jobject,
    method: jmethodID,
    _args: *const jvalue,
) -> jobject {
    if method == get_name_id() {
        obj
    } else {
        ptr::null_mut()
    }
}

unsafe extern "system" fn get_string_utf_chars(
    _env: *mut JNIEnv,
    string: jstring,
    is_copy: *mut jboolean,
) -> *const c_char {
    if !is_copy.is_null() {
        *is_copy = 0;
    }
    string as *const c_char
}

unsafe extern "system" fn release_string_utf_chars(
    _env: *mut JNIEnv,
    _string: jstring,
    _utf: *const c_char,
) {
    RELEASED_STRINGS.fetch_add(1, Ordering::SeqCst);
}
