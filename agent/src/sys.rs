//! Raw JNI and JVMTI types.
//!
//! Only the function-table slots the agent calls are typed. Everything else is
//! padding so that the typed slots sit at the offsets defined by `jni.h` and
//! `jvmti.h`. These tables are only ever read through pointers handed out by
//! the VM, never constructed here.

#![allow(non_camel_case_types, non_snake_case)]

use std::ffi::{c_char, c_void};

// =============================================================================
// JNI TYPES
// =============================================================================

pub type jint = i32;
pub type jlong = i64;
pub type jboolean = u8;

#[repr(C)]
pub struct _jobject {
    _private: [u8; 0],
}

pub type jobject = *mut _jobject;
pub type jclass = jobject;
pub type jstring = jobject;
pub type jthread = jobject;

#[repr(C)]
pub struct _jmethodID {
    _private: [u8; 0],
}

pub type jmethodID = *mut _jmethodID;

#[repr(C)]
#[derive(Clone, Copy)]
pub union jvalue {
    pub z: jboolean,
    pub i: jint,
    pub j: jlong,
    pub l: jobject,
}

pub const JNI_OK: jint = 0;
pub const JNI_ERR: jint = -1;

/// `JNIEnv` is a pointer to the function table.
pub type JNIEnv = *const JNINativeInterface_;
/// `JavaVM` is a pointer to the invocation table.
pub type JavaVM = *const JNIInvokeInterface_;

type Slot = *const c_void;

/// `struct JNINativeInterface_`, typed up to `ReleaseStringUTFChars`.
#[repr(C)]
pub struct JNINativeInterface_ {
    // 0..=5: reserved0-3, GetVersion, DefineClass
    _reserved_0: [Slot; 6],
    /// 6
    pub FindClass:
        Option<unsafe extern "system" fn(env: *mut JNIEnv, name: *const c_char) -> jclass>,
    // 7..=22: FromReflectedMethod .. DeleteGlobalRef
    _reserved_7: [Slot; 16],
    /// 23
    pub DeleteLocalRef: Option<unsafe extern "system" fn(env: *mut JNIEnv, obj: jobject)>,
    // 24..=30: IsSameObject .. NewObjectA
    _reserved_24: [Slot; 7],
    /// 31
    pub GetObjectClass: Option<unsafe extern "system" fn(env: *mut JNIEnv, obj: jobject) -> jclass>,
    // 32: IsInstanceOf
    _reserved_32: [Slot; 1],
    /// 33
    pub GetMethodID: Option<
        unsafe extern "system" fn(
            env: *mut JNIEnv,
            clazz: jclass,
            name: *const c_char,
            sig: *const c_char,
        ) -> jmethodID,
    >,
    // 34..=35: CallObjectMethod, CallObjectMethodV
    _reserved_34: [Slot; 2],
    /// 36
    pub CallObjectMethodA: Option<
        unsafe extern "system" fn(
            env: *mut JNIEnv,
            obj: jobject,
            method: jmethodID,
            args: *const jvalue,
        ) -> jobject,
    >,
    // 37..=168: Call<Type>Method .. GetStringUTFLength
    _reserved_37: [Slot; 132],
    /// 169
    pub GetStringUTFChars: Option<
        unsafe extern "system" fn(
            env: *mut JNIEnv,
            string: jstring,
            is_copy: *mut jboolean,
        ) -> *const c_char,
    >,
    /// 170
    pub ReleaseStringUTFChars:
        Option<unsafe extern "system" fn(env: *mut JNIEnv, string: jstring, utf: *const c_char)>,
}

/// `struct JNIInvokeInterface_`, typed up to `GetEnv`.
#[repr(C)]
pub struct JNIInvokeInterface_ {
    // 0..=5: reserved0-2, DestroyJavaVM, AttachCurrentThread, DetachCurrentThread
    _reserved_0: [Slot; 6],
    /// 6
    pub GetEnv: Option<
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, version: jint) -> jint,
    >,
}

// =============================================================================
// JVMTI TYPES
// =============================================================================

pub type jvmtiError = u32;
pub type jvmtiEvent = u32;
pub type jvmtiEventMode = u32;

pub const JVMTI_ERROR_NONE: jvmtiError = 0;
pub const JVMTI_VERSION_1_2: jint = 0x3001_0200;

pub const JVMTI_ENABLE: jvmtiEventMode = 1;

pub const JVMTI_MIN_EVENT_TYPE_VAL: jvmtiEvent = 50;
pub const JVMTI_EVENT_VM_INIT: jvmtiEvent = 50;
pub const JVMTI_EVENT_VM_START: jvmtiEvent = 57;
pub const JVMTI_EVENT_NATIVE_METHOD_BIND: jvmtiEvent = 67;
pub const JVMTI_MAX_EVENT_TYPE_VAL: jvmtiEvent = 84;

pub type jvmtiEnv = *const jvmtiInterface_1_;

/// `struct jvmtiInterface_1_`, typed up to `SetEventCallbacks`.
///
/// Slot numbers in the comments are the 1-based function numbers of the
/// JVMTI specification.
#[repr(C)]
pub struct jvmtiInterface_1_ {
    // 1: reserved
    _reserved_1: [Slot; 1],
    /// 2. Variadic in C; the trailing varargs are reserved and never passed.
    pub SetEventNotificationMode: Option<
        unsafe extern "C" fn(
            env: *mut jvmtiEnv,
            mode: jvmtiEventMode,
            event_type: jvmtiEvent,
            event_thread: jthread,
            ...
        ) -> jvmtiError,
    >,
    // 3..=120: reserved3 .. SetJNIFunctionTable
    _reserved_3: [Slot; 118],
    /// 121
    pub GetJNIFunctionTable: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            function_table: *mut *mut JNINativeInterface_,
        ) -> jvmtiError,
    >,
    /// 122
    pub SetEventCallbacks: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            callbacks: *const jvmtiEventCallbacks,
            size_of_callbacks: jint,
        ) -> jvmtiError,
    >,
}

pub type jvmtiEventVMInit =
    unsafe extern "system" fn(jvmti_env: *mut jvmtiEnv, jni_env: *mut JNIEnv, thread: jthread);
pub type jvmtiEventVMStart =
    unsafe extern "system" fn(jvmti_env: *mut jvmtiEnv, jni_env: *mut JNIEnv);

/// Number of callback slots: one per event from VMInit (50) to VMObjectAlloc (84).
pub const JVMTI_EVENT_CALLBACK_SLOTS: usize =
    (JVMTI_MAX_EVENT_TYPE_VAL - JVMTI_MIN_EVENT_TYPE_VAL + 1) as usize;

/// `jvmtiEventCallbacks`: slot `n` holds the callback for event `50 + n`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct jvmtiEventCallbacks {
    pub slots: [*const c_void; JVMTI_EVENT_CALLBACK_SLOTS],
}

impl Default for jvmtiEventCallbacks {
    fn default() -> Self {
        Self {
            slots: [std::ptr::null(); JVMTI_EVENT_CALLBACK_SLOTS],
        }
    }
}
