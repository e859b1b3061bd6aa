//! Turning intercepted calls into records on the shared sink.
//!
//! [`Tracer`] is the context object interceptors emit through. Class names are
//! resolved and the record is formatted on the calling thread; only the final
//! write goes through the sink's lock.

use std::fs::File;
use std::io::Write;

use jtrace_protocol::{Argument, RecordBuffer, TraceRecord};
use log::{trace, warn};

use crate::error::{AgentError, Result};
use crate::sink::TraceSink;

/// The runtime operations needed to name a class.
///
/// Implemented over JNI by [`crate::env::JniIntrospection`].
pub trait ClassIntrospection {
    /// Opaque reference to a runtime object.
    type Handle: Copy;

    /// The runtime class of `object`.
    fn object_class(&self, object: Self::Handle) -> Result<Self::Handle>;

    /// Invoke the cached zero-argument name method on `class`, yielding a string handle.
    fn call_get_name(&self, class: Self::Handle) -> Result<Self::Handle>;

    /// Copy the characters of a string handle; the runtime's view is released before returning.
    fn utf_chars(&self, string: Self::Handle) -> Result<String>;

    /// Release a reference obtained from this introspection.
    fn delete_local(&self, handle: Self::Handle);
}

/// Resolve the display name of `class`.
///
/// `class` must itself be a class object; its runtime class is checked before
/// its name is read.
pub fn resolve_class_name<I: ClassIntrospection>(
    introspection: &I,
    class: I::Handle,
) -> Result<String> {
    let class_class = introspection.object_class(class)?;
    introspection.delete_local(class_class);

    let name = introspection.call_get_name(class)?;
    let text = introspection.utf_chars(name);
    introspection.delete_local(name);
    text
}

/// One intercepted call, before its class has been resolved.
#[derive(Debug, Clone)]
pub struct TraceCall<'a, H> {
    pub tracer: &'a str,
    pub function: Option<&'a str>,
    pub class: Option<H>,
    pub result: Option<&'a str>,
    pub args: Vec<Argument>,
}

impl<'a, H> TraceCall<'a, H> {
    pub fn new(tracer: &'a str) -> Self {
        Self {
            tracer,
            function: None,
            class: None,
            result: None,
            args: Vec::new(),
        }
    }

    pub fn function(mut self, function: &'a str) -> Self {
        self.function = Some(function);
        self
    }

    pub fn class(mut self, class: H) -> Self {
        self.class = Some(class);
        self
    }

    pub fn result(mut self, result: &'a str) -> Self {
        self.result = Some(result);
        self
    }

    /// Append a quoted argument.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Argument::Quoted(value.into()));
        self
    }

    /// Append an argument written verbatim (numbers, booleans, JSON).
    pub fn raw_arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(Argument::Raw(value.into()));
        self
    }

    pub fn arguments(mut self, args: Vec<Argument>) -> Self {
        self.args = args;
        self
    }
}

/// Formats intercepted calls and appends them to the sink.
pub struct Tracer<W: Write + Send = File> {
    sink: TraceSink<W>,
}

impl<W: Write + Send> Tracer<W> {
    pub fn new(sink: TraceSink<W>) -> Self {
        Self { sink }
    }

    /// Resolve, format and append one call.
    ///
    /// `introspection` is only consulted when the call names a class; a class
    /// without an introspection fails with [`AgentError::ClassNameUnavailable`].
    pub fn append<I: ClassIntrospection>(
        &self,
        introspection: Option<&I>,
        call: TraceCall<'_, I::Handle>,
    ) -> Result<()> {
        let class = match call.class {
            Some(handle) => {
                let introspection = introspection.ok_or(AgentError::ClassNameUnavailable)?;
                Some(resolve_class_name(introspection, handle)?)
            }
            None => None,
        };

        let record = TraceRecord {
            tracer: call.tracer.to_string(),
            function: call.function.map(str::to_string),
            class,
            result: call.result.map(str::to_string),
            args: call.args,
        };
        self.append_record(&record)
    }

    /// Format and append an already resolved record.
    pub fn append_record(&self, record: &TraceRecord) -> Result<()> {
        if record.args.iter().any(Argument::is_empty_raw) {
            warn!(
                "{} call {} has an empty raw argument, written as \"\"",
                record.tracer,
                record.function.as_deref().unwrap_or("<anonymous>")
            );
        }
        let mut buf = RecordBuffer::new();
        record.format_into(&mut buf)?;
        trace!("{}", buf.as_str().trim_end());
        self.sink.append(buf.as_str())
    }

    /// Close the underlying sink.
    pub fn close(&self) -> Result<Option<W>> {
        self.sink.close()
    }
}

/// Introspection for callers that never pass a class.
pub enum NoIntrospection {}

impl ClassIntrospection for NoIntrospection {
    type Handle = ();

    fn object_class(&self, _object: ()) -> Result<()> {
        match *self {}
    }

    fn call_get_name(&self, _class: ()) -> Result<()> {
        match *self {}
    }

    fn utf_chars(&self, _string: ()) -> Result<String> {
        match *self {}
    }

    fn delete_local(&self, _handle: ()) {
        match *self {}
    }
}
