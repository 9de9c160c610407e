use mosync_nls::NlsError;

use crate::descriptor::Syscall;

#[derive(thiserror::Error, Debug)]
pub enum ShimError {
    #[error("address 0x{address:X} outside memory window [0x{base:X}, 0x{end:X}]")]
    OutOfRange { address: u32, base: u32, end: u64 },

    #[error("string at 0x{address:X} runs past the end of the memory window")]
    Unterminated { address: u32 },

    #[error("failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    #[error("host does not implement {method}")]
    Unsupported { method: String },

    #[error("{syscall:?} expects {expected} arguments, got {got}")]
    Arity {
        syscall: Syscall,
        expected: usize,
        got: usize,
    },

    #[error("host method {method} failed: {source}")]
    Host {
        method: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl ShimError {
    /// Classify an error coming back from a host method.
    ///
    /// Hosts report a missing method with [`crate::host::unsupported`]; that
    /// keeps its identity so the shim can turn it into the sentinel, and so
    /// does an allocation failure. Anything else is wrapped as a host failure.
    pub fn from_host(method: &'static str, err: anyhow::Error) -> Self {
        match err.downcast::<ShimError>() {
            Ok(e @ (ShimError::Unsupported { .. } | ShimError::Allocation { .. })) => e,
            Ok(other) => ShimError::Host { method, source: Box::new(other) },
            Err(err) => ShimError::Host { method, source: err.into() },
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ShimError::Unsupported { .. })
    }
}

impl From<NlsError> for ShimError {
    fn from(e: NlsError) -> Self {
        match e {
            NlsError::Allocation { bytes } => ShimError::Allocation { bytes },
        }
    }
}
