//! mosync-ioctl
//!
//! Forwards MoSync runtime syscalls to a host platform controller.
//!
//! The runtime core hands over raw `int` arguments whose pointers are linear
//! addresses into its memory window. [`Shim`] rebases those onto the window,
//! turns strings and packed records into host strings, calls the matching
//! [`HostController`] method and returns its result. Methods the host lacks
//! report [`SENTINEL`].

pub mod config;
pub mod descriptor;
pub mod error;
pub mod framebuffer;
pub mod host;
pub mod memory;
pub mod shim;
pub mod trace;


pub use config::{LoggerConfig, ResolveMode, ShimConfig, ShimConfigBuilder, ShimConfigReader};
pub use descriptor::{ArgKind, RetKind, Syscall, SyscallDescriptor, DESCRIPTORS};
pub use error::ShimError;
pub use host::{unsupported, HostController, LocalRef};
pub use memory::{to_offset, MemoryWindow};
pub use shim::{MethodTable, Shim, NULL, SENTINEL};
