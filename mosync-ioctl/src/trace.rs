use std::env;
use std::fmt;
use std::sync::OnceLock;

/// Trace categories, enabled via environment variables.
///
/// Supported:
/// - MOSYNC_TRACE="syscall,marshal,memory" (comma/space separated; "all" enables all)
/// - MOSYNC_TRACE_SYSCALL=1, MOSYNC_TRACE_MARSHAL=1, MOSYNC_TRACE_MEMORY=1
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceKind {
    /// begin/end of every forwarded call, sentinel returns
    Syscall,
    /// argument conversion: offsets, strings, hex records
    Marshal,
    /// writes into the runtime memory window
    Memory,
}

const M_SYSCALL: u32 = 1 << 0;
const M_MARSHAL: u32 = 1 << 1;
const M_MEMORY: u32 = 1 << 2;

fn parse_bool_env(name: &str) -> bool {
    match env::var(name) {
        Ok(v) => {
            let s = v.trim().to_ascii_lowercase();
            !(s.is_empty() || s == "0" || s == "false" || s == "no" || s == "off")
        }
        Err(_) => false,
    }
}

pub(crate) fn parse_mask_from_trace_list(s: &str) -> u32 {
    let mut mask = 0u32;
    for raw in s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        let t = raw.trim().to_ascii_lowercase();
        if t.is_empty() {
            continue;
        }
        match t.as_str() {
            "all" => mask |= M_SYSCALL | M_MARSHAL | M_MEMORY,
            "syscall" | "sc" => mask |= M_SYSCALL,
            "marshal" | "args" => mask |= M_MARSHAL,
            "memory" | "mem" => mask |= M_MEMORY,
            _ => {}
        }
    }
    mask
}

fn build_mask() -> u32 {
    let mut mask = 0u32;

    if let Ok(list) = env::var("MOSYNC_TRACE") {
        mask |= parse_mask_from_trace_list(&list);
    }
    if parse_bool_env("MOSYNC_TRACE_SYSCALL") {
        mask |= M_SYSCALL;
    }
    if parse_bool_env("MOSYNC_TRACE_MARSHAL") {
        mask |= M_MARSHAL;
    }
    if parse_bool_env("MOSYNC_TRACE_MEMORY") {
        mask |= M_MEMORY;
    }
    mask
}

fn mask() -> u32 {
    static MASK: OnceLock<u32> = OnceLock::new();
    *MASK.get_or_init(build_mask)
}

pub fn enabled(k: TraceKind) -> bool {
    let m = mask();
    match k {
        TraceKind::Syscall => (m & M_SYSCALL) != 0,
        TraceKind::Marshal => (m & M_MARSHAL) != 0,
        TraceKind::Memory => (m & M_MEMORY) != 0,
    }
}

pub fn syscall(args: fmt::Arguments) {
    if !enabled(TraceKind::Syscall) {
        return;
    }
    log::info!("{}", args);
}

pub fn marshal(args: fmt::Arguments) {
    if !enabled(TraceKind::Marshal) {
        return;
    }
    log::debug!("{}", args);
}

pub fn memory(args: fmt::Arguments) {
    if !enabled(TraceKind::Memory) {
        return;
    }
    log::debug!("{}", args);
}
