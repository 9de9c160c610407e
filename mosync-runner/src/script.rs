use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use mosync_ioctl::test::{HostCall, RecordingHost};
use mosync_ioctl::{MemoryWindow, Shim, ShimConfig, Syscall, SENTINEL};
use mosync_nls::Decoder;
use serde::{Deserialize, Serialize};

/// Not a host syscall: answered by the shim itself.
pub const FRAME_BUFFER_GET_INFO: &str = "maFrameBufferGetInfo";

fn default_memory_base() -> u32 {
    0x1000
}

fn default_memory_size() -> usize {
    0x10000
}

/// Initial content of the memory window.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Write {
    Bytes { address: u32, hex: String },
    /// NUL-terminated, in the configured string encoding.
    Cstr { address: u32, text: String },
    /// Zero-terminated UTF-16LE.
    Wide { address: u32, text: String },
}

impl Write {
    fn apply(&self, mem: &mut MemoryWindow<'_>, decoder: &Decoder) -> Result<()> {
        let (address, bytes) = match self {
            Write::Bytes { address, hex } => {
                (*address, hex::decode(hex).with_context(|| format!("bad hex at 0x{address:X}"))?)
            }
            Write::Cstr { address, text } => {
                let mut bytes = decoder.encode(text).into_owned();
                bytes.push(0);
                (*address, bytes)
            }
            Write::Wide { address, text } => {
                let bytes = text
                    .encode_utf16()
                    .chain(std::iter::once(0))
                    .flat_map(u16::to_le_bytes)
                    .collect();
                (*address, bytes)
            }
        };
        mem.slice_mut(address, bytes.len())?.copy_from_slice(&bytes);
        Ok(())
    }
}

/// How the recording host behaves.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HostSetup {
    pub without: Vec<String>,
    pub unimplemented: Vec<String>,
    pub failing: Vec<String>,
    pub results: HashMap<String, i32>,
}

impl HostSetup {
    pub fn build(&self) -> RecordingHost {
        let mut host = RecordingHost::new();
        for method in &self.without {
            host = host.without(method);
        }
        for method in &self.unimplemented {
            host = host.unimplemented(method);
        }
        for method in &self.failing {
            host = host.failing(method);
        }
        for (method, value) in &self.results {
            host = host.returning(method, *value);
        }
        host
    }
}

#[derive(Debug, Deserialize)]
pub struct Call {
    pub syscall: String,
    #[serde(default)]
    pub args: Vec<i32>,
}

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default = "default_memory_base")]
    pub memory_base: u32,
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
    #[serde(default)]
    pub host: HostSetup,
    #[serde(default)]
    pub writes: Vec<Write>,
    pub calls: Vec<Call>,
}

/// One replayed syscall, printed as a JSON line.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub syscall: String,
    pub args: Vec<i32>,
    pub result: i32,
    pub host_calls: Vec<HostCall>,
}

impl Script {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
        Self::parse(&text).with_context(|| format!("parse {path:?}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn run(&self, config: &ShimConfig) -> Result<Vec<Outcome>> {
        let host = self.host.build();
        let shim = Shim::new(&host, config);
        let decoder = Decoder::new(config.string_encoding);

        let mut image = vec![0u8; self.memory_size];
        let mut mem = MemoryWindow::new(self.memory_base, &mut image);
        for write in &self.writes {
            write.apply(&mut mem, &decoder)?;
        }

        let mut outcomes = Vec::with_capacity(self.calls.len());
        for call in &self.calls {
            let result = if call.syscall == FRAME_BUFFER_GET_INFO {
                let (info, extent) = match call.args.as_slice() {
                    &[info, extent] => (info as u32, extent),
                    other => bail!("{FRAME_BUFFER_GET_INFO} takes 2 arguments, got {}", other.len()),
                };
                shim.frame_buffer_get_info(&mut mem, info, extent).unwrap_or_else(|e| {
                    log::error!("{FRAME_BUFFER_GET_INFO}: {e}");
                    SENTINEL
                })
            } else {
                let syscall = Syscall::from_name(&call.syscall)
                    .with_context(|| format!("unknown syscall {}", call.syscall))?;
                shim.dispatch(syscall, &call.args, &mem)
            };
            log::debug!("{} -> {result}", call.syscall);

            outcomes.push(Outcome {
                syscall: call.syscall.clone(),
                args: call.args.clone(),
                result,
                host_calls: host.take_calls(),
            });
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosync_ioctl::test::HostArg;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = r#"{
        "memory_base": 4096,
        "memory_size": 256,
        "host": { "without": ["maAccept"], "results": { "maWidgetLoadURL": 9 } },
        "writes": [
            { "kind": "cstr", "address": 4096, "text": "http://example.org" },
            { "kind": "wide", "address": 4160, "text": "Title" },
            { "kind": "bytes", "address": 4200, "hex": "001A2B3C4D5E" }
        ],
        "calls": [
            { "syscall": "maWidgetLoadURL", "args": [3, 4096] },
            { "syscall": "maAccept", "args": [1] },
            { "syscall": "maTextBox", "args": [4160, 4160, 4224, 16, 0] },
            { "syscall": "maFrameBufferGetInfo", "args": [4288, 131073] }
        ]
    }"#;

    #[test]
    fn replays_calls_in_order() {
        let script = Script::parse(SCRIPT).unwrap();
        let outcomes = script.run(&ShimConfig::default()).unwrap();

        let results: Vec<i32> = outcomes.iter().map(|o| o.result).collect();
        assert_eq!(results, vec![9, SENTINEL, 1, 1]);

        assert_eq!(
            outcomes[0].host_calls,
            vec![HostCall {
                method: "maWidgetLoadURL",
                args: vec![HostArg::Int(3), HostArg::Str("http://example.org".into())],
            }]
        );
        assert!(outcomes[1].host_calls.is_empty());
        assert_eq!(
            outcomes[2].host_calls[0].args,
            vec![
                HostArg::Str("Title".into()),
                HostArg::Str("Title".into()),
                HostArg::Int(128),
                HostArg::Int(16),
                HostArg::Int(0),
            ]
        );
        assert!(outcomes[3].host_calls.is_empty());
    }

    #[test]
    fn unknown_syscall_is_an_error() {
        let script = Script::parse(r#"{ "calls": [{ "syscall": "maNope" }] }"#).unwrap();
        assert!(script.run(&ShimConfig::default()).is_err());
    }

    #[test]
    fn writes_must_fit_the_window() {
        let script = Script::parse(
            r#"{ "memory_size": 4, "writes": [{ "kind": "cstr", "address": 4096, "text": "long" }], "calls": [] }"#,
        )
        .unwrap();
        assert!(script.run(&ShimConfig::default()).is_err());
    }

    #[test]
    fn outcome_serializes_as_one_line() {
        let outcome = Outcome {
            syscall: "maWriteLog".into(),
            args: vec![4096, 2],
            result: 1,
            host_calls: vec![HostCall {
                method: "maWriteLog",
                args: vec![HostArg::Str("hi".into()), HostArg::Int(2)],
            }],
        };
        assert_eq!(
            serde_json::to_string(&outcome).unwrap(),
            r#"{"syscall":"maWriteLog","args":[4096,2],"result":1,"host_calls":[{"method":"maWriteLog","args":["hi",2]}]}"#
        );
    }
}
