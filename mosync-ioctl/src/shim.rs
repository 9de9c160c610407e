//! Marshaling of runtime syscalls onto a [`HostController`].
//!
//! Every forwarded call follows the same steps: check the method resolved on
//! the host, convert the arguments (offsets, host strings, hex records), call
//! the host, release the host strings, return the host's `int`. A method the
//! host does not have yields [`SENTINEL`] instead of an error.

use mosync_nls::{
    hardware_address_to_hex, uuid_to_hex, wide_len, Decoder, TextDecoder, BT_ADDR_LEN, UUID_LEN,
};
use strum::EnumCount;

use crate::config::{ResolveMode, ShimConfig};
use crate::descriptor::{Syscall, DESCRIPTORS};
use crate::error::ShimError;
use crate::framebuffer;
use crate::host::{HostController, LocalRef};
use crate::memory::MemoryWindow;
use crate::trace;

/// Returned to the runtime when the host cannot run a syscall.
pub const SENTINEL: i32 = 0;

/// Runtime null pointer.
pub const NULL: u32 = 0;

/// Which host methods resolved, looked up once per host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodTable {
    resolved: [bool; Syscall::COUNT],
}

impl MethodTable {
    pub fn resolve<H: HostController + ?Sized>(host: &H) -> Self {
        let mut resolved = [false; Syscall::COUNT];
        for d in DESCRIPTORS.iter() {
            let found = host.resolve(d.method, d.signature);
            if !found {
                log::debug!("host has no {}{}; {} returns {}", d.method, d.signature, d.name, SENTINEL);
            }
            resolved[d.syscall as usize] = found;
        }
        Self { resolved }
    }

    pub fn is_resolved(&self, syscall: Syscall) -> bool {
        self.resolved[syscall as usize]
    }

    pub fn resolved(&self) -> impl Iterator<Item = Syscall> + '_ {
        Syscall::all().filter(|&s| self.is_resolved(s))
    }
}

fn host_call<T>(syscall: Syscall, result: anyhow::Result<T>) -> Result<T, ShimError> {
    result.map_err(|e| ShimError::from_host(syscall.descriptor().method, e))
}

pub struct Shim<'h, H: HostController + ?Sized> {
    host: &'h H,
    table: Option<MethodTable>,
    decoder: Decoder,
}

impl<'h, H: HostController + ?Sized> Shim<'h, H> {
    pub fn new(host: &'h H, config: &ShimConfig) -> Self {
        let table = match config.resolve_mode {
            ResolveMode::Startup => Some(MethodTable::resolve(host)),
            ResolveMode::PerCall => None,
        };
        Self { host, table, decoder: Decoder::new(config.string_encoding) }
    }

    pub fn with_defaults(host: &'h H) -> Self {
        Self::new(host, &ShimConfig::default())
    }

    pub fn host(&self) -> &'h H {
        self.host
    }

    /// `None` when methods are resolved per call.
    pub fn method_table(&self) -> Option<&MethodTable> {
        self.table.as_ref()
    }

    pub fn is_supported(&self, syscall: Syscall) -> bool {
        match &self.table {
            Some(table) => table.is_resolved(syscall),
            None => {
                let d = syscall.descriptor();
                self.host.resolve(d.method, d.signature)
            }
        }
    }

    fn forward<F>(&self, syscall: Syscall, call: F) -> Result<i32, ShimError>
    where
        F: FnOnce(&'h H) -> Result<i32, ShimError>,
    {
        let d = syscall.descriptor();
        if !self.is_supported(syscall) {
            trace::syscall(format_args!("{}: {} not resolved, returning sentinel", d.name, d.method));
            return Ok(SENTINEL);
        }

        trace::syscall(format_args!("{} begin", d.name));
        let result = match call(self.host) {
            Err(e) if e.is_unsupported() => {
                trace::syscall(format_args!("{}: {e}, returning sentinel", d.name));
                Ok(SENTINEL)
            }
            other => other,
        };
        trace::syscall(format_args!("{} end", d.name));
        result
    }

    fn offset(&self, mem: &MemoryWindow<'_>, address: u32) -> Result<i32, ShimError> {
        let off = mem.host_offset(address)?;
        trace::marshal(format_args!("address 0x{address:X} -> offset {off}"));
        Ok(off)
    }

    fn host_str(&self, text: &str) -> Result<LocalRef<'h, H>, ShimError> {
        trace::marshal(format_args!("host string {text:?}"));
        LocalRef::new_string(self.host, text)
    }

    fn cstr(&self, mem: &MemoryWindow<'_>, address: u32) -> Result<LocalRef<'h, H>, ShimError> {
        let text = self.decoder.decode(mem.read_cstr(address)?);
        self.host_str(&text)
    }

    /// A null `address` is an absent string and reaches the host as "".
    fn wstr(&self, mem: &MemoryWindow<'_>, address: u32) -> Result<LocalRef<'h, H>, ShimError> {
        let units = match address {
            NULL => None,
            _ => Some(mem.read_wide(address)?),
        };
        let units = units.as_deref();
        let len = wide_len(units);
        let text = self.decoder.decode_wide(&units.unwrap_or_default()[..len])?;
        self.host_str(&text)
    }

    /// Answered locally; see [`framebuffer::frame_buffer_get_info`].
    pub fn frame_buffer_get_info(
        &self,
        mem: &mut MemoryWindow<'_>,
        info_ptr: u32,
        extent: i32,
    ) -> Result<i32, ShimError> {
        framebuffer::frame_buffer_get_info(mem, info_ptr, extent)
    }

    /// Returns 1 once the host enabled the frame buffer at `data`.
    pub fn frame_buffer_init(&self, mem: &MemoryWindow<'_>, data: u32) -> Result<i32, ShimError> {
        self.forward(Syscall::FrameBufferInit, |host| {
            let data = self.offset(mem, data)?;
            log::info!("Framebuffer data: {data}");
            host_call(Syscall::FrameBufferInit, host.enable_framebuffer(data))?;
            Ok(1)
        })
    }

    pub fn frame_buffer_close(&self) -> Result<i32, ShimError> {
        self.forward(Syscall::FrameBufferClose, |host| {
            host_call(Syscall::FrameBufferClose, host.disable_framebuffer())?;
            Ok(1)
        })
    }

    pub fn bt_start_device_discovery(&self, names: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::BtStartDeviceDiscovery, |host| {
            host_call(Syscall::BtStartDeviceDiscovery, host.bt_start_device_discovery(names))
        })
    }

    /// Returns the actual length of the device name.
    pub fn bt_get_new_device(
        &self,
        mem: &MemoryWindow<'_>,
        name_buf: u32,
        name_buf_size: i32,
        actual_name_length: u32,
        address: u32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::BtGetNewDevice, |host| {
            let name_buf = self.offset(mem, name_buf)?;
            let actual_name_length = self.offset(mem, actual_name_length)?;
            let address = self.offset(mem, address)?;
            host_call(
                Syscall::BtGetNewDevice,
                host.bt_get_new_device(name_buf, name_buf_size, actual_name_length, address),
            )
        })
    }

    /// `addr` points at a 6-byte `MABtAddr`, `uuid` at a 16-byte `MAUUID`.
    pub fn bt_start_service_discovery(
        &self,
        mem: &MemoryWindow<'_>,
        addr: u32,
        uuid: u32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::BtStartServiceDiscovery, |host| {
            let address = hardware_address_to_hex(&mem.read_array::<BT_ADDR_LEN>(addr)?);
            let uuid = uuid_to_hex(&mem.read_array::<UUID_LEN>(uuid)?);
            let address = self.host_str(&address)?;
            let uuid = self.host_str(&uuid)?;
            host_call(
                Syscall::BtStartServiceDiscovery,
                host.bt_start_service_discovery(&address, &uuid),
            )
        })
    }

    pub fn bt_get_next_service_size(
        &self,
        mem: &MemoryWindow<'_>,
        name_buf_size: u32,
        n_uuids: u32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::BtGetNextServiceSize, |host| {
            let name_buf_size = self.offset(mem, name_buf_size)?;
            let n_uuids = self.offset(mem, n_uuids)?;
            host_call(
                Syscall::BtGetNextServiceSize,
                host.bt_get_next_service_size(name_buf_size, n_uuids),
            )
        })
    }

    pub fn bt_get_new_service(
        &self,
        mem: &MemoryWindow<'_>,
        port: u32,
        name_buf: u32,
        name_buf_size: i32,
        uuids: u32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::BtGetNewService, |host| {
            let port = self.offset(mem, port)?;
            let name_buf = self.offset(mem, name_buf)?;
            let uuids = self.offset(mem, uuids)?;
            host_call(
                Syscall::BtGetNewService,
                host.bt_get_new_service(port, name_buf, name_buf_size, uuids),
            )
        })
    }

    pub fn bt_cancel_discovery(&self) -> Result<i32, ShimError> {
        self.forward(Syscall::BtCancelDiscovery, |host| {
            host_call(Syscall::BtCancelDiscovery, host.bt_cancel_discovery())
        })
    }

    pub fn accept(&self, server_handle: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::Accept, |host| host_call(Syscall::Accept, host.accept(server_handle)))
    }

    pub fn location_start(&self) -> Result<i32, ShimError> {
        self.forward(Syscall::LocationStart, |host| {
            host_call(Syscall::LocationStart, host.location_start())
        })
    }

    pub fn location_stop(&self) -> Result<i32, ShimError> {
        self.forward(Syscall::LocationStop, |host| {
            host_call(Syscall::LocationStop, host.location_stop())
        })
    }

    pub fn get_system_property(
        &self,
        mem: &MemoryWindow<'_>,
        key: u32,
        buf: u32,
        size: i32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::GetSystemProperty, |host| {
            let key = self.cstr(mem, key)?;
            let buf = self.offset(mem, buf)?;
            host_call(Syscall::GetSystemProperty, host.get_system_property(&key, buf, size))
        })
    }

    pub fn platform_request(&self, mem: &MemoryWindow<'_>, url: u32) -> Result<i32, ShimError> {
        self.forward(Syscall::PlatformRequest, |host| {
            let url = self.cstr(mem, url)?;
            host_call(Syscall::PlatformRequest, host.platform_request(&url))
        })
    }

    /// `length` bytes at `text`; the text also ends at an embedded NUL.
    pub fn write_log(&self, mem: &MemoryWindow<'_>, text: u32, length: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WriteLog, |host| {
            let bytes = mem.slice(text, length.max(0) as usize)?;
            let text = self.host_str(&self.decoder.decode_cstr(bytes))?;
            host_call(Syscall::WriteLog, host.write_log(&text, length))
        })
    }

    pub fn show_virtual_keyboard(&self) -> Result<i32, ShimError> {
        self.forward(Syscall::ShowVirtualKeyboard, |host| {
            host_call(Syscall::ShowVirtualKeyboard, host.show_virtual_keyboard())
        })
    }

    /// `title` and `in_text` are wide strings, either may be null;
    /// `out_text` receives the user's input.
    pub fn text_box(
        &self,
        mem: &MemoryWindow<'_>,
        title: u32,
        in_text: u32,
        out_text: u32,
        max_size: i32,
        constraints: i32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::TextBox, |host| {
            let title = self.wstr(mem, title)?;
            let in_text = self.wstr(mem, in_text)?;
            let out_text = self.offset(mem, out_text)?;
            host_call(
                Syscall::TextBox,
                host.text_box(&title, &in_text, out_text, max_size, constraints),
            )
        })
    }

    pub fn widget_create(&self, widget_type: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetCreate, |host| {
            host_call(Syscall::WidgetCreate, host.widget_create(widget_type))
        })
    }

    pub fn widget_destroy(&self, handle: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetDestroy, |host| {
            host_call(Syscall::WidgetDestroy, host.widget_destroy(handle))
        })
    }

    pub fn widget_open(&self, handle: i32, parent: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetOpen, |host| {
            host_call(Syscall::WidgetOpen, host.widget_open(handle, parent))
        })
    }

    pub fn widget_close(&self, handle: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetClose, |host| {
            host_call(Syscall::WidgetClose, host.widget_close(handle))
        })
    }

    pub fn widget_load_html(&self, mem: &MemoryWindow<'_>, handle: i32, html: u32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetLoadHtml, |host| {
            let html = self.cstr(mem, html)?;
            host_call(Syscall::WidgetLoadHtml, host.widget_load_html(handle, &html))
        })
    }

    pub fn widget_load_url(&self, mem: &MemoryWindow<'_>, handle: i32, url: u32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetLoadUrl, |host| {
            let url = self.cstr(mem, url)?;
            host_call(Syscall::WidgetLoadUrl, host.widget_load_url(handle, &url))
        })
    }

    pub fn widget_evaluate_script(
        &self,
        mem: &MemoryWindow<'_>,
        handle: i32,
        script: u32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetEvaluateScript, |host| {
            let script = self.cstr(mem, script)?;
            host_call(Syscall::WidgetEvaluateScript, host.widget_evaluate_script(handle, &script))
        })
    }

    pub fn widget_get_command_size(&self, command_id: i32) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetGetCommandSize, |host| {
            host_call(Syscall::WidgetGetCommandSize, host.widget_get_command_size(command_id))
        })
    }

    pub fn widget_get_command(
        &self,
        mem: &MemoryWindow<'_>,
        command_id: i32,
        buf: u32,
        size: i32,
    ) -> Result<i32, ShimError> {
        self.forward(Syscall::WidgetGetCommand, |host| {
            let buf = self.offset(mem, buf)?;
            host_call(Syscall::WidgetGetCommand, host.widget_get_command(command_id, buf, size))
        })
    }

    /// Runtime entry point: run `syscall` with raw `int` arguments.
    ///
    /// Pointer arguments are linear addresses. Any failure is logged and
    /// reported as [`SENTINEL`].
    pub fn dispatch(&self, syscall: Syscall, args: &[i32], mem: &MemoryWindow<'_>) -> i32 {
        match self.try_dispatch(syscall, args, mem) {
            Ok(ret) => ret,
            Err(e) => {
                log::error!("{}: {e}", syscall.descriptor().name);
                SENTINEL
            }
        }
    }

    pub fn try_dispatch(
        &self,
        syscall: Syscall,
        args: &[i32],
        mem: &MemoryWindow<'_>,
    ) -> Result<i32, ShimError> {
        let expected = syscall.descriptor().arity();
        if args.len() != expected {
            return Err(ShimError::Arity { syscall, expected, got: args.len() });
        }
        let a = |i: usize| args[i];
        let p = |i: usize| args[i] as u32;

        match syscall {
            Syscall::FrameBufferInit => self.frame_buffer_init(mem, p(0)),
            Syscall::FrameBufferClose => self.frame_buffer_close(),
            Syscall::BtStartDeviceDiscovery => self.bt_start_device_discovery(a(0)),
            Syscall::BtGetNewDevice => self.bt_get_new_device(mem, p(0), a(1), p(2), p(3)),
            Syscall::BtStartServiceDiscovery => self.bt_start_service_discovery(mem, p(0), p(1)),
            Syscall::BtGetNextServiceSize => self.bt_get_next_service_size(mem, p(0), p(1)),
            Syscall::BtGetNewService => self.bt_get_new_service(mem, p(0), p(1), a(2), p(3)),
            Syscall::BtCancelDiscovery => self.bt_cancel_discovery(),
            Syscall::Accept => self.accept(a(0)),
            Syscall::LocationStart => self.location_start(),
            Syscall::LocationStop => self.location_stop(),
            Syscall::GetSystemProperty => self.get_system_property(mem, p(0), p(1), a(2)),
            Syscall::PlatformRequest => self.platform_request(mem, p(0)),
            Syscall::WriteLog => self.write_log(mem, p(0), a(1)),
            Syscall::ShowVirtualKeyboard => self.show_virtual_keyboard(),
            Syscall::TextBox => self.text_box(mem, p(0), p(1), p(2), a(3), a(4)),
            Syscall::WidgetCreate => self.widget_create(a(0)),
            Syscall::WidgetDestroy => self.widget_destroy(a(0)),
            Syscall::WidgetOpen => self.widget_open(a(0), a(1)),
            Syscall::WidgetClose => self.widget_close(a(0)),
            Syscall::WidgetLoadHtml => self.widget_load_html(mem, a(0), p(1)),
            Syscall::WidgetLoadUrl => self.widget_load_url(mem, a(0), p(1)),
            Syscall::WidgetEvaluateScript => self.widget_evaluate_script(mem, a(0), p(1)),
            Syscall::WidgetGetCommandSize => self.widget_get_command_size(a(0)),
            Syscall::WidgetGetCommand => self.widget_get_command(mem, a(0), p(1), a(2)),
        }
    }
}
