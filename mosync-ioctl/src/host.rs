//! The host side of the boundary.
//!
//! A host exposes one typed method per forwarded syscall instead of being
//! looked up by name and signature on every call. Name/signature resolution
//! still exists ([`HostController::resolve`]) but the shim asks it once, when
//! it builds its method table.
//!
//! Offsets handed to the host are already rebased onto the memory window.

use std::ops::Deref;

use anyhow::Result;

use crate::error::ShimError;

/// Error a host method returns when it has no implementation.
///
/// The shim reports it to the runtime as the sentinel, like a method that
/// failed to resolve.
pub fn unsupported(method: &str) -> anyhow::Error {
    ShimError::Unsupported { method: method.to_string() }.into()
}

pub trait HostController {
    /// Host string object. Created per call and handed back to
    /// [`HostController::delete_local_ref`] before the call returns.
    type Str;

    /// Whether the host exposes `method` with the given signature.
    fn resolve(&self, method: &str, signature: &str) -> bool;

    fn new_string_utf(&self, text: &str) -> Result<Self::Str>;

    /// Release `obj`. It is not used again afterwards.
    fn delete_local_ref(&self, obj: &Self::Str);

    fn enable_framebuffer(&self, _data: i32) -> Result<()> {
        Err(unsupported("_enableFramebuffer"))
    }

    fn disable_framebuffer(&self) -> Result<()> {
        Err(unsupported("_disableFramebuffer"))
    }

    fn bt_start_device_discovery(&self, _names: i32) -> Result<i32> {
        Err(unsupported("maBtStartDeviceDiscovery"))
    }

    /// Returns the actual length of the device name.
    fn bt_get_new_device(
        &self,
        _name_buf: i32,
        _name_buf_size: i32,
        _actual_name_length: i32,
        _address: i32,
    ) -> Result<i32> {
        Err(unsupported("maBtGetNewDevice"))
    }

    /// `address` is 12 hex digits, `uuid` 32.
    fn bt_start_service_discovery(&self, _address: &Self::Str, _uuid: &Self::Str) -> Result<i32> {
        Err(unsupported("maBtStartServiceDiscovery"))
    }

    fn bt_get_next_service_size(&self, _name_buf_size: i32, _n_uuids: i32) -> Result<i32> {
        Err(unsupported("maBtGetNextServiceSize"))
    }

    fn bt_get_new_service(
        &self,
        _port: i32,
        _name_buf: i32,
        _name_buf_size: i32,
        _uuids: i32,
    ) -> Result<i32> {
        Err(unsupported("maBtGetNewService"))
    }

    fn bt_cancel_discovery(&self) -> Result<i32> {
        Err(unsupported("maBtCancelDiscovery"))
    }

    fn accept(&self, _server_handle: i32) -> Result<i32> {
        Err(unsupported("maAccept"))
    }

    fn location_start(&self) -> Result<i32> {
        Err(unsupported("maLocationStart"))
    }

    fn location_stop(&self) -> Result<i32> {
        Err(unsupported("maLocationStop"))
    }

    fn get_system_property(&self, _key: &Self::Str, _buf: i32, _size: i32) -> Result<i32> {
        Err(unsupported("maGetSystemProperty"))
    }

    fn platform_request(&self, _url: &Self::Str) -> Result<i32> {
        Err(unsupported("maPlatformRequest"))
    }

    fn write_log(&self, _text: &Self::Str, _length: i32) -> Result<i32> {
        Err(unsupported("maWriteLog"))
    }

    fn show_virtual_keyboard(&self) -> Result<i32> {
        Err(unsupported("maShowVirtualKeyboard"))
    }

    /// Full screen editable text field with OK and Cancel buttons.
    /// `out_text` receives what the user typed, at most `max_size` characters.
    fn text_box(
        &self,
        _title: &Self::Str,
        _in_text: &Self::Str,
        _out_text: i32,
        _max_size: i32,
        _constraints: i32,
    ) -> Result<i32> {
        Err(unsupported("maTextBox"))
    }

    fn widget_create(&self, _widget_type: i32) -> Result<i32> {
        Err(unsupported("maWidgetCreate"))
    }

    fn widget_destroy(&self, _handle: i32) -> Result<i32> {
        Err(unsupported("maWidgetDestroy"))
    }

    fn widget_open(&self, _handle: i32, _parent: i32) -> Result<i32> {
        Err(unsupported("maWidgetOpen"))
    }

    fn widget_close(&self, _handle: i32) -> Result<i32> {
        Err(unsupported("maWidgetClose"))
    }

    fn widget_load_html(&self, _handle: i32, _html: &Self::Str) -> Result<i32> {
        Err(unsupported("maWidgetLoadHTML"))
    }

    fn widget_load_url(&self, _handle: i32, _url: &Self::Str) -> Result<i32> {
        Err(unsupported("maWidgetLoadURL"))
    }

    fn widget_evaluate_script(&self, _handle: i32, _script: &Self::Str) -> Result<i32> {
        Err(unsupported("maWidgetEvaluateScript"))
    }

    fn widget_get_command_size(&self, _command_id: i32) -> Result<i32> {
        Err(unsupported("maWidgetGetCommandSize"))
    }

    fn widget_get_command(&self, _command_id: i32, _buf: i32, _size: i32) -> Result<i32> {
        Err(unsupported("maWidgetGetCommand"))
    }
}

/// A host object that lives for one call.
///
/// Released through [`HostController::delete_local_ref`] when dropped, so
/// every exit path of a marshaling call gives it back.
pub struct LocalRef<'h, H: HostController + ?Sized> {
    host: &'h H,
    obj: H::Str,
}

impl<'h, H: HostController + ?Sized> LocalRef<'h, H> {
    pub fn new_string(host: &'h H, text: &str) -> Result<Self, ShimError> {
        let obj = host
            .new_string_utf(text)
            .map_err(|e| ShimError::from_host("NewStringUTF", e))?;
        Ok(Self { host, obj })
    }
}

impl<H: HostController + ?Sized> Deref for LocalRef<'_, H> {
    type Target = H::Str;

    fn deref(&self) -> &H::Str {
        &self.obj
    }
}

impl<H: HostController + ?Sized> Drop for LocalRef<'_, H> {
    fn drop(&mut self) {
        self.host.delete_local_ref(&self.obj);
    }
}
