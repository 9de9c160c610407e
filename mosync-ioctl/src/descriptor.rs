//! Static description of every syscall the shim forwards.
//!
//! Each entry names the runtime syscall, the host method it lands on, the
//! kinds of its runtime arguments and the host signature string the method is
//! resolved with.

use serde::Serialize;
use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// How a runtime argument is turned into a host argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ArgKind {
    /// Passed through unchanged.
    Int,
    /// Linear address, rebased to an offset from the window start.
    Ptr,
    /// NUL-terminated byte string, becomes a host string.
    CStr,
    /// Zero-terminated wide string, narrowed and becomes a host string.
    WStr,
    /// Address of a 6-byte Bluetooth address, becomes 12 hex digits.
    BtAddr,
    /// Address of a 16-byte UUID, becomes 32 hex digits.
    Uuid,
}

impl ArgKind {
    pub fn signature_code(self) -> &'static str {
        match self {
            ArgKind::Int | ArgKind::Ptr => "I",
            ArgKind::CStr | ArgKind::WStr | ArgKind::BtAddr | ArgKind::Uuid => {
                "Ljava/lang/String;"
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RetKind {
    Int,
    /// The host returns nothing; the syscall reports 1.
    Void,
}

impl RetKind {
    pub fn signature_code(self) -> &'static str {
        match self {
            RetKind::Int => "I",
            RetKind::Void => "V",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter, Serialize)]
pub enum Syscall {
    FrameBufferInit,
    FrameBufferClose,
    BtStartDeviceDiscovery,
    BtGetNewDevice,
    BtStartServiceDiscovery,
    BtGetNextServiceSize,
    BtGetNewService,
    BtCancelDiscovery,
    Accept,
    LocationStart,
    LocationStop,
    GetSystemProperty,
    PlatformRequest,
    WriteLog,
    ShowVirtualKeyboard,
    TextBox,
    WidgetCreate,
    WidgetDestroy,
    WidgetOpen,
    WidgetClose,
    WidgetLoadHtml,
    WidgetLoadUrl,
    WidgetEvaluateScript,
    WidgetGetCommandSize,
    WidgetGetCommand,
}

#[derive(Debug, Serialize)]
pub struct SyscallDescriptor {
    pub syscall: Syscall,
    /// Name the runtime knows the syscall by.
    pub name: &'static str,
    /// Host method the call is forwarded to.
    pub method: &'static str,
    pub args: &'static [ArgKind],
    pub ret: RetKind,
    pub signature: &'static str,
}

impl SyscallDescriptor {
    /// Signature string derived from `args` and `ret`.
    pub fn derived_signature(&self) -> String {
        let mut sig = String::from("(");
        for arg in self.args {
            sig.push_str(arg.signature_code());
        }
        sig.push(')');
        sig.push_str(self.ret.signature_code());
        sig
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

macro_rules! descriptors {
    ($( $id:ident => $name:literal, $method:literal, [$($arg:ident),*], $ret:ident, $sig:expr; )*) => {
        pub static DESCRIPTORS: [SyscallDescriptor; Syscall::COUNT] = [
            $(SyscallDescriptor {
                syscall: Syscall::$id,
                name: $name,
                method: $method,
                args: &[$(ArgKind::$arg),*],
                ret: RetKind::$ret,
                signature: $sig,
            },)*
        ];
    };
}

descriptors! {
    FrameBufferInit => "maFrameBufferInit", "_enableFramebuffer", [Ptr], Void, "(I)V";
    FrameBufferClose => "maFrameBufferClose", "_disableFramebuffer", [], Void, "()V";
    BtStartDeviceDiscovery => "maBtStartDeviceDiscovery", "maBtStartDeviceDiscovery", [Int], Int, "(I)I";
    BtGetNewDevice => "maBtGetNewDevice", "maBtGetNewDevice", [Ptr, Int, Ptr, Ptr], Int, "(IIII)I";
    BtStartServiceDiscovery => "maBtStartServiceDiscovery", "maBtStartServiceDiscovery", [BtAddr, Uuid], Int,
        "(Ljava/lang/String;Ljava/lang/String;)I";
    BtGetNextServiceSize => "maBtGetNextServiceSize", "maBtGetNextServiceSize", [Ptr, Ptr], Int, "(II)I";
    BtGetNewService => "maBtGetNewService", "maBtGetNewService", [Ptr, Ptr, Int, Ptr], Int, "(IIII)I";
    BtCancelDiscovery => "maBtCancelDiscovery", "maBtCancelDiscovery", [], Int, "()I";
    Accept => "maAccept", "maAccept", [Int], Int, "(I)I";
    LocationStart => "maLocationStart", "maLocationStart", [], Int, "()I";
    LocationStop => "maLocationStop", "maLocationStop", [], Int, "()I";
    GetSystemProperty => "maGetSystemProperty", "maGetSystemProperty", [CStr, Ptr, Int], Int,
        "(Ljava/lang/String;II)I";
    PlatformRequest => "maPlatformRequest", "maPlatformRequest", [CStr], Int, "(Ljava/lang/String;)I";
    WriteLog => "maWriteLog", "maWriteLog", [CStr, Int], Int, "(Ljava/lang/String;I)I";
    ShowVirtualKeyboard => "maShowVirtualKeyboard", "maShowVirtualKeyboard", [], Int, "()I";
    TextBox => "maTextBox", "maTextBox", [WStr, WStr, Ptr, Int, Int], Int,
        "(Ljava/lang/String;Ljava/lang/String;III)I";
    WidgetCreate => "maWidgetCreate", "maWidgetCreate", [Int], Int, "(I)I";
    WidgetDestroy => "maWidgetDestroy", "maWidgetDestroy", [Int], Int, "(I)I";
    WidgetOpen => "maWidgetOpen", "maWidgetOpen", [Int, Int], Int, "(II)I";
    WidgetClose => "maWidgetClose", "maWidgetClose", [Int], Int, "(I)I";
    WidgetLoadHtml => "maWidgetLoadHTML", "maWidgetLoadHTML", [Int, CStr], Int, "(ILjava/lang/String;)I";
    WidgetLoadUrl => "maWidgetLoadURL", "maWidgetLoadURL", [Int, CStr], Int, "(ILjava/lang/String;)I";
    WidgetEvaluateScript => "maWidgetEvaluateScript", "maWidgetEvaluateScript", [Int, CStr], Int,
        "(ILjava/lang/String;)I";
    WidgetGetCommandSize => "maWidgetGetCommandSize", "maWidgetGetCommandSize", [Int], Int, "(I)I";
    WidgetGetCommand => "maWidgetGetCommand", "maWidgetGetCommand", [Int, Ptr, Int], Int, "(III)I";
}

impl Syscall {
    pub fn descriptor(self) -> &'static SyscallDescriptor {
        &DESCRIPTORS[self as usize]
    }

    /// Look a syscall up by its runtime name (`maAccept`, `maTextBox`, ...).
    pub fn from_name(name: &str) -> Option<Syscall> {
        DESCRIPTORS.iter().find(|d| d.name == name).map(|d| d.syscall)
    }

    pub fn all() -> impl Iterator<Item = Syscall> {
        Syscall::iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn table_is_indexed_by_syscall() {
        for (i, sc) in Syscall::all().enumerate() {
            assert_eq!(DESCRIPTORS[i].syscall, sc);
            assert_eq!(sc.descriptor().syscall, sc);
        }
    }

    #[test]
    fn signatures_match_argument_kinds() {
        for d in DESCRIPTORS.iter() {
            assert_eq!(d.derived_signature(), d.signature, "{}", d.name);
        }
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        for d in DESCRIPTORS.iter() {
            assert_eq!(Syscall::from_name(d.name), Some(d.syscall));
        }
        assert_eq!(Syscall::from_name("maNoSuchCall"), None);
    }

    #[test]
    fn framebuffer_methods_are_void() {
        assert_eq!(Syscall::FrameBufferInit.descriptor().method, "_enableFramebuffer");
        assert_eq!(Syscall::FrameBufferClose.descriptor().ret, RetKind::Void);
        assert_eq!(ArgKind::Uuid.signature_code(), "Ljava/lang/String;");
    }

    #[test]
    fn table_lists_by_runtime_name() {
        let listed = serde_json::to_value(&DESCRIPTORS[..]).unwrap();
        let accept = &listed[Syscall::Accept as usize];
        assert_eq!(accept["syscall"], "Accept");
        assert_eq!(accept["name"], "maAccept");
        assert_eq!(accept["args"], serde_json::json!(["Int"]));
        assert_eq!(accept["signature"], "(I)I");
    }
}
