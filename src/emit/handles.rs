use std::fmt::Write;

use super::{emit_aliases, EmitContext};
use crate::error::Result;
use crate::names;
use crate::view::AliasKind;

const PRELUDE: &str = r#"macro_rules! vk_handle_common {
    ($name:ident, $raw:ty) => {
        impl $name {
            #[inline]
            pub const fn from_raw(raw: $raw) -> Self {
                Self(raw)
            }
            #[inline]
            pub const fn as_raw(self) -> $raw {
                self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self::NULL
            }
        }
        impl From<$raw> for $name {
            fn from(raw: $raw) -> Self {
                Self(raw)
            }
        }
        impl PartialEq<$raw> for $name {
            fn eq(&self, other: &$raw) -> bool {
                self.0 == *other
            }
        }
        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0 as usize)
            }
        }
    };
}

macro_rules! dispatchable_handle {
    ($name:ident) => {
        #[repr(transparent)]
        #[derive(Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(*mut c_void);
        impl $name {
            pub const NULL: Self = Self(::core::ptr::null_mut());
            #[inline]
            pub fn is_null(self) -> bool {
                self.0.is_null()
            }
        }
        vk_handle_common!($name, *mut c_void);
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}
    };
}

macro_rules! non_dispatchable_handle {
    ($name:ident) => {
        #[repr(transparent)]
        #[derive(Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(u64);
        impl $name {
            pub const NULL: Self = Self(0);
            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }
        vk_handle_common!($name, u64);
    };
}
"#;

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    out.push_str(PRELUDE);
    writeln!(out)?;
    for h in ctx.view.handles.iter() {
        let name = names::type_name(&h.name);
        if h.dispatchable {
            writeln!(out, "dispatchable_handle!({});", name)?;
        } else {
            writeln!(out, "non_dispatchable_handle!({});", name)?;
        }
    }
    writeln!(out)?;
    emit_aliases(ctx, AliasKind::Handle, out)
}
