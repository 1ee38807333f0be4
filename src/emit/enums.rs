use std::fmt::Write;

use super::{emit_aliases, EmitContext};
use crate::error::{GenError, Result};
use crate::names::{self, NameTable};
use crate::view::{AliasKind, EnumKind, EnumType, EnumValue};

const PRELUDE: &str = r#"macro_rules! vk_enum {
    ($name:ident, $repr:ty) => {
        impl $name {
            #[inline]
            pub const fn from_raw(raw: $repr) -> Self {
                Self(raw)
            }
            #[inline]
            pub const fn as_raw(self) -> $repr {
                self.0
            }
        }
    };
}

macro_rules! vk_bitflags {
    ($name:ident, $repr:ty) => {
        vk_enum!($name, $repr);
        impl $name {
            #[inline]
            pub const fn empty() -> Self {
                Self(0)
            }
            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }
            #[inline]
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
            #[inline]
            pub const fn intersects(self, other: Self) -> bool {
                self.0 & other.0 != 0
            }
        }
        impl ::core::ops::BitOr for $name {
            type Output = Self;
            #[inline]
            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }
        impl ::core::ops::BitOrAssign for $name {
            #[inline]
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0
            }
        }
        impl ::core::ops::BitAnd for $name {
            type Output = Self;
            #[inline]
            fn bitand(self, rhs: Self) -> Self {
                Self(self.0 & rhs.0)
            }
        }
        impl ::core::ops::BitAndAssign for $name {
            #[inline]
            fn bitand_assign(&mut self, rhs: Self) {
                self.0 &= rhs.0
            }
        }
        impl ::core::ops::BitXor for $name {
            type Output = Self;
            #[inline]
            fn bitxor(self, rhs: Self) -> Self {
                Self(self.0 ^ rhs.0)
            }
        }
        impl ::core::ops::BitXorAssign for $name {
            #[inline]
            fn bitxor_assign(&mut self, rhs: Self) {
                self.0 ^= rhs.0
            }
        }
        impl ::core::ops::Not for $name {
            type Output = Self;
            #[inline]
            fn not(self) -> Self {
                Self(!self.0)
            }
        }
    };
}
"#;

fn repr(e: &EnumType) -> &'static str {
    match (e.kind, e.bitwidth) {
        (EnumKind::Plain, _) => "i32",
        (EnumKind::Bitmask, 64) => "u64",
        (EnumKind::Bitmask, _) => "u32",
    }
}

fn literal(e: &EnumType, v: &EnumValue) -> Result<String> {
    let out_of_range = |repr| GenError::ValueOutOfRange {
        owner: e.name.clone(),
        member: v.name.clone(),
        value: v.value,
        repr,
    };
    match repr(e) {
        "i32" => i32::try_from(v.value)
            .map(|n| n.to_string())
            .map_err(|_| out_of_range("i32")),
        "u32" => u32::try_from(v.value)
            .map(|n| format!("{:#x}", n))
            .map_err(|_| out_of_range("u32")),
        // bit 63 arrives as a negative i64
        _ => Ok(format!("{:#x}", v.value as u64)),
    }
}

fn emit_enum(ctx: &EmitContext<'_>, e: &EnumType, out: &mut String) -> Result<()> {
    let name = names::enum_type_name(&e.name);
    let repr = repr(e);
    writeln!(out, "#[repr(transparent)]")?;
    writeln!(
        out,
        "#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]"
    )?;
    writeln!(out, "pub struct {}(pub(crate) {});", name, repr)?;
    match e.kind {
        EnumKind::Plain => writeln!(out, "vk_enum!({}, {});", name, repr)?,
        EnumKind::Bitmask => writeln!(out, "vk_bitflags!({}, {});", name, repr)?,
    }

    let mut table = NameTable::new(&e.name);
    let mut body = String::new();
    for v in e.values.iter() {
        let member = names::enum_member_name(&e.source, &v.name, &ctx.view.vendor_tags);
        if !table.claim(&member, &v.name)? {
            continue;
        }
        writeln!(body, "    pub const {}: Self = Self({});", member, literal(e, v)?)?;
    }
    if !body.is_empty() {
        writeln!(out, "impl {} {{", name)?;
        out.push_str(&body);
        writeln!(out, "}}")?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    out.push_str(PRELUDE);
    writeln!(out)?;
    for e in ctx.view.enums.iter() {
        emit_enum(ctx, e, out)?;
    }
    emit_aliases(ctx, AliasKind::Enum, out)
}

#[cfg(test)]
mod test {
    use crate::config::GeneratorConfig;
    use crate::emit::test_support::render;
    use crate::emit::Category;
    use crate::error::GenError;

    const REGISTRY: &str = r#"<registry>
        <tags><tag name="KHR" author="Khronos" contact="-"/></tags>
        <types>
            <type requires="vk_platform" name="uint32_t"/>
            <type requires="vk_platform" name="uint64_t"/>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
            <type category="basetype">typedef <type>uint64_t</type> <name>VkFlags64</name>;</type>
            <type requires="VkCullModeFlagBits" category="bitmask">typedef <type>VkFlags</type> <name>VkCullModeFlags</name>;</type>
            <type requires="E" category="bitmask">typedef <type>VkFlags</type> <name>EFlags</name>;</type>
            <type bitvalues="VkAccessFlagBits2" category="bitmask">typedef <type>VkFlags64</type> <name>VkAccessFlags2</name>;</type>
            <type category="bitmask" name="VkAccessFlags2KHR" alias="VkAccessFlags2"/>
            <type name="VkCullModeFlagBits" category="enum"/>
            <type name="E" category="enum"/>
            <type name="VkAccessFlagBits2" category="enum"/>
            <type name="VkImageType" category="enum"/>
            <type name="VkPresentModeKHR" category="enum"/>
            <type name="VkResult" category="enum"/>
            <type category="struct" name="VkHolder">
                <member><type>VkCullModeFlags</type> <name>cullMode</name></member>
                <member><type>EFlags</type> <name>e</name></member>
                <member><type>VkAccessFlags2KHR</type> <name>access</name></member>
                <member><type>VkImageType</type> <name>imageType</name></member>
                <member><type>VkPresentModeKHR</type> <name>presentMode</name></member>
                <member><type>VkResult</type> <name>result</name></member>
            </type>
        </types>
        <enums name="VkCullModeFlagBits" type="bitmask">
            <enum value="0" name="VK_CULL_MODE_NONE"/>
            <enum bitpos="0" name="VK_CULL_MODE_FRONT_BIT"/>
            <enum bitpos="1" name="VK_CULL_MODE_BACK_BIT"/>
            <enum value="0x00000003" name="VK_CULL_MODE_FRONT_AND_BACK"/>
        </enums>
        <enums name="E" type="bitmask">
            <enum value="1" name="A"/>
        </enums>
        <enums name="VkAccessFlagBits2" type="bitmask" bitwidth="64">
            <enum value="0" name="VK_ACCESS_2_NONE"/>
            <enum bitpos="63" name="VK_ACCESS_2_TOP_BIT"/>
            <enum bitpos="0" name="VK_ACCESS_2_INDIRECT_COMMAND_READ_BIT"/>
        </enums>
        <enums name="VkImageType" type="enum">
            <enum value="0" name="VK_IMAGE_TYPE_1D"/>
            <enum value="1" name="VK_IMAGE_TYPE_2D"/>
        </enums>
        <enums name="VkPresentModeKHR" type="enum">
            <enum value="0" name="VK_PRESENT_MODE_IMMEDIATE_KHR"/>
        </enums>
        <enums name="VkResult" type="enum">
            <enum value="0" name="VK_SUCCESS"/>
            <enum value="-1" name="VK_ERROR_OUT_OF_HOST_MEMORY"/>
            <enum name="VK_ERROR_OOM" alias="VK_ERROR_OUT_OF_HOST_MEMORY"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require><type name="VkHolder"/></require>
        </feature>
    </registry>"#;

    #[test]
    fn test_enums() {
        let text = render(REGISTRY, &GeneratorConfig::default(), Category::Enums).unwrap();
        for line in &[
            "macro_rules! vk_bitflags {",
            "pub struct VkCullModeFlags(pub(crate) u32);",
            "vk_bitflags!(VkCullModeFlags, u32);",
            "    pub const NONE: Self = Self(0x0);",
            "    pub const FRONT_BIT: Self = Self(0x1);",
            "    pub const FRONT_AND_BACK: Self = Self(0x3);",
            "pub struct VkAccessFlags2(pub(crate) u64);",
            "    pub const TOP_BIT: Self = Self(0x8000000000000000);",
            "pub type VkAccessFlags2Khr = VkAccessFlags2;",
            "pub struct VkImageType(pub(crate) i32);",
            "vk_enum!(VkImageType, i32);",
            "    pub const TYPE_1D: Self = Self(0);",
            "    pub const TYPE_2D: Self = Self(1);",
            "pub struct VkPresentModeKhr(pub(crate) i32);",
            "    pub const IMMEDIATE_KHR: Self = Self(0);",
            "    pub const ERROR_OUT_OF_HOST_MEMORY: Self = Self(-1);",
            "    pub const ERROR_OOM: Self = Self(-1);",
        ] {
            assert!(text.contains(line), "missing `{}` in\n{}", line, text);
        }
        assert_eq!(text.matches("pub const NONE: Self = Self(0x0);").count(), 3);
        // exactly one synthetic zero member
        let e = text.split("pub struct EFlags").nth(1).unwrap();
        let e = &e[..e.find("\n}\n").unwrap()];
        assert_eq!(e.matches("Self(0x0)").count(), 1);
        assert!(e.contains("    pub const A: Self = Self(0x1);"));
    }

    #[test]
    fn test_out_of_range() {
        let xml = REGISTRY.replace(
            r#"<enum value="1" name="VK_IMAGE_TYPE_2D"/>"#,
            r#"<enum value="0x80000000" name="VK_IMAGE_TYPE_2D"/>"#,
        );
        match render(&xml, &GeneratorConfig::default(), Category::Enums) {
            Err(GenError::ValueOutOfRange { repr, .. }) => assert_eq!(repr, "i32"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
