use std::fmt::Write;

use super::{emit_aliases, EmitContext};
use crate::error::Result;
use crate::layout::{FieldPlan, LayoutKind, LayoutPlan};
use crate::names::{self, NameTable};
use crate::resolve::{Primitive, ResolveMode, TargetType};
use crate::view::AliasKind;

/// Rust type of one planned field, array dimensions included.
fn field_type(ctx: &EmitContext<'_>, field: &FieldPlan<'_>) -> Result<TargetType> {
    let member = field.member;
    let element = if member.definition.bitfield_size.is_some() {
        // a bit-field keeps its declared type only when it fills it
        if ctx.planner.size_of(member.type_name(), 0)? == field.element_size {
            ctx.resolver
                .resolve_declaration(&member.definition, ResolveMode::Declared)?
        } else if field.element_size == 1 {
            TargetType::Primitive(Primitive::Uint8)
        } else {
            TargetType::Array {
                element: Box::new(TargetType::Primitive(Primitive::Uint8)),
                len: field.element_size,
            }
        }
    } else {
        ctx.resolver
            .resolve_declaration(&member.definition, ResolveMode::Declared)?
    };
    Ok(field.dims.iter().rev().fold(element, |ty, &len| TargetType::Array {
        element: Box::new(ty),
        len,
    }))
}

/// Writes the `pub name: Type,` lines of a struct or union body.
pub(super) fn write_fields(ctx: &EmitContext<'_>, plan: &LayoutPlan<'_>, out: &mut String) -> Result<()> {
    let mut table = NameTable::new(&plan.name);
    for field in plan.fields.iter() {
        let name = names::field_name(field.member.name());
        table.claim(&name, field.member.name())?;
        writeln!(out, "    pub {}: {},", name, field_type(ctx, field)?)?;
    }
    Ok(())
}

fn write_default(name: &str, out: &mut String) -> Result<()> {
    writeln!(out, "impl Default for {} {{", name)?;
    writeln!(out, "    fn default() -> Self {{")?;
    writeln!(out, "        unsafe {{ ::core::mem::zeroed() }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    Ok(())
}

fn write_layout_checks(name: &str, plan: &LayoutPlan<'_>, out: &mut String) -> Result<()> {
    writeln!(out, "const _: () = {{")?;
    for field in plan.fields.iter() {
        if let Some(offset) = field.offset {
            writeln!(
                out,
                "    assert!(::core::mem::offset_of!({}, {}) == {});",
                name,
                names::field_name(field.member.name()),
                offset
            )?;
        }
    }
    writeln!(
        out,
        "    assert!(::core::mem::size_of::<{}>() == {});",
        name, plan.size
    )?;
    writeln!(
        out,
        "    assert!(::core::mem::align_of::<{}>() == {});",
        name, plan.align
    )?;
    writeln!(out, "}};")?;
    Ok(())
}

fn write_opaque(name: &str, out: &mut String) -> Result<()> {
    writeln!(out, "#[repr(C)]")?;
    writeln!(out, "pub struct {} {{", names::type_name(name))?;
    writeln!(out, "    _private: [u8; 0],")?;
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    for name in ctx.view.opaque_types.iter() {
        write_opaque(name, out)?;
    }
    for name in ctx.resolver.unmapped_externals() {
        write_opaque(name, out)?;
    }

    for s in ctx.view.structs.iter() {
        let plan = ctx.planner.plan_struct(s)?;
        let name = names::type_name(&s.name);
        if plan.packed {
            writeln!(out, "#[repr(C, packed)]")?;
        } else {
            writeln!(out, "#[repr(C)]")?;
        }
        writeln!(out, "#[derive(Copy, Clone)]")?;
        writeln!(out, "pub struct {} {{", name)?;
        write_fields(ctx, &plan, out)?;
        writeln!(out, "}}")?;
        write_default(&name, out)?;
        if plan.kind == LayoutKind::Explicit {
            write_layout_checks(&name, &plan, out)?;
        }
        writeln!(out)?;
    }
    emit_aliases(ctx, AliasKind::Struct, out)
}

#[cfg(test)]
mod test {
    use crate::config::{GeneratorConfig, MemberOffset};
    use crate::emit::test_support::render;
    use crate::emit::Category;
    use crate::error::GenError;

    const REGISTRY: &str = r#"<registry>
        <types>
            <type requires="vk_platform" name="void"/>
            <type requires="vk_platform" name="char"/>
            <type requires="vk_platform" name="float"/>
            <type requires="vk_platform" name="uint8_t"/>
            <type requires="vk_platform" name="uint32_t"/>
            <type requires="vk_platform" name="uint64_t"/>
            <type requires="X11/Xlib.h" name="Display"/>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
            <type category="basetype">struct <name>ANativeWindow</name>;</type>
            <type name="VkStructureType" category="enum"/>
            <type name="VkGeometryInstanceFlagBitsKHR" category="enum"/>
            <type requires="VkGeometryInstanceFlagBitsKHR" category="bitmask">typedef <type>VkFlags</type> <name>VkGeometryInstanceFlagsKHR</name>;</type>
            <type category="struct" name="VkExtent2D">
                <member><type>uint32_t</type> <name>width</name></member>
                <member><type>uint32_t</type> <name>height</name></member>
            </type>
            <type category="struct" name="VkInfo">
                <member values="VK_STRUCTURE_TYPE_INFO"><type>VkStructureType</type> <name>sType</name></member>
                <member>const <type>void</type>* <name>pNext</name></member>
                <member><type>char</type> <name>deviceName</name>[<enum>VK_MAX_NAME_SIZE</enum>]</member>
                <member><type>VkExtent2D</type> <name>extent</name></member>
                <member><type>Display</type>* <name>dpy</name></member>
                <member><type>ANativeWindow</type>* <name>window</name></member>
                <member>const <type>char</type>* const* <name>ppEnabledLayerNames</name></member>
                <member><type>uint32_t</type> <name>type</name></member>
            </type>
            <type category="struct" name="VkTransformMatrixKHR">
                <member><type>float</type> <name>matrix</name>[3][4]</member>
            </type>
            <type category="struct" name="VkAccelerationStructureInstanceKHR">
                <member><type>VkTransformMatrixKHR</type> <name>transform</name></member>
                <member><type>uint32_t</type> <name>instanceCustomIndex</name>:24</member>
                <member><type>uint32_t</type> <name>mask</name>:8</member>
                <member><type>uint32_t</type> <name>instanceShaderBindingTableRecordOffset</name>:24</member>
                <member><type>VkGeometryInstanceFlagsKHR</type> <name>flags</name>:8</member>
                <member><type>uint64_t</type> <name>accelerationStructureReference</name></member>
            </type>
            <type category="struct" name="T">
                <member><type>uint8_t</type> <name>a</name></member>
                <member><type>uint32_t</type> <name>b</name></member>
            </type>
            <type category="struct" name="VkExtent2DKHR" alias="VkExtent2D"/>
        </types>
        <enums name="API Constants" type="constants">
            <enum type="uint32_t" value="256" name="VK_MAX_NAME_SIZE"/>
        </enums>
        <enums name="VkStructureType" type="enum">
            <enum value="0" name="VK_STRUCTURE_TYPE_INFO"/>
        </enums>
        <enums name="VkGeometryInstanceFlagBitsKHR" type="bitmask">
            <enum bitpos="0" name="VK_GEOMETRY_INSTANCE_TRIANGLE_FACING_CULL_DISABLE_BIT_KHR"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require>
                <type name="VkInfo"/>
                <type name="VkExtent2DKHR"/>
                <type name="VkAccelerationStructureInstanceKHR"/>
                <type name="T"/>
            </require>
        </feature>
    </registry>"#;

    #[test]
    fn test_sequential() {
        let text = render(REGISTRY, &GeneratorConfig::default(), Category::Structs).unwrap();
        let extent = concat!(
            "#[repr(C)]\n",
            "#[derive(Copy, Clone)]\n",
            "pub struct VkExtent2D {\n",
            "    pub width: u32,\n",
            "    pub height: u32,\n",
            "}\n",
            "impl Default for VkExtent2D {\n",
            "    fn default() -> Self {\n",
            "        unsafe { ::core::mem::zeroed() }\n",
            "    }\n",
            "}\n",
        );
        assert!(text.contains(extent), "{}", text);
        for line in &[
            "    pub s_type: VkStructureType,",
            "    pub p_next: *const c_void,",
            "    pub device_name: [c_char; 256],",
            "    pub extent: VkExtent2D,",
            "    pub dpy: *mut Display,",
            "    pub window: *mut ANativeWindow,",
            "    pub pp_enabled_layer_names: *const *const c_char,",
            "    pub type_: u32,",
            "pub type VkExtent2DKHR = VkExtent2D;",
            "pub struct ANativeWindow {\n    _private: [u8; 0],\n}",
            "pub struct Display {\n    _private: [u8; 0],\n}",
        ] {
            assert!(text.contains(line), "missing `{}` in\n{}", line, text);
        }
        assert!(!text.contains("const _: () = {\n    assert!(::core::mem::offset_of!(VkExtent2D"));
    }

    #[test]
    fn test_bitfields() {
        let text = render(REGISTRY, &GeneratorConfig::default(), Category::Structs).unwrap();
        let instance = concat!(
            "#[repr(C)]\n",
            "#[derive(Copy, Clone)]\n",
            "pub struct VkAccelerationStructureInstanceKHR {\n",
            "    pub transform: VkTransformMatrixKHR,\n",
            "    pub instance_custom_index: [u8; 3],\n",
            "    pub mask: u8,\n",
            "    pub instance_shader_binding_table_record_offset: [u8; 3],\n",
            "    pub flags: u8,\n",
            "    pub acceleration_structure_reference: u64,\n",
            "}\n",
        );
        assert!(text.contains(instance), "{}", text);
        assert!(text.contains(
            "    assert!(::core::mem::offset_of!(VkAccelerationStructureInstanceKHR, flags) == 55);"
        ));
        assert!(text.contains(
            "    assert!(::core::mem::size_of::<VkAccelerationStructureInstanceKHR>() == 64);"
        ));
        assert!(text.contains(
            "    assert!(::core::mem::align_of::<VkAccelerationStructureInstanceKHR>() == 8);"
        ));
        assert!(text.contains("    pub matrix: [[f32; 4]; 3],"));
    }

    #[test]
    fn test_member_offsets() {
        let mut config = GeneratorConfig::default();
        config.member_offsets.push(MemberOffset {
            structure: String::from("T"),
            member: String::from("b"),
            offset: 1,
        });
        let text = render(REGISTRY, &config, Category::Structs).unwrap();
        let t = concat!(
            "#[repr(C, packed)]\n",
            "#[derive(Copy, Clone)]\n",
            "pub struct T {\n",
            "    pub a: u8,\n",
            "    pub b: u32,\n",
            "}\n",
        );
        assert!(text.contains(t), "{}", text);
        assert!(text.contains("    assert!(::core::mem::offset_of!(T, b) == 1);"));
        assert!(text.contains("    assert!(::core::mem::size_of::<T>() == 5);"));
        assert!(text.contains("    assert!(::core::mem::align_of::<T>() == 1);"));

        config.member_offsets[0].offset = 4;
        match render(REGISTRY, &config, Category::Structs) {
            Err(GenError::LayoutMismatch {
                declared, computed, ..
            }) => assert_eq!((declared, computed), (4, 1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_video_header_types() {
        let xml = r#"<registry>
            <types>
                <type requires="vk_platform" name="void"/>
                <type requires="vk_platform" name="uint32_t"/>
                <type name="vk_video/vulkan_video_codec_h264std.h" category="include">#include "vk_video/vulkan_video_codec_h264std.h"</type>
                <type requires="vk_video/vulkan_video_codec_h264std.h" name="StdVideoH264ProfileIdc"/>
                <type requires="vk_video/vulkan_video_codec_h264std.h" name="StdVideoH264SequenceParameterSet"/>
                <type name="VkStructureType" category="enum"/>
                <type category="struct" name="VkVideoDecodeH264ProfileInfoKHR">
                    <member values="VK_STRUCTURE_TYPE_VIDEO_DECODE_H264_PROFILE_INFO_KHR"><type>VkStructureType</type> <name>sType</name></member>
                    <member optional="true">const <type>void</type>* <name>pNext</name></member>
                    <member><type>StdVideoH264ProfileIdc</type> <name>stdProfileIdc</name></member>
                    <member><type>uint32_t</type> <name>pictureLayout</name></member>
                </type>
                <type category="struct" name="VkVideoDecodeH264SessionParametersAddInfoKHR">
                    <member><type>uint32_t</type> <name>stdSPSCount</name></member>
                    <member len="stdSPSCount">const <type>StdVideoH264SequenceParameterSet</type>* <name>pStdSets</name></member>
                </type>
            </types>
            <enums name="VkStructureType" type="enum">
                <enum value="0" name="VK_STRUCTURE_TYPE_APPLICATION_INFO"/>
            </enums>
            <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
                <require><type name="VkStructureType"/></require>
            </feature>
            <extensions>
                <extension name="VK_KHR_video_decode_h264" number="41" type="device" supported="vulkan">
                    <require>
                        <enum offset="0" extends="VkStructureType" name="VK_STRUCTURE_TYPE_VIDEO_DECODE_H264_PROFILE_INFO_KHR"/>
                        <type name="VkVideoDecodeH264ProfileInfoKHR"/>
                        <type name="VkVideoDecodeH264SessionParametersAddInfoKHR"/>
                    </require>
                </extension>
            </extensions>
        </registry>"#;
        let text = render(xml, &GeneratorConfig::default(), Category::Structs).unwrap();
        assert!(text.contains("    pub std_profile_idc: StdVideoH264ProfileIdc,"), "{}", text);
        assert!(text.contains("    pub p_std_sets: *const StdVideoH264SequenceParameterSet,"));
        assert!(text.contains("pub struct StdVideoH264SequenceParameterSet {\n    _private: [u8; 0],\n}"));
        assert!(!text.contains("pub struct StdVideoH264ProfileIdc {"));

        let enums = render(xml, &GeneratorConfig::default(), Category::Enums).unwrap();
        assert!(enums.contains(concat!(
            "pub struct StdVideoH264ProfileIdc(pub(crate) i32);\n",
            "vk_enum!(StdVideoH264ProfileIdc, i32);\n"
        )));
    }

    #[test]
    fn test_by_value_external() {
        let xml = REGISTRY.replace(
            "<type>Display</type>* <name>dpy</name>",
            "<type>Display</type> <name>dpy</name>",
        );
        match render(&xml, &GeneratorConfig::default(), Category::Structs) {
            Err(GenError::UnresolvedType { name, .. }) => assert_eq!(name, "Display"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
