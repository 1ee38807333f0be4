use std::fmt::Write;

use super::EmitContext;
use crate::error::Result;
use crate::names::{self, NameTable};
use crate::resolve::ResolveMode;
use crate::types::NameWithType;

/// Writes `name: Type` pairs of a parameter list, one per line.
pub(super) fn write_params(
    ctx: &EmitContext<'_>,
    owner: &str,
    params: &[NameWithType],
    mode: ResolveMode,
    indent: &str,
    out: &mut String,
) -> Result<()> {
    let mut table = NameTable::new(owner);
    for param in params {
        let name = names::field_name(&param.name);
        table.claim(&name, &param.name)?;
        let ty = ctx.resolver.resolve_param(param, mode)?;
        writeln!(out, "{}{}: {},", indent, name, ty)?;
    }
    Ok(())
}

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    for fp in ctx.view.func_pointers.iter() {
        let name = names::type_name(&fp.name);
        let ret = ctx
            .resolver
            .resolve_declaration(&fp.proto, ResolveMode::Collapsed)?;
        let ret = if ret.is_unit() {
            String::new()
        } else {
            format!(" -> {}", ret)
        };

        if fp.params.is_empty() {
            writeln!(
                out,
                "pub type {} = Option<unsafe extern \"system\" fn(){}>;",
                name, ret
            )?;
            continue;
        }
        writeln!(out, "pub type {} = Option<", name)?;
        writeln!(out, "    unsafe extern \"system\" fn(")?;
        write_params(ctx, &fp.name, &fp.params, ResolveMode::Collapsed, "        ", out)?;
        writeln!(out, "    ){},", ret)?;
        writeln!(out, ">;")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::config::GeneratorConfig;
    use crate::emit::test_support::render;
    use crate::emit::Category;

    const REGISTRY: &str = r#"<registry>
        <types>
            <type requires="vk_platform" name="void"/>
            <type requires="vk_platform" name="char"/>
            <type requires="vk_platform" name="uint32_t"/>
            <type requires="vk_platform" name="uint64_t"/>
            <type requires="vk_platform" name="size_t"/>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkBool32</name>;</type>
            <type requires="VkDebugReportFlagBitsEXT" category="bitmask">typedef <type>VkFlags</type> <name>VkDebugReportFlagsEXT</name>;</type>
            <type name="VkDebugReportFlagBitsEXT" category="enum"/>
            <type name="VkSystemAllocationScope" category="enum"/>
            <type category="funcpointer">typedef void (VKAPI_PTR *<name>PFN_vkVoidFunction</name>)(void);</type>
            <type category="funcpointer" requires="VkSystemAllocationScope">typedef void* (VKAPI_PTR *<name>PFN_vkAllocationFunction</name>)(
                <type>void</type>*                                       pUserData,
                <type>size_t</type>                                      size,
                <type>size_t</type>                                      alignment,
                <type>VkSystemAllocationScope</type>                     allocationScope);</type>
            <type category="funcpointer">typedef <type>VkBool32</type> (VKAPI_PTR *<name>PFN_vkDebugReportCallbackEXT</name>)(
                <type>VkDebugReportFlagsEXT</type>                       flags,
                <type>uint64_t</type>                                    object,
                const <type>char</type>*                                 pMessage,
                <type>void</type>*                                       pUserData);</type>
        </types>
        <enums name="VkSystemAllocationScope" type="enum">
            <enum value="0" name="VK_SYSTEM_ALLOCATION_SCOPE_COMMAND"/>
        </enums>
        <enums name="VkDebugReportFlagBitsEXT" type="bitmask">
            <enum bitpos="0" name="VK_DEBUG_REPORT_INFORMATION_BIT_EXT"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require>
                <type name="PFN_vkVoidFunction"/>
                <type name="PFN_vkAllocationFunction"/>
                <type name="PFN_vkDebugReportCallbackEXT"/>
            </require>
        </feature>
    </registry>"#;

    #[test]
    fn test_delegates() {
        let text = render(REGISTRY, &GeneratorConfig::default(), Category::Delegates).unwrap();
        assert!(text.contains("pub type PFN_vkVoidFunction = Option<unsafe extern \"system\" fn()>;"));
        let allocation = concat!(
            "pub type PFN_vkAllocationFunction = Option<\n",
            "    unsafe extern \"system\" fn(\n",
            "        p_user_data: *mut c_void,\n",
            "        size: usize,\n",
            "        alignment: usize,\n",
            "        allocation_scope: VkSystemAllocationScope,\n",
            "    ) -> *mut c_void,\n",
            ">;\n",
        );
        assert!(text.contains(allocation), "{}", text);
        // flags collapse to their base integer
        assert!(text.contains("        flags: u32,\n"), "{}", text);
        assert!(text.contains("        p_message: *const c_char,\n"));
        assert!(text.contains("    ) -> u32,\n"));
    }
}
