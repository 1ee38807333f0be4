use std::fmt::Write;

use super::delegates::write_params;
use super::EmitContext;
use crate::error::Result;
use crate::resolve::ResolveMode;

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    if ctx.view.commands.is_empty() {
        return Ok(());
    }
    if let Some(link_name) = &ctx.config.link_name {
        writeln!(out, "#[link(name = \"{}\")]", link_name)?;
    }
    writeln!(out, "extern \"system\" {{")?;
    for (i, c) in ctx.view.commands.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let ret = ctx
            .resolver
            .resolve_declaration(&c.proto, ResolveMode::Declared)?;
        let ret = if ret.is_unit() {
            String::new()
        } else {
            format!(" -> {}", ret)
        };
        if let Some(target) = &c.alias_of {
            writeln!(out, "    /// Alias of `{}`.", target)?;
        }
        if c.params.is_empty() {
            writeln!(out, "    pub fn {}(){};", c.name, ret)?;
            continue;
        }
        writeln!(out, "    pub fn {}(", c.name)?;
        write_params(ctx, &c.name, &c.params, ResolveMode::Declared, "        ", out)?;
        writeln!(out, "    ){};", ret)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}
