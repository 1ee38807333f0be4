use std::fmt::Write;

use super::structs::write_fields;
use super::{emit_aliases, EmitContext};
use crate::error::Result;
use crate::names;
use crate::view::AliasKind;

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    for u in ctx.view.unions.iter() {
        let plan = ctx.planner.plan_union(u)?;
        let name = names::type_name(&u.name);
        writeln!(out, "#[repr(C)]")?;
        writeln!(out, "#[derive(Copy, Clone)]")?;
        writeln!(out, "pub union {} {{", name)?;
        write_fields(ctx, &plan, out)?;
        writeln!(out, "}}")?;
        writeln!(out, "impl Default for {} {{", name)?;
        writeln!(out, "    fn default() -> Self {{")?;
        writeln!(out, "        unsafe {{ ::core::mem::zeroed() }}")?;
        writeln!(out, "    }}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
    }
    emit_aliases(ctx, AliasKind::Union, out)
}
