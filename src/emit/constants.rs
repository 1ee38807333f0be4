use std::fmt::Write;

use super::EmitContext;
use crate::error::Result;
use crate::names::{self, NameTable};

pub fn emit(ctx: &EmitContext<'_>, out: &mut String) -> Result<()> {
    let mut table = NameTable::new("constants");
    for constant in ctx.view.constants.iter() {
        let name = names::sanitize(&constant.name);
        if !table.claim(&name, &constant.name)? {
            continue;
        }
        // aliases carry the literal of their target
        let resolved = ctx.constants.resolve(&constant.name)?;
        writeln!(
            out,
            "pub const {}: {} = {};",
            name,
            resolved.rust_type,
            resolved.rust_literal()
        )?;
    }
    Ok(())
}
