//! Rust source emitters, one output unit per category.

use std::fmt::Write;

use log::debug;

use crate::config::GeneratorConfig;
use crate::constants::ConstantNormalizer;
use crate::error::Result;
use crate::layout::Planner;
use crate::names::{self, NameTable};
use crate::resolve::Resolver;
use crate::view::{AliasKind, VersionView};

mod commands;
mod constants;
mod delegates;
mod enums;
mod handles;
mod structs;
mod unions;

/// Everything an emitter reads.
pub struct EmitContext<'a> {
    pub view: &'a VersionView,
    pub config: &'a GeneratorConfig,
    pub resolver: Resolver<'a>,
    pub planner: Planner<'a>,
    pub constants: ConstantNormalizer<'a>,
}

impl<'a> EmitContext<'a> {
    pub fn new(view: &'a VersionView, config: &'a GeneratorConfig) -> EmitContext<'a> {
        EmitContext {
            view,
            config,
            resolver: Resolver::new(view, &config.external_types),
            planner: Planner::new(view, config),
            constants: ConstantNormalizer::new(&view.constants),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Constants,
    Delegates,
    Enums,
    Unions,
    Structs,
    Handles,
    Commands,
}

impl Category {
    /// Emission order.
    pub const ALL: [Category; 7] = [
        Category::Constants,
        Category::Delegates,
        Category::Enums,
        Category::Unions,
        Category::Structs,
        Category::Handles,
        Category::Commands,
    ];

    pub fn module_name(self) -> &'static str {
        match self {
            Category::Constants => "constants",
            Category::Delegates => "delegates",
            Category::Enums => "enums",
            Category::Unions => "unions",
            Category::Structs => "structs",
            Category::Handles => "handles",
            Category::Commands => "commands",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.rs", self.module_name())
    }

    /// Renders this category into a complete source file.
    pub fn emit(self, ctx: &EmitContext<'_>) -> Result<String> {
        let mut out = String::new();
        write_header(&mut out, ctx.view)?;
        match self {
            Category::Constants => constants::emit(ctx, &mut out)?,
            Category::Delegates => delegates::emit(ctx, &mut out)?,
            Category::Enums => enums::emit(ctx, &mut out)?,
            Category::Unions => unions::emit(ctx, &mut out)?,
            Category::Structs => structs::emit(ctx, &mut out)?,
            Category::Handles => handles::emit(ctx, &mut out)?,
            Category::Commands => commands::emit(ctx, &mut out)?,
        }
        Ok(out)
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    pub file_name: String,
    pub text: String,
}

fn write_banner(out: &mut String, view: &VersionView) -> std::fmt::Result {
    writeln!(
        out,
        "// Generated by vk-bindgen from the Vulkan API registry ({}, api `{}`). Do not edit.",
        view.name, view.api
    )
}

fn write_header(out: &mut String, view: &VersionView) -> std::fmt::Result {
    write_banner(out, view)?;
    writeln!(out)?;
    writeln!(
        out,
        "#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals, dead_code, unused_imports, clippy::all)]"
    )?;
    writeln!(out)?;
    writeln!(out, "use super::*;")?;
    writeln!(out, "use core::ffi::{{c_char, c_int, c_void}};")?;
    writeln!(out)
}

/// Claims every emitted type and value name, so that no two units define
/// the same item.
pub fn check_namespaces(ctx: &EmitContext<'_>) -> Result<()> {
    let view = ctx.view;
    let mut types = NameTable::new("type namespace");
    let mut values = NameTable::new("value namespace");

    for c in view.constants.iter() {
        values.claim(&names::sanitize(&c.name), &format!("constant {}", c.name))?;
    }
    for c in view.commands.iter() {
        values.claim(&c.name, &format!("command {}", c.name))?;
    }

    for fp in view.func_pointers.iter() {
        types.claim(&names::type_name(&fp.name), &format!("function pointer {}", fp.name))?;
    }
    for e in view.enums.iter() {
        types.claim(&names::enum_type_name(&e.name), &format!("enum {}", e.name))?;
    }
    for s in view.unions.iter().chain(view.structs.iter()) {
        types.claim(&names::type_name(&s.name), &format!("struct {}", s.name))?;
    }
    for h in view.handles.iter() {
        types.claim(&names::type_name(&h.name), &format!("handle {}", h.name))?;
    }
    for name in view.opaque_types.iter() {
        types.claim(&names::type_name(name), &format!("opaque type {}", name))?;
    }
    for name in ctx.resolver.unmapped_externals() {
        types.claim(&names::type_name(name), &format!("external type {}", name))?;
    }
    for alias in view.aliases.iter() {
        let (output, identity) = alias_names(alias.kind, &alias.name, &alias.target);
        types.claim(&output, &identity)?;
    }
    Ok(())
}

/// Output name of an alias and the identity it is claimed under.
///
/// Two aliases spelled the same after sanitizing are one item when they
/// name the same target.
pub(crate) fn alias_names(kind: AliasKind, name: &str, target: &str) -> (String, String) {
    match kind {
        AliasKind::Enum => (
            names::enum_type_name(name),
            format!("alias of {}", names::enum_type_name(target)),
        ),
        _ => (
            names::type_name(name),
            format!("alias of {}", names::type_name(target)),
        ),
    }
}

/// Renders every category in order, plus the module index when configured.
pub fn emit_all(ctx: &EmitContext<'_>) -> Result<Vec<OutputUnit>> {
    check_namespaces(ctx)?;
    let mut units = Vec::with_capacity(Category::ALL.len() + 1);
    for category in Category::ALL.iter() {
        let text = category.emit(ctx)?;
        debug!("emitted {} ({} bytes)", category.file_name(), text.len());
        units.push(OutputUnit {
            file_name: category.file_name(),
            text,
        });
    }
    if ctx.config.module_index {
        units.push(OutputUnit {
            file_name: String::from("mod.rs"),
            text: module_index(ctx.view)?,
        });
    }
    Ok(units)
}

fn module_index(view: &VersionView) -> Result<String> {
    let mut out = String::new();
    write_banner(&mut out, view)?;
    writeln!(out)?;
    for category in Category::ALL.iter() {
        writeln!(out, "mod {};", category.module_name())?;
    }
    writeln!(out)?;
    for category in Category::ALL.iter() {
        writeln!(out, "pub use self::{}::*;", category.module_name())?;
    }
    Ok(out)
}

/// `pub type Alias = Target;` lines for aliases of one kind.
fn emit_aliases(ctx: &EmitContext<'_>, kind: AliasKind, out: &mut String) -> Result<()> {
    let mut table = NameTable::new(&format!("{:?} aliases", kind));
    for alias in ctx.view.aliases.iter().filter(|a| a.kind == kind) {
        let (output, identity) = alias_names(kind, &alias.name, &alias.target);
        if !table.claim(&output, &identity)? {
            continue;
        }
        let target = match kind {
            AliasKind::Enum => names::enum_type_name(&alias.target),
            _ => names::type_name(&alias.target),
        };
        writeln!(out, "pub type {} = {};", output, target)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::view::test_support::view_with;

    /// Renders one unit of a registry given as XML.
    pub fn render(xml: &str, config: &GeneratorConfig, category: Category) -> Result<String> {
        let view = view_with(xml, config)?;
        let ctx = EmitContext::new(&view, config);
        check_namespaces(&ctx)?;
        category.emit(&ctx)
    }
}
