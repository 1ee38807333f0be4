//! Member selection and byte layout of structs and unions.

use std::cell::RefCell;
use std::collections::HashSet;

use log::debug;

use crate::config::GeneratorConfig;
use crate::constants::ConstantNormalizer;
use crate::error::{GenError, Result};
use crate::resolve::Primitive;
use crate::types::{api_matches, ArrayLength, Member};
use crate::view::{StructType, VersionView, ViewType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// `#[repr(C)]`, offsets left to the compiler.
    Sequential,
    /// Every offset computed; `#[repr(C)]` when those offsets are naturally
    /// aligned, `#[repr(C, packed)]` otherwise.
    Explicit,
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan<'v> {
    pub member: &'v Member,
    pub offset: Option<usize>,
    /// Bytes occupied by the whole field.
    pub size: usize,
    pub element_size: usize,
    /// Resolved array dimensions, outermost first.
    pub dims: Vec<usize>,
}

impl<'v> FieldPlan<'v> {
    pub fn element_count(&self) -> usize {
        self.dims.iter().product()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan<'v> {
    pub name: String,
    pub kind: LayoutKind,
    pub fields: Vec<FieldPlan<'v>>,
    pub size: usize,
    pub align: usize,
    /// Offsets that `#[repr(C)]` alone would not reproduce.
    pub packed: bool,
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    size: usize,
    align: usize,
}

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) / align * align
}

pub struct Planner<'a> {
    view: &'a VersionView,
    config: &'a GeneratorConfig,
    constants: ConstantNormalizer<'a>,
    in_progress: RefCell<HashSet<String>>,
}

impl<'a> Planner<'a> {
    pub fn new(view: &'a VersionView, config: &'a GeneratorConfig) -> Planner<'a> {
        Planner {
            view,
            config,
            constants: ConstantNormalizer::new(&view.constants),
            in_progress: RefCell::new(HashSet::new()),
        }
    }

    /// Members of `owner` that belong to the configured API.
    ///
    /// A member name declared more than once (for different APIs) must keep
    /// exactly one declaration.
    pub fn select_members<'v>(&self, owner: &str, members: &'v [Member]) -> Result<Vec<&'v Member>> {
        let api = self.config.api.as_str();
        let selected: Vec<&Member> = members
            .iter()
            .filter(|m| {
                let keep = api_matches(m.api.as_deref(), api)
                    && !self.config.excludes_member(owner, m.name(), m.api.as_deref());
                if !keep {
                    debug!("skipping {}.{} (api {:?})", owner, m.name(), m.api);
                }
                keep
            })
            .collect();

        let mut checked = HashSet::new();
        for m in members {
            let name = m.name();
            if !checked.insert(name) {
                continue;
            }
            if members.iter().filter(|o| o.name() == name).count() < 2 {
                continue;
            }
            match selected.iter().filter(|s| s.name() == name).count() {
                1 => (),
                0 => {
                    return Err(GenError::Inconsistent {
                        owner: owner.to_string(),
                        desc: format!("every declaration of member `{}` was excluded", name),
                    })
                }
                n => {
                    return Err(GenError::Inconsistent {
                        owner: owner.to_string(),
                        desc: format!("member `{}` is declared {} times for api {}", name, n, api),
                    })
                }
            }
        }
        Ok(selected)
    }

    fn declared_offset(&self, owner: &str, member: &Member) -> Option<usize> {
        member
            .explicit_offset
            .or_else(|| self.config.member_offset(owner, member.name()))
    }

    pub fn plan_struct<'v>(&self, s: &'v StructType) -> Result<LayoutPlan<'v>> {
        let members = self.select_members(&s.name, &s.members)?;
        let explicit = members.iter().any(|m| {
            self.declared_offset(&s.name, m).is_some() || m.definition.bitfield_size.is_some()
        });

        let mut fields = Vec::with_capacity(members.len());
        let mut offset = 0;
        let mut align = 1;
        let mut natural = true;
        for m in members {
            let (extent, dims) = self.member_extent(&s.name, m)?;
            let size = extent.size * dims.iter().product::<usize>();
            if explicit {
                let field_align = self.explicit_align(&s.name, m, extent)?;
                natural &= offset % field_align == 0;
                align = align.max(field_align);
                if let Some(declared) = self.declared_offset(&s.name, m) {
                    if declared != offset {
                        return Err(GenError::LayoutMismatch {
                            owner: s.name.clone(),
                            member: m.name().to_string(),
                            declared,
                            computed: offset,
                        });
                    }
                }
                fields.push(FieldPlan {
                    member: m,
                    offset: Some(offset),
                    size,
                    element_size: extent.size,
                    dims,
                });
                offset += size;
            } else {
                offset = align_up(offset, extent.align) + size;
                align = align.max(extent.align);
                fields.push(FieldPlan {
                    member: m,
                    offset: None,
                    size,
                    element_size: extent.size,
                    dims,
                });
            }
        }

        let packed = explicit && !(natural && offset % align == 0);
        if packed {
            debug!("{} needs a packed layout", s.name);
        }
        Ok(LayoutPlan {
            name: s.name.clone(),
            kind: if explicit {
                LayoutKind::Explicit
            } else {
                LayoutKind::Sequential
            },
            fields,
            size: if explicit { offset } else { align_up(offset, align) },
            align: if packed { 1 } else { align },
            packed,
        })
    }

    pub fn plan_union<'v>(&self, u: &'v StructType) -> Result<LayoutPlan<'v>> {
        let members = self.select_members(&u.name, &u.members)?;
        let mut fields = Vec::with_capacity(members.len());
        let mut size = 0;
        let mut align = 1;
        for m in members {
            if m.definition.bitfield_size.is_some() {
                return Err(GenError::Inconsistent {
                    owner: u.name.clone(),
                    desc: format!("union member `{}` is a bit-field", m.name()),
                });
            }
            let (extent, dims) = self.member_extent(&u.name, m)?;
            let field_size = extent.size * dims.iter().product::<usize>();
            size = size.max(field_size);
            align = align.max(extent.align);
            fields.push(FieldPlan {
                member: m,
                offset: Some(0),
                size: field_size,
                element_size: extent.size,
                dims,
            });
        }
        Ok(LayoutPlan {
            name: u.name.clone(),
            kind: LayoutKind::Union,
            fields,
            size: align_up(size, align),
            align,
            packed: false,
        })
    }

    /// Resolved array dimensions of a member; empty for scalars.
    pub fn member_dims(&self, owner: &str, member: &Member) -> Result<Vec<usize>> {
        let shape = match &member.definition.array_shape {
            Some(shape) => shape,
            None => return Ok(Vec::new()),
        };
        shape
            .iter()
            .map(|len| match len {
                ArrayLength::Static(n) => Ok(n.get()),
                ArrayLength::Constant(name) => match self.constants.integer(name)? {
                    Some(n) if n > 0 => Ok(n),
                    _ => Err(GenError::NonNumericBound {
                        owner: owner.to_string(),
                        member: member.name().to_string(),
                        constant: name.clone(),
                    }),
                },
            })
            .collect()
    }

    /// Alignment of a field at a computed offset. A bit-field spelled as
    /// bytes has none; one that fills its declared type keeps that type's.
    fn explicit_align(&self, owner: &str, member: &Member, extent: Extent) -> Result<usize> {
        if member.definition.bitfield_size.is_none() {
            return Ok(extent.align);
        }
        let declared = self.extent(member.type_name(), 0, owner)?;
        Ok(if declared.size == extent.size {
            declared.align
        } else {
            1
        })
    }

    fn member_extent(&self, owner: &str, member: &Member) -> Result<(Extent, Vec<usize>)> {
        let dims = self.member_dims(owner, member)?;
        if let Some(bits) = member.definition.bitfield_size {
            let bits = bits.get();
            if bits % 8 != 0 {
                return Err(GenError::UnsupportedBitfield {
                    owner: owner.to_string(),
                    member: member.name().to_string(),
                    bits,
                });
            }
            let size = usize::from(bits / 8);
            return Ok((Extent { size, align: 1 }, dims));
        }
        let extent = self.extent(member.type_name(), member.pointer_level(), owner)?;
        Ok((extent, dims))
    }

    /// Size in bytes of `type_name` behind `pointer_level` pointers.
    pub fn size_of(&self, type_name: &str, pointer_level: usize) -> Result<usize> {
        Ok(self.extent(type_name, pointer_level, type_name)?.size)
    }

    fn extent(&self, type_name: &str, pointer_level: usize, context: &str) -> Result<Extent> {
        let pointer = Extent {
            size: self.config.pointer_width,
            align: self.config.pointer_width,
        };
        if pointer_level > 0 {
            return Ok(pointer);
        }
        let unknown = || GenError::UnresolvedType {
            name: type_name.to_string(),
            context: format!("size of a member of `{}`", context),
        };

        if let Some(p) = Primitive::from_c_name(type_name) {
            let size = p.size(self.config.pointer_width).ok_or_else(unknown)?;
            return Ok(Extent { size, align: size });
        }
        if let Some(owner) = self.view.flags_owner(type_name) {
            return self.extent(owner, 0, context);
        }
        if let Some(td) = self.view.typedef(type_name) {
            return self.extent(&td.base, usize::from(td.pointer_level), context);
        }

        match self.view.lookup(type_name) {
            Some(ViewType::Enum(e)) => {
                let size = e.bitwidth as usize / 8;
                Ok(Extent { size, align: size })
            }
            Some(ViewType::FuncPointer(_)) => Ok(pointer),
            Some(ViewType::Handle(h)) if h.dispatchable => Ok(pointer),
            Some(ViewType::Handle(_)) => Ok(Extent { size: 8, align: 8 }),
            Some(ViewType::Alias(alias)) => self.extent(&alias.target, 0, context),
            Some(ViewType::Struct(s)) => self.guarded(type_name, || {
                let plan = self.plan_struct(s)?;
                Ok(Extent {
                    size: plan.size,
                    align: plan.align,
                })
            }),
            Some(ViewType::Union(u)) => self.guarded(type_name, || {
                let plan = self.plan_union(u)?;
                Ok(Extent {
                    size: plan.size,
                    align: plan.align,
                })
            }),
            Some(ViewType::External(name)) => match self.config.external_types.get(name) {
                Some(mapped) => {
                    let size = rust_type_size(mapped, self.config.pointer_width).ok_or_else(unknown)?;
                    Ok(Extent { size, align: size })
                }
                None => Err(unknown()),
            },
            Some(ViewType::Opaque(_)) | None => Err(unknown()),
        }
    }

    fn guarded<T>(&self, name: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if !self.in_progress.borrow_mut().insert(name.to_string()) {
            return Err(GenError::Inconsistent {
                owner: name.to_string(),
                desc: String::from("type contains itself by value"),
            });
        }
        let result = f();
        self.in_progress.borrow_mut().remove(name);
        result
    }
}

fn rust_type_size(rust_type: &str, pointer_width: usize) -> Option<usize> {
    if rust_type.starts_with('*') {
        return Some(pointer_width);
    }
    match rust_type {
        "u8" | "i8" | "c_char" => Some(1),
        "u16" | "i16" => Some(2),
        "u32" | "i32" | "f32" | "c_int" => Some(4),
        "u64" | "i64" | "f64" => Some(8),
        "usize" | "isize" => Some(pointer_width),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::MemberExclusion;
    use crate::view::test_support::{registry, view};

    const REGISTRY: &str = r#"<registry>
        <types>
            <type requires="vk_platform" name="uint8_t"/>
            <type requires="vk_platform" name="uint32_t"/>
            <type requires="vk_platform" name="uint64_t"/>
            <type requires="vk_platform" name="float"/>
            <type requires="vk_platform" name="char"/>
            <type requires="vk_platform" name="void"/>
            <type category="basetype">typedef <type>uint32_t</type> <name>VkFlags</name>;</type>
            <type category="basetype">typedef <type>uint64_t</type> <name>VkDeviceSize</name>;</type>
            <type category="bitmask">typedef <type>VkFlags</type> <name>VkGeometryInstanceFlagsKHR</name>;</type>
            <type category="struct" name="S">
                <member><type>uint32_t</type> <name>a</name></member>
                <member><type>uint32_t</type> <name>b</name></member>
            </type>
            <type category="struct" name="VkMixed">
                <member><type>uint32_t</type> <name>count</name></member>
                <member><type>VkDeviceSize</type> <name>size</name></member>
                <member><type>void</type>* <name>pNext</name></member>
            </type>
            <type category="struct" name="VkLimits">
                <member><type>char</type> <name>deviceName</name>[<enum>VK_MAX_NAME_SIZE</enum>]</member>
                <member><type>uint8_t</type> <name>uuid</name>[<enum>VK_UUID_SIZE</enum>]</member>
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
            <type category="struct" name="VkInstanceHolder">
                <member><type>uint8_t</type> <name>flag</name></member>
                <member><type>VkAccelerationStructureInstanceKHR</type> <name>instance</name></member>
            </type>
            <type category="struct" name="VkTagged">
                <member><type>uint8_t</type> <name>tag</name></member>
                <member><type>VkDeviceSize</type> <name>size</name></member>
            </type>
            <type category="struct" name="VkTaggedHolder">
                <member><type>uint8_t</type> <name>flag</name></member>
                <member><type>VkTagged</type> <name>tagged</name></member>
            </type>
            <type category="struct" name="VkOddBits">
                <member><type>uint32_t</type> <name>low</name>:4</member>
                <member><type>uint32_t</type> <name>high</name>:28</member>
            </type>
            <type category="struct" name="VkBadBound">
                <member><type>float</type> <name>values</name>[<enum>VK_LOD_CLAMP_NONE</enum>]</member>
            </type>
            <type category="struct" name="VkPipelineCacheCreateInfo">
                <member><type>uint32_t</type> <name>flags</name></member>
                <member api="vulkan"><type>size_t</type> <name>initialDataSize</name></member>
                <member api="vulkansc"><type>size_t</type> <name>initialDataSize</name></member>
                <member>const <type>void</type>* <name>pInitialData</name></member>
            </type>
            <type category="struct" name="VkDoubled">
                <member><type>uint32_t</type> <name>value</name></member>
                <member api="vulkan,vulkansc"><type>uint32_t</type> <name>value</name></member>
            </type>
            <type category="union" name="VkClearColorValue">
                <member><type>float</type> <name>float32</name>[4]</member>
                <member><type>uint32_t</type> <name>uint32</name>[4]</member>
            </type>
        </types>
        <enums name="API Constants" type="constants">
            <enum type="uint32_t" value="256" name="VK_MAX_NAME_SIZE"/>
            <enum type="uint32_t" value="16" name="VK_UUID_SIZE_BASE"/>
            <enum name="VK_UUID_SIZE" alias="VK_UUID_SIZE_BASE"/>
            <enum type="float" value="1000.0F" name="VK_LOD_CLAMP_NONE"/>
        </enums>
        <feature api="vulkan" name="VK_VERSION_1_0" number="1.0">
            <require>
                <type name="S"/>
                <type name="VkMixed"/>
                <type name="VkLimits"/>
                <type name="VkAccelerationStructureInstanceKHR"/>
                <type name="VkOddBits"/>
                <type name="VkInstanceHolder"/>
                <type name="VkTaggedHolder"/>
                <type name="VkBadBound"/>
                <type name="VkPipelineCacheCreateInfo"/>
                <type name="VkDoubled"/>
                <type name="VkClearColorValue"/>
            </require>
        </feature>
    </registry>"#;

    fn find<'v>(view: &'v VersionView, name: &str) -> &'v StructType {
        view.structs
            .iter()
            .chain(view.unions.iter())
            .find(|s| s.name == name)
            .unwrap()
    }

    fn offsets(plan: &LayoutPlan<'_>) -> Vec<Option<usize>> {
        plan.fields.iter().map(|f| f.offset).collect()
    }

    #[test]
    fn test_sequential() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let plan = planner.plan_struct(find(&view, "S")).unwrap();
        assert_eq!(plan.kind, LayoutKind::Sequential);
        assert_eq!(offsets(&plan), vec![None, None]);
        assert_eq!(plan.size, 8);

        let mixed = planner.plan_struct(find(&view, "VkMixed")).unwrap();
        assert_eq!(mixed.size, 24);
        assert_eq!(planner.size_of("VkMixed", 0).unwrap(), 24);
        assert_eq!(planner.size_of("VkMixed", 1).unwrap(), 8);
    }

    #[test]
    fn test_explicit_offset_forces_layout() {
        let view = view(REGISTRY);
        let config = GeneratorConfig {
            member_offsets: vec![crate::config::MemberOffset {
                structure: String::from("S"),
                member: String::from("b"),
                offset: 4,
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        let plan = planner.plan_struct(find(&view, "S")).unwrap();
        assert_eq!(plan.kind, LayoutKind::Explicit);
        assert_eq!(offsets(&plan), vec![Some(0), Some(4)]);
        assert_eq!(plan.size, 8);
        assert_eq!((plan.align, plan.packed), (4, false));
        assert_eq!(plan, planner.plan_struct(find(&view, "S")).unwrap());

        let config = GeneratorConfig {
            member_offsets: vec![crate::config::MemberOffset {
                structure: String::from("S"),
                member: String::from("b"),
                offset: 8,
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        match planner.plan_struct(find(&view, "S")) {
            Err(GenError::LayoutMismatch {
                declared, computed, ..
            }) => assert_eq!((declared, computed), (8, 4)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bitfields() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let plan = planner
            .plan_struct(find(&view, "VkAccelerationStructureInstanceKHR"))
            .unwrap();
        assert_eq!(plan.kind, LayoutKind::Explicit);
        assert_eq!(
            offsets(&plan),
            vec![Some(0), Some(48), Some(51), Some(52), Some(55), Some(56)]
        );
        assert_eq!(plan.size, 64);
        let sizes: Vec<usize> = plan.fields.iter().map(|f| f.size).collect();
        assert_eq!(sizes, vec![48, 3, 1, 3, 1, 8]);
        // the byte-spelled bit-fields leave the trailing u64 aligned
        assert_eq!((plan.align, plan.packed), (8, false));

        match planner.plan_struct(find(&view, "VkOddBits")) {
            Err(GenError::UnsupportedBitfield { bits, .. }) => assert_eq!(bits, 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_explicit_alignment() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let holder = planner.plan_struct(find(&view, "VkInstanceHolder")).unwrap();
        assert_eq!(holder.size, 72);
        assert_eq!(holder.align, 8);

        let config = GeneratorConfig {
            member_offsets: vec![crate::config::MemberOffset {
                structure: String::from("VkTagged"),
                member: String::from("size"),
                offset: 1,
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        let tagged = planner.plan_struct(find(&view, "VkTagged")).unwrap();
        assert_eq!(offsets(&tagged), vec![Some(0), Some(1)]);
        assert_eq!((tagged.size, tagged.align, tagged.packed), (9, 1, true));
        let holder = planner.plan_struct(find(&view, "VkTaggedHolder")).unwrap();
        assert_eq!((holder.size, holder.align), (10, 1));

        let config = GeneratorConfig {
            member_offsets: vec![crate::config::MemberOffset {
                structure: String::from("VkTagged"),
                member: String::from("size"),
                offset: 8,
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        match planner.plan_struct(find(&view, "VkTagged")) {
            Err(GenError::LayoutMismatch { computed, .. }) => assert_eq!(computed, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_arrays() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let plan = planner.plan_struct(find(&view, "VkLimits")).unwrap();
        assert_eq!(plan.fields[0].dims, vec![256]);
        assert_eq!(plan.fields[1].dims, vec![16]);
        assert_eq!(plan.fields[1].element_count(), 16);
        assert_eq!(plan.size, 272);

        let matrix = planner.plan_struct(find(&view, "VkTransformMatrixKHR")).unwrap();
        assert_eq!(matrix.fields[0].dims, vec![3, 4]);
        assert_eq!(matrix.size, 48);

        match planner.plan_struct(find(&view, "VkBadBound")) {
            Err(GenError::NonNumericBound { constant, .. }) => {
                assert_eq!(constant, "VK_LOD_CLAMP_NONE")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_union() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let plan = planner.plan_union(find(&view, "VkClearColorValue")).unwrap();
        assert_eq!(plan.kind, LayoutKind::Union);
        assert_eq!(offsets(&plan), vec![Some(0), Some(0)]);
        assert_eq!(plan.size, 16);
    }

    #[test]
    fn test_api_duplicates() {
        let view = view(REGISTRY);
        let config = GeneratorConfig::default();
        let planner = Planner::new(&view, &config);
        let plan = planner
            .plan_struct(find(&view, "VkPipelineCacheCreateInfo"))
            .unwrap();
        let names: Vec<&str> = plan.fields.iter().map(|f| f.member.name()).collect();
        assert_eq!(names, vec!["flags", "initialDataSize", "pInitialData"]);
        assert_eq!(plan.fields[1].member.api.as_deref(), Some("vulkan"));

        match planner.plan_struct(find(&view, "VkDoubled")) {
            Err(GenError::Inconsistent { owner, .. }) => assert_eq!(owner, "VkDoubled"),
            other => panic!("unexpected {:?}", other),
        }

        let config = GeneratorConfig {
            member_exclusions: vec![MemberExclusion {
                structure: String::from("VkDoubled"),
                member: String::from("value"),
                api: Some(String::from("vulkan,vulkansc")),
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        let plan = planner.plan_struct(find(&view, "VkDoubled")).unwrap();
        assert_eq!(plan.fields.len(), 1);
        assert_eq!(plan.fields[0].member.api, None);

        let config = GeneratorConfig {
            member_exclusions: vec![MemberExclusion {
                structure: String::from("VkPipelineCacheCreateInfo"),
                member: String::from("initialDataSize"),
                api: None,
            }],
            ..GeneratorConfig::default()
        };
        let planner = Planner::new(&view, &config);
        assert!(matches!(
            planner.plan_struct(find(&view, "VkPipelineCacheCreateInfo")),
            Err(GenError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_pointer_width() {
        let registry = registry(REGISTRY);
        let config = GeneratorConfig {
            pointer_width: 4,
            ..GeneratorConfig::default()
        };
        let view = VersionView::build(&registry, &config).unwrap();
        let planner = Planner::new(&view, &config);
        assert_eq!(planner.size_of("VkPipelineCacheCreateInfo", 0).unwrap(), 12);
        assert_eq!(planner.size_of("VkMixed", 0).unwrap(), 24);
    }
}
