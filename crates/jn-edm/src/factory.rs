//! Factory registry and dispatcher.
//!
//! Turns a streamer description into a descriptor tree. Dispatch is
//! first-match over rules sorted by descending priority (stable on ties
//! by registration order), so specific rules must declare a higher
//! priority than catch-all rules. A non-primitive type that no rule
//! matches is a hard configuration error, never a silent skip.
//!
//! One [`FactoryNode`] tree drives both outputs: the decoder tree
//! ([`crate::reader`]) and the arrow shape ([`FactoryNode::arrow_field`]).
//! Deriving both from the same node makes the decoder/shape isomorphism
//! structural rather than a convention to uphold.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Fields};

use crate::error::{EdmError, Result};
use crate::streamer::StreamerDb;

/// Item path of the navigator reference branch. `JM::SmartRef` at this
/// exact path decodes as a top-level array of reference groups instead of
/// one flat reference per entry.
pub const NAV_REFS_ITEM_PATH: &str = "/Meta/navigator:EvtNavigator/m_refs.m_refs";

/// JM:: classes the generic group rule must not claim: either handled by
/// a dedicated rule, decoded as singleton metadata, or unsupported.
const JM_GROUP_DENYLIST: [&str; 5] = [
    "JM::EventObject",
    "JM::TrackElecTruth",
    "JM::SmartRef",
    "JM::FileMetaData",
    "JM::UniqueIDTable",
];

/// Primitive leaf types the built-in fallback decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimType {
    /// One-byte boolean.
    Bool,
    /// `char`.
    I8,
    /// `unsigned char`.
    U8,
    /// `short`.
    I16,
    /// `unsigned short`.
    U16,
    /// `int`.
    I32,
    /// `unsigned int`.
    U32,
    /// `long` / `Long64_t`.
    I64,
    /// `unsigned long` / `ULong64_t`.
    U64,
    /// `float`.
    F32,
    /// `double`.
    F64,
}

impl PrimType {
    /// Map a C++/ROOT type spelling to a primitive kind.
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "bool" | "Bool_t" => Some(Self::Bool),
            "char" | "Char_t" => Some(Self::I8),
            "unsigned char" | "UChar_t" => Some(Self::U8),
            "short" | "Short_t" => Some(Self::I16),
            "unsigned short" | "UShort_t" => Some(Self::U16),
            "int" | "Int_t" => Some(Self::I32),
            "unsigned int" | "UInt_t" => Some(Self::U32),
            "long" | "long long" | "Long_t" | "Long64_t" => Some(Self::I64),
            "unsigned long" | "unsigned long long" | "ULong_t" | "ULong64_t" => Some(Self::U64),
            "float" | "Float_t" => Some(Self::F32),
            "double" | "Double_t" => Some(Self::F64),
            _ => None,
        }
    }

    /// Arrow data type this primitive decodes to.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Bool => DataType::Boolean,
            Self::I8 => DataType::Int8,
            Self::U8 => DataType::UInt8,
            Self::I16 => DataType::Int16,
            Self::U16 => DataType::UInt16,
            Self::I32 => DataType::Int32,
            Self::U32 => DataType::UInt32,
            Self::I64 => DataType::Int64,
            Self::U64 => DataType::UInt64,
            Self::F32 => DataType::Float32,
            Self::F64 => DataType::Float64,
        }
    }
}

/// Namespace that selected a composite group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupNs {
    /// `JM::` event-data-model classes.
    Jm,
    /// `CLHEP::` vector/matrix support classes.
    Clhep,
}

/// What a descriptor node decodes to.
#[derive(Debug, Clone, PartialEq)]
pub enum FactoryKind {
    /// Primitive scalar leaf.
    Primitive(PrimType),
    /// ROOT-encoded string leaf.
    Str,
    /// `vector<T>` sequence of the element descriptor.
    Vector(Box<FactoryNode>),
    /// Flat `JM::SmartRef`: `{pidf: u16, entry: i64}`.
    SmartRef,
    /// Top-level array of variable-length element groups; used for the
    /// navigator reference branch.
    RefBlock(Box<FactoryNode>),
    /// Composite class: children in declared member order.
    Group {
        /// Namespace whose rule selected this group.
        ns: GroupNs,
        /// Child descriptors, positionally matching the streamer members.
        children: Vec<FactoryNode>,
    },
}

/// Descriptor-tree node: the matching rule's choice, a display name, and
/// child descriptors for composites.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryNode {
    /// Display/field name (streamer `fName`).
    pub name: String,
    /// Decoding strategy selected for this node.
    pub kind: FactoryKind,
}

impl FactoryNode {
    /// Arrow field describing exactly what this node's reader emits.
    ///
    /// Field order and naming match the reader's emission order; see the
    /// module docs for why both derive from the same node.
    pub fn arrow_field(&self) -> FieldRef {
        Arc::new(Field::new(self.name.clone(), self.data_type(), false))
    }

    /// Arrow data type of this node's output.
    pub fn data_type(&self) -> DataType {
        match &self.kind {
            FactoryKind::Primitive(p) => p.data_type(),
            FactoryKind::Str => DataType::Utf8,
            FactoryKind::Vector(elem) | FactoryKind::RefBlock(elem) => {
                DataType::List(elem.arrow_field())
            }
            FactoryKind::SmartRef => DataType::Struct(smart_ref_fields()),
            FactoryKind::Group { children, .. } => {
                DataType::Struct(children.iter().map(|c| c.arrow_field()).collect())
            }
        }
    }
}

/// Fixed two-column shape of a decoded `JM::SmartRef`.
pub fn smart_ref_fields() -> Fields {
    Fields::from(vec![
        Field::new("pidf", DataType::UInt16, false),
        Field::new("entry", DataType::Int64, false),
    ])
}

/// Matching policies the registry can hold. A closed set: the experiment
/// schema fixes which rules exist, so no open-ended trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryRule {
    /// Exact match on `JM::SmartRef`; path-sensitive for the navigator
    /// reference branch.
    SmartRef,
    /// Prefix match on `JM::`, excluding the denylist; recurses into
    /// declared members.
    JmGroup,
    /// Prefix match on `CLHEP::`; recurses into declared members.
    ClhepGroup,
    /// Built-in `vector<T>` fallback.
    StlVector,
    /// Built-in string fallback.
    RootString,
    /// Built-in primitive-scalar fallback.
    Primitive,
}

impl FactoryRule {
    /// Dispatch priority; higher is tried first. Default is 0.
    pub fn priority(self) -> i32 {
        match self {
            FactoryRule::SmartRef => 50,
            _ => 0,
        }
    }

    fn try_build(
        self,
        registry: &FactoryRegistry,
        type_name: &str,
        field_name: &str,
        db: &StreamerDb,
        item_path: &str,
    ) -> Result<Option<FactoryNode>> {
        match self {
            FactoryRule::SmartRef => {
                if type_name != "JM::SmartRef" {
                    return Ok(None);
                }
                let flat = FactoryNode {
                    name: field_name.to_string(),
                    kind: FactoryKind::SmartRef,
                };
                if item_path == NAV_REFS_ITEM_PATH {
                    return Ok(Some(FactoryNode {
                        name: field_name.to_string(),
                        kind: FactoryKind::RefBlock(Box::new(flat)),
                    }));
                }
                Ok(Some(flat))
            }
            FactoryRule::JmGroup => {
                if !type_name.starts_with("JM::") || JM_GROUP_DENYLIST.contains(&type_name) {
                    return Ok(None);
                }
                let children = registry.build_children(type_name, db, item_path)?;
                Ok(Some(FactoryNode {
                    name: field_name.to_string(),
                    kind: FactoryKind::Group { ns: GroupNs::Jm, children },
                }))
            }
            FactoryRule::ClhepGroup => {
                if !type_name.starts_with("CLHEP::") {
                    return Ok(None);
                }
                let children = registry.build_children(type_name, db, item_path)?;
                Ok(Some(FactoryNode {
                    name: field_name.to_string(),
                    kind: FactoryKind::Group { ns: GroupNs::Clhep, children },
                }))
            }
            FactoryRule::StlVector => {
                let Some(elem_type) = vector_element(type_name) else {
                    return Ok(None);
                };
                let elem = registry.build(elem_type, "item", db, item_path)?;
                Ok(Some(FactoryNode {
                    name: field_name.to_string(),
                    kind: FactoryKind::Vector(Box::new(elem)),
                }))
            }
            FactoryRule::RootString => {
                if matches!(type_name, "string" | "std::string" | "TString") {
                    Ok(Some(FactoryNode {
                        name: field_name.to_string(),
                        kind: FactoryKind::Str,
                    }))
                } else {
                    Ok(None)
                }
            }
            FactoryRule::Primitive => Ok(PrimType::from_type_name(type_name).map(|p| {
                FactoryNode { name: field_name.to_string(), kind: FactoryKind::Primitive(p) }
            })),
        }
    }
}

/// Element type of a `vector<...>` spelling, if `type_name` is one.
fn vector_element(type_name: &str) -> Option<&str> {
    let inner = type_name
        .strip_prefix("std::vector<")
        .or_else(|| type_name.strip_prefix("vector<"))?;
    Some(inner.strip_suffix('>')?.trim())
}

/// Ordered rule registry. Built once at startup and read thereafter;
/// append-only, no ambient global state.
#[derive(Debug, Clone, Default)]
pub struct FactoryRegistry {
    rules: Vec<FactoryRule>,
}

impl FactoryRegistry {
    /// Empty registry. Dispatch over it fails for every type.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the experiment rules and the built-in fallbacks.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register(FactoryRule::SmartRef);
        reg.register(FactoryRule::JmGroup);
        reg.register(FactoryRule::ClhepGroup);
        reg.register(FactoryRule::StlVector);
        reg.register(FactoryRule::RootString);
        reg.register(FactoryRule::Primitive);
        reg
    }

    /// Append a rule. Rules are kept sorted by descending priority;
    /// equal priorities keep registration order.
    pub fn register(&mut self, rule: FactoryRule) {
        self.rules.push(rule);
        self.rules.sort_by_key(|r| std::cmp::Reverse(r.priority()));
    }

    /// Build the descriptor for one field.
    ///
    /// First-match-by-priority, short-circuiting. No match is the hard
    /// error [`EdmError::UnhandledType`].
    pub fn build(
        &self,
        type_name: &str,
        field_name: &str,
        db: &StreamerDb,
        item_path: &str,
    ) -> Result<FactoryNode> {
        for rule in &self.rules {
            if let Some(node) = rule.try_build(self, type_name, field_name, db, item_path)? {
                return Ok(node);
            }
        }
        Err(EdmError::UnhandledType {
            type_name: type_name.to_string(),
            item_path: item_path.to_string(),
        })
    }

    /// Build one child descriptor per declared member of `class_name`,
    /// deepening the item path with `"." + member name`.
    pub fn build_children(
        &self,
        class_name: &str,
        db: &StreamerDb,
        item_path: &str,
    ) -> Result<Vec<FactoryNode>> {
        let fields = db
            .fields(class_name)
            .ok_or_else(|| EdmError::ClassNotFound(class_name.to_string()))?;
        fields
            .iter()
            .map(|f| {
                let child_path = format!("{}.{}", item_path, f.name);
                self.build(&f.type_name, &f.name, db, &child_path)
            })
            .collect()
    }

    /// Build a group descriptor for a whole class by composing its
    /// declared members. Used by the singleton metadata decoders, whose
    /// classes are denylisted from the generic group rule.
    pub fn build_class(
        &self,
        class_name: &str,
        db: &StreamerDb,
        item_path: &str,
    ) -> Result<FactoryNode> {
        let children = self.build_children(class_name, db, item_path)?;
        Ok(FactoryNode {
            name: class_name.to_string(),
            kind: FactoryKind::Group { ns: GroupNs::Jm, children },
        })
    }
}
