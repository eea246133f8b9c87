//! Resolved type descriptors and the resolver building them.
//!
//! A [`TypeDescriptor`] is the [`Schema`] of a type with every size
//! annotation applied against the engine's [`SpecRegistry`].  It is a closed
//! tree walked by the marshal, unmarshal, size and hash engines.

use std::sync::Arc;

use tracing::*;

use crate::{
    cache::TypeCache,
    error::{DynSszError, DynSszResult, FieldPath},
    hints::{SizeHint, resolve_hints},
    schema::{ContainerSchema, Schema, UintWidth},
    spec::SpecRegistry,
};

/// Length of an offset in the fixed region of a composite.
pub const BYTES_PER_LENGTH_OFFSET: usize = 4;

/// Size profile of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SszSize {
    Fixed(usize),
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    Bool,

    Uint(UintWidth),

    /// Fixed number of elements.
    Vector {
        elem: Arc<TypeDescriptor>,
        len: usize,
    },

    /// Element count carried by the data, with an optional upper bound.
    List {
        elem: Arc<TypeDescriptor>,
        max: Option<usize>,
    },

    Container { fields: Vec<FieldDescriptor> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub descriptor: Arc<TypeDescriptor>,
}

/// Layout of a type under a specific registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    name: String,
    kind: DescriptorKind,
    size: SszSize,
    has_spec_override: bool,
}

impl TypeDescriptor {
    fn new(name: String, kind: DescriptorKind, size: SszSize, has_spec_override: bool) -> Self {
        Self {
            name,
            kind,
            size,
            has_spec_override,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &DescriptorKind {
        &self.kind
    }

    pub fn size(&self) -> SszSize {
        self.size
    }

    pub fn is_fixed_size(&self) -> bool {
        matches!(self.size, SszSize::Fixed(_))
    }

    pub fn fixed_size(&self) -> Option<usize> {
        match self.size {
            SszSize::Fixed(n) => Some(n),
            SszSize::Dynamic => None,
        }
    }

    /// True if a specification value changed this type or anything reachable
    /// from it away from the built-in defaults.
    pub fn has_spec_override(&self) -> bool {
        self.has_spec_override
    }

    /// Basic types pack several values into one chunk when hashed.
    pub fn is_basic(&self) -> bool {
        matches!(self.kind, DescriptorKind::Bool | DescriptorKind::Uint(_))
    }

    /// Bytes the type occupies in the fixed region of an enclosing composite.
    pub fn fixed_part_len(&self) -> usize {
        self.fixed_size().unwrap_or(BYTES_PER_LENGTH_OFFSET)
    }

    /// Smallest valid encoding length.
    pub fn min_size(&self) -> usize {
        match (&self.kind, self.size) {
            (_, SszSize::Fixed(n)) => n,
            (DescriptorKind::Container { fields }, SszSize::Dynamic) => {
                fields.iter().map(|f| f.descriptor.fixed_part_len()).sum()
            }
            (DescriptorKind::Vector { len, .. }, SszSize::Dynamic) => len * BYTES_PER_LENGTH_OFFSET,
            _ => 0,
        }
    }
}

/// Builds descriptors for one engine, caching container descriptors by type.
pub(crate) struct Resolver<'a> {
    registry: &'a SpecRegistry,
    cache: &'a TypeCache<Arc<TypeDescriptor>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(registry: &'a SpecRegistry, cache: &'a TypeCache<Arc<TypeDescriptor>>) -> Self {
        Self { registry, cache }
    }

    /// Resolves a top-level schema, optionally with externally supplied hints.
    pub(crate) fn resolve(
        &self,
        schema: &Schema,
        hints: &[SizeHint],
    ) -> DynSszResult<Arc<TypeDescriptor>> {
        let mut path = FieldPath::root();
        self.resolve_node(schema, hints, &mut path)
    }

    fn resolve_node(
        &self,
        schema: &Schema,
        hints: &[SizeHint],
        path: &mut FieldPath,
    ) -> DynSszResult<Arc<TypeDescriptor>> {
        let (hint, rest) = match hints.split_first() {
            Some((hint, rest)) => (*hint, rest),
            None => (SizeHint::default(), &[][..]),
        };

        match schema {
            Schema::Bool | Schema::Uint(_) => {
                if let Some(extra) = hints.iter().find(|h| !h.is_unconstrained()) {
                    return Err(hint_mismatch(
                        schema,
                        path,
                        format!("size hint {extra:?} on a primitive"),
                    ));
                }

                let (kind, width) = match schema {
                    Schema::Uint(w) => (DescriptorKind::Uint(*w), w.bytes()),
                    _ => (DescriptorKind::Bool, 1),
                };
                Ok(Arc::new(TypeDescriptor::new(
                    schema.kind_name(),
                    kind,
                    SszSize::Fixed(width),
                    false,
                )))
            }

            Schema::Array { elem, len } => {
                if hint.max.is_some() {
                    return Err(hint_mismatch(
                        schema,
                        path,
                        "max bound on a fixed-length array".to_owned(),
                    ));
                }

                let size_override = hint.size_overridden(Some(*len));
                match hint.size {
                    Some(size) if size != *len && size_override => {
                        return Err(DynSszError::LengthMismatch {
                            ty: schema.kind_name(),
                            path: path.clone(),
                            expected: size.to_string(),
                            actual: *len,
                        });
                    }
                    Some(size) if size != *len => {
                        return Err(hint_mismatch(
                            schema,
                            path,
                            format!("size {size} on an array of length {len}"),
                        ));
                    }
                    _ => {}
                }

                let elem = self.resolve_node(elem, rest, path)?;
                self.vector(elem, *len, size_override, schema, path)
            }

            Schema::List { elem, max } => {
                let elem = self.resolve_node(elem, rest, path)?;

                match hint.size {
                    Some(size) => {
                        let bound = hint.max.or(*max);
                        if let Some(bound) = bound
                            && size > bound
                        {
                            return Err(hint_mismatch(
                                schema,
                                path,
                                format!("size {size} exceeds bound {bound}"),
                            ));
                        }
                        let has_override =
                            hint.size_overridden(None) || hint.max_overridden(*max);
                        self.vector(elem, size, has_override, schema, path)
                    }
                    None => {
                        let has_override = hint.max_overridden(*max) || elem.has_spec_override();
                        let max = hint.max.or(*max);
                        if elem.fixed_size() == Some(0) {
                            return Err(unsupported(schema, path, "list of zero-sized elements"));
                        }

                        let name = match max {
                            Some(max) => format!("List[{}, {max}]", elem.name()),
                            None => format!("List[{}]", elem.name()),
                        };
                        Ok(Arc::new(TypeDescriptor::new(
                            name,
                            DescriptorKind::List { elem, max },
                            SszSize::Dynamic,
                            has_override,
                        )))
                    }
                }
            }

            Schema::Container(container) => {
                if let Some(extra) = hints.iter().find(|h| !h.is_unconstrained()) {
                    return Err(hint_mismatch(
                        schema,
                        path,
                        format!("size hint {extra:?} on a container"),
                    ));
                }
                self.resolve_container(container, path)
            }
        }
    }

    fn vector(
        &self,
        elem: Arc<TypeDescriptor>,
        len: usize,
        spec_override: bool,
        schema: &Schema,
        path: &FieldPath,
    ) -> DynSszResult<Arc<TypeDescriptor>> {
        if len == 0 {
            return Err(unsupported(schema, path, "zero-length vector"));
        }
        if elem.fixed_size() == Some(0) {
            return Err(unsupported(schema, path, "vector of zero-sized elements"));
        }

        let size = match elem.fixed_size() {
            Some(esize) => {
                let total = esize
                    .checked_mul(len)
                    .ok_or_else(|| unsupported(schema, path, "vector size overflows"))?;
                SszSize::Fixed(total)
            }
            None => SszSize::Dynamic,
        };

        let name = format!("Vector[{}, {len}]", elem.name());
        let has_override = spec_override || elem.has_spec_override();
        Ok(Arc::new(TypeDescriptor::new(
            name,
            DescriptorKind::Vector { elem, len },
            size,
            has_override,
        )))
    }

    fn resolve_container(
        &self,
        container: &ContainerSchema,
        path: &mut FieldPath,
    ) -> DynSszResult<Arc<TypeDescriptor>> {
        if let Some(cached) = self.cache.get(container.type_id) {
            return Ok(cached);
        }

        if container.fields.is_empty() {
            return Err(DynSszError::UnsupportedType {
                ty: container.name.to_owned(),
                path: path.clone(),
                reason: "container without fields".to_owned(),
            });
        }

        let mut fields = Vec::with_capacity(container.fields.len());
        for field in &container.fields {
            path.push_field(field.name);

            let hints = resolve_hints(&field.annotations, self.registry).map_err(|reason| {
                DynSszError::HintMismatch {
                    ty: field.schema.kind_name(),
                    path: path.clone(),
                    reason,
                }
            })?;
            let descriptor = self.resolve_node(&field.schema, &hints, path)?;

            path.pop();
            fields.push(FieldDescriptor {
                name: field.name,
                descriptor,
            });
        }

        let size = fields
            .iter()
            .try_fold(0usize, |acc, f| {
                f.descriptor.fixed_size().and_then(|n| acc.checked_add(n))
            })
            .map_or(SszSize::Dynamic, SszSize::Fixed);
        let has_override = fields.iter().any(|f| f.descriptor.has_spec_override());

        let descriptor = Arc::new(TypeDescriptor::new(
            container.name.to_owned(),
            DescriptorKind::Container { fields },
            size,
            has_override,
        ));

        debug!(ty = container.name, ?size, has_override, "resolved container descriptor");
        Ok(self.cache.insert(container.type_id, descriptor))
    }
}

fn hint_mismatch(schema: &Schema, path: &FieldPath, reason: String) -> DynSszError {
    DynSszError::HintMismatch {
        ty: schema.kind_name(),
        path: path.clone(),
        reason,
    }
}

fn unsupported(schema: &Schema, path: &FieldPath, reason: &str) -> DynSszError {
    DynSszError::UnsupportedType {
        ty: schema.kind_name(),
        path: path.clone(),
        reason: reason.to_owned(),
    }
}
