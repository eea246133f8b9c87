//! Field size annotations and their resolution into per-level hints.
//!
//! A field carries up to four comma-separated annotation strings, one entry
//! per nesting level (outermost first), `?` leaving a level unconstrained:
//!
//! - `size`: static fixed length the fixed-layout codec was built with.
//! - `dyn_size`: spec expression overriding `size`.
//! - `max`: static upper bound of a variable-length list.
//! - `dyn_max`: spec expression overriding `max`.

use crate::spec::SpecRegistry;

/// Raw textual size annotations attached to a container field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeAnnotations {
    pub size: Option<&'static str>,
    pub dyn_size: Option<&'static str>,
    pub max: Option<&'static str>,
    pub dyn_max: Option<&'static str>,
}

impl SizeAnnotations {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.dyn_size.is_none() && self.max.is_none() && self.dyn_max.is_none()
    }
}

/// Resolved constraint for a single nesting level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeHint {
    /// Fixed element count, turning a list into a vector.
    pub size: Option<usize>,

    /// Upper bound on the element count of a list.
    pub max: Option<usize>,

    /// Static `size` annotation for this level, before registry lookup.
    pub default_size: Option<usize>,

    /// Static `max` annotation for this level, before registry lookup.
    pub default_max: Option<usize>,
}

impl SizeHint {
    pub fn is_unconstrained(&self) -> bool {
        self.size.is_none() && self.max.is_none()
    }

    /// Whether the effective length differs from the static annotation, or
    /// from `builtin` (the length the type itself declares) when the level
    /// carries no static annotation.
    pub fn size_overridden(&self, builtin: Option<usize>) -> bool {
        self.size.or(builtin) != self.default_size.or(builtin)
    }

    /// Same as [`Self::size_overridden`] for the upper bound.
    pub fn max_overridden(&self, builtin: Option<usize>) -> bool {
        self.max.or(builtin) != self.default_max.or(builtin)
    }
}

/// Resolves a field's annotations against the registry, one [`SizeHint`] per
/// nesting level.
pub(crate) fn resolve_hints(
    ann: &SizeAnnotations,
    registry: &SpecRegistry,
) -> Result<Vec<SizeHint>, String> {
    if ann.is_empty() {
        return Ok(Vec::new());
    }

    let size = parse_static(ann.size, "size")?;
    let dyn_size = parse_dynamic(ann.dyn_size, "dyn_size", registry)?;
    let max = parse_static(ann.max, "max")?;
    let dyn_max = parse_dynamic(ann.dyn_max, "dyn_max", registry)?;

    let depth = [size.len(), dyn_size.len(), max.len(), dyn_max.len()]
        .into_iter()
        .max()
        .unwrap_or(0);

    let level = |v: &[Option<usize>], i: usize| v.get(i).copied().flatten();

    let hints = (0..depth)
        .map(|i| {
            let default_size = level(&size, i);
            let default_max = level(&max, i);
            SizeHint {
                size: level(&dyn_size, i).or(default_size),
                max: level(&dyn_max, i).or(default_max),
                default_size,
                default_max,
            }
        })
        .collect();

    Ok(hints)
}

fn split_levels(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim)
}

fn parse_static(raw: Option<&str>, key: &str) -> Result<Vec<Option<usize>>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    split_levels(raw)
        .map(|lvl| match lvl {
            "?" => Ok(None),
            n => n
                .parse::<usize>()
                .map(Some)
                .map_err(|_| format!("{key} level '{n}' is not an integer")),
        })
        .collect()
}

fn parse_dynamic(
    raw: Option<&str>,
    key: &str,
    registry: &SpecRegistry,
) -> Result<Vec<Option<usize>>, String> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    split_levels(raw)
        .map(|lvl| {
            if lvl == "?" {
                return Ok(None);
            }

            let value = registry
                .eval(lvl)
                .map_err(|e| format!("{key} expression '{lvl}': {e}"))?;

            value
                .map(|v| usize::try_from(v).map_err(|_| format!("{key} value {v} too large")))
                .transpose()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecValues;

    fn registry(pairs: &[(&str, u64)]) -> SpecRegistry {
        let layer: SpecValues = pairs.iter().map(|(k, v)| (*k, *v)).collect();
        SpecRegistry::from_layers([layer]).unwrap()
    }

    #[test]
    fn test_no_annotations() {
        let hints = resolve_hints(&SizeAnnotations::default(), &SpecRegistry::empty()).unwrap();
        assert!(hints.is_empty());
    }

    #[test]
    fn test_static_levels() {
        let ann = SizeAnnotations {
            size: Some("?,2"),
            ..Default::default()
        };
        let hints = resolve_hints(&ann, &SpecRegistry::empty()).unwrap();

        assert_eq!(hints.len(), 2);
        assert!(hints[0].is_unconstrained());
        assert_eq!(hints[1].size, Some(2));
        assert!(!hints[1].size_overridden(None));
    }

    #[test]
    fn test_spec_value_equal_to_default_is_not_override() {
        let reg = registry(&[("BYTES_PER_ROOT", 32)]);
        let ann = SizeAnnotations {
            size: Some("32"),
            dyn_size: Some("BYTES_PER_ROOT"),
            ..Default::default()
        };
        let hints = resolve_hints(&ann, &reg).unwrap();
        assert_eq!(hints[0].size, Some(32));
        assert!(!hints[0].size_overridden(None));
    }

    #[test]
    fn test_spec_value_differs_from_default() {
        let reg = registry(&[("MAX_ITEMS", 16)]);
        let ann = SizeAnnotations {
            size: Some("?,4"),
            dyn_size: Some("?,MAX_ITEMS/2"),
            max: Some("64"),
            dyn_max: Some("MAX_ITEMS"),
        };
        let hints = resolve_hints(&ann, &reg).unwrap();

        assert_eq!(hints.len(), 2);
        assert_eq!(hints[0].max, Some(16));
        assert!(hints[0].max_overridden(Some(64)));
        assert_eq!(hints[1].size, Some(8));
        assert!(hints[1].size_overridden(None));
    }

    #[test]
    fn test_unresolved_reference_falls_back_to_default() {
        let ann = SizeAnnotations {
            size: Some("5"),
            dyn_size: Some("UNKNOWN_CONST"),
            ..Default::default()
        };
        let hints = resolve_hints(&ann, &SpecRegistry::empty()).unwrap();
        assert_eq!(hints[0].size, Some(5));
        assert!(!hints[0].size_overridden(None));
    }

    #[test]
    fn test_spec_only_level_compares_against_builtin() {
        let ann = SizeAnnotations {
            dyn_size: Some("ROOT_LEN"),
            dyn_max: Some("LIMIT"),
            ..Default::default()
        };

        let same = resolve_hints(&ann, &registry(&[("ROOT_LEN", 32), ("LIMIT", 1024)])).unwrap();
        assert_eq!(same[0].default_size, None);
        assert!(!same[0].size_overridden(Some(32)));
        assert!(!same[0].max_overridden(Some(1024)));

        let changed = resolve_hints(&ann, &registry(&[("ROOT_LEN", 16), ("LIMIT", 64)])).unwrap();
        assert!(changed[0].size_overridden(Some(32)));
        assert!(changed[0].max_overridden(Some(1024)));

        // Without a builtin length any resolved size changes the layout.
        assert!(same[0].size_overridden(None));
    }

    #[test]
    fn test_malformed_annotations() {
        let bad_static = SizeAnnotations {
            size: Some("five"),
            ..Default::default()
        };
        assert!(resolve_hints(&bad_static, &SpecRegistry::empty()).is_err());

        let bad_expr = SizeAnnotations {
            dyn_size: Some("A +"),
            ..Default::default()
        };
        assert!(resolve_hints(&bad_expr, &SpecRegistry::empty()).is_err());
    }
}
