//! The caller-facing engine.

use std::{any::TypeId, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::*;

use crate::{
    cache::TypeCache,
    compat::{FastOp, FastPathCompatibility},
    descriptor::{Resolver, TypeDescriptor},
    error::{DynSszError, DynSszResult, FieldPath},
    hash::hash_value,
    hints::SizeHint,
    marshal::marshal_value,
    size::value_size,
    spec::{SpecRegistry, SpecValues},
    types::SszType,
    unmarshal::unmarshal_value,
};

/// Engine options fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynSszConfig {
    /// Never delegate to the fixed-layout codec, even for eligible types.
    pub force_dynamic: bool,
}

/// Encodes, decodes and hashes values under one set of specification values.
///
/// Descriptors and fast-path decisions are computed on first use per type
/// and cached for the engine's lifetime.  The engine is `Sync`; share it
/// behind an `Arc` or a static.  Separate engines never share caches.
#[derive(Debug)]
pub struct DynSsz {
    registry: SpecRegistry,
    config: DynSszConfig,
    descriptors: TypeCache<Arc<TypeDescriptor>>,
    compat: TypeCache<FastPathCompatibility>,
}

impl DynSsz {
    pub fn new(registry: SpecRegistry) -> Self {
        Self::with_config(registry, DynSszConfig::default())
    }

    pub fn with_config(registry: SpecRegistry, config: DynSszConfig) -> Self {
        Self {
            registry,
            config,
            descriptors: TypeCache::new(),
            compat: TypeCache::new(),
        }
    }

    pub fn builder() -> DynSszBuilder {
        DynSszBuilder::default()
    }

    pub fn registry(&self) -> &SpecRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DynSszConfig {
        &self.config
    }

    /// Resolved layout of `T` under this engine's registry.
    pub fn type_descriptor<T: SszType>(&self) -> DynSszResult<Arc<TypeDescriptor>> {
        let id = TypeId::of::<T>();
        if let Some(desc) = self.descriptors.get(id) {
            return Ok(desc);
        }

        let desc = Resolver::new(&self.registry, &self.descriptors).resolve(&T::schema(), &[])?;
        Ok(self.descriptors.insert(id, desc))
    }

    /// Resolves `T` with size hints supplied by the caller for its outermost
    /// levels.
    ///
    /// The result depends on the hints, so it is not cached; nested
    /// containers still are.
    pub fn resolve_with_hints<T: SszType>(
        &self,
        hints: &[SizeHint],
    ) -> DynSszResult<Arc<TypeDescriptor>> {
        Resolver::new(&self.registry, &self.descriptors).resolve(&T::schema(), hints)
    }

    /// Which operations on `T` may use its fixed-layout codec.
    pub fn fast_path_compatibility<T: SszType>(&self) -> DynSszResult<FastPathCompatibility> {
        let id = TypeId::of::<T>();
        if let Some(compat) = self.compat.get(id) {
            return Ok(compat);
        }

        let desc = self.type_descriptor::<T>()?;
        let compat = FastPathCompatibility::detect(&T::fast_codec(), &desc);
        debug!(ty = desc.name(), ?compat, "detected fast path compatibility");
        Ok(self.compat.insert(id, compat))
    }

    pub fn marshal<T: SszType>(&self, value: &T) -> DynSszResult<Vec<u8>> {
        let mut buf = Vec::new();
        self.marshal_into(value, &mut buf)?;
        Ok(buf)
    }

    /// Appends the encoding of `value` to `buf`.
    ///
    /// On error `buf` is restored to its original length.
    pub fn marshal_into<T: SszType>(&self, value: &T, buf: &mut Vec<u8>) -> DynSszResult<()> {
        let start = buf.len();
        let res = self.append_encoding(value, buf);
        if res.is_err() {
            buf.truncate(start);
        }
        res
    }

    fn append_encoding<T: SszType>(&self, value: &T, buf: &mut Vec<u8>) -> DynSszResult<()> {
        let desc = self.type_descriptor::<T>()?;

        if self.use_fast_path::<T>(FastOp::Marshal)?
            && let Some(marshal) = T::fast_codec().marshal_fn()
        {
            trace!(ty = desc.name(), "marshal via fixed-layout codec");
            return marshal(value, buf).map_err(|reason| fixed_codec_error(&desc, reason));
        }

        trace!(ty = desc.name(), "marshal via descriptor");
        marshal_value(&desc, &value.to_ssz_value(), buf, &mut FieldPath::root())
    }

    /// Decodes a `T` from exactly `bytes`.
    pub fn unmarshal<T: SszType>(&self, bytes: &[u8]) -> DynSszResult<T> {
        let desc = self.type_descriptor::<T>()?;

        if self.use_fast_path::<T>(FastOp::Unmarshal)?
            && let Some(unmarshal) = T::fast_codec().unmarshal_fn()
        {
            trace!(ty = desc.name(), len = bytes.len(), "unmarshal via fixed-layout codec");
            return unmarshal(bytes).map_err(|reason| fixed_codec_error(&desc, reason));
        }

        trace!(ty = desc.name(), len = bytes.len(), "unmarshal via descriptor");
        let value = unmarshal_value(&desc, bytes, &mut FieldPath::root())?;
        T::from_ssz_value(value)
    }

    /// Decodes `bytes` into `target`, leaving it untouched on error.
    pub fn unmarshal_into<T: SszType>(&self, target: &mut T, bytes: &[u8]) -> DynSszResult<()> {
        *target = self.unmarshal(bytes)?;
        Ok(())
    }

    /// Length of the encoding [`Self::marshal`] would produce.
    pub fn size_ssz<T: SszType>(&self, value: &T) -> DynSszResult<usize> {
        let desc = self.type_descriptor::<T>()?;

        if self.use_fast_path::<T>(FastOp::Marshal)?
            && let Some(size) = T::fast_codec().size_fn()
        {
            return Ok(size(value));
        }

        value_size(&desc, &value.to_ssz_value(), &mut FieldPath::root())
    }

    pub fn hash_tree_root<T: SszType>(&self, value: &T) -> DynSszResult<[u8; 32]> {
        let desc = self.type_descriptor::<T>()?;

        if self.use_fast_path::<T>(FastOp::HashRoot)?
            && let Some(hash_root) = T::fast_codec().hash_root_fn()
        {
            trace!(ty = desc.name(), "hash tree root via fixed-layout codec");
            return hash_root(value).map_err(|reason| fixed_codec_error(&desc, reason));
        }

        trace!(ty = desc.name(), "hash tree root via descriptor");
        hash_value(&desc, &value.to_ssz_value(), &mut FieldPath::root())
    }

    fn use_fast_path<T: SszType>(&self, op: FastOp) -> DynSszResult<bool> {
        if self.config.force_dynamic {
            return Ok(false);
        }
        Ok(self.fast_path_compatibility::<T>()?.allows(op))
    }
}

fn fixed_codec_error(desc: &TypeDescriptor, reason: String) -> DynSszError {
    DynSszError::FixedCodec {
        ty: desc.name().to_owned(),
        reason,
    }
}

/// Collects specification layers and options for a [`DynSsz`].
#[derive(Debug, Default)]
pub struct DynSszBuilder {
    layers: Vec<SpecValues>,
    config: DynSszConfig,
}

impl DynSszBuilder {
    /// Adds an override layer; later layers win on name collisions.
    pub fn with_spec_values(mut self, values: SpecValues) -> Self {
        self.layers.push(values);
        self
    }

    pub fn with_config(mut self, config: DynSszConfig) -> Self {
        self.config = config;
        self
    }

    pub fn force_dynamic(mut self, force_dynamic: bool) -> Self {
        self.config.force_dynamic = force_dynamic;
        self
    }

    pub fn build(self) -> DynSszResult<DynSsz> {
        let registry = SpecRegistry::from_layers(self.layers)?;
        debug!(
            spec_values = registry.len(),
            force_dynamic = self.config.force_dynamic,
            "built dynamic ssz engine"
        );
        Ok(DynSsz::with_config(registry, self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FastCodec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Blob {
        tag: u16,
        data: Vec<u8>,
    }

    crate::impl_ssz_container!(Blob {
        tag,
        data => { size: "4", dyn_size: "BLOB_LEN" },
    });

    /// A fixed-layout "codec" that disagrees with the generic path so the
    /// tests can tell which path ran.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Marker(u8);

    impl SszType for Marker {
        fn schema() -> crate::Schema {
            u8::schema()
        }

        fn to_ssz_value(&self) -> crate::SszValue {
            crate::SszValue::Uint8(self.0)
        }

        fn from_ssz_value(value: crate::SszValue) -> DynSszResult<Self> {
            u8::from_ssz_value(value).map(Marker)
        }

        fn fast_codec() -> FastCodec<Self> {
            FastCodec::none().with_marshal(
                |_, buf| {
                    buf.push(0xff);
                    Ok(())
                },
                |_| 1,
            )
        }
    }

    fn blob_layer(len: u64) -> SpecValues {
        [("BLOB_LEN", len)].into_iter().collect()
    }

    #[test]
    fn test_fast_path_selected_unless_forced() {
        let engine = DynSsz::new(SpecRegistry::empty());
        assert_eq!(engine.marshal(&Marker(3)).unwrap(), [0xff]);

        let compat = engine.fast_path_compatibility::<Marker>().unwrap();
        assert!(compat.allows(FastOp::Marshal));
        assert!(!compat.allows(FastOp::Unmarshal));
        assert!(!compat.allows(FastOp::HashRoot));

        let forced = DynSsz::builder().force_dynamic(true).build().unwrap();
        assert_eq!(forced.marshal(&Marker(3)).unwrap(), [0x03]);
    }

    #[test]
    fn test_override_changes_layout() {
        let value = Blob {
            tag: 1,
            data: vec![1, 2, 3, 4, 5, 6],
        };

        let default = DynSsz::new(SpecRegistry::empty());
        assert!(default.marshal(&value).is_err());

        let engine = DynSsz::builder()
            .with_spec_values(blob_layer(6))
            .build()
            .unwrap();
        let bytes = engine.marshal(&value).unwrap();
        assert_eq!(bytes, [1, 0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(engine.size_ssz(&value).unwrap(), 8);
        assert_eq!(engine.unmarshal::<Blob>(&bytes).unwrap(), value);
        assert!(engine.type_descriptor::<Blob>().unwrap().has_spec_override());
    }

    #[test]
    fn test_later_layer_wins() {
        let engine = DynSsz::builder()
            .with_spec_values(blob_layer(2))
            .with_spec_values(blob_layer(3))
            .build()
            .unwrap();
        assert_eq!(engine.registry().get("BLOB_LEN"), Some(3));
        assert_eq!(engine.type_descriptor::<Blob>().unwrap().fixed_size(), Some(5));
    }

    #[test]
    fn test_marshal_into_truncates_on_error() {
        let engine = DynSsz::new(SpecRegistry::empty());
        let mut buf = vec![0xaa, 0xbb];

        let bad = Blob {
            tag: 9,
            data: vec![1],
        };
        assert!(engine.marshal_into(&bad, &mut buf).is_err());
        assert_eq!(buf, [0xaa, 0xbb]);

        let good = Blob {
            tag: 9,
            data: vec![1, 2, 3, 4],
        };
        engine.marshal_into(&good, &mut buf).unwrap();
        assert_eq!(buf, [0xaa, 0xbb, 9, 0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unmarshal_into_keeps_target_on_error() {
        let engine = DynSsz::new(SpecRegistry::empty());
        let mut target = Blob {
            tag: 5,
            data: vec![5, 5, 5, 5],
        };

        assert!(engine.unmarshal_into(&mut target, &[1, 0, 2]).is_err());
        assert_eq!(target.tag, 5);

        engine.unmarshal_into(&mut target, &[1, 0, 2, 2, 2, 2]).unwrap();
        assert_eq!(
            target,
            Blob {
                tag: 1,
                data: vec![2, 2, 2, 2],
            }
        );
    }

    #[test]
    fn test_hinted_resolution_not_cached() {
        let engine = DynSsz::new(SpecRegistry::empty());
        let hints = [SizeHint {
            size: Some(3),
            ..Default::default()
        }];

        let hinted = engine.resolve_with_hints::<Vec<u32>>(&hints).unwrap();
        assert_eq!(hinted.fixed_size(), Some(12));

        let plain = engine.type_descriptor::<Vec<u32>>().unwrap();
        assert!(!plain.is_fixed_size());
    }

    #[test]
    fn test_empty_container_rejected_before_decoding() {
        #[derive(Debug, Clone, PartialEq, Eq)]
        struct Empty {}
        crate::impl_ssz_container!(Empty {});

        #[derive(Debug, Clone, PartialEq, Eq)]
        struct Holder {
            items: [Empty; 2],
        }
        crate::impl_ssz_container!(Holder { items });

        let engine = DynSsz::new(SpecRegistry::empty());
        let err = engine.unmarshal::<Holder>(&[]).unwrap_err();
        let DynSszError::UnsupportedType { path, .. } = err else {
            panic!("expected unsupported type, got {err:?}");
        };
        assert_eq!(path.to_string(), "items");

        let holder = Holder {
            items: [Empty {}, Empty {}],
        };
        assert!(engine.marshal(&holder).is_err());
        assert!(engine.size_ssz(&holder).is_err());
        assert!(engine.hash_tree_root(&holder).is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config: DynSszConfig = toml::from_str("force_dynamic = true").unwrap();
        assert!(config.force_dynamic);

        let config: DynSszConfig = toml::from_str("").unwrap();
        assert_eq!(config, DynSszConfig::default());
    }
}
