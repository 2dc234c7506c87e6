//! Tag to value-kind registry.
//!
//! The value kinds themselves are fixed; the registry only decides which
//! tag bytes decode as which kind. The built-in table maps every SMI tag to
//! its kind and the three context-class exception markers to `Null`.
//! Extra aliases can be added to a private copy with [`TypeRegistry::register`].

use std::sync::LazyLock;

use super::ValueKind;
use crate::ber::tag;
use crate::error::{Error, Result};

/// Mapping from tag byte to value kind.
#[derive(Clone)]
pub struct TypeRegistry {
    tags: [Option<ValueKind>; 256],
}

static DEFAULT: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::builtin);

/// The process-wide registry holding the built-in set.
pub fn default_registry() -> &'static TypeRegistry {
    &DEFAULT
}

impl TypeRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self { tags: [None; 256] }
    }

    /// A registry holding the SMI default tags and the exception markers.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        for kind in ValueKind::ALL {
            reg.tags[kind.default_tag() as usize] = Some(kind);
        }
        for marker in [
            tag::context::NO_SUCH_OBJECT,
            tag::context::NO_SUCH_INSTANCE,
            tag::context::END_OF_MIB_VIEW,
        ] {
            reg.tags[marker as usize] = Some(ValueKind::Null);
        }
        reg
    }

    /// Register `tag` as an encoding of the type called `type_name`.
    ///
    /// Re-registering an existing pair is a no-op. Fails with
    /// [`Error::TypeConflict`] if the type name is unknown or the tag
    /// already belongs to another type.
    pub fn register(&mut self, tag: u8, type_name: &str) -> Result<()> {
        let kind = ValueKind::from_name(type_name).ok_or_else(|| {
            Error::type_conflict(format!("type {} has no constructor", type_name))
        })?;
        self.register_kind(tag, kind)
    }

    /// Register `tag` as an encoding of `kind`.
    pub fn register_kind(&mut self, tag: u8, kind: ValueKind) -> Result<()> {
        match self.tags[tag as usize] {
            Some(existing) if existing != kind => Err(Error::type_conflict(format!(
                "tag 0x{:02x} is already registered to type {}",
                tag, existing
            ))),
            _ => {
                self.tags[tag as usize] = Some(kind);
                Ok(())
            }
        }
    }

    /// Kind a tag decodes as.
    pub fn kind_for_tag(&self, tag: u8) -> Option<ValueKind> {
        self.tags[tag as usize]
    }

    /// Whether any kind is registered for `tag`.
    pub fn is_tag_registered(&self, tag: u8) -> bool {
        self.tags[tag as usize].is_some()
    }

    /// Whether a type of this name exists and owns at least one tag.
    pub fn is_type_registered(&self, type_name: &str) -> bool {
        ValueKind::from_name(type_name)
            .is_some_and(|kind| self.tags.iter().any(|t| *t == Some(kind)))
    }

    /// All tags registered to `kind`, ascending.
    pub fn tags_for(&self, kind: ValueKind) -> impl Iterator<Item = u8> + '_ {
        (0..=u8::MAX).filter(move |&t| self.tags[t as usize] == Some(kind))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.tags
                    .iter()
                    .enumerate()
                    .filter_map(|(t, k)| k.map(|k| (format!("0x{:02x}", t), k))),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::Decoder;
    use crate::value::{Data, Value};

    #[test]
    fn test_builtin_tags() {
        let reg = default_registry();
        assert_eq!(reg.kind_for_tag(0x02), Some(ValueKind::Integer));
        assert_eq!(reg.kind_for_tag(0x46), Some(ValueKind::Counter64));
        assert_eq!(reg.kind_for_tag(0x81), Some(ValueKind::Null));
        assert_eq!(reg.kind_for_tag(0x45), None);
        assert!(reg.is_type_registered("TimeTicks"));
        assert!(!reg.is_type_registered("Gauge64"));
        assert_eq!(
            reg.tags_for(ValueKind::Null).collect::<Vec<_>>(),
            vec![0x05, 0x80, 0x81, 0x82]
        );
    }

    #[test]
    fn test_register_alias() {
        let mut reg = TypeRegistry::builtin();
        reg.register(0x47, "Integer").unwrap();
        // idempotent
        reg.register(0x47, "Integer").unwrap();
        assert!(reg.is_tag_registered(0x47));

        let mut dec = Decoder::from_slice(&[0x47, 0x02, 0x11, 0x22]);
        let data = Data::decode_with(&reg, &mut dec).unwrap();
        assert_eq!(data.tag(), 0x47);
        assert_eq!(data.value(), &Value::Integer(4386));
    }

    #[test]
    fn test_register_conflicts() {
        let mut reg = TypeRegistry::builtin();
        assert!(matches!(
            reg.register(0x02, "OctetString"),
            Err(Error::TypeConflict { .. })
        ));
        assert!(matches!(
            reg.register(0x50, "Float"),
            Err(Error::TypeConflict { .. })
        ));
        assert!(!reg.is_tag_registered(0x50));
    }

    #[test]
    fn test_with_tag_checks_registry() {
        let reg = TypeRegistry::builtin();
        assert!(Data::with_tag(&reg, 0x80, Value::NULL).is_ok());
        assert!(Data::with_tag(&reg, 0x02, Value::NULL).is_err());
        assert!(Data::with_tag(&reg, 0x47, Value::Integer(1)).is_err());
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let reg = TypeRegistry::empty();
        let mut dec = Decoder::from_slice(&[0x02, 0x01, 0x01]);
        assert!(Data::decode_with(&reg, &mut dec).is_err());
        assert!(!reg.is_type_registered("Integer"));
    }
}
