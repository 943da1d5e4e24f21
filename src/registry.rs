//! The set of scene variants driven by one controller.

use crate::variant::SceneVariant;

/// Handle to a registered [`SceneVariant`].
///
/// Each slot carries a generation that advances whenever the slot is freed, so
/// a handle kept after [`VariantRegistry::unregister`] never reaches a variant
/// registered later in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VariantId {
    index: u32,
    generation: u32,
}

impl VariantId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    variant: Option<SceneVariant>,
}

/// Generational slot storage for [`SceneVariant`]s, keyed by name uniqueness.
#[derive(Clone, Debug, Default)]
pub struct VariantRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id of the registered variant called `name`, if any.
    pub fn find(&self, name: &str) -> Option<VariantId> {
        self.iter()
            .find(|(_, variant)| variant.name() == name)
            .map(|(id, _)| id)
    }

    /// Adds `variant`, reusing a freed slot when there is one.
    ///
    /// A variant whose name is already registered is not added again; the
    /// existing id is returned and `false` signals the duplicate.
    pub fn register(&mut self, variant: SceneVariant) -> (VariantId, bool) {
        if let Some(existing) = self.find(variant.name()) {
            return (existing, false);
        }

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.variant = Some(variant);
            return (
                VariantId {
                    index,
                    generation: slot.generation,
                },
                true,
            );
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            variant: Some(variant),
        });
        (VariantId { index, generation: 0 }, true)
    }

    /// Removes and returns the variant behind `id`; stale ids return `None`.
    pub fn unregister(&mut self, id: VariantId) -> Option<SceneVariant> {
        let slot = self.slot_mut(id)?;
        let variant = slot.variant.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(variant)
    }

    pub fn contains(&self, id: VariantId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: VariantId) -> Option<&SceneVariant> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.variant.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: VariantId) -> Option<&mut SceneVariant> {
        self.slot_mut(id).and_then(|slot| slot.variant.as_mut())
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariantId, &SceneVariant)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.variant.as_ref().map(|variant| {
                (
                    VariantId {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    variant,
                )
            })
        })
    }

    /// Mutable access is crate-private: only the controller writes uniforms.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (VariantId, &mut SceneVariant)> {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.variant.as_mut().map(|variant| {
                (
                    VariantId {
                        index: index as u32,
                        generation,
                    },
                    variant,
                )
            })
        })
    }

    /// Drops every variant. Ids handed out before stay stale forever.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.variant.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }

    fn slot_mut(&mut self, id: VariantId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        composer::{Blend, SceneDescription},
        field::FieldNode,
        variant::VariantConfig,
    };

    fn variant(name: &str) -> SceneVariant {
        let scene = SceneDescription::new(Blend::smooth(0.5)).with_prop(FieldNode::sphere(1.0));
        SceneVariant::new(VariantConfig::new(name, scene)).unwrap()
    }

    #[test]
    fn should_ignore_duplicate_names() {
        let mut registry = VariantRegistry::new();
        let (first, added) = registry.register(variant("a"));
        assert!(added);
        let (second, added) = registry.register(variant("a"));
        assert!(!added);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn should_invalidate_ids_on_unregister() {
        let mut registry = VariantRegistry::new();
        let (a, _) = registry.register(variant("a"));
        assert!(registry.unregister(a).is_some());
        assert!(registry.unregister(a).is_none());
        assert!(registry.is_empty());

        let (b, _) = registry.register(variant("b"));
        assert_eq!(b.index(), a.index());
        assert_ne!(b.generation(), a.generation());
        assert!(registry.get(a).is_none());
        assert_eq!(registry.get(b).map(SceneVariant::name), Some("b"));
    }

    #[test]
    fn should_iterate_live_variants_only() {
        let mut registry = VariantRegistry::new();
        let (a, _) = registry.register(variant("a"));
        registry.register(variant("b"));
        registry.register(variant("c"));
        registry.unregister(a);
        let names: Vec<_> = registry.iter().map(|(_, v)| v.name().to_owned()).collect();
        assert_eq!(names, ["b", "c"]);
    }

    #[test]
    fn should_stale_all_ids_on_clear() {
        let mut registry = VariantRegistry::new();
        let (a, _) = registry.register(variant("a"));
        let (b, _) = registry.register(variant("b"));
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains(a));
        assert!(!registry.contains(b));
        let (c, _) = registry.register(variant("c"));
        assert!(registry.contains(c));
        assert_eq!(registry.len(), 1);
    }
}
