use std::sync::Arc;

use super::field::ParticleField;

/// Holds the live field as a shared immutable snapshot.
///
/// Regeneration builds a complete new field and swaps it in with
/// [`FieldStore::replace`]; anyone holding an older snapshot keeps reading a
/// whole, untorn field.
#[derive(Debug, Clone)]
pub struct FieldStore {
    current: Arc<ParticleField>,
    revision: u64,
}

impl FieldStore {
    pub fn new(field: ParticleField) -> Self {
        Self {
            current: Arc::new(field),
            revision: 0,
        }
    }

    pub fn replace(&mut self, field: ParticleField) -> Arc<ParticleField> {
        self.revision += 1;
        std::mem::replace(&mut self.current, Arc::new(field))
    }

    pub fn snapshot(&self) -> Arc<ParticleField> {
        Arc::clone(&self.current)
    }

    pub fn current(&self) -> &ParticleField {
        &self.current
    }

    /// Number of replacements since construction.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::FieldStore;
    use crate::particles::{GenerationParams, ParticleField};

    #[test]
    fn old_snapshot_survives_replacement() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = GenerationParams::default();
        let first = ParticleField::generate(64, &params, &mut rng).unwrap();
        let second = ParticleField::generate(64, &params, &mut rng).unwrap();

        let mut store = FieldStore::new(first.clone());
        let held = store.snapshot();
        let previous = store.replace(second.clone());

        assert_eq!(*held, first);
        assert_eq!(*previous, first);
        assert_eq!(*store.current(), second);
        assert_eq!(store.revision(), 1);
    }
}
