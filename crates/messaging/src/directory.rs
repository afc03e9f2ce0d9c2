//! Private ↔ public agent identities

use std::collections::BTreeMap;

use agora_core::{PrivateId, PublicId};

/// Assigns dense, sequential public ids in registration order
#[derive(Debug, Default)]
pub struct IdentityDirectory {
    public: BTreeMap<PrivateId, PublicId>,
    private: BTreeMap<PublicId, PrivateId>,
    names: BTreeMap<PublicId, String>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a private id, returning its public id and whether it is new
    pub fn register(&mut self, private_id: PrivateId, name: Option<String>) -> (PublicId, bool) {
        if let Some(public_id) = self.public.get(&private_id) {
            return (*public_id, false);
        }

        let public_id = PublicId(self.public.len() as u32);
        self.public.insert(private_id, public_id);
        self.private.insert(public_id, private_id);
        if let Some(name) = name {
            self.names.insert(public_id, name);
        }
        (public_id, true)
    }

    pub fn public_id(&self, private_id: PrivateId) -> Option<PublicId> {
        self.public.get(&private_id).copied()
    }

    pub fn private_id(&self, public_id: PublicId) -> Option<PrivateId> {
        self.private.get(&public_id).copied()
    }

    pub fn name(&self, public_id: PublicId) -> Option<&str> {
        self.names.get(&public_id).map(String::as_str)
    }

    pub fn names(&self) -> &BTreeMap<PublicId, String> {
        &self.names
    }

    /// Registered agents in public id order
    pub fn agents(&self) -> Vec<PublicId> {
        self.private.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.public.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_sequential_ids() {
        let mut directory = IdentityDirectory::new();
        let ids: Vec<PublicId> = (0..3)
            .map(|_| directory.register(PrivateId::new(), None).0)
            .collect();

        assert_eq!(ids, vec![PublicId(0), PublicId(1), PublicId(2)]);
        assert_eq!(directory.agents(), ids);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut directory = IdentityDirectory::new();
        let private_id = PrivateId::new();

        assert_eq!(directory.register(private_id, Some("a".into())), (PublicId(0), true));
        assert_eq!(directory.register(private_id, Some("b".into())), (PublicId(0), false));
        assert_eq!(directory.len(), 1);
        assert_eq!(directory.name(PublicId(0)), Some("a"));
        assert_eq!(directory.private_id(PublicId(0)), Some(private_id));
    }
}
