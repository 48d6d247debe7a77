//! Id-keyed node storage with a name index
//!
//! Every collection in the study and data trees lives in a [`NodeMap`]: a single
//! insertion-ordered store keyed by id, with a secondary name→id index maintained
//! alongside it. Lookups by id and by name therefore always agree.

use crate::domain::errors::CastorError;
use crate::domain::result::Result;
use std::collections::HashMap;

/// A tree node addressable by id and optionally by name
pub trait Node {
    /// Unique identifier within the owning map
    fn key(&self) -> &str;

    /// Unique human name within the owning map, if the node has one
    fn name(&self) -> Option<&str>;
}

/// Insertion-ordered node store with id and name lookup
#[derive(Debug, Clone)]
pub struct NodeMap<T> {
    nodes: Vec<T>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, String>,
}

impl<T> Default for NodeMap<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            by_id: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<T: Node> NodeMap<T> {
    /// Creates an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, failing on a duplicate id or name
    pub fn insert(&mut self, node: T) -> Result<&mut T> {
        let id = node.key().to_string();
        if self.by_id.contains_key(&id) {
            return Err(CastorError::structural(format!("duplicate id '{id}'")));
        }
        if let Some(name) = node.name() {
            if let Some(existing) = self.by_name.get(name) {
                return Err(CastorError::structural(format!(
                    "duplicate name '{name}' on ids '{existing}' and '{id}'"
                )));
            }
            self.by_name.insert(name.to_string(), id.clone());
        }
        let index = self.nodes.len();
        self.by_id.insert(id, index);
        self.nodes.push(node);
        Ok(&mut self.nodes[index])
    }

    /// Returns the node with `id`, inserting the result of `create` first if absent
    pub fn get_or_insert_with<F>(&mut self, id: &str, create: F) -> Result<&mut T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(&index) = self.by_id.get(id) {
            return Ok(&mut self.nodes[index]);
        }
        self.insert(create()?)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.by_id.get(id) {
            Some(&index) => Some(&mut self.nodes[index]),
            None => None,
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<&T> {
        self.by_name.get(name).and_then(|id| self.get(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Position of a node in insertion order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Node at an insertion-order position
    pub fn at(&self, index: usize) -> Option<&T> {
        self.nodes.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item {
        id: String,
        name: Option<String>,
    }

    impl Item {
        fn new(id: &str, name: Option<&str>) -> Self {
            Self {
                id: id.to_string(),
                name: name.map(str::to_string),
            }
        }
    }

    impl Node for Item {
        fn key(&self) -> &str {
            &self.id
        }

        fn name(&self) -> Option<&str> {
            self.name.as_deref()
        }
    }

    #[test]
    fn test_lookup_by_id_and_name_agree() {
        let mut map = NodeMap::new();
        map.insert(Item::new("F1", Some("pat_sex"))).unwrap();
        map.insert(Item::new("F2", Some("pat_age"))).unwrap();

        for item in map.iter() {
            let by_id = map.get(&item.id).unwrap();
            let by_name = map.get_by_name(item.name.as_deref().unwrap()).unwrap();
            assert!(std::ptr::eq(by_id, by_name));
        }
        assert_eq!(map.len(), 2);
        assert_eq!(map.position("F2"), Some(1));
    }

    #[test]
    fn test_duplicate_id_is_structural_error() {
        let mut map = NodeMap::new();
        map.insert(Item::new("F1", Some("a"))).unwrap();
        let err = map.insert(Item::new("F1", Some("b"))).unwrap_err();
        assert!(matches!(err, CastorError::StructuralIntegrity(_)));
    }

    #[test]
    fn test_duplicate_name_is_structural_error() {
        let mut map = NodeMap::new();
        map.insert(Item::new("F1", Some("a"))).unwrap();
        let err = map.insert(Item::new("F2", Some("a"))).unwrap_err();
        assert!(matches!(err, CastorError::StructuralIntegrity(_)));
        assert!(!map.contains("F2"));
    }

    #[test]
    fn test_unnamed_nodes_skip_name_index() {
        let mut map = NodeMap::new();
        map.insert(Item::new("I1", None)).unwrap();
        map.insert(Item::new("I2", None)).unwrap();
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_or_insert_with_creates_once() {
        let mut map: NodeMap<Item> = NodeMap::new();
        map.get_or_insert_with("R1", || Ok(Item::new("R1", None)))
            .unwrap();
        map.get_or_insert_with("R1", || panic!("must not be called"))
            .unwrap();
        assert_eq!(map.len(), 1);
    }
}
