use crate::{errors::RelayError, models::tracks::TrackNamespace};
use std::collections::HashMap;

type PublisherId = usize;

#[derive(Debug, Default)]
struct Node {
    publisher: Option<PublisherId>,
    children: HashMap<String, Node>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.publisher.is_none() && self.children.is_empty()
    }
}

/// Prefix tree mapping registered track namespaces to publishers.
///
/// Resolution is strict longest-prefix matching over namespace components;
/// no wildcards.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    root: Node,
}

impl NamespaceIndex {
    pub fn new() -> Self {
        Self {
            root: Node::default(),
        }
    }

    pub fn insert(
        &mut self,
        namespace: &TrackNamespace,
        publisher: PublisherId,
    ) -> Result<(), RelayError> {
        let mut node = &mut self.root;
        for component in namespace.components() {
            node = node.children.entry(component.clone()).or_default();
        }

        if node.publisher.is_some() {
            return Err(RelayError::DuplicateRegistration);
        }

        node.publisher = Some(publisher);
        Ok(())
    }

    pub fn remove(&mut self, namespace: &TrackNamespace) -> Option<PublisherId> {
        let publisher = Self::remove_at(&mut self.root, namespace.components());
        if publisher.is_some() {
            tracing::debug!("unregistered namespace: {:?}", namespace.components());
        }
        publisher
    }

    // Recursive so empty interior nodes can be pruned on the way back up.
    fn remove_at(node: &mut Node, components: &[String]) -> Option<PublisherId> {
        match components.split_first() {
            None => node.publisher.take(),
            Some((head, rest)) => {
                let child = node.children.get_mut(head)?;
                let publisher = Self::remove_at(child, rest);
                if child.is_empty() {
                    node.children.remove(head);
                }
                publisher
            }
        }
    }

    /// Deepest registered namespace that is a prefix of `candidate`.
    pub fn resolve(&self, candidate: &TrackNamespace) -> Option<PublisherId> {
        let mut node = &self.root;
        let mut found = node.publisher;

        for component in candidate.components() {
            node = match node.children.get(component) {
                Some(child) => child,
                None => break,
            };
            if node.publisher.is_some() {
                found = node.publisher;
            }
        }

        found
    }
}

#[cfg(test)]
mod success {
    use crate::{models::tracks::TrackNamespace, namespace_index::NamespaceIndex};

    #[test]
    fn insert_and_resolve_exact() {
        let mut index = NamespaceIndex::new();
        let namespace = TrackNamespace::from(vec!["a", "b"]);

        index.insert(&namespace, 1).unwrap();

        assert_eq!(index.resolve(&namespace), Some(1));
    }

    #[test]
    fn resolve_longest_prefix() {
        let mut index = NamespaceIndex::new();
        index.insert(&TrackNamespace::from(vec!["a", "b"]), 1).unwrap();
        index
            .insert(&TrackNamespace::from(vec!["a", "b", "c"]), 2)
            .unwrap();

        let candidate = TrackNamespace::from(vec!["a", "b", "c", "d"]);
        assert_eq!(index.resolve(&candidate), Some(2));

        let shallow = TrackNamespace::from(vec!["a", "b", "x"]);
        assert_eq!(index.resolve(&shallow), Some(1));
    }

    #[test]
    fn resolve_not_found() {
        let mut index = NamespaceIndex::new();
        index.insert(&TrackNamespace::from(vec!["a", "b"]), 1).unwrap();

        assert_eq!(index.resolve(&TrackNamespace::from(vec!["a", "x"])), None);
        assert_eq!(index.resolve(&TrackNamespace::from(vec!["a"])), None);
    }

    #[test]
    fn remove() {
        let mut index = NamespaceIndex::new();
        let namespace = TrackNamespace::from(vec!["a", "b"]);
        index.insert(&namespace, 1).unwrap();

        assert_eq!(index.remove(&namespace), Some(1));
        assert_eq!(index.resolve(&namespace), None);

        // Removing again is a no-op
        assert_eq!(index.remove(&namespace), None);
    }

    #[test]
    fn remove_keeps_deeper_registration() {
        let mut index = NamespaceIndex::new();
        let shallow = TrackNamespace::from(vec!["a", "b"]);
        let deep = TrackNamespace::from(vec!["a", "b", "c"]);
        index.insert(&shallow, 1).unwrap();
        index.insert(&deep, 2).unwrap();

        index.remove(&shallow);

        assert_eq!(index.resolve(&deep), Some(2));
        assert_eq!(index.resolve(&TrackNamespace::from(vec!["a", "b", "x"])), None);
    }

    #[test]
    fn reinsert_after_remove() {
        let mut index = NamespaceIndex::new();
        let namespace = TrackNamespace::from(vec!["a"]);
        index.insert(&namespace, 1).unwrap();
        index.remove(&namespace);

        assert!(index.insert(&namespace, 2).is_ok());
        assert_eq!(index.resolve(&namespace), Some(2));
    }
}
