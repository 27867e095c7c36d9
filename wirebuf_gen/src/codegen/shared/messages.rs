//! Message ID allocation and the request/response endpoint catalog.

use indexmap::IndexMap;
use serde_derive::Serialize;
use tracing::debug;
use wirebuf_types::{Document, Role};

use super::naming::title;

/// Assigns dense message IDs to logical names in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct MessageIdAllocator {
    ids: IndexMap<String, u32>,
}

impl MessageIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// ID of `logical_name`, allocating the next one on first sight.
    pub fn assign(&mut self, logical_name: &str) -> u32 {
        let next = self.ids.len() as u32;
        *self.ids.entry(logical_name.to_string()).or_insert(next)
    }

    pub fn get(&self, logical_name: &str) -> Option<u32> {
        self.ids.get(logical_name).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub struct_name: String,
    pub logical_name: String,
    pub message_id: u32,
}

/// Everything a back-end needs to render the dispatch scaffold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageCatalog {
    pub package: String,
    /// `(logical name, id)` in ID order.
    pub ids: Vec<(String, u32)>,
    pub requests: Vec<Endpoint>,
    pub responses: Vec<Endpoint>,
}

impl MessageCatalog {
    pub fn build(document: &Document, allocator: &mut MessageIdAllocator) -> Self {
        let mut requests = Vec::new();
        let mut responses = Vec::new();

        for s in document.message_structs() {
            let Some(logical_name) = s.logical_name() else {
                continue;
            };
            let endpoint = Endpoint {
                struct_name: s.name.clone(),
                logical_name: logical_name.to_string(),
                message_id: allocator.assign(logical_name),
            };
            debug!(
                struct_name = %endpoint.struct_name,
                message_id = endpoint.message_id,
                "assigned message id"
            );
            match s.role() {
                Role::Request => requests.push(endpoint),
                Role::Response => responses.push(endpoint),
                Role::Plain => {}
            }
        }

        Self {
            package: document.package.clone(),
            ids: allocator
                .iter()
                .map(|(name, id)| (name.to_string(), id))
                .collect(),
            requests,
            responses,
        }
    }

    /// Name of the collaborator service ID constant (`ServiceID_Module1`).
    pub fn service_id_name(&self) -> String {
        format!("ServiceID_{}", title(&self.package))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wirebuf_types::{Field, Kind, StructDef};

    fn ping_document() -> Document {
        Document::new(
            "module1",
            vec![
                StructDef::new("Module1", vec![]),
                StructDef::new("PingReq", vec![Field::new("Seq", Kind::Int32)]),
                StructDef::new(
                    "PingRsp",
                    vec![Field::new("Seq", Kind::Int32), Field::new("Ok", Kind::Bool)],
                ),
            ],
        )
    }

    #[test]
    fn ping_pair_shares_id_zero() {
        let catalog = MessageCatalog::build(&ping_document(), &mut MessageIdAllocator::new());
        assert_eq!(catalog.ids, vec![("Ping".to_string(), 0)]);
        assert_eq!(catalog.requests[0].struct_name, "PingReq");
        assert_eq!(catalog.responses[0].message_id, 0);
        assert_eq!(catalog.service_id_name(), "ServiceID_Module1");
    }

    #[test]
    fn ids_are_dense_in_first_occurrence_order() {
        let doc = Document::new(
            "game",
            vec![
                StructDef::new("MoveRsp", vec![]),
                StructDef::new("Item", vec![]),
                StructDef::new("LoginReq", vec![]),
                StructDef::new("MoveReq", vec![]),
                StructDef::new("Game", vec![]),
                StructDef::new("ChatRsp", vec![]),
                StructDef::new("Hello", vec![]).with_role(Role::Request),
            ],
        );
        let catalog = MessageCatalog::build(&doc, &mut MessageIdAllocator::new());
        let ids: Vec<_> = catalog
            .ids
            .iter()
            .map(|(n, id)| (n.as_str(), *id))
            .collect();
        assert_eq!(
            ids,
            vec![("Move", 0), ("Login", 1), ("Chat", 2), ("Hello", 3)]
        );
        assert_eq!(catalog.requests.len(), 3);
        assert_eq!(catalog.responses.len(), 2);
    }

    #[test]
    fn allocator_is_stable() {
        let mut allocator = MessageIdAllocator::new();
        assert_eq!(allocator.assign("A"), 0);
        assert_eq!(allocator.assign("B"), 1);
        assert_eq!(allocator.assign("A"), 0);
        assert_eq!(allocator.get("B"), Some(1));
        assert_eq!(allocator.get("C"), None);
        assert_eq!(allocator.len(), 2);
    }
}
