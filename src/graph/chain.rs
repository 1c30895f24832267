use serde::Serialize;

use crate::cache::IdentityCache;
use crate::directory::UserId;

/// One link of a friendship chain: identity plus display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    pub id: UserId,
    pub name: String,
}

/// A complete connection between two users
#[derive(Debug, Clone, Serialize)]
pub struct Connection {
    /// Ordered chain, source first, target last
    pub chain: Vec<ChainLink>,
    /// Number of edges in the chain (nodes minus one)
    #[serde(rename = "degreeCount")]
    pub degree_count: usize,
}

/// Map a raw path of ids to (id, display name) links
///
/// An id with no recorded name renders as the id itself. That only happens
/// when pagination surfaced the id but a name was never attached (or the
/// name entry was evicted in the meantime).
pub fn assemble(path: &[UserId], identities: &IdentityCache) -> Connection {
    let chain = path
        .iter()
        .map(|&id| ChainLink {
            id,
            name: identities
                .display_name(id)
                .unwrap_or_else(|| id.to_string()),
        })
        .collect();

    Connection {
        chain,
        degree_count: path.len().saturating_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_uses_recorded_names() {
        let identities = IdentityCache::new(16);
        identities.record_name(UserId(1), "Alice");
        identities.record_name(UserId(2), "Bob");

        let connection = assemble(&[UserId(1), UserId(2)], &identities);
        assert_eq!(connection.degree_count, 1);
        assert_eq!(
            connection.chain,
            vec![
                ChainLink {
                    id: UserId(1),
                    name: "Alice".to_string()
                },
                ChainLink {
                    id: UserId(2),
                    name: "Bob".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_assemble_falls_back_to_id() {
        let identities = IdentityCache::new(16);
        identities.record_name(UserId(1), "Alice");

        let connection = assemble(&[UserId(1), UserId(999)], &identities);
        assert_eq!(connection.chain[1].name, "999");
    }

    #[test]
    fn test_single_node_chain_has_zero_degrees() {
        let identities = IdentityCache::new(16);
        identities.record_name(UserId(1), "Alice");

        let connection = assemble(&[UserId(1)], &identities);
        assert_eq!(connection.degree_count, 0);
        assert_eq!(connection.chain.len(), 1);
    }

    #[test]
    fn test_connection_wire_format() {
        let identities = IdentityCache::new(16);
        identities.record_name(UserId(1), "Alice");
        identities.record_name(UserId(2), "Bob");

        let connection = assemble(&[UserId(1), UserId(2)], &identities);
        let json = serde_json::to_value(&connection).unwrap();
        assert_eq!(json["degreeCount"], 1);
        assert_eq!(json["chain"][0]["id"], 1);
        assert_eq!(json["chain"][0]["name"], "Alice");
    }
}
