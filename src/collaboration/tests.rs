//! Collaboration Module Tests
//!
//! Validates identity types and roster lookups.

#[cfg(test)]
mod tests {
    use crate::collaboration::types::{Collaboration, NodeId, OrganizationId, SessionId};
    use std::collections::HashSet;

    // ============================================================
    // IDENTITY TESTS
    // ============================================================

    #[test]
    fn test_node_id_is_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();

        assert_ne!(id1, id2, "Each NodeId should be unique");
    }

    #[test]
    fn test_organization_id_parse_and_display() {
        let org: OrganizationId = " 42 ".parse().unwrap();

        assert_eq!(org, OrganizationId(42));
        assert_eq!(org.to_string(), "42");
        assert!("abc".parse::<OrganizationId>().is_err());
    }

    #[test]
    fn test_identifiers_serialize_transparently() {
        let json = serde_json::to_string(&(OrganizationId(3), SessionId("s1".into()))).unwrap();

        assert_eq!(json, r#"[3,"s1"]"#);
    }

    #[test]
    fn test_organization_id_hash() {
        let mut set = HashSet::new();
        set.insert(OrganizationId(1));
        set.insert(OrganizationId(1));
        set.insert(OrganizationId(2));

        assert_eq!(set.len(), 2);
    }

    // ============================================================
    // ROSTER TESTS
    // ============================================================

    #[test]
    fn test_collaboration_lookups() {
        let collaboration = Collaboration::new(
            [OrganizationId(2), OrganizationId(3)],
            [SessionId("1".into())],
        );

        assert!(collaboration.has_organization(&OrganizationId(2)));
        assert!(!collaboration.has_organization(&OrganizationId(9)));
        assert!(collaboration.has_session(&SessionId("1".into())));
        assert!(!collaboration.has_session(&SessionId("2".into())));
    }

    #[test]
    fn test_first_unknown_target() {
        let collaboration = Collaboration::new([OrganizationId(2), OrganizationId(3)], []);
        let known = [OrganizationId(2), OrganizationId(3)];
        let mixed = [OrganizationId(2), OrganizationId(7)];

        assert_eq!(collaboration.first_unknown(known.iter()), None);
        assert_eq!(collaboration.first_unknown(mixed.iter()), Some(OrganizationId(7)));
    }
}
