use nlsql::graph::{format_path, SchemaGraph};
use nlsql::schema::{Relation, RelationKind, Schema, SchemaEntity};

/// A → B → D and A → C → D, plus a D → A back edge.
fn diamond() -> Schema {
    Schema::new(vec![
        SchemaEntity::new("A", "a")
            .with_relation(Relation::new("b", "B", RelationKind::ManyToOne))
            .with_relation(Relation::new("c", "C", RelationKind::ManyToOne)),
        SchemaEntity::new("B", "b").with_relation(Relation::new("d", "D", RelationKind::ManyToOne)),
        SchemaEntity::new("C", "c").with_relation(Relation::new("d", "D", RelationKind::ManyToOne)),
        SchemaEntity::new("D", "d").with_relation(Relation::new("a", "A", RelationKind::ManyToOne)),
    ])
}

fn entity<'a>(schema: &'a Schema, name: &str) -> &'a SchemaEntity {
    schema.entity(name).unwrap()
}

#[test]
fn test_all_simple_paths_shortest_first() {
    let schema = diamond();
    let graph = SchemaGraph::new(&schema);

    let paths = graph.find_paths(entity(&schema, "A"), entity(&schema, "D"));
    let rendered: Vec<String> = paths.iter().map(format_path).collect();

    assert_eq!(rendered, vec!["A → B → D", "A → C → D"]);
    assert!(paths.iter().all(|p| p.len() == 2));
}

#[test]
fn test_cycle_does_not_loop() {
    let schema = diamond();
    let graph = SchemaGraph::new(&schema);

    let paths = graph.find_paths(entity(&schema, "B"), entity(&schema, "C"));
    assert_eq!(paths.len(), 1);
    assert_eq!(format_path(&paths[0]), "B → D → A → C");
}

#[test]
fn test_depth_bound() {
    let schema = diamond();

    let shallow = SchemaGraph::with_max_depth(&schema, 2);
    assert!(shallow.find_paths(entity(&schema, "B"), entity(&schema, "C")).is_empty());
    assert!(shallow.has_path(entity(&schema, "A"), entity(&schema, "D")));

    let none = SchemaGraph::with_max_depth(&schema, 0);
    assert!(!none.has_path(entity(&schema, "A"), entity(&schema, "B")));
}

#[test]
fn test_shortest_path_is_stable() {
    let schema = diamond();
    let graph = SchemaGraph::new(&schema);

    let first = graph.shortest_path(entity(&schema, "A"), entity(&schema, "D")).unwrap();
    let second = graph.shortest_path(entity(&schema, "A"), entity(&schema, "D")).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.key(), "A>B>D");
}

#[test]
fn test_relation_to_unknown_entity_is_ignored() {
    let schema = Schema::new(vec![
        SchemaEntity::new("A", "a").with_relation(Relation::new("ghost", "Ghost", RelationKind::OneToMany)),
    ]);
    let graph = SchemaGraph::new(&schema);

    assert_eq!(graph.entity_count(), 1);
    assert_eq!(graph.relation_count(), 0);
}
