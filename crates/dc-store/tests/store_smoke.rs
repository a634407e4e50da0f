use dc_core::EntityId;
use dc_frames::LoadType;
use dc_query::{FilterClause, FilterRequest};
use dc_store::*;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn backend_payloads_land_in_the_store() {
    let mut store = Store::new();

    let list = json!([
        {"id": 1, "name": "Residential", "meters": [10, 11]},
        {"id": 2, "name": "Commercial", "meters": []},
    ]);
    let groups = list
        .as_array()
        .unwrap()
        .iter()
        .map(|v| Entity::from_json(EntityKind::MeterGroup, v.clone()).unwrap());
    store.upsert_many(groups);
    store.upsert(Entity::from_json(EntityKind::Meter, json!({"id": 10, "sa_id": 7})).unwrap());

    assert_eq!(store.len(EntityKind::MeterGroup), 2);

    let residential = store
        .select_by_id(EntityKind::MeterGroup, &EntityId::Int(1))
        .unwrap();
    let meters = store.select_related(residential, "meters", EntityKind::Meter);
    assert_eq!(meters.len(), 1);
    assert_eq!(meters[0].field("sa_id"), Some(&json!(7)));
}

#[test]
fn detail_fetch_with_data_satisfies_later_requests() {
    let mut store = Store::new();
    store.upsert(Entity::from_json(EntityKind::MeterGroup, json!({"id": 1, "name": "g"})).unwrap());

    let wants_average = FilterRequest::new().data_type(LoadType::Average);
    let cached = store.select_by_id(EntityKind::MeterGroup, &EntityId::Int(1));
    assert!(!is_satisfied(cached, &wants_average));

    let zeros: Vec<Vec<f64>> = vec![vec![0.0; 24]; 12];
    let months: serde_json::Map<String, serde_json::Value> = (1..=12)
        .map(|m| (m.to_string(), json!(zeros[m - 1])))
        .collect();
    store.upsert(
        Entity::from_json(
            EntityKind::MeterGroup,
            json!({"id": 1, "data": {"average": months}}),
        )
        .unwrap(),
    );

    let cached = store.select_by_id(EntityKind::MeterGroup, &EntityId::Int(1));
    assert!(is_satisfied(cached, &wants_average));
    assert_eq!(cached.and_then(Entity::name), Some("g"));

    let pinned = wants_average.clause(FilterClause::eq("id", 1));
    assert!(is_list_satisfied(&store, EntityKind::MeterGroup, &pinned));
}

fn leaf() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i32>().prop_map(serde_json::Value::from),
        "[a-z]{0,4}".prop_map(serde_json::Value::from),
    ]
}

fn value() -> impl Strategy<Value = serde_json::Value> {
    leaf().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::from),
            prop::collection::btree_map("[a-c]", inner, 0..4).prop_map(|m| {
                serde_json::Value::Object(m.into_iter().collect())
            }),
        ]
    })
}

fn fields() -> impl Strategy<Value = serde_json::Map<String, serde_json::Value>> {
    prop::collection::btree_map("[a-d]", value(), 0..5).prop_map(|m| m.into_iter().collect())
}

fn entity(fields: serde_json::Map<String, serde_json::Value>) -> Entity {
    let mut e = Entity::new(EntityKind::Scenario, 1);
    e.fields = fields;
    e
}

proptest! {
    #[test]
    fn upsert_twice_equals_upsert_once(f in fields()) {
        let mut once = Store::new();
        once.upsert(entity(f.clone()));
        let mut twice = once.clone();
        twice.upsert(entity(f));

        prop_assert_eq!(
            once.select_all(EntityKind::Scenario),
            twice.select_all(EntityKind::Scenario)
        );
    }

    #[test]
    fn merge_keeps_every_existing_key(old in fields(), new in fields()) {
        let mut store = Store::new();
        store.upsert(entity(old.clone()));
        store.upsert(entity(new.clone()));

        let merged = store
            .select_by_id(EntityKind::Scenario, &EntityId::Int(1))
            .unwrap();
        for key in old.keys().chain(new.keys()) {
            prop_assert!(merged.fields.contains_key(key));
        }
    }
}
