use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use dc_app::*;
use dc_core::EntityId;
use dc_frames::LoadType;
use dc_query::{EncodeOptions, FilterClause, FilterRequest, ListOptions, Query, with_query};
use dc_store::{Entity, EntityKind, Store};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::task::yield_now;

/// Backend whose responses are handed out in request order from a queue.
#[derive(Default)]
struct ScriptedBackend {
    requests: RefCell<Vec<String>>,
    deleted: RefCell<Vec<String>>,
    responses: RefCell<VecDeque<oneshot::Receiver<AppResult<Value>>>>,
}

impl ScriptedBackend {
    /// Queue a response the test resolves later.
    fn pending(&self) -> oneshot::Sender<AppResult<Value>> {
        let (tx, rx) = oneshot::channel();
        self.responses.borrow_mut().push_back(rx);
        tx
    }

    fn ready(&self, body: Value) {
        let _ = self.pending().send(Ok(body));
    }

    fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

#[async_trait(?Send)]
impl Backend for ScriptedBackend {
    async fn get_json(&self, route: &str, query: Option<&Query>) -> AppResult<Value> {
        self.requests
            .borrow_mut()
            .push(with_query(route, query, EncodeOptions::default()));
        let response = self.responses.borrow_mut().pop_front();
        match response {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(AppError::InvalidInput("response dropped".into()))),
            None => Err(AppError::InvalidInput(format!("unexpected request {route}"))),
        }
    }

    async fn delete(&self, route: &str) -> AppResult<()> {
        self.deleted.borrow_mut().push(route.to_string());
        Ok(())
    }
}

fn service() -> ModelService<ScriptedBackend> {
    ModelService::new(ScriptedBackend::default(), shared_store(Store::new()))
}

fn frame_json(value: f64) -> Value {
    let months: serde_json::Map<String, Value> = (1..=12)
        .map(|m: u32| (m.to_string(), json!(vec![value; 24])))
        .collect();
    Value::Object(months)
}

fn group_with_average(id: i64) -> Value {
    json!({"id": id, "name": format!("group {id}"), "data": {"average": frame_json(1.0)}})
}

fn wants_average() -> FilterRequest {
    FilterRequest::new().data_type(LoadType::Average)
}

fn cached(service: &ModelService<ScriptedBackend>, id: i64) -> Option<Entity> {
    service
        .store()
        .borrow()
        .select_by_id(EntityKind::MeterGroup, &EntityId::Int(id))
        .cloned()
}

#[tokio::test(flavor = "current_thread")]
async fn detail_fetch_populates_store_then_skips() {
    let service = service();
    let site = service.site("group detail");
    service.backend().ready(group_with_average(1));

    let id = EntityId::Int(1);
    let options = ListOptions::default();
    let outcome = service
        .load_entity(&site, EntityKind::MeterGroup, &id, &wants_average(), &options)
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        service.backend().requests.borrow()[0],
        "/load/meter_group/1/?data_types[]=average"
    );

    let again = service
        .load_entity(&site, EntityKind::MeterGroup, &id, &wants_average(), &options)
        .await;
    assert!(matches!(again, FetchOutcome::Skipped));
    assert_eq!(service.backend().request_count(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn at_most_one_fetch_in_flight_per_site() {
    let service = service();
    let site = service.site("group detail");
    let tx = service.backend().pending();

    let id = EntityId::Int(1);
    let filter = wants_average();
    let options = ListOptions::default();

    let first = service.load_entity(&site, EntityKind::MeterGroup, &id, &filter, &options);
    let second = service.load_entity(&site, EntityKind::MeterGroup, &id, &filter, &options);
    let resolve = async {
        yield_now().await;
        let _ = tx.send(Ok(group_with_average(1)));
    };
    let (first, second, ()) = tokio::join!(first, second, resolve);

    assert!(first.is_completed());
    assert!(matches!(second, FetchOutcome::Dropped));
    assert_eq!(service.backend().request_count(), 1);
    assert_eq!(site.state(), FetchState::Idle);
}

#[tokio::test(flavor = "current_thread")]
async fn dependency_change_discards_stale_response() {
    let service = service();
    let site = service.site("group detail");
    let tx_old = service.backend().pending();
    let tx_new = service.backend().pending();

    let old_id = EntityId::Int(1);
    let new_id = EntityId::Int(2);
    let filter = wants_average();
    let options = ListOptions::default();

    let old = service.load_entity(&site, EntityKind::MeterGroup, &old_id, &filter, &options);
    let new = async {
        yield_now().await;
        service
            .load_entity(&site, EntityKind::MeterGroup, &new_id, &filter, &options)
            .await
    };
    let resolve = async {
        yield_now().await;
        yield_now().await;
        let _ = tx_old.send(Ok(group_with_average(1)));
        let _ = tx_new.send(Ok(group_with_average(2)));
    };
    let (old, new, ()) = tokio::join!(old, new, resolve);

    assert!(matches!(old, FetchOutcome::Discarded));
    assert!(new.is_completed());
    assert!(cached(&service, 1).is_none());
    assert!(cached(&service, 2).is_some());
    assert_eq!(service.backend().request_count(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn teardown_discards_in_flight_response() {
    let service = service();
    let site = service.site("group detail");
    let tx = service.backend().pending();

    let id = EntityId::Int(1);
    let filter = wants_average();
    let options = ListOptions::default();

    let fetch = service.load_entity(&site, EntityKind::MeterGroup, &id, &filter, &options);
    let unmount = async {
        yield_now().await;
        assert!(site.is_fetching());
        site.teardown();
        let _ = tx.send(Ok(group_with_average(1)));
    };
    let (outcome, ()) = tokio::join!(fetch, unmount);

    assert!(matches!(outcome, FetchOutcome::Discarded));
    assert!(cached(&service, 1).is_none());
    assert_eq!(site.state(), FetchState::Idle);
}

#[tokio::test(flavor = "current_thread")]
async fn failure_leaves_store_and_site_reusable() {
    let service = service();
    let site = service.site("group detail");
    let _ = service.backend().pending().send(Err(AppError::Status {
        status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        route: "/load/meter_group/1/".into(),
    }));

    let id = EntityId::Int(1);
    let filter = wants_average();
    let options = ListOptions::default();

    let outcome = service
        .load_entity(&site, EntityKind::MeterGroup, &id, &filter, &options)
        .await;
    assert_eq!(
        outcome.error().and_then(AppError::status),
        Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)
    );
    assert!(service.store().borrow().is_empty());
    assert_eq!(site.state(), FetchState::Idle);

    service.backend().ready(group_with_average(1));
    let retry = service
        .load_entity(&site, EntityKind::MeterGroup, &id, &filter, &options)
        .await;
    assert!(retry.is_completed());
}

#[tokio::test(flavor = "current_thread")]
async fn malformed_response_fails_without_mutation() {
    let service = service();
    let site = service.site("scenario list");
    service.backend().ready(json!({"results": {"meters": [{"id": 1}]}}));

    let outcome = service
        .load_list(&site, EntityKind::Scenario, &FilterRequest::new(), &ListOptions::default())
        .await;
    assert!(matches!(outcome.error(), Some(AppError::Malformed { .. })));
    assert!(service.store().borrow().is_empty());
}

#[tokio::test(flavor = "current_thread")]
async fn list_with_sideloads_and_pinned_ids() {
    let service = service();
    let site = service.site("group list");
    service.backend().ready(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": {
            "meter_groups": [group_with_average(1), group_with_average(2)],
            "meters": [{"id": 10}],
        },
    }));

    let filter = wants_average().clause(FilterClause::one_of("id", [1, 2]));
    let options = ListOptions {
        include: vec!["meters".into()],
        ..ListOptions::default()
    };
    let outcome = service
        .load_list(&site, EntityKind::MeterGroup, &filter, &options)
        .await;
    assert!(outcome.is_completed());
    assert_eq!(
        service.backend().requests.borrow()[0],
        "/load/meter_group/?data_types[]=average&filter{id.in}=1&filter{id.in}=2&include[]=meters"
    );
    assert_eq!(service.store().borrow().len(EntityKind::MeterGroup), 2);
    assert_eq!(service.store().borrow().len(EntityKind::Meter), 1);

    let again = service
        .load_list(&site, EntityKind::MeterGroup, &filter, &options)
        .await;
    assert!(matches!(again, FetchOutcome::Skipped));
}

#[tokio::test(flavor = "current_thread")]
async fn partial_fetch_keeps_previous_tags() {
    let service = service();
    let site = service.site("group detail");
    service.backend().ready(group_with_average(1));
    service.backend().ready(json!({"id": 1, "data": {"maximum": frame_json(2.0)}}));

    let id = EntityId::Int(1);
    let options = ListOptions::default();
    service
        .load_entity(&site, EntityKind::MeterGroup, &id, &wants_average(), &options)
        .await;
    let maximum = FilterRequest::new().data_type(LoadType::Maximum);
    service
        .load_entity(&site, EntityKind::MeterGroup, &id, &maximum, &options)
        .await;

    let group = cached(&service, 1).unwrap();
    assert!(group.data.contains(LoadType::Average));
    assert!(group.data.contains(LoadType::Maximum));
    assert_eq!(group.name(), Some("group 1"));
}

#[tokio::test(flavor = "current_thread")]
async fn paging_and_delete() {
    let service = service();
    service.backend().ready(json!({
        "count": 3, "next": "page2", "previous": null,
        "results": [{"id": 1}, {"id": 2}],
    }));
    service.backend().ready(json!({
        "count": 3, "next": null, "previous": "page1",
        "results": [{"id": 3}],
    }));

    let fetched = service
        .fetch_all_pages(EntityKind::Scenario, &FilterRequest::new(), &ListOptions::default(), 2)
        .await
        .unwrap();
    assert_eq!(fetched, 3);
    assert_eq!(
        service.backend().requests.borrow()[1],
        "/cost/scenario/?page=2&page_size=2"
    );

    service
        .delete(EntityKind::Scenario, &EntityId::Int(2))
        .await
        .unwrap();
    assert_eq!(
        service.backend().deleted.borrow().as_slice(),
        ["/cost/scenario/2/".to_string()]
    );
    let ids: Vec<EntityId> = service
        .store()
        .borrow()
        .select_all(EntityKind::Scenario)
        .iter()
        .map(|e| e.id.clone())
        .collect();
    assert_eq!(ids, [EntityId::Int(1), EntityId::Int(3)]);
}
