//! Model loading through the cache.

use dc_core::EntityId;
use dc_query::{FilterRequest, ListOptions, Pagination, Query};
use dc_store::{EntityKind, is_list_satisfied, is_satisfied, request_fingerprint};

use crate::client::Backend;
use crate::envelope::Envelope;
use crate::error::AppResult;
use crate::fetch::{FetchOutcome, FetchSite, SharedStore};

/// Loads models for call sites and keeps the shared store current.
pub struct ModelService<B> {
    backend: B,
    store: SharedStore,
}

impl<B: Backend> ModelService<B> {
    pub fn new(backend: B, store: SharedStore) -> Self {
        Self { backend, store }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// A fresh call site over this service's store.
    pub fn site(&self, label: impl Into<String>) -> FetchSite {
        FetchSite::new(label, self.store.clone())
    }

    /// Ensure the model `kind`/`id` carries what `filter` asks for.
    pub async fn load_entity(
        &self,
        site: &FetchSite,
        kind: EntityKind,
        id: &EntityId,
        filter: &FilterRequest,
        options: &ListOptions,
    ) -> FetchOutcome {
        let query = options.build(filter);
        let deps = request_fingerprint(kind, Some(id), &query);
        let route = kind.detail_route(id);

        site.run(
            &deps,
            |store| is_satisfied(store.select_by_id(kind, id), filter),
            |_| self.get_envelope(kind, route, query),
            |store, envelope| store.upsert_many(envelope.into_entities()),
        )
        .await
    }

    /// Ensure a list of `kind` matching `filter` is cached.
    ///
    /// Only lists pinned to explicit ids can be answered from the store.
    pub async fn load_list(
        &self,
        site: &FetchSite,
        kind: EntityKind,
        filter: &FilterRequest,
        options: &ListOptions,
    ) -> FetchOutcome {
        let query = options.build(filter);
        let deps = request_fingerprint(kind, None, &query);

        site.run(
            &deps,
            |store| is_list_satisfied(store, kind, filter),
            |_| self.get_envelope(kind, kind.list_route(), query),
            |store, envelope| store.upsert_many(envelope.into_entities()),
        )
        .await
    }

    /// Fetch one page of a list outside of any call site and upsert it.
    ///
    /// Returns the envelope so callers can follow `next`.
    pub async fn fetch_page(
        &self,
        kind: EntityKind,
        filter: &FilterRequest,
        options: &ListOptions,
        pagination: Pagination,
    ) -> AppResult<Envelope> {
        let options = ListOptions {
            pagination: Some(pagination),
            ..options.clone()
        };
        let envelope = self
            .get_envelope(kind, kind.list_route(), options.build(filter))
            .await?;
        self.store
            .borrow_mut()
            .upsert_many(envelope.clone().into_entities());
        Ok(envelope)
    }

    /// Walk every page of a list, `page_size` models at a time.
    pub async fn fetch_all_pages(
        &self,
        kind: EntityKind,
        filter: &FilterRequest,
        options: &ListOptions,
        page_size: u32,
    ) -> AppResult<usize> {
        let mut page = 1;
        let mut fetched = 0;
        loop {
            let envelope = self
                .fetch_page(kind, filter, options, Pagination::new(page, page_size))
                .await?;
            fetched += envelope.primary.len();
            if !envelope.has_next() || envelope.primary.is_empty() {
                break;
            }
            page += 1;
        }
        tracing::info!(%kind, pages = page, models = fetched, "fetched all pages");
        Ok(fetched)
    }

    /// Delete on the backend, then drop the model from the store.
    pub async fn delete(&self, kind: EntityKind, id: &EntityId) -> AppResult<()> {
        self.backend.delete(&kind.detail_route(id)).await?;
        self.store.borrow_mut().remove(kind, id);
        tracing::info!(%kind, %id, "deleted");
        Ok(())
    }

    async fn get_envelope(
        &self,
        kind: EntityKind,
        route: String,
        query: Query,
    ) -> AppResult<Envelope> {
        let body = self.backend.get_json(&route, Some(&query)).await?;
        Envelope::parse(kind, body)
    }
}
