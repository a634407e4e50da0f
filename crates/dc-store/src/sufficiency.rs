//! Is what we have cached enough to skip a fetch?

use dc_query::FilterRequest;

use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::store::Store;

/// True when `entity` already carries the data `filter` asks for.
///
/// Requested tags must all be present, and a requested period must match the
/// period of the cached `default` series exactly. Filter clauses are list
/// filters for the backend and are not evaluated against a cached model.
pub fn is_satisfied(entity: Option<&Entity>, filter: &FilterRequest) -> bool {
    let Some(entity) = entity else {
        return false;
    };

    if let Some(tags) = &filter.data_types
        && !tags.iter().all(|&tag| entity.data.contains(tag))
    {
        return false;
    }

    if let Some(period) = filter.period {
        return entity
            .data
            .default_series()
            .and_then(|series| series.period())
            == Some(period);
    }

    true
}

/// True when every model a list request pins by id is resident and
/// satisfied.
///
/// The id clause must be the only clause: any other clause is a backend
/// filter the store cannot evaluate, so such requests always need a fetch,
/// as do requests that do not pin ids.
pub fn is_list_satisfied(store: &Store, kind: EntityKind, filter: &FilterRequest) -> bool {
    if filter.clauses.len() != 1 {
        return false;
    }
    let Some(ids) = filter.pinned_ids() else {
        return false;
    };
    !ids.is_empty()
        && ids
            .iter()
            .all(|id| is_satisfied(store.select_by_id(kind, id), filter))
}
