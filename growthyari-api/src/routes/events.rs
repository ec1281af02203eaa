/// Public event endpoints
///
/// - `GET /v1/events?upcoming=true&limit=20&offset=0`
/// - `GET /v1/events/:slug`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use growthyari_shared::models::{Event, EventFilter, Registration};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// `(limit, offset)` with limit in `1..=100` and a non-negative offset
    pub fn clamped(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only events that have not ended; defaults to true
    pub upcoming: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<Event>,
    pub limit: i64,
    pub offset: i64,
}

/// Event with live registration numbers
#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub registered_count: i64,

    /// `null` for unlimited events
    pub seats_left: Option<i64>,
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<EventList>> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .clamped();

    let events = Event::list(
        &state.db,
        EventFilter {
            upcoming_only: query.upcoming.unwrap_or(true),
            include_unpublished: false,
            limit,
            offset,
        },
    )
    .await?;

    Ok(Json(EventList {
        events,
        limit,
        offset,
    }))
}

/// # Errors
///
/// - `404 Not Found`: No published event with this slug
pub async fn get_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<EventDetail>> {
    let event = Event::find_published_by_slug(&state.db, &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    let registered_count = Registration::count_active(&state.db, event.id).await?;
    let seats_left = event.seats_left(registered_count);

    Ok(Json(EventDetail {
        event,
        registered_count,
        seats_left,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(Pagination::default().clamped(), (20, 0));
    }

    #[test]
    fn test_pagination_clamps() {
        let page = Pagination {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!(page.clamped(), (100, 0));

        let page = Pagination {
            limit: Some(0),
            offset: Some(40),
        };
        assert_eq!(page.clamped(), (1, 40));
    }
}
