//! Read side over the show repository: paginated listing and point lookup.
//!
//! Both operations return cast youngest first with unknown birthdays last,
//! and answer [`QueryError::NotFound`] rather than an empty result.

use tracing::debug;

use crate::contract::ShowRepository;
use crate::error::QueryError;
use crate::model::Show;

/// Page `page_number` (1-based) of `page_size` shows, ordered by identity.
pub async fn list_shows<R>(
    repo: &R,
    page_number: u32,
    page_size: u32,
) -> Result<Vec<Show>, QueryError>
where
    R: ShowRepository + ?Sized,
{
    if page_number == 0 || page_size == 0 {
        return Err(QueryError::InvalidPagination {
            page_number,
            page_size,
        });
    }
    let offset = u64::from(page_number - 1) * u64::from(page_size);
    debug!(page_number, page_size, offset, "Listing shows");

    let shows = repo.list_shows(offset, page_size).await?;
    if shows.is_empty() {
        return Err(QueryError::NotFound);
    }
    Ok(shows.into_iter().map(Show::with_sorted_cast).collect())
}

pub async fn get_show<R>(repo: &R, id: u64) -> Result<Show, QueryError>
where
    R: ShowRepository + ?Sized,
{
    repo.find_by_id(id)
        .await?
        .map(Show::with_sorted_cast)
        .ok_or(QueryError::NotFound)
}
