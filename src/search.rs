//! Paginated identifier search.

use crate::entrez::{EntrezService, SEARCH_PAGE_CEILING};
use crate::error::Result;
use crate::retry::{self, RetryPolicy};
use tracing::{info, warn};

/// Collect up to `max_results` identifiers for `query`, in ranking order.
///
/// The first page tells us the total match count. Later pages are requested
/// until the target is reached or the service runs dry. A later page that
/// still fails after retries ends the search with what was collected so far;
/// only a failure of the first page is returned as an error.
pub async fn search_ids<S: EntrezService>(
    service: &S,
    query: &str,
    max_results: usize,
    page_size: usize,
    policy: &RetryPolicy,
) -> Result<Vec<String>> {
    if max_results == 0 {
        return Ok(Vec::new());
    }

    let page_size = page_size.clamp(1, SEARCH_PAGE_CEILING).min(max_results);

    let first = retry::execute(policy, "esearch", || service.search(query, 0, page_size)).await?;
    let target = first.total_count.min(max_results);
    info!(query, total = first.total_count, wanted = target, "Search matched");

    let mut ids = first.ids;
    ids.truncate(target);

    let mut offset = 0;
    while ids.len() < target {
        offset += page_size;
        let page = match retry::execute(policy, "esearch", || service.search(query, offset, page_size)).await {
            Ok(page) => page,
            Err(e) => {
                warn!(offset, collected = ids.len(), wanted = target, error = %e, "Search page failed, keeping partial result");
                break;
            }
        };

        if page.ids.is_empty() {
            info!(offset, collected = ids.len(), "Search exhausted before target");
            break;
        }

        let room = target - ids.len();
        ids.extend(page.ids.into_iter().take(room));
    }

    Ok(ids)
}
