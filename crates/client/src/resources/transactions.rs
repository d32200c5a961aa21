use api_types::{
    envelope::ApiResponse,
    transaction::{PagedResult, Transaction, TransactionNew},
};

use crate::{
    client::{ApiRequest, Client},
    error::Result,
    pagination::{Page, PageRequest},
    resources::into_data,
    views::{TransactionView, transaction_view},
};

const PATH: &str = "/transaction";

/// Fetches one page of transactions, newest first as ordered by the server.
pub async fn list(client: &Client, page: PageRequest) -> Result<Page<TransactionView>> {
    let request = ApiRequest::get(PATH).queries(page.to_query());
    let response: ApiResponse<PagedResult<Transaction>> = client.send(&request).await?;

    let Some(paged) = into_data(response, "Failed to load transactions")? else {
        return Ok(Page {
            items: Vec::new(),
            page: page.page,
            page_size: page.page_size,
            total_items: 0,
            total_pages: 1,
        });
    };

    Ok(Page {
        items: paged.items.iter().map(transaction_view).collect(),
        // Older servers omit the echo of the requested page.
        page: if paged.page == 0 { page.page } else { paged.page },
        page_size: if paged.page_size == 0 {
            page.page_size
        } else {
            paged.page_size
        },
        total_items: paged.total_count,
        total_pages: paged.total_pages.max(1),
    })
}

pub async fn create(client: &Client, payload: &TransactionNew) -> Result<Option<Transaction>> {
    let request = ApiRequest::post(PATH).json(payload)?;
    let response: ApiResponse<Transaction> = client.send(&request).await?;
    into_data(response, "Failed to create transaction")
}
