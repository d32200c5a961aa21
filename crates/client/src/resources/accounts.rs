use api_types::{
    account::{Account, AccountNew},
    envelope::ApiResponse,
};

use crate::{
    client::{ApiRequest, Client},
    error::Result,
    resources::into_data,
    views::{AccountView, account_view},
};

const PATH: &str = "/account";

pub async fn list(client: &Client) -> Result<Vec<AccountView>> {
    let response: ApiResponse<Vec<Account>> = client.send(&ApiRequest::get(PATH)).await?;
    let accounts = into_data(response, "Failed to fetch accounts")?.unwrap_or_default();
    Ok(accounts.iter().map(account_view).collect())
}

pub async fn create(client: &Client, payload: &AccountNew) -> Result<Option<Account>> {
    let request = ApiRequest::post(PATH).json(payload)?;
    let response: ApiResponse<Account> = client.send(&request).await?;
    into_data(response, "Failed to create")
}
