use api_types::{
    category::{Category, CategoryNew},
    envelope::ApiResponse,
};

use crate::{
    client::{ApiRequest, Client},
    error::Result,
    resources::into_data,
    views::{CategoryView, category_view},
};

const PATH: &str = "/category";

pub async fn list(client: &Client) -> Result<Vec<CategoryView>> {
    let response: ApiResponse<Vec<Category>> = client.send(&ApiRequest::get(PATH)).await?;
    let categories = into_data(response, "Failed to fetch categories")?.unwrap_or_default();
    Ok(categories.iter().map(category_view).collect())
}

pub async fn create(client: &Client, payload: &CategoryNew) -> Result<Option<Category>> {
    let request = ApiRequest::post(PATH).json(payload)?;
    let response: ApiResponse<Category> = client.send(&request).await?;
    into_data(response, "Failed to create")
}
