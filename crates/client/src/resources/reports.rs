use api_types::{envelope::ApiResponse, report::MonthlyReport};

use crate::{
    client::{ApiRequest, Client},
    error::Result,
    resources::into_data,
    views::ReportView,
};

/// Income/expense summary for one month. `None` when the server has no data
/// for the period.
pub async fn monthly(client: &Client, year: i32, month: u32) -> Result<Option<ReportView>> {
    let request = ApiRequest::get("/report/monthly")
        .query("year", year)
        .query("month", month);
    let response: ApiResponse<MonthlyReport> = client.send(&request).await?;
    Ok(into_data(response, "Failed to load report")?.map(ReportView::from))
}
