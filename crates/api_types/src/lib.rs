use serde::{Deserialize, Serialize};

pub mod envelope {
    use super::*;

    /// Error payload carried by a failed envelope.
    ///
    /// The backend spells error bodies in PascalCase (`Code`, `Message`,
    /// `Details`) while success bodies use camelCase, so both are accepted.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ApiErrorBody {
        #[serde(alias = "Code")]
        pub code: String,
        #[serde(alias = "Message")]
        pub message: String,
        #[serde(default, alias = "Details")]
        pub details: serde_json::Value,
    }

    /// Uniform wrapper every API response follows.
    ///
    /// `success == true` implies `error` is `None`; `success == false`
    /// implies `data` is `None`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ApiResponse<T> {
        #[serde(alias = "Success")]
        pub success: bool,
        #[serde(alias = "Data")]
        pub data: Option<T>,
        #[serde(alias = "Error")]
        pub error: Option<ApiErrorBody>,
    }

    impl<T> ApiResponse<T> {
        pub fn ok(data: T) -> Self {
            Self {
                success: true,
                data: Some(data),
                error: None,
            }
        }

        pub fn failed(error: ApiErrorBody) -> Self {
            Self {
                success: false,
                data: None,
                error: Some(error),
            }
        }

        /// Splits the envelope on its `success` flag.
        ///
        /// A successful envelope may still carry no data; a failed one may
        /// carry no error body.
        pub fn into_result(self) -> Result<Option<T>, Option<ApiErrorBody>> {
            if self.success {
                Ok(self.data)
            } else {
                Err(self.error)
            }
        }
    }
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RefreshRequest {
        pub refresh_token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LogoutRequest {
        pub refresh_token: String,
    }

    /// Token pair minted by `/auth/login` and `/auth/refresh`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AuthTokens {
        pub access_token: String,
        pub refresh_token: String,
    }
}

pub mod account {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Account {
        pub id: String,
        pub name: String,
        pub balance: f64,
        /// 1 = cash, 2 = bank, 3 = e-wallet.
        #[serde(rename = "type")]
        pub kind: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccountNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: i32,
        pub initial_balance: f64,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct Category {
        pub id: String,
        pub name: String,
        /// 1 = income, 2 = expense.
        #[serde(rename = "type")]
        pub kind: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        #[serde(rename = "type")]
        pub kind: i32,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Transaction {
        pub id: String,
        pub account_id: Option<String>,
        pub account_name: Option<String>,
        pub category_id: Option<String>,
        pub category_name: Option<String>,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: Option<i32>,
        pub type_name: Option<String>,
        /// ISO 8601 date or timestamp.
        pub transaction_date: Option<String>,
        pub note: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionNew {
        pub account_id: String,
        pub category_id: String,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub note: Option<String>,
        pub transaction_date: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PagedResult<T> {
        pub items: Vec<T>,
        #[serde(default)]
        pub page: u32,
        #[serde(default)]
        pub page_size: u32,
        pub total_count: u64,
        pub total_pages: u32,
    }
}

pub mod report {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryAmount {
        pub category: String,
        pub amount: f64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MonthlyReport {
        pub income: f64,
        pub expense: f64,
        pub nett: f64,
        pub income_by_category: Option<Vec<CategoryAmount>>,
        pub expense_by_category: Option<Vec<CategoryAmount>>,
    }
}

#[cfg(test)]
mod tests {
    use super::envelope::*;

    #[test]
    fn camel_case_envelope_parses() {
        let raw = r#"{"success":true,"data":{"id":"1","name":"Groceries","type":2},"error":null}"#;
        let env: ApiResponse<super::category::Category> = serde_json::from_str(raw).unwrap();
        let data = env.into_result().unwrap().unwrap();
        assert_eq!(data.name, "Groceries");
        assert_eq!(data.kind, 2);
    }

    #[test]
    fn pascal_case_error_envelope_parses() {
        let raw = r#"{"Success":false,"Data":null,"Error":{"Code":"Auth.Invalid","Message":"Wrong password","Details":null}}"#;
        let env: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        let err = env.into_result().unwrap_err().unwrap();
        assert_eq!(err.code, "Auth.Invalid");
        assert_eq!(err.message, "Wrong password");
        assert!(err.details.is_null());
    }

    #[test]
    fn failed_envelope_without_error_body() {
        let raw = r#"{"success":false}"#;
        let env: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(env.into_result().unwrap_err().is_none());
    }
}
