//! Line-delimited JSON request surface for series administration

use gymflow_core::{DayChange, Error, Storage, TemplateFields, UpdateOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One admin request, tagged by `op`
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateSeries {
        fields: TemplateFields,
    },
    UpdateSeries {
        template_id: Uuid,
        fields: TemplateFields,
        #[serde(default)]
        propagate: bool,
        #[serde(default)]
        day_change: Option<DayChange>,
        #[serde(default)]
        expected_version: Option<i64>,
    },
    ChangeWeekday {
        template_id: Uuid,
        change: DayChange,
        #[serde(default)]
        propagate: bool,
    },
    DeleteSeries {
        template_id: Uuid,
        #[serde(default)]
        cascade: bool,
    },
    ListSeries,
    GetSeries {
        template_id: Uuid,
    },
    ListOccurrences {
        template_id: Uuid,
    },
    ReconcileSeries {
        template_id: Uuid,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self {
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message: message.into(),
            }),
        }
    }
}

impl From<Error> for Response {
    fn from(e: Error) -> Self {
        Response::failure(e.code(), e.to_string())
    }
}

fn reply<T: Serialize>(result: gymflow_core::Result<T>) -> Response {
    match result.and_then(|value| Ok(serde_json::to_value(value)?)) {
        Ok(value) => Response::success(value),
        Err(e) => {
            tracing::warn!(code = e.code(), "Request failed: {}", e);
            e.into()
        }
    }
}

/// Dispatch one request against the storage backend
pub fn handle_request<S: Storage>(storage: &S, req: Request) -> Response {
    tracing::debug!(?req, "Handling request");
    match req {
        Request::CreateSeries { fields } => reply(storage.create_series(fields)),
        Request::UpdateSeries {
            template_id,
            fields,
            propagate,
            day_change,
            expected_version,
        } => reply(storage.update_series(
            template_id,
            fields,
            UpdateOptions {
                propagate,
                day_change,
                expected_version,
            },
        )),
        Request::ChangeWeekday {
            template_id,
            change,
            propagate,
        } => reply(storage.change_weekday(template_id, change, propagate)),
        Request::DeleteSeries {
            template_id,
            cascade,
        } => reply(storage.delete_series(template_id, cascade)),
        Request::ListSeries => reply(storage.list_series()),
        Request::GetSeries { template_id } => reply(
            storage
                .find_series(template_id)
                .and_then(|found| {
                    found.ok_or_else(|| {
                        Error::NotFound(format!("recurring template {template_id}"))
                    })
                }),
        ),
        Request::ListOccurrences { template_id } => {
            reply(storage.list_occurrences_for_series(template_id))
        }
        Request::ReconcileSeries { template_id } => reply(
            storage
                .reconcile_series(template_id)
                .map(|reconciled| serde_json::json!({ "reconciled": reconciled })),
        ),
    }
}
