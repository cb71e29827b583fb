use crate::client::RpcClient;
use aarogya_common::{FinalSummary, IntakeError, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

/// The slice of the records backend the intake flow needs. The full typed
/// surface lives on [`RecordsClient`]; the orchestrator only ever persists
/// a finished summary.
#[async_trait]
pub trait RecordsStore: Send + Sync {
    async fn persist_summary(&self, summary: &FinalSummary) -> Result<()>;
}

/// Used when no records backend is configured; persistence becomes a no-op.
pub struct NoopRecordsStore;

#[async_trait]
impl RecordsStore for NoopRecordsStore {
    async fn persist_summary(&self, _summary: &FinalSummary) -> Result<()> {
        warn!("no records backend configured; summary not persisted");
        Ok(())
    }
}

/// Typed wrappers over every method the records backend exposes.
pub struct RecordsClient<R, W> {
    rpc: RpcClient<R, W>,
}

impl<R, W> RecordsClient<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(rpc: RpcClient<R, W>) -> Self {
        Self { rpc }
    }

    pub async fn test_connection(&self) -> Result<Value> {
        self.rpc.call("test_connection", None).await
    }

    pub async fn create_patient(
        &self,
        first_name: &str,
        last_name: &str,
        age: u32,
        conversation_summary: &str,
    ) -> Result<i64> {
        let result = self
            .rpc
            .call(
                "create_patient",
                Some(json!({
                    "first_name": first_name,
                    "last_name": last_name,
                    "age": age,
                    "conversation_summary": conversation_summary,
                })),
            )
            .await?;

        result
            .get("patient_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                IntakeError::Protocol("create_patient result missing patient_id".to_string())
            })
    }

    pub async fn get_patient_detail(&self, patient_id: i64) -> Result<Value> {
        self.rpc
            .call("get_patient_detail", Some(json!({"patient_id": patient_id})))
            .await
    }

    pub async fn update_patient_summary(
        &self,
        patient_id: i64,
        conversation_summary: &str,
    ) -> Result<Value> {
        self.rpc
            .call(
                "update_patient_summary",
                Some(json!({
                    "patient_id": patient_id,
                    "conversation_summary": conversation_summary,
                })),
            )
            .await
    }

    pub async fn book_appointment(&self, params: Value) -> Result<Value> {
        self.rpc.call("book_appointment", Some(params)).await
    }

    pub async fn get_appointment_detail(&self, appointment_id: i64) -> Result<Value> {
        self.rpc
            .call(
                "get_appointment_detail",
                Some(json!({"appointment_id": appointment_id})),
            )
            .await
    }

    pub async fn update_appointment(&self, params: Value) -> Result<Value> {
        self.rpc.call("update_appointment", Some(params)).await
    }

    pub async fn create_medical_history(&self, params: Value) -> Result<Value> {
        self.rpc.call("create_medical_history", Some(params)).await
    }

    pub async fn get_medical_history(&self, patient_id: i64) -> Result<Value> {
        self.rpc
            .call("get_medical_history", Some(json!({"patient_id": patient_id})))
            .await
    }

    pub async fn update_medical_history(&self, params: Value) -> Result<Value> {
        self.rpc.call("update_medical_history", Some(params)).await
    }

    pub async fn create_bill(&self, params: Value) -> Result<Value> {
        self.rpc.call("create_bill", Some(params)).await
    }

    pub async fn update_bill(&self, params: Value) -> Result<Value> {
        self.rpc.call("update_bill", Some(params)).await
    }

    pub async fn delete_bill(&self, bill_id: i64) -> Result<Value> {
        self.rpc
            .call("delete_bill", Some(json!({"bill_id": bill_id})))
            .await
    }
}

#[async_trait]
impl<R, W> RecordsStore for RecordsClient<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    async fn persist_summary(&self, summary: &FinalSummary) -> Result<()> {
        let (first_name, last_name) = split_name(summary.name.as_deref());
        let age = summary
            .dob
            .as_deref()
            .and_then(age_from_dob)
            .unwrap_or_default();

        let patient_id = self
            .create_patient(&first_name, &last_name, age, &summary.summary)
            .await?;

        info!("persisted intake summary as patient {}", patient_id);
        Ok(())
    }
}

fn split_name(name: Option<&str>) -> (String, String) {
    let name = name.unwrap_or("Unknown").trim();
    match name.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

fn age_from_dob(dob: &str) -> Option<u32> {
    let born = NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d").ok()?;
    let today = Utc::now().date_naive();
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    u32::try_from(age).ok()
}
