use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::enums::AuditOperationType;
use crate::models::AuditLog;
use crate::storage::Store;

pub struct AuditService {
    store: Arc<Store>,
}

/// Client metadata recorded on every data-modifying audit entry.
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Every data modification surfaces an entry; reads are not audited
    /// by default. Failure here is logged but never propagated — an
    /// audit-log write must not be able to fail the operation it records.
    pub async fn record(
        &self,
        user_id: Uuid,
        operation_type: AuditOperationType,
        resource_type: &str,
        resource_id: &str,
        context: &RequestContext,
        additional_data: Option<Value>,
        cancel: &CancellationToken,
    ) {
        let entry = AuditLog {
            id: Uuid::new_v4(),
            user_id,
            operation_type,
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            timestamp: Utc::now(),
            ip_address: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
            additional_data,
        };

        if let Err(e) = self.store.insert_audit_log(entry, cancel).await {
            tracing::warn!(error = %e, user_id = %user_id, resource_type, "audit log write failed");
        }
    }

    pub async fn list(&self, user_id: Uuid, cancel: &CancellationToken) -> Result<Vec<AuditLog>, crate::db::DatabaseError> {
        self.store.list_audit_log(user_id, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[tokio::test]
    async fn record_appends_a_retrievable_entry() {
        let store = Arc::new(Store::new(open_memory_database().unwrap()));
        let cancel = CancellationToken::new();
        let user_id = Uuid::new_v4();
        store.ensure_user(user_id, &cancel).await.unwrap();

        let service = AuditService::new(store);
        let context = RequestContext {
            ip_address: Some("203.0.113.5".into()),
            user_agent: None,
        };
        service
            .record(user_id, AuditOperationType::Create, "medication", "m1", &context, None, &cancel)
            .await;

        let entries = service.list(user_id, &cancel).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].resource_type, "medication");
    }
}
