//! Generic task-slot endpoints
//!
//! Every long-running computation occupies one task slot per project,
//! checked and killed through `/api/task/{project}/type/{work_type}`.

use uuid::Uuid;
use vigil_core::status::StatusReport;
use vigil_core::work::WorkType;

use crate::PlatformClient;
use crate::error::Result;

impl PlatformClient {
    /// Path of the task-check endpoint for a project/work-type pair
    pub fn task_status_path(project_id: Uuid, work_type: &WorkType) -> String {
        format!("/api/task/{}/type/{}", project_id, work_type)
    }

    /// Fetch the status report behind an arbitrary status path
    ///
    /// The poller calls this with whatever path a consumer registered;
    /// the path is joined onto the client's base URL.
    pub async fn task_status(&self, path: &str) -> Result<StatusReport> {
        let url = self.url(path);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Check the task slot for a project/work-type pair
    pub async fn check_task(
        &self,
        project_id: Uuid,
        work_type: &WorkType,
    ) -> Result<StatusReport> {
        self.task_status(&Self::task_status_path(project_id, work_type))
            .await
    }

    /// Ask the backend to abort a running computation
    ///
    /// This cancels the server-side job only; any client-side poll watching
    /// it keeps running until it observes the resulting terminal status.
    pub async fn kill_task(&self, project_id: Uuid, work_type: &WorkType) -> Result<()> {
        let url = self.url(&Self::task_status_path(project_id, work_type));
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use vigil_core::status::TaskStatus;

    #[tokio::test]
    async fn test_check_task_decodes_report() {
        let mut server = Server::new_async().await;
        let project_id = Uuid::new_v4();
        let path = format!("/api/task/{}/type/autofit", project_id);
        let _m = server
            .mock("GET", path.as_str())
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "started", "start_time": "2024-03-01T10:00:00Z"}"#)
            .create_async()
            .await;

        let client = PlatformClient::new(server.url());
        let report = client
            .check_task(project_id, &WorkType::Autofit)
            .await
            .unwrap();
        assert_eq!(report.status, TaskStatus::Started);
        assert!(report.start_time.is_some());
    }

    #[tokio::test]
    async fn test_kill_task_hits_delete_endpoint() {
        let mut server = Server::new_async().await;
        let project_id = Uuid::new_v4();
        let gaoptim_id = Uuid::new_v4();
        let path = format!("/api/task/{}/type/gaoptim-{}", project_id, gaoptim_id);
        let mock = server
            .mock("DELETE", path.as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = PlatformClient::new(server.url());
        client
            .kill_task(project_id, &WorkType::BocCalculation(gaoptim_id))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_becomes_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/task/broken")
            .with_status(500)
            .with_body("calculation backend is down")
            .create_async()
            .await;

        let client = PlatformClient::new(server.url());
        let err = client.task_status("/api/task/broken").await.unwrap_err();
        assert!(err.is_server_error());
        assert!(err.to_string().contains("calculation backend is down"));
    }
}
