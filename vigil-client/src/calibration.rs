//! Automatic-calibration (autofit) endpoints

use uuid::Uuid;
use vigil_core::dto::LaunchRequest;
use vigil_core::status::StatusReport;

use crate::PlatformClient;
use crate::error::Result;

impl PlatformClient {
    /// Path of the autofit status endpoint for a parameter set
    ///
    /// The same path serves launches (POST) and status checks (GET), so it
    /// is what consumers hand to the poller.
    pub fn autofit_status_path(project_id: Uuid, parset_id: Uuid) -> String {
        format!(
            "/api/project/{}/parsets/{}/automatic_calibration",
            project_id, parset_id
        )
    }

    /// Launch an automatic calibration run for a parameter set
    ///
    /// # Returns
    /// The launch reply: `started` when the computation was accepted,
    /// `blocked` when another computation already holds the project.
    pub async fn start_autofit(
        &self,
        project_id: Uuid,
        parset_id: Uuid,
        req: &LaunchRequest,
    ) -> Result<StatusReport> {
        let url = self.url(&Self::autofit_status_path(project_id, parset_id));
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Current autofit status for a parameter set
    pub async fn autofit_status(&self, project_id: Uuid, parset_id: Uuid) -> Result<StatusReport> {
        self.task_status(&Self::autofit_status_path(project_id, parset_id))
            .await
    }
}
