//! Portfolio computation endpoints
//!
//! Two portfolio-level computations exist: per-project budget-outcome-curve
//! (BOC) calculations and the full genetic-algorithm optimization across
//! the whole portfolio. Both report progress through the generic task-slot
//! endpoints.

use uuid::Uuid;
use vigil_core::dto::LaunchRequest;
use vigil_core::work::WorkType;

use crate::PlatformClient;
use crate::error::Result;

impl PlatformClient {
    /// Status path for one project's BOC calculation within a GA run
    pub fn boc_status_path(project_id: Uuid, gaoptim_id: Uuid) -> String {
        Self::task_status_path(project_id, &WorkType::BocCalculation(gaoptim_id))
    }

    /// Status path for the full portfolio GA optimization
    pub fn portfolio_ga_status_path(portfolio_id: Uuid, gaoptim_id: Uuid) -> String {
        Self::task_status_path(portfolio_id, &WorkType::PortfolioGa(gaoptim_id))
    }

    /// Kick off BOC calculations for every project in a portfolio
    ///
    /// The backend fans out one computation per project; progress is
    /// watched per project through [`Self::boc_status_path`].
    pub async fn start_boc_calculation(
        &self,
        portfolio_id: Uuid,
        gaoptim_id: Uuid,
        req: &LaunchRequest,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/api/portfolio/{}/gaoptim/{}",
            portfolio_id, gaoptim_id
        ));
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_empty_response(response).await
    }

    /// Launch the full GA optimization across a portfolio
    pub async fn start_portfolio_ga(
        &self,
        portfolio_id: Uuid,
        gaoptim_id: Uuid,
        req: &LaunchRequest,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/api/minimize/portfolio/{}/gaoptim/{}",
            portfolio_id, gaoptim_id
        ));
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_start_portfolio_ga_posts_to_minimize() {
        let mut server = Server::new_async().await;
        let portfolio_id = Uuid::new_v4();
        let gaoptim_id = Uuid::new_v4();
        let path = format!("/api/minimize/portfolio/{}/gaoptim/{}", portfolio_id, gaoptim_id);
        let mock = server
            .mock("POST", path.as_str())
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = PlatformClient::new(server.url());
        client
            .start_portfolio_ga(portfolio_id, gaoptim_id, &LaunchRequest::default())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[test]
    fn test_status_paths_embed_work_types() {
        let project_id = Uuid::new_v4();
        let gaoptim_id = Uuid::new_v4();
        assert_eq!(
            PlatformClient::boc_status_path(project_id, gaoptim_id),
            format!("/api/task/{}/type/gaoptim-{}", project_id, gaoptim_id)
        );
        assert_eq!(
            PlatformClient::portfolio_ga_status_path(project_id, gaoptim_id),
            format!("/api/task/{}/type/portfolio-{}", project_id, gaoptim_id)
        );
    }
}
