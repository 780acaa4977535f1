// Gateway status endpoint

use tracing::debug;

use crate::console::client::{ConsoleClient, ConsoleRequest};
use crate::console::extract::parse_gateway_status;
use crate::console::models::GatewayStatus;
use crate::error::Error;

impl ConsoleClient {
    /// List every gateway with its current monitoring state.
    ///
    /// `GET /status_gateways.php`
    pub async fn list_gateways(&self) -> Result<Vec<GatewayStatus>, Error> {
        debug!("listing gateways");
        let page = self
            .fetch(&ConsoleRequest::get("/status_gateways.php"))
            .await?;
        parse_gateway_status(&page.body)
    }
}
