use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::gateway::TrafficGateway;
use crate::repository::TrafficRepository;

/// Fetches current routes and appends every returned alternative
pub struct CollectTrafficData {
    gateway: Arc<dyn TrafficGateway>,
    repository: Arc<dyn TrafficRepository>,
}

impl CollectTrafficData {
    pub fn new(gateway: Arc<dyn TrafficGateway>, repository: Arc<dyn TrafficRepository>) -> Self {
        Self {
            gateway,
            repository,
        }
    }

    /// Collect `origin -> destination`, then `destination -> origin` when
    /// `round_trip` is set.
    ///
    /// Returns `Ok(true)` only if every save succeeded; a direction with no
    /// routes contributes no failed save. Gateway errors are returned as-is
    /// and stop the run at the failing direction.
    #[instrument(skip(self))]
    pub async fn execute(
        &self,
        origin: &str,
        destination: &str,
        round_trip: bool,
    ) -> crate::Result<bool> {
        let mut legs = vec![(origin, destination)];
        if round_trip {
            legs.push((destination, origin));
        }

        let mut all_saved = true;
        for (start, end) in legs {
            let routes = self.gateway.get_route_data(start, end).await?;
            if routes.is_empty() {
                warn!("No routes returned for {start} -> {end}");
            }
            debug!("Fetched {} routes for {start} -> {end}", routes.len());

            for route in routes {
                debug!(
                    "{route} (+{:.0} s traffic delay)",
                    route.traffic_delay_seconds()
                );
                // every route is saved even after a failure
                let saved = self.repository.save_route(route).await;
                all_saved &= saved;
            }
        }

        info!(all_saved, "Traffic collection finished");
        Ok(all_saved)
    }
}
