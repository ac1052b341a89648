use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::CoordinateLookup;
use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::services::DashboardService;

/// Running application: the HTTP server task
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build and initialize the application
    ///
    /// Loads the province coordinate table (built-in, or the JSON file named
    /// by `PROVINCE_COORDINATES_PATH`), creates the dashboard service and
    /// spawns the Axum server.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let coordinates = match &config.coordinates_path {
            Some(path) => CoordinateLookup::from_json_file(path)?,
            None => CoordinateLookup::builtin(),
        };
        info!("Coordinate table has {} provinces", coordinates.len());

        let dashboard_service = DashboardService::from_config(&config, coordinates);
        info!(
            "Reading sheet '{}', caching up to {} analyses, labels {:?}",
            config.sheet_name, config.cache_capacity, config.label_set
        );

        let app_state = AppState {
            dashboard_service,
            max_upload_bytes: config.max_upload_bytes,
        };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);

        let server_handle = tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app).await
        });

        info!("Application initialized successfully");

        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
