use std::sync::{Arc, Mutex};

use crate::application::StudentImportUseCase;
use crate::domain::error::Result;
use crate::infrastructure::api_client::HttpStudentApi;
use crate::infrastructure::config::{ConfigService, Settings};
use crate::interfaces::http::{add_log, start_server, LogEntry};
use crate::interfaces::state::AppState;

pub fn build_state(settings: Settings, config_service: ConfigService) -> Result<AppState> {
    let api = HttpStudentApi::new(settings.api.clone())?;
    let student_import_use_case = StudentImportUseCase::new(
        Arc::new(api),
        settings.validation.clone(),
        settings.import.preview_rows,
    );

    Ok(AppState::new(
        settings,
        student_import_use_case,
        config_service,
    ))
}

/// Wire the state and serve the local API until shutdown
pub async fn serve(settings: Settings) -> Result<()> {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let server_config = settings.server.clone();
    let students_url = settings.api.students_url();

    let state = Arc::new(build_state(settings, ConfigService::new()?)?);
    let server = start_server(state, logs.clone(), &server_config)?;

    tracing::info!(
        host = %server_config.host,
        port = server_config.port,
        backend = %students_url,
        "HTTP server started"
    );
    add_log(
        &logs,
        "INFO",
        "System",
        &format!(
            "Backend initialized and HTTP server started on {}:{}",
            server_config.host, server_config.port
        ),
    );

    server.await?;
    Ok(())
}
