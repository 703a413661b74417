use crate::application::ImportReport;
use crate::domain::error::{AppError, SubmissionError};
use crate::domain::import::ValidatedBatch;
use crate::infrastructure::api_client::AuthToken;
use crate::infrastructure::config::ServerConfig;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::http::{header, StatusCode};
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpRequest, HttpResponse, HttpServer,
    Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

const MAX_LOG_ENTRIES: usize = 100;
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub file_name: String,
    #[serde(default)]
    pub class_id: Option<String>,
}

impl UploadQuery {
    fn class_id(&self) -> Result<&str, AppError> {
        self.class_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::ValidationError("Class id is required".to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub total_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    #[serde(flatten)]
    pub batch: ValidatedBatch,
}

#[post("/students/import/preview")]
async fn preview_import(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let use_case = &data.app_state.student_import_use_case;
    match use_case.load(&query.file_name, body.to_vec()) {
        Ok(sheet) => {
            add_log(
                &data.logs,
                "INFO",
                "Import",
                &format!("Previewing {} ({} rows)", query.file_name, sheet.len()),
            );
            HttpResponse::Ok().json(use_case.preview(&sheet))
        }
        Err(e) => error_response(&data.logs, &e),
    }
}

#[post("/students/import/validate")]
async fn validate_import(
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let use_case = &data.app_state.student_import_use_case;
    let class_id = match query.class_id() {
        Ok(id) => id,
        Err(e) => return error_response(&data.logs, &e),
    };

    match use_case.load(&query.file_name, body.to_vec()) {
        Ok(sheet) => {
            let batch = use_case.validate(&sheet, class_id);
            add_log(
                &data.logs,
                "INFO",
                "Import",
                &format!(
                    "Validated {}: {} accepted, {} rejected",
                    query.file_name,
                    batch.accepted_count(),
                    batch.rejected_count()
                ),
            );
            HttpResponse::Ok().json(ValidateResponse {
                total_rows: batch.len(),
                accepted: batch.accepted_count(),
                rejected: batch.rejected_count(),
                batch,
            })
        }
        Err(e) => error_response(&data.logs, &e),
    }
}

#[post("/students/import")]
async fn run_import(
    req: HttpRequest,
    data: web::Data<HttpState>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> impl Responder {
    let use_case = &data.app_state.student_import_use_case;
    let class_id = match query.class_id() {
        Ok(id) => id,
        Err(e) => return error_response(&data.logs, &e),
    };

    let sheet = match use_case.load(&query.file_name, body.to_vec()) {
        Ok(sheet) => sheet,
        Err(e) => return error_response(&data.logs, &e),
    };

    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = data.app_state.resolve_token(authorization);

    add_log(
        &data.logs,
        "INFO",
        "Import",
        &format!(
            "Importing {} rows from {} into class {}",
            sheet.len(),
            query.file_name,
            class_id
        ),
    );

    match use_case.import(&sheet, class_id, token).await {
        Ok(report) => report_response(&data.logs, report),
        Err(e) => error_response(&data.logs, &e),
    }
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .map(|logs| logs.clone())
        .unwrap_or_default();
    HttpResponse::Ok().json(logs)
}

#[put("/token")]
async fn save_token(data: web::Data<HttpState>, body: web::Json<TokenRequest>) -> impl Responder {
    let Some(token) = AuthToken::new(body.into_inner().token) else {
        let err = AppError::ValidationError("Token must not be blank".to_string());
        return error_response(&data.logs, &err);
    };
    match data.app_state.config_service.save_api_token(&token) {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Config", "API token stored");
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(&data.logs, &e),
    }
}

#[delete("/token")]
async fn delete_token(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.config_service.delete_api_token() {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Config", "API token removed");
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(&data.logs, &e),
    }
}

fn error_status(err: &AppError) -> StatusCode {
    match err {
        AppError::UnsupportedFormat(_) | AppError::ParseError(_) | AppError::ValidationError(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::NothingToSubmit(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Submission(error) => match error {
            SubmissionError::MissingToken => StatusCode::UNAUTHORIZED,
            SubmissionError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SubmissionError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SubmissionError::Transport(_) | SubmissionError::Status { .. } => {
                StatusCode::BAD_GATEWAY
            }
        },
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn report_response(logs: &Mutex<Vec<LogEntry>>, report: ImportReport) -> HttpResponse {
    let status = match report.receipt() {
        Ok(_) => StatusCode::OK,
        Err(e) => error_status(&e),
    };
    let level = if report.is_success() { "INFO" } else { "WARN" };
    let summary = report
        .messages
        .last()
        .cloned()
        .unwrap_or_else(|| "Import finished".to_string());
    add_log(logs, level, "Import", &summary);
    HttpResponse::build(status).json(report)
}

fn error_response(logs: &Mutex<Vec<LogEntry>>, err: &AppError) -> HttpResponse {
    add_log(logs, "ERROR", "Import", &err.to_string());
    HttpResponse::build(error_status(err)).json(json!({ "error": err.to_string() }))
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Mount the API under `/api`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES)).service(
        web::scope("/api")
            .service(preview_import)
            .service(validate_import)
            .service(run_import)
            .service(get_logs)
            .service(save_token)
            .service(delete_token),
    );
}

pub fn start_server(
    app_state: Arc<AppState>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    server: &ServerConfig,
) -> std::io::Result<Server> {
    let state = web::Data::new(HttpState { app_state, logs });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((server.host.as_str(), server.port))?
    .run();

    Ok(server)
}
