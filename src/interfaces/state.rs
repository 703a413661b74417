use crate::application::StudentImportUseCase;
use crate::infrastructure::api_client::AuthToken;
use crate::infrastructure::config::{ConfigService, Settings};

pub struct AppState {
    pub settings: Settings,
    pub student_import_use_case: StudentImportUseCase,
    pub config_service: ConfigService,
}

impl AppState {
    pub fn new(
        settings: Settings,
        student_import_use_case: StudentImportUseCase,
        config_service: ConfigService,
    ) -> Self {
        Self {
            settings,
            student_import_use_case,
            config_service,
        }
    }

    /// Caller's bearer token when present, otherwise the stored one
    pub fn resolve_token(&self, authorization: Option<&str>) -> Option<AuthToken> {
        authorization
            .and_then(AuthToken::from_bearer_header)
            .or_else(|| self.config_service.get_api_token())
    }
}
