//! Wiring shared by every command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use dc_auth::{Authenticator, CurrentUser, FileSessionStore, SessionStore};
use dc_client::{load_file, save_file, Backend, DownloadedFile, HttpApi, MemoryApi};
use dc_core::config::ClientConfig;
use dc_core::{DcError, DcResult};
use dc_models::UploadFile;
use dc_services::{
    AccountService, AssignmentService, FileAreaService, MunicipalityService, ProfessionalService,
    ProjectService, ServiceContext, SurveySearch, WizardService,
};
use tracing::debug;

use crate::output::{ConsoleNotifier, Output, OutputFormat};

const OFFLINE_SESSION_FILE: &str = "offline-session.json";

pub struct App {
    pub config: ClientConfig,
    pub backend: Backend,
    pub auth: Authenticator,
    pub ctx: ServiceContext,
    pub output: Output,
    pub assume_yes: bool,
}

impl App {
    /// Offline runs keep their own session file next to the real one
    pub fn build(
        config: ClientConfig,
        offline: bool,
        format: OutputFormat,
        assume_yes: bool,
    ) -> anyhow::Result<Self> {
        let mut session_path = config.session_path();
        if offline {
            session_path.set_file_name(OFFLINE_SESSION_FILE);
        }
        debug!(path = %session_path.display(), offline, "Session store");
        let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(session_path));

        let backend = if offline {
            Backend::new(Arc::new(MemoryApi::seeded().with_session(store.clone())))
        } else {
            let http = HttpApi::new(&config.api, store.clone())
                .with_context(|| format!("cannot reach backend at {}", config.api.base_url))?;
            Backend::new(Arc::new(http))
        };

        let auth = Authenticator::new(backend.auth.clone(), store)
            .with_cookie_lifetime_days(config.session.cookie_lifetime_days);

        Ok(Self {
            config,
            backend,
            auth,
            ctx: ServiceContext::new(Arc::new(ConsoleNotifier)),
            output: Output::new(format),
            assume_yes,
        })
    }

    pub fn require_user(&self) -> DcResult<CurrentUser> {
        self.ctx.report(self.auth.require_user(), "Please log in first")
    }

    pub fn require_admin(&self) -> DcResult<CurrentUser> {
        let user = self.require_user()?;
        if !user.is_admin() {
            let err = DcError::Forbidden {
                message: "Admin role required".to_string(),
            };
            return Err(self.ctx.fail(err, "Admin role required"));
        }
        Ok(user)
    }

    pub async fn read_upload(&self, path: &Path) -> DcResult<UploadFile> {
        let fallback = format!("Cannot read {}", path.display());
        self.ctx.report(load_file(path).await, &fallback)
    }

    pub async fn write_download(&self, dir: &Path, file: &DownloadedFile) -> DcResult<PathBuf> {
        let written = self
            .ctx
            .report(save_file(dir, file).await, "Failed to save file")?;
        self.ctx.info(format!("Saved {}", written.display()));
        Ok(written)
    }

    pub fn projects(&self) -> ProjectService {
        ProjectService::new(self.backend.projects.clone(), self.ctx.clone())
    }

    pub fn assignments(&self) -> AssignmentService {
        AssignmentService::new(self.backend.projects.clone(), self.ctx.clone())
    }

    pub fn professionals(&self) -> ProfessionalService {
        ProfessionalService::new(self.backend.professionals.clone(), self.ctx.clone())
    }

    pub fn municipalities(&self) -> MunicipalityService {
        MunicipalityService::new(self.backend.municipalities.clone(), self.ctx.clone())
    }

    pub fn files(&self) -> FileAreaService {
        FileAreaService::new(
            self.backend.projects.clone(),
            self.backend.professionals.clone(),
            self.ctx.clone(),
            &self.config.documents,
        )
    }

    pub fn wizard(&self) -> WizardService {
        WizardService::new(&self.backend, self.ctx.clone())
    }

    pub fn survey(&self) -> SurveySearch {
        SurveySearch::new(self.backend.survey.clone(), self.ctx.clone(), &self.config.survey)
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(
            self.backend.auth.clone(),
            self.backend.users.clone(),
            self.ctx.clone(),
        )
    }
}
