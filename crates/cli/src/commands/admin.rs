//! Admin panel commands.
//!
//! # Environment Variables
//!
//! - `VP_ADMIN_USER` - Admin username (or `--username`)
//! - `VP_ADMIN_PASS` - Admin password (or `--password`)

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::info;
use visit_panel_client::{AdminPanel, AdminSession, ApiClient, ClientConfig};
use visit_panel_core::{ExportTarget, RedeemId, UserId};

use super::CliError;
use crate::view::TerminalView;

pub struct AdminContext {
    panel: AdminPanel,
    username: String,
    password: SecretString,
}

impl AdminContext {
    pub fn new(config: &ClientConfig, username: String, password: String) -> Result<Self, CliError> {
        let api = ApiClient::from_config(config)?;
        let panel = AdminPanel::new(api, Arc::new(TerminalView));
        Ok(Self {
            panel,
            username,
            password: SecretString::from(password),
        })
    }

    fn session(&self) -> Result<AdminSession, CliError> {
        Ok(AdminSession::new(self.username.clone(), self.password.clone())?)
    }

    pub async fn login(&self) -> Result<(), CliError> {
        self.panel.admin_login(&self.username, &self.password).await?;
        Ok(())
    }

    pub async fn users(&self) -> Result<(), CliError> {
        self.panel.load_users(&self.session()?).await?;
        Ok(())
    }

    pub async fn add_coins(&self, user_id: UserId, coins: &str) -> Result<(), CliError> {
        self.panel.add_coins(&self.session()?, user_id, coins).await?;
        Ok(())
    }

    pub async fn prompt_add(&self, user_id: UserId) -> Result<(), CliError> {
        if !self.panel.prompt_add(&self.session()?, user_id).await? {
            info!("Cancelled");
        }
        Ok(())
    }

    pub async fn redeems(&self) -> Result<(), CliError> {
        self.panel.load_redeems(&self.session()?).await?;
        Ok(())
    }

    pub async fn approve(&self, id: RedeemId) -> Result<(), CliError> {
        self.panel.approve_redeem(&self.session()?, id).await?;
        Ok(())
    }

    pub async fn history(&self) -> Result<(), CliError> {
        self.panel.load_history(&self.session()?).await?;
        Ok(())
    }

    pub async fn export(
        &self,
        target: ExportTarget,
        output: Option<PathBuf>,
    ) -> Result<(), CliError> {
        let bytes = self.panel.export(&self.session()?, target).await?;
        let path = output.unwrap_or_else(|| PathBuf::from(target.file_name()));
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Export written");
        Ok(())
    }
}
