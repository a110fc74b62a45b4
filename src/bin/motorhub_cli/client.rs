#![deny(clippy::all, clippy::pedantic)]

use motorhub::application::client::Motorhub;
use motorhub::application::error::ApiError;
use motorhub::config::{self, LoadError, Settings};
use motorhub::infra::error::InfraError;
use motorhub::infra::telemetry;
use motorhub_api_types::User;
use thiserror::Error;

use crate::args::Cli;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not signed in (run `motorhub-cli login` first)")]
    NotSignedIn,
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to render output: {0}")]
    Output(String),
}

pub struct Ctx {
    pub hub: Motorhub,
}

impl Ctx {
    pub fn new(settings: &Settings) -> Result<Self, CliError> {
        Ok(Self {
            hub: Motorhub::new(settings)?,
        })
    }

    /// The signed-in user, restoring the session from the token file on
    /// first use.
    pub async fn signed_in(&self) -> Result<User, CliError> {
        if let Some(user) = self.hub.session().current_user() {
            return Ok(user);
        }
        self.hub
            .restore_session()
            .await?
            .ok_or(CliError::NotSignedIn)
    }
}

pub fn build_ctx_from_cli(cli: &Cli) -> Result<Ctx, CliError> {
    let settings = config::load(&cli.config)?;
    telemetry::init(&settings.logging)?;
    Ctx::new(&settings)
}
