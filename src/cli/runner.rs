//! Command runner

use crate::api::{ApiClient, CandleQuery, MarketService};
use crate::auth::{AuthService, Credentials, RegistrationProfile, SessionState};
use crate::cli::args::{Args, Command};
use crate::config::ClientConfig;
use crate::error::{AuthError, ClientError};
use crate::events::SessionEvent;
use crate::output::OutputManager;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub struct Runner {
    args: Args,
    output: OutputManager,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let output = if args.quiet {
            OutputManager::new_quiet()
        } else {
            OutputManager::new(args.verbose)
        };

        Self { args, output }
    }

    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// Environment defaults overridden by command-line flags
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(base_url) = &self.args.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(dir) = &self.args.session_dir {
            config = config.with_session_dir(dir.clone());
        }
        config
    }

    pub async fn run(&self) -> Result<(), RunError> {
        self.args.validate()?;

        let config = self.config();
        self.output.detail(&format!("API base URL: {}", config.base_url));
        self.output
            .detail(&format!("Session directory: {}", config.session_dir.display()));

        let client = ApiClient::new(config)?;
        let notice = self.output.clone();
        client.events().subscribe(move |event: SessionEvent| match event {
            SessionEvent::Invalidated => {
                notice.warning("Session is no longer valid, please log in again")
            }
        });

        let auth = AuthService::new(client.clone());
        let markets = MarketService::new(client);

        match &self.args.command {
            Command::Login { username, password } => {
                self.output.section("Login");
                let payload = auth.login(&Credentials::new(username, password)).await?;
                self.output.success("Logged in");
                self.output.payload(&payload);
            }
            Command::Register {
                username,
                password,
                fields,
            } => {
                self.output.section("Register");
                let profile = fields.iter().fold(
                    RegistrationProfile::new(username, password),
                    |profile, (key, value)| profile.with_field(key.clone(), value.clone()),
                );
                let payload = auth.register(&profile).await?;
                self.output.success("Account created");
                self.output.payload(&payload);
            }
            Command::Whoami => {
                let identity = auth.verify_token().await?;
                self.output.payload(&identity);
            }
            Command::Logout => {
                auth.logout().await;
                self.output.success("Logged out");
            }
            Command::Status => {
                let state = match auth.state().await {
                    SessionState::Authenticated => "authenticated",
                    SessionState::Anonymous => "anonymous",
                };
                if self.output.is_quiet() {
                    println!("{}", state);
                } else {
                    self.output.summary("Session", &[("state", state.to_string())]);
                }
            }
            Command::Markets => {
                self.output.payload(&markets.markets().await?);
            }
            Command::Overview { market_type } => {
                self.output.payload(&markets.overview(market_type).await?);
            }
            Command::Assets {
                market_type,
                limit,
                offset,
            } => {
                self.output
                    .payload(&markets.assets(market_type, *limit, *offset).await?);
            }
            Command::Asset { symbol } => {
                self.output.payload(&markets.asset_details(symbol).await?);
            }
            Command::Candles {
                symbol,
                timespan,
                multiplier,
                limit,
                start_date,
                end_date,
            } => {
                let query = CandleQuery::new(symbol)
                    .with_timespan(timespan)
                    .with_multiplier(*multiplier)
                    .with_limit(*limit)
                    .with_range(start_date.clone(), end_date.clone());
                self.output.payload(&markets.candles(&query).await?);
            }
        }

        self.output
            .detail(&format!("Completed in {}", self.output.elapsed_time()));
        Ok(())
    }
}
