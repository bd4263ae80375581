//! Sign-in state machine and order-history navigation.
//!
//! The storefront may interrupt sign-in with a verification challenge that a
//! human has to solve in the browser window. The flow stops at
//! [`LoginStep::AwaitVerification`] and resumes only once the caller's
//! readiness future completes.

use std::future::Future;
use std::time::Duration;

use tracing::info;

use super::FormDriver;
use crate::config::Credentials;
use crate::error::{LoginError, SessionError};

const EMAIL_INPUT: &str = "input[name=email]";
const CONTINUE_BUTTON: &str = "#continue";
const PASSWORD_INPUT: &str = "input[name=password]";
const SIGN_IN_BUTTON: &str = "#signInSubmit";
const ORDERS_LINK: &str = "#nav-orders";
const TIME_FILTER: &str = "#time-filter";

/// Position in the sign-in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    /// Nothing done yet.
    Start,
    /// Email submitted, password form expected.
    EmailSubmitted,
    /// Credentials submitted; waiting for a human to clear any challenge.
    AwaitVerification,
    /// Signed in.
    Ready,
}

/// Fixed waits between sign-in actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDelays {
    pub page_load: Duration,
    pub form: Duration,
    pub after_verification: Duration,
    pub orders_page: Duration,
    pub filter: Duration,
}

impl Default for LoginDelays {
    fn default() -> Self {
        Self {
            page_load: Duration::from_secs(2),
            form: Duration::from_secs(3),
            after_verification: Duration::from_secs(10),
            orders_page: Duration::from_secs(8),
            filter: Duration::from_secs(5),
        }
    }
}

impl LoginDelays {
    /// No waiting at all.
    pub fn none() -> Self {
        Self {
            page_load: Duration::ZERO,
            form: Duration::ZERO,
            after_verification: Duration::ZERO,
            orders_page: Duration::ZERO,
            filter: Duration::ZERO,
        }
    }
}

/// Sign-in sequence for one storefront account.
pub struct LoginFlow<'a> {
    credentials: &'a Credentials,
    sign_in_url: &'a str,
    delays: LoginDelays,
    step: LoginStep,
}

fn at(step: &'static str) -> impl FnOnce(SessionError) -> LoginError {
    move |source| LoginError::Step { step, source }
}

impl<'a> LoginFlow<'a> {
    pub fn new(credentials: &'a Credentials, sign_in_url: &'a str) -> Self {
        Self {
            credentials,
            sign_in_url,
            delays: LoginDelays::default(),
            step: LoginStep::Start,
        }
    }

    pub fn with_delays(mut self, delays: LoginDelays) -> Self {
        self.delays = delays;
        self
    }

    pub fn step(&self) -> LoginStep {
        self.step
    }

    /// Perform the next automated step.
    ///
    /// Does nothing once the flow is waiting for verification or ready; use
    /// [`resume`](Self::resume) to leave `AwaitVerification`.
    pub async fn advance<D: FormDriver>(&mut self, driver: &mut D) -> Result<LoginStep, LoginError> {
        match self.step {
            LoginStep::Start => {
                info!("Starting login process");
                driver
                    .navigate(self.sign_in_url)
                    .await
                    .map_err(at("opening the sign-in page"))?;
                driver.settle(self.delays.page_load).await;

                info!("Entering email");
                driver
                    .fill(EMAIL_INPUT, &self.credentials.email)
                    .await
                    .map_err(at("entering the email"))?;
                driver.screenshot("email_entered").await;
                driver
                    .click(CONTINUE_BUTTON)
                    .await
                    .map_err(at("submitting the email"))?;
                driver.settle(self.delays.form).await;
                self.step = LoginStep::EmailSubmitted;
            }
            LoginStep::EmailSubmitted => {
                info!("Entering password");
                driver
                    .fill(PASSWORD_INPUT, &self.credentials.password)
                    .await
                    .map_err(at("entering the password"))?;
                driver.screenshot("password_entered").await;

                info!("Signing in");
                driver.settle(self.delays.form).await;
                driver
                    .click(SIGN_IN_BUTTON)
                    .await
                    .map_err(at("submitting the sign-in form"))?;
                driver.settle(self.delays.form).await;
                self.step = LoginStep::AwaitVerification;
            }
            LoginStep::AwaitVerification | LoginStep::Ready => {}
        }
        Ok(self.step)
    }

    /// Leave `AwaitVerification` after a human has cleared the challenge.
    pub async fn resume<D: FormDriver>(&mut self, driver: &mut D) -> LoginStep {
        if self.step == LoginStep::AwaitVerification {
            driver.settle(self.delays.after_verification).await;
            driver.screenshot("logged_in").await;
            self.step = LoginStep::Ready;
        }
        self.step
    }

    /// Run the whole sequence.
    ///
    /// `ready` resolves to `true` once the session may continue, or `false`
    /// if the operator gave up.
    pub async fn run<D, F>(mut self, driver: &mut D, ready: F) -> Result<(), LoginError>
    where
        D: FormDriver,
        F: Future<Output = bool>,
    {
        loop {
            match self.advance(driver).await? {
                LoginStep::AwaitVerification => break,
                LoginStep::Ready => return Ok(()),
                LoginStep::Start | LoginStep::EmailSubmitted => {}
            }
        }

        info!("Waiting for verification to be completed in the browser");
        if !ready.await {
            return Err(LoginError::Abandoned);
        }

        self.resume(driver).await;
        info!("Signed in");
        Ok(())
    }
}

/// Open the order history and apply the time filter.
pub async fn open_order_history<D: FormDriver>(
    driver: &mut D,
    year: &str,
    delays: &LoginDelays,
) -> Result<(), LoginError> {
    info!("Opening order history");
    driver
        .click(ORDERS_LINK)
        .await
        .map_err(at("opening the order history"))?;
    driver.settle(delays.orders_page).await;
    driver.screenshot("order_page").await;

    info!("Selecting time filter {}", year);
    driver
        .select_option(TIME_FILTER, year)
        .await
        .map_err(at("selecting the time filter"))?;
    driver.settle(delays.filter).await;
    driver.screenshot("select_pressed").await;
    Ok(())
}
