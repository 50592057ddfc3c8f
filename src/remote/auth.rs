use crate::error::{Result, SheetError};
use crate::remote::hub::AUTH_SCOPE;
use hyper_util::client::legacy::connect::HttpConnector;
use std::path::Path;
use tracing::instrument;
use yup_oauth2::{
    ServiceAccountAuthenticator, authenticator::Authenticator, hyper_rustls::HttpsConnector,
};

type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

/// Create and verify an authenticator by fetching a token
#[instrument(name = "Authenticating to Google Sheets", skip_all)]
pub(super) async fn create_and_verify_authenticator(credentials_path: &Path) -> Result<AuthType> {
    let key = yup_oauth2::read_service_account_key(credentials_path)
        .await
        .map_err(|e| {
            SheetError::CredentialLoad(format!(
                "Failed to read service account key {:?}: {}",
                credentials_path, e
            ))
        })?;

    let auth = ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| SheetError::Auth(format!("Failed to build authenticator: {}", e)))?;

    // Trigger authentication by requesting a token
    let _token = auth
        .token(&[AUTH_SCOPE])
        .await
        .map_err(|e| SheetError::Auth(format!("Failed to get token: {}", e)))?;

    Ok(auth)
}
