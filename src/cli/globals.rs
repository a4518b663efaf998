/// Configuration shared by every action
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Base URL of the DivyaYatri backend, e.g. <https://api.divyayatri.app>
    pub api_url: String,
    /// OAuth client identifier for the social-login provider; the provider
    /// SDK needs it to mint the credential handed to `google`
    pub google_client_id: Option<String>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            google_client_id: None,
        }
    }
}
