pub mod session;

use secrecy::SecretString;

/// One invocation of the client, mapped from the CLI subcommand
#[derive(Debug)]
pub enum Action {
    Status {
        watch: bool,
    },
    Login {
        email: String,
        password: SecretString,
        remember_me: bool,
    },
    Register {
        name: String,
        email: String,
        password: SecretString,
        phone: Option<String>,
    },
    Google {
        credential: String,
    },
    Logout {
        all_devices: bool,
    },
    ShowProfile,
    UpdateProfile {
        name: Option<String>,
        phone: Option<String>,
    },
    VerifyEmail {
        token: String,
    },
    ResendVerification {
        email: String,
    },
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        token: String,
        new_password: SecretString,
    },
    ChangePassword {
        current: SecretString,
        new_password: SecretString,
    },
}
