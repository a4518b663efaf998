use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email address")
        .required(true)
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("divyayatri")
        .about("Temple discovery and darshan booking - session client")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg(
            Arg::new("api-url")
                .short('u')
                .long("api-url")
                .help("Base URL of the DivyaYatri backend")
                .env("DIVYAYATRI_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("google-client-id")
                .long("google-client-id")
                .help("OAuth client id used by the social-login provider")
                .env("DIVYAYATRI_GOOGLE_CLIENT_ID")
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("DIVYAYATRI_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .subcommand(
            Command::new("status")
                .about("Run the startup check and report the session state")
                .arg(
                    Arg::new("watch")
                        .long("watch")
                        .help("Keep the session alive and report every transition")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with email and password")
                .arg(email_arg())
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("DIVYAYATRI_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("remember-me")
                        .short('r')
                        .long("remember-me")
                        .help("Ask the backend for a long-lived refresh token")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account; a verification mail is sent before any session is granted")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("Display name")
                        .required(true),
                )
                .arg(email_arg())
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("Account password")
                        .env("DIVYAYATRI_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("phone")
                        .long("phone")
                        .help("Phone number (optional)"),
                ),
        )
        .subcommand(
            Command::new("google")
                .about("Sign in with a Google identity credential obtained out-of-band")
                .arg(
                    Arg::new("credential")
                        .short('c')
                        .long("credential")
                        .help("Opaque credential from the identity provider; forwarded to the backend undecoded")
                        .env("DIVYAYATRI_GOOGLE_CREDENTIAL")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("logout").about("Sign out").arg(
                Arg::new("all")
                    .short('a')
                    .long("all")
                    .help("Revoke the refresh tokens of every device")
                    .action(ArgAction::SetTrue),
            ),
        )
        .subcommand(
            Command::new("profile")
                .about("Show the profile, or update it when fields are given")
                .arg(
                    Arg::new("name")
                        .short('n')
                        .long("name")
                        .help("New display name"),
                )
                .arg(
                    Arg::new("phone")
                        .long("phone")
                        .help("New phone number"),
                ),
        )
        .subcommand(
            Command::new("verify-email")
                .about("Confirm an email address from a mailed token")
                .arg(
                    Arg::new("token")
                        .short('t')
                        .long("token")
                        .help("Verification token from the mail")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("resend-verification")
                .about("Resend the verification mail")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("forgot-password")
                .about("Start the password reset flow")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new("reset-password")
                .about("Finish the password reset flow")
                .arg(
                    Arg::new("token")
                        .short('t')
                        .long("token")
                        .help("Reset token from the mail")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .short('p')
                        .long("password")
                        .help("New password")
                        .env("DIVYAYATRI_PASSWORD")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new("change-password")
                .about("Change the password of the signed-in account")
                .arg(
                    Arg::new("current")
                        .long("current")
                        .help("Current password")
                        .env("DIVYAYATRI_CURRENT_PASSWORD")
                        .required(true),
                )
                .arg(
                    Arg::new("new")
                        .long("new")
                        .help("New password")
                        .env("DIVYAYATRI_NEW_PASSWORD")
                        .required(true),
                ),
        )
}
