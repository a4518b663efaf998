use crate::cli::actions::Action;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use secrecy::SecretString;

/// Shape check only; the backend owns real address validation
fn valid_email(email: &str) -> Result<bool> {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")?;
    Ok(re.is_match(email))
}

fn required_string(matches: &clap::ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .map(ToString::to_string)
        .ok_or_else(|| anyhow!("missing required argument: --{name}"))
}

fn required_email(matches: &clap::ArgMatches) -> Result<String> {
    let email = required_string(matches, "email")?;
    if !valid_email(&email)? {
        return Err(anyhow!("invalid email address: {email}"));
    }
    Ok(email)
}

fn required_secret(matches: &clap::ArgMatches, name: &str) -> Result<SecretString> {
    Ok(SecretString::from(required_string(matches, name)?))
}

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let (subcommand, sub_matches) = matches
        .subcommand()
        .context("missing subcommand, see --help")?;

    let action = match subcommand {
        "status" => Action::Status {
            watch: sub_matches.get_flag("watch"),
        },

        "login" => Action::Login {
            email: required_email(sub_matches)?,
            password: required_secret(sub_matches, "password")?,
            remember_me: sub_matches.get_flag("remember-me"),
        },

        "register" => Action::Register {
            name: required_string(sub_matches, "name")?,
            email: required_email(sub_matches)?,
            password: required_secret(sub_matches, "password")?,
            phone: sub_matches.get_one::<String>("phone").cloned(),
        },

        "google" => Action::Google {
            credential: required_string(sub_matches, "credential")?,
        },

        "logout" => Action::Logout {
            all_devices: sub_matches.get_flag("all"),
        },

        "profile" => {
            let name = sub_matches.get_one::<String>("name").cloned();
            let phone = sub_matches.get_one::<String>("phone").cloned();
            if name.is_none() && phone.is_none() {
                Action::ShowProfile
            } else {
                Action::UpdateProfile { name, phone }
            }
        }

        "verify-email" => Action::VerifyEmail {
            token: required_string(sub_matches, "token")?,
        },

        "resend-verification" => Action::ResendVerification {
            email: required_email(sub_matches)?,
        },

        "forgot-password" => Action::ForgotPassword {
            email: required_email(sub_matches)?,
        },

        "reset-password" => Action::ResetPassword {
            token: required_string(sub_matches, "token")?,
            new_password: required_secret(sub_matches, "password")?,
        },

        "change-password" => Action::ChangePassword {
            current: required_secret(sub_matches, "current")?,
            new_password: required_secret(sub_matches, "new")?,
        },

        unknown => return Err(anyhow!("unknown subcommand: {unknown}")),
    };

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    fn matches_for(args: &[&str]) -> clap::ArgMatches {
        let mut full = vec!["divyayatri", "--api-url", "https://api.divyayatri.app"];
        full.extend_from_slice(args);
        commands::new().get_matches_from(full)
    }

    #[test]
    fn login_maps_to_action() {
        let matches = matches_for(&[
            "login",
            "--email",
            "user@x.com",
            "--password",
            "Secret1",
            "--remember-me",
        ]);

        let action = handler(&matches).unwrap();
        match action {
            Action::Login {
                email, remember_me, ..
            } => {
                assert_eq!(email, "user@x.com");
                assert!(remember_me);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn invalid_email_is_rejected_before_any_network_call() {
        let matches = matches_for(&["login", "--email", "not-an-email", "--password", "Secret1"]);

        let err = handler(&matches).unwrap_err();
        assert!(err.to_string().contains("invalid email address"));
    }

    #[test]
    fn profile_without_fields_shows() {
        let matches = matches_for(&["profile"]);
        assert!(matches!(handler(&matches).unwrap(), Action::ShowProfile));
    }

    #[test]
    fn profile_with_fields_updates() {
        let matches = matches_for(&["profile", "--name", "Asha K"]);
        match handler(&matches).unwrap() {
            Action::UpdateProfile { name, phone } => {
                assert_eq!(name.as_deref(), Some("Asha K"));
                assert!(phone.is_none());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn logout_all_flag_maps_to_all_devices() {
        let matches = matches_for(&["logout", "--all"]);
        match handler(&matches).unwrap() {
            Action::Logout { all_devices } => assert!(all_devices),
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
