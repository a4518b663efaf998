use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::session::api::{NewUser, ProfileUpdate};
use crate::session::error::Error;
use crate::session::refresh::{self, REFRESH_INTERVAL};
use crate::session::state::{Phase, Session, User};
use crate::session::SessionManager;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

fn describe(session: &Session) -> String {
    match session.phase() {
        Phase::Loading => "loading".to_string(),
        Phase::Anonymous => "anonymous".to_string(),
        Phase::AwaitingEmailVerification => "awaiting email verification".to_string(),
        Phase::Authenticated => match session.user.as_ref() {
            Some(user) => format!("authenticated as {} <{}>", user.name, user.email),
            None => "authenticated".to_string(),
        },
    }
}

fn print_user(user: &User) {
    println!("name:     {}", user.name);
    println!("email:    {}", user.email);
    if let Some(phone) = user.phone.as_deref() {
        println!("phone:    {phone}");
    }
    println!("role:     {:?}", user.role);
    println!(
        "verified: {}",
        if user.is_email_verified { "yes" } else { "no" }
    );
}

/// Handle the session action
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    if let Some(client_id) = globals.google_client_id.as_deref() {
        debug!("social login configured with client id {client_id}");
    }

    let manager = SessionManager::new(&globals.api_url)?;

    match action {
        Action::Status { watch } => {
            manager.initialize().await;
            println!("session: {}", describe(&manager.store().snapshot()));

            if watch {
                let manager = Arc::new(manager);
                refresh::spawn(manager.clone(), REFRESH_INTERVAL);

                let mut rx = manager.store().subscribe();
                while rx.changed().await.is_ok() {
                    let session = rx.borrow_and_update().clone();
                    println!("session: {}", describe(&session));
                }
            }
        }

        Action::Login {
            email,
            password,
            remember_me,
        } => match manager.login(&email, &password, remember_me).await {
            Ok(user) => println!("signed in as {} <{}>", user.name, user.email),
            Err(err) if err.is_email_not_verified() => {
                println!("email not verified; run resend-verification --email {email}");
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        },

        Action::Register {
            name,
            email,
            password,
            phone,
        } => {
            manager
                .register(&NewUser {
                    name,
                    email: email.clone(),
                    password,
                    phone,
                })
                .await?;
            println!("account created; check {email} for the verification mail");
        }

        Action::Google { credential } => {
            let user = manager.login_with_google(&credential).await?;
            println!("signed in as {} <{}>", user.name, user.email);
        }

        Action::Logout { all_devices } => {
            if all_devices {
                manager.logout_all().await;
            } else {
                manager.logout().await;
            }
            println!("signed out");
        }

        Action::ShowProfile => {
            manager.initialize().await;
            let user = manager.profile().await?;
            print_user(&user);
        }

        Action::UpdateProfile { name, phone } => {
            manager.initialize().await;
            let user = manager
                .update_profile(&ProfileUpdate {
                    name,
                    phone,
                    preferences: None,
                })
                .await?;
            print_user(&user);
        }

        Action::VerifyEmail { token } => {
            manager.verify_email(&token).await?;
            println!("email verified; you can sign in now");
        }

        Action::ResendVerification { email } => {
            manager.resend_verification(&email).await?;
            println!("verification mail sent to {email}");
        }

        Action::ForgotPassword { email } => {
            manager.forgot_password(&email).await?;
            println!("password reset mail sent to {email}");
        }

        Action::ResetPassword {
            token,
            new_password,
        } => {
            manager.reset_password(&token, &new_password).await?;
            println!("password reset; sign in with the new password");
        }

        Action::ChangePassword {
            current,
            new_password,
        } => {
            manager.initialize().await;
            match manager.change_password(&current, &new_password).await {
                Ok(()) => println!("password changed"),
                Err(Error::NotAuthenticated) => {
                    println!("sign in before changing the password");
                    return Err(Error::NotAuthenticated.into());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    Ok(())
}
