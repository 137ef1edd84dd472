use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;
use crate::services::{AuthService, SeaOrmAuthService, SignUp};

pub async fn cmd_create_user(
    config: &Config,
    email: &str,
    name: &str,
    password: &str,
    admin: bool,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    let request = SignUp {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
    };

    // Without --admin the first-account rule applies, same as web sign-up
    let user = if admin {
        auth.create_user(request, Role::Admin).await?
    } else {
        auth.sign_up(request).await?
    };

    println!("✓ Created {} account '{}' <{}>", user.role, user.name, user.email);
    Ok(())
}
