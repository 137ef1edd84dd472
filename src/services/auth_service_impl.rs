//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User};
use crate::domain::{Actor, Role};
use crate::services::auth_service::{AuthError, AuthService, SignUp};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn register(&self, request: SignUp, role: Option<Role>) -> Result<User, AuthError> {
        let email = request.email.trim();
        let name = request.name.trim();

        if email.is_empty() {
            return Err(AuthError::Validation("Email is required".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }
        if name.is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }

        if self.store.email_exists(email).await? {
            return Err(AuthError::EmailTaken);
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    email,
                    name,
                    password: &request.password,
                    role,
                },
                &self.security,
            )
            .await?;

        info!(user_id = user.id, name = %user.name, role = %user.role, "Account created");
        Ok(user)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn sign_up(&self, request: SignUp) -> Result<User, AuthError> {
        self.register(request, None).await
    }

    async fn create_user(&self, request: SignUp, role: Role) -> Result<User, AuthError> {
        self.register(request, Some(role)).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        if !self.store.verify_user_password(email, password).await? {
            return Err(AuthError::WrongPassword);
        }

        Ok(user)
    }

    async fn get_actor(&self, user_id: i32) -> Result<Option<Actor>, AuthError> {
        let user = self.store.get_user_by_id(user_id).await?;
        Ok(user.map(|u| Actor {
            id: u.id,
            name: u.name,
            role: u.role,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> SeaOrmAuthService {
        let path = std::env::temp_dir().join(format!("annodesk-auth-{}.db", uuid::Uuid::new_v4()));
        let store = Store::new(&format!("sqlite:{}", path.display()))
            .await
            .unwrap();
        let fast = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        SeaOrmAuthService::new(store, fast)
    }

    fn sign_up(email: &str, name: &str) -> SignUp {
        SignUp {
            email: email.to_string(),
            password: "hunter22".to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn first_account_is_admin_and_names_are_uppercased() {
        let auth = service().await;

        let first = auth.sign_up(sign_up("a@x.io", "alice")).await.unwrap();
        let second = auth.sign_up(sign_up("b@x.io", " bob ")).await.unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(second.role, Role::Annotator);
        assert_eq!(second.name, "BOB");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service().await;
        auth.sign_up(sign_up("a@x.io", "alice")).await.unwrap();

        let err = auth.sign_up(sign_up("a@x.io", "other")).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let auth = service().await;
        let err = auth.sign_up(sign_up("a@x.io", "  ")).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_email_and_wrong_password() {
        let auth = service().await;
        auth.sign_up(sign_up("a@x.io", "alice")).await.unwrap();

        assert!(matches!(
            auth.login("nobody@x.io", "hunter22").await.unwrap_err(),
            AuthError::UnknownEmail
        ));
        assert!(matches!(
            auth.login("a@x.io", "wrong").await.unwrap_err(),
            AuthError::WrongPassword
        ));

        let user = auth.login("a@x.io", "hunter22").await.unwrap();
        assert_eq!(user.name, "ALICE");
    }

    #[tokio::test]
    async fn actor_lookup() {
        let auth = service().await;
        let user = auth
            .create_user(sign_up("c@x.io", "carol"), Role::Annotator)
            .await
            .unwrap();

        let actor = auth.get_actor(user.id).await.unwrap().unwrap();
        assert_eq!(actor.name, "CAROL");
        assert!(!actor.is_admin());
        assert!(auth.get_actor(999).await.unwrap().is_none());
    }
}
