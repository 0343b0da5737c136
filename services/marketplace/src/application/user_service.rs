//! 用户与认证服务

use std::sync::Arc;

use handyhub_auth_core::{TokenPair, TokenService, hash_password, require_role, verify_password};
use handyhub_common::utils::normalize_email;
use handyhub_common::{PagedResult, Pagination, Role, UserId};
use handyhub_config::AdminSeedConfig;
use handyhub_domain_core::{AggregateRoot, Entity};
use handyhub_errors::{AppError, AppResult};
use handyhub_ports::{QueryFilter, Repository};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use super::Actor;
use super::commands::*;
use crate::domain::entities::User;
use crate::domain::enums::UserStatus;

/// 登录结果
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: TokenPair,
}

pub struct UserService {
    users: Arc<dyn Repository<User>>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(users: Arc<dyn Repository<User>>, tokens: TokenService) -> Self {
        Self { users, tokens }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let filter = QueryFilter::new().eq("email", normalize_email(email));
        self.users.find_one(&filter).await
    }

    async fn load(&self, user_id: &UserId) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user_id)))
    }

    /// 以已哈希的密码创建账号，邮箱已占用时返回 Conflict
    pub async fn create_account(
        &self,
        email: &str,
        full_name: &str,
        phone: Option<String>,
        role: Role,
        password_hash: &str,
        created_by: Option<UserId>,
    ) -> AppResult<User> {
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict(format!("Email {} is already registered", email)));
        }

        let user = User::new(
            email,
            full_name.trim(),
            phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            role,
            password_hash,
            created_by,
        );
        self.users.insert(&user).await?;

        info!(user_id = %user.id(), role = %role, "User account created");
        Ok(user)
    }

    /// 撤销刚创建的账号
    pub async fn delete_account(&self, user_id: &UserId) -> AppResult<()> {
        self.users.delete(user_id).await?;
        warn!(user_id = %user_id, "User account deleted");
        Ok(())
    }

    pub async fn register_customer(&self, cmd: RegisterCustomerCommand) -> AppResult<User> {
        cmd.validate()?;
        let password_hash = hash_password(&cmd.password)?;
        self.create_account(
            &cmd.email,
            &cmd.full_name,
            cmd.phone,
            Role::Customer,
            &password_hash,
            None,
        )
        .await
    }

    pub async fn login(&self, cmd: LoginCommand) -> AppResult<AuthSession> {
        let invalid = || AppError::unauthenticated("Invalid email or password");

        let user = self.find_by_email(&cmd.email).await?.ok_or_else(invalid)?;
        if !verify_password(&cmd.password, user.password_hash()) {
            warn!(user_id = %user.id(), "Login failed: wrong password");
            return Err(invalid());
        }
        if !user.is_active() {
            warn!(user_id = %user.id(), "Login rejected: account locked");
            return Err(AppError::forbidden("Account is locked"));
        }

        let tokens = self.tokens.issue_pair(user.id(), user.role())?;
        info!(user_id = %user.id(), role = %user.role(), "User logged in");
        Ok(AuthSession { user, tokens })
    }

    /// 刷新令牌，角色与状态以存储中的用户为准
    pub async fn refresh(&self, cmd: RefreshTokenCommand) -> AppResult<TokenPair> {
        let claims = self.tokens.validate_refresh_token(&cmd.refresh_token)?;
        let user_id = claims.user_id()?;
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::unauthenticated("Account no longer exists"))?;
        if !user.is_active() {
            return Err(AppError::forbidden("Account is locked"));
        }
        self.tokens.issue_pair(user.id(), user.role())
    }

    pub async fn get_profile(&self, user_id: &UserId) -> AppResult<User> {
        self.load(user_id).await
    }

    pub async fn update_profile(&self, actor: &Actor, cmd: UpdateProfileCommand) -> AppResult<User> {
        cmd.validate()?;
        let mut user = self.load(&actor.user_id).await?;
        let expected = user.version();

        user.update_profile(
            cmd.full_name.map(|s| s.trim().to_string()),
            cmd.phone.map(|s| s.trim().to_string()),
            &actor.user_id,
        );
        self.users.update(&user, expected).await?;

        info!(user_id = %actor.user_id, "Profile updated");
        Ok(user)
    }

    pub async fn list_users(
        &self,
        actor: &Actor,
        query: ListUsersQuery,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<User>> {
        require_role!(actor, Role::Admin);

        let filter = QueryFilter::new()
            .eq_opt("role", query.role)
            .eq_opt("status", query.status)
            .search(&["email", "full_name", "phone"], query.keyword.as_deref());
        self.users.find_page(&filter, pagination).await
    }

    pub async fn set_user_status(
        &self,
        actor: &Actor,
        user_id: &UserId,
        cmd: SetUserStatusCommand,
    ) -> AppResult<User> {
        require_role!(actor, Role::Admin);
        if user_id == &actor.user_id && cmd.status == UserStatus::Locked {
            return Err(AppError::failed_precondition("Admins cannot lock their own account"));
        }

        let mut user = self.load(user_id).await?;
        if user.status() == cmd.status {
            return Ok(user);
        }
        let expected = user.version();
        user.set_status(cmd.status, &actor.user_id);
        self.users.update(&user, expected).await?;

        info!(user_id = %user_id, status = %cmd.status, by = %actor.user_id, "User status changed");
        Ok(user)
    }

    /// 按配置创建初始管理员；邮箱已存在时不做修改
    pub async fn ensure_admin(&self, seed: &AdminSeedConfig) -> AppResult<()> {
        if let Some(existing) = self.find_by_email(&seed.email).await? {
            if existing.role() != Role::Admin {
                warn!(
                    email = %existing.email(),
                    role = %existing.role(),
                    "Admin seed email belongs to a non-admin account"
                );
            }
            return Ok(());
        }

        let password_hash = hash_password(seed.password.expose_secret())?;
        let user = self
            .create_account(&seed.email, &seed.full_name, None, Role::Admin, &password_hash, None)
            .await?;
        info!(user_id = %user.id(), "Seeded admin account");
        Ok(())
    }
}
