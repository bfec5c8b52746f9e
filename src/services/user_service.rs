//! User Service - Accounts, credentials and administration

use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::domain::validation::{check_password, normalize_email, optional_text, required_name};
use crate::domain::{DomainError, Role};
use crate::infrastructure::auth::{JwtKeys, hash_password, verify_password};
use crate::models::timestamp;
use crate::models::user::{self, Entity as User};
use crate::models::order::{self, Entity as Order};

use super::{Page, fetch_page};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: user::Model,
}

#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateUserInput {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileInput {
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Create a customer account and sign it in.
///
/// The very first account on an installation without an administrator is
/// promoted to `admin` so the dashboard can be reached.
pub async fn register(
    db: &DatabaseConnection,
    jwt: &JwtKeys,
    input: RegisterInput,
) -> Result<AuthResponse, DomainError> {
    let email = normalize_email(&input.email)?;
    check_password(&input.password)?;
    let full_name = required_name("Full name", &input.full_name)?;

    let existing = User::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(DomainError::conflict("Email is already registered"));
    }

    let has_admin = User::find()
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .count(db)
        .await?
        > 0;
    let role = if has_admin { Role::Customer } else { Role::Admin };

    let now = timestamp();
    let model = user::ActiveModel {
        email: Set(email),
        full_name: Set(full_name),
        password_hash: Set(hash_password(&input.password)?),
        role: Set(role.as_str().to_string()),
        phone: Set(optional_text(input.phone)),
        is_active: Set(true),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    tracing::info!("Registered user {} ({}) as {}", model.id, model.email, role);

    let token = jwt.create_token(model.id, &model.email, &model.role)?;
    Ok(AuthResponse { token, user: model })
}

pub async fn login(
    db: &DatabaseConnection,
    jwt: &JwtKeys,
    email: &str,
    password: &str,
) -> Result<AuthResponse, DomainError> {
    let email = email.trim().to_lowercase();
    let invalid = || DomainError::Unauthorized("Invalid credentials".to_string());

    let user = match User::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?
    {
        Some(u) => u,
        None => {
            tracing::warn!("Login attempt for unknown email: {}", email);
            return Err(invalid());
        }
    };

    if !verify_password(password, &user.password_hash) {
        tracing::warn!("Password verification failed for user: {}", user.id);
        return Err(invalid());
    }

    if !user.is_active {
        return Err(DomainError::Forbidden("Account is disabled".to_string()));
    }

    let token = jwt.create_token(user.id, &user.email, &user.role)?;
    Ok(AuthResponse { token, user })
}

pub async fn get_user(db: &DatabaseConnection, id: i32) -> Result<user::Model, DomainError> {
    User::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))
}

pub async fn list_users(
    db: &DatabaseConnection,
    filter: UserFilter,
) -> Result<Page<user::Model>, DomainError> {
    let mut query = User::find();

    if let Some(search) = filter.search.as_deref().map(str::trim)
        && !search.is_empty()
    {
        query = query.filter(
            Condition::any()
                .add(user::Column::Email.contains(search))
                .add(user::Column::FullName.contains(search)),
        );
    }

    if let Some(role) = filter.role {
        query = query.filter(user::Column::Role.eq(role.as_str()));
    }

    fetch_page(
        db,
        query.order_by_desc(user::Column::Id),
        filter.page,
        filter.limit,
    )
    .await
}

pub async fn update_user(
    db: &DatabaseConnection,
    acting_admin_id: i32,
    id: i32,
    input: UpdateUserInput,
) -> Result<user::Model, DomainError> {
    let existing = get_user(db, id).await?;

    if id == acting_admin_id {
        if input.is_active == Some(false) {
            return Err(DomainError::validation("You cannot deactivate your own account"));
        }
        if input.role == Some(Role::Customer) {
            return Err(DomainError::validation("You cannot remove your own admin role"));
        }
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(role) = input.role {
        active.role = Set(role.as_str().to_string());
    }
    if let Some(is_active) = input.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(full_name) = input.full_name {
        active.full_name = Set(required_name("Full name", &full_name)?);
    }
    if input.phone.is_some() {
        active.phone = Set(optional_text(input.phone));
    }
    active.updated_at = Set(timestamp());

    let updated = active.update(db).await?;
    tracing::info!("User {} updated by admin {}", id, acting_admin_id);
    Ok(updated)
}

/// Delete a user account. Accounts with order history must be deactivated instead.
pub async fn delete_user(
    db: &DatabaseConnection,
    acting_admin_id: i32,
    id: i32,
) -> Result<(), DomainError> {
    if id == acting_admin_id {
        return Err(DomainError::validation("You cannot delete your own account"));
    }

    let user = get_user(db, id).await?;

    let orders = Order::find()
        .filter(order::Column::UserId.eq(id))
        .count(db)
        .await?;
    if orders > 0 {
        return Err(DomainError::conflict(
            "User has orders and cannot be deleted; deactivate the account instead",
        ));
    }

    user.delete(db).await?;
    tracing::info!("User {} deleted by admin {}", id, acting_admin_id);
    Ok(())
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    input: UpdateProfileInput,
) -> Result<user::Model, DomainError> {
    let existing = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = existing.into();

    if let Some(full_name) = input.full_name {
        active.full_name = Set(required_name("Full name", &full_name)?);
    }
    if input.phone.is_some() {
        active.phone = Set(optional_text(input.phone));
    }
    active.updated_at = Set(timestamp());

    Ok(active.update(db).await?)
}

pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), DomainError> {
    let existing = get_user(db, user_id).await?;

    if !verify_password(current_password, &existing.password_hash) {
        return Err(DomainError::validation("Current password is incorrect"));
    }
    check_password(new_password)?;

    let mut active: user::ActiveModel = existing.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.updated_at = Set(timestamp());
    active.update(db).await?;
    Ok(())
}
